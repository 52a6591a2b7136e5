//! Resource, activity and tag endpoints.
//!
//! All of these answer with the `{success, message?, data?}` envelope.

use reqwest::Method;
use school_portal_core::{
    Activity, ActivityId, NewActivity, NewResource, Resource, ResourceId, ResourceUpdate, Tag,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::BackendClient;
use super::types::Envelope;
use crate::error::{PortalError, Result, SchemaError};

/// Unwrap an envelope body into its `data`.
pub(crate) fn open_envelope<T: DeserializeOwned>(endpoint: &'static str, body: &[u8]) -> Result<T> {
    let envelope: Envelope<T> =
        serde_json::from_slice(body).map_err(|e| SchemaError::decode(endpoint, &e))?;
    if !envelope.success {
        return Err(PortalError::Auth(
            envelope
                .message
                .unwrap_or_else(|| "Request was rejected".to_string()),
        ));
    }
    envelope
        .data
        .ok_or_else(|| SchemaError::MissingData(endpoint).into())
}

impl BackendClient {
    async fn fetch<T: DeserializeOwned>(&self, endpoint: &'static str, segments: &[&str]) -> Result<T> {
        let url = self.endpoint(segments);
        let body = self.send(endpoint, self.request(Method::GET, url)).await?;
        open_envelope(endpoint, &body)
    }

    async fn submit<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        method: Method,
        segments: &[&str],
        payload: &B,
    ) -> Result<T> {
        let url = self.endpoint(segments);
        let body = self
            .send(endpoint, self.request(method, url).json(payload))
            .await?;
        open_envelope(endpoint, &body)
    }

    // =========================================================================
    // Resources
    // =========================================================================

    /// List resources, optionally only those carrying `tag`.
    ///
    /// # Errors
    ///
    /// Returns `Network` or `Schema` on transport failures, `Auth` when the
    /// backend refuses.
    #[instrument(skip(self))]
    pub async fn list_resources(&self, tag: Option<&str>) -> Result<Vec<Resource>> {
        let mut url = self.endpoint(&["resources"]);
        if let Some(tag) = tag {
            url.query_pairs_mut().append_pair("tag", tag);
        }
        let body = self.send("resources", self.request(Method::GET, url)).await?;
        let resources: Vec<Resource> = open_envelope("resources", &body)?;
        debug!(count = resources.len(), "Resources listed");
        Ok(resources)
    }

    /// Fetch one resource.
    ///
    /// # Errors
    ///
    /// See [`BackendClient::list_resources`].
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_resource(&self, id: &ResourceId) -> Result<Resource> {
        self.fetch("resources", &["resources", id.as_str()]).await
    }

    /// Publish a new resource.
    ///
    /// # Errors
    ///
    /// See [`BackendClient::list_resources`].
    #[instrument(skip_all, fields(title = %resource.title))]
    pub async fn create_resource(&self, resource: &NewResource) -> Result<Resource> {
        self.submit("resources", Method::POST, &["resources"], resource)
            .await
    }

    /// Apply a partial update to a resource.
    ///
    /// # Errors
    ///
    /// See [`BackendClient::list_resources`].
    #[instrument(skip(self, update), fields(id = %id))]
    pub async fn update_resource(&self, id: &ResourceId, update: &ResourceUpdate) -> Result<Resource> {
        self.submit("resources", Method::PUT, &["resources", id.as_str()], update)
            .await
    }

    // =========================================================================
    // Activities
    // =========================================================================

    /// List activities.
    ///
    /// # Errors
    ///
    /// See [`BackendClient::list_resources`].
    #[instrument(skip(self))]
    pub async fn list_activities(&self) -> Result<Vec<Activity>> {
        self.fetch("activities", &["activities"]).await
    }

    /// Fetch one activity.
    ///
    /// # Errors
    ///
    /// See [`BackendClient::list_resources`].
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_activity(&self, id: &ActivityId) -> Result<Activity> {
        self.fetch("activities", &["activities", id.as_str()]).await
    }

    /// Create an activity, usually from `ActivityWizard::finish`.
    ///
    /// # Errors
    ///
    /// See [`BackendClient::list_resources`].
    #[instrument(skip_all, fields(title = %activity.title))]
    pub async fn create_activity(&self, activity: &NewActivity) -> Result<Activity> {
        self.submit("activities", Method::POST, &["activities"], activity)
            .await
    }

    /// Replace an activity.
    ///
    /// # Errors
    ///
    /// See [`BackendClient::list_resources`].
    #[instrument(skip(self, activity), fields(id = %id))]
    pub async fn update_activity(&self, id: &ActivityId, activity: &NewActivity) -> Result<Activity> {
        self.submit("activities", Method::PUT, &["activities", id.as_str()], activity)
            .await
    }

    // =========================================================================
    // Tags
    // =========================================================================

    /// List all tags.
    ///
    /// # Errors
    ///
    /// See [`BackendClient::list_resources`].
    #[instrument(skip(self))]
    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        self.fetch("tags", &["tags"]).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_data() {
        let tags: Vec<Tag> =
            open_envelope("tags", br#"{"success": true, "data": [{"id": "1", "name": "math"}]}"#)
                .unwrap();
        assert_eq!(tags[0].name, "math");
    }

    #[test]
    fn test_envelope_rejection() {
        let err = open_envelope::<Vec<Tag>>("tags", br#"{"success": false, "message": "Forbidden"}"#)
            .unwrap_err();
        assert!(matches!(err, PortalError::Auth(message) if message == "Forbidden"));
    }

    #[test]
    fn test_envelope_missing_data() {
        let err = open_envelope::<Vec<Tag>>("tags", br#"{"success": true}"#).unwrap_err();
        assert!(matches!(
            err,
            PortalError::Schema(SchemaError::MissingData("tags"))
        ));
    }

    #[test]
    fn test_envelope_wrong_shape() {
        let err = open_envelope::<Vec<Tag>>("tags", br#"{"success": true, "data": {"id": 1}}"#)
            .unwrap_err();
        assert!(matches!(err, PortalError::Schema(SchemaError::Decode { .. })));
    }
}
