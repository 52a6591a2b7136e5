//! Learning resources, activities and tags.
//!
//! These are the view models of the admin and teacher screens. Field names
//! match the backend's camelCase JSON.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{ActivityId, ResourceId, TagId};

/// A tag used to group resources and activities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

/// A learning resource published by an admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: ResourceId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub grade_level: Option<String>,
    /// Where the uploaded material can be fetched.
    #[serde(default)]
    pub link: Option<String>,
}

/// Payload for creating a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewResource {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Partial update for a resource. Absent fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResourceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl ResourceUpdate {
    /// Whether the update would change nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.tags.is_none()
            && self.grade_level.is_none()
            && self.link.is_none()
    }
}

/// What kind of activity learners are asked to complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// Scored multiple-choice questions.
    #[default]
    Quiz,
    /// Free-form submission; questions are optional.
    Assignment,
    /// Unscored questions.
    Survey,
}

impl ActivityKind {
    /// Whether the activity must contain at least one question.
    #[must_use]
    pub const fn requires_questions(self) -> bool {
        matches!(self, Self::Quiz | Self::Survey)
    }
}

/// A multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub prompt: String,
    pub choices: Vec<String>,
    /// Index into `choices` of the correct answer.
    pub answer_index: usize,
    pub points: u32,
}

/// An activity as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: ActivityId,
    pub title: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub kind: ActivityKind,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Activity {
    /// Total points available across all questions.
    #[must_use]
    pub fn total_points(&self) -> u32 {
        self.questions.iter().map(|q| q.points).sum()
    }
}

/// Payload for creating or replacing an activity.
///
/// Built by [`crate::wizard::ActivityWizard::finish`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewActivity {
    pub title: String,
    pub instructions: String,
    pub kind: ActivityKind,
    pub questions: Vec<Question>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub tags: Vec<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_deserializes_with_defaults() {
        let activity: Activity = serde_json::from_str(
            r#"{"id":"7","title":"Fractions","dueDate":"2026-03-01"}"#,
        )
        .unwrap();
        assert_eq!(activity.kind, ActivityKind::Quiz);
        assert!(activity.questions.is_empty());
        assert_eq!(activity.due_date, NaiveDate::from_ymd_opt(2026, 3, 1));
        assert_eq!(activity.total_points(), 0);
    }

    #[test]
    fn test_resource_update_skips_unset_fields() {
        let update = ResourceUpdate {
            title: Some("Updated".to_string()),
            ..ResourceUpdate::default()
        };
        assert!(!update.is_empty());
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({"title": "Updated"})
        );
    }
}
