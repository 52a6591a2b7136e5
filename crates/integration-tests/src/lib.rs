//! Integration tests for School Portal.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p school-portal-integration-tests
//! ```
//!
//! Every test starts its own [`MockBackend`] on an ephemeral port, so the
//! suite needs no running services.
//!
//! # Test Categories
//!
//! - `session_flow` - Signup, login, logout and session checks
//! - `navigation` - The navigator against a live backend
//! - `gate_properties` - Exhaustive gate and landing properties
//! - `resources` - Resource, activity and tag endpoints

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use school_portal_client::api::REQUEST_ID_HEADER;
use school_portal_client::{AuthService, BackendClient, ChallengeToken, Navigator, PortalConfig, SessionStore};
use school_portal_core::{
    Activity, ActivityId, NewActivity, NewResource, Resource, ResourceId, ResourceUpdate, Role,
    Tag, TagId,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Name of the session cookie the mock hands out.
pub const SESSION_COOKIE: &str = "portal_sid";

/// Password every seeded account uses.
pub const SEED_PASSWORD: &str = "correct horse";

/// An account known to the mock backend.
#[derive(Debug, Clone)]
pub struct MockUser {
    pub id: u64,
    pub first_name: String,
    pub email: String,
    pub lrn: Option<String>,
    pub password: String,
    /// Role as the backend spells it, e.g. `"Learner"`.
    pub user_type: String,
    pub verified: bool,
    /// Enrollment flag; `None` for staff.
    pub enrolled: Option<bool>,
}

impl MockUser {
    fn wire(&self) -> Value {
        let mut body = json!({
            "user_id": self.id,
            "user_type": self.user_type,
            "first_name": self.first_name,
            "email": self.email,
            "is_email_verified": if self.verified { "yes" } else { "no" },
        });
        if let Some(lrn) = &self.lrn {
            body["lrn"] = json!(lrn);
        }
        if let Some(enrolled) = self.enrolled {
            body["enrollmentStatus"] = json!({
                "isEnrolled": enrolled,
                "enrollmentYear": "2025-2026",
            });
        }
        body
    }

    fn role(&self) -> Option<Role> {
        self.user_type.parse().ok()
    }
}

/// Knobs a test can turn to make the backend misbehave.
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// `POST logout` answers 500.
    pub logout_fails: bool,
    /// `GET check_session` answers 503.
    pub check_session_fails: bool,
    /// `POST login` omits the user fields, forcing a session check.
    pub login_omits_user: bool,
    /// `redirect` field added to accepted logins.
    pub login_redirect: Option<String>,
}

/// Everything the mock backend knows.
#[derive(Debug, Default)]
pub struct BackendState {
    pub users: Vec<MockUser>,
    /// Session cookie value to user id.
    pub sessions: HashMap<String, u64>,
    pub resources: Vec<Resource>,
    pub activities: Vec<Activity>,
    pub tags: Vec<Tag>,
    pub faults: Faults,
    /// `(endpoint, x-request-id)` for every request, in arrival order.
    pub requests: Vec<(String, Option<String>)>,
    next_id: u64,
}

impl BackendState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn user_for(&self, headers: &HeaderMap) -> Option<&MockUser> {
        let sid = session_cookie(headers)?;
        let id = self.sessions.get(sid)?;
        self.users.iter().find(|user| user.id == *id)
    }

    fn role_for(&self, headers: &HeaderMap) -> Option<Role> {
        self.user_for(headers).and_then(MockUser::role)
    }

    fn start_session(&mut self, user_id: u64) -> String {
        let sid = Uuid::new_v4().to_string();
        self.sessions.insert(sid.clone(), user_id);
        sid
    }
}

type Shared = Arc<Mutex<BackendState>>;

fn lock(state: &Shared) -> MutexGuard<'_, BackendState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A portal backend served in-process on `127.0.0.1`.
///
/// Speaks the same wire format as the real backend: snake_case session
/// fields, a cookie-based session and the `{success, message, data}`
/// envelope for resources. The server task is aborted on drop.
pub struct MockBackend {
    addr: SocketAddr,
    state: Shared,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Start a backend seeded with [`seed`] data.
    ///
    /// # Errors
    ///
    /// Returns an error if no local port can be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state: Shared = Arc::new(Mutex::new(seed()));
        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let addr = listener.local_addr()?;
        let app = router(state.clone());

        let server = tokio::spawn(async move {
            // Only ends when the task is aborted
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            addr,
            state,
            server,
        })
    }

    /// Base URL of the backend.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Client configuration pointing at this backend.
    ///
    /// # Panics
    ///
    /// Never in practice; the URL is always well formed.
    #[must_use]
    pub fn config(&self) -> PortalConfig {
        PortalConfig::for_api_url(&self.url()).expect("mock backend URL is valid")
    }

    /// A client wired to this backend.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn portal(&self) -> Portal {
        let config = self.config();
        let client = BackendClient::new(&config).expect("HTTP client builds");
        let store = Arc::new(SessionStore::new());
        Portal {
            auth: AuthService::new(client.clone(), store.clone(), config.challenge_ttl),
            navigator: Navigator::new(client.clone(), store.clone()),
            client,
            store,
        }
    }

    /// Lock the backend state for inspection or tweaking.
    pub fn state(&self) -> MutexGuard<'_, BackendState> {
        lock(&self.state)
    }

    /// Change the account with `email` in place.
    pub fn update_user(&self, email: &str, change: impl FnOnce(&mut MockUser)) {
        if let Some(user) = self.state().users.iter_mut().find(|u| u.email == email) {
            change(user);
        }
    }

    /// Turn on fault injection.
    pub fn set_faults(&self, faults: Faults) {
        self.state().faults = faults;
    }

    /// Number of requests received for `endpoint` (first path segment).
    #[must_use]
    pub fn hits(&self, endpoint: &str) -> usize {
        self.state()
            .requests
            .iter()
            .filter(|(name, _)| name == endpoint)
            .count()
    }

    /// Number of live backend sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.state().sessions.len()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// One client: a cookie jar shared by the auth service and the navigator,
/// and the session store they both write.
pub struct Portal {
    pub client: BackendClient,
    pub store: Arc<SessionStore>,
    pub auth: AuthService<BackendClient>,
    pub navigator: Navigator<BackendClient>,
}

/// A challenge token issued just now.
#[must_use]
pub fn fresh_token() -> ChallengeToken {
    ChallengeToken::new("test-challenge")
}

// ============================================================================
// Seed data
// ============================================================================

/// Seeded learner, verified and enrolled.
pub const LEARNER_EMAIL: &str = "andres@example.com";
/// Seeded learner's LRN.
pub const LEARNER_LRN: &str = "136512140001";
/// Seeded learner who has not verified their email.
pub const NEW_LEARNER_EMAIL: &str = "emilio@example.com";
/// Seeded teacher.
pub const TEACHER_EMAIL: &str = "melchora@example.com";
/// Seeded admin.
pub const ADMIN_EMAIL: &str = "apolinario@example.com";

fn user(
    id: u64,
    first_name: &str,
    email: &str,
    user_type: &str,
    verified: bool,
    enrolled: Option<bool>,
) -> MockUser {
    MockUser {
        id,
        first_name: first_name.to_string(),
        email: email.to_string(),
        lrn: None,
        password: SEED_PASSWORD.to_string(),
        user_type: user_type.to_string(),
        verified,
        enrolled,
    }
}

/// Accounts, tags and one resource the backend starts with.
#[must_use]
pub fn seed() -> BackendState {
    let mut learner = user(1, "Andres", LEARNER_EMAIL, "Learner", true, Some(true));
    learner.lrn = Some(LEARNER_LRN.to_string());
    let mut new_learner = user(2, "Emilio", NEW_LEARNER_EMAIL, "learner", false, Some(false));
    new_learner.lrn = Some("136512140002".to_string());

    BackendState {
        users: vec![
            learner,
            new_learner,
            user(3, "Melchora", TEACHER_EMAIL, "Teacher", true, None),
            user(4, "Apolinario", ADMIN_EMAIL, "ADMIN", true, None),
        ],
        resources: vec![Resource {
            id: ResourceId::new("100"),
            title: "Reading Comprehension Pack".to_string(),
            description: "Short passages with questions".to_string(),
            tags: vec!["reading".to_string()],
            grade_level: Some("Grade 4".to_string()),
            link: None,
        }],
        tags: vec![
            Tag {
                id: TagId::new("1"),
                name: "reading".to_string(),
            },
            Tag {
                id: TagId::new("2"),
                name: "math".to_string(),
            },
        ],
        next_id: 100,
        ..BackendState::default()
    }
}

// ============================================================================
// Router
// ============================================================================

fn router(state: Shared) -> Router {
    Router::new()
        .route("/check_session", get(check_session))
        .route("/login", post(login))
        .route("/signup", post(signup))
        .route("/logout", post(logout))
        .route("/resources", get(list_resources).post(create_resource))
        .route("/resources/{id}", get(get_resource).put(update_resource))
        .route("/activities", get(list_activities).post(create_activity))
        .route("/activities/{id}", get(get_activity).put(update_activity))
        .route("/tags", get(list_tags))
        .layer(middleware::from_fn_with_state(state.clone(), record_request))
        .with_state(state)
}

/// Remember which endpoint was hit and with which request id.
async fn record_request(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let endpoint = request
        .uri()
        .path()
        .trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default()
        .to_string();
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    lock(&state).requests.push((endpoint, request_id));
    next.run(request).await
}

fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == SESSION_COOKIE).then_some(value)
        })
}

fn set_cookie(sid: &str) -> [(header::HeaderName, String); 1] {
    [(
        header::SET_COOKIE,
        format!("{SESSION_COOKIE}={sid}; Path=/; HttpOnly"),
    )]
}

fn expire_cookie() -> [(header::HeaderName, String); 1] {
    [(
        header::SET_COOKIE,
        format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0"),
    )]
}

fn reject(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

fn data(value: impl serde::Serialize) -> Response {
    Json(json!({ "success": true, "data": value })).into_response()
}

// ============================================================================
// Session endpoints
// ============================================================================

async fn check_session(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    if state.faults.check_session_fails {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    match state.user_for(&headers) {
        Some(user) => {
            let mut body = user.wire();
            body["isLoggedIn"] = json!(true);
            Json(body).into_response()
        }
        None => Json(json!({ "isLoggedIn": false })).into_response(),
    }
}

#[derive(Deserialize)]
struct LoginBody {
    login: String,
    password: String,
    #[serde(rename = "recaptchaToken")]
    recaptcha_token: String,
}

async fn login(State(state): State<Shared>, Json(body): Json<LoginBody>) -> Response {
    if body.recaptcha_token.trim().is_empty() {
        return reject(StatusCode::BAD_REQUEST, "reCAPTCHA verification failed");
    }

    let mut state = lock(&state);
    let Some(user) = state
        .users
        .iter()
        .find(|u| u.email == body.login || u.lrn.as_deref() == Some(body.login.as_str()))
        .filter(|u| u.password == body.password)
        .cloned()
    else {
        return reject(StatusCode::UNAUTHORIZED, "Invalid credentials");
    };

    let sid = state.start_session(user.id);
    let mut response = if state.faults.login_omits_user {
        json!({ "success": true })
    } else {
        user.wire()
    };
    response["success"] = json!(true);
    response["message"] = json!("Login successful");
    if let Some(redirect) = &state.faults.login_redirect {
        response["redirect"] = json!(redirect);
    }
    (set_cookie(&sid), Json(response)).into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignupBody {
    first_name: String,
    lrn: String,
    email: String,
    password: String,
    recaptcha_token: String,
}

async fn signup(State(state): State<Shared>, Json(body): Json<SignupBody>) -> Response {
    if body.recaptcha_token.trim().is_empty() {
        return reject(StatusCode::BAD_REQUEST, "reCAPTCHA verification failed");
    }

    let mut state = lock(&state);
    if state.users.iter().any(|u| u.email == body.email) {
        return reject(StatusCode::CONFLICT, "Email is already registered");
    }
    if state.users.iter().any(|u| u.lrn.as_deref() == Some(body.lrn.as_str())) {
        return reject(StatusCode::CONFLICT, "LRN is already registered");
    }

    let id = state.next_id();
    state.users.push(MockUser {
        id,
        first_name: body.first_name,
        email: body.email,
        lrn: Some(body.lrn),
        password: body.password,
        user_type: "learner".to_string(),
        verified: false,
        enrolled: Some(false),
    });
    let sid = state.start_session(id);

    // Signup answers without the user fields, like the real backend
    (
        set_cookie(&sid),
        Json(json!({ "success": true, "message": "Check your email to verify your account" })),
    )
        .into_response()
}

async fn logout(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = lock(&state);
    if state.faults.logout_fails {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    if let Some(sid) = session_cookie(&headers) {
        state.sessions.remove(sid);
    }
    (expire_cookie(), Json(json!({ "success": true }))).into_response()
}

// ============================================================================
// Resources
// ============================================================================

/// Signed-in users may read; `writers` may also write.
fn guard(state: &BackendState, headers: &HeaderMap, writers: &[Role]) -> Result<(), Response> {
    match state.role_for(headers) {
        None => Err(reject(StatusCode::UNAUTHORIZED, "Not signed in")),
        Some(role) if writers.is_empty() || writers.contains(&role) => Ok(()),
        Some(_) => Err(reject(StatusCode::FORBIDDEN, "Forbidden")),
    }
}

#[derive(Deserialize)]
struct TagFilter {
    tag: Option<String>,
}

async fn list_resources(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(filter): Query<TagFilter>,
) -> Response {
    let state = lock(&state);
    if let Err(response) = guard(&state, &headers, &[]) {
        return response;
    }
    let resources: Vec<&Resource> = state
        .resources
        .iter()
        .filter(|r| filter.tag.as_ref().is_none_or(|tag| r.tags.contains(tag)))
        .collect();
    data(resources)
}

async fn get_resource(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let state = lock(&state);
    if let Err(response) = guard(&state, &headers, &[]) {
        return response;
    }
    state
        .resources
        .iter()
        .find(|r| r.id.as_str() == id)
        .map_or_else(|| reject(StatusCode::NOT_FOUND, "Resource not found"), data)
}

async fn create_resource(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(new): Json<NewResource>,
) -> Response {
    let mut state = lock(&state);
    if let Err(response) = guard(&state, &headers, &[Role::Admin]) {
        return response;
    }
    let resource = Resource {
        id: ResourceId::new(state.next_id().to_string()),
        title: new.title,
        description: new.description,
        tags: new.tags,
        grade_level: new.grade_level,
        link: new.link,
    };
    state.resources.push(resource.clone());
    (StatusCode::CREATED, data(resource)).into_response()
}

async fn update_resource(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(update): Json<ResourceUpdate>,
) -> Response {
    let mut state = lock(&state);
    if let Err(response) = guard(&state, &headers, &[Role::Admin]) {
        return response;
    }
    let Some(resource) = state.resources.iter_mut().find(|r| r.id.as_str() == id) else {
        return reject(StatusCode::NOT_FOUND, "Resource not found");
    };
    if let Some(title) = update.title {
        resource.title = title;
    }
    if let Some(description) = update.description {
        resource.description = description;
    }
    if let Some(tags) = update.tags {
        resource.tags = tags;
    }
    if update.grade_level.is_some() {
        resource.grade_level = update.grade_level;
    }
    if update.link.is_some() {
        resource.link = update.link;
    }
    data(resource.clone())
}

// ============================================================================
// Activities
// ============================================================================

const ACTIVITY_WRITERS: &[Role] = &[Role::Teacher, Role::Admin];

fn activity_from(id: ActivityId, new: NewActivity) -> Activity {
    Activity {
        id,
        title: new.title,
        instructions: new.instructions,
        kind: new.kind,
        questions: new.questions,
        due_date: new.due_date,
        tags: new.tags,
    }
}

async fn list_activities(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    if let Err(response) = guard(&state, &headers, &[]) {
        return response;
    }
    data(&state.activities)
}

async fn get_activity(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let state = lock(&state);
    if let Err(response) = guard(&state, &headers, &[]) {
        return response;
    }
    state
        .activities
        .iter()
        .find(|a| a.id.as_str() == id)
        .map_or_else(|| reject(StatusCode::NOT_FOUND, "Activity not found"), data)
}

async fn create_activity(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(new): Json<NewActivity>,
) -> Response {
    let mut state = lock(&state);
    if let Err(response) = guard(&state, &headers, ACTIVITY_WRITERS) {
        return response;
    }
    let activity = activity_from(ActivityId::new(state.next_id().to_string()), new);
    state.activities.push(activity.clone());
    (StatusCode::CREATED, data(activity)).into_response()
}

async fn update_activity(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(new): Json<NewActivity>,
) -> Response {
    let mut state = lock(&state);
    if let Err(response) = guard(&state, &headers, ACTIVITY_WRITERS) {
        return response;
    }
    let Some(activity) = state.activities.iter_mut().find(|a| a.id.as_str() == id) else {
        return reject(StatusCode::NOT_FOUND, "Activity not found");
    };
    *activity = activity_from(activity.id.clone(), new);
    data(activity.clone())
}

// ============================================================================
// Tags
// ============================================================================

async fn list_tags(State(state): State<Shared>) -> Response {
    data(&lock(&state).tags)
}
