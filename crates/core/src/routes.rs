//! The client route surface.
//!
//! # Route Structure
//!
//! ```text
//! # Public
//! /                                                     - Landing page
//! /authpage                                             - Login / signup
//! /verification-page                                    - Email verification and enrollment
//!
//! # Learner
//! /learner-dashboard
//!
//! # Teacher
//! /teacher-dashboard
//! /class-masterlist
//! /teacher-materials
//! /intervention-schedule
//!
//! # Admin
//! /admin-dashboard
//! /manage-users
//! /manage-users/learners
//! /manage-users/teachers
//! /manage-users/learners/section-details/:sectionName
//! /admin-resources
//! ```

use crate::Role;

/// Public landing page.
pub const HOME: &str = "/";
/// Login and signup page.
pub const AUTH_PAGE: &str = "/authpage";
/// Email verification and enrollment page.
pub const VERIFICATION_PAGE: &str = "/verification-page";
/// Learner home.
pub const LEARNER_DASHBOARD: &str = "/learner-dashboard";
/// Teacher home.
pub const TEACHER_DASHBOARD: &str = "/teacher-dashboard";
/// Teacher class list.
pub const CLASS_MASTERLIST: &str = "/class-masterlist";
/// Teacher materials.
pub const TEACHER_MATERIALS: &str = "/teacher-materials";
/// Teacher intervention schedule.
pub const INTERVENTION_SCHEDULE: &str = "/intervention-schedule";
/// Admin home.
pub const ADMIN_DASHBOARD: &str = "/admin-dashboard";
/// Admin user management.
pub const MANAGE_USERS: &str = "/manage-users";
/// Admin learner management.
pub const MANAGE_LEARNERS: &str = "/manage-users/learners";
/// Admin teacher management.
pub const MANAGE_TEACHERS: &str = "/manage-users/teachers";
/// Admin section detail, parameterised by section name.
pub const SECTION_DETAILS: &str = "/manage-users/learners/section-details/:sectionName";
/// Admin resource management.
pub const ADMIN_RESOURCES: &str = "/admin-resources";

/// Who may open a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anyone, signed in or not. Public entry points.
    Public,
    /// Signed-in users who still have onboarding to finish.
    Verification,
    /// Signed-in, onboarded users holding one of the listed roles.
    Roles(&'static [Role]),
}

/// A route in the client route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteSpec {
    /// Path pattern. Segments starting with `:` match any single segment.
    pub pattern: &'static str,
    pub access: Access,
}

const LEARNER_ONLY: &[Role] = &[Role::Learner];
const TEACHER_ONLY: &[Role] = &[Role::Teacher];
const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// Every route the client knows about.
pub const ROUTES: &[RouteSpec] = &[
    RouteSpec { pattern: HOME, access: Access::Public },
    RouteSpec { pattern: AUTH_PAGE, access: Access::Public },
    RouteSpec { pattern: VERIFICATION_PAGE, access: Access::Verification },
    RouteSpec { pattern: LEARNER_DASHBOARD, access: Access::Roles(LEARNER_ONLY) },
    RouteSpec { pattern: TEACHER_DASHBOARD, access: Access::Roles(TEACHER_ONLY) },
    RouteSpec { pattern: CLASS_MASTERLIST, access: Access::Roles(TEACHER_ONLY) },
    RouteSpec { pattern: TEACHER_MATERIALS, access: Access::Roles(TEACHER_ONLY) },
    RouteSpec { pattern: INTERVENTION_SCHEDULE, access: Access::Roles(TEACHER_ONLY) },
    RouteSpec { pattern: ADMIN_DASHBOARD, access: Access::Roles(ADMIN_ONLY) },
    RouteSpec { pattern: MANAGE_USERS, access: Access::Roles(ADMIN_ONLY) },
    RouteSpec { pattern: MANAGE_LEARNERS, access: Access::Roles(ADMIN_ONLY) },
    RouteSpec { pattern: MANAGE_TEACHERS, access: Access::Roles(ADMIN_ONLY) },
    RouteSpec { pattern: SECTION_DETAILS, access: Access::Roles(ADMIN_ONLY) },
    RouteSpec { pattern: ADMIN_RESOURCES, access: Access::Roles(ADMIN_ONLY) },
];

/// Valid destinations for a signed-in, onboarded learner.
pub const LEARNER_ALLOWLIST: &[&str] = &[LEARNER_DASHBOARD];
/// Valid destinations for a signed-in, onboarded teacher.
pub const TEACHER_ALLOWLIST: &[&str] = &[
    TEACHER_DASHBOARD,
    CLASS_MASTERLIST,
    TEACHER_MATERIALS,
    INTERVENTION_SCHEDULE,
];
/// Valid destinations for a signed-in, onboarded admin.
pub const ADMIN_ALLOWLIST: &[&str] = &[ADMIN_DASHBOARD, MANAGE_USERS, ADMIN_RESOURCES];

/// The dashboard a role lands on.
#[must_use]
pub const fn default_dashboard(role: Role) -> &'static str {
    match role {
        Role::Learner => LEARNER_DASHBOARD,
        Role::Teacher => TEACHER_DASHBOARD,
        Role::Admin => ADMIN_DASHBOARD,
    }
}

/// The path prefixes a role may be on once onboarded.
#[must_use]
pub const fn allowlist(role: Role) -> &'static [&'static str] {
    match role {
        Role::Learner => LEARNER_ALLOWLIST,
        Role::Teacher => TEACHER_ALLOWLIST,
        Role::Admin => ADMIN_ALLOWLIST,
    }
}

/// Strip the query string, fragment and trailing slashes from a path.
///
/// The root path stays `/`.
#[must_use]
pub fn normalize(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = path.get(..end).unwrap_or(path);
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { HOME } else { trimmed }
}

/// Whether `path` is `prefix` or lies beneath it.
///
/// Matching is by whole segments: `/manage-users/learners` is under
/// `/manage-users`, `/manage-users2` is not.
#[must_use]
pub fn has_prefix(path: &str, prefix: &str) -> bool {
    let path = normalize(path);
    let prefix = normalize(prefix);
    if prefix == HOME {
        return true;
    }
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Whether `path` is in the role's allowlist.
#[must_use]
pub fn is_allowed(role: Role, path: &str) -> bool {
    allowlist(role).iter().any(|prefix| has_prefix(path, prefix))
}

/// Whether `path` is a public entry point (`/` or `/authpage`).
#[must_use]
pub fn is_public_entry(path: &str) -> bool {
    matches!(normalize(path), HOME | AUTH_PAGE)
}

/// Whether `path` is the verification page.
#[must_use]
pub fn is_verification_page(path: &str) -> bool {
    normalize(path) == VERIFICATION_PAGE
}

/// Match a concrete path against a route pattern.
fn matches_pattern(pattern: &str, path: &str) -> bool {
    let mut pattern_segments = pattern.split('/');
    let mut path_segments = normalize(path).split('/');
    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return true,
            (Some(p), Some(s)) if p.starts_with(':') && !s.is_empty() => {}
            (Some(p), Some(s)) if p == s => {}
            _ => return false,
        }
    }
}

/// Find the route a path resolves to.
#[must_use]
pub fn lookup(path: &str) -> Option<&'static RouteSpec> {
    ROUTES
        .iter()
        .find(|route| matches_pattern(route.pattern, path))
}

/// Roles allowed on `path`. Unknown paths allow nobody.
#[must_use]
pub fn allowed_roles(path: &str) -> &'static [Role] {
    match lookup(path).map(|route| route.access) {
        Some(Access::Roles(roles)) => roles,
        Some(Access::Public | Access::Verification) => &Role::ALL,
        None => &[],
    }
}
