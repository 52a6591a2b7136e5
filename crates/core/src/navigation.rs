//! Role-dependent navigation menus.

use crate::Role;
use crate::routes::{
    ADMIN_DASHBOARD, ADMIN_RESOURCES, CLASS_MASTERLIST, INTERVENTION_SCHEDULE, LEARNER_DASHBOARD,
    MANAGE_LEARNERS, MANAGE_TEACHERS, MANAGE_USERS, TEACHER_DASHBOARD, TEACHER_MATERIALS,
};

/// A single sidebar entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuItem {
    pub label: &'static str,
    pub path: &'static str,
}

const fn item(label: &'static str, path: &'static str) -> MenuItem {
    MenuItem { label, path }
}

const LEARNER_MENU: &[MenuItem] = &[item("Dashboard", LEARNER_DASHBOARD)];

const TEACHER_MENU: &[MenuItem] = &[
    item("Dashboard", TEACHER_DASHBOARD),
    item("Class Masterlist", CLASS_MASTERLIST),
    item("Materials", TEACHER_MATERIALS),
    item("Intervention Schedule", INTERVENTION_SCHEDULE),
];

const ADMIN_MENU: &[MenuItem] = &[
    item("Dashboard", ADMIN_DASHBOARD),
    item("Manage Users", MANAGE_USERS),
    item("Learners", MANAGE_LEARNERS),
    item("Teachers", MANAGE_TEACHERS),
    item("Resources", ADMIN_RESOURCES),
];

/// The menu shown to a signed-in user of `role`.
#[must_use]
pub const fn menu_for(role: Role) -> &'static [MenuItem] {
    match role {
        Role::Learner => LEARNER_MENU,
        Role::Teacher => TEACHER_MENU,
        Role::Admin => ADMIN_MENU,
    }
}

/// Path of the admin section detail view for `section_name`.
///
/// ```
/// use school_portal_core::navigation::section_details_path;
///
/// assert_eq!(
///     section_details_path("Grade 7 - Rizal"),
///     "/manage-users/learners/section-details/Grade%207%20-%20Rizal"
/// );
/// ```
#[must_use]
pub fn section_details_path(section_name: &str) -> String {
    format!(
        "{MANAGE_LEARNERS}/section-details/{}",
        urlencoding::encode(section_name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Decision, EnrollmentStatus, Session, SessionState, UserId, authorize_route};

    fn onboarded(role: Role) -> SessionState {
        SessionState::Present(Session {
            id: UserId::new("3"),
            role,
            first_name: "Lea".to_string(),
            email: "lea@example.com".to_string(),
            lrn: None,
            is_email_verified: true,
            enrollment_status: Some(EnrollmentStatus {
                is_enrolled: true,
                enrollment_year: "2025-2026".to_string(),
            }),
        })
    }

    #[test]
    fn test_every_menu_entry_passes_the_gate() {
        for role in Role::ALL {
            let state = onboarded(role);
            for entry in menu_for(role) {
                assert_eq!(
                    authorize_route(&state, entry.path),
                    Decision::Render,
                    "{} for {role}",
                    entry.path
                );
            }
        }
    }

    #[test]
    fn test_section_details_path_is_gated_for_admin() {
        let path = section_details_path("Mabini/Annex");
        assert_eq!(path, "/manage-users/learners/section-details/Mabini%2FAnnex");
        assert_eq!(authorize_route(&onboarded(Role::Admin), &path), Decision::Render);
    }

    #[test]
    fn test_first_entry_is_dashboard() {
        for role in Role::ALL {
            let first = menu_for(role).first().map(|entry| entry.path);
            assert_eq!(first, Some(crate::routes::default_dashboard(role)));
        }
    }
}
