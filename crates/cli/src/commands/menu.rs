//! Menu and route table listings.

use school_portal_core::navigation::menu_for;
use school_portal_core::routes::{self, Access, ROUTES};
use school_portal_core::Role;

/// One line per menu entry: label and path.
#[must_use]
pub fn menu_lines(role: Role) -> Vec<String> {
    menu_for(role)
        .iter()
        .map(|item| format!("{:<24}{}", item.label, item.path))
        .collect()
}

/// One line per route: pattern and who may open it.
#[must_use]
pub fn route_lines() -> Vec<String> {
    ROUTES
        .iter()
        .map(|route| {
            let access = match route.access {
                Access::Public => "public".to_string(),
                Access::Verification => "signed in, onboarding".to_string(),
                Access::Roles(roles) => roles
                    .iter()
                    .map(|role| role.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            };
            format!("{:<54}{access}", route.pattern)
        })
        .collect()
}

/// Print the navigation menu for `role`.
#[allow(clippy::print_stdout)]
pub fn print_menu(role: Role) {
    println!("{role} menu (lands on {}):", routes::default_dashboard(role));
    for line in menu_lines(role) {
        println!("  {line}");
    }
}

/// Print the route table.
#[allow(clippy::print_stdout)]
pub fn print_routes() {
    for line in route_lines() {
        println!("{line}");
    }
}
