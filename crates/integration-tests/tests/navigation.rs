//! The navigator against a live backend.
//!
//! Every navigation re-checks the session over HTTP, so changes made on the
//! backend between navigations must show up in the next decision.

#![allow(clippy::unwrap_used)]

use school_portal_client::NavState;
use school_portal_core::routes;
use school_portal_core::validation::LoginForm;
use school_portal_integration_tests::{
    ADMIN_EMAIL, Faults, LEARNER_EMAIL, MockBackend, NEW_LEARNER_EMAIL, Portal, SEED_PASSWORD,
    TEACHER_EMAIL, fresh_token,
};

async fn signed_in(backend: &MockBackend, email: &str) -> Portal {
    let portal = backend.portal();
    let form = LoginForm {
        identifier: email,
        password: SEED_PASSWORD,
    };
    portal.auth.login(form, fresh_token()).await.unwrap();
    portal
}

#[tokio::test]
async fn test_anonymous_visitor_is_sent_home() {
    let backend = MockBackend::start().await.unwrap();
    let mut portal = backend.portal();

    let nav = portal
        .navigator
        .navigate(routes::ADMIN_DASHBOARD)
        .await
        .unwrap();

    assert_eq!(nav.path, routes::HOME);
    assert_eq!(nav.redirects.len(), 1);
    assert_eq!(nav.redirects[0].reason, NavState::Unauthenticated);
    assert_eq!(portal.navigator.state(), NavState::Authorized);
    assert_eq!(portal.navigator.current_path(), Some(routes::HOME));
}

#[tokio::test]
async fn test_anonymous_visitor_sees_auth_page() {
    let backend = MockBackend::start().await.unwrap();
    let mut portal = backend.portal();

    let nav = portal.navigator.navigate(routes::AUTH_PAGE).await.unwrap();

    assert!(nav.rendered_as_requested());
    assert_eq!(nav.session.session(), None);
}

#[tokio::test]
async fn test_every_navigation_checks_the_session() {
    let backend = MockBackend::start().await.unwrap();
    let mut portal = signed_in(&backend, LEARNER_EMAIL).await;
    let before = backend.hits("check_session");

    portal
        .navigator
        .navigate(routes::LEARNER_DASHBOARD)
        .await
        .unwrap();
    portal
        .navigator
        .navigate(routes::LEARNER_DASHBOARD)
        .await
        .unwrap();

    assert_eq!(backend.hits("check_session") - before, 2);
}

#[tokio::test]
async fn test_onboarded_learner_is_kept_on_dashboard() {
    let backend = MockBackend::start().await.unwrap();
    let mut portal = signed_in(&backend, LEARNER_EMAIL).await;

    let home = portal.navigator.navigate(routes::HOME).await.unwrap();
    assert_eq!(home.path, routes::LEARNER_DASHBOARD);

    let other = portal
        .navigator
        .navigate(routes::TEACHER_DASHBOARD)
        .await
        .unwrap();
    assert_eq!(other.path, routes::LEARNER_DASHBOARD);
    assert_eq!(other.redirects[0].reason, NavState::Redirecting);
}

#[tokio::test]
async fn test_learner_finishes_onboarding_between_navigations() {
    let backend = MockBackend::start().await.unwrap();
    let mut portal = signed_in(&backend, NEW_LEARNER_EMAIL).await;

    let nav = portal
        .navigator
        .navigate(routes::LEARNER_DASHBOARD)
        .await
        .unwrap();
    assert_eq!(nav.path, routes::VERIFICATION_PAGE);

    // Verified but not enrolled is still onboarding
    backend.update_user(NEW_LEARNER_EMAIL, |user| user.verified = true);
    let nav = portal
        .navigator
        .navigate(routes::LEARNER_DASHBOARD)
        .await
        .unwrap();
    assert_eq!(nav.path, routes::VERIFICATION_PAGE);

    backend.update_user(NEW_LEARNER_EMAIL, |user| user.enrolled = Some(true));
    let nav = portal
        .navigator
        .navigate(routes::VERIFICATION_PAGE)
        .await
        .unwrap();
    assert_eq!(nav.path, routes::LEARNER_DASHBOARD);
    assert!(nav.session.session().unwrap().is_fully_onboarded());
}

#[tokio::test]
async fn test_teacher_cannot_open_admin_pages() {
    let backend = MockBackend::start().await.unwrap();
    let mut portal = signed_in(&backend, TEACHER_EMAIL).await;

    let nav = portal
        .navigator
        .navigate(routes::MANAGE_TEACHERS)
        .await
        .unwrap();
    assert_eq!(nav.path, routes::TEACHER_DASHBOARD);

    let nav = portal
        .navigator
        .navigate(routes::INTERVENTION_SCHEDULE)
        .await
        .unwrap();
    assert!(nav.rendered_as_requested());
}

#[tokio::test]
async fn test_admin_opens_nested_section_page() {
    let backend = MockBackend::start().await.unwrap();
    let mut portal = signed_in(&backend, ADMIN_EMAIL).await;

    let section = "/manage-users/learners/section-details/Sampaguita";
    let nav = portal.navigator.navigate(section).await.unwrap();
    assert!(nav.rendered_as_requested());

    // Shares a prefix with an allowlisted path but is not beneath it
    let nav = portal.navigator.navigate("/manage-users2").await.unwrap();
    assert_eq!(nav.path, routes::ADMIN_DASHBOARD);
}

#[tokio::test]
async fn test_backend_side_logout_is_noticed() {
    let backend = MockBackend::start().await.unwrap();
    let mut portal = signed_in(&backend, TEACHER_EMAIL).await;
    backend.state().sessions.clear();

    let nav = portal
        .navigator
        .navigate(routes::TEACHER_DASHBOARD)
        .await
        .unwrap();

    assert_eq!(nav.path, routes::HOME);
    assert_eq!(portal.store.current().session(), None);
}

#[tokio::test]
async fn test_unreachable_session_check_redirects_home() {
    let backend = MockBackend::start().await.unwrap();
    let mut portal = signed_in(&backend, ADMIN_EMAIL).await;
    backend.set_faults(Faults {
        check_session_fails: true,
        ..Faults::default()
    });

    let nav = portal
        .navigator
        .navigate(routes::ADMIN_RESOURCES)
        .await
        .unwrap();

    assert_eq!(nav.path, routes::HOME);
    assert_eq!(nav.redirects[0].reason, NavState::Redirecting);
    assert_eq!(nav.session.session(), None);
}

#[tokio::test]
async fn test_logout_then_navigate() {
    let backend = MockBackend::start().await.unwrap();
    let mut portal = signed_in(&backend, LEARNER_EMAIL).await;

    let destination = portal.auth.logout().await;
    let nav = portal
        .navigator
        .navigate(routes::LEARNER_DASHBOARD)
        .await
        .unwrap();

    assert_eq!(destination, routes::HOME);
    assert_eq!(nav.path, routes::HOME);
}
