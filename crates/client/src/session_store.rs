//! The single owner of the session record.
//!
//! Everything else reads the session through [`SessionStore::current`] or a
//! [`SessionSubscription`]; only the store writes it. Each write advances a
//! generation counter. A refresh captures the generation it was issued at and
//! may only commit while that generation is still the latest, so:
//!
//! - of two overlapping refreshes, the one issued last wins regardless of
//!   which response arrives first;
//! - a refresh still in flight when [`SessionStore::clear`] or
//!   [`SessionStore::set`] runs is discarded.

use school_portal_core::{Session, SessionState};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::api::SessionBackend;

#[derive(Debug, Clone, Default)]
struct Snapshot {
    generation: u64,
    state: SessionState,
    /// The state was committed by a refresh whose session check failed.
    check_failed: bool,
}

/// Outcome of a session refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refreshed {
    /// State current once the refresh settled.
    pub state: SessionState,
    /// The session check errored and `state` is a stand-in `Absent`, not a
    /// signed-out reply from the backend.
    pub check_failed: bool,
}

/// Proof that a refresh was issued at a given generation.
///
/// Consumed by [`SessionStore::commit`].
#[derive(Debug)]
#[must_use = "a refresh ticket does nothing until committed"]
pub struct RefreshTicket {
    generation: u64,
}

impl RefreshTicket {
    /// Generation this refresh was issued at.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// Session state holder.
#[derive(Debug)]
pub struct SessionStore {
    tx: watch::Sender<Snapshot>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// A store whose first session check has not finished yet.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Snapshot::default());
        Self { tx }
    }

    /// The current session state.
    #[must_use]
    pub fn current(&self) -> SessionState {
        self.tx.borrow().state.clone()
    }

    /// The current state, and whether it stands in for a failed check.
    #[must_use]
    pub fn last_refresh(&self) -> Refreshed {
        let snapshot = self.tx.borrow();
        Refreshed {
            state: snapshot.state.clone(),
            check_failed: snapshot.check_failed,
        }
    }

    /// The current write generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.tx.borrow().generation
    }

    /// Watch the session for changes.
    #[must_use]
    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Replace the session, invalidating any refresh in flight.
    pub fn set(&self, session: Session) {
        self.write(SessionState::Present(session));
    }

    /// Drop the session, invalidating any refresh in flight.
    pub fn clear(&self) {
        self.write(SessionState::Absent);
    }

    fn write(&self, state: SessionState) {
        self.tx.send_modify(|snapshot| {
            snapshot.generation += 1;
            snapshot.state = state;
            snapshot.check_failed = false;
        });
    }

    /// Start a refresh: mark the state pending and hand out a ticket.
    pub fn begin_refresh(&self) -> RefreshTicket {
        let mut generation = 0;
        self.tx.send_modify(|snapshot| {
            snapshot.generation += 1;
            snapshot.state = SessionState::Pending;
            snapshot.check_failed = false;
            generation = snapshot.generation;
        });
        RefreshTicket { generation }
    }

    /// Commit the outcome of a refresh.
    ///
    /// Returns `false`, leaving the state untouched, if anything was written
    /// after the ticket was issued.
    pub fn commit(&self, ticket: RefreshTicket, state: SessionState) -> bool {
        self.commit_checked(ticket, state, false)
    }

    fn commit_checked(&self, ticket: RefreshTicket, state: SessionState, check_failed: bool) -> bool {
        self.tx.send_if_modified(|snapshot| {
            if snapshot.generation != ticket.generation {
                debug!(
                    ticket = ticket.generation,
                    latest = snapshot.generation,
                    "Discarding stale session refresh"
                );
                return false;
            }
            snapshot.state = state;
            snapshot.check_failed = check_failed;
            true
        })
    }

    /// Re-check the session with the backend.
    ///
    /// Any failure counts as "no session" and is flagged in the result.
    /// Returns the state current once this refresh has settled, which is a
    /// newer writer's state if this refresh was superseded.
    pub async fn refresh<B: SessionBackend>(&self, backend: &B) -> Refreshed {
        let ticket = self.begin_refresh();
        match backend.check_session().await {
            Ok(session) => self.commit(ticket, SessionState::from(session)),
            Err(error) => {
                warn!(error = %error, "Session check failed, treating as signed out");
                self.commit_checked(ticket, SessionState::Absent, true)
            }
        };
        self.last_refresh()
    }
}

/// Read-only view of the session that can wait for changes.
#[derive(Debug, Clone)]
pub struct SessionSubscription {
    rx: watch::Receiver<Snapshot>,
}

impl SessionSubscription {
    /// The current session state.
    #[must_use]
    pub fn current(&self) -> SessionState {
        self.rx.borrow().state.clone()
    }

    /// Wait for the next write. Returns `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<SessionState> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().state.clone())
    }

    /// Wait until no session check is in flight.
    pub async fn settled(&mut self) -> Option<SessionState> {
        self.settled_refresh().await.map(|refreshed| refreshed.state)
    }

    /// Like [`settled`](Self::settled), keeping the failed-check flag.
    pub async fn settled_refresh(&mut self) -> Option<Refreshed> {
        self.rx
            .wait_for(|snapshot| !snapshot.state.is_pending())
            .await
            .ok()
            .map(|snapshot| Refreshed {
                state: snapshot.state.clone(),
                check_failed: snapshot.check_failed,
            })
    }
}
