// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capacity-checked registration, cancellation and check-in.
//!
//! Every decision runs under one async mutex: load the active event, check
//! capacity, check the user's row, write the row, adjust the count. Two
//! users can therefore never both take the last seat.

use std::sync::Arc;

use chrono::Utc;
use rollcall_core::types::{
    Event, EventId, Registration, RegistrationWrite, UserId, UserIdentity, VisitUpdate,
};
use rollcall_core::{EventRepository, RollcallError};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Who is registering, with the profile fields to store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applicant {
    pub user: UserIdentity,
    pub name: String,
    pub email: Option<String>,
}

impl Applicant {
    /// Applicant named after the platform profile.
    pub fn from_identity(user: &UserIdentity) -> Self {
        Self {
            name: user.display_name(),
            user: user.clone(),
            email: None,
        }
    }

    fn to_registration(&self, event_id: EventId) -> Registration {
        Registration {
            user_id: self.user.id,
            event_id,
            username: self.user.handle(),
            name: self.name.clone(),
            email: self.email.clone().filter(|e| !e.is_empty()),
            registered_at: Utc::now(),
            registered: true,
            visited: false,
        }
    }
}

/// A successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    /// The event with its count after the admission.
    pub event: Event,
    pub write: RegistrationWrite,
}

/// Result of a check-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckIn {
    /// The user had a row for the event.
    Confirmed(Event),
    /// The user came without registering; a walk-in row was created.
    WalkIn(Event),
}

/// Seats left and the user's own standing for the active event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventStatus {
    pub event: Event,
    pub remaining: i64,
    pub registered: bool,
}

/// Admission decisions against the single active event.
pub struct AdmissionController {
    repo: Arc<dyn EventRepository>,
    gate: Arc<Mutex<()>>,
}

impl AdmissionController {
    pub fn new(repo: Arc<dyn EventRepository>) -> Self {
        Self {
            repo,
            gate: Arc::new(Mutex::new(())),
        }
    }

    pub fn repository(&self) -> &Arc<dyn EventRepository> {
        &self.repo
    }

    /// The lock every admission decision holds. Shared with [`crate::EventLifecycle`].
    pub fn gate(&self) -> Arc<Mutex<()>> {
        self.gate.clone()
    }

    /// Register for whatever event is active now.
    pub async fn register(&self, applicant: &Applicant) -> Result<Admission, RollcallError> {
        self.admit(None, applicant).await
    }

    /// Register for `event_id`, failing if it is no longer the active event.
    pub async fn register_for(
        &self,
        event_id: EventId,
        applicant: &Applicant,
    ) -> Result<Admission, RollcallError> {
        self.admit(Some(event_id), applicant).await
    }

    async fn admit(
        &self,
        expected: Option<EventId>,
        applicant: &Applicant,
    ) -> Result<Admission, RollcallError> {
        let user_id = applicant.user.id;
        let _guard = self.gate.lock().await;

        let Some(event) = self.repo.latest_active_event().await? else {
            debug!(user_id, "registration rejected: no active event");
            return Err(RollcallError::RegistrationClosed);
        };
        if expected.is_some_and(|id| id != event.id) {
            debug!(user_id, event_id = event.id, ?expected, "registration rejected: event changed");
            return Err(RollcallError::RegistrationClosed);
        }
        if event.is_full() {
            debug!(user_id, event_id = event.id, "registration rejected: event full");
            return Err(RollcallError::RegistrationClosed);
        }

        let (registered, _) = self.repo.is_registered(user_id, event.id).await?;
        if registered {
            debug!(user_id, event_id = event.id, "registration rejected: already registered");
            return Err(RollcallError::AlreadyRegistered {
                user_id,
                event_id: event.id,
            });
        }

        let write = match self.repo.register(&applicant.to_registration(event.id)).await {
            Ok(write) => write,
            Err(RollcallError::DuplicateRegistration { user_id, event_id }) => {
                return Err(RollcallError::AlreadyRegistered { user_id, event_id });
            }
            Err(e) => {
                error!(user_id, event_id = event.id, error = %e, "failed to write registration");
                return Err(e);
            }
        };

        let counted = match self.repo.increment_count(event.id).await {
            Ok(counted) => counted,
            Err(e) => {
                error!(user_id, event_id = event.id, error = %e, "failed to increment count");
                self.undo_register(user_id, event.id).await;
                return Err(e);
            }
        };
        if !counted {
            // Only reachable if the count moved outside this controller.
            warn!(user_id, event_id = event.id, "count at capacity after row write");
            self.undo_register(user_id, event.id).await;
            return Err(RollcallError::RegistrationClosed);
        }

        let event = Event {
            registration_count: event.registration_count + 1,
            ..event
        };
        info!(
            user_id,
            event_id = event.id,
            count = event.registration_count,
            capacity = event.capacity,
            ?write,
            "user registered"
        );
        Ok(Admission { event, write })
    }

    async fn undo_register(&self, user_id: UserId, event_id: EventId) {
        if let Err(e) = self.repo.unregister(user_id, event_id).await {
            error!(user_id, event_id, error = %e, "failed to roll back registration row");
        }
    }

    async fn undo_cancel(&self, row: &Registration) {
        if let Err(e) = self.repo.register(row).await {
            error!(
                user_id = row.user_id,
                event_id = row.event_id,
                error = %e,
                "failed to restore cancelled registration row"
            );
        }
    }

    /// Cancel the user's registration for the active event.
    ///
    /// Allowed even when the event is full.
    pub async fn cancel(&self, user_id: UserId) -> Result<Event, RollcallError> {
        let _guard = self.gate.lock().await;

        let Some(event) = self.repo.latest_active_event().await? else {
            return Err(RollcallError::RegistrationClosed);
        };
        let not_registered = RollcallError::NotRegistered {
            user_id,
            event_id: event.id,
        };

        let (registered, row) = self.repo.is_registered(user_id, event.id).await?;
        let Some(row) = row.filter(|_| registered) else {
            debug!(user_id, event_id = event.id, "cancel rejected: not registered");
            return Err(not_registered);
        };
        if !self.repo.unregister(user_id, event.id).await? {
            debug!(user_id, event_id = event.id, "cancel rejected: not registered");
            return Err(not_registered);
        }

        let released = match self.repo.decrement_count(event.id).await {
            Ok(released) => released,
            Err(e) => {
                error!(user_id, event_id = event.id, error = %e, "failed to decrement count");
                self.undo_cancel(&row).await;
                return Err(e);
            }
        };
        let event = Event {
            registration_count: if released {
                event.registration_count - 1
            } else {
                event.registration_count
            },
            ..event
        };
        info!(
            user_id,
            event_id = event.id,
            count = event.registration_count,
            "registration cancelled"
        );
        Ok(event)
    }

    /// Record attendance at the active event. Never changes the count.
    pub async fn check_in(&self, visitor: &UserIdentity) -> Result<CheckIn, RollcallError> {
        let _guard = self.gate.lock().await;

        let event = self
            .repo
            .latest_active_event()
            .await?
            .ok_or(RollcallError::NoActiveEvent)?;
        let outcome = self.repo.update_visited(visitor, event.id, true).await?;
        info!(user_id = visitor.id, event_id = event.id, ?outcome, "check-in recorded");
        Ok(match outcome {
            VisitUpdate::Updated => CheckIn::Confirmed(event),
            VisitUpdate::WalkInCreated => CheckIn::WalkIn(event),
        })
    }

    /// Remaining seats and whether `user_id` is registered.
    pub async fn status(&self, user_id: UserId) -> Result<EventStatus, RollcallError> {
        let event = self
            .repo
            .latest_active_event()
            .await?
            .ok_or(RollcallError::NoActiveEvent)?;
        let (registered, _) = self.repo.is_registered(user_id, event.id).await?;
        Ok(EventStatus {
            remaining: event.remaining_seats(),
            registered,
            event,
        })
    }

    /// Repair the active event's count from its rows. Run once at startup.
    pub async fn reconcile_active(&self) -> Result<Option<(i64, i64)>, RollcallError> {
        let _guard = self.gate.lock().await;
        let Some(event) = self.repo.latest_active_event().await? else {
            return Ok(None);
        };
        let (before, after) = self.repo.reconcile_count(event.id).await?;
        if before != after {
            warn!(event_id = event.id, before, after, "registration count drift repaired");
        }
        Ok(Some((before, after)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use rollcall_test_utils::InMemoryRepository;

    fn user(id: UserId) -> UserIdentity {
        UserIdentity {
            id,
            username: Some(format!("user{id}")),
            first_name: format!("First{id}"),
            last_name: Some("Last".into()),
        }
    }

    fn applicant(id: UserId) -> Applicant {
        Applicant::from_identity(&user(id))
    }

    async fn controller(capacity: i64) -> (AdmissionController, Arc<InMemoryRepository>) {
        let repo = Arc::new(InMemoryRepository::new());
        repo.create_event("Rust meetup", NaiveDate::from_ymd_opt(2026, 11, 5).unwrap(), capacity)
            .await
            .unwrap();
        (AdmissionController::new(repo.clone()), repo)
    }

    #[tokio::test]
    async fn capacity_two_scenario() {
        let (ctl, repo) = controller(2).await;

        ctl.register(&applicant(1)).await.unwrap();
        let b = ctl.register(&applicant(2)).await.unwrap();
        assert_eq!(b.event.registration_count, 2);

        let c = ctl.register(&applicant(3)).await.unwrap_err();
        assert!(matches!(c, RollcallError::RegistrationClosed));

        let after_cancel = ctl.cancel(1).await.unwrap();
        assert_eq!(after_cancel.registration_count, 1);

        ctl.register(&applicant(3)).await.unwrap();
        let event = repo.latest_active_event().await.unwrap().unwrap();
        assert_eq!(event.registration_count, 2);
        assert_eq!(repo.count_registered(event.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn no_active_event_closes_registration() {
        let ctl = AdmissionController::new(Arc::new(InMemoryRepository::new()));
        assert!(matches!(
            ctl.register(&applicant(1)).await.unwrap_err(),
            RollcallError::RegistrationClosed
        ));
        assert!(matches!(
            ctl.check_in(&user(1)).await.unwrap_err(),
            RollcallError::NoActiveEvent
        ));
    }

    #[tokio::test]
    async fn second_register_is_rejected_without_double_count() {
        let (ctl, repo) = controller(5).await;
        ctl.register(&applicant(1)).await.unwrap();
        let err = ctl.register(&applicant(1)).await.unwrap_err();
        assert!(matches!(err, RollcallError::AlreadyRegistered { user_id: 1, .. }));
        let event = repo.latest_active_event().await.unwrap().unwrap();
        assert_eq!(event.registration_count, 1);
    }

    #[tokio::test]
    async fn cancel_without_registration_leaves_count() {
        let (ctl, repo) = controller(5).await;
        ctl.register(&applicant(1)).await.unwrap();
        let err = ctl.cancel(2).await.unwrap_err();
        assert!(matches!(err, RollcallError::NotRegistered { user_id: 2, .. }));
        let event = repo.latest_active_event().await.unwrap().unwrap();
        assert_eq!(event.registration_count, 1);
    }

    #[tokio::test]
    async fn cancel_is_allowed_when_full() {
        let (ctl, _) = controller(1).await;
        ctl.register(&applicant(1)).await.unwrap();
        let event = ctl.cancel(1).await.unwrap();
        assert_eq!(event.registration_count, 0);
    }

    #[tokio::test]
    async fn walk_in_does_not_touch_count() {
        let (ctl, repo) = controller(1).await;
        ctl.register(&applicant(1)).await.unwrap();

        assert!(matches!(ctl.check_in(&user(1)).await.unwrap(), CheckIn::Confirmed(_)));
        assert!(matches!(ctl.check_in(&user(9)).await.unwrap(), CheckIn::WalkIn(_)));

        let event = repo.latest_active_event().await.unwrap().unwrap();
        assert_eq!(event.registration_count, 1);
        let (registered, row) = repo.is_registered(9, event.id).await.unwrap();
        assert!(!registered);
        assert!(row.unwrap().visited);
    }

    #[tokio::test]
    async fn walk_in_can_register_later() {
        let (ctl, repo) = controller(3).await;
        ctl.check_in(&user(4)).await.unwrap();
        let admission = ctl.register(&applicant(4)).await.unwrap();
        assert_eq!(admission.write, RegistrationWrite::Reactivated);
        let (_, row) = repo.is_registered(4, admission.event.id).await.unwrap();
        assert!(row.unwrap().visited, "attendance survives registration");
    }

    #[tokio::test]
    async fn register_for_stale_event_is_closed() {
        let (ctl, repo) = controller(3).await;
        let old = repo.latest_active_event().await.unwrap().unwrap();
        repo.mark_all_active_as_past().await.unwrap();
        repo.create_event("Next", NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(), 3)
            .await
            .unwrap();
        let err = ctl.register_for(old.id, &applicant(1)).await.unwrap_err();
        assert!(matches!(err, RollcallError::RegistrationClosed));
    }

    #[tokio::test]
    async fn failed_increment_rolls_back_row() {
        let (ctl, repo) = controller(3).await;
        repo.fail_next_increment();
        let err = ctl.register(&applicant(1)).await.unwrap_err();
        assert!(matches!(err, RollcallError::Storage { .. }));

        let event = repo.latest_active_event().await.unwrap().unwrap();
        assert_eq!(event.registration_count, 0);
        assert_eq!(repo.count_registered(event.id).await.unwrap(), 0);
        // The user can try again.
        ctl.register(&applicant(1)).await.unwrap();
    }

    #[tokio::test]
    async fn failed_decrement_restores_row() {
        let (ctl, repo) = controller(3).await;
        ctl.register(&applicant(1)).await.unwrap();
        ctl.register(&applicant(2)).await.unwrap();

        repo.fail_next_decrement();
        let err = ctl.cancel(1).await.unwrap_err();
        assert!(matches!(err, RollcallError::Storage { .. }));

        let event = repo.latest_active_event().await.unwrap().unwrap();
        assert_eq!(event.registration_count, 2);
        assert_eq!(repo.count_registered(event.id).await.unwrap(), 2);
        assert!(repo.is_registered(1, event.id).await.unwrap().0);

        let event = ctl.cancel(1).await.unwrap();
        assert_eq!(event.registration_count, 1);
    }

    #[tokio::test]
    async fn status_reports_remaining_and_membership() {
        let (ctl, _) = controller(3).await;
        ctl.register(&applicant(1)).await.unwrap();
        let status = ctl.status(1).await.unwrap();
        assert_eq!(status.remaining, 2);
        assert!(status.registered);
        assert!(!ctl.status(2).await.unwrap().registered);
    }

    #[tokio::test]
    async fn reconcile_repairs_drift() {
        let (ctl, repo) = controller(3).await;
        let event = repo.latest_active_event().await.unwrap().unwrap();
        repo.increment_count(event.id).await.unwrap();
        assert_eq!(ctl.reconcile_active().await.unwrap(), Some((1, 0)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_registrations_never_oversell() {
        let (ctl, repo) = controller(10).await;
        let ctl = Arc::new(ctl);
        let handles: Vec<_> = (1..=50)
            .map(|id| {
                let ctl = ctl.clone();
                tokio::spawn(async move { ctl.register(&applicant(id)).await.is_ok() })
            })
            .collect();
        let mut admitted = 0;
        for h in handles {
            if h.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 10);
        let event = repo.latest_active_event().await.unwrap().unwrap();
        assert_eq!(event.registration_count, 10);
        assert_eq!(repo.count_registered(event.id).await.unwrap(), 10);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Register(UserId),
        Cancel(UserId),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1i64..8).prop_map(Op::Register),
            (1i64..8).prop_map(Op::Cancel),
        ]
    }

    proptest! {
        #[test]
        fn count_matches_registered_rows(capacity in 1i64..5, ops in prop::collection::vec(op(), 0..40)) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let (ctl, repo) = controller(capacity).await;
                for op in ops {
                    let _ = match op {
                        Op::Register(id) => ctl.register(&applicant(id)).await.map(|_| ()),
                        Op::Cancel(id) => ctl.cancel(id).await.map(|_| ()),
                    };
                    let event = repo.latest_active_event().await.unwrap().unwrap();
                    let rows = repo.count_registered(event.id).await.unwrap();
                    prop_assert!(event.registration_count >= 0);
                    prop_assert!(event.registration_count <= capacity);
                    prop_assert_eq!(event.registration_count, rows);
                }
                Ok(())
            })?;
        }
    }
}
