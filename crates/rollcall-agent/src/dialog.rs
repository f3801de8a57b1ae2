// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Multi-turn registration dialog.
//!
//! `NoDialog -> AwaitingName -> AwaitingEmail -> NoDialog`, skipping the
//! steps whose field is not mandatory. The event id is captured when the
//! dialog starts, so a dialog finished after a new event was published is
//! rejected instead of registering for the wrong event.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use rollcall_config::model::RegistrationConfig;
use rollcall_core::types::{DialogState, EventId, UserId, UserIdentity};
use rollcall_core::{RollcallError, SessionStore};
use tracing::debug;

use crate::admission::{Admission, AdmissionController, Applicant};

const NAME_KEY: &str = "name";
const EMAIL_KEY: &str = "email";

pub const ASK_NAME: &str = "Please enter your first and last name.";
pub const ASK_EMAIL: &str = "Please enter your email address.";
pub const INVALID_NAME: &str = "Please enter both your first and last name, e.g. \"Ada Lovelace\".";
pub const INVALID_EMAIL: &str = "That does not look like an email address. Please try again.";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

/// A name needs at least two words. Returns the normalized name.
pub fn validate_name(raw: &str) -> Option<String> {
    let words: Vec<&str> = raw.split_whitespace().collect();
    (words.len() >= 2).then(|| words.join(" "))
}

pub fn validate_email(raw: &str) -> bool {
    EMAIL_RE.is_match(raw.trim())
}

/// Which profile fields must be collected before admission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DialogPolicy {
    pub name_required: bool,
    pub email_required: bool,
}

impl DialogPolicy {
    pub fn from_config(config: &RegistrationConfig) -> Self {
        Self {
            name_required: config.is_mandatory(NAME_KEY),
            email_required: config.is_mandatory(EMAIL_KEY),
        }
    }

    fn first_state(&self) -> Option<(DialogState, &'static str)> {
        if self.name_required {
            Some((DialogState::AwaitingName, ASK_NAME))
        } else if self.email_required {
            Some((DialogState::AwaitingEmail, ASK_EMAIL))
        } else {
            None
        }
    }
}

/// What the dialog did with one user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogStep {
    /// Ask the user something (the next question, or the same one again).
    Prompt(&'static str),
    /// The user was admitted.
    Completed(Admission),
    /// The user has no open dialog.
    NotInDialog,
}

pub struct DialogHandler {
    sessions: Arc<dyn SessionStore>,
    admission: Arc<AdmissionController>,
    policy: DialogPolicy,
}

impl DialogHandler {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        admission: Arc<AdmissionController>,
        policy: DialogPolicy,
    ) -> Self {
        Self {
            sessions,
            admission,
            policy,
        }
    }

    /// Handle a "register" request: admit at once if nothing needs asking,
    /// otherwise open the dialog.
    pub async fn begin_registration(
        &self,
        user: &UserIdentity,
    ) -> Result<DialogStep, RollcallError> {
        let repo = self.admission.repository();
        let event = repo
            .latest_active_event()
            .await?
            .filter(|e| !e.is_full())
            .ok_or(RollcallError::RegistrationClosed)?;
        let (registered, _) = repo.is_registered(user.id, event.id).await?;
        if registered {
            return Err(RollcallError::AlreadyRegistered {
                user_id: user.id,
                event_id: event.id,
            });
        }

        let profile = repo.find_user_profile(user.id).await?;
        let Some((state, question)) = self.policy.first_state().filter(|_| profile.is_none())
        else {
            let applicant = match profile {
                Some(p) => Applicant {
                    user: user.clone(),
                    name: p.name,
                    email: Some(p.email),
                },
                None => Applicant::from_identity(user),
            };
            let admission = self.admission.register_for(event.id, &applicant).await?;
            return Ok(DialogStep::Completed(admission));
        };

        self.sessions.clear_state(user.id);
        self.sessions.set_state(user.id, state, event.id);
        debug!(user_id = user.id, event_id = event.id, %state, "registration dialog started");
        Ok(DialogStep::Prompt(question))
    }

    /// Feed one free-text message into the user's dialog.
    ///
    /// A dialog opened for an event that is no longer active is dropped and
    /// the text is treated as if no dialog were open.
    pub async fn handle_text(
        &self,
        user: &UserIdentity,
        text: &str,
    ) -> Result<DialogStep, RollcallError> {
        let (state, event_id) = self.sessions.get_state(user.id);
        if state == DialogState::NoDialog {
            return Ok(DialogStep::NotInDialog);
        }
        let active = self
            .admission
            .repository()
            .latest_active_event()
            .await?
            .map(|e| e.id);
        if active != Some(event_id) {
            self.sessions.clear_state(user.id);
            debug!(user_id = user.id, event_id, ?active, "stale registration dialog dropped");
            return Ok(DialogStep::NotInDialog);
        }

        match state {
            DialogState::NoDialog => Ok(DialogStep::NotInDialog),
            DialogState::AwaitingName => {
                let Some(name) = validate_name(text) else {
                    return Ok(DialogStep::Prompt(INVALID_NAME));
                };
                self.sessions.set_data(user.id, NAME_KEY, &name);
                if self.policy.email_required {
                    self.sessions
                        .set_state(user.id, DialogState::AwaitingEmail, event_id);
                    Ok(DialogStep::Prompt(ASK_EMAIL))
                } else {
                    self.complete(user, event_id).await
                }
            }
            DialogState::AwaitingEmail => {
                if !validate_email(text) {
                    return Ok(DialogStep::Prompt(INVALID_EMAIL));
                }
                self.sessions.set_data(user.id, EMAIL_KEY, text.trim());
                self.complete(user, event_id).await
            }
        }
    }

    async fn complete(
        &self,
        user: &UserIdentity,
        event_id: EventId,
    ) -> Result<DialogStep, RollcallError> {
        let name = self.sessions.get_data(user.id, NAME_KEY);
        let email = self.sessions.get_data(user.id, EMAIL_KEY);
        let applicant = Applicant {
            user: user.clone(),
            name: if name.is_empty() {
                user.display_name()
            } else {
                name
            },
            email: (!email.is_empty()).then_some(email),
        };
        // The dialog ends here whether or not admission succeeds.
        let result = self.admission.register_for(event_id, &applicant).await;
        self.sessions.clear_state(user.id);
        result.map(DialogStep::Completed)
    }

    /// Abort the user's dialog. Returns whether one was open.
    pub fn cancel(&self, user_id: UserId) -> bool {
        let open = self.sessions.get_state(user_id).0 != DialogState::NoDialog;
        self.sessions.clear_state(user_id);
        open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::InMemorySessionStore;
    use chrono::NaiveDate;
    use rollcall_core::EventRepository;
    use rollcall_core::types::RegistrationWrite;
    use rollcall_test_utils::InMemoryRepository;

    fn ada() -> UserIdentity {
        UserIdentity {
            id: 1,
            username: Some("ada".into()),
            first_name: "Ada".into(),
            last_name: None,
        }
    }

    async fn handler(
        policy: DialogPolicy,
    ) -> (DialogHandler, Arc<InMemoryRepository>, Arc<InMemorySessionStore>) {
        let repo = Arc::new(InMemoryRepository::new());
        repo.create_event("Meetup", NaiveDate::from_ymd_opt(2026, 11, 5).unwrap(), 5)
            .await
            .unwrap();
        let sessions = Arc::new(InMemorySessionStore::new());
        let admission = Arc::new(AdmissionController::new(repo.clone()));
        (
            DialogHandler::new(sessions.clone(), admission, policy),
            repo,
            sessions,
        )
    }

    const BOTH: DialogPolicy = DialogPolicy {
        name_required: true,
        email_required: true,
    };

    #[test]
    fn name_needs_two_words() {
        assert_eq!(validate_name("  Ada   Lovelace "), Some("Ada Lovelace".into()));
        assert_eq!(validate_name("Ada"), None);
        assert_eq!(validate_name("   "), None);
    }

    #[test]
    fn email_pattern() {
        assert!(validate_email("ada@example.org"));
        assert!(validate_email(" first.last+tag@sub.example.co "));
        assert!(!validate_email("ada@example"));
        assert!(!validate_email("not an email"));
        assert!(!validate_email("a@b.c"));
    }

    #[test]
    fn policy_from_config() {
        let cfg = RegistrationConfig {
            mandatory_fields: vec!["EMAIL".into()],
        };
        let policy = DialogPolicy::from_config(&cfg);
        assert!(!policy.name_required);
        assert!(policy.email_required);
        assert_eq!(policy.first_state().unwrap().0, DialogState::AwaitingEmail);
    }

    #[tokio::test]
    async fn no_mandatory_fields_admits_immediately() {
        let (h, repo, sessions) = handler(DialogPolicy::default()).await;
        let step = h.begin_registration(&ada()).await.unwrap();
        let DialogStep::Completed(admission) = step else {
            panic!("expected immediate admission, got {step:?}");
        };
        assert_eq!(admission.write, RegistrationWrite::Inserted);
        assert!(sessions.is_empty());
        let (_, row) = repo.is_registered(1, admission.event.id).await.unwrap();
        assert_eq!(row.unwrap().name, "Ada");
    }

    #[tokio::test]
    async fn full_dialog_collects_name_and_email() {
        let (h, repo, sessions) = handler(BOTH).await;
        let user = ada();

        assert_eq!(h.begin_registration(&user).await.unwrap(), DialogStep::Prompt(ASK_NAME));
        assert_eq!(sessions.get_state(1).0, DialogState::AwaitingName);

        assert_eq!(h.handle_text(&user, "Ada").await.unwrap(), DialogStep::Prompt(INVALID_NAME));
        assert_eq!(sessions.get_state(1).0, DialogState::AwaitingName);

        assert_eq!(
            h.handle_text(&user, "Ada Lovelace").await.unwrap(),
            DialogStep::Prompt(ASK_EMAIL)
        );
        assert_eq!(
            h.handle_text(&user, "nope").await.unwrap(),
            DialogStep::Prompt(INVALID_EMAIL)
        );

        let step = h.handle_text(&user, "ada@example.org").await.unwrap();
        assert!(matches!(step, DialogStep::Completed(_)));
        assert_eq!(sessions.get_state(1), (DialogState::NoDialog, 0));

        let profile = repo.find_user_profile(1).await.unwrap().unwrap();
        assert_eq!(profile.name, "Ada Lovelace");
        assert_eq!(profile.email, "ada@example.org");
    }

    #[tokio::test]
    async fn stored_profile_skips_dialog() {
        let (h, repo, _) = handler(BOTH).await;
        let user = ada();
        h.begin_registration(&user).await.unwrap();
        h.handle_text(&user, "Ada Lovelace").await.unwrap();
        h.handle_text(&user, "ada@example.org").await.unwrap();
        h.admission.cancel(1).await.unwrap();

        let step = h.begin_registration(&user).await.unwrap();
        let DialogStep::Completed(admission) = step else {
            panic!("profile should skip the dialog, got {step:?}");
        };
        assert_eq!(admission.write, RegistrationWrite::Reactivated);
        let (_, row) = repo.is_registered(1, admission.event.id).await.unwrap();
        assert_eq!(row.unwrap().email.as_deref(), Some("ada@example.org"));
    }

    #[tokio::test]
    async fn dialog_for_replaced_event_is_dropped() {
        let (h, repo, sessions) = handler(BOTH).await;
        let user = ada();
        h.begin_registration(&user).await.unwrap();
        h.handle_text(&user, "Ada Lovelace").await.unwrap();

        repo.mark_all_active_as_past().await.unwrap();
        let next = repo
            .create_event("Next", NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(), 5)
            .await
            .unwrap();

        assert_eq!(
            h.handle_text(&user, "ada@example.org").await.unwrap(),
            DialogStep::NotInDialog
        );
        assert!(sessions.is_empty());
        assert!(!repo.is_registered(1, next.id).await.unwrap().0);

        // A fresh dialog targets the new event.
        assert_eq!(h.begin_registration(&user).await.unwrap(), DialogStep::Prompt(ASK_NAME));
        assert_eq!(sessions.get_state(1), (DialogState::AwaitingName, next.id));
    }

    #[tokio::test]
    async fn dialog_without_active_event_is_dropped() {
        let (h, repo, sessions) = handler(BOTH).await;
        let user = ada();
        h.begin_registration(&user).await.unwrap();
        repo.mark_all_active_as_past().await.unwrap();

        assert_eq!(
            h.handle_text(&user, "Ada Lovelace").await.unwrap(),
            DialogStep::NotInDialog
        );
        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn completion_after_event_change_is_closed() {
        let (h, repo, sessions) = handler(BOTH).await;
        let user = ada();
        h.begin_registration(&user).await.unwrap();
        h.handle_text(&user, "Ada Lovelace").await.unwrap();
        h.sessions.set_data(1, EMAIL_KEY, "ada@example.org");

        repo.mark_all_active_as_past().await.unwrap();
        repo.create_event("Next", NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(), 5)
            .await
            .unwrap();

        let (_, stale_event) = sessions.get_state(1);
        let err = h.complete(&user, stale_event).await.unwrap_err();
        assert!(matches!(err, RollcallError::RegistrationClosed));
        assert!(sessions.is_empty(), "dialog is closed even on failure");
    }

    #[tokio::test]
    async fn cancel_clears_open_dialog() {
        let (h, _, sessions) = handler(BOTH).await;
        let user = ada();
        assert!(!h.cancel(1));
        h.begin_registration(&user).await.unwrap();
        assert!(h.cancel(1));
        assert!(sessions.is_empty());
        assert_eq!(h.handle_text(&user, "Ada Lovelace").await.unwrap(), DialogStep::NotInDialog);
    }

    #[tokio::test]
    async fn full_event_does_not_open_dialog() {
        let repo = Arc::new(InMemoryRepository::new());
        repo.create_event("Tiny", NaiveDate::from_ymd_opt(2026, 11, 5).unwrap(), 1)
            .await
            .unwrap();
        let admission = Arc::new(AdmissionController::new(repo.clone()));
        admission
            .register(&Applicant::from_identity(&UserIdentity {
                id: 2,
                username: None,
                first_name: "Grace".into(),
                last_name: None,
            }))
            .await
            .unwrap();
        let sessions = Arc::new(InMemorySessionStore::new());
        let h = DialogHandler::new(sessions.clone(), admission, BOTH);
        assert!(matches!(
            h.begin_registration(&ada()).await.unwrap_err(),
            RollcallError::RegistrationClosed
        ));
        assert!(sessions.is_empty());
    }
}
