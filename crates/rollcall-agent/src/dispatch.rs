// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns one inbound action into the replies to send back.

use std::sync::Arc;

use rollcall_config::RollcallConfig;
use rollcall_core::types::{
    ActionKind, Button, Event, InboundAction, OutboundReply, REGISTER_TOKEN, REMOVE_TOKEN,
    ReplyBody, UserIdentity,
};
use rollcall_core::{EventRepository, RollcallError, SessionStore};
use tracing::{debug, error, info, warn};

use crate::admission::{Admission, AdmissionController, CheckIn};
use crate::auth::AdminPolicy;
use crate::commands::{ADD_EMAIL_USAGE, Command, parse_add_event};
use crate::dialog::{DialogHandler, DialogPolicy, DialogStep, INVALID_EMAIL, validate_email};
use crate::lifecycle::EventLifecycle;
use crate::{qr, report};

const REGISTER_LABEL: &str = "Register";
const REMOVE_LABEL: &str = "Changed my mind, remove me";

fn format_date(event: &Event) -> String {
    event.date.format("%d.%m.%Y").to_string()
}

fn seats_left(event: &Event) -> String {
    format!("Seats left: {}", event.remaining_seats())
}

/// Routes commands, button presses and dialog text to the admission,
/// lifecycle and dialog components.
pub struct Dispatcher {
    admission: Arc<AdmissionController>,
    lifecycle: EventLifecycle,
    dialog: DialogHandler,
    admins: AdminPolicy,
    bot_name: String,
    bot_username: Option<String>,
}

impl Dispatcher {
    pub fn new(
        repo: Arc<dyn EventRepository>,
        sessions: Arc<dyn SessionStore>,
        config: &RollcallConfig,
    ) -> Self {
        let admission = Arc::new(AdmissionController::new(repo));
        Self {
            lifecycle: EventLifecycle::new(&admission),
            dialog: DialogHandler::new(
                sessions,
                admission.clone(),
                DialogPolicy::from_config(&config.registration),
            ),
            admission,
            admins: AdminPolicy::from_config(&config.telegram),
            bot_name: config.bot.name.clone(),
            bot_username: config.telegram.bot_username.clone(),
        }
    }

    pub fn admission(&self) -> &Arc<AdmissionController> {
        &self.admission
    }

    /// Handle one action. Never fails: errors become a reply.
    pub async fn handle(&self, action: InboundAction) -> Vec<OutboundReply> {
        let InboundAction {
            user,
            chat_id,
            kind,
        } = action;

        let (result, callback_id) = match kind {
            ActionKind::Command { name, args } => {
                (self.on_command(&user, chat_id, &name, &args).await, None)
            }
            ActionKind::Button { token, callback_id } => (
                self.on_button(&user, chat_id, &token, &callback_id).await,
                Some(callback_id),
            ),
            ActionKind::Text(text) => (self.on_text(&user, chat_id, &text).await, None),
        };

        match result {
            Ok(replies) => replies,
            Err(e) => {
                if e.is_rejection() {
                    debug!(user_id = user.id, error = %e, "request rejected");
                } else {
                    error!(user_id = user.id, error = %e, "request failed");
                }
                let message = e.user_message();
                let mut replies = Vec::with_capacity(2);
                if let Some(callback_id) = callback_id {
                    replies.push(OutboundReply::notice(chat_id, callback_id, message.clone()));
                }
                replies.push(OutboundReply::text(chat_id, message));
                replies
            }
        }
    }

    async fn on_command(
        &self,
        user: &UserIdentity,
        chat_id: i64,
        name: &str,
        args: &str,
    ) -> Result<Vec<OutboundReply>, RollcallError> {
        let command = Command::parse(name, args);
        debug!(user_id = user.id, ?command, "command received");

        if command.requires_admin() && !self.admins.is_admin(user) {
            warn!(user_id = user.id, username = %user.handle(), ?command, "admin command denied");
            return Err(RollcallError::Unauthorized {
                action: format!("/{}", name.trim_start_matches('/')),
            });
        }

        match command {
            Command::Start => {
                let welcome = OutboundReply::text(
                    chat_id,
                    format!(
                        "Welcome to {}!\nUse /start to register for the meetup or cancel your \
                         registration.\nUse /state to see your registration status.",
                        self.bot_name
                    ),
                );
                let mut replies = vec![welcome];
                match self.attendance_prompt(user, chat_id).await {
                    Ok(prompt) => replies.extend(prompt),
                    Err(e) if e.is_rejection() => {
                        replies.push(OutboundReply::text(chat_id, e.user_message()));
                    }
                    Err(e) => return Err(e),
                }
                Ok(replies)
            }
            Command::CheckIn => {
                let text = match self.admission.check_in(user).await? {
                    CheckIn::Confirmed(_) => "Attendance recorded. Thanks for coming!",
                    CheckIn::WalkIn(_) => {
                        "You are checked in as a visitor without a prior registration."
                    }
                };
                Ok(vec![OutboundReply::text(chat_id, text)])
            }
            Command::Register => Ok(vec![OutboundReply::prompt(
                chat_id,
                "Press the button below to register.",
                vec![Button::new(REGISTER_LABEL, REGISTER_TOKEN)],
            )]),
            Command::State => {
                let status = self.admission.status(user.id).await?;
                let standing = if status.registered {
                    "You are registered."
                } else {
                    "You are not registered."
                };
                Ok(vec![OutboundReply::text(
                    chat_id,
                    format!("{}\n{standing}", seats_left(&status.event)),
                )])
            }
            Command::AddEmail(email) => {
                if email.is_empty() {
                    return Err(RollcallError::InvalidInput(ADD_EMAIL_USAGE.into()));
                }
                if !validate_email(&email) {
                    return Err(RollcallError::InvalidInput(INVALID_EMAIL.into()));
                }
                let changed = self
                    .admission
                    .repository()
                    .update_user_email(user.id, &email)
                    .await?;
                let text = if changed == 0 {
                    "You have no registration to attach an email to yet."
                } else {
                    info!(user_id = user.id, rows = changed, "email updated");
                    "Email updated!"
                };
                Ok(vec![OutboundReply::text(chat_id, text)])
            }
            Command::Cancel => {
                let text = if self.dialog.cancel(user.id) {
                    "Registration cancelled. Use /start to begin again."
                } else {
                    "There is nothing to cancel."
                };
                Ok(vec![OutboundReply::text(chat_id, text)])
            }
            Command::AddEvent(args) => {
                let new = parse_add_event(&args)?;
                let event = self
                    .lifecycle
                    .publish(&new.name, new.date, new.capacity)
                    .await?;
                Ok(vec![OutboundReply::text(
                    chat_id,
                    format!(
                        "Event \"{}\" on {} published with {} seats.",
                        event.name,
                        format_date(&event),
                        event.capacity
                    ),
                )])
            }
            Command::QrCode => self.check_in_qr(chat_id).await,
            Command::Export => {
                let bytes = report::export_csv(self.admission.repository().as_ref()).await?;
                Ok(vec![OutboundReply {
                    chat_id,
                    body: ReplyBody::Document {
                        file_name: report::EXPORT_FILE_NAME.to_string(),
                        bytes,
                        caption: Some("All registrations".to_string()),
                    },
                }])
            }
            Command::Unknown(_) => Ok(vec![OutboundReply::text(chat_id, "Unknown command.")]),
        }
    }

    async fn check_in_qr(&self, chat_id: i64) -> Result<Vec<OutboundReply>, RollcallError> {
        let Some(bot_username) = self.bot_username.as_deref() else {
            return Err(RollcallError::InvalidInput(
                "The bot username is not configured, so no check-in link can be built.".into(),
            ));
        };
        let event = self
            .admission
            .repository()
            .latest_active_event()
            .await?
            .ok_or(RollcallError::NoActiveEvent)?;
        let svg = qr::render_svg(&qr::check_in_link(bot_username))?;
        Ok(vec![OutboundReply {
            chat_id,
            body: ReplyBody::Document {
                file_name: format!("checkin-{}.svg", event.id),
                bytes: svg.into_bytes(),
                caption: Some(format!(
                    "Check-in QR code for {} ({})",
                    event.name,
                    format_date(&event)
                )),
            },
        }])
    }

    async fn on_button(
        &self,
        user: &UserIdentity,
        chat_id: i64,
        token: &str,
        callback_id: &str,
    ) -> Result<Vec<OutboundReply>, RollcallError> {
        match token {
            REGISTER_TOKEN => match self.dialog.begin_registration(user).await? {
                DialogStep::Completed(admission) => {
                    Ok(admitted(chat_id, Some(callback_id), &admission))
                }
                DialogStep::Prompt(question) => Ok(vec![
                    OutboundReply::notice(chat_id, callback_id, "A few details first"),
                    OutboundReply::text(chat_id, question),
                ]),
                DialogStep::NotInDialog => Ok(vec![OutboundReply::notice(
                    chat_id,
                    callback_id,
                    "Nothing to do",
                )]),
            },
            REMOVE_TOKEN => {
                let event = self.admission.cancel(user.id).await?;
                Ok(vec![
                    OutboundReply::notice(chat_id, callback_id, "Registration removed!"),
                    OutboundReply::text(chat_id, seats_left(&event)),
                ])
            }
            other => {
                warn!(user_id = user.id, token = other, "unknown button token");
                Ok(vec![OutboundReply::notice(
                    chat_id,
                    callback_id,
                    "Unknown action",
                )])
            }
        }
    }

    async fn on_text(
        &self,
        user: &UserIdentity,
        chat_id: i64,
        text: &str,
    ) -> Result<Vec<OutboundReply>, RollcallError> {
        match self.dialog.handle_text(user, text).await? {
            DialogStep::NotInDialog => self.attendance_prompt(user, chat_id).await,
            DialogStep::Prompt(question) => Ok(vec![OutboundReply::text(chat_id, question)]),
            DialogStep::Completed(admission) => Ok(admitted(chat_id, None, &admission)),
        }
    }

    /// "Are you coming?" with a register or remove button, depending on the
    /// user's standing.
    async fn attendance_prompt(
        &self,
        user: &UserIdentity,
        chat_id: i64,
    ) -> Result<Vec<OutboundReply>, RollcallError> {
        let repo = self.admission.repository();
        let event = repo
            .latest_active_event()
            .await?
            .ok_or(RollcallError::RegistrationClosed)?;
        let (registered, _) = repo.is_registered(user.id, event.id).await?;
        let button = if registered {
            Button::new(REMOVE_LABEL, REMOVE_TOKEN)
        } else if event.is_full() {
            return Err(RollcallError::RegistrationClosed);
        } else {
            Button::new(REGISTER_LABEL, REGISTER_TOKEN)
        };
        Ok(vec![OutboundReply::prompt(
            chat_id,
            format!("Are you coming to {} on {}?", event.name, format_date(&event)),
            vec![button],
        )])
    }
}

fn admitted(chat_id: i64, callback_id: Option<&str>, admission: &Admission) -> Vec<OutboundReply> {
    let event = &admission.event;
    let mut replies = Vec::with_capacity(2);
    if let Some(callback_id) = callback_id {
        replies.push(OutboundReply::notice(
            chat_id,
            callback_id,
            "Registration successful!",
        ));
    }
    replies.push(OutboundReply::text(
        chat_id,
        format!(
            "You are registered for {} on {}.\n{}",
            event.name,
            format_date(event),
            seats_left(event)
        ),
    ));
    replies
}
