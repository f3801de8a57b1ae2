// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Publishing a new event.

use std::sync::Arc;

use chrono::NaiveDate;
use rollcall_core::types::Event;
use rollcall_core::{EventRepository, RollcallError};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::admission::AdmissionController;

/// Replaces the active event with a new one.
pub struct EventLifecycle {
    repo: Arc<dyn EventRepository>,
    gate: Arc<Mutex<()>>,
}

impl EventLifecycle {
    /// Shares the controller's repository and admission lock.
    pub fn new(admission: &AdmissionController) -> Self {
        Self {
            repo: admission.repository().clone(),
            gate: admission.gate(),
        }
    }

    /// Mark every active event past, then create the new one.
    ///
    /// If creation fails after the first step there is no active event,
    /// which reads as "registration closed" until an admin retries.
    pub async fn publish(
        &self,
        name: &str,
        date: NaiveDate,
        capacity: i64,
    ) -> Result<Event, RollcallError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RollcallError::InvalidInput(
                "Event name must not be empty.".into(),
            ));
        }
        if capacity <= 0 {
            return Err(RollcallError::InvalidInput(
                "Capacity must be a positive number.".into(),
            ));
        }

        let _guard = self.gate.lock().await;
        let retired = self.repo.mark_all_active_as_past().await?;
        let event = self
            .repo
            .create_event(name, date, capacity)
            .await
            .inspect_err(|e| {
                error!(
                    error = %e,
                    retired,
                    "event creation failed after retiring active events; no event is active"
                );
            })?;
        info!(event_id = event.id, name, %date, capacity, retired, "event published");
        Ok(event)
    }
}
