// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Rollcall registration bot.
//!
//! Holds the error type, the domain types (events, registrations, dialog
//! state, gateway actions), and the traits every other crate implements or
//! consumes.

pub mod error;
pub mod traits;
pub mod types;

pub use error::RollcallError;
pub use types::{
    AdapterType, DialogState, Event, EventId, EventState, HealthStatus, Registration, UserId,
};

pub use traits::{
    ChannelAdapter, EventRepository, PluginAdapter, SessionStore, StorageAdapter,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_trait_seams_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_channel_adapter<T: ChannelAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
        fn _assert_repository<T: EventRepository>() {}
        fn _assert_session_store<T: SessionStore>() {}
    }

    #[test]
    fn traits_are_object_safe() {
        fn _repo(_: &dyn EventRepository) {}
        fn _sessions(_: &dyn SessionStore) {}
        fn _channel(_: &dyn ChannelAdapter) {}
    }
}
