// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the admission core and its collaborators.
//!
//! Adapters that talk to the outside world (gateway, storage) extend
//! [`PluginAdapter`] and use `#[async_trait]` for dynamic dispatch. The
//! session store is synchronous because it never performs I/O.

pub mod adapter;
pub mod channel;
pub mod repository;
pub mod session;
pub mod storage;

pub use adapter::PluginAdapter;
pub use channel::ChannelAdapter;
pub use repository::EventRepository;
pub use session::SessionStore;
pub use storage::StorageAdapter;
