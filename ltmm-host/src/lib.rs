//! # ltmm-host: Host Integration for LTMM
//!
//! Glue between the host chat application and the synchronous `ltmm-core`
//! pipeline.
//!
//! ```text
//!   chat log ──▶ chat::last_user_message ─┐
//!   command argument ─────────────────────┴─▶ LtmService ──▶ WorldInfoStore
//!                                               │  load → parse → integrate → save
//!                                               ▼
//!                                          BatchReport
//! ```
//!
//! ## Modules
//!
//! - `chat`: chat log types and last-user-message lookup
//! - `settings`: persisted extension settings (enable flag, position, grammar, prompts)
//! - `service`: async per-document critical section around the store
//! - `roster`: observable wrapper over the character-order roster

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod chat;
pub mod error;
pub mod roster;
pub mod service;
pub mod settings;

pub use chat::{ChatMessage, last_user_message};
pub use error::HostError;
pub use roster::RosterHandle;
pub use service::LtmService;
pub use settings::ExtensionSettings;
