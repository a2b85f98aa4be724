//! # LTMM Core Library
//!
//! Turns `LTM - ...` tags embedded in chat messages into World Info
//! (lorebook) entries for a host chat application.
//!
//! The pipeline has two stages, composed in one direction:
//!
//! - **Parse**: [`TagParser`] scans free text and decodes every tag
//!   occurrence into an [`LtmEntry`].
//! - **Integrate**: [`integrator::integrate`] synthesises a complete
//!   [`WorldInfoEntry`] from an entry, assigns it a fresh [`Uid`] and inserts
//!   it into a [`WorldInfoDocument`].
//!
//! ```text
//!   message text ──▶ TagParser ──▶ [LtmEntry] ──▶ integrate ──▶ WorldInfoDocument
//!                                                   ▲
//!                                          Position (caller config)
//! ```
//!
//! Around that core sit the character [`PromptBook`], the character-order
//! [`Roster`], document storage ([`persistence`]) and runtime counters.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod integrator;
pub mod metrics;
pub mod parser;
pub mod persistence;
pub mod prompts;
pub mod roster;
pub mod types;
pub mod world_info;

pub use config::LtmmConfig;
pub use error::LtmmError;
pub use integrator::{BatchReport, integrate, integrate_batch};
pub use parser::TagParser;
pub use prompts::PromptBook;
pub use roster::Roster;
pub use types::*;
pub use world_info::{WorldInfoDocument, WorldInfoEntry, WorldInfoLibrary};
