#![warn(missing_docs)]
//! Clipwatch is a passive clipboard awareness monitor: it detects when an
//! application outside the user's allowlist has altered the system clipboard
//! and notifies the user, without ever reading or storing clipboard contents.
//!
//! The crate contains the monitoring core only. Platform inspection (the
//! clipboard change counter and the foreground application) and alert
//! presentation are consumed through narrow traits in [`providers`] and
//! [`notification`]; a host embeds the engine by implementing those traits
//! and driving the [`engine::EngineService`] actor.

pub mod config;
pub mod engine;
pub mod models;
pub mod notification;
pub mod providers;
