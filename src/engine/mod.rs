//! The clipwatch engine: lifecycle state machine, change-detection poll
//! loop, per-source alert rate limiting and the bounded event history.

pub mod history;
pub mod monitor;
pub mod rate_limiter;
pub mod service;

pub use history::EventHistory;
pub use monitor::MonitoringEngine;
pub use rate_limiter::RateLimiter;
pub use service::{EngineHandle, EngineService, EngineServiceError};
