//! This module defines the interfaces through which the engine observes the
//! host platform. Clipwatch never inspects clipboard contents; these traits
//! expose metadata only.

pub mod traits;

pub use traits::{ClipboardSignal, ForegroundSignal, SignalError, SourceInfo};
