//! Foundation types for Linux Quest.
//!
//! Shared by every crate in the workspace: the error taxonomy, timestamps
//! and the clock seam, and the output records handed to a renderer.

pub mod clock;
pub mod error;
pub mod output;

pub use clock::{Clock, FixedClock, SystemClock, Timestamp};
pub use error::{QuestError, Result};
pub use output::{LineKind, OutputLine};
