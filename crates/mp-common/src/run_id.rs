//! Identifier shared by every match record computed in one process.
//!
//! ```
//! let run = mp_common::run_id::get();
//! assert_eq!(run.len(), 26);
//! assert!(mp_common::run_id::parse(run).is_some());
//! ```

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use ulid::Ulid;

static RUN: Lazy<Ulid> = Lazy::new(Ulid::new);
static RUN_STR: Lazy<String> = Lazy::new(|| RUN.to_string());

/// ULID of the current process, fixed at first access. Stored as
/// `match_run_id` so records from one batch can be grouped and replaced.
pub fn get() -> &'static str {
    &RUN_STR
}

/// When the current run started, to millisecond precision.
pub fn started_at() -> DateTime<Utc> {
    DateTime::<Utc>::from(RUN.datetime())
}

/// Fresh ULID for sub-runs or request ids.
pub fn generate() -> String {
    Ulid::new().to_string()
}

pub fn parse(value: &str) -> Option<Ulid> {
    Ulid::from_string(value).ok()
}
