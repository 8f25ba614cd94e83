//! Utility functions for pftrack.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::OnceLock;

/// Global set of warned messages (for warn_once).
static WARNED_MESSAGES: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();

/// Log a warning message only once per process.
///
/// Subsequent calls with the same message are ignored.
pub fn warn_once(message: &str) {
    let warned = WARNED_MESSAGES.get_or_init(|| Mutex::new(HashSet::new()));
    // A poisoned lock only means another thread panicked mid-insert; the set is still usable.
    let mut guard = match warned.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if guard.insert(message.to_string()) {
        log::warn!("{}", message);
    }
}

/// Floor a coordinate to an integer pixel index.
///
/// Non-finite values map to `i64::MIN`, which always lands outside any frame.
pub fn floor_to_i64(value: f64) -> i64 {
    if value.is_finite() {
        value.floor() as i64
    } else {
        i64::MIN
    }
}
