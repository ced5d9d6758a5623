//! Wall-clock timestamps written into the session store and lesson reports.

/// `2026-10-19 14:03:07`, local time.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The current local time formatted with [`TIMESTAMP_FORMAT`].
pub fn now() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}
