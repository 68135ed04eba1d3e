//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp, used for the `last_seen` field of device records.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_return_monotonic_utc_time_when_called_twice() {
        let first = now();
        let second = now();
        assert!(second >= first);
    }
}
