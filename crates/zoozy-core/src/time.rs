use chrono::{DateTime, Utc};

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Stored timestamps are UTC milliseconds; out-of-range values collapse to the epoch.
pub fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_round_trip_keeps_precision() {
        let now = now_millis();
        assert_eq!(from_millis(now).timestamp_millis(), now);
    }

    #[test]
    fn out_of_range_millis_fall_back_to_epoch() {
        assert_eq!(from_millis(i64::MAX), DateTime::<Utc>::default());
    }
}
