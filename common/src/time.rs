use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch, as reported by the wall clock
pub fn current_time_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_time_millis_is_after_2020() {
        assert!(current_time_millis() > 1_577_836_800_000);
    }
}
