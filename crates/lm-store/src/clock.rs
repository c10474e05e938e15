//! Wall-clock access. Kept out of `lm-core` so the engine stays pure.

use chrono::{Local, SecondsFormat, Utc};

/// Today's local calendar day as `YYYY-MM-DD`.
pub fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Current local time as `HH:MM`, as written into daily-note events.
pub fn clock_hhmm() -> String {
    Local::now().format("%H:%M").to_string()
}

/// Current UTC timestamp in ISO-8601 format.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_today_is_calendar_day() {
        assert!(lm_core::is_calendar_day(&today()));
    }

    #[test]
    fn test_now_is_utc_iso() {
        let ts = now_iso8601();
        assert!(ts.starts_with("20"), "timestamp should be in 2000s: {ts}");
        assert!(ts.ends_with('Z'));
    }

    #[test]
    fn test_clock_format() {
        let hhmm = clock_hhmm();
        assert_eq!(hhmm.len(), 5);
        assert_eq!(&hhmm[2..3], ":");
    }
}
