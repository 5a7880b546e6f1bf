//! Compact ISO-8601 timestamp helpers used on every wire envelope.

use chrono::{DateTime, Utc};

/// `YYYYMMDDTHHMMSSZ`, e.g. `20260315T142233Z`.
const COMPACT_FORMAT: &str = "%Y%m%dT%H%M%SZ";

pub fn format_compact(at: DateTime<Utc>) -> String {
    at.format(COMPACT_FORMAT).to_string()
}

pub fn now_compact() -> String {
    format_compact(Utc::now())
}

pub fn parse_compact(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    use chrono::NaiveDateTime;
    let naive = NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%SZ")?;
    Ok(DateTime::from_naive_utc_and_offset(naive, Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::SubsecRound;

    #[test]
    fn round_trips_through_compact_format() {
        let at = Utc::now().trunc_subsecs(0);
        let formatted = format_compact(at);
        let parsed = parse_compact(&formatted).expect("valid timestamp");
        assert_eq!(at, parsed);
    }
}
