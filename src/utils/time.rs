use chrono::{SecondsFormat, Utc};

/// RFC3339 with millisecond precision, the timestamp format stored documents use.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn timestamps_are_rfc3339_utc() {
        let stamp = now_iso();
        assert!(stamp.ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(&stamp).is_ok());
    }
}
