/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Parse a token subject (`sub` claim) into a directory id.
///
/// Returns `None` for empty, non-numeric, or non-positive subjects.
pub fn parse_subject(sub: &str) -> Option<DbId> {
    sub.trim().parse::<DbId>().ok().filter(|id| *id > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positive_ids() {
        assert_eq!(parse_subject("42"), Some(42));
        assert_eq!(parse_subject(" 7 "), Some(7));
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert_eq!(parse_subject(""), None);
        assert_eq!(parse_subject("   "), None);
        assert_eq!(parse_subject("abc"), None);
        assert_eq!(parse_subject("0"), None);
        assert_eq!(parse_subject("-3"), None);
    }
}
