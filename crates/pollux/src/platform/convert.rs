use chrono::{DateTime, Utc};

/// Parse a platform timestamp (RFC 3339, any offset) into UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Convert a CamelCase identifier to snake_case.
///
/// Used to turn platform type names (`PullRequest`, `MergeRequest`) into the
/// lowercase segments of canonical action names.
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower_or_digit = false;

    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            if prev_lower_or_digit {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower_or_digit = false;
        } else if ch == ' ' || ch == '-' {
            if !out.ends_with('_') && !out.is_empty() {
                out.push('_');
            }
            prev_lower_or_digit = false;
        } else {
            out.push(ch);
            prev_lower_or_digit = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        }
    }

    out
}

/// Join a subject and a verb into a dotted canonical action name.
pub fn dotted_action(subject: &str, verb: Option<&str>) -> String {
    match verb.map(str::trim).filter(|v| !v.is_empty()) {
        Some(verb) => format!("{}.{}", subject, to_snake_case(verb)),
        None => subject.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("Push"), "push");
        assert_eq!(to_snake_case("PullRequest"), "pull_request");
        assert_eq!(to_snake_case("PullRequestReviewComment"), "pull_request_review_comment");
        assert_eq!(to_snake_case("MergeRequest"), "merge_request");
        assert_eq!(to_snake_case("commented on"), "commented_on");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
        assert_eq!(to_snake_case(""), "");
    }

    #[test]
    fn test_parse_timestamp() {
        let t = parse_timestamp("2024-01-01T00:00:10Z").unwrap();
        assert_eq!(t.to_rfc3339(), "2024-01-01T00:00:10+00:00");

        let gitlab = parse_timestamp("2024-01-01T10:00:00.123+02:00").unwrap();
        assert_eq!(gitlab.to_rfc3339(), "2024-01-01T08:00:00.123+00:00");

        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_dotted_action() {
        assert_eq!(dotted_action("pull_request", Some("opened")), "pull_request.opened");
        assert_eq!(dotted_action("push", None), "push");
        assert_eq!(dotted_action("push", Some("  ")), "push");
    }
}
