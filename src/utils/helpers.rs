use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;

/// Generate a random alphanumeric token, used for stored attachment filenames
pub fn random_token(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Insert `<br />` before every newline, preserving the newline itself
pub fn nl2br(text: &str) -> String {
    text.replace("\r\n", "<br />\r\n").replace('\n', "<br />\n")
}

/// Render a timestamp relative to now ("3 minutes ago")
pub fn diff_for_humans(timestamp: DateTime<Utc>) -> String {
    diff_for_humans_at(timestamp, Utc::now())
}

pub fn diff_for_humans_at(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - timestamp).num_seconds();

    if seconds < 0 {
        // Clock skew between app server and database timestamps
        return "just now".to_string();
    }

    let (value, unit) = if seconds < 60 {
        (seconds.max(1), "second")
    } else if seconds < 3600 {
        (seconds / 60, "minute")
    } else if seconds < 86_400 {
        (seconds / 3600, "hour")
    } else if seconds < 604_800 {
        (seconds / 86_400, "day")
    } else if seconds < 2_592_000 {
        (seconds / 604_800, "week")
    } else if seconds < 31_536_000 {
        (seconds / 2_592_000, "month")
    } else {
        (seconds / 31_536_000, "year")
    };

    if value == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", value, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn random_token_has_requested_length_and_charset() {
        let token = random_token(32);
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));

        // Two draws colliding would mean the generator is broken
        assert_ne!(random_token(32), random_token(32));
    }

    #[test]
    fn nl2br_inserts_break_tags() {
        assert_eq!(nl2br("hello\nworld"), "hello<br />\nworld");
        assert_eq!(nl2br("a\r\nb"), "a<br />\r\nb");
        assert_eq!(nl2br("no newline"), "no newline");
    }

    #[test]
    fn diff_for_humans_picks_the_largest_unit() {
        let now = Utc::now();

        assert_eq!(diff_for_humans_at(now - Duration::seconds(5), now), "5 seconds ago");
        assert_eq!(diff_for_humans_at(now - Duration::seconds(60), now), "1 minute ago");
        assert_eq!(diff_for_humans_at(now - Duration::minutes(3), now), "3 minutes ago");
        assert_eq!(diff_for_humans_at(now - Duration::hours(26), now), "1 day ago");
        assert_eq!(diff_for_humans_at(now - Duration::days(14), now), "2 weeks ago");
        assert_eq!(diff_for_humans_at(now - Duration::days(40), now), "1 month ago");
        assert_eq!(diff_for_humans_at(now - Duration::days(800), now), "2 years ago");
    }

    #[test]
    fn diff_for_humans_tolerates_future_timestamps() {
        let now = Utc::now();
        assert_eq!(diff_for_humans_at(now + Duration::seconds(30), now), "just now");
    }
}
