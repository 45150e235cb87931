use chrono::{DateTime, TimeZone, Utc};

/// Human readable distance between a timestamp and a reference point in time, e.g. "5 minutes ago".
pub trait ToRelative {
    fn to_relative(&self, now: DateTime<Utc>) -> String;
}

impl<Tz: TimeZone> ToRelative for DateTime<Tz> {
    fn to_relative(&self, now: DateTime<Utc>) -> String {
        let seconds = now.signed_duration_since(self.with_timezone(&Utc)).num_seconds();
        let distance = seconds.unsigned_abs();
        if distance < 10 {
            return "just now".to_string();
        }

        let (amount, unit) = match distance {
            0..60 => (distance, "second"),
            60..3_600 => (distance / 60, "minute"),
            3_600..86_400 => (distance / 3_600, "hour"),
            _ => (distance / 86_400, "day"),
        };
        let plural = if amount == 1 { "" } else { "s" };

        if seconds >= 0 {
            format!("{} {}{} ago", amount, unit, plural)
        } else {
            format!("in {} {}{}", amount, unit, plural)
        }
    }
}
