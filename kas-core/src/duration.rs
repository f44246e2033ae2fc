//! Human readable approximations of elapsed time, as shown in the `AGE` column.
use jiff::Timestamp;

/// Render a signed number of elapsed seconds using the largest sensible units
///
/// Up to one second in the future is tolerated as clock skew and shown as `0s`.
pub fn human_duration(seconds: i64) -> String {
    if seconds < -1 {
        return "<invalid>".into();
    } else if seconds < 0 {
        return "0s".into();
    } else if seconds < 60 * 2 {
        return format!("{seconds}s");
    }
    let minutes = seconds / 60;
    if minutes < 10 {
        return match seconds % 60 {
            0 => format!("{minutes}m"),
            s => format!("{minutes}m{s}s"),
        };
    } else if minutes < 60 * 3 {
        return format!("{minutes}m");
    }
    let hours = minutes / 60;
    if hours < 8 {
        match minutes % 60 {
            0 => format!("{hours}h"),
            m => format!("{hours}h{m}m"),
        }
    } else if hours < 48 {
        format!("{hours}h")
    } else if hours < 24 * 8 {
        match hours % 24 {
            0 => format!("{}d", hours / 24),
            h => format!("{}d{h}h", hours / 24),
        }
    } else if hours < 24 * 365 * 2 {
        format!("{}d", hours / 24)
    } else if hours < 24 * 365 * 8 {
        match (hours / 24) % 365 {
            0 => format!("{}y", hours / 24 / 365),
            d => format!("{}y{d}d", hours / 24 / 365),
        }
    } else {
        format!("{}y", hours / 24 / 365)
    }
}

/// Parse an RFC 3339 timestamp as found in object metadata
pub fn parse_timestamp(raw: Option<&str>) -> Option<Timestamp> {
    raw.filter(|s| !s.is_empty())?.parse().ok()
}

/// Elapsed time between `timestamp` and `now`, or `<unknown>` when it is unset
pub fn since(timestamp: Option<Timestamp>, now: Timestamp) -> String {
    match timestamp {
        Some(ts) => human_duration(now.as_second() - ts.as_second()),
        None => "<unknown>".into(),
    }
}
