use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Timelike};

/// Offset of Indochina Time, used when showing timestamps.
pub const THAI_UTC_OFFSET_SECS: i32 = 7 * 3600;

/// Offset between the Buddhist and Gregorian eras.
const BUDDHIST_ERA_OFFSET: i32 = 543;

/// Formats a count with Thai-locale digit grouping, e.g. `12,345`.
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }

    out
}

/// Renders a `generated_at` value the way a Thai-locale browser shows it:
/// `d/m/yyyy H:mm:ss` with a Buddhist-era year, in Thai local time.
///
/// RFC 3339 input is converted to UTC+7. Input without an offset is taken
/// as already being Thai local time, and seconds may be left out. A bare
/// `yyyy-mm-dd` date is midnight UTC. Returns `None` when the value is not
/// a recognisable timestamp.
pub fn format_thai_datetime(value: &str) -> Option<String> {
    let offset = FixedOffset::east_opt(THAI_UTC_OFFSET_SECS)?;
    let value = value.trim();

    let local = match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => dt.with_timezone(&offset).naive_local(),
        Err(_) => NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S"))
            .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
            .ok()
            .or_else(|| date_only_in_thai_time(value, &offset))?,
    };

    Some(format!(
        "{}/{}/{} {}:{:02}:{:02}",
        local.day(),
        local.month(),
        local.year() + BUDDHIST_ERA_OFFSET,
        local.hour(),
        local.minute(),
        local.second()
    ))
}

// A bare date means midnight UTC
fn date_only_in_thai_time(value: &str, offset: &FixedOffset) -> Option<NaiveDateTime> {
    let midnight = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?.and_hms_opt(0, 0, 0)?;
    Some(midnight.and_utc().with_timezone(offset).naive_local())
}
