use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// Genitive and abbreviated Russian month stems
const RUSSIAN_MONTHS: &[(&str, u32)] = &[
    ("янв", 1),
    ("фев", 2),
    ("мар", 3),
    ("апр", 4),
    ("ма", 5),
    ("июн", 6),
    ("июл", 7),
    ("авг", 8),
    ("сен", 9),
    ("окт", 10),
    ("ноя", 11),
    ("дек", 12),
];

/// Earliest instant accepted as epoch milliseconds (2000-01-01T00:00:00Z)
const EPOCH_MILLIS_FLOOR: i64 = 946_684_800_000;

fn dotted_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2})\.(\d{1,2})\.(\d{2}|\d{4})(?:[ T](\d{1,2}):(\d{2})(?::(\d{2}))?)?$")
            .unwrap()
    })
}

fn russian_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2})\s+([а-яА-ЯёЁ]+)\.?\s+(\d{4})(?:\s*г\.?)?$").unwrap())
}

fn partial_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\.(\d{1,2})\.(\d{4})$").unwrap())
}

fn embedded_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(\d{4}-\d{2}-\d{2}(?:[ T]\d{2}:\d{2}(?::\d{2})?)?|\d{1,2}\.\d{1,2}\.\d{2,4}(?:[ T]\d{1,2}:\d{2}(?::\d{2})?)?)",
        )
        .unwrap()
    })
}

/// Parse a statement date in any of the accepted spellings into a UTC instant
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }

    if let Some(caps) = dotted_re().captures(text) {
        let first: u32 = caps[1].parse().ok()?;
        let second: u32 = caps[2].parse().ok()?;
        let year = expand_year(caps[3].parse().ok()?);
        // Statements are dd.mm by default; a first slot that cannot be a day
        // count means the extractor emitted mm.dd
        let (day, month) = if first <= 12 && second > 12 {
            (second, first)
        } else {
            (first, second)
        };
        let hour: u32 = caps.get(4).map_or(Ok(0), |m| m.as_str().parse()).ok()?;
        let minute: u32 = caps.get(5).map_or(Ok(0), |m| m.as_str().parse()).ok()?;
        let second_: u32 = caps.get(6).map_or(Ok(0), |m| m.as_str().parse()).ok()?;
        return NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, minute, second_))
            .map(|dt| dt.and_utc());
    }

    if let Some(caps) = russian_re().captures(text) {
        let day: u32 = caps[1].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        let stem = caps[2].to_lowercase();
        let month = RUSSIAN_MONTHS
            .iter()
            .find(|(prefix, _)| stem.starts_with(prefix))
            .map(|(_, m)| *m)?;
        return NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc());
    }

    if let Some(caps) = partial_re().captures(text) {
        let month: u32 = caps[1].parse().ok()?;
        let year: i32 = caps[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc());
    }

    if let Ok(number) = text.replace(',', ".").parse::<f64>() {
        return parse_numeric_date(number);
    }

    None
}

/// Date from a JSON value: strings go through the text parser, numbers are
/// tested as epoch milliseconds or Excel serial days
pub fn parse_date_value(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(s) => parse_date(s),
        serde_json::Value::Number(n) => parse_numeric_date(n.as_f64()?),
        _ => None,
    }
}

/// First parseable date embedded in free text, e.g. inside a purpose field
pub fn find_date_in_text(text: &str) -> Option<DateTime<Utc>> {
    for caps in embedded_re().captures_iter(text) {
        if let Some(dt) = parse_date(&caps[1]) {
            return Some(dt);
        }
    }
    None
}

pub fn parse_numeric_date(number: f64) -> Option<DateTime<Utc>> {
    if !number.is_finite() || number <= 0.0 {
        return None;
    }
    if number.fract() == 0.0 && number >= EPOCH_MILLIS_FLOOR as f64 {
        return DateTime::from_timestamp_millis(number as i64);
    }
    excel_serial(number)
}

/// Excel serial dates count days since 1899-12-30; the fractional part is
/// the time of day
fn excel_serial(serial: f64) -> Option<DateTime<Utc>> {
    // Anything outside this range cannot land in the accepted year window
    if !(1.0..200_000.0).contains(&serial) {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let days = serial.trunc() as i64;
    let seconds = (serial.fract() * 86_400.0).round() as i64;
    let dt = base
        .checked_add_signed(chrono::Duration::days(days))?
        .checked_add_signed(chrono::Duration::seconds(seconds))?
        .and_utc();
    let year = dt.year();
    if (1990..=Utc::now().year() + 1).contains(&year) {
        Some(dt)
    } else {
        None
    }
}

/// Two-digit years above 70 belong to the 1900s, the rest to the 2000s
fn expand_year(year: i32) -> i32 {
    if year >= 100 {
        year
    } else if year > 70 {
        1900 + year
    } else {
        2000 + year
    }
}
