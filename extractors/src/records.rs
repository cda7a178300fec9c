use crate::amounts::parse_amount;
use crate::dates::{find_date_in_text, parse_date, parse_date_value, parse_numeric_date};
use chrono::{DateTime, Datelike, Utc};
use shared_types::RawRecord;

/// Priority order matters: specific operation-date headers first, then the
/// bare words, then the `та` fragment left by truncated column headers
const DATE_KEYS: &[&str] = &[
    "дата операции",
    "дата проводки",
    "дата платежа",
    "дата валютирования",
    "operation date",
    "payment date",
    "value date",
    "дата",
    "date",
    "та",
];

const AMOUNT_KEYS: &[&str] = &[
    "сумма по кредиту",
    "кредит",
    "credit",
    "сумма операции",
    "сумма",
    "amount",
];

const PURPOSE_KEYS: &[&str] = &[
    "назначение платежа",
    "назначение",
    "детали платежа",
    "описание операции",
    "описание",
    "purpose",
    "details",
    "description",
    "примечание",
];

const SENDER_KEYS: &[&str] = &[
    "наименование отправителя",
    "отправитель",
    "плательщик",
    "sender",
    "payer",
];

const CORRESPONDENT_KEYS: &[&str] = &[
    "наименование корреспондента",
    "корреспондент",
    "контрагент",
    "наименование бенефициара",
    "counterparty",
    "correspondent",
];

const BIN_KEYS: &[&str] = &["бин/иин", "бин", "иин", "bin", "iin"];

/// Canonical view of one untyped extractor row
#[derive(Debug, Clone)]
pub struct NormalizedRecord {
    pub raw_amount: String,
    pub amount: f64,
    pub value_date: Option<DateTime<Utc>>,
    pub purpose: String,
    pub sender: String,
    pub correspondent: String,
    pub bin: Option<String>,
}

/// Collapse interior whitespace and trim; Unicode is preserved
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Reduce a free-form key/value row to the canonical record shape
pub fn normalize_record(record: &RawRecord) -> NormalizedRecord {
    let raw_amount = sweep_string(record, AMOUNT_KEYS).unwrap_or_default();
    let amount = parse_amount(&raw_amount).max(0.0);
    let value_date = sweep_date(record).or_else(|| scan_for_date(record));
    let purpose = normalize_text(&sweep_string(record, PURPOSE_KEYS).unwrap_or_default());
    let sender = normalize_text(&sweep_string(record, SENDER_KEYS).unwrap_or_default());
    let correspondent =
        normalize_text(&sweep_string(record, CORRESPONDENT_KEYS).unwrap_or_default());
    let bin = sweep_string(record, BIN_KEYS)
        .map(|s| normalize_text(&s))
        .filter(|s| !s.is_empty());

    NormalizedRecord {
        raw_amount,
        amount,
        value_date,
        purpose,
        sender,
        correspondent,
        bin,
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace('\n', " ")
}

fn value_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn sweep_string(record: &RawRecord, keys: &[&str]) -> Option<String> {
    for candidate in keys {
        for (key, value) in record {
            if normalize_key(key).contains(candidate) {
                if let Some(text) = value_to_string(value) {
                    if !text.trim().is_empty() {
                        return Some(text);
                    }
                }
            }
        }
    }
    None
}

fn sweep_date(record: &RawRecord) -> Option<DateTime<Utc>> {
    for candidate in DATE_KEYS {
        for (key, value) in record {
            if normalize_key(key).contains(candidate) {
                if let Some(dt) = parse_date_value(value) {
                    return Some(dt);
                }
            }
        }
    }
    None
}

/// Extractors sometimes leave the date in a free-text field; scan every
/// plain value for a date pattern or an Excel serial and accept the first
/// parse inside a sane year window
fn scan_for_date(record: &RawRecord) -> Option<DateTime<Utc>> {
    let max_year = Utc::now().year() + 2;
    for (key, value) in record {
        if key.starts_with('_') || key == "source_file" {
            continue;
        }
        let parsed = match value {
            serde_json::Value::String(s) => parse_date(s).or_else(|| find_date_in_text(s)),
            serde_json::Value::Number(n) => n.as_f64().and_then(parse_numeric_date),
            _ => None,
        };
        if let Some(dt) = parsed {
            if (2000..=max_year).contains(&dt.year()) {
                return Some(dt);
            }
        }
    }
    None
}
