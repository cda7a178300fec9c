use regex::Regex;
use std::sync::OnceLock;

fn digit_gap_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d)\s+(\d)").unwrap())
}

fn doubled_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.+?[,.]\d{2})\1$").unwrap())
}

fn glued_pair_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+[,.]\d{2})(\d+[,.]\d{2})$").unwrap())
}

fn bare_doubled_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)\1$").unwrap())
}

/// Parse an amount written in any of the statement locales into canonical
/// units. Currency letters, grouping spaces and apostrophes are dropped;
/// the sign comes from a leading `-`/`+` or a parenthesized value; when both
/// `,` and `.` appear the rightmost is the decimal separator. Unparseable
/// input yields 0.
pub fn parse_amount(raw: &str) -> f64 {
    let mut text = raw
        .replace(['\u{a0}', '\u{2009}', '\u{202f}'], " ")
        .replace(['\'', '\u{2019}', '`'], "");
    text = text.trim().to_string();

    let mut negative = false;
    if text.starts_with('(') && text.ends_with(')') {
        negative = true;
        text = text[1..text.len() - 1].trim().to_string();
    }
    if let Some(rest) = text.strip_prefix('-') {
        negative = true;
        text = rest.trim_start().to_string();
    } else if let Some(rest) = text.strip_prefix('+') {
        text = rest.trim_start().to_string();
    }

    // Drop currency letters and anything else that cannot be part of a numeral
    text = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.' || *c == ' ')
        .collect();

    // Extractors sometimes split one numeral across cell boundaries
    loop {
        let collapsed = digit_gap_re().replace_all(&text, "$1$2").into_owned();
        if collapsed == text {
            break;
        }
        text = collapsed;
    }
    text.retain(|c| c != ' ');

    // Repeated-header merges glue the same numeral twice, or two numerals
    // together; the duplication may also survive with no separator at all
    if let Some(caps) = doubled_re().captures(&text) {
        text = caps[1].to_string();
    } else if let Some(caps) = glued_pair_re().captures(&text) {
        text = caps[1].to_string();
    } else {
        let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
        if let Some(caps) = bare_doubled_re().captures(&digits) {
            let half = caps[1].to_string();
            text = if (text.contains(',') || text.contains('.')) && half.len() >= 2 {
                format!("{},{}", &half[..half.len() - 2], &half[half.len() - 2..])
            } else {
                half
            };
        }
    }

    let has_comma = text.contains(',');
    let has_dot = text.contains('.');

    let normalized = if has_comma && has_dot {
        let decimal = if text.rfind(',') > text.rfind('.') { ',' } else { '.' };
        let other = if decimal == ',' { '.' } else { ',' };
        let stripped: String = text.chars().filter(|c| *c != other).collect();
        strip_to_decimal(&stripped, decimal)
    } else if has_comma || has_dot {
        let sep = if has_comma { ',' } else { '.' };
        let count = text.matches(sep).count();
        let tail = &text[text.rfind(sep).unwrap() + 1..];
        let is_decimal = (1..=2).contains(&tail.len())
            && tail.chars().all(|c| c.is_ascii_digit())
            && (sep == ',' || count == 1);
        if is_decimal {
            strip_to_decimal(&text, sep)
        } else {
            text.chars().filter(|c| *c != sep).collect()
        }
    } else {
        text
    };

    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() => {
            if negative {
                -value
            } else {
                value
            }
        }
        _ => 0.0,
    }
}

/// Keep only the last occurrence of `sep` and turn it into a dot
fn strip_to_decimal(text: &str, sep: char) -> String {
    let last = text.rfind(sep).unwrap();
    text.char_indices()
        .filter_map(|(i, c)| {
            if c == sep {
                if i == last {
                    Some('.')
                } else {
                    None
                }
            } else {
                Some(c)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_integer() {
        assert_eq!(parse_amount("500000"), 500000.0);
    }

    #[test]
    fn test_grouped_spaces() {
        assert_eq!(parse_amount("1 200 000"), 1200000.0);
        assert_eq!(parse_amount("500\u{a0}000"), 500000.0);
    }

    #[test]
    fn test_comma_decimal() {
        assert_eq!(parse_amount("1234,56"), 1234.56);
        assert_eq!(parse_amount("0,5"), 0.5);
    }

    #[test]
    fn test_both_separators() {
        assert_eq!(parse_amount("1.234.567,89"), 1234567.89);
        assert_eq!(parse_amount("1,234,567.89"), 1234567.89);
    }

    #[test]
    fn test_single_separator_as_thousands() {
        assert_eq!(parse_amount("1,234"), 1234.0);
        assert_eq!(parse_amount("1.234"), 1234.0);
        assert_eq!(parse_amount("1.234.567"), 1234567.0);
    }

    #[test]
    fn test_dot_decimal_when_unique() {
        assert_eq!(parse_amount("12.5"), 12.5);
        assert_eq!(parse_amount("1234.56"), 1234.56);
    }

    #[test]
    fn test_apostrophe_grouping() {
        assert_eq!(parse_amount("1'234'567.89"), 1234567.89);
    }

    #[test]
    fn test_currency_tag() {
        assert_eq!(parse_amount("1 234,56 KZT"), 1234.56);
        assert_eq!(parse_amount("1 234 567,89 тг"), 1234567.89);
    }

    #[test]
    fn test_signs() {
        assert_eq!(parse_amount("-1 000,50"), -1000.5);
        assert_eq!(parse_amount("+250"), 250.0);
        assert_eq!(parse_amount("(1 000,50)"), -1000.5);
    }

    #[test]
    fn test_doubled_numeral() {
        assert_eq!(parse_amount("4150000,004150000,00"), 4150000.0);
    }

    #[test]
    fn test_doubled_numeral_without_separator() {
        assert_eq!(parse_amount("41500004150000"), 4150000.0);
    }

    #[test]
    fn test_glued_pair_keeps_first() {
        assert_eq!(parse_amount("33600000,0049563711,69"), 33600000.0);
    }

    #[test]
    fn test_unparseable_is_zero() {
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("n/a"), 0.0);
        assert_eq!(parse_amount("—"), 0.0);
    }
}
