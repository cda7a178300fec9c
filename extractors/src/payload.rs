use anyhow::{anyhow, Result};
use shared_types::ExtractorDocument;

/// Emitted by the extractor CLI when every statement parsed but no credit
/// rows exist; a success, not a failure
pub const NO_CREDIT_ROWS_MARKER: &str = "No credit rows found";

/// Parse the extractor's stdout, which wraps a JSON block in free-form log
/// lines, into per-file documents
pub fn parse_extractor_output(output: &str) -> Result<Vec<ExtractorDocument>> {
    if output.contains(NO_CREDIT_ROWS_MARKER) {
        return Ok(Vec::new());
    }

    let block = recover_json_block(output)
        .ok_or_else(|| anyhow!("no JSON block found in extractor output"))?;

    if block.trim_start().starts_with('[') {
        Ok(serde_json::from_str(block)?)
    } else {
        let single: ExtractorDocument = serde_json::from_str(block)?;
        Ok(vec![single])
    }
}

/// Locate the JSON block inside mixed log/JSON output. Log lines may carry
/// brackets of their own ("[INFO] ..."), so every balanced candidate is
/// validated and the longest valid block wins; ties go to the later one.
pub fn recover_json_block(output: &str) -> Option<&str> {
    let mut best: Option<&str> = None;
    for (start, c) in output.char_indices() {
        if c != '[' && c != '{' {
            continue;
        }
        if let Some(end) = matching_terminator(output, start) {
            let slice = &output[start..=end];
            if slice.len() >= best.map_or(1, |b| b.len())
                && serde_json::from_str::<serde::de::IgnoredAny>(slice).is_ok()
            {
                best = Some(slice);
            }
        }
    }
    best
}

/// Forward bracket scan, aware of string literals and escapes
fn matching_terminator(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(start + i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_array() {
        let out = r#"[{"source_file": "a.pdf", "transactions": []}]"#;
        let docs = parse_extractor_output(out).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source_file, "a.pdf");
    }

    #[test]
    fn test_log_lines_around_json() {
        let out = concat!(
            "[INFO] Обработка файла 1/1: a.pdf\n",
            "[DEBUG] Файл a.pdf прочитан, размер: 1024 байт\n",
            r#"[{"source_file": "a.pdf", "metadata": {"currency": "KZT"}, "transactions": [{"Кредит": "100"}]}]"#,
            "\n[INFO] done\n",
        );
        let docs = parse_extractor_output(out).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].transactions.len(), 1);
        assert_eq!(docs[0].currency(), Some("KZT"));
    }

    #[test]
    fn test_brackets_inside_strings() {
        let out = concat!(
            "log [not json]\n",
            r#"[{"source_file": "a.pdf", "transactions": [{"Назначение": "Оплата [по договору]"}]}]"#,
        );
        let docs = parse_extractor_output(out).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].transactions.len(), 1);
    }

    #[test]
    fn test_no_credit_rows_marker() {
        let out = "Some log\nNo credit rows found.\n";
        let docs = parse_extractor_output(out).unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn test_single_object() {
        let out = r#"{"source_file": "a.pdf", "error": "Adobe limit"}"#;
        let docs = parse_extractor_output(out).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].error.as_deref(), Some("Adobe limit"));
    }

    #[test]
    fn test_no_json_is_error() {
        assert!(parse_extractor_output("just logs, nothing else").is_err());
    }

    #[test]
    fn test_error_and_success_mix() {
        let out = r#"[
            {"source_file": "a.pdf", "transactions": [{"Кредит": "1"}]},
            {"source_file": "b.pdf", "error": "Adobe limit"}
        ]"#;
        let docs = parse_extractor_output(out).unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs[0].error.is_none());
        assert_eq!(docs[1].error.as_deref(), Some("Adobe limit"));
    }
}
