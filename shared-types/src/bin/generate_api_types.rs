use shared_types::*;
use std::fs;
use std::path::Path;
use ts_rs::TS;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate TypeScript definitions for API types
    let mut types = Vec::new();

    // Session types
    types.push(sanitize_declaration(SessionStatus::export_to_string()?));
    types.push(sanitize_declaration(OpenaiStatus::export_to_string()?));
    types.push(sanitize_declaration(AnalysisSession::export_to_string()?));
    types.push(sanitize_declaration(AnalysisAccepted::export_to_string()?));
    types.push(sanitize_declaration(ReportListResponse::export_to_string()?));

    // File types
    types.push(sanitize_declaration(FileCategory::export_to_string()?));
    types.push(sanitize_declaration(StoredFile::export_to_string()?));
    types.push(sanitize_declaration(FileSummary::export_to_string()?));

    // Transaction types
    types.push(sanitize_declaration(ClassificationSource::export_to_string()?));
    types.push(sanitize_declaration(Transaction::export_to_string()?));

    // Report types
    types.push(sanitize_declaration(MoneyView::export_to_string()?));
    types.push(sanitize_declaration(MonthBucket::export_to_string()?));
    types.push(sanitize_declaration(YearBucket::export_to_string()?));
    types.push(sanitize_declaration(ClassBreakdown::export_to_string()?));
    types.push(sanitize_declaration(TrailingRevenue::export_to_string()?));
    types.push(sanitize_declaration(ReportStats::export_to_string()?));
    types.push(sanitize_declaration(ReportTotals::export_to_string()?));
    types.push(sanitize_declaration(RevenueReport::export_to_string()?));

    // Message types
    types.push(sanitize_declaration(MessageRole::export_to_string()?));
    types.push(sanitize_declaration(SessionMessage::export_to_string()?));
    types.push(sanitize_declaration(MessageListResponse::export_to_string()?));

    // Review types
    types.push(sanitize_declaration(ReviewItem::export_to_string()?));
    types.push(sanitize_declaration(ReviewDecision::export_to_string()?));

    types.push(sanitize_declaration(ErrorResponse::export_to_string()?));

    let output_dir = Path::new("../gui/src/api-types");
    fs::create_dir_all(output_dir)?;

    let output_path = output_dir.join("types.ts");
    let output = types.join("\n\n");

    fs::write(&output_path, output)?;
    println!("Generated TypeScript types in {}", output_path.display());

    Ok(())
}

/// Everything lands in one types.ts, so the per-type `import type` headers
/// ts-rs emits for cross-referenced declarations would point at files that
/// do not exist. Drop them together with the generator banner.
fn sanitize_declaration(declaration: String) -> String {
    let mut out = String::new();
    for line in declaration.lines() {
        let line = line.trim_end_matches('\r');
        let lead = line.trim_start();
        if lead.starts_with("import type") || lead.contains("This file was generated") {
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }

    let body = out.trim();
    if body.is_empty() {
        String::new()
    } else {
        format!("{body}\n")
    }
}
