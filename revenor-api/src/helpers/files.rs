use shared_types::FileCategory;

/// File name fragments that mark a PDF as a tax document
const TAX_NAME_MARKERS: &[&str] = &["налог", "декларац", "910", "920", "кнд", "tax"];

/// File name fragments that mark a PDF as a financial statement rather than
/// a bank statement
const FINANCIAL_NAME_MARKERS: &[&str] = &["баланс", "финанс", "фин_отчет", "financial", "balance"];

const SPREADSHEET_EXTENSIONS: &[&str] = &[".xlsx", ".xls"];
const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".heic", ".webp"];

pub fn is_pdf(name: &str, mime: &str) -> bool {
    mime == "application/pdf" || name.to_lowercase().ends_with(".pdf")
}

/// Name/mime categorization applied at ingest; the extractor may refine a
/// file later (e.g. its Excel rendition lands as converted-statement)
pub fn categorize(name: &str, mime: &str) -> FileCategory {
    let lower = name.to_lowercase();

    if is_pdf(name, mime) {
        if TAX_NAME_MARKERS.iter().any(|m| lower.contains(m)) {
            return FileCategory::Taxes;
        }
        if FINANCIAL_NAME_MARKERS.iter().any(|m| lower.contains(m)) {
            return FileCategory::Financial;
        }
        return FileCategory::Statements;
    }

    let is_spreadsheet = SPREADSHEET_EXTENSIONS.iter().any(|e| lower.ends_with(e))
        || mime.contains("spreadsheet")
        || mime.contains("ms-excel");
    let is_image = mime.starts_with("image/") || IMAGE_EXTENSIONS.iter().any(|e| lower.ends_with(e));
    let is_zip = mime == "application/zip" || lower.ends_with(".zip");

    if is_spreadsheet || is_image || is_zip {
        FileCategory::Financial
    } else {
        FileCategory::Uncategorized
    }
}
