pub mod aggregate;
pub mod amounts;
pub mod classifier;
pub mod dates;
pub mod payload;
pub mod records;
pub mod render;

pub use aggregate::{build_breakdown, format_amount, trailing_twelve_months};
pub use amounts::parse_amount;
pub use classifier::{classify, HeuristicClass};
pub use dates::{parse_date, parse_date_value};
pub use payload::parse_extractor_output;
pub use records::{normalize_record, normalize_text, NormalizedRecord};
pub use render::render_report_text;
