//! Rule extraction and tab-separated export

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::host::HostDocument;
use crate::scanner::scan;

pub const TSV_HEADER: &str = "Header\tOperator\tValue";

const UNKNOWN_HEADER: &str = "(unknown header)";
const UNKNOWN_OPERATOR: &str = "(unknown operator)";

/// One rule as currently shown on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedRule {
    pub header: String,
    pub operator: String,
    pub value: String,
}

/// Read every rule row once, in page order. Never mutates the page.
pub fn extract<H: HostDocument>(host: &H) -> Vec<ExtractedRule> {
    scan(host)
        .into_iter()
        .map(|row| ExtractedRule {
            header: host
                .selected_label(row.header)
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| UNKNOWN_HEADER.to_string()),
            operator: host
                .selected_label(row.operator)
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| UNKNOWN_OPERATOR.to_string()),
            value: host.text_value(row.value_input).trim().to_string(),
        })
        .collect()
}

/// Render rules as `Header<TAB>Operator<TAB>Value` lines under a title line.
pub fn to_tsv(rules: &[ExtractedRule]) -> String {
    std::iter::once(TSV_HEADER.to_string())
        .chain(
            rules
                .iter()
                .map(|r| format!("{}\t{}\t{}", r.header, r.operator, r.value)),
        )
        .collect::<Vec<_>>()
        .join("\n")
}

/// `<prefix>-YYYY-MM-DD-HH-MM-SS.txt`
pub fn export_filename(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{}-{}.txt", prefix, now.format("%Y-%m-%d-%H-%M-%S"))
}
