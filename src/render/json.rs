//! JSON renderer implementation.

use crate::error::Result;
use crate::model::CanonicalReport;

/// JSON output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JsonFormat {
    /// Compact single-line JSON
    Compact,
    /// Pretty-printed with 2-space indentation
    #[default]
    Pretty,
}

/// Convert a report to JSON.
pub fn to_json(report: &CanonicalReport, format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Compact => serde_json::to_string(report)?,
        JsonFormat::Pretty => serde_json::to_string_pretty(report)?,
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Record, ReportSection, SectionContent};
    use serde_json::json;

    fn sample() -> CanonicalReport {
        let mut builder = CanonicalReport::builder();
        builder.push(ReportSection::new(
            "schema",
            SectionContent::Records(vec![Record::from_pairs([("name", json!("Sales"))])]),
        ));
        builder.push(ReportSection::unavailable("relationships", "boom"));
        builder.build()
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&sample(), JsonFormat::Pretty).unwrap();
        assert!(json.contains('\n'));
        assert!(json.contains("\"type\": \"records\""));
        assert!(json.contains("\"unavailable\": \"boom\""));
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&sample(), JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
        assert!(json.contains("\"name\":\"schema\""));
    }

    #[test]
    fn test_report_roundtrip() {
        let report = sample();
        let json = to_json(&report, JsonFormat::Pretty).unwrap();
        let parsed: CanonicalReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
    }
}
