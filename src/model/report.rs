//! Canonical report structures.

use super::SectionContent;
use serde::{Deserialize, Serialize};

/// Well-known section categories.
///
/// The kind decides how a section is laid out; the section's own name still
/// decides its heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Metadata,
    Schema,
    Relationships,
    PowerQuery,
    MParameters,
    DaxTables,
    DaxMeasures,
    DaxColumns,
}

impl SectionKind {
    /// All kinds in canonical report order.
    pub const ALL: [SectionKind; 8] = [
        SectionKind::Metadata,
        SectionKind::Schema,
        SectionKind::Relationships,
        SectionKind::PowerQuery,
        SectionKind::MParameters,
        SectionKind::DaxTables,
        SectionKind::DaxMeasures,
        SectionKind::DaxColumns,
    ];

    /// Canonical section name.
    pub fn name(&self) -> &'static str {
        match self {
            SectionKind::Metadata => "metadata",
            SectionKind::Schema => "schema",
            SectionKind::Relationships => "relationships",
            SectionKind::PowerQuery => "power_query",
            SectionKind::MParameters => "m_parameters",
            SectionKind::DaxTables => "dax_tables",
            SectionKind::DaxMeasures => "dax_measures",
            SectionKind::DaxColumns => "dax_columns",
        }
    }

    /// Heading used in rendered documents.
    pub fn title(&self) -> &'static str {
        match self {
            SectionKind::Metadata => "Metadata",
            SectionKind::Schema => "Schema",
            SectionKind::Relationships => "Relationships",
            SectionKind::PowerQuery => "Power Query Code",
            SectionKind::MParameters => "M Parameters",
            SectionKind::DaxTables => "DAX Tables",
            SectionKind::DaxMeasures => "DAX Measures",
            SectionKind::DaxColumns => "DAX Columns",
        }
    }

    /// Noun used in the "No ... available." placeholder.
    pub fn noun(&self) -> &'static str {
        match self {
            SectionKind::Metadata => "metadata",
            SectionKind::Schema => "schema information",
            SectionKind::Relationships => "relationships",
            SectionKind::PowerQuery => "Power Query code",
            SectionKind::MParameters => "M parameters",
            SectionKind::DaxTables => "DAX tables",
            SectionKind::DaxMeasures => "DAX measures",
            SectionKind::DaxColumns => "DAX columns",
        }
    }

    /// Look up a kind by section name, accepting common aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "metadata" => Some(SectionKind::Metadata),
            "schema" | "tables" => Some(SectionKind::Schema),
            "relationships" => Some(SectionKind::Relationships),
            "power_query" => Some(SectionKind::PowerQuery),
            "m_parameters" | "parameters" => Some(SectionKind::MParameters),
            "dax_tables" | "calculated_tables" => Some(SectionKind::DaxTables),
            "dax_measures" | "measures" => Some(SectionKind::DaxMeasures),
            "dax_columns" | "calculated_columns" => Some(SectionKind::DaxColumns),
            _ => None,
        }
    }
}

impl std::fmt::Display for SectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A named unit of extracted information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    /// Section identifier (e.g. "relationships")
    pub name: String,

    /// Normalized content; `None` when the section has no data
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub content: Option<SectionContent>,

    /// Why the analyzer could not provide this section
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub unavailable: Option<String>,
}

impl ReportSection {
    /// Create a section with content.
    pub fn new(name: impl Into<String>, content: SectionContent) -> Self {
        Self {
            name: name.into(),
            content: Some(content),
            unavailable: None,
        }
    }

    /// Create a section with no data.
    pub fn absent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: None,
            unavailable: None,
        }
    }

    /// Create a section the analyzer failed to provide.
    pub fn unavailable(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: None,
            unavailable: Some(reason.into()),
        }
    }

    /// Layout kind derived from the name.
    pub fn kind(&self) -> Option<SectionKind> {
        SectionKind::from_name(&self.name)
    }

    /// Heading text.
    ///
    /// Canonical names get their fixed title; anything else is humanized.
    pub fn title(&self) -> String {
        match SectionKind::ALL.iter().find(|k| k.name() == self.name) {
            Some(kind) => kind.title().to_string(),
            None => humanize(&self.name),
        }
    }

    /// Placeholder shown when the section has no data.
    pub fn placeholder(&self) -> String {
        let noun = match SectionKind::ALL.iter().find(|k| k.name() == self.name) {
            Some(kind) => kind.noun().to_string(),
            None => self.title().to_lowercase(),
        };
        format!("No {} available.", noun)
    }

    /// Check if the section has data to render.
    pub fn has_data(&self) -> bool {
        self.content.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// Turn `snake_case` or `kebab-case` identifiers into a title.
pub fn humanize(name: &str) -> String {
    let words: Vec<String> = name
        .split(['_', '-', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();

    if words.is_empty() {
        "Section".to_string()
    } else {
        words.join(" ")
    }
}

/// Ordered collection of report sections.
///
/// Insertion order is rendering order. Built once through [`ReportBuilder`]
/// and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalReport {
    sections: Vec<ReportSection>,
}

impl CanonicalReport {
    /// Start building a report.
    pub fn builder() -> ReportBuilder {
        ReportBuilder::default()
    }

    /// Sections in rendering order.
    pub fn sections(&self) -> &[ReportSection] {
        &self.sections
    }

    /// Get a section by name.
    pub fn get(&self, name: &str) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Section names in rendering order.
    pub fn names(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.name.as_str()).collect()
    }

    /// Section titles in rendering order.
    pub fn titles(&self) -> Vec<String> {
        self.sections.iter().map(|s| s.title()).collect()
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Check if the report has no sections.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Number of sections that carry data.
    pub fn populated_count(&self) -> usize {
        self.sections.iter().filter(|s| s.has_data()).count()
    }
}

/// Builder for [`CanonicalReport`].
#[derive(Debug, Default)]
pub struct ReportBuilder {
    sections: Vec<ReportSection>,
}

impl ReportBuilder {
    /// Add a section. A section with an existing name replaces it in place.
    pub fn push(&mut self, section: ReportSection) -> &mut Self {
        match self.sections.iter_mut().find(|s| s.name == section.name) {
            Some(existing) => *existing = section,
            None => self.sections.push(section),
        }
        self
    }

    /// Add a section with content.
    pub fn section(mut self, name: impl Into<String>, content: SectionContent) -> Self {
        self.push(ReportSection::new(name, content));
        self
    }

    /// Add a section with no data.
    pub fn absent(mut self, name: impl Into<String>) -> Self {
        self.push(ReportSection::absent(name));
        self
    }

    /// Finish the report.
    pub fn build(self) -> CanonicalReport {
        CanonicalReport {
            sections: self.sections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Record;

    #[test]
    fn test_titles_and_placeholders() {
        let section = ReportSection::absent("relationships");
        assert_eq!(section.title(), "Relationships");
        assert_eq!(section.placeholder(), "No relationships available.");

        let section = ReportSection::absent("power_query");
        assert_eq!(section.title(), "Power Query Code");
        assert_eq!(section.placeholder(), "No Power Query code available.");

        let section = ReportSection::absent("tables");
        assert_eq!(section.title(), "Tables");
        assert_eq!(section.kind(), Some(SectionKind::Schema));
        assert_eq!(section.placeholder(), "No tables available.");
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("row_level_security"), "Row Level Security");
        assert_eq!(humanize("tables"), "Tables");
        assert_eq!(humanize("__"), "Section");
    }

    #[test]
    fn test_insertion_order_preserved() {
        let report = CanonicalReport::builder()
            .absent("dax_measures")
            .absent("metadata")
            .absent("schema")
            .build();
        assert_eq!(report.names(), vec!["dax_measures", "metadata", "schema"]);
    }

    #[test]
    fn test_duplicate_name_replaces_in_place() {
        let report = CanonicalReport::builder()
            .absent("metadata")
            .absent("schema")
            .section(
                "metadata",
                SectionContent::Records(vec![Record::from_pairs([("a", 1)])]),
            )
            .build();
        assert_eq!(report.names(), vec!["metadata", "schema"]);
        assert!(report.get("metadata").unwrap().has_data());
        assert_eq!(report.populated_count(), 1);
    }

    #[test]
    fn test_kind_aliases() {
        assert_eq!(SectionKind::from_name("Measures"), Some(SectionKind::DaxMeasures));
        assert_eq!(SectionKind::from_name("power-query"), Some(SectionKind::PowerQuery));
        assert_eq!(SectionKind::from_name("bookmarks"), None);
    }
}
