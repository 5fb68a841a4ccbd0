//! Rendering options configuration.

/// Default document title.
pub const DEFAULT_TITLE: &str = "Power BI Report Documentation";

/// Page size for fixed-layout output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PageSize {
    /// US Letter, 612 × 792 pt
    #[default]
    Letter,
    /// ISO A4, 595 × 842 pt
    A4,
}

impl PageSize {
    /// Width and height in points.
    pub fn dimensions(&self) -> (f32, f32) {
        match self {
            PageSize::Letter => (612.0, 792.0),
            PageSize::A4 => (595.0, 842.0),
        }
    }
}

/// Options for rendering documents.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Title shown at the top of every document
    pub title: String,

    /// Author recorded in document properties
    pub creator: String,

    /// Page size (PDF only)
    pub page_size: PageSize,

    /// Page margin in points on every side (PDF only)
    pub margin: f32,

    /// Font size of the document title
    pub title_font_size: f32,

    /// Font size of section headings
    pub heading_font_size: f32,

    /// Font size of sub-headings inside a section
    pub subheading_font_size: f32,

    /// Font size of body text
    pub body_font_size: f32,

    /// Font size of code (M and DAX expressions)
    pub code_font_size: f32,

    /// Line height as a multiple of the font size
    pub line_spacing: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            creator: "pbidoc".to_string(),
            page_size: PageSize::Letter,
            margin: 50.0,
            title_font_size: 18.0,
            heading_font_size: 14.0,
            subheading_font_size: 12.0,
            body_font_size: 10.0,
            code_font_size: 9.0,
            line_spacing: 1.4,
        }
    }
}

impl RenderOptions {
    /// Create new render options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the document author.
    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = creator.into();
        self
    }

    /// Set the page size.
    pub fn with_page_size(mut self, page_size: PageSize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the page margin. Clamped so that some printable area always remains.
    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin.clamp(0.0, 200.0);
        self
    }

    /// Set the body font size; other sizes keep their values.
    pub fn with_body_font_size(mut self, size: f32) -> Self {
        self.body_font_size = size.clamp(4.0, 72.0);
        self
    }

    /// Set the code font size.
    pub fn with_code_font_size(mut self, size: f32) -> Self {
        self.code_font_size = size.clamp(4.0, 72.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = RenderOptions::default();
        assert_eq!(opts.title, DEFAULT_TITLE);
        assert_eq!(opts.page_size, PageSize::Letter);
        assert_eq!(opts.margin, 50.0);
        assert!((opts.body_font_size * opts.line_spacing - 14.0).abs() < 1e-3);
    }

    #[test]
    fn test_builder_pattern() {
        let opts = RenderOptions::new()
            .with_title("Sales Model")
            .with_page_size(PageSize::A4)
            .with_margin(36.0);

        assert_eq!(opts.title, "Sales Model");
        assert_eq!(opts.page_size.dimensions(), (595.0, 842.0));
        assert_eq!(opts.margin, 36.0);
    }

    #[test]
    fn test_clamps() {
        let opts = RenderOptions::new().with_margin(1000.0).with_body_font_size(0.5);
        assert_eq!(opts.margin, 200.0);
        assert_eq!(opts.body_font_size, 4.0);
    }
}
