//! Word (.docx) renderer.

use super::layout::{self, Block, Grid, RecordBlock, SectionLayout};
use super::options::{PageSize, RenderOptions};
use super::package::{self, xml_text, PackageWriter, XML_DECLARATION};
use crate::error::Result;
use crate::model::CanonicalReport;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const STYLES_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

/// Render a report as a Word document.
pub fn to_docx(report: &CanonicalReport, options: &RenderOptions) -> Result<Vec<u8>> {
    let layouts = layout::layout_report(report.sections());

    let mut body = String::new();
    paragraph(&mut body, Some("Title"), &options.title, RunStyle::Plain);
    for section in &layouts {
        body.push_str(&section_xml(section));
    }

    let mut writer = PackageWriter::new();
    writer.add(
        "[Content_Types].xml",
        &package::content_types(&[
            (
                "/word/document.xml".to_string(),
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
            ),
            (
                "/word/styles.xml".to_string(),
                "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml",
            ),
            (
                "/docProps/core.xml".to_string(),
                package::CORE_PROPERTIES_CONTENT_TYPE,
            ),
        ]),
    )?;
    writer.add("_rels/.rels", &package::root_relationships("word/document.xml"))?;
    writer.add(
        "docProps/core.xml",
        &package::core_properties(&options.title, &options.creator),
    )?;
    writer.add("word/document.xml", &document_xml(&body, options))?;
    writer.add("word/styles.xml", &styles_xml(options))?;
    writer.add(
        "word/_rels/document.xml.rels",
        &package::relationships(&[("rId1".to_string(), STYLES_REL, "styles.xml".to_string())]),
    )?;
    writer.finish()
}

/// One section, written into its own buffer.
fn section_xml(section: &SectionLayout) -> String {
    let mut out = String::new();
    paragraph(&mut out, Some("Heading1"), &section.title, RunStyle::Plain);

    for block in &section.blocks {
        match block {
            Block::Subheading(text) => {
                paragraph(&mut out, Some("Heading2"), text, RunStyle::Plain)
            }
            Block::Paragraph(text) => paragraph(&mut out, None, text, RunStyle::Plain),
            Block::Placeholder(text) => paragraph(&mut out, None, text, RunStyle::Italic),
            Block::Error(text) => paragraph(&mut out, None, text, RunStyle::Error),
            Block::Pairs(pairs) => {
                for (key, value) in pairs {
                    labelled(&mut out, key, value);
                }
            }
            Block::Record(record) => record_xml(&mut out, record),
            Block::Table(grid) => table_xml(&mut out, grid),
        }
    }
    out
}

fn record_xml(out: &mut String, record: &RecordBlock) {
    for (label, value) in &record.fields {
        labelled(out, label, value);
    }
    if let Some(code) = &record.code {
        paragraph(out, None, &format!("{}:", code.label), RunStyle::Bold);
        paragraph(out, Some("Code"), &code.text, RunStyle::Plain);
    }
    empty_paragraph(out);
}

fn table_xml(out: &mut String, grid: &Grid) {
    out.push_str(r#"<w:tbl><w:tblPr><w:tblStyle w:val="TableGrid"/><w:tblW w:w="0" w:type="auto"/><w:tblLook w:val="04A0" w:firstRow="1" w:lastRow="0" w:firstColumn="0" w:lastColumn="0" w:noHBand="0" w:noVBand="1"/></w:tblPr>"#);
    out.push_str("<w:tblGrid>");
    for _ in &grid.header {
        out.push_str("<w:gridCol/>");
    }
    out.push_str("</w:tblGrid>");

    out.push_str(r#"<w:tr><w:trPr><w:tblHeader/></w:trPr>"#);
    for name in &grid.header {
        cell(out, name, RunStyle::Bold);
    }
    out.push_str("</w:tr>");

    for row in &grid.rows {
        out.push_str("<w:tr>");
        for value in row {
            cell(out, &value.text, RunStyle::Plain);
        }
        out.push_str("</w:tr>");
    }
    out.push_str("</w:tbl>");
    // Word merges adjacent tables unless a paragraph separates them.
    empty_paragraph(out);
}

fn cell(out: &mut String, text: &str, style: RunStyle) {
    out.push_str(r#"<w:tc><w:tcPr><w:tcW w:w="0" w:type="auto"/></w:tcPr>"#);
    paragraph(out, None, text, style);
    out.push_str("</w:tc>");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunStyle {
    Plain,
    Bold,
    Italic,
    Error,
}

impl RunStyle {
    fn properties(self) -> &'static str {
        match self {
            RunStyle::Plain => "",
            RunStyle::Bold => "<w:rPr><w:b/></w:rPr>",
            RunStyle::Italic => "<w:rPr><w:i/></w:rPr>",
            RunStyle::Error => r#"<w:rPr><w:color w:val="C00000"/></w:rPr>"#,
        }
    }
}

fn paragraph(out: &mut String, style: Option<&str>, text: &str, run_style: RunStyle) {
    out.push_str("<w:p>");
    if let Some(style) = style {
        out.push_str(&format!(r#"<w:pPr><w:pStyle w:val="{}"/></w:pPr>"#, style));
    }
    run(out, text, run_style);
    out.push_str("</w:p>");
}

/// `Label: value` with a bold label.
fn labelled(out: &mut String, label: &str, value: &str) {
    out.push_str("<w:p>");
    run(out, &format!("{}: ", label), RunStyle::Bold);
    run(out, value, RunStyle::Plain);
    out.push_str("</w:p>");
}

fn empty_paragraph(out: &mut String) {
    out.push_str("<w:p/>");
}

/// A run; embedded line breaks become `w:br`.
fn run(out: &mut String, text: &str, style: RunStyle) {
    out.push_str("<w:r>");
    out.push_str(style.properties());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push_str("<w:br/>");
        }
        let line = line.strip_suffix('\r').unwrap_or(line);
        out.push_str(r#"<w:t xml:space="preserve">"#);
        out.push_str(&xml_text(line));
        out.push_str("</w:t>");
    }
    out.push_str("</w:r>");
}

fn document_xml(body: &str, options: &RenderOptions) -> String {
    let (width, height) = match options.page_size {
        PageSize::Letter => (12240, 15840),
        PageSize::A4 => (11906, 16838),
    };
    let margin = twips(options.margin);
    format!(
        concat!(
            "{decl}<w:document xmlns:w=\"{ns}\"><w:body>{body}",
            "<w:sectPr><w:pgSz w:w=\"{w}\" w:h=\"{h}\"/>",
            "<w:pgMar w:top=\"{m}\" w:right=\"{m}\" w:bottom=\"{m}\" w:left=\"{m}\" ",
            "w:header=\"708\" w:footer=\"708\" w:gutter=\"0\"/></w:sectPr>",
            "</w:body></w:document>"
        ),
        decl = XML_DECLARATION,
        ns = W_NS,
        body = body,
        w = width,
        h = height,
        m = margin
    )
}

fn styles_xml(options: &RenderOptions) -> String {
    let heading = |id: &str, name: &str, size: f32, before: u32| {
        format!(
            concat!(
                "<w:style w:type=\"paragraph\" w:styleId=\"{id}\"><w:name w:val=\"{name}\"/>",
                "<w:basedOn w:val=\"Normal\"/><w:next w:val=\"Normal\"/><w:qFormat/>",
                "<w:pPr><w:keepNext/><w:spacing w:before=\"{before}\" w:after=\"120\"/></w:pPr>",
                "<w:rPr><w:b/><w:sz w:val=\"{sz}\"/></w:rPr></w:style>"
            ),
            id = id,
            name = name,
            before = before,
            sz = half_points(size)
        )
    };

    let mut xml = String::from(XML_DECLARATION);
    xml.push_str(&format!(r#"<w:styles xmlns:w="{}">"#, W_NS));
    xml.push_str(&format!(
        concat!(
            "<w:docDefaults><w:rPrDefault><w:rPr>",
            "<w:rFonts w:ascii=\"Calibri\" w:hAnsi=\"Calibri\" w:eastAsia=\"Calibri\" w:cs=\"Calibri\"/>",
            "<w:sz w:val=\"{sz}\"/></w:rPr></w:rPrDefault>",
            "<w:pPrDefault><w:pPr><w:spacing w:after=\"80\"/></w:pPr></w:pPrDefault></w:docDefaults>"
        ),
        sz = half_points(options.body_font_size)
    ));
    xml.push_str(
        r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#,
    );
    xml.push_str(&heading("Title", "Title", options.title_font_size, 0));
    xml.push_str(&heading("Heading1", "heading 1", options.heading_font_size, 360));
    xml.push_str(&heading("Heading2", "heading 2", options.subheading_font_size, 200));
    xml.push_str(&format!(
        concat!(
            "<w:style w:type=\"paragraph\" w:styleId=\"Code\"><w:name w:val=\"Code\"/>",
            "<w:basedOn w:val=\"Normal\"/>",
            "<w:pPr><w:shd w:val=\"clear\" w:color=\"auto\" w:fill=\"F2F2F2\"/>",
            "<w:spacing w:after=\"120\" w:line=\"240\" w:lineRule=\"auto\"/></w:pPr>",
            "<w:rPr><w:rFonts w:ascii=\"Consolas\" w:hAnsi=\"Consolas\" w:cs=\"Consolas\"/>",
            "<w:sz w:val=\"{sz}\"/></w:rPr></w:style>"
        ),
        sz = half_points(options.code_font_size)
    ));
    xml.push_str(concat!(
        "<w:style w:type=\"table\" w:styleId=\"TableGrid\"><w:name w:val=\"Table Grid\"/>",
        "<w:tblPr><w:tblBorders>",
        "<w:top w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"auto\"/>",
        "<w:left w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"auto\"/>",
        "<w:bottom w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"auto\"/>",
        "<w:right w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"auto\"/>",
        "<w:insideH w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"auto\"/>",
        "<w:insideV w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"auto\"/>",
        "</w:tblBorders><w:tblCellMar><w:left w:w=\"108\" w:type=\"dxa\"/>",
        "<w:right w:w=\"108\" w:type=\"dxa\"/></w:tblCellMar></w:tblPr></w:style>"
    ));
    xml.push_str("</w:styles>");
    xml
}

fn half_points(size: f32) -> u32 {
    (size * 2.0).round().max(2.0) as u32
}

fn twips(points: f32) -> u32 {
    (points * 20.0).round().max(0.0) as u32
}
