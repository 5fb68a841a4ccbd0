//! Excel (.xlsx) renderer.
//!
//! One worksheet per section, in report order. Cells are inline strings or
//! numbers, so the workbook needs no shared-strings part.

use super::layout::{self, Block, Cell, SectionLayout};
use super::options::RenderOptions;
use super::package::{self, xml_text, PackageWriter, XML_DECLARATION};
use crate::error::{Error, Result};
use crate::model::CanonicalReport;
use std::collections::HashSet;
use unicode_width::UnicodeWidthStr;

/// Maximum number of rows in a worksheet.
pub const MAX_ROWS: usize = 1_048_576;

/// Maximum length of a worksheet name.
pub const MAX_SHEET_NAME: usize = 31;

const MIN_COLUMN_WIDTH: usize = 8;
const MAX_COLUMN_WIDTH: usize = 80;

const SHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const WORKSHEET_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const STYLES_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

/// Cell formats, indices into `cellXfs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Normal = 0,
    Bold = 1,
    Wrap = 2,
    Title = 3,
    Error = 4,
}

/// Render a report as an Excel workbook.
pub fn to_xlsx(report: &CanonicalReport, options: &RenderOptions) -> Result<Vec<u8>> {
    let layouts = layout::layout_report(report.sections());
    let sheets = build_sheets(&layouts, &options.title, MAX_ROWS)?;

    let mut overrides = vec![(
        "/xl/workbook.xml".to_string(),
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml",
    )];
    for i in 1..=sheets.len() {
        overrides.push((
            format!("/xl/worksheets/sheet{}.xml", i),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml",
        ));
    }
    overrides.push((
        "/xl/styles.xml".to_string(),
        "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml",
    ));
    overrides.push((
        "/docProps/core.xml".to_string(),
        package::CORE_PROPERTIES_CONTENT_TYPE,
    ));

    let mut writer = PackageWriter::new();
    writer.add("[Content_Types].xml", &package::content_types(&overrides))?;
    writer.add("_rels/.rels", &package::root_relationships("xl/workbook.xml"))?;
    writer.add(
        "docProps/core.xml",
        &package::core_properties(&options.title, &options.creator),
    )?;
    writer.add("xl/workbook.xml", &workbook_xml(&sheets))?;
    writer.add("xl/_rels/workbook.xml.rels", &workbook_rels(sheets.len()))?;
    writer.add("xl/styles.xml", STYLES_XML)?;
    for (i, (_, xml)) in sheets.iter().enumerate() {
        writer.add(&format!("xl/worksheets/sheet{}.xml", i + 1), xml)?;
    }
    writer.finish()
}

/// Name and worksheet XML for every section.
fn build_sheets(
    layouts: &[SectionLayout],
    title: &str,
    max_rows: usize,
) -> Result<Vec<(String, String)>> {
    let mut sheets = Vec::new();
    let mut names = SheetNames::default();

    if layouts.is_empty() {
        let mut sheet = Sheet::new("report", max_rows);
        sheet.push_row(vec![(0, text_cell(title, Style::Title))])?;
        sheets.push((names.assign("Report"), sheet.to_xml()));
    }

    for section in layouts {
        let sheet = match section_sheet(section, max_rows) {
            Ok(sheet) => sheet,
            Err(e) => {
                let mut sheet = Sheet::new(&section.name, max_rows);
                sheet.push_row(vec![(0, text_cell(&section.title, Style::Title))])?;
                sheet.skip_row();
                if let Block::Error(text) = layout::error_block(&section.title, &e) {
                    sheet.push_row(vec![(0, text_cell(&text, Style::Error))])?;
                }
                sheet
            }
        };
        sheets.push((names.assign(&section.name), sheet.to_xml()));
    }
    Ok(sheets)
}

/// Lay one section out on a sheet: title in A1, content from row 3.
fn section_sheet(section: &SectionLayout, max_rows: usize) -> Result<Sheet> {
    let mut sheet = Sheet::new(&section.name, max_rows);
    sheet.push_row(vec![(0, text_cell(&section.title, Style::Title))])?;
    sheet.skip_row();

    let mut record_header: Option<Vec<String>> = None;
    for block in &section.blocks {
        if !matches!(block, Block::Record(_)) {
            record_header = None;
        }
        match block {
            Block::Subheading(text) => sheet.push_row(vec![(0, text_cell(text, Style::Bold))])?,
            Block::Paragraph(text) | Block::Placeholder(text) => {
                sheet.push_row(vec![(0, text_cell(text, Style::Normal))])?
            }
            Block::Error(text) => sheet.push_row(vec![(0, text_cell(text, Style::Error))])?,
            Block::Pairs(pairs) => {
                for (key, value) in pairs {
                    sheet.push_row(vec![
                        (0, text_cell(key, Style::Bold)),
                        (1, text_cell(value, Style::Normal)),
                    ])?;
                }
            }
            Block::Table(grid) => {
                sheet.push_row(header_row(&grid.header))?;
                for row in &grid.rows {
                    sheet.push_row(
                        row.iter()
                            .enumerate()
                            .map(|(col, cell)| (col, grid_cell(cell)))
                            .collect(),
                    )?;
                }
                sheet.skip_row();
            }
            Block::Record(record) => {
                let labels: Vec<String> = record.labels().into_iter().map(String::from).collect();
                if record_header.as_ref() != Some(&labels) {
                    sheet.push_row(header_row(&labels))?;
                    record_header = Some(labels);
                }
                let mut row: Vec<(usize, XCell)> = record
                    .fields
                    .iter()
                    .enumerate()
                    .map(|(col, (_, value))| (col, text_cell(value, Style::Normal)))
                    .collect();
                if let Some(code) = &record.code {
                    row.push((record.fields.len(), text_cell(&code.text, Style::Wrap)));
                }
                sheet.push_row(row)?;
            }
        }
    }
    Ok(sheet)
}

fn header_row(names: &[String]) -> Vec<(usize, XCell)> {
    names
        .iter()
        .enumerate()
        .map(|(col, name)| (col, text_cell(name, Style::Bold)))
        .collect()
}

#[derive(Debug, Clone)]
enum XCell {
    Text(String, Style),
    Number(f64, String),
}

fn text_cell(text: &str, style: Style) -> XCell {
    XCell::Text(text.to_string(), style)
}

fn grid_cell(cell: &Cell) -> XCell {
    match cell.number {
        Some(n) => XCell::Number(n, cell.text.clone()),
        None => text_cell(&cell.text, Style::Normal),
    }
}

#[derive(Debug)]
struct Sheet {
    section: String,
    max_rows: usize,
    rows: Vec<Vec<(usize, XCell)>>,
    widths: Vec<usize>,
}

impl Sheet {
    fn new(section: &str, max_rows: usize) -> Self {
        Self {
            section: section.to_string(),
            max_rows,
            rows: Vec::new(),
            widths: Vec::new(),
        }
    }

    fn push_row(&mut self, cells: Vec<(usize, XCell)>) -> Result<()> {
        if self.rows.len() >= self.max_rows {
            return Err(Error::render(
                self.section.as_str(),
                format!("content exceeds the worksheet limit of {} rows", self.max_rows),
            ));
        }
        // The title row does not size column A.
        if !self.rows.is_empty() {
            for (col, cell) in &cells {
                let width = match cell {
                    XCell::Text(text, _) => text.lines().map(|l| l.width()).max().unwrap_or(0),
                    XCell::Number(_, text) => text.width(),
                };
                if self.widths.len() <= *col {
                    self.widths.resize(col + 1, 0);
                }
                self.widths[*col] = self.widths[*col].max(width + 2);
            }
        }
        self.rows.push(cells);
        Ok(())
    }

    fn skip_row(&mut self) {
        if self.rows.len() < self.max_rows {
            self.rows.push(Vec::new());
        }
    }

    fn to_xml(&self) -> String {
        let mut xml = String::from(XML_DECLARATION);
        xml.push_str(&format!(r#"<worksheet xmlns="{}">"#, SHEET_NS));

        if !self.widths.is_empty() {
            xml.push_str("<cols>");
            for (i, width) in self.widths.iter().enumerate() {
                let width = (*width).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH);
                xml.push_str(&format!(
                    r#"<col min="{0}" max="{0}" width="{1}" customWidth="1"/>"#,
                    i + 1,
                    width
                ));
            }
            xml.push_str("</cols>");
        }

        xml.push_str("<sheetData>");
        for (i, cells) in self.rows.iter().enumerate() {
            if cells.is_empty() {
                continue;
            }
            let row = i + 1;
            xml.push_str(&format!(r#"<row r="{}">"#, row));
            for (col, cell) in cells {
                let reference = format!("{}{}", column_letter(*col), row);
                match cell {
                    XCell::Text(text, style) => {
                        let style_attr = match style {
                            Style::Normal => String::new(),
                            other => format!(r#" s="{}""#, *other as u8),
                        };
                        xml.push_str(&format!(
                            r#"<c r="{}" t="inlineStr"{}><is><t xml:space="preserve">{}</t></is></c>"#,
                            reference,
                            style_attr,
                            xml_text(text)
                        ));
                    }
                    XCell::Number(value, _) => {
                        xml.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, reference, value));
                    }
                }
            }
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData></worksheet>");
        xml
    }
}

/// Zero-based column index to `A`, `B`, ..., `Z`, `AA`, ...
fn column_letter(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// Assigns unique, valid worksheet names.
#[derive(Debug, Default)]
struct SheetNames {
    taken: HashSet<String>,
    count: usize,
}

impl SheetNames {
    fn assign(&mut self, section: &str) -> String {
        self.count += 1;
        let mut base = sanitize_sheet_name(section);
        if base.is_empty() {
            base = format!("Sheet{}", self.count);
        }

        let mut name = base.clone();
        let mut n = 1;
        while self.taken.contains(&name.to_lowercase()) {
            n += 1;
            let suffix = format!("_{}", n);
            let keep = MAX_SHEET_NAME - suffix.len();
            name = format!("{}{}", base.chars().take(keep).collect::<String>(), suffix);
        }
        self.taken.insert(name.to_lowercase());
        name
    }
}

/// Keep `[A-Za-z0-9 _]`, trim, and truncate to the sheet-name limit.
pub fn sanitize_sheet_name(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ' || *c == '_')
        .collect();
    kept.trim()
        .chars()
        .take(MAX_SHEET_NAME)
        .collect::<String>()
        .trim_end()
        .to_string()
}

fn workbook_xml(sheets: &[(String, String)]) -> String {
    let mut xml = String::from(XML_DECLARATION);
    xml.push_str(&format!(
        r#"<workbook xmlns="{}" xmlns:r="{}"><sheets>"#,
        SHEET_NS, REL_NS
    ));
    for (i, (name, _)) in sheets.iter().enumerate() {
        xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            xml_text(name),
            i + 1,
            i + 1
        ));
    }
    xml.push_str("</sheets></workbook>");
    xml
}

fn workbook_rels(sheet_count: usize) -> String {
    let mut rels: Vec<(String, &str, String)> = (1..=sheet_count)
        .map(|i| {
            (
                format!("rId{}", i),
                WORKSHEET_REL,
                format!("worksheets/sheet{}.xml", i),
            )
        })
        .collect();
    rels.push((
        format!("rId{}", sheet_count + 1),
        STYLES_REL,
        "styles.xml".to_string(),
    ));
    package::relationships(&rels)
}

const STYLES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    r#"<fonts count="4">"#,
    r#"<font><sz val="11"/><name val="Calibri"/></font>"#,
    r#"<font><b/><sz val="11"/><name val="Calibri"/></font>"#,
    r#"<font><b/><sz val="14"/><name val="Calibri"/></font>"#,
    r#"<font><sz val="11"/><color rgb="FFC00000"/><name val="Calibri"/></font>"#,
    r#"</fonts>"#,
    r#"<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>"#,
    r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#,
    r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
    r#"<cellXfs count="5">"#,
    r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#,
    r#"<xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/>"#,
    r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0" applyAlignment="1"><alignment wrapText="1" vertical="top"/></xf>"#,
    r#"<xf numFmtId="0" fontId="2" fillId="0" borderId="0" xfId="0" applyFont="1"/>"#,
    r#"<xf numFmtId="0" fontId="3" fillId="0" borderId="0" xfId="0" applyFont="1"/>"#,
    r#"</cellXfs>"#,
    r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
    r#"</styleSheet>"#
);
