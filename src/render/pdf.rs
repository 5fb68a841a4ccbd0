//! PDF renderer.
//!
//! Writes an uncompressed PDF with the standard Type1 fonts, so no font
//! program is embedded. Text is wrapped against the fonts' advance widths
//! and paginated line by line: whenever the next baseline would cross the
//! bottom margin, a new page starts at the top margin. Nothing is truncated.

use super::layout::{self, Block, SectionLayout};
use super::options::RenderOptions;
use crate::error::{Error, Result};
use crate::model::CanonicalReport;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};
use unicode_normalization::UnicodeNormalization;

/// Spaces substituted for a tab.
const TAB_WIDTH: usize = 4;

/// Indentation of code blocks, in points.
const CODE_INDENT: f32 = 12.0;

const ERROR_COLOR: (f32, f32, f32) = (0.75, 0.0, 0.0);

/// Helvetica advance widths for U+0020..=U+007E (AFM units).
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p..~
];

/// Helvetica-Bold advance widths for U+0020..=U+007E (AFM units).
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 0..?
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // P.._
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // `..o
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // p..~
];

/// Standard Type1 fonts used by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Font {
    Regular,
    Bold,
    Oblique,
    Mono,
}

impl Font {
    const ALL: [Font; 4] = [Font::Regular, Font::Bold, Font::Oblique, Font::Mono];

    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Oblique => "F3",
            Font::Mono => "F4",
        }
    }

    fn base_font(self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
            Font::Oblique => "Helvetica-Oblique",
            Font::Mono => "Courier",
        }
    }

    /// Advance width of a character in 1/1000 em.
    fn advance(self, c: char) -> u16 {
        let table = match self {
            Font::Mono => return 600,
            Font::Bold => &HELVETICA_BOLD,
            Font::Regular | Font::Oblique => &HELVETICA,
        };
        let ascii = |c: char| table[c as usize - 0x20];
        match c {
            ' '..='~' => ascii(c),
            '\u{A0}' => ascii(' '),
            _ => match std::iter::once(c).nfd().next() {
                // Accented letters take the width of their base letter.
                Some(base) if base != c && (' '..='~').contains(&base) => ascii(base),
                _ => 1000,
            },
        }
    }

    fn text_width(self, text: &str, size: f32) -> f32 {
        text.chars().map(|c| self.advance(c) as f32).sum::<f32>() * size / 1000.0
    }
}

/// Render a report as a PDF document.
pub fn to_pdf(report: &CanonicalReport, options: &RenderOptions) -> Result<Vec<u8>> {
    let layouts = layout::layout_report(report.sections());

    let mut pages = PageWriter::new(options);
    pages.wrapped(&options.title, Font::Bold, options.title_font_size, 0.0, None);
    pages.gap(options.body_font_size);
    for section in &layouts {
        section_pages(&mut pages, section);
    }

    assemble(pages.finish(), options)
}

fn section_pages(pages: &mut PageWriter<'_>, section: &SectionLayout) {
    let options = pages.options;
    let body = options.body_font_size;

    pages.gap(options.heading_font_size * 0.6);
    pages.wrapped(&section.title, Font::Bold, options.heading_font_size, 0.0, None);
    pages.gap(body * 0.3);

    for block in &section.blocks {
        match block {
            Block::Subheading(text) => {
                pages.gap(body * 0.4);
                pages.wrapped(text, Font::Bold, options.subheading_font_size, 0.0, None);
            }
            Block::Paragraph(text) => pages.wrapped(text, Font::Regular, body, 0.0, None),
            Block::Placeholder(text) => pages.wrapped(text, Font::Oblique, body, 0.0, None),
            Block::Error(text) => pages.wrapped(text, Font::Regular, body, 0.0, Some(ERROR_COLOR)),
            Block::Pairs(pairs) => {
                for (key, value) in pairs {
                    pages.wrapped(&format!("{}: {}", key, value), Font::Regular, body, 0.0, None);
                }
            }
            Block::Record(record) => {
                for (label, value) in &record.fields {
                    pages.wrapped(&format!("{}: {}", label, value), Font::Regular, body, 0.0, None);
                }
                if let Some(code) = &record.code {
                    pages.wrapped(&format!("{}:", code.label), Font::Bold, body, 0.0, None);
                    pages.wrapped(&code.text, Font::Mono, options.code_font_size, CODE_INDENT, None);
                }
                pages.gap(body * 0.6);
            }
            Block::Table(grid) => {
                pages.wrapped(&grid.header.join(" | "), Font::Bold, body, 0.0, None);
                for row in &grid.rows {
                    let line = row
                        .iter()
                        .map(|c| c.text.as_str())
                        .collect::<Vec<_>>()
                        .join(" | ");
                    pages.wrapped(&line, Font::Regular, body, 0.0, None);
                }
                pages.gap(body * 0.6);
            }
        }
    }
}

/// Content-driven page layout.
struct PageWriter<'a> {
    options: &'a RenderOptions,
    width: f32,
    height: f32,
    pages: Vec<Vec<Operation>>,
    y: f32,
}

impl<'a> PageWriter<'a> {
    fn new(options: &'a RenderOptions) -> Self {
        let (width, height) = options.page_size.dimensions();
        Self {
            options,
            width,
            height,
            pages: vec![Vec::new()],
            y: height - options.margin,
        }
    }

    fn printable_width(&self) -> f32 {
        (self.width - 2.0 * self.options.margin).max(36.0)
    }

    fn new_page(&mut self) {
        self.pages.push(Vec::new());
        self.y = self.height - self.options.margin;
    }

    fn gap(&mut self, points: f32) {
        self.y -= points;
    }

    /// Wrap text to the printable width and emit it line by line.
    fn wrapped(
        &mut self,
        text: &str,
        font: Font,
        size: f32,
        indent: f32,
        color: Option<(f32, f32, f32)>,
    ) {
        let width = (self.printable_width() - indent).max(size);
        for line in wrap(&prepare(text), font, size, width) {
            self.line(&line, font, size, indent, color);
        }
    }

    fn line(&mut self, text: &str, font: Font, size: f32, indent: f32, color: Option<(f32, f32, f32)>) {
        let leading = size * self.options.line_spacing;
        if self.y - leading < self.options.margin {
            self.new_page();
        }
        self.y -= leading;

        if text.is_empty() {
            return;
        }
        let x = self.options.margin + indent;
        let y = self.y;
        if let Some(ops) = self.pages.last_mut() {
            show_text(ops, text, font, size, x, y, color);
        }
    }

    /// Add page numbers and hand back every page's operations.
    fn finish(mut self) -> Vec<Vec<Operation>> {
        let total = self.pages.len();
        let size = 8.0;
        let y = (self.options.margin / 2.0).max(size);
        for (i, ops) in self.pages.iter_mut().enumerate() {
            let label = format!("Page {} of {}", i + 1, total);
            let x = self.width - self.options.margin - Font::Regular.text_width(&label, size);
            show_text(ops, &label, Font::Regular, size, x, y, None);
        }
        self.pages
    }
}

fn show_text(
    ops: &mut Vec<Operation>,
    text: &str,
    font: Font,
    size: f32,
    x: f32,
    y: f32,
    color: Option<(f32, f32, f32)>,
) {
    ops.push(Operation::new("BT", vec![]));
    if let Some((r, g, b)) = color {
        ops.push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
    }
    ops.push(Operation::new("Tf", vec![font.resource().into(), size.into()]));
    ops.push(Operation::new("Td", vec![x.into(), y.into()]));
    ops.push(Operation::new(
        "Tj",
        vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
    ));
    ops.push(Operation::new("ET", vec![]));
}

/// NFC-normalize, expand tabs, and replace what WinAnsi cannot show with `?`.
fn prepare(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.nfc() {
        match c {
            '\n' => out.push('\n'),
            '\t' => out.push_str(&" ".repeat(TAB_WIDTH)),
            '\r' => {}
            c if c.is_control() => {}
            c if win_ansi_byte(c).is_some() => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

/// Break text into lines no wider than `max_width` points.
///
/// Explicit line breaks are kept. Proportional text breaks between words,
/// splitting words that do not fit on a line of their own; code keeps its
/// spacing and breaks at the last space that fits, else mid-token.
fn wrap(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for raw in text.split('\n') {
        if font == Font::Mono {
            let capacity = ((max_width / (0.6 * size)).floor() as usize).max(1);
            lines.extend(wrap_code(raw, capacity));
        } else {
            lines.extend(wrap_words(raw, font, size, max_width));
        }
    }
    lines
}

fn wrap_words(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let space = font.text_width(" ", size);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0;

    for word in text.split_whitespace() {
        let width = font.text_width(word, size);
        if !current.is_empty() && current_width + space + width <= max_width {
            current.push(' ');
            current.push_str(word);
            current_width += space + width;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current_width = 0.0;
        }
        if width <= max_width {
            current.push_str(word);
            current_width = width;
            continue;
        }
        for c in word.chars() {
            let advance = font.advance(c) as f32 * size / 1000.0;
            if !current.is_empty() && current_width + advance > max_width {
                lines.push(std::mem::take(&mut current));
                current_width = 0.0;
            }
            current.push(c);
            current_width += advance;
        }
    }
    lines.push(current);
    lines
}

fn wrap_code(line: &str, capacity: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    if chars.len() <= capacity {
        return vec![line.to_string()];
    }

    let mut lines = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let mut end = (start + capacity).min(chars.len());
        if end < chars.len() {
            if let Some(pos) = chars[start..end].iter().rposition(|c| *c == ' ') {
                if pos > 0 {
                    end = start + pos + 1;
                }
            }
        }
        lines.push(chars[start..end].iter().collect());
        start = end;
    }
    lines
}

/// WinAnsiEncoding byte for a character.
fn win_ansi_byte(c: char) -> Option<u8> {
    let code = c as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(code as u8),
        _ => Some(match c {
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8A,
            '‹' => 0x8B,
            'Œ' => 0x8C,
            'Ž' => 0x8E,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9A,
            '›' => 0x9B,
            'œ' => 0x9C,
            'ž' => 0x9E,
            'Ÿ' => 0x9F,
            _ => return None,
        }),
    }
}

fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(|c| win_ansi_byte(c).unwrap_or(b'?')).collect()
}

fn assemble(pages: Vec<Vec<Operation>>, options: &RenderOptions) -> Result<Vec<u8>> {
    let (width, height) = options.page_size.dimensions();
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for font in Font::ALL {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(font.resource(), font_id);
    }
    let resources_id = doc.add_object(dictionary! { "Font" => fonts });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let data = Content { operations }.encode()?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, data));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let media_box: Vec<Object> = vec![0i64.into(), 0i64.into(), width.into(), height.into()];
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => media_box,
        }),
    );

    let info_id = doc.add_object(dictionary! {
        "Title" => Object::String(encode_win_ansi(&prepare(&options.title)), StringFormat::Literal),
        "Creator" => Object::String(encode_win_ansi(&prepare(&options.creator)), StringFormat::Literal),
    });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| Error::Serialization(e.to_string()))?;
    Ok(buffer)
}
