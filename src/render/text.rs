//! Plain text renderer implementation.

use super::layout::{self, Block, Grid, SectionLayout};
use super::options::RenderOptions;
use crate::model::CanonicalReport;
use unicode_width::UnicodeWidthStr;

/// Convert a report to plain text.
pub fn to_text(report: &CanonicalReport, options: &RenderOptions) -> String {
    let mut output = String::new();
    underlined(&mut output, &options.title, '=');

    for section in layout::layout_report(report.sections()) {
        output.push('\n');
        render_section(&mut output, &section);
    }

    output.trim_end().to_string()
}

fn render_section(output: &mut String, section: &SectionLayout) {
    underlined(output, &section.title, '-');

    for block in &section.blocks {
        match block {
            Block::Subheading(text) => {
                output.push('\n');
                output.push_str(text);
                output.push('\n');
            }
            Block::Paragraph(text) | Block::Placeholder(text) | Block::Error(text) => {
                output.push_str(text);
                output.push('\n');
            }
            Block::Pairs(pairs) => {
                for (key, value) in pairs {
                    output.push_str(&format!("{}: {}\n", key, value));
                }
            }
            Block::Record(record) => {
                for (label, value) in &record.fields {
                    output.push_str(&format!("{}: {}\n", label, value));
                }
                if let Some(code) = &record.code {
                    output.push_str(&format!("{}:\n", code.label));
                    for line in code.text.lines() {
                        output.push_str("    ");
                        output.push_str(line);
                        output.push('\n');
                    }
                }
                output.push('\n');
            }
            Block::Table(grid) => {
                output.push_str(&render_table_text(grid));
                output.push('\n');
            }
        }
    }
}

fn underlined(output: &mut String, text: &str, marker: char) {
    output.push_str(text);
    output.push('\n');
    output.push_str(&marker.to_string().repeat(text.width().max(3)));
    output.push('\n');
}

/// Render a grid as an ASCII table.
fn render_table_text(grid: &Grid) -> String {
    let col_count = grid.header.len();
    if col_count == 0 {
        return String::new();
    }

    let flat = |s: &str| s.replace('\n', " ");
    let mut widths: Vec<usize> = grid.header.iter().map(|h| flat(h).width()).collect();
    for row in &grid.rows {
        for (i, cell) in row.iter().enumerate().take(col_count) {
            widths[i] = widths[i].max(flat(&cell.text).width());
        }
    }
    for w in &mut widths {
        *w = (*w).max(3);
    }

    let border = |fill: char| {
        let mut line = String::from("+");
        for w in &widths {
            line.push_str(&fill.to_string().repeat(w + 2));
            line.push('+');
        }
        line.push('\n');
        line
    };
    let row_line = |cells: Vec<String>| {
        let mut line = String::from("|");
        for (text, w) in cells.iter().zip(&widths) {
            let pad = w.saturating_sub(text.width());
            line.push(' ');
            line.push_str(text);
            line.push_str(&" ".repeat(pad + 1));
            line.push('|');
        }
        line.push('\n');
        line
    };

    let mut output = border('-');
    output.push_str(&row_line(grid.header.iter().map(|h| flat(h)).collect()));
    output.push_str(&border('='));
    for row in &grid.rows {
        output.push_str(&row_line(row.iter().map(|c| flat(&c.text)).collect()));
    }
    output.push_str(&border('-'));
    output
}
