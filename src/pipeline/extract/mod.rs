//! Per-format text extractors.
//!
//! Every extractor turns one document into Markdown and nothing else: no
//! staging, no timing, no cleanup beyond what its own format needs. The
//! shared pieces live here: the OOXML archive helpers used by DOCX and
//! PPTX, and a GFM table renderer used by DOCX, PPTX and XLSX.

pub mod docx;
pub mod html;
pub mod pdf;
pub mod pptx;
pub mod xlsx;

use crate::error::Doc2MdError;
use quick_xml::events::BytesStart;
use std::io::{Cursor, Read};
use zip::result::ZipError;
use zip::ZipArchive;

// ── OOXML containers ─────────────────────────────────────────────────────

pub(crate) type OoxmlArchive<'a> = ZipArchive<Cursor<&'a [u8]>>;

pub(crate) fn open_archive<'a>(
    name: &str,
    bytes: &'a [u8],
) -> Result<OoxmlArchive<'a>, Doc2MdError> {
    ZipArchive::new(Cursor::new(bytes)).map_err(|e| Doc2MdError::CorruptDocument {
        name: name.to_string(),
        detail: format!("unreadable ZIP container: {e}"),
    })
}

/// Read one XML part of an OOXML archive as UTF-8.
pub(crate) fn read_part(
    name: &str,
    archive: &mut OoxmlArchive<'_>,
    part: &str,
) -> Result<String, Doc2MdError> {
    let mut entry = archive.by_name(part).map_err(|e| match e {
        ZipError::FileNotFound => Doc2MdError::CorruptDocument {
            name: name.to_string(),
            detail: format!("missing part '{part}'"),
        },
        other => Doc2MdError::CorruptDocument {
            name: name.to_string(),
            detail: format!("cannot open part '{part}': {other}"),
        },
    })?;
    let mut xml = String::with_capacity(entry.size() as usize);
    entry
        .read_to_string(&mut xml)
        .map_err(|e| Doc2MdError::CorruptDocument {
            name: name.to_string(),
            detail: format!("cannot read part '{part}': {e}"),
        })?;
    Ok(xml)
}

/// Value of the attribute whose local name (prefix ignored) is `local`.
pub(crate) fn attr_value(e: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == local)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

pub(crate) fn xml_error(
    name: &str,
    format: &'static str,
    err: impl std::fmt::Display,
) -> Doc2MdError {
    Doc2MdError::ParseFailed {
        name: name.to_string(),
        format,
        detail: format!("malformed XML: {err}"),
    }
}

// ── Tables ───────────────────────────────────────────────────────────────

/// Accumulates rows and cells while walking a table in document order.
#[derive(Debug, Default)]
pub(crate) struct TableBuilder {
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: String,
}

impl TableBuilder {
    pub fn start_row(&mut self) {
        self.row.clear();
    }

    pub fn start_cell(&mut self) {
        self.cell.clear();
    }

    /// Append a paragraph's text to the current cell.
    pub fn push_text(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if !self.cell.is_empty() {
            self.cell.push(' ');
        }
        self.cell.push_str(text);
    }

    pub fn end_cell(&mut self) {
        self.row.push(std::mem::take(&mut self.cell));
    }

    pub fn end_row(&mut self) {
        self.rows.push(std::mem::take(&mut self.row));
    }

    pub fn finish(self) -> String {
        render_table(&self.rows)
    }
}

/// Render rows as a GFM table; the first row becomes the header.
///
/// Ragged rows are padded to the widest row. Returns an empty string when
/// there is nothing to show.
pub fn render_table(rows: &[Vec<String>]) -> String {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if width == 0 {
        return String::new();
    }

    let render_row = |row: &[String]| -> String {
        let mut line = String::from("|");
        for i in 0..width {
            let cell = row.get(i).map(String::as_str).unwrap_or("");
            line.push(' ');
            line.push_str(&escape_cell(cell));
            line.push_str(" |");
        }
        line
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(render_row(&rows[0]));
    lines.push(
        std::iter::once("|")
            .chain(std::iter::repeat_n(" --- |", width))
            .collect(),
    );
    for row in &rows[1..] {
        lines.push(render_row(row));
    }
    lines.join("\n")
}

fn escape_cell(cell: &str) -> String {
    cell.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|")
}

// ── Blocks ───────────────────────────────────────────────────────────────

/// Markdown blocks in document order; list items are kept tight.
#[derive(Debug, Default)]
pub(crate) struct Blocks {
    out: String,
    last_was_list_item: bool,
}

impl Blocks {
    pub fn push(&mut self, block: &str) {
        self.push_block(block, false);
    }

    pub fn push_list_item(&mut self, text: &str) {
        self.push_block(&format!("- {text}"), true);
    }

    fn push_block(&mut self, block: &str, is_list_item: bool) {
        if block.trim().is_empty() {
            return;
        }
        if !self.out.is_empty() {
            self.out
                .push_str(if is_list_item && self.last_was_list_item { "\n" } else { "\n\n" });
        }
        self.out.push_str(block);
        self.last_was_list_item = is_list_item;
    }

    pub fn finish(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn renders_header_and_separator() {
        let t = render_table(&[row(&["Name", "Qty"]), row(&["Apple", "3"])]);
        assert_eq!(t, "| Name | Qty |\n| --- | --- |\n| Apple | 3 |");
    }

    #[test]
    fn pads_ragged_rows_and_escapes_pipes() {
        let t = render_table(&[row(&["a"]), row(&["b|c", "d\nе"])]);
        assert_eq!(t, "| a |  |\n| --- | --- |\n| b\\|c | d е |");
    }

    #[test]
    fn empty_table_renders_nothing() {
        assert_eq!(render_table(&[]), "");
        assert_eq!(render_table(&[vec![]]), "");
    }

    #[test]
    fn blocks_keep_lists_tight() {
        let mut b = Blocks::default();
        b.push("# Title");
        b.push_list_item("one");
        b.push_list_item("two");
        b.push("after");
        b.push("   ");
        assert_eq!(b.finish(), "# Title\n\n- one\n- two\n\nafter");
    }

    #[test]
    fn table_builder_joins_paragraphs_in_cell() {
        let mut t = TableBuilder::default();
        t.start_row();
        t.start_cell();
        t.push_text("first");
        t.push_text("second");
        t.end_cell();
        t.end_row();
        assert_eq!(t.finish(), "| first second |\n| --- |");
    }
}
