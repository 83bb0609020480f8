//! DOCX → Markdown.
//!
//! Streams `word/document.xml` with quick-xml and maps the WordprocessingML
//! structure onto Markdown blocks:
//!
//! | Word                          | Markdown        |
//! |-------------------------------|-----------------|
//! | `Title`, `Heading1`…`Heading6`| `#` … `######`  |
//! | paragraph with `w:numPr`      | `- item`        |
//! | `w:tbl`                       | GFM table       |
//! | `w:tab` / `w:br`              | tab / newline   |
//!
//! Tables nested inside table cells are flattened into the enclosing cell.

use super::{attr_value, open_archive, read_part, xml_error, Blocks, TableBuilder};
use crate::error::Doc2MdError;
use quick_xml::events::Event;
use quick_xml::Reader;

const DOCUMENT_PART: &str = "word/document.xml";

/// Extract Markdown from an in-memory DOCX archive.
pub fn extract(name: &str, bytes: &[u8]) -> Result<String, Doc2MdError> {
    let mut archive = open_archive(name, bytes)?;
    let xml = read_part(name, &mut archive, DOCUMENT_PART)?;
    document_to_markdown(name, &xml)
}

#[derive(Debug, Default)]
struct Paragraph {
    text: String,
    style: Option<String>,
    is_list: bool,
}

impl Paragraph {
    fn heading_level(&self) -> Option<usize> {
        let style = self.style.as_deref()?.to_ascii_lowercase().replace(' ', "");
        if style == "title" {
            return Some(1);
        }
        style
            .strip_prefix("heading")
            .and_then(|n| n.parse::<usize>().ok())
            .filter(|n| (1..=6).contains(n))
    }
}

pub(crate) fn document_to_markdown(name: &str, xml: &str) -> Result<String, Doc2MdError> {
    let mut reader = Reader::from_str(xml);
    let mut blocks = Blocks::default();
    let mut paragraph: Option<Paragraph> = None;
    let mut table: Option<TableBuilder> = None;
    // >0 while inside a table nested in the outermost table.
    let mut nested_tables = 0usize;
    let mut in_text = false;
    let mut in_paragraph_props = false;

    loop {
        let event = reader.read_event().map_err(|e| xml_error(name, "DOCX", e))?;
        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => paragraph = Some(Paragraph::default()),
                b"pPr" => in_paragraph_props = true,
                b"t" => in_text = true,
                b"numPr" if in_paragraph_props => {
                    if let Some(p) = paragraph.as_mut() {
                        p.is_list = true;
                    }
                }
                b"tbl" => {
                    if table.is_some() {
                        nested_tables += 1;
                    } else {
                        table = Some(TableBuilder::default());
                    }
                }
                b"tr" if nested_tables == 0 => {
                    if let Some(t) = table.as_mut() {
                        t.start_row();
                    }
                }
                b"tc" if nested_tables == 0 => {
                    if let Some(t) = table.as_mut() {
                        t.start_cell();
                    }
                }
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"pStyle" => {
                    if let Some(p) = paragraph.as_mut() {
                        p.style = attr_value(&e, b"val");
                    }
                }
                b"tab" if !in_paragraph_props => {
                    if let Some(p) = paragraph.as_mut() {
                        p.text.push('\t');
                    }
                }
                b"br" | b"cr" => {
                    if let Some(p) = paragraph.as_mut() {
                        p.text.push('\n');
                    }
                }
                _ => {}
            },
            Event::Text(e) if in_text => {
                if let Some(p) = paragraph.as_mut() {
                    let text = e.unescape().map_err(|err| xml_error(name, "DOCX", err))?;
                    p.text.push_str(&text);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"pPr" => in_paragraph_props = false,
                b"p" => {
                    if let Some(p) = paragraph.take() {
                        match table.as_mut() {
                            Some(t) => t.push_text(&p.text),
                            None => emit_paragraph(&mut blocks, &p),
                        }
                    }
                }
                b"tc" if nested_tables == 0 => {
                    if let Some(t) = table.as_mut() {
                        t.end_cell();
                    }
                }
                b"tr" if nested_tables == 0 => {
                    if let Some(t) = table.as_mut() {
                        t.end_row();
                    }
                }
                b"tbl" => {
                    if nested_tables > 0 {
                        nested_tables -= 1;
                    } else if let Some(t) = table.take() {
                        blocks.push(&t.finish());
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(blocks.finish())
}

fn emit_paragraph(blocks: &mut Blocks, p: &Paragraph) {
    let text = p.text.trim();
    if text.is_empty() {
        return;
    }
    if let Some(level) = p.heading_level() {
        blocks.push(&format!("{} {}", "#".repeat(level), text));
    } else if p.is_list {
        blocks.push_list_item(text);
    } else {
        blocks.push(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        )
    }

    fn para(style: Option<&str>, text: &str) -> String {
        let ppr = style
            .map(|s| format!(r#"<w:pPr><w:pStyle w:val="{s}"/></w:pPr>"#))
            .unwrap_or_default();
        format!(r#"<w:p>{ppr}<w:r><w:t xml:space="preserve">{text}</w:t></w:r></w:p>"#)
    }

    #[test]
    fn headings_and_paragraphs() {
        let xml = wrap(&[
            para(Some("Title"), "Quarterly Report"),
            para(Some("Heading2"), "Summary"),
            para(None, "Revenue grew &amp; costs fell."),
        ]
        .concat());
        let md = document_to_markdown("r.docx", &xml).unwrap();
        assert_eq!(md, "# Quarterly Report\n\n## Summary\n\nRevenue grew & costs fell.");
    }

    #[test]
    fn list_items_are_tight() {
        let item = |t: &str| {
            format!(
                r#"<w:p><w:pPr><w:numPr><w:ilvl w:val="0"/><w:numId w:val="1"/></w:numPr></w:pPr><w:r><w:t>{t}</w:t></w:r></w:p>"#
            )
        };
        let xml = wrap(&[item("alpha"), item("beta")].concat());
        assert_eq!(document_to_markdown("l.docx", &xml).unwrap(), "- alpha\n- beta");
    }

    #[test]
    fn tab_stops_in_properties_are_not_text() {
        let xml = wrap(
            r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t></w:r></w:p>"#,
        );
        assert_eq!(document_to_markdown("t.docx", &xml).unwrap(), "a\tb");
    }

    #[test]
    fn tables_become_gfm() {
        let cell = |t: &str| format!("<w:tc>{}</w:tc>", para(None, t));
        let xml = wrap(&format!(
            "{}<w:tbl><w:tr>{}{}</w:tr><w:tr>{}{}</w:tr></w:tbl>",
            para(None, "Before"),
            cell("Item"),
            cell("Price"),
            cell("Tea"),
            cell("2.50"),
        ));
        let md = document_to_markdown("t.docx", &xml).unwrap();
        assert_eq!(md, "Before\n\n| Item | Price |\n| --- | --- |\n| Tea | 2.50 |");
    }

    #[test]
    fn unicode_text_survives() {
        let xml = wrap(&para(None, "Grüße 日本 🚀"));
        assert_eq!(document_to_markdown("u.docx", &xml).unwrap(), "Grüße 日本 🚀");
    }

    #[test]
    fn malformed_xml_is_parse_error() {
        let err = document_to_markdown("bad.docx", "<w:document><w:body></w:p>").unwrap_err();
        assert!(matches!(err, Doc2MdError::ParseFailed { format: "DOCX", .. }), "{err:?}");
    }

    #[test]
    fn missing_document_part_is_corrupt() {
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            zip.start_file("word/other.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            std::io::Write::write_all(&mut zip, b"<x/>").unwrap();
            zip.finish().unwrap();
        }
        let err = extract("empty.docx", buf.get_ref()).unwrap_err();
        assert!(matches!(err, Doc2MdError::CorruptDocument { .. }), "{err:?}");
        assert!(err.to_string().contains("word/document.xml"));
    }
}
