//! PPTX → Markdown.
//!
//! Slides are read from `ppt/slides/slideN.xml` in numeric order (archive
//! order is not slide order). Each slide starts with an HTML comment
//! carrying its number, title placeholders become `#` headings, tables
//! become GFM tables, and every other text paragraph is emitted as-is.

use super::{attr_value, open_archive, read_part, xml_error, Blocks, TableBuilder};
use crate::error::Doc2MdError;
use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;

static RE_SLIDE_PART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").unwrap());

/// Extract Markdown from an in-memory PPTX archive.
pub fn extract(name: &str, bytes: &[u8]) -> Result<String, Doc2MdError> {
    let mut archive = open_archive(name, bytes)?;

    let mut slides: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|part| {
            let caps = RE_SLIDE_PART.captures(part)?;
            let number = caps[1].parse().ok()?;
            Some((number, part.to_string()))
        })
        .collect();
    if slides.is_empty() {
        return Err(Doc2MdError::CorruptDocument {
            name: name.to_string(),
            detail: "no slides found under 'ppt/slides/'".into(),
        });
    }
    slides.sort_by_key(|(number, _)| *number);

    let mut sections = Vec::with_capacity(slides.len());
    for (number, part) in slides {
        let xml = read_part(name, &mut archive, &part)?;
        let body = slide_to_markdown(name, &xml)?;
        let header = format!("<!-- Slide number: {number} -->");
        sections.push(if body.is_empty() {
            header
        } else {
            format!("{header}\n\n{body}")
        });
    }
    Ok(sections.join("\n\n"))
}

pub(crate) fn slide_to_markdown(name: &str, xml: &str) -> Result<String, Doc2MdError> {
    let mut reader = Reader::from_str(xml);
    let mut blocks = Blocks::default();
    let mut shape_is_title = false;
    let mut paragraph: Option<String> = None;
    let mut table: Option<TableBuilder> = None;
    let mut in_text = false;

    loop {
        let event = reader.read_event().map_err(|e| xml_error(name, "PPTX", e))?;
        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"sp" => shape_is_title = false,
                b"ph" => shape_is_title = is_title_placeholder(&attr_value(&e, b"type")),
                b"p" => paragraph = Some(String::new()),
                b"t" => in_text = true,
                b"tbl" => table = Some(TableBuilder::default()),
                b"tr" => {
                    if let Some(t) = table.as_mut() {
                        t.start_row();
                    }
                }
                b"tc" => {
                    if let Some(t) = table.as_mut() {
                        t.start_cell();
                    }
                }
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"ph" => shape_is_title = is_title_placeholder(&attr_value(&e, b"type")),
                b"br" => {
                    if let Some(p) = paragraph.as_mut() {
                        p.push('\n');
                    }
                }
                _ => {}
            },
            Event::Text(e) if in_text => {
                if let Some(p) = paragraph.as_mut() {
                    let text = e.unescape().map_err(|err| xml_error(name, "PPTX", err))?;
                    p.push_str(&text);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    if let Some(text) = paragraph.take() {
                        let text = text.trim();
                        match table.as_mut() {
                            Some(t) => t.push_text(text),
                            None if text.is_empty() => {}
                            None if shape_is_title => blocks.push(&format!("# {text}")),
                            None => blocks.push(text),
                        }
                    }
                }
                b"tc" => {
                    if let Some(t) = table.as_mut() {
                        t.end_cell();
                    }
                }
                b"tr" => {
                    if let Some(t) = table.as_mut() {
                        t.end_row();
                    }
                }
                b"tbl" => {
                    if let Some(t) = table.take() {
                        blocks.push(&t.finish());
                    }
                }
                b"sp" => shape_is_title = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(blocks.finish())
}

fn is_title_placeholder(kind: &Option<String>) -> bool {
    matches!(kind.as_deref(), Some("title") | Some("ctrTitle"))
}
