//! XLSX → Markdown via calamine.
//!
//! Each worksheet becomes a `## <sheet name>` section followed by a GFM
//! table of its used range; the first row is treated as the header.

use super::render_table;
use crate::error::Doc2MdError;
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::debug;

pub fn extract(name: &str, path: &Path) -> Result<String, Doc2MdError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| Doc2MdError::CorruptDocument {
        name: name.to_string(),
        detail: format!("cannot open workbook: {e}"),
    })?;

    let mut sections = Vec::new();
    for sheet in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|e| Doc2MdError::ParseFailed {
                name: name.to_string(),
                format: "XLSX",
                detail: format!("sheet '{sheet}': {e}"),
            })?;
        debug!("Sheet '{}' of '{}': {:?}", sheet, name, range.get_size());

        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        let table = render_table(&rows);
        sections.push(if table.is_empty() {
            format!("## {sheet}")
        } else {
            format!("## {sheet}\n\n{table}")
        });
    }

    Ok(sections.join("\n\n"))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}
