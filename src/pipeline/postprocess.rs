//! Post-processing: deterministic cleanup of extracted text.
//!
//! Each extractor produces Markdown from a different source structure
//! (Word runs, slide shapes, worksheet cells, PDF text layers, HTML DOM),
//! and each leaves its own artefacts: CRLF line endings from Office XML,
//! trailing spaces after tabs, runs of empty paragraphs, zero-width
//! characters pasted from the web. These rules normalise all of that in one
//! place so the extractors stay focused on structure.
//!
//! Every rule is a pure `&str → String` function, so the same input always
//! yields byte-identical output.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to raw extractor output.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Strip zero-width spaces, word joiners and a leading BOM
/// 3. Replace non-breaking spaces with plain spaces
/// 4. Trim trailing whitespace per line
/// 5. Collapse 3+ consecutive blank lines down to 2
/// 6. Insert a GFM separator row under table headers that lack one
/// 7. Ensure the text ends with exactly one newline
///
/// Table rows are never removed: a row of `-` cells is document content.
/// ZWJ and ZWNJ are kept since scripts and emoji sequences depend on them.
pub fn clean_text(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = replace_nbsp(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    let s = fix_broken_tables(&s);
    ensure_final_newline(&s)
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input
        .strip_prefix('\u{FEFF}')
        .unwrap_or(input)
        .replace(['\u{200B}', '\u{2060}'], "")
}

// ── Rule 3: Non-breaking spaces ──────────────────────────────────────────────

fn replace_nbsp(input: &str) -> String {
    input.replace(['\u{00A0}', '\u{202F}'], " ")
}

// ── Rule 4: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 5: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n\n").to_string()
}

// ── Rule 6: Fix tables without a separator row ──────────────────────────────

/// A run of `|`-delimited rows whose first row is not followed by a
/// separator gets one, sized to the header's column count.
fn fix_broken_tables(input: &str) -> String {
    let lines: Vec<&str> = input.lines().collect();
    let mut result = Vec::with_capacity(lines.len() + 8);
    let mut prev_is_table = false;

    for (i, line) in lines.iter().enumerate() {
        result.push(line.to_string());
        let this_is_table = is_table_row(line);

        // Header row = first table row of a block.
        if this_is_table && !prev_is_table && !is_separator_row(line) {
            let next = lines.get(i + 1).copied().unwrap_or("");
            if is_table_row(next) && !is_separator_row(next) {
                result.push(separator_for(line));
            }
        }
        prev_is_table = this_is_table;
    }

    result.join("\n")
}

fn separator_for(header: &str) -> String {
    let col_count = header.trim().matches('|').count().saturating_sub(1).max(1);
    std::iter::once("|")
        .chain(std::iter::repeat_n(" --- |", col_count))
        .collect()
}

fn is_table_row(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('|') && trimmed.ends_with('|') && trimmed.len() > 2
}

fn is_separator_row(line: &str) -> bool {
    let trimmed = line.trim();
    if !trimmed.starts_with('|') || !trimmed.contains('-') {
        return false;
    }
    trimmed
        .chars()
        .all(|c| c == '|' || c == '-' || c == ':' || c == ' ')
}

// ── Rule 7: Ensure file ends with single newline ─────────────────────────────

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::from("\n")
    } else {
        format!("{}\n", trimmed)
    }
}
