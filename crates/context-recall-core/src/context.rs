//! Budgeted context assembly.
//!
//! Renders ranked results as `"{source}: {text}"` sections joined by a
//! blank line, never exceeding `max_chars` chars. A section that does not
//! fit is cut and marked with [`ELLIPSIS`], and assembly stops there; the
//! marker is counted inside the budget.
//!
//! When the naive rendering would exceed the budget by a wide margin
//! (`condense_ratio`), results are first condensed: one section per source
//! document, each shortened to `preview_chars`.

use std::borrow::Cow;
use std::collections::HashSet;

use crate::models::SearchResult;
use crate::params::ContextParams;

/// Marker appended to truncated text.
pub const ELLIPSIS: &str = "...";

const SECTION_SEPARATOR: &str = "\n\n";
const LABEL_SEPARATOR: &str = ": ";

struct Section<'a> {
    source: &'a str,
    text: Cow<'a, str>,
}

impl Section<'_> {
    fn label_chars(&self) -> usize {
        self.source.chars().count() + LABEL_SEPARATOR.len()
    }

    fn chars(&self) -> usize {
        self.label_chars() + self.text.chars().count()
    }
}

/// Assemble `results` into a single block of at most `max_chars` chars.
///
/// Empty results, or a zero budget, yield `""`.
pub fn assemble_context(results: &[SearchResult], max_chars: usize, params: &ContextParams) -> String {
    if results.is_empty() || max_chars == 0 {
        return String::new();
    }

    let mut sections: Vec<Section<'_>> = results
        .iter()
        .map(|r| Section {
            source: &r.source,
            text: Cow::Borrowed(r.content.as_str()),
        })
        .collect();

    if rendered_chars(&sections) as f64 > max_chars as f64 * f64::from(params.condense_ratio) {
        sections = condense(sections, params.preview_chars);
    }

    let mut out = String::new();
    let mut used = 0usize;

    for section in &sections {
        let sep = if out.is_empty() { 0 } else { SECTION_SEPARATOR.len() };

        if used + sep + section.chars() <= max_chars {
            push_section(&mut out, sep, section.source, &section.text, "");
            used += sep + section.chars();
            continue;
        }

        let remaining = max_chars.saturating_sub(used + sep);
        let min_room = section.label_chars() + 1 + ELLIPSIS.len();
        if remaining >= min_room {
            let keep = remaining - section.label_chars() - ELLIPSIS.len();
            let cut = take_chars(&section.text, keep);
            let cut = cut.trim_end();
            if !cut.is_empty() {
                push_section(&mut out, sep, section.source, cut, ELLIPSIS);
            }
        }
        break;
    }

    out
}

fn push_section(out: &mut String, sep: usize, source: &str, text: &str, suffix: &str) {
    if sep > 0 {
        out.push_str(SECTION_SEPARATOR);
    }
    out.push_str(source);
    out.push_str(LABEL_SEPARATOR);
    out.push_str(text);
    out.push_str(suffix);
}

fn rendered_chars(sections: &[Section<'_>]) -> usize {
    let body: usize = sections.iter().map(Section::chars).sum();
    body + SECTION_SEPARATOR.len() * sections.len().saturating_sub(1)
}

/// Keep the first section per source and shorten each to a preview.
fn condense(sections: Vec<Section<'_>>, preview_chars: usize) -> Vec<Section<'_>> {
    let mut seen = HashSet::new();
    sections
        .into_iter()
        .filter(|s| seen.insert(s.source))
        .map(|s| Section {
            source: s.source,
            text: preview(s.text, preview_chars),
        })
        .collect()
}

/// Shorten `text` to at most `limit` chars, marker included.
fn preview(text: Cow<'_, str>, limit: usize) -> Cow<'_, str> {
    if text.chars().count() <= limit {
        return text;
    }
    let keep = limit.saturating_sub(ELLIPSIS.len());
    let mut cut = take_chars(&text, keep).trim_end().to_string();
    cut.push_str(ELLIPSIS);
    Cow::Owned(cut)
}

fn take_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}
