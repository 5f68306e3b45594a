//! Markup helpers shared by the pipeline and processors

use pulldown_cmark::{html, Options, Parser};

/// Escape text for safe inclusion in markup
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Transient "generating" indicator rendered while an artifact is produced
#[must_use]
pub fn thinking_block(message: &str) -> String {
    format!(
        "<div class=\"thinking-block\"><span class=\"thinking-message\"><em>{}</em></span></div>",
        escape_html(message)
    )
}

/// Inline, non-fatal error text rendered in place of an artifact
#[must_use]
pub fn inline_error(message: &str) -> String {
    format!(
        "<p class=\"with-padding-top\">{}</p>",
        escape_html(message)
    )
}

/// Render plain markdown without fence-block processing
///
/// Used by follow-up tasks that only ever receive short prose and cannot
/// re-enter the pipeline.
#[must_use]
pub fn render_plain_markdown(text: &str) -> String {
    let parser = Parser::new_ext(text, Options::ENABLE_TABLES);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// Replace the element carrying `id="{node_id}"` wholesale with `replacement`
///
/// Returns `None` when no element with that id exists in `markup`. The scan
/// assumes machine-generated, balanced markup (the pipeline's own output).
#[must_use]
pub fn replace_element_by_id(markup: &str, node_id: &str, replacement: &str) -> Option<String> {
    let needle = format!("id=\"{node_id}\"");
    let attr_pos = markup.find(&needle)?;
    let start = markup[..attr_pos].rfind('<')?;

    let end = element_end(markup, start)?;

    let mut patched = String::with_capacity(markup.len() + replacement.len());
    patched.push_str(&markup[..start]);
    patched.push_str(replacement);
    patched.push_str(&markup[end..]);
    Some(patched)
}

/// Byte offset just past the end of the element starting at `start`
fn element_end(markup: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut pos = start;

    while pos < markup.len() {
        let rest = &markup[pos..];
        if !rest.starts_with('<') {
            pos += rest.find('<')?;
            continue;
        }

        let closing = rest.starts_with("</");
        let tag_end = find_tag_end(rest)?;
        let self_closing = rest[..tag_end].ends_with("/>");

        if closing {
            depth = depth.saturating_sub(1);
        } else if !self_closing {
            depth += 1;
        }

        pos += tag_end;
        if depth == 0 {
            return Some(pos);
        }
    }

    None
}

/// Length of the tag starting at the beginning of `rest`, quote-aware
fn find_tag_end(rest: &str) -> Option<usize> {
    let mut in_quote: Option<char> = None;
    for (offset, ch) in rest.char_indices() {
        match (in_quote, ch) {
            (Some(quote), _) if ch == quote => in_quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => in_quote = Some(ch),
            (None, '>') => return Some(offset + 1),
            (None, _) => {}
        }
    }
    None
}
