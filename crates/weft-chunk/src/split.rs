//! Top-level markup splitting
//!
//! Parses a rendered markup string into its ordered sequence of top-level
//! nodes, each serialized back to a string for byte comparison. The input is
//! machine-generated (markdown renderer output plus pipeline-produced
//! wrappers), so the scanner only needs to be robust to that shape: nested
//! elements, void and self-closing tags, quoted attribute values, comments,
//! and bare text runs between elements.

/// Elements that never have a closing tag
const VOID_ELEMENTS: [&str; 13] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name.to_ascii_lowercase().as_str())
}

/// Split markup into serialized top-level nodes
///
/// Whitespace-only runs between elements are dropped; they carry no content
/// and would otherwise produce meaningless chunks on every render. Unbalanced
/// trailing markup (possible mid-stream) is returned as a final node.
#[must_use]
pub fn split_top_level(markup: &str) -> Vec<String> {
    let bytes = markup.as_bytes();
    let mut nodes = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] == b'<' {
            let start = pos;
            let mut depth = 0usize;

            loop {
                match scan_tag(markup, pos) {
                    Some(tag) => {
                        match tag.shape {
                            TagShape::Opening => depth += 1,
                            TagShape::Closing => depth = depth.saturating_sub(1),
                            TagShape::Flat => {}
                        }
                        pos = tag.end;
                    }
                    None => {
                        // Truncated tag at end of input.
                        pos = bytes.len();
                        break;
                    }
                }

                if depth == 0 {
                    break;
                }

                // Consume content up to the next tag boundary.
                match markup[pos..].find('<') {
                    Some(offset) => pos += offset,
                    None => {
                        pos = bytes.len();
                        break;
                    }
                }
            }

            nodes.push(markup[start..pos].to_string());
        } else {
            // Text run up to the next element.
            let end = markup[pos..]
                .find('<')
                .map_or(bytes.len(), |offset| pos + offset);
            let run = &markup[pos..end];
            if !run.trim().is_empty() {
                nodes.push(run.to_string());
            }
            pos = end;
        }
    }

    nodes
}

enum TagShape {
    /// Opens an element that expects a closing tag
    Opening,
    /// Closes an element
    Closing,
    /// Leaves nesting depth unchanged: void, self-closing, comment, doctype
    Flat,
}

struct ScannedTag {
    shape: TagShape,
    /// Byte offset just past the closing `>`
    end: usize,
}

/// Scan one tag starting at `pos` (which must point at `<`)
fn scan_tag(markup: &str, pos: usize) -> Option<ScannedTag> {
    let rest = &markup[pos..];

    if let Some(comment) = rest.strip_prefix("<!--") {
        let close = comment.find("-->")?;
        return Some(ScannedTag {
            shape: TagShape::Flat,
            end: pos + 4 + close + 3,
        });
    }

    if rest.starts_with("<!") {
        let close = rest.find('>')?;
        return Some(ScannedTag {
            shape: TagShape::Flat,
            end: pos + close + 1,
        });
    }

    let closing = rest.starts_with("</");
    let name_start = if closing { 2 } else { 1 };
    let name: String = rest[name_start..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();

    // Find the closing '>', skipping quoted attribute values.
    let mut in_quote: Option<char> = None;
    let mut self_closing = false;
    for (offset, ch) in rest.char_indices().skip(name_start) {
        match (in_quote, ch) {
            (Some(quote), _) if ch == quote => in_quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => in_quote = Some(ch),
            (None, '/') => self_closing = true,
            (None, '>') => {
                let shape = if closing {
                    TagShape::Closing
                } else if self_closing || is_void_element(&name) {
                    TagShape::Flat
                } else {
                    TagShape::Opening
                };
                return Some(ScannedTag {
                    shape,
                    end: pos + offset + 1,
                });
            }
            (None, _) => self_closing = false,
        }
    }

    None
}
