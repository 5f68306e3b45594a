//! Marker-aware relay of the primary token stream
//!
//! The conversational agent is instructed to echo an overview handle inside
//! a three-line fenced marker. [`relay_stream`] forwards accumulated text to
//! the caller while watching for that marker; once a complete marker is the
//! whole response, it stops consuming tokens and instead polls the overview
//! entry, forwarding its text until the entry finishes.

use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use tracing::debug;

use weft_reference::{Reference, ReferenceKind, ReferenceStore};

/// Fence opener the agent is instructed to emit around overview handles.
const OVERVIEW_FENCE: &str = "```embedded-markdown";

/// Parse `text` as a complete overview marker.
///
/// A marker is exactly three lines: the opening fence, a store-resolvable
/// overview handle, and the closing fence. Anything else (extra prose,
/// unknown handles, truncated fences) is treated as ordinary response text.
#[must_use]
pub fn embedded_overview_reference(text: &str, store: &ReferenceStore) -> Option<Reference> {
    let trimmed = text.trim();
    if !trimmed.starts_with(OVERVIEW_FENCE) || !trimmed.ends_with("```") {
        return None;
    }
    let lines: Vec<&str> = trimmed.lines().collect();
    if lines.len() != 3 {
        return None;
    }
    let reference: Reference = lines[1].trim().parse().ok()?;
    if reference.kind() != ReferenceKind::Overview || store.overview(&reference).is_none() {
        return None;
    }
    Some(reference)
}

/// Hide a marker that is still arriving.
///
/// While the agent is mid-way through emitting the reserved fence, the
/// accumulated response is a half-open marker; showing it would flash broken
/// markup at the reader. Only the reserved fence is suppressed: a response
/// opening with an ordinary code fence streams through unchanged.
#[must_use]
pub fn suppress_partial_marker(text: &str) -> &str {
    let head = text.trim_start();
    if head.starts_with(OVERVIEW_FENCE) || OVERVIEW_FENCE.starts_with(head) {
        ""
    } else {
        text
    }
}

/// Relay `tokens`, switching to overview polling when a marker completes.
///
/// `on_update` receives the full text to display after each change: the
/// accumulated raw response while relaying, then the overview entry text
/// while polling. It is always called at least once more after the entry
/// finishes, so the final state is never missed.
pub async fn relay_stream<S, F>(
    mut tokens: S,
    store: Arc<ReferenceStore>,
    mut on_update: F,
    poll_interval: Duration,
) where
    S: Stream<Item = String> + Unpin,
    F: FnMut(&str),
{
    let mut accumulated = String::new();
    let mut marker = None;

    while let Some(fragment) = tokens.next().await {
        accumulated.push_str(&fragment);
        if let Some(reference) = embedded_overview_reference(&accumulated, &store) {
            marker = Some(reference);
            break;
        }
        on_update(suppress_partial_marker(&accumulated));
    }

    let Some(reference) = marker else {
        // Stream ended without a marker; settle on the raw response.
        on_update(&accumulated);
        return;
    };
    debug!(reference = reference.as_str(), "relaying overview entry");

    let mut shown = String::new();
    loop {
        // A missing entry means the store was cleared mid-poll; stop rather
        // than spin forever.
        let Some(entry) = store.overview(&reference) else {
            debug!(reference = reference.as_str(), "overview entry vanished");
            return;
        };
        if entry.text != shown {
            shown = entry.text;
            on_update(&shown);
        }
        if entry.finished {
            on_update(&shown);
            return;
        }
        tokio::time::sleep(poll_interval).await;
    }
}
