//! Weft chunk reconciliation
//!
//! A message's rendered markup is regenerated from scratch on every streaming
//! update. The presentation layer, however, needs stable identity for each
//! top-level node so that already-mounted interactive widgets survive the
//! re-render. [`reconcile`] assigns that identity: it is a pure function from
//! (previous chunk list, new full markup) to a new chunk list in which every
//! index that is byte-identical to last time keeps its chunk untouched, the
//! first divergent index keeps its id but adopts the new content, and indices
//! beyond the old list get freshly minted ids.
//!
//! The upstream producer only ever appends to a message, so in practice at
//! most one existing index changes per call (the last one). A retroactive
//! edit earlier in the markup is tolerated: everything from the divergence on
//! is treated as new tail, at the cost of discarding identity for those nodes.

pub mod split;

pub use split::split_top_level;

use tracing::warn;
use uuid::Uuid;

/// One top-level rendered node of a message, with stable identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Stable identity, reused across re-renders while the index exists
    pub id: String,
    /// Serialized markup of the node
    pub markup: String,
}

impl Chunk {
    /// Chunk with a freshly minted id
    #[must_use]
    fn minted(markup: String) -> Self {
        Self {
            id: format!("chunk-{}", Uuid::new_v4()),
            markup,
        }
    }
}

/// Reconcile a previous chunk list against newly rendered markup
///
/// Identity rules:
/// - the byte-identical prefix keeps its chunks (same id, same content);
/// - at the first divergent index, while the old list still has that index,
///   the old id is reused with the new content;
/// - indices beyond the old list's length get new unique ids.
///
/// The chunk count never decreases for a monotonically growing message.
#[must_use]
pub fn reconcile(previous: &[Chunk], new_markup: &str) -> Vec<Chunk> {
    let nodes = split_top_level(new_markup);
    let mut chunks = Vec::with_capacity(nodes.len());

    let mut index = 0;
    while index < previous.len() && index < nodes.len() {
        if previous[index].markup == nodes[index] {
            chunks.push(previous[index].clone());
            index += 1;
        } else {
            break;
        }
    }

    // Append-only input diverges at the old tail only. Anything earlier means
    // upstream rewrote history; identity after this point is discarded.
    if index + 1 < previous.len() {
        warn!(
            divergence = index,
            previous = previous.len(),
            "markup diverged before the last chunk; treating remainder as new tail"
        );
    }

    for (offset, node) in nodes.into_iter().enumerate().skip(index) {
        if offset < previous.len() {
            // Same index as an existing chunk: keep its identity, adopt the
            // new content so the mounted node is updated in place.
            chunks.push(Chunk {
                id: previous[offset].id.clone(),
                markup: node,
            });
        } else {
            chunks.push(Chunk::minted(node));
        }
    }

    chunks
}
