//! Two-phase streaming/finished render pipeline
//!
//! Streaming text is re-rendered from scratch on every update; there is no
//! incremental parse. Memoizing per-block output by content checksum is what
//! keeps that affordable and, more importantly, what guarantees that a block
//! processor with side effects (starting a completion call, issuing a draw
//! command) runs at most once for stabilized content.
//!
//! Per `(message id, block ordinal)` a block moves through three states:
//! unseen, streaming (non-finished cache entry, replaced when the checksum
//! changes), finished (immutable entry returned verbatim forever). A block is
//! rendered in finished mode exactly when the surrounding message is no
//! longer streaming.

use crate::markup::{escape_html, replace_element_by_id};
use crate::registry::{ProcessorOutput, ProcessorRegistry};
use dashmap::DashMap;
use futures::future::BoxFuture;
use pulldown_cmark::{html, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;
use weft_reference::{Reference, ReferenceKind, ReferenceStore};
use weft_types::{Message, Who};

/// One cached block result
#[derive(Debug, Clone)]
struct CacheEntry {
    checksum: String,
    markup: String,
    finished: bool,
}

/// Resolved results of deferred and follow-up block tasks
///
/// Tasks publish replacement markup keyed by node id; every render splices
/// the patches into the assembled message markup after cache lookup, so
/// late-arriving results flow through even for finished blocks.
#[derive(Debug, Default)]
pub struct PatchBoard {
    entries: DashMap<String, String>,
}

impl PatchBoard {
    /// Publish replacement markup for a node
    pub fn set(&self, node_id: impl Into<String>, markup: String) {
        self.entries.insert(node_id.into(), markup);
    }

    /// Splice every applicable patch into `markup`
    #[must_use]
    fn apply(&self, markup: &str) -> String {
        let mut out = markup.to_string();
        for entry in &self.entries {
            if let Some(patched) = replace_element_by_id(&out, entry.key(), entry.value()) {
                out = patched;
            }
        }
        out
    }
}

/// A rendered message ready for chunk reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    /// Message id
    pub id: String,
    /// Full markup of the message
    pub markup: String,
    /// Message author
    pub who: Who,
}

/// Context handed to block processors for one block invocation
pub struct RenderContext<'a> {
    message: &'a Message,
    is_streaming: bool,
    block_index: usize,
    node_key: String,
    pipeline: &'a RenderPipeline,
}

impl RenderContext<'_> {
    /// Message owning the block
    #[inline]
    #[must_use]
    pub fn message(&self) -> &Message {
        self.message
    }

    /// Whether the surrounding message may still grow
    #[inline]
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.is_streaming
    }

    /// Ordinal of this fenced block within the message
    #[inline]
    #[must_use]
    pub fn block_index(&self) -> usize {
        self.block_index
    }

    /// Deterministic node key for this block, usable as a markup element id
    #[inline]
    #[must_use]
    pub fn node_key(&self) -> &str {
        &self.node_key
    }

    /// Reference store shared with artifact producers
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<ReferenceStore> {
        &self.pipeline.store
    }

    /// Patch board for publishing late block results
    #[inline]
    #[must_use]
    pub fn patches(&self) -> Arc<PatchBoard> {
        Arc::clone(&self.pipeline.patches)
    }

    /// Render embedded markdown through the full pipeline
    ///
    /// The text gets a wrapper message whose id derives from the content, so
    /// nested cache entries never collide with the parent message's blocks.
    #[must_use]
    pub fn render_nested(&self, text: &str, is_streaming: bool) -> String {
        let digest = blake3::hash(text.as_bytes());
        let wrapper = Message {
            id: format!("embedded-{}-{}", self.message.id, &digest.to_hex()[..12]),
            text: text.to_string(),
            who: self.message.who,
            hidden: self.message.hidden,
            is_streaming,
            isolated: self.message.isolated,
        };
        self.pipeline.render(&wrapper, is_streaming)
    }
}

/// The streaming render pipeline
///
/// One pipeline instance owns one block cache, one patch board, and one
/// message cache; constructing a fresh instance gives full test isolation.
pub struct RenderPipeline {
    registry: Arc<ProcessorRegistry>,
    store: Arc<ReferenceStore>,
    cache: DashMap<String, CacheEntry>,
    patches: Arc<PatchBoard>,
    message_cache: DashMap<String, RenderedMessage>,
}

impl RenderPipeline {
    /// Create a pipeline over a frozen registry and a shared store
    #[must_use]
    pub fn new(registry: Arc<ProcessorRegistry>, store: Arc<ReferenceStore>) -> Self {
        Self {
            registry,
            store,
            cache: DashMap::new(),
            patches: Arc::new(PatchBoard::default()),
            message_cache: DashMap::new(),
        }
    }

    /// Render one message into markup at one point in time
    ///
    /// Callable repeatedly and idempotently: for a block whose content has
    /// not changed, the registered processor is not re-invoked.
    #[must_use]
    pub fn render(&self, message: &Message, is_streaming: bool) -> String {
        let parser = Parser::new_ext(&message.text, Options::ENABLE_TABLES);
        let mut events: Vec<Event<'_>> = Vec::new();
        let mut block_index = 0usize;

        let mut iter = parser.into_iter();
        while let Some(event) = iter.next() {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let mut body = String::new();
                    for inner in iter.by_ref() {
                        match inner {
                            Event::End(TagEnd::CodeBlock) => break,
                            Event::Text(text) => body.push_str(&text),
                            _ => {}
                        }
                    }

                    match kind {
                        CodeBlockKind::Fenced(info) => {
                            let tag = info.split_whitespace().next().unwrap_or("").to_string();
                            let markup = self.render_fence(
                                &tag,
                                body.trim(),
                                message,
                                is_streaming,
                                block_index,
                            );
                            block_index += 1;
                            events.push(Event::Html(format!("{markup}\n").into()));
                        }
                        CodeBlockKind::Indented => {
                            events.push(Event::Html(
                                format!(
                                    "<pre class=\"inline-code\">{}</pre>\n",
                                    escape_html(&body)
                                )
                                .into(),
                            ));
                        }
                    }
                }
                Event::Code(code) => {
                    events.push(Event::InlineHtml(
                        format!("<span class=\"pre-text\">{}</span>", escape_html(code.trim()))
                            .into(),
                    ));
                }
                Event::Start(Tag::Image {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) => {
                    let resolved = self.resolve_image_destination(&dest_url);
                    events.push(Event::Start(Tag::Image {
                        link_type,
                        dest_url: resolved.into(),
                        title,
                        id,
                    }));
                }
                other => events.push(other),
            }
        }

        let mut out = String::new();
        html::push_html(&mut out, events.into_iter());
        self.patches.apply(&out)
    }

    /// Render the visible slice of a conversation, caching settled messages
    ///
    /// Hidden messages are skipped; suggestion messages render only while
    /// they are the last message. Every message but the final one is cached
    /// by id, since only the final message can still change.
    #[must_use]
    pub fn render_messages(&self, messages: &[Message]) -> Vec<RenderedMessage> {
        let last_index = messages.len().saturating_sub(1);
        let considered: Vec<&Message> = messages
            .iter()
            .enumerate()
            .filter(|(_, m)| !m.hidden)
            .filter(|(index, m)| m.who != Who::Suggestion || *index == last_index)
            .map(|(_, m)| m)
            .collect();

        let total = considered.len();
        considered
            .into_iter()
            .enumerate()
            .map(|(position, message)| {
                let use_cache = position + 1 != total;
                if use_cache {
                    if let Some(cached) = self.message_cache.get(&message.id) {
                        // Deferred and follow-up results may resolve after a
                        // message was cached; splice them in on every hit.
                        let mut rendered = cached.clone();
                        rendered.markup = self.patches.apply(&rendered.markup);
                        return rendered;
                    }
                }

                let rendered = RenderedMessage {
                    id: message.id.clone(),
                    markup: self.render(message, message.is_streaming),
                    who: message.who,
                };

                if use_cache {
                    self.message_cache
                        .insert(message.id.clone(), rendered.clone());
                }
                rendered
            })
            .collect()
    }

    /// Render one fenced block under the two-phase cache discipline
    fn render_fence(
        &self,
        tag: &str,
        body: &str,
        message: &Message,
        message_streaming: bool,
        block_index: usize,
    ) -> String {
        let key = format!("key-{}-{}", message.id, block_index);

        if let Some(entry) = self.cache.get(&key) {
            if entry.finished {
                return entry.markup.clone();
            }
        }

        let checksum = content_checksum(body);

        if !message_streaming {
            // The message is complete: render once in finished mode and seal
            // the entry. Finished entries are returned verbatim forever.
            let markup = self.process_block(tag, body, message, false, block_index, &key);
            debug!(key = %key, tag = %tag, "block finalized");
            self.cache.insert(
                key,
                CacheEntry {
                    checksum,
                    markup: markup.clone(),
                    finished: true,
                },
            );
            return markup;
        }

        if let Some(entry) = self.cache.get(&key) {
            if entry.checksum == checksum {
                // Unchanged content mid-stream: no processor re-invocation.
                return entry.markup.clone();
            }
        }

        let markup = self.process_block(tag, body, message, true, block_index, &key);
        self.cache.insert(
            key,
            CacheEntry {
                checksum,
                markup: markup.clone(),
                finished: false,
            },
        );
        markup
    }

    /// Dispatch one block to its processor, or fall back to code rendering
    fn process_block(
        &self,
        tag: &str,
        body: &str,
        message: &Message,
        is_streaming: bool,
        block_index: usize,
        node_key: &str,
    ) -> String {
        let Ok(processor) = self.registry.get(tag) else {
            if tag.is_empty() {
                return format!("<pre class=\"inline-code\">{}</pre>", escape_html(body));
            }
            return format!(
                "<pre class=\"inline-code {}\">{}</pre>",
                escape_html(tag),
                escape_html(body)
            );
        };
        let processor = Arc::clone(processor);

        let ctx = RenderContext {
            message,
            is_streaming,
            block_index,
            node_key: node_key.to_string(),
            pipeline: self,
        };

        match processor.process(tag, body, &ctx) {
            Ok(ProcessorOutput::Immediate(markup)) => markup,
            Ok(ProcessorOutput::WithFollowup { markup, followup }) => {
                self.spawn(followup);
                markup
            }
            Ok(ProcessorOutput::Deferred {
                node_id,
                placeholder,
                task,
            }) => {
                let patches = Arc::clone(&self.patches);
                self.spawn(Box::pin(async move {
                    let resolved = task.await;
                    patches.set(node_id, resolved);
                }));
                placeholder
            }
            Err(err) => {
                warn!(tag = %tag, error = %err, "block processor failed; rendering inline error");
                crate::markup::inline_error(&err.to_string())
            }
        }
    }

    /// Schedule a block task on the ambient runtime
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(task);
            }
            Err(_) => warn!("no async runtime available; dropping scheduled block task"),
        }
    }

    /// Resolve inline image destinations that are image references
    fn resolve_image_destination(&self, dest_url: &str) -> String {
        match Reference::from_str(dest_url) {
            Ok(reference) if reference.kind() == ReferenceKind::Image => {
                self.store.image(&reference).unwrap_or_default()
            }
            _ => dest_url.to_string(),
        }
    }
}

/// Deterministic content checksum: length plus a fast hash
///
/// Blocks with empty content get a random key so unrelated empty blocks never
/// collide (and an empty block is always re-rendered while streaming).
fn content_checksum(body: &str) -> String {
    if body.is_empty() {
        return Uuid::new_v4().to_string();
    }
    let digest = blake3::hash(body.as_bytes());
    format!("{}-{}", body.len(), &digest.to_hex()[..16])
}
