//! In-memory reference store
//!
//! One concurrent map per payload category. Each key is only ever written by
//! the task that issued it (overview entries by the bridge that created them),
//! so readers always observe either the previous or the new value of an entry.

use crate::reference::{Reference, ReferenceKind};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Incrementally produced report entry
///
/// Mutated in place (replace-by-key) by the background computation that owns
/// it. `finished` transitions false to true exactly once and never reverts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverviewEntry {
    /// Report text produced so far (monotonically replaced, not appended)
    pub text: String,
    /// Whether production has completed
    pub finished: bool,
}

impl OverviewEntry {
    /// Entry with in-progress text
    #[inline]
    #[must_use]
    pub fn in_progress(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            finished: false,
        }
    }

    /// Terminal entry
    #[inline]
    #[must_use]
    pub fn finished(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            finished: true,
        }
    }
}

/// In-memory keyed store of out-of-band payloads
///
/// `store_*` always succeeds and returns a fresh, never-before-issued handle.
/// Getters return `None` for unknown handles and for handles of the wrong
/// category; callers of asynchronously produced categories treat `None` as
/// "still being produced". Entries live until [`ReferenceStore::clear`].
#[derive(Debug, Default)]
pub struct ReferenceStore {
    id_lists: DashMap<Reference, Vec<String>>,
    images: DashMap<Reference, String>,
    tables: DashMap<Reference, String>,
    heat_maps: DashMap<Reference, String>,
    overviews: DashMap<Reference, OverviewEntry>,
}

impl ReferenceStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object-id list
    pub fn store_id_list(&self, ids: Vec<String>) -> Reference {
        let reference = Reference::generate(ReferenceKind::IdList);
        self.id_lists.insert(reference.clone(), ids);
        reference
    }

    /// Resolve an object-id list
    #[must_use]
    pub fn id_list(&self, reference: &Reference) -> Option<Vec<String>> {
        self.id_lists.get(reference).map(|entry| entry.clone())
    }

    /// Store a base64 image payload
    pub fn store_image(&self, base64_image: String) -> Reference {
        let reference = Reference::generate(ReferenceKind::Image);
        self.images.insert(reference.clone(), base64_image);
        reference
    }

    /// Resolve an image payload
    #[must_use]
    pub fn image(&self, reference: &Reference) -> Option<String> {
        self.images.get(reference).map(|entry| entry.clone())
    }

    /// Store markdown table text
    pub fn store_table(&self, table_markdown: String) -> Reference {
        let reference = Reference::generate(ReferenceKind::Table);
        self.tables.insert(reference.clone(), table_markdown);
        reference
    }

    /// Resolve markdown table text
    #[must_use]
    pub fn table(&self, reference: &Reference) -> Option<String> {
        self.tables.get(reference).map(|entry| entry.clone())
    }

    /// Store serialized heat-map values
    pub fn store_heat_map(&self, values: String) -> Reference {
        let reference = Reference::generate(ReferenceKind::HeatMap);
        self.heat_maps.insert(reference.clone(), values);
        reference
    }

    /// Resolve serialized heat-map values
    #[must_use]
    pub fn heat_map(&self, reference: &Reference) -> Option<String> {
        self.heat_maps.get(reference).map(|entry| entry.clone())
    }

    /// Store an overview entry, returning its handle
    pub fn store_overview(&self, entry: OverviewEntry) -> Reference {
        let reference = Reference::generate(ReferenceKind::Overview);
        self.overviews.insert(reference.clone(), entry);
        reference
    }

    /// Resolve an overview entry
    #[must_use]
    pub fn overview(&self, reference: &Reference) -> Option<OverviewEntry> {
        self.overviews.get(reference).map(|entry| entry.clone())
    }

    /// Replace an overview entry atomically
    ///
    /// Only overview handles are mutable after creation; an update through a
    /// handle of any other category is ignored.
    pub fn update_overview(&self, reference: &Reference, entry: OverviewEntry) {
        if reference.kind() != ReferenceKind::Overview {
            warn!(reference = %reference, "update_overview called with non-overview handle");
            return;
        }
        self.overviews.insert(reference.clone(), entry);
    }

    /// Drop every stored entry across all categories
    pub fn clear(&self) {
        self.id_lists.clear();
        self.images.clear();
        self.tables.clear();
        self.heat_maps.clear();
        self.overviews.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trip_each_category() {
        let store = ReferenceStore::new();

        let ids = store.store_id_list(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(
            store.id_list(&ids),
            Some(vec!["a".to_string(), "b".to_string()])
        );

        let image = store.store_image("ZGF0YQ==".to_string());
        assert_eq!(store.image(&image), Some("ZGF0YQ==".to_string()));

        let table = store.store_table("| a |".to_string());
        assert_eq!(store.table(&table), Some("| a |".to_string()));

        let heat = store.store_heat_map("{}".to_string());
        assert_eq!(store.heat_map(&heat), Some("{}".to_string()));

        let overview = store.store_overview(OverviewEntry::in_progress("partial"));
        assert_eq!(
            store.overview(&overview),
            Some(OverviewEntry::in_progress("partial"))
        );
    }

    #[test]
    fn fabricated_handle_is_not_found() {
        let store = ReferenceStore::new();
        let fabricated: Reference = "embedded-table-never-issued".parse().unwrap();
        assert!(store.table(&fabricated).is_none());
    }

    #[test]
    fn wrong_category_handle_is_not_found() {
        let store = ReferenceStore::new();
        let image = store.store_image("ZGF0YQ==".to_string());
        // An image handle never resolves in the table map.
        assert!(store.table(&image).is_none());
    }

    #[test]
    fn overview_update_replaces_entry() {
        let store = ReferenceStore::new();
        let reference = store.store_overview(OverviewEntry::default());

        store.update_overview(&reference, OverviewEntry::in_progress("first"));
        assert_eq!(store.overview(&reference).unwrap().text, "first");

        store.update_overview(&reference, OverviewEntry::finished("final"));
        let entry = store.overview(&reference).unwrap();
        assert_eq!(entry.text, "final");
        assert!(entry.finished);
    }

    #[test]
    fn overview_update_ignores_other_categories() {
        let store = ReferenceStore::new();
        let table = store.store_table("| a |".to_string());
        store.update_overview(&table, OverviewEntry::finished("bogus"));
        assert!(store.overview(&table).is_none());
        assert_eq!(store.table(&table), Some("| a |".to_string()));
        assert_eq!(table.kind(), ReferenceKind::Table);
    }

    #[test]
    fn clear_empties_every_category() {
        let store = ReferenceStore::new();
        let ids = store.store_id_list(vec!["a".to_string()]);
        let overview = store.store_overview(OverviewEntry::default());

        store.clear();

        assert!(store.id_list(&ids).is_none());
        assert!(store.overview(&overview).is_none());
    }
}
