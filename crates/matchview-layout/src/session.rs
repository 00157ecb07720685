//! Review session: view state plus memoized layouts.
//!
//! A session owns one snapshot and configuration. Focus, expansion and
//! filter changes are plain method calls; [`ReviewSession::layout`] returns
//! a layout for the current state, reusing a cached one when the same state
//! was laid out before.

use std::num::NonZeroUsize;

use lru::LruCache;
use matchview_model::{FocusState, MatchSnapshot, Side};
use sha2::{Digest, Sha256};

use crate::config::LayoutConfig;
use crate::filter::ViewFilter;
use crate::hierarchy::toggle_node;
use crate::view::{MatrixLayout, ViewState, build_matrix_layout};

/// Cache counters since the session was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

pub struct ReviewSession {
    snapshot: MatchSnapshot,
    config: LayoutConfig,
    state: ViewState,
    /// Digest of the serialized snapshot, computed once.
    snapshot_digest: Option<Vec<u8>>,
    cache: LruCache<String, MatrixLayout>,
    hits: u64,
    misses: u64,
}

impl ReviewSession {
    pub fn new(snapshot: MatchSnapshot, config: LayoutConfig) -> Self {
        let capacity =
            NonZeroUsize::new(config.view.cache_capacity).unwrap_or(NonZeroUsize::MIN);
        let snapshot_digest = match serde_json::to_vec(&snapshot) {
            Ok(bytes) => Some(Sha256::digest(&bytes).to_vec()),
            Err(error) => {
                tracing::warn!(%error, "Snapshot is not serializable; layouts will not be cached");
                None
            }
        };
        Self {
            snapshot,
            config,
            state: ViewState::default(),
            snapshot_digest,
            cache: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    #[must_use]
    pub fn with_state(mut self, state: ViewState) -> Self {
        self.state = state;
        self
    }

    pub fn snapshot(&self) -> &MatchSnapshot {
        &self.snapshot
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn focus(&self) -> &FocusState {
        &self.state.focus
    }

    pub fn set_focus(&mut self, source_column: &str, target_column: &str) {
        self.state.focus = FocusState::on(source_column, target_column);
    }

    /// Focuses the cell, or clears the focus if it is already focused.
    pub fn toggle_focus(&mut self, source_column: &str, target_column: &str) {
        self.state.focus = self.state.focus.clone().toggle(source_column, target_column);
    }

    pub fn clear_focus(&mut self) {
        self.state.focus = FocusState::none();
    }

    /// Flips the expansion of the node `key` resolves to on `side`.
    ///
    /// Keys are resolved against the tree of the current layout, so the
    /// layout is computed (or fetched) first.
    pub fn toggle_node(&mut self, side: Side, key: &str) {
        let layout = self.layout();
        let index = &layout.axis(side).tree.index;
        self.state.expanded = toggle_node(&self.state.expanded, index, key);
        tracing::debug!(%side, key, id = index.resolve(key), "Toggled ontology node");
    }

    pub fn set_filter(&mut self, filter: ViewFilter) {
        self.state.filter = filter;
    }

    /// Layout for the current state.
    pub fn layout(&mut self) -> MatrixLayout {
        let Some(key) = self.cache_key() else {
            self.misses += 1;
            return build_matrix_layout(&self.snapshot, &self.state, &self.config);
        };

        if let Some(layout) = self.cache.get(&key) {
            self.hits += 1;
            tracing::debug!(key = %&key[..12], "Layout cache hit");
            return layout.clone();
        }

        self.misses += 1;
        tracing::debug!(key = %&key[..12], "Layout cache miss");
        let layout = build_matrix_layout(&self.snapshot, &self.state, &self.config);
        self.cache.put(key, layout.clone());
        layout
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.cache.len(),
        }
    }

    /// SHA-256 over the snapshot digest, the view state and the config.
    fn cache_key(&self) -> Option<String> {
        let snapshot_digest = self.snapshot_digest.as_ref()?;
        let state = serde_json::to_vec(&self.state).ok()?;
        let config = serde_json::to_vec(&self.config).ok()?;

        let mut hasher = Sha256::new();
        hasher.update(snapshot_digest);
        hasher.update(&state);
        hasher.update(&config);
        Some(hex::encode(hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchview_model::{CandidateStatus, OntologyEntry, ScoredCandidate};

    fn snapshot() -> MatchSnapshot {
        MatchSnapshot {
            candidates: vec![
                ScoredCandidate::new("gender", "sex", 0.9, "A"),
                ScoredCandidate::new("age", "age_at_diagnosis", 0.8, "A"),
                ScoredCandidate::new("age", "sex", 0.1, "A"),
            ],
            target_ontology: vec![
                OntologyEntry::new("sex", "demographic", "clinical"),
                OntologyEntry::new("age_at_diagnosis", "diagnosis", "clinical"),
            ],
            ..MatchSnapshot::default()
        }
    }

    #[test]
    fn repeated_layouts_hit_the_cache() {
        let mut session = ReviewSession::new(snapshot(), LayoutConfig::default());
        let first = session.layout();
        let second = session.layout();
        assert_eq!(first, second);
        assert_eq!(
            session.cache_stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                entries: 1
            }
        );
    }

    #[test]
    fn cached_layout_equals_fresh_computation() {
        let mut session = ReviewSession::new(snapshot(), LayoutConfig::default());
        session.set_focus("age", "sex");
        session.layout();
        let cached = session.layout();
        let fresh = build_matrix_layout(session.snapshot(), session.state(), session.config());
        assert_eq!(cached, fresh);
    }

    #[test]
    fn state_changes_miss_the_cache() {
        let mut session = ReviewSession::new(snapshot(), LayoutConfig::default());
        let unfocused = session.layout();
        session.set_focus("gender", "sex");
        let focused = session.layout();
        assert_ne!(unfocused, focused);
        session.clear_focus();
        assert_eq!(session.layout(), unfocused);
        assert_eq!(session.cache_stats().hits, 1);
    }

    #[test]
    fn toggle_focus_clears_the_same_cell() {
        let mut session = ReviewSession::new(snapshot(), LayoutConfig::default());
        session.toggle_focus("gender", "sex");
        assert!(session.focus().is_focused());
        session.toggle_focus("gender", "sex");
        assert!(!session.focus().is_focused());
    }

    #[test]
    fn toggle_node_by_column_name() {
        let mut session = ReviewSession::new(snapshot(), LayoutConfig::default());
        session.toggle_node(Side::Target, "sex");
        assert!(session.state().expanded.contains("target:clinical>demographic>sex"));
        let layout = session.layout();
        let node = layout.target.tree.node("sex").expect("leaf for sex");
        assert!(!node.is_expanded);

        session.toggle_node(Side::Target, "sex");
        assert!(session.state().expanded.is_empty());
    }

    #[test]
    fn filter_changes_apply() {
        let mut session = ReviewSession::new(snapshot(), LayoutConfig::default());
        session.set_filter(ViewFilter {
            threshold: 0.5,
            ..ViewFilter::default()
        });
        let layout = session.layout();
        assert_eq!(layout.cells.len(), 2);
        assert!(layout.cells.iter().all(|c| c.status == CandidateStatus::Idle));
    }

    #[test]
    fn zero_capacity_still_caches_one_layout() {
        let mut config = LayoutConfig::default();
        config.view.cache_capacity = 0;
        let mut session = ReviewSession::new(snapshot(), config);
        session.layout();
        session.layout();
        assert_eq!(session.cache_stats().hits, 1);
    }
}
