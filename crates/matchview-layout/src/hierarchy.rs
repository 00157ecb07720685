//! Three-level ontology tree (super-category → category → column) for one axis.
//!
//! Flat [`OntologyEntry`] facts are filtered to the active columns and grouped
//! by grandparent, then parent. Leaves take their position from the axis
//! scale; inner nodes cover the union of their children.
//!
//! Node ids are derived from the side and ancestry path. A [`NodeIndex`] built
//! alongside every tree maps stable user-facing keys (column, category and
//! super-category names) to the id currently representing them, so toggles
//! survive rebuilds.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use matchview_model::{OntologyEntry, Side};
use serde::{Deserialize, Serialize};

use crate::scale::{AxisScale, Band};
use crate::segments::{SegmentGroup, SuperCategoryGroup};

/// Depth of a node in the ontology tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeLevel {
    SuperCategory,
    Category,
    Column,
}

impl NodeLevel {
    /// 1 for super-categories, 2 for categories, 3 for columns.
    pub fn depth(&self) -> u8 {
        match self {
            Self::SuperCategory => 1,
            Self::Category => 2,
            Self::Column => 3,
        }
    }
}

/// One node of the ontology tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    pub id: String,
    pub label: String,
    pub level: NodeLevel,
    pub children: Vec<TreeNode>,
    /// Column this leaf stands for; `None` on inner nodes.
    pub column: Option<String>,
    pub position: f64,
    pub extent: f64,
    pub is_expanded: bool,
}

impl TreeNode {
    pub fn band(&self) -> Band {
        Band::new(self.position, self.extent)
    }

    pub fn is_leaf(&self) -> bool {
        self.level == NodeLevel::Column
    }

    /// Leaf columns under this node, in tree order.
    pub fn leaf_columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a str>) {
        if self.is_leaf()
            && let Some(column) = &self.column
        {
            out.push(column.as_str());
        }
        for child in &self.children {
            child.collect_leaves(out);
        }
    }

    pub fn contains_column(&self, column: &str) -> bool {
        self.column.as_deref() == Some(column)
            || self.children.iter().any(|child| child.contains_column(column))
    }

    /// Depth-first search by id.
    pub fn find(&self, id: &str) -> Option<&TreeNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }
}

/// Stable key → current node id lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NodeIndex {
    ids: BTreeMap<String, String>,
}

impl NodeIndex {
    /// Registers a key unless it is already taken.
    fn insert(&mut self, key: &str, id: &str) {
        self.ids
            .entry(key.to_string())
            .or_insert_with(|| id.to_string());
    }

    /// Current id for `key`, or `key` itself when nothing is registered.
    pub fn resolve<'a>(&'a self, key: &'a str) -> &'a str {
        self.ids.get(key).map_or(key, String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Ids whose expansion has been flipped by the user.
///
/// A node is expanded when its focus-derived default differs from its
/// membership here, so toggling the same id twice restores the original view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExpandedIds {
    ids: BTreeSet<String>,
}

impl ExpandedIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns the set with `id` flipped.
    #[must_use]
    pub fn toggled(&self, id: &str) -> Self {
        let mut next = self.clone();
        if !next.ids.remove(id) {
            next.ids.insert(id.to_string());
        }
        next
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Flips the node that `key` currently resolves to.
pub fn toggle_node(expanded: &ExpandedIds, index: &NodeIndex, key: &str) -> ExpandedIds {
    expanded.toggled(index.resolve(key))
}

/// Ontology tree for one side of the grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OntologyTree {
    pub side: Side,
    pub roots: Vec<TreeNode>,
    pub index: NodeIndex,
    /// Active columns without an ontology entry; drawn on a flat axis.
    pub orphans: Vec<String>,
}

impl OntologyTree {
    /// Node currently represented by `key` (a stable key or an id).
    pub fn node(&self, key: &str) -> Option<&TreeNode> {
        let id = self.index.resolve(key);
        self.roots.iter().find_map(|root| root.find(id))
    }

    /// Nodes at one level, in tree order.
    pub fn nodes_at(&self, level: NodeLevel) -> Vec<&TreeNode> {
        let mut out = Vec::new();
        let mut stack: Vec<&TreeNode> = self.roots.iter().rev().collect();
        while let Some(node) = stack.pop() {
            if node.level == level {
                out.push(node);
            } else {
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    /// All leaf columns, in tree order.
    pub fn leaf_columns(&self) -> Vec<&str> {
        self.roots.iter().flat_map(TreeNode::leaf_columns).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

fn super_id(side: Side, grandparent: &str) -> String {
    format!("{side}:{grandparent}")
}

fn category_id(side: Side, grandparent: &str, parent: &str) -> String {
    format!("{side}:{grandparent}>{parent}")
}

fn leaf_id(side: Side, grandparent: &str, parent: &str, column: &str) -> String {
    format!("{side}:{grandparent}>{parent}>{column}")
}

struct CategoryGroup<'a> {
    name: &'a str,
    columns: Vec<&'a str>,
}

struct SuperGroup<'a> {
    name: &'a str,
    categories: Vec<CategoryGroup<'a>>,
}

/// Builds the ontology tree for one side.
///
/// `focus` is the focused column on this side. With a focus, only nodes on
/// its ancestor chain default to expanded; without one, every node does.
/// `expanded` flips the default for the ids it contains.
pub fn build_ontology_tree(
    side: Side,
    entries: &[OntologyEntry],
    active_columns: &[String],
    scale: &AxisScale,
    focus: Option<&str>,
    expanded: &ExpandedIds,
) -> OntologyTree {
    let active: HashSet<&str> = active_columns.iter().map(String::as_str).collect();
    let mut placed: HashSet<&str> = HashSet::new();
    let mut groups: Vec<SuperGroup<'_>> = Vec::new();
    let mut dropped = 0usize;

    for entry in entries {
        if !active.contains(entry.name.as_str()) {
            dropped += 1;
            continue;
        }
        if !placed.insert(entry.name.as_str()) {
            continue;
        }
        let group = match groups.iter().position(|g| g.name == entry.grandparent) {
            Some(idx) => &mut groups[idx],
            None => {
                groups.push(SuperGroup {
                    name: &entry.grandparent,
                    categories: Vec::new(),
                });
                let last = groups.len() - 1;
                &mut groups[last]
            }
        };
        match group.categories.iter_mut().find(|c| c.name == entry.parent) {
            Some(category) => category.columns.push(&entry.name),
            None => group.categories.push(CategoryGroup {
                name: &entry.parent,
                columns: vec![entry.name.as_str()],
            }),
        }
    }

    let mut seen_orphans = HashSet::new();
    let orphans: Vec<String> = active_columns
        .iter()
        .filter(|column| !placed.contains(column.as_str()))
        .filter(|column| seen_orphans.insert(*column))
        .cloned()
        .collect();

    let focus = focus.filter(|column| !column.is_empty());
    let builder = TreeBuilder {
        side,
        scale,
        focus,
        expanded,
    };
    let mut roots: Vec<TreeNode> = groups.iter().map(|group| builder.super_node(group)).collect();
    sort_by_position(&mut roots);

    let mut index = NodeIndex::default();
    for node in roots.iter().flat_map(|root| root.children.iter()).flat_map(|c| c.children.iter()) {
        if let Some(column) = &node.column {
            index.insert(column, &node.id);
        }
    }
    for category in roots.iter().flat_map(|root| root.children.iter()) {
        index.insert(&category.label, &category.id);
    }
    for root in &roots {
        index.insert(&root.label, &root.id);
    }

    tracing::debug!(
        side = side.as_str(),
        super_categories = roots.len(),
        dropped_entries = dropped,
        orphans = orphans.len(),
        "Built ontology tree"
    );

    OntologyTree {
        side,
        roots,
        index,
        orphans,
    }
}

struct TreeBuilder<'a> {
    side: Side,
    scale: &'a AxisScale,
    focus: Option<&'a str>,
    expanded: &'a ExpandedIds,
}

impl TreeBuilder<'_> {
    fn is_expanded(&self, id: &str, on_focus_chain: bool) -> bool {
        let default = match self.focus {
            Some(_) => on_focus_chain,
            None => true,
        };
        default != self.expanded.contains(id)
    }

    fn on_chain(&self, columns: &[&str]) -> bool {
        self.focus.is_some_and(|focus| columns.contains(&focus))
    }

    fn super_node(&self, group: &SuperGroup<'_>) -> TreeNode {
        let id = super_id(self.side, group.name);
        let mut children: Vec<TreeNode> = group
            .categories
            .iter()
            .map(|category| self.category_node(group.name, category))
            .collect();
        sort_by_position(&mut children);
        let all_columns: Vec<&str> = group
            .categories
            .iter()
            .flat_map(|c| c.columns.iter().copied())
            .collect();
        inner_node(
            id.clone(),
            group.name,
            NodeLevel::SuperCategory,
            children,
            self.is_expanded(&id, self.on_chain(&all_columns)),
        )
    }

    fn category_node(&self, grandparent: &str, category: &CategoryGroup<'_>) -> TreeNode {
        let id = category_id(self.side, grandparent, category.name);
        let mut children: Vec<TreeNode> = category
            .columns
            .iter()
            .map(|column| self.leaf_node(grandparent, category.name, column))
            .collect();
        sort_by_position(&mut children);
        inner_node(
            id.clone(),
            category.name,
            NodeLevel::Category,
            children,
            self.is_expanded(&id, self.on_chain(&category.columns)),
        )
    }

    fn leaf_node(&self, grandparent: &str, parent: &str, column: &str) -> TreeNode {
        let id = leaf_id(self.side, grandparent, parent, column);
        let band = self.scale.band(column).unwrap_or_default();
        let is_expanded = self.is_expanded(&id, self.focus == Some(column));
        TreeNode {
            id,
            label: column.to_string(),
            level: NodeLevel::Column,
            children: Vec::new(),
            column: Some(column.to_string()),
            position: band.start,
            extent: band.size,
            is_expanded,
        }
    }
}

fn inner_node(
    id: String,
    label: &str,
    level: NodeLevel,
    children: Vec<TreeNode>,
    is_expanded: bool,
) -> TreeNode {
    let band = children
        .iter()
        .map(TreeNode::band)
        .reduce(|acc, band| acc.union(&band))
        .unwrap_or_default();
    TreeNode {
        id,
        label: label.to_string(),
        level,
        children,
        column: None,
        position: band.start,
        extent: band.size,
        is_expanded,
    }
}

fn sort_by_position(nodes: &mut [TreeNode]) {
    nodes.sort_by(|a, b| a.position.total_cmp(&b.position));
}

/// Resolves selected ontology keys to column names.
///
/// A key naming a super-category or category selects every entry below it; a
/// key naming a column selects that column. Keys that name no super-category
/// or category are kept as raw column names, so columns without ontology
/// entries stay selectable.
pub fn select_columns(entries: &[OntologyEntry], keys: &BTreeSet<String>) -> BTreeSet<String> {
    let mut selected = BTreeSet::new();
    let mut group_names: HashSet<&str> = HashSet::new();
    for entry in entries {
        group_names.insert(entry.parent.as_str());
        group_names.insert(entry.grandparent.as_str());
        if keys.contains(&entry.name)
            || keys.contains(&entry.parent)
            || keys.contains(&entry.grandparent)
        {
            selected.insert(entry.name.clone());
        }
    }
    selected.extend(
        keys.iter()
            .filter(|key| !group_names.contains(key.as_str()))
            .cloned(),
    );
    selected
}

/// Groups an ontology for pre-layout segment allocation.
///
/// Groups come out in first-seen order, restricted to `active_columns`, and
/// carry the same ids the tree would give them.
pub fn group_columns(
    side: Side,
    entries: &[OntologyEntry],
    active_columns: &[String],
) -> Vec<SuperCategoryGroup> {
    let active: HashSet<&str> = active_columns.iter().map(String::as_str).collect();
    let mut placed = HashSet::new();
    let mut out: Vec<SuperCategoryGroup> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();
    for entry in entries {
        if !active.contains(entry.name.as_str()) || !placed.insert(entry.name.as_str()) {
            continue;
        }
        let slot = *positions.entry(entry.grandparent.as_str()).or_insert_with(|| {
            out.push(SuperCategoryGroup {
                id: super_id(side, &entry.grandparent),
                label: entry.grandparent.clone(),
                categories: Vec::new(),
            });
            out.len() - 1
        });
        let categories = &mut out[slot].categories;
        match categories.iter_mut().find(|c| c.label == entry.parent) {
            Some(category) => {
                category.columns.push(entry.name.clone());
                category.children.push(entry.name.clone());
            }
            None => categories.push(SegmentGroup::of_columns(
                category_id(side, &entry.grandparent, &entry.parent),
                entry.parent.clone(),
                vec![entry.name.clone()],
            )),
        }
    }
    out
}

impl OntologyTree {
    /// Segment groups for one inner level, in tree order.
    ///
    /// Category groups reference their columns; super-category groups
    /// reference their category ids.
    pub fn segment_groups(&self, level: NodeLevel) -> Vec<SegmentGroup> {
        self.nodes_at(level)
            .into_iter()
            .map(|node| SegmentGroup {
                id: node.id.clone(),
                label: node.label.clone(),
                children: node
                    .children
                    .iter()
                    .map(|child| child.column.clone().unwrap_or_else(|| child.id.clone()))
                    .collect(),
                columns: node.leaf_columns().into_iter().map(str::to_string).collect(),
            })
            .collect()
    }
}
