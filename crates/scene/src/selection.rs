use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use formats::{Document, DocumentNode};

static NEXT_GENERATION: AtomicU32 = AtomicU32::new(1);

/// Synthetic identity of one node: `(generation, ordinal)`.
///
/// `ordinal` is the node's pre-order position in the tree it was built in and
/// `generation` is unique per [`SelectionTree::build`], so keys never collide
/// across duplicate display names or across reloads.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeKey {
    generation: u32,
    ordinal: u32,
}

impl NodeKey {
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Segment {
    pub key: NodeKey,
    pub label: String,
}

/// Path from the document root down to a node, one segment per level.
///
/// The root itself has the empty address. Ordering follows the pre-order of
/// the tree the address was built from.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(Vec<Segment>);

impl Address {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn child(&self, segment: Segment) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment);
        Self(segments)
    }

    pub fn last_label(&self) -> Option<&str> {
        self.0.last().map(|s| s.label.as_str())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(|s| s.label.as_str())
    }

    pub fn starts_with(&self, prefix: &Address) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, label) in self.labels().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            f.write_str(label)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionNode {
    pub label: String,
    pub address: Address,
    pub children: Vec<SelectionNode>,
    pub selected: bool,
    /// Display-only; has no effect on geometry.
    pub expanded: bool,
}

impl SelectionNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Path labels for the children, in order: a name on its first
    /// occurrence, `name#n` for the n-th sibling sharing it. Each resolves
    /// back to its child through [`SelectionTree::find`].
    pub fn child_path_labels(&self) -> Vec<String> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        self.children
            .iter()
            .map(|child| {
                let n = seen.entry(child.label.as_str()).or_insert(0);
                *n += 1;
                if *n == 1 && split_occurrence(&child.label).is_none() {
                    child.label.clone()
                } else {
                    format!("{}#{n}", child.label)
                }
            })
            .collect()
    }

    /// `name#n` selects the n-th (1-based) child named `name` when there is
    /// one; otherwise the first child whose label is exactly `label`.
    fn child_by_path_label(&self, label: &str) -> Option<&SelectionNode> {
        if let Some((name, n)) = split_occurrence(label) {
            let nth = self.children.iter().filter(|c| c.label == name).nth(n - 1);
            if nth.is_some() {
                return nth;
            }
        }
        self.children.iter().find(|c| c.label == label)
    }

    fn set_selected_recursive(&mut self, selected: bool) {
        self.selected = selected;
        for child in &mut self.children {
            child.set_selected_recursive(selected);
        }
    }

    fn walk<F: FnMut(&SelectionNode, usize)>(&self, depth: usize, f: &mut F) {
        f(self, depth);
        for child in &self.children {
            child.walk(depth + 1, f);
        }
    }
}

/// Side index from node keys to sibling positions.
///
/// Resolves addresses back into a document without holding node references,
/// so a snapshot of the index can travel to another thread with the document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionIndex {
    generation: u32,
    positions: HashMap<NodeKey, usize>,
}

impl SelectionIndex {
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn position(&self, key: &NodeKey) -> Option<usize> {
        if key.generation != self.generation {
            return None;
        }
        self.positions.get(key).copied()
    }

    /// Walks `address` down from `root`.
    ///
    /// Returns `None` for addresses from another build, out-of-range
    /// positions, or a label that no longer matches the document.
    pub fn resolve<'d>(&self, root: &'d DocumentNode, address: &Address) -> Option<&'d DocumentNode> {
        let mut node = root;
        for segment in address.segments() {
            let position = self.position(&segment.key)?;
            node = node.children.get(position)?;
            if node.name != segment.label {
                return None;
            }
        }
        Some(node)
    }
}

/// Selected leaf addresses.
///
/// Ordering contract:
/// - Iteration yields addresses in ascending order, which is document
///   pre-order for addresses of one build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    addresses: BTreeSet<Address>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.addresses.contains(address)
    }

    /// Returns `true` if the set changed.
    pub fn insert(&mut self, address: Address) -> bool {
        self.addresses.insert(address)
    }

    pub fn clear(&mut self) {
        self.addresses.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Address> + '_ {
        self.addresses.iter()
    }
}

impl FromIterator<Address> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = Address>>(iter: I) -> Self {
        Self {
            addresses: iter.into_iter().collect(),
        }
    }
}

/// Navigable selection tree mirroring a [`Document`] one node per folder.
#[derive(Debug, Clone)]
pub struct SelectionTree {
    root: SelectionNode,
    index: Arc<SelectionIndex>,
}

impl SelectionTree {
    pub fn build(document: &Document) -> Self {
        let generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);
        let mut index = SelectionIndex {
            generation,
            positions: HashMap::new(),
        };
        let mut next_ordinal = 0u32;

        let doc_root = document.root();
        let label = if doc_root.name.is_empty() {
            "Document".to_string()
        } else {
            doc_root.name.clone()
        };
        let children = build_children(
            doc_root,
            &Address::root(),
            generation,
            &mut next_ordinal,
            &mut index.positions,
        );

        Self {
            root: SelectionNode {
                label,
                address: Address::root(),
                children,
                selected: false,
                expanded: true,
            },
            index: Arc::new(index),
        }
    }

    pub fn root(&self) -> &SelectionNode {
        &self.root
    }

    pub fn index(&self) -> &Arc<SelectionIndex> {
        &self.index
    }

    pub fn generation(&self) -> u32 {
        self.index.generation
    }

    pub fn node(&self, address: &Address) -> Option<&SelectionNode> {
        let mut node = &self.root;
        for segment in address.segments() {
            let position = self.index.position(&segment.key)?;
            node = node.children.get(position)?;
        }
        Some(node)
    }

    fn node_mut(&mut self, address: &Address) -> Option<&mut SelectionNode> {
        let mut node = &mut self.root;
        for segment in address.segments() {
            let position = self.index.position(&segment.key)?;
            node = node.children.get_mut(position)?;
        }
        Some(node)
    }

    /// Flips the node's selected flag and pushes the new value down its
    /// subtree. Returns the new flag, or `None` if the address is unknown.
    pub fn toggle(&mut self, address: &Address) -> Option<bool> {
        let node = self.node_mut(address)?;
        let selected = !node.selected;
        node.set_selected_recursive(selected);
        Some(selected)
    }

    /// Returns `false` if the address is unknown.
    pub fn set_selected(&mut self, address: &Address, selected: bool) -> bool {
        match self.node_mut(address) {
            Some(node) => {
                node.set_selected_recursive(selected);
                true
            }
            None => false,
        }
    }

    pub fn set_expanded(&mut self, address: &Address, expanded: bool) -> bool {
        match self.node_mut(address) {
            Some(node) => {
                node.expanded = expanded;
                true
            }
            None => false,
        }
    }

    pub fn expand(&mut self, address: &Address) -> bool {
        self.set_expanded(address, true)
    }

    pub fn collapse(&mut self, address: &Address) -> bool {
        self.set_expanded(address, false)
    }

    pub fn toggle_expanded(&mut self, address: &Address) -> Option<bool> {
        let node = self.node_mut(address)?;
        node.expanded = !node.expanded;
        Some(node.expanded)
    }

    /// Pre-order walk; the callback receives each node and its depth.
    pub fn walk<F: FnMut(&SelectionNode, usize)>(&self, mut f: F) {
        self.root.walk(0, &mut f);
    }

    /// Rebuilds the set of selected leaves from scratch.
    ///
    /// The root stands for the document container and is never collected.
    pub fn selected_leaves(&self) -> SelectionSet {
        let mut set = SelectionSet::new();
        self.walk(|node, depth| {
            if depth > 0 && node.selected && node.is_leaf() {
                set.insert(node.address.clone());
            }
        });
        set
    }

    pub fn leaf_addresses(&self) -> Vec<Address> {
        let mut out = Vec::new();
        self.walk(|node, depth| {
            if depth > 0 && node.is_leaf() {
                out.push(node.address.clone());
            }
        });
        out
    }

    /// Finds a node by path labels, one per level. A bare name takes the
    /// first sibling with that name; `name#n` takes the n-th. An empty path
    /// is the root.
    pub fn find(&self, labels: &[&str]) -> Option<Address> {
        let mut node = &self.root;
        for label in labels {
            node = node.child_by_path_label(label)?;
        }
        Some(node.address.clone())
    }
}

/// Splits a trailing `#n` occurrence suffix, `n >= 1`.
fn split_occurrence(label: &str) -> Option<(&str, usize)> {
    let (name, occurrence) = label.rsplit_once('#')?;
    if occurrence.is_empty() || !occurrence.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: usize = occurrence.parse().ok()?;
    (n >= 1).then_some((name, n))
}

fn build_children(
    doc_node: &DocumentNode,
    parent: &Address,
    generation: u32,
    next_ordinal: &mut u32,
    positions: &mut HashMap<NodeKey, usize>,
) -> Vec<SelectionNode> {
    let mut out = Vec::with_capacity(doc_node.children.len());
    for (position, child) in doc_node.children.iter().enumerate() {
        let key = NodeKey {
            generation,
            ordinal: *next_ordinal,
        };
        *next_ordinal += 1;
        positions.insert(key, position);

        let address = parent.child(Segment {
            key,
            label: child.name.clone(),
        });
        let children = build_children(child, &address, generation, next_ordinal, positions);
        out.push(SelectionNode {
            label: child.name.clone(),
            address,
            children,
            selected: false,
            expanded: false,
        });
    }
    out
}
