use std::path::{Path, PathBuf};
use std::sync::Arc;

use formats::{load_document, Document};
use gpu::{DrawPlan, GlobeMeshes, Layer, LayerToggles, VertexBuffer};
use layers::GeometryExtractor;
use parking_lot::Mutex;
use scene::{Address, SelectionNode, SelectionTree, SharedSelection};
use tracing::{debug, info};

use crate::config::{ConfigError, ViewerConfig};
use crate::frame::Frame;

/// Layer switches shared between the UI side and the render loop, read on
/// every draw plan.
pub type SharedLayers = Arc<Mutex<LayerToggles>>;

/// UI-side owner of the document and its selection tree.
///
/// Every selection change rebuilds the selected-leaf set from scratch and
/// publishes it through the shared handle, which raises the dirty flag.
#[derive(Debug)]
pub struct Session {
    source: Option<PathBuf>,
    document: Arc<Document>,
    tree: SelectionTree,
    shared: Arc<SharedSelection>,
    layers: SharedLayers,
}

impl Session {
    /// Loads `path` best-effort; an unreadable or malformed file gives an
    /// empty or partial tree.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let mut session = Self::from_document(load_document(path));
        session.source = Some(path.to_path_buf());
        session
    }

    pub fn from_document(document: Document) -> Self {
        let tree = SelectionTree::build(&document);
        let document = Arc::new(document);
        let shared = Arc::new(SharedSelection::new(
            Arc::clone(&document),
            Arc::clone(tree.index()),
        ));
        Self {
            source: None,
            document,
            tree,
            shared,
            layers: Arc::new(Mutex::new(LayerToggles::default())),
        }
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    pub fn tree(&self) -> &SelectionTree {
        &self.tree
    }

    pub fn shared(&self) -> Arc<SharedSelection> {
        Arc::clone(&self.shared)
    }

    pub fn shared_layers(&self) -> SharedLayers {
        Arc::clone(&self.layers)
    }

    pub fn layers(&self) -> LayerToggles {
        *self.layers.lock()
    }

    pub fn set_layers(&self, toggles: LayerToggles) {
        *self.layers.lock() = toggles;
    }

    /// Switches one layer; the render loop picks it up on its next plan.
    pub fn set_layer(&self, layer: Layer, on: bool) -> LayerToggles {
        let mut toggles = self.layers.lock();
        toggles.set(layer, on);
        debug!(%layer, on, "layer switched");
        *toggles
    }

    /// Resolves a `/`-separated display path. An empty path is the root.
    pub fn find(&self, path: &str) -> Option<Address> {
        let labels: Vec<&str> = path
            .split('/')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        self.tree.find(&labels)
    }

    pub fn toggle(&mut self, address: &Address) -> Option<bool> {
        let selected = self.tree.toggle(address)?;
        self.publish();
        Some(selected)
    }

    pub fn set_selected(&mut self, address: &Address, selected: bool) -> bool {
        if !self.tree.set_selected(address, selected) {
            return false;
        }
        self.publish();
        true
    }

    pub fn expand(&mut self, address: &Address) -> bool {
        self.tree.expand(address)
    }

    pub fn collapse(&mut self, address: &Address) -> bool {
        self.tree.collapse(address)
    }

    pub fn toggle_expanded(&mut self, address: &Address) -> Option<bool> {
        self.tree.toggle_expanded(address)
    }

    /// Re-reads the source file (or rebuilds from the current document when
    /// there is none), builds a new tree and publishes it with an empty
    /// selection. Addresses from before the reload stop resolving.
    pub fn reload(&mut self) {
        if let Some(path) = &self.source {
            self.document = Arc::new(load_document(path));
        }
        self.tree = SelectionTree::build(&self.document);
        self.shared
            .publish_scene(Arc::clone(&self.document), Arc::clone(self.tree.index()));
        info!(
            generation = self.tree.generation(),
            leaves = self.document.root().leaf_count(),
            "reloaded document"
        );
    }

    /// Indented outline of the tree; collapsed nodes hide their children.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        outline_node(self.tree.root(), &self.tree.root().label, 0, &mut out);
        out
    }

    fn publish(&self) {
        let selection = self.tree.selected_leaves();
        debug!(selected = selection.len(), "selection changed");
        self.shared.publish_selection(selection);
    }
}

/// `label` is the node's path label, which differs from its display label
/// for later siblings sharing a name.
fn outline_node(node: &SelectionNode, label: &str, depth: usize, out: &mut String) {
    let fold = match (node.is_leaf(), node.expanded) {
        (true, _) => ' ',
        (false, true) => '-',
        (false, false) => '+',
    };
    let mark = if node.selected { 'x' } else { ' ' };
    out.push_str(&format!(
        "{}{fold} [{mark}] {}\n",
        "  ".repeat(depth),
        label
    ));
    if node.expanded {
        for (child, label) in node.children.iter().zip(node.child_path_labels()) {
            outline_node(child, &label, depth + 1, out);
        }
    }
}

/// Render-side owner of the vertex buffer and globe meshes.
#[derive(Debug)]
pub struct RenderState {
    shared: Arc<SharedSelection>,
    layers: SharedLayers,
    extractor: GeometryExtractor,
    globe: GlobeMeshes,
    buffer: VertexBuffer,
    rebuilds: u64,
}

impl RenderState {
    pub fn new(
        shared: Arc<SharedSelection>,
        layers: SharedLayers,
        extractor: GeometryExtractor,
        globe: GlobeMeshes,
    ) -> Self {
        Self {
            shared,
            layers,
            extractor,
            globe,
            buffer: VertexBuffer::empty(),
            rebuilds: 0,
        }
    }

    /// Attaches to `session` and applies `config.layers` as the starting
    /// layer switches.
    pub fn from_config(session: &Session, config: &ViewerConfig) -> Result<Self, ConfigError> {
        let extractor = config.extractor()?;
        session.set_layers(config.layers);
        Ok(Self::new(
            session.shared(),
            session.shared_layers(),
            extractor,
            GlobeMeshes::new(config.model_resolution),
        ))
    }

    /// Rebuilds the vertex buffer if the selection changed since the last
    /// tick. Returns whether a rebuild happened.
    pub fn tick(&mut self, frame: Frame) -> bool {
        if !self.shared.take_dirty() {
            return false;
        }
        let snapshot = self.shared.snapshot();
        let streams = self.extractor.extract(&snapshot);
        self.buffer = streams.into_vertex_buffer();
        self.rebuilds += 1;
        debug!(
            frame = frame.index,
            selected = snapshot.selection.len(),
            vertices = self.buffer.vertex_count(),
            "rebuilt vertex buffer"
        );
        true
    }

    pub fn buffer(&self) -> &VertexBuffer {
        &self.buffer
    }

    pub fn globe(&self) -> &GlobeMeshes {
        &self.globe
    }

    pub fn toggles(&self) -> LayerToggles {
        *self.layers.lock()
    }

    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    pub fn draw_plan(&self) -> DrawPlan {
        DrawPlan::build(&self.buffer, &self.globe, self.toggles())
    }
}
