use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use formats::Document;
use parking_lot::Mutex;
use tracing::debug;

use crate::selection::{SelectionIndex, SelectionSet};

/// Everything the render side needs to rebuild geometry, published together
/// so a snapshot never mixes a new selection with an old document.
#[derive(Debug, Clone)]
pub struct SceneSnapshot {
    pub document: Arc<Document>,
    pub index: Arc<SelectionIndex>,
    pub selection: SelectionSet,
}

/// The one piece of state shared between the UI side and the render loop.
///
/// The UI side publishes a freshly rebuilt [`SelectionSet`] and raises the
/// dirty flag; the render side polls [`SharedSelection::take_dirty`] once per
/// frame and, when set, takes a [`SceneSnapshot`]. The lock is held only for
/// the swap and the copy.
#[derive(Debug)]
pub struct SharedSelection {
    state: Mutex<SceneSnapshot>,
    dirty: AtomicBool,
}

impl SharedSelection {
    /// Starts with an empty selection and the dirty flag raised so the first
    /// frame builds its (empty) buffer.
    pub fn new(document: Arc<Document>, index: Arc<SelectionIndex>) -> Self {
        Self {
            state: Mutex::new(SceneSnapshot {
                document,
                index,
                selection: SelectionSet::new(),
            }),
            dirty: AtomicBool::new(true),
        }
    }

    pub fn publish_selection(&self, selection: SelectionSet) {
        let len = selection.len();
        {
            let mut state = self.state.lock();
            state.selection = selection;
        }
        self.dirty.store(true, Ordering::Release);
        debug!("published selection of {len} leaves");
    }

    /// Replaces document and index after a reload and clears the selection.
    pub fn publish_scene(&self, document: Arc<Document>, index: Arc<SelectionIndex>) {
        {
            let mut state = self.state.lock();
            *state = SceneSnapshot {
                document,
                index,
                selection: SelectionSet::new(),
            };
        }
        self.dirty.store(true, Ordering::Release);
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        self.state.lock().clone()
    }

    pub fn selection(&self) -> SelectionSet {
        self.state.lock().selection.clone()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Clears the dirty flag, returning whether it was set.
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }
}
