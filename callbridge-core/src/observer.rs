//! Lifecycle observer
//!
//! Watches the parent of a host element for child-list mutations and fires
//! once when the element itself is removed. Removal is matched by node
//! identity, so a different element carrying the same id never triggers it.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const MUTATION_CHANNEL_CAPACITY: usize = 64;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct ElementNode {
    id: String,
    parent: Mutex<Weak<ElementNode>>,
    children: Mutex<Vec<ElementRef>>,
    mutations: broadcast::Sender<MutationBatch>,
}

/// Shared reference to a document node
#[derive(Clone)]
pub struct ElementRef(Arc<ElementNode>);

impl ElementRef {
    fn new(id: impl Into<String>) -> Self {
        let (mutations, _) = broadcast::channel(MUTATION_CHANNEL_CAPACITY);
        Self(Arc::new(ElementNode {
            id: id.into(),
            parent: Mutex::new(Weak::new()),
            children: Mutex::new(Vec::new()),
            mutations,
        }))
    }

    pub fn id(&self) -> &str {
        &self.0.id
    }

    pub fn same_node(&self, other: &ElementRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn parent(&self) -> Option<ElementRef> {
        lock(&self.0.parent).upgrade().map(ElementRef)
    }

    pub fn children(&self) -> Vec<ElementRef> {
        lock(&self.0.children).clone()
    }

    fn publish(&self, record: MutationRecord) {
        // Nobody watching is fine
        let _ = self.0.mutations.send(vec![record]);
    }
}

impl fmt::Debug for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ElementRef").field(&self.0.id).finish()
    }
}

/// One child-list change on a node
#[derive(Debug, Clone, Default)]
pub struct MutationRecord {
    pub added: Vec<ElementRef>,
    pub removed: Vec<ElementRef>,
}

pub type MutationBatch = Vec<MutationRecord>;

/// The host document, as far as the observer needs it
pub trait Document: Send + Sync {
    fn element_by_id(&self, id: &str) -> Option<ElementRef>;

    fn parent_of(&self, element: &ElementRef) -> Option<ElementRef>;

    /// Child-list mutation batches of `parent` (direct children only)
    fn watch_children(&self, parent: &ElementRef) -> broadcast::Receiver<MutationBatch>;
}

/// In-memory document tree
pub struct MemoryDocument {
    root: ElementRef,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self {
            root: ElementRef::new("body"),
        }
    }

    pub fn root(&self) -> ElementRef {
        self.root.clone()
    }

    /// Create a detached element
    pub fn create_element(&self, id: impl Into<String>) -> ElementRef {
        ElementRef::new(id)
    }

    /// Append `child` to `parent`, moving it if it is already attached
    pub fn append_child(&self, parent: &ElementRef, child: &ElementRef) {
        if let Some(previous) = child.parent() {
            self.remove_child(&previous, child);
        }

        lock(&parent.0.children).push(child.clone());
        *lock(&child.0.parent) = Arc::downgrade(&parent.0);
        parent.publish(MutationRecord {
            added: vec![child.clone()],
            removed: Vec::new(),
        });
    }

    /// Detach `child` from `parent`. Returns false if it was not a child.
    pub fn remove_child(&self, parent: &ElementRef, child: &ElementRef) -> bool {
        let removed = {
            let mut children = lock(&parent.0.children);
            match children.iter().position(|c| c.same_node(child)) {
                Some(index) => {
                    children.remove(index);
                    true
                }
                None => false,
            }
        };

        if removed {
            *lock(&child.0.parent) = Weak::new();
            parent.publish(MutationRecord {
                added: Vec::new(),
                removed: vec![child.clone()],
            });
        }
        removed
    }

    /// Detach `element` from wherever it is attached
    pub fn remove(&self, element: &ElementRef) -> bool {
        match element.parent() {
            Some(parent) => self.remove_child(&parent, element),
            None => false,
        }
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl Document for MemoryDocument {
    /// First attached element with this id, in document order
    fn element_by_id(&self, id: &str) -> Option<ElementRef> {
        let mut stack = vec![self.root.clone()];
        while let Some(node) = stack.pop() {
            if node.id() == id {
                return Some(node);
            }
            stack.extend(node.children().into_iter().rev());
        }
        None
    }

    fn parent_of(&self, element: &ElementRef) -> Option<ElementRef> {
        element.parent()
    }

    fn watch_children(&self, parent: &ElementRef) -> broadcast::Receiver<MutationBatch> {
        parent.0.mutations.subscribe()
    }
}

/// Running observer for one element; dropping it disconnects the watch
pub struct ObserverHandle {
    element_id: String,
    task: JoinHandle<()>,
}

impl ObserverHandle {
    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ObserverHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Watch `mutations` for the removal of `element`
///
/// `on_removed` runs on its own task, so it may drop this observer's handle
/// without cancelling itself.
pub fn spawn_observer<F, Fut>(
    element: ElementRef,
    mut mutations: broadcast::Receiver<MutationBatch>,
    on_removed: F,
) -> ObserverHandle
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let element_id = element.id().to_string();
    let id = element_id.clone();

    let task = tokio::spawn(async move {
        loop {
            match mutations.recv().await {
                Ok(batch) => {
                    let removed = batch
                        .iter()
                        .any(|record| record.removed.iter().any(|n| n.same_node(&element)));
                    if removed {
                        debug!(element_id = %id, "Observed element removed");
                        tokio::spawn(on_removed());
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(element_id = %id, skipped, "Observer lagged behind mutations");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    ObserverHandle { element_id, task }
}
