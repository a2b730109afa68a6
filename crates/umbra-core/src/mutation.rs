//! Mutation observers for child-list changes.
//!
//! A [`MutationObserver`] watches one or more nodes. When children are added
//! to or removed from a watched node (or, with `subtree`, anywhere below it),
//! the document queues a [`MutationRecord`] and schedules one microtask per
//! observer that delivers every record gathered so far in a single batch.
//!
//! Subtree observation follows the composed tree: observing a host with
//! `subtree` also reports changes inside its shadow root, including the
//! attachment of the shadow root itself.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::document::{Document, WeakDocument};
use crate::logging::targets;
use crate::tree::{NodeId, NodeTree};

/// A child-list change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    /// The node whose children changed.
    pub target: NodeId,
    /// Nodes that were inserted.
    pub added_nodes: Vec<NodeId>,
    /// Nodes that were removed.
    pub removed_nodes: Vec<NodeId>,
}

impl MutationRecord {
    /// A record for `node` being added under `target`.
    pub fn added(target: NodeId, node: NodeId) -> Self {
        Self {
            target,
            added_nodes: vec![node],
            removed_nodes: Vec::new(),
        }
    }

    /// A record for `node` being removed from `target`.
    pub fn removed(target: NodeId, node: NodeId) -> Self {
        Self {
            target,
            added_nodes: Vec::new(),
            removed_nodes: vec![node],
        }
    }
}

type MutationCallback = Box<dyn Fn(Vec<MutationRecord>) + Send + Sync>;

pub(crate) struct ObserverInner {
    callback: MutationCallback,
    /// Observed nodes and whether their subtree is included.
    targets: Mutex<Vec<(NodeId, bool)>>,
    records: Mutex<Vec<MutationRecord>>,
    /// Whether a delivery microtask is pending.
    scheduled: AtomicBool,
}

impl ObserverInner {
    fn is_interested(&self, tree: &NodeTree, target: NodeId) -> bool {
        self.targets.lock().iter().any(|(observed, subtree)| {
            *observed == target || (*subtree && tree.is_inclusive_ancestor(*observed, target, true))
        })
    }

    fn deliver(&self) {
        self.scheduled.store(false, Ordering::SeqCst);
        let records = std::mem::take(&mut *self.records.lock());
        if records.is_empty() {
            return;
        }
        tracing::trace!(target: targets::MUTATION, count = records.len(), "delivering mutation records");
        (self.callback)(records);
    }
}

/// Observes child-list changes on chosen nodes.
///
/// Dropping the observer disconnects it.
pub struct MutationObserver {
    inner: Arc<ObserverInner>,
    document: WeakDocument,
}

impl fmt::Debug for MutationObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationObserver")
            .field("targets", &*self.inner.targets.lock())
            .field("pending", &self.inner.records.lock().len())
            .finish()
    }
}

impl MutationObserver {
    /// Create an observer delivering batches of records to `callback`.
    pub fn new<F>(document: &Document, callback: F) -> Self
    where
        F: Fn(Vec<MutationRecord>) + Send + Sync + 'static,
    {
        let inner = Arc::new(ObserverInner {
            callback: Box::new(callback),
            targets: Mutex::new(Vec::new()),
            records: Mutex::new(Vec::new()),
            scheduled: AtomicBool::new(false),
        });
        document.inner.observers.lock().push(Arc::downgrade(&inner));
        Self {
            inner,
            document: document.downgrade(),
        }
    }

    /// Start observing `target`. Observing the same node again replaces its
    /// `subtree` option.
    pub fn observe(&self, target: NodeId, subtree: bool) {
        let mut targets = self.inner.targets.lock();
        match targets.iter_mut().find(|(node, _)| *node == target) {
            Some(entry) => entry.1 = subtree,
            None => targets.push((target, subtree)),
        }
    }

    /// Stop observing everything and drop undelivered records.
    pub fn disconnect(&self) {
        self.inner.targets.lock().clear();
        self.inner.records.lock().clear();
    }

    /// Whether any node is observed.
    pub fn is_observing(&self) -> bool {
        !self.inner.targets.lock().is_empty()
    }

    /// Take the undelivered records.
    pub fn take_records(&self) -> Vec<MutationRecord> {
        std::mem::take(&mut *self.inner.records.lock())
    }
}

impl Drop for MutationObserver {
    fn drop(&mut self) {
        self.disconnect();
        if let Some(document) = self.document.upgrade() {
            let ours = Arc::downgrade(&self.inner);
            document
                .inner
                .observers
                .lock()
                .retain(|observer| !Weak::ptr_eq(observer, &ours) && observer.strong_count() > 0);
        }
    }
}

impl Document {
    /// Hand `record` to every observer interested in its target.
    pub(crate) fn queue_mutation_record(&self, record: MutationRecord) {
        let observers: Vec<Arc<ObserverInner>> = {
            let mut list = self.inner.observers.lock();
            list.retain(|observer| observer.strong_count() > 0);
            list.iter().filter_map(Weak::upgrade).collect()
        };
        if observers.is_empty() {
            return;
        }

        let interested: Vec<bool> = self.with_tree(|tree| {
            observers
                .iter()
                .map(|observer| observer.is_interested(tree, record.target))
                .collect()
        });
        for (observer, interested) in observers.into_iter().zip(interested) {
            if !interested {
                continue;
            }
            observer.records.lock().push(record.clone());
            if !observer.scheduled.swap(true, Ordering::SeqCst) {
                let weak = Arc::downgrade(&observer);
                self.queue_microtask(move || {
                    if let Some(observer) = weak.upgrade() {
                        observer.deliver();
                    }
                });
            }
        }
    }
}
