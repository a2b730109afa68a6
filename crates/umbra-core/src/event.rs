//! DOM events and listener storage.
//!
//! An [`Event`] is a cheap, clonable handle. Listeners receive `&Event` and
//! may cancel it or stop its propagation; the dispatcher in
//! [`crate::Document::dispatch_event`] reads those flags back after each
//! listener.
//!
//! # Event Flow
//!
//! Dispatch walks the composed path from the target upwards: every listener
//! on the target runs first, then (for bubbling events) listeners on each
//! ancestor. At a shadow root the walk continues at the host, so a listener
//! on a host sees `input` and `change` events fired inside its shadow tree.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::{new_key_type, SlotMap};

use crate::tree::{NodeId, NodeTree};

/// The event types the platform dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// The value of a control changed through user input.
    Input,
    /// A user-initiated change was committed.
    Change,
    /// Activation (pointer click or keyboard equivalent).
    Click,
    /// A key was pressed.
    KeyDown,
    /// A pointer button was pressed.
    MouseDown,
    /// A pointer button was released.
    MouseUp,
    /// A form is about to be submitted.
    Submit,
    /// A form is about to be reset.
    Reset,
    /// A control failed constraint validation.
    Invalid,
}

impl EventType {
    /// The DOM event name.
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Input => "input",
            EventType::Change => "change",
            EventType::Click => "click",
            EventType::KeyDown => "keydown",
            EventType::MouseDown => "mousedown",
            EventType::MouseUp => "mouseup",
            EventType::Submit => "submit",
            EventType::Reset => "reset",
            EventType::Invalid => "invalid",
        }
    }

    /// Whether the event propagates to ancestors.
    pub fn bubbles(self) -> bool {
        !matches!(self, EventType::Invalid)
    }

    /// Whether `prevent_default` has an effect.
    pub fn cancelable(self) -> bool {
        !matches!(self, EventType::Input | EventType::Change)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct EventInner {
    event_type: EventType,
    target: NodeId,
    key: Option<String>,
    default_prevented: AtomicBool,
    propagation_stopped: AtomicBool,
    current_target: Mutex<Option<NodeId>>,
}

/// An event being (or about to be) dispatched.
#[derive(Clone)]
pub struct Event {
    inner: Arc<EventInner>,
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("type", &self.inner.event_type)
            .field("target", &self.inner.target)
            .field("key", &self.inner.key)
            .field("default_prevented", &self.default_prevented())
            .finish()
    }
}

impl Event {
    /// Create an event aimed at `target`.
    pub fn new(event_type: EventType, target: NodeId) -> Self {
        Self {
            inner: Arc::new(EventInner {
                event_type,
                target,
                key: None,
                default_prevented: AtomicBool::new(false),
                propagation_stopped: AtomicBool::new(false),
                current_target: Mutex::new(None),
            }),
        }
    }

    /// Create a `keydown` event for `key` (e.g. `"Enter"`).
    pub fn key_down(target: NodeId, key: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(EventInner {
                event_type: EventType::KeyDown,
                target,
                key: Some(key.into()),
                default_prevented: AtomicBool::new(false),
                propagation_stopped: AtomicBool::new(false),
                current_target: Mutex::new(None),
            }),
        }
    }

    /// The event type.
    pub fn event_type(&self) -> EventType {
        self.inner.event_type
    }

    /// The node the event was dispatched to.
    pub fn target(&self) -> NodeId {
        self.inner.target
    }

    /// The node whose listeners are currently running.
    pub fn current_target(&self) -> Option<NodeId> {
        *self.inner.current_target.lock()
    }

    pub(crate) fn set_current_target(&self, node: Option<NodeId>) {
        *self.inner.current_target.lock() = node;
    }

    /// The key of a keyboard event.
    pub fn key(&self) -> Option<&str> {
        self.inner.key.as_deref()
    }

    /// Cancel the default action. Ignored for non-cancelable events.
    pub fn prevent_default(&self) {
        if self.inner.event_type.cancelable() {
            self.inner.default_prevented.store(true, Ordering::SeqCst);
        }
    }

    /// Whether the default action was canceled.
    pub fn default_prevented(&self) -> bool {
        self.inner.default_prevented.load(Ordering::SeqCst)
    }

    /// Stop propagation to further nodes once the current node is done.
    pub fn stop_propagation(&self) {
        self.inner.propagation_stopped.store(true, Ordering::SeqCst);
    }

    /// Whether propagation was stopped.
    pub fn propagation_stopped(&self) -> bool {
        self.inner.propagation_stopped.load(Ordering::SeqCst)
    }

    /// Nodes whose listeners see this event, in dispatch order.
    pub(crate) fn propagation_path(&self, tree: &NodeTree) -> Vec<NodeId> {
        let mut path = vec![self.target()];
        if self.event_type().bubbles() {
            let mut current = tree.composed_parent(self.target());
            while let Some(node) = current {
                path.push(node);
                current = tree.composed_parent(node);
            }
        }
        path
    }
}

new_key_type! {
    /// Identifies a registered event listener.
    pub struct ListenerId;
}

/// A listener callback.
pub type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

struct ListenerEntry {
    node: NodeId,
    event_type: EventType,
    callback: Listener,
}

/// Storage for event listeners, keyed by node.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: SlotMap<ListenerId, ListenerEntry>,
    /// Listener ids per node, in registration order.
    by_node: HashMap<NodeId, Vec<ListenerId>>,
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    pub fn add(&mut self, node: NodeId, event_type: EventType, callback: Listener) -> ListenerId {
        let id = self.listeners.insert(ListenerEntry {
            node,
            event_type,
            callback,
        });
        self.by_node.entry(node).or_default().push(id);
        id
    }

    /// Unregister a listener. Returns `true` if it was registered.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let Some(entry) = self.listeners.remove(id) else {
            return false;
        };
        if let Some(ids) = self.by_node.get_mut(&entry.node) {
            ids.retain(|l| *l != id);
            if ids.is_empty() {
                self.by_node.remove(&entry.node);
            }
        }
        true
    }

    /// Drop every listener registered on `node`.
    pub fn remove_node(&mut self, node: NodeId) {
        for id in self.by_node.remove(&node).unwrap_or_default() {
            self.listeners.remove(id);
        }
    }

    /// Snapshot of the callbacks for `node` and `event_type`, in order.
    pub fn listeners_for(&self, node: NodeId, event_type: EventType) -> Vec<Listener> {
        self.by_node
            .get(&node)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.listeners.get(*id))
                    .filter(|entry| entry.event_type == event_type)
                    .map(|entry| entry.callback.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Total number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
