//! The document: a node tree plus everything that reacts to it.
//!
//! [`Document`] is a cheap, clonable handle. It owns the [`NodeTree`] behind
//! a read-write lock and layers on top of it:
//! - event listeners and composed event dispatch
//! - mutation records for registered observers
//! - custom element reactions (connected, disconnected, attribute changes,
//!   form reset, form disabled)
//! - element internals for form-associated hosts
//! - the microtask queue
//!
//! # Locking
//!
//! Each operation takes the tree lock, mutates, collects the reactions it
//! owes, releases the lock, and only then runs listeners and callbacks. A
//! callback may therefore call any document method, including the one that
//! triggered it.
//!
//! # Ownership
//!
//! The document owns every defined custom element until its node is
//! destroyed, so an element keeps participating after the embedder drops its
//! handle. Internals and mutation observers are held weakly; the element (or
//! the embedder) owns them. Closures stored in the document should capture a
//! [`WeakDocument`] rather than a `Document`.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::custom::CustomElement;
use crate::error::{DomError, DomResult};
use crate::event::{Event, EventType, ListenerId, ListenerRegistry};
use crate::form::FormSubmission;
use crate::internals::{Internals, ReportedValidity};
use crate::logging::{targets, TreeDebug};
use crate::microtask::{MicrotaskId, MicrotaskQueue};
use crate::mutation::{MutationRecord, ObserverInner};
use crate::signal::Signal;
use crate::tree::{NodeId, NodeTree};

pub(crate) struct DocumentInner {
    pub(crate) tree: RwLock<NodeTree>,
    pub(crate) listeners: Mutex<ListenerRegistry>,
    pub(crate) observers: Mutex<Vec<Weak<ObserverInner>>>,
    elements: Mutex<HashMap<NodeId, Arc<dyn CustomElement>>>,
    internals: Mutex<HashMap<NodeId, Weak<Internals>>>,
    pub(crate) microtasks: MicrotaskQueue,
    pub(crate) submissions: Mutex<Vec<FormSubmission>>,
    pub(crate) submitted: Signal<FormSubmission>,
    pub(crate) reported: Mutex<Vec<ReportedValidity>>,
}

/// Shared handle to a document.
#[derive(Clone)]
pub struct Document {
    pub(crate) inner: Arc<DocumentInner>,
}

/// Non-owning handle to a document.
#[derive(Clone, Default)]
pub struct WeakDocument {
    inner: Weak<DocumentInner>,
}

impl WeakDocument {
    /// Upgrade to a strong handle if the document is still alive.
    pub fn upgrade(&self) -> Option<Document> {
        self.inner.upgrade().map(|inner| Document { inner })
    }
}

impl fmt::Debug for WeakDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakDocument")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.with_tree(|t| t.node_count()))
            .field("pending_microtasks", &self.inner.microtasks.pending_count())
            .finish()
    }
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DocumentInner {
                tree: RwLock::new(NodeTree::new()),
                listeners: Mutex::new(ListenerRegistry::new()),
                observers: Mutex::new(Vec::new()),
                elements: Mutex::new(HashMap::new()),
                internals: Mutex::new(HashMap::new()),
                microtasks: MicrotaskQueue::new(),
                submissions: Mutex::new(Vec::new()),
                submitted: Signal::new(),
                reported: Mutex::new(Vec::new()),
            }),
        }
    }

    /// A non-owning handle to this document.
    pub fn downgrade(&self) -> WeakDocument {
        WeakDocument {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Whether two handles refer to the same document.
    pub fn ptr_eq(&self, other: &Document) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The document node.
    pub fn root(&self) -> NodeId {
        self.with_tree(|t| t.root())
    }

    /// Run `f` with read access to the tree.
    ///
    /// Do not call back into the document from `f`.
    pub fn with_tree<R>(&self, f: impl FnOnce(&NodeTree) -> R) -> R {
        f(&self.inner.tree.read())
    }

    pub(crate) fn with_tree_mut<R>(&self, f: impl FnOnce(&mut NodeTree) -> R) -> R {
        f(&mut self.inner.tree.write())
    }

    /// Render the tree (shadow roots included) for debugging.
    pub fn debug_tree(&self) -> String {
        self.with_tree(|t| TreeDebug::new().format_subtree(t, t.root()))
    }

    // =========================================================================
    // Tree construction
    // =========================================================================

    /// Create a detached element.
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.with_tree_mut(|t| t.create_element(tag))
    }

    /// Create a detached text node.
    pub fn create_text(&self, data: &str) -> NodeId {
        self.with_tree_mut(|t| t.create_text(data))
    }

    /// Append `child` to `parent`.
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` into `parent` before `reference`.
    pub fn insert_before(
        &self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()> {
        let (old_parent, was_connected, is_connected, subtree) = self.with_tree_mut(|tree| {
            let was_connected = tree.is_connected(child);
            let old_parent = tree.insert_before(parent, child, reference)?;
            let is_connected = tree.is_connected(child);
            let mut subtree = vec![child];
            subtree.extend(tree.descendants(child, true));
            Ok::<_, DomError>((old_parent, was_connected, is_connected, subtree))
        })?;
        tracing::debug!(target: targets::TREE, ?parent, ?child, "inserted node");

        if let Some(old) = old_parent {
            self.queue_mutation_record(MutationRecord::removed(old, child));
        }
        self.queue_mutation_record(MutationRecord::added(parent, child));

        if was_connected {
            self.run_disconnected(&subtree);
        }
        if is_connected {
            self.run_connected(&subtree);
        }
        Ok(())
    }

    /// Remove `child` from `parent`.
    pub fn remove_child(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        let (was_connected, subtree) = self.with_tree_mut(|tree| {
            let was_connected = tree.is_connected(child);
            tree.remove_child(parent, child)?;
            let mut subtree = vec![child];
            subtree.extend(tree.descendants(child, true));
            Ok::<_, DomError>((was_connected, subtree))
        })?;
        tracing::debug!(target: targets::TREE, ?parent, ?child, "removed node");

        self.queue_mutation_record(MutationRecord::removed(parent, child));
        if was_connected {
            self.run_disconnected(&subtree);
        }
        Ok(())
    }

    /// Detach `node` from its parent, if it has one.
    pub fn remove(&self, node: NodeId) -> DomResult<()> {
        match self.with_tree(|t| t.parent(node))? {
            Some(parent) => self.remove_child(parent, node),
            None => Ok(()),
        }
    }

    /// Remove `node` and drop it together with its subtree.
    ///
    /// Listeners, custom element bindings and internals of destroyed nodes are
    /// released.
    pub fn destroy(&self, node: NodeId) -> DomResult<()> {
        self.remove(node)?;
        let destroyed = self.with_tree_mut(|t| t.destroy(node))?;
        {
            let mut listeners = self.inner.listeners.lock();
            for id in &destroyed {
                listeners.remove_node(*id);
            }
        }
        // Dropped after the lock is released; element destructors call back in.
        let released: Vec<Arc<dyn CustomElement>> = {
            let mut elements = self.inner.elements.lock();
            destroyed.iter().filter_map(|id| elements.remove(id)).collect()
        };
        drop(released);
        let mut internals = self.inner.internals.lock();
        for id in &destroyed {
            internals.remove(id);
        }
        Ok(())
    }

    /// Attach an open shadow root to `host`.
    ///
    /// Observers of the host see a record for the new root.
    pub fn attach_shadow(&self, host: NodeId) -> DomResult<NodeId> {
        let shadow = self.with_tree_mut(|t| t.attach_shadow(host))?;
        self.queue_mutation_record(MutationRecord::added(host, shadow));
        Ok(shadow)
    }

    /// The shadow root of `host`, if any.
    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.with_tree(|t| t.shadow_root(host))
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// The value of an attribute.
    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.with_tree(|t| t.attribute(node, name).map(str::to_string))
    }

    /// Whether an attribute is present.
    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.with_tree(|t| t.has_attribute(node, name))
    }

    /// Set an attribute.
    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> DomResult<()> {
        self.change_attribute(node, name, Some(value))
    }

    /// Remove an attribute. Removing an absent attribute does nothing.
    pub fn remove_attribute(&self, node: NodeId, name: &str) -> DomResult<()> {
        if !self.has_attribute(node, name) {
            return Ok(());
        }
        self.change_attribute(node, name, None)
    }

    /// Add (empty value) or remove a boolean attribute.
    pub fn toggle_attribute(&self, node: NodeId, name: &str, present: bool) -> DomResult<()> {
        if present {
            if self.has_attribute(node, name) {
                return Ok(());
            }
            self.set_attribute(node, name, "")
        } else {
            self.remove_attribute(node, name)
        }
    }

    fn change_attribute(&self, node: NodeId, name: &str, value: Option<&str>) -> DomResult<()> {
        let name = name.to_ascii_lowercase();
        let affects_disabled = name == "disabled";

        let candidates: Vec<NodeId> = if affects_disabled {
            let subtree: Vec<NodeId> = self.with_tree(|tree| {
                std::iter::once(node)
                    .chain(tree.descendants(node, false))
                    .collect()
            });
            subtree
                .into_iter()
                .filter(|n| self.is_form_associated(*n))
                .collect()
        } else {
            Vec::new()
        };

        let (old, disabled_before) = self.with_tree_mut(|tree| {
            let before: Vec<bool> = candidates.iter().map(|n| tree.is_disabled(*n)).collect();
            let old = match value {
                Some(value) => tree.set_attribute(node, &name, value)?,
                None => tree.remove_attribute(node, &name)?,
            };
            Ok::<_, DomError>((old, before))
        })?;
        tracing::trace!(target: targets::TREE, ?node, %name, ?value, "attribute changed");

        if let Some(element) = self.custom_element(node)
            && element.observed_attributes().contains(&name.as_str())
        {
            element.attribute_changed_callback(&name, old.as_deref(), value);
        }

        if !candidates.is_empty() {
            let after: Vec<bool> =
                self.with_tree(|t| candidates.iter().map(|n| t.is_disabled(*n)).collect());
            for ((candidate, before), after) in candidates.iter().zip(disabled_before).zip(after) {
                if before != after
                    && let Some(element) = self.custom_element(*candidate)
                {
                    tracing::debug!(target: targets::CUSTOM, node = ?candidate, disabled = after, "form disabled callback");
                    element.form_disabled_callback(after);
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // Native controls
    // =========================================================================

    /// The value of a native control.
    pub fn control_value(&self, node: NodeId) -> Option<String> {
        self.with_tree(|t| t.control_value(node))
    }

    /// Set the value of a native control (no events fire).
    pub fn set_control_value(&self, node: NodeId, value: &str) -> DomResult<()> {
        self.with_tree_mut(|t| t.set_control_value(node, value))
    }

    /// The checkedness of a native checkbox or radio.
    pub fn control_checked(&self, node: NodeId) -> Option<bool> {
        self.with_tree(|t| t.control_checked(node))
    }

    /// Set the checkedness of a native checkbox or radio (no events fire).
    ///
    /// Checking a radio unchecks the other radios of its group.
    pub fn set_control_checked(&self, node: NodeId, checked: bool) -> DomResult<()> {
        self.with_tree_mut(|t| {
            if checked && t.input_type(node) == Some("radio") {
                for other in t.native_radio_group(node) {
                    if other != node {
                        t.set_control_checked(other, false)?;
                    }
                }
            }
            t.set_control_checked(node, checked)
        })
    }

    /// The form owner of an element.
    pub fn form_owner(&self, node: NodeId) -> Option<NodeId> {
        self.with_tree(|t| t.form_owner(node))
    }

    /// Whether the element is disabled (own attribute or fieldset).
    pub fn is_disabled(&self, node: NodeId) -> bool {
        self.with_tree(|t| t.is_disabled(node))
    }

    // =========================================================================
    // Custom elements and internals
    // =========================================================================

    /// Bind a custom element implementation to `node`.
    ///
    /// The document keeps `element` alive until `node` is destroyed.
    ///
    /// Existing observed attributes are replayed to
    /// [`CustomElement::attribute_changed_callback`], then the element is told
    /// it is connected if the node already is.
    pub fn define_element<E: CustomElement>(&self, node: NodeId, element: &Arc<E>) -> DomResult<()> {
        let (attributes, connected) = self.with_tree(|t| {
            if t.tag_name(node).is_none() {
                return Err(DomError::NotAnElement(node));
            }
            Ok((t.attributes(node)?.to_vec(), t.is_connected(node)))
        })?;
        {
            let mut elements = self.inner.elements.lock();
            if elements.contains_key(&node) {
                return Err(DomError::AlreadyDefined(node));
            }
            let owned: Arc<dyn CustomElement> = element.clone();
            elements.insert(node, owned);
        }
        tracing::debug!(target: targets::CUSTOM, ?node, "defined custom element");

        let observed = element.observed_attributes();
        for (name, value) in &attributes {
            if observed.contains(&name.as_str()) {
                element.attribute_changed_callback(name, None, Some(value));
            }
        }
        if connected {
            element.connected_callback();
        }
        Ok(())
    }

    /// The custom element bound to `node`, if one was defined and the node
    /// has not been destroyed.
    pub fn custom_element(&self, node: NodeId) -> Option<Arc<dyn CustomElement>> {
        self.inner.elements.lock().get(&node).cloned()
    }

    /// Whether `node` is a live form-associated custom element.
    pub fn is_form_associated(&self, node: NodeId) -> bool {
        self.custom_element(node)
            .is_some_and(|element| element.is_form_associated())
    }

    /// Attach element internals to `host`. Only one set may be live per host.
    pub fn attach_internals(&self, host: NodeId) -> DomResult<Arc<Internals>> {
        if self.with_tree(|t| t.tag_name(host).is_none()) {
            return Err(DomError::NotAnElement(host));
        }
        let mut internals = self.inner.internals.lock();
        if internals.get(&host).is_some_and(|i| i.strong_count() > 0) {
            return Err(DomError::InternalsAlreadyAttached(host));
        }
        let attached = Arc::new(Internals::new(host, self.downgrade()));
        internals.insert(host, Arc::downgrade(&attached));
        Ok(attached)
    }

    /// The live internals of `host`, if any.
    pub fn internals(&self, host: NodeId) -> Option<Arc<Internals>> {
        self.inner.internals.lock().get(&host)?.upgrade()
    }

    fn custom_elements_in(&self, nodes: &[NodeId]) -> Vec<Arc<dyn CustomElement>> {
        let elements = self.inner.elements.lock();
        nodes
            .iter()
            .filter_map(|n| elements.get(n).cloned())
            .collect()
    }

    fn run_connected(&self, subtree: &[NodeId]) {
        for element in self.custom_elements_in(subtree) {
            element.connected_callback();
        }
    }

    fn run_disconnected(&self, subtree: &[NodeId]) {
        for element in self.custom_elements_in(subtree) {
            element.disconnected_callback();
        }
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Register a listener for `event_type` on `node`.
    pub fn add_event_listener<F>(&self, node: NodeId, event_type: EventType, listener: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.inner
            .listeners
            .lock()
            .add(node, event_type, Arc::new(listener))
    }

    /// Unregister a listener. Returns `true` if it was registered.
    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners.lock().remove(id)
    }

    /// Dispatch `event` along its composed path.
    ///
    /// Returns `false` if a listener canceled the event.
    #[tracing::instrument(
        name = "dispatch",
        skip_all,
        target = "umbra_core::event",
        level = "trace",
        fields(event = %event.event_type())
    )]
    pub fn dispatch_event(&self, event: &Event) -> bool {
        let path = self.with_tree(|t| {
            if t.contains(event.target()) {
                event.propagation_path(t)
            } else {
                Vec::new()
            }
        });

        for node in path {
            let listeners = self
                .inner
                .listeners
                .lock()
                .listeners_for(node, event.event_type());
            if !listeners.is_empty() {
                event.set_current_target(Some(node));
                for listener in listeners {
                    listener(event);
                }
            }
            if event.propagation_stopped() {
                break;
            }
        }
        event.set_current_target(None);

        tracing::trace!(
            target: targets::EVENT,
            target_node = ?event.target(),
            canceled = event.default_prevented(),
            "dispatched event"
        );
        !event.default_prevented()
    }

    /// Fire a fresh event of `event_type` at `target`.
    pub fn fire(&self, target: NodeId, event_type: EventType) -> bool {
        self.dispatch_event(&Event::new(event_type, target))
    }

    // =========================================================================
    // Microtasks
    // =========================================================================

    /// Queue a microtask.
    pub fn queue_microtask<F>(&self, task: F) -> MicrotaskId
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.microtasks.post(task)
    }

    /// Number of pending microtasks.
    pub fn pending_microtasks(&self) -> usize {
        self.inner.microtasks.pending_count()
    }

    /// Perform a microtask checkpoint. Returns the number of tasks run.
    pub fn run_microtasks(&self) -> usize {
        let _span = tracing::trace_span!(target: "umbra_core::microtask", "checkpoint").entered();
        self.inner.microtasks.run_until_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct Recorder {
        log: Mutex<Vec<String>>,
        associated: AtomicBool,
    }

    impl Recorder {
        fn associated() -> Self {
            let recorder = Self::default();
            recorder.associated.store(true, Ordering::SeqCst);
            recorder
        }

        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.log.lock())
        }
    }

    impl CustomElement for Recorder {
        fn observed_attributes(&self) -> &[&'static str] {
            &["value", "disabled"]
        }
        fn is_form_associated(&self) -> bool {
            self.associated.load(Ordering::SeqCst)
        }
        fn connected_callback(&self) {
            self.log.lock().push("connected".into());
        }
        fn disconnected_callback(&self) {
            self.log.lock().push("disconnected".into());
        }
        fn attribute_changed_callback(&self, name: &str, old: Option<&str>, new: Option<&str>) {
            self.log.lock().push(format!("{name}: {old:?} -> {new:?}"));
        }
        fn form_disabled_callback(&self, disabled: bool) {
            self.log.lock().push(format!("disabled {disabled}"));
        }
    }

    #[test]
    fn test_define_replays_attributes_then_connects() {
        let doc = Document::new();
        let host = doc.create_element("x-field");
        doc.set_attribute(host, "value", "a").unwrap();
        doc.set_attribute(host, "title", "ignored").unwrap();
        doc.append_child(doc.root(), host).unwrap();

        let element = Arc::new(Recorder::default());
        doc.define_element(host, &element).unwrap();
        assert_eq!(
            element.take(),
            vec!["value: None -> Some(\"a\")".to_string(), "connected".to_string()]
        );
        assert_eq!(
            doc.define_element(host, &element),
            Err(DomError::AlreadyDefined(host))
        );
    }

    #[test]
    fn test_connected_and_disconnected_callbacks() {
        let doc = Document::new();
        let wrapper = doc.create_element("div");
        let host = doc.create_element("x-field");
        doc.append_child(wrapper, host).unwrap();
        let element = Arc::new(Recorder::default());
        doc.define_element(host, &element).unwrap();
        assert!(element.take().is_empty());

        doc.append_child(doc.root(), wrapper).unwrap();
        assert_eq!(element.take(), vec!["connected"]);

        doc.remove(wrapper).unwrap();
        assert_eq!(element.take(), vec!["disconnected"]);
    }

    #[test]
    fn test_attribute_changes_only_for_observed_names() {
        let doc = Document::new();
        let host = doc.create_element("x-field");
        let element = Arc::new(Recorder::default());
        doc.define_element(host, &element).unwrap();

        doc.set_attribute(host, "value", "1").unwrap();
        doc.set_attribute(host, "title", "t").unwrap();
        doc.remove_attribute(host, "value").unwrap();
        doc.remove_attribute(host, "value").unwrap();

        assert_eq!(
            element.take(),
            vec![
                "value: None -> Some(\"1\")".to_string(),
                "value: Some(\"1\") -> None".to_string()
            ]
        );
    }

    #[test]
    fn test_fieldset_disabled_reaches_associated_descendants() {
        let doc = Document::new();
        let fieldset = doc.create_element("fieldset");
        let host = doc.create_element("x-field");
        doc.append_child(doc.root(), fieldset).unwrap();
        doc.append_child(fieldset, host).unwrap();
        let element = Arc::new(Recorder::associated());
        doc.define_element(host, &element).unwrap();
        element.take();

        doc.toggle_attribute(fieldset, "disabled", true).unwrap();
        assert_eq!(element.take(), vec!["disabled true"]);

        // Already disabled by the fieldset; own attribute changes nothing
        doc.toggle_attribute(host, "disabled", true).unwrap();
        assert_eq!(element.take(), vec!["disabled: None -> Some(\"\")"]);

        doc.toggle_attribute(fieldset, "disabled", false).unwrap();
        assert!(element.take().is_empty());

        doc.toggle_attribute(host, "disabled", false).unwrap();
        assert_eq!(
            element.take(),
            vec!["disabled: Some(\"\") -> None".to_string(), "disabled false".to_string()]
        );
    }

    #[test]
    fn test_dispatch_bubbles_out_of_shadow_tree() {
        let doc = Document::new();
        let host = doc.create_element("x-field");
        doc.append_child(doc.root(), host).unwrap();
        let shadow = doc.attach_shadow(host).unwrap();
        let input = doc.create_element("input");
        doc.append_child(shadow, input).unwrap();

        let log = Arc::new(Mutex::new(Vec::new()));
        for (node, label) in [(input, "input"), (host, "host")] {
            let log = log.clone();
            doc.add_event_listener(node, EventType::Input, move |event| {
                log.lock().push((label, event.current_target()));
            });
        }

        assert!(doc.fire(input, EventType::Input));
        assert_eq!(
            *log.lock(),
            vec![("input", Some(input)), ("host", Some(host))]
        );
    }

    #[test]
    fn test_dispatch_cancel_and_stop() {
        let doc = Document::new();
        let form = doc.create_element("form");
        let button = doc.create_element("button");
        doc.append_child(doc.root(), form).unwrap();
        doc.append_child(form, button).unwrap();

        let reached_form = Arc::new(AtomicBool::new(false));
        let flag = reached_form.clone();
        doc.add_event_listener(form, EventType::Click, move |_| flag.store(true, Ordering::SeqCst));
        let id = doc.add_event_listener(button, EventType::Click, |event| {
            event.prevent_default();
            event.stop_propagation();
        });

        assert!(!doc.fire(button, EventType::Click));
        assert!(!reached_form.load(Ordering::SeqCst));

        assert!(doc.remove_event_listener(id));
        assert!(doc.fire(button, EventType::Click));
        assert!(reached_form.load(Ordering::SeqCst));
    }

    #[test]
    fn test_listener_may_reenter_document() {
        let doc = Document::new();
        let input = doc.create_element("input");
        doc.append_child(doc.root(), input).unwrap();

        let weak = doc.downgrade();
        doc.add_event_listener(input, EventType::Change, move |event| {
            if let Some(doc) = weak.upgrade() {
                doc.set_attribute(event.target(), "data-seen", "1").unwrap();
                doc.fire(event.target(), EventType::Input);
            }
        });
        doc.fire(input, EventType::Change);
        assert_eq!(doc.get_attribute(input, "data-seen").as_deref(), Some("1"));
    }

    #[test]
    fn test_native_radio_check_unchecks_group() {
        let doc = Document::new();
        let a = doc.create_element("input");
        let b = doc.create_element("input");
        for radio in [a, b] {
            doc.set_attribute(radio, "type", "radio").unwrap();
            doc.set_attribute(radio, "name", "size").unwrap();
            doc.append_child(doc.root(), radio).unwrap();
        }
        doc.set_control_checked(a, true).unwrap();
        doc.set_control_checked(b, true).unwrap();
        assert_eq!(doc.control_checked(a), Some(false));
        assert_eq!(doc.control_checked(b), Some(true));
    }

    #[test]
    fn test_internals_single_attachment() {
        let doc = Document::new();
        let host = doc.create_element("x-field");
        let internals = doc.attach_internals(host).unwrap();
        assert_eq!(
            doc.attach_internals(host).err(),
            Some(DomError::InternalsAlreadyAttached(host))
        );
        assert!(doc.internals(host).is_some());
        drop(internals);
        assert!(doc.internals(host).is_none());
        assert!(doc.attach_internals(host).is_ok());
    }

    #[test]
    fn test_defined_element_outlives_handle() {
        let doc = Document::new();
        let host = doc.create_element("x-field");
        doc.append_child(doc.root(), host).unwrap();
        {
            let element = Arc::new(Recorder::associated());
            doc.define_element(host, &element).unwrap();
        }
        assert!(doc.is_form_associated(host));

        doc.remove(host).unwrap();
        doc.append_child(doc.root(), host).unwrap();
        let element = doc.custom_element(host).unwrap();
        let recorder = crate::custom::element_cast::<Recorder>(element.as_ref()).unwrap();
        assert_eq!(recorder.take(), vec!["connected", "disconnected", "connected"]);
    }

    #[test]
    fn test_destroy_releases_bindings() {
        let doc = Document::new();
        let host = doc.create_element("x-field");
        doc.append_child(doc.root(), host).unwrap();
        let element = Arc::new(Recorder::default());
        doc.define_element(host, &element).unwrap();
        doc.add_event_listener(host, EventType::Click, |_| {});
        element.take();

        doc.destroy(host).unwrap();
        assert_eq!(element.take(), vec!["disconnected"]);
        assert!(doc.custom_element(host).is_none());
        assert!(doc.inner.listeners.lock().is_empty());
    }
}
