//! Locating and watching the native control inside a shadow tree.
//!
//! An [`InputBindingObserver`] keeps a live reference to the one native
//! control a descriptor binds to. The control is looked up in the shadow
//! root of the host with a [`BindingSelector`] derived from the control
//! kind, and looked up again after every child-list mutation anywhere below
//! the host (shadow tree included). When the resolved control changes, the
//! `input`/`change` listeners move to the new control and
//! [`rebound`](InputBindingObserver::rebound) is emitted.
//!
//! A host without a shadow root simply has no binding until a later
//! mutation attaches one.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use umbra_core::logging::targets;
use umbra_core::{Document, EventType, ListenerId, MutationObserver, NodeId, NodeTree, Signal, WeakDocument};

use crate::descriptor::ControlKind;

/// Which native control a control kind binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingSelector {
    tag: &'static str,
    input_type: Option<&'static str>,
}

impl BindingSelector {
    /// The selector for `kind`; `None` for an unrecognized kind.
    ///
    /// `textarea` and `select` bind to their own tags, every other kind to an
    /// `<input>` whose `type` is the kind name. `text` also accepts an
    /// `<input>` without a `type` attribute.
    pub fn for_kind(kind: Option<ControlKind>) -> Option<Self> {
        let selector = match kind? {
            ControlKind::Textarea => Self {
                tag: "textarea",
                input_type: None,
            },
            ControlKind::Select => Self {
                tag: "select",
                input_type: None,
            },
            other => Self {
                tag: "input",
                input_type: Some(other.as_str()),
            },
        };
        Some(selector)
    }

    /// Whether `node` matches.
    pub fn matches(&self, tree: &NodeTree, node: NodeId) -> bool {
        if !tree.is_element(node, self.tag) {
            return false;
        }
        let Some(expected) = self.input_type else {
            return true;
        };
        match tree.attribute(node, "type") {
            Some(declared) => declared.eq_ignore_ascii_case(expected),
            None => expected == "text",
        }
    }

    /// The first match inside the shadow root of `host`.
    pub fn resolve(&self, tree: &NodeTree, host: NodeId) -> Option<NodeId> {
        let shadow = tree.shadow_root(host)?;
        tree.descendants(shadow, false)
            .into_iter()
            .find(|node| self.matches(tree, *node))
    }
}

#[derive(Default)]
struct BindingState {
    selector: Option<BindingSelector>,
    bound: Option<NodeId>,
    listeners: Vec<ListenerId>,
    observer: Option<MutationObserver>,
}

struct BindingShared {
    document: WeakDocument,
    host: NodeId,
    state: Mutex<BindingState>,
    rebound: Signal<Option<NodeId>>,
    input_event: Signal<(NodeId, EventType)>,
}

impl BindingShared {
    /// Resolve the binding again and rewire listeners if it moved.
    ///
    /// Returns whether the bound control changed.
    fn refresh(self: &Arc<Self>, emit: bool) -> bool {
        let Some(document) = self.document.upgrade() else {
            return false;
        };
        let selector = self.state.lock().selector;
        let resolved = selector.and_then(|s| document.with_tree(|tree| s.resolve(tree, self.host)));

        let stale = {
            let mut state = self.state.lock();
            if state.bound == resolved {
                return false;
            }
            state.bound = resolved;
            std::mem::take(&mut state.listeners)
        };
        for id in stale {
            document.remove_event_listener(id);
        }

        if let Some(node) = resolved {
            let listeners: Vec<ListenerId> = [EventType::Input, EventType::Change]
                .into_iter()
                .map(|event_type| {
                    let weak = Arc::downgrade(self);
                    document.add_event_listener(node, event_type, move |event| {
                        if let Some(shared) = weak.upgrade() {
                            shared.input_event.emit((event.target(), event.event_type()));
                        }
                    })
                })
                .collect();
            self.state.lock().listeners = listeners;
        }

        tracing::debug!(target: targets::BINDING, host = ?self.host, bound = ?resolved, "binding resolved");
        if emit {
            self.rebound.emit(resolved);
        }
        true
    }

    fn unwire(&self) {
        let (stale, observer) = {
            let mut state = self.state.lock();
            state.bound = None;
            (std::mem::take(&mut state.listeners), state.observer.take())
        };
        drop(observer);
        if let Some(document) = self.document.upgrade() {
            for id in stale {
                document.remove_event_listener(id);
            }
        }
    }
}

/// Tracks the native control bound to one host.
pub struct InputBindingObserver {
    shared: Arc<BindingShared>,
}

impl std::fmt::Debug for InputBindingObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("InputBindingObserver")
            .field("host", &self.shared.host)
            .field("selector", &state.selector)
            .field("bound", &state.bound)
            .field("connected", &state.observer.is_some())
            .finish()
    }
}

impl InputBindingObserver {
    /// Create an observer for `host`. Nothing is watched until
    /// [`connect`](Self::connect).
    pub fn new(document: &Document, host: NodeId) -> Self {
        Self {
            shared: Arc::new(BindingShared {
                document: document.downgrade(),
                host,
                state: Mutex::new(BindingState::default()),
                rebound: Signal::new(),
                input_event: Signal::new(),
            }),
        }
    }

    /// The host element.
    pub fn host(&self) -> NodeId {
        self.shared.host
    }

    /// The currently bound control.
    pub fn bound(&self) -> Option<NodeId> {
        self.shared.state.lock().bound
    }

    /// Whether the mutation observer is connected.
    pub fn is_connected(&self) -> bool {
        self.shared.state.lock().observer.is_some()
    }

    /// Emitted with the new binding whenever a mutation moves it.
    pub fn rebound(&self) -> &Signal<Option<NodeId>> {
        &self.shared.rebound
    }

    /// Emitted with the target and type of each `input`/`change` event of
    /// the bound control.
    pub fn input_event(&self) -> &Signal<(NodeId, EventType)> {
        &self.shared.input_event
    }

    /// Replace the selector and resolve again. Does not emit
    /// [`rebound`](Self::rebound).
    pub fn set_selector(&self, selector: Option<BindingSelector>) {
        self.shared.state.lock().selector = selector;
        if self.is_connected() {
            self.shared.refresh(false);
        }
    }

    /// Start watching the host subtree and resolve the binding.
    pub fn connect(&self) {
        let Some(document) = self.shared.document.upgrade() else {
            return;
        };
        if !self.is_connected() {
            let weak: Weak<BindingShared> = Arc::downgrade(&self.shared);
            let observer = MutationObserver::new(&document, move |records| {
                if let Some(shared) = weak.upgrade() {
                    tracing::trace!(target: targets::BINDING, host = ?shared.host, records = records.len(), "host subtree mutated");
                    shared.refresh(true);
                }
            });
            observer.observe(self.shared.host, true);
            self.shared.state.lock().observer = Some(observer);
        }
        self.shared.refresh(false);
    }

    /// Stop watching and unwire the bound control.
    pub fn disconnect(&self) {
        tracing::debug!(target: targets::BINDING, host = ?self.shared.host, "binding disconnected");
        self.shared.unwire();
    }
}

impl Drop for InputBindingObserver {
    fn drop(&mut self) {
        self.shared.unwire();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as PlMutex;

    fn host_with_shadow(doc: &Document) -> (NodeId, NodeId) {
        let host = doc.create_element("x-field");
        doc.append_child(doc.root(), host).unwrap();
        let shadow = doc.attach_shadow(host).unwrap();
        (host, shadow)
    }

    #[test]
    fn test_selector_matching() {
        let doc = Document::new();
        let (host, shadow) = host_with_shadow(&doc);
        let untyped = doc.create_element("input");
        let checkbox = doc.create_element("input");
        doc.set_attribute(checkbox, "type", "CHECKBOX").unwrap();
        doc.append_child(shadow, untyped).unwrap();
        doc.append_child(shadow, checkbox).unwrap();

        doc.with_tree(|tree| {
            let text = BindingSelector::for_kind(Some(ControlKind::Text)).unwrap();
            assert_eq!(text.resolve(tree, host), Some(untyped));
            let check = BindingSelector::for_kind(Some(ControlKind::Checkbox)).unwrap();
            assert_eq!(check.resolve(tree, host), Some(checkbox));
            let email = BindingSelector::for_kind(Some(ControlKind::Email)).unwrap();
            assert_eq!(email.resolve(tree, host), None);
        });
        assert!(BindingSelector::for_kind(None).is_none());
    }

    #[test]
    fn test_no_shadow_root_resolves_nothing() {
        let doc = Document::new();
        let host = doc.create_element("x-field");
        let selector = BindingSelector::for_kind(Some(ControlKind::Text)).unwrap();
        assert_eq!(doc.with_tree(|tree| selector.resolve(tree, host)), None);
    }

    #[test]
    fn test_rebinds_after_mutation() {
        let doc = Document::new();
        let (host, shadow) = host_with_shadow(&doc);
        let observer = InputBindingObserver::new(&doc, host);
        observer.set_selector(BindingSelector::for_kind(Some(ControlKind::Textarea)));
        observer.connect();
        assert_eq!(observer.bound(), None);

        let seen = Arc::new(PlMutex::new(Vec::new()));
        let seen_clone = seen.clone();
        observer.rebound().connect(move |bound| seen_clone.lock().push(*bound));

        let wrapper = doc.create_element("div");
        let textarea = doc.create_element("textarea");
        doc.append_child(shadow, wrapper).unwrap();
        doc.append_child(wrapper, textarea).unwrap();
        doc.run_microtasks();
        assert_eq!(observer.bound(), Some(textarea));
        assert_eq!(*seen.lock(), vec![Some(textarea)]);

        doc.remove(wrapper).unwrap();
        doc.run_microtasks();
        assert_eq!(observer.bound(), None);
        assert_eq!(*seen.lock(), vec![Some(textarea), None]);
    }

    #[test]
    fn test_late_shadow_root() {
        let doc = Document::new();
        let host = doc.create_element("x-field");
        doc.append_child(doc.root(), host).unwrap();
        let observer = InputBindingObserver::new(&doc, host);
        observer.set_selector(BindingSelector::for_kind(Some(ControlKind::Text)));
        observer.connect();

        let shadow = doc.attach_shadow(host).unwrap();
        let input = doc.create_element("input");
        doc.append_child(shadow, input).unwrap();
        doc.run_microtasks();
        assert_eq!(observer.bound(), Some(input));
    }

    #[test]
    fn test_forwards_input_events() {
        let doc = Document::new();
        let (host, shadow) = host_with_shadow(&doc);
        let input = doc.create_element("input");
        doc.append_child(shadow, input).unwrap();

        let observer = InputBindingObserver::new(&doc, host);
        observer.set_selector(BindingSelector::for_kind(Some(ControlKind::Text)));
        observer.connect();

        let events = Arc::new(PlMutex::new(Vec::new()));
        let events_clone = events.clone();
        observer
            .input_event()
            .connect(move |(node, event_type)| events_clone.lock().push((*node, *event_type)));

        doc.user_type(input, "hello").unwrap();
        assert_eq!(
            *events.lock(),
            vec![(input, EventType::Input), (input, EventType::Change)]
        );

        observer.disconnect();
        assert!(!observer.is_connected());
        doc.user_type(input, "again").unwrap();
        assert_eq!(events.lock().len(), 2);
    }

    #[test]
    fn test_selector_change_moves_listeners() {
        let doc = Document::new();
        let (host, shadow) = host_with_shadow(&doc);
        let text = doc.create_element("input");
        let area = doc.create_element("textarea");
        doc.append_child(shadow, text).unwrap();
        doc.append_child(shadow, area).unwrap();

        let observer = InputBindingObserver::new(&doc, host);
        observer.set_selector(BindingSelector::for_kind(Some(ControlKind::Text)));
        observer.connect();
        assert_eq!(observer.bound(), Some(text));

        observer.set_selector(BindingSelector::for_kind(Some(ControlKind::Textarea)));
        assert_eq!(observer.bound(), Some(area));

        let count = Arc::new(PlMutex::new(0));
        let count_clone = count.clone();
        observer.input_event().connect(move |_| *count_clone.lock() += 1);
        doc.fire(text, EventType::Input);
        assert_eq!(*count.lock(), 0);
        doc.fire(area, EventType::Input);
        assert_eq!(*count.lock(), 1);
    }
}
