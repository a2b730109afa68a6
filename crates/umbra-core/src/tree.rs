//! Node tree for the umbra platform model.
//!
//! Provides the arena the rest of the platform is built on:
//! - Stable node identifiers via slotmap storage
//! - Parent-child relationships and shadow roots attached to hosts
//! - Attributes and native control state (`input`, `select`, `textarea`, `button`)
//! - Tree queries: form ownership, name lookup, listed elements
//!
//! [`NodeTree`] is plain data with `&mut self` mutators. It never runs user
//! callbacks; [`crate::Document`] wraps it in a lock and layers events,
//! mutation records and custom element reactions on top.
//!
//! # Example
//!
//! ```
//! use umbra_core::tree::NodeTree;
//!
//! let mut tree = NodeTree::new();
//! let form = tree.create_element("form");
//! let input = tree.create_element("input");
//! tree.append_child(tree.root(), form).unwrap();
//! tree.append_child(form, input).unwrap();
//!
//! assert_eq!(tree.form_owner(input), Some(form));
//! ```

use slotmap::{new_key_type, SlotMap};

use crate::error::{DomError, DomResult};
use crate::validity::ValidityFlags;

new_key_type! {
    /// A unique identifier for a node in a [`NodeTree`].
    ///
    /// Ids are cheap, non-owning handles. They become stale when the node is
    /// destroyed; lookups through a stale id report [`DomError::InvalidNode`]
    /// or `None` instead of panicking.
    pub struct NodeId;
}

impl NodeId {
    /// Convert the id to a raw u64, for logging and interop.
    #[inline]
    pub fn as_raw(self) -> u64 {
        use slotmap::Key;
        self.data().as_ffi()
    }
}

/// Tags that carry native control state.
const CONTROL_TAGS: [&str; 4] = ["input", "select", "textarea", "button"];

/// Input types the platform recognises; anything else falls back to `text`.
const INPUT_TYPES: [&str; 22] = [
    "text",
    "password",
    "email",
    "tel",
    "url",
    "search",
    "checkbox",
    "radio",
    "button",
    "submit",
    "reset",
    "image",
    "hidden",
    "file",
    "color",
    "number",
    "range",
    "time",
    "date",
    "datetime-local",
    "month",
    "week",
];

/// The kind of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document root.
    Document,
    /// An element with a lower-cased tag name.
    Element {
        /// The tag name.
        tag: String,
    },
    /// A shadow root attached to `host`.
    ShadowRoot {
        /// The element hosting this shadow root.
        host: NodeId,
    },
    /// A text node.
    Text {
        /// The character data.
        data: String,
    },
}

/// Live state of a native form control.
///
/// Until the user (or a script) changes them, value and checkedness follow the
/// `value` and `checked` content attributes.
#[derive(Debug, Clone, Default)]
struct ControlState {
    /// The dirty value, if any.
    value: Option<String>,
    /// The dirty checkedness, if any.
    checked: Option<bool>,
    /// Validity forced by the embedder, replacing the computed native validity.
    validity_override: Option<(ValidityFlags, String)>,
}

/// Internal data stored for each node.
#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Attributes in insertion order.
    attributes: Vec<(String, String)>,
    shadow_root: Option<NodeId>,
    control: Option<ControlState>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            attributes: Vec::new(),
            shadow_root: None,
            control: None,
        }
    }
}

/// Arena of nodes rooted at a document node.
pub struct NodeTree {
    nodes: SlotMap<NodeId, NodeData>,
    root: NodeId,
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTree {
    /// Create a tree containing only the document node.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(NodeData::new(NodeKind::Document));
        Self { nodes, root }
    }

    /// The document node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Whether the id refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of live nodes, the document included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn node(&self, id: NodeId) -> DomResult<&NodeData> {
        self.nodes.get(id).ok_or(DomError::InvalidNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> DomResult<&mut NodeData> {
        self.nodes.get_mut(id).ok_or(DomError::InvalidNode(id))
    }

    fn element_mut(&mut self, id: NodeId) -> DomResult<&mut NodeData> {
        let node = self.node_mut(id)?;
        if matches!(node.kind, NodeKind::Element { .. }) {
            Ok(node)
        } else {
            Err(DomError::NotAnElement(id))
        }
    }

    // =========================================================================
    // Creation and destruction
    // =========================================================================

    /// Create a detached element. The tag is lower-cased.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let tag = tag.to_ascii_lowercase();
        let mut data = NodeData::new(NodeKind::Element { tag: tag.clone() });
        if CONTROL_TAGS.contains(&tag.as_str()) {
            data.control = Some(ControlState::default());
        }
        self.nodes.insert(data)
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, data: &str) -> NodeId {
        self.nodes.insert(NodeData::new(NodeKind::Text {
            data: data.to_string(),
        }))
    }

    /// Detach a node and drop it together with its subtree and shadow trees.
    ///
    /// Returns every destroyed id. The document node cannot be destroyed.
    pub fn destroy(&mut self, id: NodeId) -> DomResult<Vec<NodeId>> {
        if id == self.root {
            return Err(DomError::HierarchyRequest {
                parent: self.root,
                child: id,
            });
        }
        if let Some(parent) = self.node(id)?.parent {
            self.remove_child(parent, id)?;
        }
        let mut doomed = vec![id];
        doomed.extend(self.descendants(id, true));
        for node in &doomed {
            self.nodes.remove(*node);
        }
        Ok(doomed)
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// The node kind.
    pub fn kind(&self, id: NodeId) -> DomResult<&NodeKind> {
        Ok(&self.node(id)?.kind)
    }

    /// The tag name, if the node is an element.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(id)?.kind {
            NodeKind::Element { tag } => Some(tag),
            _ => None,
        }
    }

    /// Whether the node is an element with the given tag.
    pub fn is_element(&self, id: NodeId, tag: &str) -> bool {
        self.tag_name(id) == Some(tag)
    }

    /// The parent node (not crossing shadow boundaries).
    pub fn parent(&self, id: NodeId) -> DomResult<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    /// The children in order.
    pub fn children(&self, id: NodeId) -> DomResult<&[NodeId]> {
        Ok(&self.node(id)?.children)
    }

    /// The parent in the composed tree: a shadow root's parent is its host.
    pub fn composed_parent(&self, id: NodeId) -> Option<NodeId> {
        let node = self.nodes.get(id)?;
        match node.kind {
            NodeKind::ShadowRoot { host } => Some(host),
            _ => node.parent,
        }
    }

    /// The root of the tree containing `id`: the document, a shadow root, or
    /// the top of a detached subtree.
    pub fn tree_root(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.nodes.get(current).and_then(|n| n.parent) {
            current = parent;
        }
        current
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    ///
    /// With `composed`, the walk continues from shadow roots to their hosts.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId, composed: bool) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = if composed {
                self.composed_parent(id)
            } else {
                self.nodes.get(id).and_then(|n| n.parent)
            };
        }
        false
    }

    /// Whether the node is in the document (through shadow hosts if needed).
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(id) && self.is_inclusive_ancestor(self.root, id, true)
    }

    /// Insert `child` into `parent` before `reference` (or at the end).
    ///
    /// A child that already has a parent is moved; its previous parent is
    /// returned.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<Option<NodeId>> {
        let parent_kind = &self.node(parent)?.kind;
        if matches!(parent_kind, NodeKind::Text { .. }) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        match self.node(child)?.kind {
            NodeKind::Document | NodeKind::ShadowRoot { .. } => {
                return Err(DomError::HierarchyRequest { parent, child });
            }
            _ => {}
        }
        if self.is_inclusive_ancestor(child, parent, true) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        if let Some(reference) = reference {
            if reference == child {
                return Ok(Some(parent));
            }
            if self.node(reference)?.parent != Some(parent) {
                return Err(DomError::NotAChild { parent, reference });
            }
        }

        let previous_parent = self.node(child)?.parent;
        if let Some(old) = previous_parent {
            self.node_mut(old)?.children.retain(|c| *c != child);
        }

        let siblings = &mut self.node_mut(parent)?.children;
        let index = reference
            .and_then(|r| siblings.iter().position(|c| *c == r))
            .unwrap_or(siblings.len());
        siblings.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(previous_parent)
    }

    /// Append `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<Option<NodeId>> {
        self.insert_before(parent, child, None)
    }

    /// Detach `child` from `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        if self.node(child)?.parent != Some(parent) {
            return Err(DomError::NotAChild {
                parent,
                reference: child,
            });
        }
        self.node_mut(parent)?.children.retain(|c| *c != child);
        self.node_mut(child)?.parent = None;
        Ok(())
    }

    /// Attach an open shadow root to `host`.
    pub fn attach_shadow(&mut self, host: NodeId) -> DomResult<NodeId> {
        let data = self.element_mut(host)?;
        if data.shadow_root.is_some() {
            return Err(DomError::ShadowRootExists(host));
        }
        let root = self.nodes.insert(NodeData::new(NodeKind::ShadowRoot { host }));
        self.element_mut(host)?.shadow_root = Some(root);
        Ok(root)
    }

    /// The shadow root hosted by `host`, if any.
    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.nodes.get(host)?.shadow_root
    }

    /// Descendants of `id` in tree order, excluding `id` itself.
    ///
    /// With `into_shadow`, a host's shadow tree is visited before its children.
    pub fn descendants(&self, id: NodeId, into_shadow: bool) -> Vec<NodeId> {
        let mut result = Vec::new();
        let Some(start) = self.nodes.get(id) else {
            return result;
        };
        let mut stack: Vec<NodeId> = start.children.iter().rev().copied().collect();
        if into_shadow && let Some(shadow) = start.shadow_root {
            stack.push(shadow);
        }
        while let Some(current) = stack.pop() {
            result.push(current);
            if let Some(node) = self.nodes.get(current) {
                stack.extend(node.children.iter().rev());
                if into_shadow && let Some(shadow) = node.shadow_root {
                    stack.push(shadow);
                }
            }
        }
        result
    }

    /// Concatenated text of all light-tree text descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id, false)
            .into_iter()
            .filter_map(|n| match &self.nodes.get(n)?.kind {
                NodeKind::Text { data } => Some(data.as_str()),
                _ => None,
            })
            .collect()
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// The value of an attribute.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes
            .get(id)?
            .attributes
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether an attribute is present.
    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    /// All attributes in insertion order.
    pub fn attributes(&self, id: NodeId) -> DomResult<&[(String, String)]> {
        Ok(&self.node(id)?.attributes)
    }

    /// Set an attribute, returning the previous value.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<Option<String>> {
        let name = name.to_ascii_lowercase();
        let data = self.element_mut(id)?;
        if let Some(slot) = data.attributes.iter_mut().find(|(n, _)| *n == name) {
            Ok(Some(std::mem::replace(&mut slot.1, value.to_string())))
        } else {
            data.attributes.push((name, value.to_string()));
            Ok(None)
        }
    }

    /// Remove an attribute, returning the previous value.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> DomResult<Option<String>> {
        let data = self.element_mut(id)?;
        let position = data
            .attributes
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name));
        Ok(position.map(|index| data.attributes.remove(index).1))
    }

    // =========================================================================
    // Forms
    // =========================================================================

    /// The first element in the light tree of `scope` whose `id` is `value`.
    pub fn element_by_id(&self, scope: NodeId, value: &str) -> Option<NodeId> {
        self.descendants(scope, false)
            .into_iter()
            .find(|n| self.attribute(*n, "id") == Some(value))
    }

    /// The form owner of an element.
    ///
    /// A `form` attribute names the owner by id within the element's own tree;
    /// otherwise the nearest ancestor `<form>` owns it. The walk stops at a
    /// shadow root: controls inside a shadow tree never see an outer form.
    pub fn form_owner(&self, id: NodeId) -> Option<NodeId> {
        if self.tag_name(id)? == "form" {
            return None;
        }
        if let Some(form_id) = self.attribute(id, "form") {
            let scope = self.tree_root(id);
            return self
                .element_by_id(scope, form_id)
                .filter(|f| self.is_element(*f, "form"));
        }
        let mut current = self.nodes.get(id)?.parent;
        while let Some(node) = current {
            if self.is_element(node, "form") {
                return Some(node);
            }
            current = self.nodes.get(node)?.parent;
        }
        None
    }

    /// Elements in the light tree of `scope` whose `name` attribute is `name`.
    pub fn query_by_name(&self, scope: NodeId, name: &str) -> Vec<NodeId> {
        self.descendants(scope, false)
            .into_iter()
            .filter(|n| self.attribute(*n, "name") == Some(name))
            .collect()
    }

    /// Whether the element is a native listed control.
    pub fn is_native_control(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.control.is_some())
    }

    /// Listed elements owned by `form`, in tree order.
    ///
    /// `is_form_associated` identifies custom elements that take part in forms.
    pub fn associated_elements(
        &self,
        form: NodeId,
        is_form_associated: impl Fn(NodeId) -> bool,
    ) -> Vec<NodeId> {
        let scope = self.tree_root(form);
        self.descendants(scope, false)
            .into_iter()
            .filter(|n| self.is_native_control(*n) || is_form_associated(*n))
            .filter(|n| self.form_owner(*n) == Some(form))
            .collect()
    }

    /// Whether an ancestor `<fieldset disabled>` disables the element.
    pub fn disabled_by_fieldset(&self, id: NodeId) -> bool {
        let mut current = self.nodes.get(id).and_then(|n| n.parent);
        while let Some(node) = current {
            if self.is_element(node, "fieldset") && self.has_attribute(node, "disabled") {
                return true;
            }
            current = self.nodes.get(node).and_then(|n| n.parent);
        }
        false
    }

    /// Whether the element is disabled by its own attribute or a fieldset.
    pub fn is_disabled(&self, id: NodeId) -> bool {
        self.has_attribute(id, "disabled") || self.disabled_by_fieldset(id)
    }

    // =========================================================================
    // Native control state
    // =========================================================================

    /// The normalized `type` of an `<input>`; `None` for other nodes.
    pub fn input_type(&self, id: NodeId) -> Option<&'static str> {
        if !self.is_element(id, "input") {
            return None;
        }
        let declared = self.attribute(id, "type").unwrap_or("text").to_ascii_lowercase();
        Some(
            INPUT_TYPES
                .iter()
                .copied()
                .find(|t| *t == declared)
                .unwrap_or("text"),
        )
    }

    /// Whether the control carries checkedness (checkbox or radio input).
    pub fn is_checkable(&self, id: NodeId) -> bool {
        matches!(self.input_type(id), Some("checkbox" | "radio"))
    }

    /// The current value of a native control.
    pub fn control_value(&self, id: NodeId) -> Option<String> {
        let node = self.nodes.get(id)?;
        let control = node.control.as_ref()?;
        if let Some(value) = &control.value {
            return Some(value.clone());
        }
        let tag = self.tag_name(id)?;
        let value = match tag {
            "textarea" => self.text_content(id),
            "select" => self.selected_option_value(id).unwrap_or_default(),
            "input" if self.is_checkable(id) => {
                self.attribute(id, "value").unwrap_or("on").to_string()
            }
            _ => self.attribute(id, "value").unwrap_or_default().to_string(),
        };
        Some(value)
    }

    fn selected_option_value(&self, select: NodeId) -> Option<String> {
        let options: Vec<NodeId> = self
            .descendants(select, false)
            .into_iter()
            .filter(|n| self.is_element(*n, "option"))
            .collect();
        let chosen = options
            .iter()
            .copied()
            .find(|o| self.has_attribute(*o, "selected"))
            .or_else(|| options.first().copied())?;
        Some(
            self.attribute(chosen, "value")
                .map(str::to_string)
                .unwrap_or_else(|| self.text_content(chosen)),
        )
    }

    /// Set the value of a native control, marking it dirty.
    pub fn set_control_value(&mut self, id: NodeId, value: &str) -> DomResult<()> {
        let node = self.node_mut(id)?;
        let control = node.control.as_mut().ok_or(DomError::NotAnElement(id))?;
        control.value = Some(value.to_string());
        Ok(())
    }

    /// The checkedness of a checkbox or radio input.
    pub fn control_checked(&self, id: NodeId) -> Option<bool> {
        if !self.is_checkable(id) {
            return None;
        }
        let control = self.nodes.get(id)?.control.as_ref()?;
        Some(control.checked.unwrap_or_else(|| self.has_attribute(id, "checked")))
    }

    /// Set the checkedness of a checkbox or radio input, marking it dirty.
    ///
    /// Inert for other controls.
    pub fn set_control_checked(&mut self, id: NodeId, checked: bool) -> DomResult<()> {
        if !self.is_checkable(id) {
            return Ok(());
        }
        let node = self.node_mut(id)?;
        if let Some(control) = node.control.as_mut() {
            control.checked = Some(checked);
        }
        Ok(())
    }

    /// Return a native control to its default value and checkedness.
    pub fn reset_control(&mut self, id: NodeId) -> DomResult<()> {
        let node = self.node_mut(id)?;
        if let Some(control) = node.control.as_mut() {
            control.value = None;
            control.checked = None;
        }
        Ok(())
    }

    /// Force the native validity of a control, or clear the override.
    pub fn set_native_validity(
        &mut self,
        id: NodeId,
        validity: Option<(ValidityFlags, String)>,
    ) -> DomResult<()> {
        let node = self.node_mut(id)?;
        let control = node.control.as_mut().ok_or(DomError::NotAnElement(id))?;
        control.validity_override = validity;
        Ok(())
    }

    /// The native validity of a control and its message.
    ///
    /// Covers `valueMissing` for `required` controls and `typeMismatch` for
    /// email and url inputs. Disabled controls are barred from validation and
    /// always valid.
    pub fn native_validity(&self, id: NodeId) -> Option<(ValidityFlags, String)> {
        let control = self.nodes.get(id)?.control.as_ref()?;
        if let Some(forced) = &control.validity_override {
            return Some(forced.clone());
        }
        let mut flags = ValidityFlags::default();
        if self.is_disabled(id) || self.is_element(id, "button") {
            return Some((flags, String::new()));
        }
        let input_type = self.input_type(id);
        if matches!(
            input_type,
            Some("button" | "submit" | "reset" | "image" | "hidden")
        ) {
            return Some((flags, String::new()));
        }

        let value = self.control_value(id).unwrap_or_default();
        let mut message = String::new();
        if self.has_attribute(id, "required") {
            let missing = match input_type {
                Some("checkbox") => self.control_checked(id) == Some(false),
                Some("radio") => !self.radio_group_has_checked(id),
                _ => value.is_empty(),
            };
            if missing {
                flags.value_missing = true;
                message = "Please fill out this field.".to_string();
            }
        }
        if !value.is_empty() && !flags.value_missing {
            match input_type {
                Some("email") if !is_simple_email(&value) => {
                    flags.type_mismatch = true;
                    message = format!("Please include an '@' in the email address. '{value}' is missing an '@'.");
                }
                Some("url") if !is_url_like(&value) => {
                    flags.type_mismatch = true;
                    message = "Please enter a URL.".to_string();
                }
                _ => {}
            }
        }
        Some((flags, message))
    }

    /// Native radio inputs sharing the group of `id` (same name and form owner).
    pub fn native_radio_group(&self, id: NodeId) -> Vec<NodeId> {
        let Some(name) = self.attribute(id, "name").filter(|n| !n.is_empty()) else {
            return vec![id];
        };
        let owner = self.form_owner(id);
        let scope = owner.unwrap_or_else(|| self.tree_root(id));
        let mut group: Vec<NodeId> = self
            .query_by_name(scope, name)
            .into_iter()
            .filter(|n| self.input_type(*n) == Some("radio"))
            .filter(|n| self.form_owner(*n) == owner)
            .collect();
        if !group.contains(&id) {
            group.push(id);
        }
        group
    }

    fn radio_group_has_checked(&self, id: NodeId) -> bool {
        self.native_radio_group(id)
            .into_iter()
            .any(|n| self.control_checked(n) == Some(true))
    }
}

fn is_simple_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
}

fn is_url_like(value: &str) -> bool {
    let Some((scheme, rest)) = value.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        && !rest.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with_form() -> (NodeTree, NodeId) {
        let mut tree = NodeTree::new();
        let form = tree.create_element("FORM");
        let root = tree.root();
        tree.append_child(root, form).unwrap();
        (tree, form)
    }

    #[test]
    fn test_create_and_append() {
        let (mut tree, form) = tree_with_form();
        let input = tree.create_element("input");
        assert!(!tree.is_connected(input));
        tree.append_child(form, input).unwrap();
        assert!(tree.is_connected(input));
        assert_eq!(tree.parent(input).unwrap(), Some(form));
        assert_eq!(tree.tag_name(form), Some("form"));
    }

    #[test]
    fn test_insert_before_orders_children() {
        let mut tree = NodeTree::new();
        let parent = tree.create_element("div");
        let a = tree.create_element("span");
        let b = tree.create_element("span");
        let c = tree.create_element("span");
        tree.append_child(parent, a).unwrap();
        tree.append_child(parent, c).unwrap();
        tree.insert_before(parent, b, Some(c)).unwrap();
        assert_eq!(tree.children(parent).unwrap(), &[a, b, c]);
    }

    #[test]
    fn test_cycle_rejected() {
        let mut tree = NodeTree::new();
        let outer = tree.create_element("div");
        let inner = tree.create_element("div");
        tree.append_child(outer, inner).unwrap();
        assert_eq!(
            tree.append_child(inner, outer),
            Err(DomError::HierarchyRequest {
                parent: inner,
                child: outer
            })
        );
    }

    #[test]
    fn test_cycle_through_shadow_rejected() {
        let mut tree = NodeTree::new();
        let host = tree.create_element("x-host");
        let shadow = tree.attach_shadow(host).unwrap();
        assert!(tree.append_child(shadow, host).is_err());
    }

    #[test]
    fn test_shadow_root_connectivity() {
        let mut tree = NodeTree::new();
        let host = tree.create_element("x-field");
        let root = tree.root();
        tree.append_child(root, host).unwrap();
        let shadow = tree.attach_shadow(host).unwrap();
        let input = tree.create_element("input");
        tree.append_child(shadow, input).unwrap();

        assert!(tree.is_connected(input));
        assert_eq!(tree.composed_parent(shadow), Some(host));
        assert_eq!(tree.attach_shadow(host), Err(DomError::ShadowRootExists(host)));
        assert!(!tree.descendants(host, false).contains(&input));
        assert!(tree.descendants(host, true).contains(&input));
    }

    #[test]
    fn test_form_owner_stops_at_shadow_root() {
        let (mut tree, form) = tree_with_form();
        let host = tree.create_element("x-field");
        tree.append_child(form, host).unwrap();
        let shadow = tree.attach_shadow(host).unwrap();
        let input = tree.create_element("input");
        tree.append_child(shadow, input).unwrap();

        assert_eq!(tree.form_owner(host), Some(form));
        assert_eq!(tree.form_owner(input), None);
    }

    #[test]
    fn test_form_attribute_owner() {
        let (mut tree, form) = tree_with_form();
        tree.set_attribute(form, "id", "signup").unwrap();
        let input = tree.create_element("input");
        let root = tree.root();
        tree.append_child(root, input).unwrap();
        tree.set_attribute(input, "form", "signup").unwrap();
        assert_eq!(tree.form_owner(input), Some(form));

        tree.set_attribute(input, "form", "missing").unwrap();
        assert_eq!(tree.form_owner(input), None);
    }

    #[test]
    fn test_attributes() {
        let mut tree = NodeTree::new();
        let el = tree.create_element("input");
        assert_eq!(tree.set_attribute(el, "Value", "a").unwrap(), None);
        assert_eq!(tree.set_attribute(el, "value", "b").unwrap(), Some("a".into()));
        assert_eq!(tree.attribute(el, "VALUE"), Some("b"));
        assert_eq!(tree.remove_attribute(el, "value").unwrap(), Some("b".into()));
        assert!(!tree.has_attribute(el, "value"));

        let text = tree.create_text("hi");
        assert_eq!(
            tree.set_attribute(text, "a", "b"),
            Err(DomError::NotAnElement(text))
        );
    }

    #[test]
    fn test_control_value_defaults() {
        let mut tree = NodeTree::new();
        let input = tree.create_element("input");
        tree.set_attribute(input, "value", "default").unwrap();
        assert_eq!(tree.control_value(input).as_deref(), Some("default"));
        tree.set_control_value(input, "typed").unwrap();
        assert_eq!(tree.control_value(input).as_deref(), Some("typed"));
        tree.reset_control(input).unwrap();
        assert_eq!(tree.control_value(input).as_deref(), Some("default"));

        let checkbox = tree.create_element("input");
        tree.set_attribute(checkbox, "type", "checkbox").unwrap();
        assert_eq!(tree.control_value(checkbox).as_deref(), Some("on"));
        assert_eq!(tree.control_checked(checkbox), Some(false));

        let div = tree.create_element("div");
        assert_eq!(tree.control_value(div), None);
    }

    #[test]
    fn test_select_value_follows_options() {
        let mut tree = NodeTree::new();
        let select = tree.create_element("select");
        let first = tree.create_element("option");
        let second = tree.create_element("option");
        let label = tree.create_text("Second");
        tree.set_attribute(first, "value", "one").unwrap();
        tree.append_child(second, label).unwrap();
        tree.append_child(select, first).unwrap();
        tree.append_child(select, second).unwrap();

        assert_eq!(tree.control_value(select).as_deref(), Some("one"));
        tree.set_attribute(second, "selected", "").unwrap();
        assert_eq!(tree.control_value(select).as_deref(), Some("Second"));
    }

    #[test]
    fn test_unknown_input_type_is_text() {
        let mut tree = NodeTree::new();
        let input = tree.create_element("input");
        assert_eq!(tree.input_type(input), Some("text"));
        tree.set_attribute(input, "type", "DATETIME-LOCAL").unwrap();
        assert_eq!(tree.input_type(input), Some("datetime-local"));
        tree.set_attribute(input, "type", "bogus").unwrap();
        assert_eq!(tree.input_type(input), Some("text"));
    }

    #[test]
    fn test_native_validity() {
        let mut tree = NodeTree::new();
        let email = tree.create_element("input");
        tree.set_attribute(email, "type", "email").unwrap();
        tree.set_attribute(email, "required", "").unwrap();

        let (flags, _) = tree.native_validity(email).unwrap();
        assert!(flags.value_missing);

        tree.set_control_value(email, "nobody").unwrap();
        let (flags, message) = tree.native_validity(email).unwrap();
        assert!(flags.type_mismatch);
        assert!(message.contains("'@'"));

        tree.set_control_value(email, "a@b.example").unwrap();
        assert!(tree.native_validity(email).unwrap().0.valid());

        tree.set_attribute(email, "disabled", "").unwrap();
        tree.set_control_value(email, "").unwrap();
        assert!(tree.native_validity(email).unwrap().0.valid());
    }

    #[test]
    fn test_native_validity_override() {
        let mut tree = NodeTree::new();
        let input = tree.create_element("input");
        let forced = ValidityFlags {
            bad_input: true,
            ..Default::default()
        };
        tree.set_native_validity(input, Some((forced, "bad".into()))).unwrap();
        assert_eq!(tree.native_validity(input), Some((forced, "bad".to_string())));
        tree.set_native_validity(input, None).unwrap();
        assert!(tree.native_validity(input).unwrap().0.valid());
    }

    #[test]
    fn test_fieldset_disables_descendants() {
        let (mut tree, form) = tree_with_form();
        let fieldset = tree.create_element("fieldset");
        let input = tree.create_element("input");
        tree.append_child(form, fieldset).unwrap();
        tree.append_child(fieldset, input).unwrap();
        assert!(!tree.is_disabled(input));
        tree.set_attribute(fieldset, "disabled", "").unwrap();
        assert!(tree.is_disabled(input));
        assert!(tree.disabled_by_fieldset(input));
    }

    #[test]
    fn test_associated_elements_in_tree_order() {
        let (mut tree, form) = tree_with_form();
        let a = tree.create_element("input");
        let custom = tree.create_element("x-field");
        let b = tree.create_element("select");
        let plain = tree.create_element("div");
        for node in [a, custom, b, plain] {
            tree.append_child(form, node).unwrap();
        }
        let listed = tree.associated_elements(form, |n| n == custom);
        assert_eq!(listed, vec![a, custom, b]);
    }

    #[test]
    fn test_native_radio_group_scoping() {
        let (mut tree, form) = tree_with_form();
        let inside = tree.create_element("input");
        let outside = tree.create_element("input");
        for radio in [inside, outside] {
            tree.set_attribute(radio, "type", "radio").unwrap();
            tree.set_attribute(radio, "name", "g").unwrap();
        }
        tree.append_child(form, inside).unwrap();
        let root = tree.root();
        tree.append_child(root, outside).unwrap();

        assert_eq!(tree.native_radio_group(inside), vec![inside]);
        assert_eq!(tree.native_radio_group(outside), vec![outside]);
    }

    #[test]
    fn test_destroy_invalidates_subtree() {
        let mut tree = NodeTree::new();
        let host = tree.create_element("x-field");
        let root = tree.root();
        tree.append_child(root, host).unwrap();
        let shadow = tree.attach_shadow(host).unwrap();
        let input = tree.create_element("input");
        tree.append_child(shadow, input).unwrap();

        let destroyed = tree.destroy(host).unwrap();
        assert_eq!(destroyed.len(), 3);
        assert!(!tree.contains(input));
        assert_eq!(tree.parent(input), Err(DomError::InvalidNode(input)));
        assert!(tree.children(root).unwrap().is_empty());
    }
}
