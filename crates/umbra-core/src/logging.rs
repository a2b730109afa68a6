//! Log targets and tree dumps.
//!
//! Both crates log through `tracing` under the targets in [`targets`] and
//! leave installing a subscriber to the embedder:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("umbra=debug,umbra_core::event=trace")
//!     .init();
//! ```
//!
//! # Debug Visualization
//!
//! ```
//! use umbra_core::logging::TreeDebug;
//! use umbra_core::tree::NodeTree;
//!
//! let mut tree = NodeTree::new();
//! let form = tree.create_element("form");
//! tree.append_child(tree.root(), form).unwrap();
//!
//! let output = TreeDebug::new().format_subtree(&tree, tree.root());
//! assert!(output.contains("<form>"));
//! ```

use std::fmt::Write as FmtWrite;

use crate::tree::{NodeId, NodeKind, NodeTree};

/// `tracing` targets, one per subsystem.
pub mod targets {
    /// Platform model target.
    pub const CORE: &str = "umbra_core";
    /// Node tree mutations.
    pub const TREE: &str = "umbra_core::tree";
    /// Event dispatch.
    pub const EVENT: &str = "umbra_core::event";
    /// Mutation observer delivery.
    pub const MUTATION: &str = "umbra_core::mutation";
    /// Signal emission.
    pub const SIGNAL: &str = "umbra_core::signal";
    /// Microtask queue.
    pub const MICROTASK: &str = "umbra_core::microtask";
    /// Custom element reactions and internals.
    pub const CUSTOM: &str = "umbra_core::custom";
    /// Form reset and submission.
    pub const FORM: &str = "umbra_core::form";
    /// Form participation controllers.
    pub const CONTROLLER: &str = "umbra::controller";
    /// Input binding observers.
    pub const BINDING: &str = "umbra::binding";
    /// Constraint evaluation.
    pub const VALIDITY: &str = "umbra::validity";
    /// ARIA role mapping.
    pub const ARIA: &str = "umbra::aria";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TreeStyle {
    /// `+--` and `` `-- `` branches.
    Ascii,
    /// Box-drawing branches.
    #[default]
    Unicode,
    /// Compact single-line prefix.
    Compact,
}

/// Configuration for tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// Branch drawing.
    pub style: TreeStyle,
    /// Whether to show node ids.
    pub show_ids: bool,
    /// Whether to show element attributes.
    pub show_attributes: bool,
    /// Whether to descend into shadow roots.
    pub show_shadow: bool,
    /// Stop descending below this depth.
    pub max_depth: Option<usize>,
    /// Spaces after the branch glyph on each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: false,
            show_attributes: true,
            show_shadow: true,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Options for detailed debugging output.
    pub fn detailed() -> Self {
        Self {
            show_ids: true,
            ..Default::default()
        }
    }

    /// Options for minimal output: tags only, light tree only.
    pub fn minimal() -> Self {
        Self {
            show_attributes: false,
            show_shadow: false,
            ..Default::default()
        }
    }
}

/// Debug utility for visualizing node trees.
#[derive(Debug, Clone, Default)]
pub struct TreeDebug {
    options: TreeFormatOptions,
}

impl TreeDebug {
    /// Create a visualizer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a visualizer with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format the subtree rooted at `root`.
    pub fn format_subtree(&self, tree: &NodeTree, root: NodeId) -> String {
        let mut output = String::new();
        self.format_into(tree, root, 0, true, &mut output);
        output
    }

    fn format_into(
        &self,
        tree: &NodeTree,
        id: NodeId,
        depth: usize,
        is_last: bool,
        output: &mut String,
    ) {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return;
        }
        let Ok(kind) = tree.kind(id) else {
            return;
        };

        output.push_str(&self.build_prefix(depth, is_last));
        match kind {
            NodeKind::Document => output.push_str("#document"),
            NodeKind::ShadowRoot { .. } => output.push_str("#shadow-root"),
            NodeKind::Text { data } => {
                let _ = write!(output, "{data:?}");
            }
            NodeKind::Element { tag } => {
                output.push('<');
                output.push_str(tag);
                if self.options.show_attributes
                    && let Ok(attributes) = tree.attributes(id)
                {
                    for (name, value) in attributes {
                        if value.is_empty() {
                            let _ = write!(output, " {name}");
                        } else {
                            let _ = write!(output, " {name}={value:?}");
                        }
                    }
                }
                output.push('>');
            }
        }
        if self.options.show_ids {
            let _ = write!(output, " [{}]", id.as_raw());
        }
        output.push('\n');

        let mut children: Vec<NodeId> = Vec::new();
        if self.options.show_shadow
            && let Some(shadow) = tree.shadow_root(id)
        {
            children.push(shadow);
        }
        if let Ok(light) = tree.children(id) {
            children.extend_from_slice(light);
        }
        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            self.format_into(tree, child, depth + 1, i + 1 == count, output);
        }
    }

    fn build_prefix(&self, depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }
        let (branch, tee, corner) = match self.options.style {
            TreeStyle::Ascii => ("|", "+-- ", "`-- "),
            TreeStyle::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500} ", "\u{2514}\u{2500}\u{2500} "),
            TreeStyle::Compact => ("", "- ", "- "),
        };

        let mut prefix = String::new();
        for _ in 0..(depth - 1) {
            prefix.push_str(branch);
            prefix.extend(std::iter::repeat_n(' ', self.options.indent_size));
        }
        prefix.push_str(if is_last { corner } else { tee });
        prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (NodeTree, NodeId) {
        let mut tree = NodeTree::new();
        let form = tree.create_element("form");
        let host = tree.create_element("x-field");
        let root = tree.root();
        tree.append_child(root, form).unwrap();
        tree.append_child(form, host).unwrap();
        tree.set_attribute(host, "name", "email").unwrap();
        let shadow = tree.attach_shadow(host).unwrap();
        let input = tree.create_element("input");
        tree.append_child(shadow, input).unwrap();
        (tree, host)
    }

    #[test]
    fn test_format_includes_shadow_tree() {
        let (tree, _) = sample();
        let output = TreeDebug::new().format_subtree(&tree, tree.root());
        assert!(output.starts_with("#document\n"));
        assert!(output.contains("<x-field name=\"email\">"));
        assert!(output.contains("#shadow-root"));
        assert!(output.contains("<input>"));
    }

    #[test]
    fn test_format_minimal() {
        let (tree, host) = sample();
        let output = TreeDebug::with_options(TreeFormatOptions::minimal()).format_subtree(&tree, host);
        assert_eq!(output, "<x-field>\n");
    }

    #[test]
    fn test_format_max_depth() {
        let (tree, _) = sample();
        let options = TreeFormatOptions {
            max_depth: Some(1),
            style: TreeStyle::Ascii,
            ..Default::default()
        };
        let output = TreeDebug::with_options(options).format_subtree(&tree, tree.root());
        assert_eq!(output, "#document\n`-- <form>\n");
    }
}
