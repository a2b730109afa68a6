//! Error types for the umbra platform model.

use crate::tree::NodeId;

/// Errors raised by node tree and document operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// The node id is stale or was never part of this document.
    #[error("Invalid or destroyed node {0:?}")]
    InvalidNode(NodeId),

    /// The operation requires an element node.
    #[error("Node {0:?} is not an element")]
    NotAnElement(NodeId),

    /// The insertion would not produce a tree (cycle, or inserting the document).
    #[error("Cannot insert {child:?} into {parent:?}: the result would not be a tree")]
    HierarchyRequest {
        /// The prospective parent.
        parent: NodeId,
        /// The node being inserted.
        child: NodeId,
    },

    /// The reference node is not a child of the given parent.
    #[error("Node {reference:?} is not a child of {parent:?}")]
    NotAChild {
        /// The parent that was searched.
        parent: NodeId,
        /// The node that was expected to be a child.
        reference: NodeId,
    },

    /// A shadow root is already attached to the host.
    #[error("Element {0:?} already hosts a shadow root")]
    ShadowRootExists(NodeId),

    /// Internals were already attached to the host.
    #[error("Element {0:?} already has attached internals")]
    InternalsAlreadyAttached(NodeId),

    /// A custom element is already registered for the node.
    #[error("Element {0:?} is already defined as a custom element")]
    AlreadyDefined(NodeId),
}

/// Result type for platform operations.
pub type DomResult<T> = std::result::Result<T, DomError>;
