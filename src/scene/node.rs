use crate::scene::NodeHandle;
use crate::scene::transform::Transform;

/// A minimal scene node: hierarchy links plus a transform.
///
/// # Design
///
/// - Only keeps data that has to be traversed every frame (hierarchy and
///   transform); everything else (skins, solvers, playback state) lives in
///   components that reference nodes by handle.
/// - `parent`/`children` are kept in sync by [`Hierarchy`]; use its
///   `add_child`/`attach` methods rather than editing links by hand.
///
/// [`Hierarchy`]: crate::scene::Hierarchy
#[derive(Debug, Clone, Default)]
pub struct Node {
    /// Parent node handle (None for root nodes)
    pub(crate) parent: Option<NodeHandle>,
    /// Child node handles
    pub(crate) children: Vec<NodeHandle>,
    /// Transform component (hot data accessed every frame)
    pub transform: Transform,
}

impl Node {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a node with the given local transform.
    #[must_use]
    pub fn with_local(local: crate::scene::TransformData) -> Self {
        let mut node = Self::default();
        node.transform.local = local;
        node
    }

    /// Returns the parent node handle, if any.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    /// Returns a read-only slice of child node handles.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }
}
