//! Scene graph, geometry and edge routing for the diagram engine.
//!
//! This crate is the synchronous core of the engine. It owns everything that
//! can be computed without waiting on anything: the wire schema, the mutable
//! scene graph and its id index, the model factory, tree matching between two
//! model snapshots, viewport math, and the full edge-routing subsystem. The
//! asynchronous runtime (command stack, animations, dispatch) lives in the
//! `diagram` crate and drives this one.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`geometry`] | Points, bounds, lines, diamonds and distance helpers |
//! | [`schema`] | Serializable element records exchanged on the wire |
//! | [`model`] | The element tree, its id index and incoming/outgoing edge maps |
//! | [`factory`] | Type registry turning schemas into elements and back |
//! | [`matching`] | Diff between two model snapshots as a list of matches |
//! | [`viewport`] | Scroll/zoom state and fit/center computations |
//! | [`hit`] | Finding connectable elements under a point |
//! | [`routing`] | Anchors, routers, routing handles and edge intersections |
//! | [`render`] | View registry and the virtual-node render pass |
//! | [`consts`] | Shared numeric constants |

pub mod consts;
pub mod factory;
pub mod geometry;
pub mod hit;
pub mod matching;
pub mod model;
pub mod render;
pub mod routing;
pub mod schema;
pub mod viewport;

/// Errors raised by structural operations on the scene graph and the factory.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("duplicate element id: {0}")]
    DuplicateId(String),
    #[error("element not found: {0}")]
    UnknownElement(String),
    #[error("parent not found: {0}")]
    UnknownParent(String),
    #[error("type mismatch for '{type_name}': expected {expected}")]
    TypeMismatch { type_name: String, expected: &'static str },
    #[error("type already registered: {0}")]
    DuplicateRegistration(String),
    #[error("cannot move {element} below its own descendant {parent}")]
    CyclicParent { element: String, parent: String },
    #[error("the root element cannot be removed or moved: {0}")]
    RootElement(String),
}

impl SceneError {
    /// Grepable error code, matching the engine's error frame convention.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateId(_) => "E_DUPLICATE_ID",
            Self::UnknownElement(_) => "E_UNKNOWN_ELEMENT",
            Self::UnknownParent(_) => "E_UNKNOWN_PARENT",
            Self::TypeMismatch { .. } => "E_TYPE_MISMATCH",
            Self::DuplicateRegistration(_) => "E_DUPLICATE_REGISTRATION",
            Self::CyclicParent { .. } => "E_CYCLIC_PARENT",
            Self::RootElement(_) => "E_ROOT_ELEMENT",
        }
    }
}
