//! Action — the universal message type of the engine.
//!
//! DESIGN
//! ======
//! Every inbound or outbound message is an [`Action`], serialized as a flat
//! record tagged by `kind`. The dispatcher routes on [`Action::kind`] and never
//! inspects the payload. Requests carry a `requestId`; the action answering a
//! request carries the same value as `responseId`.

#[cfg(test)]
#[path = "action_test.rs"]
mod action_test;

use scene::geometry::{Bounds, Dimension, Point};
use scene::schema::ElementSchema;
use scene::viewport::Viewport;
use serde::{Deserialize, Serialize};

// =============================================================================
// KINDS
// =============================================================================

pub mod kinds {
    pub const REQUEST_MODEL: &str = "requestModel";
    pub const SET_MODEL: &str = "setModel";
    pub const UPDATE_MODEL: &str = "updateModel";
    pub const REQUEST_BOUNDS: &str = "requestBounds";
    pub const COMPUTED_BOUNDS: &str = "computedBounds";
    pub const SET_BOUNDS: &str = "setBounds";
    pub const MOVE: &str = "move";
    pub const SELECT_ELEMENTS: &str = "selectElements";
    pub const SELECT_ALL: &str = "selectAll";
    pub const CREATE_ELEMENT: &str = "createElement";
    pub const DELETE_ELEMENT: &str = "deleteElement";
    pub const RECONNECT: &str = "reconnect";
    pub const SWITCH_EDIT_MODE: &str = "switchEditMode";
    pub const APPLY_LABEL_EDIT: &str = "applyLabelEdit";
    pub const BRING_TO_FRONT: &str = "bringToFront";
    pub const SET_VIEWPORT: &str = "setViewport";
    pub const CENTER: &str = "center";
    pub const FIT: &str = "fit";
    pub const HOVER_FEEDBACK: &str = "hoverFeedback";
    pub const SET_POPUP_MODEL: &str = "setPopupModel";
    pub const GET_SELECTION: &str = "getSelection";
    pub const SELECTION_RESULT: &str = "selectionResult";
    pub const GET_VIEWPORT: &str = "getViewport";
    pub const VIEWPORT_RESULT: &str = "viewportResult";
    pub const UNDO: &str = "undo";
    pub const REDO: &str = "redo";
}

// =============================================================================
// PAYLOAD RECORDS
// =============================================================================

/// Measured bounds of one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementAndBounds {
    pub element_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_position: Option<Point>,
    pub new_size: Dimension,
}

/// Measured text alignment of one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementAndAlignment {
    pub element_id: String,
    pub new_alignment: Point,
}

/// One element of a move. `from_position` defaults to the current position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementMove {
    pub element_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_position: Option<Point>,
    pub to_position: Point,
}

impl ElementMove {
    #[must_use]
    pub fn to(element_id: impl Into<String>, to_position: Point) -> Self {
        Self { element_id: element_id.into(), from_position: None, to_position }
    }
}

fn yes() -> bool {
    true
}

// =============================================================================
// ACTION
// =============================================================================

/// Every message the engine understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Action {
    RequestModel {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },
    SetModel {
        new_root: Box<ElementSchema>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        response_id: Option<String>,
    },
    UpdateModel {
        new_root: Box<ElementSchema>,
        #[serde(default = "yes")]
        animate: bool,
    },
    RequestBounds {
        new_root: Box<ElementSchema>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },
    ComputedBounds {
        bounds: Vec<ElementAndBounds>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        alignments: Vec<ElementAndAlignment>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        response_id: Option<String>,
    },
    SetBounds {
        bounds: Vec<ElementAndBounds>,
    },
    Move {
        moves: Vec<ElementMove>,
        #[serde(default)]
        animate: bool,
        /// Set on the last move of a drag. Moves merge whether or not it is set.
        #[serde(default)]
        finished: bool,
    },
    SelectElements {
        #[serde(default)]
        selected: Vec<String>,
        #[serde(default)]
        deselected: Vec<String>,
    },
    SelectAll {
        #[serde(default = "yes")]
        select: bool,
    },
    CreateElement {
        container_id: String,
        element_schema: Box<ElementSchema>,
    },
    DeleteElement {
        element_ids: Vec<String>,
    },
    Reconnect {
        routable_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        new_source_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        new_target_id: Option<String>,
    },
    SwitchEditMode {
        #[serde(default)]
        elements_to_activate: Vec<String>,
        #[serde(default)]
        elements_to_deactivate: Vec<String>,
    },
    ApplyLabelEdit {
        label_id: String,
        text: String,
    },
    BringToFront {
        element_ids: Vec<String>,
    },
    SetViewport {
        element_id: String,
        new_viewport: Viewport,
        #[serde(default)]
        animate: bool,
    },
    Center {
        #[serde(default)]
        element_ids: Vec<String>,
        #[serde(default)]
        animate: bool,
        #[serde(default)]
        retain_zoom: bool,
    },
    Fit {
        #[serde(default)]
        element_ids: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        padding: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_zoom: Option<f64>,
        #[serde(default)]
        animate: bool,
    },
    HoverFeedback {
        mouseover_element: String,
        mouse_is_over: bool,
    },
    SetPopupModel {
        new_root: Box<ElementSchema>,
    },
    GetSelection {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },
    SelectionResult {
        selected_element_ids: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        response_id: Option<String>,
    },
    GetViewport {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },
    ViewportResult {
        viewport: Viewport,
        canvas_bounds: Bounds,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        response_id: Option<String>,
    },
    Undo,
    Redo,
}

impl Action {
    /// The `kind` tag as it appears on the wire.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RequestModel { .. } => kinds::REQUEST_MODEL,
            Self::SetModel { .. } => kinds::SET_MODEL,
            Self::UpdateModel { .. } => kinds::UPDATE_MODEL,
            Self::RequestBounds { .. } => kinds::REQUEST_BOUNDS,
            Self::ComputedBounds { .. } => kinds::COMPUTED_BOUNDS,
            Self::SetBounds { .. } => kinds::SET_BOUNDS,
            Self::Move { .. } => kinds::MOVE,
            Self::SelectElements { .. } => kinds::SELECT_ELEMENTS,
            Self::SelectAll { .. } => kinds::SELECT_ALL,
            Self::CreateElement { .. } => kinds::CREATE_ELEMENT,
            Self::DeleteElement { .. } => kinds::DELETE_ELEMENT,
            Self::Reconnect { .. } => kinds::RECONNECT,
            Self::SwitchEditMode { .. } => kinds::SWITCH_EDIT_MODE,
            Self::ApplyLabelEdit { .. } => kinds::APPLY_LABEL_EDIT,
            Self::BringToFront { .. } => kinds::BRING_TO_FRONT,
            Self::SetViewport { .. } => kinds::SET_VIEWPORT,
            Self::Center { .. } => kinds::CENTER,
            Self::Fit { .. } => kinds::FIT,
            Self::HoverFeedback { .. } => kinds::HOVER_FEEDBACK,
            Self::SetPopupModel { .. } => kinds::SET_POPUP_MODEL,
            Self::GetSelection { .. } => kinds::GET_SELECTION,
            Self::SelectionResult { .. } => kinds::SELECTION_RESULT,
            Self::GetViewport { .. } => kinds::GET_VIEWPORT,
            Self::ViewportResult { .. } => kinds::VIEWPORT_RESULT,
            Self::Undo => kinds::UNDO,
            Self::Redo => kinds::REDO,
        }
    }

    /// Whether this kind expects a correlated response.
    #[must_use]
    pub fn is_request(&self) -> bool {
        matches!(
            self,
            Self::RequestModel { .. }
                | Self::RequestBounds { .. }
                | Self::GetSelection { .. }
                | Self::GetViewport { .. }
        )
    }

    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::RequestModel { request_id }
            | Self::RequestBounds { request_id, .. }
            | Self::GetSelection { request_id }
            | Self::GetViewport { request_id } => request_id.as_deref().filter(|id| !id.is_empty()),
            _ => None,
        }
    }

    #[must_use]
    pub fn response_id(&self) -> Option<&str> {
        match self {
            Self::SetModel { response_id, .. }
            | Self::ComputedBounds { response_id, .. }
            | Self::SelectionResult { response_id, .. }
            | Self::ViewportResult { response_id, .. } => response_id.as_deref().filter(|id| !id.is_empty()),
            _ => None,
        }
    }

    /// Same action with `request_id` set. Non-request kinds are returned unchanged.
    #[must_use]
    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        match &mut self {
            Self::RequestModel { request_id }
            | Self::RequestBounds { request_id, .. }
            | Self::GetSelection { request_id }
            | Self::GetViewport { request_id } => *request_id = Some(id.into()),
            _ => {}
        }
        self
    }
}
