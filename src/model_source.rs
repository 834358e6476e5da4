//! Local model source — where new model revisions enter the engine.
//!
//! DESIGN
//! ======
//! The source keeps the last submitted root as a schema. Every submission
//! runs the same pipeline, serialized by a lock so revisions never overtake
//! each other:
//!
//! 1. With client layout enabled, request bounds for the root (hidden render
//!    plus measurement) and patch the measured bounds into it
//! 2. With server layout enabled, run the [`LayoutEngine`]
//! 3. Commit: `setModel` when answering a `requestModel`, when the caller
//!    asked for a replacement, or when the root type changed since the last
//!    submission; `updateModel` otherwise
//!
//! ERROR HANDLING
//! ==============
//! A bounds round trip that times out or fails is logged and the root is
//! committed unmeasured. A failing layout engine is logged and the
//! pre-layout root is committed. Only the final dispatch can fail a
//! submission.

#[cfg(test)]
#[path = "model_source_test.rs"]
mod model_source_test;

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use scene::SceneError;
use scene::factory::ModelFactory;
use scene::matching::{MatchResult, apply_matches};
use scene::schema::ElementSchema;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, warn};

use crate::action::{Action, ElementAndAlignment, ElementAndBounds};
use crate::command::{EMPTY_ROOT_ID, EMPTY_ROOT_TYPE};
use crate::config::EngineConfig;
use crate::dispatch::{ActionDispatcher, ActionHandler, DispatchError, Outcome};
use crate::error::ErrorCode;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("parent not found: {0}")]
    UnknownParent(String),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("layout failed: {0}")]
    Layout(String),
}

impl ErrorCode for SourceError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownParent(_) => "E_UNKNOWN_PARENT",
            Self::Scene(err) => err.error_code(),
            Self::Dispatch(err) => err.error_code(),
            Self::Layout(_) => "E_LAYOUT_FAILED",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Dispatch(err) => err.retryable(),
            _ => false,
        }
    }
}

// =============================================================================
// LAYOUT
// =============================================================================

/// Computes positions and sizes for a model before it is committed.
#[async_trait::async_trait]
pub trait LayoutEngine: Send + Sync {
    async fn layout(&self, root: ElementSchema) -> Result<ElementSchema, SourceError>;
}

/// Patch measured bounds and alignments into `root` by element id. Unknown
/// ids are skipped; a bound without `new_position` keeps the element's
/// position. Returns how many records were applied.
pub fn apply_computed_bounds(
    root: &mut ElementSchema,
    bounds: &[ElementAndBounds],
    alignments: &[ElementAndAlignment],
) -> usize {
    let bounds: HashMap<&str, &ElementAndBounds> = bounds.iter().map(|b| (b.element_id.as_str(), b)).collect();
    let alignments: HashMap<&str, &ElementAndAlignment> =
        alignments.iter().map(|a| (a.element_id.as_str(), a)).collect();
    let mut applied = 0;
    patch(root, &bounds, &alignments, &mut applied);
    applied
}

fn patch(
    schema: &mut ElementSchema,
    bounds: &HashMap<&str, &ElementAndBounds>,
    alignments: &HashMap<&str, &ElementAndAlignment>,
    applied: &mut usize,
) {
    if let Some(b) = bounds.get(schema.id.as_str()) {
        if let Some(position) = b.new_position {
            schema.position = Some(position);
        }
        schema.size = Some(b.new_size);
        *applied += 1;
    }
    if let Some(a) = alignments.get(schema.id.as_str()) {
        schema.alignment = Some(a.new_alignment);
        *applied += 1;
    }
    for child in &mut schema.children {
        patch(child, bounds, alignments, applied);
    }
}

fn remove_from(schema: &mut ElementSchema, id: &str) -> bool {
    let before = schema.children.len();
    schema.children.retain(|child| child.id != id);
    if schema.children.len() != before {
        return true;
    }
    schema.children.iter_mut().any(|child| remove_from(child, id))
}

// =============================================================================
// SOURCE
// =============================================================================

pub struct LocalModelSource {
    dispatcher: Arc<ActionDispatcher>,
    factory: Arc<ModelFactory>,
    layout: Option<Arc<dyn LayoutEngine>>,
    needs_client_layout: bool,
    needs_server_layout: bool,
    /// Held for a whole submission; remembers the last submitted root type.
    submit_lock: Mutex<Option<String>>,
    current: RwLock<ElementSchema>,
}

impl LocalModelSource {
    #[must_use]
    pub fn new(
        dispatcher: Arc<ActionDispatcher>,
        factory: Arc<ModelFactory>,
        config: &EngineConfig,
        layout: Option<Arc<dyn LayoutEngine>>,
    ) -> Self {
        Self {
            dispatcher,
            factory,
            layout,
            needs_client_layout: config.needs_client_layout,
            needs_server_layout: config.needs_server_layout,
            submit_lock: Mutex::new(None),
            current: RwLock::new(ElementSchema::new(EMPTY_ROOT_ID, EMPTY_ROOT_TYPE)),
        }
    }

    /// The last submitted root, measured and laid out.
    pub async fn model(&self) -> ElementSchema {
        self.current.read().await.clone()
    }

    /// Replace the model. Always committed as `setModel`.
    ///
    /// # Errors
    ///
    /// Dispatching the commit failed.
    pub async fn set_model(&self, root: ElementSchema) -> Result<(), SourceError> {
        let mut last_type = self.submit_lock.lock().await;
        *self.current.write().await = root;
        let action = self.prepare(&mut last_type, false, None).await;
        self.dispatcher.dispatch(action).await?;
        Ok(())
    }

    /// Submit a new revision, or resubmit the current root when `root` is
    /// `None`. Committed as an animated `updateModel` unless the root type
    /// changed.
    ///
    /// # Errors
    ///
    /// Dispatching the commit failed.
    pub async fn update_model(&self, root: Option<ElementSchema>) -> Result<(), SourceError> {
        let mut last_type = self.submit_lock.lock().await;
        if let Some(root) = root {
            *self.current.write().await = root;
        }
        let action = self.prepare(&mut last_type, true, None).await;
        self.dispatcher.dispatch(action).await?;
        Ok(())
    }

    /// Add elements under their parent (the root when `None`) and submit an
    /// update. Nothing is added if any parent is unknown or any id is taken.
    ///
    /// # Errors
    ///
    /// [`SourceError::UnknownParent`], [`SceneError::DuplicateId`], or a
    /// failed commit.
    pub async fn add_elements(&self, elements: Vec<(ElementSchema, Option<String>)>) -> Result<(), SourceError> {
        let mut last_type = self.submit_lock.lock().await;
        let mut root = self.current.read().await.clone();
        for (element, parent_id) in elements {
            if let Some(taken) = element.ids().into_iter().find(|id| root.find(id).is_some()) {
                return Err(SceneError::DuplicateId(taken).into());
            }
            let parent_id = parent_id.unwrap_or_else(|| root.id.clone());
            let Some(parent) = root.find_mut(&parent_id) else {
                return Err(SourceError::UnknownParent(parent_id));
            };
            parent.children.push(element);
        }
        *self.current.write().await = root;
        let action = self.prepare(&mut last_type, true, None).await;
        self.dispatcher.dispatch(action).await?;
        Ok(())
    }

    /// Remove elements by id and submit an update. Unknown ids are skipped.
    ///
    /// # Errors
    ///
    /// Dispatching the commit failed.
    pub async fn remove_elements(&self, element_ids: &[String]) -> Result<(), SourceError> {
        let mut last_type = self.submit_lock.lock().await;
        {
            let mut root = self.current.write().await;
            for id in element_ids {
                if !remove_from(&mut root, id) {
                    warn!(element_id = %id, "remove of unknown element skipped");
                }
            }
        }
        let action = self.prepare(&mut last_type, true, None).await;
        self.dispatcher.dispatch(action).await?;
        Ok(())
    }

    /// Rewrite the current root into the right-hand side of `matches` and
    /// submit an update. Nothing changes if the matches do not apply.
    ///
    /// # Errors
    ///
    /// The current root or a match is inconsistent with the model
    /// ([`SceneError`]), or the commit failed.
    pub async fn apply_matches(&self, matches: &MatchResult) -> Result<(), SourceError> {
        let mut last_type = self.submit_lock.lock().await;
        let root = self.current.read().await.clone();
        let mut model = self.factory.create_root(&root)?;
        apply_matches(&mut model, matches)?;
        let Some(patched) = ModelFactory::create_schema(&model, &root.id) else {
            return Err(SceneError::UnknownElement(root.id).into());
        };
        debug!(root_id = %patched.id, matches = matches.len(), "matches applied");
        *self.current.write().await = patched;
        let action = self.prepare(&mut last_type, true, None).await;
        self.dispatcher.dispatch(action).await?;
        Ok(())
    }

    /// Prepare the answer to a `requestModel`: a `setModel` of the current
    /// root carrying `request_id` as its response id.
    pub async fn answer_request(&self, request_id: Option<String>) -> Action {
        let mut last_type = self.submit_lock.lock().await;
        self.prepare(&mut last_type, false, request_id).await
    }

    async fn prepare(&self, last_type: &mut Option<String>, update: bool, response_id: Option<String>) -> Action {
        let mut root = self.current.read().await.clone();

        if self.needs_client_layout {
            self.measure(&mut root).await;
        }
        if self.needs_server_layout {
            if let Some(layout) = &self.layout {
                match layout.layout(root.clone()).await {
                    Ok(laid_out) => root = laid_out,
                    Err(err) => {
                        error!(code = err.error_code(), error = %err, "layout failed; committing pre-layout model");
                    }
                }
            }
        }
        *self.current.write().await = root.clone();

        let same_type = last_type.as_deref() == Some(root.kind.as_str());
        *last_type = Some(root.kind.clone());
        if update && same_type && response_id.is_none() {
            debug!(root_id = %root.id, "committing model update");
            Action::UpdateModel { new_root: Box::new(root), animate: true }
        } else {
            debug!(root_id = %root.id, response = response_id.is_some(), "committing model");
            Action::SetModel { new_root: Box::new(root), response_id }
        }
    }

    async fn measure(&self, root: &mut ElementSchema) {
        let request = Action::RequestBounds { new_root: Box::new(root.clone()), request_id: None };
        match self.dispatcher.request(request).await {
            Ok(Action::ComputedBounds { bounds, alignments, .. }) => {
                let applied = apply_computed_bounds(root, &bounds, &alignments);
                debug!(root_id = %root.id, applied, "computed bounds applied");
            }
            Ok(other) => {
                warn!(kind = other.kind(), "unexpected bounds response; committing unmeasured model");
            }
            Err(err) => {
                warn!(code = err.error_code(), error = %err, "bounds round trip failed; committing unmeasured model");
            }
        }
    }
}

impl std::fmt::Debug for LocalModelSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalModelSource")
            .field("needs_client_layout", &self.needs_client_layout)
            .field("needs_server_layout", &self.needs_server_layout)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// REQUEST MODEL
// =============================================================================

/// Answers `requestModel` from a [`LocalModelSource`].
#[derive(Debug, Clone)]
pub struct RequestModelHandler {
    source: Weak<LocalModelSource>,
}

impl RequestModelHandler {
    #[must_use]
    pub fn new(source: &Arc<LocalModelSource>) -> Self {
        Self { source: Arc::downgrade(source) }
    }
}

#[async_trait::async_trait]
impl ActionHandler for RequestModelHandler {
    async fn handle(&self, action: Action) -> Result<Outcome, DispatchError> {
        let request_id = match action {
            Action::RequestModel { request_id } => request_id,
            other => return Err(DispatchError::UnsupportedAction(other.kind().to_string())),
        };
        let Some(source) = self.source.upgrade() else {
            warn!("model requested after the model source was dropped");
            return Ok(Outcome::Done);
        };
        Ok(Outcome::Action(source.answer_request(request_id).await))
    }
}
