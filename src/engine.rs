//! Engine — wiring of dispatcher, command stack, viewers and model source.
//!
//! DESIGN
//! ======
//! `Engine::start` builds one instance of every runtime part and connects
//! them:
//!
//! - the main and popup [`Viewer`]s, plus the [`HiddenBoundsUpdater`] as the
//!   hidden target
//! - the [`CommandStack`] actor owning the three target models
//! - the [`ActionDispatcher`] with the default command and query handlers
//! - the [`LocalModelSource`], which also answers `requestModel`
//! - a pump task feeding follow-up actions (measured bounds, reconnects
//!   issued by edit-mode changes) back into the dispatcher
//!
//! The pump stops when the engine is dropped; the stack actor stops once the
//! last handle to it is gone.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::sync::Arc;

use scene::factory::ModelFactory;
use scene::model::Model;
use scene::render::{ModelRenderer, VNode, ViewRegistry};
use scene::routing::EdgeRouterRegistry;
use scene::schema::ElementSchema;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::action::{Action, kinds};
use crate::animation::{FrameSyncer, TimerFrameSyncer};
use crate::command::{ActionSink, CommandContext, CommandStack, CommandStackHandle, RenderTargets};
use crate::config::EngineConfig;
use crate::dispatch::{ActionDispatcher, DispatchError};
use crate::error::ErrorCode;
use crate::model_source::{LayoutEngine, LocalModelSource, RequestModelHandler, SourceError};
use crate::viewer::{BoundsMeasurer, EstimatedBoundsMeasurer, HiddenBoundsUpdater, RenderTarget, Viewer};

/// Pluggable collaborators of an engine.
#[derive(Clone)]
pub struct EngineServices {
    pub factory: Arc<ModelFactory>,
    pub routers: Arc<EdgeRouterRegistry>,
    pub views: ViewRegistry,
    /// Frame source for animations; a timer at the configured interval when `None`.
    pub syncer: Option<Arc<dyn FrameSyncer>>,
    pub measurer: Arc<dyn BoundsMeasurer>,
    pub layout: Option<Arc<dyn LayoutEngine>>,
}

impl Default for EngineServices {
    fn default() -> Self {
        Self {
            factory: Arc::new(ModelFactory::new()),
            routers: Arc::new(EdgeRouterRegistry::with_defaults()),
            views: ViewRegistry::with_defaults(),
            syncer: None,
            measurer: Arc::new(EstimatedBoundsMeasurer),
            layout: None,
        }
    }
}

/// A running diagram engine.
pub struct Engine {
    config: EngineConfig,
    dispatcher: Arc<ActionDispatcher>,
    source: Arc<LocalModelSource>,
    main: Arc<Viewer>,
    popup: Arc<Viewer>,
    pump: JoinHandle<()>,
}

impl Engine {
    /// Build and connect every part. Must be called within a tokio runtime.
    ///
    /// # Errors
    ///
    /// [`DispatchError::DuplicateHandler`] if handler registration collides.
    pub async fn start(config: EngineConfig, services: EngineServices) -> Result<Self, DispatchError> {
        let (sink, rx) = ActionSink::channel();
        let renderer = ModelRenderer::new(services.views.clone(), Arc::clone(&services.routers));
        let main = Arc::new(Viewer::new("main", renderer.clone()));
        let popup = Arc::new(Viewer::new("popup", renderer));
        let hidden = Arc::new(HiddenBoundsUpdater::new(Arc::clone(&services.measurer), sink.clone()));

        let syncer = services
            .syncer
            .unwrap_or_else(|| Arc::new(TimerFrameSyncer::new(config.frame_interval())) as Arc<dyn FrameSyncer>);
        let ctx = CommandContext {
            factory: Arc::clone(&services.factory),
            routers: services.routers,
            syncer,
            duration: config.animation_duration(),
            frames: Arc::clone(&main) as Arc<dyn RenderTarget>,
            actions: sink,
        };
        let targets = RenderTargets {
            main: Arc::clone(&main) as Arc<dyn RenderTarget>,
            hidden: hidden as Arc<dyn RenderTarget>,
            popup: Arc::clone(&popup) as Arc<dyn RenderTarget>,
        };
        let stack = CommandStack::spawn(ctx, targets, config.undo_history_limit);

        let dispatcher = Arc::new(ActionDispatcher::new(stack, config.request_timeout()));
        dispatcher.register_defaults().await?;
        let source =
            Arc::new(LocalModelSource::new(Arc::clone(&dispatcher), services.factory, &config, services.layout));
        dispatcher.register(kinds::REQUEST_MODEL, Arc::new(RequestModelHandler::new(&source))).await?;

        let pump = tokio::spawn(pump(Arc::clone(&dispatcher), rx));

        info!(
            undo_history_limit = ?config.undo_history_limit,
            animation_ms = config.animation_ms,
            frame_interval_ms = config.frame_interval_ms,
            bounds_timeout_ms = config.bounds_timeout_ms,
            needs_client_layout = config.needs_client_layout,
            needs_server_layout = config.needs_server_layout,
            "diagram engine started"
        );
        Ok(Self { config, dispatcher, source, main, popup, pump })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Arc<ActionDispatcher> {
        &self.dispatcher
    }

    #[must_use]
    pub fn source(&self) -> &Arc<LocalModelSource> {
        &self.source
    }

    #[must_use]
    pub fn stack(&self) -> &CommandStackHandle {
        self.dispatcher.stack()
    }

    /// Replace the diagram.
    ///
    /// # Errors
    ///
    /// See [`LocalModelSource::set_model`].
    pub async fn set_model(&self, root: ElementSchema) -> Result<(), SourceError> {
        self.source.set_model(root).await
    }

    /// Submit a new revision of the diagram.
    ///
    /// # Errors
    ///
    /// See [`LocalModelSource::update_model`].
    pub async fn update_model(&self, root: ElementSchema) -> Result<(), SourceError> {
        self.source.update_model(Some(root)).await
    }

    /// # Errors
    ///
    /// See [`ActionDispatcher::dispatch`].
    pub async fn dispatch(&self, action: Action) -> Result<(), DispatchError> {
        self.dispatcher.dispatch(action).await
    }

    /// # Errors
    ///
    /// See [`ActionDispatcher::request`].
    pub async fn request(&self, action: Action) -> Result<Action, DispatchError> {
        self.dispatcher.request(action).await
    }

    /// # Errors
    ///
    /// The command stack is closed.
    pub async fn undo(&self) -> Result<(), DispatchError> {
        self.dispatcher.dispatch(Action::Undo).await
    }

    /// # Errors
    ///
    /// The command stack is closed.
    pub async fn redo(&self) -> Result<(), DispatchError> {
        self.dispatcher.dispatch(Action::Redo).await
    }

    /// Current main model.
    ///
    /// # Errors
    ///
    /// The command stack is closed.
    pub async fn model(&self) -> Result<Model, DispatchError> {
        Ok(self.stack().model().await?)
    }

    /// Latest virtual tree of the main viewer.
    pub async fn rendered(&self) -> Option<VNode> {
        self.main.tree().await
    }

    /// Latest virtual tree of the popup viewer.
    pub async fn rendered_popup(&self) -> Option<VNode> {
        self.popup.tree().await
    }

    /// Render count of the main viewer, animation frames included.
    pub async fn render_count(&self) -> usize {
        self.main.renders().await
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").field("config", &self.config).finish_non_exhaustive()
    }
}

/// Dispatch follow-up actions in arrival order.
async fn pump(dispatcher: Arc<ActionDispatcher>, mut rx: mpsc::UnboundedReceiver<Action>) {
    while let Some(action) = rx.recv().await {
        let kind = action.kind();
        if let Err(err) = dispatcher.dispatch(action).await {
            warn!(kind, code = err.error_code(), error = %err, "follow-up action failed");
        }
    }
}
