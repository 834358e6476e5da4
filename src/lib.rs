//! Asynchronous runtime of the diagram engine.
//!
//! ARCHITECTURE
//! ============
//! Everything that happens to a diagram starts as an [`action::Action`]. The
//! [`dispatch::ActionDispatcher`] maps each action kind to exactly one handler;
//! handlers answer with a command, a follow-up action, or nothing. Commands
//! are serialized by the [`command::stack::CommandStack`] actor, which owns the
//! three render targets (main, hidden, popup) and flushes them to the
//! [`viewer`] only once a batch of work has settled.
//!
//! The synchronous core (scene graph, routing, render pass) lives in the
//! [`scene`] crate and is re-exported here.
//!
//! | Module | Role |
//! |--------|------|
//! | [`action`] | Serde-tagged action protocol with request/response ids |
//! | [`animation`] | Frame syncers and model tweens |
//! | [`command`] | Command trait, stack actor and every editing command |
//! | [`config`] | Environment-driven engine configuration |
//! | [`dispatch`] | One handler per action kind, request/response correlation |
//! | [`engine`] | Wiring of dispatcher, stack, viewers and model source |
//! | [`error`] | Grepable error codes shared by every error enum |
//! | [`model_source`] | Model submission, bounds round trip and layout |
//! | [`viewer`] | Render targets and bounds measurement |

pub mod action;
pub mod animation;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod model_source;
pub mod viewer;

#[cfg(test)]
#[path = "fixtures_test.rs"]
pub(crate) mod fixtures;

pub use scene;
