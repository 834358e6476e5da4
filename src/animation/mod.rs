//! Animations: per-frame tweens of a model.
//!
//! DESIGN
//! ======
//! An [`Animation`] knows how to put a model into the state it has at a given
//! progress `t ∈ [0, 1]`. [`run_animation`] drives it from a [`FrameSyncer`]:
//! one tween per frame with eased progress, an intermediate render after every
//! frame but the last, and a final tween at exactly `t = 1` so the model ends
//! in the target state regardless of frame timing. The final state is left for
//! the command stack to render once the whole command has settled.

pub mod syncer;
pub mod tweens;

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;

use std::time::Duration;

use scene::model::Model;

use crate::viewer::RenderTarget;

pub use syncer::{FrameSyncer, ImmediateFrameSyncer, TimerFrameSyncer};
pub use tweens::{
    CompoundAnimation, EdgeMorph, ElementResize, ElementTween, Fade, FadeAnimation, MorphEdgesAnimation,
    MoveAnimation, ResizeAnimation, ViewportAnimation,
};

/// A tween over a model.
pub trait Animation: Send + Sync {
    /// Put `model` into the state at progress `t`.
    fn tween(&self, t: f64, model: &mut Model);
}

/// Quadratic ease-in/ease-out.
#[must_use]
pub fn ease_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 { 2.0 * t * t } else { 1.0 - 2.0 * (1.0 - t) * (1.0 - t) }
}

/// Run `animation` on `model` for `duration`. Returns the number of frames.
pub async fn run_animation(
    animation: &dyn Animation,
    model: &mut Model,
    syncer: &dyn FrameSyncer,
    duration: Duration,
    frames: Option<&dyn RenderTarget>,
) -> usize {
    let start = syncer.next_frame().await;
    let mut count = 0;
    loop {
        let now = syncer.next_frame().await;
        let elapsed = now.saturating_duration_since(start);
        let t = if duration.is_zero() { 1.0 } else { (elapsed.as_secs_f64() / duration.as_secs_f64()).min(1.0) };
        animation.tween(ease_in_out(t), model);
        count += 1;
        if t >= 1.0 {
            break;
        }
        if let Some(target) = frames {
            target.update(model, None).await;
        }
    }
    count
}
