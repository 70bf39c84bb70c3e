//! The per-frame update.

use cgmath::Vector3;

use crate::{
    controls::CameraControls,
    portfolio::Portfolio,
    render::{FrameScheduler, SceneRenderer},
};

/// Spins the torus, applies the controls and draws, once per frame.
#[derive(Clone, Debug)]
pub struct AnimationLoop {
    spin: Vector3<f32>,
    frames: u64,
}

impl AnimationLoop {
    pub fn new(spin: Vector3<f32>) -> Self {
        Self { spin, frames: 0 }
    }

    /// Number of frames run so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// One frame. The next frame is requested before anything else so a
    /// failing render never stops the loop.
    pub fn frame<C: CameraControls>(
        &mut self,
        portfolio: &mut Portfolio<C>,
        scheduler: &dyn FrameScheduler,
        renderer: &mut dyn SceneRenderer,
    ) {
        scheduler.request_frame();
        self.frames += 1;

        let torus = portfolio.torus();
        match portfolio.scene.transform_mut(torus) {
            Some(transform) => transform.rotate(self.spin),
            None => log::warn!("the torus is not part of the scene"),
        }

        portfolio.controls.update(&mut portfolio.camera);
        portfolio.scene.sync_helpers();

        if let Err(e) = renderer.render(&portfolio.scene, &portfolio.camera) {
            log::error!("Unable to render frame {}: {e:#}", self.frames);
        }
    }
}
