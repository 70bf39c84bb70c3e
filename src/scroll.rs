//! Scroll driven camera movement.
//!
//! The page scroll offset `t` is the top edge of the document body relative to
//! the viewport: `0` at the top of the page and negative further down. On the
//! web it comes straight from the DOM. Natively there is no page, so
//! [`ScrollTracker`] keeps a virtual one that the mouse wheel scrolls.

use cgmath::Vector3;
use winit::event::MouseScrollDelta;

use crate::{controls::CameraControls, portfolio::Portfolio};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollOutcome {
    Applied,
    /// The moon doesn't exist yet; nothing was changed.
    Deferred,
}

/// Moves the camera and spins moon and cube on every scroll event.
#[derive(Clone, Debug)]
pub struct ScrollCamera {
    spin: Vector3<f32>,
    factors: Vector3<f32>,
}

impl ScrollCamera {
    pub fn new(spin: Vector3<f32>, factors: Vector3<f32>) -> Self {
        Self { spin, factors }
    }

    /// Handles one scroll event at offset `t`.
    ///
    /// The rotation is added per event, while the camera position is assigned
    /// from `t` alone and therefore only depends on the latest offset.
    pub fn on_scroll<C: CameraControls>(
        &self,
        portfolio: &mut Portfolio<C>,
        t: f32,
    ) -> ScrollOutcome {
        let Some(moon) = portfolio.moon() else {
            log::debug!("scroll to {t} deferred, the moon isn't there yet");
            return ScrollOutcome::Deferred;
        };
        let cube = portfolio.cube();
        for (name, id) in [("moon", moon), ("cube", cube)] {
            match portfolio.scene.transform_mut(id) {
                Some(transform) => transform.rotate(self.spin),
                None => log::warn!("the {name} is not part of the scene"),
            }
        }

        portfolio.camera.position.x = t * self.factors.x;
        portfolio.camera.position.y = t * self.factors.y;
        portfolio.camera.position.z = t * self.factors.z;
        log::trace!("scrolled to {t}, camera at {:?}", portfolio.camera.position);
        ScrollOutcome::Applied
    }
}

/// A virtual page scrolled with the mouse wheel.
#[derive(Clone, Debug, PartialEq)]
pub struct ScrollTracker {
    top: f32,
    page_height: f32,
    viewport_height: f32,
    line_height: f32,
}

impl ScrollTracker {
    pub fn new(page_height: f32, viewport_height: f32, line_height: f32) -> Self {
        Self {
            top: 0.0,
            page_height,
            viewport_height,
            line_height,
        }
    }

    /// Current offset of the page top, `0` or below.
    pub fn top(&self) -> f32 {
        self.top
    }

    fn lowest(&self) -> f32 {
        -(self.page_height - self.viewport_height).max(0.0)
    }

    pub fn resize(&mut self, viewport_height: f32) {
        self.viewport_height = viewport_height;
        self.top = self.top.clamp(self.lowest(), 0.0);
    }

    /// Scrolls by a wheel event. Returns the new offset if the page moved.
    ///
    /// Wheel up (positive delta) scrolls towards the top of the page.
    pub fn wheel(&mut self, delta: MouseScrollDelta) -> Option<f32> {
        let pixels = match delta {
            MouseScrollDelta::LineDelta(_, lines) => lines * self.line_height,
            MouseScrollDelta::PixelDelta(position) => position.y as f32,
        };
        self.scroll_by(pixels)
    }

    pub fn scroll_by(&mut self, pixels: f32) -> Option<f32> {
        let top = (self.top + pixels).clamp(self.lowest(), 0.0);
        if top == self.top {
            return None;
        }
        self.top = top;
        Some(top)
    }
}

#[cfg(test)]
mod tests {
    use winit::dpi::PhysicalPosition;

    use super::*;

    fn tracker() -> ScrollTracker {
        ScrollTracker::new(6000.0, 1000.0, 40.0)
    }

    #[test]
    fn wheel_down_moves_the_page_up() {
        let mut tracker = tracker();
        assert_eq!(tracker.wheel(MouseScrollDelta::LineDelta(0.0, -3.0)), Some(-120.0));
        assert_eq!(
            tracker.wheel(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -30.0))),
            Some(-150.0)
        );
    }

    #[test]
    fn page_stops_at_both_ends() {
        let mut tracker = tracker();
        assert_eq!(tracker.scroll_by(50.0), None);
        assert_eq!(tracker.scroll_by(-10_000.0), Some(-5000.0));
        assert_eq!(tracker.scroll_by(-1.0), None);
        assert_eq!(tracker.top(), -5000.0);
    }

    #[test]
    fn growing_viewport_pulls_the_page_back() {
        let mut tracker = tracker();
        tracker.scroll_by(-5000.0);
        tracker.resize(2000.0);
        assert_eq!(tracker.top(), -4000.0);
        tracker.resize(8000.0);
        assert_eq!(tracker.top(), 0.0);
    }
}
