//! Render pipelines and their uniforms.
//!
//! - `basic` builds the mesh and line pipelines every scene entity is drawn with
//! - `light` holds the point/ambient light uniform
//! - `background` draws the scene background image

pub mod background;
pub mod basic;
pub mod light;
