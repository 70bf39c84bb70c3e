//! Scene data structures: geometry, materials, textures and instances.
//!
//! - `geometry` describes primitive shapes and tessellates them into vertices
//! - `instance` holds per-entity transformation data
//! - `model` contains vertex/material definitions and their GPU counterparts
//! - `scene_graph` owns every entity of the scene
//! - `texture` wraps GPU textures and their creation

pub mod geometry;
pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod texture;
