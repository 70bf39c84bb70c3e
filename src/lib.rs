//! folio-scene
//!
//! A scroll-driven 3D portfolio backdrop rendered with wgpu, natively and in
//! the browser. A wireframe torus spins in a field of stars next to a textured
//! cube and moon; scrolling the page flies the camera through the scene.
//!
//! High-level modules
//! - `portfolio`: builds the scene and owns it while the app runs
//! - `animation`: the per-frame update
//! - `scroll`: camera movement and rotations driven by the page offset
//! - `controls`: orbit controls for the camera
//! - `camera`: camera, projection and their uniform
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: scene data (geometry, materials, instances, textures)
//! - `pipelines`: the mesh, line and background pipelines
//! - `resources`: asynchronous texture loading
//! - `render`: batching the scene into instanced draw calls
//! - `flow`: the winit event loop
//! - `config`: every constant of the scene

pub mod animation;
pub mod camera;
pub mod config;
pub mod context;
pub mod controls;
pub mod data_structures;
pub mod flow;
pub mod pipelines;
pub mod portfolio;
pub mod render;
pub mod resources;
pub mod scroll;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::{Point3, Vector3};
pub use config::SceneConfig;
pub use flow::{run, run_with};
