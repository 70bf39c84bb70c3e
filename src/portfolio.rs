//! Assembly of the portfolio scene.
//!
//! [`SceneBuilder`] performs the startup sequence and hands back a
//! [`Portfolio`], the single owner of scene, camera, controls and the handles
//! the animation and scroll handlers mutate. The moon is not part of the
//! startup sequence: it's created once the frame loop runs, see
//! [`Portfolio::create_moon`].

use cgmath::{EuclideanSpace, Point3, Vector3};

use crate::{
    camera::Camera,
    config::{SceneConfig, TORUS_COLOUR, WHITE, rgb},
    controls::CameraControls,
    data_structures::{
        geometry::Geometry,
        model::Material,
        scene_graph::{AmbientLight, Background, Node, NodeId, NodeKind, PointLight, Scene},
    },
    render::SceneRenderer,
    resources::texture::{TextureId, TextureLoader},
};

const GRID_CENTRE_COLOUR: u32 = 0x444444;
const GRID_LINE_COLOUR: u32 = 0x888888;

/// Uniformly distributed in `(-range / 2, range / 2]`.
pub fn spread(rng: &mut fastrand::Rng, range: f32) -> f32 {
    range * (0.5 - rng.f32())
}

pub struct SceneBuilder {
    config: SceneConfig,
    rng: fastrand::Rng,
}

impl SceneBuilder {
    pub fn new(config: SceneConfig) -> Self {
        Self {
            config,
            rng: fastrand::Rng::new(),
        }
    }

    /// Makes star placement reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = fastrand::Rng::with_seed(seed);
        self
    }

    /// Runs the startup sequence.
    ///
    /// `bind_controls` is called once the scene is lit and gridded, with the
    /// camera and the surface size, and returns the controls driving the camera.
    pub fn build<C, F>(
        mut self,
        surface_size: [u32; 2],
        renderer: &mut dyn SceneRenderer,
        loader: &mut dyn TextureLoader,
        bind_controls: F,
    ) -> Portfolio<C>
    where
        C: CameraControls,
        F: FnOnce(&Camera, [u32; 2]) -> C,
    {
        let config = &self.config;
        let mut scene = Scene::new();
        let camera = Camera::new(Point3::from_vec(config.camera_start));

        if let Err(e) = renderer.render(&scene, &camera) {
            log::error!("Unable to render the empty scene: {e:#}");
        }

        let torus = scene.add_geometry(Geometry::Torus {
            radius: config.torus_radius,
            tube: config.torus_tube,
            radial_segments: config.torus_radial_segments,
            tubular_segments: config.torus_tubular_segments,
        });
        let torus_material =
            scene.add_material(Material::standard("torus", rgb(TORUS_COLOUR)).with_wireframe());
        let torus = scene.add(Node::mesh("torus", torus, torus_material));

        let white = rgb(WHITE);
        let point_light = scene.add(
            Node::new(
                "point light",
                NodeKind::PointLight(PointLight {
                    colour: white,
                    intensity: 1.0,
                    // No distance attenuation
                    decay: 0.0,
                }),
            )
            .at(config.point_light_position),
        );
        scene.add(Node::new(
            "ambient light",
            NodeKind::AmbientLight(AmbientLight {
                colour: white,
                intensity: 1.0,
            }),
        ));
        let helper_geometry = scene.add_geometry(Geometry::Sphere {
            radius: config.point_light_helper_size,
            width_segments: 4,
            height_segments: 2,
        });
        let helper_material =
            scene.add_material(Material::basic("point light helper", white).with_wireframe());
        scene.add(Node::new(
            "point light helper",
            NodeKind::Helper {
                geometry: helper_geometry,
                material: helper_material,
                follows: Some(point_light),
            },
        ));

        let grid = scene.add_geometry(Geometry::Grid {
            size: config.grid_size,
            divisions: config.grid_divisions,
            centre_colour: rgb(GRID_CENTRE_COLOUR),
            line_colour: rgb(GRID_LINE_COLOUR),
        });
        let grid_material = scene.add_material(Material::basic("grid helper", white));
        scene.add(Node::new(
            "grid helper",
            NodeKind::Helper {
                geometry: grid,
                material: grid_material,
                follows: None,
            },
        ));
        scene.sync_helpers();

        let controls = bind_controls(&camera, surface_size);

        let background = scene.textures.load(loader, config.background_texture);
        scene.background = Background::Texture(background);

        let cube_texture = scene.textures.load(loader, config.cube_texture);
        let cube = scene.add_geometry(Geometry::Box {
            width: config.cube_size,
            height: config.cube_size,
            depth: config.cube_size,
        });
        let cube_material = scene.add_material(Material::basic("cube", white).with_map(cube_texture));
        let cube = scene.add(Node::mesh("cube", cube, cube_material));

        let star = scene.add_geometry(Geometry::Sphere {
            radius: config.star_radius,
            width_segments: config.star_segments,
            height_segments: config.star_segments,
        });
        let star_material = scene.add_material(Material::standard("star", white));
        for _ in 0..config.star_count {
            let position = Vector3::new(
                spread(&mut self.rng, config.star_spread),
                spread(&mut self.rng, config.star_spread),
                spread(&mut self.rng, config.star_spread),
            );
            scene.add(Node::mesh("star", star, star_material).at(position));
        }
        log::info!(
            "scene built with {} entities and {} textures requested",
            scene.len(),
            scene.textures.len()
        );

        Portfolio {
            scene,
            camera,
            controls,
            config: self.config,
            torus,
            cube,
            moon: None,
        }
    }
}

/// The running scene and everything the frame and scroll handlers touch.
pub struct Portfolio<C: CameraControls> {
    pub scene: Scene,
    pub camera: Camera,
    pub controls: C,
    pub config: SceneConfig,
    torus: NodeId,
    cube: NodeId,
    moon: Option<NodeId>,
}

impl<C: CameraControls> Portfolio<C> {
    pub fn torus(&self) -> NodeId {
        self.torus
    }

    pub fn cube(&self) -> NodeId {
        self.cube
    }

    /// `None` until [`create_moon`](Self::create_moon) ran.
    pub fn moon(&self) -> Option<NodeId> {
        self.moon
    }

    /// Adds the textured moon. Only the first call creates it.
    pub fn create_moon(&mut self, loader: &mut dyn TextureLoader) -> NodeId {
        if let Some(moon) = self.moon {
            log::warn!("the moon exists already");
            return moon;
        }
        let config = &self.config;
        let texture = self.scene.textures.load(loader, config.moon_texture);
        let geometry = self.scene.add_geometry(Geometry::Sphere {
            radius: config.moon_radius,
            width_segments: config.moon_segments,
            height_segments: config.moon_segments,
        });
        let material = self
            .scene
            .add_material(Material::standard("moon", rgb(WHITE)).with_map(texture));
        let moon = self
            .scene
            .add(Node::mesh("moon", geometry, material).at(config.moon_position));
        log::info!("moon created at {:?}", config.moon_position);
        self.moon = Some(moon);
        moon
    }

    /// Records a finished texture load. Returns whether the texture is usable.
    pub fn texture_loaded(&mut self, id: TextureId, outcome: Result<(u32, u32), String>) -> bool {
        self.scene.textures.resolve(id, outcome) && self.scene.textures.is_ready(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spread_stays_within_half_the_range() {
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..10_000 {
            let value = spread(&mut rng, 100.0);
            assert!(value > -50.0 && value <= 50.0, "{value}");
        }
    }

    #[test]
    fn spread_uses_both_signs() {
        let mut rng = fastrand::Rng::with_seed(1);
        let values: Vec<f32> = (0..100).map(|_| spread(&mut rng, 100.0)).collect();
        assert!(values.iter().any(|v| *v < 0.0));
        assert!(values.iter().any(|v| *v > 0.0));
    }
}
