//! Scene constants.
//!
//! Everything that shapes the portfolio scene lives in [`SceneConfig`]. The
//! `Default` implementation is the scene as it is shipped; tests and demos can
//! tweak single fields with struct update syntax.

use cgmath::Vector3;

/// Environment variable overriding the native asset root.
pub const ASSET_ROOT_ENV: &str = "FOLIO_ASSETS";

/// Tomato.
pub const TORUS_COLOUR: u32 = 0xff6347;
pub const WHITE: u32 = 0xffffff;

#[derive(Clone, Debug)]
pub struct SceneConfig {
    /// Id of the canvas element the renderer binds to on the web.
    pub canvas_id: &'static str,
    pub background_texture: &'static str,
    pub cube_texture: &'static str,
    pub moon_texture: &'static str,

    /// Vertical field of view in degrees.
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
    pub camera_start: Vector3<f32>,

    pub torus_radius: f32,
    pub torus_tube: f32,
    pub torus_radial_segments: u32,
    pub torus_tubular_segments: u32,

    pub point_light_position: Vector3<f32>,
    pub point_light_helper_size: f32,
    pub grid_size: f32,
    pub grid_divisions: u32,

    pub cube_size: f32,

    pub star_count: usize,
    pub star_radius: f32,
    pub star_segments: u32,
    /// Full width of the interval each star coordinate is drawn from.
    pub star_spread: f32,

    pub moon_radius: f32,
    pub moon_segments: u32,
    pub moon_position: Vector3<f32>,

    /// Torus rotation added every frame, in radians.
    pub frame_spin: Vector3<f32>,
    /// Moon and cube rotation added on every scroll event, in radians.
    pub scroll_spin: Vector3<f32>,
    /// Camera position per unit of scroll offset, `(x, y, z)`.
    pub scroll_factors: Vector3<f32>,

    /// Height of the virtual page scrolled by the mouse wheel on native targets.
    pub page_height: f32,
    /// Pixels scrolled per wheel line.
    pub scroll_line_height: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            canvas_id: "bg",
            background_texture: "rockylaying.jpg",
            cube_texture: "aadilstanding.jpg",
            moon_texture: "canvasparticle-min.png",

            fovy: 75.0,
            znear: 0.1,
            zfar: 1000.0,
            camera_start: Vector3::new(0.0, 0.0, 30.0),

            torus_radius: 10.0,
            torus_tube: 3.0,
            torus_radial_segments: 16,
            torus_tubular_segments: 100,

            point_light_position: Vector3::new(5.0, 5.0, 5.0),
            point_light_helper_size: 1.0,
            grid_size: 200.0,
            grid_divisions: 50,

            cube_size: 3.0,

            star_count: 200,
            star_radius: 0.25,
            star_segments: 24,
            star_spread: 100.0,

            moon_radius: 3.0,
            moon_segments: 32,
            moon_position: Vector3::new(-10.0, 0.0, 30.0),

            frame_spin: Vector3::new(0.01, 0.005, 0.01),
            scroll_spin: Vector3::new(0.05, 0.075, 0.05),
            scroll_factors: Vector3::new(-0.0002, -0.0002, -0.01),

            page_height: 6000.0,
            scroll_line_height: 40.0,
        }
    }
}

/// Converts a `0xRRGGBB` colour into linear-ish float components.
pub fn rgb(hex: u32) -> [f32; 3] {
    let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
    [channel(16), channel(8), channel(0)]
}
