use std::{cell::RefCell, rc::Rc};

use folio_scene::{
    camera::Camera,
    config::SceneConfig,
    controls::CameraControls,
    data_structures::scene_graph::Scene,
    portfolio::{Portfolio, SceneBuilder},
    render::{FrameScheduler, SceneRenderer},
    resources::texture::{TextureId, TextureLoader},
    Point3, Vector3,
};

/// Order of calls across the fakes sharing one log.
pub type CallLog = Rc<RefCell<Vec<Call>>>;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Call {
    RequestFrame,
    ControlsUpdate,
    Render,
}

/// What the scene looked like when it was rendered.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub entities: usize,
    pub camera: Point3<f32>,
}

#[derive(Default)]
pub struct RecordingRenderer {
    pub log: CallLog,
    pub snapshots: Vec<Snapshot>,
    pub fail: bool,
}

impl RecordingRenderer {
    pub fn with_log(log: CallLog) -> Self {
        Self {
            log,
            ..Default::default()
        }
    }
}

impl SceneRenderer for RecordingRenderer {
    fn render(&mut self, scene: &Scene, camera: &Camera) -> anyhow::Result<()> {
        self.log.borrow_mut().push(Call::Render);
        self.snapshots.push(Snapshot {
            entities: scene.len(),
            camera: camera.position,
        });
        if self.fail {
            anyhow::bail!("surface lost for good");
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingScheduler {
    pub log: CallLog,
}

impl FrameScheduler for RecordingScheduler {
    fn request_frame(&self) {
        self.log.borrow_mut().push(Call::RequestFrame);
    }
}

#[derive(Default)]
pub struct RecordingLoader {
    pub requests: Vec<(TextureId, String)>,
}

impl TextureLoader for RecordingLoader {
    fn request(&mut self, id: TextureId, path: &str) {
        self.requests.push((id, path.to_string()));
    }
}

/// Controls that never move the camera, only note that they were asked to.
#[derive(Default)]
pub struct RecordingControls {
    pub log: CallLog,
    pub bound_to: Option<[u32; 2]>,
}

impl CameraControls for RecordingControls {
    fn update(&mut self, _camera: &mut Camera) {
        self.log.borrow_mut().push(Call::ControlsUpdate);
    }
}

pub const SURFACE: [u32; 2] = [1280, 720];

pub struct Harness {
    pub portfolio: Portfolio<RecordingControls>,
    pub renderer: RecordingRenderer,
    pub loader: RecordingLoader,
    pub scheduler: RecordingScheduler,
    pub log: CallLog,
}

/// Runs the startup sequence against the fakes.
pub fn build(seed: u64) -> Harness {
    build_with(SceneConfig::default(), seed)
}

pub fn build_with(config: SceneConfig, seed: u64) -> Harness {
    let log = CallLog::default();
    let mut renderer = RecordingRenderer::with_log(log.clone());
    let mut loader = RecordingLoader::default();
    let controls_log = log.clone();
    let portfolio = SceneBuilder::new(config).with_seed(seed).build(
        SURFACE,
        &mut renderer,
        &mut loader,
        |_, size| RecordingControls {
            log: controls_log,
            bound_to: Some(size),
        },
    );
    Harness {
        portfolio,
        renderer,
        loader,
        scheduler: RecordingScheduler { log: log.clone() },
        log,
    }
}

pub fn approx_eq(a: Vector3<f32>, b: Vector3<f32>, epsilon: f32) -> bool {
    (a.x - b.x).abs() <= epsilon && (a.y - b.y).abs() <= epsilon && (a.z - b.z).abs() <= epsilon
}
