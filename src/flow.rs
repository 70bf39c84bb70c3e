//! Application event loop.
//!
//! Wires the platform to the scene: winit drives frames and input, texture
//! loads report back through the event loop proxy and, on the web, the
//! document's scroll events are forwarded the same way.
//!
//! # Lifecycle
//!
//! 1. `resumed` creates the window (bound to the `#bg` canvas on the web) and
//!    the GPU context, then builds the scene
//! 2. every `RedrawRequested` runs one frame of the [`AnimationLoop`]; after
//!    the first frame the moon is added
//! 3. scroll offsets (mouse wheel natively, DOM scroll on the web) go to the
//!    [`ScrollCamera`]
//! 4. finished texture loads are uploaded as they arrive

use std::{fmt::Debug, sync::Arc};

use cgmath::{EuclideanSpace, Point3};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    keyboard::{Key, NamedKey},
    window::Window,
};

use crate::{
    animation::AnimationLoop,
    camera::Camera,
    config::SceneConfig,
    context::Context,
    controls::OrbitControls,
    data_structures::texture::fit_image,
    portfolio::{Portfolio, SceneBuilder},
    render::Renderer,
    resources::{AssetLoader, LoadedTexture, TextureSink},
    scroll::{ScrollCamera, ScrollOutcome},
};

#[cfg(not(target_arch = "wasm32"))]
use crate::scroll::ScrollTracker;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub enum FlowEvent {
    /// The asynchronously created state on the web.
    #[cfg(target_arch = "wasm32")]
    Initialized(Box<AppState>),
    TextureLoaded(LoadedTexture),
    /// New page offset, see [`crate::scroll`].
    Scroll(f32),
}

impl Debug for FlowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(target_arch = "wasm32")]
            Self::Initialized(_) => f.write_str("Initialized"),
            Self::TextureLoaded(loaded) => f
                .debug_struct("TextureLoaded")
                .field("id", &loaded.id)
                .field("path", &loaded.path)
                .field("ok", &loaded.image.is_ok())
                .finish(),
            Self::Scroll(top) => f.debug_tuple("Scroll").field(top).finish(),
        }
    }
}

impl TextureSink for EventLoopProxy<FlowEvent> {
    fn deliver(&self, loaded: LoadedTexture) {
        if let Err(e) = self.send_event(FlowEvent::TextureLoaded(loaded)) {
            log::warn!("texture finished after the event loop closed: {e}");
        }
    }
}

/// Everything that exists once window and GPU are up.
pub struct AppState {
    renderer: Renderer,
    portfolio: Portfolio<OrbitControls>,
    animation: AnimationLoop,
    scroll: ScrollCamera,
    loader: AssetLoader<EventLoopProxy<FlowEvent>>,
    #[cfg(not(target_arch = "wasm32"))]
    tracker: ScrollTracker,
}

impl AppState {
    async fn new(
        window: Arc<Window>,
        config: SceneConfig,
        mut loader: AssetLoader<EventLoopProxy<FlowEvent>>,
    ) -> anyhow::Result<Self> {
        let start = Camera::new(Point3::from_vec(config.camera_start));
        let ctx = Context::new(window.clone(), &config, &start).await?;
        let mut renderer = Renderer::new(ctx);

        let size = window.inner_size();
        let fovy = cgmath::Deg(config.fovy);
        let portfolio = SceneBuilder::new(config.clone()).build(
            [size.width, size.height],
            &mut renderer,
            &mut loader,
            |_, [_, height]| OrbitControls::new(height, fovy),
        );

        Ok(Self {
            renderer,
            animation: AnimationLoop::new(config.frame_spin),
            scroll: ScrollCamera::new(config.scroll_spin, config.scroll_factors),
            #[cfg(not(target_arch = "wasm32"))]
            tracker: ScrollTracker::new(
                config.page_height,
                size.height as f32,
                config.scroll_line_height,
            ),
            portfolio,
            loader,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if self.renderer.resize(width, height) {
            #[cfg(not(target_arch = "wasm32"))]
            self.tracker.resize(height as f32);
        }
    }

    fn frame(&mut self) {
        let window = self.renderer.ctx.window().clone();
        self.animation
            .frame(&mut self.portfolio, window.as_ref(), &mut self.renderer);
        if self.portfolio.moon().is_none() {
            self.portfolio.create_moon(&mut self.loader);
        }
    }

    fn scroll(&mut self, top: f32) {
        if self.scroll.on_scroll(&mut self.portfolio, top) == ScrollOutcome::Deferred {
            log::debug!("scroll event before the scene was ready");
        }
    }

    fn texture_loaded(&mut self, loaded: LoadedTexture) {
        let LoadedTexture {
            id,
            path,
            image,
            elapsed,
        } = loaded;
        match image {
            Ok(image) => {
                log::debug!("{path} loaded in {elapsed:?}");
                let image = fit_image(image, self.renderer.max_texture_size(), &path);
                if self.portfolio.texture_loaded(id, Ok(image.dimensions())) {
                    self.renderer.upload_texture(id, image, &path);
                }
            }
            Err(e) => {
                self.portfolio.texture_loaded(id, Err(format!("{e:#}")));
            }
        }
    }
}

/// Events that arrived before the state handling them exists.
struct Backlog<T> {
    held: Vec<T>,
}

impl<T> Backlog<T> {
    fn new() -> Self {
        Self { held: Vec::new() }
    }

    /// Applies `item` to the state, or holds it until [`replay`](Self::replay).
    fn offer<S>(&mut self, state: Option<&mut S>, item: T, apply: impl FnOnce(&mut S, T)) {
        match state {
            Some(state) => apply(state, item),
            None => self.held.push(item),
        }
    }

    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    fn replay<S>(&mut self, state: &mut S, mut apply: impl FnMut(&mut S, T)) {
        for item in self.held.drain(..) {
            apply(state, item);
        }
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<FlowEvent>,
    state: Option<AppState>,
    textures: Backlog<LoadedTexture>,
    // Taken on the first `resumed`
    config: Option<SceneConfig>,
    failure: Option<anyhow::Error>,
}

impl App {
    fn new(event_loop: &EventLoop<FlowEvent>, config: SceneConfig) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            state: None,
            textures: Backlog::new(),
            config: Some(config),
            failure: None,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("App initialization failed: {error:#}");
        self.failure = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(config) = self.config.take() else {
            return;
        };

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("folio");

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;

            match canvas(config.canvas_id) {
                Ok(canvas) => {
                    window_attributes = window_attributes
                        .with_canvas(Some(canvas))
                        // The page has to keep scrolling while the pointer is over the canvas
                        .with_prevent_default(false);
                }
                Err(e) => return self.fail(event_loop, e),
            }
            if let Err(e) = listen_to_scroll(self.proxy.clone()) {
                log::warn!("scrolling won't move the camera: {e:#}");
            }
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            let loader = AssetLoader::new(self.proxy.clone(), self.async_runtime.handle().clone());
            match self
                .async_runtime
                .block_on(AppState::new(window.clone(), config, loader))
            {
                Ok(state) => self.state = Some(state),
                Err(e) => return self.fail(event_loop, e),
            }
            window.request_redraw();
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let loader = AssetLoader::new(proxy.clone());
                match AppState::new(window, config, loader).await {
                    Ok(state) => {
                        if proxy
                            .send_event(FlowEvent::Initialized(Box::new(state)))
                            .is_err()
                        {
                            log::error!("the event loop closed during initialization");
                        }
                    }
                    Err(e) => log::error!("App initialization failed: {e:#}"),
                }
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: FlowEvent) {
        match event {
            #[cfg(target_arch = "wasm32")]
            FlowEvent::Initialized(state) => {
                // This is the message from our wasm `spawn_local`
                let state = self.state.insert(*state);
                let window = state.renderer.ctx.window().clone();
                let size = window.inner_size();
                state.resize(size.width, size.height);
                self.textures.replay(state, AppState::texture_loaded);
                window.request_redraw();
            }
            FlowEvent::TextureLoaded(loaded) => {
                if self.state.is_none() {
                    log::debug!("{} arrived before the scene, holding it", loaded.path);
                }
                self.textures
                    .offer(self.state.as_mut(), loaded, AppState::texture_loaded);
            }
            FlowEvent::Scroll(top) => match &mut self.state {
                Some(state) => state.scroll(top),
                None => log::debug!("scroll to {top} before the scene exists"),
            },
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        state.portfolio.controls.handle_window_event(&event);

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            #[cfg(not(target_arch = "wasm32"))]
            WindowEvent::MouseWheel { delta, .. } => {
                if let Some(top) = state.tracker.wheel(delta) {
                    state.scroll(top);
                }
            }
            WindowEvent::RedrawRequested => state.frame(),
            _ => {}
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn canvas(id: &str) -> anyhow::Result<web_sys::HtmlCanvasElement> {
    use anyhow::Context as _;

    let document = web_sys::window()
        .and_then(|window| window.document())
        .context("no document to render into")?;
    let element = document
        .get_element_by_id(id)
        .with_context(|| format!("the page has no element with id {id:?}"))?;
    element
        .dyn_into::<web_sys::HtmlCanvasElement>()
        .map_err(|_| anyhow::anyhow!("#{id} is not a canvas"))
}

/// Forwards the document's scroll offset to the event loop.
#[cfg(target_arch = "wasm32")]
fn listen_to_scroll(proxy: EventLoopProxy<FlowEvent>) -> anyhow::Result<()> {
    use anyhow::Context as _;
    use wasm_bindgen::closure::Closure;

    let document = web_sys::window()
        .and_then(|window| window.document())
        .context("no document to listen to")?;
    let on_scroll = Closure::<dyn FnMut(web_sys::Event)>::new(move |_: web_sys::Event| {
        let Some(body) = web_sys::window()
            .and_then(|window| window.document())
            .and_then(|document| document.body())
        else {
            return;
        };
        let top = body.get_bounding_client_rect().top() as f32;
        if proxy.send_event(FlowEvent::Scroll(top)).is_err() {
            log::warn!("scrolled after the event loop closed");
        }
    });
    document
        .add_event_listener_with_callback("scroll", on_scroll.as_ref().unchecked_ref())
        .map_err(|e| anyhow::anyhow!("cannot listen to scroll events: {e:?}"))?;
    // Lives as long as the page
    on_scroll.forget();
    Ok(())
}

pub fn run() -> anyhow::Result<()> {
    run_with(SceneConfig::default())
}

pub fn run_with(config: SceneConfig) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("Could not initialize logger: {e}").into());
        }
    }

    let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;

    let mut app = App::new(&event_loop, config)?;

    event_loop.run_app(&mut app)?;

    match app.failure.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), JsValue> {
    run().map_err(|e| JsValue::from_str(&format!("{e:#}")))
}
