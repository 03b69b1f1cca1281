//! Application event loop.
//!
//! The [`App`] owns the window, the GPU [`Context`] and the frame scheduler.
//! Startup runs in three steps:
//! 1. `resumed` creates the window and the context
//! 2. the asset manifest is loaded in the background; its single result comes
//!    back as an [`AppEvent::AssetsLoaded`] user event
//! 3. the passes are configured, the scheduler starts and redraws begin
//!
//! From then on every `RedrawRequested` runs exactly one scheduler tick and
//! requests the next redraw.

use std::sync::Arc;

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

use crate::{
    assets::{DemoAsset, DemoAssets, demo_manifest},
    config::DemoConfig,
    context::{Context, InitContext},
    data_structures::texture::TextureBinding,
    error::{AssetLoadError, DrawError},
    frame::FrameScheduler,
    render::{Passes, render},
    resources::manifest::Assets,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub(crate) enum AppEvent {
    /// The context finished initialising on the web, where it cannot be
    /// awaited inside `resumed`.
    #[allow(dead_code)]
    Initialized(anyhow::Result<Context>),
    AssetsLoaded(Result<Assets<DemoAsset>, AssetLoadError>),
}

impl std::fmt::Debug for AppEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(ctx) => f
                .debug_tuple("Initialized")
                .field(&ctx.as_ref().map(|_| "Context"))
                .finish(),
            Self::AssetsLoaded(assets) => f
                .debug_tuple("AssetsLoaded")
                .field(&assets.as_ref().map(Assets::len))
                .finish(),
        }
    }
}

/// Window, context and frame loop state once the context exists.
#[derive(Debug)]
pub(crate) struct AppState {
    pub(crate) ctx: Context,
    passes: Option<Passes>,
    scheduler: FrameScheduler<TextureBinding>,
    started: Instant,
    last_time: Instant,
}

impl AppState {
    fn new(ctx: Context) -> Self {
        let now = Instant::now();
        Self {
            ctx,
            passes: None,
            scheduler: FrameScheduler::new(),
            started: now,
            last_time: now,
        }
    }

    /// Configures the passes from the loaded assets and leaves the
    /// awaiting state.
    fn start(&mut self, assets: Assets<DemoAsset>) -> anyhow::Result<()> {
        let DemoAssets { cube, texture } = DemoAssets::try_from(assets)?;
        let passes = Passes::configure(
            &self.ctx.device,
            self.ctx.config.format,
            self.ctx.layouts(),
            &cube,
        )?;
        self.passes = Some(passes);
        self.scheduler.start(texture);

        let now = Instant::now();
        self.started = now;
        self.last_time = now;
        self.ctx.window.request_redraw();
        Ok(())
    }

    fn redraw(&mut self) -> Result<(), DrawError> {
        let Some(passes) = &mut self.passes else {
            return Ok(());
        };
        let dt = self.last_time.elapsed();
        self.last_time = Instant::now();
        let time = self.started.elapsed().as_secs_f32();

        let result = render(&mut self.ctx, passes, &mut self.scheduler, time, dt);
        self.ctx.window.request_redraw();
        result.map(|_| ())
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<AppEvent>,
    config: DemoConfig,
    state: Option<AppState>,
    initializing: bool,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(event_loop: &EventLoop<AppEvent>, config: DemoConfig) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy,
            config,
            state: None,
            initializing: false,
            error: None,
        })
    }

    /// Records a fatal error and stops the event loop.
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.error = Some(error);
        event_loop.exit();
    }

    /// Stores the fresh context and starts loading assets against it.
    fn on_context(&mut self, ctx: Context) {
        let manifest = demo_manifest(self.config.asset_root.clone(), InitContext::from(&ctx));
        let proxy = self.proxy.clone();
        let load = async move {
            let result = manifest.load().await;
            if let Err(e) = result.as_ref() {
                log::debug!("asset load failed: {e}");
            }
            if proxy.send_event(AppEvent::AssetsLoaded(result)).is_err() {
                log::warn!("event loop closed before the assets arrived");
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        self.async_runtime.spawn(load);
        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(load);

        self.state = Some(AppState::new(ctx));
        self.initializing = false;
    }
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() || self.initializing {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title(&self.config.title);

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };
        self.initializing = true;

        #[cfg(not(target_arch = "wasm32"))]
        {
            let config = self.config.clone();
            match self
                .async_runtime
                .block_on(async move { Context::new(window, &config).await })
            {
                Ok(ctx) => self.on_context(ctx),
                Err(e) => self.fail(event_loop, e),
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            let config = self.config.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let ctx = Context::new(window, &config).await;
                assert!(proxy.send_event(AppEvent::Initialized(ctx)).is_ok());
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::Initialized(Ok(mut ctx)) => {
                // the canvas only has its real size once it is attached
                let size = ctx.window.inner_size();
                ctx.resize(size.width, size.height);
                self.on_context(ctx);
            }
            AppEvent::Initialized(Err(e)) => self.fail(event_loop, e),
            AppEvent::AssetsLoaded(Ok(assets)) => {
                let Some(state) = &mut self.state else {
                    return;
                };
                if let Err(e) = state.start(assets) {
                    self.fail(event_loop, e);
                }
            }
            AppEvent::AssetsLoaded(Err(e)) => self.fail(event_loop, e.into()),
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

        state.ctx.camera.handle_window_events(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                state.ctx.resize(size.width, size.height);
            }
            // stale, lost and occluded surfaces are handled inside `render`
            WindowEvent::RedrawRequested => {
                if let Err(e) = state.redraw() {
                    self.fail(event_loop, e.into());
                }
            }
            _ => {}
        }
    }
}

/// Opens the demo window and runs until it is closed or a fatal error occurs.
pub fn run(config: DemoConfig) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<AppEvent> = EventLoop::with_user_event().build()?;

    let mut app = App::new(&event_loop, config)?;
    log::info!("starting {}", app.config.title);

    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
