//! App struct: mounting onto a host node and the frame loop.
//!
//! [`App`] finds the host node, renders the root body into it, and drives the
//! renderer once per frame while computations are pending. The loop waits on
//! a [`NotifyClock`] so an idle app does no work.

use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::body::{IntoBody, NodeRef};
use crate::reactive::{set_frame_clock, NotifyClock};
use crate::render::{FlushReport, RenderError, Renderer, Target};

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

/// Configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Id of the host node the app renders into.
    pub host_id: String,
    /// Target frames per second for the render loop.
    pub fps: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host_id: "app".to_owned(),
            fps: 60,
        }
    }
}

impl AppConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the host node id (builder).
    pub fn with_host_id(mut self, host_id: impl Into<String>) -> Self {
        self.host_id = host_id.into();
        self
    }

    /// Set the target FPS (builder).
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Time between frames. A zero FPS is treated as one.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }
}

/// Errors from mounting or running an app.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("host node #{0} not found")]
    MissingHost(String),
    #[error(transparent)]
    Render(#[from] RenderError),
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// A mounted application.
pub struct App<T: Target> {
    renderer: Renderer<T>,
    host: T::Node,
    root: NodeRef,
    clock: Rc<NotifyClock>,
    /// Application configuration.
    pub config: AppConfig,
    running: bool,
}

impl<T: Target> App<T> {
    /// Find the host node, install the frame clock, and render `body`.
    ///
    /// Fails with [`AppError::MissingHost`] before anything is built or
    /// rendered when the host does not exist.
    pub fn mount(target: T, config: AppConfig, body: impl IntoBody) -> Result<Self, AppError> {
        let host = target
            .find_host(&config.host_id)
            .ok_or_else(|| AppError::MissingHost(config.host_id.clone()))?;

        let clock = Rc::new(NotifyClock::new());
        set_frame_clock(clock.clone());

        let mut renderer = Renderer::new(target);
        let root = renderer.render(&host, body)?;
        debug!(host = %config.host_id, fps = config.fps, "mounted app");

        Ok(Self {
            renderer,
            host,
            root,
            clock,
            config,
            running: true,
        })
    }

    pub fn renderer(&self) -> &Renderer<T> {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer<T> {
        &mut self.renderer
    }

    pub fn target(&self) -> &T {
        self.renderer.target()
    }

    pub fn target_mut(&mut self) -> &mut T {
        self.renderer.target_mut()
    }

    /// The host node the app renders into.
    pub fn host(&self) -> &T::Node {
        &self.host
    }

    /// The root body node as first rendered.
    pub fn root(&self) -> NodeRef {
        self.root
    }

    /// Flush if a frame is armed.
    pub fn tick(&mut self) -> Result<Option<FlushReport>, AppError> {
        Ok(self.renderer.run_frame()?)
    }

    /// Whether the app should quit.
    pub fn should_quit(&self) -> bool {
        !self.running
    }

    /// Request the app to quit after the current frame.
    pub fn request_quit(&mut self) {
        self.running = false;
    }

    /// Run frames until `shutdown` resolves or [`request_quit`](Self::request_quit)
    /// is called.
    ///
    /// Each wake-up waits for the next frame boundary, so all writes made
    /// within one frame are flushed together.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<(), AppError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut interval = tokio::time::interval(self.config.frame_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let clock = Rc::clone(&self.clock);

        while !self.should_quit() {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = clock.notified() => {
                    interval.tick().await;
                    if let Some(report) = self.tick()? {
                        debug!(rebuilt = report.rebuilt, skipped = report.skipped, "frame");
                    }
                }
            }
        }
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
