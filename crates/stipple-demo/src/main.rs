//! Stipple demo: a squashing textured quad with instanced soft dots on top.
//!
//! Keys:
//! - Space: spawn a burst of random dots
//! - C: clear the dots
//! - Tab: show the checkerboard or the offscreen dot canvas on the quad
//! - Escape: quit

mod config;
mod scene;

use anyhow::Result;
use rand::Rng;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::keyboard::{Key, NamedKey};

use stipple_engine::coords::{ColorRgba, Vec2};
use stipple_engine::core::{App, AppControl, FrameCtx};
use stipple_engine::device::GpuInit;
use stipple_engine::logging::{init_logging, LoggingConfig};
use stipple_engine::render::{DotBatch, DotInstance};
use stipple_engine::window::{Runtime, RuntimeConfig};

use config::DemoConfig;
use scene::Scene;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = DemoConfig::default();
    log::info!(
        "Space spawns {} dots, C clears, Tab switches the quad texture, Escape quits",
        config.dots_per_press
    );

    Runtime::run(
        RuntimeConfig {
            title: "stipple demo".to_string(),
            ..RuntimeConfig::default()
        },
        GpuInit::default(),
        DemoApp::new(config),
    )
}

struct DemoApp {
    config: DemoConfig,
    scene: Option<Scene>,
    dots: DotBatch,
    angle: f32,
    toggle_requested: bool,
    logged_count: usize,
}

impl DemoApp {
    fn new(config: DemoConfig) -> Self {
        Self {
            config,
            scene: None,
            dots: DotBatch::new(),
            angle: 0.0,
            toggle_requested: false,
            logged_count: 0,
        }
    }

    fn spawn_dots(&mut self) {
        let mut rng = rand::rng();
        let cfg = &self.config;
        let burst: Vec<DotInstance> = (0..cfg.dots_per_press)
            .map(|_| {
                DotInstance::new(
                    Vec2::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0)),
                    rng.random_range(cfg.radius.clone()),
                    rng.random_range(cfg.hardness.clone()),
                    ColorRgba::new(
                        rng.random_range(0.0..1.0),
                        rng.random_range(0.0..1.0),
                        rng.random_range(0.0..1.0),
                        rng.random_range(0.0..1.0),
                    ),
                )
            })
            .collect();
        self.dots.extend(burst);
    }

    fn log_count(&mut self) {
        if self.dots.len() != self.logged_count {
            self.logged_count = self.dots.len();
            log::info!("{} dots", self.logged_count);
        }
    }

    fn on_key(&mut self, event: &KeyEvent) -> AppControl {
        if event.state != ElementState::Pressed || event.repeat {
            return AppControl::Continue;
        }

        match &event.logical_key {
            Key::Named(NamedKey::Escape) => return AppControl::Exit,
            Key::Named(NamedKey::Space) => self.spawn_dots(),
            Key::Named(NamedKey::Tab) => self.toggle_requested = true,
            Key::Character(c) if c.eq_ignore_ascii_case("c") => self.dots.clear(),
            _ => {}
        }
        self.log_count();
        AppControl::Continue
    }
}

impl App for DemoApp {
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::KeyboardInput { event, .. } => self.on_key(event),
            _ => AppControl::Continue,
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.scene.is_none() {
            let built = Scene::new(
                ctx.gpu.device(),
                ctx.gpu.queue(),
                ctx.gpu.surface_format(),
                &self.config,
            );
            match built {
                Ok(scene) => self.scene = Some(scene),
                Err(err) => {
                    log::error!("failed to build scene: {err:#}");
                    return AppControl::Exit;
                }
            }
        }
        let Some(scene) = self.scene.as_mut() else {
            return AppControl::Exit;
        };

        if std::mem::take(&mut self.toggle_requested) {
            match scene.toggle_source(ctx.gpu.device()) {
                Ok(source) => log::info!("quad shows {source:?}"),
                Err(err) => log::warn!("could not switch quad texture: {err:#}"),
            }
        }

        self.angle = (self.angle + self.config.rotation_speed * ctx.time.dt) % std::f32::consts::TAU;

        let angle = self.angle;
        let dots = &self.dots;
        ctx.render(self.config.clear, |rctx, target| {
            scene.draw(rctx, target, angle, dots);
        })
    }
}
