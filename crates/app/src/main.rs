//! Lumen - real-time sphere ray tracer.
//!
//! Opens a window, traces a small sphere scene in a full-screen fragment
//! shader and lets the user fly around it.
//!
//! Controls: WASD move, Esc toggles mouse look, L toggles the sun, N adds a
//! sphere, Backspace removes the last one, Q quits.
//!
//! Live editing: `[` and `]` pick a parameter, Tab picks its component,
//! `,` and `.` pick a sphere, holding the Up or Down arrow changes the
//! value, Delete removes the picked sphere and H hides the overlay. The
//! picked value is shown in the title bar and as a bar in the overlay.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::{debug, error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::WindowId;

use lumen_core::{Config, FpsCounter, FpsSample, PresentMode, Timer};
use lumen_platform::{InputState, KeyCode, Window};
use lumen_renderer::{FrameStatus, Overlay, PanelOverlay, PanelRect, Renderer};
use lumen_scene::{FlyCamera, MOVE_SPEED, ParamEditor, Scene};

/// Editor steps applied per second while an arrow key is held.
const EDIT_STEPS_PER_SECOND: f32 = 20.0;

const PANEL_COLOR: [f32; 4] = [0.05, 0.05, 0.05, 1.0];
const TRACK_COLOR: [f32; 4] = [0.2, 0.2, 0.2, 1.0];
const BAR_COLOR: [f32; 4] = [0.9, 0.6, 0.1, 1.0];

#[derive(Parser, Debug)]
#[command(about = "Real-time Vulkan sphere ray tracer", long_about = None)]
struct Args {
    /// Initial window width in pixels.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Initial window height in pixels.
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Frames the CPU may record ahead of the GPU.
    #[arg(short, long, default_value_t = 2)]
    frames_in_flight: usize,

    /// Preferred present mode; FIFO is used when unavailable.
    #[arg(short, long, value_enum, default_value = "mailbox")]
    present_mode: CliPresentMode,

    /// Directory holding the compiled SPIR-V shaders.
    #[arg(long, default_value = "shaders/spirv")]
    shader_dir: PathBuf,

    /// Enable the Vulkan validation layer (default in debug builds).
    #[arg(long, conflicts_with = "no_validation")]
    validation: bool,

    /// Disable the Vulkan validation layer.
    #[arg(long)]
    no_validation: bool,

    /// Tracing filter used when RUST_LOG is unset.
    #[arg(long = "log", default_value = "info,lumen=debug")]
    log_filter: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum CliPresentMode {
    Fifo,
    Mailbox,
    Immediate,
}

impl From<CliPresentMode> for PresentMode {
    fn from(value: CliPresentMode) -> Self {
        match value {
            CliPresentMode::Fifo => PresentMode::Fifo,
            CliPresentMode::Mailbox => PresentMode::Mailbox,
            CliPresentMode::Immediate => PresentMode::Immediate,
        }
    }
}

impl Args {
    fn into_config(self) -> Config {
        let defaults = Config::default();
        let validation = if self.validation {
            true
        } else if self.no_validation {
            false
        } else {
            defaults.validation
        };

        Config {
            width: self.width,
            height: self.height,
            frames_in_flight: self.frames_in_flight,
            validation,
            present_mode: self.present_mode.into(),
            shader_dir: self.shader_dir,
            log_filter: self.log_filter,
            ..defaults
        }
    }
}

fn format_title(base: &str, sample: FpsSample, scene: &Scene, editing: &str) -> String {
    format!(
        "{} | {:.0} FPS ({:.2} ms) | {} spheres | sun {} | {}",
        base,
        sample.fps,
        sample.frame_ms,
        scene.sphere_count(),
        if scene.sun.enabled { "on" } else { "off" },
        editing
    )
}

/// Panel in the top-left corner: a track filled to the picked value's
/// position in its range, and a swatch when a color is picked.
fn build_overlay(
    overlay: &mut PanelOverlay,
    editor: &ParamEditor,
    scene: &Scene,
    camera: &FlyCamera,
) {
    overlay.clear();
    overlay.push(PanelRect::new(0.02, 0.02, 0.3, 0.05, PANEL_COLOR));
    overlay.push(PanelRect::new(0.03, 0.035, 0.22, 0.02, TRACK_COLOR));
    if let Some(fraction) = editor.fraction(scene, camera) {
        overlay.push(PanelRect::new(0.03, 0.035, 0.22 * fraction, 0.02, BAR_COLOR));
    }
    if let Some(color) = editor.swatch(scene) {
        overlay.push(PanelRect::new(
            0.26,
            0.03,
            0.05,
            0.03,
            [color.x, color.y, color.z, 1.0],
        ));
    }
}

struct App {
    config: Config,
    // Dropped before the window: the surface refers to it.
    renderer: Option<Renderer>,
    window: Option<Window>,
    input: InputState,
    camera: FlyCamera,
    scene: Scene,
    editor: ParamEditor,
    overlay: PanelOverlay,
    show_overlay: bool,
    clock: Timer,
    /// Clock reading at the previous input pass
    last_input_secs: f32,
    fps: FpsCounter,
    last_sample: Option<FpsSample>,
    fatal: Option<anyhow::Error>,
}

impl App {
    fn new(config: Config) -> Self {
        Self {
            config,
            renderer: None,
            window: None,
            input: InputState::new(),
            camera: FlyCamera::default(),
            scene: Scene::default(),
            editor: ParamEditor::new(),
            overlay: PanelOverlay::new(),
            show_overlay: true,
            clock: Timer::new(),
            last_input_secs: 0.0,
            fps: FpsCounter::default(),
            last_sample: None,
            fatal: None,
        }
    }

    /// Applies key presses and mouse motion gathered since the last frame.
    /// Returns whether the title needs refreshing.
    fn handle_input(&mut self, event_loop: &ActiveEventLoop) -> bool {
        if self.input.is_key_just_pressed(KeyCode::KeyQ) {
            info!("Quit requested");
            event_loop.exit();
            return false;
        }

        let now = self.clock.elapsed_secs();
        let dt = now - self.last_input_secs;
        self.last_input_secs = now;
        let edited = self.handle_editing(dt);

        if self.input.is_key_just_pressed(KeyCode::Escape)
            && let Some(window) = self.window.as_mut()
        {
            let capture = !window.is_cursor_captured();
            if let Err(e) = window.set_cursor_captured(capture) {
                warn!("{}", e);
            }
        }

        if self.input.is_key_just_pressed(KeyCode::KeyL) {
            let enabled = self.scene.toggle_sun();
            info!("Sun {}", if enabled { "enabled" } else { "disabled" });
        }
        if self.input.is_key_just_pressed(KeyCode::KeyN) {
            let index = self.scene.add_sphere();
            debug!("Added sphere {}", index);
        }
        if self.input.is_key_just_pressed(KeyCode::Backspace)
            && self.scene.remove_last_sphere().is_some()
        {
            debug!("Removed sphere, {} left", self.scene.sphere_count());
        }

        let (forward, right) = self.input.movement_axes();
        if forward != 0.0 || right != 0.0 {
            self.camera.move_by(forward * MOVE_SPEED, right * MOVE_SPEED);
        }

        let captured = self
            .window
            .as_ref()
            .is_some_and(|window| window.is_cursor_captured());
        if captured {
            let (dx, dy) = self.input.mouse_delta();
            self.camera.look(dx, dy);
        }

        self.input.begin_frame();
        edited
    }

    /// Parameter editor key bindings. Returns whether anything changed.
    fn handle_editing(&mut self, dt: f32) -> bool {
        let input = &self.input;
        let mut changed = false;

        if input.is_key_just_pressed(KeyCode::BracketRight) {
            self.editor.next_param();
            changed = true;
        }
        if input.is_key_just_pressed(KeyCode::BracketLeft) {
            self.editor.prev_param();
            changed = true;
        }
        if input.is_key_just_pressed(KeyCode::Tab) {
            self.editor.next_component();
            changed = true;
        }
        if input.is_key_just_pressed(KeyCode::Period) {
            self.editor.select_sphere(1, &self.scene);
            changed = true;
        }
        if input.is_key_just_pressed(KeyCode::Comma) {
            self.editor.select_sphere(-1, &self.scene);
            changed = true;
        }
        if input.is_key_just_pressed(KeyCode::Delete) && self.editor.remove_selected(&mut self.scene)
        {
            debug!("Removed sphere, {} left", self.scene.sphere_count());
            changed = true;
        }
        if input.is_key_just_pressed(KeyCode::KeyH) {
            self.show_overlay = !self.show_overlay;
        }

        let mut direction = 0.0;
        if input.is_key_pressed(KeyCode::ArrowUp) {
            direction += 1.0;
        }
        if input.is_key_pressed(KeyCode::ArrowDown) {
            direction -= 1.0;
        }
        if direction != 0.0 {
            let steps = direction * EDIT_STEPS_PER_SECOND * dt;
            changed |= self
                .editor
                .adjust(&mut self.scene, &mut self.camera, steps)
                .is_some();
        }

        if changed {
            debug!("Editing {}", self.editor.label(&self.scene, &self.camera));
        }
        changed
    }

    fn refresh_title(&self) {
        if let Some(sample) = self.last_sample
            && let Some(window) = self.window.as_ref()
        {
            let editing = self.editor.label(&self.scene, &self.camera);
            window.set_title(&format_title(&self.config.title, sample, &self.scene, &editing));
        }
    }

    fn render(&mut self, event_loop: &ActiveEventLoop, edited: bool) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        if self.window.as_ref().is_some_and(|w| w.is_minimized()) {
            return;
        }

        let overlay: Option<&dyn Overlay> = if self.show_overlay {
            build_overlay(&mut self.overlay, &self.editor, &self.scene, &self.camera);
            Some(&self.overlay)
        } else {
            None
        };

        let status = renderer.render_frame(
            &self.camera,
            self.clock.elapsed_secs(),
            &self.scene,
            overlay,
        );
        match status {
            Ok(FrameStatus::Presented { .. }) => {
                let sample = self.fps.frame();
                if sample.is_some() {
                    self.last_sample = sample;
                }
                if sample.is_some() || edited {
                    self.refresh_title();
                }
            }
            Ok(FrameStatus::Rebuilt) => debug!("Swapchain rebuilt"),
            Ok(FrameStatus::Skipped) => {}
            Err(e) => {
                error!("Fatal render error: {}", e);
                if let Err(shutdown_err) = renderer.shutdown() {
                    error!("Shutdown after fatal error failed: {}", shutdown_err);
                }
                self.fatal = Some(anyhow!(e).context("render loop stopped"));
                event_loop.exit();
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match Window::new(
            event_loop,
            self.config.width,
            self.config.height,
            &self.config.title,
        ) {
            Ok(window) => window,
            Err(e) => {
                self.fatal = Some(anyhow!(e).context("failed to create window"));
                event_loop.exit();
                return;
            }
        };

        match Renderer::new(&window, &self.config) {
            Ok(renderer) => {
                let extent = renderer.extent();
                info!(
                    "Initialization complete at {}x{}, entering main loop",
                    extent.width, extent.height
                );
                self.renderer = Some(renderer);
                self.window = Some(window);
            }
            Err(e) => {
                self.fatal = Some(anyhow!(e).context("failed to create renderer"));
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                debug!("Window resized to {}x{}", size.width, size.height);
                if let Some(window) = self.window.as_mut() {
                    window.resize(size.width, size.height);
                }
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(size.width, size.height);
                }
            }
            WindowEvent::Focused(false) => self.input.release_all(),
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    if event.state.is_pressed() {
                        self.input.on_key_pressed(key);
                    } else {
                        self.input.on_key_released(key);
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                let edited = self.handle_input(event_loop);
                self.render(event_loop, edited);
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.input.on_mouse_motion(dx as f32, dy as f32);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mut renderer) = self.renderer.take()
            && let Err(e) = renderer.shutdown()
        {
            error!("Renderer shutdown failed: {}", e);
        }
        self.window = None;
    }
}

fn main() -> Result<()> {
    let config = Args::parse().into_config();
    config.validate().context("invalid configuration")?;

    lumen_core::init_logging(&config.log_filter);
    info!(
        "Starting Lumen ({} frame slot(s), {} present mode)",
        config.frames_in_flight, config.present_mode
    );

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop
        .run_app(&mut app)
        .context("event loop terminated abnormally")?;

    match app.fatal.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_into_config() {
        let args = Args::parse_from([
            "lumen",
            "--width",
            "800",
            "--frames-in-flight",
            "3",
            "--present-mode",
            "fifo",
            "--no-validation",
        ]);
        let config = args.into_config();
        assert_eq!(config.width, 800);
        assert_eq!(config.height, 720);
        assert_eq!(config.frames_in_flight, 3);
        assert_eq!(config.present_mode, PresentMode::Fifo);
        assert!(!config.validation);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_conflicting_validation_flags_rejected() {
        assert!(Args::try_parse_from(["lumen", "--validation", "--no-validation"]).is_err());
    }

    #[test]
    fn test_title_shows_stats() {
        let mut scene = Scene::default();
        scene.toggle_sun();
        let sample = FpsSample {
            fps: 144.4,
            frame_ms: 6.92,
        };
        assert_eq!(
            format_title("Lumen", sample, &scene, "camera yaw = 3.14"),
            "Lumen | 144 FPS (6.92 ms) | 4 spheres | sun off | camera yaw = 3.14"
        );
    }

    #[test]
    fn test_invalid_frames_in_flight_fails_validation() {
        let config = Args::parse_from(["lumen", "--frames-in-flight", "0"]).into_config();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overlay_tracks_the_picked_value() {
        let scene = Scene::default();
        let camera = FlyCamera::default();
        let mut editor = ParamEditor::new();
        let mut overlay = PanelOverlay::new();

        // Sun direction x is 0.5 in [-1, 1].
        build_overlay(&mut overlay, &editor, &scene, &camera);
        assert_eq!(overlay.rects().len(), 3);
        let bar = overlay.rects()[2];
        assert_eq!(bar.color, BAR_COLOR);
        assert!((bar.width - 0.22 * 0.75).abs() < 1e-5);

        // Point light color shows a swatch of the whole color.
        editor.next_param();
        editor.next_param();
        build_overlay(&mut overlay, &editor, &scene, &camera);
        assert_eq!(overlay.rects().len(), 4);
        assert_eq!(overlay.rects()[3].color, [1.0, 1.0, 1.0, 1.0]);

        // Unbounded values get no bar.
        editor.prev_param();
        build_overlay(&mut overlay, &editor, &scene, &camera);
        assert_eq!(overlay.rects().len(), 2);
    }
}
