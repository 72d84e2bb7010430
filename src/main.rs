use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use lattice_viewer::cli::Cli;
use lattice_viewer::core::{
    CameraMotion, CameraUniformStage, GpuContext, Key, MotionTuning, RenderOrchestrator,
    StageSequence, Viewport,
};
use lattice_viewer::stages::IcosahedronLatticeStage;

// === Constants ===

const INITIAL_WINDOW_WIDTH: u32 = 1280;
const INITIAL_WINDOW_HEIGHT: u32 = 720;
const FPS_UPDATE_INTERVAL: f32 = 1.0;

// === Viewer assembly ===

/// Everything that exists once a window and a GPU are available: the
/// shared camera motion state and the orchestrator driving the stages.
struct Viewer {
    motion: Rc<RefCell<CameraMotion>>,
    orchestrator: RenderOrchestrator,
}

impl Viewer {
    fn new(window: Arc<Window>, cli: &Cli) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let viewport = Viewport::new(size.width, size.height);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;
        let gpu = Arc::new(pollster::block_on(GpuContext::new_with_surface(
            &instance, &surface,
        ))?);

        let tuning = MotionTuning {
            tick_hz: cli.tick_hz,
            ..Default::default()
        };
        let motion = Rc::new(RefCell::new(CameraMotion::new(tuning)));

        let uniform_stage = CameraUniformStage::new(gpu.clone(), motion.clone());
        let camera = uniform_stage.binding();

        let lattice = IcosahedronLatticeStage::new([cli.lattice; 3], cli.spacing);
        let sequence = StageSequence::new(Box::new(uniform_stage), vec![Box::new(lattice)]);

        let mut orchestrator = RenderOrchestrator::new(gpu, surface, viewport, sequence, camera)?;
        orchestrator.start();

        Ok(Self {
            motion,
            orchestrator,
        })
    }
}

// === Application ===

struct App {
    cli: Cli,
    window: Option<Arc<Window>>,
    viewer: Option<Viewer>,
    last_frame_time: Instant,
    frame_count: u32,
    fps_update_timer: f32,
}

impl App {
    fn new(cli: Cli) -> Self {
        Self {
            cli,
            window: None,
            viewer: None,
            last_frame_time: Instant::now(),
            frame_count: 0,
            fps_update_timer: 0.0,
        }
    }

    fn update_fps(&mut self) {
        let now = Instant::now();
        let delta = now.duration_since(self.last_frame_time).as_secs_f32();
        self.last_frame_time = now;

        self.frame_count += 1;
        self.fps_update_timer += delta;

        if self.fps_update_timer >= FPS_UPDATE_INTERVAL {
            log::info!(
                "{:.1} fps",
                self.frame_count as f32 / self.fps_update_timer
            );
            self.frame_count = 0;
            self.fps_update_timer = 0.0;
        }
    }

    fn set_paused(&mut self, paused: bool) {
        let Some(viewer) = &mut self.viewer else {
            return;
        };
        if paused {
            viewer.motion.borrow_mut().stop();
            viewer.orchestrator.stop();
        } else {
            viewer.motion.borrow_mut().start();
            viewer.orchestrator.start();
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let window = match event_loop.create_window(
                Window::default_attributes()
                    .with_title("Icosahedron Lattice")
                    .with_inner_size(winit::dpi::LogicalSize::new(
                        INITIAL_WINDOW_WIDTH,
                        INITIAL_WINDOW_HEIGHT,
                    )),
            ) {
                Ok(w) => Arc::new(w),
                Err(e) => {
                    log::error!("failed to create window: {e}");
                    event_loop.exit();
                    return;
                }
            };

            // Stage or device setup failure is a configuration error;
            // abort startup rather than retry.
            let viewer = match Viewer::new(window.clone(), &self.cli) {
                Ok(v) => v,
                Err(e) => {
                    log::error!("failed to initialize viewer: {e}");
                    event_loop.exit();
                    return;
                }
            };

            self.window = Some(window);
            self.viewer = Some(viewer);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::KeyboardInput { event, .. } => {
                if let (Some(viewer), PhysicalKey::Code(code)) =
                    (&self.viewer, event.physical_key)
                {
                    if let Some(key) = keycode_to_key(code) {
                        viewer.motion.borrow_mut().controller_mut().set(
                            key,
                            event.state.is_pressed(),
                            event.repeat,
                        );
                    }
                }
            }
            WindowEvent::Focused(focused) => self.set_paused(!focused),
            WindowEvent::Resized(size) => {
                if let Some(viewer) = &mut self.viewer {
                    viewer
                        .orchestrator
                        .resize(Viewport::new(size.width, size.height));
                }
            }
            WindowEvent::RedrawRequested => {
                self.update_fps();
                if let Some(viewer) = &mut self.viewer {
                    if let Err(e) = viewer.orchestrator.render_frame() {
                        log::error!("render error: {e}");
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(viewer) = &mut self.viewer {
            // The camera schedule pumps every loop turn, decoupled from
            // display refresh; frames are only re-armed while running.
            viewer.motion.borrow_mut().pump();
            if viewer.orchestrator.is_running() {
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
        }
    }
}

/// Map winit key codes onto the controller's key set.
fn keycode_to_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::KeyQ => Some(Key::Q),
        KeyCode::KeyW => Some(Key::W),
        KeyCode::KeyE => Some(Key::E),
        KeyCode::KeyR => Some(Key::R),
        KeyCode::KeyA => Some(Key::A),
        KeyCode::KeyS => Some(Key::S),
        KeyCode::KeyD => Some(Key::D),
        KeyCode::KeyF => Some(Key::F),
        KeyCode::KeyZ => Some(Key::Z),
        KeyCode::KeyX => Some(Key::X),
        KeyCode::KeyC => Some(Key::C),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::ArrowDown => Some(Key::Down),
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        _ => None,
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let event_loop = EventLoop::new()?;
    let mut app = App::new(cli);

    log::info!(
        "controls: W/S travel, Q/E strafe, R/F rise, A/D yaw, arrows pitch and roll, Z/X zoom, C reset"
    );
    event_loop.run_app(&mut app)?;

    Ok(())
}
