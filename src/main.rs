// S.A.S.S. - a small survival prototype: walk up to a tree and chop it down.
// winit drives the loop, bevy_ecs holds the game state, wgpu draws the scene
// and egui draws the HUD, menus and inventory on top.

mod config;
mod engine;
mod game;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use bevy_ecs::prelude::*;
use clap::Parser;
use glam::EulerRot;
use winit::{
    event::{Event as WinitEvent, WindowEvent},
    event_loop::EventLoop,
    keyboard::KeyCode,
    window::{CursorGrabMode, Fullscreen, Window},
};

use config::{AxeStyle, GameConfig};
use engine::camera::CameraRig;
use engine::input::InputState;
use engine::overlay::Overlay;
use engine::renderer::SceneRenderer;
use engine::Transform;
use game::hud::{self, DebugStats, FrameStats, HudInfo, MenuView, UiAction};
use game::player::Player;
use game::resources::{FrameTime, PointerLock, ViewMode, Viewport};
use game::scene;
use game::session::{EscapeAction, GameSession};
use game::swing::Swing;
use game::tree::Tree;

#[derive(Parser, Debug)]
#[command(name = "sass", version, about = "Survival axe prototype")]
struct Cli {
    /// JSON file with tuning overrides
    #[arg(long)]
    config: Option<PathBuf>,

    /// Axe model to build
    #[arg(long, value_enum)]
    axe: Option<AxeStyle>,

    /// Start in first person
    #[arg(long)]
    first_person: bool,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,
}

const HOTBAR_KEYS: [KeyCode; 5] = [
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
];

const SHORTCUTS: [KeyCode; 10] = [
    KeyCode::KeyF,
    KeyCode::Escape,
    KeyCode::Tab,
    KeyCode::KeyI,
    KeyCode::F3,
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
];

// ============================================================================
// APPLICATION STATE
// ============================================================================

struct State {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    renderer: SceneRenderer,
    overlay: Overlay,

    // ECS World
    world: World,
    schedule: Schedule,
    last_update: std::time::Instant,
    game_key: u32,

    // UI
    menu: MenuView,
    frame_stats: FrameStats,
    show_debug: bool,
    ui_consumed: bool,
}

impl State {
    async fn new(window: Arc<Window>, game_config: GameConfig) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no compatible GPU adapter")?;
        log::info!("adapter: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .context("request device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes.first().copied().unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::debug!("surface {:?} {}x{}", config.format, config.width, config.height);

        let (library, meshes) = scene::build_meshes(&game_config, &mut rand::thread_rng());
        let renderer = SceneRenderer::new(&device, &config, &library);
        let overlay = Overlay::new(&window, &device, config.format);

        let mut world = World::new();
        scene::insert_resources(&mut world, game_config, meshes);
        scene::spawn_scene(&mut world);
        world.insert_resource(Viewport { width: config.width as f32, height: config.height as f32 });

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            renderer,
            overlay,
            world,
            schedule: game::systems::build_schedule(),
            last_update: std::time::Instant::now(),
            game_key: 0,
            menu: MenuView::default(),
            frame_stats: FrameStats::default(),
            show_debug: false,
            ui_consumed: false,
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.renderer.resize(&self.device, new_size.width, new_size.height);
            self.world.insert_resource(Viewport {
                width: new_size.width as f32,
                height: new_size.height as f32,
            });
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::KeyF => {
                if !self.world.resource::<GameSession>().is_playing() {
                    return;
                }
                let view = self.world.resource::<ViewMode>().toggled();
                self.world.insert_resource(view);
                if view.is_first_person() {
                    // Start looking where the character faces.
                    let facing = scene_facing(&mut self.world);
                    let mut rig = self.world.resource_mut::<CameraRig>();
                    rig.look.yaw = facing;
                    rig.look.target_yaw = facing;
                } else {
                    self.world.resource_mut::<PointerLock>().release();
                }
                log::info!("view: {}", view.label());
            }
            KeyCode::Escape => {
                let locked = self.world.resource::<PointerLock>().locked;
                let action = self.world.resource_mut::<GameSession>().escape(locked);
                if action == EscapeAction::ReleasePointer {
                    self.world.resource_mut::<PointerLock>().release();
                }
            }
            KeyCode::Tab | KeyCode::KeyI => {
                self.world.resource_mut::<GameSession>().toggle_inventory();
            }
            KeyCode::F3 => self.show_debug = !self.show_debug,
            _ => {
                if let Some(slot) = HOTBAR_KEYS.iter().position(|&d| d == key) {
                    self.world.resource_mut::<GameSession>().select_hotbar(slot);
                }
            }
        }
    }

    fn update(&mut self) {
        let now = std::time::Instant::now();
        let dt = (now - self.last_update).as_secs_f32().min(0.1);
        self.last_update = now;
        self.frame_stats.record(dt);

        let pressed: Vec<KeyCode> = {
            let input = self.world.resource::<InputState>();
            SHORTCUTS.iter().copied().filter(|&k| input.was_key_pressed(k)).collect()
        };
        for key in pressed {
            self.handle_key(key);
        }

        let (key, playing) = {
            let session = self.world.resource::<GameSession>();
            (session.game_key, session.is_playing())
        };
        if key != self.game_key {
            self.game_key = key;
            scene::respawn_scene(&mut self.world);
        }

        {
            let mut time = self.world.resource_mut::<FrameTime>();
            time.dt = dt;
            if playing {
                time.elapsed += dt;
            }
        }
        if !playing {
            self.world.resource_mut::<PointerLock>().release();
        }
        // Clicks on UI never reach the world
        let locked = self.world.resource::<PointerLock>().locked;
        if !locked && (self.ui_consumed || self.overlay.wants_pointer()) {
            self.world.resource_mut::<InputState>().discard_clicks();
        }
        self.ui_consumed = false;

        self.schedule.run(&mut self.world);
        self.apply_pointer_request();
    }

    /// Grab or release the cursor as the game asked. Locked grabs are not
    /// supported everywhere, so fall back to confining the cursor.
    fn apply_pointer_request(&mut self) {
        let Some(want) = self.world.resource_mut::<PointerLock>().request.take() else {
            return;
        };
        let mut pointer = self.world.resource_mut::<PointerLock>();
        if want {
            let grabbed = self
                .window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined));
            match grabbed {
                Ok(()) => {
                    self.window.set_cursor_visible(false);
                    pointer.locked = true;
                    log::debug!("pointer locked");
                }
                Err(e) => log::warn!("pointer lock unavailable: {e}"),
            }
        } else {
            if let Err(e) = self.window.set_cursor_grab(CursorGrabMode::None) {
                log::warn!("pointer release failed: {e}");
            }
            self.window.set_cursor_visible(true);
            pointer.locked = false;
            log::debug!("pointer released");
        }
    }

    fn hud_info(&mut self) -> HudInfo {
        let tree_config = self.world.resource::<GameConfig>().tree.clone();
        let player = scene::player_position(&mut self.world).unwrap_or_default();
        let pointer_locked = self.world.resource::<PointerLock>().locked;
        let mut trees = self.world.query::<&Tree>();
        let (tree_health, can_chop) = trees
            .iter(&self.world)
            .next()
            .map(|t| (t.health, t.can_chop(player, &tree_config)))
            .unwrap_or((0, false));
        HudInfo { tree_health, can_chop, pointer_locked }
    }

    fn debug_stats(&mut self) -> DebugStats {
        let mut players = self.world.query_filtered::<(&Transform, &Swing), With<Player>>();
        let (position, swing) = players
            .iter(&self.world)
            .next()
            .map(|(t, s)| (t.position, s.clone()))
            .unwrap_or_default();
        DebugStats {
            frame: self.frame_stats.clone(),
            draw_calls: self.renderer.draw_calls,
            swing_direction: swing.direction,
            swing_value: swing.value,
            swing_active: swing.active,
            swing_progress: swing.progress,
            player_position: position,
            zoom: self.world.resource::<CameraRig>().zoom,
            view: self.world.resource::<ViewMode>().label(),
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Collect the frame's draws and UI facts BEFORE encoding
        let mut draws = scene::collect_draws(&mut self.world);
        let aspect = self.world.resource::<Viewport>().aspect();
        let view_proj = self.world.resource::<CameraRig>().camera.view_projection(aspect);
        let lighting = scene::lighting(self.world.resource::<GameConfig>());
        let info = self.hud_info();
        let debug = if self.show_debug { Some(self.debug_stats()) } else { None };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.renderer.render(
            &self.device,
            &self.queue,
            &mut encoder,
            &view,
            view_proj,
            &lighting,
            &mut draws,
        );

        let mut actions = Vec::new();
        {
            let menu = &mut self.menu;
            let mut session = self.world.resource_mut::<GameSession>();
            self.overlay.render(
                &self.device,
                &self.queue,
                &mut encoder,
                &self.window,
                &view,
                [self.config.width, self.config.height],
                |ctx| {
                    actions = hud::draw_ui(ctx, &mut session, &info, menu, debug.as_ref());
                },
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        self.apply_ui_actions(actions);
        Ok(())
    }

    fn apply_ui_actions(&mut self, actions: Vec<UiAction>) {
        for action in actions {
            let mut session = self.world.resource_mut::<GameSession>();
            match action {
                UiAction::Start => session.start(),
                UiAction::Restart => session.restart(),
                UiAction::OpenMenu => session.open_menu(),
                UiAction::CycleDifficulty => {
                    session.cycle_difficulty();
                    log::info!("difficulty: {}", session.difficulty.label());
                }
                UiAction::CloseInventory => session.toggle_inventory(),
                UiAction::Move { from, to } => {
                    if let Err(e) = session.inventory.move_item(from, to) {
                        log::warn!("inventory move failed: {e}");
                    }
                }
                UiAction::Split(slot) => {
                    if let Err(e) = session.inventory.split(slot) {
                        log::debug!("split ignored: {e}");
                    }
                }
                UiAction::SetFullscreen(on) => {
                    session.settings.fullscreen = on;
                    self.window.set_fullscreen(on.then_some(Fullscreen::Borderless(None)));
                }
            }
        }
    }
}

/// Yaw the player currently faces, for seeding the first-person look.
fn scene_facing(world: &mut World) -> f32 {
    let mut players = world.query_filtered::<&Transform, With<Player>>();
    players
        .iter(world)
        .next()
        .map(|t| t.rotation.to_euler(EulerRot::YXZ).0)
        .unwrap_or(0.0)
}

// ============================================================================
// MAIN
// ============================================================================

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut game_config = match &cli.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    if let Some(style) = cli.axe {
        game_config.axe.style = style;
    }

    let event_loop = EventLoop::new().context("create event loop")?;

    let window_attributes = Window::default_attributes()
        .with_title("S.A.S.S. - Survival Prototype")
        .with_inner_size(winit::dpi::LogicalSize::new(cli.width, cli.height));

    let window = Arc::new(
        event_loop
            .create_window(window_attributes)
            .context("create window")?,
    );

    let mut state = pollster::block_on(State::new(window.clone(), game_config))?;
    if cli.first_person {
        state.world.insert_resource(ViewMode::FirstPerson);
    }

    event_loop.run(move |event, control_flow| {
        match event {
            WinitEvent::WindowEvent {
                ref event,
                window_id,
            } if window_id == window.id() => {
                let ui = state.overlay.handle_window_event(&window, event);
                state.ui_consumed |= ui.consumed;
                state.world.resource_mut::<InputState>().process_window_event(event);

                match event {
                    WindowEvent::CloseRequested => control_flow.exit(),
                    WindowEvent::Resized(physical_size) => {
                        state.resize(*physical_size);
                    }
                    WindowEvent::RedrawRequested => {
                        state.update();
                        match state.render() {
                            Ok(_) => {}
                            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                                state.resize(state.size)
                            }
                            Err(wgpu::SurfaceError::OutOfMemory) => {
                                log::error!("out of GPU memory");
                                control_flow.exit();
                            }
                            Err(e) => log::warn!("surface error: {e:?}"),
                        }
                        state.world.resource_mut::<InputState>().end_frame();
                    }
                    _ => {}
                }
            }
            WinitEvent::DeviceEvent { ref event, .. } => {
                state.world.resource_mut::<InputState>().process_device_event(event);
            }
            WinitEvent::AboutToWait => {
                window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}
