// On-screen UI drawn with egui on top of the scene:
//   - HUD (title, hint, tree health, help line) and hotbar strip
//   - crosshair while the pointer is locked
//   - main menu / pause menu with a settings page
//   - inventory window (drag and drop moves, right click splits)
//   - F3 debug panel
//
// UI code never mutates game state except settings sliders; everything else is
// returned as `UiAction`s and applied by the caller.

use egui::{Align2, Color32, RichText};
use glam::Vec3;

use super::inventory::{Inventory, Item, SlotList, SlotRef};
use super::session::{GameSession, GameState};

pub const TITLE: &str = "Survival Prototype";
pub const HELP: &str = "Scroll to zoom. Press F for first person.";
pub const VERSION: &str = "v0.1.0 ALPHA";

const SLOT_SIZE: f32 = 48.0;
const GRID_COLUMNS: usize = 5;
const ACCENT: Color32 = Color32::from_rgb(230, 180, 80);

#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    Start,
    Restart,
    OpenMenu,
    CycleDifficulty,
    CloseInventory,
    Move { from: SlotRef, to: SlotRef },
    Split(SlotRef),
    SetFullscreen(bool),
}

/// Hint line for the current tree state.
pub fn hint(tree_health: u32, can_chop: bool) -> &'static str {
    if tree_health == 0 {
        "Tree chopped down. Explore the map."
    } else if can_chop {
        "Click the tree to chop."
    } else {
        "Use WASD to move closer to the tree."
    }
}

/// Per-frame facts the HUD shows.
#[derive(Debug, Clone, Default)]
pub struct HudInfo {
    pub tree_health: u32,
    pub can_chop: bool,
    pub pointer_locked: bool,
}

/// UI-only state that survives between frames.
#[derive(Debug, Clone, Default)]
pub struct MenuView {
    pub settings_open: bool,
}

/// Rolling frame timing, sampled once per second.
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    window: Vec<f32>,
    elapsed: f32,
    pub fps: u32,
    pub frame_time_avg_ms: f32,
    pub frame_time_min_ms: f32,
    pub frame_time_max_ms: f32,
}

impl FrameStats {
    /// Record one frame. Returns true when a new one-second sample was taken.
    pub fn record(&mut self, dt: f32) -> bool {
        self.window.push(dt);
        self.elapsed += dt;
        if self.elapsed < 1.0 {
            return false;
        }
        let n = self.window.len() as f32;
        self.fps = (n / self.elapsed).round() as u32;
        self.frame_time_avg_ms = self.elapsed / n * 1000.0;
        self.frame_time_min_ms = self.window.iter().copied().fold(f32::MAX, f32::min) * 1000.0;
        self.frame_time_max_ms = self.window.iter().copied().fold(0.0, f32::max) * 1000.0;
        self.window.clear();
        self.elapsed = 0.0;
        true
    }
}

pub struct DebugStats {
    pub frame: FrameStats,
    pub draw_calls: u32,
    pub swing_direction: f32,
    pub swing_value: f32,
    pub swing_active: bool,
    pub swing_progress: f32,
    pub player_position: Vec3,
    pub zoom: f32,
    pub view: &'static str,
}

/// Build the whole UI for one frame.
pub fn draw_ui(
    ctx: &egui::Context,
    session: &mut GameSession,
    hud: &HudInfo,
    menu: &mut MenuView,
    debug: Option<&DebugStats>,
) -> Vec<UiAction> {
    let mut actions = Vec::new();

    draw_hud(ctx, hud);
    draw_hotbar(ctx, &session.inventory, session.selected_hotbar);
    if hud.pointer_locked {
        draw_crosshair(ctx);
    }
    if let Some(stats) = debug {
        draw_debug(ctx, stats);
    }

    match session.state {
        GameState::Menu | GameState::Paused => {
            dim_background(ctx);
            if menu.settings_open {
                draw_settings(ctx, session, menu, &mut actions);
            } else {
                draw_menu(ctx, session, menu, &mut actions);
            }
        }
        GameState::Inventory => draw_inventory(ctx, &session.inventory, session.selected_hotbar, &mut actions),
        GameState::Playing => {}
    }

    actions
}

fn panel() -> egui::Frame {
    egui::Frame::none()
        .fill(Color32::from_rgba_premultiplied(0, 0, 0, 150))
        .inner_margin(egui::Margin::same(10.0))
        .rounding(4.0)
}

fn draw_hud(ctx: &egui::Context, hud: &HudInfo) {
    egui::Area::new(egui::Id::new("hud"))
        .fixed_pos(egui::pos2(16.0, 16.0))
        .show(ctx, |ui| {
            panel().show(ui, |ui| {
                ui.label(RichText::new(TITLE).size(18.0).strong().color(ACCENT));
                ui.label(hint(hud.tree_health, hud.can_chop));
                ui.label(format!("Tree health: {}", hud.tree_health));
                ui.label(HELP);
            });
        });
}

fn draw_crosshair(ctx: &egui::Context) {
    let painter = ctx.layer_painter(egui::LayerId::new(egui::Order::Foreground, egui::Id::new("crosshair")));
    let c = ctx.screen_rect().center();
    let stroke = egui::Stroke::new(2.0, Color32::from_white_alpha(220));
    painter.line_segment([c - egui::vec2(8.0, 0.0), c + egui::vec2(8.0, 0.0)], stroke);
    painter.line_segment([c - egui::vec2(0.0, 8.0), c + egui::vec2(0.0, 8.0)], stroke);
}

fn dim_background(ctx: &egui::Context) {
    let painter = ctx.layer_painter(egui::LayerId::new(egui::Order::Background, egui::Id::new("menu_dim")));
    painter.rect_filled(ctx.screen_rect(), 0.0, Color32::from_rgba_unmultiplied(0, 0, 0, 140));
}

fn item_label(ui: &mut egui::Ui, item: &Item) {
    ui.vertical_centered(|ui| {
        ui.label(RichText::new(&item.icon).size(20.0));
        let text = if item.count > 1 { format!("{} x{}", short_name(&item.name), item.count) } else { short_name(&item.name) };
        ui.label(RichText::new(text).size(10.0));
    });
}

fn short_name(name: &str) -> String {
    name.chars().take(6).collect()
}

fn slot_frame(selected: bool) -> egui::Frame {
    let stroke = if selected {
        egui::Stroke::new(2.0, ACCENT)
    } else {
        egui::Stroke::new(1.0, Color32::from_gray(90))
    };
    egui::Frame::none()
        .fill(Color32::from_rgba_premultiplied(30, 26, 22, 220))
        .stroke(stroke)
        .rounding(3.0)
        .inner_margin(egui::Margin::same(2.0))
}

fn draw_hotbar(ctx: &egui::Context, inventory: &Inventory, selected: usize) {
    egui::Area::new(egui::Id::new("hotbar"))
        .anchor(Align2::CENTER_BOTTOM, egui::vec2(0.0, -16.0))
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                for (i, slot) in inventory.hotbar.iter().enumerate() {
                    slot_frame(i == selected).show(ui, |ui| {
                        ui.set_min_size(egui::vec2(SLOT_SIZE, SLOT_SIZE));
                        ui.vertical(|ui| {
                            ui.label(RichText::new((i + 1).to_string()).size(10.0).color(Color32::GRAY));
                            if let Some(item) = slot {
                                item_label(ui, item);
                            }
                        });
                    });
                }
            });
        });
}

fn menu_button(text: &str) -> egui::Button<'_> {
    egui::Button::new(RichText::new(text).size(16.0)).min_size(egui::vec2(240.0, 36.0))
}

fn draw_menu(ctx: &egui::Context, session: &GameSession, menu: &mut MenuView, actions: &mut Vec<UiAction>) {
    egui::Window::new("main_menu")
        .title_bar(false)
        .collapsible(false)
        .resizable(false)
        .anchor(Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(8.0);
                ui.label(RichText::new("S.A.S.S.").size(36.0).strong().color(ACCENT));
                ui.add_space(12.0);

                let start = if session.started { "RESUME" } else { "START GAME" };
                if ui.add(menu_button(start)).clicked() {
                    actions.push(UiAction::Start);
                }
                if ui.add(menu_button("RESTART")).clicked() {
                    actions.push(UiAction::Restart);
                }
                if ui.add(menu_button("SETTINGS")).clicked() {
                    menu.settings_open = true;
                }
                let difficulty = format!("DIFFICULTY: {}", session.difficulty.label());
                if ui.add(menu_button(&difficulty)).clicked() {
                    actions.push(UiAction::CycleDifficulty);
                }
                if session.state == GameState::Paused && ui.add(menu_button("MAIN MENU")).clicked() {
                    actions.push(UiAction::OpenMenu);
                }

                ui.add_space(12.0);
                ui.label(RichText::new(VERSION).size(11.0).color(Color32::GRAY));
            });
        });
}

fn draw_settings(ctx: &egui::Context, session: &mut GameSession, menu: &mut MenuView, actions: &mut Vec<UiAction>) {
    egui::Window::new("SETTINGS")
        .collapsible(false)
        .resizable(false)
        .anchor(Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
        .show(ctx, |ui| {
            ui.set_min_width(320.0);
            let settings = &mut session.settings;
            ui.add(egui::Slider::new(&mut settings.master_volume, 0.0..=100.0).text("Master Volume"));
            ui.add(egui::Slider::new(&mut settings.sfx_volume, 0.0..=100.0).text("SFX Volume"));
            ui.add(egui::Slider::new(&mut settings.sensitivity, 0.0..=100.0).text("Sensitivity"));
            let mut fullscreen = settings.fullscreen;
            if ui.checkbox(&mut fullscreen, "Fullscreen").changed() {
                actions.push(UiAction::SetFullscreen(fullscreen));
            }
            ui.add_space(8.0);
            ui.vertical_centered(|ui| {
                if ui.add(menu_button("BACK")).clicked() {
                    menu.settings_open = false;
                }
            });
        });
}

/// One drag-and-drop slot. Returns a move when another slot is dropped here.
fn inventory_slot(ui: &mut egui::Ui, slot: SlotRef, item: Option<&Item>, selected: bool, actions: &mut Vec<UiAction>) {
    let (response, dropped) = ui.dnd_drop_zone::<SlotRef, ()>(slot_frame(selected), |ui| {
        ui.set_min_size(egui::vec2(SLOT_SIZE, SLOT_SIZE));
        if slot.list == SlotList::Hotbar {
            ui.label(RichText::new((slot.index + 1).to_string()).size(10.0).color(Color32::GRAY));
        }
        if let Some(item) = item {
            let id = egui::Id::new(("inventory_slot", slot));
            ui.dnd_drag_source(id, slot, |ui| item_label(ui, item));
        }
    });

    if let Some(from) = dropped {
        actions.push(UiAction::Move { from: *from, to: slot });
    }
    let rect = response.response.rect;
    if item.is_some() && ui.rect_contains_pointer(rect) && ui.input(|i| i.pointer.secondary_clicked()) {
        actions.push(UiAction::Split(slot));
    }
}

fn draw_inventory(ctx: &egui::Context, inventory: &Inventory, selected: usize, actions: &mut Vec<UiAction>) {
    egui::Window::new("inventory")
        .title_bar(false)
        .collapsible(false)
        .resizable(false)
        .anchor(Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new("INVENTORY").size(18.0).strong());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("X").clicked() {
                        actions.push(UiAction::CloseInventory);
                    }
                });
            });
            ui.separator();

            for (row, chunk) in inventory.main.chunks(GRID_COLUMNS).enumerate() {
                ui.horizontal(|ui| {
                    for (col, item) in chunk.iter().enumerate() {
                        let slot = SlotRef::main(row * GRID_COLUMNS + col);
                        inventory_slot(ui, slot, item.as_ref(), false, actions);
                    }
                });
            }

            ui.separator();
            ui.horizontal(|ui| {
                for (i, item) in inventory.hotbar.iter().enumerate() {
                    inventory_slot(ui, SlotRef::hotbar(i), item.as_ref(), i == selected, actions);
                }
            });
            ui.label(
                RichText::new("Drag to move. Right click to split a stack.")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
}

fn draw_debug(ctx: &egui::Context, stats: &DebugStats) {
    egui::Area::new(egui::Id::new("debug_overlay"))
        .anchor(Align2::RIGHT_TOP, egui::vec2(-10.0, 10.0))
        .show(ctx, |ui| {
            panel().show(ui, |ui| {
                let f = &stats.frame;
                ui.label(format!("FPS: {}", f.fps));
                ui.label(format!(
                    "Frame: {:.2} ms (min: {:.1} | max: {:.1})",
                    f.frame_time_avg_ms, f.frame_time_min_ms, f.frame_time_max_ms
                ));
                ui.label(format!("Draw calls: {}", stats.draw_calls));
                ui.label(format!(
                    "Swing: dir {:+.0}  value {:+.2}  active {}  progress {:.2}",
                    stats.swing_direction, stats.swing_value, stats.swing_active as u8, stats.swing_progress
                ));
                let p = stats.player_position;
                ui.label(format!("Player: ({:.2}, {:.2}, {:.2})", p.x, p.y, p.z));
                ui.label(format!("Zoom: {:.2}  View: {}", stats.zoom, stats.view));
            });
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hints_follow_tree_state() {
        assert_eq!(hint(0, true), "Tree chopped down. Explore the map.");
        assert_eq!(hint(2, true), "Click the tree to chop.");
        assert_eq!(hint(3, false), "Use WASD to move closer to the tree.");
    }

    #[test]
    fn frame_stats_sample_once_per_second() {
        let mut stats = FrameStats::default();
        for _ in 0..59 {
            assert!(!stats.record(1.0 / 60.0));
        }
        assert!(stats.record(1.0 / 60.0 + 0.001));
        assert_eq!(stats.fps, 60);
        assert!(stats.frame_time_max_ms > stats.frame_time_min_ms);
        assert!((stats.frame_time_avg_ms - 16.68).abs() < 0.05);
    }

    #[test]
    fn ui_runs_headless_without_actions() {
        let ctx = egui::Context::default();
        let mut session = GameSession::new(Inventory::starting(20, 5));
        let mut menu = MenuView::default();
        let hud = HudInfo { tree_health: 3, can_chop: false, pointer_locked: true };
        for state in [GameState::Menu, GameState::Playing, GameState::Inventory] {
            session.state = state;
            let mut actions = Vec::new();
            let _ = ctx.run(egui::RawInput::default(), |ctx| {
                actions = draw_ui(ctx, &mut session, &hud, &mut menu, None);
            });
            assert!(actions.is_empty());
        }
    }
}
