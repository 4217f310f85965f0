//! Menu / game state machine and the player-facing settings.

use bevy_ecs::prelude::*;

use super::inventory::Inventory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameState {
    #[default]
    Menu,
    Playing,
    Paused,
    Inventory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
    Survival,
}

impl Difficulty {
    pub fn next(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Normal,
            Difficulty::Normal => Difficulty::Hard,
            Difficulty::Hard => Difficulty::Survival,
            Difficulty::Survival => Difficulty::Easy,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Normal => "NORMAL",
            Difficulty::Hard => "HARD",
            Difficulty::Survival => "SURVIVAL",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub master_volume: f32,
    pub sfx_volume: f32,
    /// 0..=100, 50 is the default look speed
    pub sensitivity: f32,
    pub fullscreen: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self { master_volume: 100.0, sfx_volume: 100.0, sensitivity: 50.0, fullscreen: false }
    }
}

impl Settings {
    /// Multiplier applied to the base mouse look speed.
    pub fn look_scale(&self) -> f32 {
        self.sensitivity.clamp(0.0, 100.0) / 50.0
    }
}

/// What Escape ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeAction {
    ReleasePointer,
    Paused,
    Resumed,
    ClosedInventory,
    Nothing,
}

#[derive(Resource, Debug, Clone)]
pub struct GameSession {
    pub state: GameState,
    pub difficulty: Difficulty,
    pub settings: Settings,
    /// Bumped on every restart; the world respawns when it changes
    pub game_key: u32,
    pub selected_hotbar: usize,
    pub inventory: Inventory,
    /// The menu has been left at least once, so START GAME reads RESUME
    pub started: bool,
}

impl GameSession {
    pub fn new(inventory: Inventory) -> Self {
        Self {
            state: GameState::Menu,
            difficulty: Difficulty::default(),
            settings: Settings::default(),
            game_key: 0,
            selected_hotbar: 0,
            inventory,
            started: false,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state == GameState::Playing
    }

    fn set_state(&mut self, state: GameState) {
        if self.state != state {
            log::info!("game state {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    pub fn start(&mut self) {
        self.started = true;
        self.set_state(GameState::Playing);
    }

    pub fn open_menu(&mut self) {
        self.set_state(GameState::Menu);
    }

    pub fn toggle_inventory(&mut self) {
        match self.state {
            GameState::Playing => self.set_state(GameState::Inventory),
            GameState::Inventory => self.set_state(GameState::Playing),
            _ => {}
        }
    }

    /// Wipe the inventory and hotbar, respawn the world and start playing.
    pub fn restart(&mut self) {
        self.inventory.clear();
        self.game_key += 1;
        log::info!("restart (game key {})", self.game_key);
        self.start();
    }

    pub fn cycle_difficulty(&mut self) {
        self.difficulty = self.difficulty.next();
    }

    /// Digit keys pick a hotbar slot while playing. `slot` is zero based.
    pub fn select_hotbar(&mut self, slot: usize) {
        if self.is_playing() && slot < self.inventory.hotbar.len() {
            self.selected_hotbar = slot;
        }
    }

    pub fn escape(&mut self, pointer_locked: bool) -> EscapeAction {
        if pointer_locked {
            return EscapeAction::ReleasePointer;
        }
        match self.state {
            GameState::Playing => {
                self.set_state(GameState::Paused);
                EscapeAction::Paused
            }
            GameState::Paused => {
                self.set_state(GameState::Playing);
                EscapeAction::Resumed
            }
            GameState::Inventory => {
                self.set_state(GameState::Playing);
                EscapeAction::ClosedInventory
            }
            GameState::Menu => EscapeAction::Nothing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> GameSession {
        GameSession::new(Inventory::starting(20, 5))
    }

    #[test]
    fn starts_in_menu_and_starts_playing() {
        let mut s = session();
        assert_eq!(s.state, GameState::Menu);
        assert!(!s.started);
        s.start();
        assert!(s.is_playing());
        assert!(s.started);
        s.open_menu();
        assert_eq!(s.state, GameState::Menu);
    }

    #[test]
    fn inventory_toggles_only_from_playing() {
        let mut s = session();
        s.toggle_inventory();
        assert_eq!(s.state, GameState::Menu);
        s.start();
        s.toggle_inventory();
        assert_eq!(s.state, GameState::Inventory);
        s.toggle_inventory();
        assert_eq!(s.state, GameState::Playing);
    }

    #[test]
    fn restart_clears_items_and_bumps_key() {
        let mut s = session();
        s.restart();
        assert_eq!(s.game_key, 1);
        assert!(s.is_playing());
        assert!(s.inventory.main.iter().chain(&s.inventory.hotbar).all(Option::is_none));
    }

    #[test]
    fn difficulty_cycles() {
        let mut s = session();
        let seen: Vec<_> = (0..4)
            .map(|_| {
                s.cycle_difficulty();
                s.difficulty
            })
            .collect();
        assert_eq!(seen, [Difficulty::Hard, Difficulty::Survival, Difficulty::Easy, Difficulty::Normal]);
    }

    #[test]
    fn escape_semantics() {
        let mut s = session();
        s.start();
        assert_eq!(s.escape(true), EscapeAction::ReleasePointer);
        assert!(s.is_playing());
        assert_eq!(s.escape(false), EscapeAction::Paused);
        assert_eq!(s.escape(false), EscapeAction::Resumed);
        s.toggle_inventory();
        assert_eq!(s.escape(false), EscapeAction::ClosedInventory);
        assert!(s.is_playing());
        s.open_menu();
        assert_eq!(s.escape(false), EscapeAction::Nothing);
    }

    #[test]
    fn hotbar_selection_needs_play_and_range() {
        let mut s = session();
        s.select_hotbar(2);
        assert_eq!(s.selected_hotbar, 0);
        s.start();
        s.select_hotbar(2);
        assert_eq!(s.selected_hotbar, 2);
        s.select_hotbar(5);
        assert_eq!(s.selected_hotbar, 2);
    }

    #[test]
    fn sensitivity_scales_look() {
        let mut settings = Settings::default();
        assert_eq!(settings.look_scale(), 1.0);
        settings.sensitivity = 100.0;
        assert_eq!(settings.look_scale(), 2.0);
    }
}
