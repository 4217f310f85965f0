// Game module - the survival prototype itself: the player, the tree, the
// procedural character, menus and inventory, and the systems tying them together

pub mod character;
pub mod hud;
pub mod inventory;
pub mod player;
pub mod resources;
pub mod scene;
pub mod session;
pub mod swing;
pub mod systems;
pub mod tree;
