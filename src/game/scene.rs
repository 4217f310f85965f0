// Scene assembly: procedural meshes, world resources, entity spawning and the
// per-frame draw list.

use bevy_ecs::prelude::*;
use glam::{Mat4, Vec3};
use rand::Rng;

use super::character::CharacterRig;
use super::inventory::Inventory;
use super::player::Player;
use super::resources::{FrameTime, PointerLock, SceneEntity, SceneMeshes, ViewMode, Viewport};
use super::session::GameSession;
use super::swing::Swing;
use super::tree::{Tree, LEAVES, LEAF_COLOR, TOP, TOP_COLOR, TRUNK};
use crate::config::{AxeStyle, GameConfig};
use crate::engine::camera::CameraRig;
use crate::engine::components::{Color, Renderable, Transform};
use crate::engine::input::InputState;
use crate::engine::mesh::{triangulate_flat, triangulate_smooth};
use crate::engine::primitives;
use crate::engine::renderer::{DrawItem, Lighting, MeshLibrary};

/// Build every mesh the scene uses. Shapes that change color at runtime are
/// white and tinted per draw.
pub fn build_meshes(config: &GameConfig, rng: &mut impl Rng) -> (MeshLibrary, SceneMeshes) {
    let mut library = MeshLibrary::new();
    let world = &config.world;
    let (trunk_top, trunk_bottom, trunk_h) = TRUNK;
    let (leaf_r, leaf_h, _) = LEAVES;
    let (top_r, _) = TOP;

    let axe = match config.axe.style {
        AxeStyle::Primitive => primitives::primitive_axe(),
        AxeStyle::Procedural => primitives::procedural_axe(),
    };

    let meshes = SceneMeshes {
        ground: library.add(triangulate_flat(&primitives::grass_plane(world.ground_size, world.ground_divisions, rng))),
        trunk: library.add(triangulate_flat(&primitives::cylinder(trunk_top, trunk_bottom, trunk_h, 8, Color::WHITE))),
        leaves: library.add(triangulate_flat(&primitives::cone(leaf_r, leaf_h, 10, Color::WHITE))),
        top: library.add(triangulate_smooth(&primitives::sphere(top_r, 10, 10, Color::WHITE))),
        body_part: library.add(triangulate_flat(&primitives::cuboid(Vec3::splat(0.5), Color::WHITE))),
        axe: library.add(triangulate_flat(&axe)),
    };
    log::info!("built {} meshes ({:?} axe)", library.len(), config.axe.style);
    (library, meshes)
}

pub fn insert_resources(world: &mut World, config: GameConfig, meshes: SceneMeshes) {
    let inventory = Inventory::starting(config.world.inventory_slots, config.world.hotbar_slots);
    world.insert_resource(GameSession::new(inventory));
    world.insert_resource(config);
    world.insert_resource(meshes);
    world.insert_resource(InputState::new());
    world.insert_resource(FrameTime::default());
    world.insert_resource(ViewMode::default());
    world.insert_resource(PointerLock::default());
    world.insert_resource(CameraRig::default());
    world.insert_resource(Viewport::default());
}

pub fn spawn_scene(world: &mut World) {
    let config = world.resource::<GameConfig>().clone();
    let meshes = *world.resource::<SceneMeshes>();

    world.spawn((SceneEntity, Transform::default(), Renderable::new(meshes.ground, Color::WHITE)));
    world.spawn((SceneEntity, Tree::new(&config.tree)));
    world.spawn((
        SceneEntity,
        Transform::default().with_scale(config.character.scale),
        Player::default(),
        Swing::default(),
        CharacterRig::procedural(&config.axe),
    ));
}

/// Throw away the scene and build a fresh one, back in third person.
pub fn respawn_scene(world: &mut World) {
    let old: Vec<Entity> = world.query_filtered::<Entity, With<SceneEntity>>().iter(world).collect();
    for entity in old {
        world.despawn(entity);
    }
    spawn_scene(world);

    world.insert_resource(CameraRig::default());
    world.insert_resource(ViewMode::ThirdPerson);
    world.resource_mut::<PointerLock>().release();
    world.resource_mut::<FrameTime>().elapsed = 0.0;
    log::info!("scene respawned");
}

pub fn lighting(config: &GameConfig) -> Lighting {
    Lighting {
        sky: Color::from_hex(config.world.sky_color),
        ambient: config.world.ambient,
        sun_position: config.world.sun_position,
        sun_intensity: config.world.sun_intensity,
    }
}

pub fn player_position(world: &mut World) -> Option<Vec3> {
    let mut q = world.query_filtered::<&Transform, With<Player>>();
    q.get_single(world).ok().map(|t| t.position)
}

/// Everything visible this frame.
pub fn collect_draws(world: &mut World) -> Vec<DrawItem> {
    let meshes = *world.resource::<SceneMeshes>();
    let tree_config = world.resource::<GameConfig>().tree.clone();
    let player = player_position(world).unwrap_or(Vec3::ZERO);
    let mut draws = Vec::new();

    let mut renderables = world.query::<(&Transform, &Renderable)>();
    for (transform, renderable) in renderables.iter(world) {
        if renderable.visible {
            draws.push(DrawItem { mesh: renderable.mesh, model: transform.matrix(), color: renderable.color });
        }
    }

    let mut trees = world.query::<&Tree>();
    for tree in trees.iter(world) {
        let root = tree.world_matrix(&tree_config);
        draws.push(DrawItem {
            mesh: meshes.trunk,
            model: root * Mat4::from_scale(Vec3::splat(tree.trunk_scale(&tree_config))),
            color: tree.trunk_color(tree.can_chop(player, &tree_config)),
        });
        draws.push(DrawItem {
            mesh: meshes.leaves,
            model: root * Mat4::from_translation(Vec3::Y * LEAVES.2),
            color: Color::from_hex(LEAF_COLOR),
        });
        if tree.shows_top() {
            draws.push(DrawItem {
                mesh: meshes.top,
                model: root * Mat4::from_translation(Vec3::Y * TOP.1),
                color: Color::from_hex(TOP_COLOR),
            });
        }
    }

    let mut characters = world.query::<(&Transform, &Swing, &CharacterRig)>();
    for (transform, swing, rig) in characters.iter(world) {
        let swing_value = if swing.chopping { swing.value } else { 0.0 };
        draws.extend(rig.draws(transform.matrix(), meshes.body_part, meshes.axe, swing_value, swing.direction));
    }

    draws
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn world() -> World {
        let config = GameConfig::default();
        let (_, meshes) = build_meshes(&config, &mut StdRng::seed_from_u64(3));
        let mut world = World::new();
        insert_resources(&mut world, config, meshes);
        spawn_scene(&mut world);
        world
    }

    #[test]
    fn scene_draws_ground_tree_body_and_axe() {
        let mut world = world();
        let meshes = *world.resource::<SceneMeshes>();
        let draws = collect_draws(&mut world);
        let count = |m| draws.iter().filter(|d| d.mesh == m).count();
        assert_eq!(count(meshes.ground), 1);
        assert_eq!(count(meshes.trunk), 1);
        assert_eq!(count(meshes.top), 1);
        assert_eq!(count(meshes.axe), 1);
        assert_eq!(count(meshes.body_part), 14);
    }

    #[test]
    fn trunk_is_dimmed_out_of_range() {
        let mut world = world();
        let meshes = *world.resource::<SceneMeshes>();
        let trunk = |draws: &[DrawItem]| draws.iter().find(|d| d.mesh == meshes.trunk).map(|d| d.color);

        let far = collect_draws(&mut world);
        assert_eq!(trunk(&far), Some(Tree::new(&GameConfig::default().tree).trunk_color(false)));

        let mut q = world.query_filtered::<&mut Transform, With<Player>>();
        q.single_mut(&mut world).position = Vec3::new(2.0, 0.0, -1.0);
        let near = collect_draws(&mut world);
        assert_eq!(trunk(&near), Some(Tree::new(&GameConfig::default().tree).trunk_color(true)));
    }

    #[test]
    fn respawn_replaces_the_scene() {
        let mut world = world();
        {
            let mut q = world.query::<&mut Tree>();
            q.single_mut(&mut world).health = 0;
        }
        world.insert_resource(ViewMode::FirstPerson);
        respawn_scene(&mut world);

        let mut trees = world.query::<&Tree>();
        let healths: Vec<u32> = trees.iter(&world).map(|t| t.health).collect();
        assert_eq!(healths, vec![3]);
        assert_eq!(*world.resource::<ViewMode>(), ViewMode::ThirdPerson);
        let players = world.query::<&Player>().iter(&world).count();
        assert_eq!(players, 1);
    }
}
