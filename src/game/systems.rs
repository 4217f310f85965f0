// Gameplay systems, run once per frame in this order:
// look -> movement -> swing/chop -> tree -> character animation -> camera.
// The whole chain only runs while the session is in the Playing state.

use bevy_ecs::prelude::*;
use glam::{Quat, Vec2};

use super::character::CharacterRig;
use super::player::{move_direction, Player};
use super::resources::{FrameTime, PointerLock, ViewMode, Viewport};
use super::session::GameSession;
use super::swing::Swing;
use super::tree::{ChopOutcome, Tree};
use crate::config::GameConfig;
use crate::engine::camera::CameraRig;
use crate::engine::components::Transform;
use crate::engine::input::InputState;

pub fn is_playing(session: Res<GameSession>) -> bool {
    session.is_playing()
}

/// Mouse look in first person (pointer locked), wheel zoom in third person.
pub fn look_system(
    input: Res<InputState>,
    view: Res<ViewMode>,
    pointer: Res<PointerLock>,
    session: Res<GameSession>,
    config: Res<GameConfig>,
    mut rig: ResMut<CameraRig>,
) {
    if view.is_first_person() {
        if pointer.locked {
            let (dx, dy) = input.mouse_motion;
            let fp = &config.first_person;
            let speed = fp.mouse_sensitivity * session.settings.look_scale();
            rig.look.apply_mouse(dx, dy, speed, fp.pitch_limit);
        }
    } else if input.scroll_delta != 0.0 {
        rig.apply_scroll(input.scroll_delta, &config.camera);
    }
}

pub fn movement_system(
    input: Res<InputState>,
    view: Res<ViewMode>,
    rig: Res<CameraRig>,
    config: Res<GameConfig>,
    time: Res<FrameTime>,
    mut players: Query<(&mut Transform, &mut Player)>,
) {
    let yaw = view.is_first_person().then_some(rig.look.yaw);
    let dir = move_direction(input.move_axes(), yaw);
    for (mut transform, mut player) in &mut players {
        let step = player.integrate(dir, time.dt, &config.movement);
        transform.position += step;
        transform.rotation = match yaw {
            Some(yaw) => Quat::from_rotation_y(yaw),
            None => player.turn(transform.rotation, time.dt, &config.movement),
        };
    }
}

/// Left click: grab the pointer in first person, start a swing, and chop the
/// tree under the cursor (or the crosshair while locked). The swing cooldown
/// only limits the animation; every click that lands on the tree chops.
#[allow(clippy::too_many_arguments)]
pub fn swing_system(
    input: Res<InputState>,
    view: Res<ViewMode>,
    rig: Res<CameraRig>,
    viewport: Res<Viewport>,
    config: Res<GameConfig>,
    time: Res<FrameTime>,
    mut pointer: ResMut<PointerLock>,
    mut players: Query<(&Transform, &mut Swing), With<Player>>,
    mut trees: Query<&mut Tree>,
) {
    let clicked = input.left_clicked();
    if clicked && view.is_first_person() {
        pointer.acquire();
    }

    let size = Vec2::new(viewport.width, viewport.height);
    let cursor = if pointer.locked {
        size * 0.5
    } else {
        Vec2::new(input.mouse_position.0, input.mouse_position.1)
    };

    for (transform, mut swing) in &mut players {
        if clicked {
            if !swing.trigger(&config.swing) {
                log::debug!("swing still cooling down");
            }
            let ray = rig.camera.screen_ray(cursor, size);
            for mut tree in &mut trees {
                if tree.pick(&ray, &config.tree).is_none() {
                    continue;
                }
                match tree.chop(transform.position, &config.tree) {
                    ChopOutcome::Hit { remaining } => log::info!("tree hit, {remaining} left"),
                    ChopOutcome::Felled => log::info!("tree felled"),
                    ChopOutcome::Ignored => log::debug!("chop ignored (out of range or falling)"),
                }
            }
        }
        swing.advance(time.dt, &config.swing);
    }
}

pub fn tree_system(config: Res<GameConfig>, time: Res<FrameTime>, mut trees: Query<&mut Tree>) {
    for mut tree in &mut trees {
        tree.advance(time.dt, &config.tree);
    }
}

pub fn character_system(
    view: Res<ViewMode>,
    config: Res<GameConfig>,
    time: Res<FrameTime>,
    mut rigs: Query<(&Player, &Swing, &mut CharacterRig)>,
) {
    for (player, swing, mut rig) in &mut rigs {
        rig.update(
            time.elapsed,
            time.dt,
            player.walking,
            swing.chopping,
            view.is_first_person(),
            &config.character,
        );
    }
}

pub fn camera_system(
    view: Res<ViewMode>,
    config: Res<GameConfig>,
    time: Res<FrameTime>,
    mut rig: ResMut<CameraRig>,
    players: Query<&Transform, With<Player>>,
) {
    let Ok(player) = players.get_single() else {
        return;
    };
    match *view {
        ViewMode::FirstPerson => rig.follow_first_person(player.position, &config.first_person, time.dt),
        ViewMode::ThirdPerson => rig.follow_third_person(player.position, &config.camera, time.dt),
    }
}

pub fn build_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            look_system,
            movement_system,
            swing_system,
            tree_system,
            character_system,
            camera_system,
        )
            .chain()
            .run_if(is_playing),
    );
    schedule
}
