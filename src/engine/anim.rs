//! Rotation clips and a cross-fading mixer.
//!
//! Clips hold per-bone rotation keyframes sampled with slerp. The mixer keeps
//! one action per clip; each action has its own time, weight and optional fade.
//! Pose evaluation accumulates the weighted rotations of every action with a
//! non-zero weight, and any weight left below 1 is filled from the bind pose.

use glam::Quat;

use super::skeleton::Skeleton;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    Repeat,
    /// Play once and hold the last frame.
    Once,
}

#[derive(Debug, Clone)]
pub struct RotationTrack {
    pub bone: usize,
    pub times: Vec<f32>,
    pub values: Vec<Quat>,
}

impl RotationTrack {
    pub fn sample(&self, t: f32) -> Quat {
        let (times, values) = (&self.times, &self.values);
        if times.is_empty() {
            return Quat::IDENTITY;
        }
        if t <= times[0] {
            return values[0];
        }
        let last = times.len() - 1;
        if t >= times[last] {
            return values[last];
        }
        let i = times.partition_point(|&k| k <= t) - 1;
        let span = times[i + 1] - times[i];
        let f = if span > 0.0 { (t - times[i]) / span } else { 0.0 };
        values[i].slerp(values[i + 1], f)
    }
}

#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub loop_mode: LoopMode,
    pub tracks: Vec<RotationTrack>,
}

impl AnimationClip {
    pub fn new(name: &str, duration: f32, loop_mode: LoopMode) -> Self {
        Self { name: name.to_string(), duration, loop_mode, tracks: Vec::new() }
    }

    /// Add a track of keyframes given as (time, rotation relative to the bind pose).
    pub fn with_track(mut self, skeleton: &Skeleton, bone: usize, keys: &[(f32, Quat)]) -> Self {
        let bind = skeleton.bind_rotation(bone);
        self.tracks.push(RotationTrack {
            bone,
            times: keys.iter().map(|(t, _)| *t).collect(),
            values: keys.iter().map(|(_, q)| bind * *q).collect(),
        });
        self
    }
}

/// Index of the first clip whose lowercase name contains any pattern.
/// Patterns are tried in order of clips, not of patterns.
pub fn find_clip(clips: &[AnimationClip], patterns: &[&str]) -> Option<usize> {
    clips.iter().position(|c| {
        let lower = c.name.to_lowercase();
        patterns.iter().any(|p| lower.contains(p))
    })
}

#[derive(Debug, Clone, Copy)]
struct Fade {
    from: f32,
    to: f32,
    duration: f32,
    elapsed: f32,
}

#[derive(Debug, Clone)]
pub struct Action {
    pub time: f32,
    pub weight: f32,
    pub playing: bool,
    fade: Option<Fade>,
}

impl Action {
    fn new() -> Self {
        Self { time: 0.0, weight: 0.0, playing: false, fade: None }
    }
}

#[derive(Debug, Clone)]
pub struct Mixer {
    clips: Vec<AnimationClip>,
    actions: Vec<Action>,
}

impl Mixer {
    pub fn new(clips: Vec<AnimationClip>) -> Self {
        let actions = clips.iter().map(|_| Action::new()).collect();
        Self { clips, actions }
    }

    #[cfg(test)]
    pub fn clips(&self) -> &[AnimationClip] {
        &self.clips
    }

    #[cfg(test)]
    pub fn action(&self, index: usize) -> &Action {
        &self.actions[index]
    }

    /// Rewind to the start and clear any fade.
    pub fn reset(&mut self, index: usize) -> &mut Self {
        let a = &mut self.actions[index];
        a.time = 0.0;
        a.fade = None;
        self
    }

    /// Start playing at full weight unless a fade says otherwise.
    pub fn play(&mut self, index: usize) -> &mut Self {
        let a = &mut self.actions[index];
        a.playing = true;
        if a.fade.is_none() {
            a.weight = 1.0;
        }
        self
    }

    pub fn fade_in(&mut self, index: usize, duration: f32) -> &mut Self {
        self.start_fade(index, 0.0, 1.0, duration);
        self
    }

    /// Fade to zero weight; the action stops once the fade completes.
    pub fn fade_out(&mut self, index: usize, duration: f32) -> &mut Self {
        let from = self.actions[index].weight;
        self.start_fade(index, from, 0.0, duration);
        self
    }

    fn start_fade(&mut self, index: usize, from: f32, to: f32, duration: f32) {
        let a = &mut self.actions[index];
        if duration <= 0.0 {
            a.weight = to;
            a.fade = None;
            return;
        }
        a.weight = from;
        a.fade = Some(Fade { from, to, duration, elapsed: 0.0 });
    }

    pub fn advance(&mut self, dt: f32) {
        for (action, clip) in self.actions.iter_mut().zip(&self.clips) {
            if !action.playing {
                continue;
            }
            action.time += dt;
            match clip.loop_mode {
                LoopMode::Repeat if clip.duration > 0.0 => {
                    action.time %= clip.duration;
                }
                LoopMode::Repeat => action.time = 0.0,
                LoopMode::Once => action.time = action.time.min(clip.duration),
            }

            if let Some(fade) = action.fade.as_mut() {
                fade.elapsed += dt;
                let f = (fade.elapsed / fade.duration).min(1.0);
                action.weight = fade.from + (fade.to - fade.from) * f;
                if f >= 1.0 {
                    action.fade = None;
                    if action.weight <= 0.0 {
                        action.playing = false;
                    }
                }
            }
        }
    }

    /// Write the blended pose into the skeleton's local rotations.
    pub fn apply(&self, skeleton: &mut Skeleton) {
        let n = skeleton.len();
        let mut acc: Vec<Option<(Quat, f32)>> = vec![None; n];

        for (action, clip) in self.actions.iter().zip(&self.clips) {
            if !action.playing || action.weight <= 0.0 {
                continue;
            }
            for track in &clip.tracks {
                if track.bone >= n {
                    continue;
                }
                let q = track.sample(action.time);
                let w = action.weight;
                acc[track.bone] = Some(match acc[track.bone] {
                    None => (q, w),
                    Some((prev, pw)) => (prev.slerp(q, w / (pw + w)), pw + w),
                });
            }
        }

        for (i, slot) in acc.into_iter().enumerate() {
            let bind = skeleton.bind_rotation(i);
            let pose = match slot {
                None => bind,
                Some((q, w)) if w < 1.0 => bind.slerp(q, w),
                Some((q, _)) => q,
            };
            skeleton.set_rotation(i, pose);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use std::f32::consts::FRAC_PI_2;

    fn setup() -> (Skeleton, Vec<AnimationClip>) {
        let mut s = Skeleton::new();
        let b = s.add_bone("Arm", None, Vec3::ZERO);
        let raise = AnimationClip::new("Raise", 1.0, LoopMode::Once)
            .with_track(&s, b, &[(0.0, Quat::IDENTITY), (1.0, Quat::from_rotation_x(FRAC_PI_2))]);
        let hold = AnimationClip::new("Idle_Neutral", 2.0, LoopMode::Repeat)
            .with_track(&s, b, &[(0.0, Quat::IDENTITY), (2.0, Quat::IDENTITY)]);
        (s, vec![raise, hold])
    }

    #[test]
    fn track_sampling_interpolates_and_clamps() {
        let (_, clips) = setup();
        let track = &clips[0].tracks[0];
        let mid = track.sample(0.5);
        assert!(mid.abs_diff_eq(Quat::from_rotation_x(FRAC_PI_2 / 2.0), 2e-3));
        assert_eq!(track.sample(-1.0), Quat::IDENTITY);
        assert_eq!(track.sample(9.0), Quat::from_rotation_x(FRAC_PI_2));
    }

    #[test]
    fn find_clip_by_patterns() {
        let (_, clips) = setup();
        assert_eq!(find_clip(&clips, &["idle_neutral", "idle"]), Some(1));
        assert_eq!(find_clip(&clips, &["walk"]), None);
    }

    #[test]
    fn once_clamps_at_end() {
        let (_, clips) = setup();
        let mut mixer = Mixer::new(clips);
        mixer.reset(0).play(0);
        mixer.advance(5.0);
        assert_eq!(mixer.action(0).time, 1.0);
    }

    #[test]
    fn fades_reach_targets_and_stop() {
        let (_, clips) = setup();
        let mut mixer = Mixer::new(clips);
        mixer.play(1);
        mixer.fade_out(1, 0.15);
        mixer.reset(0).fade_in(0, 0.1).play(0);
        assert_eq!(mixer.action(0).weight, 0.0);
        mixer.advance(0.05);
        assert!((mixer.action(0).weight - 0.5).abs() < 1e-5);
        mixer.advance(0.2);
        assert_eq!(mixer.action(0).weight, 1.0);
        assert_eq!(mixer.action(1).weight, 0.0);
        assert!(!mixer.action(1).playing);
    }

    #[test]
    fn partial_weight_blends_with_bind_pose() {
        let (mut s, clips) = setup();
        let mut mixer = Mixer::new(clips);
        mixer.reset(0).fade_in(0, 1.0).play(0);
        mixer.advance(0.5);
        mixer.apply(&mut s);
        // Half-way through the clip (45°) at half weight → 22.5°.
        let expected = Quat::from_rotation_x(FRAC_PI_2 / 4.0);
        assert!(s.bones()[0].rotation.abs_diff_eq(expected, 2e-3));
    }

    #[test]
    fn idle_mixer_leaves_bind_pose() {
        let (mut s, clips) = setup();
        s.set_rotation(0, Quat::from_rotation_y(1.0));
        Mixer::new(clips).apply(&mut s);
        assert_eq!(s.bones()[0].rotation, Quat::IDENTITY);
    }
}
