/// The step function: advances a platformer scene by one tick.
///
/// Processing order:
///   1. Timers (overlay messages, completion countdown)
///   2. Ladder overlap
///   3. Jump start / hold window
///   4. Horizontal velocity
///   5. Vertical velocity (gravity or climb)
///   6. Axis-separated movement against ground and map edges
///   7. Ground contact (landing handler)
///   8. Zone overlaps via the dispatch table
///   9. Animation transition
///
/// Outside `Playing` the player still falls and lands, but input and zone
/// overlaps are ignored.

use crate::domain::entity::{AnimState, Facing, FrameInput, PLAYER_H, PLAYER_W};
use crate::domain::physics::{self, Aabb};
use crate::domain::rules::{self, Contact};
use crate::domain::tile::ZoneKind;
use super::completion::CompletionHandle;
use super::event::GameEvent;
use super::world::{ScenePhase, SceneState};
use super::zones::{self, Flow, OVERLAP_ORDER};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(scene: &mut SceneState, input: FrameInput, handle: &mut CompletionHandle) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();
    scene.tick += 1;
    scene.overlay.tick();

    resolve_completion_timer(scene, handle, &mut events);

    let input = if scene.phase == ScenePhase::Playing { input } else { FrameInput::default() };
    if !resolve_player_motion(scene, &input, &mut events) {
        return events; // degraded: no player
    }
    if scene.phase == ScenePhase::Playing {
        resolve_zones(scene, &mut events);
    }
    resolve_animation(scene, &input);
    scene.follow_player();

    events
}

/// Leave the guide panel and start playing. Returns false if already started.
pub fn begin(scene: &mut SceneState) -> bool {
    if scene.phase != ScenePhase::Guide {
        return false;
    }
    scene.overlay.dismiss_guide();
    scene.phase = ScenePhase::Playing;
    true
}

// ══════════════════════════════════════════════════════════════
// Completion
// ══════════════════════════════════════════════════════════════

fn resolve_completion_timer(scene: &mut SceneState, handle: &mut CompletionHandle, events: &mut Vec<GameEvent>) {
    let Some(remaining) = scene.completion_timer else { return };
    if remaining > 1 {
        scene.completion_timer = Some(remaining - 1);
        return;
    }
    scene.completion_timer = None;
    if handle.fire() {
        events.push(GameEvent::CompletionSignaled);
    }
}

// ══════════════════════════════════════════════════════════════
// Motion
// ══════════════════════════════════════════════════════════════

/// Steps 2–7. Returns false when there is no player to move.
fn resolve_player_motion(scene: &mut SceneState, input: &FrameInput, events: &mut Vec<GameEvent>) -> bool {
    let dt = scene.dt();
    let tick_ms = scene.tick_ms as f32;
    let cfg = scene.physics.clone();
    let Some(p) = scene.player.as_mut() else { return false };

    // Ladder
    let bbox = Aabb::new(p.x, p.y, PLAYER_W, PLAYER_H);
    p.on_ladder = !physics::overlapping(&scene.layers, ZoneKind::Ladder, &bbox).is_empty();

    // Jump
    if p.on_ground && p.jump_cooldown > 0 {
        p.jump_cooldown -= 1;
    }
    let mut hold = false;
    if p.on_ladder {
        p.jump_hold_active = false;
    } else if rules::can_start_jump(p, input) {
        p.vy = -cfg.jump_velocity;
        p.can_jump = false;
        p.on_ground = false;
        p.jump_hold_active = true;
        p.jump_hold_ms = cfg.jump_hold_ms;
        events.push(GameEvent::Jumped);
    } else if rules::jump_hold_continues(p, input) {
        hold = true;
        p.jump_hold_ms -= tick_ms;
    } else {
        // Released or out of budget: this jump's hold window is over.
        p.jump_hold_active = false;
    }

    // Horizontal
    let speed = if p.on_ground || p.on_ladder { cfg.move_speed } else { cfg.move_speed * cfg.air_control };
    p.vx = input.horizontal() as f32 * speed;
    match input.horizontal() {
        -1 => p.facing = Facing::Left,
        1 => p.facing = Facing::Right,
        _ => {}
    }

    // Vertical
    if p.on_ladder {
        p.vy = input.vertical() as f32 * cfg.climb_speed;
    } else if hold {
        // Gravity waits while the hold window lasts.
        p.vy = p.vy.min(-cfg.jump_velocity * cfg.jump_hold_factor);
    } else {
        p.vy = (p.vy + cfg.gravity * dt).min(cfg.terminal_velocity);
    }

    // Move
    let mut bbox = Aabb::new(p.x, p.y, PLAYER_W, PLAYER_H);
    let contacts = physics::move_and_collide(&scene.layers, &mut bbox, p.vx * dt, p.vy * dt);
    p.x = bbox.x;
    p.y = bbox.y;
    if contacts.hit_wall {
        p.vx = 0.0;
    }
    if contacts.hit_head && p.vy < 0.0 {
        p.vy = 0.0;
        p.jump_hold_active = false;
    }
    if contacts.on_ground && p.vy > 0.0 {
        p.vy = 0.0;
    }

    // Ground contact
    let landed = contacts.on_ground && !p.on_ground;
    p.on_ground = contacts.on_ground;
    if landed {
        let ts = scene.layers.tile_size;
        let (cx, _) = bbox.center();
        let cell = ((cx / ts).max(0.0) as usize, ((bbox.y + bbox.h) / ts).max(0.0) as usize);
        if let Some(handler) = zones::zone_handler(ZoneKind::Ground) {
            handler(scene, cell, events);
        }
    }
    true
}

// ══════════════════════════════════════════════════════════════
// Zones
// ══════════════════════════════════════════════════════════════

fn player_box(scene: &SceneState) -> Option<Aabb> {
    scene.player.as_ref().map(|p| Aabb::new(p.x, p.y, PLAYER_W, PLAYER_H))
}

fn resolve_zones(scene: &mut SceneState, events: &mut Vec<GameEvent>) {
    let Some(bbox) = player_box(scene) else { return };

    'kinds: for kind in OVERLAP_ORDER {
        let Some(handler) = zones::zone_handler(kind) else { continue };
        let mut cells = physics::overlapping(&scene.layers, kind, &bbox);
        // A trap or an exit reacts once, however many of its tiles are touched.
        if matches!(kind, ZoneKind::Trap | ZoneKind::Exit) {
            cells.truncate(1);
        }
        for cell in cells {
            if handler(scene, cell, events) == Flow::Stop {
                break 'kinds;
            }
        }
    }

    scene.exit_contact = match player_box(scene) {
        Some(b) => !physics::overlapping(&scene.layers, ZoneKind::Exit, &b).is_empty(),
        None => false,
    };
}

// ══════════════════════════════════════════════════════════════
// Animation
// ══════════════════════════════════════════════════════════════

fn resolve_animation(scene: &mut SceneState, input: &FrameInput) {
    let complete = scene.phase == ScenePhase::Complete;
    let fall_threshold = scene.physics.fall_threshold;
    let tick_ms = scene.tick_ms;
    let Some(p) = scene.player.as_mut() else { return };

    let was_on_ladder = p.anim == AnimState::Climb;
    let contact = Contact {
        on_ground: p.on_ground,
        on_ladder: p.on_ladder,
        left_ladder: was_on_ladder && !p.on_ladder,
        complete,
        vy: p.vy,
        fall_threshold,
    };
    let next = rules::next_anim_state(p.anim, input, &contact);
    p.set_anim(next);
    p.anim_ms += tick_ms;
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::entity::Player;
    use crate::domain::tile::TileLayers;
    use crate::sim::completion::{completion_channel, SceneOutcome};
    use crate::sim::level::{embedded_map, LoadedMap};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Helper: scene from a diagram (tile size 32).
    /// Legend: '#'=Ground  'H'=Ladder  '*'=Item  'h'=Heart  '^'=Trap  'E'=Exit  'P'=spawn
    /// The spawn box is placed resting on the bottom of its cell.
    fn scene_from(rows: &[&str]) -> SceneState {
        let mut l = TileLayers::new(rows[0].len(), rows.len(), 32.0);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let kind = match ch {
                    '#' => ZoneKind::Ground,
                    'H' => ZoneKind::Ladder,
                    '*' => ZoneKind::Item,
                    'h' => ZoneKind::HeartItem,
                    '^' => ZoneKind::Trap,
                    'E' => ZoneKind::Exit,
                    'P' => {
                        l.spawn = Some((x as f32 * 32.0 + 6.0, y as f32 * 32.0 + 4.0));
                        continue;
                    }
                    _ => continue,
                };
                l.layer_mut(kind).set(x, y, 1);
            }
        }
        let map = LoadedMap { name: "test".into(), layers: l };
        let mut scene = SceneState::new(&map, &GameConfig::default(), StdRng::seed_from_u64(7));
        begin(&mut scene);
        scene
    }

    fn idle() -> FrameInput {
        FrameInput::default()
    }

    fn right() -> FrameInput {
        FrameInput { right: true, ..Default::default() }
    }

    fn jump() -> FrameInput {
        FrameInput { jump_pressed: true, jump_held: true, ..Default::default() }
    }

    fn run(scene: &mut SceneState, input: FrameInput, ticks: usize, handle: &mut CompletionHandle) -> Vec<GameEvent> {
        let mut all = vec![];
        for _ in 0..ticks {
            all.extend(step(scene, input, handle));
        }
        all
    }

    /// Settle the player on the floor and wait out the landing cooldown.
    fn settle(scene: &mut SceneState, handle: &mut CompletionHandle) {
        run(scene, idle(), 10, handle);
        assert!(scene.player.as_ref().is_some_and(|p| p.on_ground));
    }

    fn player(scene: &SceneState) -> &Player {
        scene.player.as_ref().expect("player")
    }

    // ── Jumping ──

    #[test]
    fn landing_enables_jump() {
        let (mut h, _rx) = completion_channel();
        let mut s = scene_from(&[
            "     ",
            " P   ",
            "#####",
        ]);
        let events = run(&mut s, idle(), 10, &mut h);
        assert!(events.contains(&GameEvent::Landed));
        assert!(player(&s).can_jump);
        assert_eq!(player(&s).jump_cooldown, 0);
    }

    #[test]
    fn no_double_jump() {
        let (mut h, _rx) = completion_channel();
        let mut s = scene_from(&[
            "     ",
            "     ",
            "     ",
            " P   ",
            "#####",
        ]);
        settle(&mut s, &mut h);

        let events = step(&mut s, jump(), &mut h);
        assert!(events.contains(&GameEvent::Jumped));
        assert!(player(&s).vy < 0.0);

        // Release, then press again in mid-air.
        step(&mut s, idle(), &mut h);
        let vy_before = player(&s).vy;
        let events = step(&mut s, jump(), &mut h);
        assert!(!events.contains(&GameEvent::Jumped));
        let g = s.physics.gravity * s.dt();
        assert!((player(&s).vy - (vy_before + g)).abs() < 1e-3, "only gravity changed vy");
    }

    #[test]
    fn holding_jump_goes_higher() {
        let rows = [
            "     ",
            "     ",
            "     ",
            "     ",
            "     ",
            "     ",
            "     ",
            " P   ",
            "#####",
        ];
        let (mut h, _rx) = completion_channel();

        let mut tap = scene_from(&rows);
        settle(&mut tap, &mut h);
        step(&mut tap, jump(), &mut h);
        let mut tap_top = f32::MAX;
        for _ in 0..60 {
            step(&mut tap, idle(), &mut h);
            tap_top = tap_top.min(player(&tap).y);
        }

        let mut held = scene_from(&rows);
        settle(&mut held, &mut h);
        step(&mut held, jump(), &mut h);
        let hold = FrameInput { jump_held: true, ..Default::default() };
        let mut held_top = f32::MAX;
        for _ in 0..60 {
            step(&mut held, hold, &mut h);
            held_top = held_top.min(player(&held).y);
        }
        assert!(held_top < tap_top, "held {held_top} vs tapped {tap_top}");
    }

    #[test]
    fn air_control_is_damped() {
        let (mut h, _rx) = completion_channel();
        let mut s = scene_from(&[
            "     ",
            "     ",
            " P   ",
            "#####",
        ]);
        settle(&mut s, &mut h);
        step(&mut s, right(), &mut h);
        assert_eq!(player(&s).vx, s.physics.move_speed);
        step(&mut s, FrameInput { right: true, ..jump() }, &mut h);
        step(&mut s, right(), &mut h);
        assert_eq!(player(&s).vx, s.physics.move_speed * s.physics.air_control);
        step(&mut s, idle(), &mut h);
        assert_eq!(player(&s).vx, 0.0);
    }

    // ── Ladders ──

    #[test]
    fn ladder_suspends_gravity() {
        let (mut h, _rx) = completion_channel();
        let mut s = scene_from(&[
            "  H  ",
            "  H  ",
            "  H  ",
            "#####",
        ]);
        s.player = Some(Player::new(70.0, 20.0));
        let y0 = player(&s).y;
        run(&mut s, idle(), 20, &mut h);
        let p = player(&s);
        assert_eq!((p.vx, p.vy), (0.0, 0.0));
        assert_eq!(p.y, y0);
        assert_eq!(p.anim, AnimState::Climb);
    }

    #[test]
    fn ladder_climb_and_no_jump() {
        let (mut h, _rx) = completion_channel();
        let mut s = scene_from(&[
            "  H  ",
            "  H  ",
            "  H  ",
            "#####",
        ]);
        s.player = Some(Player::new(70.0, 40.0));
        step(&mut s, FrameInput { up: true, ..Default::default() }, &mut h);
        assert_eq!(player(&s).vy, -s.physics.climb_speed);
        let events = step(&mut s, jump(), &mut h);
        assert!(!events.contains(&GameEvent::Jumped));
        assert_eq!(player(&s).vy, 0.0);
    }

    #[test]
    fn embedded_map_ladder_climbs_from_the_floor() {
        let (mut h, _rx) = completion_channel();
        let map = embedded_map().unwrap();
        let mut s = SceneState::new(&map, &GameConfig::default(), StdRng::seed_from_u64(7));
        begin(&mut s);
        // Standing on the floor row (12) in the ladder's column (34).
        s.player = Some(Player::new(34.0 * 32.0 + 6.0, 12.0 * 32.0 + 4.0));

        let up = FrameInput { up: true, ..Default::default() };
        let mut top = f32::MAX;
        for _ in 0..200 {
            step(&mut s, up, &mut h);
            top = top.min(player(&s).y);
        }
        assert!(top < 3.0 * 32.0, "reached row {}", (top / 32.0) as usize);
    }

    // ── Zones ──

    #[test]
    fn trap_returns_to_spawn() {
        let (mut h, _rx) = completion_channel();
        let mut s = scene_from(&[
            "     ",
            " P  ^",
            "#####",
        ]);
        let spawn = s.spawn;
        let mut p = Player::new(132.0, 36.0);
        p.vx = 200.0;
        p.vy = 50.0;
        s.player = Some(p);
        let events = step(&mut s, right(), &mut h);
        assert!(events.iter().any(|e| matches!(e, GameEvent::TrapTriggered { .. })));
        let p = player(&s);
        assert_eq!((p.x, p.y), spawn);
        assert_eq!((p.vx, p.vy), (0.0, 0.0));
    }

    #[test]
    fn item_is_collected_once() {
        let (mut h, _rx) = completion_channel();
        let mut s = scene_from(&[
            "     ",
            " P*  ",
            "#####",
        ]);
        settle(&mut s, &mut h);
        let events = run(&mut s, right(), 20, &mut h);
        let n = events.iter().filter(|e| matches!(e, GameEvent::ItemCollected { .. })).count();
        assert_eq!(n, 1);
        assert_eq!(s.tracker.collected, 1);
        assert_eq!(s.layers.layer(ZoneKind::Item).count(), 0);
        assert!(!s.overlay.messages().is_empty());
    }

    #[test]
    fn exit_blocked_until_everything_collected() {
        let (mut h, rx) = completion_channel();
        let mut s = scene_from(&[
            "*    ",
            " P E ",
            "#####",
        ]);
        settle(&mut s, &mut h);
        let events = run(&mut s, right(), 30, &mut h);
        let blocked = events.iter().filter(|e| **e == GameEvent::ExitBlocked).count();
        assert_eq!(blocked, 1, "edge-triggered while standing in the exit");
        assert_eq!(s.phase, ScenePhase::Playing);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn completion_fires_once_after_delay() {
        let (mut h, rx) = completion_channel();
        let mut s = scene_from(&[
            "     ",
            " P*E ",
            "#####",
        ]);
        settle(&mut s, &mut h);
        let events = run(&mut s, right(), 40, &mut h);
        assert!(events.contains(&GameEvent::LevelComplete));
        assert_eq!(s.phase, ScenePhase::Complete);
        assert_eq!(player(&s).anim, AnimState::Cheer);
        assert!(rx.try_recv().is_err(), "not before the delay");

        let ticks = s.completion_ticks as usize;
        let events = run(&mut s, right(), ticks + 10, &mut h);
        let n = events.iter().filter(|e| **e == GameEvent::CompletionSignaled).count();
        assert_eq!(n, 1);
        assert_eq!(rx.try_recv(), Ok(SceneOutcome::Completed));
        assert!(rx.try_recv().is_err());
        assert!(!s.restart(), "restart ignored after completion");
    }

    #[test]
    fn eight_collectibles_open_the_exit() {
        let (mut h, rx) = completion_channel();
        // 5 items and 3 hearts; the exit sits between them.
        let mut s = scene_from(&[
            "            ",
            " P*h*E*h*h* ",
            "############",
        ]);
        assert_eq!((s.tracker.total, s.tracker.hearts_total), (8, 3));
        settle(&mut s, &mut h);

        let events = run(&mut s, right(), 130, &mut h);
        let count = |pred: fn(&GameEvent) -> bool| events.iter().filter(|e| pred(e)).count();
        assert_eq!(count(|e| *e == GameEvent::ExitBlocked), 1, "exit passed at 3/8");
        assert_eq!(count(|e| matches!(e, GameEvent::HeartCollected { .. })), 3);
        assert_eq!(count(|e| *e == GameEvent::AllHeartsCollected), 1);
        assert!(!events.contains(&GameEvent::LevelComplete));
        assert_eq!(s.tracker.collected, 8);
        assert_eq!(s.phase, ScenePhase::Playing);
        assert!(s.overlay.messages().iter().any(|m| m.text == zones::LOVE_MESSAGE));

        let left = FrameInput { left: true, ..Default::default() };
        let events = run(&mut s, left, 130, &mut h);
        assert!(events.contains(&GameEvent::LevelComplete));
        assert!(!events.contains(&GameEvent::AllHeartsCollected), "love message only once");
        assert_eq!(s.phase, ScenePhase::Complete);

        let ticks = s.completion_ticks as usize + 5;
        run(&mut s, idle(), ticks, &mut h);
        assert_eq!(rx.try_recv(), Ok(SceneOutcome::Completed));
    }

    #[test]
    fn restart_keeps_handle_and_restores_items() {
        let (mut h, rx) = completion_channel();
        let mut s = scene_from(&[
            "     ",
            " P** ",
            "#####",
        ]);
        settle(&mut s, &mut h);
        run(&mut s, right(), 15, &mut h);
        assert!(s.tracker.collected > 0);
        assert!(s.restart());
        assert_eq!(s.tracker.collected, 0);
        assert_eq!(s.layers.layer(ZoneKind::Item).count(), 2);
        assert!(!h.has_fired());
        drop(rx);
    }

    #[test]
    fn degraded_scene_is_inert() {
        let (mut h, _rx) = completion_channel();
        let mut s = scene_from(&[
            "     ",
            " P   ",
            "#####",
        ]);
        s.player = None;
        assert!(step(&mut s, right(), &mut h).is_empty());
        assert!(s.is_degraded());
    }

    #[test]
    fn guide_blocks_input() {
        let (mut h, _rx) = completion_channel();
        let mut s = scene_from(&[
            "     ",
            " P   ",
            "#####",
        ]);
        s.phase = ScenePhase::Guide;
        let x0 = player(&s).x;
        run(&mut s, right(), 5, &mut h);
        assert_eq!(player(&s).x, x0);
        assert!(begin(&mut s));
        assert!(!begin(&mut s));
    }
}
