/// Zone reactions: one handler per zone kind, looked up in a single table.
///
/// Handlers run after movement has been resolved. A handler that moves the
/// player (trap, exit) returns `Flow::Stop` so the overlaps computed from the
/// old position are not processed any further this tick.

use rand::Rng;
use tracing::debug;

use crate::domain::entity::AnimState;
use crate::domain::tile::ZoneKind;
use crate::sim::event::GameEvent;
use crate::sim::overlay::Tone;
use crate::sim::tracker::Collected;
use crate::sim::world::{ScenePhase, SceneState};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Flow {
    Continue,
    Stop,
}

pub type ZoneHandler = fn(&mut SceneState, (usize, usize), &mut Vec<GameEvent>) -> Flow;

/// Order in which overlapping zones are handled each tick.
pub const OVERLAP_ORDER: [ZoneKind; 4] = [
    ZoneKind::Item,
    ZoneKind::HeartItem,
    ZoneKind::Trap,
    ZoneKind::Exit,
];

pub fn zone_handler(kind: ZoneKind) -> Option<ZoneHandler> {
    match kind {
        ZoneKind::Ground => Some(on_ground),
        ZoneKind::Item => Some(on_item),
        ZoneKind::HeartItem => Some(on_heart),
        ZoneKind::Trap => Some(on_trap),
        ZoneKind::Exit => Some(on_exit),
        ZoneKind::Ladder => None, // read by the movement step
    }
}

pub const ITEM_MESSAGES: &[&str] = &[
    "Magic item collected! ✨",
    "Another sparkle for the collection! ✨",
    "Shiny! Keep going! 💫",
    "That one was well hidden! 🌟",
    "Treasure secured! 💎",
];

pub const HEART_MESSAGE: &str = "A heart! You found a piece of love! 💖";
pub const LOVE_MESSAGE: &str = "Every heart found... all of them are yours! ❤️❤️❤️";
pub const TRAP_MESSAGE: &str = "Ouch! Spikes! Back to the start... ⚠️";
pub const EXIT_BLOCKED_MESSAGE: &str = "Collect all the magic items first! 🎯";
pub const COMPLETE_MESSAGE: &str = "Bravo! You finished the level! 🎉";

// ── Handlers ──

/// Landing: jump becomes available again after the cooldown.
fn on_ground(scene: &mut SceneState, _cell: (usize, usize), events: &mut Vec<GameEvent>) -> Flow {
    let cooldown = scene.physics.jump_cooldown_ticks;
    if let Some(p) = scene.player.as_mut() {
        p.can_jump = true;
        p.jump_hold_active = false;
        p.jump_hold_ms = 0.0;
        p.jump_cooldown = cooldown;
        events.push(GameEvent::Landed);
    }
    Flow::Continue
}

fn on_item(scene: &mut SceneState, (x, y): (usize, usize), events: &mut Vec<GameEvent>) -> Flow {
    if scene.layers.layer_mut(ZoneKind::Item).remove(x, y).is_none() {
        return Flow::Continue;
    }
    if scene.tracker.collect(ZoneKind::Item).is_some() {
        let msg = ITEM_MESSAGES[scene.rng.gen_range(0..ITEM_MESSAGES.len())];
        scene.overlay.push(msg, Tone::Info);
        debug!("item at ({x}, {y}); {}/{}", scene.tracker.collected, scene.tracker.total);
        events.push(GameEvent::ItemCollected { x, y });
    }
    Flow::Continue
}

fn on_heart(scene: &mut SceneState, (x, y): (usize, usize), events: &mut Vec<GameEvent>) -> Flow {
    if scene.layers.layer_mut(ZoneKind::HeartItem).remove(x, y).is_none() {
        return Flow::Continue;
    }
    let Some(outcome) = scene.tracker.collect(ZoneKind::HeartItem) else {
        return Flow::Continue;
    };
    scene.overlay.push(HEART_MESSAGE, Tone::Love);
    debug!(
        "heart at ({x}, {y}); hearts {}/{}",
        scene.tracker.hearts_collected, scene.tracker.hearts_total,
    );
    events.push(GameEvent::HeartCollected { x, y });
    if outcome == Collected::LastHeart {
        let ticks = scene.message_ticks.saturating_mul(2);
        scene.overlay.push_for(LOVE_MESSAGE, Tone::Love, ticks);
        events.push(GameEvent::AllHeartsCollected);
    }
    Flow::Continue
}

/// Back to spawn, at rest. No other penalty.
fn on_trap(scene: &mut SceneState, (x, y): (usize, usize), events: &mut Vec<GameEvent>) -> Flow {
    let (sx, sy) = scene.spawn;
    if let Some(p) = scene.player.as_mut() {
        p.teleport(sx, sy);
        p.on_ground = false;
    }
    scene.overlay.push(TRAP_MESSAGE, Tone::Warning);
    debug!("trap at ({x}, {y}); player returned to spawn");
    events.push(GameEvent::TrapTriggered { x, y });
    Flow::Stop
}

fn on_exit(scene: &mut SceneState, _cell: (usize, usize), events: &mut Vec<GameEvent>) -> Flow {
    if scene.tracker.all_collected() {
        scene.phase = ScenePhase::Complete;
        scene.completion_timer = Some(scene.completion_ticks);
        if let Some(p) = scene.player.as_mut() {
            p.set_anim(AnimState::Cheer);
            p.vx = 0.0;
        }
        scene.overlay.push_for(COMPLETE_MESSAGE, Tone::Success, scene.completion_ticks);
        debug!("exit reached with everything collected");
        events.push(GameEvent::LevelComplete);
        return Flow::Stop;
    }
    // Only on entering the exit, not on every tick spent inside it.
    if !scene.exit_contact {
        scene.overlay.push(EXIT_BLOCKED_MESSAGE, Tone::Warning);
        events.push(GameEvent::ExitBlocked);
    }
    Flow::Continue
}
