/// Jump rules and the animation state machine.
///
/// Pure functions: they decide, the step applies.
///
/// ### Jump start
/// ┌──────────────────────────────┬─────────┐
/// │ Condition                     │ Jump?   │
/// ├──────────────────────────────┼─────────┤
/// │ jump not freshly pressed      │ NO      │
/// │ on a ladder                   │ NO      │
/// │ not on ground                 │ NO      │
/// │ can_jump cleared (airborne)   │ NO      │
/// │ cooldown still running        │ NO      │
/// │ Otherwise                     │ YES     │
/// └──────────────────────────────┴─────────┘
///
/// ### Animation (priority order)
/// ┌──────────────────────────────┬──────────────┐
/// │ Condition                     │ Next state   │
/// ├──────────────────────────────┼──────────────┤
/// │ current = Cheer               │ Cheer        │
/// │ level complete                │ Cheer        │
/// │ on ladder                     │ Climb        │
/// │ grounded, horizontal input    │ Walk         │
/// │ grounded                      │ Idle         │
/// │ airborne, vy < 0              │ Jump         │
/// │ airborne, vy > fall threshold │ Fall         │
/// │ airborne, just left a ladder  │ Fall         │
/// │ otherwise                     │ unchanged    │
/// └──────────────────────────────┴──────────────┘

use super::entity::{AnimState, FrameInput, Player};

/// Contact and motion facts after movement has been resolved for a tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct Contact {
    pub on_ground: bool,
    pub on_ladder: bool,
    /// Was on a ladder last tick but not this one.
    pub left_ladder: bool,
    pub complete: bool,
    pub vy: f32,
    pub fall_threshold: f32,
}

pub fn can_start_jump(player: &Player, input: &FrameInput) -> bool {
    input.jump_pressed
        && !player.on_ladder
        && player.on_ground
        && player.can_jump
        && player.jump_cooldown == 0
}

/// Should the hold window keep boosting this tick?
pub fn jump_hold_continues(player: &Player, input: &FrameInput) -> bool {
    player.jump_hold_active && input.jump_held && player.jump_hold_ms > 0.0
}

/// The one transition function for the player animation state.
pub fn next_anim_state(current: AnimState, input: &FrameInput, contact: &Contact) -> AnimState {
    if current == AnimState::Cheer || contact.complete {
        return AnimState::Cheer;
    }
    if contact.on_ladder {
        return AnimState::Climb;
    }
    if contact.on_ground {
        return if input.horizontal() != 0 { AnimState::Walk } else { AnimState::Idle };
    }
    if contact.vy < 0.0 {
        AnimState::Jump
    } else if contact.vy > contact.fall_threshold || contact.left_ladder {
        AnimState::Fall
    } else {
        current
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn grounded() -> Player {
        let mut p = Player::new(0.0, 0.0);
        p.on_ground = true;
        p.can_jump = true;
        p
    }

    fn press_jump() -> FrameInput {
        FrameInput { jump_pressed: true, jump_held: true, ..Default::default() }
    }

    fn air(vy: f32) -> Contact {
        Contact { vy, fall_threshold: 200.0, ..Default::default() }
    }

    // ── Jump start ──

    #[test]
    fn jump_from_ground() {
        assert!(can_start_jump(&grounded(), &press_jump()));
    }

    #[test]
    fn jump_needs_fresh_press() {
        let held = FrameInput { jump_held: true, ..Default::default() };
        assert!(!can_start_jump(&grounded(), &held));
    }

    #[test]
    fn no_jump_in_air() {
        let mut p = grounded();
        p.on_ground = false;
        assert!(!can_start_jump(&p, &press_jump()));
    }

    #[test]
    fn no_jump_after_flag_cleared() {
        let mut p = grounded();
        p.can_jump = false;
        assert!(!can_start_jump(&p, &press_jump()));
    }

    #[test]
    fn no_jump_on_cooldown() {
        let mut p = grounded();
        p.jump_cooldown = 1;
        assert!(!can_start_jump(&p, &press_jump()));
    }

    #[test]
    fn no_jump_on_ladder() {
        let mut p = grounded();
        p.on_ladder = true;
        assert!(!can_start_jump(&p, &press_jump()));
    }

    #[test]
    fn hold_stops_on_release() {
        let mut p = grounded();
        p.jump_hold_active = true;
        p.jump_hold_ms = 50.0;
        assert!(jump_hold_continues(&p, &press_jump()));
        assert!(!jump_hold_continues(&p, &FrameInput::default()));
        p.jump_hold_ms = 0.0;
        assert!(!jump_hold_continues(&p, &press_jump()));
    }

    // ── Animation ──

    #[test]
    fn idle_to_walk_on_ground() {
        let c = Contact { on_ground: true, ..Default::default() };
        let right = FrameInput { right: true, ..Default::default() };
        assert_eq!(next_anim_state(AnimState::Idle, &right, &c), AnimState::Walk);
        assert_eq!(next_anim_state(AnimState::Walk, &FrameInput::default(), &c), AnimState::Idle);
    }

    #[test]
    fn rising_is_jump() {
        assert_eq!(next_anim_state(AnimState::Walk, &FrameInput::default(), &air(-300.0)), AnimState::Jump);
    }

    #[test]
    fn falls_past_threshold_only() {
        let none = FrameInput::default();
        assert_eq!(next_anim_state(AnimState::Jump, &none, &air(150.0)), AnimState::Jump);
        assert_eq!(next_anim_state(AnimState::Jump, &none, &air(250.0)), AnimState::Fall);
    }

    #[test]
    fn leaving_ladder_mid_air_falls() {
        let c = Contact { left_ladder: true, ..air(0.0) };
        assert_eq!(next_anim_state(AnimState::Climb, &FrameInput::default(), &c), AnimState::Fall);
    }

    #[test]
    fn ladder_beats_ground() {
        let c = Contact { on_ground: true, on_ladder: true, ..Default::default() };
        assert_eq!(next_anim_state(AnimState::Idle, &FrameInput::default(), &c), AnimState::Climb);
    }

    #[test]
    fn cheer_is_terminal() {
        let c = Contact { complete: true, ..Default::default() };
        assert_eq!(next_anim_state(AnimState::Fall, &FrameInput::default(), &c), AnimState::Cheer);
        let c = Contact { on_ladder: true, ..Default::default() };
        assert_eq!(next_anim_state(AnimState::Cheer, &FrameInput::default(), &c), AnimState::Cheer);
    }
}
