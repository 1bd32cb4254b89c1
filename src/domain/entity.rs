/// Entities: the platformer player and its per-frame input.
/// The player is a pixel-space AABB; tiles stay in their own grid.

/// Player bounding box, in pixels.
pub const PLAYER_W: f32 = 20.0;
pub const PLAYER_H: f32 = 28.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

/// Animation state machine. See `rules::next_anim_state`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AnimState {
    Idle,
    Walk,
    Jump,
    Fall,
    Climb,
    Cheer,
}

impl AnimState {
    /// Number of sprite frames and playback rate (frames per second).
    pub fn frames(self) -> (u32, u32) {
        match self {
            AnimState::Walk => (8, 12),
            AnimState::Cheer => (2, 6),
            _ => (1, 1),
        }
    }

    /// Sprite frame index after `elapsed_ms` in this state.
    pub fn frame_at(self, elapsed_ms: u64) -> u32 {
        let (count, fps) = self.frames();
        if count <= 1 {
            return 0;
        }
        ((elapsed_ms * fps as u64 / 1000) % count as u64) as u32
    }
}

/// Frame input. Held keys are continuous; `jump_pressed` is edge-triggered.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub jump_pressed: bool,
    pub jump_held: bool,
}

impl FrameInput {
    /// -1, 0 or 1. Opposite keys cancel out.
    pub fn horizontal(&self) -> i8 {
        match (self.left, self.right) {
            (true, false) => -1,
            (false, true) => 1,
            _ => 0,
        }
    }

    pub fn vertical(&self) -> i8 {
        match (self.up, self.down) {
            (true, false) => -1,
            (false, true) => 1,
            _ => 0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    /// Top-left of the bounding box, pixels.
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub facing: Facing,
    pub on_ground: bool,
    pub on_ladder: bool,
    pub anim: AnimState,
    pub anim_ms: u64,         // time spent in the current anim state
    pub can_jump: bool,
    pub jump_hold_active: bool,
    pub jump_hold_ms: f32,    // hold budget left for the current jump
    pub jump_cooldown: u32,   // ticks until a jump is allowed again
}

impl Player {
    pub fn new(x: f32, y: f32) -> Self {
        Player {
            x, y,
            vx: 0.0,
            vy: 0.0,
            facing: Facing::Right,
            on_ground: false,
            on_ladder: false,
            anim: AnimState::Idle,
            anim_ms: 0,
            can_jump: false,
            jump_hold_active: false,
            jump_hold_ms: 0.0,
            jump_cooldown: 0,
        }
    }

    /// Put the player back at a point at rest. Jump state is kept airborne
    /// until the next ground contact.
    pub fn teleport(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
        self.vx = 0.0;
        self.vy = 0.0;
        self.on_ladder = false;
        self.jump_hold_active = false;
        self.jump_hold_ms = 0.0;
    }

    pub fn set_anim(&mut self, next: AnimState) {
        if next != self.anim {
            self.anim = next;
            self.anim_ms = 0;
        }
    }

    pub fn sprite_frame(&self) -> u32 {
        self.anim.frame_at(self.anim_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_cycles_eight_frames() {
        assert_eq!(AnimState::Walk.frame_at(0), 0);
        // 12 fps: one frame every 83.3 ms
        assert_eq!(AnimState::Walk.frame_at(84), 1);
        assert_eq!(AnimState::Walk.frame_at(1000), 4); // 12 % 8
    }

    #[test]
    fn static_states_have_one_frame() {
        assert_eq!(AnimState::Idle.frame_at(5_000), 0);
        assert_eq!(AnimState::Fall.frame_at(123), 0);
        assert_eq!(AnimState::Cheer.frame_at(170), 1);
    }

    #[test]
    fn set_anim_resets_clock_only_on_change() {
        let mut p = Player::new(0.0, 0.0);
        p.anim_ms = 500;
        p.set_anim(AnimState::Idle);
        assert_eq!(p.anim_ms, 500);
        p.set_anim(AnimState::Walk);
        assert_eq!(p.anim_ms, 0);
    }

    #[test]
    fn teleport_zeroes_velocity() {
        let mut p = Player::new(10.0, 10.0);
        p.vx = 120.0;
        p.vy = -300.0;
        p.on_ladder = true;
        p.teleport(1.0, 2.0);
        assert_eq!((p.x, p.y, p.vx, p.vy), (1.0, 2.0, 0.0, 0.0));
        assert!(!p.on_ladder);
    }

    #[test]
    fn opposite_keys_cancel() {
        let input = FrameInput { left: true, right: true, ..Default::default() };
        assert_eq!(input.horizontal(), 0);
        let input = FrameInput { up: true, ..Default::default() };
        assert_eq!(input.vertical(), -1);
    }
}
