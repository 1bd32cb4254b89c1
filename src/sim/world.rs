/// SceneState: everything one platformer scene owns.
///
/// ## Layers
///
/// Two copies of the map:
///   - `pristine`: the map as loaded. **Never mutated.**
///   - `layers`  : the live map; collected item tiles are removed here.
///
/// `restart()` rebuilds everything from `pristine`.
///
/// ## Camera / Viewport
///
/// The camera works in tile cells, not pixels:
///   - `camera`: viewport into the map (top-left cell + size)
///   - Renderer maps: `screen(sx, sy) = cell(camera.x + sx, camera.y + sy)`
///   - Camera follows the player with a dead-zone approach
///   - Maps smaller than the viewport are centered

use anyhow::{bail, Result};
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::config::{GameConfig, PhysicsConfig};
use crate::domain::entity::{Player, PLAYER_H, PLAYER_W};
use crate::domain::physics::{self, Aabb};
use crate::domain::tile::{TileLayers, ZoneKind};
use crate::logging::log_error;
use crate::sim::level::LoadedMap;
use crate::sim::overlay::{Overlay, Tone};
use crate::sim::tracker::CollectionTracker;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ScenePhase {
    /// Guide panel up; nothing moves until a key is pressed.
    Guide,
    Playing,
    /// Exit reached; waiting out the completion timer.
    Complete,
}

/// Camera: a viewport into the map.
///
/// `(x, y)` is the cell at the top-left of the view.
/// `(view_w, view_h)` is how many cells fit in the viewport.
/// These are computed from terminal size and set during `render()`.
#[derive(Clone, Debug, Default)]
pub struct Camera {
    /// Cell X of the top-left visible cell (negative when centering)
    pub x: i32,
    pub y: i32,
    pub view_w: usize,
    pub view_h: usize,
}

impl Camera {
    /// Follow a target cell with a dead zone of 20% on each side.
    pub fn follow(&mut self, target_x: usize, target_y: usize, world_w: usize, world_h: usize) {
        if self.view_w == 0 || self.view_h == 0 { return; }
        self.x = follow_axis(self.x, target_x as i32, self.view_w as i32, world_w as i32);
        self.y = follow_axis(self.y, target_y as i32, self.view_h as i32, world_h as i32);
    }

    /// Jump straight to a target cell (scene start / restart).
    pub fn center_on(&mut self, target_x: usize, target_y: usize, world_w: usize, world_h: usize) {
        if self.view_w == 0 || self.view_h == 0 { return; }
        self.x = center_axis(target_x as i32, self.view_w as i32, world_w as i32);
        self.y = center_axis(target_y as i32, self.view_h as i32, world_h as i32);
    }
}

fn follow_axis(pos: i32, target: i32, view: i32, world: i32) -> i32 {
    if world <= view {
        return -((view - world) / 2);
    }
    let margin = view / 5;
    let mut pos = pos;
    if target < pos + margin {
        pos = target - margin;
    } else if target > pos + view - margin - 1 {
        pos = target - view + margin + 1;
    }
    pos.clamp(0, world - view)
}

fn center_axis(target: i32, view: i32, world: i32) -> i32 {
    if world <= view {
        return -((view - world) / 2);
    }
    (target - view / 2).clamp(0, world - view)
}

pub struct SceneState {
    // ── Map ──
    pub name: String,
    pristine: TileLayers,
    pub layers: TileLayers,
    pub spawn: (f32, f32),

    // ── Entities ──
    /// `None` when the player could not be placed (degraded scene).
    pub player: Option<Player>,

    // ── Tracking ──
    pub tracker: CollectionTracker,
    pub overlay: Overlay,
    pub phase: ScenePhase,
    /// Ticks until the host is signalled; armed on exit success.
    pub completion_timer: Option<u32>,
    /// Was the player inside an exit tile last tick?
    pub exit_contact: bool,
    pub tick: u64,

    // ── Tunables ──
    pub physics: PhysicsConfig,
    pub tick_ms: u64,
    pub message_ticks: u32,
    pub completion_ticks: u32,

    pub camera: Camera,
    pub rng: StdRng,
}

/// Place the player box at a spawn point, refusing points inside the ground
/// or outside the map.
pub fn spawn_player(layers: &TileLayers, spawn: (f32, f32)) -> Result<Player> {
    let (x, y) = spawn;
    if !x.is_finite() || !y.is_finite() {
        bail!("spawn point ({x}, {y}) is not a number");
    }
    if x < 0.0 || y < 0.0
        || x + PLAYER_W > layers.pixel_width()
        || y + PLAYER_H > layers.pixel_height()
    {
        bail!(
            "spawn point ({x}, {y}) lies outside the {}x{} px map",
            layers.pixel_width(), layers.pixel_height(),
        );
    }
    let bbox = Aabb::new(x, y, PLAYER_W, PLAYER_H);
    if !physics::overlapping(layers, ZoneKind::Ground, &bbox).is_empty() {
        bail!("spawn point ({x}, {y}) is inside solid ground");
    }
    Ok(Player::new(x, y))
}

impl SceneState {
    pub fn new(map: &LoadedMap, config: &GameConfig, rng: StdRng) -> Self {
        let layers = map.layers.clone();
        let spawn = layers.spawn.unwrap_or((0.0, 0.0));
        let message_ticks = config.ticks_for(config.timing.message_ms);
        let mut scene = SceneState {
            name: map.name.clone(),
            pristine: map.layers.clone(),
            tracker: CollectionTracker::from_layers(&layers),
            layers,
            spawn,
            player: None,
            overlay: Overlay::new(message_ticks),
            phase: ScenePhase::Guide,
            completion_timer: None,
            exit_contact: false,
            tick: 0,
            physics: config.physics.clone(),
            tick_ms: config.tick_rate_ms,
            message_ticks,
            completion_ticks: config.ticks_for(config.timing.completion_delay_ms),
            camera: Camera::default(),
            rng,
        };
        scene.place_player();
        info!(
            "scene '{}' ready: {} collectibles ({} hearts)",
            scene.name, scene.tracker.total, scene.tracker.hearts_total,
        );
        scene
    }

    fn place_player(&mut self) {
        match spawn_player(&self.layers, self.spawn) {
            Ok(p) => self.player = Some(p),
            Err(e) => {
                log_error(&e.context("could not create the player"));
                self.player = None;
                self.overlay.push_for(
                    "The hero could not be placed on this map.",
                    Tone::Warning,
                    u32::MAX,
                );
            }
        }
    }

    /// Rebuild from the pristine map. Ignored once the level is complete.
    pub fn restart(&mut self) -> bool {
        if self.phase == ScenePhase::Complete {
            return false;
        }
        debug!("scene '{}' restarted", self.name);
        self.layers = self.pristine.clone();
        self.tracker = CollectionTracker::from_layers(&self.layers);
        self.overlay = Overlay::new(self.message_ticks);
        self.overlay.dismiss_guide();
        self.phase = ScenePhase::Playing;
        self.completion_timer = None;
        self.exit_contact = false;
        self.place_player();
        self.recenter_camera();
        true
    }

    pub fn dt(&self) -> f32 {
        self.tick_ms as f32 / 1000.0
    }

    pub fn is_degraded(&self) -> bool {
        self.player.is_none()
    }

    /// The cell under the player's centre.
    pub fn player_cell(&self) -> Option<(usize, usize)> {
        let p = self.player.as_ref()?;
        let ts = self.layers.tile_size;
        let (cx, cy) = Aabb::new(p.x, p.y, PLAYER_W, PLAYER_H).center();
        Some(((cx / ts).max(0.0) as usize, (cy / ts).max(0.0) as usize))
    }

    pub fn follow_player(&mut self) {
        if let Some((x, y)) = self.player_cell() {
            self.camera.follow(x, y, self.layers.width, self.layers.height);
        }
    }

    pub fn recenter_camera(&mut self) {
        let (x, y) = self.player_cell().unwrap_or((self.layers.width / 2, self.layers.height / 2));
        self.camera.center_on(x, y, self.layers.width, self.layers.height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(w: usize, h: usize) -> TileLayers {
        let mut l = TileLayers::new(w, h, 32.0);
        for x in 0..w {
            l.layer_mut(ZoneKind::Ground).set(x, h - 1, 1);
        }
        l
    }

    #[test]
    fn spawn_rejects_ground() {
        let l = flat(4, 3);
        assert!(spawn_player(&l, (0.0, 64.0)).is_err());
        assert!(spawn_player(&l, (0.0, 36.0)).is_ok());
    }

    #[test]
    fn spawn_rejects_outside_map() {
        let l = flat(4, 3);
        assert!(spawn_player(&l, (200.0, 0.0)).is_err());
        assert!(spawn_player(&l, (-1.0, 0.0)).is_err());
        assert!(spawn_player(&l, (f32::NAN, 0.0)).is_err());
    }

    #[test]
    fn camera_centers_small_maps() {
        let mut c = Camera { view_w: 20, view_h: 10, ..Default::default() };
        c.follow(3, 3, 10, 6);
        assert_eq!((c.x, c.y), (-5, -2));
    }

    #[test]
    fn camera_dead_zone() {
        let mut c = Camera { view_w: 10, view_h: 10, ..Default::default() };
        c.center_on(0, 0, 100, 10);
        assert_eq!(c.x, 0);
        c.follow(5, 0, 100, 10);
        assert_eq!(c.x, 0, "inside dead zone");
        c.follow(9, 0, 100, 10);
        assert_eq!(c.x, 2);
        c.follow(99, 0, 100, 10);
        assert_eq!(c.x, 90, "clamped to map edge");
    }
}
