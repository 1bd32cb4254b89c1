/// Collision layer: player AABB against the solid tile grid.
///
/// ## Movement
///
/// Motion is resolved one axis at a time (X, then Y) in small substeps so a
/// fast fall never tunnels through a one-tile floor. After each substep the
/// box is pushed back out of any solid tile it entered along that axis.
///
/// ## Bounds
///
/// The map edges act as walls on all four sides. The bottom edge counts as
/// ground, so a map without a floor row still has something to stand on.
///
/// ## Overlap
///
/// Zone overlap is a pure query: which cells of a layer does the box touch.
/// Touching edges do not overlap (half-open intervals).

use super::tile::{TileLayers, ZoneKind};

/// Largest distance moved per substep, in pixels.
const MAX_STEP_PX: f32 = 4.0;

/// Probe distance used for the ground check, in pixels.
const GROUND_PROBE: f32 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Aabb {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Aabb { x, y, w, h }
    }

    #[inline]
    pub fn intersects(&self, o: &Aabb) -> bool {
        self.x < o.x + o.w && self.x + self.w > o.x && self.y < o.y + o.h && self.y + self.h > o.y
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }
}

/// Contact flags produced by one movement step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Contacts {
    pub on_ground: bool,
    pub hit_head: bool,
    pub hit_wall: bool,
}

/// Cell range `[first, last]` covered by the half-open span `[lo, lo + len)`.
/// `None` when the span is entirely outside `0..count`.
fn cell_span(lo: f32, len: f32, tile: f32, count: usize) -> Option<(usize, usize)> {
    if count == 0 || len <= 0.0 {
        return None;
    }
    let hi = lo + len;
    if hi <= 0.0 || lo >= count as f32 * tile {
        return None;
    }
    let first = (lo.max(0.0) / tile).floor() as usize;
    // Exclusive upper edge: a box ending exactly on a tile boundary stops before it.
    let last = ((hi / tile).ceil() as usize).saturating_sub(1).min(count - 1);
    Some((first, last.max(first)))
}

/// Every cell of `kind` the box overlaps, in row-major order.
pub fn overlapping(layers: &TileLayers, kind: ZoneKind, b: &Aabb) -> Vec<(usize, usize)> {
    let ts = layers.tile_size;
    let (Some((x0, x1)), Some((y0, y1))) = (
        cell_span(b.x, b.w, ts, layers.width),
        cell_span(b.y, b.h, ts, layers.height),
    ) else {
        return Vec::new();
    };
    let grid = layers.layer(kind);
    let mut hits = Vec::new();
    for y in y0..=y1 {
        for x in x0..=x1 {
            if grid.is_set(x, y) {
                hits.push((x, y));
            }
        }
    }
    hits
}

/// Does the box touch any solid tile?
fn hits_solid(layers: &TileLayers, b: &Aabb) -> bool {
    ZoneKind::ALL.into_iter()
        .filter(|k| k.is_solid())
        .any(|k| !overlapping(layers, k, b).is_empty())
}

/// Move along X, stopping flush against walls and map edges.
fn sweep_x(layers: &TileLayers, b: &mut Aabb, dx: f32) -> bool {
    let ts = layers.tile_size;
    b.x += dx;
    let mut hit = false;
    if hits_solid(layers, b) {
        hit = true;
        if dx > 0.0 {
            // Snap right edge to the left side of the blocking column.
            b.x = ((b.x + b.w) / ts).floor() * ts - b.w;
        } else if dx < 0.0 {
            b.x = (b.x / ts).floor() * ts + ts;
        }
    }
    let max_x = layers.pixel_width() - b.w;
    if b.x < 0.0 {
        b.x = 0.0;
        hit = true;
    } else if b.x > max_x {
        b.x = max_x.max(0.0);
        hit = true;
    }
    hit
}

/// Move along Y. Returns `(landed, bonked)`.
fn sweep_y(layers: &TileLayers, b: &mut Aabb, dy: f32) -> (bool, bool) {
    let ts = layers.tile_size;
    b.y += dy;
    let (mut landed, mut bonked) = (false, false);
    if hits_solid(layers, b) {
        if dy > 0.0 {
            b.y = ((b.y + b.h) / ts).floor() * ts - b.h;
            landed = true;
        } else if dy < 0.0 {
            b.y = (b.y / ts).floor() * ts + ts;
            bonked = true;
        }
    }
    let max_y = layers.pixel_height() - b.h;
    if b.y < 0.0 {
        b.y = 0.0;
        bonked = true;
    } else if b.y >= max_y {
        b.y = max_y.max(0.0);
        landed = true;
    }
    (landed, bonked)
}

/// Move a box by `(dx, dy)`, axis-separated with substeps.
/// Velocity components that hit something are zeroed by the caller using the
/// returned contacts.
pub fn move_and_collide(layers: &TileLayers, b: &mut Aabb, dx: f32, dy: f32) -> Contacts {
    let mut c = Contacts::default();
    let steps = ((dx.abs().max(dy.abs()) / MAX_STEP_PX).ceil() as u32).max(1);
    let (sx, sy) = (dx / steps as f32, dy / steps as f32);

    for _ in 0..steps {
        if sx != 0.0 && !c.hit_wall && sweep_x(layers, b, sx) {
            c.hit_wall = true;
        }
        if sy != 0.0 && !c.on_ground && !c.hit_head {
            let (landed, bonked) = sweep_y(layers, b, sy);
            c.on_ground |= landed;
            c.hit_head |= bonked;
        }
    }
    c.on_ground |= is_grounded(layers, b);
    c
}

/// Is there ground (a solid tile or the bottom edge) right under the box?
pub fn is_grounded(layers: &TileLayers, b: &Aabb) -> bool {
    if b.y + b.h >= layers.pixel_height() - f32::EPSILON {
        return true;
    }
    let probe = Aabb::new(b.x, b.y + b.h, b.w, GROUND_PROBE);
    hits_solid(layers, &probe)
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: build layers from a string diagram (tile size 32).
    /// Legend: '#'=Ground  'H'=Ladder  '*'=Item  '^'=Trap  ' '=empty
    fn map_from(rows: &[&str]) -> TileLayers {
        let mut l = TileLayers::new(rows[0].len(), rows.len(), 32.0);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let kind = match ch {
                    '#' => ZoneKind::Ground,
                    'H' => ZoneKind::Ladder,
                    '*' => ZoneKind::Item,
                    '^' => ZoneKind::Trap,
                    _ => continue,
                };
                l.layer_mut(kind).set(x, y, 1);
            }
        }
        l
    }

    #[test]
    fn span_excludes_touching_edge() {
        assert_eq!(cell_span(0.0, 32.0, 32.0, 4), Some((0, 0)));
        assert_eq!(cell_span(16.0, 32.0, 32.0, 4), Some((0, 1)));
        assert_eq!(cell_span(-10.0, 5.0, 32.0, 4), None);
        assert_eq!(cell_span(200.0, 5.0, 32.0, 4), None);
    }

    #[test]
    fn overlap_lists_touched_cells() {
        let l = map_from(&[
            "*  *",
            "    ",
        ]);
        let b = Aabb::new(10.0, 0.0, 20.0, 28.0);
        assert_eq!(overlapping(&l, ZoneKind::Item, &b), vec![(0, 0)]);
        let b = Aabb::new(32.0, 0.0, 20.0, 28.0);
        assert!(overlapping(&l, ZoneKind::Item, &b).is_empty());
    }

    #[test]
    fn falls_onto_floor() {
        let l = map_from(&[
            "    ",
            "    ",
            "####",
        ]);
        let mut b = Aabb::new(40.0, 10.0, 20.0, 28.0);
        let c = move_and_collide(&l, &mut b, 0.0, 100.0);
        assert!(c.on_ground);
        assert_eq!(b.y, 64.0 - 28.0);
    }

    #[test]
    fn fast_fall_does_not_tunnel() {
        let l = map_from(&[
            "    ",
            "####",
            "    ",
            "    ",
        ]);
        let mut b = Aabb::new(40.0, 0.0, 20.0, 28.0);
        let c = move_and_collide(&l, &mut b, 0.0, 90.0);
        assert!(c.on_ground);
        assert_eq!(b.y, 32.0 - 28.0);
    }

    #[test]
    fn wall_stops_horizontal() {
        let l = map_from(&[
            "  # ",
            "####",
        ]);
        let mut b = Aabb::new(0.0, 4.0, 20.0, 28.0);
        let c = move_and_collide(&l, &mut b, 60.0, 0.0);
        assert!(c.hit_wall);
        assert_eq!(b.x, 64.0 - 20.0);
    }

    #[test]
    fn ceiling_bonks() {
        let l = map_from(&[
            "####",
            "    ",
            "    ",
        ]);
        let mut b = Aabb::new(40.0, 40.0, 20.0, 28.0);
        let c = move_and_collide(&l, &mut b, 0.0, -30.0);
        assert!(c.hit_head);
        assert_eq!(b.y, 32.0);
    }

    #[test]
    fn map_edges_are_walls() {
        let l = map_from(&[
            "    ",
            "    ",
        ]);
        let mut b = Aabb::new(5.0, 5.0, 20.0, 28.0);
        let c = move_and_collide(&l, &mut b, -50.0, 0.0);
        assert!(c.hit_wall);
        assert_eq!(b.x, 0.0);

        let c = move_and_collide(&l, &mut b, 0.0, 500.0);
        assert!(c.on_ground, "bottom edge counts as ground");
        assert_eq!(b.y, 64.0 - 28.0);
    }

    #[test]
    fn grounded_probe() {
        let l = map_from(&[
            "    ",
            "####",
        ]);
        assert!(is_grounded(&l, &Aabb::new(0.0, 4.0, 20.0, 28.0)));
        assert!(!is_grounded(&l, &Aabb::new(0.0, 0.0, 20.0, 28.0)));
    }
}
