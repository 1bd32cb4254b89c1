/// Zone kinds and tile layers.
///
/// Every reactive map layer is a `ZoneKind`. Properties are queried via
/// methods, not stored as flags, so zone semantics are centralized here.
/// A `TileLayers` holds one sparse grid per zone plus a decorative grid.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum ZoneKind {
    Ground,    // Solid, resolves contact
    Item,      // Collectible
    HeartItem, // Collectible, tracked separately
    Ladder,    // Climbable, suspends gravity
    Trap,      // Teleports back to spawn
    Exit,      // Succeeds once everything is collected
}

impl ZoneKind {
    pub const ALL: [ZoneKind; 6] = [
        ZoneKind::Ground,
        ZoneKind::Item,
        ZoneKind::HeartItem,
        ZoneKind::Ladder,
        ZoneKind::Trap,
        ZoneKind::Exit,
    ];

    /// Does this zone block movement?
    pub fn is_solid(self) -> bool {
        matches!(self, ZoneKind::Ground)
    }

    /// Is this zone removed from the map when touched?
    pub fn is_collectible(self) -> bool {
        matches!(self, ZoneKind::Item | ZoneKind::HeartItem)
    }

    /// Layer name in map documents.
    pub fn layer_name(self) -> &'static str {
        match self {
            ZoneKind::Ground => "Ground",
            ZoneKind::Item => "Items",
            ZoneKind::HeartItem => "Hearts",
            ZoneKind::Ladder => "Ladders",
            ZoneKind::Trap => "Traps",
            ZoneKind::Exit => "Exit",
        }
    }

    /// Case-insensitive lookup; singular and plural names are accepted.
    pub fn from_layer_name(name: &str) -> Option<ZoneKind> {
        let lower = name.trim().to_ascii_lowercase();
        let stem = lower.strip_suffix('s').unwrap_or(&lower);
        match stem {
            "ground" => Some(ZoneKind::Ground),
            "item" => Some(ZoneKind::Item),
            "heart" | "heartitem" | "heart-item" | "heart_item" => Some(ZoneKind::HeartItem),
            "ladder" => Some(ZoneKind::Ladder),
            "trap" => Some(ZoneKind::Trap),
            "exit" => Some(ZoneKind::Exit),
            _ => None,
        }
    }

    fn index(self) -> usize {
        match self {
            ZoneKind::Ground => 0,
            ZoneKind::Item => 1,
            ZoneKind::HeartItem => 2,
            ZoneKind::Ladder => 3,
            ZoneKind::Trap => 4,
            ZoneKind::Exit => 5,
        }
    }
}

/// A sparse grid of tile indices, row-major. `None` = no tile.
#[derive(Clone, Debug, PartialEq)]
pub struct TileGrid {
    width: usize,
    height: usize,
    cells: Vec<Option<u32>>,
}

impl TileGrid {
    pub fn new(width: usize, height: usize) -> Self {
        TileGrid { width, height, cells: vec![None; width * height] }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            None
        }
    }

    #[inline]
    pub fn is_set(&self, x: usize, y: usize) -> bool {
        self.get(x, y).is_some()
    }

    pub fn set(&mut self, x: usize, y: usize, index: u32) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = Some(index);
        }
    }

    /// Remove a tile, returning what was there.
    pub fn remove(&mut self, x: usize, y: usize) -> Option<u32> {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x].take()
        } else {
            None
        }
    }

    pub fn count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// All set tiles as `(x, y, index)`.
    #[cfg(test)]
    pub fn iter_set(&self) -> impl Iterator<Item = (usize, usize, u32)> + '_ {
        let w = self.width;
        self.cells.iter().enumerate()
            .filter_map(move |(i, c)| c.map(|idx| (i % w, i / w, idx)))
    }
}

/// All layers of one loaded map. Dimensions in tiles, `tile_size` in pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct TileLayers {
    pub width: usize,
    pub height: usize,
    pub tile_size: f32,
    zones: [TileGrid; 6],
    /// Decorative layer (grass); never reacts.
    pub decor: TileGrid,
    /// Player spawn, top-left of the player box, in pixels.
    pub spawn: Option<(f32, f32)>,
}

impl TileLayers {
    pub fn new(width: usize, height: usize, tile_size: f32) -> Self {
        TileLayers {
            width,
            height,
            tile_size,
            zones: std::array::from_fn(|_| TileGrid::new(width, height)),
            decor: TileGrid::new(width, height),
            spawn: None,
        }
    }

    pub fn layer(&self, kind: ZoneKind) -> &TileGrid {
        &self.zones[kind.index()]
    }

    pub fn layer_mut(&mut self, kind: ZoneKind) -> &mut TileGrid {
        &mut self.zones[kind.index()]
    }

    #[inline]
    pub fn has(&self, kind: ZoneKind, x: usize, y: usize) -> bool {
        self.layer(kind).is_set(x, y)
    }

    /// Topmost reactive zone at a cell, for drawing. Ground wins over the rest.
    pub fn zone_at(&self, x: usize, y: usize) -> Option<ZoneKind> {
        ZoneKind::ALL.into_iter().find(|&k| self.has(k, x, y))
    }

    pub fn pixel_width(&self) -> f32 {
        self.width as f32 * self.tile_size
    }

    pub fn pixel_height(&self) -> f32 {
        self.height as f32 * self.tile_size
    }
}
