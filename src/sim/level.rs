/// Map loader.
///
/// ## Sources (priority order):
///   1. `map_path` from config: a Tiled-style JSON export or a text map
///   2. The built-in embedded map
///
/// A map that fails to load or validate is logged and the embedded map is
/// used instead.
///
/// ## JSON format (Tiled export subset):
///   ```
///   { "width": 40, "height": 14, "tilewidth": 32, "tileheight": 32,
///     "layers": [
///       { "name": "Ground", "type": "tilelayer", "data": [0, 1, ...] },
///       { "name": "Spawn", "type": "objectgroup",
///         "objects": [ { "name": "player", "x": 96, "y": 388 } ] } ] }
///   ```
///   Tile index 0 = empty. Layer names are matched case-insensitively:
///   `Ground`, `Grass`, `Items`, `Hearts`, `Ladders`, `Traps`, `Exit`.
///
/// ## Text format (`.txt`):
///   Optional first line: `# Map Name`
///   Lines: map rows
///
/// ## Tile legend:
///   '#' = Ground               '"' = Grass (decoration)
///   '*' = Magic item           'h' = Heart item
///   'H' = Ladder               '^' = Trap (spikes)
///   'E' = Exit                 'P' = Player spawn
///   ' ' or '.' = Empty

use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::domain::entity::{PLAYER_H, PLAYER_W};
use crate::domain::tile::{TileLayers, ZoneKind};
use crate::logging::log_error;

/// Tile size for text maps, in pixels.
pub const TEXT_TILE_SIZE: f32 = 32.0;

/// Spawn used when a map names none, top-left of the player box in pixels.
pub const DEFAULT_SPAWN: (f32, f32) = (200.0, 300.0 - 32.0);

/// A validated map, ready to build a scene from.
#[derive(Clone, Debug)]
pub struct LoadedMap {
    pub name: String,
    pub layers: TileLayers,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Load the configured map, falling back to the embedded one.
pub fn load_map(path: Option<&Path>) -> Result<LoadedMap> {
    if let Some(path) = path {
        match load_map_file(path) {
            Ok(map) => {
                info!("map '{}' loaded from {}", map.name, path.display());
                return Ok(map);
            }
            Err(e) => {
                log_error(&e);
                warn!("falling back to the embedded map");
            }
        }
    }
    embedded_map()
}

pub fn load_map_file(path: &Path) -> Result<LoadedMap> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("could not read map {}", path.display()))?;
    let is_json = path.extension().is_some_and(|e| e.eq_ignore_ascii_case("json"))
        || text.trim_start().starts_with('{');
    let mut map = if is_json {
        parse_tiled_json(&text)
    } else {
        parse_text_map(&text)
    }
    .with_context(|| format!("invalid map {}", path.display()))?;
    if map.name.is_empty() {
        map.name = path.file_stem().unwrap_or_default().to_string_lossy().to_string();
    }
    Ok(map)
}

pub fn embedded_map() -> Result<LoadedMap> {
    parse_text_map(EMBEDDED_MAP).context("embedded map is invalid")
}

// ══════════════════════════════════════════════════════════════
// Tiled JSON
// ══════════════════════════════════════════════════════════════

#[derive(Deserialize, Debug)]
struct TiledMap {
    width: usize,
    height: usize,
    tilewidth: f32,
    #[serde(default)]
    tileheight: Option<f32>,
    #[serde(default)]
    layers: Vec<TiledLayer>,
}

#[derive(Deserialize, Debug)]
struct TiledLayer {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Vec<u32>,
    #[serde(default)]
    width: Option<usize>,
    #[serde(default)]
    height: Option<usize>,
    #[serde(default)]
    objects: Vec<TiledObject>,
}

#[derive(Deserialize, Debug)]
struct TiledObject {
    #[serde(default)]
    name: String,
    #[serde(default, rename = "type")]
    kind: String,
    x: f32,
    y: f32,
}

impl TiledObject {
    fn is_spawn(&self) -> bool {
        ["player", "spawn"].iter().any(|s| {
            self.name.eq_ignore_ascii_case(s) || self.kind.eq_ignore_ascii_case(s)
        })
    }
}

pub fn parse_tiled_json(text: &str) -> Result<LoadedMap> {
    let doc: TiledMap = serde_json::from_str(text).context("map JSON parse error")?;
    ensure!(doc.width > 0 && doc.height > 0, "map has no cells ({}x{})", doc.width, doc.height);
    ensure!(doc.tilewidth > 0.0, "tile width must be positive");
    if let Some(th) = doc.tileheight {
        ensure!(th == doc.tilewidth, "tiles must be square ({}x{})", doc.tilewidth, th);
    }

    let mut layers = TileLayers::new(doc.width, doc.height, doc.tilewidth);
    let mut has_ground = false;

    for layer in &doc.layers {
        match layer.kind.as_str() {
            "tilelayer" => {
                let (w, h) = (layer.width.unwrap_or(doc.width), layer.height.unwrap_or(doc.height));
                if w != doc.width || h != doc.height || layer.data.len() != doc.width * doc.height {
                    bail!(
                        "layer '{}' is {}x{} with {} cells, map is {}x{}",
                        layer.name, w, h, layer.data.len(), doc.width, doc.height,
                    );
                }
                let grid = if layer.name.eq_ignore_ascii_case("grass") {
                    &mut layers.decor
                } else if let Some(kind) = ZoneKind::from_layer_name(&layer.name) {
                    has_ground |= kind == ZoneKind::Ground;
                    layers.layer_mut(kind)
                } else {
                    warn!("ignoring unknown map layer '{}'", layer.name);
                    continue;
                };
                for (i, &idx) in layer.data.iter().enumerate() {
                    if idx != 0 {
                        grid.set(i % doc.width, i / doc.width, idx);
                    }
                }
            }
            "objectgroup" => {
                if let Some(obj) = layer.objects.iter().find(|o| o.is_spawn()) {
                    layers.spawn = Some((obj.x, obj.y));
                }
            }
            other => warn!("ignoring map layer '{}' of type '{other}'", layer.name),
        }
    }

    ensure!(has_ground, "map has no {} layer", ZoneKind::Ground.layer_name());
    finish(String::new(), layers)
}

// ══════════════════════════════════════════════════════════════
// Text maps
// ══════════════════════════════════════════════════════════════

pub fn parse_text_map(content: &str) -> Result<LoadedMap> {
    let mut name = String::new();
    let mut rows: Vec<&str> = vec![];

    for line in content.lines() {
        if rows.is_empty() && name.is_empty() && is_name_line(line) {
            name = line[1..].trim().to_string();
        } else {
            rows.push(line.trim_end_matches('\r'));
        }
    }
    while rows.last().is_some_and(|r| r.trim().is_empty()) {
        rows.pop();
    }
    ensure!(!rows.is_empty(), "map has no rows");

    let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    let height = rows.len();
    let ts = TEXT_TILE_SIZE;
    let mut layers = TileLayers::new(width, height, ts);
    let mut has_ground = false;

    for (y, row) in rows.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            let kind = match ch {
                '#' => ZoneKind::Ground,
                '*' => ZoneKind::Item,
                'h' => ZoneKind::HeartItem,
                'H' => ZoneKind::Ladder,
                '^' => ZoneKind::Trap,
                'E' => ZoneKind::Exit,
                '"' => {
                    layers.decor.set(x, y, 1);
                    continue;
                }
                'P' => {
                    ensure!(layers.spawn.is_none(), "more than one spawn marker");
                    // Feet on the bottom of the cell, centred horizontally.
                    layers.spawn = Some((x as f32 * ts + (ts - PLAYER_W) / 2.0, (y + 1) as f32 * ts - PLAYER_H));
                    continue;
                }
                ' ' | '.' => continue,
                other => bail!("unknown map character '{other}' at ({x}, {y})"),
            };
            has_ground |= kind == ZoneKind::Ground;
            layers.layer_mut(kind).set(x, y, 1);
        }
    }

    ensure!(has_ground, "map has no ground");
    finish(name, layers)
}

/// Distinguish `# Map Name` from `########` (map data).
/// A name line starts with `#` and contains at least one letter.
fn is_name_line(line: &str) -> bool {
    line.starts_with('#') && line[1..].chars().any(|c| c.is_alphabetic())
}

// ══════════════════════════════════════════════════════════════
// Validation
// ══════════════════════════════════════════════════════════════

fn finish(name: String, mut layers: TileLayers) -> Result<LoadedMap> {
    if layers.pixel_width() < PLAYER_W || layers.pixel_height() < PLAYER_H {
        bail!("map is smaller than the player");
    }
    if layers.spawn.is_none() {
        let (x, y) = DEFAULT_SPAWN;
        let spawn = (
            x.min(layers.pixel_width() - PLAYER_W),
            y.min(layers.pixel_height() - PLAYER_H),
        );
        warn!("map has no spawn point, using ({}, {})", spawn.0, spawn.1);
        layers.spawn = Some(spawn);
    }
    Ok(LoadedMap { name, layers })
}

// ══════════════════════════════════════════════════════════════
// Embedded map
// ══════════════════════════════════════════════════════════════

const EMBEDDED_MAP: &str = r#"# Heart Meadow


                             *  h H
                           #######H
                                  H
                    *  h          H
                #########         H
                                  H
        h    H                    H
      #######H                    H
             H                    H
             H                    H
 ""P "   *   H " ^"*  "  ^    "  *H" E
########################################
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_map_is_valid() {
        let map = embedded_map().unwrap();
        assert_eq!(map.name, "Heart Meadow");
        let l = &map.layers;
        assert_eq!((l.width, l.height), (40, 14));
        assert_eq!(l.layer(ZoneKind::Item).count() + l.layer(ZoneKind::HeartItem).count(), 8);
        assert_eq!(l.layer(ZoneKind::HeartItem).count(), 3);
        assert_eq!(l.layer(ZoneKind::Exit).count(), 1);
        assert!(l.layer(ZoneKind::Trap).count() >= 1);
        assert!(l.layer(ZoneKind::Ladder).count() >= 1);
        assert!(l.decor.count() > 0);
        assert!(crate::sim::world::spawn_player(l, l.spawn.unwrap()).is_ok());
    }

    #[test]
    fn embedded_ladders_start_on_the_floor() {
        let map = embedded_map().unwrap();
        let l = &map.layers;
        let floor = l.height - 2;
        let feet: Vec<usize> = (0..l.width).filter(|&x| l.has(ZoneKind::Ladder, x, floor)).collect();
        assert_eq!(feet, vec![13, 34]);
        for x in feet {
            assert!(l.has(ZoneKind::Ladder, x, floor - 1), "ladder at col {x} continues upward");
            // Jumps are refused on a ladder: leave a clear cell to take off from.
            for dx in 1..=2 {
                assert!(!l.has(ZoneKind::Trap, x + dx, floor), "trap too close to ladder at col {x}");
                assert!(!l.has(ZoneKind::Trap, x.saturating_sub(dx), floor));
            }
        }
    }

    #[test]
    fn text_spawn_rests_on_cell_floor() {
        let map = parse_text_map("# Tiny\n P \n###\n").unwrap();
        assert_eq!(map.layers.spawn, Some((38.0, 4.0)));
    }

    #[test]
    fn text_rows_are_padded() {
        let map = parse_text_map("*\n  E\n###\n").unwrap();
        assert_eq!(map.layers.width, 3);
        assert!(map.layers.has(ZoneKind::Exit, 2, 1));
        assert!(map.name.is_empty());
    }

    #[test]
    fn text_rejects_unknown_chars() {
        assert!(parse_text_map("P?\n##\n").is_err());
    }

    #[test]
    fn text_requires_ground() {
        assert!(parse_text_map("P *\n   \n").is_err());
    }

    #[test]
    fn missing_spawn_uses_default_clamped() {
        let map = parse_text_map("   \n###\n").unwrap();
        let (x, y) = map.layers.spawn.unwrap();
        assert_eq!(x, 96.0 - PLAYER_W);
        assert_eq!(y, 64.0 - PLAYER_H);
    }

    #[test]
    fn tiled_json_layers_and_spawn() {
        let json = r#"{
            "width": 3, "height": 2, "tilewidth": 16, "tileheight": 16,
            "layers": [
                { "name": "Ground", "type": "tilelayer", "data": [0,0,0, 5,5,5] },
                { "name": "items", "type": "tilelayer", "data": [0,9,0, 0,0,0] },
                { "name": "Grass", "type": "tilelayer", "data": [1,0,0, 0,0,0] },
                { "name": "Objects", "type": "objectgroup",
                  "objects": [ { "name": "player", "x": 2, "y": 0 } ] }
            ]
        }"#;
        let map = parse_tiled_json(json).unwrap();
        let l = &map.layers;
        assert_eq!(l.tile_size, 16.0);
        assert_eq!(l.layer(ZoneKind::Ground).count(), 3);
        assert_eq!(l.layer(ZoneKind::Item).get(1, 0), Some(9));
        assert!(l.decor.is_set(0, 0));
        assert_eq!(l.spawn, Some((2.0, 0.0)));
    }

    #[test]
    fn tiled_json_dimension_mismatch() {
        let json = r#"{
            "width": 3, "height": 2, "tilewidth": 16,
            "layers": [ { "name": "Ground", "type": "tilelayer", "data": [1,1,1] } ]
        }"#;
        let err = parse_tiled_json(json).unwrap_err();
        assert!(format!("{err:#}").contains("Ground"));
    }

    #[test]
    fn tiled_json_needs_ground() {
        let json = r#"{
            "width": 1, "height": 1, "tilewidth": 32,
            "layers": [ { "name": "Items", "type": "tilelayer", "data": [1] } ]
        }"#;
        assert!(parse_tiled_json(json).is_err());
    }

    #[test]
    fn bad_file_falls_back_to_embedded() {
        let map = load_map(Some(Path::new("/nonexistent/heartquest/map.json"))).unwrap();
        assert_eq!(map.name, "Heart Meadow");
    }
}
