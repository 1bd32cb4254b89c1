/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory, the CWD, or
/// `~/.config/heartquest`. Falls back to defaults if the file is missing
/// or incomplete; a parse error is logged and the defaults are used.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub tick_rate_ms: u64,
    pub map_path: Option<PathBuf>,
    pub content_path: Option<PathBuf>,
    pub log_file: PathBuf,
    pub sound: bool,
    pub physics: PhysicsConfig,
    pub timing: TimingConfig,
    /// Where the settings came from; logged once logging is up.
    pub source: ConfigSource,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConfigSource {
    Defaults,
    File(PathBuf),
    /// The file existed but could not be read or parsed.
    Invalid { path: PathBuf, error: String },
}

/// Platformer tunables. Distances in pixels, speeds in px/s.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsConfig {
    pub gravity: f32,
    pub move_speed: f32,
    pub air_control: f32,
    pub jump_velocity: f32,
    pub jump_hold_ms: f32,
    pub jump_hold_factor: f32,
    pub fall_threshold: f32,
    pub climb_speed: f32,
    pub terminal_velocity: f32,
    pub jump_cooldown_ticks: u32,
}

/// Delays, in milliseconds. Converted to ticks with [`GameConfig::ticks_for`].
#[derive(Clone, Debug, PartialEq)]
pub struct TimingConfig {
    pub message_ms: u64,
    pub completion_delay_ms: u64,
    pub memory_resolve_ms: u64,
    pub trivia_advance_ms: u64,
    pub scramble_advance_ms: u64,
    pub puzzle_complete_ms: u64,
    pub error_flash_ms: u64,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    timing: TomlTiming,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default)]
    map_path: Option<String>,
    #[serde(default)]
    content_path: Option<String>,
    #[serde(default = "default_log_file")]
    log_file: String,
    #[serde(default = "default_sound")]
    sound: bool,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_gravity")]
    gravity: f32,
    #[serde(default = "default_move_speed")]
    move_speed: f32,
    #[serde(default = "default_air_control")]
    air_control: f32,
    #[serde(default = "default_jump_velocity")]
    jump_velocity: f32,
    #[serde(default = "default_jump_hold_ms")]
    jump_hold_ms: f32,
    #[serde(default = "default_jump_hold_factor")]
    jump_hold_factor: f32,
    #[serde(default = "default_fall_threshold")]
    fall_threshold: f32,
    #[serde(default = "default_climb_speed")]
    climb_speed: f32,
    #[serde(default = "default_terminal_velocity")]
    terminal_velocity: f32,
    #[serde(default = "default_jump_cooldown")]
    jump_cooldown_ticks: u32,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_message_ms")]
    message_ms: u64,
    #[serde(default = "default_completion_delay")]
    completion_delay_ms: u64,
    #[serde(default = "default_memory_resolve")]
    memory_resolve_ms: u64,
    #[serde(default = "default_trivia_advance")]
    trivia_advance_ms: u64,
    #[serde(default = "default_scramble_advance")]
    scramble_advance_ms: u64,
    #[serde(default = "default_puzzle_complete")]
    puzzle_complete_ms: u64,
    #[serde(default = "default_error_flash")]
    error_flash_ms: u64,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 16 }
fn default_log_file() -> String { "heartquest.log".into() }
fn default_sound() -> bool { true }

fn default_gravity() -> f32 { 1200.0 }
fn default_move_speed() -> f32 { 200.0 }
fn default_air_control() -> f32 { 0.6 }
fn default_jump_velocity() -> f32 { 560.0 }
fn default_jump_hold_ms() -> f32 { 100.0 }
fn default_jump_hold_factor() -> f32 { 0.7 }
fn default_fall_threshold() -> f32 { 200.0 }
fn default_climb_speed() -> f32 { 150.0 }
fn default_terminal_velocity() -> f32 { 900.0 }
fn default_jump_cooldown() -> u32 { 2 }

fn default_message_ms() -> u64 { 2000 }
fn default_completion_delay() -> u64 { 2000 }
fn default_memory_resolve() -> u64 { 1000 }
fn default_trivia_advance() -> u64 { 2000 }
fn default_scramble_advance() -> u64 { 2000 }
fn default_puzzle_complete() -> u64 { 500 }
fn default_error_flash() -> u64 { 2000 }

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            tick_rate_ms: default_tick_rate(),
            map_path: None,
            content_path: None,
            log_file: default_log_file(),
            sound: default_sound(),
        }
    }
}

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            gravity: default_gravity(),
            move_speed: default_move_speed(),
            air_control: default_air_control(),
            jump_velocity: default_jump_velocity(),
            jump_hold_ms: default_jump_hold_ms(),
            jump_hold_factor: default_jump_hold_factor(),
            fall_threshold: default_fall_threshold(),
            climb_speed: default_climb_speed(),
            terminal_velocity: default_terminal_velocity(),
            jump_cooldown_ticks: default_jump_cooldown(),
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            message_ms: default_message_ms(),
            completion_delay_ms: default_completion_delay(),
            memory_resolve_ms: default_memory_resolve(),
            trivia_advance_ms: default_trivia_advance(),
            scramble_advance_ms: default_scramble_advance(),
            puzzle_complete_ms: default_puzzle_complete(),
            error_flash_ms: default_error_flash(),
        }
    }
}

// ── Loading ──

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[], ConfigSource::Defaults)
    }
}

impl GameConfig {
    /// Load config from `config.toml`.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let (toml_cfg, source) = match find_config(&search_dirs) {
            Some(path) => match read_toml(&path) {
                Ok(cfg) => (cfg, ConfigSource::File(path)),
                Err(e) => {
                    let error = format!("{e:#}");
                    (TomlConfig::default(), ConfigSource::Invalid { path, error })
                }
            },
            None => (TomlConfig::default(), ConfigSource::Defaults),
        };
        GameConfig::from_toml(toml_cfg, &search_dirs, source)
    }

    /// Report where the settings came from.
    pub fn log_source(&self) {
        match &self.source {
            ConfigSource::Defaults => info!("no config.toml found, using defaults"),
            ConfigSource::File(path) => info!("config loaded from {}", path.display()),
            ConfigSource::Invalid { path, error } => {
                warn!("{error}; ignoring {} and using defaults", path.display())
            }
        }
    }

    /// Parse a config document directly (no file search).
    #[cfg(test)]
    pub fn parse_str(text: &str) -> Result<Self> {
        let cfg = toml::from_str::<TomlConfig>(text).context("config.toml parse error")?;
        Ok(GameConfig::from_toml(cfg, &[], ConfigSource::Defaults))
    }

    fn from_toml(cfg: TomlConfig, search_dirs: &[PathBuf], source: ConfigSource) -> Self {
        let resolve = |s: &str| resolve_path(s, search_dirs);
        GameConfig {
            tick_rate_ms: cfg.general.tick_rate_ms.max(1),
            map_path: cfg.general.map_path.as_deref().map(resolve),
            content_path: cfg.general.content_path.as_deref().map(resolve),
            log_file: PathBuf::from(cfg.general.log_file),
            sound: cfg.general.sound,
            physics: PhysicsConfig {
                gravity: cfg.physics.gravity,
                move_speed: cfg.physics.move_speed,
                air_control: cfg.physics.air_control,
                jump_velocity: cfg.physics.jump_velocity,
                jump_hold_ms: cfg.physics.jump_hold_ms,
                jump_hold_factor: cfg.physics.jump_hold_factor,
                fall_threshold: cfg.physics.fall_threshold,
                climb_speed: cfg.physics.climb_speed,
                terminal_velocity: cfg.physics.terminal_velocity,
                jump_cooldown_ticks: cfg.physics.jump_cooldown_ticks,
            },
            timing: TimingConfig {
                message_ms: cfg.timing.message_ms,
                completion_delay_ms: cfg.timing.completion_delay_ms,
                memory_resolve_ms: cfg.timing.memory_resolve_ms,
                trivia_advance_ms: cfg.timing.trivia_advance_ms,
                scramble_advance_ms: cfg.timing.scramble_advance_ms,
                puzzle_complete_ms: cfg.timing.puzzle_complete_ms,
                error_flash_ms: cfg.timing.error_flash_ms,
            },
            source,
        }
    }

    /// Whole ticks covering `ms` milliseconds (at least one).
    pub fn ticks_for(&self, ms: u64) -> u32 {
        let ticks = ms.div_ceil(self.tick_rate_ms).max(1);
        ticks.min(u32::MAX as u64) as u32
    }
}

/// Candidate directories to search: exe dir + CWD + user config dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let user = PathBuf::from(&home).join(".config/heartquest");
        if user.is_dir() && !dirs.iter().any(|d| d == &user) {
            dirs.push(user);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

fn find_config(search_dirs: &[PathBuf]) -> Option<PathBuf> {
    search_dirs.iter()
        .map(|d| d.join("config.toml"))
        .find(|p| p.exists())
}

fn read_toml(path: &Path) -> Result<TomlConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("could not read {}", path.display()))?;
    toml::from_str::<TomlConfig>(&text)
        .with_context(|| format!("{} parse error", path.display()))
}

/// Relative asset paths are looked up in the search dirs, else kept relative to CWD.
fn resolve_path(s: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let p = PathBuf::from(s);
    if p.is_absolute() {
        return p;
    }
    search_dirs.iter()
        .map(|d| d.join(s))
        .find(|c| c.exists())
        .unwrap_or(p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = GameConfig::parse_str("").unwrap();
        assert_eq!(cfg.tick_rate_ms, 16);
        assert_eq!(cfg.physics.gravity, 1200.0);
        assert_eq!(cfg.timing.memory_resolve_ms, 1000);
        assert!(cfg.map_path.is_none());
        assert!(cfg.sound);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::parse_str(
            "[physics]\ngravity = 900.0\n\n[timing]\nmessage_ms = 500\n",
        ).unwrap();
        assert_eq!(cfg.physics.gravity, 900.0);
        assert_eq!(cfg.physics.move_speed, 200.0);
        assert_eq!(cfg.timing.message_ms, 500);
        assert_eq!(cfg.timing.error_flash_ms, 2000);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(GameConfig::parse_str("[physics\ngravity = ").is_err());
    }

    #[test]
    fn ticks_round_up_and_never_zero() {
        let cfg = GameConfig::parse_str("[general]\ntick_rate_ms = 16\n").unwrap();
        assert_eq!(cfg.ticks_for(1000), 63);
        assert_eq!(cfg.ticks_for(16), 1);
        assert_eq!(cfg.ticks_for(0), 1);
    }

    #[test]
    fn zero_tick_rate_is_clamped() {
        let cfg = GameConfig::parse_str("[general]\ntick_rate_ms = 0\n").unwrap();
        assert_eq!(cfg.tick_rate_ms, 1);
    }
}
