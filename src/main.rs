/// Entry point and host loop.

mod config;
mod domain;
mod games;
mod journey;
mod logging;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyboardEnhancementFlags, PushKeyboardEnhancementFlags, PopKeyboardEnhancementFlags};
use crossterm::{execute, terminal};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use config::GameConfig;
use domain::entity::FrameInput;
use journey::content::load_content;
use journey::stage::StageKind;
use journey::{Feedback, Journey, Key, StageInput};
use logging::{log_error, setup_log};
use sim::level::load_map;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::{sfx_for, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let config = GameConfig::load();
    if let Err(e) = setup_log(&config.log_file) {
        eprintln!("Logging disabled: {e:#}");
    }
    info!("heartquest {} starting", env!("CARGO_PKG_VERSION"));
    config.log_source();

    if let Err(e) = run(config) {
        log_error(&e);
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(config: GameConfig) -> Result<()> {
    let map = load_map(config.map_path.as_deref())?;
    let content = load_content(config.content_path.as_deref());
    let start = start_stage_from_args();

    let mut journey = Journey::new(content, config.clone(), map, StdRng::from_entropy());
    if let Some(kind) = start {
        journey.jump_to(kind);
    }

    let sound = if config.sound { SoundEngine::new() } else { None };
    if config.sound && sound.is_none() {
        warn!("no audio output device; sound disabled");
    }

    let mut renderer = Renderer::new();
    renderer.init().context("terminal init failed")?;
    let mut kb = InputState::new();
    kb.honor_release = enable_key_release();

    let result = game_loop(&mut journey, &mut renderer, &mut kb, sound.as_ref(), &config);

    if kb.honor_release {
        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
    }
    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    result?;

    println!();
    println!("Thanks for playing Heart Quest! 💖");
    Ok(())
}

/// `--stage <name>` starts the journey somewhere other than the welcome screen.
fn start_stage_from_args() -> Option<StageKind> {
    let args: Vec<String> = std::env::args().collect();
    let name = args.iter().position(|a| a == "--stage").and_then(|i| args.get(i + 1))?;
    let kind = parse_stage(name);
    if kind.is_none() {
        warn!("unknown stage '{name}', starting from the beginning");
    }
    kind
}

fn parse_stage(name: &str) -> Option<StageKind> {
    let wanted = name.to_ascii_lowercase().replace(['-', '_', ' '], "");
    StageKind::ORDER
        .into_iter()
        .find(|k| format!("{k:?}").to_ascii_lowercase() == wanted)
}

/// Ask the terminal for key Release events; lets a held jump end exactly
/// when the key comes up.
fn enable_key_release() -> bool {
    if !matches!(terminal::supports_keyboard_enhancement(), Ok(true)) {
        return false;
    }
    let flags = KeyboardEnhancementFlags::REPORT_EVENT_TYPES;
    match execute!(std::io::stdout(), PushKeyboardEnhancementFlags(flags)) {
        Ok(()) => {
            info!("keyboard enhancement on: key releases are reported");
            true
        }
        Err(e) => {
            warn!("keyboard enhancement unavailable: {e}");
            false
        }
    }
}

fn game_loop(
    journey: &mut Journey,
    renderer: &mut Renderer,
    kb: &mut InputState,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<()> {
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.tick_rate_ms);

    // Presses seen between ticks; a tick may span several drains.
    let mut pending_keys: Vec<Key> = Vec::new();
    let mut pending_jump = false;

    loop {
        kb.drain_events();

        if kb.ctrl_c_pressed() {
            info!("ctrl+c: quitting");
            break;
        }
        pending_keys.extend(kb.keys());
        pending_jump |= kb.any_pressed(KEYS_JUMP);

        if last_tick.elapsed() >= tick_rate {
            let input = StageInput {
                frame: frame_input(kb, std::mem::take(&mut pending_jump)),
                keys: std::mem::take(&mut pending_keys),
            };
            let feedback = journey.update(&input);
            process_sound_events(sound, &feedback);
            if journey.wants_quit() {
                break;
            }
            last_tick = Instant::now();
        }

        renderer.render(journey).context("render failed")?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn process_sound_events(sound: Option<&SoundEngine>, feedback: &[Feedback]) {
    let Some(sfx) = sound else { return };
    for fb in feedback {
        if let Some(effect) = sfx_for(fb) {
            sfx.play(effect);
        }
    }
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_JUMP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W'), KeyCode::Char(' ')];

/// Held movement keys for the platformer. `jump_pressed` is the edge seen
/// since the last tick.
fn frame_input(kb: &InputState, jump_pressed: bool) -> FrameInput {
    FrameInput {
        left: kb.any_held(KEYS_LEFT),
        right: kb.any_held(KEYS_RIGHT),
        up: kb.any_held(KEYS_UP),
        down: kb.any_held(KEYS_DOWN),
        jump_pressed,
        jump_held: kb.any_held(KEYS_JUMP),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_parse_loosely() {
        assert_eq!(parse_stage("platformer"), Some(StageKind::Platformer));
        assert_eq!(parse_stage("Photo-Mystery"), Some(StageKind::PhotoMystery));
        assert_eq!(parse_stage("final_riddle"), Some(StageKind::FinalRiddle));
        assert_eq!(parse_stage("nowhere"), None);
    }
}
