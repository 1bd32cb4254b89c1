/// The journey: a fixed sequence of stages from the welcome screen to the
/// present's hiding place.
///
/// ## Keys
///   Enter        next stage, once the current one is complete
///   Esc          ask to quit (Esc again or `y` confirms, anything else cancels)
///   everything else goes to the current stage
///
/// Ctrl+C is handled by the host and quits at once.

pub mod content;
pub mod stage;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::config::GameConfig;
use crate::domain::entity::FrameInput;
use crate::games::Cue;
use crate::sim::event::GameEvent;
use crate::sim::level::LoadedMap;

use content::JourneyContent;
use stage::{Stage, StageDeps, StageKind};

/// A key press, already decoded from the terminal.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Backspace,
    Tab,
    Esc,
    Char(char),
}

/// Input for one tick: held movement state plus fresh key presses.
#[derive(Clone, Debug, Default)]
pub struct StageInput {
    pub frame: FrameInput,
    pub keys: Vec<Key>,
}

/// Something the player should hear about.
#[derive(Clone, Debug, PartialEq)]
pub enum Feedback {
    Scene(GameEvent),
    Cue(Cue),
    Restarted,
    StageEntered(StageKind),
}

pub struct Journey {
    content: JourneyContent,
    config: GameConfig,
    map: LoadedMap,
    index: usize,
    pub stage: Stage,
    pub quit_prompt: bool,
    quit: bool,
    rng: StdRng,
}

impl Journey {
    pub fn new(content: JourneyContent, config: GameConfig, map: LoadedMap, mut rng: StdRng) -> Self {
        let first = StageKind::ORDER[0];
        let stage = {
            let deps = StageDeps { content: &content, config: &config, map: &map };
            Stage::build(first, &deps, StdRng::seed_from_u64(rng.gen()))
        };
        info!("journey starts at {:?}", first);
        Journey { content, config, map, index: 0, stage, quit_prompt: false, quit: false, rng }
    }

    pub fn content(&self) -> &JourneyContent {
        &self.content
    }

    pub fn kind(&self) -> StageKind {
        self.stage.kind()
    }

    /// 1-based stage number and stage count, for the header.
    pub fn progress(&self) -> (usize, usize) {
        (self.index + 1, StageKind::ORDER.len())
    }

    pub fn wants_quit(&self) -> bool {
        self.quit
    }

    pub fn stage_complete(&self) -> bool {
        self.stage.is_complete(self.content.slides.len())
    }

    /// Replace the current stage with the one at `index`. The old stage and
    /// everything it armed are dropped here.
    fn enter(&mut self, index: usize) -> StageKind {
        let kind = StageKind::ORDER[index];
        let deps = StageDeps { content: &self.content, config: &self.config, map: &self.map };
        self.stage = Stage::build(kind, &deps, StdRng::seed_from_u64(self.rng.gen()));
        self.index = index;
        info!("stage {}/{}: {:?}", index + 1, StageKind::ORDER.len(), kind);
        kind
    }

    /// Move to the next stage if there is one.
    pub fn advance(&mut self) -> Option<StageKind> {
        let next = self.index + 1;
        if next >= StageKind::ORDER.len() {
            return None;
        }
        Some(self.enter(next))
    }

    /// Jump straight to a stage (`--stage` on the command line).
    pub fn jump_to(&mut self, kind: StageKind) {
        if let Some(index) = StageKind::ORDER.iter().position(|&k| k == kind) {
            self.enter(index);
        }
    }

    /// One simulation tick.
    pub fn update(&mut self, input: &StageInput) -> Vec<Feedback> {
        if self.quit_prompt {
            if let Some(&k) = input.keys.first() {
                self.quit_prompt = false;
                if matches!(k, Key::Esc | Key::Char('y' | 'Y')) {
                    info!("quit confirmed");
                    self.quit = true;
                }
            }
            return Vec::new();
        }
        if input.keys.contains(&Key::Esc) {
            self.quit_prompt = true;
            return Vec::new();
        }
        if input.keys.contains(&Key::Enter) && self.stage_complete() {
            return match self.advance() {
                Some(kind) => vec![Feedback::StageEntered(kind)],
                None => Vec::new(),
            };
        }
        self.stage.update(input.frame, &input.keys, self.content.slides.len())
    }
}
