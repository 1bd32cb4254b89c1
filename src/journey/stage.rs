/// One stage of the journey and the key handling for each kind.
///
/// A stage owns all of its state, timers included. Replacing the stage
/// drops it, so nothing armed by a finished stage can fire later.

use std::sync::mpsc::Receiver;

use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::config::GameConfig;
use crate::domain::entity::FrameInput;
use crate::games::hangman::{GameState, Hangman};
use crate::games::memory::MemoryGame;
use crate::games::riddle::Riddle;
use crate::games::scramble::Scramble;
use crate::games::sliding::{Dir, SlidingPuzzle};
use crate::games::trivia::Trivia;
use crate::games::Cue;
use crate::sim::completion::{completion_channel, CompletionHandle, SceneOutcome};
use crate::sim::level::LoadedMap;
use crate::sim::step;
use crate::sim::world::{ScenePhase, SceneState};

use super::content::JourneyContent;
use super::{Feedback, Key};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StageKind {
    Welcome,
    Memory,
    Trivia,
    Platformer,
    Scramble,
    PhotoMystery,
    Sliding,
    YearRiddle,
    Slides,
    FinalRiddle,
    KeyLocation,
}

impl StageKind {
    pub const ORDER: [StageKind; 11] = [
        StageKind::Welcome,
        StageKind::Memory,
        StageKind::Trivia,
        StageKind::Platformer,
        StageKind::Scramble,
        StageKind::PhotoMystery,
        StageKind::Sliding,
        StageKind::YearRiddle,
        StageKind::Slides,
        StageKind::FinalRiddle,
        StageKind::KeyLocation,
    ];

    pub fn title(self) -> &'static str {
        match self {
            StageKind::Welcome => "Welcome",
            StageKind::Memory => "Memory Match",
            StageKind::Trivia => "Love Trivia",
            StageKind::Platformer => "Heart Meadow",
            StageKind::Scramble => "Word Scramble",
            StageKind::PhotoMystery => "Photo Mystery",
            StageKind::Sliding => "Sliding Hearts",
            StageKind::YearRiddle => "A Special Year",
            StageKind::Slides => "Bravo!",
            StageKind::FinalRiddle => "The Final Riddle",
            StageKind::KeyLocation => "Your Present",
        }
    }
}

/// The platformer scene plus the channel it reports completion on.
///
/// The handle lives here, not in the scene, so a restart keeps it.
pub struct PlatformerStage {
    pub scene: SceneState,
    handle: CompletionHandle,
    rx: Receiver<SceneOutcome>,
    pub done: bool,
}

impl PlatformerStage {
    pub fn new(map: &LoadedMap, config: &GameConfig, rng: StdRng) -> Self {
        let (handle, rx) = completion_channel();
        let scene = SceneState::new(map, config, rng);
        if scene.is_degraded() {
            warn!("scene '{}' has no player; it cannot be finished", scene.name);
        }
        PlatformerStage { scene, handle, rx, done: false }
    }

    fn update(&mut self, frame: FrameInput, keys: &[Key], out: &mut Vec<Feedback>) {
        if self.scene.phase == ScenePhase::Guide && !keys.is_empty() {
            step::begin(&mut self.scene);
        } else if keys.iter().any(|k| matches!(k, Key::Char('r' | 'R'))) && self.scene.restart() {
            out.push(Feedback::Restarted);
        }
        let events = step::step(&mut self.scene, frame, &mut self.handle);
        out.extend(events.into_iter().map(Feedback::Scene));
        if let Ok(SceneOutcome::Completed) = self.rx.try_recv() {
            info!("platformer scene '{}' complete", self.scene.name);
            self.done = true;
        }
    }
}

pub enum Stage {
    Welcome,
    Memory(MemoryGame),
    Trivia(Trivia),
    Platformer(Box<PlatformerStage>),
    Scramble(Scramble),
    PhotoMystery(Hangman),
    Sliding(SlidingPuzzle),
    YearRiddle(Riddle),
    Slides { index: usize },
    FinalRiddle(Riddle),
    KeyLocation,
}

/// What a stage needs to be built.
pub struct StageDeps<'a> {
    pub content: &'a JourneyContent,
    pub config: &'a GameConfig,
    pub map: &'a LoadedMap,
}

impl Stage {
    pub fn build(kind: StageKind, deps: &StageDeps, mut rng: StdRng) -> Stage {
        let c = deps.content;
        let ticks = |ms| deps.config.ticks_for(ms);
        let timing = &deps.config.timing;
        match kind {
            StageKind::Welcome => Stage::Welcome,
            StageKind::Memory => {
                Stage::Memory(MemoryGame::new(c.memory.clone(), ticks(timing.memory_resolve_ms), &mut rng))
            }
            StageKind::Trivia => Stage::Trivia(Trivia::new(c.trivia.clone(), ticks(timing.trivia_advance_ms))),
            StageKind::Platformer => {
                Stage::Platformer(Box::new(PlatformerStage::new(deps.map, deps.config, rng)))
            }
            StageKind::Scramble => {
                Stage::Scramble(Scramble::new(c.words.clone(), ticks(timing.scramble_advance_ms), rng))
            }
            StageKind::PhotoMystery => Stage::PhotoMystery(Hangman::new(&c.photo.word, c.photo.hints.len())),
            StageKind::Sliding => Stage::Sliding(SlidingPuzzle::new(ticks(timing.puzzle_complete_ms), &mut rng)),
            StageKind::YearRiddle => {
                Stage::YearRiddle(Riddle::new(c.year_riddle.clone(), ticks(timing.error_flash_ms)))
            }
            StageKind::Slides => Stage::Slides { index: 0 },
            StageKind::FinalRiddle => {
                Stage::FinalRiddle(Riddle::new(c.final_riddle.clone(), ticks(timing.error_flash_ms)))
            }
            StageKind::KeyLocation => Stage::KeyLocation,
        }
    }

    pub fn kind(&self) -> StageKind {
        match self {
            Stage::Welcome => StageKind::Welcome,
            Stage::Memory(_) => StageKind::Memory,
            Stage::Trivia(_) => StageKind::Trivia,
            Stage::Platformer(_) => StageKind::Platformer,
            Stage::Scramble(_) => StageKind::Scramble,
            Stage::PhotoMystery(_) => StageKind::PhotoMystery,
            Stage::Sliding(_) => StageKind::Sliding,
            Stage::YearRiddle(_) => StageKind::YearRiddle,
            Stage::Slides { .. } => StageKind::Slides,
            Stage::FinalRiddle(_) => StageKind::FinalRiddle,
            Stage::KeyLocation => StageKind::KeyLocation,
        }
    }

    /// May Enter move on to the next stage?
    pub fn is_complete(&self, slide_count: usize) -> bool {
        match self {
            Stage::Welcome => true,
            Stage::Memory(g) => g.is_won() && !g.is_locked(),
            Stage::Trivia(t) => t.is_finished(),
            Stage::Platformer(p) => p.done,
            Stage::Scramble(s) => s.is_finished(),
            Stage::PhotoMystery(h) => h.state == GameState::Won,
            Stage::Sliding(p) => p.is_complete(),
            Stage::YearRiddle(r) | Stage::FinalRiddle(r) => r.solved,
            Stage::Slides { index } => index + 1 >= slide_count,
            Stage::KeyLocation => false,
        }
    }

    /// Feed one tick of input. `keys` are this tick's fresh presses,
    /// with Enter already taken out when it advanced the journey.
    pub fn update(&mut self, frame: FrameInput, keys: &[Key], slide_count: usize) -> Vec<Feedback> {
        let mut out = Vec::new();
        let mut cue = |c: Option<Cue>| {
            if let Some(c) = c {
                out.push(Feedback::Cue(c));
            }
        };
        match self {
            Stage::Welcome | Stage::KeyLocation => {}
            Stage::Memory(g) => {
                for &k in keys {
                    match k {
                        Key::Left => g.move_cursor(-1, 0),
                        Key::Right => g.move_cursor(1, 0),
                        Key::Up => g.move_cursor(0, -1),
                        Key::Down => g.move_cursor(0, 1),
                        Key::Enter | Key::Char(' ') => {
                            g.flip_at_cursor();
                        }
                        _ => {}
                    }
                }
                cue(g.tick());
            }
            Stage::Trivia(t) => {
                for &k in keys {
                    match k {
                        Key::Up | Key::Left => t.move_cursor(-1),
                        Key::Down | Key::Right => t.move_cursor(1),
                        Key::Enter | Key::Char(' ') => cue(t.answer_at_cursor()),
                        Key::Char(d @ '1'..='9') => cue(t.answer(d as usize - '1' as usize)),
                        _ => {}
                    }
                }
                if t.tick() {
                    debug!("trivia finished with score {}/{}", t.score, t.question_count());
                    cue(Some(Cue::Solved));
                }
            }
            Stage::Platformer(p) => {
                p.update(frame, keys, &mut out);
            }
            Stage::Scramble(s) => {
                for &k in keys {
                    match k {
                        Key::Left => s.move_cursor(-1),
                        Key::Right => s.move_cursor(1),
                        Key::Enter | Key::Char(' ') => cue(s.pick_at_cursor()),
                        Key::Backspace => {
                            s.unpick_last();
                        }
                        Key::Char('?') | Key::Tab => s.show_hint(),
                        Key::Char(ch) if ch.is_alphabetic() => cue(s.pick_char(ch)),
                        _ => {}
                    }
                }
                if s.tick() {
                    cue(Some(Cue::Solved));
                }
            }
            Stage::PhotoMystery(h) => {
                for &k in keys {
                    match k {
                        Key::Char(ch) => cue(h.guess(ch)),
                        Key::Enter => {
                            h.retry();
                        }
                        _ => {}
                    }
                }
            }
            Stage::Sliding(p) => {
                for &k in keys {
                    match k {
                        Key::Up => {
                            p.slide(Dir::Up);
                        }
                        Key::Down => {
                            p.slide(Dir::Down);
                        }
                        Key::Left => {
                            p.slide(Dir::Left);
                        }
                        Key::Right => {
                            p.slide(Dir::Right);
                        }
                        Key::Char('h' | 'H') => p.toggle_hint(),
                        Key::Char('s' | 'S') => p.skip(),
                        _ => {}
                    }
                }
                if p.tick() {
                    cue(Some(Cue::Solved));
                }
            }
            Stage::YearRiddle(r) | Stage::FinalRiddle(r) => {
                for &k in keys {
                    match k {
                        Key::Char(ch) => r.type_char(ch),
                        Key::Backspace => r.backspace(),
                        Key::Enter => cue(r.submit()),
                        _ => {}
                    }
                }
                r.tick();
            }
            Stage::Slides { index } => {
                for &k in keys {
                    match k {
                        Key::Left if *index > 0 => *index -= 1,
                        Key::Right | Key::Char(' ') if *index + 1 < slide_count => *index += 1,
                        _ => {}
                    }
                }
            }
        }
        out
    }
}
