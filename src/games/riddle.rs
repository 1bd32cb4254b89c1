/// Password gate: a riddle answered with free text.

use serde::Deserialize;

use super::{tick_down, Cue};

/// Longest answer the input line accepts.
pub const MAX_INPUT: usize = 32;

#[derive(Clone, Debug, Deserialize)]
pub struct RiddleText {
    pub title: String,
    pub lines: Vec<String>,
    pub answer: String,
}

/// Case- and whitespace-insensitive at the ends only.
pub fn normalize(answer: &str) -> String {
    answer.trim().to_lowercase()
}

pub struct Riddle {
    pub text: RiddleText,
    pub input: String,
    pub solved: bool,
    error_timer: Option<u32>,
    error_ticks: u32,
}

impl Riddle {
    pub fn new(text: RiddleText, error_ticks: u32) -> Self {
        Riddle { text, input: String::new(), solved: false, error_timer: None, error_ticks: error_ticks.max(1) }
    }

    pub fn type_char(&mut self, ch: char) {
        if self.solved || ch.is_control() || self.input.chars().count() >= MAX_INPUT {
            return;
        }
        self.input.push(ch);
    }

    pub fn backspace(&mut self) {
        if !self.solved {
            self.input.pop();
        }
    }

    pub fn submit(&mut self) -> Option<Cue> {
        if self.solved {
            return None;
        }
        if normalize(&self.input) == normalize(&self.text.answer) {
            self.solved = true;
            self.error_timer = None;
            Some(Cue::Solved)
        } else {
            self.error_timer = Some(self.error_ticks);
            Some(Cue::Wrong)
        }
    }

    /// Is the "wrong answer" flash still showing?
    pub fn error_visible(&self) -> bool {
        self.error_timer.is_some()
    }

    pub fn tick(&mut self) {
        tick_down(&mut self.error_timer);
    }
}
