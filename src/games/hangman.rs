/// Photo mystery: guess the word letter by letter while the picture sharpens.

use std::collections::BTreeSet;

use serde::Deserialize;
use tracing::debug;

use super::Cue;

pub const MAX_WRONG: u32 = 6;
/// Blur at the start of a game; 0 is a sharp picture.
pub const MAX_BLUR: u32 = 20;

#[derive(Clone, Debug, Deserialize)]
pub struct PhotoPuzzle {
    pub word: String,
    pub hints: Vec<String>,
    /// ASCII picture revealed as the word is found.
    #[serde(default)]
    pub picture: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameState {
    Guessing,
    Won,
    Lost,
}

pub struct Hangman {
    word: String,
    hint_count: usize,
    guessed: BTreeSet<char>,
    pub wrong: u32,
    pub blur: u32,
    pub hint: usize,
    pub state: GameState,
}

impl Hangman {
    pub fn new(word: &str, hint_count: usize) -> Self {
        Hangman {
            word: word.to_lowercase(),
            hint_count,
            guessed: BTreeSet::new(),
            wrong: 0,
            blur: MAX_BLUR,
            hint: 0,
            state: GameState::Guessing,
        }
    }

    fn letters(&self) -> BTreeSet<char> {
        self.word.chars().filter(|c| !c.is_whitespace()).collect()
    }

    fn correct_guesses(&self) -> usize {
        self.guessed.iter().filter(|c| self.word.contains(**c)).count()
    }

    /// Guess one letter. Non-letters, repeats and guesses after the game
    /// is over are ignored (`None`).
    pub fn guess(&mut self, ch: char) -> Option<Cue> {
        if self.state != GameState::Guessing {
            return None;
        }
        let ch = ch.to_ascii_lowercase();
        if !ch.is_ascii_lowercase() || !self.guessed.insert(ch) {
            return None;
        }

        if !self.word.contains(ch) {
            self.wrong += 1;
            if self.wrong >= MAX_WRONG {
                debug!("photo mystery lost");
                self.state = GameState::Lost;
            }
            return Some(Cue::Wrong);
        }

        let letters = self.letters();
        let correct = self.correct_guesses();
        let progress = correct as f32 / letters.len().max(1) as f32;
        self.blur = ((MAX_BLUR as f32 - progress * 19.0).floor() as u32).max(1);
        if correct < self.hint_count {
            self.hint = correct;
        }

        if letters.iter().all(|c| self.guessed.contains(c)) {
            debug!("photo mystery solved with {} wrong guesses", self.wrong);
            self.state = GameState::Won;
            self.blur = 0;
            return Some(Cue::Solved);
        }
        Some(Cue::Correct)
    }

    /// The word with unguessed letters as `_`; spaces stay spaces.
    pub fn masked(&self) -> String {
        self.word
            .chars()
            .map(|c| {
                if c.is_whitespace() || self.guessed.contains(&c) {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect()
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn guessed(&self) -> impl Iterator<Item = char> + '_ {
        self.guessed.iter().copied()
    }

    /// Start over after a loss.
    pub fn retry(&mut self) -> bool {
        if self.state != GameState::Lost {
            return false;
        }
        *self = Hangman::new(&self.word, self.hint_count);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_guesses_lose_at_six() {
        let mut h = Hangman::new("love", 3);
        for c in ['a', 'b', 'c', 'd', 'f'] {
            assert_eq!(h.guess(c), Some(Cue::Wrong));
        }
        assert_eq!(h.state, GameState::Guessing);
        assert_eq!(h.guess('g'), Some(Cue::Wrong));
        assert_eq!(h.state, GameState::Lost);
        assert_eq!(h.guess('l'), None, "no guesses after game over");
    }

    #[test]
    fn repeats_and_symbols_are_ignored() {
        let mut h = Hangman::new("love", 3);
        assert_eq!(h.guess('x'), Some(Cue::Wrong));
        assert_eq!(h.guess('X'), None);
        assert_eq!(h.guess('3'), None);
        assert_eq!(h.guess(' '), None);
        assert_eq!(h.wrong, 1);
    }

    #[test]
    fn blur_follows_progress() {
        let mut h = Hangman::new("love", 3);
        assert_eq!(h.blur, 20);
        h.guess('L');
        // 1 of 4 letters: floor(20 - 4.75) = 15
        assert_eq!(h.blur, 15);
        assert_eq!(h.hint, 1);
        h.guess('o');
        h.guess('v');
        assert_eq!(h.blur, 5);
        assert_eq!(h.hint, 2, "hint index stops at the last hint");
        assert_eq!(h.guess('e'), Some(Cue::Solved));
        assert_eq!(h.state, GameState::Won);
        assert_eq!(h.blur, 0);
    }

    #[test]
    fn mask_keeps_spaces() {
        let mut h = Hangman::new("sea side", 2);
        h.guess('s');
        assert_eq!(h.masked(), "S__ S___");
    }

    #[test]
    fn repeated_letters_count_once() {
        let mut h = Hangman::new("aab", 5);
        h.guess('a');
        // 1 of 2 distinct letters: floor(20 - 9.5) = 10
        assert_eq!(h.blur, 10);
        assert_eq!(h.guess('b'), Some(Cue::Solved));
    }

    #[test]
    fn retry_only_after_loss() {
        let mut h = Hangman::new("ab", 1);
        assert!(!h.retry());
        for c in "cdefgh".chars() {
            h.guess(c);
        }
        assert!(h.retry());
        assert_eq!(h.wrong, 0);
        assert_eq!(h.state, GameState::Guessing);
        assert_eq!(h.masked(), "__");
    }
}
