/// Word scramble: rebuild each word from its shuffled letters.
///
/// Letters move between two rows: the *pool* (shuffled) and the
/// *selection* (the answer being built). Picking appends a pool letter to
/// the selection; unpicking returns a selected letter to the end of the pool.

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use tracing::debug;

use super::{tick_down, Cue};

#[derive(Clone, Debug, Deserialize)]
pub struct ScrambleWord {
    pub word: String,
    pub hint: String,
    pub message: String,
}

pub struct Scramble {
    words: Vec<ScrambleWord>,
    pub current: usize,
    pub pool: Vec<char>,
    pub selected: Vec<char>,
    pub cursor: usize,
    pub hint_shown: bool,
    /// Word found; its message is up until the advance timer runs out.
    pub solved: bool,
    advance_timer: Option<u32>,
    advance_ticks: u32,
    finished: bool,
    rng: StdRng,
}

/// Shuffle the letters of `word`. A shuffle that spells the word again is
/// redone, unless every letter is the same.
pub fn scramble_letters(word: &str, rng: &mut StdRng) -> Vec<char> {
    let letters: Vec<char> = word.chars().collect();
    let distinct: BTreeSet<char> = letters.iter().copied().collect();
    let mut shuffled = letters.clone();
    shuffled.shuffle(rng);
    while distinct.len() >= 2 && shuffled == letters {
        shuffled.shuffle(rng);
    }
    shuffled
}

impl Scramble {
    pub fn new(words: Vec<ScrambleWord>, advance_ticks: u32, rng: StdRng) -> Self {
        let words: Vec<ScrambleWord> = words
            .into_iter()
            .map(|w| ScrambleWord { word: w.word.to_uppercase(), ..w })
            .collect();
        let mut s = Scramble {
            finished: words.is_empty(),
            words,
            current: 0,
            pool: Vec::new(),
            selected: Vec::new(),
            cursor: 0,
            hint_shown: false,
            solved: false,
            advance_timer: None,
            advance_ticks: advance_ticks.max(1),
            rng,
        };
        s.start_word();
        s
    }

    fn start_word(&mut self) {
        let Some(w) = self.words.get(self.current) else { return };
        self.pool = scramble_letters(&w.word, &mut self.rng);
        self.selected.clear();
        self.cursor = 0;
        self.hint_shown = false;
        self.solved = false;
    }

    pub fn word(&self) -> Option<&ScrambleWord> {
        self.words.get(self.current)
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn show_hint(&mut self) {
        self.hint_shown = true;
    }

    /// Move the pool letter at `index` to the end of the selection.
    pub fn pick(&mut self, index: usize) -> Option<Cue> {
        if self.solved || self.finished || index >= self.pool.len() {
            return None;
        }
        let ch = self.pool.remove(index);
        self.selected.push(ch);
        self.cursor = self.cursor.min(self.pool.len().saturating_sub(1));
        self.check()
    }

    /// Pick the first pool letter matching a typed key.
    pub fn pick_char(&mut self, ch: char) -> Option<Cue> {
        let ch = ch.to_ascii_uppercase();
        let index = self.pool.iter().position(|&c| c == ch)?;
        self.pick(index)
    }

    pub fn pick_at_cursor(&mut self) -> Option<Cue> {
        self.pick(self.cursor)
    }

    /// Return the selected letter at `index` to the pool.
    pub fn unpick(&mut self, index: usize) -> bool {
        if self.solved || index >= self.selected.len() {
            return false;
        }
        let ch = self.selected.remove(index);
        self.pool.push(ch);
        true
    }

    pub fn unpick_last(&mut self) -> bool {
        match self.selected.len() {
            0 => false,
            n => self.unpick(n - 1),
        }
    }

    pub fn move_cursor(&mut self, delta: i32) {
        if self.pool.is_empty() {
            return;
        }
        self.cursor = (self.cursor as i32 + delta).clamp(0, self.pool.len() as i32 - 1) as usize;
    }

    fn check(&mut self) -> Option<Cue> {
        let w = self.words.get(self.current)?;
        if !self.pool.is_empty() {
            return None;
        }
        let built: String = self.selected.iter().collect();
        if built == w.word {
            debug!("scramble word {} found", self.current + 1);
            self.solved = true;
            self.advance_timer = Some(self.advance_ticks);
            Some(Cue::Correct)
        } else {
            Some(Cue::Wrong)
        }
    }

    /// Returns true on the tick the last word is done.
    pub fn tick(&mut self) -> bool {
        if !tick_down(&mut self.advance_timer) {
            return false;
        }
        if self.current + 1 < self.words.len() {
            self.current += 1;
            self.start_word();
            false
        } else {
            self.finished = true;
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn game(words: &[&str]) -> Scramble {
        let words = words
            .iter()
            .map(|w| ScrambleWord { word: w.to_string(), hint: "hint".into(), message: "yes".into() })
            .collect();
        Scramble::new(words, 2, StdRng::seed_from_u64(3))
    }

    #[test]
    fn shuffle_never_spells_the_word() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let s = scramble_letters("AB", &mut rng);
            assert_eq!(s, vec!['B', 'A']);
        }
        assert_eq!(scramble_letters("AAA", &mut rng), vec!['A', 'A', 'A']);
    }

    #[test]
    fn pick_and_unpick_move_letters() {
        let mut s = game(&["heart"]);
        assert_eq!(s.pool.len(), 5);
        let first = s.pool[0];
        s.pick(0);
        assert_eq!(s.selected, vec![first]);
        assert_eq!(s.pool.len(), 4);
        assert!(s.unpick(0));
        assert_eq!(s.pool.last(), Some(&first));
        assert!(s.selected.is_empty());
        assert!(!s.unpick(0));
        assert_eq!(s.pick(9), None);
    }

    #[test]
    fn typing_builds_the_word() {
        let mut s = game(&["love", "us"]);
        for c in "lov".chars() {
            assert_eq!(s.pick_char(c), None);
        }
        assert_eq!(s.pick_char('e'), Some(Cue::Correct));
        assert!(s.solved);
        assert!(!s.unpick_last(), "solved word is frozen");
        assert!(!s.tick());
        assert!(!s.tick());
        assert_eq!(s.current, 1);
        assert!(!s.solved);
        assert_eq!(s.pool.len(), 2);
    }

    #[test]
    fn wrong_order_can_be_undone() {
        let mut s = game(&["ab"]);
        s.pick_char('b');
        assert_eq!(s.pick_char('a'), Some(Cue::Wrong));
        assert!(s.unpick_last());
        assert!(s.unpick_last());
        s.pick_char('a');
        assert_eq!(s.pick_char('b'), Some(Cue::Correct));
        s.tick();
        assert!(s.tick());
        assert!(s.is_finished());
    }

    #[test]
    fn hint_resets_per_word() {
        let mut s = game(&["ab", "cd"]);
        s.show_hint();
        assert!(s.hint_shown);
        s.pick_char('a');
        s.pick_char('b');
        s.tick();
        s.tick();
        assert!(!s.hint_shown);
    }
}
