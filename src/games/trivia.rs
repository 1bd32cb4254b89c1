/// Trivia: one answer per question, a running score, then on to the next.

use serde::Deserialize;

use super::{tick_down, Cue};

#[derive(Clone, Debug, Deserialize)]
pub struct TriviaQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct: usize,
    pub explanation: String,
}

pub struct Trivia {
    questions: Vec<TriviaQuestion>,
    pub current: usize,
    /// Option picked for the current question, once answered.
    pub selected: Option<usize>,
    pub score: u32,
    pub cursor: usize,
    advance_timer: Option<u32>,
    advance_ticks: u32,
    finished: bool,
}

impl Trivia {
    pub fn new(questions: Vec<TriviaQuestion>, advance_ticks: u32) -> Self {
        let finished = questions.is_empty();
        Trivia {
            questions,
            current: 0,
            selected: None,
            score: 0,
            cursor: 0,
            advance_timer: None,
            advance_ticks: advance_ticks.max(1),
            finished,
        }
    }

    pub fn question(&self) -> Option<&TriviaQuestion> {
        self.questions.get(self.current)
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn was_correct(&self) -> Option<bool> {
        let q = self.question()?;
        self.selected.map(|s| s == q.correct)
    }

    /// Answer the current question. Only the first answer counts.
    pub fn answer(&mut self, option: usize) -> Option<Cue> {
        if self.finished || self.selected.is_some() {
            return None;
        }
        let q = self.question()?;
        if option >= q.options.len() {
            return None;
        }
        let correct = option == q.correct;
        self.selected = Some(option);
        self.advance_timer = Some(self.advance_ticks);
        if correct {
            self.score += 1;
            Some(Cue::Correct)
        } else {
            Some(Cue::Wrong)
        }
    }

    pub fn answer_at_cursor(&mut self) -> Option<Cue> {
        self.answer(self.cursor)
    }

    pub fn move_cursor(&mut self, delta: i32) {
        let n = self.question().map_or(0, |q| q.options.len());
        if n == 0 || self.selected.is_some() {
            return;
        }
        self.cursor = (self.cursor as i32 + delta).clamp(0, n as i32 - 1) as usize;
    }

    /// Returns true on the tick the last question is done.
    pub fn tick(&mut self) -> bool {
        if !tick_down(&mut self.advance_timer) {
            return false;
        }
        if self.current + 1 < self.questions.len() {
            self.current += 1;
            self.selected = None;
            self.cursor = 0;
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

    fn quiz() -> Trivia {
        let q = |correct| TriviaQuestion {
            question: "?".into(),
            options: vec!["a".into(), "b".into(), "c".into()],
            correct,
            explanation: "because".into(),
        };
        Trivia::new(vec![q(1), q(2)], 2)
    }

    #[test]
    fn first_answer_only() {
        let mut t = quiz();
        assert_eq!(t.answer(1), Some(Cue::Correct));
        assert_eq!(t.answer(0), None);
        assert_eq!(t.score, 1);
        assert_eq!(t.was_correct(), Some(true));
    }

    #[test]
    fn out_of_range_answer_is_ignored() {
        let mut t = quiz();
        assert_eq!(t.answer(7), None);
        assert_eq!(t.selected, None);
    }

    #[test]
    fn advances_then_finishes() {
        let mut t = quiz();
        t.answer(0);
        assert!(!t.tick());
        assert!(!t.tick());
        assert_eq!(t.current, 1);
        assert_eq!(t.selected, None);
        assert_eq!(t.answer(2), Some(Cue::Correct));
        assert!(!t.tick());
        assert!(t.tick());
        assert!(t.is_finished());
        assert_eq!(t.score, 1);
        assert_eq!(t.answer(0), None);
    }

    #[test]
    fn cursor_locks_after_answer() {
        let mut t = quiz();
        t.move_cursor(5);
        assert_eq!(t.cursor, 2);
        t.answer_at_cursor();
        t.move_cursor(-1);
        assert_eq!(t.cursor, 2);
    }
}
