/// Memory match: six shared memories, each on two cards.
///
/// Flip rules:
///   - Locked while a pair is waiting to resolve
///   - Face-up or matched cards can't be flipped again
///   - The second flip of a turn locks the board and arms the resolve timer
///   - On resolve: same item → matched, otherwise both turn back over

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use tracing::debug;

use super::{tick_down, Cue};

/// Cards per row on screen.
pub const COLUMNS: usize = 4;

#[derive(Clone, Debug, Deserialize)]
pub struct MemoryItem {
    pub symbol: String,
    pub memory: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Card {
    /// Index into the item list.
    pub item: usize,
    pub face_up: bool,
    pub matched: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlipOutcome {
    Ignored,
    Revealed,
    PairPending,
}

pub struct MemoryGame {
    items: Vec<MemoryItem>,
    pub cards: Vec<Card>,
    first: Option<usize>,
    pending: Option<(usize, usize)>,
    resolve_timer: Option<u32>,
    resolve_ticks: u32,
    pub moves: u32,
    /// Item of the most recent match, shown under the board.
    pub last_match: Option<usize>,
    pub cursor: usize,
}

impl MemoryGame {
    pub fn new(items: Vec<MemoryItem>, resolve_ticks: u32, rng: &mut impl Rng) -> Self {
        let mut cards: Vec<Card> = (0..items.len())
            .chain(0..items.len())
            .map(|item| Card { item, face_up: false, matched: false })
            .collect();
        cards.shuffle(rng);
        MemoryGame {
            items,
            cards,
            first: None,
            pending: None,
            resolve_timer: None,
            resolve_ticks: resolve_ticks.max(1),
            moves: 0,
            last_match: None,
            cursor: 0,
        }
    }

    pub fn item(&self, index: usize) -> Option<&MemoryItem> {
        self.items.get(index)
    }

    pub fn is_locked(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_won(&self) -> bool {
        !self.cards.is_empty() && self.cards.iter().all(|c| c.matched)
    }

    pub fn flip(&mut self, index: usize) -> FlipOutcome {
        if self.is_locked() {
            return FlipOutcome::Ignored;
        }
        let Some(card) = self.cards.get_mut(index) else {
            return FlipOutcome::Ignored;
        };
        if card.face_up || card.matched {
            return FlipOutcome::Ignored;
        }
        card.face_up = true;

        match self.first.take() {
            None => {
                self.first = Some(index);
                FlipOutcome::Revealed
            }
            Some(first) => {
                self.moves += 1;
                self.pending = Some((first, index));
                self.resolve_timer = Some(self.resolve_ticks);
                FlipOutcome::PairPending
            }
        }
    }

    pub fn flip_at_cursor(&mut self) -> FlipOutcome {
        self.flip(self.cursor)
    }

    /// Move the selection on the 4-wide grid, clamped to the board.
    pub fn move_cursor(&mut self, dx: i32, dy: i32) {
        let n = self.cards.len();
        if n == 0 {
            return;
        }
        let rows = n.div_ceil(COLUMNS) as i32;
        let col = (self.cursor % COLUMNS) as i32 + dx;
        let row = (self.cursor / COLUMNS) as i32 + dy;
        let col = col.clamp(0, COLUMNS as i32 - 1) as usize;
        let row = row.clamp(0, rows - 1) as usize;
        self.cursor = (row * COLUMNS + col).min(n - 1);
    }

    pub fn tick(&mut self) -> Option<Cue> {
        if !tick_down(&mut self.resolve_timer) {
            return None;
        }
        let (a, b) = self.pending.take()?;
        let (ia, ib) = (self.cards[a].item, self.cards[b].item);
        if ia == ib {
            self.cards[a].matched = true;
            self.cards[b].matched = true;
            self.last_match = Some(ia);
            debug!("memory pair matched: item {ia} after {} moves", self.moves);
            if self.is_won() {
                return Some(Cue::Solved);
            }
            Some(Cue::Correct)
        } else {
            self.cards[a].face_up = false;
            self.cards[b].face_up = false;
            Some(Cue::Wrong)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn items(n: usize) -> Vec<MemoryItem> {
        (0..n)
            .map(|i| MemoryItem { symbol: format!("#{i}"), memory: format!("memory {i}") })
            .collect()
    }

    fn game() -> MemoryGame {
        MemoryGame::new(items(6), 2, &mut StdRng::seed_from_u64(7))
    }

    /// Indices of the two cards showing `item`.
    fn pair(g: &MemoryGame, item: usize) -> (usize, usize) {
        let idx: Vec<usize> = (0..g.cards.len()).filter(|&i| g.cards[i].item == item).collect();
        (idx[0], idx[1])
    }

    fn mismatch(g: &MemoryGame) -> (usize, usize) {
        let a = 0;
        let b = (1..g.cards.len()).find(|&i| g.cards[i].item != g.cards[a].item).unwrap();
        (a, b)
    }

    #[test]
    fn deck_has_every_item_twice() {
        let g = game();
        assert_eq!(g.cards.len(), 12);
        for item in 0..6 {
            assert_eq!(g.cards.iter().filter(|c| c.item == item).count(), 2);
        }
    }

    #[test]
    fn same_card_twice_is_ignored() {
        let mut g = game();
        assert_eq!(g.flip(0), FlipOutcome::Revealed);
        assert_eq!(g.flip(0), FlipOutcome::Ignored);
        assert_eq!(g.flip(99), FlipOutcome::Ignored);
        assert_eq!(g.moves, 0);
    }

    #[test]
    fn board_locks_until_resolved() {
        let mut g = game();
        let (a, b) = mismatch(&g);
        let other = (0..12).find(|&i| i != a && i != b).unwrap();
        g.flip(a);
        assert_eq!(g.flip(b), FlipOutcome::PairPending);
        assert!(g.is_locked());
        assert_eq!(g.flip(other), FlipOutcome::Ignored);
        assert_eq!(g.tick(), None);
        assert_eq!(g.tick(), Some(Cue::Wrong));
        assert!(!g.is_locked());
        assert!(!g.cards[a].face_up && !g.cards[b].face_up);
        assert_eq!(g.moves, 1);
    }

    #[test]
    fn matching_pair_stays_up() {
        let mut g = game();
        let (a, b) = pair(&g, 3);
        g.flip(a);
        g.flip(b);
        g.tick();
        assert_eq!(g.tick(), Some(Cue::Correct));
        assert!(g.cards[a].matched && g.cards[b].matched);
        assert_eq!(g.last_match, Some(3));
        assert_eq!(g.flip(a), FlipOutcome::Ignored);
    }

    #[test]
    fn last_pair_wins() {
        let mut g = game();
        let mut last = None;
        for item in 0..6 {
            let (a, b) = pair(&g, item);
            g.flip(a);
            g.flip(b);
            g.tick();
            last = g.tick();
        }
        assert_eq!(last, Some(Cue::Solved));
        assert!(g.is_won());
        assert_eq!(g.moves, 6);
    }

    #[test]
    fn cursor_stays_on_board() {
        let mut g = game();
        g.move_cursor(-1, -1);
        assert_eq!(g.cursor, 0);
        g.move_cursor(10, 10);
        assert_eq!(g.cursor, 11);
        g.move_cursor(-1, -1);
        assert_eq!(g.cursor, 6);
    }
}
