/// 3×3 sliding puzzle: eight tiles and one empty slot.
///
/// Positions are row-major `0..9`. The solved board holds tile `n` at
/// position `n - 1` with the empty slot in the bottom-right corner.
///
/// Arrow keys move the *empty slot*: `Up` swaps it with the tile above,
/// which therefore slides down.

use rand::Rng;
use tracing::debug;

use super::tick_down;

pub const GRID: usize = 3;
pub const CELLS: usize = GRID * GRID;

/// Random legal moves applied to the solved board when shuffling.
const SHUFFLE_MOVES: usize = 80;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    const ALL: [Dir; 4] = [Dir::Up, Dir::Down, Dir::Left, Dir::Right];

    fn opposite(self) -> Dir {
        match self {
            Dir::Up => Dir::Down,
            Dir::Down => Dir::Up,
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

pub struct SlidingPuzzle {
    /// `None` is the empty slot.
    tiles: [Option<u8>; CELLS],
    pub moves: u32,
    pub show_hint: bool,
    complete_timer: Option<u32>,
    complete_ticks: u32,
    complete: bool,
}

fn solved_board() -> [Option<u8>; CELLS] {
    let mut b = [None; CELLS];
    for (i, slot) in b.iter_mut().take(CELLS - 1).enumerate() {
        *slot = Some(i as u8 + 1);
    }
    b
}

/// Are two positions orthogonal neighbours on the grid?
pub fn adjacent(a: usize, b: usize) -> bool {
    let (ar, ac) = (a / GRID, a % GRID);
    let (br, bc) = (b / GRID, b % GRID);
    (ar == br && ac.abs_diff(bc) == 1) || (ac == bc && ar.abs_diff(br) == 1)
}

/// Position the empty slot would move to, if it stays on the board.
fn neighbour(pos: usize, dir: Dir) -> Option<usize> {
    let (r, c) = (pos / GRID, pos % GRID);
    match dir {
        Dir::Up if r > 0 => Some(pos - GRID),
        Dir::Down if r + 1 < GRID => Some(pos + GRID),
        Dir::Left if c > 0 => Some(pos - 1),
        Dir::Right if c + 1 < GRID => Some(pos + 1),
        _ => None,
    }
}

impl SlidingPuzzle {
    pub fn new(complete_ticks: u32, rng: &mut impl Rng) -> Self {
        let mut p = Self::solved(complete_ticks);
        p.shuffle(rng);
        p
    }

    fn solved(complete_ticks: u32) -> Self {
        SlidingPuzzle {
            tiles: solved_board(),
            moves: 0,
            show_hint: false,
            complete_timer: None,
            complete_ticks: complete_ticks.max(1),
            complete: false,
        }
    }

    /// Random walk of the empty slot from the solved board, so the result
    /// is always solvable. Never leaves the board solved.
    fn shuffle(&mut self, rng: &mut impl Rng) {
        let mut last: Option<Dir> = None;
        let mut applied = 0;
        while applied < SHUFFLE_MOVES || self.is_solved() {
            let empty = self.empty_slot();
            let options: Vec<Dir> = Dir::ALL
                .into_iter()
                .filter(|d| Some(d.opposite()) != last && neighbour(empty, *d).is_some())
                .collect();
            let dir = options[rng.gen_range(0..options.len())];
            if let Some(target) = neighbour(empty, dir) {
                self.tiles.swap(empty, target);
            }
            last = Some(dir);
            applied += 1;
        }
        debug!("sliding puzzle shuffled with {applied} moves");
    }

    pub fn tiles(&self) -> &[Option<u8>; CELLS] {
        &self.tiles
    }

    pub fn empty_slot(&self) -> usize {
        self.tiles.iter().position(|t| t.is_none()).unwrap_or(CELLS - 1)
    }

    pub fn is_solved(&self) -> bool {
        self.tiles == solved_board()
    }

    /// Stage may move on.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Positions holding a tile that isn't where it belongs.
    pub fn misplaced(&self) -> Vec<usize> {
        let solved = solved_board();
        (0..CELLS)
            .filter(|&i| self.tiles[i].is_some() && self.tiles[i] != solved[i])
            .collect()
    }

    /// Slide the tile at `pos` into the empty slot. Illegal moves change
    /// nothing and don't count.
    pub fn move_tile(&mut self, pos: usize) -> bool {
        if self.is_solved() || pos >= CELLS {
            return false;
        }
        let empty = self.empty_slot();
        if !adjacent(pos, empty) {
            return false;
        }
        self.tiles.swap(pos, empty);
        self.moves += 1;
        if self.is_solved() {
            debug!("sliding puzzle solved in {} moves", self.moves);
            self.complete_timer = Some(self.complete_ticks);
        }
        true
    }

    /// Move the empty slot one step in `dir`.
    pub fn slide(&mut self, dir: Dir) -> bool {
        match neighbour(self.empty_slot(), dir) {
            Some(target) => self.move_tile(target),
            None => false,
        }
    }

    pub fn toggle_hint(&mut self) {
        self.show_hint = !self.show_hint;
    }

    /// Give up on the puzzle; the stage completes right away.
    pub fn skip(&mut self) {
        self.complete_timer = None;
        self.complete = true;
    }

    /// Returns true on the tick the puzzle becomes complete.
    pub fn tick(&mut self) -> bool {
        if tick_down(&mut self.complete_timer) {
            self.complete = true;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Solved board with the empty slot moved one step left.
    fn one_off() -> SlidingPuzzle {
        let mut p = SlidingPuzzle::solved(2);
        p.tiles.swap(7, 8);
        p
    }

    #[test]
    fn shuffle_is_never_solved() {
        for seed in 0..50 {
            let p = SlidingPuzzle::new(2, &mut StdRng::seed_from_u64(seed));
            assert!(!p.is_solved(), "seed {seed}");
            let mut seen: Vec<u8> = p.tiles.iter().flatten().copied().collect();
            seen.sort();
            assert_eq!(seen, (1..=8).collect::<Vec<u8>>());
        }
    }

    #[test]
    fn only_neighbours_of_the_gap_move() {
        let mut p = one_off();
        let before = *p.tiles();
        assert!(!p.move_tile(0));
        assert!(!p.move_tile(42));
        assert_eq!(*p.tiles(), before);
        assert_eq!(p.moves, 0);
        assert!(p.move_tile(4));
        assert_eq!(p.empty_slot(), 4);
        assert_eq!(p.moves, 1);
    }

    #[test]
    fn arrow_moves_the_gap() {
        let mut p = one_off();
        // gap at 7 (bottom middle): Up swaps with 4.
        assert!(p.slide(Dir::Up));
        assert_eq!(p.empty_slot(), 4);
        assert_eq!(p.tiles()[7], Some(5));
        assert!(p.slide(Dir::Down));
        assert!(!p.slide(Dir::Down), "gap already on the bottom row");
    }

    #[test]
    fn solving_completes_after_delay() {
        let mut p = one_off();
        assert!(!p.is_solved());
        assert_eq!(p.misplaced(), vec![8]);
        assert!(p.slide(Dir::Right));
        assert!(p.is_solved());
        assert!(p.misplaced().is_empty());
        assert!(!p.slide(Dir::Left), "solved board is frozen");
        assert!(!p.tick());
        assert!(!p.is_complete());
        assert!(p.tick());
        assert!(p.is_complete());
    }

    #[test]
    fn skip_completes_immediately() {
        let mut p = SlidingPuzzle::new(5, &mut StdRng::seed_from_u64(1));
        p.skip();
        assert!(p.is_complete());
    }

    #[test]
    fn adjacency() {
        assert!(adjacent(0, 1));
        assert!(adjacent(4, 7));
        assert!(!adjacent(2, 3), "row wrap is not adjacent");
        assert!(!adjacent(0, 4));
    }
}
