/// Mini-games played between the journey's story beats.
///
/// Every game is plain state: the journey stage translates keys into calls
/// (`flip`, `slide`, `guess`, ...) and advances timers with one `tick()` per
/// simulation step. No game ever reads the clock.

pub mod hangman;
pub mod memory;
pub mod riddle;
pub mod scramble;
pub mod sliding;
pub mod trivia;

/// Feedback a game hands back to the host, which turns it into sound.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Cue {
    Correct,
    Wrong,
    Solved,
}

/// Count an armed timer down by one tick.
/// Returns true on the tick it runs out (and disarms it).
pub fn tick_down(timer: &mut Option<u32>) -> bool {
    match timer {
        Some(t) if *t > 1 => {
            *t -= 1;
            false
        }
        Some(_) => {
            *timer = None;
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_fires_once() {
        let mut t = Some(3);
        assert!(!tick_down(&mut t));
        assert!(!tick_down(&mut t));
        assert!(tick_down(&mut t));
        assert_eq!(t, None);
        assert!(!tick_down(&mut t));
    }
}
