/// Events emitted during a platformer step.
/// The presentation layer consumes these for sound; the log records them.

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Jumped,
    Landed,
    ItemCollected { x: usize, y: usize },
    HeartCollected { x: usize, y: usize },
    /// Every heart item picked up; fires once per scene.
    AllHeartsCollected,
    TrapTriggered { x: usize, y: usize },
    /// Exit entered before everything was collected.
    ExitBlocked,
    LevelComplete,
    /// The completion timer expired and the host was signalled.
    CompletionSignaled,
}
