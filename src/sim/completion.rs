/// Completion signalling from a scene to its host.
///
/// The host creates the channel once and keeps the handle across scene
/// restarts. The handle sends at most once; a send after the receiver is
/// dropped is logged and forgotten.

use std::sync::mpsc::{channel, Receiver, Sender};

use tracing::{debug, info};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SceneOutcome {
    Completed,
}

#[derive(Debug)]
pub struct CompletionHandle {
    tx: Sender<SceneOutcome>,
    fired: bool,
}

pub fn completion_channel() -> (CompletionHandle, Receiver<SceneOutcome>) {
    let (tx, rx) = channel();
    (CompletionHandle { tx, fired: false }, rx)
}

impl CompletionHandle {
    /// Signal completion. Returns false if the handle already fired.
    pub fn fire(&mut self) -> bool {
        if self.fired {
            return false;
        }
        self.fired = true;
        match self.tx.send(SceneOutcome::Completed) {
            Ok(()) => info!("scene completion signalled"),
            Err(e) => debug!("completion receiver is gone ({e}); ignoring"),
        }
        true
    }

    #[cfg(test)]
    pub fn has_fired(&self) -> bool {
        self.fired
    }
}
