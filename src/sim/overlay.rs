/// Transient on-screen messages and the start-of-scene guide panel.
///
/// Messages stack: a new one never replaces an older one, it is drawn on
/// top while the rest keep counting down.

/// Colour hint for the renderer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tone {
    Info,
    Love,
    Warning,
    Success,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub text: String,
    pub tone: Tone,
    pub remaining: u32,
    pub total: u32,
}

impl Message {
    /// 1.0 when fresh, approaching 0.0 as it expires.
    pub fn freshness(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        self.remaining as f32 / self.total as f32
    }
}

pub const GUIDE_LINES: &[&str] = &[
    "How to play",
    "LEFT / RIGHT (or A / D) to move",
    "UP, W or SPACE to jump; hold for a higher jump",
    "UP / DOWN to climb ladders",
    "Collect every magic item, hearts included",
    "Spikes send you back to the start",
    "",
    "Press any key to begin!",
];

#[derive(Clone, Debug)]
pub struct Overlay {
    messages: Vec<Message>,
    default_ticks: u32,
    pub guide_visible: bool,
}

impl Overlay {
    pub fn new(default_ticks: u32) -> Self {
        Overlay { messages: Vec::new(), default_ticks: default_ticks.max(1), guide_visible: true }
    }

    pub fn push(&mut self, text: impl Into<String>, tone: Tone) {
        let ticks = self.default_ticks;
        self.push_for(text, tone, ticks);
    }

    pub fn push_for(&mut self, text: impl Into<String>, tone: Tone, ticks: u32) {
        let ticks = ticks.max(1);
        self.messages.push(Message { text: text.into(), tone, remaining: ticks, total: ticks });
    }

    /// Count every message down one tick and drop the expired ones.
    pub fn tick(&mut self) {
        for m in &mut self.messages {
            m.remaining = m.remaining.saturating_sub(1);
        }
        self.messages.retain(|m| m.remaining > 0);
    }

    pub fn dismiss_guide(&mut self) {
        self.guide_visible = false;
    }

    /// Oldest first; the last one is drawn on top.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}
