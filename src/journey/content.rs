/// Journey content: every text, question, word and picture shown along the way.
///
/// ## Sources (priority order):
///   1. `content_path` from config: a TOML file with the schema below
///   2. The built-in content
///
/// Sections missing from the file keep their built-in value. A file that
/// fails to parse or validate is logged and ignored.
///
/// ## TOML schema
///   ```toml
///   title = "Happy Birthday!"
///   welcome = ["line", "..."]
///   puzzle_tiles = ["💝", "💖", ...]          # 8 entries
///   slides = ["caption", "..."]
///
///   [[memory]]   symbol = "🎭"  memory = "..."
///   [[trivia]]   question = "..."  options = ["..."]  correct = 1  explanation = "..."
///   [[words]]    word = "FOREVER"  hint = "..."  message = "..."
///   [photo]      word = "sunset"  hints = ["..."]  picture = ["..."]
///   [year_riddle]  title = "..."  lines = ["..."]  answer = "1996"
///   [final_riddle] title = "..."  lines = ["..."]  answer = "together"
///   [key_location] title = "..."  lines = ["..."]
///   ```

use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::games::hangman::PhotoPuzzle;
use crate::games::memory::MemoryItem;
use crate::games::riddle::{normalize, RiddleText, MAX_INPUT};
use crate::games::scramble::ScrambleWord;
use crate::games::sliding::CELLS;
use crate::games::trivia::TriviaQuestion;
use crate::logging::log_error;

#[derive(Clone, Debug, Deserialize)]
pub struct FinalMessage {
    pub title: String,
    pub lines: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct JourneyContent {
    pub title: String,
    pub welcome: Vec<String>,
    pub memory: Vec<MemoryItem>,
    pub trivia: Vec<TriviaQuestion>,
    pub words: Vec<ScrambleWord>,
    pub photo: PhotoPuzzle,
    pub puzzle_tiles: Vec<String>,
    pub year_riddle: RiddleText,
    pub slides: Vec<String>,
    pub final_riddle: RiddleText,
    pub key_location: FinalMessage,
}

// ══════════════════════════════════════════════════════════════
// Loading
// ══════════════════════════════════════════════════════════════

/// Load the configured content, falling back to the built-in content.
pub fn load_content(path: Option<&Path>) -> JourneyContent {
    if let Some(path) = path {
        match load_content_file(path) {
            Ok(content) => {
                info!("journey content loaded from {}", path.display());
                return content;
            }
            Err(e) => {
                log_error(&e);
                warn!("falling back to the built-in journey content");
            }
        }
    }
    JourneyContent::default()
}

pub fn load_content_file(path: &Path) -> Result<JourneyContent> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("could not read content {}", path.display()))?;
    parse_content(&text).with_context(|| format!("invalid content {}", path.display()))
}

pub fn parse_content(text: &str) -> Result<JourneyContent> {
    let content: JourneyContent = toml::from_str(text)?;
    content.validate()?;
    Ok(content)
}

impl JourneyContent {
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.memory.is_empty(), "memory game needs at least one item");
        ensure!(!self.trivia.is_empty(), "trivia needs at least one question");
        for (i, q) in self.trivia.iter().enumerate() {
            ensure!(
                q.correct < q.options.len(),
                "trivia question {} has answer {} but only {} options",
                i + 1, q.correct, q.options.len(),
            );
        }
        ensure!(!self.words.is_empty(), "word scramble needs at least one word");
        for w in &self.words {
            ensure!(!w.word.trim().is_empty(), "word scramble has an empty word");
        }
        ensure!(
            self.photo.word.chars().any(|c| c.is_ascii_alphabetic()),
            "photo word '{}' has no letters to guess", self.photo.word,
        );
        ensure!(
            self.photo.word.chars().all(|c| c.is_ascii_alphabetic() || c == ' '),
            "photo word '{}' may only hold letters a-z and spaces", self.photo.word,
        );
        ensure!(
            self.puzzle_tiles.len() == CELLS - 1,
            "puzzle needs {} tiles, got {}", CELLS - 1, self.puzzle_tiles.len(),
        );
        for (name, riddle) in [("year", &self.year_riddle), ("final", &self.final_riddle)] {
            let answer = normalize(&riddle.answer);
            ensure!(!answer.is_empty(), "{name} riddle has no answer");
            ensure!(
                answer.chars().count() <= MAX_INPUT,
                "{name} riddle answer is longer than the {MAX_INPUT} characters the input line takes",
            );
        }
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════
// Built-in content
// ══════════════════════════════════════════════════════════════

fn lines(src: &[&str]) -> Vec<String> {
    src.iter().map(|s| s.to_string()).collect()
}

fn memory_item(symbol: &str, memory: &str) -> MemoryItem {
    MemoryItem { symbol: symbol.into(), memory: memory.into() }
}

fn question(q: &str, options: [&str; 4], correct: usize, explanation: &str) -> TriviaQuestion {
    TriviaQuestion {
        question: q.into(),
        options: lines(&options),
        correct,
        explanation: explanation.into(),
    }
}

fn word(w: &str, hint: &str, message: &str) -> ScrambleWord {
    ScrambleWord { word: w.into(), hint: hint.into(), message: message.into() }
}

impl Default for JourneyContent {
    fn default() -> Self {
        JourneyContent {
            title: "Happy Birthday! 🎂".into(),
            welcome: lines(&[
                "Are you ready for a special birthday adventure?",
                "A few little games stand between you and your present.",
                "Each one hides a piece of our story.",
            ]),
            memory: vec![
                memory_item("🎭", "Our first date at the theater"),
                memory_item("🌺", "The flower I gave you"),
                memory_item("🎪", "That magical evening at the fair"),
                memory_item("🌙", "Watching the stars on the beach"),
                memory_item("🎸", "Your wonderful concert"),
                memory_item("🎨", "Our painting class together"),
            ],
            trivia: vec![
                question(
                    "Where did we have our first date?",
                    ["At a coffee shop", "At the theater", "In a restaurant", "In the park"],
                    1,
                    "We watched that amazing play together at the theater! 🎭",
                ),
                question(
                    "What was the first gift I gave you?",
                    ["A book", "A necklace", "A flower", "A chocolate box"],
                    2,
                    "A beautiful flower that you kept for weeks! 🌺",
                ),
                question(
                    "What was playing during our first dance?",
                    [
                        "Perfect by Ed Sheeran",
                        "All of Me by John Legend",
                        "At Last by Etta James",
                        "Thinking Out Loud by Ed Sheeran",
                    ],
                    0,
                    "Ed Sheeran's \"Perfect\", our perfect moment! 💃",
                ),
                question(
                    "Where did we have our first kiss?",
                    ["Under the stars", "In the rain", "At your doorstep", "By the beach"],
                    0,
                    "That magical night under the starlit sky! ✨",
                ),
                question(
                    "What did we cook together on our first dinner date at home?",
                    ["Pizza", "Pasta", "Sushi", "Tacos"],
                    1,
                    "That delicious homemade pasta we made together! 🍝",
                ),
            ],
            words: vec![
                word("FOREVER", "How long I want to be with you", "My love for you will last forever! 💖"),
                word("BELOVED", "What you are to me", "You are my soulmate! 💫"),
                word("GORGEOUS", "What you are, inside and out", "Your beauty shines so bright! ✨"),
                word("DESTINY", "What brought us together", "We were meant to be! 🌟"),
                word("PRECIOUS", "What you mean to me", "You are my precious treasure! 💎"),
            ],
            photo: PhotoPuzzle {
                word: "sunset".into(),
                hints: lines(&[
                    "We watched it together more than once",
                    "It paints the sky orange and pink",
                    "It happens at the end of every day",
                    "Best seen from the beach",
                    "The sun says goodbye",
                ]),
                picture: lines(&[
                    r"            \   |   /            ",
                    r"         .   \  |  /   .         ",
                    r"      --   .-'''''''-.   --      ",
                    r"  ~~~~~~~~/           \~~~~~~~~  ",
                    r"  ~~~~~~~/_____________\~~~~~~~  ",
                    r"   ~~~  ~~~~~   ~~~~~  ~~~~  ~~  ",
                    r"     ~~~~   ~~~~   ~~~~   ~~~    ",
                ]),
            },
            puzzle_tiles: lines(&["💝", "💖", "💗", "💓", "💕", "💞", "💘", "💟"]),
            year_riddle: RiddleText {
                title: "A Special Riddle 🧩".into(),
                lines: lines(&[
                    "\"I am a special year,",
                    "when something wonderful took place:",
                    "a little girl was born,",
                    "and she has been shining ever since.\"",
                ]),
                answer: "1996".into(),
            },
            slides: lines(&[
                "I hope you are having a good time :)",
                "But it's not over yet, hehe",
                "One last little riddle to finish!",
            ]),
            final_riddle: RiddleText {
                title: "One Last Challenge! 🎯".into(),
                lines: lines(&[
                    "Solve this riddle to find the key to your special box:",
                    "",
                    "\"Two hearts that beat as one,",
                    "Through storms and sunny days we run.",
                    "Like puzzle pieces perfectly aligned,",
                    "This word describes what fate designed.",
                    "Forever bound, in joy we stay,",
                    "Walking life's beautiful way.\"",
                ]),
                answer: "together".into(),
            },
            key_location: FinalMessage {
                title: "You solved the final riddle! 🗝️".into(),
                lines: lines(&[
                    "Your present is hidden...",
                    "Behind the Red Hot Chili Peppers record in the living room! 🌶️",
                    "",
                    "Happy Birthday, my love!",
                    "I hope this treasure hunt made your day a little brighter.",
                    "",
                    "With all my love ❤️",
                ]),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_content_is_valid() {
        let c = JourneyContent::default();
        c.validate().unwrap();
        assert_eq!(c.memory.len(), 6);
        assert_eq!(c.year_riddle.answer, "1996");
        assert_eq!(c.final_riddle.answer, "together");
        assert_eq!(c.slides.len(), 3);
    }

    #[test]
    fn partial_file_keeps_other_sections() {
        let c = parse_content(
            r#"
            title = "Bon anniversaire"

            [[words]]
            word = "TOUJOURS"
            hint = "Combien de temps"
            message = "Pour toujours"
            "#,
        )
        .unwrap();
        assert_eq!(c.title, "Bon anniversaire");
        assert_eq!(c.words.len(), 1);
        assert_eq!(c.trivia.len(), 5, "trivia kept from built-in content");
    }

    #[test]
    fn bad_trivia_answer_is_rejected() {
        let err = parse_content(
            r#"
            [[trivia]]
            question = "?"
            options = ["a", "b"]
            correct = 2
            explanation = ""
            "#,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("only 2 options"));
    }

    #[test]
    fn photo_word_must_be_guessable() {
        let err = parse_content(
            r#"
            [photo]
            word = "l'amour"
            hints = []
            "#,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("photo word"));
    }

    #[test]
    fn riddle_answer_must_fit_the_input_line() {
        let mut c = JourneyContent::default();
        c.final_riddle.answer = "a".repeat(MAX_INPUT + 5);
        let err = c.validate().unwrap_err();
        assert!(format!("{err:#}").contains("final riddle"));

        c.final_riddle.answer = format!("  {}  ", "a".repeat(MAX_INPUT));
        assert!(c.validate().is_ok(), "surrounding spaces are not typed");
    }

    #[test]
    fn unreadable_file_falls_back() {
        let c = load_content(Some(Path::new("/nonexistent/heartquest-content.toml")));
        assert_eq!(c.final_riddle.answer, "together");
    }
}
