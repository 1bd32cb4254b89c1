/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// This eliminates flicker caused by full-screen redraws.
///
/// Screen layout:
///   row 0          header bar (journey title, stage n/11)
///   rows 2..       stage body
///   last row       key help

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::AnimState;
use crate::domain::tile::ZoneKind;
use crate::games::hangman::{GameState, Hangman, MAX_BLUR, MAX_WRONG};
use crate::games::memory::{MemoryGame, COLUMNS};
use crate::games::riddle::Riddle;
use crate::games::scramble::Scramble;
use crate::games::sliding::{SlidingPuzzle, CELLS, GRID};
use crate::games::trivia::Trivia;
use crate::journey::content::JourneyContent;
use crate::journey::stage::{Stage, StageKind};
use crate::journey::Journey;
use crate::sim::overlay::{Tone, GUIDE_LINES};
use crate::sim::world::{ScenePhase, SceneState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 16], // up to 16 bytes (emoji + variation selector)
    ch_len: u8,
    fg: Color,
    bg: Color,
    wide: bool, // true = this char occupies 2 terminal columns
    cont: bool, // true = continuation of previous wide char (skip render)
}

impl Cell {
    /// Explicit background for all "empty" terminal cells, so the gaps
    /// between rows match the cells on VTE-based terminals.
    const BASE_BG: Color = Color::Rgb { r: 30, g: 18, b: 34 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: false,
    };

    const WIDE_CONT: Cell = Cell {
        ch: [0; 16],
        ch_len: 0,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: true,
    };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
        wide: false,
        cont: false,
    };

    /// Normalize bg: Color::Reset → BASE_BG so that every cell gets an
    /// explicit background color (never terminal-default).
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        cell.ch_len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn from_char_wide(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::from_char(c, fg, bg);
        cell.wide = true;
        cell
    }

    /// Append a char to the cell's text (e.g. a variation selector).
    fn push_char(&mut self, c: char) {
        let len = self.ch_len as usize;
        if len + c.len_utf8() <= self.ch.len() {
            self.ch_len += c.encode_utf8(&mut self.ch[len..]).len() as u8;
        }
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or("?")
    }
}

/// Terminal columns a char takes. Emoji are 2, joiners and variation
/// selectors 0, everything else 1.
pub fn char_width(c: char) -> usize {
    match c {
        '\u{200D}' | '\u{FE0E}' | '\u{FE0F}' => 0,
        '\u{1F000}'..='\u{1FAFF}' | '✨' | '⭐' | '⌛' | '❌' | '❓' | '✅' => 2,
        _ => 1,
    }
}

/// Columns for `c` given the char after it. A text symbol followed by
/// VS16 (U+FE0F) is drawn in emoji presentation, 2 columns wide.
pub fn cluster_width(c: char, next: Option<char>) -> usize {
    match char_width(c) {
        1 if next == Some('\u{FE0F}') => 2,
        w => w,
    }
}

pub fn str_width(s: &str) -> usize {
    let mut chars = s.chars().peekable();
    let mut width = 0;
    while let Some(c) = chars.next() {
        width += cluster_width(c, chars.peek().copied());
    }
    width
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Wide chars take two cells; zero-width
    /// chars are dropped. Returns the column after the last char.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) -> usize {
        let mut cx = x;
        let mut chars = s.chars().peekable();
        while let Some(ch) = chars.next() {
            match cluster_width(ch, chars.peek().copied()) {
                0 => {}
                2 => {
                    if cx + 1 >= self.width {
                        break;
                    }
                    let mut cell = Cell::from_char_wide(ch, fg, bg);
                    if char_width(ch) == 1 {
                        // Keep VS16 with its base so the terminal draws the emoji.
                        cell.push_char('\u{FE0F}');
                    }
                    self.set(cx, y, cell);
                    self.set(cx + 1, y, Cell::WIDE_CONT);
                    cx += 2;
                }
                _ => {
                    if cx >= self.width {
                        break;
                    }
                    self.set(cx, y, Cell::from_char(ch, fg, bg));
                    cx += 1;
                }
            }
        }
        cx
    }

    /// Centered on the row.
    fn put_center(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        let x = self.width.saturating_sub(str_width(s)) / 2;
        self.put_str(x, y, s, fg, bg);
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::from_char(' ', Color::White, bg));
        }
    }

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, bg: Color) {
        for yy in y..y + h {
            for xx in x..x + w {
                self.set(xx, yy, Cell::from_char(' ', Color::White, bg));
            }
        }
    }
}

// ── Palette ──

const HEADER_BG: Color = Color::Rgb { r: 120, g: 40, b: 100 };
const TITLE: Color = Color::Rgb { r: 255, g: 140, b: 200 };
const TEXT: Color = Color::Rgb { r: 235, g: 225, b: 240 };
const DIM: Color = Color::Rgb { r: 130, g: 110, b: 140 };
const ACCENT: Color = Color::Rgb { r: 190, g: 140, b: 255 };
const GOOD: Color = Color::Rgb { r: 110, g: 230, b: 140 };
const BAD: Color = Color::Rgb { r: 255, g: 90, b: 90 };
const SELECT_BG: Color = Color::Rgb { r: 90, g: 50, b: 110 };
const PANEL_BG: Color = Color::Rgb { r: 50, g: 30, b: 60 };

fn tone_colors(tone: Tone) -> (Color, Color) {
    match tone {
        Tone::Info => (Color::Black, Color::Rgb { r: 200, g: 180, b: 255 }),
        Tone::Love => (Color::Black, Color::Rgb { r: 255, g: 150, b: 200 }),
        Tone::Warning => (Color::Black, Color::Rgb { r: 255, g: 200, b: 80 }),
        Tone::Success => (Color::Black, Color::Rgb { r: 120, g: 230, b: 140 }),
    }
}

// ── Renderer ──

/// Each map cell = 2 terminal columns.
const CELL_W: usize = 2;

const HEADER_ROW: usize = 0;
const BODY_ROW: usize = 2;

/// Rows under the map: HUD gap, three message lines, help.
const MAP_FOOTER_ROWS: usize = 5;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_stage: Option<StageKind>,
    last_view: (usize, usize),
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_stage: None,
            last_view: (0, 0),
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, journey: &mut Journey) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Stage change → clear for a clean transition
        let kind = journey.kind();
        if self.last_stage != Some(kind) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_stage = Some(kind);
            self.last_view = (0, 0);
        }

        if let Stage::Platformer(p) = &mut journey.stage {
            self.fit_camera(&mut p.scene);
        }

        self.front.clear();
        self.compose_header(journey);

        let content = journey.content();
        let complete = journey.stage_complete();
        match &journey.stage {
            Stage::Welcome => self.compose_welcome(content),
            Stage::Memory(g) => self.compose_memory(g, content),
            Stage::Trivia(t) => self.compose_trivia(t),
            Stage::Platformer(p) => self.compose_platformer(&p.scene, p.done),
            Stage::Scramble(s) => self.compose_scramble(s),
            Stage::PhotoMystery(h) => self.compose_photo(h, content),
            Stage::Sliding(p) => self.compose_sliding(p, content),
            Stage::YearRiddle(r) | Stage::FinalRiddle(r) => self.compose_riddle(r),
            Stage::Slides { index } => self.compose_slides(*index, content),
            Stage::KeyLocation => self.compose_key_location(content),
        }
        self.compose_help(kind, complete);

        if journey.quit_prompt {
            self.compose_quit_prompt();
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    /// Size the scene camera to the terminal. The first frame and any
    /// resize snap the camera to the player; otherwise the step's
    /// dead-zone follow is kept.
    fn fit_camera(&mut self, scene: &mut SceneState) {
        let reserved = BODY_ROW + 1 + MAP_FOOTER_ROWS;
        let view_w = (self.term_w / CELL_W).min(scene.layers.width).max(1);
        let view_h = self.term_h.saturating_sub(reserved).min(scene.layers.height).max(1);
        scene.camera.view_w = view_w;
        scene.camera.view_h = view_h;
        if self.last_view != (view_w, view_h) {
            scene.recenter_camera();
            self.last_view = (view_w, view_h);
        }
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors; ResetColor would fall back to the terminal default.
        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(Cell::BASE_BG))?;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let cell = self.front.get(x, y);
                let prev = self.back.get(x, y);

                if cell.cont {
                    if cell != prev {
                        need_move = true;
                    }
                    x += 1;
                    continue;
                }

                let cont_changed = cell.wide
                    && x + 1 < self.front.width
                    && self.front.get(x + 1, y) != self.back.get(x + 1, y);

                if cell == prev && !cont_changed {
                    need_move = true;
                    x += 1;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.as_str()))?;

                if cell.wide {
                    last_x = x + 1;
                    x += 2;
                } else {
                    last_x = x;
                    x += 1;
                }
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ══════════════════════════════════════════════════════════════
    // Frame chrome
    // ══════════════════════════════════════════════════════════════

    fn compose_header(&mut self, journey: &Journey) {
        let (n, total) = journey.progress();
        self.front.fill_row(HEADER_ROW, HEADER_BG);
        let left = format!(" 💖 Heart Quest  ·  {}", journey.kind().title());
        self.front.put_str(0, HEADER_ROW, &left, Color::White, HEADER_BG);
        let right = format!("{n}/{total} ");
        let x = self.front.width.saturating_sub(str_width(&right));
        self.front.put_str(x, HEADER_ROW, &right, Color::White, HEADER_BG);
    }

    fn compose_help(&mut self, kind: StageKind, complete: bool) {
        let keys = match kind {
            StageKind::Welcome => "ENTER start",
            StageKind::Memory => "←↑↓→ choose   SPACE/ENTER flip",
            StageKind::Trivia => "↑↓ choose   ENTER answer   1-4 quick answer",
            StageKind::Platformer => "←→ move   ↑/W/SPACE jump   ↑↓ climb   R restart",
            StageKind::Scramble => "type or ←→ + ENTER pick   BACKSPACE undo   ? hint",
            StageKind::PhotoMystery => "type letters to guess",
            StageKind::Sliding => "←↑↓→ move the gap   H hint   S skip",
            StageKind::YearRiddle | StageKind::FinalRiddle => "type your answer   ENTER submit",
            StageKind::Slides => "←→ browse",
            StageKind::KeyLocation => "Happy birthday!",
        };
        let next = if complete && kind != StageKind::Welcome { "   ENTER continue" } else { "" };
        let help = format!(" {keys}{next}   ESC quit");
        let row = self.front.height.saturating_sub(1);
        self.front.put_str(0, row, &help, DIM, Color::Reset);
    }

    fn compose_quit_prompt(&mut self) {
        let w = 36.min(self.front.width);
        let x = self.front.width.saturating_sub(w) / 2;
        let y = self.front.height.saturating_sub(5) / 2;
        self.front.fill_rect(x, y, w, 5, PANEL_BG);
        self.front.put_center(y + 1, "Leave the journey?", TITLE, PANEL_BG);
        self.front.put_center(y + 3, "ESC / Y  quit    any key  stay", TEXT, PANEL_BG);
    }

    /// Big "stage done" line under the body.
    fn compose_done(&mut self, row: usize, text: &str) {
        self.front.put_center(row, text, GOOD, Color::Reset);
        self.front.put_center(row + 1, "Press ENTER to continue ✨", ACCENT, Color::Reset);
    }

    // ══════════════════════════════════════════════════════════════
    // Stages
    // ══════════════════════════════════════════════════════════════

    fn compose_welcome(&mut self, content: &JourneyContent) {
        let banner = [
            r" _  _                _      ___                _   ",
            r"| || | ___  __ _  _ | |_   / _ \  _  _  ___  __| |_ ",
            r"| __ |/ -_)/ _` || '_||  _| | (_) || || |/ -_)(_-<  _|",
            r"|_||_|\___|\__,_||_|   \__|  \__\_\ \_,_|\___|/__/\__|",
        ];
        let mut row = BODY_ROW + 1;
        for line in banner {
            self.front.put_center(row, line, TITLE, Color::Reset);
            row += 1;
        }
        row += 1;
        self.front.put_center(row, &content.title, ACCENT, Color::Reset);
        row += 2;
        for line in &content.welcome {
            self.front.put_center(row, line, TEXT, Color::Reset);
            row += 1;
        }
        row += 1;
        self.front.put_center(row, "Press ENTER to start your journey! ✨", GOOD, Color::Reset);
    }

    fn compose_memory(&mut self, g: &MemoryGame, content: &JourneyContent) {
        const CARD_W: usize = 8;
        const CARD_H: usize = 3;
        let board_w = COLUMNS * (CARD_W + 1);
        let x0 = self.front.width.saturating_sub(board_w) / 2;
        let y0 = BODY_ROW + 1;
        self.front.put_center(y0, "Find the pairs of our memories", TEXT, Color::Reset);

        for (i, card) in g.cards.iter().enumerate() {
            let cx = x0 + (i % COLUMNS) * (CARD_W + 1);
            let cy = y0 + 2 + (i / COLUMNS) * (CARD_H + 1);
            let bg = if card.matched {
                Color::Rgb { r: 40, g: 90, b: 60 }
            } else if card.face_up {
                Color::Rgb { r: 230, g: 220, b: 245 }
            } else {
                Color::Rgb { r: 150, g: 80, b: 170 }
            };
            let bg = if i == g.cursor && !card.matched { Color::Rgb { r: 255, g: 170, b: 220 } } else { bg };
            self.front.fill_rect(cx, cy, CARD_W, CARD_H, bg);
            let face = if card.face_up || card.matched {
                g.item(card.item).map_or("?", |m| m.symbol.as_str())
            } else {
                "?"
            };
            let fx = cx + CARD_W.saturating_sub(str_width(face)) / 2;
            self.front.put_str(fx, cy + 1, face, Color::Black, bg);
        }

        let rows = g.cards.len().div_ceil(COLUMNS);
        let mut row = y0 + 2 + rows * (CARD_H + 1);
        let moves = format!("Moves: {}", g.moves);
        self.front.put_center(row, &moves, DIM, Color::Reset);
        row += 1;
        if let Some(item) = g.last_match.and_then(|i| content.memory.get(i)) {
            let text = format!("{}  {}", item.symbol, item.memory);
            self.front.put_center(row, &text, TITLE, Color::Reset);
        }
        if g.is_won() {
            self.compose_done(row + 2, "All our memories found! 💝");
        }
    }

    fn compose_trivia(&mut self, t: &Trivia) {
        let mut row = BODY_ROW + 1;
        let header = format!(
            "Question {}/{}        Score: {}/{}",
            (t.current + 1).min(t.question_count()),
            t.question_count(),
            t.score,
            t.question_count(),
        );
        self.front.put_center(row, &header, DIM, Color::Reset);
        row += 2;

        if t.is_finished() {
            let verdict = if t.score as usize == t.question_count() {
                "A perfect score! You know us by heart 💖"
            } else {
                "Every answer brings back a memory 💕"
            };
            self.compose_done(row, verdict);
            return;
        }
        let Some(q) = t.question() else { return };

        self.front.put_center(row, &q.question, TEXT, Color::Reset);
        row += 2;
        let x = self.front.width.saturating_sub(40) / 2;
        for (i, option) in q.options.iter().enumerate() {
            let (fg, bg) = match t.selected {
                Some(_) if i == q.correct => (Color::Black, GOOD),
                Some(s) if s == i => (Color::Black, BAD),
                None if i == t.cursor => (Color::White, SELECT_BG),
                _ => (TEXT, Color::Reset),
            };
            let line = format!(" {}. {:<34}", i + 1, option);
            self.front.put_str(x, row, &line, fg, bg);
            row += 1;
        }
        row += 1;
        match t.was_correct() {
            Some(true) => {
                self.front.put_center(row, "Correct! 🎉", GOOD, Color::Reset);
                self.front.put_center(row + 1, &q.explanation, TEXT, Color::Reset);
            }
            Some(false) => {
                self.front.put_center(row, "Not quite...", BAD, Color::Reset);
                self.front.put_center(row + 1, &q.explanation, TEXT, Color::Reset);
            }
            None => {}
        }
    }

    fn compose_scramble(&mut self, s: &Scramble) {
        let mut row = BODY_ROW + 1;
        let progress = format!("Word {}/{}", (s.current + 1).min(s.word_count()), s.word_count());
        self.front.put_center(row, &progress, DIM, Color::Reset);
        row += 2;

        if s.is_finished() {
            self.compose_done(row, "Every word unscrambled! 🌟");
            return;
        }
        let Some(word) = s.word() else { return };

        // Answer slots
        let len = word.word.chars().count();
        let slots: String = (0..len)
            .map(|i| s.selected.get(i).map_or("_ ".to_string(), |c| format!("{c} ")))
            .collect();
        let fg = if s.solved { GOOD } else { TEXT };
        self.front.put_center(row, slots.trim_end(), fg, Color::Reset);
        row += 2;

        // Pool
        let pool_w = s.pool.len() * 4;
        let mut x = self.front.width.saturating_sub(pool_w) / 2;
        for (i, c) in s.pool.iter().enumerate() {
            let bg = if i == s.cursor { SELECT_BG } else { PANEL_BG };
            let tile = format!(" {c} ");
            x = self.front.put_str(x, row, &tile, Color::White, bg) + 1;
        }
        row += 2;

        if s.hint_shown {
            let hint = format!("Hint: {}", word.hint);
            self.front.put_center(row, &hint, ACCENT, Color::Reset);
        }
        row += 2;
        if s.solved {
            self.front.put_center(row, &word.message, TITLE, Color::Reset);
        }
    }

    fn compose_photo(&mut self, h: &Hangman, content: &JourneyContent) {
        let mut row = BODY_ROW + 1;
        let blurred = blur_picture(&content.photo.picture, h.blur);
        for line in &blurred {
            self.front.put_center(row, line, Color::Rgb { r: 255, g: 190, b: 120 }, Color::Reset);
            row += 1;
        }
        row += 1;

        let spaced: String = h.masked().chars().map(|c| format!("{c} ")).collect();
        self.front.put_center(row, spaced.trim_end(), TEXT, Color::Reset);
        row += 2;

        let lives: String = (0..MAX_WRONG).map(|i| if i < h.wrong { '✗' } else { '♥' }).collect();
        let status = format!("{lives}   wrong guesses {}/{}", h.wrong, MAX_WRONG);
        self.front.put_center(row, &status, if h.wrong > 3 { BAD } else { DIM }, Color::Reset);
        row += 1;
        let guessed: String = h.guessed().map(|c| c.to_ascii_uppercase()).collect();
        if !guessed.is_empty() {
            let line = format!("Tried: {guessed}");
            self.front.put_center(row, &line, DIM, Color::Reset);
        }
        row += 2;

        match h.state {
            GameState::Guessing => {
                if let Some(hint) = content.photo.hints.get(h.hint) {
                    let line = format!("💭 {hint}");
                    self.front.put_center(row, &line, ACCENT, Color::Reset);
                }
            }
            GameState::Won => {
                let found = format!("It was \"{}\"! 📸", h.word());
                self.compose_done(row, &found);
            }
            GameState::Lost => {
                self.front.put_center(row, "Out of guesses! Press ENTER to try again", BAD, Color::Reset);
            }
        }
    }

    fn compose_sliding(&mut self, p: &SlidingPuzzle, content: &JourneyContent) {
        const TILE_W: usize = 8;
        const TILE_H: usize = 3;
        let board_w = GRID * (TILE_W + 1);
        let x0 = self.front.width.saturating_sub(board_w) / 2;
        let y0 = BODY_ROW + 1;
        self.front.put_center(y0, "Put the hearts back in order", TEXT, Color::Reset);

        let misplaced = if p.show_hint { p.misplaced() } else { Vec::new() };
        for (pos, tile) in p.tiles().iter().enumerate().take(CELLS) {
            let cx = x0 + (pos % GRID) * (TILE_W + 1);
            let cy = y0 + 2 + (pos / GRID) * (TILE_H + 1);
            let Some(n) = tile else {
                self.front.fill_rect(cx, cy, TILE_W, TILE_H, Cell::BASE_BG);
                continue;
            };
            let bg = if misplaced.contains(&pos) {
                Color::Rgb { r: 200, g: 120, b: 60 }
            } else if p.is_solved() {
                Color::Rgb { r: 40, g: 110, b: 70 }
            } else {
                Color::Rgb { r: 150, g: 80, b: 170 }
            };
            self.front.fill_rect(cx, cy, TILE_W, TILE_H, bg);
            let heart = content.puzzle_tiles.get(*n as usize - 1).map_or("", |s| s.as_str());
            let face = format!("{n} {heart}");
            let fx = cx + TILE_W.saturating_sub(str_width(&face)) / 2;
            self.front.put_str(fx, cy + 1, &face, Color::White, bg);
        }

        let mut row = y0 + 2 + GRID * (TILE_H + 1);
        let moves = format!("Moves: {}", p.moves);
        self.front.put_center(row, &moves, DIM, Color::Reset);
        row += 2;
        if p.is_complete() {
            let text = if p.is_solved() { "Puzzle solved! 💝" } else { "Puzzle skipped" };
            self.compose_done(row, text);
        } else if p.is_solved() {
            self.front.put_center(row, "Puzzle solved! 💝", GOOD, Color::Reset);
        }
    }

    fn compose_riddle(&mut self, r: &Riddle) {
        let mut row = BODY_ROW + 1;
        self.front.put_center(row, &r.text.title, TITLE, Color::Reset);
        row += 2;
        for line in &r.text.lines {
            self.front.put_center(row, line, TEXT, Color::Reset);
            row += 1;
        }
        row += 1;

        let w = 36;
        let x = self.front.width.saturating_sub(w) / 2;
        self.front.fill_rect(x, row, w, 1, PANEL_BG);
        let caret = if r.solved { "" } else { "▏" };
        let field = format!(" {}{caret}", r.input);
        self.front.put_str(x, row, &field, Color::White, PANEL_BG);
        row += 2;

        if r.solved {
            self.compose_done(row, "That's it! 🎉");
        } else if r.error_visible() {
            self.front.put_center(row, "That's not it, try again! 💭", BAD, Color::Reset);
        }
    }

    fn compose_slides(&mut self, index: usize, content: &JourneyContent) {
        let mid = BODY_ROW + self.front.height.saturating_sub(BODY_ROW + 2) / 2;
        self.front.put_center(mid.saturating_sub(3), "🎉 Bravo! 🎉", TITLE, Color::Reset);
        if let Some(caption) = content.slides.get(index) {
            self.front.put_center(mid, caption, TEXT, Color::Reset);
        }
        let dots: String = (0..content.slides.len())
            .map(|i| if i == index { "● " } else { "○ " })
            .collect();
        self.front.put_center(mid + 2, dots.trim_end(), ACCENT, Color::Reset);
        if index + 1 >= content.slides.len() {
            self.front.put_center(mid + 4, "Press ENTER for the last riddle", GOOD, Color::Reset);
        }
    }

    fn compose_key_location(&mut self, content: &JourneyContent) {
        let mut row = BODY_ROW + 2;
        self.front.put_center(row, &content.key_location.title, TITLE, Color::Reset);
        row += 2;
        for line in &content.key_location.lines {
            self.front.put_center(row, line, TEXT, Color::Reset);
            row += 1;
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Platformer
    // ══════════════════════════════════════════════════════════════

    fn compose_platformer(&mut self, scene: &SceneState, done: bool) {
        let cam = &scene.camera;
        let map_cols = cam.view_w * CELL_W;
        let x0 = self.front.width.saturating_sub(map_cols) / 2;

        // ── HUD ──
        let t = &scene.tracker;
        let hud = format!(
            " {}   ✨ {}/{}   💖 {}/{} ",
            scene.name, t.collected, t.total, t.hearts_collected, t.hearts_total,
        );
        self.front.put_str(x0, BODY_ROW, &hud, TEXT, PANEL_BG);

        // ── Map ──
        let map_row = BODY_ROW + 1;
        let player_cell = scene.player_cell();
        for vy in 0..cam.view_h {
            let row = map_row + vy;
            if row >= self.front.height {
                break;
            }
            for vx in 0..cam.view_w {
                let col = x0 + vx * CELL_W;
                let wx = cam.x + vx as i32;
                let wy = cam.y + vy as i32;
                if wx < 0 || wy < 0 || wx as usize >= scene.layers.width || wy as usize >= scene.layers.height {
                    continue;
                }
                let (gx, gy) = (wx as usize, wy as usize);
                if player_cell == Some((gx, gy)) {
                    self.compose_player(scene, col, row);
                } else {
                    self.compose_tile(scene, gx, gy, col, row);
                }
            }
        }

        // ── Messages: newest on top ──
        let msg_row = map_row + cam.view_h + 1;
        for (i, msg) in scene.overlay.messages().iter().rev().take(3).enumerate() {
            let row = msg_row + i;
            let (fg, bg) = tone_colors(msg.tone);
            let fg = if msg.freshness() < 0.25 { DIM } else { fg };
            let text = format!(" {} ", msg.text);
            self.front.put_str(x0, row, &text, fg, bg);
        }

        if scene.overlay.guide_visible && scene.phase == ScenePhase::Guide {
            self.compose_guide(x0, map_row, map_cols, cam.view_h);
        }
        if done {
            self.compose_done(msg_row + 3, "The meadow is yours! 🌸");
        }
    }

    fn compose_guide(&mut self, x0: usize, y0: usize, cols: usize, rows: usize) {
        let w = 52.min(cols.max(20));
        let h = GUIDE_LINES.len() + 2;
        let x = x0 + cols.saturating_sub(w) / 2;
        let y = y0 + rows.saturating_sub(h) / 2;
        self.front.fill_rect(x, y, w, h, PANEL_BG);
        for (i, line) in GUIDE_LINES.iter().enumerate() {
            let fg = if i == 0 { TITLE } else { TEXT };
            let lx = x + w.saturating_sub(str_width(line)) / 2;
            self.front.put_str(lx, y + 1 + i, line, fg, PANEL_BG);
        }
    }

    fn compose_player(&mut self, scene: &SceneState, col: usize, row: usize) {
        let Some(p) = scene.player.as_ref() else { return };
        let frame = p.sprite_frame();
        let sprite = match p.anim {
            AnimState::Idle => '🧍',
            AnimState::Walk if frame % 2 == 0 => '🚶',
            AnimState::Walk => '🏃',
            AnimState::Jump => '🤸',
            AnimState::Fall => '🙀',
            AnimState::Climb => '🧗',
            AnimState::Cheer if frame == 0 => '🙌',
            AnimState::Cheer => '🎉',
        };
        self.front.set(col, row, Cell::from_char_wide(sprite, Color::Reset, Color::Reset));
        self.front.set(col + 1, row, Cell::WIDE_CONT);
    }

    fn compose_tile(&mut self, scene: &SceneState, gx: usize, gy: usize, col: usize, row: usize) {
        let layers = &scene.layers;
        let wide = |s: &mut Self, ch: char| {
            s.front.set(col, row, Cell::from_char_wide(ch, Color::Reset, Color::Reset));
            s.front.set(col + 1, row, Cell::WIDE_CONT);
        };
        let (c0, c1, fg, bg) = match layers.zone_at(gx, gy) {
            Some(ZoneKind::Ground) => {
                // Grass-topped ground when nothing solid is above
                let top = gy == 0 || !layers.has(ZoneKind::Ground, gx, gy - 1);
                if top {
                    ('▀', '▀', Color::Rgb { r: 90, g: 200, b: 90 }, Color::Rgb { r: 120, g: 80, b: 50 })
                } else {
                    ('░', '░', Color::Rgb { r: 150, g: 105, b: 70 }, Color::Rgb { r: 110, g: 75, b: 45 })
                }
            }
            Some(ZoneKind::Item) => return wide(self, '✨'),
            Some(ZoneKind::HeartItem) => return wide(self, '💖'),
            Some(ZoneKind::Exit) => return wide(self, '🚪'),
            Some(ZoneKind::Ladder) => ('╠', '╣', Color::Rgb { r: 210, g: 170, b: 110 }, Color::Reset),
            Some(ZoneKind::Trap) => ('▲', '▲', BAD, Color::Reset),
            None if layers.decor.is_set(gx, gy) => ('"', '"', Color::Rgb { r: 80, g: 170, b: 80 }, Color::Reset),
            None => (' ', ' ', Color::Reset, Color::Reset),
        };
        self.front.set(col, row, Cell::from_char(c0, fg, bg));
        self.front.set(col + 1, row, Cell::from_char(c1, fg, bg));
    }
}

/// Hide part of an ASCII picture. `blur` runs from 0 (sharp) to
/// `MAX_BLUR` (nothing visible); each drawn character has a fixed
/// threshold so the picture sharpens steadily instead of flickering.
pub fn blur_picture(lines: &[String], blur: u32) -> Vec<String> {
    lines
        .iter()
        .enumerate()
        .map(|(r, line)| {
            line.chars()
                .enumerate()
                .map(|(c, ch)| {
                    if ch == ' ' {
                        return ' ';
                    }
                    let h = ((r as u32).wrapping_mul(31) ^ (c as u32).wrapping_mul(17))
                        .wrapping_mul(2_654_435_761)
                        >> 16;
                    if h % MAX_BLUR < blur { '░' } else { ch }
                })
                .collect()
        })
        .collect()
}
