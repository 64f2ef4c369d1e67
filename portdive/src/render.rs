//! Line-mode front-ends: a colored text view and a JSON-lines stream.

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor, Stylize},
    terminal::{Clear, ClearType},
};
use portdive_core::{ElementStatus, Frontend, GameSnapshot, GameStatus, RowStatus};
use serde::Serialize;
use std::io::{self, Write};
use tracing::warn;

const PROMPT: &str = "Enter 'p <column>' to lock a pwner fragment or 'd <row>' to dive into a port.";

/// Colored text view, redrawn after every transition.
pub struct TextFrontend<W: Write + Send> {
    out: W,
    /// Clear the screen before each frame
    clear: bool,
}

impl<W: Write + Send> TextFrontend<W> {
    pub fn new(out: W, clear: bool) -> Self {
        Self { out, clear }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw(&mut self, snapshot: &GameSnapshot, messages: &[String]) -> io::Result<()> {
        if self.clear {
            queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        }

        let status = match snapshot.status {
            GameStatus::InProgress => "IN PROGRESS".cyan(),
            GameStatus::Won => "ACCESS GRANTED".green(),
            GameStatus::Lost => "LOCKED OUT".red(),
        };
        writeln!(self.out, "{}  tick {}  [{}]", "PortDive".bold(), snapshot.tick, status)?;
        writeln!(self.out)?;

        write!(self.out, "{:>4}", "#")?;
        for j in 0..snapshot.pwner.len() {
            write!(self.out, "{:>6}", format!("c{j}"))?;
        }
        writeln!(self.out)?;

        for (i, row) in snapshot.rows.iter().enumerate() {
            let color = match row.status {
                RowStatus::Active => Color::Green,
                RowStatus::Inactive => Color::DarkGrey,
            };
            queue!(self.out, SetForegroundColor(color), Print(format!("{i:>4}")))?;
            for fragment in &row.fragments {
                queue!(self.out, Print(format!("{fragment:>6}")))?;
            }
            queue!(self.out, ResetColor, Print("\n"))?;
        }
        writeln!(self.out)?;

        write!(self.out, "{:>4}", "pwn")?;
        for element in &snapshot.pwner {
            let color = match element.status {
                ElementStatus::Active => Color::Green,
                ElementStatus::Inactive => Color::DarkGrey,
                ElementStatus::Chosen => Color::Yellow,
            };
            queue!(
                self.out,
                SetForegroundColor(color),
                Print(format!("{:>6}", element.fragment)),
                ResetColor
            )?;
        }
        writeln!(self.out)?;
        writeln!(self.out)?;

        for message in messages {
            writeln!(self.out, "> {message}")?;
        }
        if !snapshot.status.is_over() {
            writeln!(self.out, "{}", PROMPT.dark_grey())?;
        }
        self.out.flush()
    }
}

impl<W: Write + Send> Frontend for TextFrontend<W> {
    fn render(&mut self, snapshot: &GameSnapshot, messages: &[String]) {
        if let Err(e) = self.draw(snapshot, messages) {
            warn!("failed to draw frame: {}", e);
        }
    }
}

/// One JSON object per transition, for scripting against the game.
pub struct JsonFrontend<W: Write + Send> {
    out: W,
}

#[derive(Serialize)]
struct JsonFrame<'a> {
    #[serde(flatten)]
    snapshot: &'a GameSnapshot,
    messages: &'a [String],
}

impl<W: Write + Send> JsonFrontend<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, snapshot: &GameSnapshot, messages: &[String]) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, &JsonFrame { snapshot, messages })?;
        writeln!(self.out)?;
        self.out.flush()
    }
}

impl<W: Write + Send> Frontend for JsonFrontend<W> {
    fn render(&mut self, snapshot: &GameSnapshot, messages: &[String]) {
        if let Err(e) = self.emit(snapshot, messages) {
            warn!("failed to emit frame: {}", e);
        }
    }
}
