//! PortDive TUI Dashboard Module
//! ==============================
//!
//! Keystroke front-end for a single game. Uses Ratatui for rendering and
//! Crossbeam for event delivery.
//!
//! Enable with the `dashboard` feature flag.
//!
//! Threads:
//! - a reader thread polls crossterm and forwards key presses
//! - the owning thread selects between key presses and a tick channel, so
//!   every mutation of the game happens in one place

use std::collections::VecDeque;
use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table},
    Frame, Terminal,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::controls::Cursor;
use crate::error::GameError;
use crate::game::{ActionOutcome, Game, GameStatus};
use crate::matrix::RowStatus;
use crate::pwner::ElementStatus;

/// How long the reader thread blocks in one poll.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Feedback lines kept on screen.
const MESSAGE_HISTORY: usize = 4;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("terminal error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Game(#[from] GameError),
}

/// What the loop should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

// =============================================================================
// KEY READER
// =============================================================================

/// Forwards key presses until `finish` fires or the receiver goes away.
fn spawn_key_reader(
    keys: Sender<KeyEvent>,
    finish: Receiver<()>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("portdive-keys".to_string())
        .spawn(move || loop {
            match finish.try_recv() {
                Ok(()) | Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => {}
            }

            match event::poll(POLL_INTERVAL) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                        if keys.send(key).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("key reader stopped: {}", e);
                        break;
                    }
                },
                Ok(false) => {}
                Err(e) => {
                    warn!("key reader stopped: {}", e);
                    break;
                }
            }
        })
}

// =============================================================================
// GAME DASHBOARD
// =============================================================================

/// TUI for playing one game with the keyboard.
pub struct GameDashboard {
    game: Game,
    cursor: Cursor,
    tick_interval: Duration,
    messages: VecDeque<String>,
}

impl GameDashboard {
    pub fn new(game: Game, tick_interval: Duration) -> Self {
        Self {
            game,
            cursor: Cursor::new(),
            tick_interval,
            messages: VecDeque::with_capacity(MESSAGE_HISTORY),
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(String::as_str)
    }

    /// Run the TUI main loop (blocks until 'q' pressed)
    pub fn run(&mut self) -> Result<GameStatus, DashboardError> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let (key_tx, key_rx) = channel::unbounded();
        let (finish_tx, finish_rx) = channel::bounded(0);
        let reader = spawn_key_reader(key_tx, finish_rx)?;

        let result = self.event_loop(&mut terminal, &key_rx);

        // Rendezvous with the reader; fails harmlessly if it already exited
        let _ = finish_tx.send(());
        if reader.join().is_err() {
            warn!("key reader panicked");
        }

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result.map(|()| self.game.status())
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        keys: &Receiver<KeyEvent>,
    ) -> Result<(), DashboardError> {
        let ticker = channel::tick(self.tick_interval);

        loop {
            terminal.draw(|f| self.ui(f))?;

            crossbeam::select! {
                recv(keys) -> key => match key {
                    Ok(key) => {
                        if self.handle_key(key.code)? == Control::Quit {
                            return Ok(());
                        }
                    }
                    Err(_) => return Ok(()),
                },
                recv(ticker) -> _ => self.on_tick()?,
            }
        }
    }

    /// Advances the game by one tick.
    pub fn on_tick(&mut self) -> Result<(), GameError> {
        self.game.tick()?;
        Ok(())
    }

    /// Applies one key press.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<Control, GameError> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(Control::Quit),
            KeyCode::Up | KeyCode::Char('k') => self.cursor.move_up(),
            KeyCode::Down | KeyCode::Char('j') => self.cursor.move_down(&self.game),
            KeyCode::Left | KeyCode::Char('h') => self.cursor.move_left(),
            KeyCode::Right | KeyCode::Char('l') => self.cursor.move_right(&self.game),
            KeyCode::Enter => {
                let outcome = self.cursor.commit_row(&mut self.game);
                self.report(outcome)?;
            }
            KeyCode::Char(' ') | KeyCode::Char('p') => {
                let outcome = self.cursor.commit_column(&mut self.game);
                self.report(outcome)?;
            }
            KeyCode::Char('r') if self.game.status().is_over() => {
                self.game.restart()?;
                self.cursor = Cursor::new();
                self.push_message("New session started.".to_string());
            }
            other => debug!(?other, "unbound key"),
        }
        Ok(Control::Continue)
    }

    fn report(&mut self, outcome: Result<ActionOutcome, GameError>) -> Result<(), GameError> {
        match outcome {
            Ok(outcome) => self.push_message(outcome.message()),
            Err(e @ GameError::IndexOutOfRange { .. }) => self.push_message(e.to_string()),
            Err(e) => return Err(e),
        }
        Ok(())
    }

    fn push_message(&mut self, message: String) {
        if self.messages.len() == MESSAGE_HISTORY {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    /// Render the UI
    fn ui(&self, f: &mut Frame) {
        let snapshot = self.game.snapshot();
        let matrix_panel = matrix_height(snapshot.rows.len());

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3),                                 // Header
                Constraint::Length(matrix_panel),                      // Matrix
                Constraint::Length(3),                                 // Pwner
                Constraint::Min(3),                                    // Messages
                Constraint::Length(1),                                 // Footer
            ])
            .split(f.area());

        // === HEADER ===
        let (status_text, status_color) = match snapshot.status {
            GameStatus::InProgress => ("IN PROGRESS", Color::Cyan),
            GameStatus::Won => ("ACCESS GRANTED", Color::Green),
            GameStatus::Lost => ("LOCKED OUT", Color::Red),
        };
        let header = Paragraph::new(Line::from(vec![
            Span::styled("PortDive", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  |  "),
            Span::styled(
                status_text,
                Style::default().fg(status_color).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  |  "),
            Span::raw(format!("Tick: {}", snapshot.tick)),
        ]))
        .block(Block::default().borders(Borders::BOTTOM));
        f.render_widget(header, chunks[0]);

        // === PORT MATRIX ===
        let columns = snapshot.pwner.len();
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let header_cells = std::iter::once(Span::styled("#", bold))
            .chain((0..columns).map(|j| Span::styled(format!("c{j}"), bold)));
        let header = Row::new(header_cells.collect::<Vec<_>>()).height(1);

        let rows: Vec<Row> = snapshot
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let mut style = match row.status {
                    RowStatus::Active => Style::default().fg(Color::Green),
                    RowStatus::Inactive => Style::default().fg(Color::DarkGray),
                };
                if i == self.cursor.row {
                    style = style.fg(Color::Magenta).add_modifier(Modifier::BOLD);
                }
                let cells = std::iter::once(format!("{i}"))
                    .chain(row.fragments.iter().map(|f| f.to_string()))
                    .map(Span::raw)
                    .collect::<Vec<_>>();
                Row::new(cells).style(style)
            })
            .collect();

        let widths = std::iter::once(Constraint::Length(4))
            .chain((0..columns).map(|_| Constraint::Length(6)))
            .collect::<Vec<_>>();
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().title("Port Matrix").borders(Borders::ALL));
        f.render_widget(table, chunks[1]);

        // === PWNER ===
        let spans: Vec<Span> = snapshot
            .pwner
            .iter()
            .enumerate()
            .flat_map(|(j, element)| {
                let mut style = match element.status {
                    ElementStatus::Active => Style::default().fg(Color::Green),
                    ElementStatus::Inactive => Style::default().fg(Color::DarkGray),
                    ElementStatus::Chosen => Style::default().fg(Color::Yellow),
                };
                if j == self.cursor.column {
                    style = style.fg(Color::Magenta).add_modifier(Modifier::BOLD);
                }
                [Span::styled(format!("{:>5}", element.fragment), style), Span::raw(" ")]
            })
            .collect();
        let pwner = Paragraph::new(Line::from(spans))
            .block(Block::default().title("Pwner").borders(Borders::ALL));
        f.render_widget(pwner, chunks[2]);

        // === MESSAGES ===
        let lines: Vec<Line> = self.messages.iter().map(|m| Line::from(m.as_str())).collect();
        let messages = Paragraph::new(lines)
            .block(Block::default().title("Log").borders(Borders::ALL));
        f.render_widget(messages, chunks[3]);

        // === FOOTER ===
        let help = if snapshot.status.is_over() {
            "r: restart  q: quit"
        } else {
            "arrows/hjkl: move  Enter: commit row  Space/p: lock column  q: quit"
        };
        let footer = Paragraph::new(help).style(Style::default().fg(Color::DarkGray));
        f.render_widget(footer, chunks[4]);
    }
}

// =============================================================================
// TESTS
// =============================================================================

/// Matrix panel height: one line per row plus header and borders.
fn matrix_height(rows: usize) -> u16 {
    u16::try_from(rows).unwrap_or(u16::MAX).saturating_add(3)
}
