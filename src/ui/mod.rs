//! Sync progress screen, table browser and the `Ui` trait the loader reports through

mod browser;
mod components;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::Terminal;
use std::io::{self, Stdout};
use tracing::{debug, info};

use components::{ActivityPanel, SyncPanel};

pub use browser::browse;

type Term = Terminal<CrosstermBackend<Stdout>>;

/// Stages of a sync, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Checking,
    Fetching,
    Flattening,
    Loading,
    Complete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Phase::Checking => "Checking cache",
            Phase::Fetching => "Fetching datasets",
            Phase::Flattening => "Flattening records",
            Phase::Loading => "Loading cached tables",
            Phase::Complete => "Complete",
        })
    }
}

/// Sink for sync progress; the loader never depends on how it is shown
pub trait Ui {
    fn set_phase(&mut self, phase: Phase);
    fn set_info(&mut self, info: impl Into<String>);
    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>);
    fn clear_progress(&mut self);
    fn log(&mut self, message: impl Into<String>);
}

fn enter_terminal() -> Result<Term> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn leave_terminal(terminal: &mut Term) -> Result<()> {
    terminal::disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Full-screen view of `sync --tui`
pub struct UiApp {
    terminal: Term,
    sync: SyncPanel,
    activity: ActivityPanel,
    restored: bool,
}

impl UiApp {
    pub fn new() -> Result<Self> {
        Ok(Self {
            terminal: enter_terminal()?,
            sync: SyncPanel::new(),
            activity: ActivityPanel::new(),
            restored: false,
        })
    }

    fn redraw(&mut self) {
        let sync = &self.sync;
        let activity = &self.activity;

        let drawn = self.terminal.draw(|frame| {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(SyncPanel::HEIGHT), Constraint::Min(3)])
                .split(frame.area());
            sync.render(frame, rows[0]);
            activity.render(frame, rows[1]);
        });
        if let Err(e) = drawn {
            debug!("redraw failed: {}", e);
        }
    }

    /// Show the summary, wait for a key, then give the terminal back
    pub fn finish(mut self, summary: &str) -> Result<()> {
        self.sync.set_phase(Phase::Complete);
        self.sync.clear_progress();
        for line in summary.lines() {
            self.activity.push(line);
        }
        self.activity.push("Press any key to exit");
        self.redraw();

        loop {
            if let CrosstermEvent::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Release {
                    break;
                }
            }
        }

        self.restore()
    }

    /// Give the terminal back immediately
    pub fn restore(mut self) -> Result<()> {
        self.restored = true;
        leave_terminal(&mut self.terminal)
    }
}

impl Ui for UiApp {
    fn set_phase(&mut self, phase: Phase) {
        self.sync.set_phase(phase);
        self.redraw();
    }

    fn set_info(&mut self, info: impl Into<String>) {
        self.sync.set_info(info);
        self.redraw();
    }

    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>) {
        self.sync.set_progress(current, total, label);
        self.redraw();
    }

    fn clear_progress(&mut self) {
        self.sync.clear_progress();
        self.redraw();
    }

    fn log(&mut self, message: impl Into<String>) {
        self.activity.push(message);
        self.redraw();
    }
}

impl Drop for UiApp {
    fn drop(&mut self) {
        if !self.restored {
            leave_terminal(&mut self.terminal).ok();
        }
    }
}

/// Silent UI implementation for testing and non-interactive use
#[derive(Default)]
pub struct SilentUi;

impl SilentUi {
    pub fn new() -> Self {
        Self
    }
}

impl Ui for SilentUi {
    fn set_phase(&mut self, _phase: Phase) {}
    fn set_info(&mut self, _info: impl Into<String>) {}
    fn set_progress(&mut self, _current: u64, _total: u64, _label: impl Into<String>) {}
    fn clear_progress(&mut self) {}
    fn log(&mut self, _message: impl Into<String>) {}
}

/// UI that reports through `tracing`, for runs without a terminal
#[derive(Default)]
pub struct LogUi;

impl Ui for LogUi {
    fn set_phase(&mut self, phase: Phase) {
        debug!("phase: {}", phase);
    }

    fn set_info(&mut self, info: impl Into<String>) {
        info!("{}", info.into());
    }

    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>) {
        debug!("{} ({}/{})", label.into(), current, total);
    }

    fn clear_progress(&mut self) {}

    fn log(&mut self, message: impl Into<String>) {
        info!("{}", message.into());
    }
}
