//! Progress reporting for sync and import runs.
//!
//! The import pipeline talks to a [`Ui`]: it announces each [`Phase`], the
//! feed being worked on, per-row progress and log lines. [`UiApp`] renders
//! that as a full-screen display; [`LogUi`] turns it into `tracing` events.

mod components;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout};
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use components::{LogPanel, ProgressPanel, StatusPanel};

/// Minimum time between redraws caused by progress ticks
const PROGRESS_REDRAW_INTERVAL: Duration = Duration::from_millis(50);

/// Steps of a sync, in the order one feed passes through them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Fetching,
    InsertingLaunches,
    InsertingFairings,
    LinkingFairings,
    InsertingLinks,
    LinkingLinks,
    AddingToList,
    Complete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Phase::Fetching => "Fetching launches",
            Phase::InsertingLaunches => "Inserting launches",
            Phase::InsertingFairings => "Inserting fairings",
            Phase::LinkingFairings => "Linking fairings",
            Phase::InsertingLinks => "Inserting links",
            Phase::LinkingLinks => "Linking links",
            Phase::AddingToList => "Adding launches to list",
            Phase::Complete => "Complete",
        };
        f.write_str(text)
    }
}

/// Rows done out of the rows in the current phase
#[derive(Debug, Clone, Default)]
pub struct Progress {
    pub current: u64,
    pub total: u64,
    pub label: String,
}

impl Progress {
    pub fn new(current: u64, total: u64, label: impl Into<String>) -> Self {
        Self {
            current,
            total,
            label: label.into(),
        }
    }

    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.current as f64 / self.total as f64
        }
    }

    pub fn is_done(&self) -> bool {
        self.current >= self.total
    }
}

pub trait Ui {
    fn set_phase(&mut self, phase: Phase);
    fn set_info(&mut self, info: impl Into<String>);
    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>);
    fn clear_progress(&mut self);
    fn log(&mut self, message: impl Into<String>);
}

/// Full-screen display used by `sync --tui`
pub struct UiApp {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    status: StatusPanel,
    progress: ProgressPanel,
    log: LogPanel,
    last_draw: Option<Instant>,
    on_screen: bool,
}

impl UiApp {
    /// Switch the terminal to raw mode on the alternate screen
    pub fn new() -> Result<Self> {
        terminal::enable_raw_mode()?;
        io::stdout().execute(EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

        Ok(Self {
            terminal,
            status: StatusPanel::new(),
            progress: ProgressPanel::new(),
            log: LogPanel::new(),
            last_draw: None,
            on_screen: true,
        })
    }

    fn draw(&mut self) -> Result<()> {
        let (status, progress, log) = (&self.status, &self.progress, &self.log);

        self.terminal.draw(|frame| {
            let [top, middle, bottom] = Layout::vertical([
                Constraint::Length(5),
                Constraint::Length(3),
                Constraint::Min(5),
            ])
            .areas(frame.area());

            status.render(frame, top);
            progress.render(frame, middle);
            log.render(frame, bottom);
        })?;

        self.last_draw = Some(Instant::now());
        Ok(())
    }

    /// Redraw unless the last frame is newer than the redraw interval
    fn draw_throttled(&mut self, force: bool) {
        let due = self
            .last_draw
            .map_or(true, |at| at.elapsed() >= PROGRESS_REDRAW_INTERVAL);
        if force || due {
            self.draw().ok();
        }
    }

    /// Show `summary`, wait for Enter, Esc or q, then leave the alternate screen
    pub fn finish(mut self, summary: &str) -> Result<()> {
        self.status.set_phase(Phase::Complete);
        self.progress.clear();
        self.log.add(summary);
        self.log.add("Press Enter to exit");
        self.draw()?;

        loop {
            if !event::poll(Duration::from_millis(100))? {
                continue;
            }
            if let Event::Key(key) = event::read()? {
                let exit = matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q'));
                if key.kind == KeyEventKind::Press && exit {
                    break;
                }
            }
        }

        self.restore()
    }

    /// Leave the alternate screen without waiting
    pub fn restore(mut self) -> Result<()> {
        self.leave_screen()
    }

    fn leave_screen(&mut self) -> Result<()> {
        if !self.on_screen {
            return Ok(());
        }
        self.on_screen = false;
        terminal::disable_raw_mode()?;
        self.terminal.backend_mut().execute(LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Ui for UiApp {
    fn set_phase(&mut self, phase: Phase) {
        self.status.set_phase(phase);
        self.draw_throttled(true);
    }

    fn set_info(&mut self, info: impl Into<String>) {
        self.status.set_info(info);
        self.draw_throttled(true);
    }

    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>) {
        let progress = Progress::new(current, total, label);
        let done = progress.is_done();
        self.progress.set_progress(progress);
        self.draw_throttled(done);
    }

    fn clear_progress(&mut self) {
        self.progress.clear();
        self.draw_throttled(true);
    }

    fn log(&mut self, message: impl Into<String>) {
        self.log.add(message);
        self.draw_throttled(true);
    }
}

impl Drop for UiApp {
    fn drop(&mut self) {
        self.leave_screen().ok();
    }
}

/// Sends phases and log lines to `tracing`
#[derive(Debug, Default)]
pub struct LogUi;

impl Ui for LogUi {
    fn set_phase(&mut self, phase: Phase) {
        tracing::debug!(%phase, "Phase");
    }

    fn set_info(&mut self, info: impl Into<String>) {
        tracing::info!("{}", info.into());
    }

    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>) {
        tracing::trace!(current, total, label = %label.into(), "Progress");
    }

    fn clear_progress(&mut self) {}

    fn log(&mut self, message: impl Into<String>) {
        tracing::info!("{}", message.into());
    }
}

/// Discards everything
#[derive(Debug, Default)]
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

/// Keeps what it is told so tests can assert on pipeline behaviour
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingUi {
    pub phases: Vec<Phase>,
    pub logs: Vec<String>,
    pub last_progress: Option<Progress>,
}

#[cfg(test)]
impl Ui for RecordingUi {
    fn set_phase(&mut self, phase: Phase) {
        self.phases.push(phase);
    }

    fn set_info(&mut self, _info: impl Into<String>) {}

    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>) {
        self.last_progress = Some(Progress::new(current, total, label));
    }

    fn clear_progress(&mut self) {
        self.last_progress = None;
    }

    fn log(&mut self, message: impl Into<String>) {
        self.logs.push(message.into());
    }
}
