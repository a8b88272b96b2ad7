//! Panels for the sync TUI

use chrono::{Local, Timelike};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, Paragraph};
use ratatui::Frame;
use std::collections::VecDeque;

use super::{Phase, Progress};

const LOG_CAPACITY: usize = 200;

/// Import steps in the order one feed walks through them
const PIPELINE: [(Phase, &str); 6] = [
    (Phase::InsertingLaunches, "launches"),
    (Phase::InsertingFairings, "fairings"),
    (Phase::LinkingFairings, "link"),
    (Phase::InsertingLinks, "links"),
    (Phase::LinkingLinks, "link"),
    (Phase::AddingToList, "list"),
];

fn bordered(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::Blue))
}

/// Current phase, the feed being synced and a step track for the import
pub struct StatusPanel {
    phase: Phase,
    feed: String,
}

impl StatusPanel {
    pub fn new() -> Self {
        Self {
            phase: Phase::Fetching,
            feed: String::new(),
        }
    }

    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub fn set_info(&mut self, info: impl Into<String>) {
        self.feed = info.into();
    }

    /// One span per pipeline step: done steps dim, the active one highlighted
    fn step_track(&self) -> Line<'static> {
        let active = PIPELINE.iter().position(|(p, _)| *p == self.phase);
        let mut spans = vec![Span::raw("   ")];

        for (i, (_, name)) in PIPELINE.iter().enumerate() {
            let style = match (active, self.phase) {
                (_, Phase::Complete) => Style::default().fg(Color::Green),
                (Some(a), _) if i < a => Style::default().fg(Color::Green),
                (Some(a), _) if i == a => Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
                _ => Style::default().fg(Color::DarkGray),
            };
            if i > 0 {
                spans.push(Span::styled(" > ", Style::default().fg(Color::DarkGray)));
            }
            spans.push(Span::styled(*name, style));
        }
        Line::from(spans)
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let (marker, color) = match self.phase {
            Phase::Complete => ("done", Color::Green),
            Phase::Fetching => ("http", Color::Cyan),
            _ => ("sql ", Color::Cyan),
        };
        let heading = Style::default().fg(color).add_modifier(Modifier::BOLD);

        let lines = vec![
            Line::from(vec![
                Span::styled(format!(" [{marker}] "), heading),
                Span::styled(self.phase.to_string(), heading),
                Span::styled(format!("  {}", self.feed), Style::default().fg(Color::Gray)),
            ]),
            Line::from(""),
            self.step_track(),
        ];

        frame.render_widget(Paragraph::new(lines).block(bordered(" Rocket Launches ")), area);
    }
}

/// Row counter for the table currently being written
pub struct ProgressPanel {
    progress: Option<Progress>,
}

impl ProgressPanel {
    pub fn new() -> Self {
        Self { progress: None }
    }

    pub fn set_progress(&mut self, progress: Progress) {
        self.progress = Some(progress);
    }

    pub fn clear(&mut self) {
        self.progress = None;
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::LEFT | Borders::RIGHT)
            .border_style(Style::default().fg(Color::Blue));

        let Some(progress) = &self.progress else {
            frame.render_widget(block, area);
            return;
        };

        let gauge = Gauge::default()
            .block(block)
            .gauge_style(Style::default().fg(Color::Cyan).bg(Color::DarkGray))
            .ratio(progress.ratio().min(1.0))
            .label(format!(
                "{}: {} of {} rows",
                progress.label, progress.current, progress.total
            ));
        frame.render_widget(gauge, area);
    }
}

/// Timestamped activity lines, newest at the bottom
pub struct LogPanel {
    entries: VecDeque<(String, String)>,
}

impl LogPanel {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(LOG_CAPACITY),
        }
    }

    pub fn add(&mut self, message: impl Into<String>) {
        if self.entries.len() == LOG_CAPACITY {
            self.entries.pop_front();
        }
        let now = Local::now();
        let stamp = format!("{:02}:{:02}:{:02}", now.hour(), now.minute(), now.second());
        self.entries.push_back((stamp, message.into()));
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let visible = area.height.saturating_sub(2) as usize;
        let skip = self.entries.len().saturating_sub(visible);

        let items: Vec<ListItem> = self
            .entries
            .iter()
            .skip(skip)
            .map(|(stamp, message)| {
                let color = if message.contains("failed") {
                    Color::Red
                } else {
                    Color::White
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!(" {stamp} "), Style::default().fg(Color::DarkGray)),
                    Span::styled(message.as_str(), Style::default().fg(color)),
                ]))
            })
            .collect();

        frame.render_widget(List::new(items).block(bordered(" Activity ")), area);
    }
}
