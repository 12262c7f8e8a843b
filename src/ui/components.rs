//! Panels drawn by the sync screen and the table browser

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph};
use ratatui::Frame;
use std::collections::VecDeque;

use super::Phase;
use crate::writer::Table;

const ACCENT: Color = Color::Red;
const ACTIVITY_LIMIT: usize = 100;

fn panel(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(ACCENT))
}

/// Phase, info line and dataset gauge of a running sync
pub struct SyncPanel {
    phase: Phase,
    info: String,
    /// datasets done, datasets requested, last dataset
    progress: Option<(u64, u64, String)>,
}

impl SyncPanel {
    /// Rows taken including borders
    pub const HEIGHT: u16 = 5;

    pub fn new() -> Self {
        Self {
            phase: Phase::Checking,
            info: String::new(),
            progress: None,
        }
    }

    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub fn set_info(&mut self, info: impl Into<String>) {
        self.info = info.into();
    }

    pub fn set_progress(&mut self, done: u64, total: u64, label: impl Into<String>) {
        self.progress = Some((done, total, label.into()));
    }

    pub fn clear_progress(&mut self) {
        self.progress = None;
    }

    fn ratio(&self) -> f64 {
        match &self.progress {
            Some((done, total, _)) if *total > 0 => (*done as f64 / *total as f64).min(1.0),
            _ => 0.0,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = panel(" PADherder cache ");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Length(1)])
            .split(inner);

        let color = if self.phase == Phase::Complete {
            Color::Green
        } else {
            Color::Cyan
        };
        let phase = Span::styled(
            format!(" {}", self.phase),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        );
        frame.render_widget(Paragraph::new(Line::from(phase)), rows[0]);
        frame.render_widget(
            Paragraph::new(Span::styled(format!(" {}", self.info), Style::default().fg(Color::Gray))),
            rows[1],
        );

        if let Some((done, total, label)) = &self.progress {
            let gauge = Gauge::default()
                .gauge_style(Style::default().fg(Color::Cyan).bg(Color::DarkGray))
                .ratio(self.ratio())
                .label(format!("{} ({}/{})", label, done, total));
            frame.render_widget(gauge, rows[2]);
        }
    }
}

/// Most recent activity lines, newest at the bottom
pub struct ActivityPanel {
    lines: VecDeque<String>,
}

impl ActivityPanel {
    pub fn new() -> Self {
        Self {
            lines: VecDeque::with_capacity(ACTIVITY_LIMIT),
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() == ACTIVITY_LIMIT {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let visible = area.height.saturating_sub(2) as usize;
        let skip = self.lines.len().saturating_sub(visible);
        let newest = self.lines.len().saturating_sub(1);

        let items: Vec<ListItem> = self
            .lines
            .iter()
            .enumerate()
            .skip(skip)
            .map(|(i, line)| {
                let color = if i == newest { Color::White } else { Color::DarkGray };
                ListItem::new(Span::styled(format!(" {}", line), Style::default().fg(color)))
            })
            .collect();

        frame.render_widget(List::new(items).block(panel(" Activity ")), area);
    }
}

/// Left panel of the browser: one line per cached table
pub struct TableListPanel {
    selected: usize,
}

impl TableListPanel {
    pub fn new() -> Self {
        Self { selected: 0 }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn next(&mut self, count: usize) {
        if count > 0 {
            self.selected = (self.selected + 1) % count;
        }
    }

    pub fn previous(&mut self, count: usize) {
        if count > 0 {
            self.selected = (self.selected + count - 1) % count;
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, tables: &[&Table]) {
        let block = panel(" Tables ");

        let items: Vec<ListItem> = tables
            .iter()
            .map(|table| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:<24}", table.name()), Style::default().fg(Color::White)),
                    Span::styled(
                        format!("{:>6} rows  {:>4} B", table.len(), table.schema().record_size()),
                        Style::default().fg(Color::Gray),
                    ),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .highlight_symbol("> ");

        let mut state = ListState::default().with_selected(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }
}

/// Right panel of the browser: fields and leading rows of one table
pub struct TableDetailPanel {
    preview_rows: usize,
}

impl TableDetailPanel {
    pub fn new(preview_rows: usize) -> Self {
        Self { preview_rows }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, table: &Table) {
        let title = format!(" {} ", table.name());
        let block = panel(&title);

        let header_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
        let mut lines = vec![Line::from(Span::styled("Fields", header_style))];

        for field in table.schema().fields {
            lines.push(Line::from(vec![
                Span::raw(format!("  {:<16}", field.name)),
                Span::styled(field.field_type.to_string(), Style::default().fg(Color::Gray)),
            ]));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("First {} of {} rows", self.preview_rows.min(table.len()), table.len()),
            header_style,
        )));

        for (index, row) in table.rows().take(self.preview_rows).enumerate() {
            let cells: Vec<String> = row.iter().map(|cell| cell.to_string()).collect();
            lines.push(Line::from(vec![
                Span::styled(format!("{:>5} ", index), Style::default().fg(Color::DarkGray)),
                Span::raw(cells.join(" | ")),
            ]));
        }

        let paragraph = Paragraph::new(lines).block(block);
        frame.render_widget(paragraph, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_selection_wraps() {
        let mut panel = TableListPanel::new();
        panel.previous(3);
        assert_eq!(panel.selected(), 2);
        panel.next(3);
        assert_eq!(panel.selected(), 0);
        panel.next(0);
        assert_eq!(panel.selected(), 0);
    }

    #[test]
    fn test_activity_keeps_recent_lines() {
        let mut activity = ActivityPanel::new();
        for i in 0..150 {
            activity.push(format!("line {}", i));
        }
        assert_eq!(activity.lines.len(), ACTIVITY_LIMIT);
        assert_eq!(activity.lines.front().map(String::as_str), Some("line 50"));
    }

    #[test]
    fn test_sync_progress_ratio() {
        let mut sync = SyncPanel::new();
        assert_eq!(sync.ratio(), 0.0);
        sync.set_progress(1, 4, "awakenings");
        assert_eq!(sync.ratio(), 0.25);
        sync.set_progress(3, 0, "monsters");
        assert_eq!(sync.ratio(), 0.0);
        sync.clear_progress();
        assert!(sync.progress.is_none());
    }
}
