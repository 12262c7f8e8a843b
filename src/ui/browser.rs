use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind};
use ratatui::layout::{Constraint, Direction, Layout};

use super::components::{TableDetailPanel, TableListPanel};
use super::{enter_terminal, leave_terminal, Term};
use crate::loader::DataDict;
use crate::writer::Table;

const PREVIEW_ROWS: usize = 20;

/// Show the loaded tables until the user quits with `q` or Esc
pub fn browse(data: &DataDict) -> Result<()> {
    let tables: Vec<&Table> = data.values().collect();
    let mut terminal = enter_terminal()?;
    let result = run(&mut terminal, &tables);
    leave_terminal(&mut terminal)?;
    result
}

fn run(terminal: &mut Term, tables: &[&Table]) -> Result<()> {
    let mut list = TableListPanel::new();
    let detail = TableDetailPanel::new(PREVIEW_ROWS);

    loop {
        terminal.draw(|frame| {
            let chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
                .split(frame.area());

            list.render(frame, chunks[0], tables);
            if let Some(table) = tables.get(list.selected()) {
                detail.render(frame, chunks[1], table);
            }
        })?;

        if let CrosstermEvent::Key(KeyEvent { code, kind, .. }) = event::read()? {
            if kind == KeyEventKind::Release {
                continue;
            }
            match code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Down | KeyCode::Char('j') => list.next(tables.len()),
                KeyCode::Up | KeyCode::Char('k') => list.previous(tables.len()),
                _ => {}
            }
        }
    }

    Ok(())
}
