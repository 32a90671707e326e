//! Terminal UI rendering with ratatui

use crate::keys::{KeyMapper, MenuScreen};
use blockfall::game::{GamePhase, Renderer, Snapshot};
use blockfall::settings::Control;
use blockfall::tetromino::ColorId;
use blockfall::{Cell, Piece, FIELD_COLS, FIELD_ROWS, MAX_LEVEL};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};
use std::io;

const EMPTY: &str = "  ";
const BLOCK: &str = "██";
const GHOST: &str = "░░";

/// Field (10*2 + 2 for borders) + side panel
const GAME_WIDTH: u16 = 40;
/// Field rows + 2 for borders
const GAME_HEIGHT: u16 = FIELD_ROWS as u16 + 2;

/// Terminal color for a tetromino color
pub fn color(color: ColorId) -> Color {
    match color {
        ColorId::LightBlue => Color::Cyan,
        ColorId::Blue => Color::Blue,
        ColorId::Orange => Color::LightRed,
        ColorId::Yellow => Color::Yellow,
        ColorId::Green => Color::Green,
        ColorId::Purple => Color::Magenta,
        ColorId::Red => Color::Red,
    }
}

/// Extra state the frame needs beyond the game snapshot
pub struct View {
    pub menu_level: u32,
    pub screen: MenuScreen,
    /// (keys, label) for every control
    pub hints: Vec<(String, &'static str)>,
}

impl View {
    pub fn new(keys: &KeyMapper) -> Self {
        let hints = Control::all()
            .into_iter()
            .map(|control| (keys.describe(control), control.label()))
            .collect();
        Self {
            menu_level: keys.menu_level(),
            screen: keys.screen(),
            hints,
        }
    }
}

/// Draws snapshots onto a ratatui terminal
pub struct TerminalRenderer<'a, B: Backend> {
    terminal: &'a mut Terminal<B>,
    pub view: View,
}

impl<'a, B: Backend> TerminalRenderer<'a, B> {
    pub fn new(terminal: &'a mut Terminal<B>, view: View) -> Self {
        Self { terminal, view }
    }
}

impl<B: Backend> Renderer for TerminalRenderer<'_, B> {
    fn render(&mut self, snapshot: &Snapshot<'_>) -> io::Result<()> {
        let view = &self.view;
        self.terminal.draw(|frame| render_game(frame, snapshot, view))?;
        Ok(())
    }
}

pub fn render_game(frame: &mut Frame, snapshot: &Snapshot<'_>, view: &View) {
    let area = frame.area();

    if snapshot.phase == GamePhase::Menu {
        match view.screen {
            MenuScreen::Levels => render_menu(frame, area, snapshot, view),
            MenuScreen::Controls { selected, rebinding } => {
                render_controls(frame, area, view, selected, rebinding)
            }
        }
        return;
    }

    let game_area = center_rect(area, GAME_WIDTH, GAME_HEIGHT);

    // Field | next + stats
    let main_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(FIELD_COLS as u16 * 2 + 2),
            Constraint::Length(GAME_WIDTH - (FIELD_COLS as u16 * 2 + 2)),
        ])
        .split(game_area);

    render_field(frame, main_layout[0], snapshot);

    let right_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(6)])
        .split(main_layout[1]);

    render_next(frame, right_layout[0], snapshot.next);
    render_stats(frame, right_layout[1], snapshot);

    match snapshot.phase {
        GamePhase::Paused => render_overlay(
            frame,
            area,
            "PAUSED",
            &[
                format!("Score {}", snapshot.score),
                "P resume  R restart".to_string(),
                "M menu".to_string(),
            ],
        ),
        GamePhase::GameOver => render_overlay(
            frame,
            area,
            "GAME OVER",
            &[
                format!("Score {}", snapshot.score),
                format!("Best  {}", snapshot.high_score),
                "R retry  M menu".to_string(),
            ],
        ),
        GamePhase::Menu | GamePhase::Playing | GamePhase::RowClearing => {}
    }
}

/// Center a rect within another rect
fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Level list and control hints
fn render_menu(frame: &mut Frame, area: Rect, snapshot: &Snapshot<'_>, view: &View) {
    let menu_area = center_rect(area, 36, 17 + view.hints.len() as u16);

    let block = Block::default()
        .title(" BLOCKFALL ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));
    let inner = block.inner(menu_area);
    frame.render_widget(block, menu_area);

    let mut lines = vec![
        Line::raw(""),
        Line::styled("SELECT LEVEL", Style::default().fg(Color::Cyan).bold()),
        Line::raw(""),
    ];

    // Show a window of levels around the selection
    let first = view.menu_level.saturating_sub(2).min(MAX_LEVEL.saturating_sub(5));
    for level in first..(first + 5).min(MAX_LEVEL) {
        let selected = level == view.menu_level;
        let prefix = if selected { "▶ " } else { "  " };
        let style = if selected {
            Style::default().fg(Color::Yellow).bold()
        } else {
            Style::default().fg(Color::Gray)
        };
        lines.push(Line::styled(format!("{}Level {:>2}", prefix, level), style));
    }

    lines.push(Line::raw(""));
    lines.push(Line::styled(
        format!("High score {}", snapshot.high_score),
        Style::default().fg(Color::Green),
    ));
    lines.push(Line::raw(""));
    for (keys, label) in &view.hints {
        lines.push(Line::styled(
            format!("{:<12}{:>10}", label, keys),
            Style::default().fg(Color::DarkGray),
        ));
    }
    lines.push(Line::styled(
        "Up/Down choose  Enter start",
        Style::default().fg(Color::DarkGray),
    ));
    lines.push(Line::styled("Tab controls", Style::default().fg(Color::DarkGray)));

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

/// Binding list with a restore-defaults row at the end
fn render_controls(frame: &mut Frame, area: Rect, view: &View, selected: usize, rebinding: bool) {
    let menu_area = center_rect(area, 36, view.hints.len() as u16 + 10);

    let block = Block::default()
        .title(" CONTROLS ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));
    let inner = block.inner(menu_area);
    frame.render_widget(block, menu_area);

    let row_style = |is_selected: bool| {
        if is_selected {
            Style::default().fg(Color::Yellow).bold()
        } else {
            Style::default().fg(Color::Gray)
        }
    };

    let mut lines = vec![Line::raw("")];
    for (i, (keys, label)) in view.hints.iter().enumerate() {
        let is_selected = i == selected;
        let prefix = if is_selected { "▶ " } else { "  " };
        let keys = if is_selected && rebinding {
            "press a key"
        } else {
            keys.as_str()
        };
        lines.push(Line::styled(
            format!("{}{:<12}{:>12}", prefix, label, keys),
            row_style(is_selected),
        ));
    }

    let restore_selected = selected == view.hints.len();
    lines.push(Line::raw(""));
    lines.push(Line::styled(
        format!("{}Restore defaults", if restore_selected { "▶ " } else { "  " }),
        row_style(restore_selected),
    ));
    lines.push(Line::raw(""));
    let hint = if rebinding {
        "Esc cancel"
    } else {
        "Enter rebind  Esc back"
    };
    lines.push(Line::styled(hint, Style::default().fg(Color::DarkGray)));

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

/// Render the next piece box
fn render_next(frame: &mut Frame, area: Rect, next: Option<&Piece>) {
    let block = Block::default()
        .title(" NEXT ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(piece) = next else {
        return;
    };
    let style = Style::default().fg(color(piece.color()));
    let lines: Vec<Line> = piece
        .matrix
        .preview_rows()
        .map(|row| {
            Line::from(
                row.iter()
                    .map(|&filled| Span::styled(if filled { BLOCK } else { EMPTY }, style))
                    .collect::<Vec<_>>(),
            )
        })
        .collect();
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

/// Render the field with the current piece and its landing ghost
fn render_field(frame: &mut Frame, area: Rect, snapshot: &Snapshot<'_>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let ghost = snapshot
        .current
        .zip(snapshot.landing_row)
        .map(|(piece, row)| piece.at(piece.col, row));

    let mut lines: Vec<Line> = Vec::with_capacity(FIELD_ROWS);
    for row in 0..FIELD_ROWS as i32 {
        let clearing = snapshot.clearing_rows.contains(&(row as usize));
        let mut spans = Vec::with_capacity(FIELD_COLS);

        for col in 0..FIELD_COLS as i32 {
            let on = |piece: Option<&Piece>| {
                piece
                    .filter(|p| p.cells().any(|cell| cell == (row, col)))
                    .map(|p| color(p.color()))
            };

            let (text, style) = if let Some(c) = on(snapshot.current) {
                (BLOCK, Style::default().fg(c))
            } else if let Some(c) = on(ghost.as_ref()) {
                (GHOST, Style::default().fg(c).dim())
            } else {
                match snapshot.field.get(row, col) {
                    Some(Cell::Filled(_)) if clearing => (BLOCK, Style::default().fg(Color::White)),
                    Some(Cell::Filled(c)) => (BLOCK, Style::default().fg(color(c))),
                    _ => (EMPTY, Style::default()),
                }
            };
            spans.push(Span::styled(text, style));
        }
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Render stats panel
fn render_stats(frame: &mut Frame, area: Rect, snapshot: &Snapshot<'_>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let stat = |label: &'static str, value: String, style: Style| {
        [
            Line::from(Span::styled(label, Style::default().fg(Color::Gray))),
            Line::from(Span::styled(value, style)),
            Line::raw(""),
        ]
    };

    let lines: Vec<Line> = [
        stat("SCORE", snapshot.score.to_string(), Style::default().fg(Color::Yellow).bold()),
        stat("HIGH SCORE", snapshot.high_score.to_string(), Style::default().fg(Color::Yellow)),
        stat("LEVEL", snapshot.level.to_string(), Style::default().fg(Color::Cyan)),
        stat("ROWS", snapshot.cleared_rows.to_string(), Style::default().fg(Color::Green)),
    ]
    .into_iter()
    .flatten()
    .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Render an overlay (for pause/game over)
fn render_overlay(frame: &mut Frame, area: Rect, title: &str, body: &[String]) {
    let popup_area = center_rect(area, 26, body.len() as u16 + 4);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let mut text = vec![
        Line::styled(title, Style::default().fg(Color::Yellow).bold()),
        Line::raw(""),
    ];
    text.extend(
        body.iter()
            .map(|line| Line::styled(line.as_str(), Style::default().fg(Color::Gray))),
    );

    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), inner);
}
