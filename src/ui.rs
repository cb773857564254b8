#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use crate::app::{App, Snapshot};
use crate::components::RunState;
use crate::config;
use crate::game::{BOARD_HEIGHT, BOARD_WIDTH};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};

// Each cell is 2 characters wide and 1 tall to look roughly square
const CELL_WIDTH: u16 = 2;

pub fn render(f: &mut Frame, app: &mut App, high_score: u32) {
    let board_width = BOARD_WIDTH as u16 * CELL_WIDTH + 2; // +2 for borders
    let board_height = BOARD_HEIGHT as u16 + 2;
    let min_info_width = 20u16;
    let min_total_width = board_width + min_info_width;
    let min_total_height = board_height + 3;

    if f.area().width < min_total_width || f.area().height < min_total_height {
        let warning = Paragraph::new(
            "Terminal too small!\nPlease resize your terminal\nto continue playing.",
        )
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Gridfall"));

        let warning_area = centered_rect(50, 30, f.area());
        f.render_widget(warning, warning_area);
        return;
    }

    let snapshot = app.snapshot();

    let main_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(board_width), Constraint::Min(min_info_width)])
        .split(f.area());

    let game_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),            // Title
            Constraint::Length(board_height), // Game board
            Constraint::Fill(1),
        ])
        .split(main_layout[0]);

    let info_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),  // Title
            Constraint::Length(6),  // Stats
            Constraint::Length(8),  // Next piece preview
            Constraint::Min(8),     // Controls
        ])
        .split(main_layout[1]);

    let title = Paragraph::new("GRIDFALL")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(title, game_layout[0]);

    render_board(f, &snapshot, game_layout[1]);

    let info_title = Paragraph::new("INFO")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(info_title, info_layout[0]);

    let stats = format!(
        "Score: {}\nLevel: {}\nLines: {}\nBest: {}",
        snapshot.score, snapshot.level, snapshot.lines_cleared, high_score,
    );
    let stats_widget = Paragraph::new(stats)
        .block(Block::default().borders(Borders::NONE))
        .wrap(Wrap { trim: true });
    f.render_widget(stats_widget, info_layout[1]);

    render_next_preview(f, &snapshot, info_layout[2]);

    let controls = Paragraph::new(
        "Controls:\n\
        ←/→: Move left/right\n\
        ↑: Rotate\n\
        ↓: Soft drop\n\
        Space: Hard drop\n\
        P: Pause  R: Reset\n\
        M: Sound  Q: Quit\n\
        ",
    )
    .block(Block::default().borders(Borders::TOP))
    .wrap(Wrap { trim: true });
    f.render_widget(controls, info_layout[3]);
}

fn render_board(f: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let inner_area = Block::default().borders(Borders::ALL).inner(area);
    f.render_widget(Block::default().borders(Borders::ALL), area);

    let show_ghost = config::current().ui.show_ghost;

    // Ghost first so the active piece paints over it where they overlap
    if show_ghost && snapshot.run_state == RunState::Running {
        for position in &snapshot.ghost {
            paint_cell(f, inner_area, position.x, position.y, "░", Color::DarkGray);
        }
    }

    for (position, kind) in &snapshot.locked {
        paint_cell(f, inner_area, position.x, position.y, "█", kind.color());
    }

    for (position, kind) in &snapshot.active {
        paint_cell(f, inner_area, position.x, position.y, "█", kind.color());
    }

    let overlay = match snapshot.run_state {
        RunState::Idle => Some(("Press Enter to start", Color::White)),
        RunState::Paused => Some(("PAUSED", Color::Yellow)),
        RunState::GameOver => Some(("GAME OVER", Color::Red)),
        RunState::Running => None,
    };

    if let Some((text, color)) = overlay {
        let overlay_widget = Paragraph::new(text)
            .alignment(Alignment::Center)
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD));

        let overlay_area = Rect {
            x: inner_area.x,
            y: inner_area.y + inner_area.height / 2,
            width: inner_area.width,
            height: 1,
        };
        f.render_widget(overlay_widget, overlay_area);
    }
}

// Paints one board cell as a 2x1 character block. Cells above the visible
// board (y < 0) are skipped.
fn paint_cell(f: &mut Frame, area: Rect, x: i32, y: i32, symbol: &str, color: Color) {
    if x < 0 || x >= BOARD_WIDTH as i32 || y < 0 || y >= BOARD_HEIGHT as i32 {
        return;
    }

    let cell_x = area.left() + x as u16 * CELL_WIDTH;
    let cell_y = area.top() + y as u16;

    if cell_x + 1 < area.right() && cell_y < area.bottom() {
        for dx in 0..CELL_WIDTH {
            if let Some(cell) = f.buffer_mut().cell_mut((cell_x + dx, cell_y)) {
                cell.set_symbol(symbol);
                cell.set_fg(color);
                cell.set_bg(Color::Black);
            }
        }
    }
}

fn render_next_preview(f: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Next");
    let inner_area = block.inner(area);
    f.render_widget(block, area);

    let Some((kind, shape)) = &snapshot.next else {
        return;
    };

    let n = shape.size() as u16;
    let offset_x = inner_area.left() + inner_area.width.saturating_sub(n * CELL_WIDTH) / 2;
    let offset_y = inner_area.top() + inner_area.height.saturating_sub(n) / 2;

    for (row, col) in shape.filled_cells() {
        let cell_x = offset_x + col as u16 * CELL_WIDTH;
        let cell_y = offset_y + row as u16;

        if cell_x + 1 < inner_area.right() && cell_y < inner_area.bottom() {
            for dx in 0..CELL_WIDTH {
                if let Some(cell) = f.buffer_mut().cell_mut((cell_x + dx, cell_y)) {
                    cell.set_symbol("█");
                    cell.set_fg(kind.color());
                }
            }
        }
    }
}

/// Helper function to create a centered rect using up certain percentage of the available rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
