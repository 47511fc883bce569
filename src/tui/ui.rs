//! UI rendering for the presenter.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
    style::{Color, Style, Modifier},
};
use crate::cpu::display::{Display, HEIGHT, WIDTH};
use super::app::PresenterApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &PresenterApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            // two pixel rows per text row, plus borders
            Constraint::Length(HEIGHT as u16 / 2 + 2),
            Constraint::Length(3),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let screen = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(WIDTH as u16 + 2), Constraint::Min(0)])
        .split(chunks[0]);

    draw_screen(frame, screen[0], app);
    draw_status(frame, chunks[1], app);
    draw_help(frame, chunks[2]);
}

/// Render the bitmap as half-block characters.
fn draw_screen(frame: &mut Frame, area: Rect, app: &PresenterApp) {
    let border = if app.frame.sound { Color::Yellow } else { Color::Cyan };

    let screen = Paragraph::new(screen_lines(&app.frame.display))
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" CHIP-8 ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)));

    frame.render_widget(screen, area);
}

/// One text line per pair of pixel rows.
pub(crate) fn screen_lines(display: &Display) -> Vec<Line<'static>> {
    (0..HEIGHT / 2)
        .map(|row| {
            let text: String = (0..WIDTH)
                .map(|x| match (display.pixel(x, row * 2), display.pixel(x, row * 2 + 1)) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                })
                .collect();
            Line::from(text)
        })
        .collect()
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &PresenterApp) {
    let state_style = if app.halted {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Green)
    };

    let line = Line::from(vec![
        Span::raw("PC: "),
        Span::styled(format!("{:#05x}", app.frame.pc), Style::default().fg(Color::Yellow)),
        Span::raw("   Cycles: "),
        Span::styled(format!("{}", app.frame.cycles), Style::default().fg(Color::Cyan)),
        Span::raw(if app.frame.sound { "   ♪  " } else { "      " }),
        Span::styled(app.status.clone(), state_style),
    ]);

    let status = Paragraph::new(line)
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("Keypad: 1234 / QWER / ASDF / ZXCV"),
        Line::from("Esc: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}
