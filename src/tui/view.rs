use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::players::instrument_names;
use crate::shared::{DisplayState, LOOP_DURATION, NUM_CHANNELS};

pub fn render(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // status bar
            Constraint::Min(NUM_CHANNELS as u16), // note grid
        ])
        .split(area);

    draw_status(frame, sections[0], state);
    draw_grid(frame, sections[1], state);
}

fn draw_status(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let transport = if state.playing { "playing" } else { "paused" };
    let text = Line::from(format!(
        " syncopate | {} | {} | space: play/pause  enter: resample  esc: quit",
        transport, state.status
    ));
    let block = Block::default().borders(Borders::ALL);
    frame.render_widget(Paragraph::new(text).block(block), area);
}

// 9 instrument rows by 16 step columns; the lit column follows the audio
// clock, lit cells come from the pushed one-hot grid
fn draw_grid(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let names = instrument_names();

    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Ratio(1, NUM_CHANNELS as u32); NUM_CHANNELS])
        .split(area);

    for (row, row_area) in row_areas.iter().enumerate() {
        let mut constraints = vec![Constraint::Length(14)];
        constraints.extend([Constraint::Ratio(1, LOOP_DURATION as u32); LOOP_DURATION]);
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(*row_area);

        let label = names.get(row).copied().unwrap_or("");
        frame.render_widget(
            Paragraph::new(label).style(Style::default().fg(Color::Gray)),
            cols[0],
        );

        for step in 0..LOOP_DURATION {
            let lit = state
                .note_on
                .get(row * LOOP_DURATION + step)
                .is_some_and(|&v| v == 1);
            let on_cursor = state.playing && step == state.step;
            let style = match (lit, on_cursor) {
                (true, true) => Style::default().fg(Color::LightMagenta).bg(Color::LightMagenta),
                (true, false) => Style::default().fg(Color::Magenta).bg(Color::Magenta),
                (false, true) => Style::default().fg(Color::DarkGray).bg(Color::DarkGray),
                (false, false) => Style::default().fg(Color::Black),
            };
            let block = Block::default().border_style(style).style(style);
            frame.render_widget(block, cols[step + 1]);
        }
    }
}
