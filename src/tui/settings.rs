use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph};

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsEvent {
    None,
    Changed,
    Close,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SettingsPanelState {
    pub selected_row: usize,
}

const SETTINGS_ROW_COUNT: usize = 3;

const DURATION_STEPS: [u64; 5] = [250, 500, 750, 1000, 1500];

pub fn handle_key(
    key: KeyEvent,
    state: &mut SettingsPanelState,
    config: &mut Config,
) -> SettingsEvent {
    match key.code {
        KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('q') | KeyCode::Char('s') => {
            SettingsEvent::Close
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.selected_row = state.selected_row.saturating_sub(1);
            SettingsEvent::None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            state.selected_row = (state.selected_row + 1).min(SETTINGS_ROW_COUNT - 1);
            SettingsEvent::None
        }
        KeyCode::Left | KeyCode::Char('h') => adjust(config, state.selected_row, false),
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Enter | KeyCode::Char(' ') => {
            adjust(config, state.selected_row, true)
        }
        _ => SettingsEvent::None,
    }
}

pub fn draw(frame: &mut Frame, state: &SettingsPanelState, config: &Config) {
    let area = centered_rect(frame.area(), 52, 40);
    frame.render_widget(Clear, area);

    let title = Line::from(vec![
        Span::styled(
            "Setup",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled("[Esc] close", Style::default().fg(Color::Gray)),
    ]);

    let selected_row = state.selected_row.min(SETTINGS_ROW_COUNT - 1);
    let lines = vec![
        settings_row(
            selected_row == 0,
            "animation duration",
            &format!("{} ms", config.duration_ms),
        ),
        settings_row(
            selected_row == 1,
            "node labels",
            if config.show_labels { "[ON]" } else { "[OFF]" },
        ),
        settings_row(
            selected_row == 2,
            "board pane",
            if config.show_board { "[ON]" } else { "[OFF]" },
        ),
        Line::from(""),
        Line::from(Span::styled(
            "Use arrows/hjkl or Enter/Space to change.",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(Span::styled(
            "Changes write to viewer.json immediately.",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let panel = Paragraph::new(lines).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Cyan))
            .padding(Padding::new(1, 1, 1, 0)),
    );
    frame.render_widget(panel, area);
}

fn settings_row(selected: bool, key: &str, value: &str) -> Line<'static> {
    let indicator = if selected { ">" } else { " " };
    let base_style = if selected {
        Style::default()
            .fg(Color::White)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    let mut value_style = Style::default().fg(Color::Green).add_modifier(Modifier::BOLD);
    if selected {
        value_style = value_style.bg(Color::DarkGray);
    }

    Line::from(vec![
        Span::styled(format!("{indicator} {key:<20}"), base_style),
        Span::styled(value.to_string(), value_style),
    ])
}

fn adjust(config: &mut Config, selected_row: usize, forward: bool) -> SettingsEvent {
    match selected_row {
        0 => {
            config.duration_ms = step_duration(config.duration_ms, forward);
            SettingsEvent::Changed
        }
        1 => {
            config.show_labels = !config.show_labels;
            SettingsEvent::Changed
        }
        2 => {
            config.show_board = !config.show_board;
            SettingsEvent::Changed
        }
        _ => SettingsEvent::None,
    }
}

fn step_duration(current: u64, forward: bool) -> u64 {
    let idx = DURATION_STEPS
        .iter()
        .position(|&d| d >= current)
        .unwrap_or(DURATION_STEPS.len() - 1);
    let next = if forward {
        (idx + 1).min(DURATION_STEPS.len() - 1)
    } else {
        idx.saturating_sub(1)
    };
    DURATION_STEPS[next]
}

fn centered_rect(area: Rect, width_percent: u16, height_percent: u16) -> Rect {
    let vertical = Layout::vertical([
        Constraint::Percentage((100 - height_percent) / 2),
        Constraint::Percentage(height_percent),
        Constraint::Percentage((100 - height_percent) / 2),
    ])
    .flex(Flex::Center)
    .split(area);
    Layout::horizontal([
        Constraint::Percentage((100 - width_percent) / 2),
        Constraint::Percentage(width_percent),
        Constraint::Percentage((100 - width_percent) / 2),
    ])
    .flex(Flex::Center)
    .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn duration_steps_forward_and_back() {
        assert_eq!(step_duration(750, true), 1000);
        assert_eq!(step_duration(750, false), 500);
        assert_eq!(step_duration(1500, true), 1500);
        assert_eq!(step_duration(250, false), 250);
    }

    #[test]
    fn adjusting_a_row_reports_changed() {
        let mut config = Config::default();
        let mut state = SettingsPanelState { selected_row: 1 };
        let event = handle_key(key(KeyCode::Enter), &mut state, &mut config);
        assert_eq!(event, SettingsEvent::Changed);
        assert!(!config.show_labels);
    }

    #[test]
    fn escape_closes_the_panel() {
        let mut config = Config::default();
        let mut state = SettingsPanelState::default();
        assert_eq!(
            handle_key(key(KeyCode::Esc), &mut state, &mut config),
            SettingsEvent::Close
        );
    }

    #[test]
    fn selection_stays_in_bounds() {
        let mut config = Config::default();
        let mut state = SettingsPanelState { selected_row: 2 };
        handle_key(key(KeyCode::Down), &mut state, &mut config);
        assert_eq!(state.selected_row, SETTINGS_ROW_COUNT - 1);
        state.selected_row = 0;
        handle_key(key(KeyCode::Up), &mut state, &mut config);
        assert_eq!(state.selected_row, 0);
    }
}
