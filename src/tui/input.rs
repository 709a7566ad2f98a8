use crossterm::event::{KeyCode, KeyEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Move(Direction),
    NextNode,
    Activate,
    NextPly,
    PrevPly,
    ExpandAll,
    ToggleHelp,
    OpenSettings,
    Cancel,
    Quit,
    Noop,
}

pub fn action_for_key(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Up => Action::Move(Direction::Up),
        KeyCode::Down => Action::Move(Direction::Down),
        KeyCode::Left => Action::Move(Direction::Left),
        KeyCode::Right => Action::Move(Direction::Right),
        KeyCode::Enter | KeyCode::Char(' ') => Action::Activate,
        KeyCode::Tab => Action::NextNode,
        KeyCode::Esc => Action::Cancel,
        KeyCode::Char('h') => Action::Move(Direction::Left),
        KeyCode::Char('j') => Action::Move(Direction::Down),
        KeyCode::Char('k') => Action::Move(Direction::Up),
        KeyCode::Char('l') => Action::Move(Direction::Right),
        KeyCode::Char('n') | KeyCode::Char(']') => Action::NextPly,
        KeyCode::Char('p') | KeyCode::Char('[') => Action::PrevPly,
        KeyCode::Char('e') => Action::ExpandAll,
        KeyCode::Char('?') => Action::ToggleHelp,
        KeyCode::Char('s') => Action::OpenSettings,
        KeyCode::Char('q') => Action::Quit,
        _ => Action::Noop,
    }
}
