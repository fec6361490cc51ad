use crate::app::state::App;
use crossterm::event::KeyCode;

pub fn handle_input(app: &mut App, key: KeyCode) {
    if handle_help_toggle(app, key) {
        return;
    }

    match key {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
        KeyCode::Char('p') => app.toggle_pause(),
        _ => {}
    }
}

fn handle_help_toggle(app: &mut App, key: KeyCode) -> bool {
    if key == KeyCode::F(1) || key == KeyCode::Char('?') {
        app.show_help = !app.show_help;
        return true;
    }

    if app.show_help {
        if key == KeyCode::Esc {
            app.show_help = false;
        }
        return true;
    }

    false
}
