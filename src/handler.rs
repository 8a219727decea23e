use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crate::app::{App, InputMode, Screen};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn toggle_screen(app: &mut App) {
    app.screen = match app.screen {
        Screen::Ask => Screen::Chat,
        Screen::Chat => Screen::Ask,
    };
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,

        // Screen switching
        KeyCode::Tab => toggle_screen(app),

        // Back to typing
        KeyCode::Char('i') | KeyCode::Char('/') | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
        }

        // Scroll result / transcript
        KeyCode::Char('j') | KeyCode::Down => match app.screen {
            Screen::Ask => app.ask_scroll = app.ask_scroll.saturating_add(1),
            Screen::Chat => app.chat_scroll = app.chat_scroll.saturating_add(1),
        },
        KeyCode::Char('k') | KeyCode::Up => match app.screen {
            Screen::Ask => app.ask_scroll = app.ask_scroll.saturating_sub(1),
            Screen::Chat => app.chat_scroll = app.chat_scroll.saturating_sub(1),
        },
        KeyCode::Char('g') => match app.screen {
            Screen::Ask => app.ask_scroll = 0,
            Screen::Chat => app.chat_scroll = 0,
        },
        KeyCode::Char('G') => {
            if app.screen == Screen::Chat {
                app.scroll_chat_to_bottom();
            }
        }

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => match app.screen {
            Screen::Ask => app.submit_question(),
            Screen::Chat => app.submit_chat_message(),
        },
        // Switch screens without leaving the input
        KeyCode::Tab => toggle_screen(app),
        _ => edit_active_input(app, key),
    }
}

fn edit_active_input(app: &mut App, key: KeyEvent) {
    let (input, cursor) = match app.screen {
        Screen::Ask => (&mut app.question_input, &mut app.question_cursor),
        Screen::Chat => (&mut app.chat_input, &mut app.chat_cursor),
    };

    match key.code {
        KeyCode::Backspace => {
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(input, *cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = input.chars().count();
            if *cursor < char_count {
                let byte_pos = char_to_byte_index(input, *cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            *cursor = cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = input.chars().count();
            *cursor = (*cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            *cursor = 0;
        }
        KeyCode::End => {
            *cursor = input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(input, *cursor);
            input.insert(byte_pos, c);
            *cursor += 1;
        }
        _ => {}
    }
}
