use crossterm::event::{
    KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::Rect;

use crate::app::{App, InputMode, Screen};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string edits.
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

/// Hand the question to the backend without blocking the UI. The result
/// is picked up by the main loop once the task finishes.
fn spawn_question(app: &mut App, question: String) {
    let client = app.client.clone();
    app.answer_task = Some(tokio::spawn(async move { client.ask(&question).await }));
}

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // While the popup is up it swallows the keyboard; Esc or the
    // trigger key dismisses it.
    if app.show_info_popup {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('i') | KeyCode::Char('q')) {
            app.show_info_popup = false;
        }
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Tab switching
        KeyCode::Tab => app.next_tab(),
        KeyCode::BackTab => app.prev_tab(),
        KeyCode::Char('c') => app.activate_tab(Screen::Chat),
        KeyCode::Char('p') => app.activate_tab(Screen::Publications),
        KeyCode::Char('r') => app.activate_tab(Screen::Projects),

        KeyCode::Char('i') => app.toggle_info_popup(),

        _ => match app.screen {
            Screen::Chat => handle_chat_normal(app, key),
            Screen::Publications | Screen::Projects => handle_cards_normal(app, key),
        },
    }
}

fn handle_chat_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('e') | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
            app.chat_cursor = app.chat_input.chars().count();
        }

        // Numbered quick-question chips
        KeyCode::Char(ch @ '1'..='9') => {
            let idx = (ch as u8 - b'1') as usize;
            if let Some(question) = app.begin_quick_question(idx) {
                spawn_question(app, question);
            }
        }

        KeyCode::Char('j') | KeyCode::Down => app.scroll_chat_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_chat_up(1),
        KeyCode::Char('G') => app.scroll_chat_to_bottom(),

        _ => {}
    }
}

fn handle_cards_normal(app: &mut App, key: KeyEvent) {
    let Some(cards) = app.cards_mut() else { return };
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => cards.cursor_down(),
        KeyCode::Char('k') | KeyCode::Up => cards.cursor_up(),
        KeyCode::Enter | KeyCode::Char(' ') => cards.toggle_selected(),
        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => {
            if let Some(question) = app.begin_question() {
                spawn_question(app, question);
            }
        }
        KeyCode::Backspace => {
            if app.chat_cursor > 0 {
                app.chat_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
                app.chat_input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            if app.chat_cursor < app.chat_input.chars().count() {
                let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
                app.chat_input.remove(byte_pos);
            }
        }
        KeyCode::Left => app.chat_cursor = app.chat_cursor.saturating_sub(1),
        KeyCode::Right => {
            let char_count = app.chat_input.chars().count();
            app.chat_cursor = (app.chat_cursor + 1).min(char_count);
        }
        KeyCode::Home => app.chat_cursor = 0,
        KeyCode::End => app.chat_cursor = app.chat_input.chars().count(),
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
            app.chat_input.insert(byte_pos, c);
            app.chat_cursor += 1;
        }
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => handle_click(app, mouse.column, mouse.row),
        MouseEventKind::ScrollDown => match app.screen {
            Screen::Chat => app.scroll_chat_down(3),
            Screen::Publications | Screen::Projects => {
                if let Some(cards) = app.cards_mut() {
                    cards.cursor_down();
                }
            }
        },
        MouseEventKind::ScrollUp => match app.screen {
            Screen::Chat => app.scroll_chat_up(3),
            Screen::Publications | Screen::Projects => {
                if let Some(cards) = app.cards_mut() {
                    cards.cursor_up();
                }
            }
        },
        _ => {}
    }
}

fn handle_click(app: &mut App, x: u16, y: u16) {
    let on_trigger = app
        .info_button_area
        .is_some_and(|rect| point_in_rect(x, y, rect));

    // While the popup is open the trigger still toggles; any press
    // outside both the popup and the trigger dismisses it. Checking the
    // trigger first is what keeps its own press from counting as an
    // outside press and re-closing the popup in the same event.
    if app.show_info_popup {
        if on_trigger {
            app.toggle_info_popup();
        } else if !app.popup_area.is_some_and(|rect| point_in_rect(x, y, rect)) {
            app.show_info_popup = false;
        }
        return;
    }

    if on_trigger {
        app.toggle_info_popup();
        return;
    }

    if let Some(screen) = app
        .tab_areas
        .iter()
        .find(|(_, rect)| point_in_rect(x, y, *rect))
        .map(|(screen, _)| *screen)
    {
        app.activate_tab(screen);
        return;
    }

    match app.screen {
        Screen::Chat => {
            if let Some(idx) = app
                .chip_areas
                .iter()
                .position(|rect| point_in_rect(x, y, *rect))
            {
                if let Some(question) = app.begin_quick_question(idx) {
                    spawn_question(app, question);
                }
            } else if app.input_area.is_some_and(|rect| point_in_rect(x, y, rect)) {
                app.input_mode = InputMode::Editing;
                app.chat_cursor = app.chat_input.chars().count();
            }
        }
        Screen::Publications | Screen::Projects => {
            if let Some(idx) = app
                .card_areas
                .iter()
                .position(|rect| point_in_rect(x, y, *rect))
            {
                if let Some(cards) = app.cards_mut() {
                    cards.toggle(idx);
                }
            }
        }
    }
}
