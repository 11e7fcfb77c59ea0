use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{App, InputMode};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        // Redraw happens on every event; the typing dots are time-based
        AppEvent::Resize | AppEvent::Tick => {}
        AppEvent::ConversationChanged => app.refresh_turns(),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    match key.code {
        KeyCode::PageUp => return app.scroll_half_page_up(),
        KeyCode::PageDown => return app.scroll_half_page_down(),
        _ => {}
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
        KeyCode::Char('i') | KeyCode::Enter => app.input_mode = InputMode::Editing,
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down()
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up()
        }
        KeyCode::Char('G') | KeyCode::End => app.scroll_down(u16::MAX),
        KeyCode::Char('g') | KeyCode::Home => app.scroll_up(u16::MAX),
        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => {
            app.submit_input();
        }
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(3),
        MouseEventKind::ScrollUp => app.scroll_up(3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crossterm::event::{KeyEventKind, KeyEventState};
    use natter_core::{ChatTransport, Conversation, TransportError, TurnStatus};
    use std::sync::Arc;

    struct FixedTransport(&'static str);

    #[async_trait]
    impl ChatTransport for FixedTransport {
        async fn send(&self, _text: &str) -> Result<String, TransportError> {
            Ok(self.0.to_string())
        }
    }

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c))).unwrap();
        }
    }

    #[tokio::test]
    async fn test_enter_sends_and_update_refreshes() {
        let conversation = Conversation::new(Arc::new(FixedTransport("Hi!")));
        let mut revisions = conversation.subscribe();
        let mut app = App::new(conversation, "http://localhost:8000/chat");

        type_text(&mut app, "Hello");
        handle_event(&mut app, key(KeyCode::Enter)).unwrap();
        assert_eq!(app.turns.len(), 2);
        assert_eq!(app.turns[0].status, TurnStatus::Pending);

        // Wait for the background reply to land
        revisions.borrow_and_update();
        revisions.changed().await.unwrap();
        handle_event(&mut app, AppEvent::ConversationChanged).unwrap();

        assert_eq!(app.turns[0].status, TurnStatus::Sent);
        assert_eq!(app.turns[1].content, "Hi!");
    }

    #[tokio::test]
    async fn test_escape_then_q_quits() {
        let conversation = Conversation::new(Arc::new(FixedTransport("Hi!")));
        let mut app = App::new(conversation, "http://localhost:8000/chat");

        handle_event(&mut app, key(KeyCode::Esc)).unwrap();
        assert_eq!(app.input_mode, InputMode::Normal);
        handle_event(&mut app, key(KeyCode::Char('q'))).unwrap();
        assert!(app.should_quit);
        assert!(app.conversation.is_closed());
    }

    #[tokio::test]
    async fn test_q_while_editing_is_typed() {
        let conversation = Conversation::new(Arc::new(FixedTransport("Hi!")));
        let mut app = App::new(conversation, "http://localhost:8000/chat");

        type_text(&mut app, "q");
        assert!(!app.should_quit);
        assert_eq!(app.input, "q");
    }
}
