use ratatui::layout::Rect;
use natter_core::{ChatTurn, Conversation, TypingIndicator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Message input
    pub input: String,
    pub input_cursor: usize, // cursor position in chars

    // Conversation, plus the snapshot the UI draws from
    pub conversation: Conversation,
    pub turns: Vec<ChatTurn>,
    pub endpoint: String,

    // Chat scroll state
    pub chat_scroll: u16,
    pub follow_tail: bool,   // Keep the newest turn in view
    pub chat_height: u16,    // Visible rows, updated during render
    pub chat_total_lines: u16,

    // Panel area for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,

    // Animation state
    pub typing: TypingIndicator,
}

impl App {
    pub fn new(conversation: Conversation, endpoint: impl Into<String>) -> Self {
        let turns = conversation.turns();
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,

            input: String::new(),
            input_cursor: 0,

            conversation,
            turns,
            endpoint: endpoint.into(),

            chat_scroll: 0,
            follow_tail: true,
            chat_height: 0,
            chat_total_lines: 0,

            chat_area: None,

            typing: TypingIndicator::new(),
        }
    }

    /// Re-read the conversation after it reports a change
    pub fn refresh_turns(&mut self) {
        self.turns = self.conversation.turns();
        self.follow_tail = true;
    }

    /// Send whatever is in the input box. Blank input stays in place.
    pub fn submit_input(&mut self) -> bool {
        if self.conversation.send_user_message(&self.input).is_none() {
            return false;
        }

        self.input.clear();
        self.input_cursor = 0;
        // New placeholder animates from its first dot
        self.typing = TypingIndicator::new();
        self.refresh_turns();
        true
    }

    pub fn quit(&mut self) {
        self.conversation.close();
        self.should_quit = true;
    }

    // Input editing
    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
        self.input.insert(byte_pos, c);
        self.input_cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.input_cursor > 0 {
            self.input_cursor -= 1;
            let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.input_cursor < self.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.input_cursor = self.input_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.input_cursor = (self.input_cursor + 1).min(self.input.chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.input_cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.input_cursor = self.input.chars().count();
    }

    // Chat scrolling
    fn max_scroll(&self) -> u16 {
        self.chat_total_lines.saturating_sub(self.chat_height)
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.follow_tail = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.max_scroll());
        if self.chat_scroll == self.max_scroll() {
            self.follow_tail = true;
        }
    }

    pub fn scroll_half_page_up(&mut self) {
        self.scroll_up((self.chat_height / 2).max(1));
    }

    pub fn scroll_half_page_down(&mut self) {
        self.scroll_down((self.chat_height / 2).max(1));
    }

    /// Record the laid-out chat size and pin to the bottom when following
    pub fn set_chat_layout(&mut self, height: u16, total_lines: u16) {
        self.chat_height = height;
        self.chat_total_lines = total_lines;
        if self.follow_tail {
            self.chat_scroll = self.max_scroll();
        } else {
            self.chat_scroll = self.chat_scroll.min(self.max_scroll());
        }
    }
}
