use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
};
use natter_core::{ChatRole, ChatTurn, TurnStatus};
use crate::app::{App, InputMode};

/// Bubbles take at most this share of the chat width
const BUBBLE_WIDTH_PERCENT: usize = 75;

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str, base: Style) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("**") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("**") else {
            break;
        };
        if close == 0 {
            // "****" - nothing to embolden, keep it literal
            spans.push(Span::styled(rest[..open + 4].to_string(), base));
            rest = &after_open[2..];
            continue;
        }

        if open > 0 {
            spans.push(Span::styled(rest[..open].to_string(), base));
        }
        spans.push(Span::styled(
            after_open[..close].to_string(),
            base.add_modifier(Modifier::BOLD),
        ));
        rest = &after_open[close + 2..];
    }

    if !rest.is_empty() {
        spans.push(Span::styled(rest.to_string(), base));
    }

    Line::from(spans)
}

type StyledChar = (char, Style);

/// Greedy word wrap of one paragraph on character counts. Words longer than
/// `width` are split.
fn wrap_styled(paragraph: &[StyledChar], width: usize) -> Vec<Vec<StyledChar>> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current: Vec<StyledChar> = Vec::new();

    for word in paragraph.split(|(c, _)| c.is_whitespace()).filter(|w| !w.is_empty()) {
        let mut word = word.to_vec();

        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let tail = word.split_off(width);
            lines.push(word);
            word = tail;
        }

        let needed = if current.is_empty() { word.len() } else { word.len() + 1 };
        if current.len() + needed > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push((' ', word[0].1));
        }
        current.extend(word);
    }

    lines.push(current);
    lines
}

fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let chars: Vec<StyledChar> = paragraph.chars().map(|c| (c, Style::default())).collect();
        lines.extend(
            wrap_styled(&chars, width)
                .into_iter()
                .map(|row| row.into_iter().map(|(c, _)| c).collect::<String>()),
        );
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Merge runs of equally styled characters back into spans
fn styled_line(row: &[StyledChar]) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut text = String::new();
    let mut style = None;

    for &(c, char_style) in row {
        if style != Some(char_style) {
            if let Some(prev) = style {
                spans.push(Span::styled(std::mem::take(&mut text), prev));
            }
            style = Some(char_style);
        }
        text.push(c);
    }
    if let Some(prev) = style {
        spans.push(Span::styled(text, prev));
    }

    Line::from(spans)
}

/// Markdown is resolved per paragraph before wrapping, so a bold run can
/// span a line break.
fn wrap_markdown(text: &str, width: usize, base: Style) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let parsed = parse_markdown_line(paragraph, base);
        let chars: Vec<StyledChar> = parsed
            .spans
            .iter()
            .flat_map(|span| span.content.chars().map(move |c| (c, span.style)))
            .collect();
        lines.extend(wrap_styled(&chars, width).iter().map(|row| styled_line(row)));
    }

    if lines.is_empty() {
        lines.push(Line::default());
    }
    lines
}

fn turn_lines(turn: &ChatTurn, bubble_width: usize, typing_frame: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    match turn.role {
        ChatRole::User => {
            let (label_style, body_style) = match turn.status {
                TurnStatus::Sent => (
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    Style::default().fg(Color::Cyan),
                ),
                TurnStatus::Pending => (
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
                    Style::default().fg(Color::DarkGray),
                ),
                TurnStatus::Failed => (
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    Style::default().fg(Color::Red).add_modifier(Modifier::CROSSED_OUT),
                ),
            };

            lines.push(Line::from(Span::styled("You", label_style)).alignment(Alignment::Right));
            for line in wrap_text(&turn.content, bubble_width) {
                lines.push(Line::from(Span::styled(line, body_style)).alignment(Alignment::Right));
            }
            if turn.status == TurnStatus::Failed {
                lines.push(
                    Line::from(Span::styled(
                        "✗ not delivered",
                        Style::default().fg(Color::Red).add_modifier(Modifier::ITALIC),
                    ))
                    .alignment(Alignment::Right),
                );
            }
        }
        ChatRole::Assistant => {
            lines.push(Line::from(Span::styled(
                "Assistant",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            if turn.is_placeholder() {
                lines.push(Line::from(Span::styled(
                    typing_frame.to_string(),
                    Style::default().fg(Color::DarkGray),
                )));
            } else {
                lines.extend(wrap_markdown(&turn.content, bubble_width, Style::default()));
            }
        }
    }

    lines.push(Line::default());
    lines
}

/// Lay out every turn for a chat pane `width` columns wide
fn chat_lines(turns: &[ChatTurn], width: u16, typing_frame: &str) -> Vec<Line<'static>> {
    let bubble_width = (width as usize * BUBBLE_WIDTH_PERCENT / 100).max(1);
    turns
        .iter()
        .flat_map(|turn| turn_lines(turn, bubble_width, typing_frame))
        .collect()
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" natter ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.endpoint.clone(), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");

    // Inner size minus borders
    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);

    let text = if app.turns.is_empty() {
        Text::from(Span::styled(
            "Say hello to get started...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let typing_frame = app.typing.frame_now();
        Text::from(chat_lines(&app.turns, inner_width, &typing_frame))
    };

    let total_lines = u16::try_from(text.lines.len()).unwrap_or(u16::MAX);
    app.set_chat_layout(inner_height, total_lines);

    let chat = Paragraph::new(text)
        .block(block)
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message ");

    // Calculate visible portion of input with horizontal scrolling
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;

    // Scroll offset that keeps the cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let input = if app.input.is_empty() && !editing {
        Paragraph::new(Span::styled("Type a message", Style::default().fg(Color::DarkGray)))
    } else {
        let visible_text: String = app
            .input
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        Paragraph::new(visible_text).style(Style::default().fg(Color::Cyan))
    };

    frame.render_widget(input.block(input_block), area);

    // Show cursor when editing
    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode, mode_style) = match app.input_mode {
        InputMode::Editing => (" EDIT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
        InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
    };

    let hints = match app.input_mode {
        InputMode::Editing => " Enter send  Esc normal mode  PgUp/PgDn scroll  Ctrl-C quit",
        InputMode::Normal => " i edit  j/k scroll  g/G top/bottom  q quit",
    };

    let mut spans = vec![
        Span::styled(mode, mode_style.bold()),
        Span::styled(hints, Style::default().fg(Color::DarkGray)),
    ];
    if app.conversation.is_awaiting_reply() {
        spans.push(Span::styled(
            "  waiting for reply",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
