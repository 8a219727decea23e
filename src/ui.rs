use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use crate::app::{App, InputMode, Screen};
use crate::chat::ChatRole;

/// Convert a reply fragment into display lines. The backend answers chat
/// turns with small HTML fragments (`<div>`, `<br>`, `<b>`): block tags
/// become line breaks, bold runs become styled spans, anything else stays
/// literal text.
fn html_fragment_lines(content: &str) -> Vec<Line<'static>> {
    let normalized = content
        .replace("<br/>", "\n")
        .replace("<br>", "\n")
        .replace("</div>", "\n")
        .replace("<div>", "");

    let mut lines: Vec<Line<'static>> = Vec::new();
    for raw_line in normalized.lines() {
        lines.push(parse_bold_line(raw_line));
    }

    if lines.is_empty() {
        lines.push(Line::default());
    }
    lines
}

fn parse_bold_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("<b>") {
        let (before, tagged) = rest.split_at(start);
        if !before.is_empty() {
            spans.push(Span::raw(before.to_string()));
        }

        let inner = &tagged[3..];
        match inner.find("</b>") {
            Some(end) => {
                let (bold, tail) = inner.split_at(end);
                if !bold.is_empty() {
                    spans.push(Span::styled(
                        bold.to_string(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ));
                }
                rest = &tail[4..];
            }
            None => {
                // No closing tag, keep the literal text
                spans.push(Span::raw(format!("<b>{}", inner)));
                rest = "";
            }
        }
    }

    if !rest.is_empty() {
        spans.push(Span::raw(rest.to_string()));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.screen {
        Screen::Ask => render_ask_screen(app, frame, body_area),
        Screen::Chat => render_chat_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let turns = app.transcript.messages().len();
    let turn_indicator = if turns > 0 {
        format!(" [{} messages]", turns)
    } else {
        String::new()
    };

    let title = Line::from(vec![
        Span::styled(" Timesheet Analysis ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(turn_indicator, Style::default().fg(Color::DarkGray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.screen {
        Screen::Ask => " ASK ",
        Screen::Chat => " CHAT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match app.input_mode {
        InputMode::Editing => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(
                if app.screen == Screen::Ask { " submit " } else { " send " },
                label_style,
            ),
            Span::styled(" Tab ", key_style),
            Span::styled(
                if app.screen == Screen::Ask { " chat " } else { " ask " },
                label_style,
            ),
            Span::styled(" Esc ", key_style),
            Span::styled(" stop typing ", label_style),
        ],
        InputMode::Normal => vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" i ", key_style),
            Span::styled(" type ", label_style),
            Span::styled(" Tab ", key_style),
            Span::styled(
                if app.screen == Screen::Ask { " chat " } else { " ask " },
                label_style,
            ),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_ask_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [input_area, result_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .areas(area);

    render_input(app, frame, input_area);

    let result_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Result ");

    let result_text = if app.ask_loading {
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        Text::from(Span::styled(
            format!("Analyzing{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))
    } else if let Some(error) = &app.ask_error {
        Text::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        ))
    } else if let Some(result) = &app.ask_result {
        Text::from(
            result
                .lines()
                .map(|line| Line::from(line.to_string()))
                .collect::<Vec<_>>(),
        )
    } else {
        Text::from(Span::styled(
            "Ask a question about the timesheet data...",
            Style::default().fg(Color::DarkGray),
        ))
    };

    let result = Paragraph::new(result_text)
        .block(result_block)
        .wrap(Wrap { trim: false })
        .scroll((app.ask_scroll, 0));

    frame.render_widget(result, result_area);
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Chat ");

    let chat_text = if app.transcript.is_empty() && !app.chat_loading {
        Text::from(Span::styled(
            "Ask a question about the timesheet data...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in app.transcript.messages() {
            match msg.role {
                ChatRole::User => {
                    lines.push(Line::from(Span::styled(
                        "You:",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    )));
                    lines.push(Line::from(msg.content.clone()));
                    lines.push(Line::default());
                }
                ChatRole::Assistant => {
                    lines.push(Line::from(Span::styled(
                        "AI:",
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    )));
                    lines.extend(html_fragment_lines(&msg.content));
                    lines.push(Line::default());
                }
            }
        }

        if app.chat_loading {
            lines.push(Line::from(Span::styled(
                "AI:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, chat_area);

    render_input(app, frame, input_area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let (title, input, cursor_pos) = match app.screen {
        Screen::Ask => (" Question (Enter to submit) ", &app.question_input, app.question_cursor),
        Screen::Chat => (" Message (Enter to send) ", &app.chat_input, app.chat_cursor),
    };

    let editing = app.input_mode == InputMode::Editing;
    let input_border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_border_color))
        .title(title);

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    // Get the visible slice of the input
    let visible_text: String = input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let widget = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(widget, area);

    // Show cursor when editing
    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((
            area.x + cursor_x + 1,
            area.y + 1,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn div_fragment_renders_as_its_inner_text() {
        let lines = html_fragment_lines("<div>X</div>");
        assert_eq!(lines.len(), 1);
        assert_eq!(line_text(&lines[0]), "X");
    }

    #[test]
    fn br_tags_split_lines() {
        let lines = html_fragment_lines("first<br>second<br/>third");
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn bold_runs_become_styled_spans() {
        let lines = html_fragment_lines("total: <b>42 hours</b> logged");
        assert_eq!(lines.len(), 1);
        let bold: Vec<_> = lines[0]
            .spans
            .iter()
            .filter(|s| s.style.add_modifier.contains(Modifier::BOLD))
            .collect();
        assert_eq!(bold.len(), 1);
        assert_eq!(bold[0].content.as_ref(), "42 hours");
        assert_eq!(line_text(&lines[0]), "total: 42 hours logged");
    }

    #[test]
    fn unclosed_bold_tag_stays_literal() {
        let lines = html_fragment_lines("broken <b>fragment");
        assert_eq!(line_text(&lines[0]), "broken <b>fragment");
    }

    #[test]
    fn plain_text_passes_through() {
        let lines = html_fragment_lines("No result received from the server.");
        assert_eq!(lines.len(), 1);
        assert_eq!(line_text(&lines[0]), "No result received from the server.");
    }
}
