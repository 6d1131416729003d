use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, ChatRole, InputMode, Screen};
use crate::content::{Project, Publication};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, tabs_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_tab_bar(app, frame, tabs_area);

    match app.screen {
        Screen::Chat => render_chat_screen(app, frame, body_area),
        Screen::Publications | Screen::Projects => render_cards_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);

    app.popup_area = None;
    if app.show_info_popup {
        render_info_popup(app, frame, area);
    }
}

fn render_header(app: &mut App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(
            format!(" {} ", app.content.owner.name),
            Style::default().fg(Color::Cyan).bold(),
        ),
        Span::styled(
            format!("papertalk v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);
    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);

    // The info trigger lives in the header's right corner.
    let label = " [i] about ";
    let width = label.len() as u16;
    if area.width > width {
        let button = Rect::new(area.right().saturating_sub(width), area.y, width, 1);
        let style = if app.show_info_popup {
            Style::default().bg(Color::Cyan).fg(Color::Black)
        } else {
            Style::default().bg(Color::Black).fg(Color::White)
        };
        frame.render_widget(Paragraph::new(label).style(style), button);
        app.info_button_area = Some(button);
    } else {
        app.info_button_area = None;
    }
}

fn render_tab_bar(app: &mut App, frame: &mut Frame, area: Rect) {
    app.tab_areas.clear();

    let mut spans = Vec::new();
    let mut x = area.x;
    for screen in Screen::ALL {
        let label = format!("  {}  ", screen.title());
        let width = label.len() as u16;
        let style = if screen == app.screen {
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(label, style));

        if x + width <= area.right() {
            app.tab_areas.push((screen, Rect::new(x, area.y, width, 1)));
        }
        x += width;
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let chip_count = app.content.quick_questions.len().min(4);
    let chips_height = if chip_count == 0 { 0 } else { chip_count as u16 + 2 };

    let [messages_area, chips_area, input_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(chips_height),
        Constraint::Length(3),
    ])
    .areas(area);

    render_messages(app, frame, messages_area);
    render_chips(app, frame, chips_area, chip_count);
    render_chat_input(app, frame, input_area);
}

fn render_messages(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");

    let inner = block.inner(area);
    app.chat_height = inner.height;
    app.chat_width = inner.width;

    let mut lines: Vec<Line> = Vec::new();
    for message in &app.chat_messages {
        let (label, color) = match message.role {
            ChatRole::User => ("You:", Color::Cyan),
            ChatRole::Assistant => ("AI:", Color::Yellow),
        };
        lines.push(Line::from(Span::styled(
            label,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));

        if message.pending {
            // Typing indicator: ".", "..", "..." driven by tick events.
            let dots = ".".repeat(app.animation_frame as usize + 1);
            lines.push(Line::from(Span::styled(
                dots,
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )));
        } else {
            for line in message.content.lines() {
                lines.push(Line::from(line.to_string()));
            }
        }
        lines.push(Line::default());
    }

    let messages = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(messages, area);
}

fn render_chips(app: &mut App, frame: &mut Frame, area: Rect, chip_count: usize) {
    app.chip_areas.clear();
    if chip_count == 0 || area.height == 0 {
        return;
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Quick questions ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    for i in 0..chip_count {
        if i as u16 >= inner.height {
            break;
        }
        let Some(chip) = app.content.quick_questions.get(i) else { break };
        let row = Rect::new(inner.x, inner.y + i as u16, inner.width, 1);
        let line = Line::from(vec![
            Span::styled(
                format!(" {} ", i + 1),
                Style::default().bg(Color::Cyan).fg(Color::Black),
            ),
            Span::raw(" "),
            Span::raw(chip.clone()),
        ]);
        frame.render_widget(Paragraph::new(line), row);
        app.chip_areas.push(row);
    }
}

fn render_chat_input(app: &mut App, frame: &mut Frame, area: Rect) {
    app.input_area = Some(area);

    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };
    let title = if app.is_busy() {
        " Ask (waiting for reply) "
    } else {
        " Ask (e to edit, Enter to send) "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scroll keeps the cursor visible in a one-line field.
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.chat_cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };
    let visible: String = app
        .chat_input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

/// Common shape for a publication or project entry once it reaches the
/// screen: a one-line header plus the detail shown when expanded.
struct CardView {
    title: String,
    subtitle: String,
    body: String,
    link: Option<String>,
}

fn publication_card(publication: &Publication) -> CardView {
    let mut subtitle = publication.authors.clone();
    if !publication.venue.is_empty() {
        if !subtitle.is_empty() {
            subtitle.push_str(" · ");
        }
        subtitle.push_str(&publication.venue);
    }
    if let Some(year) = publication.year {
        subtitle.push_str(&format!(" ({year})"));
    }
    CardView {
        title: publication.title.clone(),
        subtitle,
        body: publication.summary.clone(),
        link: publication.link.clone(),
    }
}

fn project_card(project: &Project) -> CardView {
    let subtitle = if project.status.is_empty() {
        String::new()
    } else {
        format!("status: {}", project.status)
    };
    CardView {
        title: project.title.clone(),
        subtitle,
        body: project.summary.clone(),
        link: project.link.clone(),
    }
}

fn render_cards_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let (cards, cursor, expanded, empty_hint) = match app.screen {
        Screen::Publications => (
            app.content
                .publications
                .iter()
                .map(publication_card)
                .collect::<Vec<_>>(),
            app.publications.cursor,
            app.publications.expanded,
            "No publications listed yet.",
        ),
        Screen::Projects => (
            app.content
                .projects
                .iter()
                .map(project_card)
                .collect::<Vec<_>>(),
            app.projects.cursor,
            app.projects.expanded,
            "No projects listed yet.",
        ),
        Screen::Chat => return,
    };

    app.card_areas.clear();

    if cards.is_empty() {
        let placeholder = Paragraph::new(empty_hint).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(placeholder, area);
        return;
    }

    let mut y = area.y;
    for (idx, card) in cards.iter().enumerate() {
        let remaining = area.bottom().saturating_sub(y);
        if remaining == 0 {
            break;
        }

        let is_open = expanded == Some(idx);
        let mut lines: Vec<Line> = Vec::new();
        if is_open {
            if !card.subtitle.is_empty() {
                lines.push(Line::from(Span::styled(
                    card.subtitle.clone(),
                    Style::default().fg(Color::DarkGray),
                )));
                lines.push(Line::default());
            }
            for line in card.body.lines() {
                lines.push(Line::from(line.to_string()));
            }
            if let Some(link) = &card.link {
                lines.push(Line::default());
                lines.push(Line::from(Span::styled(
                    link.clone(),
                    Style::default().fg(Color::Blue).underlined(),
                )));
            }
        }

        let height = if is_open {
            (lines.len() as u16 + 2).min(remaining)
        } else {
            // Collapsed cards are just a bordered header line.
            3.min(remaining)
        };

        let marker = if is_open { "▾" } else { "▸" };
        let border_color = if idx == cursor { Color::Cyan } else { Color::DarkGray };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(format!(" {marker} {} ", card.title));

        let rect = Rect::new(area.x, y, area.width, height);
        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, rect);
        app.card_areas.push(rect);

        y += height;
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints: Vec<Span> = if app.show_info_popup {
        vec![
            Span::styled(" Esc ", key_style),
            Span::styled(" close ", label_style),
        ]
    } else {
        match (app.screen, app.input_mode) {
            (Screen::Chat, InputMode::Editing) => vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" send ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" stop typing ", label_style),
            ],
            (Screen::Chat, InputMode::Normal) => vec![
                Span::styled(" e ", key_style),
                Span::styled(" ask ", label_style),
                Span::styled(" 1-9 ", key_style),
                Span::styled(" quick question ", label_style),
                Span::styled(" j/k ", key_style),
                Span::styled(" scroll ", label_style),
                Span::styled(" Tab ", key_style),
                Span::styled(" switch tab ", label_style),
                Span::styled(" i ", key_style),
                Span::styled(" about ", label_style),
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ],
            (_, _) => vec![
                Span::styled(" j/k ", key_style),
                Span::styled(" select ", label_style),
                Span::styled(" Enter ", key_style),
                Span::styled(" expand/collapse ", label_style),
                Span::styled(" Tab ", key_style),
                Span::styled(" switch tab ", label_style),
                Span::styled(" i ", key_style),
                Span::styled(" about ", label_style),
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ],
        }
    };

    if app.is_busy() {
        hints.push(Span::styled(
            " waiting for reply… ",
            Style::default().bg(Color::Black).fg(Color::Yellow),
        ));
    }

    let footer = Paragraph::new(Line::from(hints)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_info_popup(app: &mut App, frame: &mut Frame, area: Rect) {
    let owner = app.content.owner.clone();

    let mut lines = vec![Line::from(Span::styled(
        owner.name,
        Style::default().fg(Color::Yellow).bold(),
    ))];
    let affiliation_line = match (owner.role.is_empty(), owner.affiliation.is_empty()) {
        (false, false) => format!("{} · {}", owner.role, owner.affiliation),
        (false, true) => owner.role,
        (true, false) => owner.affiliation,
        (true, true) => String::new(),
    };
    if !affiliation_line.is_empty() {
        lines.push(Line::from(Span::styled(
            affiliation_line,
            Style::default().fg(Color::DarkGray),
        )));
    }
    if !owner.email.is_empty() {
        lines.push(Line::from(Span::styled(
            owner.email,
            Style::default().fg(Color::Cyan),
        )));
    }
    lines.push(Line::default());
    for line in owner.blurb.lines() {
        lines.push(Line::from(line.to_string()));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Esc or click elsewhere to close",
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )));

    let popup_width = 52.min(area.width.saturating_sub(4));
    let popup_height = (lines.len() as u16 + 2).min(area.height.saturating_sub(4));
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" About this site ");
    let popup = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(popup, popup_area);

    app.popup_area = Some(popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::AssistantClient;
    use crate::content::SiteContent;
    use ratatui::{backend::TestBackend, Terminal};

    fn test_app() -> App {
        App::new(
            SiteContent::default(),
            AssistantClient::new("http://localhost:0", None),
        )
    }

    fn draw(app: &mut App) {
        let backend = TestBackend::new(100, 36);
        let mut terminal = Terminal::new(backend).expect("terminal");
        terminal.draw(|frame| render(app, frame)).expect("draw");
    }

    #[test]
    fn every_screen_renders_and_registers_tab_targets() {
        let mut app = test_app();
        for screen in Screen::ALL {
            app.activate_tab(screen);
            draw(&mut app);
            assert_eq!(app.tab_areas.len(), Screen::ALL.len());
            assert!(app.info_button_area.is_some());
        }
    }

    #[test]
    fn chat_screen_registers_chip_and_input_targets() {
        let mut app = test_app();
        draw(&mut app);
        assert_eq!(
            app.chip_areas.len(),
            app.content.quick_questions.len().min(4)
        );
        assert!(app.input_area.is_some());
        assert!(app.chat_height > 0);
    }

    #[test]
    fn cards_screen_registers_one_target_per_card() {
        let mut app = test_app();
        app.activate_tab(Screen::Publications);
        draw(&mut app);
        assert_eq!(app.card_areas.len(), app.content.publications.len());

        app.activate_tab(Screen::Projects);
        draw(&mut app);
        assert_eq!(app.card_areas.len(), app.content.projects.len());
    }

    #[test]
    fn expanded_card_takes_more_rows_than_collapsed() {
        let mut app = test_app();
        app.activate_tab(Screen::Publications);
        draw(&mut app);
        let collapsed = app.card_areas[0].height;

        app.publications.toggle(0);
        draw(&mut app);
        assert!(app.card_areas[0].height > collapsed);
    }

    #[test]
    fn popup_area_is_tracked_only_while_open() {
        let mut app = test_app();
        draw(&mut app);
        assert!(app.popup_area.is_none());

        app.toggle_info_popup();
        draw(&mut app);
        assert!(app.popup_area.is_some());

        app.toggle_info_popup();
        draw(&mut app);
        assert!(app.popup_area.is_none());
    }

    #[test]
    fn pending_message_renders_while_in_flight() {
        let mut app = test_app();
        app.chat_input = "question".to_string();
        app.begin_question().expect("accepted");
        // Must not panic with a pending message and a ticking frame.
        app.tick_animation();
        draw(&mut app);
        assert!(app.is_busy());
    }
}
