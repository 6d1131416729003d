use anyhow::Result;
use ratatui::layout::Rect;
use tokio::task::JoinHandle;

use crate::backend::{AssistantClient, FALLBACK_REPLY};
use crate::content::SiteContent;

/// The mutually exclusive panels behind the tab bar. Using an enum means
/// there is always exactly one active tab; there is no "none selected"
/// state to defend against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Chat,
    Publications,
    Projects,
}

impl Screen {
    pub const ALL: [Screen; 3] = [Screen::Chat, Screen::Publications, Screen::Projects];

    pub fn title(&self) -> &'static str {
        match self {
            Screen::Chat => "Chat",
            Screen::Publications => "Publications",
            Screen::Projects => "Projects",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

/// One conversation turn. While a question is in flight the assistant's
/// slot exists as a pending message whose body renders as an animated
/// ellipsis; completion fills it in place.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub pending: bool,
}

/// Accordion state for one group of expandable cards. At most one card
/// in a group is open; the field's type enforces it.
#[derive(Debug, Clone)]
pub struct CardGroup {
    len: usize,
    pub cursor: usize,
    pub expanded: Option<usize>,
}

impl CardGroup {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            cursor: 0,
            expanded: None,
        }
    }

    /// Open the card at `idx`, closing whichever sibling was open.
    /// Toggling the already-open card closes it, leaving none open.
    pub fn toggle(&mut self, idx: usize) {
        if idx >= self.len {
            return;
        }
        self.cursor = idx;
        self.expanded = if self.expanded == Some(idx) {
            None
        } else {
            Some(idx)
        };
    }

    pub fn toggle_selected(&mut self) {
        self.toggle(self.cursor);
    }

    pub fn is_expanded(&self, idx: usize) -> bool {
        self.expanded == Some(idx)
    }

    pub fn cursor_down(&mut self) {
        if self.len > 0 {
            self.cursor = (self.cursor + 1).min(self.len - 1);
        }
    }

    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

pub struct App {
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,

    // Chat state
    pub chat_messages: Vec<ChatMessage>,
    pub chat_input: String,
    pub chat_cursor: usize,
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,
    pub answer_task: Option<JoinHandle<Result<String>>>,
    pub animation_frame: u8,

    // Card state for the two accordion tabs
    pub publications: CardGroup,
    pub projects: CardGroup,

    // Info popup
    pub show_info_popup: bool,

    // Click targets, refreshed on every render (mouse hit-testing)
    pub tab_areas: Vec<(Screen, Rect)>,
    pub chip_areas: Vec<Rect>,
    pub card_areas: Vec<Rect>,
    pub input_area: Option<Rect>,
    pub info_button_area: Option<Rect>,
    pub popup_area: Option<Rect>,

    pub content: SiteContent,
    pub client: AssistantClient,
}

impl App {
    pub fn new(content: SiteContent, client: AssistantClient) -> Self {
        let publications = CardGroup::new(content.publications.len());
        let projects = CardGroup::new(content.projects.len());

        // The site greets visitors before they type anything.
        let chat_messages = vec![ChatMessage {
            role: ChatRole::Assistant,
            content: content.welcome.clone(),
            pending: false,
        }];

        Self {
            should_quit: false,
            screen: Screen::Chat,
            input_mode: InputMode::Normal,

            chat_messages,
            chat_input: String::new(),
            chat_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            answer_task: None,
            animation_frame: 0,

            publications,
            projects,

            show_info_popup: false,

            tab_areas: Vec::new(),
            chip_areas: Vec::new(),
            card_areas: Vec::new(),
            input_area: None,
            info_button_area: None,
            popup_area: None,

            content,
            client,
        }
    }

    /// A question is in flight while its pending assistant message exists.
    pub fn is_busy(&self) -> bool {
        self.chat_messages.iter().any(|m| m.pending)
    }

    /// Take the typed question and record both sides of the turn: the
    /// user's message and the pending assistant reply. Returns the text
    /// to send, or `None` when the input was blank or a question is
    /// already in flight (the input is left untouched in both cases).
    /// The input clears on submission, before any response arrives.
    pub fn begin_question(&mut self) -> Option<String> {
        if self.is_busy() {
            return None;
        }
        let question = self.chat_input.trim().to_string();
        if question.is_empty() {
            return None;
        }

        self.chat_messages.push(ChatMessage {
            role: ChatRole::User,
            content: question.clone(),
            pending: false,
        });
        self.chat_messages.push(ChatMessage {
            role: ChatRole::Assistant,
            content: String::new(),
            pending: true,
        });

        self.chat_input.clear();
        self.chat_cursor = 0;
        self.animation_frame = 0;
        self.scroll_chat_to_bottom();

        Some(question)
    }

    /// Quick-question chips: put the preset into the input field, then
    /// follow the exact same path as a typed question.
    pub fn begin_quick_question(&mut self, idx: usize) -> Option<String> {
        if self.is_busy() {
            return None;
        }
        let preset = self.content.quick_questions.get(idx)?.clone();
        self.chat_cursor = preset.chars().count();
        self.chat_input = preset;
        self.begin_question()
    }

    /// Resolve the in-flight turn. The pending message becomes either
    /// the backend's answer or the fixed fallback line; the error detail
    /// goes to the log, never to the visitor.
    pub fn complete_answer(&mut self, result: Result<String>) {
        let reply = match result {
            Ok(text) => text,
            Err(err) => {
                tracing::error!("backend request failed: {err:#}");
                FALLBACK_REPLY.to_string()
            }
        };

        if let Some(message) = self.chat_messages.iter_mut().rev().find(|m| m.pending) {
            message.content = reply;
            message.pending = false;
        } else {
            // No placeholder left to fill (should not happen); append so
            // the answer is not silently dropped.
            self.chat_messages.push(ChatMessage {
                role: ChatRole::Assistant,
                content: reply,
                pending: false,
            });
        }
        self.scroll_chat_to_bottom();
    }

    pub fn activate_tab(&mut self, screen: Screen) {
        self.screen = screen;
    }

    pub fn next_tab(&mut self) {
        let idx = Screen::ALL
            .iter()
            .position(|s| *s == self.screen)
            .unwrap_or(0);
        self.screen = Screen::ALL[(idx + 1) % Screen::ALL.len()];
    }

    pub fn prev_tab(&mut self) {
        let idx = Screen::ALL
            .iter()
            .position(|s| *s == self.screen)
            .unwrap_or(0);
        self.screen = Screen::ALL[(idx + Screen::ALL.len() - 1) % Screen::ALL.len()];
    }

    /// The card group shown on the current tab, if it has one.
    pub fn cards_mut(&mut self) -> Option<&mut CardGroup> {
        match self.screen {
            Screen::Chat => None,
            Screen::Publications => Some(&mut self.publications),
            Screen::Projects => Some(&mut self.projects),
        }
    }

    pub fn toggle_info_popup(&mut self) {
        self.show_info_popup = !self.show_info_popup;
    }

    pub fn scroll_chat_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.max_chat_scroll());
    }

    pub fn scroll_chat_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    /// Keep the newest message (or the typing indicator) in view.
    pub fn scroll_chat_to_bottom(&mut self) {
        self.chat_scroll = self.max_chat_scroll();
    }

    fn max_chat_scroll(&self) -> u16 {
        let height = if self.chat_height > 0 { self.chat_height } else { 20 };
        self.rendered_chat_lines().saturating_sub(height)
    }

    /// Estimate how many terminal rows the conversation occupies once
    /// wrapped, mirroring how the chat pane renders it: a role line,
    /// the wrapped body (or one indicator line while pending), and a
    /// blank separator per message.
    fn rendered_chat_lines(&self) -> u16 {
        let width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            60
        };

        let mut total: u16 = 0;
        for message in &self.chat_messages {
            total += 1;
            if message.pending {
                total += 1;
            } else {
                for line in message.content.lines() {
                    let chars = line.chars().count();
                    total += if chars == 0 {
                        1
                    } else {
                        ((chars - 1) / width + 1) as u16
                    };
                }
            }
            total += 1;
        }
        total
    }

    /// Advance the typing-indicator ellipsis (".", "..", "...") once per
    /// tick while an answer is pending.
    pub fn tick_animation(&mut self) {
        if self.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn test_app() -> App {
        App::new(
            SiteContent::default(),
            AssistantClient::new("http://localhost:0", None),
        )
    }

    #[test]
    fn starts_with_welcome_message_on_chat_tab() {
        let app = test_app();
        assert_eq!(app.screen, Screen::Chat);
        assert_eq!(app.chat_messages.len(), 1);
        assert_eq!(app.chat_messages[0].role, ChatRole::Assistant);
        assert!(!app.chat_messages[0].pending);
    }

    #[test]
    fn whitespace_only_input_is_a_noop() {
        let mut app = test_app();
        app.chat_input = "   \t  ".to_string();
        assert!(app.begin_question().is_none());
        assert_eq!(app.chat_messages.len(), 1);
        // Input is not cleared on a rejected submission.
        assert_eq!(app.chat_input, "   \t  ");
    }

    #[test]
    fn submit_appends_user_message_then_placeholder() {
        let mut app = test_app();
        app.chat_input = "  what is RAG?  ".to_string();

        let question = app.begin_question().expect("question accepted");
        assert_eq!(question, "what is RAG?");
        assert_eq!(app.chat_messages.len(), 3);

        let user = &app.chat_messages[1];
        assert_eq!(user.role, ChatRole::User);
        assert_eq!(user.content, "what is RAG?");

        let placeholder = &app.chat_messages[2];
        assert_eq!(placeholder.role, ChatRole::Assistant);
        assert!(placeholder.pending);

        // Input clears immediately, before any response arrives.
        assert!(app.chat_input.is_empty());
        assert_eq!(app.chat_cursor, 0);
    }

    #[test]
    fn success_replaces_placeholder_without_duplicating() {
        let mut app = test_app();
        app.chat_input = "hello".to_string();
        app.begin_question().expect("accepted");

        app.complete_answer(Ok("X".to_string()));

        assert_eq!(app.chat_messages.len(), 3);
        let answer = &app.chat_messages[2];
        assert_eq!(answer.content, "X");
        assert!(!answer.pending);
        assert!(!app.is_busy());
    }

    #[test]
    fn failure_replaces_placeholder_with_fallback() {
        let mut app = test_app();
        app.chat_input = "hello".to_string();
        app.begin_question().expect("accepted");

        app.complete_answer(Err(anyhow!("connection refused")));

        let answer = &app.chat_messages[2];
        assert_eq!(answer.content, FALLBACK_REPLY);
        assert!(!answer.pending);
    }

    #[test]
    fn submissions_are_ignored_while_a_question_is_in_flight() {
        let mut app = test_app();
        app.chat_input = "first".to_string();
        app.begin_question().expect("accepted");

        app.chat_input = "second".to_string();
        assert!(app.begin_question().is_none());
        assert!(app.begin_quick_question(0).is_none());
        assert_eq!(app.chat_messages.len(), 3);
        assert_eq!(app.chat_input, "second");
    }

    #[test]
    fn quick_question_submits_the_preset() {
        let mut app = test_app();
        let preset = app.content.quick_questions[1].clone();

        let question = app.begin_quick_question(1).expect("accepted");
        assert_eq!(question, preset);
        assert_eq!(app.chat_messages[1].content, preset);
        assert!(app.chat_messages[2].pending);
    }

    #[test]
    fn quick_question_out_of_range_is_a_noop() {
        let mut app = test_app();
        assert!(app.begin_quick_question(99).is_none());
        assert_eq!(app.chat_messages.len(), 1);
    }

    #[test]
    fn message_list_stays_ordered_across_turns() {
        let mut app = test_app();
        for (question, answer) in [("one", "1"), ("two", "2")] {
            app.chat_input = question.to_string();
            app.begin_question().expect("accepted");
            app.complete_answer(Ok(answer.to_string()));
        }

        let roles: Vec<ChatRole> = app.chat_messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                ChatRole::Assistant,
                ChatRole::User,
                ChatRole::Assistant,
                ChatRole::User,
                ChatRole::Assistant,
            ]
        );
        assert_eq!(app.chat_messages[2].content, "1");
        assert_eq!(app.chat_messages[4].content, "2");
    }

    #[test]
    fn tab_activation_selects_exactly_one_screen() {
        let mut app = test_app();
        app.activate_tab(Screen::Publications);
        assert_eq!(app.screen, Screen::Publications);
        app.activate_tab(Screen::Projects);
        assert_eq!(app.screen, Screen::Projects);
    }

    #[test]
    fn tab_cycling_wraps_both_ways() {
        let mut app = test_app();
        app.next_tab();
        assert_eq!(app.screen, Screen::Publications);
        app.next_tab();
        app.next_tab();
        assert_eq!(app.screen, Screen::Chat);
        app.prev_tab();
        assert_eq!(app.screen, Screen::Projects);
    }

    #[test]
    fn opening_a_card_closes_its_sibling() {
        let mut cards = CardGroup::new(3);
        cards.toggle(0);
        assert!(cards.is_expanded(0));

        cards.toggle(1);
        assert!(cards.is_expanded(1));
        assert!(!cards.is_expanded(0));

        cards.toggle(1);
        assert_eq!(cards.expanded, None);
    }

    #[test]
    fn card_groups_are_independent() {
        let mut app = test_app();
        app.publications.toggle(0);
        app.projects.toggle(1);
        assert!(app.publications.is_expanded(0));
        assert!(app.projects.is_expanded(1));
    }

    #[test]
    fn card_toggle_out_of_range_is_a_noop() {
        let mut cards = CardGroup::new(2);
        cards.toggle(5);
        assert_eq!(cards.expanded, None);
    }

    #[test]
    fn card_cursor_clamps_at_both_ends() {
        let mut cards = CardGroup::new(2);
        cards.cursor_up();
        assert_eq!(cards.cursor, 0);
        cards.cursor_down();
        cards.cursor_down();
        cards.cursor_down();
        assert_eq!(cards.cursor, 1);
    }

    #[test]
    fn info_popup_toggles() {
        let mut app = test_app();
        assert!(!app.show_info_popup);
        app.toggle_info_popup();
        assert!(app.show_info_popup);
        app.toggle_info_popup();
        assert!(!app.show_info_popup);
    }

    #[test]
    fn ellipsis_advances_only_while_pending() {
        let mut app = test_app();
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);

        app.chat_input = "q".to_string();
        app.begin_question().expect("accepted");
        app.tick_animation();
        app.tick_animation();
        assert_eq!(app.animation_frame, 2);
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);
    }
}
