use tokio::task::{JoinError, JoinHandle};
use tracing::warn;

use crate::backend::{AnalysisClient, AnalysisReply};
use crate::chat::Transcript;
use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Ask,
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

type PendingReply = JoinHandle<anyhow::Result<AnalysisReply>>;

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,

    // Ask screen state
    pub question_input: String,
    pub question_cursor: usize, // cursor position in question_input
    pub ask_result: Option<String>,
    pub ask_error: Option<String>,
    pub ask_loading: bool,
    pub ask_task: Option<PendingReply>,
    pub ask_scroll: u16,

    // Chat screen state
    pub chat_input: String,
    pub chat_cursor: usize,
    pub transcript: Transcript,
    pub chat_loading: bool,
    pub chat_task: Option<PendingReply>,
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    pub client: AnalysisClient,
}

impl App {
    pub fn new(config: &Config) -> Self {
        let client = AnalysisClient::new(config.analyze_url(), config.chat_url());

        Self {
            should_quit: false,
            screen: Screen::Ask,
            input_mode: InputMode::Editing,

            question_input: String::new(),
            question_cursor: 0,
            ask_result: None,
            ask_error: None,
            ask_loading: false,
            ask_task: None,
            ask_scroll: 0,

            chat_input: String::new(),
            chat_cursor: 0,
            transcript: Transcript::with_window(config.history_window()),
            chat_loading: false,
            chat_task: None,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            animation_frame: 0,

            client,
        }
    }

    /// Ask-screen submit: one request at a time, loading flag up for its
    /// whole lifetime, previous error cleared up front.
    pub fn submit_question(&mut self) {
        if self.question_input.is_empty() || self.ask_task.is_some() {
            return;
        }

        let question = self.question_input.clone();
        self.ask_error = None;
        self.ask_loading = true;
        self.ask_scroll = 0;

        let client = self.client.clone();
        self.ask_task = Some(tokio::spawn(async move { client.analyze(&question).await }));
    }

    /// Chat-screen submit: runs the outbound interceptor, then spawns the
    /// request. Refused while a previous turn is still pending.
    pub fn submit_chat_message(&mut self) {
        if self.chat_input.is_empty() || self.chat_task.is_some() {
            return;
        }

        let text = self.chat_input.clone();
        self.chat_input.clear();
        self.chat_cursor = 0;
        self.chat_loading = true;

        let turn = self.transcript.begin_turn(&text);
        self.scroll_chat_to_bottom();

        let client = self.client.clone();
        self.chat_task = Some(tokio::spawn(async move {
            client.chat(&turn.content, &turn.history).await
        }));
    }

    /// Reap finished request tasks. Called from the main loop; the tick
    /// event guarantees it runs even when no keys arrive.
    pub async fn poll_tasks(&mut self) {
        if let Some(task) = self.ask_task.take() {
            if task.is_finished() {
                self.finish_ask(task.await);
            } else {
                self.ask_task = Some(task);
            }
        }

        if let Some(task) = self.chat_task.take() {
            if task.is_finished() {
                self.finish_chat(task.await);
            } else {
                self.chat_task = Some(task);
            }
        }
    }

    fn finish_ask(&mut self, outcome: Result<anyhow::Result<AnalysisReply>, JoinError>) {
        self.ask_loading = false;
        match outcome {
            Ok(Ok(reply)) => {
                self.ask_result = Some(reply.to_pretty_json());
                self.ask_error = None;
            }
            Ok(Err(e)) => {
                warn!("analyze request failed: {:#}", e);
                self.ask_error = Some(e.to_string());
            }
            Err(e) => {
                warn!("analyze task died: {}", e);
                self.ask_error = Some("Request failed unexpectedly.".to_string());
            }
        }
    }

    fn finish_chat(&mut self, outcome: Result<anyhow::Result<AnalysisReply>, JoinError>) {
        self.chat_loading = false;
        match outcome {
            Ok(Ok(reply)) => {
                self.transcript.complete_turn(&reply);
            }
            Ok(Err(e)) => {
                warn!("chat request failed: {:#}", e);
                self.transcript.push_assistant(format!("Error: {}", e));
            }
            Err(e) => {
                warn!("chat task died: {}", e);
                self.transcript
                    .push_assistant("Error: request failed unexpectedly.".to_string());
            }
        }
        self.scroll_chat_to_bottom();
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.ask_loading || self.chat_loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Scroll the transcript so the latest turn (or the pending indicator)
    /// is visible.
    pub fn scroll_chat_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in self.transcript.messages() {
            total_lines += 1; // Role line ("You:" or "AI:")
            for line in msg.content.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1; // Empty line still takes one line
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // Blank line after message
        }

        // Add lines for the pending indicator
        total_lines += 2; // "AI:" + "Thinking..."

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        if total_lines > visible_height {
            self.chat_scroll = total_lines.saturating_sub(visible_height);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::test_server::serve_once;
    use crate::chat::{ChatRole, NO_RESULT_FALLBACK};

    fn test_app(url: &str) -> App {
        let config = Config {
            analyze_url: Some(url.to_string()),
            chat_url: Some(url.to_string()),
            history_window: None,
        };
        App::new(&config)
    }

    async fn settle(app: &mut App) {
        for _ in 0..500 {
            app.poll_tasks().await;
            if app.ask_task.is_none() && app.chat_task.is_none() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("request did not settle");
    }

    #[tokio::test]
    async fn ask_success_clears_loading_and_stores_pretty_result() {
        let (url, server) = serve_once("200 OK", r#"{"result":{"raw":"X"}}"#).await;
        let mut app = test_app(&url);
        app.question_input = "total hours per project".to_string();

        assert!(!app.ask_loading);
        app.submit_question();
        assert!(app.ask_loading);

        settle(&mut app).await;
        server.await.unwrap();

        assert!(!app.ask_loading);
        assert!(app.ask_error.is_none());
        let rendered = app.ask_result.expect("result should be stored");
        assert!(rendered.contains("\"raw\": \"X\""), "got: {}", rendered);
    }

    #[tokio::test]
    async fn ask_http_error_clears_loading_and_reports_status() {
        let (url, server) = serve_once("500 Internal Server Error", "{}").await;
        let mut app = test_app(&url);
        app.question_input = "anything".to_string();

        app.submit_question();
        assert!(app.ask_loading);

        settle(&mut app).await;
        server.await.unwrap();

        assert!(!app.ask_loading);
        assert!(app.ask_result.is_none());
        let error = app.ask_error.expect("error should be stored");
        assert!(error.contains("500"), "got: {}", error);
    }

    #[tokio::test]
    async fn ask_network_error_clears_loading_and_reports_message() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let mut app = test_app(&url);
        app.question_input = "anything".to_string();

        app.submit_question();
        assert!(app.ask_loading);

        settle(&mut app).await;

        assert!(!app.ask_loading);
        assert!(app.ask_error.is_some());
    }

    #[tokio::test]
    async fn empty_question_is_not_submitted() {
        let mut app = test_app("http://localhost:1");

        app.submit_question();

        assert!(!app.ask_loading);
        assert!(app.ask_task.is_none());
    }

    #[tokio::test]
    async fn chat_turn_appends_both_sides_of_the_transcript() {
        let (url, server) = serve_once("200 OK", r#"{"text":"about 120 hours"}"#).await;
        let mut app = test_app(&url);
        app.chat_input = "how many hours last week?".to_string();

        app.submit_chat_message();
        assert!(app.chat_loading);
        assert!(app.chat_input.is_empty());

        settle(&mut app).await;
        server.await.unwrap();

        assert!(!app.chat_loading);
        let messages = app.transcript.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::User);
        assert_eq!(messages[1].content, "about 120 hours");
    }

    #[tokio::test]
    async fn chat_unrecognized_reply_shows_fallback() {
        let (url, server) = serve_once("200 OK", "{}").await;
        let mut app = test_app(&url);
        app.chat_input = "anything".to_string();

        app.submit_chat_message();
        settle(&mut app).await;
        server.await.unwrap();

        let messages = app.transcript.messages();
        assert_eq!(messages[1].content, NO_RESULT_FALLBACK);
    }
}
