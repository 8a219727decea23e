use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::AnalysisReply;

/// Most recent turns sent upstream as conversational context.
pub const HISTORY_WINDOW: usize = 10;

/// Shown when the backend reply matches none of the known shapes.
pub const NO_RESULT_FALLBACK: &str = "No result received from the server.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

/// One transcript entry as the chat screen renders it.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Wire shape of one prior turn, as the chat endpoint expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: String,
    pub content: String,
}

impl HistoryEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Payload produced by the request interceptor.
#[derive(Debug, Clone)]
pub struct OutgoingTurn {
    pub content: String,
    pub history: Vec<HistoryEntry>,
}

/// Conversation state owned by one chat screen instance. The message list
/// is what the user sees; the history list is the parallel role/content
/// record a window of which goes to the backend. Both are append-only for
/// the session and die with it.
#[derive(Debug)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    history: Vec<HistoryEntry>,
    window: usize,
}

impl Transcript {
    pub fn with_window(window: usize) -> Self {
        Self {
            messages: Vec::new(),
            history: Vec::new(),
            window,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Trailing window of accumulated turns, oldest first.
    pub fn history_window(&self) -> Vec<HistoryEntry> {
        let skip = self.history.len().saturating_sub(self.window);
        self.history[skip..].to_vec()
    }

    /// Request interceptor: records the outgoing user turn and returns the
    /// payload for the backend. The attached window holds only turns prior
    /// to this one.
    pub fn begin_turn(&mut self, text: &str) -> OutgoingTurn {
        let history = self.history_window();

        self.messages.push(ChatMessage {
            role: ChatRole::User,
            content: text.to_string(),
        });
        self.history.push(HistoryEntry::user(text));

        OutgoingTurn {
            content: text.to_string(),
            history,
        }
    }

    /// Response interceptor: rewrites the reply into the fragment the
    /// transcript renders and records it as the assistant turn.
    pub fn complete_turn(&mut self, reply: &AnalysisReply) -> String {
        let rendered = format_response(reply);
        self.push_assistant(rendered.clone());
        rendered
    }

    /// Records an assistant-side message that did not come from a reply,
    /// such as a request error shown inline.
    pub fn push_assistant(&mut self, content: String) {
        self.history.push(HistoryEntry::assistant(content.as_str()));
        self.messages.push(ChatMessage {
            role: ChatRole::Assistant,
            content,
        });
    }
}

/// Rewrites a backend reply into what the transcript renders: flat strings
/// pass through, `result` payloads become a `<div>` fragment around the
/// nested `raw` string (or the pretty-printed JSON when `raw` is absent),
/// and unrecognized shapes fall back to a fixed message.
pub fn format_response(reply: &AnalysisReply) -> String {
    match reply {
        AnalysisReply::Text { text } => text.clone(),
        AnalysisReply::Answer { answer } => answer.clone(),
        AnalysisReply::Result { result } => {
            let body = match result.get("raw").and_then(Value::as_str) {
                Some(raw) => raw.to_string(),
                None => serde_json::to_string_pretty(result).unwrap_or_else(|_| result.to_string()),
            };
            format!("<div>{}</div>", body)
        }
        AnalysisReply::Other(_) => NO_RESULT_FALLBACK.to_string(),
    }
}
