use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use anyhow::{Result, anyhow};
use tracing::debug;

use crate::chat::HistoryEntry;

pub const DEFAULT_ANALYZE_URL: &str = "http://localhost:8000/timesheetanalyze";
pub const DEFAULT_CHAT_URL: &str = "http://localhost:8000/api/chat";

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    question: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    content: &'a str,
    history: &'a [HistoryEntry],
}

/// Known response shapes of the analysis backend, tried in declaration
/// order. The analyze endpoint wraps its payload in `result` (commonly a
/// CrewAI object carrying a `raw` string); the chat endpoint answers with
/// a flat `text` or `answer` string. Anything else lands in `Other` and
/// is left to the caller to handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisReply {
    Result { result: Value },
    Text { text: String },
    Answer { answer: String },
    Other(Value),
}

impl AnalysisReply {
    /// The reply as the server sent it, pretty-printed.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "null".to_string())
    }
}

#[derive(Clone)]
pub struct AnalysisClient {
    client: Client,
    analyze_url: String,
    chat_url: String,
}

impl AnalysisClient {
    pub fn new(analyze_url: &str, chat_url: &str) -> Self {
        Self {
            client: Client::new(),
            analyze_url: analyze_url.to_string(),
            chat_url: chat_url.to_string(),
        }
    }

    /// One question in, one reply out.
    pub async fn analyze(&self, question: &str) -> Result<AnalysisReply> {
        debug!("POST {} question={:?}", self.analyze_url, question);

        let request = AnalyzeRequest { question };
        let response = self
            .client
            .post(&self.analyze_url)
            .json(&request)
            .send()
            .await?;

        decode(response).await
    }

    /// One chat turn with a trailing window of prior turns as context.
    pub async fn chat(&self, content: &str, history: &[HistoryEntry]) -> Result<AnalysisReply> {
        debug!("POST {} content={:?} history_turns={}", self.chat_url, content, history.len());

        let request = ChatRequest { content, history };
        let response = self
            .client
            .post(&self.chat_url)
            .json(&request)
            .send()
            .await?;

        decode(response).await
    }
}

async fn decode(response: reqwest::Response) -> Result<AnalysisReply> {
    if !response.status().is_success() {
        return Err(anyhow!(
            "Request failed with status: {}. Make sure the analysis backend is running.",
            response.status()
        ));
    }

    let reply: AnalysisReply = response.json().await?;
    Ok(reply)
}


#[cfg(test)]
mod tests {
    use super::test_server::serve_once;
    use super::*;
    use tokio::net::TcpListener;

    fn request_body(raw: &str) -> Value {
        let body = raw.split("\r\n\r\n").nth(1).unwrap();
        serde_json::from_str(body).unwrap()
    }

    #[tokio::test]
    async fn analyze_posts_question_in_body() {
        let (url, server) = serve_once("200 OK", r#"{"result":{"raw":"X"}}"#).await;
        let client = AnalysisClient::new(&url, &url);

        let reply = client.analyze("hours for Priya last week").await.unwrap();

        let raw = server.await.unwrap();
        assert_eq!(raw.lines().next().unwrap(), "POST / HTTP/1.1");
        assert_eq!(request_body(&raw)["question"], "hours for Priya last week");
        match reply {
            AnalysisReply::Result { result } => assert_eq!(result["raw"], "X"),
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[tokio::test]
    async fn chat_posts_content_and_history() {
        let (url, server) = serve_once("200 OK", r#"{"text":"hi"}"#).await;
        let client = AnalysisClient::new(&url, &url);
        let history = vec![
            HistoryEntry::user("earlier question"),
            HistoryEntry::assistant("earlier answer"),
        ];

        let reply = client.chat("follow-up", &history).await.unwrap();

        let body = request_body(&server.await.unwrap());
        assert_eq!(body["content"], "follow-up");
        assert_eq!(body["history"][0]["role"], "user");
        assert_eq!(body["history"][1]["content"], "earlier answer");
        assert!(matches!(reply, AnalysisReply::Text { .. }));
    }

    #[tokio::test]
    async fn http_500_surfaces_status_in_error() {
        let (url, server) = serve_once("500 Internal Server Error", r#"{"detail":"boom"}"#).await;
        let client = AnalysisClient::new(&url, &url);

        let err = client.analyze("anything").await.unwrap_err();

        assert!(err.to_string().contains("500"), "error was: {}", err);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn unknown_shape_decodes_to_other() {
        let (url, server) = serve_once("200 OK", "{}").await;
        let client = AnalysisClient::new(&url, &url);

        let reply = client.analyze("anything").await.unwrap();

        assert!(matches!(reply, AnalysisReply::Other(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn connection_refused_is_an_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let client = AnalysisClient::new(&url, &url);
        assert!(client.analyze("anything").await.is_err());
    }

    #[test]
    fn reply_decode_prefers_declared_order() {
        let reply: AnalysisReply = serde_json::from_str(r#"{"text":"a","answer":"b"}"#).unwrap();
        assert!(matches!(reply, AnalysisReply::Text { .. }));

        let reply: AnalysisReply = serde_json::from_str(r#"{"answer":"b"}"#).unwrap();
        assert!(matches!(reply, AnalysisReply::Answer { .. }));
    }

    #[test]
    fn reply_round_trips_through_pretty_json() {
        let reply: AnalysisReply = serde_json::from_str(r#"{"result":{"raw":"X"}}"#).unwrap();
        let pretty = reply.to_pretty_json();
        assert!(pretty.contains("\"raw\": \"X\""), "got: {}", pretty);
    }
}
