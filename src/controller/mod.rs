//! Client-side conversation controller.
//!
//! Owns the transcript for one session and gates submissions through an
//! explicit {Idle, Ingesting, Answering} state machine: only Idle
//! accepts a new message or link, so at most one operation is in flight
//! across both kinds. Streamed answer fragments are appended to the
//! last (placeholder) turn in arrival order.

pub mod http;

use async_trait::async_trait;

use crate::core::errors::ApiError;
use crate::llm::{ChatMessage, TokenStream};

pub use http::HttpChatService;

pub const WELCOME_MESSAGE: &str = "Welcome to ResearchQuery! I'm here to help you dive deep into research papers and extract the information you need. Upload a link to a paper, and ask me anything you'd like to know about it.";
pub const CHAT_ERROR_MESSAGE: &str =
    "I'm sorry, but I encountered an error. Please try again later.";
pub const LINK_RECEIVED_MESSAGE: &str =
    "Thank you for uploading the link! I'm verifying and loading the data now.";
pub const LINK_PATIENCE_MESSAGE: &str =
    "This may take a moment. Please be patient as I gather and analyze the information.";
pub const LINK_SUCCESS_MESSAGE: &str =
    "Data successfully loaded! What specific information would you like to explore?";
pub const LINK_ERROR_MESSAGE: &str =
    "Oops! There was an issue loading the data. Please try again or check the link.";

/// Transport seam between the controller and the two server operations.
#[async_trait]
pub trait ChatService: Send + Sync {
    async fn ingest(&self, url: &str) -> Result<(), ApiError>;

    async fn answer(
        &self,
        query: &str,
        history: &[ChatMessage],
    ) -> Result<TokenStream, ApiError>;
}

/// Observer for transcript changes; models the per-change re-render
/// (and auto-scroll) of a chat view.
pub trait TranscriptSink {
    fn turn_added(&mut self, _turn: &ChatMessage) {}
    fn fragment_appended(&mut self, _fragment: &str) {}
    /// The placeholder turn's content was replaced wholesale (stream
    /// failure apology).
    fn turn_replaced(&mut self, _turn: &ChatMessage) {}
}

/// Sink that ignores all notifications.
pub struct NullSink;

impl TranscriptSink for NullSink {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Ingesting,
    Answering,
}

/// Whether a submission was accepted or dropped by the busy gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Accepted,
    Rejected,
}

pub struct Controller<S: ChatService> {
    service: S,
    transcript: Vec<ChatMessage>,
    phase: Phase,
}

impl<S: ChatService> Controller<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            transcript: vec![ChatMessage::assistant(WELCOME_MESSAGE)],
            phase: Phase::Idle,
        }
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Sends a user message and streams the answer into the transcript.
    ///
    /// Empty input and submissions made while another operation is in
    /// flight are dropped without touching the transcript. On stream
    /// failure the placeholder turn is replaced with a fixed apology.
    pub async fn submit_message(
        &mut self,
        text: &str,
        sink: &mut dyn TranscriptSink,
    ) -> Submission {
        if text.trim().is_empty() || self.phase != Phase::Idle {
            return Submission::Rejected;
        }
        self.phase = Phase::Answering;

        // The query travels separately from the history, which holds
        // only the turns that precede it.
        let history = self.transcript.clone();
        self.push_turn(ChatMessage::user(text), sink);
        self.push_turn(ChatMessage::assistant(""), sink);

        if let Err(err) = self.stream_answer(text, &history, sink).await {
            tracing::warn!("Answer stream failed: {}", err);
            if let Some(last) = self.transcript.last_mut() {
                last.content = CHAT_ERROR_MESSAGE.to_string();
                sink.turn_replaced(last);
            }
        }

        self.phase = Phase::Idle;
        Submission::Accepted
    }

    /// Submits a document link for ingestion.
    pub async fn submit_link(&mut self, url: &str, sink: &mut dyn TranscriptSink) -> Submission {
        if url.trim().is_empty() || self.phase != Phase::Idle {
            return Submission::Rejected;
        }
        self.phase = Phase::Ingesting;

        // Optimistic feedback before the slow operation starts.
        self.push_turn(ChatMessage::assistant(LINK_RECEIVED_MESSAGE), sink);
        self.push_turn(ChatMessage::assistant(LINK_PATIENCE_MESSAGE), sink);

        let outcome = match self.service.ingest(url).await {
            Ok(()) => LINK_SUCCESS_MESSAGE,
            Err(err) => {
                tracing::warn!("Ingestion of {} failed: {}", url, err);
                LINK_ERROR_MESSAGE
            }
        };
        self.push_turn(ChatMessage::assistant(outcome), sink);

        self.phase = Phase::Idle;
        Submission::Accepted
    }

    async fn stream_answer(
        &mut self,
        query: &str,
        history: &[ChatMessage],
        sink: &mut dyn TranscriptSink,
    ) -> Result<(), ApiError> {
        let mut rx = self.service.answer(query, history).await?;

        while let Some(item) = rx.recv().await {
            let fragment = item?;
            if let Some(last) = self.transcript.last_mut() {
                last.content.push_str(&fragment);
            }
            sink.fragment_appended(&fragment);
        }

        Ok(())
    }

    fn push_turn(&mut self, turn: ChatMessage, sink: &mut dyn TranscriptSink) {
        sink.turn_added(&turn);
        self.transcript.push(turn);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    struct ScriptedService {
        fragments: Vec<String>,
        fail_answer: bool,
        fail_stream: bool,
        fail_ingest: bool,
        answer_calls: Arc<AtomicUsize>,
        ingest_calls: Arc<AtomicUsize>,
    }

    impl ScriptedService {
        fn answering(fragments: &[&str]) -> Self {
            Self {
                fragments: fragments.iter().map(|f| f.to_string()).collect(),
                fail_answer: false,
                fail_stream: false,
                fail_ingest: false,
                answer_calls: Arc::new(AtomicUsize::new(0)),
                ingest_calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl ChatService for ScriptedService {
        async fn ingest(&self, _url: &str) -> Result<(), ApiError> {
            self.ingest_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_ingest {
                return Err(ApiError::Internal("ingestion failed".to_string()));
            }
            Ok(())
        }

        async fn answer(
            &self,
            _query: &str,
            _history: &[ChatMessage],
        ) -> Result<TokenStream, ApiError> {
            self.answer_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_answer {
                return Err(ApiError::Internal("answer failed".to_string()));
            }

            let (tx, rx) = mpsc::channel(8);
            let fragments = self.fragments.clone();
            let fail_stream = self.fail_stream;
            tokio::spawn(async move {
                for fragment in fragments {
                    if tx.send(Ok(fragment)).await.is_err() {
                        return;
                    }
                }
                if fail_stream {
                    let _ = tx
                        .send(Err(ApiError::Internal("stream died".to_string())))
                        .await;
                }
            });
            Ok(rx)
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        turns: usize,
        fragments: Vec<String>,
    }

    impl TranscriptSink for RecordingSink {
        fn turn_added(&mut self, _turn: &ChatMessage) {
            self.turns += 1;
        }

        fn fragment_appended(&mut self, fragment: &str) {
            self.fragments.push(fragment.to_string());
        }
    }

    #[tokio::test]
    async fn message_streams_into_placeholder_turn() {
        let mut controller =
            Controller::new(ScriptedService::answering(&["Hello", ", ", "world", "!"]));
        let mut sink = RecordingSink::default();

        let outcome = controller.submit_message("greet me", &mut sink).await;

        assert_eq!(outcome, Submission::Accepted);
        assert_eq!(controller.phase(), Phase::Idle);

        let transcript = controller.transcript();
        assert_eq!(transcript.len(), 3); // welcome + user + assistant
        assert_eq!(transcript[1].content, "greet me");
        assert_eq!(transcript[2].content, "Hello, world!");

        // One re-render notification per fragment, in order.
        assert_eq!(sink.fragments, vec!["Hello", ", ", "world", "!"]);
        assert_eq!(sink.turns, 2);
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let mut controller = Controller::new(ScriptedService::answering(&[]));
        let calls = controller.service.answer_calls.clone();

        let outcome = controller.submit_message("   ", &mut NullSink).await;

        assert_eq!(outcome, Submission::Rejected);
        assert_eq!(controller.transcript().len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_answer_replaces_placeholder_with_apology() {
        let mut controller = Controller::new(ScriptedService {
            fail_answer: true,
            ..ScriptedService::answering(&[])
        });

        controller.submit_message("query", &mut NullSink).await;

        let transcript = controller.transcript();
        assert_eq!(transcript.last().unwrap().content, CHAT_ERROR_MESSAGE);
        assert_eq!(controller.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn mid_stream_failure_also_yields_apology() {
        let mut controller = Controller::new(ScriptedService {
            fail_stream: true,
            ..ScriptedService::answering(&["partial "])
        });

        controller.submit_message("query", &mut NullSink).await;

        // Partial content is discarded along with the failure.
        let transcript = controller.transcript();
        assert_eq!(transcript.last().unwrap().content, CHAT_ERROR_MESSAGE);
        assert_eq!(controller.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn link_flow_appends_optimistic_then_outcome_turns() {
        let mut controller = Controller::new(ScriptedService::answering(&[]));
        let mut sink = RecordingSink::default();

        let outcome = controller
            .submit_link("https://example.com/paper", &mut sink)
            .await;

        assert_eq!(outcome, Submission::Accepted);
        let transcript = controller.transcript();
        assert_eq!(transcript.len(), 4);
        assert_eq!(transcript[1].content, LINK_RECEIVED_MESSAGE);
        assert_eq!(transcript[2].content, LINK_PATIENCE_MESSAGE);
        assert_eq!(transcript[3].content, LINK_SUCCESS_MESSAGE);
        assert_eq!(sink.turns, 3);
    }

    #[tokio::test]
    async fn failed_ingestion_appends_error_turn() {
        let mut controller = Controller::new(ScriptedService {
            fail_ingest: true,
            ..ScriptedService::answering(&[])
        });

        controller
            .submit_link("https://bad.example", &mut NullSink)
            .await;

        let transcript = controller.transcript();
        assert_eq!(transcript.last().unwrap().content, LINK_ERROR_MESSAGE);
        assert_eq!(controller.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn empty_link_is_rejected() {
        let mut controller = Controller::new(ScriptedService::answering(&[]));
        let calls = controller.service.ingest_calls.clone();

        let outcome = controller.submit_link("  ", &mut NullSink).await;

        assert_eq!(outcome, Submission::Rejected);
        assert_eq!(controller.transcript().len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn busy_controller_rejects_concurrent_submissions() {
        let mut controller = Controller::new(ScriptedService::answering(&[]));
        controller.phase = Phase::Answering;

        assert_eq!(
            controller.submit_message("second", &mut NullSink).await,
            Submission::Rejected
        );
        assert_eq!(
            controller.submit_link("https://example.com", &mut NullSink).await,
            Submission::Rejected
        );
        assert_eq!(controller.transcript().len(), 1);

        controller.phase = Phase::Idle;
        assert_eq!(
            controller.submit_message("now it works", &mut NullSink).await,
            Submission::Accepted
        );
    }

    #[tokio::test]
    async fn history_excludes_the_query_being_asked() {
        struct HistoryCheck;

        #[async_trait]
        impl ChatService for HistoryCheck {
            async fn ingest(&self, _url: &str) -> Result<(), ApiError> {
                Ok(())
            }

            async fn answer(
                &self,
                query: &str,
                history: &[ChatMessage],
            ) -> Result<TokenStream, ApiError> {
                assert_eq!(query, "the question");
                assert_eq!(history.len(), 1);
                assert_eq!(history[0].content, WELCOME_MESSAGE);

                let (_tx, rx) = mpsc::channel(1);
                Ok(rx)
            }
        }

        let mut controller = Controller::new(HistoryCheck);
        controller.submit_message("the question", &mut NullSink).await;
    }
}
