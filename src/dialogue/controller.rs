//! Prediction dialogue controller: drives the survey from user messages to
//! a course recommendation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::chat::ChatService;
use crate::error::{ChatError, RecommendError};
use crate::recommend::RecommendationService;
use crate::transcript::{Message, Transcript, TranscriptSink};

use super::model::AnswerSet;
use super::prompts::{self, CONNECTION_FAILED, FALLBACK, PREDICTING};
use super::state::{ConversationState, Field};

/// What a single user message did to the dialogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Blank input; nothing recorded.
    Ignored,
    /// A submission is outstanding; input dropped.
    Busy,
    /// Non-survey message answered with the fallback (or chat) reply.
    Fallback,
    /// Trigger detected; the first field was prompted.
    Started,
    /// Answer stored; the given field was prompted next.
    Prompted(Field),
    /// Survey submitted and a course came back.
    Recommended(String),
    /// Survey submitted but the service was unavailable.
    Failed,
    /// The dialogue was reset while the submission was in flight; its
    /// result was discarded.
    Cancelled,
}

/// Dialogue state, answers and transcript. Always mutated together under
/// one lock.
#[derive(Debug)]
struct DialogueInner {
    state: ConversationState,
    answers: AnswerSet,
    transcript: Transcript,
    /// Bumped on every reset and submission, so a late submission result
    /// can tell whether it still owns the dialogue.
    epoch: u64,
}

impl DialogueInner {
    fn reset_dialogue(&mut self) {
        self.state = ConversationState::Idle;
        self.answers.clear();
        self.epoch += 1;
    }
}

/// Coordinates the prediction dialogue: trigger detection, answer
/// collection, submission and result reporting.
pub struct PredictionController {
    inner: RwLock<DialogueInner>,
    service: Arc<dyn RecommendationService>,
    chat: Option<Arc<dyn ChatService>>,
    sink: Arc<dyn TranscriptSink>,
    submit_timeout: Duration,
}

impl PredictionController {
    pub fn new(
        service: Arc<dyn RecommendationService>,
        sink: Arc<dyn TranscriptSink>,
        transcript: Transcript,
        submit_timeout: Duration,
    ) -> Self {
        Self {
            inner: RwLock::new(DialogueInner {
                state: ConversationState::Idle,
                answers: AnswerSet::new(),
                transcript,
                epoch: 0,
            }),
            service,
            chat: None,
            sink,
            submit_timeout,
        }
    }

    /// Forward non-survey messages to a chat backend instead of replying
    /// with the static fallback.
    pub fn with_chat_service(mut self, chat: Arc<dyn ChatService>) -> Self {
        self.chat = Some(chat);
        self
    }

    /// Current dialogue state.
    pub async fn state(&self) -> ConversationState {
        self.inner.read().await.state
    }

    /// Snapshot of the answers collected so far.
    pub async fn answers(&self) -> AnswerSet {
        self.inner.read().await.answers.clone()
    }

    /// Snapshot of the transcript.
    pub async fn transcript(&self) -> Transcript {
        self.inner.read().await.transcript.clone()
    }

    /// Handle one submitted user message.
    ///
    /// 1. Blank input is ignored in every state.
    /// 2. Input while a submission is outstanding is dropped.
    /// 3. In `Idle`, look for a trigger; otherwise reply with the fallback.
    /// 4. While awaiting an answer, store the text verbatim and prompt the
    ///    next field, or submit once all four are in.
    pub async fn handle_message(&self, text: &str) -> TurnOutcome {
        let text = text.trim();
        if text.is_empty() {
            tracing::debug!("Ignoring blank input");
            return TurnOutcome::Ignored;
        }

        let mut inner = self.inner.write().await;
        if inner.state.is_busy() {
            tracing::debug!("Dropping input while a recommendation request is outstanding");
            return TurnOutcome::Busy;
        }

        self.append(&mut inner, Message::user(text));

        let state = inner.state;
        match state {
            ConversationState::Idle => {
                if prompts::is_trigger(text) {
                    inner.answers.clear();
                    self.transition(&mut inner, ConversationState::AwaitingAnswer(Field::Interest));
                    self.append(&mut inner, Message::bot(prompts::field_prompt(Field::Interest)));
                    return TurnOutcome::Started;
                }

                let Some(chat) = self.chat.clone() else {
                    self.append(&mut inner, Message::bot(FALLBACK));
                    return TurnOutcome::Fallback;
                };

                // Readers and resets must not wait on the chat backend.
                drop(inner);

                let reply = match tokio::time::timeout(self.submit_timeout, chat.send(text)).await
                {
                    Ok(result) => result,
                    Err(_) => Err(ChatError::Timeout(self.submit_timeout)),
                };
                let reply = reply.unwrap_or_else(|e| {
                    tracing::warn!("Chat backend unavailable: {}", e);
                    CONNECTION_FAILED.to_string()
                });

                let mut inner = self.inner.write().await;
                self.append(&mut inner, Message::bot(reply));
                TurnOutcome::Fallback
            }
            ConversationState::AwaitingAnswer(field) => {
                inner.answers.insert(field, text);
                tracing::debug!(field = %field, "Stored survey answer");

                if let Some(next) = field.next() {
                    self.transition(&mut inner, ConversationState::AwaitingAnswer(next));
                    self.append(&mut inner, Message::bot(prompts::field_prompt(next)));
                    return TurnOutcome::Prompted(next);
                }

                let Some(request) = inner.answers.to_request() else {
                    // Unreachable through the state table, but never get stuck.
                    tracing::warn!(answers = inner.answers.len(), "Survey incomplete at submission");
                    self.append(&mut inner, Message::bot(CONNECTION_FAILED));
                    inner.reset_dialogue();
                    return TurnOutcome::Failed;
                };

                self.transition(&mut inner, ConversationState::Submitting);
                self.append(&mut inner, Message::bot(PREDICTING));
                inner.epoch += 1;
                let epoch = inner.epoch;

                // Concurrent input must see `Submitting`, not wait on the lock.
                drop(inner);

                let result = match tokio::time::timeout(
                    self.submit_timeout,
                    self.service.recommend(&request),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(RecommendError::Timeout(self.submit_timeout)),
                };

                self.finish_submission(epoch, result).await
            }
            // Filtered by the busy guard above.
            ConversationState::Submitting => TurnOutcome::Busy,
        }
    }

    /// Report the submission result and return to `Idle`.
    async fn finish_submission(
        &self,
        epoch: u64,
        result: Result<String, RecommendError>,
    ) -> TurnOutcome {
        let mut inner = self.inner.write().await;
        if inner.epoch != epoch || !inner.state.is_busy() {
            tracing::info!("Dialogue was reset during submission; discarding result");
            return TurnOutcome::Cancelled;
        }

        let outcome = match result {
            Ok(label) => {
                tracing::info!(course = %label, "Course recommended");
                self.append(&mut inner, Message::bot(prompts::recommendation(&label)));
                TurnOutcome::Recommended(label)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Recommendation unavailable");
                self.append(&mut inner, Message::bot(CONNECTION_FAILED));
                TurnOutcome::Failed
            }
        };

        self.transition(&mut inner, ConversationState::Idle);
        inner.reset_dialogue();
        outcome
    }

    /// Abandon any survey in progress. The transcript is kept.
    pub async fn reset(&self) {
        let mut inner = self.inner.write().await;
        if inner.state != ConversationState::Idle {
            tracing::info!(from = %inner.state, "Prediction dialogue reset");
        }
        inner.reset_dialogue();
    }

    /// Reset the dialogue and clear the transcript back to the greeting.
    pub async fn reset_panel(&self) {
        let mut inner = self.inner.write().await;
        inner.reset_dialogue();
        inner.transcript.reset_to_greeting();
    }

    /// Replace the transcript with the chat backend's stored history.
    ///
    /// Returns the number of exchanges loaded; zero when no chat backend is
    /// attached. On failure the transcript is left as it was.
    pub async fn load_history(&self) -> Result<usize, ChatError> {
        let Some(ref chat) = self.chat else {
            return Ok(0);
        };

        let history = chat.history().await.map_err(|e| {
            tracing::warn!("Failed to load chat history: {}", e);
            e
        })?;

        let mut inner = self.inner.write().await;
        let appended = inner.transcript.replace_with_history(&history);
        for message in &appended {
            self.sink.render_history(message);
        }
        tracing::debug!(entries = history.len(), "Loaded chat history");
        Ok(history.len())
    }

    fn append(&self, inner: &mut DialogueInner, message: Message) {
        self.sink.render(&message);
        inner.transcript.push(message);
    }

    fn transition(&self, inner: &mut DialogueInner, to: ConversationState) {
        let from = inner.state;
        if !from.can_transition_to(to) {
            tracing::warn!(from = %from, to = %to, "Unexpected dialogue transition");
        }
        tracing::debug!(from = %from, to = %to, "Dialogue transition");
        inner.state = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use crate::dialogue::model::PredictRequest;
    use crate::transcript::{HistoryEntry, NullSink, Sender};

    enum Behavior {
        Succeed(&'static str),
        Fail,
        Hang,
        WaitFor(Arc<Notify>, &'static str),
    }

    /// Stub recommendation service that records every request.
    struct StubService {
        behavior: Behavior,
        requests: Mutex<Vec<PredictRequest>>,
    }

    impl StubService {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<PredictRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RecommendationService for StubService {
        async fn recommend(&self, request: &PredictRequest) -> Result<String, RecommendError> {
            self.requests.lock().unwrap().push(request.clone());
            match &self.behavior {
                Behavior::Succeed(label) => Ok(label.to_string()),
                Behavior::Fail => Err(RecommendError::RequestFailed("connection refused".into())),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok("too late".into())
                }
                Behavior::WaitFor(notify, label) => {
                    notify.notified().await;
                    Ok(label.to_string())
                }
            }
        }
    }

    struct StubChat;

    #[async_trait]
    impl ChatService for StubChat {
        async fn send(&self, message: &str) -> Result<String, ChatError> {
            Ok(format!("echo: {message}"))
        }

        async fn history(&self) -> Result<Vec<HistoryEntry>, ChatError> {
            Ok(vec![HistoryEntry {
                user_message: "hi".into(),
                bot_response: "hello".into(),
            }])
        }
    }

    struct DownChat;

    #[async_trait]
    impl ChatService for DownChat {
        async fn send(&self, _message: &str) -> Result<String, ChatError> {
            Err(ChatError::Status { status: 502 })
        }

        async fn history(&self) -> Result<Vec<HistoryEntry>, ChatError> {
            Err(ChatError::RequestFailed("down".into()))
        }
    }

    /// Sink that records everything rendered.
    #[derive(Default)]
    struct RecordingSink {
        rendered: Mutex<Vec<Message>>,
        replayed: Mutex<Vec<Message>>,
    }

    impl TranscriptSink for RecordingSink {
        fn render(&self, message: &Message) {
            self.rendered.lock().unwrap().push(message.clone());
        }

        fn render_history(&self, message: &Message) {
            self.replayed.lock().unwrap().push(message.clone());
        }
    }

    /// Chat backend that answers only once released.
    struct GatedChat {
        release: Arc<Notify>,
    }

    #[async_trait]
    impl ChatService for GatedChat {
        async fn send(&self, message: &str) -> Result<String, ChatError> {
            self.release.notified().await;
            Ok(format!("late: {message}"))
        }

        async fn history(&self) -> Result<Vec<HistoryEntry>, ChatError> {
            Ok(Vec::new())
        }
    }

    fn controller(service: Arc<StubService>) -> PredictionController {
        PredictionController::new(
            service,
            Arc::new(NullSink),
            Transcript::with_greeting("Hello!"),
            Duration::from_secs(5),
        )
    }

    fn bot_texts(transcript: &Transcript) -> Vec<String> {
        transcript
            .messages()
            .iter()
            .filter(|m| m.sender == Sender::Bot)
            .map(|m| m.text.clone())
            .collect()
    }

    async fn answer_all(ctrl: &PredictionController, answers: [&str; 4]) -> TurnOutcome {
        let mut last = TurnOutcome::Ignored;
        for answer in answers {
            last = ctrl.handle_message(answer).await;
        }
        last
    }

    #[tokio::test]
    async fn full_flow_recommends_course() {
        let service = StubService::new(Behavior::Succeed("Data Science"));
        let ctrl = controller(Arc::clone(&service));

        assert_eq!(
            ctrl.handle_message("Can you recommend a course?").await,
            TurnOutcome::Started
        );
        assert_eq!(
            ctrl.state().await,
            ConversationState::AwaitingAnswer(Field::Interest)
        );
        assert_eq!(
            ctrl.handle_message("Programming").await,
            TurnOutcome::Prompted(Field::Education)
        );
        assert_eq!(
            ctrl.handle_message("BSc").await,
            TurnOutcome::Prompted(Field::Skill)
        );
        assert_eq!(
            ctrl.handle_message("Python").await,
            TurnOutcome::Prompted(Field::Qualification)
        );
        assert_eq!(
            ctrl.handle_message("Certified").await,
            TurnOutcome::Recommended("Data Science".into())
        );

        assert_eq!(ctrl.state().await, ConversationState::Idle);
        assert!(ctrl.answers().await.is_empty());

        let requests = service.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0],
            PredictRequest {
                interest: "Programming".into(),
                education: "BSc".into(),
                skill: "Python".into(),
                qualification: "Certified".into(),
            }
        );

        let transcript = ctrl.transcript().await;
        let bots = bot_texts(&transcript);
        assert_eq!(bots[0], "Hello!");
        assert!(bots[1].contains("enter your interest"));
        assert!(bots[2].contains("enter your education"));
        assert!(bots[3].contains("enter your skill"));
        assert!(bots[4].contains("enter your qualification"));
        assert_eq!(bots[5], PREDICTING);
        assert_eq!(bots[6], "Recommended Course: Data Science");
        // greeting + 5 user messages + 6 bot messages
        assert_eq!(transcript.len(), 12);
    }

    #[tokio::test]
    async fn service_failure_returns_to_idle() {
        let service = StubService::new(Behavior::Fail);
        let ctrl = controller(Arc::clone(&service));

        ctrl.handle_message("suggest a course").await;
        let outcome = answer_all(&ctrl, ["Design", "Diploma", "Figma", "none"]).await;

        assert_eq!(outcome, TurnOutcome::Failed);
        assert_eq!(ctrl.state().await, ConversationState::Idle);
        assert!(ctrl.answers().await.is_empty());
        let transcript = ctrl.transcript().await;
        assert_eq!(transcript.last().unwrap().text, CONNECTION_FAILED);
        assert_eq!(service.requests().len(), 1);
    }

    #[tokio::test]
    async fn timeout_is_a_failure() {
        let service = StubService::new(Behavior::Hang);
        let ctrl = PredictionController::new(
            service,
            Arc::new(NullSink),
            Transcript::new(),
            Duration::from_millis(50),
        );

        ctrl.handle_message("best course?").await;
        let outcome = answer_all(&ctrl, ["a", "b", "c", "d"]).await;

        assert_eq!(outcome, TurnOutcome::Failed);
        assert_eq!(ctrl.state().await, ConversationState::Idle);
    }

    #[tokio::test]
    async fn blank_input_is_a_no_op_in_every_state() {
        let service = StubService::new(Behavior::Succeed("X"));
        let ctrl = controller(service);

        for setup in [None, Some("recommend a course"), Some("Programming")] {
            if let Some(text) = setup {
                ctrl.handle_message(text).await;
            }
            let before_len = ctrl.transcript().await.len();
            let before_state = ctrl.state().await;
            for blank in ["", "   ", "\n\t"] {
                assert_eq!(ctrl.handle_message(blank).await, TurnOutcome::Ignored);
            }
            assert_eq!(ctrl.transcript().await.len(), before_len);
            assert_eq!(ctrl.state().await, before_state);
        }
    }

    #[tokio::test]
    async fn trigger_is_suppressed_mid_dialogue() {
        let service = StubService::new(Behavior::Succeed("X"));
        let ctrl = controller(service);

        ctrl.handle_message("recommend me a course").await;
        let outcome = ctrl.handle_message("best course").await;

        assert_eq!(outcome, TurnOutcome::Prompted(Field::Education));
        assert_eq!(ctrl.answers().await.get(Field::Interest), Some("best course"));
        assert_eq!(
            ctrl.state().await,
            ConversationState::AwaitingAnswer(Field::Education)
        );
    }

    #[tokio::test]
    async fn answers_are_trimmed_but_otherwise_verbatim() {
        let service = StubService::new(Behavior::Succeed("X"));
        let ctrl = controller(Arc::clone(&service));

        ctrl.handle_message("recommend a course").await;
        answer_all(&ctrl, ["  Web  Dev ", "MSc\n", "\tRust", " suggest a course "]).await;

        let request = &service.requests()[0];
        assert_eq!(request.interest, "Web  Dev");
        assert_eq!(request.education, "MSc");
        assert_eq!(request.skill, "Rust");
        assert_eq!(request.qualification, "suggest a course");
    }

    #[tokio::test]
    async fn non_trigger_gets_fallback_and_leaves_answers_alone() {
        let service = StubService::new(Behavior::Succeed("X"));
        let ctrl = controller(service);

        assert_eq!(ctrl.handle_message("hello there").await, TurnOutcome::Fallback);
        assert_eq!(ctrl.state().await, ConversationState::Idle);
        assert!(ctrl.answers().await.is_empty());
        assert_eq!(ctrl.transcript().await.last().unwrap().text, FALLBACK);
    }

    #[tokio::test]
    async fn second_flow_behaves_like_first() {
        let service = StubService::new(Behavior::Succeed("Data Science"));
        let ctrl = controller(Arc::clone(&service));

        for answers in [["a", "b", "c", "d"], ["e", "f", "g", "h"]] {
            assert_eq!(
                ctrl.handle_message("recommend a course").await,
                TurnOutcome::Started
            );
            assert_eq!(
                answer_all(&ctrl, answers).await,
                TurnOutcome::Recommended("Data Science".into())
            );
        }

        let requests = service.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].interest, "e");
        assert_eq!(requests[1].qualification, "h");
    }

    #[tokio::test]
    async fn retrigger_after_failure_starts_clean() {
        let service = StubService::new(Behavior::Fail);
        let ctrl = controller(service);

        ctrl.handle_message("recommend a course").await;
        answer_all(&ctrl, ["a", "b", "c", "d"]).await;

        assert_eq!(
            ctrl.handle_message("recommend a course").await,
            TurnOutcome::Started
        );
        assert!(ctrl.answers().await.is_empty());
        assert_eq!(
            ctrl.state().await,
            ConversationState::AwaitingAnswer(Field::Interest)
        );
    }

    #[tokio::test]
    async fn input_during_submission_is_dropped() {
        let release = Arc::new(Notify::new());
        let service = StubService::new(Behavior::WaitFor(Arc::clone(&release), "Rust"));
        let ctrl = Arc::new(controller(Arc::clone(&service)));

        ctrl.handle_message("recommend a course").await;
        for answer in ["a", "b", "c"] {
            ctrl.handle_message(answer).await;
        }

        let submitting = {
            let ctrl = Arc::clone(&ctrl);
            tokio::spawn(async move { ctrl.handle_message("d").await })
        };

        while ctrl.state().await != ConversationState::Submitting {
            tokio::task::yield_now().await;
        }

        let len_before = ctrl.transcript().await.len();
        assert_eq!(
            ctrl.handle_message("recommend a course").await,
            TurnOutcome::Busy
        );
        assert_eq!(ctrl.transcript().await.len(), len_before);

        release.notify_one();
        assert_eq!(
            submitting.await.unwrap(),
            TurnOutcome::Recommended("Rust".into())
        );
        assert_eq!(service.requests().len(), 1);
        assert_eq!(ctrl.state().await, ConversationState::Idle);
    }

    #[tokio::test]
    async fn reset_during_submission_discards_result() {
        let release = Arc::new(Notify::new());
        let service = StubService::new(Behavior::WaitFor(Arc::clone(&release), "Rust"));
        let ctrl = Arc::new(controller(service));

        ctrl.handle_message("recommend a course").await;
        for answer in ["a", "b", "c"] {
            ctrl.handle_message(answer).await;
        }
        let submitting = {
            let ctrl = Arc::clone(&ctrl);
            tokio::spawn(async move { ctrl.handle_message("d").await })
        };
        while ctrl.state().await != ConversationState::Submitting {
            tokio::task::yield_now().await;
        }

        ctrl.reset().await;
        ctrl.handle_message("recommend a course").await;
        release.notify_one();

        assert_eq!(submitting.await.unwrap(), TurnOutcome::Cancelled);
        assert_eq!(
            ctrl.state().await,
            ConversationState::AwaitingAnswer(Field::Interest)
        );
    }

    #[tokio::test]
    async fn reset_clears_answers_but_keeps_transcript() {
        let service = StubService::new(Behavior::Succeed("X"));
        let ctrl = controller(service);

        ctrl.handle_message("recommend a course").await;
        ctrl.handle_message("Programming").await;
        let len = ctrl.transcript().await.len();

        ctrl.reset().await;
        assert_eq!(ctrl.state().await, ConversationState::Idle);
        assert!(ctrl.answers().await.is_empty());
        assert_eq!(ctrl.transcript().await.len(), len);

        ctrl.reset_panel().await;
        let transcript = ctrl.transcript().await;
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.messages()[0].text, "Hello!");
    }

    #[tokio::test]
    async fn sink_sees_every_appended_message() {
        let service = StubService::new(Behavior::Succeed("Data Science"));
        let sink = Arc::new(RecordingSink::default());
        let ctrl = PredictionController::new(
            service,
            Arc::clone(&sink) as Arc<dyn TranscriptSink>,
            Transcript::new(),
            Duration::from_secs(5),
        );

        ctrl.handle_message("recommend a course").await;
        answer_all(&ctrl, ["a", "b", "c", "d"]).await;

        let rendered: Vec<_> = sink
            .rendered
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.text.clone())
            .collect();
        let transcript: Vec<_> = ctrl
            .transcript()
            .await
            .messages()
            .iter()
            .map(|m| m.text.clone())
            .collect();
        assert_eq!(rendered, transcript);
    }

    #[tokio::test]
    async fn chat_backend_replaces_fallback() {
        let service = StubService::new(Behavior::Succeed("X"));
        let ctrl = controller(service).with_chat_service(Arc::new(StubChat));

        assert_eq!(ctrl.handle_message("what are the fees?").await, TurnOutcome::Fallback);
        assert_eq!(
            ctrl.transcript().await.last().unwrap().text,
            "echo: what are the fees?"
        );
        // Triggers still win over the chat backend.
        assert_eq!(
            ctrl.handle_message("recommend a course").await,
            TurnOutcome::Started
        );
    }

    #[tokio::test]
    async fn chat_backend_failure_reports_connection_problem() {
        let service = StubService::new(Behavior::Succeed("X"));
        let ctrl = controller(service).with_chat_service(Arc::new(DownChat));

        assert_eq!(ctrl.handle_message("hello").await, TurnOutcome::Fallback);
        assert_eq!(ctrl.transcript().await.last().unwrap().text, CONNECTION_FAILED);
        assert_eq!(ctrl.state().await, ConversationState::Idle);
    }

    #[tokio::test]
    async fn load_history_replaces_transcript() {
        let service = StubService::new(Behavior::Succeed("X"));
        let ctrl = controller(service).with_chat_service(Arc::new(StubChat));
        ctrl.handle_message("stale").await;

        assert_eq!(ctrl.load_history().await.unwrap(), 1);
        let texts: Vec<_> = ctrl
            .transcript()
            .await
            .messages()
            .iter()
            .map(|m| m.text.clone())
            .collect();
        assert_eq!(texts, ["Hello!", "hi", "hello"]);
    }

    #[tokio::test]
    async fn load_history_failure_keeps_transcript() {
        let service = StubService::new(Behavior::Succeed("X"));
        let ctrl = controller(service).with_chat_service(Arc::new(DownChat));
        ctrl.reset_panel().await;

        assert!(ctrl.load_history().await.is_err());
        assert_eq!(ctrl.transcript().await.len(), 1);
    }

    #[tokio::test]
    async fn load_history_without_chat_backend_is_empty() {
        let service = StubService::new(Behavior::Succeed("X"));
        let ctrl = controller(service);
        assert_eq!(ctrl.load_history().await.unwrap(), 0);
        assert_eq!(ctrl.transcript().await.len(), 1);
    }

    #[tokio::test]
    async fn pending_chat_reply_does_not_block_readers() {
        let release = Arc::new(Notify::new());
        let service = StubService::new(Behavior::Succeed("X"));
        let ctrl = Arc::new(controller(service).with_chat_service(Arc::new(GatedChat {
            release: Arc::clone(&release),
        })));

        let task = {
            let ctrl = Arc::clone(&ctrl);
            tokio::spawn(async move { ctrl.handle_message("hello").await })
        };
        // Wait until the user message is in and the chat call is pending.
        while ctrl.transcript().await.len() < 2 {
            tokio::task::yield_now().await;
        }

        let quick = Duration::from_millis(500);
        assert_eq!(
            tokio::time::timeout(quick, ctrl.state()).await.unwrap(),
            ConversationState::Idle
        );
        tokio::time::timeout(quick, ctrl.reset_panel()).await.unwrap();
        assert!(!task.is_finished());

        release.notify_one();
        assert_eq!(task.await.unwrap(), TurnOutcome::Fallback);
        assert_eq!(ctrl.transcript().await.last().unwrap().text, "late: hello");
    }

    #[tokio::test]
    async fn chat_timeout_reports_connection_problem() {
        let service = StubService::new(Behavior::Succeed("X"));
        let ctrl = PredictionController::new(
            service,
            Arc::new(NullSink),
            Transcript::with_greeting("Hello!"),
            Duration::from_millis(50),
        )
        .with_chat_service(Arc::new(GatedChat {
            release: Arc::new(Notify::new()),
        }));

        assert_eq!(ctrl.handle_message("hello").await, TurnOutcome::Fallback);
        assert_eq!(ctrl.transcript().await.last().unwrap().text, CONNECTION_FAILED);
        assert_eq!(ctrl.state().await, ConversationState::Idle);
    }

    #[tokio::test]
    async fn loaded_history_is_replayed_to_the_sink() {
        let service = StubService::new(Behavior::Succeed("X"));
        let sink = Arc::new(RecordingSink::default());
        let ctrl = PredictionController::new(
            service,
            Arc::clone(&sink) as Arc<dyn TranscriptSink>,
            Transcript::with_greeting("Hello!"),
            Duration::from_secs(5),
        )
        .with_chat_service(Arc::new(StubChat));

        ctrl.load_history().await.unwrap();

        let replayed: Vec<_> = sink
            .replayed
            .lock()
            .unwrap()
            .iter()
            .map(|m| (m.sender, m.text.clone()))
            .collect();
        assert_eq!(
            replayed,
            [(Sender::User, "hi".to_string()), (Sender::Bot, "hello".to_string())]
        );
    }
}
