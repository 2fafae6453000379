use serde::Deserialize;

use crate::error::AppError;
use crate::llm::{CompletionRequest, LlmClient};
use crate::session::SessionStore;
use crate::telemetry::metrics::QA_QUESTION_DURATION;

use super::parse::{self, QaResult};
use super::prompt;

#[derive(Debug, Clone, Deserialize)]
pub struct QaRequest {
    pub session_id: String,
    pub question: String,
}

/// Model invocation knobs the transport layer fills in from config.
#[derive(Debug, Clone)]
pub struct ModelParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Answers one question about an uploaded report.
///
/// A stateless pipeline per call: validate the question, fetch the report,
/// build the prompt, make a single model call, parse the reply. Every
/// failure surfaces as a distinguishable error kind; no retries happen
/// here, the caller decides whether to ask again.
#[tracing::instrument(
    name = "qa answer_question",
    skip(store, llm_client, params, request),
    fields(
        qa.session_id = %request.session_id,
        qa.model = %params.model,
        qa.answer_chars,
        qa.duration_ms,
    )
)]
pub async fn answer_question(
    store: &SessionStore,
    llm_client: &LlmClient,
    params: &ModelParams,
    request: &QaRequest,
) -> Result<QaResult, AppError> {
    let start = std::time::Instant::now();

    if request.question.trim().is_empty() {
        return Err(AppError::InvalidQuestion(
            "question must not be empty".to_string(),
        ));
    }

    let report_text = store
        .get(&request.session_id)
        .await
        .ok_or_else(|| AppError::SessionNotFound(request.session_id.clone()))?;

    let prompt = prompt::build_prompt(&report_text, &request.question);

    let resp = llm_client
        .complete(&CompletionRequest {
            model: params.model.clone(),
            system: prompt::system_prompt(),
            prompt,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        })
        .await
        .map_err(|e| AppError::ModelUnavailable(e.to_string()))?;

    let result = parse::parse_reply(&resp.content)?;

    let duration = start.elapsed();
    QA_QUESTION_DURATION.record(duration.as_secs_f64(), &[]);

    let span = tracing::Span::current();
    span.record("qa.answer_chars", result.answer.len());
    span.record("qa.duration_ms", duration.as_millis() as u64);

    Ok(result)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::llm::{CompletionResponse, Provider};

    struct StubProvider {
        reply: String,
    }

    #[async_trait::async_trait]
    impl Provider for StubProvider {
        async fn complete(
            &self,
            _req: &CompletionRequest,
        ) -> anyhow::Result<CompletionResponse> {
            Ok(CompletionResponse {
                content: self.reply.clone(),
                model: "stub-model".to_string(),
                input_tokens: 100,
                output_tokens: 50,
                finish_reason: "stop".to_string(),
                provider: String::new(),
            })
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    struct FailingProvider;

    #[async_trait::async_trait]
    impl Provider for FailingProvider {
        async fn complete(
            &self,
            _req: &CompletionRequest,
        ) -> anyhow::Result<CompletionResponse> {
            Err(anyhow::anyhow!("connection refused"))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn stub_client(reply: &str) -> LlmClient {
        LlmClient::new(
            Arc::new(StubProvider {
                reply: reply.to_string(),
            }),
            "stub".to_string(),
            Duration::from_secs(5),
        )
    }

    fn params() -> ModelParams {
        ModelParams {
            model: "stub-model".to_string(),
            temperature: 0.3,
            max_tokens: 1024,
        }
    }

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let store = SessionStore::new();
        let session_id = store
            .create("Completed feature X. Fixed bug Y.".to_string())
            .await;

        let client = stub_client(
            "ANSWER: Feature X and bug Y fix.\nFOLLOWUPS:\n1. What was feature X?\n2. How was bug Y found?\n3. Any blockers?",
        );

        let result = answer_question(
            &store,
            &client,
            &params(),
            &QaRequest {
                session_id,
                question: "What did I complete?".to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(result.answer, "Feature X and bug Y fix.");
        assert_eq!(
            result.follow_up_questions,
            vec![
                "What was feature X?",
                "How was bug Y found?",
                "Any blockers?"
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_question_rejected() {
        let store = SessionStore::new();
        let session_id = store.create("report".to_string()).await;
        let client = stub_client("ANSWER: unused\nFOLLOWUPS:\n1. A?\n2. B?\n3. C?");

        for question in ["", "   ", "\n\t"] {
            let err = answer_question(
                &store,
                &client,
                &params(),
                &QaRequest {
                    session_id: session_id.clone(),
                    question: question.to_string(),
                },
            )
            .await
            .unwrap_err();
            assert!(
                matches!(err, AppError::InvalidQuestion(_)),
                "question {question:?} should be invalid"
            );
        }
    }

    #[tokio::test]
    async fn test_unknown_session_rejected() {
        let store = SessionStore::new();
        let client = stub_client("ANSWER: unused\nFOLLOWUPS:\n1. A?\n2. B?\n3. C?");

        let err = answer_question(
            &store,
            &client,
            &params(),
            &QaRequest {
                session_id: "never-created".to_string(),
                question: "What happened?".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_empty_report_still_answers() {
        let store = SessionStore::new();
        let session_id = store.create(String::new()).await;
        let client = stub_client(
            "ANSWER: The report contains no information.\nFOLLOWUPS:\n1. A?\n2. B?\n3. C?",
        );

        let result = answer_question(
            &store,
            &client,
            &params(),
            &QaRequest {
                session_id,
                question: "What did I do?".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(result.answer, "The report contains no information.");
    }

    #[tokio::test]
    async fn test_model_failure_maps_to_unavailable() {
        let store = SessionStore::new();
        let session_id = store.create("report".to_string()).await;
        let client = LlmClient::new(
            Arc::new(FailingProvider),
            "failing".to_string(),
            Duration::from_secs(5),
        );

        let err = answer_question(
            &store,
            &client,
            &params(),
            &QaRequest {
                session_id,
                question: "What happened?".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::ModelUnavailable(_)));
    }

    #[tokio::test]
    async fn test_malformed_reply_propagates() {
        let store = SessionStore::new();
        let session_id = store.create("report".to_string()).await;
        let client = stub_client("just some text with no structure");

        let err = answer_question(
            &store,
            &client,
            &params(),
            &QaRequest {
                session_id,
                question: "What happened?".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_identical_calls_are_idempotent() {
        let store = SessionStore::new();
        let session_id = store.create("Completed feature X.".to_string()).await;
        let client = stub_client("ANSWER: Feature X.\nFOLLOWUPS:\n1. A?\n2. B?\n3. C?");

        let request = QaRequest {
            session_id,
            question: "What did I complete?".to_string(),
        };

        let first = answer_question(&store, &client, &params(), &request)
            .await
            .unwrap();
        let second = answer_question(&store, &client, &params(), &request)
            .await
            .unwrap();
        assert_eq!(first, second);
    }
}
