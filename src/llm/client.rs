use std::sync::Arc;
use std::time::{Duration, Instant};

use opentelemetry::KeyValue;
use tracing::Instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use super::{CompletionRequest, CompletionResponse, Provider};
use crate::telemetry::metrics::{
    GEN_AI_ERROR_COUNT, GEN_AI_OPERATION_DURATION, GEN_AI_TOKEN_USAGE,
};

/// Single-call model client. One prompt in, one raw completion out, one
/// failure mode. Retry policy belongs to the caller, so a failed or
/// timed-out call surfaces immediately.
pub struct LlmClient {
    pub provider: Arc<dyn Provider>,
    pub provider_name: String,
    pub timeout: Duration,
}

impl LlmClient {
    pub fn new(provider: Arc<dyn Provider>, provider_name: String, timeout: Duration) -> Self {
        Self {
            provider,
            provider_name,
            timeout,
        }
    }

    pub async fn complete(&self, req: &CompletionRequest) -> anyhow::Result<CompletionResponse> {
        let span_display_name = format!("gen_ai.chat {}", req.model);
        let start = Instant::now();

        let span = tracing::info_span!(
            "gen_ai.chat",
            otel.name = %span_display_name,
            gen_ai.operation.name = "chat",
            gen_ai.provider.name = %self.provider_name,
            gen_ai.request.model = %req.model,
            server.address = %provider_server(&self.provider_name),
            server.port = provider_port(&self.provider_name),
            gen_ai.request.temperature = req.temperature,
            gen_ai.request.max_tokens = req.max_tokens as i64,
            gen_ai.response.model = tracing::field::Empty,
            gen_ai.usage.input_tokens = tracing::field::Empty,
            gen_ai.usage.output_tokens = tracing::field::Empty,
            gen_ai.response.finish_reasons = tracing::field::Empty,
            otel.status_code = tracing::field::Empty,
            error.type = tracing::field::Empty,
        );

        {
            let mut user_event_attrs =
                vec![KeyValue::new("gen_ai.prompt", truncate(&req.prompt, 1000))];
            if !req.system.is_empty() {
                user_event_attrs.push(KeyValue::new(
                    "gen_ai.system_instructions",
                    truncate(&req.system, 500),
                ));
            }
            span.add_event("gen_ai.user.message", user_event_attrs);
        }

        let result = tokio::time::timeout(
            self.timeout,
            self.provider.complete(req).instrument(span.clone()),
        )
        .await
        .unwrap_or_else(|_| {
            Err(anyhow::anyhow!(
                "model call timed out after {:?}",
                self.timeout
            ))
        });

        let duration = start.elapsed().as_secs_f64();

        match result {
            Ok(mut resp) => {
                resp.provider = self.provider_name.clone();

                span.record("gen_ai.response.model", resp.model.as_str());
                span.record("gen_ai.usage.input_tokens", resp.input_tokens as i64);
                span.record("gen_ai.usage.output_tokens", resp.output_tokens as i64);
                if !resp.finish_reason.is_empty() {
                    span.record(
                        "gen_ai.response.finish_reasons",
                        resp.finish_reason.as_str(),
                    );
                }

                span.add_event(
                    "gen_ai.assistant.message",
                    vec![KeyValue::new(
                        "gen_ai.completion",
                        truncate(&resp.content, 2000),
                    )],
                );

                let op_kv = KeyValue::new("gen_ai.operation.name", "chat");
                let provider_kv =
                    KeyValue::new("gen_ai.provider.name", self.provider_name.clone());
                let model_kv = KeyValue::new("gen_ai.request.model", resp.model.clone());

                GEN_AI_TOKEN_USAGE.record(
                    f64::from(resp.input_tokens),
                    &[
                        KeyValue::new("gen_ai.token.type", "input"),
                        op_kv.clone(),
                        provider_kv.clone(),
                        model_kv.clone(),
                    ],
                );
                GEN_AI_TOKEN_USAGE.record(
                    f64::from(resp.output_tokens),
                    &[
                        KeyValue::new("gen_ai.token.type", "output"),
                        op_kv.clone(),
                        provider_kv.clone(),
                        model_kv.clone(),
                    ],
                );
                GEN_AI_OPERATION_DURATION.record(duration, &[op_kv, provider_kv, model_kv]);

                Ok(resp)
            }
            Err(err) => {
                span.record("otel.status_code", "ERROR");
                span.record("error.type", classify_error(&err));

                GEN_AI_ERROR_COUNT.add(
                    1,
                    &[
                        KeyValue::new("gen_ai.provider.name", self.provider_name.clone()),
                        KeyValue::new("gen_ai.request.model", req.model.clone()),
                    ],
                );

                Err(err)
            }
        }
    }
}

fn provider_server(provider: &str) -> &'static str {
    match provider {
        "openai" => "api.openai.com",
        "anthropic" => "api.anthropic.com",
        "google" => "generativelanguage.googleapis.com",
        "ollama" => "localhost",
        _ => "unknown",
    }
}

fn provider_port(provider: &str) -> i64 {
    match provider {
        "ollama" => 11434,
        _ => 443,
    }
}

fn classify_error(err: &anyhow::Error) -> &'static str {
    let msg = err.to_string().to_lowercase();
    if msg.contains("rate limit") || msg.contains("429") {
        "rate_limit"
    } else if msg.contains("timeout") || msg.contains("timed out") || msg.contains("deadline") {
        "timeout"
    } else if msg.contains("401")
        || msg.contains("403")
        || msg.contains("auth")
        || msg.contains("api key")
    {
        "auth_error"
    } else if msg.contains("400") || msg.contains("422") || msg.contains("invalid") {
        "invalid_request"
    } else if msg.contains("500")
        || msg.contains("502")
        || msg.contains("503")
        || msg.contains("server")
    {
        "server_error"
    } else if msg.contains("connect")
        || msg.contains("dns")
        || msg.contains("network")
        || msg.contains("reset")
    {
        "network_error"
    } else {
        "unknown_error"
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        s.char_indices()
            .take_while(|&(i, _)| i < max)
            .map(|(_, c)| c)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowProvider;

    #[async_trait::async_trait]
    impl Provider for SlowProvider {
        async fn complete(
            &self,
            _req: &CompletionRequest,
        ) -> anyhow::Result<CompletionResponse> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            unreachable!("test provider should be timed out first")
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    struct EchoProvider;

    #[async_trait::async_trait]
    impl Provider for EchoProvider {
        async fn complete(&self, req: &CompletionRequest) -> anyhow::Result<CompletionResponse> {
            Ok(CompletionResponse {
                content: req.prompt.clone(),
                model: req.model.clone(),
                input_tokens: 10,
                output_tokens: 10,
                finish_reason: "stop".to_string(),
                provider: String::new(),
            })
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "test-model".to_string(),
            system: "system".to_string(),
            prompt: "hello".to_string(),
            temperature: 0.3,
            max_tokens: 128,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_times_out() {
        let client = LlmClient::new(
            Arc::new(SlowProvider),
            "slow".to_string(),
            Duration::from_secs(1),
        );
        let err = client.complete(&request()).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_complete_tags_provider() {
        let client = LlmClient::new(
            Arc::new(EchoProvider),
            "echo".to_string(),
            Duration::from_secs(5),
        );
        let resp = client.complete(&request()).await.unwrap();
        assert_eq!(resp.provider, "echo");
        assert_eq!(resp.content, "hello");
    }

    #[test]
    fn test_classify_error_categories() {
        let cases = vec![
            ("rate limit exceeded", "rate_limit"),
            ("model call timed out after 120s", "timeout"),
            ("401 unauthorized", "auth_error"),
            ("invalid api key", "auth_error"),
            ("422 unprocessable entity", "invalid_request"),
            ("503 service unavailable", "server_error"),
            ("connection refused", "network_error"),
            ("something unexpected", "unknown_error"),
        ];

        for (msg, expected) in cases {
            let err = anyhow::anyhow!("{}", msg);
            assert_eq!(
                classify_error(&err),
                expected,
                "classify_error({msg:?}) should be {expected:?}"
            );
        }
    }

    #[test]
    fn test_provider_endpoints() {
        assert_eq!(provider_server("openai"), "api.openai.com");
        assert_eq!(provider_server("ollama"), "localhost");
        assert_eq!(provider_server("something-else"), "unknown");
        assert_eq!(provider_port("ollama"), 11434);
        assert_eq!(provider_port("anthropic"), 443);
    }

    #[test]
    fn test_truncate_multibyte_safe() {
        let result = truncate("hé世界!", 3);
        assert!(result.len() <= 3);
        assert!(result.is_char_boundary(result.len()));
    }
}
