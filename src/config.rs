use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub environment: String,
    pub llm_provider: String,
    pub llm_model: String,
    pub ollama_base_url: String,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub otel_service_name: String,
    pub otel_exporter_endpoint: String,
    pub default_temperature: f32,
    pub default_max_tokens: u32,
    pub model_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            port: env::var("APP_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .expect("APP_PORT must be a number"),
            environment: env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            llm_provider: env::var("LLM_PROVIDER").unwrap_or_else(|_| "ollama".to_string()),
            llm_model: env::var("LLM_MODEL").unwrap_or_else(|_| "llama3".to_string()),
            ollama_base_url: env::var("OLLAMA_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            openai_api_key: env::var("OPENAI_API_KEY").ok(),
            anthropic_api_key: env::var("ANTHROPIC_API_KEY").ok(),
            google_api_key: env::var("GOOGLE_API_KEY").ok(),
            otel_service_name: env::var("OTEL_SERVICE_NAME")
                .unwrap_or_else(|_| "report-qa".to_string()),
            otel_exporter_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:4317".to_string()),
            default_temperature: env::var("DEFAULT_TEMPERATURE")
                .unwrap_or_else(|_| "0.3".to_string())
                .parse()
                .expect("DEFAULT_TEMPERATURE must be a number"),
            default_max_tokens: env::var("DEFAULT_MAX_TOKENS")
                .unwrap_or_else(|_| "1024".to_string())
                .parse()
                .expect("DEFAULT_MAX_TOKENS must be a number"),
            model_timeout_secs: env::var("MODEL_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .expect("MODEL_TIMEOUT_SECS must be a number"),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
