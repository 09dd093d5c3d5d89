use std::env;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // LLM
    pub anthropic_api_key: String,
    pub model: String,

    // Google Drive/Docs and Gmail (bearer tokens)
    pub google_api_token: String,
    pub gmail_api_token: String,

    // Research providers. Optional: stages degrade when missing.
    pub youtube_api_key: String,
    pub serper_api_key: String,
    pub rapidapi_key: String,

    // Local storage
    pub reports_dir: PathBuf,
    pub case_study_dir: PathBuf,

    // Run policy
    pub step_ceiling: u64,
    pub send_email_directly: bool,
    pub save_to_doc_store: bool,

    // Web server
    pub web_host: String,
    pub web_port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            anthropic_api_key: required_env("ANTHROPIC_API_KEY"),
            model: env::var("LEADFLOW_MODEL")
                .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string()),
            google_api_token: required_env("GOOGLE_API_TOKEN"),
            gmail_api_token: env::var("GMAIL_API_TOKEN").unwrap_or_default(),
            youtube_api_key: env::var("YOUTUBE_API_KEY").unwrap_or_default(),
            serper_api_key: env::var("SERPER_API_KEY").unwrap_or_default(),
            rapidapi_key: env::var("RAPIDAPI_KEY").unwrap_or_default(),
            reports_dir: env::var("LEADFLOW_REPORTS_DIR")
                .unwrap_or_else(|_| "reports".to_string())
                .into(),
            case_study_dir: env::var("LEADFLOW_CASE_STUDY_DIR")
                .unwrap_or_else(|_| "case_studies".to_string())
                .into(),
            step_ceiling: env::var("LEADFLOW_STEP_CEILING")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .expect("LEADFLOW_STEP_CEILING must be a number"),
            send_email_directly: env_flag("SEND_EMAIL_DIRECTLY", false),
            save_to_doc_store: env_flag("SAVE_TO_DOC_STORE", true),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: env::var("WEB_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .expect("WEB_PORT must be a number"),
        }
    }

    /// Minimal config for the web server: no LLM or research keys needed,
    /// only the document-store token for artifact upload.
    pub fn web_from_env() -> Self {
        Self {
            anthropic_api_key: String::new(),
            model: String::new(),
            google_api_token: required_env("GOOGLE_API_TOKEN"),
            gmail_api_token: String::new(),
            youtube_api_key: String::new(),
            serper_api_key: String::new(),
            rapidapi_key: String::new(),
            reports_dir: PathBuf::from("reports"),
            case_study_dir: PathBuf::from("case_studies"),
            step_ceiling: 0,
            send_email_directly: false,
            save_to_doc_store: true,
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: env::var("WEB_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .expect("WEB_PORT must be a number"),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn env_flag(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"),
        Err(_) => default,
    }
}
