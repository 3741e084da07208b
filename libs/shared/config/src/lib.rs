use std::env;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub fhir_allowed_origins: Vec<String>,
    pub fhir_client_id: String,
    pub mllp_host: String,
    pub mllp_port: u16,
    pub mllp_connect_timeout_secs: u64,
    pub mllp_ack_timeout_secs: u64,
    pub ehr_writeback_enabled: bool,
    pub debug_logging: bool,
    pub redis_url: Option<String>,
    pub meeting_base_url: String,
    pub server_port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            fhir_allowed_origins: env::var("FHIR_ALLOWED_ORIGINS")
                .map(|raw| parse_origin_list(&raw))
                .unwrap_or_else(|_| {
                    warn!("FHIR_ALLOWED_ORIGINS not set, every FHIR origin will be rejected");
                    Vec::new()
                }),
            fhir_client_id: env::var("FHIR_CLIENT_ID")
                .unwrap_or_else(|_| {
                    warn!("FHIR_CLIENT_ID not set, using empty value");
                    String::new()
                }),
            mllp_host: env::var("MLLP_HOST")
                .unwrap_or_else(|_| {
                    warn!("MLLP_HOST not set, using default");
                    "127.0.0.1".to_string()
                }),
            mllp_port: parsed_var("MLLP_PORT", 2575),
            mllp_connect_timeout_secs: parsed_var("MLLP_CONNECT_TIMEOUT_SECS", 10),
            mllp_ack_timeout_secs: parsed_var("MLLP_ACK_TIMEOUT_SECS", 30),
            ehr_writeback_enabled: flag_var("EHR_WRITEBACK_ENABLED"),
            debug_logging: flag_var("DEBUG_LOGGING"),
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            meeting_base_url: env::var("MEETING_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("MEETING_BASE_URL not set, using empty value");
                    String::new()
                }),
            server_port: parsed_var("SERVER_PORT", 8080),
        };

        if !config.is_fhir_configured() {
            warn!("No trusted FHIR origins configured - arrival events will be rejected");
        }
        if config.ehr_writeback_enabled && !config.is_mllp_configured() {
            warn!("EHR writeback enabled but MLLP endpoint is incomplete");
        }

        config
    }

    pub fn is_fhir_configured(&self) -> bool {
        !self.fhir_allowed_origins.is_empty()
    }

    pub fn is_mllp_configured(&self) -> bool {
        !self.mllp_host.is_empty() && self.mllp_port != 0
    }

    /// Exact-match membership test against the trusted FHIR origins.
    /// A single trailing slash is ignored on both sides.
    pub fn is_trusted_fhir_origin(&self, fhir_url: &str) -> bool {
        let candidate = fhir_url.trim_end_matches('/');
        !candidate.is_empty()
            && self
                .fhir_allowed_origins
                .iter()
                .any(|origin| origin == candidate)
    }
}

/// Reads only the debug-logging flag, for use before logging is initialized.
pub fn debug_logging_from_env() -> bool {
    flag_var("DEBUG_LOGGING")
}

fn parse_origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

fn parsed_var<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

fn flag_var(name: &str) -> bool {
    env::var(name)
        .map(|raw| matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}
