//! config-rs/lib.rs
//! Shared configuration utilities for consistent service configuration
//! Provides standardized functions for port/address management plus typed
//! loaders for the LLM capability and the telemetry sink

use std::env;
use std::net::SocketAddr;

/// Get service port from environment variables with proper fallback
///
/// # Arguments
/// * `service_name` - The name of the service (e.g., "SUPPORT")
/// * `default_port` - The default port to use if not specified in environment
///
/// # Returns
/// The port number to use for the service
pub fn get_service_port(service_name: &str, default_port: u16) -> u16 {
    let var_name = format!("{}_SERVICE_PORT", service_name.to_uppercase());
    env::var(&var_name)
        .unwrap_or_else(|_| default_port.to_string())
        .parse::<u16>()
        .unwrap_or_else(|_| {
            log::warn!("Invalid port in {}, using default {}", var_name, default_port);
            default_port
        })
}

/// Create a SocketAddr for binding a service
///
/// # Arguments
/// * `service_name` - The name of the service (e.g., "SUPPORT")
/// * `default_port` - The default port to use if not specified in environment
///
/// # Returns
/// A SocketAddr configured with the appropriate bind address and port
pub fn get_bind_address(service_name: &str, default_port: u16) -> SocketAddr {
    let var_name = format!("{}_SERVICE_ADDR", service_name.to_uppercase());

    if let Ok(addr_str) = env::var(&var_name) {
        if let Ok(addr) = addr_str.parse::<SocketAddr>() {
            return addr;
        }
        log::warn!("Invalid address format in {}, using default", var_name);
    }

    let port = get_service_port(service_name, default_port);
    format!("0.0.0.0:{}", port)
        .parse()
        .expect("static bind address is well-formed")
}

/// Configuration for the generative model endpoint (OpenAI-compatible)
///
/// Reads:
/// - LLM_API_URL: The API endpoint URL (defaults to OpenAI chat completions)
/// - LLM_API_KEY: API key for the provider (empty when unset)
/// - LLM_MODEL: The model to use (defaults to "gpt-4o-mini")
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        let api_url = env::var("LLM_API_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".to_string());
        let model = env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let api_key = env::var("LLM_API_KEY").unwrap_or_default();

        if api_key.is_empty() {
            log::warn!("LLM_API_KEY is not set. Model calls may fail.");
        }

        Self {
            api_url,
            api_key,
            model,
        }
    }
}

/// Configuration for the metrics/logs intake sink
///
/// Reads:
/// - DD_API_KEY: sink credential; absence disables all sends
/// - DD_SITE: intake site (default "datadoghq.com")
/// - SUPPORT_ENV: environment tag value (default "prod")
#[derive(Debug, Clone)]
pub struct SinkConfig {
    pub api_key: Option<String>,
    pub site: String,
    pub environment: String,
}

impl SinkConfig {
    pub fn from_env() -> Self {
        let api_key = env::var("DD_API_KEY").ok().filter(|k| !k.is_empty());
        let site = env::var("DD_SITE").unwrap_or_else(|_| "datadoghq.com".to_string());
        let environment = env::var("SUPPORT_ENV").unwrap_or_else(|_| "prod".to_string());

        if api_key.is_none() {
            log::warn!("DD_API_KEY is not set. Telemetry shipping is disabled.");
        }

        Self {
            api_key,
            site,
            environment,
        }
    }

    /// Whether a credential is configured; without one every send is a no-op
    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}
