//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RpcConfig → Result<(), Vec<ConfigIssue>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::RpcConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// One semantic problem in a config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &RpcConfig) -> Result<(), Vec<ConfigIssue>> {
    let mut issues = Vec::new();
    let mut issue = |field: &'static str, message: String| {
        issues.push(ConfigIssue { field, message });
    };

    if config.server.listen && config.server.bind_address.parse::<SocketAddr>().is_err() {
        issue(
            "server.bind_address",
            format!("'{}' is not a socket address", config.server.bind_address),
        );
    }
    if config.timeouts.request_secs == 0 {
        issue("timeouts.request_secs", "must be greater than 0".to_string());
    }
    if config.limits.max_body_bytes == 0 {
        issue("limits.max_body_bytes", "must be greater than 0".to_string());
    }
    if config.client.timeout_secs == 0 {
        issue("client.timeout_secs", "must be greater than 0".to_string());
    }
    if config.client.connect_timeout_secs == 0 {
        issue("client.connect_timeout_secs", "must be greater than 0".to_string());
    }
    if !LOG_LEVELS.contains(&config.observability.log_level.as_str()) {
        issue(
            "observability.log_level",
            format!("'{}' is not one of {}", config.observability.log_level, LOG_LEVELS.join(", ")),
        );
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        issue(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        );
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}
