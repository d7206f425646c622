// CLASSIFICATION: COMMUNITY
// Filename: oracle.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-18

//! Client for the call-proposal service.
//!
//! The service receives a masked statement list and answers with one call
//! statement for the masked slot. Any failure here is soft: the mutation
//! is simply abandoned.

use std::time::Duration;

use log::{debug, warn};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ureq::{Agent, AgentBuilder};

use crate::config::EngineConfig;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle transport error: {0}")]
    Transport(String),
    #[error("oracle returned HTTP {0}")]
    Status(u16),
    #[error("oracle payload error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Request body: `{"Syscalls": [...]}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OracleRequest {
    #[serde(rename = "Syscalls")]
    pub syscalls: Vec<String>,
}

fn missing_state() -> i64 {
    -1
}

/// Response body: `{"State": int, "Syscall": string}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OracleResponse {
    #[serde(rename = "State", default = "missing_state")]
    pub state: i64,
    #[serde(rename = "Syscall", default)]
    pub syscall: String,
}

impl OracleResponse {
    /// The proposal, if the service reported success.
    pub fn proposal(&self) -> Option<&str> {
        (self.state == 0).then_some(self.syscall.as_str())
    }
}

/// Anything that can propose a call for a masked sequence.
pub trait Oracle: Send + Sync {
    fn propose(&self, masked: &[String]) -> Result<OracleResponse, OracleError>;
}

/// HTTP oracle sharing one pooled agent across workers.
pub struct HttpOracle {
    url: String,
    timeout: Duration,
    agent: OnceCell<Agent>,
}

impl HttpOracle {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
            agent: OnceCell::new(),
        }
    }

    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self::new(cfg.oracle_url(), cfg.timeout())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn agent(&self) -> &Agent {
        self.agent
            .get_or_init(|| AgentBuilder::new().timeout(self.timeout).build())
    }
}

impl Oracle for HttpOracle {
    fn propose(&self, masked: &[String]) -> Result<OracleResponse, OracleError> {
        let body = serde_json::to_string(&OracleRequest {
            syscalls: masked.to_vec(),
        })?;
        debug!("querying oracle at {} with {} statements", self.url, masked.len());
        let resp = match self
            .agent()
            .post(&self.url)
            .set("Content-Type", "application/json")
            .send_string(&body)
        {
            Ok(resp) => resp,
            Err(ureq::Error::Status(code, _)) => return Err(OracleError::Status(code)),
            Err(e) => return Err(OracleError::Transport(e.to_string())),
        };
        let text = resp
            .into_string()
            .map_err(|e| OracleError::Transport(e.to_string()))?;
        let parsed: OracleResponse = serde_json::from_str(&text)?;
        if parsed.state != 0 {
            warn!("oracle declined with state {}", parsed.state);
        }
        Ok(parsed)
    }
}
