use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AutofillError, Result};
use crate::fill::FieldMapping;
use crate::resolver::{ResolveRequest, Resolver};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/api/match-fields";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Deserialize)]
struct MatchFieldsResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    field_mapping: Option<FieldMapping>,
    #[serde(default)]
    error: Option<String>,
}

/// Posts scanned fields to a matching backend and reads back
/// `{status, field_mapping}`.
pub struct HttpResolver {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpResolver {
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            endpoint: config.endpoint.clone(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Resolver for HttpResolver {
    fn resolve(&self, request: &ResolveRequest) -> Result<FieldMapping> {
        info!(endpoint = %self.endpoint, fields = request.fields.len(), "requesting field mapping");

        let response = self.client.post(&self.endpoint).json(request).send()?;
        let status = response.status();
        let body = response.text()?;
        debug!(%status, bytes = body.len(), "resolver responded");

        let parsed: MatchFieldsResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) if status.is_success() => {
                return Err(AutofillError::Parse {
                    context: "resolver response".into(),
                    message: e.to_string(),
                });
            }
            Err(_) => return Err(AutofillError::Resolver(format!("HTTP {}", status))),
        };

        if !status.is_success() || parsed.status.as_deref() == Some("error") {
            let message = parsed
                .error
                .unwrap_or_else(|| format!("HTTP {}", status));
            return Err(AutofillError::Resolver(message));
        }

        parsed
            .field_mapping
            .ok_or_else(|| AutofillError::Resolver("response has no field_mapping".into()))
    }
}
