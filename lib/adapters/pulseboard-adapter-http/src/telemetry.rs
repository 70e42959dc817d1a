use async_trait::async_trait;
use tracing::debug;

use pulseboard_domain::{FieldMap, FieldValue, SourceError};
use pulseboard_ports::TelemetrySource;

/// Telemetry source backed by an HTTP endpoint returning a flat JSON object
/// of numbers and strings.
#[derive(Debug, Clone)]
pub struct HttpTelemetrySource {
    name: String,
    url: String,
    client: reqwest::Client,
}

impl HttpTelemetrySource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TelemetrySource for HttpTelemetrySource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, bearer: &str) -> Result<FieldMap, SourceError> {
        debug!("fetching telemetry from {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|err| SourceError::Transport(err.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(SourceError::Unauthorized);
        }
        if !status.is_success() {
            return Err(SourceError::Transport(format!("status {status}")));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|err| SourceError::MalformedPayload(err.to_string()))?;
        decode_fields(&payload)
    }
}

/// Decode a telemetry payload into a field map. Anything other than a flat
/// JSON object of numbers and strings is malformed.
pub fn decode_fields(payload: &serde_json::Value) -> Result<FieldMap, SourceError> {
    let object = payload
        .as_object()
        .ok_or_else(|| SourceError::MalformedPayload("expected a JSON object".into()))?;

    let mut fields = FieldMap::new();
    for (name, value) in object {
        let field = match value {
            serde_json::Value::Number(number) => FieldValue::Number(
                number
                    .as_f64()
                    .ok_or_else(|| SourceError::MalformedPayload(format!("field {name} is not representable as f64")))?,
            ),
            serde_json::Value::String(text) => FieldValue::Text(text.clone()),
            _ => {
                return Err(SourceError::MalformedPayload(format!(
                    "field {name} is not a number or string"
                )));
            }
        };
        fields.insert(name.clone(), field);
    }
    Ok(fields)
}
