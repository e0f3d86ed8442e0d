//! Remote sync and translation collaborators.
//!
//! The engine only talks to the traits; [`HttpRemote`] is the reqwest-backed
//! implementation used outside tests.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::Operation;
use crate::util::{compact_text, is_http_url, normalize_text_option};

/// Supplies the bearer token for remote calls.
pub trait TokenProvider: Send + Sync {
    /// `None` when the session has no usable token.
    fn token(&self) -> Option<String>;
}

/// Token provider holding a fixed value.
#[derive(Clone, Default)]
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: normalize_text_option(token),
        }
    }
}

impl fmt::Debug for StaticTokenProvider {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("StaticTokenProvider")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl TokenProvider for StaticTokenProvider {
    fn token(&self) -> Option<String> {
        self.token.clone()
    }
}

/// One operation as the sync endpoint expects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncOperation {
    pub operation: String,
    pub wordid: String,
    pub word: String,
    pub translation: String,
    pub context: String,
    pub data: serde_json::Value,
    pub timestamp: String,
}

impl From<&Operation> for SyncOperation {
    fn from(operation: &Operation) -> Self {
        Self {
            operation: operation.kind.wire_name().to_string(),
            wordid: operation.entry_id.to_string(),
            word: operation.headword.clone(),
            translation: String::new(),
            context: String::new(),
            data: operation.payload.clone(),
            timestamp: operation.timestamp.clone(),
        }
    }
}

/// Batch pushed in a single request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRequest {
    pub user_id: String,
    pub operations: Vec<SyncOperation>,
    pub device_id: String,
    pub last_sync_timestamp: Option<String>,
}

impl SyncRequest {
    pub fn new(
        user_id: impl Into<String>,
        operations: &[Operation],
        device_id: impl Into<String>,
        last_sync_timestamp: Option<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            operations: operations.iter().map(SyncOperation::from).collect(),
            device_id: device_id.into(),
            last_sync_timestamp,
        }
    }
}

const fn default_success() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResponse {
    /// Server-assigned timestamp to send back on the next push
    pub sync_timestamp: String,
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub processed_operations: Option<u64>,
    #[serde(default)]
    pub failed_operations: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub word: String,
    pub target_language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TranslationResponse {
    pub word: String,
    #[serde(default)]
    pub translated_word: String,
    /// Abbreviated tags (`n`, `v`, `a`, `s`, `r`), parallel to `english_meanings`
    #[serde(default)]
    pub part_of_speech: Vec<String>,
    #[serde(default)]
    pub english_meanings: Vec<Vec<String>>,
}

#[async_trait]
pub trait SyncRemote: Send + Sync {
    /// Submit the whole batch; any error leaves the caller's queue intact.
    async fn push(&self, token: &str, request: &SyncRequest) -> Result<SyncResponse>;
}

#[async_trait]
pub trait TranslationRemote: Send + Sync {
    async fn translate(
        &self,
        token: &str,
        word: &str,
        target_language: &str,
    ) -> Result<TranslationResponse>;
}

/// HTTP client for both remote endpoints.
#[derive(Clone)]
pub struct HttpRemote {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRemote {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        Ok(Self {
            base_url,
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<B, T>(&self, path: &str, token: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync,
        T: serde::de::DeserializeOwned + Send,
    {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::NotAuthenticated);
        }

        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(token)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::RemoteRejected(parse_api_error(status, &body)));
        }

        response.json::<T>().await.map_err(transport_error)
    }
}

#[async_trait]
impl SyncRemote for HttpRemote {
    async fn push(&self, token: &str, request: &SyncRequest) -> Result<SyncResponse> {
        let response: SyncResponse = self.post_json("/sync/", token, request).await?;
        if !response.success {
            let message = response
                .message
                .unwrap_or_else(|| "sync was not accepted".to_string());
            return Err(Error::RemoteRejected(compact_text(&message)));
        }
        Ok(response)
    }
}

#[async_trait]
impl TranslationRemote for HttpRemote {
    async fn translate(
        &self,
        token: &str,
        word: &str,
        target_language: &str,
    ) -> Result<TranslationResponse> {
        let request = TranslationRequest {
            word: word.to_string(),
            target_language: target_language.to_string(),
        };
        self.post_json("/translate/word", token, &request).await
    }
}

fn normalize_base_url(value: String) -> Result<String> {
    let value = normalize_text_option(Some(value))
        .ok_or_else(|| Error::Configuration("API base URL must not be empty".into()))?;
    if !is_http_url(&value) {
        return Err(Error::Configuration(
            "API base URL must include http:// or https://".into(),
        ));
    }
    Ok(value.trim_end_matches('/').to_string())
}

fn transport_error(error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::Timeout
    } else {
        Error::Network(error)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    detail: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.detail.or(payload.message).or(payload.error) {
            return format!("{} ({})", compact_text(&message), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntryId, OperationKind};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn operation(kind: OperationKind) -> Operation {
        Operation {
            sequence_id: 1,
            kind,
            user_id: "u1".to_string(),
            entry_id: EntryId::new(7),
            headword: "sugar".to_string(),
            payload: json!({ "wordid": 7, "word": "sugar" }),
            timestamp: "2024-01-01 00:00:00.000".to_string(),
        }
    }

    #[test]
    fn sync_request_uses_wire_shape() {
        let request = SyncRequest::new(
            "u1",
            &[operation(OperationKind::Create)],
            "device-1",
            None,
        );

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "user_id": "u1",
                "operations": [{
                    "operation": "add",
                    "wordid": "7",
                    "word": "sugar",
                    "translation": "",
                    "context": "",
                    "data": { "wordid": 7, "word": "sugar" },
                    "timestamp": "2024-01-01 00:00:00.000",
                }],
                "device_id": "device-1",
                "last_sync_timestamp": null,
            })
        );
    }

    #[test]
    fn sync_response_defaults_to_success() {
        let response: SyncResponse =
            serde_json::from_str(r#"{"sync_timestamp":"2024-01-01T00:00:00"}"#).unwrap();
        assert!(response.success);
        assert_eq!(response.message, None);

        let rejected: SyncResponse = serde_json::from_str(
            r#"{"sync_timestamp":"2024-01-01T00:00:00","success":false,"message":"nope"}"#,
        )
        .unwrap();
        assert!(!rejected.success);
    }

    #[test]
    fn translation_response_tolerates_missing_lists() {
        let response: TranslationResponse =
            serde_json::from_str(r#"{"word":"sugar","translated_word":"糖"}"#).unwrap();
        assert!(response.part_of_speech.is_empty());
        assert!(response.english_meanings.is_empty());
    }

    #[test]
    fn base_url_is_validated_and_trimmed() {
        let remote = HttpRemote::new(" https://api.example.com/ ", Duration::from_secs(15)).unwrap();
        assert_eq!(remote.base_url(), "https://api.example.com");

        assert!(matches!(
            HttpRemote::new("api.example.com", Duration::from_secs(15)),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            HttpRemote::new("  ", Duration::from_secs(15)),
            Err(Error::Configuration(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn empty_token_is_not_authenticated() {
        let remote = HttpRemote::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let error = remote.translate("  ", "sugar", "zh-tw").await.unwrap_err();
        assert!(matches!(error, Error::NotAuthenticated));
    }

    #[test]
    fn parse_api_error_prefers_detail() {
        assert_eq!(
            parse_api_error(StatusCode::BAD_REQUEST, r#"{"detail":"bad batch"}"#),
            "bad batch (400)"
        );
        assert_eq!(
            parse_api_error(StatusCode::UNAUTHORIZED, r#"{"error":"expired"}"#),
            "expired (401)"
        );
        assert_eq!(
            parse_api_error(StatusCode::BAD_GATEWAY, "   "),
            "HTTP 502"
        );
    }

    #[test]
    fn static_token_provider_hides_token_and_drops_blank() {
        let provider = StaticTokenProvider::new(Some("secret".to_string()));
        assert_eq!(provider.token().as_deref(), Some("secret"));
        assert!(!format!("{provider:?}").contains("secret"));

        assert_eq!(StaticTokenProvider::new(Some(" ".to_string())).token(), None);
    }
}
