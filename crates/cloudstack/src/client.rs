//! Client core: request signing, dispatch, and async job polling.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use ring::hmac;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::options::ListOption;
use crate::params::QueryParams;

/// Pause between `queryAsyncJobResult` polls.
const ASYNC_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Default budget for a single async job to complete.
pub const DEFAULT_ASYNC_TIMEOUT: Duration = Duration::from_secs(300);

/// Shared handle to a CloudStack endpoint.
///
/// Cloning is cheap and every method takes `&self`, so one client serves
/// any number of concurrent resource operations.
#[derive(Clone)]
pub struct CloudStackClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    secret_key: String,
    async_timeout: Duration,
    options: Vec<ListOption>,
}

impl CloudStackClient {
    pub fn new(api_url: &str, api_key: &str, secret_key: &str) -> Self {
        Self {
            inner: Arc::new(Inner {
                http: reqwest::Client::new(),
                api_url: api_url.trim_end_matches('/').to_string(),
                api_key: api_key.to_string(),
                secret_key: secret_key.to_string(),
                async_timeout: DEFAULT_ASYNC_TIMEOUT,
                options: Vec::new(),
            }),
        }
    }

    /// Sets the async job poll budget.
    pub fn with_async_timeout(self, timeout: Duration) -> Self {
        let mut inner = self.into_inner();
        inner.async_timeout = timeout;
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Sets client-wide list options, applied before per-call options.
    pub fn with_default_options(self, options: Vec<ListOption>) -> Self {
        let mut inner = self.into_inner();
        inner.options = options;
        Self {
            inner: Arc::new(inner),
        }
    }

    fn into_inner(self) -> Inner {
        match Arc::try_unwrap(self.inner) {
            Ok(inner) => inner,
            Err(shared) => Inner {
                http: shared.http.clone(),
                api_url: shared.api_url.clone(),
                api_key: shared.api_key.clone(),
                secret_key: shared.secret_key.clone(),
                async_timeout: shared.async_timeout,
                options: shared.options.clone(),
            },
        }
    }

    pub fn api_url(&self) -> &str {
        &self.inner.api_url
    }

    pub(crate) fn default_options(&self) -> &[ListOption] {
        &self.inner.options
    }

    /// Signs an encoded query string the way the server verifies it:
    /// lowercase the whole string, HMAC-SHA1 with the secret key, base64.
    fn sign(&self, query: &str) -> String {
        let message = query.to_lowercase();
        let key = hmac::Key::new(
            hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY,
            self.inner.secret_key.as_bytes(),
        );
        let tag = hmac::sign(&key, message.as_bytes());
        BASE64.encode(tag.as_ref())
    }

    /// Issues `command` and returns the payload inside the response envelope.
    pub(crate) async fn request(&self, command: &str, params: &QueryParams) -> Result<Value> {
        let mut all = params.clone();
        all.set("command", command);
        all.set("response", "json");
        all.set("apikey", &self.inner.api_key);

        let query = all.encode();
        let signature = self.sign(&query);
        let url = format!(
            "{}?{}&signature={}",
            self.inner.api_url,
            query,
            urlencoding::encode(&signature)
        );

        trace!(command, "issuing API request");
        let response = self.inner.http.get(&url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        let payload = unwrap_envelope(&body)?;
        if let Some(err) = decode_api_error(&payload) {
            debug!(command, %err, "API request failed");
            return Err(err);
        }
        if !status.is_success() {
            return Err(Error::Api {
                error_code: status.as_u16() as i32,
                cs_error_code: 0,
                error_text: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok(payload)
    }

    /// Executes a synchronous command and decodes the envelope payload.
    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        command: &str,
        params: &QueryParams,
    ) -> Result<T> {
        let payload = self.request(command, params).await?;
        Ok(serde_json::from_value(payload)?)
    }

    /// Executes a synchronous command whose payload nests the entity one
    /// level deeper (e.g. `{"keypair": {...}}` inside the envelope).
    pub(crate) async fn execute_nested<T: DeserializeOwned>(
        &self,
        command: &str,
        params: &QueryParams,
    ) -> Result<T> {
        let payload = self.request(command, params).await?;
        Ok(serde_json::from_value(unwrap_entity(payload))?)
    }

    /// Executes an asynchronous command: dispatches it, waits for the job
    /// to finish, and decodes the entity out of the job result.
    pub(crate) async fn execute_async<T: DeserializeOwned>(
        &self,
        command: &str,
        params: &QueryParams,
    ) -> Result<T> {
        let payload = self.request(command, params).await?;
        let result = match payload.get("jobid").and_then(Value::as_str) {
            Some(job_id) => {
                let job_id = job_id.to_string();
                unwrap_entity(self.wait_for_job(&job_id).await?)
            }
            // Some deployments answer synchronously; take the payload as-is.
            None => payload,
        };
        Ok(serde_json::from_value(result)?)
    }

    /// Polls `queryAsyncJobResult` until the job finishes or the timeout
    /// elapses, returning the raw `jobresult` object on success.
    pub async fn wait_for_job(&self, job_id: &str) -> Result<Value> {
        let mut params = QueryParams::new();
        params.set("jobid", job_id);

        let deadline = tokio::time::Instant::now() + self.inner.async_timeout;
        loop {
            let job = self.request("queryAsyncJobResult", &params).await?;
            match evaluate_job(&job) {
                JobPoll::Pending => {
                    if tokio::time::Instant::now() >= deadline {
                        return Err(Error::JobTimeout(job_id.to_string()));
                    }
                    tokio::time::sleep(ASYNC_POLL_INTERVAL).await;
                }
                JobPoll::Done(result) => {
                    trace!(job_id, "async job completed");
                    return Ok(result);
                }
                JobPoll::Failed(error_text) => {
                    return Err(Error::JobFailed {
                        job_id: job_id.to_string(),
                        error_text,
                    });
                }
            }
        }
    }
}

/// Outcome of a single `queryAsyncJobResult` poll.
#[derive(Debug)]
enum JobPoll {
    Pending,
    Done(Value),
    Failed(String),
}

/// Reads the job status out of a poll response: 0 is still running,
/// 1 carries the result, anything else is a failure with `errortext`
/// nested in the job result. A missing status counts as running.
fn evaluate_job(job: &Value) -> JobPoll {
    match job.get("jobstatus").and_then(Value::as_i64).unwrap_or(0) {
        0 => JobPoll::Pending,
        1 => JobPoll::Done(job.get("jobresult").cloned().unwrap_or(Value::Null)),
        _ => JobPoll::Failed(
            job.get("jobresult")
                .and_then(|r| r.get("errortext"))
                .and_then(Value::as_str)
                .unwrap_or("unknown job error")
                .to_string(),
        ),
    }
}

/// Extracts the payload from the single-key `<command>response` envelope.
fn unwrap_envelope(body: &[u8]) -> Result<Value> {
    let map: serde_json::Map<String, Value> = serde_json::from_slice(body)?;
    let mut values = map.into_iter();
    match (values.next(), values.next()) {
        (Some((_, payload)), None) => Ok(payload),
        _ => Err(Error::BadEnvelope),
    }
}

/// Unwraps a payload of the form `{"<entity>": {...}}` to the inner object.
/// Job results and a handful of synchronous commands nest like this.
fn unwrap_entity(payload: Value) -> Value {
    match &payload {
        Value::Object(map) if map.len() == 1 => {
            let inner = map.values().next();
            match inner {
                Some(Value::Object(_)) => inner.cloned().unwrap_or(payload),
                _ => payload,
            }
        }
        _ => payload,
    }
}

/// Decodes a server-reported error from an envelope payload, if present.
fn decode_api_error(payload: &Value) -> Option<Error> {
    let error_code = payload.get("errorcode")?.as_i64()? as i32;
    Some(Error::Api {
        error_code,
        cs_error_code: payload
            .get("cserrorcode")
            .and_then(Value::as_i64)
            .unwrap_or(0) as i32,
        error_text: payload
            .get("errortext")
            .and_then(Value::as_str)
            .unwrap_or("no error text")
            .to_string(),
    })
}

/// Response of commands that only report success, e.g. deletes.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SuccessResponse {
    #[serde(default)]
    pub displaytext: String,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub success: bool,
}

/// Older servers send `"success": "true"` as a string.
fn flexible_bool<'de, D: Deserializer<'de>>(de: D) -> std::result::Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }
    Ok(match Flag::deserialize(de)? {
        Flag::Bool(b) => b,
        Flag::Text(t) => t == "true",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn signature_matches_known_vector() {
        let cs = CloudStackClient::new("http://localhost:8080/client/api", "api-key", "secret-key");
        // base64(hmac-sha1("secret-key",
        //   "apikey=api-key&command=listzones&name=test%20zone&response=json"))
        let signed = cs.sign("apikey=api-key&command=listZones&name=TeSt%20Zone&response=json");
        assert_eq!(signed, "1ZXXOI3Osr4+XOgSu6xUq1b2aec=");
    }

    #[test]
    fn signature_lowercases_before_signing() {
        let cs = CloudStackClient::new("http://localhost:8080/client/api", "api-key", "secret-key");
        let upper = cs.sign("apikey=api-key&command=deleteVpnGateway&id=6ea2cdfe-1b7d-42b6-8cf8-1c4bd40110f9&response=json");
        let lower = cs.sign("apikey=api-key&command=deletevpngateway&id=6ea2cdfe-1b7d-42b6-8cf8-1c4bd40110f9&response=json");
        assert_eq!(upper, lower);
        assert_eq!(upper, "agcscWKo2zgOZ8Jwos323jsO8lU=");
    }

    #[test]
    fn envelope_unwraps_single_key() {
        let body = br#"{"listzonesresponse": {"count": 1, "zone": [{"id": "z1"}]}}"#;
        let payload = unwrap_envelope(body).unwrap();
        assert_eq!(payload["count"], 1);
    }

    #[test]
    fn envelope_rejects_multiple_keys() {
        let body = br#"{"a": {}, "b": {}}"#;
        assert!(matches!(unwrap_envelope(body), Err(Error::BadEnvelope)));
    }

    #[test]
    fn entity_unwraps_single_object_key() {
        let nested = json!({"vpc": {"id": "v1", "name": "test"}});
        assert_eq!(unwrap_entity(nested)["id"], "v1");

        // A bare success payload stays as-is.
        let flat = json!({"success": true});
        assert_eq!(unwrap_entity(flat)["success"], true);
    }

    #[test]
    fn api_error_is_decoded() {
        let payload = json!({
            "errorcode": 431,
            "cserrorcode": 9999,
            "errortext": "Unable to find affinity group",
        });
        let err = decode_api_error(&payload).unwrap();
        match err {
            Error::Api {
                error_code,
                cs_error_code,
                error_text,
            } => {
                assert_eq!(error_code, 431);
                assert_eq!(cs_error_code, 9999);
                assert_eq!(error_text, "Unable to find affinity group");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn running_job_keeps_polling() {
        let job = json!({"jobstatus": 0, "jobprocstatus": 0});
        assert!(matches!(evaluate_job(&job), JobPoll::Pending));
    }

    #[test]
    fn completed_job_yields_its_result() {
        let job = json!({"jobstatus": 1, "jobresult": {"vpc": {"id": "v1"}}});
        match evaluate_job(&job) {
            JobPoll::Done(result) => assert_eq!(result["vpc"]["id"], "v1"),
            other => panic!("unexpected poll outcome: {other:?}"),
        }

        // A completed job without a result still finishes.
        let bare = json!({"jobstatus": 1});
        match evaluate_job(&bare) {
            JobPoll::Done(result) => assert_eq!(result, Value::Null),
            other => panic!("unexpected poll outcome: {other:?}"),
        }
    }

    #[test]
    fn failed_job_surfaces_error_text() {
        let job = json!({
            "jobstatus": 2,
            "jobresult": {"errorcode": 530, "errortext": "Failed to create VPC"},
        });
        match evaluate_job(&job) {
            JobPoll::Failed(text) => assert_eq!(text, "Failed to create VPC"),
            other => panic!("unexpected poll outcome: {other:?}"),
        }

        let opaque = json!({"jobstatus": 2});
        match evaluate_job(&opaque) {
            JobPoll::Failed(text) => assert_eq!(text, "unknown job error"),
            other => panic!("unexpected poll outcome: {other:?}"),
        }
    }

    #[test]
    fn missing_job_status_counts_as_running() {
        let job = json!({"accountid": "a1"});
        assert!(matches!(evaluate_job(&job), JobPoll::Pending));
    }

    #[test]
    fn success_response_accepts_string_flag() {
        let r: SuccessResponse =
            serde_json::from_value(json!({"success": "true", "displaytext": "ok"})).unwrap();
        assert!(r.success);
        let r: SuccessResponse = serde_json::from_value(json!({"success": false})).unwrap();
        assert!(!r.success);
        let r: SuccessResponse = serde_json::from_value(json!({})).unwrap();
        assert!(!r.success);
    }
}
