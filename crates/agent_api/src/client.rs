use std::collections::VecDeque;
use std::future::Future;
use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};
use std::time::Duration;

use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use log::{debug, info};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;

use crate::config::AgentApiConfig;
use crate::endpoint::EndpointPool;
use crate::error::{parse_error_message, AgentApiError};
use crate::frame::{FrameDecoder, StreamRecord};
use crate::headers::build_headers;
use crate::payload::AgentRequest;

/// Optional cancellation signal shared across request and stream loops.
pub type CancellationSignal = Arc<AtomicBool>;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

type ChunkStream = BoxStream<'static, Result<Vec<u8>, reqwest::Error>>;

#[derive(Debug)]
pub struct AgentApiClient {
    http: Client,
    config: AgentApiConfig,
    pool: Arc<EndpointPool>,
}

impl AgentApiClient {
    pub fn new(config: AgentApiConfig) -> Result<Self, AgentApiError> {
        let pool = Arc::new(EndpointPool::new(&config.endpoints)?);
        Self::with_pool(config, pool)
    }

    /// Creates a client that shares an existing endpoint pool.
    pub fn with_pool(config: AgentApiConfig, pool: Arc<EndpointPool>) -> Result<Self, AgentApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Ok(Self { http, config, pool })
    }

    pub fn config(&self) -> &AgentApiConfig {
        &self.config
    }

    pub fn pool(&self) -> &Arc<EndpointPool> {
        &self.pool
    }

    pub fn build_headers(&self) -> Result<HeaderMap, AgentApiError> {
        let mut out = HeaderMap::new();
        for (key, value) in build_headers(&self.config) {
            out.insert(
                HeaderName::from_bytes(key.as_bytes())
                    .map_err(|_| AgentApiError::InvalidHeader(format!("invalid header key: {key}")))?,
                HeaderValue::from_str(&value).map_err(|_| {
                    AgentApiError::InvalidHeader(format!("invalid header value for {key}"))
                })?,
            );
        }
        Ok(out)
    }

    pub fn build_request(
        &self,
        endpoint: &str,
        request: &AgentRequest,
    ) -> Result<reqwest::RequestBuilder, AgentApiError> {
        let headers = self.build_headers()?;
        Ok(self.http.post(endpoint).headers(headers).json(request))
    }

    /// Opens a response stream, rotating through the endpoint pool.
    ///
    /// The cached last-success endpoint is tried first. A non-success status
    /// or a network failure advances to the next candidate; at most one
    /// attempt is made per endpoint.
    pub async fn open_stream(
        &self,
        request: &AgentRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<RecordStream, AgentApiError> {
        let order = self.pool.attempt_order();
        let attempts = order.len();
        let mut last_error = None;

        for index in order {
            if is_cancelled(cancellation) {
                return Err(AgentApiError::Cancelled);
            }
            let Some(endpoint) = self.pool.url(index) else {
                continue;
            };

            debug!("opening agent stream at {endpoint}");
            let response = self.build_request(endpoint, request)?.send();
            let response = await_or_cancel(response, cancellation).await?;

            let failure = match response {
                Ok(response) if response.status().is_success() => {
                    self.pool.record_success(index);
                    info!("agent stream opened at {endpoint}");
                    let chunks: ChunkStream = response
                        .bytes_stream()
                        .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
                        .boxed();
                    return Ok(RecordStream::new(
                        endpoint.to_owned(),
                        chunks,
                        cancellation.cloned(),
                    ));
                }
                Ok(response) => {
                    let status = response.status();
                    let body = await_or_cancel(response.text(), cancellation)
                        .await?
                        .unwrap_or_default();
                    AgentApiError::Status(status, parse_error_message(status, &body))
                }
                Err(error) => AgentApiError::from(error),
            };

            let message = failure.to_string();
            self.pool.record_failure(index, &message);
            last_error = Some(message);
        }

        Err(AgentApiError::AllEndpointsFailed {
            attempts,
            last_error,
        })
    }
}

/// Decoded records of one open response, pulled one at a time.
pub struct RecordStream {
    endpoint: String,
    chunks: ChunkStream,
    decoder: FrameDecoder,
    ready: VecDeque<StreamRecord>,
    closed: bool,
    cancellation: Option<CancellationSignal>,
}

impl std::fmt::Debug for RecordStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStream")
            .field("endpoint", &self.endpoint)
            .field("ready", &self.ready.len())
            .field("closed", &self.closed)
            .finish()
    }
}

impl RecordStream {
    fn new(endpoint: String, chunks: ChunkStream, cancellation: Option<CancellationSignal>) -> Self {
        Self {
            endpoint,
            chunks,
            decoder: FrameDecoder::default(),
            ready: VecDeque::new(),
            closed: false,
            cancellation,
        }
    }

    /// Endpoint that served this stream.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Significant lines dropped so far because they were not valid JSON.
    pub fn malformed_count(&self) -> usize {
        self.decoder.malformed_count()
    }

    /// Next decoded record, or `None` once the transport has closed.
    ///
    /// Each call suspends at most once per chunk read.
    pub async fn next_record(&mut self) -> Result<Option<StreamRecord>, AgentApiError> {
        loop {
            if let Some(record) = self.ready.pop_front() {
                return Ok(Some(record));
            }
            if self.closed {
                return Ok(None);
            }

            let chunk = await_or_cancel(self.chunks.next(), self.cancellation.as_ref()).await?;
            match chunk {
                Some(chunk) => {
                    let chunk = chunk?;
                    self.ready.extend(self.decoder.feed(&chunk));
                }
                None => {
                    self.closed = true;
                    self.ready.extend(self.decoder.finish());
                }
            }
        }
    }
}

fn is_cancelled(cancel: Option<&CancellationSignal>) -> bool {
    cancel.is_some_and(|token| token.load(Ordering::Acquire))
}

async fn await_or_cancel<F>(
    future: F,
    cancellation: Option<&CancellationSignal>,
) -> Result<F::Output, AgentApiError>
where
    F: Future,
{
    if cancellation.is_none() {
        return Ok(future.await);
    }

    let mut future = Box::pin(future);

    loop {
        if is_cancelled(cancellation) {
            return Err(AgentApiError::Cancelled);
        }

        if let Ok(output) = tokio::time::timeout(CANCEL_POLL_INTERVAL, &mut future).await {
            if is_cancelled(cancellation) {
                return Err(AgentApiError::Cancelled);
            }
            return Ok(output);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_request_posts_json_to_endpoint() {
        let config = AgentApiConfig::new(["http://127.0.0.1:9/api/agent"]);
        let client = AgentApiClient::new(config).expect("client");
        let request = AgentRequest::new("hello", "general");

        let http_request = client
            .build_request("http://127.0.0.1:9/api/agent", &request)
            .expect("builder")
            .build()
            .expect("request");

        assert_eq!(http_request.method(), "POST");
        assert_eq!(http_request.url().as_str(), "http://127.0.0.1:9/api/agent");
        let body = http_request
            .body()
            .and_then(|body| body.as_bytes())
            .expect("buffered body");
        let json: serde_json::Value = serde_json::from_slice(body).expect("json body");
        assert_eq!(
            json,
            serde_json::json!({"prompt": "hello", "user": null, "agent": "general"})
        );
    }

    #[tokio::test]
    async fn cancelled_signal_short_circuits_open() {
        let client =
            AgentApiClient::new(AgentApiConfig::new(["http://127.0.0.1:9/api/agent"])).expect("client");
        let cancel: CancellationSignal = Arc::new(AtomicBool::new(true));

        let error = client
            .open_stream(&AgentRequest::new("hi", "general"), Some(&cancel))
            .await
            .expect_err("cancelled");
        assert!(matches!(error, AgentApiError::Cancelled));
    }
}
