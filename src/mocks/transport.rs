//! Mock HTTP transport for testing.

use crate::error::S3Error;
use crate::transport::{ByteStream, ChunkCallback, HttpRequest, HttpResponse, HttpTransport};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Default size of the chunks `send_into` hands to the callback.
const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Mock HTTP response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Bytes,
}

impl MockResponse {
    /// Create a response with the given status and no body.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Bytes::new(),
        }
    }

    /// Create a successful response with empty body.
    pub fn ok() -> Self {
        Self::new(200)
    }

    /// Create a successful response with body.
    pub fn ok_with_body(body: impl Into<Bytes>) -> Self {
        Self::new(200).with_body(body)
    }

    /// Create a 204 No Content response.
    pub fn no_content() -> Self {
        Self::new(204)
    }

    /// Create an error response.
    pub fn error(status: u16, body: impl Into<Bytes>) -> Self {
        Self::new(status).with_body(body)
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Add a header to the response.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

enum Reply {
    Response(MockResponse),
    Error(S3Error),
}

/// Builder for a mock transport with queued responses.
pub struct MockResponseBuilder {
    responses: Vec<MockResponse>,
}

impl MockResponseBuilder {
    /// Create a new mock response builder.
    pub fn new() -> Self {
        Self {
            responses: Vec::new(),
        }
    }

    /// Add a response to return.
    pub fn respond(mut self, response: MockResponse) -> Self {
        self.responses.push(response);
        self
    }

    /// Build the mock transport.
    pub fn build(self) -> MockTransport {
        MockTransport::with_responses(self.responses)
    }
}

impl Default for MockResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Mock HTTP transport.
///
/// Replies are served in FIFO order. Streamed request bodies are collected
/// and recorded like buffered ones.
pub struct MockTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<HttpRequest>>,
    streamed: Mutex<Vec<bool>>,
    default_response: Option<MockResponse>,
    chunk_size: usize,
}

impl MockTransport {
    /// Create a new mock transport with no responses.
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            streamed: Mutex::new(Vec::new()),
            default_response: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Create a mock transport with queued responses.
    pub fn with_responses(responses: Vec<MockResponse>) -> Self {
        let transport = Self::new();
        for response in responses {
            transport.enqueue(response);
        }
        transport
    }

    /// Create a mock transport that answers every request the same way.
    pub fn with_default(response: MockResponse) -> Self {
        Self {
            default_response: Some(response),
            ..Self::new()
        }
    }

    /// Set the chunk size used for streamed response bodies.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Create a builder for the mock transport.
    pub fn builder() -> MockResponseBuilder {
        MockResponseBuilder::new()
    }

    /// Queue a response.
    pub fn enqueue(&self, response: MockResponse) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Reply::Response(response));
    }

    /// Queue a transport failure.
    pub fn enqueue_error(&self, error: impl Into<S3Error>) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Reply::Error(error.into()));
    }

    /// Get all recorded requests.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Get the number of requests made.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Get the last request made.
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    /// Whether the request at `index` was sent with a streamed body.
    pub fn was_streamed(&self, index: usize) -> bool {
        self.streamed
            .lock()
            .unwrap()
            .get(index)
            .copied()
            .unwrap_or(false)
    }

    /// Number of replies still queued.
    pub fn pending(&self) -> usize {
        self.replies.lock().unwrap().len()
    }

    fn record(&self, request: HttpRequest, streamed: bool) {
        self.requests.lock().unwrap().push(request);
        self.streamed.lock().unwrap().push(streamed);
    }

    fn next_reply(&self) -> Result<HttpResponse, S3Error> {
        let reply = self.replies.lock().unwrap().pop_front();
        let mock = match reply {
            Some(Reply::Response(mock)) => mock,
            Some(Reply::Error(error)) => return Err(error),
            None => self.default_response.clone().ok_or_else(|| {
                S3Error::Network(crate::error::NetworkError::ConnectionFailed {
                    message: "No mock response available".to_string(),
                })
            })?,
        };

        Ok(HttpResponse {
            status: mock.status,
            headers: mock.headers,
            body: mock.body,
        })
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, S3Error> {
        self.record(request, false);
        self.next_reply()
    }

    async fn send_streaming(
        &self,
        mut request: HttpRequest,
        mut body_stream: ByteStream,
    ) -> Result<HttpResponse, S3Error> {
        let mut collected = BytesMut::new();
        while let Some(chunk) = body_stream.next().await {
            collected.extend_from_slice(&chunk?);
        }
        request.body = Some(collected.freeze());

        self.record(request, true);
        self.next_reply()
    }

    async fn send_into(
        &self,
        request: HttpRequest,
        on_chunk: ChunkCallback<'_>,
    ) -> Result<HttpResponse, S3Error> {
        self.record(request, false);
        let mut response = self.next_reply()?;

        if response.is_success() {
            for chunk in response.body.chunks(self.chunk_size) {
                on_chunk(chunk);
            }
            response.body = Bytes::new();
        }
        Ok(response)
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("queued_replies", &self.replies.lock().unwrap().len())
            .field("recorded_requests", &self.requests.lock().unwrap().len())
            .finish()
    }
}
