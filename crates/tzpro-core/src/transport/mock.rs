use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;

use super::{Request, Response, Transport};

#[derive(Clone)]
enum Reply {
    Respond(Response),
    Fail(String),
    Stall(Duration),
}

/// A mock transport for testing. Serves canned replies keyed by the exact
/// request path (query string included) and records every request.
///
/// Each path holds a queue of replies; the last reply is sticky and served
/// for every further request. Unknown paths answer `404`.
pub struct MockTransport {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<Request>>,
}

impl MockTransport {
    pub fn builder() -> MockTransportBuilder {
        MockTransportBuilder {
            replies: HashMap::new(),
        }
    }

    pub fn calls(&self) -> Vec<Request> {
        self.calls.lock().expect("mock calls lock").clone()
    }

    pub fn call_paths(&self) -> Vec<String> {
        self.calls().into_iter().map(|r| r.path).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("mock calls lock").len()
    }
}

pub struct MockTransportBuilder {
    replies: HashMap<String, VecDeque<Reply>>,
}

impl MockTransportBuilder {
    pub fn with_json(self, path: &str, body: &str) -> Self {
        self.with_status(path, 200, body)
    }

    pub fn with_status(self, path: &str, status: u16, body: &str) -> Self {
        self.push(
            path,
            Reply::Respond(Response {
                status,
                body: body.as_bytes().to_vec(),
            }),
        )
    }

    pub fn with_failure(self, path: &str, message: &str) -> Self {
        self.push(path, Reply::Fail(message.to_owned()))
    }

    /// Sleep before answering with the next queued reply.
    pub fn with_stall(self, path: &str, delay: Duration) -> Self {
        self.push(path, Reply::Stall(delay))
    }

    fn push(mut self, path: &str, reply: Reply) -> Self {
        self.replies.entry(path.to_owned()).or_default().push_back(reply);
        self
    }

    pub fn build(self) -> MockTransport {
        MockTransport {
            replies: Mutex::new(self.replies),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockTransport {
    fn next_reply(&self, path: &str) -> Option<Reply> {
        let mut replies = self.replies.lock().expect("mock replies lock");
        let queue = replies.get_mut(path)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, request: &Request) -> Result<Response, TransportError> {
        self.calls
            .lock()
            .expect("mock calls lock")
            .push(request.clone());

        loop {
            match self.next_reply(&request.path) {
                None => {
                    return Ok(Response {
                        status: 404,
                        body: format!("no mock for {}", request.path).into_bytes(),
                    });
                }
                Some(Reply::Respond(response)) => return Ok(response),
                Some(Reply::Fail(message)) => return Err(TransportError::Other(message)),
                Some(Reply::Stall(delay)) => tokio::time::sleep(delay).await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replies_are_queued_with_sticky_last() {
        let mock = MockTransport::builder()
            .with_failure("/a", "boom")
            .with_json("/a", "[]")
            .build();

        let first = mock.get(&Request::get("/a")).await;
        assert!(matches!(first, Err(TransportError::Other(ref m)) if m == "boom"));
        for _ in 0..2 {
            let next = mock.get(&Request::get("/a")).await.expect("sticky reply");
            assert_eq!(next.body, b"[]");
        }
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let mock = MockTransport::builder().build();
        let response = mock.get(&Request::get("/missing")).await.expect("response");
        assert_eq!(response.status, 404);
        assert_eq!(mock.call_paths(), vec!["/missing".to_owned()]);
    }
}
