use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use http_differ::models::HttpResponse;
use http_differ::transport::Transport;
use rquest::header::HeaderMap;
use rquest::StatusCode;

pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Transport that replays a scripted queue of responses and records every
/// request it serves. `None` entries simulate unreachable requests.
#[derive(Clone, Debug)]
pub struct ScriptedTransport {
    queue: Arc<Mutex<VecDeque<Option<HttpResponse>>>>,
    requests: Arc<Mutex<Vec<(String, HeaderMap)>>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<Option<HttpResponse>>) -> Self {
        ScriptedTransport {
            queue: Arc::new(Mutex::new(responses.into())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn requests(&self) -> Vec<(String, HeaderMap)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str, headers: &HeaderMap) -> Option<HttpResponse> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), headers.clone()));
        self.queue.lock().unwrap().pop_front().flatten()
    }
}

pub fn response(status: u16, header_pairs: &[(&'static str, &str)], body: &str) -> HttpResponse {
    let mut headers = HeaderMap::new();
    for (name, value) in header_pairs {
        headers.append(*name, value.parse().unwrap());
    }
    HttpResponse {
        status: StatusCode::from_u16(status).unwrap(),
        headers,
        body: body.to_string(),
    }
}
