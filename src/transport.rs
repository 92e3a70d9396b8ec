//! HTTP collaborator used for baseline and subject requests.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use rquest::header::HeaderMap;
use rquest::redirect::Policy;
use rquest::Client;
use rquest_util::Emulation;

use crate::models::HttpResponse;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Issues the GET requests the comparator needs.
///
/// Implementations must keep redirects disabled and apply the given extra
/// headers. `None` is the distinguishable "unreachable" outcome required by
/// the comparator's non-signal policy: connection failures, resets and WAF
/// drops all map to it instead of surfacing as errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, headers: &HeaderMap) -> Option<HttpResponse>;
}

/// Default transport: an emulated-browser `rquest` client with redirects
/// disabled and a fixed request timeout.
pub struct RquestTransport {
    client: Client,
}

impl RquestTransport {
    pub fn new() -> Result<Self, rquest::Error> {
        let client = Client::builder()
            .emulation(Emulation::Chrome126)
            .redirect(Policy::none())
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(RquestTransport { client })
    }
}

#[async_trait]
impl Transport for RquestTransport {
    async fn get(&self, url: &str, headers: &HeaderMap) -> Option<HttpResponse> {
        let sent = self.client.get(url).headers(headers.clone()).send().await;
        match sent {
            Ok(resp) => {
                let status = resp.status();
                let headers = resp.headers().clone();
                match resp.text().await {
                    Ok(body) => Some(HttpResponse {
                        status,
                        headers,
                        body,
                    }),
                    Err(e) => {
                        debug!("failed to read body from {}: {}", url, e);
                        None
                    }
                }
            }
            Err(e) => {
                debug!("request to {} failed: {}", url, e);
                None
            }
        }
    }
}
