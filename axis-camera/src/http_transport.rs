use crate::transport::{ResponseEvent, ResponseFeed, Transport, TransportError};
use reqwest::{Client, Url};
use tokio::runtime::Handle;

/// Sends each command as `GET http://<host>/<command>` on the current tokio
/// runtime and publishes the outcome on the response feed.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    feed: ResponseFeed,
}

impl HttpTransport {
    pub fn new(client: Client, hostname: &str) -> Self {
        Self {
            client,
            base_url: base_url(hostname),
            feed: ResponseFeed::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, command: &str) -> Result<Url, TransportError> {
        let raw = format!("{}{}", self.base_url, command.trim_start_matches('/'));
        Url::parse(&raw).map_err(|err| TransportError::InvalidUrl(format!("{raw}: {err}")))
    }
}

impl Transport for HttpTransport {
    fn send_text(&self, command: &str) -> Result<(), TransportError> {
        let handle = Handle::try_current().map_err(|_| TransportError::NoRuntime)?;
        let url = self.url_for(command)?;
        let client = self.client.clone();
        let feed = self.feed.clone();
        let command = command.to_string();
        tracing::trace!("GET {url}");
        handle.spawn(async move {
            let event = match client.get(url).send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if let Err(err) = response.bytes().await {
                        tracing::debug!("discarding unreadable body for {command}: {err}");
                    }
                    ResponseEvent::completed(command, status)
                }
                Err(err) if err.is_timeout() => ResponseEvent::timed_out(command),
                Err(err) => ResponseEvent::failed(command, err.to_string()),
            };
            feed.publish(event);
        });
        Ok(())
    }

    fn responses(&self) -> ResponseFeed {
        self.feed.clone()
    }
}

fn base_url(hostname: &str) -> String {
    let trimmed = hostname.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        format!("{trimmed}/")
    } else {
        format!("http://{trimmed}/")
    }
}
