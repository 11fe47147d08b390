use std::time::Duration;

use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use reqwest::Url;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::Connector;
use crate::errors::DashboardError;

const PUSH_CHANNEL_PATH: &str = "/ws";
/// Upper bound for the TCP connect plus WebSocket handshake.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Derives the push-channel endpoint from the backend's http(s) base url.
pub fn websocket_url(server_url: &str) -> Result<String, DashboardError> {
    let invalid = |reason: &str| DashboardError::InvalidServerUrl {
        url: server_url.to_string(),
        reason: reason.to_string(),
    };
    let mut url = Url::parse(server_url).map_err(|e| invalid(&e.to_string()))?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(invalid(&format!("unsupported scheme {}", other))),
    };
    url.set_scheme(scheme)
        .map_err(|_| invalid("cannot switch to a websocket scheme"))?;
    url.set_path(PUSH_CHANNEL_PATH);
    url.set_query(None);
    Ok(url.to_string())
}

pub struct WsConnector {
    url: String,
    connect_timeout: Duration,
}

impl WsConnector {
    pub fn new(server_url: &str) -> Result<Self, DashboardError> {
        Ok(Self {
            url: websocket_url(server_url)?,
            connect_timeout: CONNECT_TIMEOUT,
        })
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Connector for WsConnector {
    type Frames = BoxStream<'static, Result<String, DashboardError>>;

    async fn connect(&mut self) -> Result<Self::Frames, DashboardError> {
        let connect_error = |reason: String| DashboardError::ChannelConnect {
            url: self.url.clone(),
            reason,
        };
        let (socket, _) = timeout(self.connect_timeout, connect_async(self.url.as_str()))
            .await
            .map_err(|_| {
                connect_error(format!(
                    "handshake timed out after {:?}",
                    self.connect_timeout
                ))
            })?
            .map_err(|e| connect_error(e.to_string()))?;

        let frames = socket.filter_map(|message| async move {
            match message {
                Ok(Message::Text(text)) => Some(Ok(text)),
                Ok(Message::Binary(bytes)) => Some(Ok(String::from_utf8_lossy(&bytes).into_owned())),
                // ping/pong are answered by tungstenite, the close frame ends the stream
                Ok(_) => None,
                Err(e) => Some(Err(DashboardError::ChannelClosed {
                    reason: e.to_string(),
                })),
            }
        });
        Ok(frames.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_websocket_url() {
        assert_eq!(
            websocket_url("http://127.0.0.1:8000").unwrap(),
            "ws://127.0.0.1:8000/ws"
        );
        assert_eq!(
            websocket_url("https://sorter.local/dashboard?x=1").unwrap(),
            "wss://sorter.local/ws"
        );
        assert_eq!(
            websocket_url("ws://sorter.local:9000/ws").unwrap(),
            "ws://sorter.local:9000/ws"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_handshake_times_out() {
        // accepts TCP through the backlog but never answers the upgrade request
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let server_url = format!("http://{}", listener.local_addr().unwrap());
        let mut connector = WsConnector::new(&server_url)
            .unwrap()
            .with_connect_timeout(Duration::from_secs(2));

        let result = connector.connect().await;
        assert!(matches!(
            result,
            Err(DashboardError::ChannelConnect { reason, .. }) if reason.contains("timed out")
        ));
        drop(listener);
    }

    #[test]
    fn test_websocket_url_rejects_garbage() {
        assert!(matches!(
            websocket_url("not a url"),
            Err(DashboardError::InvalidServerUrl { .. })
        ));
        assert!(matches!(
            websocket_url("ftp://sorter.local"),
            Err(DashboardError::InvalidServerUrl { .. })
        ));
    }
}
