use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::domain::{ScanPayload, ScanSnapshot, UnitScale};
use crate::error::FetchError;

pub type FetchFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ScanSnapshot, FetchError>> + Send + 'a>>;

/// Something that can produce the latest scan snapshot on demand.
pub trait SnapshotSource: Send + Sync {
    fn fetch(&self) -> FetchFuture<'_>;
}

/// Polls a JSON scan endpoint over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
    units: UnitScale,
}

impl HttpSource {
    pub fn new(
        url: impl Into<String>,
        units: UnitScale,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            units,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request(&self) -> Result<ScanSnapshot, FetchError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        // Servers may pair an error status with an `error` body; the message wins.
        match serde_json::from_str::<ScanPayload>(&body) {
            Ok(payload) if payload.error.is_some() => payload.into_snapshot(self.units),
            Ok(_) | Err(_) if !status.is_success() => Err(FetchError::Status(status.as_u16())),
            Ok(payload) => payload.into_snapshot(self.units),
            Err(e) => Err(e.into()),
        }
    }
}

impl SnapshotSource for HttpSource {
    fn fetch(&self) -> FetchFuture<'_> {
        Box::pin(self.request())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned HTTP response and returns the URL to request.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 2048];
            let _ = socket.read(&mut request).await;
            let response = format!(
                "HTTP/1.1 {status}\r\n\
                 Content-Type: application/json\r\n\
                 Content-Length: {}\r\n\
                 Connection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        format!("http://{addr}/lidar/data")
    }

    fn source(url: String) -> HttpSource {
        HttpSource::new(url, UnitScale::default(), Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn decodes_a_scan_payload() {
        let url = serve_once(
            "200 OK",
            r#"{"scan": [
                {"angle": 0, "distance": 50},
                {"angle": 180, "distance": 50}
            ], "threshold": 800}"#,
        )
        .await;

        let snapshot = source(url).fetch().await.unwrap();
        assert_eq!(snapshot.points.len(), 2);
        assert!((snapshot.gate_threshold - 80.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn server_message_wins_over_error_status() {
        let url = serve_once(
            "500 Internal Server Error",
            r#"{"error": "LIDAR not running"}"#,
        )
        .await;

        let result = source(url).fetch().await;
        assert_eq!(result, Err(FetchError::Server("LIDAR not running".into())));
    }

    #[tokio::test]
    async fn error_status_without_message_is_a_status_error() {
        let url = serve_once("503 Service Unavailable", "upstream down").await;

        let result = source(url).fetch().await;
        assert_eq!(result, Err(FetchError::Status(503)));
    }

    #[tokio::test]
    async fn non_json_body_is_a_decode_error() {
        let url = serve_once("200 OK", "<html>nope</html>").await;

        let error = source(url).fetch().await.unwrap_err();
        assert!(matches!(error, FetchError::Decode(_)));
        assert_eq!(error.user_message(), "Failed to retrieve data");
    }

    #[tokio::test]
    async fn refused_connection_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let error = source(format!("http://{addr}/lidar/data"))
            .fetch()
            .await
            .unwrap_err();
        assert!(matches!(error, FetchError::Transport(_)));
        assert_eq!(error.user_message(), "Failed to retrieve data");
    }
}
