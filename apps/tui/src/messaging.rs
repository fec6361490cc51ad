//! Cross-window signalling.
//!
//! A primary display listens on an injected channel for requests to open a
//! secondary display. Secondary displays run the same pipeline and ignore
//! those requests.

use std::process::Command;

use clap::ValueEnum;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WindowRole {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OpenVizContent {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum ChannelMessage {
    OpenLidarViz(OpenVizContent),
    #[serde(other)]
    Unknown,
}

impl ChannelMessage {
    pub fn parse(line: &str) -> Option<Self> {
        match serde_json::from_str(line) {
            Ok(message) => Some(message),
            Err(error) => {
                tracing::debug!(%error, "Ignoring unreadable relay message");
                None
            }
        }
    }
}

pub trait MessageChannel {
    /// Next pending message, without waiting.
    fn try_next(&mut self) -> Option<ChannelMessage>;
}

/// In-process channel backed by an unbounded queue.
pub struct QueueChannel {
    rx: mpsc::UnboundedReceiver<ChannelMessage>,
}

impl QueueChannel {
    pub fn new() -> (mpsc::UnboundedSender<ChannelMessage>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }
}

impl MessageChannel for QueueChannel {
    fn try_next(&mut self) -> Option<ChannelMessage> {
        self.rx.try_recv().ok()
    }
}

/// Connects to a relay that emits one JSON message per line.
pub async fn connect_relay(addr: &str) -> std::io::Result<QueueChannel> {
    let stream = TcpStream::connect(addr).await?;
    let (tx, channel) = QueueChannel::new();
    let relay = addr.to_string();

    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if let Some(message) = ChannelMessage::parse(&line) {
                        if tx.send(message).is_err() {
                            break;
                        }
                    }
                }
                Ok(None) => {
                    tracing::info!(%relay, "Relay closed the connection");
                    break;
                }
                Err(error) => {
                    tracing::warn!(%relay, %error, "Relay read failed");
                    break;
                }
            }
        }
    });

    tracing::info!(relay = %addr, "Listening for display requests");
    Ok(channel)
}

pub trait WindowOpener {
    fn open(&mut self, url: &str) -> std::io::Result<()>;
}

/// Launches an external program with the display URL as its only argument.
pub struct CommandOpener {
    program: String,
}

impl CommandOpener {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl WindowOpener for CommandOpener {
    fn open(&mut self, url: &str) -> std::io::Result<()> {
        Command::new(&self.program).arg(url).spawn()?;
        Ok(())
    }
}

/// Records requests without opening anything.
#[derive(Debug, Default)]
pub struct LogOpener {
    pub opened: Vec<String>,
}

impl WindowOpener for LogOpener {
    fn open(&mut self, url: &str) -> std::io::Result<()> {
        tracing::info!(%url, "Secondary display requested");
        self.opened.push(url.to_string());
        Ok(())
    }
}

/// Resolves a same-origin path against the endpoint base URL.
pub fn resolve_url(base_url: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_open_request() {
        let message =
            ChannelMessage::parse(r#"{"type": "open_lidar_viz", "content": {"url": "/lidar"}}"#);
        assert_eq!(
            message,
            Some(ChannelMessage::OpenLidarViz(OpenVizContent {
                url: "/lidar".to_string()
            }))
        );
    }

    #[test]
    fn unrelated_messages_are_unknown() {
        assert_eq!(
            ChannelMessage::parse(r#"{"type": "heartbeat"}"#),
            Some(ChannelMessage::Unknown)
        );
        assert_eq!(ChannelMessage::parse("not json"), None);
    }

    #[test]
    fn relative_urls_join_the_base() {
        assert_eq!(
            resolve_url("http://timer.local:5000/", "/lidar"),
            "http://timer.local:5000/lidar"
        );
        assert_eq!(
            resolve_url("http://timer.local:5000", "https://other/viz"),
            "https://other/viz"
        );
    }

    #[test]
    fn queue_channel_delivers_in_order() {
        let (tx, mut channel) = QueueChannel::new();
        tx.send(ChannelMessage::Unknown).unwrap();
        tx.send(ChannelMessage::OpenLidarViz(OpenVizContent { url: "/a".into() }))
            .unwrap();

        assert_eq!(channel.try_next(), Some(ChannelMessage::Unknown));
        assert!(matches!(channel.try_next(), Some(ChannelMessage::OpenLidarViz(_))));
        assert_eq!(channel.try_next(), None);
    }
}
