use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use throbber_widgets_tui::ThrobberState;

use crate::config::ViewerConfig;
use crate::domain::ScanSnapshot;
use crate::error::FetchError;
use crate::fetcher::{FetchHandle, FetchSubscriber, Fetcher, SnapshotSource};
use crate::geometry::count_in_zone;
use crate::messaging::{
    resolve_url, ChannelMessage, LogOpener, MessageChannel, WindowOpener, WindowRole,
};

/// What the radar currently shows: the last good snapshot and the last error.
#[derive(Debug, Default)]
pub struct ScanView {
    pub snapshot: Option<ScanSnapshot>,
    pub error: Option<String>,
    pub last_detection: Option<DateTime<Local>>,
    pub in_zone: usize,
    dirty: bool,
}

impl ScanView {
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub const fn is_waiting(&self) -> bool {
        self.snapshot.is_none() && self.error.is_none()
    }

    pub fn points(&self) -> usize {
        self.snapshot.as_ref().map_or(0, |snapshot| snapshot.points.len())
    }
}

impl FetchSubscriber for ScanView {
    fn on_snapshot(&mut self, snapshot: ScanSnapshot) {
        self.in_zone = count_in_zone(&snapshot);
        if self.in_zone > 0 {
            self.last_detection = Some(snapshot.received_at);
        }
        self.snapshot = Some(snapshot);
        self.error = None;
        self.dirty = true;
    }

    // Keeps the previous snapshot on screen underneath the banner.
    fn on_error(&mut self, error: FetchError) {
        self.error = Some(error.user_message());
        self.dirty = true;
    }
}

/// Display shell: owns the poll schedule, the view state and the window role.
pub struct App {
    pub running: bool,
    pub show_help: bool,
    pub role: WindowRole,
    pub config: ViewerConfig,
    pub view: ScanView,
    pub status_message: String,
    pub throbber: ThrobberState,
    source: Option<Arc<dyn SnapshotSource>>,
    fetch: Option<FetchHandle>,
    channel: Option<Box<dyn MessageChannel>>,
    opener: Box<dyn WindowOpener>,
}

impl App {
    pub fn new(config: ViewerConfig, role: WindowRole) -> Self {
        Self {
            running: true,
            show_help: false,
            role,
            config,
            view: ScanView::default(),
            status_message: String::new(),
            throbber: ThrobberState::default(),
            source: None,
            fetch: None,
            channel: None,
            opener: Box::new(LogOpener::default()),
        }
    }

    #[must_use]
    pub fn with_channel(mut self, channel: Box<dyn MessageChannel>) -> Self {
        self.channel = Some(channel);
        self
    }

    #[must_use]
    pub fn with_opener(mut self, opener: Box<dyn WindowOpener>) -> Self {
        self.opener = opener;
        self
    }

    pub const fn is_active(&self) -> bool {
        self.fetch.is_some()
    }

    pub const fn poll_interval(&self) -> Duration {
        self.config.poll_interval
    }

    /// Starts polling `source`. Restarts cleanly if already active.
    pub fn activate(&mut self, source: Arc<dyn SnapshotSource>) {
        self.deactivate();
        self.fetch = Some(Fetcher::start(Arc::clone(&source), self.config.poll_interval));
        self.source = Some(source);
        self.status_message.clear();
        self.view.dirty = true;
    }

    /// Stops polling. Nothing fetched afterwards reaches the view.
    pub fn deactivate(&mut self) {
        if let Some(mut fetch) = self.fetch.take() {
            fetch.stop();
        }
        self.view.dirty = false;
    }

    pub fn toggle_pause(&mut self) {
        if self.is_active() {
            self.deactivate();
            self.status_message = "Polling paused".to_string();
            self.view.dirty = true;
        } else if let Some(source) = self.source.clone() {
            self.activate(source);
        }
    }

    pub fn quit(&mut self) {
        self.deactivate();
        self.running = false;
    }

    /// Drains fetch results and relay messages. Returns whether a redraw is due.
    pub fn update(&mut self) -> bool {
        if let Some(fetch) = self.fetch.as_mut() {
            fetch.dispatch(&mut self.view);
        }
        self.drain_messages();

        let waiting = self.is_active() && self.view.is_waiting();
        if waiting {
            self.throbber.calc_next();
        }
        self.view.take_dirty() || waiting
    }

    fn drain_messages(&mut self) {
        let Some(channel) = self.channel.as_mut() else {
            return;
        };

        let mut requests = Vec::new();
        while let Some(message) = channel.try_next() {
            if let ChannelMessage::OpenLidarViz(content) = message {
                requests.push(content.url);
            }
        }

        for url in requests {
            self.open_secondary(&url);
        }
    }

    fn open_secondary(&mut self, url: &str) {
        if self.role == WindowRole::Secondary {
            tracing::debug!(%url, "Secondary display ignores open requests");
            return;
        }

        let target = resolve_url(&self.config.base_url, url);
        match self.opener.open(&target) {
            Ok(()) => self.status_message = format!("Opened secondary display: {target}"),
            Err(error) => {
                tracing::warn!(%error, %target, "Failed to open secondary display");
                self.status_message = format!("Could not open {target}: {error}");
            }
        }
        self.view.dirty = true;
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.deactivate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScanPoint;
    use crate::fetcher::tests::{GatedSource, ScriptedSource};
    use crate::messaging::{OpenVizContent, QueueChannel};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::atomic::Ordering;

    fn five_points() -> ScanSnapshot {
        ScanSnapshot::new(
            vec![
                ScanPoint::polar(0.0, 10.0),
                ScanPoint::polar(45.0, 20.0),
                ScanPoint::polar(90.0, 30.0),
                ScanPoint::polar(180.0, 40.0),
                ScanPoint::polar(270.0, 50.0),
            ],
            80.0,
        )
    }

    fn test_app() -> App {
        let config = ViewerConfig {
            poll_interval: Duration::from_millis(5),
            ..ViewerConfig::default()
        };
        App::new(config, WindowRole::Primary)
    }

    async fn pump_until(app: &mut App, done: impl Fn(&App) -> bool) {
        for _ in 0..400 {
            app.update();
            if done(app) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    #[test]
    fn error_keeps_previous_points() {
        let first = five_points();
        let mut view = ScanView::default();
        view.on_snapshot(first.clone());
        view.on_error(FetchError::Transport("connection refused".into()));

        assert_eq!(view.points(), 5);
        assert_eq!(view.snapshot.as_ref(), Some(&first));
        assert_eq!(view.error.as_deref(), Some("Failed to retrieve data"));
    }

    #[test]
    fn last_error_wins_and_success_clears_it() {
        let mut view = ScanView::default();
        view.on_error(FetchError::Server("first".into()));
        view.on_error(FetchError::Server("second".into()));
        assert_eq!(view.error.as_deref(), Some("second"));

        view.on_snapshot(five_points());
        assert_eq!(view.error, None);
    }

    #[test]
    fn detection_time_tracks_in_zone_snapshots() {
        let mut view = ScanView::default();
        let clear = ScanSnapshot::new(vec![ScanPoint::polar(90.0, 1.0)], 80.0);
        view.on_snapshot(clear);
        assert_eq!(view.last_detection, None);

        let triggered = five_points();
        let at = triggered.received_at;
        view.on_snapshot(triggered);
        assert_eq!(view.in_zone, 1);
        assert_eq!(view.last_detection, Some(at));
    }

    #[tokio::test]
    async fn shell_keeps_data_across_failed_fetch() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(five_points()),
            Err(FetchError::Server("LIDAR not running".into())),
        ]));
        let mut app = test_app();
        app.activate(source);

        pump_until(&mut app, |app| app.view.error.is_some()).await;

        assert_eq!(app.view.points(), 5);
        assert_eq!(app.view.error.as_deref(), Some("LIDAR not running"));
        app.deactivate();
    }

    #[tokio::test]
    async fn deactivate_suppresses_late_results() {
        let source = Arc::new(GatedSource::new());
        let mut app = test_app();
        app.activate(source.clone());
        app.update();

        while source.started.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        app.deactivate();
        app.deactivate();
        source.release.notify_waiters();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(!app.update());
        assert!(app.view.snapshot.is_none());
        assert!(!app.is_active());
    }

    #[tokio::test]
    async fn pause_and_resume_reuse_the_source() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(five_points())]));
        let mut app = test_app();
        app.activate(source.clone());
        pump_until(&mut app, |app| app.view.snapshot.is_some()).await;

        app.toggle_pause();
        assert!(!app.is_active());
        tokio::time::sleep(Duration::from_millis(10)).await;
        let calls = source.calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), calls);

        app.toggle_pause();
        assert!(app.is_active());
        pump_until(&mut app, |_| source.calls.load(Ordering::SeqCst) > calls).await;
        app.quit();
        assert!(!app.running);
    }

    struct SharedOpener(Rc<RefCell<Vec<String>>>);

    impl WindowOpener for SharedOpener {
        fn open(&mut self, url: &str) -> std::io::Result<()> {
            self.0.borrow_mut().push(url.to_string());
            Ok(())
        }
    }

    fn open_request(url: &str) -> ChannelMessage {
        ChannelMessage::OpenLidarViz(OpenVizContent {
            url: url.to_string(),
        })
    }

    #[test]
    fn primary_opens_secondary_display() {
        let opened = Rc::new(RefCell::new(Vec::new()));
        let (tx, channel) = QueueChannel::new();
        let mut app = App::new(ViewerConfig::default(), WindowRole::Primary)
            .with_channel(Box::new(channel))
            .with_opener(Box::new(SharedOpener(Rc::clone(&opened))));

        tx.send(ChannelMessage::Unknown).unwrap();
        tx.send(open_request("/lidar")).unwrap();
        assert!(app.update());

        assert_eq!(*opened.borrow(), vec!["http://localhost:5000/lidar".to_string()]);
    }

    #[test]
    fn secondary_ignores_open_requests() {
        let opened = Rc::new(RefCell::new(Vec::new()));
        let (tx, channel) = QueueChannel::new();
        let mut app = App::new(ViewerConfig::default(), WindowRole::Secondary)
            .with_channel(Box::new(channel))
            .with_opener(Box::new(SharedOpener(Rc::clone(&opened))));

        tx.send(open_request("/lidar")).unwrap();
        app.update();

        assert!(opened.borrow().is_empty());
    }
}
