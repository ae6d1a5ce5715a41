//! Built-in event sinks.

use super::EventSink;
use crate::error::SinkError;
use crate::state::{ScoredListing, Tier};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Console output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One human-readable line per event.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Prints events to a writer (stdout by default).
pub struct ConsoleSink {
    out: Box<dyn Write + Send>,
    format: OutputFormat,
}

impl ConsoleSink {
    /// Print to stdout.
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(Box::new(std::io::stdout()), format)
    }

    /// Print to an arbitrary writer.
    pub fn new(out: Box<dyn Write + Send>, format: OutputFormat) -> Self {
        Self { out, format }
    }

    /// Render an event as a single text line.
    pub fn render(event: &ScoredListing) -> String {
        let marker = match event.tier {
            Tier::AutoMatch => "🎯",
            Tier::Candidate => "✅",
            Tier::Reject => "❌",
        };
        let price = event
            .listing
            .price
            .map(|p| format!("{:.2} {}", p, event.listing.currency))
            .unwrap_or_else(|| "n/a".to_string());
        let ending = if event.ending_soon { " ⏰ ending soon" } else { "" };

        format!(
            "{marker} [{}] {:.2}{ending} | {} | {price} | {} | {}",
            event.tier, event.score, event.search, event.listing.title, event.listing.url
        )
    }
}

impl EventSink for ConsoleSink {
    fn emit(&mut self, event: &ScoredListing) -> Result<(), SinkError> {
        match self.format {
            OutputFormat::Text => writeln!(self.out, "{}", Self::render(event))?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.out, event)?;
                writeln!(self.out)?;
            }
        }
        self.out.flush()?;
        Ok(())
    }
}

/// Forwards events to a channel, for a GUI or any other task that observes
/// the watcher without touching its state.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ScoredListing>,
}

impl ChannelSink {
    /// Create a sink and the receiver its events arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ScoredListing>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Wrap an existing sender.
    pub fn from_sender(tx: mpsc::UnboundedSender<ScoredListing>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn emit(&mut self, event: &ScoredListing) -> Result<(), SinkError> {
        self.tx.send(event.clone()).map_err(|_| SinkError::Closed)
    }
}

/// Appends one line per event to a deal log file.
#[derive(Debug, Clone)]
pub struct DealLogSink {
    path: PathBuf,
}

impl DealLogSink {
    /// Log to `path`, creating parent directories on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSink for DealLogSink {
    fn emit(&mut self, event: &ScoredListing) -> Result<(), SinkError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(
            file,
            "{} | {} | {}",
            event.scored_at.to_rfc3339(),
            event.listing.id,
            ConsoleSink::render(event)
        )?;
        Ok(())
    }
}

/// Delivers every event to several sinks.
///
/// All sinks are tried; the first error is returned so the listing is
/// retried, which may repeat the event on sinks that did succeed.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn EventSink>>,
}

impl FanoutSink {
    /// Create an empty fan-out.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink.
    pub fn with(mut self, sink: impl EventSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Number of attached sinks.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether no sinks are attached.
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl EventSink for FanoutSink {
    fn emit(&mut self, event: &ScoredListing) -> Result<(), SinkError> {
        let mut first_err = None;
        for sink in &mut self.sinks {
            if let Err(e) = sink.emit(event) {
                tracing::warn!("Sink failed for listing {}: {}", event.listing.id, e);
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MockEventSink;
    use crate::state::Listing;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::sync::{Arc, Mutex};

    fn event(tier: Tier, ending_soon: bool) -> ScoredListing {
        ScoredListing {
            listing: Listing::new("77", "Dummy LP")
                .with_price(dec!(18.5))
                .with_url("https://example.test/77"),
            search: "post-punk".to_string(),
            score: 0.97,
            ending_soon,
            tier,
            scored_at: Utc::now(),
        }
    }

    /// Writer that keeps its bytes reachable after being boxed.
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_render_line() {
        let line = ConsoleSink::render(&event(Tier::AutoMatch, true));
        assert!(line.contains("[AUTO-MATCH]"));
        assert!(line.contains("0.97"));
        assert!(line.contains("ending soon"));
        assert!(line.contains("18.50 GBP"));
        assert!(line.contains("https://example.test/77"));
        assert!(line.contains("| post-punk |"));

        let line = ConsoleSink::render(&event(Tier::Candidate, false));
        assert!(line.contains("[CANDIDATE]"));
        assert!(!line.contains("ending soon"));
    }

    #[test]
    fn test_console_json() {
        let buf = SharedBuf::default();
        let mut sink = ConsoleSink::new(Box::new(buf.clone()), OutputFormat::Json);
        sink.emit(&event(Tier::Candidate, false)).unwrap();

        let value: serde_json::Value = serde_json::from_str(buf.contents().trim()).unwrap();
        assert_eq!(value["tier"], "candidate");
        assert_eq!(value["listing"]["id"], "77");
        assert_eq!(value["search"], "post-punk");
    }

    #[tokio::test]
    async fn test_channel_sink() {
        let (mut sink, mut rx) = ChannelSink::new();
        sink.emit(&event(Tier::AutoMatch, false)).unwrap();
        let received = rx.recv().await.unwrap();
        assert_eq!(received.listing.id, "77");

        drop(rx);
        assert!(matches!(
            sink.emit(&event(Tier::AutoMatch, false)),
            Err(SinkError::Closed)
        ));
    }

    #[test]
    fn test_deal_log_appends() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DealLogSink::new(dir.path().join("logs").join("deals.log"));
        sink.emit(&event(Tier::Candidate, false)).unwrap();
        sink.emit(&event(Tier::AutoMatch, true)).unwrap();

        let content = std::fs::read_to_string(sink.path()).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.lines().all(|line| line.contains("| post-punk |")));
    }

    #[test]
    fn test_fanout_tries_every_sink() {
        let mut failing = MockEventSink::new();
        failing
            .expect_emit()
            .times(1)
            .returning(|_| Err(SinkError::Closed));
        let mut working = MockEventSink::new();
        working.expect_emit().times(1).returning(|_| Ok(()));

        let mut fanout = FanoutSink::new().with(failing).with(working);
        assert_eq!(fanout.len(), 2);
        assert!(fanout.emit(&event(Tier::Candidate, false)).is_err());
    }
}
