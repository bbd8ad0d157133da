//! Line Reader
//!
//! Reads station updates line by line and forwards them, in order, to the
//! dispatcher channel. Bad lines are logged and counted; they never stop the
//! reader.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::codec::{CodecError, decode_line};
use crate::application::services::{DispatchStats, SkipReason};
use crate::domain::network::StationStateUpdate;
use crate::infrastructure::metrics;

/// Transport errors.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Reading from the input failed.
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

/// Decode error label for lines that are not UTF-8.
const INVALID_UTF8: &str = "invalid_utf8";

/// What happened to the lines of one input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderSummary {
    /// Lines read.
    pub lines: u64,
    /// Updates handed to the dispatcher.
    pub forwarded: u64,
    /// Blank lines and envelopes for other events.
    pub ignored: u64,
    /// Updates naming a station outside the route.
    pub unmapped: u64,
    /// Lines that could not be decoded.
    pub rejected: u64,
}

/// Forward every decodable line of `input` to `updates`.
///
/// Stops at end of input, on cancellation, or when the receiving side is
/// dropped.
///
/// # Errors
///
/// Returns an error if reading from `input` fails.
pub async fn forward_lines<R>(
    mut input: R,
    updates: mpsc::Sender<StationStateUpdate>,
    stats: Arc<DispatchStats>,
    shutdown: CancellationToken,
) -> Result<ReaderSummary, TransportError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut summary = ReaderSummary::default();

    loop {
        buf.clear();
        let read = tokio::select! {
            biased;

            () = shutdown.cancelled() => {
                tracing::debug!("Input reader cancelled");
                break;
            }

            read = input.read_until(b'\n', &mut buf) => read?,
        };

        if read == 0 {
            tracing::debug!(lines = summary.lines, "End of input");
            break;
        }
        summary.lines += 1;

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(
                    line = summary.lines,
                    kind = INVALID_UTF8,
                    error = %e,
                    "Station update is not valid UTF-8, skipped"
                );
                stats.record_rejected();
                metrics::record_decode_error(INVALID_UTF8);
                summary.rejected += 1;
                continue;
            }
        };

        match decode_line(line) {
            Ok(Some(update)) => {
                if updates.send(update).await.is_err() {
                    tracing::debug!("Dispatcher gone, input reader stopping");
                    break;
                }
                summary.forwarded += 1;
            }
            Ok(None) => summary.ignored += 1,
            Err(CodecError::UnknownStation(code)) => {
                tracing::warn!(
                    line = summary.lines,
                    station = %code,
                    "Update for unknown station skipped"
                );
                stats.record_skipped();
                metrics::record_update_skipped(SkipReason::UnmappedStation);
                summary.unmapped += 1;
            }
            Err(e) => {
                tracing::warn!(
                    line = summary.lines,
                    kind = e.kind(),
                    error = %e,
                    "Malformed station update skipped"
                );
                stats.record_rejected();
                metrics::record_decode_error(e.kind());
                summary.rejected += 1;
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::network::Station;

    async fn run(
        input: &'static str,
        capacity: usize,
    ) -> (ReaderSummary, Vec<StationStateUpdate>, Arc<DispatchStats>) {
        let (tx, mut rx) = mpsc::channel(capacity);
        let stats = Arc::new(DispatchStats::new());
        let summary = forward_lines(
            input.as_bytes(),
            tx,
            Arc::clone(&stats),
            CancellationToken::new(),
        )
        .await
        .unwrap();

        let mut received = Vec::new();
        while let Some(update) = rx.recv().await {
            received.push(update);
        }
        (summary, received, stats)
    }

    #[tokio::test]
    async fn forwards_updates_in_order() {
        let input = concat!(
            r#"{"station":"STP","state":[{"train":"Hiawatha","state":"Stopped"}]}"#, "\n",
            r#"{"event":"station-update","payload":{"station":"CHI","state":[]}}"#, "\n",
            r#"{"station":"WIN"}"#, "\n",
        );
        let (summary, received, _) = run(input, 8).await;

        assert_eq!(summary.forwarded, 3);
        let stations: Vec<_> = received.iter().map(|u| u.station).collect();
        assert_eq!(stations, vec![Station::StPaul, Station::Chicago, Station::Winona]);
    }

    #[tokio::test]
    async fn bad_lines_do_not_stop_the_reader() {
        let input = concat!(
            "garbage\n",
            "\n",
            r#"{"station":"XYZ"}"#, "\n",
            r#"{"event":"heartbeat"}"#, "\n",
            r#"{"station":"TOH","state":[{"train":"Borealis","state":"Sleeping"}]}"#, "\n",
            r#"{"station":"TOH","state":[{"train":"Borealis","state":"Incoming"}]}"#,
        );
        let (summary, received, stats) = run(input, 8).await;

        assert_eq!(
            summary,
            ReaderSummary {
                lines: 6,
                forwarded: 1,
                ignored: 2,
                unmapped: 1,
                rejected: 2,
            }
        );
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].station, Station::Tomah);
        assert_eq!(stats.rejected(), 2);
        assert_eq!(stats.skipped(), 1);
    }

    #[tokio::test]
    async fn invalid_utf8_line_is_skipped() {
        let input: &[u8] = b"{\"station\":\"STP\"}\n{\"station\":\"CHI\",\"x\":\"\xff\xfe\"}\n{\"station\":\"WIN\"}\n";
        let (tx, mut rx) = mpsc::channel(8);
        let stats = Arc::new(DispatchStats::new());

        let summary = forward_lines(input, tx, Arc::clone(&stats), CancellationToken::new())
            .await
            .unwrap();

        let mut stations = Vec::new();
        while let Some(update) = rx.recv().await {
            stations.push(update.station);
        }
        assert_eq!(stations, vec![Station::StPaul, Station::Winona]);
        assert_eq!(summary.lines, 3);
        assert_eq!(summary.forwarded, 2);
        assert_eq!(summary.rejected, 1);
        assert_eq!(stats.rejected(), 1);
    }

    #[tokio::test]
    async fn stops_when_receiver_is_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let input = "{\"station\":\"STP\"}\n{\"station\":\"CHI\"}\n";
        let summary = forward_lines(
            input.as_bytes(),
            tx,
            Arc::new(DispatchStats::new()),
            CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(summary.lines, 1);
        assert_eq!(summary.forwarded, 0);
    }

    #[tokio::test]
    async fn cancelled_reader_reads_nothing() {
        let (tx, _rx) = mpsc::channel(1);
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let summary = forward_lines(
            "{\"station\":\"STP\"}\n".as_bytes(),
            tx,
            Arc::new(DispatchStats::new()),
            shutdown,
        )
        .await
        .unwrap();

        assert_eq!(summary, ReaderSummary::default());
    }
}
