use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;

use futures::{Stream, StreamExt};
use tokio::sync::watch;
use tracing::{debug, warn};

use super::item::{DownloadItem, DownloadStatus};
use super::tracker::ProgressTracker;

/// Largest buffer reserved up front from an advertised length.
const MAX_PREALLOCATION: u64 = 64 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    Run,
    Pause,
    Cancel,
}

/// User side of a running download. Cancellation is sticky.
#[derive(Debug, Clone)]
pub struct DownloadControl {
    sender: Arc<watch::Sender<ControlSignal>>,
}

impl DownloadControl {
    pub fn pause(&self) {
        self.signal(ControlSignal::Pause);
    }

    pub fn resume(&self) {
        self.signal(ControlSignal::Run);
    }

    pub fn cancel(&self) {
        self.signal(ControlSignal::Cancel);
    }

    fn signal(&self, next: ControlSignal) {
        self.sender.send_if_modified(|current| {
            if *current == ControlSignal::Cancel || *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}

/// Read loop side of [`DownloadControl`].
#[derive(Debug)]
pub struct ControlReceiver {
    receiver: watch::Receiver<ControlSignal>,
    closed: bool,
}

impl ControlReceiver {
    /// A receiver nobody can signal; the download simply runs to the end.
    pub fn detached() -> Self {
        let (_, receiver) = control_channel();
        receiver
    }

    pub fn current(&self) -> ControlSignal {
        *self.receiver.borrow()
    }

    async fn changed(&mut self) {
        if self.closed {
            return futures::future::pending().await;
        }
        if self.receiver.changed().await.is_err() {
            self.closed = true;
            futures::future::pending::<()>().await;
        }
    }

    /// Waits out a pause. A dropped control resumes the download.
    async fn wait_while_paused(&mut self) -> ControlSignal {
        loop {
            match self.current() {
                ControlSignal::Pause if !self.closed => {
                    if self.receiver.changed().await.is_err() {
                        self.closed = true;
                        return ControlSignal::Run;
                    }
                }
                ControlSignal::Pause => return ControlSignal::Run,
                other => return other,
            }
        }
    }
}

pub fn control_channel() -> (DownloadControl, ControlReceiver) {
    let (sender, receiver) = watch::channel(ControlSignal::Run);
    (
        DownloadControl {
            sender: Arc::new(sender),
        },
        ControlReceiver {
            receiver,
            closed: false,
        },
    )
}

#[derive(Debug, PartialEq, Eq)]
pub enum TrackedOutcome {
    Completed(Vec<u8>),
    Failed(String),
    Cancelled,
}

/// Moves `item` to `next`; a refused transition is logged and leaves the
/// item where it was.
pub(crate) fn advance(item: &mut DownloadItem, next: DownloadStatus) -> bool {
    match item.transition(next) {
        Ok(()) => true,
        Err(err) => {
            warn!("Download {}: {}", item.id, err);
            false
        }
    }
}

pub(crate) fn record_failure(item: &mut DownloadItem, message: &str) -> bool {
    match item.fail(message) {
        Ok(()) => true,
        Err(err) => {
            warn!("Download {} could not be marked failed: {}", item.id, err);
            false
        }
    }
}

/// Reads `body` to the end while driving `item` through its states.
///
/// `on_update` sees the item after every state change and every throttled
/// progress update. Pausing stops polling the body. Cancelling drops it,
/// which aborts the underlying request.
pub async fn track_download<S, B, E, F>(
    item: &mut DownloadItem,
    body: S,
    total: Option<u64>,
    mut control: ControlReceiver,
    mut on_update: F,
) -> TrackedOutcome
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
    F: FnMut(&DownloadItem),
{
    let mut body = Box::pin(body);
    let mut tracker = ProgressTracker::new(total, Instant::now());
    let capacity = total.unwrap_or(0).min(MAX_PREALLOCATION) as usize;
    let mut data = Vec::with_capacity(capacity);

    if item.status != DownloadStatus::Downloading
        && item.transition(DownloadStatus::Downloading).is_err()
    {
        warn!("Download {} cannot start from {:?}", item.id, item.status);
        return TrackedOutcome::Failed(format!("cannot start from {:?}", item.status));
    }
    on_update(item);

    loop {
        if control.current() == ControlSignal::Pause {
            debug!("Download {} paused at {} bytes", item.id, tracker.received());
            advance(item, DownloadStatus::Paused);
            on_update(item);
            if control.wait_while_paused().await == ControlSignal::Run {
                advance(item, DownloadStatus::Downloading);
                on_update(item);
            }
        }
        if control.current() == ControlSignal::Cancel {
            drop(body);
            debug!("Download {} cancelled", item.id);
            advance(item, DownloadStatus::Cancelled);
            item.speed = None;
            item.eta = None;
            on_update(item);
            return TrackedOutcome::Cancelled;
        }

        tokio::select! {
            biased;
            _ = control.changed() => continue,
            next = body.next() => match next {
                Some(Ok(chunk)) => {
                    let chunk = chunk.as_ref();
                    data.extend_from_slice(chunk);
                    if let Some(snapshot) = tracker.record(chunk.len(), Instant::now()) {
                        item.apply(&snapshot);
                        on_update(item);
                    }
                }
                Some(Err(err)) => {
                    let message = err.to_string();
                    warn!("Download {} failed after {} bytes: {}", item.id, tracker.received(), message);
                    record_failure(item, &message);
                    on_update(item);
                    return TrackedOutcome::Failed(message);
                }
                None => {
                    let snapshot = tracker.finish(Instant::now());
                    item.apply(&snapshot);
                    advance(item, DownloadStatus::Completed);
                    on_update(item);
                    return TrackedOutcome::Completed(data);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::MediaKind;
    use futures::stream;
    use std::time::Duration;

    fn item() -> DownloadItem {
        DownloadItem::new("abc123def45", "Cats", MediaKind::Audio, None)
    }

    #[tokio::test]
    async fn completes_and_concatenates_chunks() {
        let chunks: Vec<Result<Vec<u8>, String>> = vec![
            Ok(b"hello ".to_vec()),
            Ok(b"tube".to_vec()),
            Ok(b"proxy".to_vec()),
        ];
        let mut item = item();
        let mut statuses = Vec::new();
        let outcome = track_download(
            &mut item,
            stream::iter(chunks),
            Some(15),
            ControlReceiver::detached(),
            |item| statuses.push(item.status),
        )
        .await;

        assert_eq!(outcome, TrackedOutcome::Completed(b"hello tubeproxy".to_vec()));
        assert_eq!(item.status, DownloadStatus::Completed);
        assert_eq!(item.progress, 100);
        assert_eq!(statuses.first(), Some(&DownloadStatus::Downloading));
        assert_eq!(statuses.last(), Some(&DownloadStatus::Completed));
    }

    #[tokio::test]
    async fn read_error_fails_the_item() {
        let chunks: Vec<Result<Vec<u8>, String>> =
            vec![Ok(b"partial".to_vec()), Err("connection reset".into())];
        let mut item = item();
        let outcome = track_download(
            &mut item,
            stream::iter(chunks),
            None,
            ControlReceiver::detached(),
            |_| {},
        )
        .await;

        assert_eq!(outcome, TrackedOutcome::Failed("connection reset".into()));
        assert_eq!(item.status, DownloadStatus::Failed);
        assert_eq!(item.error.as_deref(), Some("connection reset"));
    }

    #[tokio::test]
    async fn cancel_stops_an_endless_body() {
        let body = stream::iter(vec![Ok::<_, String>(b"first".to_vec())]).chain(stream::pending());
        let (control, receiver) = control_channel();
        let task = tokio::spawn(async move {
            let mut item = item();
            let outcome = track_download(&mut item, body, None, receiver, |_| {}).await;
            (item, outcome)
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        control.cancel();
        control.resume();

        let (item, outcome) = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("tracker did not stop")
            .unwrap();
        assert_eq!(outcome, TrackedOutcome::Cancelled);
        assert_eq!(item.status, DownloadStatus::Cancelled);
    }

    #[tokio::test]
    async fn pause_and_resume() {
        let (tx, rx) = futures::channel::mpsc::unbounded::<Result<Vec<u8>, String>>();
        let (control, receiver) = control_channel();
        let task = tokio::spawn(async move {
            let mut item = item();
            let mut statuses = Vec::new();
            let outcome = track_download(&mut item, rx, Some(10), receiver, |item| {
                if statuses.last() != Some(&item.status) {
                    statuses.push(item.status);
                }
            })
            .await;
            (item, outcome, statuses)
        });

        tx.unbounded_send(Ok(b"12345".to_vec())).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        control.pause();
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.unbounded_send(Ok(b"67890".to_vec())).unwrap();
        drop(tx);
        tokio::time::sleep(Duration::from_millis(50)).await;
        control.resume();

        let (item, outcome, statuses) = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("tracker did not finish")
            .unwrap();
        assert_eq!(outcome, TrackedOutcome::Completed(b"1234567890".to_vec()));
        assert_eq!(item.progress, 100);
        assert_eq!(
            statuses,
            vec![
                DownloadStatus::Downloading,
                DownloadStatus::Paused,
                DownloadStatus::Downloading,
                DownloadStatus::Completed,
            ]
        );
    }

    #[tokio::test]
    async fn dropped_control_does_not_block() {
        let (control, receiver) = control_channel();
        drop(control);
        let chunks: Vec<Result<Vec<u8>, String>> = vec![Ok(b"abc".to_vec())];
        let mut item = item();
        let outcome =
            track_download(&mut item, stream::iter(chunks), Some(3), receiver, |_| {}).await;
        assert_eq!(outcome, TrackedOutcome::Completed(b"abc".to_vec()));
    }

    #[tokio::test]
    async fn terminal_items_are_not_restarted() {
        let mut item = item();
        item.transition(DownloadStatus::Cancelled).unwrap();
        let chunks: Vec<Result<Vec<u8>, String>> = vec![Ok(b"abc".to_vec())];
        let outcome = track_download(
            &mut item,
            stream::iter(chunks),
            None,
            ControlReceiver::detached(),
            |_| {},
        )
        .await;
        assert!(matches!(outcome, TrackedOutcome::Failed(_)));
        assert_eq!(item.status, DownloadStatus::Cancelled);
    }

    #[test]
    fn refused_transitions_leave_the_item_untouched() {
        let mut item = item();
        assert!(advance(&mut item, DownloadStatus::Downloading));
        assert!(advance(&mut item, DownloadStatus::Completed));
        item.progress = 100;

        assert!(!advance(&mut item, DownloadStatus::Paused));
        assert!(!record_failure(&mut item, "late error"));
        assert_eq!(item.status, DownloadStatus::Completed);
        assert_eq!(item.progress, 100);
        assert!(item.error.is_none());
    }
}
