//! The board event loop.
//!
//! One task owns the [`BoardState`] and a [`TimerRegistry`]. Each turn of
//! the loop waits on, in priority order:
//!
//! 1. shutdown (explicit, or the [`RuntimeHandle`] being dropped)
//! 2. the earliest timer deadline, once it has passed
//! 3. the next stream occurrence
//! 4. the one-shot snapshot result (until it arrives)
//!
//! and applies exactly one event before looking again, so inputs are
//! reduced strictly one at a time in arrival order. A view is published
//! after every event that changed it.
//!
//! # Teardown
//!
//! Shutdown cancels every pending timer, closes the stream subscription,
//! aborts the loader and drops its result channel. A snapshot that lands
//! after teardown has nowhere to go.

use std::future::pending;

use qb_board::{ApplyReason, BoardEvent, BoardState, ConnectionState, Seed};
use qb_config::{BoardConfig, ResolvedCookie};
use qb_schemas::WireQuestion;
use qb_stream::{
    LoadError, SnapshotLoader, StreamClient, StreamHandle, StreamOccurrence, StreamOptions,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{Publisher, TimerRegistry};

pub type SeedResult = Result<Vec<WireQuestion>, LoadError>;

/// Everything the loop reads from.
pub struct Sources {
    pub occurrences: mpsc::Receiver<StreamOccurrence>,
    pub seed: Option<oneshot::Receiver<SeedResult>>,
    /// Closed on teardown.
    pub stream: Option<StreamHandle>,
    /// Aborted on teardown.
    pub loader_task: Option<JoinHandle<()>>,
}

/// Sending halves for [`Sources::channels`].
pub struct SourceFeed {
    pub occurrences: mpsc::Sender<StreamOccurrence>,
    pub seed: oneshot::Sender<SeedResult>,
}

impl Sources {
    /// Plain channels with no network behind them.
    pub fn channels(capacity: usize) -> (Self, SourceFeed) {
        let (occ_tx, occ_rx) = mpsc::channel(capacity.max(1));
        let (seed_tx, seed_rx) = oneshot::channel();
        (
            Self {
                occurrences: occ_rx,
                seed: Some(seed_rx),
                stream: None,
                loader_task: None,
            },
            SourceFeed {
                occurrences: occ_tx,
                seed: seed_tx,
            },
        )
    }

    /// Subscribe to the stream and start the snapshot fetch.
    pub fn connect(http: reqwest::Client, config: &BoardConfig, cookie: &ResolvedCookie) -> Self {
        let cookie = cookie.header_value().map(str::to_string);

        let options = StreamOptions::new(config.stream_url())
            .with_cookie(cookie.clone())
            .with_retry(config.retry)
            .with_channel_capacity(config.channel_capacity);
        let (stream, occurrences) = StreamClient::spawn(http.clone(), options);

        let loader = SnapshotLoader::new(http, config.snapshot_url()).with_cookie(cookie);
        let (seed_tx, seed_rx) = oneshot::channel();
        let loader_task = tokio::spawn(async move {
            let result = loader.fetch().await;
            // Receiver gone means the runtime already tore down.
            let _ = seed_tx.send(result);
        });

        Self {
            occurrences,
            seed: Some(seed_rx),
            stream: Some(stream),
            loader_task: Some(loader_task),
        }
    }
}

/// Owns the running loop. Dropping it shuts the loop down without waiting.
#[derive(Debug)]
pub struct RuntimeHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    publisher: Publisher,
}

impl RuntimeHandle {
    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    /// Stop the loop, release timers and the stream, and wait for it.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(error = %err, "board runtime join failed");
            }
        }
    }
}

pub struct BoardRuntime;

impl BoardRuntime {
    /// Spawn the loop on the current tokio runtime.
    pub fn spawn(sources: Sources, publisher: Publisher) -> RuntimeHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run(sources, publisher.clone(), shutdown_rx));
        RuntimeHandle {
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
            publisher,
        }
    }
}

async fn run(mut sources: Sources, publisher: Publisher, mut shutdown_rx: oneshot::Receiver<()>) {
    let mut board = BoardState::new();
    let mut timers = TimerRegistry::new();
    let mut seed_rx = sources.seed.take();
    let mut stream_open = true;

    publisher.publish_view(board.view()).await;
    info!("board runtime started");

    loop {
        let next_timer = timers.next_due();

        let event = tokio::select! {
            biased;

            _ = &mut shutdown_rx => break,

            // Due timers fire before queued messages.
            _ = sleep_until(next_timer.map(|(deadline, _)| deadline)) => {
                match next_timer {
                    Some((_, token)) if timers.take(token) => Some(BoardEvent::TimerFired(token)),
                    _ => None,
                }
            },

            occ = sources.occurrences.recv(), if stream_open => match occ {
                Some(occ) => occurrence_event(occ, &publisher),
                None => {
                    warn!("stream occurrence channel closed");
                    stream_open = false;
                    None
                }
            },

            res = recv_seed(&mut seed_rx) => {
                seed_rx = None;
                seed_event(res, &publisher)
            },
        };

        let Some(event) = event else {
            continue;
        };
        let applied = board.apply(event, &mut timers);
        log_applied(applied.reason, &board);
        if applied.all_clear_raised {
            info!(generation = board.reconciler().generation(), "all questions solved");
        }
        if applied.changed {
            publisher.publish_view(board.view()).await;
        }
    }

    board.teardown(&mut timers);
    timers.clear();
    if let Some(task) = sources.loader_task.take() {
        task.abort();
    }
    drop(seed_rx);
    let stream = sources.stream.take();
    // Release the receiver first so the stream task never waits on a full channel.
    drop(sources);
    if let Some(stream) = stream {
        stream.shutdown().await;
    }
    info!("board runtime stopped");
}

async fn recv_seed(
    rx: &mut Option<oneshot::Receiver<SeedResult>>,
) -> Result<SeedResult, oneshot::error::RecvError> {
    match rx {
        Some(rx) => rx.await,
        None => pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => pending().await,
    }
}

fn occurrence_event(occ: StreamOccurrence, publisher: &Publisher) -> Option<BoardEvent> {
    match occ {
        StreamOccurrence::Opened => Some(BoardEvent::Connection(ConnectionState::Connected)),
        StreamOccurrence::Errored(reason) => {
            publisher.log_line("WARN", format!("stream reconnecting: {reason}"));
            Some(BoardEvent::Connection(ConnectionState::Reconnecting))
        }
        StreamOccurrence::Message(raw) => match qb_board::try_decode(&raw) {
            Ok(decoded) => Some(BoardEvent::Decoded(decoded)),
            Err(err) => {
                warn!(error = %err, bytes = raw.len(), "discarding malformed stream payload");
                None
            }
        },
    }
}

fn seed_event(
    res: Result<SeedResult, oneshot::error::RecvError>,
    publisher: &Publisher,
) -> Option<BoardEvent> {
    match res {
        Ok(Ok(questions)) => Some(BoardEvent::Seed(Seed::from_wire(&questions))),
        Ok(Err(err)) => {
            warn!(error = %err, "initial snapshot failed; waiting for stream reload");
            publisher.log_line("WARN", format!("initial snapshot failed: {err}"));
            None
        }
        Err(_) => {
            warn!("snapshot loader ended without a result");
            None
        }
    }
}

fn log_applied(reason: ApplyReason, board: &BoardState) {
    let generation = board.reconciler().generation();
    match reason {
        ApplyReason::Seeded => info!(
            generation,
            questions = board.reconciler().batch().len(),
            solved = board.reconciler().correct().len(),
            "board seeded from snapshot"
        ),
        ApplyReason::Reloaded => info!(
            generation,
            questions = board.reconciler().batch().len(),
            "batch reloaded"
        ),
        ApplyReason::SeedSuperseded => info!("snapshot arrived after a stream reload; ignored"),
        ApplyReason::SeedEmpty => info!("snapshot was empty; waiting for stream reload"),
        ApplyReason::ReloadEmptyIgnored => warn!("ignoring empty reload"),
        ApplyReason::ProgressRejected => warn!("ignoring non-finite progress tick"),
        ApplyReason::ConnectionChanged => info!(connection = ?board.connection(), "connection state"),
        other => debug!(?other, generation, "event applied"),
    }
}
