use std::sync::Arc;
use std::time::Duration;

use ::time::{format_description::well_known, OffsetDateTime};
use serde::Serialize;
use tokio::sync::{broadcast, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::classify::OutcomePolicy;
use crate::error::{Result, ScanError};
use crate::probe::{HttpProber, ProbeConfig, Prober};
use crate::target::{self, BaseUrl};
use crate::types::{progress_fraction, ProbeResult, ScanSnapshot, ScanState, ScanStats};

const EVENT_CAPACITY: usize = 1024;

/// Controller settings that stay fixed across scans.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Pause between consecutive probes. Zero disables throttling.
    pub delay: Duration,
    pub policy: OutcomePolicy,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(250),
            policy: OutcomePolicy::default(),
        }
    }
}

/// Pushed to subscribers as the scan advances.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScanEvent {
    Started { target: String, total: u64 },
    Probed(ProgressUpdate),
    Finished { state: ScanState, stats: ScanStats },
}

/// Newest result together with the counters after recording it.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressUpdate {
    pub result: ProbeResult,
    pub stats: ScanStats,
    pub completed: u64,
    pub total: u64,
    pub progress: f64,
}

#[derive(Debug, Default)]
struct Run {
    target: Option<BaseUrl>,
    total: u64,
    results: Vec<ProbeResult>,
    stats: ScanStats,
    cancel: CancellationToken,
}

struct Inner {
    prober: Arc<dyn Prober>,
    config: ScanConfig,
    // The watch channel is the single transition guard and the pause condition.
    state: watch::Sender<ScanState>,
    // Written by the scan loop only; `start` resets it and `stop` locks it
    // so nothing is recorded after a stop returns.
    run: RwLock<Run>,
    events: broadcast::Sender<ScanEvent>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// Sequential wordlist scanner with pause, resume and stop.
///
/// Cheap to clone; clones share the same scan.
#[derive(Clone)]
pub struct ScanController {
    inner: Arc<Inner>,
}

impl ScanController {
    pub fn new(prober: Arc<dyn Prober>, config: ScanConfig) -> Self {
        let (state, _) = watch::channel(ScanState::Idle);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                prober,
                config,
                state,
                run: RwLock::new(Run::default()),
                events,
                task: Mutex::new(None),
            }),
        }
    }

    /// Controller backed by a real [`HttpProber`].
    pub fn with_http(config: ScanConfig, probe: &ProbeConfig) -> Result<Self> {
        let prober = HttpProber::new(probe)?;
        Ok(Self::new(Arc::new(prober), config))
    }

    /// Begin a new scan of `wordlist` against `target`.
    ///
    /// Rejected while another scan is running or paused. Results and
    /// statistics of the previous scan are discarded.
    pub async fn start(&self, target: &str, wordlist: Vec<String>) -> Result<()> {
        let base = target::resolve(target)?;

        // Held for the whole call so concurrent starts serialize.
        let mut task = self.inner.task.lock().await;
        let current = *self.inner.state.borrow();
        if current.is_active() {
            return Err(ScanError::AlreadyRunning(current));
        }
        if let Some(prev) = task.take() {
            // Already terminal; this only waits out an abandoned in-flight probe.
            let _ = prev.await;
        }

        let total = wordlist.len() as u64;
        let cancel = CancellationToken::new();
        {
            let mut run = self.inner.run.write().await;
            *run = Run {
                target: Some(base.clone()),
                total,
                results: Vec::with_capacity(wordlist.len()),
                stats: ScanStats::default(),
                cancel: cancel.clone(),
            };
            if wordlist.is_empty() {
                self.inner.state.send_replace(ScanState::Completed);
            } else {
                self.inner.state.send_replace(ScanState::Running);
            }
        }

        info!(base = %base, total, "scan started");
        let _ = self.inner.events.send(ScanEvent::Started {
            target: base.to_string(),
            total,
        });

        if wordlist.is_empty() {
            info!(base = %base, "empty wordlist, nothing to probe");
            let _ = self.inner.events.send(ScanEvent::Finished {
                state: ScanState::Completed,
                stats: ScanStats::default(),
            });
            return Ok(());
        }

        *task = Some(tokio::spawn(drive(
            self.inner.clone(),
            base,
            wordlist,
            cancel,
        )));
        Ok(())
    }

    /// Running → Paused. Takes effect before the next probe is issued.
    pub fn pause(&self) -> Result<()> {
        self.transition("pause", |s| s == ScanState::Running, ScanState::Paused)
    }

    /// Paused → Running, continuing with the next unprobed candidate.
    pub fn resume(&self) -> Result<()> {
        self.transition("resume", |s| s == ScanState::Paused, ScanState::Running)
    }

    /// Running or Paused → Stopped. Aborts the in-flight probe and any
    /// pending inter-probe delay.
    pub async fn stop(&self) -> Result<()> {
        let run = self.inner.run.write().await;
        self.transition("stop", ScanState::is_active, ScanState::Stopped)?;
        run.cancel.cancel();
        Ok(())
    }

    fn transition(
        &self,
        action: &'static str,
        allowed: impl Fn(ScanState) -> bool,
        next: ScanState,
    ) -> Result<()> {
        let mut rejected = None;
        self.inner.state.send_if_modified(|s| {
            if allowed(*s) {
                *s = next;
                true
            } else {
                rejected = Some(*s);
                false
            }
        });
        match rejected {
            Some(state) => Err(ScanError::InvalidTransition { action, state }),
            None => {
                info!(action, state = %next, "scan state changed");
                Ok(())
            }
        }
    }

    pub fn state(&self) -> ScanState {
        *self.inner.state.borrow()
    }

    /// Push-based progress feed for the current and future scans.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanEvent> {
        self.inner.events.subscribe()
    }

    pub async fn stats(&self) -> ScanStats {
        self.inner.run.read().await.stats
    }

    pub async fn results(&self) -> Vec<ProbeResult> {
        self.inner.run.read().await.results.clone()
    }

    /// Consistent copy of state, counters and results.
    pub async fn snapshot(&self) -> ScanSnapshot {
        let run = self.inner.run.read().await;
        let completed = run.results.len() as u64;
        ScanSnapshot {
            state: self.state(),
            target: run.target.as_ref().map(ToString::to_string),
            total: run.total,
            completed,
            progress: progress_fraction(completed, run.total),
            stats: run.stats,
            results: run.results.clone(),
        }
    }

    /// Wait until no scan is running or paused and return that state.
    pub async fn wait(&self) -> ScanState {
        let mut rx = self.inner.state.subscribe();
        loop {
            let state = *rx.borrow_and_update();
            if !state.is_active() {
                return state;
            }
            if rx.changed().await.is_err() {
                return self.state();
            }
        }
    }
}

async fn drive(inner: Arc<Inner>, base: BaseUrl, wordlist: Vec<String>, cancel: CancellationToken) {
    let total = wordlist.len() as u64;
    let mut state_rx = inner.state.subscribe();

    for (idx, path) in wordlist.into_iter().enumerate() {
        if !wait_until_running(&mut state_rx, &cancel).await {
            break;
        }

        let url = base.join(&path);
        let status = inner.prober.probe(&url, &cancel).await;
        if cancel.is_cancelled() {
            break;
        }

        let (outcome, status) = inner.config.policy.classify(&status);
        debug!(%url, %outcome, %status, "probed");
        let result = ProbeResult {
            path,
            url,
            outcome,
            status,
            timestamp: now_rfc3339(),
        };

        {
            let mut run = inner.run.write().await;
            if run.cancel.is_cancelled() {
                break;
            }
            run.stats.record(outcome);
            run.results.push(result.clone());
            let completed = run.results.len() as u64;
            // Sent under the lock so no update can trail a stop.
            let _ = inner.events.send(ScanEvent::Probed(ProgressUpdate {
                result,
                stats: run.stats,
                completed,
                total,
                progress: progress_fraction(completed, total),
            }));
        }

        let last = idx as u64 + 1 == total;
        if !last && !inner.config.delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = time::sleep(inner.config.delay) => {}
            }
        }
    }

    // A pause requested during the final probe still ends in Completed.
    inner.state.send_if_modified(|s| {
        if s.is_active() && !cancel.is_cancelled() {
            *s = ScanState::Completed;
            true
        } else {
            false
        }
    });

    let state = *inner.state.borrow();
    let stats = inner.run.read().await.stats;
    info!(
        base = %base,
        %state,
        found = stats.found,
        not_found = stats.not_found,
        errors = stats.errors,
        unobservable = stats.unobservable,
        "scan finished"
    );
    let _ = inner.events.send(ScanEvent::Finished { state, stats });
}

/// Block while paused. Returns false once the scan is stopped.
async fn wait_until_running(
    rx: &mut watch::Receiver<ScanState>,
    cancel: &CancellationToken,
) -> bool {
    loop {
        let state = *rx.borrow_and_update();
        match state {
            ScanState::Running => return true,
            ScanState::Paused => {}
            _ => return false,
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return false,
            changed = rx.changed() => {
                if changed.is_err() {
                    return false;
                }
            }
        }
    }
}

fn now_rfc3339() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}
