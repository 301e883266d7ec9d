#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pathscout::probe::{ProbeStatus, Prober};
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;

/// Answers from a fixed table keyed by the last path segment(s) after the host.
pub struct StubProber {
    answers: HashMap<String, ProbeStatus>,
    fallback: ProbeStatus,
    calls: Mutex<Vec<String>>,
}

impl StubProber {
    pub fn new(answers: &[(&str, ProbeStatus)], fallback: ProbeStatus) -> Self {
        Self {
            answers: answers
                .iter()
                .map(|(p, s)| (p.to_string(), s.clone()))
                .collect(),
            fallback,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Prober for StubProber {
    async fn probe(&self, url: &str, _cancel: &CancellationToken) -> ProbeStatus {
        self.calls.lock().unwrap().push(url.to_string());
        let path = url
            .splitn(4, '/')
            .nth(3)
            .unwrap_or_default()
            .to_string();
        self.answers.get(&path).cloned().unwrap_or_else(|| self.fallback.clone())
    }
}

/// Each probe announces its URL and then blocks until the test releases a
/// permit or the scan is cancelled.
pub struct GatedProber {
    started: mpsc::UnboundedSender<String>,
    gate: Arc<Semaphore>,
}

pub struct Gate {
    pub started: mpsc::UnboundedReceiver<String>,
    pub gate: Arc<Semaphore>,
}

impl Gate {
    /// Let `n` blocked or future probes complete.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    /// Wait for the next probe to be issued.
    pub async fn next_probe(&mut self) -> String {
        self.started.recv().await.expect("prober dropped")
    }
}

pub fn gated_prober() -> (GatedProber, Gate) {
    let (tx, rx) = mpsc::unbounded_channel();
    let gate = Arc::new(Semaphore::new(0));
    (
        GatedProber {
            started: tx,
            gate: gate.clone(),
        },
        Gate { started: rx, gate },
    )
}

#[async_trait]
impl Prober for GatedProber {
    async fn probe(&self, url: &str, cancel: &CancellationToken) -> ProbeStatus {
        let _ = self.started.send(url.to_string());
        tokio::select! {
            _ = cancel.cancelled() => ProbeStatus::Aborted,
            permit = self.gate.acquire() => {
                permit.expect("gate closed").forget();
                ProbeStatus::Status(200)
            }
        }
    }
}

pub fn paths(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
