//! Sequential utterance pipeline
//!
//! One utterance at a time: pull recognized text, parse it, dispatch
//! the intent, report the outcomes, repeat. No new utterance is
//! processed while a dispatch is in flight. No failure terminates the
//! loop; misses and dispatch errors are logged and the next utterance
//! is accepted.

use anyhow::Result;
use labrelay_core::{parse, DispatchOutcome};
use labrelay_dispatch::DispatchClient;
use std::future::Future;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::transcript::{RecognitionError, TranscriptSource};

pub struct Pipeline<S> {
    source: S,
    client: DispatchClient,
}

impl<S> Pipeline<S>
where
    S: TranscriptSource + 'static,
{
    pub fn new(source: S, client: DispatchClient) -> Self {
        Self { source, client }
    }

    /// Run until the source is exhausted or an interrupt arrives.
    pub async fn run(self) -> Result<()> {
        self.run_with_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
    }

    /// Run until the source is exhausted or `shutdown` resolves.
    ///
    /// The shutdown future is armed once, before the loop, and checked
    /// again between utterances: an interrupt that lands while a
    /// dispatch is in flight lets that dispatch complete and report its
    /// outcomes, then stops the loop. Pulls run on a detached reader
    /// thread, so shutdown never waits on a read blocked in the source;
    /// the thread exits on its own once the channel closes.
    pub async fn run_with_shutdown(
        self,
        shutdown: impl Future<Output = ()> + Send,
    ) -> Result<()> {
        let Pipeline { client, source } = self;
        let mut utterances = spawn_reader(source);
        tokio::pin!(shutdown);
        info!("Ready - speak a command (Ctrl-C to exit)");

        loop {
            let pulled = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Interrupt received, shutting down");
                    return Ok(());
                }
                pulled = utterances.recv() => pulled,
            };

            match pulled {
                Some(Ok(text)) => handle_utterance(&client, &text).await,
                Some(Err(RecognitionError::Unintelligible)) => {
                    debug!("Could not make out an utterance");
                }
                Some(Err(RecognitionError::Service(e))) => {
                    error!(error = %e, "Recognition service failed");
                }
                None => {
                    info!("Transcript source closed, shutting down");
                    return Ok(());
                }
            }
        }
    }
}

/// Pull utterances on a plain detached thread, one in flight at a time.
///
/// The channel holds a single pull so the source never runs ahead of
/// the pipeline. Dropping the receiver unblocks the thread at its next
/// send and lets it exit; the runtime never waits on it.
fn spawn_reader<S>(mut source: S) -> mpsc::Receiver<Result<String, RecognitionError>>
where
    S: TranscriptSource + 'static,
{
    let (tx, rx) = mpsc::channel(1);
    std::thread::spawn(move || loop {
        match source.next_utterance() {
            Ok(Some(text)) => {
                if tx.blocking_send(Ok(text)).is_err() {
                    return;
                }
            }
            Ok(None) => return,
            Err(e) => {
                if tx.blocking_send(Err(e)).is_err() {
                    return;
                }
            }
        }
    });
    rx
}

/// Parse one utterance and dispatch it. A parse miss is logged and
/// discarded; it never surfaces as a failure.
async fn handle_utterance(client: &DispatchClient, text: &str) {
    info!(heard = %text, "Utterance received");

    let Some(intent) = parse(client.registry(), text) else {
        debug!(text = %text, "No matching command");
        return;
    };

    let outcomes = client.dispatch(&intent).await;
    summarize(&outcomes);
}

/// Log a per-device outcome summary for one dispatch.
fn summarize(outcomes: &[DispatchOutcome]) {
    let succeeded = outcomes.iter().filter(|o| o.succeeded).count();
    info!(
        devices = outcomes.len(),
        succeeded,
        failed = outcomes.len() - succeeded,
        "Dispatch complete"
    );
    for outcome in outcomes.iter().filter(|o| !o.succeeded) {
        match &outcome.error {
            Some(kind) => warn!(
                device = %outcome.device,
                attempts = outcome.attempts,
                error = %kind,
                "Device command failed"
            ),
            None => warn!(device = %outcome.device, "Device command failed"),
        }
    }
}
