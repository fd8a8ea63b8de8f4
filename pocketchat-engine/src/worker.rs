use crate::completion::CompletionClient;
use pocketchat_core::types::TurnId;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionEvent {
    /// Advisory: which candidate model answered this turn.
    ModelServed { turn: TurnId, model: String },
    Reply { turn: TurnId, text: String },
}

impl CompletionEvent {
    pub fn turn(&self) -> TurnId {
        match self {
            CompletionEvent::ModelServed { turn, .. } | CompletionEvent::Reply { turn, .. } => {
                *turn
            }
        }
    }
}

enum Job {
    Complete { turn: TurnId, prompt: String },
    // Takes effect for turns submitted after it.
    UseClient(Arc<CompletionClient>),
}

/// Single-consumer queue in front of the completion client.
///
/// Turns run one at a time in submission order, so replies reach the transcript in the
/// order the user sent them. There is no cancellation; timeouts bound each attempt.
#[derive(Clone)]
pub struct CompletionWorker {
    jobs: mpsc::UnboundedSender<Job>,
}

impl CompletionWorker {
    /// Must be called from within a Tokio runtime.
    ///
    /// The worker stops once every handle has been dropped and the queue is drained.
    pub fn spawn(
        mut client: Arc<CompletionClient>,
    ) -> (Self, mpsc::UnboundedReceiver<CompletionEvent>) {
        let (jobs_tx, mut jobs_rx) = mpsc::unbounded_channel::<Job>();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(job) = jobs_rx.recv().await {
                let (turn, prompt) = match job {
                    Job::Complete { turn, prompt } => (turn, prompt),
                    Job::UseClient(next) => {
                        log::info!("completion client replaced");
                        client = next;
                        continue;
                    }
                };
                let served_tx = events_tx.clone();
                let text = client
                    .complete_with_hook(&prompt, move |model| {
                        let _ = served_tx.send(CompletionEvent::ModelServed {
                            turn,
                            model: model.to_string(),
                        });
                    })
                    .await;

                if events_tx.send(CompletionEvent::Reply { turn, text }).is_err() {
                    log::info!("completion events receiver dropped; stopping worker");
                    break;
                }
            }
        });

        (Self { jobs: jobs_tx }, events_rx)
    }

    pub fn submit(&self, prompt: impl Into<String>) -> anyhow::Result<TurnId> {
        let turn = TurnId::new();
        self.jobs
            .send(Job::Complete {
                turn,
                prompt: prompt.into(),
            })
            .map_err(|_| anyhow::anyhow!("completion worker has stopped"))?;
        Ok(turn)
    }

    /// Swap the client used for later turns, e.g. after the API token changes.
    pub fn replace_client(&self, client: Arc<CompletionClient>) -> anyhow::Result<()> {
        self.jobs
            .send(Job::UseClient(client))
            .map_err(|_| anyhow::anyhow!("completion worker has stopped"))
    }
}
