use std::{path::PathBuf, sync::Arc, time::Duration};

use parking_lot::Mutex;

use crate::error::FailureKind;

/// Stage transitions of one `generate` invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationEvent {
    Reading {
        context: PathBuf,
        transcript: PathBuf,
    },
    Prompting {
        context_chars: usize,
        transcript_chars: usize,
    },
    Calling {
        attempt: u32,
    },
    RetryWait {
        attempt: u32,
        delay: Duration,
        reason: String,
    },
    OutputDirCreated {
        path: PathBuf,
    },
    Succeeded {
        output_path: PathBuf,
        chars: usize,
    },
    Failed {
        kind: FailureKind,
        message: String,
    },
}

pub trait GenerationObserver: Send + Sync {
    fn on_event(&self, event: &GenerationEvent);
}

/// Logs every transition through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl GenerationObserver for TracingObserver {
    fn on_event(&self, event: &GenerationEvent) {
        match event {
            GenerationEvent::Reading {
                context,
                transcript,
            } => tracing::info!(?context, ?transcript, "reading source documents"),
            GenerationEvent::Prompting {
                context_chars,
                transcript_chars,
            } => tracing::debug!(context_chars, transcript_chars, "building prompt"),
            GenerationEvent::Calling { attempt } => {
                tracing::info!(attempt = attempt + 1, "calling generation service")
            }
            GenerationEvent::RetryWait {
                attempt,
                delay,
                reason,
            } => tracing::warn!(attempt = attempt + 1, ?delay, %reason, "rate limited, retrying"),
            GenerationEvent::OutputDirCreated { path } => {
                tracing::debug!(?path, "created output directory")
            }
            GenerationEvent::Succeeded { output_path, chars } => {
                tracing::info!(?output_path, chars, "PRD saved")
            }
            GenerationEvent::Failed { kind, message } => {
                tracing::error!(?kind, %message, "PRD generation failed")
            }
        }
    }
}

/// Keeps the transitions of a single request and forwards them to another
/// observer.
pub struct EventLog {
    events: Mutex<Vec<GenerationEvent>>,
    inner: Arc<dyn GenerationObserver>,
}

impl EventLog {
    pub fn new(inner: Arc<dyn GenerationObserver>) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            inner,
        }
    }

    pub fn events(&self) -> Vec<GenerationEvent> {
        self.events.lock().clone()
    }

    /// Number of generation calls made so far.
    pub fn attempts(&self) -> u32 {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, GenerationEvent::Calling { .. }))
            .count() as u32
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(Arc::new(TracingObserver))
    }
}

impl GenerationObserver for EventLog {
    fn on_event(&self, event: &GenerationEvent) {
        self.events.lock().push(event.clone());
        self.inner.on_event(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_log_counts_calls() {
        let log = EventLog::default();
        log.on_event(&GenerationEvent::Calling { attempt: 0 });
        log.on_event(&GenerationEvent::RetryWait {
            attempt: 0,
            delay: Duration::from_secs(1),
            reason: "429".into(),
        });
        log.on_event(&GenerationEvent::Calling { attempt: 1 });

        assert_eq!(log.attempts(), 2);
        assert_eq!(log.events().len(), 3);
    }
}
