use std::{path::Path, sync::Arc};

use chrono::{DateTime, Local};
use tokio::{fs, task};

use crate::{
    config::GeneratorSettings,
    error::{CallError, GenerationFailed, PipelineError},
    generation::{
        document::{Document, read_document},
        observer::{GenerationEvent, GenerationObserver, TracingObserver},
        prompt::{build_prompt, build_request},
        provider::CompletionProvider,
        types::{GenerationRequest, GenerationResponse, GenerationResult},
    },
};

/// Drives read → prompt → call (with bounded retry) → persist.
///
/// Holds no per-invocation state; clones share the provider and observer.
#[derive(Clone)]
pub struct PrdGenerator {
    provider: Arc<dyn CompletionProvider>,
    settings: GeneratorSettings,
    observer: Arc<dyn GenerationObserver>,
}

impl PrdGenerator {
    pub fn new(provider: Arc<dyn CompletionProvider>, settings: GeneratorSettings) -> Self {
        Self {
            provider,
            settings,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(&self, observer: Arc<dyn GenerationObserver>) -> Self {
        Self {
            provider: self.provider.clone(),
            settings: self.settings.clone(),
            observer,
        }
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    pub fn provider(&self) -> &dyn CompletionProvider {
        self.provider.as_ref()
    }

    pub async fn generate(
        &self,
        context_path: &Path,
        transcript_path: &Path,
        output_path: &Path,
    ) -> Result<GenerationResult, GenerationFailed> {
        match self.run(context_path, transcript_path, output_path).await {
            Ok(result) => {
                self.emit(GenerationEvent::Succeeded {
                    output_path: result.output_path.clone(),
                    chars: result.content.chars().count(),
                });
                Ok(result)
            }
            Err(cause) => {
                self.emit(GenerationEvent::Failed {
                    kind: cause.kind(),
                    message: cause.to_string(),
                });
                Err(cause.into())
            }
        }
    }

    async fn run(
        &self,
        context_path: &Path,
        transcript_path: &Path,
        output_path: &Path,
    ) -> Result<GenerationResult, PipelineError> {
        self.emit(GenerationEvent::Reading {
            context: context_path.to_path_buf(),
            transcript: transcript_path.to_path_buf(),
        });
        let (context, transcript) = read_documents(context_path, transcript_path).await?;

        self.emit(GenerationEvent::Prompting {
            context_chars: context.char_count(),
            transcript_chars: transcript.char_count(),
        });
        let prompt = build_prompt(&context.text, &transcript.text);
        let request = build_request(prompt, &self.settings);

        let response = self.call_with_retry(&request).await?;
        if response.content.trim().is_empty() {
            return Err(PipelineError::EmptyResult);
        }

        let generated_at = Local::now();
        let content = render_output(&response.content, generated_at);
        self.write_output(output_path, &content).await?;

        Ok(GenerationResult {
            content,
            generated_at,
            output_path: output_path.to_path_buf(),
        })
    }

    async fn call_with_retry(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, CallError> {
        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            self.emit(GenerationEvent::Calling { attempt });

            match self.provider.complete(request).await {
                Ok(response) => return Ok(response),
                Err(CallError::RateLimited(reason)) if attempt + 1 < max_attempts => {
                    let delay = self
                        .settings
                        .backoff_unit
                        .saturating_mul(2u32.saturating_pow(attempt));
                    self.emit(GenerationEvent::RetryWait {
                        attempt,
                        delay,
                        reason,
                    });
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn write_output(&self, path: &Path, content: &str) -> Result<(), PipelineError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !fs::try_exists(parent).await.unwrap_or(false) {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|source| PipelineError::Output {
                        path: parent.to_path_buf(),
                        source,
                    })?;
                self.emit(GenerationEvent::OutputDirCreated {
                    path: parent.to_path_buf(),
                });
            }
        }

        fs::write(path, content)
            .await
            .map_err(|source| PipelineError::Output {
                path: path.to_path_buf(),
                source,
            })
    }

    fn emit(&self, event: GenerationEvent) {
        self.observer.on_event(&event);
    }
}

async fn read_documents(
    context_path: &Path,
    transcript_path: &Path,
) -> Result<(Document, Document), PipelineError> {
    let context_path = context_path.to_path_buf();
    let transcript_path = transcript_path.to_path_buf();

    let documents = task::spawn_blocking(move || {
        let context = read_document(&context_path)?;
        let transcript = read_document(&transcript_path)?;
        Ok::<_, crate::error::DocumentError>((context, transcript))
    })
    .await
    .map_err(|err| PipelineError::Internal(format!("document reader task failed: {err}")))??;

    Ok(documents)
}

/// Final file layout: a timestamp heading, a blank line, then the model text.
pub fn render_output(content: &str, generated_at: DateTime<Local>) -> String {
    format!(
        "## Generated: {}\n\n{}",
        generated_at.format("%Y-%m-%d %H:%M:%S"),
        content
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn output_starts_with_timestamp_heading() {
        let at = Local.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
        let rendered = render_output("# PRD\nbody", at);
        assert_eq!(rendered, "## Generated: 2025-03-14 09:26:53\n\n# PRD\nbody");
    }
}
