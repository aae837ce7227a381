use std::{path::Path, process::Stdio, time::Duration};

use tokio::{process::Command, time::timeout};
use uuid::Uuid;

use crate::transcription::types::{FallbackCommandConfig, TranscriptProvider, Transcription};

const INPUT_PLACEHOLDER: &str = "{input}";

/// Runs a local speech-to-text command over a temporary audio file.
/// Never fails: anything that goes wrong yields an `unavailable` transcription.
pub struct LocalWhisper {
    config: FallbackCommandConfig,
}

impl LocalWhisper {
    pub fn new(config: FallbackCommandConfig) -> Self {
        Self { config }
    }

    pub async fn transcribe(&self, audio: &[u8]) -> Transcription {
        let Some(program) = self.config.command.as_deref().filter(|cmd| !cmd.trim().is_empty())
        else {
            return Transcription::unavailable();
        };

        let path = std::env::temp_dir().join(format!("agri-advisory-{}.wav", Uuid::new_v4()));
        if let Err(err) = tokio::fs::write(&path, audio).await {
            tracing::warn!(
                target: "transcription",
                error = %err,
                "local_transcriber_tempfile_failed"
            );
            return Transcription::unavailable();
        }

        let result = self.run(program, &path).await;
        let _ = tokio::fs::remove_file(&path).await;

        match result {
            Some(transcript) => Transcription {
                transcript,
                provider: TranscriptProvider::Whisper,
                language: None,
            },
            None => Transcription::unavailable(),
        }
    }

    async fn run(&self, program: &str, input: &Path) -> Option<String> {
        let input = input.to_string_lossy();
        let mut args: Vec<String> = self
            .config
            .args
            .iter()
            .map(|arg| arg.replace(INPUT_PLACEHOLDER, &input))
            .collect();
        if !self
            .config
            .args
            .iter()
            .any(|arg| arg.contains(INPUT_PLACEHOLDER))
        {
            args.push(input.to_string());
        }

        let mut command = Command::new(program);
        command.args(&args);
        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        command.kill_on_drop(true);

        let child = match command.spawn() {
            Ok(child) => child,
            Err(err) => {
                tracing::warn!(
                    target: "transcription",
                    program = program,
                    error = %err,
                    "local_transcriber_spawn_failed"
                );
                return None;
            }
        };

        let timeout_ms = self.config.timeout_ms.max(1);
        let output = match timeout(Duration::from_millis(timeout_ms), child.wait_with_output()).await
        {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                tracing::warn!(
                    target: "transcription",
                    program = program,
                    error = %err,
                    "local_transcriber_wait_failed"
                );
                return None;
            }
            Err(_) => {
                tracing::warn!(
                    target: "transcription",
                    program = program,
                    timeout_ms = timeout_ms,
                    "local_transcriber_timed_out"
                );
                return None;
            }
        };

        if !output.status.success() {
            tracing::warn!(
                target: "transcription",
                program = program,
                exit_code = output.status.code().unwrap_or(-1),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "local_transcriber_failed"
            );
            return None;
        }

        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
