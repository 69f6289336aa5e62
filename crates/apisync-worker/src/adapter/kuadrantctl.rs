use std::path::PathBuf;
use std::process::Stdio;

use apisync_core::{Error, GenerationMode, PolicyGenerator, Result};
use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{TRACING_TARGET, stderr_excerpt};

/// Runs `kuadrantctl generate ... --oas -` once per mode.
///
/// The OpenAPI document is piped on stdin and the generated resource is
/// read from stdout. A non-zero exit becomes a generation error carrying
/// the captured stderr.
#[derive(Debug, Clone)]
pub struct KuadrantctlGenerator {
    binary: PathBuf,
}

impl KuadrantctlGenerator {
    /// Creates a generator invoking `binary`.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Returns the arguments passed for `mode`.
    pub fn args(mode: GenerationMode) -> [&'static str; 5] {
        match mode {
            GenerationMode::HttpRoute => ["generate", "gatewayapi", "httproute", "--oas", "-"],
            GenerationMode::AuthPolicy => ["generate", "kuadrant", "authpolicy", "--oas", "-"],
            GenerationMode::RateLimitPolicy => {
                ["generate", "kuadrant", "ratelimitpolicy", "--oas", "-"]
            }
        }
    }
}

impl Default for KuadrantctlGenerator {
    fn default() -> Self {
        Self::new("kuadrantctl")
    }
}

#[async_trait::async_trait]
impl PolicyGenerator for KuadrantctlGenerator {
    async fn generate(&self, document: &[u8], mode: GenerationMode) -> Result<Bytes> {
        if std::str::from_utf8(document).is_err() {
            return Err(Error::generation()
                .with_message("API document is not valid UTF-8")
                .with_context(mode.to_string()));
        }

        let mut child = Command::new(&self.binary)
            .args(Self::args(mode))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::generation()
                    .with_message("failed to start kuadrantctl")
                    .with_context(self.binary.display().to_string())
                    .with_source(e)
            })?;

        let stdin = child.stdin.take();
        let feed = async move {
            match stdin {
                Some(mut stdin) => {
                    stdin.write_all(document).await?;
                    stdin.shutdown().await
                }
                None => Ok(()),
            }
        };

        // Feed stdin while draining stdout so large documents cannot stall.
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output.map_err(|e| {
            Error::generation()
                .with_message("failed to wait for kuadrantctl")
                .with_context(mode.to_string())
                .with_source(e)
        })?;

        if !output.status.success() {
            let stderr = stderr_excerpt(&output.stderr);
            tracing::debug!(
                target: TRACING_TARGET,
                mode = %mode,
                status = %output.status,
                stderr = %stderr,
                "kuadrantctl exited with failure"
            );
            return Err(Error::generation()
                .with_message(format!("kuadrantctl {mode} failed with {}", output.status))
                .with_context(stderr));
        }

        if let Err(e) = fed {
            return Err(Error::generation()
                .with_message("failed to pipe API document to kuadrantctl")
                .with_context(mode.to_string())
                .with_source(e));
        }

        tracing::trace!(
            target: TRACING_TARGET,
            mode = %mode,
            output_bytes = output.stdout.len(),
            "kuadrantctl finished"
        );

        Ok(Bytes::from(output.stdout))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::os::unix::fs::PermissionsExt;

    use apisync_core::ErrorKind;
    use tempfile::TempDir;

    use super::*;

    fn script(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_args_per_mode() {
        assert_eq!(
            KuadrantctlGenerator::args(GenerationMode::HttpRoute).join(" "),
            "generate gatewayapi httproute --oas -"
        );
        assert_eq!(
            KuadrantctlGenerator::args(GenerationMode::AuthPolicy).join(" "),
            "generate kuadrant authpolicy --oas -"
        );
        assert_eq!(
            KuadrantctlGenerator::args(GenerationMode::RateLimitPolicy).join(" "),
            "generate kuadrant ratelimitpolicy --oas -"
        );
    }

    #[tokio::test]
    async fn test_document_is_piped_through() {
        let dir = TempDir::new().unwrap();
        let generator = KuadrantctlGenerator::new(script(&dir, "echo-stdin", "cat"));

        let output = generator
            .generate(b"openapi: 3.0.0\n", GenerationMode::HttpRoute)
            .await
            .unwrap();
        assert_eq!(output.as_ref(), b"openapi: 3.0.0\n");
    }

    #[tokio::test]
    async fn test_mode_arguments_are_passed() {
        let dir = TempDir::new().unwrap();
        let generator =
            KuadrantctlGenerator::new(script(&dir, "echo-args", "cat > /dev/null\necho \"$@\""));

        let output = generator
            .generate(b"{}", GenerationMode::RateLimitPolicy)
            .await
            .unwrap();
        assert_eq!(output.as_ref(), b"generate kuadrant ratelimitpolicy --oas -\n");
    }

    #[tokio::test]
    async fn test_failure_carries_stderr() {
        let dir = TempDir::new().unwrap();
        let generator = KuadrantctlGenerator::new(script(
            &dir,
            "reject",
            "cat > /dev/null\necho 'invalid OpenAPI document' >&2\nexit 3",
        ));

        let error = generator
            .generate(b"{}", GenerationMode::AuthPolicy)
            .await
            .unwrap_err();
        assert_eq!(error.kind, ErrorKind::Generation);
        assert_eq!(error.context.as_deref(), Some("invalid OpenAPI document"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_generation_error() {
        let dir = TempDir::new().unwrap();
        let generator = KuadrantctlGenerator::new(dir.path().join("does-not-exist"));

        let error = generator
            .generate(b"{}", GenerationMode::HttpRoute)
            .await
            .unwrap_err();
        assert_eq!(error.kind, ErrorKind::Generation);
    }

    #[tokio::test]
    async fn test_non_utf8_document_is_rejected_before_spawn() {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("ran");
        let generator = KuadrantctlGenerator::new(script(
            &dir,
            "touch-marker",
            &format!("touch {}", marker.display()),
        ));

        let error = generator
            .generate(&[0xff, 0xfe, 0x00], GenerationMode::HttpRoute)
            .await
            .unwrap_err();
        assert_eq!(error.kind, ErrorKind::Generation);
        assert!(!marker.exists());
    }
}
