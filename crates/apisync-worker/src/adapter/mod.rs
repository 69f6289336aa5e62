//! Subprocess-backed collaborators.
//!
//! [`KuadrantctlGenerator`] implements [`PolicyGenerator`] on top of the
//! `kuadrantctl` CLI and [`GitSynchronizer`] implements [`Synchronizer`] on
//! top of `git`.
//!
//! [`PolicyGenerator`]: apisync_core::PolicyGenerator
//! [`Synchronizer`]: apisync_core::Synchronizer

mod git;
mod kuadrantctl;

pub use git::GitSynchronizer;
pub use kuadrantctl::KuadrantctlGenerator;

/// Tracing target for subprocess adapters.
const TRACING_TARGET: &str = "apisync_worker::adapter";

/// Longest stderr excerpt carried in an error.
const MAX_STDERR_CHARS: usize = 2048;

/// Returns the trimmed, length-capped stderr of a finished process.
fn stderr_excerpt(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim();
    match trimmed.char_indices().nth(MAX_STDERR_CHARS) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stderr_excerpt_trims() {
        assert_eq!(stderr_excerpt(b"  boom\n"), "boom");
        assert_eq!(stderr_excerpt(b""), "");
    }

    #[test]
    fn test_stderr_excerpt_truncates() {
        let long = "x".repeat(MAX_STDERR_CHARS + 10);
        let excerpt = stderr_excerpt(long.as_bytes());
        assert_eq!(excerpt.len(), MAX_STDERR_CHARS + 3);
        assert!(excerpt.ends_with("..."));
    }
}
