//! Bounded retry for artifact uploads

use crate::connectors::ArtifactRepository;
use crate::core::logger::DeployLogger;
use std::path::Path;
use std::time::Duration;

/// How many times to try and how long to wait between tries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// Attempts used when no `max_attempts` is configured
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    /// `max_attempts` is clamped to at least one attempt
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS)
    }
}

/// Result of an upload with retries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadResult {
    /// Succeeded on the given attempt (1-based)
    Uploaded { attempts: u32 },
    /// Every attempt failed
    Exhausted { attempts: u32 },
}

impl UploadResult {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadResult::Uploaded { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            UploadResult::Uploaded { attempts } | UploadResult::Exhausted { attempts } => *attempts,
        }
    }
}

/// Upload `artifact`, retrying failed attempts up to `max_attempts - 1` times
///
/// Stops at the first successful attempt. Failed attempts are reported on
/// the warning channel.
pub async fn upload_with_retry(
    repository: &dyn ArtifactRepository,
    artifact: &Path,
    policy: RetryPolicy,
    logger: &dyn DeployLogger,
) -> UploadResult {
    let max_attempts = policy.max_attempts();

    for attempt in 1..=max_attempts {
        logger.debug(&format!(
            "Attempt {} of {} to upload {}",
            attempt,
            max_attempts,
            artifact.display()
        ));

        if repository.attempt_upload(artifact).await {
            return UploadResult::Uploaded { attempts: attempt };
        }

        if attempt < max_attempts {
            logger.warning(&format!(
                "Upload attempt {} of {} for {} failed, retrying",
                attempt,
                max_attempts,
                artifact.display()
            ));
            if !policy.delay().is_zero() {
                tokio::time::sleep(policy.delay()).await;
            }
        } else {
            logger.warning(&format!(
                "Upload attempt {} of {} for {} failed",
                attempt,
                max_attempts,
                artifact.display()
            ));
        }
    }

    UploadResult::Exhausted {
        attempts: max_attempts,
    }
}
