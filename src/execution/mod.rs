//! Pipeline execution

pub mod orchestrator;
pub mod retry;

pub use orchestrator::{EventHandler, ExecutionEvent, Orchestrator};
pub use retry::{upload_with_retry, RetryPolicy, UploadResult};
