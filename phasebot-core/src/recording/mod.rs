//! Optional JSONL journal of webhook deliveries, GitHub API traffic and
//! invocation reports, for debugging and replay.

pub mod logger;
pub mod middleware;
pub mod sanitizer;
pub mod types;

pub use logger::RecordingLogger;
pub use middleware::RecordingMiddleware;
pub use sanitizer::{Sanitizer, SENSITIVE_HEADERS};
pub use types::*;
