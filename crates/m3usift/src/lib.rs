// M3U playlist link validation engine.

pub mod checker;
pub mod classify;
pub mod config;
pub mod error;
pub mod output;
pub mod playlist;
pub mod source;

// Export common types for ease of use
pub use checker::LinkChecker;
pub use classify::{LinkClassifier, LinkStatus, ProbeFailure, Verdict};
pub use config::{CheckerConfig, DEFAULT_USER_AGENT, MAX_REDIRECTS};
pub use error::SiftError;
pub use output::{RunSummary, output_filename, summarize, write_playlist};
pub use playlist::{Entry, parse_playlist};
pub use source::load_playlist;
