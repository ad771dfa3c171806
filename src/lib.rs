pub mod assemble;
pub mod config;
pub mod error;
pub mod mix;
pub mod music;
pub mod pipeline;
pub mod prosody;
pub mod segment;
pub mod subtitle;
pub mod transcript;
pub mod video;

pub use config::Config;
pub use error::{ReelsmithError, Result};
pub use pipeline::{print_summary, produce_clips, RunOptions, RunReport};
