//! Thin wrappers over the FFmpeg command-line tools used for playback.

mod error;
mod player;
mod probe;

pub use error::{MediaFfmpegError, Result, Tool};
pub use player::{FfplayProcess, PlayRangeRequest, ffplay_args};
pub use probe::probe_duration_seconds;
