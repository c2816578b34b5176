use std::fmt::{Display, Formatter};
use std::process::ExitStatus;
use std::string::FromUtf8Error;

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, MediaFfmpegError>;

/// FFmpeg command-line tool invoked by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Ffprobe,
    Ffplay,
}

impl Display for Tool {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Ffprobe => "ffprobe",
            Self::Ffplay => "ffplay",
        })
    }
}

/// Failures while probing a source or driving a player process.
#[derive(Debug)]
pub enum MediaFfmpegError {
    /// The requested clip range cannot be played.
    InvalidRange { start: f64, end: f64 },
    /// The OS refused to spawn, poll, kill or reap a tool process.
    Process {
        tool: Tool,
        action: &'static str,
        source: std::io::Error,
    },
    /// The tool ran but exited unsuccessfully for `target`.
    ToolFailed {
        tool: Tool,
        target: String,
        status: ExitStatus,
        stderr: String,
    },
    NonUtf8Output { tool: Tool, source: FromUtf8Error },
    /// `ffprobe` printed a duration that is not a non-negative number.
    BadDuration { value: String },
}

impl Display for MediaFfmpegError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRange { start, end } => write!(
                f,
                "cannot play {start}s to {end}s: the range must start at or after 0 and before its end"
            ),
            Self::Process {
                tool,
                action,
                source,
            } => write!(f, "failed to {action} {tool}: {source}"),
            Self::ToolFailed {
                tool,
                target,
                status,
                stderr,
            } => {
                write!(f, "{tool} gave up on {target} ({status})")?;
                match stderr.trim() {
                    "" => Ok(()),
                    detail => write!(f, ": {detail}"),
                }
            }
            Self::NonUtf8Output { tool, source } => {
                write!(f, "{tool} printed output that is not UTF-8: {source}")
            }
            Self::BadDuration { value } => {
                write!(f, "source duration {value:?} is not a usable number of seconds")
            }
        }
    }
}

impl std::error::Error for MediaFfmpegError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Process { source, .. } => Some(source),
            Self::NonUtf8Output { source, .. } => Some(source),
            _ => None,
        }
    }
}
