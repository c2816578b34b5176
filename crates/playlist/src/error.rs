use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Result type used by the playlist crate.
pub type Result<T> = std::result::Result<T, PlaylistError>;

/// Draft field that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Name,
    Start,
    End,
    Tags,
}

impl Display for DraftField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Name => "name",
            Self::Start => "start",
            Self::End => "end",
            Self::Tags => "tags",
        };
        f.write_str(name)
    }
}

/// Reasons a draft cannot become a clip.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationIssue {
    EmptyName,
    InvalidNumber { field: DraftField, value: String },
    EmptyTags,
    NegativeBound { field: DraftField, value: f64 },
    StartNotBeforeEnd { start: f64, end: f64 },
    EndBeyondDuration { end: f64, duration: f64 },
}

impl Display for ValidationIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "clip name must not be empty"),
            Self::InvalidNumber { field, value } => {
                write!(f, "{field} must be a number, got {value:?}")
            }
            Self::EmptyTags => write!(f, "tags must not be empty"),
            Self::NegativeBound { field, value } => {
                write!(f, "{field} must not be negative, got {value}")
            }
            Self::StartNotBeforeEnd { start, end } => {
                write!(f, "start ({start}s) must be before end ({end}s)")
            }
            Self::EndBeyondDuration { end, duration } => {
                write!(f, "end ({end}s) is past the video duration ({duration}s)")
            }
        }
    }
}

/// Errors produced by clip list mutations, playback control and collaborators.
#[derive(Debug)]
pub enum PlaylistError {
    Validation(ValidationIssue),
    ProtectedIndex {
        index: usize,
    },
    IndexOutOfRange {
        index: usize,
        len: usize,
    },
    StorageIo {
        context: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    StorageSerialization {
        source: serde_json::Error,
    },
    InvalidClipList {
        reason: String,
    },
    InvalidLocator {
        value: String,
    },
    InvalidConfig {
        reason: String,
    },
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },
    Media(media_ffmpeg::MediaFfmpegError),
}

impl Display for PlaylistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(issue) => write!(f, "invalid clip: {issue}"),
            Self::ProtectedIndex { index } => {
                write!(f, "clip {index} is the full video and cannot be deleted")
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "clip index {index} is out of range for {len} clips")
            }
            Self::StorageIo {
                context,
                path,
                source,
            } => write!(f, "{context}: {} ({source})", path.display()),
            Self::StorageSerialization { source } => {
                write!(f, "clip list serialization/deserialization failed ({source})")
            }
            Self::InvalidClipList { reason } => write!(f, "invalid clip list: {reason}"),
            Self::InvalidLocator { value } => write!(f, "invalid media locator: {value}"),
            Self::InvalidConfig { reason } => write!(f, "invalid configuration: {reason}"),
            Self::ConfigParse { path, source } => {
                write!(f, "failed to parse config {} ({source})", path.display())
            }
            Self::Media(err) => write!(f, "media surface error: {err}"),
        }
    }
}

impl std::error::Error for PlaylistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::StorageIo { source, .. } => Some(source),
            Self::StorageSerialization { source } => Some(source),
            Self::ConfigParse { source, .. } => Some(source),
            Self::Media(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationIssue> for PlaylistError {
    fn from(value: ValidationIssue) -> Self {
        Self::Validation(value)
    }
}

impl From<serde_json::Error> for PlaylistError {
    fn from(value: serde_json::Error) -> Self {
        Self::StorageSerialization { source: value }
    }
}

impl From<media_ffmpeg::MediaFfmpegError> for PlaylistError {
    fn from(value: media_ffmpeg::MediaFfmpegError) -> Self {
        Self::Media(value)
    }
}
