use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::PlaylistError;

/// Source reference plus the `#t=start,end` range fragment.
///
/// # Example
/// ```
/// use playlist::MediaLocator;
///
/// let locator = MediaLocator::new("trailer.mp4", 0.0, 10.5);
/// assert_eq!(locator.to_string(), "trailer.mp4#t=0,10.5");
/// assert_eq!("trailer.mp4#t=0,10.5".parse::<MediaLocator>().unwrap(), locator);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MediaLocator {
    pub base: String,
    pub start: f64,
    pub end: f64,
}

impl MediaLocator {
    pub fn new(base: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            base: base.into(),
            start,
            end,
        }
    }
}

impl Display for MediaLocator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#t={},{}", self.base, self.start, self.end)
    }
}

impl FromStr for MediaLocator {
    type Err = PlaylistError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || PlaylistError::InvalidLocator {
            value: value.to_string(),
        };

        let (base, fragment) = value.rsplit_once('#').ok_or_else(invalid)?;
        let range = fragment.strip_prefix("t=").ok_or_else(invalid)?;
        let (start, end) = range.split_once(',').ok_or_else(invalid)?;
        let start = start.trim().parse::<f64>().map_err(|_| invalid())?;
        let end = end.trim().parse::<f64>().map_err(|_| invalid())?;
        if base.is_empty() || !start.is_finite() || !end.is_finite() {
            return Err(invalid());
        }

        Ok(Self::new(base, start, end))
    }
}

/// Instruction for the media surface to load one clip's range.
///
/// `sequence` increases with every issued directive so a surface reloads
/// even when the locator text repeats. `autoplay` is false only for the
/// directive issued at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackDirective {
    pub clip_index: usize,
    pub sequence: u64,
    pub autoplay: bool,
    pub locator: MediaLocator,
}
