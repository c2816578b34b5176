use media_ffmpeg::{FfplayProcess, PlayRangeRequest, probe_duration_seconds};
use tracing::{debug, warn};

use crate::directive::PlaybackDirective;
use crate::error::Result;

/// Notifications a media surface reports back to the playlist.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaNotification {
    Ended,
    DurationKnown { seconds: f64 },
}

/// Media playback operations required by the playlist runtime.
pub trait MediaSurface {
    /// Loads a directive, replacing whatever was loaded before.
    fn load(&mut self, directive: &PlaybackDirective) -> Result<()>;

    /// Starts playing the loaded range.
    fn play(&mut self) -> Result<()>;

    /// Drains notifications produced since the last poll.
    fn poll_notifications(&mut self) -> Result<Vec<MediaNotification>>;
}

/// `ffplay`-backed surface used by production wiring.
///
/// Each play spawns one player process limited to the clip range; the
/// process exiting on its own is reported as [`MediaNotification::Ended`].
#[derive(Debug, Default)]
pub struct FfplayMediaSurface {
    loaded: Option<PlaybackDirective>,
    player: Option<FfplayProcess>,
    probed_base: Option<String>,
    pending: Vec<MediaNotification>,
}

impl FfplayMediaSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn probe_once(&mut self, base: &str) {
        if self.probed_base.as_deref() == Some(base) {
            return;
        }
        self.probed_base = Some(base.to_string());

        match probe_duration_seconds(base) {
            Ok(Some(seconds)) => self
                .pending
                .push(MediaNotification::DurationKnown { seconds }),
            Ok(None) => debug!(base, "source reports no duration"),
            Err(error) => warn!(base, %error, "duration probe failed"),
        }
    }
}

impl MediaSurface for FfplayMediaSurface {
    fn load(&mut self, directive: &PlaybackDirective) -> Result<()> {
        if let Some(mut player) = self.player.take() {
            player.stop()?;
        }
        self.probe_once(&directive.locator.base);
        self.loaded = Some(directive.clone());
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        let Some(directive) = &self.loaded else {
            debug!("play requested with nothing loaded");
            return Ok(());
        };
        if let Some(mut player) = self.player.take() {
            player.stop()?;
        }

        let request = PlayRangeRequest {
            source: directive.locator.base.clone(),
            start: directive.locator.start,
            end: directive.locator.end,
            title: Some(directive.locator.to_string()),
        };
        self.player = Some(FfplayProcess::spawn(&request)?);
        Ok(())
    }

    fn poll_notifications(&mut self) -> Result<Vec<MediaNotification>> {
        let finished = match self.player.as_mut() {
            Some(player) => player.try_finished()?.is_some(),
            None => false,
        };
        if finished {
            self.player = None;
            self.pending.push(MediaNotification::Ended);
        }
        Ok(std::mem::take(&mut self.pending))
    }
}
