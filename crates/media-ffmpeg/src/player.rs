use std::process::{Child, Command, ExitStatus, Stdio};

use tracing::{debug, warn};

use crate::error::{MediaFfmpegError, Result, Tool};

/// Request payload for playing one time range of a source with `ffplay`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayRangeRequest {
    pub source: String,
    pub start: f64,
    pub end: f64,
    pub title: Option<String>,
}

/// Builds the `ffplay` argument list for a range request.
///
/// The player seeks to `start`, plays `end - start` seconds and exits.
///
/// # Example
/// ```
/// use media_ffmpeg::{PlayRangeRequest, ffplay_args};
///
/// let args = ffplay_args(&PlayRangeRequest {
///     source: "demo.mp4".to_string(),
///     start: 1.5,
///     end: 4.0,
///     title: None,
/// })
/// .expect("valid range");
/// assert!(args.windows(2).any(|pair| pair == ["-t", "2.5"]));
/// ```
pub fn ffplay_args(request: &PlayRangeRequest) -> Result<Vec<String>> {
    let PlayRangeRequest {
        source, start, end, ..
    } = request;
    if !start.is_finite() || !end.is_finite() || *start < 0.0 || start >= end {
        return Err(MediaFfmpegError::InvalidRange {
            start: *start,
            end: *end,
        });
    }

    let mut args = vec![
        "-hide_banner".to_string(),
        "-v".to_string(),
        "error".to_string(),
        "-autoexit".to_string(),
        "-ss".to_string(),
        start.to_string(),
        "-t".to_string(),
        (end - start).to_string(),
    ];
    if let Some(title) = &request.title {
        args.push("-window_title".to_string());
        args.push(title.clone());
    }
    args.push(source.clone());
    Ok(args)
}

/// A running `ffplay` process.
///
/// The process is killed when the handle is dropped.
#[derive(Debug)]
pub struct FfplayProcess {
    child: Child,
    finished: Option<ExitStatus>,
}

impl FfplayProcess {
    /// Spawns `ffplay` for the requested range.
    pub fn spawn(request: &PlayRangeRequest) -> Result<Self> {
        let args = ffplay_args(request)?;
        let child = Command::new("ffplay")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| MediaFfmpegError::Process {
                tool: Tool::Ffplay,
                action: "spawn",
                source,
            })?;

        debug!(
            pid = child.id(),
            source = %request.source,
            start = request.start,
            end = request.end,
            "ffplay started"
        );
        Ok(Self {
            child,
            finished: None,
        })
    }

    /// Returns the exit status once the player has exited.
    pub fn try_finished(&mut self) -> Result<Option<ExitStatus>> {
        if let Some(status) = self.finished {
            return Ok(Some(status));
        }

        let status = self
            .child
            .try_wait()
            .map_err(|source| MediaFfmpegError::Process {
                tool: Tool::Ffplay,
                action: "poll",
                source,
            })?;
        if let Some(status) = status {
            debug!(pid = self.child.id(), %status, "ffplay exited");
            self.finished = Some(status);
        }
        Ok(status)
    }

    /// Stops the player if it is still running.
    pub fn stop(&mut self) -> Result<()> {
        if self.finished.is_some() {
            return Ok(());
        }

        match self.child.kill() {
            Ok(()) => {}
            Err(source) if source.kind() == std::io::ErrorKind::InvalidInput => {}
            Err(source) => {
                return Err(MediaFfmpegError::Process {
                    tool: Tool::Ffplay,
                    action: "kill",
                    source,
                });
            }
        }
        let status = self.child.wait().map_err(|source| MediaFfmpegError::Process {
            tool: Tool::Ffplay,
            action: "wait for",
            source,
        })?;
        self.finished = Some(status);
        Ok(())
    }
}

impl Drop for FfplayProcess {
    fn drop(&mut self) {
        if let Err(error) = self.stop() {
            warn!(%error, "failed to stop ffplay");
        }
    }
}
