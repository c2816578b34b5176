use std::process::Command;

use tracing::debug;

use crate::error::{MediaFfmpegError, Result, Tool};

/// Probes the container duration of `source` in seconds via `ffprobe`.
///
/// `source` may be a local path or any URL `ffprobe` can open. Returns
/// `Ok(None)` when the container does not report a duration.
///
/// # Example
/// ```no_run
/// use media_ffmpeg::probe_duration_seconds;
///
/// let duration = probe_duration_seconds("sample.mp4").expect("probe should succeed");
/// assert!(duration.is_some());
/// ```
pub fn probe_duration_seconds(source: &str) -> Result<Option<f64>> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=nokey=1:noprint_wrappers=1",
        ])
        .arg(source)
        .output()
        .map_err(|source| MediaFfmpegError::Process {
            tool: Tool::Ffprobe,
            action: "spawn",
            source,
        })?;

    if !output.status.success() {
        return Err(MediaFfmpegError::ToolFailed {
            tool: Tool::Ffprobe,
            target: source.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    let stdout =
        String::from_utf8(output.stdout).map_err(|source| MediaFfmpegError::NonUtf8Output {
            tool: Tool::Ffprobe,
            source,
        })?;
    let duration = parse_duration_output(&stdout)?;
    debug!(source, duration = ?duration, "probed source duration");
    Ok(duration)
}

fn parse_duration_output(stdout: &str) -> Result<Option<f64>> {
    let value = stdout.trim();
    if value.is_empty() || value == "N/A" {
        return Ok(None);
    }

    let duration = value.parse::<f64>().map_err(|_| MediaFfmpegError::BadDuration {
        value: value.to_string(),
    })?;
    if !duration.is_finite() || duration < 0.0 {
        return Err(MediaFfmpegError::BadDuration {
            value: value.to_string(),
        });
    }
    Ok(Some(duration))
}

#[cfg(test)]
mod tests {
    use super::parse_duration_output;

    #[test]
    fn parses_trimmed_duration_seconds() {
        let duration = parse_duration_output("52.208333\n").expect("valid duration");
        assert_eq!(duration, Some(52.208333));
    }

    #[test]
    fn missing_duration_is_reported_as_none() {
        assert_eq!(parse_duration_output("N/A\n").expect("n/a"), None);
        assert_eq!(parse_duration_output("  ").expect("empty"), None);
    }

    #[test]
    fn garbage_and_negative_durations_are_rejected() {
        assert!(parse_duration_output("abc").is_err());
        assert!(parse_duration_output("-3.0").is_err());
    }
}
