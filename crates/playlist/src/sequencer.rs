//! Playback sequencing: which clip is current and how playback advances.
//!
//! The sequencer is a state machine over [`SequencerPhase`]. It never owns a
//! clock: when a clip ends it asks its owner to schedule a delayed advance
//! identified by a [`TransitionToken`], and advances only when that same token
//! is delivered back. Any other token is stale and ignored, which is how an
//! explicit selection cancels a pending advance.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::clip::{Clip, ClipList};
use crate::directive::{MediaLocator, PlaybackDirective};
use crate::error::{PlaylistError, Result};

/// Identifies one scheduled advance.
pub type TransitionToken = u64;

/// Sequencer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerPhase {
    Idle,
    Playing,
    Transitioning {
        token: TransitionToken,
        successor: usize,
    },
}

/// Side effects requested by a sequencer transition.
#[derive(Debug, Clone, PartialEq)]
pub enum SequencerOutput {
    Play(PlaybackDirective),
    ScheduleAdvance {
        token: TransitionToken,
        delay: Duration,
    },
    CancelAdvance {
        token: TransitionToken,
    },
    Stopped {
        index: usize,
    },
}

/// Observable playback state.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub current_clip: Clip,
    pub current_index: usize,
    pub video_duration: f64,
    pub is_transitioning: bool,
}

/// Tracks the current clip and drives auto-advance between clips.
#[derive(Debug)]
pub struct Sequencer {
    source_uri: String,
    delay: Duration,
    phase: SequencerPhase,
    current_clip: Clip,
    current_index: usize,
    // The clip at `current_index` slid into the slot of a removed current clip.
    detached: bool,
    video_duration: f64,
    next_token: TransitionToken,
    next_sequence: u64,
}

impl Sequencer {
    /// Creates an idle sequencer positioned on the first clip.
    pub fn new(source_uri: impl Into<String>, delay: Duration, clips: &ClipList) -> Result<Self> {
        let current_clip = clips
            .get(0)
            .cloned()
            .ok_or(PlaylistError::IndexOutOfRange { index: 0, len: 0 })?;
        Ok(Self {
            source_uri: source_uri.into(),
            delay,
            phase: SequencerPhase::Idle,
            current_clip,
            current_index: 0,
            detached: false,
            video_duration: 0.0,
            next_token: 1,
            next_sequence: 1,
        })
    }

    pub fn phase(&self) -> SequencerPhase {
        self.phase
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn video_duration(&self) -> f64 {
        self.video_duration
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self.phase, SequencerPhase::Transitioning { .. })
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            current_clip: self.current_clip.clone(),
            current_index: self.current_index,
            video_duration: self.video_duration,
            is_transitioning: self.is_transitioning(),
        }
    }

    /// Loads the first clip without starting playback.
    pub fn start(&mut self, clips: &ClipList) -> Result<Vec<SequencerOutput>> {
        self.enter_playing(0, clips, false)
    }

    /// Plays the clip at `index` on explicit user request.
    ///
    /// A pending advance is cancelled first.
    pub fn select(&mut self, index: usize, clips: &ClipList) -> Result<Vec<SequencerOutput>> {
        if index >= clips.len() {
            return Err(PlaylistError::IndexOutOfRange {
                index,
                len: clips.len(),
            });
        }

        let mut outputs = Vec::new();
        if let SequencerPhase::Transitioning { token, .. } = self.phase {
            debug!(token, index, "pending advance cancelled by selection");
            outputs.push(SequencerOutput::CancelAdvance { token });
        }
        outputs.extend(self.enter_playing(index, clips, true)?);
        Ok(outputs)
    }

    /// Handles the media surface's "ended" notification.
    pub fn on_media_ended(&mut self, clips: &ClipList) -> Vec<SequencerOutput> {
        if self.phase != SequencerPhase::Playing {
            debug!(phase = ?self.phase, "ended ignored outside of playback");
            return Vec::new();
        }

        let successor = if self.detached {
            self.current_index
        } else {
            self.current_index + 1
        };
        if successor >= clips.len() {
            self.phase = SequencerPhase::Idle;
            info!(index = self.current_index, "last clip ended");
            return vec![SequencerOutput::Stopped {
                index: self.current_index,
            }];
        }

        let token = self.next_token;
        self.next_token += 1;
        self.phase = SequencerPhase::Transitioning { token, successor };
        debug!(
            token,
            from_index = self.current_index,
            successor,
            delay_ms = self.delay.as_millis() as u64,
            "advance scheduled"
        );
        vec![SequencerOutput::ScheduleAdvance {
            token,
            delay: self.delay,
        }]
    }

    /// Handles the delay timer firing for `token`.
    ///
    /// The successor captured when the clip ended is re-checked against the
    /// current list; if it no longer exists playback stops.
    pub fn on_transition_elapsed(
        &mut self,
        token: TransitionToken,
        clips: &ClipList,
    ) -> Result<Vec<SequencerOutput>> {
        let SequencerPhase::Transitioning {
            token: pending,
            successor,
        } = self.phase
        else {
            debug!(token, "transition elapsed with nothing pending");
            return Ok(Vec::new());
        };
        if pending != token {
            debug!(token, pending, "stale transition token ignored");
            return Ok(Vec::new());
        }

        if successor >= clips.len() {
            self.phase = SequencerPhase::Idle;
            warn!(
                successor,
                clip_count = clips.len(),
                "successor vanished during transition, stopping"
            );
            return Ok(vec![SequencerOutput::Stopped {
                index: self.current_index,
            }]);
        }

        self.enter_playing(successor, clips, true)
    }

    /// Keeps the current position aligned after the clip at `index` was
    /// removed, leaving `remaining` clips.
    ///
    /// A pending transition keeps the successor it captured. Removing the
    /// current clip when it was last moves the position onto the new last
    /// clip, so the next "ended" stops playback.
    pub fn on_clip_removed(&mut self, index: usize, remaining: usize) {
        if self.is_transitioning() {
            return;
        }
        if index < self.current_index {
            self.current_index -= 1;
        } else if index == self.current_index {
            if self.current_index >= remaining {
                self.current_index = remaining.saturating_sub(1);
            } else {
                self.detached = true;
            }
        }
    }

    /// Records the source duration reported by the media surface.
    ///
    /// Returns false when the value was rejected or unchanged.
    pub fn on_duration_known(&mut self, seconds: f64) -> bool {
        if !seconds.is_finite() || seconds < 0.0 {
            warn!(seconds, "ignoring invalid video duration");
            return false;
        }
        if seconds == self.video_duration {
            return false;
        }
        self.video_duration = seconds;
        debug!(seconds, "video duration known");
        true
    }

    fn enter_playing(
        &mut self,
        index: usize,
        clips: &ClipList,
        autoplay: bool,
    ) -> Result<Vec<SequencerOutput>> {
        let clip = clips.get(index).ok_or(PlaylistError::IndexOutOfRange {
            index,
            len: clips.len(),
        })?;

        self.current_clip = clip.clone();
        self.current_index = index;
        self.detached = false;
        self.phase = SequencerPhase::Playing;

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        let directive = PlaybackDirective {
            clip_index: index,
            sequence,
            autoplay,
            locator: MediaLocator::new(self.source_uri.clone(), clip.start, clip.end),
        };
        info!(
            index,
            sequence,
            autoplay,
            locator = %directive.locator,
            "playback directive issued"
        );
        Ok(vec![SequencerOutput::Play(directive)])
    }
}
