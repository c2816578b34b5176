use std::time::Duration;

use tracing::{debug, info};

use crate::clip::{Clip, ClipList};
use crate::config::PlaylistConfig;
use crate::directive::PlaybackDirective;
use crate::error::{DraftField, PlaylistError, Result};
use crate::sequencer::{PlaybackState, Sequencer, SequencerOutput, TransitionToken};
use crate::session::{ClipDraft, EditMode, EditSession, SubmitOutcome};
use crate::storage::{ClipStorage, JsonFileStorage};
use crate::store::{ClipStore, StoreOrigin};

/// Commands accepted by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetMode {
        mode: EditMode,
    },
    /// Chooses the clip targeted by Edit and Delete.
    SelectClip {
        index: usize,
    },
    UpdateDraft {
        field: DraftField,
        value: String,
    },
    /// Applies the draft according to the current mode.
    ///
    /// Rejected drafts do not fail the command: the session keeps the draft,
    /// stores the message and an [`Event::Error`] is emitted.
    Submit,
    SetFilter {
        tag: String,
    },
    ClearFilter,
    /// Plays the clip at `index` (a position in the full list, not in the
    /// filtered view). Cancels a pending auto-advance.
    PlayClip {
        index: usize,
    },
    /// The media surface finished the loaded range.
    MediaEnded,
    /// The media surface learned the source duration.
    DurationKnown {
        seconds: f64,
    },
    /// The delay scheduled by [`Event::TransitionScheduled`] elapsed.
    TransitionElapsed {
        token: TransitionToken,
    },
}

/// Events emitted by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ClipsChanged(PlaylistSnapshot),
    SessionChanged(SessionSnapshot),
    PlayRange(PlaybackDirective),
    TransitionScheduled {
        token: TransitionToken,
        delay: Duration,
    },
    TransitionCancelled {
        token: TransitionToken,
    },
    PlaybackStopped {
        index: usize,
    },
    DurationChanged {
        seconds: f64,
    },
    Error(PlaylistErrorEvent),
}

/// Error category carried by [`PlaylistErrorEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistErrorKind {
    Validation,
    ProtectedIndex,
    IndexOutOfRange,
    Storage,
    Media,
    Other,
}

impl From<&PlaylistError> for PlaylistErrorKind {
    fn from(value: &PlaylistError) -> Self {
        match value {
            PlaylistError::Validation(_) => Self::Validation,
            PlaylistError::ProtectedIndex { .. } => Self::ProtectedIndex,
            PlaylistError::IndexOutOfRange { .. } => Self::IndexOutOfRange,
            PlaylistError::StorageIo { .. } | PlaylistError::StorageSerialization { .. } => {
                Self::Storage
            }
            PlaylistError::Media(_) => Self::Media,
            _ => Self::Other,
        }
    }
}

/// User-facing error payload emitted as an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistErrorEvent {
    pub kind: PlaylistErrorKind,
    pub message: String,
}

impl PlaylistErrorEvent {
    pub fn from_error(error: &PlaylistError) -> Self {
        Self {
            kind: PlaylistErrorKind::from(error),
            message: error.to_string(),
        }
    }
}

/// Immutable view of the clip list and playback position.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistSnapshot {
    pub clips: Vec<Clip>,
    /// Positions in `clips` that pass the tag filter, in list order.
    pub visible: Vec<usize>,
    pub filter_tag: String,
    pub current_index: usize,
    pub video_duration: f64,
    pub is_transitioning: bool,
}

/// Immutable view of the edit session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub mode: EditMode,
    pub selected_index: usize,
    pub draft: ClipDraft,
    pub error_message: Option<String>,
}

/// Ties the clip store, the sequencer and the edit session together.
///
/// Commands run to completion one at a time; the controller never blocks.
#[derive(Debug)]
pub struct Controller<S> {
    store: ClipStore<S>,
    sequencer: Sequencer,
    session: EditSession,
}

impl<S> Controller<S>
where
    S: ClipStorage,
{
    /// Opens the store behind `storage` and positions playback on the first clip.
    pub fn new(storage: S, config: &PlaylistConfig) -> Result<Self> {
        let store = ClipStore::open(storage, config.default_clips())?;
        let sequencer = Sequencer::new(
            config.source_uri.clone(),
            config.transition_delay(),
            store.clips(),
        )?;
        Ok(Self {
            store,
            sequencer,
            session: EditSession::new(),
        })
    }

    pub fn clips(&self) -> &ClipList {
        self.store.clips()
    }

    pub fn store_origin(&self) -> &StoreOrigin {
        self.store.origin()
    }

    pub fn playback(&self) -> PlaybackState {
        self.sequencer.state()
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    /// Emits the initial snapshots and loads the first clip without playing it.
    pub fn start(&mut self) -> Result<Vec<Event>> {
        let mut events = vec![
            Event::ClipsChanged(self.snapshot()),
            Event::SessionChanged(self.session_snapshot()),
        ];
        let outputs = self.sequencer.start(self.store.clips())?;
        events.extend(outputs.into_iter().map(Event::from));
        Ok(events)
    }

    /// Applies one command and returns emitted events.
    pub fn handle_command(&mut self, command: Command) -> Result<Vec<Event>> {
        match command {
            Command::SetMode { mode } => {
                self.session.set_mode(mode, self.store.clips())?;
                Ok(vec![Event::SessionChanged(self.session_snapshot())])
            }
            Command::SelectClip { index } => {
                self.session.select(index, self.store.clips())?;
                Ok(vec![Event::SessionChanged(self.session_snapshot())])
            }
            Command::UpdateDraft { field, value } => {
                self.session.update_draft(field, value);
                Ok(vec![Event::SessionChanged(self.session_snapshot())])
            }
            Command::Submit => self.submit(),
            Command::SetFilter { tag } => {
                self.session.set_filter(&tag);
                Ok(vec![Event::ClipsChanged(self.snapshot())])
            }
            Command::ClearFilter => {
                self.session.clear_filter();
                Ok(vec![Event::ClipsChanged(self.snapshot())])
            }
            Command::PlayClip { index } => {
                let outputs = self.sequencer.select(index, self.store.clips())?;
                Ok(self.playback_events(outputs))
            }
            Command::MediaEnded => {
                let outputs = self.sequencer.on_media_ended(self.store.clips());
                Ok(self.playback_events(outputs))
            }
            Command::DurationKnown { seconds } => {
                if self.sequencer.on_duration_known(seconds) {
                    Ok(vec![
                        Event::DurationChanged { seconds },
                        Event::ClipsChanged(self.snapshot()),
                    ])
                } else {
                    Ok(Vec::new())
                }
            }
            Command::TransitionElapsed { token } => {
                let outputs = self
                    .sequencer
                    .on_transition_elapsed(token, self.store.clips())?;
                Ok(self.playback_events(outputs))
            }
        }
    }

    /// Maps sequencer outputs to events, followed by a fresh snapshot when
    /// the playback position or phase changed.
    fn playback_events(&self, outputs: Vec<SequencerOutput>) -> Vec<Event> {
        if outputs.is_empty() {
            return Vec::new();
        }
        let mut events: Vec<Event> = outputs.into_iter().map(Event::from).collect();
        events.push(Event::ClipsChanged(self.snapshot()));
        events
    }

    /// Creates an immutable snapshot of the list and playback position.
    pub fn snapshot(&self) -> PlaylistSnapshot {
        let clips = self.store.clips();
        PlaylistSnapshot {
            clips: clips.as_slice().to_vec(),
            visible: self.session.visible_indices(clips),
            filter_tag: self.session.filter_tag().to_string(),
            current_index: self.sequencer.current_index(),
            video_duration: self.sequencer.video_duration(),
            is_transitioning: self.sequencer.is_transitioning(),
        }
    }

    /// Creates an immutable snapshot of the edit session.
    pub fn session_snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            mode: self.session.mode(),
            selected_index: self.session.selected_index(),
            draft: self.session.draft().clone(),
            error_message: self.session.error_message().map(str::to_owned),
        }
    }

    fn submit(&mut self) -> Result<Vec<Event>> {
        let video_duration = self.sequencer.video_duration();
        match self.session.submit(&mut self.store, video_duration) {
            Ok(outcome) => {
                if let SubmitOutcome::Deleted { index } = outcome {
                    self.sequencer.on_clip_removed(index, self.store.clips().len());
                    info!(
                        removed = index,
                        current_index = self.sequencer.current_index(),
                        "playback position adjusted after delete"
                    );
                }
                Ok(vec![
                    Event::ClipsChanged(self.snapshot()),
                    Event::SessionChanged(self.session_snapshot()),
                ])
            }
            Err(error @ (PlaylistError::Validation(_) | PlaylistError::ProtectedIndex { .. })) => {
                debug!(%error, "submit recovered locally");
                Ok(vec![
                    Event::SessionChanged(self.session_snapshot()),
                    Event::Error(PlaylistErrorEvent::from_error(&error)),
                ])
            }
            Err(error) => Err(error),
        }
    }
}

impl Controller<JsonFileStorage> {
    /// Creates a controller persisting to the file slot named by `config`.
    pub fn with_file_storage(config: &PlaylistConfig) -> Result<Self> {
        Self::new(config.file_storage(), config)
    }
}

impl From<SequencerOutput> for Event {
    fn from(value: SequencerOutput) -> Self {
        match value {
            SequencerOutput::Play(directive) => Self::PlayRange(directive),
            SequencerOutput::ScheduleAdvance { token, delay } => {
                Self::TransitionScheduled { token, delay }
            }
            SequencerOutput::CancelAdvance { token } => Self::TransitionCancelled { token },
            SequencerOutput::Stopped { index } => Self::PlaybackStopped { index },
        }
    }
}
