//! UI-agnostic clip playlist and playback controller.

pub mod api;
pub mod bridge;
pub mod clip;
pub mod config;
pub mod directive;
pub mod error;
pub mod media;
pub mod sequencer;
pub mod session;
pub mod storage;
pub mod store;

pub use api::{
    Command, Controller, Event, PlaylistErrorEvent, PlaylistErrorKind, PlaylistSnapshot,
    SessionSnapshot,
};
pub use bridge::{
    ControllerCommandSender, ControllerEventReceiver, spawn_controller_bridge,
    spawn_ffplay_bridge,
};
pub use clip::{Clip, ClipList};
pub use config::PlaylistConfig;
pub use directive::{MediaLocator, PlaybackDirective};
pub use error::{DraftField, PlaylistError, Result, ValidationIssue};
pub use media::{FfplayMediaSurface, MediaNotification, MediaSurface};
pub use media_ffmpeg::probe_duration_seconds;
pub use sequencer::{PlaybackState, TransitionToken};
pub use session::{ClipDraft, EditMode};
pub use storage::{ClipStorage, JsonFileStorage, MemoryStorage};
pub use store::StoreOrigin;
