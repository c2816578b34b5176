use tracing::{debug, info, warn};

use crate::clip::{Clip, ClipList};
use crate::error::{PlaylistError, Result};
use crate::storage::ClipStorage;

/// Where the store's initial list came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOrigin {
    /// The slot held a well-formed list.
    Persisted,
    /// The slot was empty; the default list was used.
    Default,
    /// The slot held malformed data; the default list replaced it.
    Recovered { reason: String },
}

/// Canonical clip list synchronized with a [`ClipStorage`] slot.
///
/// Every successful mutation writes the whole list to storage before it
/// becomes visible; a failed write leaves the list unchanged.
#[derive(Debug)]
pub struct ClipStore<S> {
    storage: S,
    clips: ClipList,
    origin: StoreOrigin,
}

impl<S> ClipStore<S>
where
    S: ClipStorage,
{
    /// Loads the persisted list, falling back to `default` when the slot is
    /// empty or malformed. A fallback list is written back to the slot.
    pub fn open(storage: S, default: ClipList) -> Result<Self> {
        let (clips, origin) = match storage.load() {
            Ok(Some(clips)) => match clips.validate() {
                Ok(()) => (clips, StoreOrigin::Persisted),
                Err(error) => (default, recovered(error)),
            },
            Ok(None) => (default, StoreOrigin::Default),
            Err(error @ PlaylistError::StorageSerialization { .. }) => (default, recovered(error)),
            Err(error) => return Err(error),
        };

        if origin != StoreOrigin::Persisted {
            storage.save(&clips)?;
        }

        info!(clip_count = clips.len(), origin = ?origin, "clip store opened");
        Ok(Self {
            storage,
            clips,
            origin,
        })
    }

    pub fn clips(&self) -> &ClipList {
        &self.clips
    }

    pub fn origin(&self) -> &StoreOrigin {
        &self.origin
    }

    /// Appends `clip` as the last clip. Validation is the caller's job.
    pub fn append(&mut self, clip: Clip) -> Result<&ClipList> {
        let updated = self.clips.with_appended(clip);
        self.commit(updated, "append")
    }

    /// Replaces the clip at `index`.
    pub fn replace_at(&mut self, index: usize, clip: Clip) -> Result<&ClipList> {
        let updated = self.clips.with_replaced(index, clip).inspect_err(|error| {
            warn!(index, %error, "replace rejected");
        })?;
        self.commit(updated, "replace")
    }

    /// Removes the clip at `index`; the full-video clip is protected.
    pub fn remove_at(&mut self, index: usize) -> Result<&ClipList> {
        let updated = self.clips.with_removed(index).inspect_err(|error| {
            warn!(index, %error, "remove rejected");
        })?;
        self.commit(updated, "remove")
    }

    fn commit(&mut self, updated: ClipList, operation: &'static str) -> Result<&ClipList> {
        self.storage.save(&updated)?;
        debug!(
            operation,
            previous_count = self.clips.len(),
            clip_count = updated.len(),
            "clip list persisted"
        );
        self.clips = updated;
        Ok(&self.clips)
    }
}

fn recovered(error: PlaylistError) -> StoreOrigin {
    warn!(%error, "persisted clip list is malformed, using the default list");
    StoreOrigin::Recovered {
        reason: error.to_string(),
    }
}
