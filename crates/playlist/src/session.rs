use tracing::{debug, info, warn};

use crate::clip::{Clip, ClipList, FULL_VIDEO_INDEX, format_tags, parse_tags};
use crate::error::{DraftField, PlaylistError, Result, ValidationIssue};
use crate::storage::ClipStorage;
use crate::store::ClipStore;

/// What `submit` does with the draft.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditMode {
    #[default]
    Add,
    Edit,
    Delete,
}

/// Staged, not yet committed field values as the user typed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipDraft {
    pub name: String,
    pub start: String,
    pub end: String,
    pub tags: String,
}

impl ClipDraft {
    /// Fills a draft with an existing clip's values.
    pub fn from_clip(clip: &Clip) -> Self {
        Self {
            name: clip.name.clone(),
            start: clip.start.to_string(),
            end: clip.end.to_string(),
            tags: format_tags(&clip.tags),
        }
    }

    pub fn set(&mut self, field: DraftField, value: String) {
        match field {
            DraftField::Name => self.name = value,
            DraftField::Start => self.start = value,
            DraftField::End => self.end = value,
            DraftField::Tags => self.tags = value,
        }
    }

    /// Validates the draft against the known video duration and builds a clip.
    ///
    /// # Example
    /// ```
    /// use playlist::session::ClipDraft;
    ///
    /// let draft = ClipDraft {
    ///     name: "Intro".to_string(),
    ///     start: "0".to_string(),
    ///     end: "10".to_string(),
    ///     tags: "a, b".to_string(),
    /// };
    /// let clip = draft.to_clip(52.0).expect("valid draft");
    /// assert_eq!(clip.tags, vec!["a", "b"]);
    /// assert!(draft.to_clip(5.0).is_err());
    /// ```
    pub fn to_clip(&self, video_duration: f64) -> std::result::Result<Clip, ValidationIssue> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationIssue::EmptyName);
        }
        let start = parse_seconds(DraftField::Start, &self.start)?;
        let end = parse_seconds(DraftField::End, &self.end)?;
        if self.tags.is_empty() {
            return Err(ValidationIssue::EmptyTags);
        }
        let tags = parse_tags(&self.tags);
        if start < 0.0 {
            return Err(ValidationIssue::NegativeBound {
                field: DraftField::Start,
                value: start,
            });
        }
        if end < 0.0 {
            return Err(ValidationIssue::NegativeBound {
                field: DraftField::End,
                value: end,
            });
        }
        if start >= end {
            return Err(ValidationIssue::StartNotBeforeEnd { start, end });
        }
        if end > video_duration {
            return Err(ValidationIssue::EndBeyondDuration {
                end,
                duration: video_duration,
            });
        }

        Ok(Clip {
            name: name.to_string(),
            start,
            end,
            tags,
        })
    }
}

fn parse_seconds(field: DraftField, raw: &str) -> std::result::Result<f64, ValidationIssue> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ValidationIssue::InvalidNumber {
            field,
            value: raw.to_string(),
        })
}

/// Result of a successful submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Added { index: usize },
    Edited { index: usize },
    Deleted { index: usize },
}

/// Add/edit/delete mode selector, draft staging and the tag filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditSession {
    mode: EditMode,
    selected_index: usize,
    draft: ClipDraft,
    error_message: Option<String>,
    filter_tag: String,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    pub fn draft(&self) -> &ClipDraft {
        &self.draft
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn filter_tag(&self) -> &str {
        &self.filter_tag
    }

    /// Switches mode. Entering Edit loads the selected clip into the draft;
    /// entering Add or Delete clears it.
    pub fn set_mode(&mut self, mode: EditMode, clips: &ClipList) -> Result<()> {
        self.mode = mode;
        self.error_message = None;
        self.sync_draft(clips)?;
        debug!(mode = ?mode, selected_index = self.selected_index, "edit mode changed");
        Ok(())
    }

    /// Chooses the clip targeted by Edit and Delete.
    pub fn select(&mut self, index: usize, clips: &ClipList) -> Result<()> {
        if index >= clips.len() {
            return Err(PlaylistError::IndexOutOfRange {
                index,
                len: clips.len(),
            });
        }
        self.selected_index = index;
        self.sync_draft(clips)
    }

    pub fn update_draft(&mut self, field: DraftField, value: String) {
        self.draft.set(field, value);
    }

    /// Applies the draft according to the current mode.
    ///
    /// On failure the error message is set and the draft is kept for
    /// correction. On success the draft is cleared.
    pub fn submit<S>(
        &mut self,
        store: &mut ClipStore<S>,
        video_duration: f64,
    ) -> Result<SubmitOutcome>
    where
        S: ClipStorage,
    {
        match self.apply(store, video_duration) {
            Ok(outcome) => {
                self.draft = ClipDraft::default();
                self.error_message = None;
                info!(outcome = ?outcome, clip_count = store.clips().len(), "submit applied");
                Ok(outcome)
            }
            Err(error) => {
                warn!(mode = ?self.mode, %error, "submit rejected");
                self.error_message = Some(error.to_string());
                Err(error)
            }
        }
    }

    fn apply<S>(&mut self, store: &mut ClipStore<S>, video_duration: f64) -> Result<SubmitOutcome>
    where
        S: ClipStorage,
    {
        match self.mode {
            EditMode::Add => {
                let clip = self.draft.to_clip(video_duration)?;
                let clips = store.append(clip)?;
                Ok(SubmitOutcome::Added {
                    index: clips.len() - 1,
                })
            }
            EditMode::Edit => {
                let clip = self.draft.to_clip(video_duration)?;
                let index = self.selected_index;
                store.replace_at(index, clip)?;
                Ok(SubmitOutcome::Edited { index })
            }
            EditMode::Delete => {
                let index = self.selected_index;
                if index == FULL_VIDEO_INDEX {
                    return Err(PlaylistError::ProtectedIndex { index });
                }
                store.remove_at(index)?;
                self.selected_index = FULL_VIDEO_INDEX;
                Ok(SubmitOutcome::Deleted { index })
            }
        }
    }

    /// Sets the tag filter; surrounding whitespace is ignored.
    pub fn set_filter(&mut self, tag: &str) {
        self.filter_tag = tag.trim().to_string();
    }

    pub fn clear_filter(&mut self) {
        self.filter_tag.clear();
    }

    /// Returns the clips visible under the current filter.
    pub fn filtered_view(&self, clips: &ClipList) -> ClipList {
        clips.filtered(&self.filter_tag)
    }

    /// Returns the list positions visible under the current filter.
    pub fn visible_indices(&self, clips: &ClipList) -> Vec<usize> {
        clips.filtered_indices(&self.filter_tag)
    }

    fn sync_draft(&mut self, clips: &ClipList) -> Result<()> {
        self.draft = match self.mode {
            EditMode::Edit => {
                let clip = clips
                    .get(self.selected_index)
                    .ok_or(PlaylistError::IndexOutOfRange {
                        index: self.selected_index,
                        len: clips.len(),
                    })?;
                ClipDraft::from_clip(clip)
            }
            EditMode::Add | EditMode::Delete => ClipDraft::default(),
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ClipDraft, EditMode, EditSession, SubmitOutcome};
    use crate::clip::{Clip, ClipList};
    use crate::error::{DraftField, PlaylistError, ValidationIssue};
    use crate::storage::MemoryStorage;
    use crate::store::ClipStore;

    fn open_store() -> (ClipStore<MemoryStorage>, MemoryStorage) {
        let storage = MemoryStorage::new();
        let store = ClipStore::open(storage.clone(), ClipList::with_full_video("Full video", 52.0))
            .expect("open");
        (store, storage)
    }

    fn fill(session: &mut EditSession, name: &str, start: &str, end: &str, tags: &str) {
        session.update_draft(DraftField::Name, name.to_string());
        session.update_draft(DraftField::Start, start.to_string());
        session.update_draft(DraftField::End, end.to_string());
        session.update_draft(DraftField::Tags, tags.to_string());
    }

    fn draft(name: &str, start: &str, end: &str, tags: &str) -> ClipDraft {
        ClipDraft {
            name: name.to_string(),
            start: start.to_string(),
            end: end.to_string(),
            tags: tags.to_string(),
        }
    }

    #[test]
    fn add_appends_clip_with_parsed_tags() {
        let (mut store, _) = open_store();
        let mut session = EditSession::new();
        fill(&mut session, "Intro", "0", "10", "a, b");

        let outcome = session.submit(&mut store, 52.0).expect("submit");

        assert_eq!(outcome, SubmitOutcome::Added { index: 1 });
        assert_eq!(
            store.clips().get(1),
            Some(&Clip {
                name: "Intro".to_string(),
                start: 0.0,
                end: 10.0,
                tags: vec!["a".to_string(), "b".to_string()],
            })
        );
        assert_eq!(session.draft(), &ClipDraft::default());
        assert_eq!(session.error_message(), None);
    }

    #[test]
    fn reversed_bounds_are_rejected_and_draft_is_kept() {
        let (mut store, storage) = open_store();
        let mut session = EditSession::new();
        fill(&mut session, "Bad", "10", "5", "x");

        let result = session.submit(&mut store, 52.0);

        assert!(matches!(
            result,
            Err(PlaylistError::Validation(ValidationIssue::StartNotBeforeEnd { .. }))
        ));
        assert_eq!(store.clips().len(), 1);
        assert_eq!(storage.save_count(), 1);
        assert_eq!(session.draft(), &draft("Bad", "10", "5", "x"));
        assert!(session.error_message().is_some());
    }

    #[test]
    fn validation_covers_every_field_rule() {
        let cases = [
            (draft("", "0", "1", "a"), ValidationIssue::EmptyName),
            (
                draft("n", "x", "1", "a"),
                ValidationIssue::InvalidNumber {
                    field: DraftField::Start,
                    value: "x".to_string(),
                },
            ),
            (
                draft("n", "0", "NaN", "a"),
                ValidationIssue::InvalidNumber {
                    field: DraftField::End,
                    value: "NaN".to_string(),
                },
            ),
            (draft("n", "0", "1", ""), ValidationIssue::EmptyTags),
            (
                draft("n", "-1", "1", "a"),
                ValidationIssue::NegativeBound {
                    field: DraftField::Start,
                    value: -1.0,
                },
            ),
            (
                draft("n", "0", "0", "a"),
                ValidationIssue::StartNotBeforeEnd {
                    start: 0.0,
                    end: 0.0,
                },
            ),
            (
                draft("n", "0", "60", "a"),
                ValidationIssue::EndBeyondDuration {
                    end: 60.0,
                    duration: 52.0,
                },
            ),
        ];

        for (draft, expected) in cases {
            assert_eq!(draft.to_clip(52.0), Err(expected), "{draft:?}");
        }
    }

    #[test]
    fn unknown_duration_rejects_every_add() {
        assert!(matches!(
            draft("n", "0", "1", "a").to_clip(0.0),
            Err(ValidationIssue::EndBeyondDuration { .. })
        ));
    }

    #[test]
    fn separator_only_tags_add_clip_without_tags() {
        let (mut store, _) = open_store();
        let mut session = EditSession::new();
        fill(&mut session, "X", "0", "5", ",");

        let outcome = session.submit(&mut store, 52.0).expect("submit");

        assert_eq!(outcome, SubmitOutcome::Added { index: 1 });
        assert_eq!(store.clips().len(), 2);
        assert_eq!(store.clips().get(1).map(|clip| clip.tags.len()), Some(0));
    }

    #[test]
    fn entering_edit_populates_draft_from_selected_clip() {
        let (mut store, _) = open_store();
        let mut session = EditSession::new();
        fill(&mut session, "Intro", "0", "10.5", "a,b");
        session.submit(&mut store, 52.0).expect("add");

        session.select(1, store.clips()).expect("select");
        session.set_mode(EditMode::Edit, store.clips()).expect("mode");

        assert_eq!(session.draft(), &draft("Intro", "0", "10.5", "a, b"));

        session.select(0, store.clips()).expect("select");
        assert_eq!(session.draft(), &draft("Full video", "0", "52", ""));

        session.set_mode(EditMode::Add, store.clips()).expect("mode");
        assert_eq!(session.draft(), &ClipDraft::default());
    }

    #[test]
    fn edit_replaces_only_the_selected_clip() {
        let (mut store, _) = open_store();
        let mut session = EditSession::new();
        for (name, end) in [("One", "5"), ("Two", "8")] {
            fill(&mut session, name, "1", end, "t");
            session.submit(&mut store, 52.0).expect("add");
        }
        let before = store.clips().clone();

        session.set_mode(EditMode::Edit, store.clips()).expect("mode");
        session.select(1, store.clips()).expect("select");
        session.update_draft(DraftField::Name, "One (cut)".to_string());
        let outcome = session.submit(&mut store, 52.0).expect("edit");

        assert_eq!(outcome, SubmitOutcome::Edited { index: 1 });
        assert_eq!(store.clips().get(0), before.get(0));
        assert_eq!(store.clips().get(2), before.get(2));
        assert_eq!(
            store.clips().get(1).map(|clip| clip.name.as_str()),
            Some("One (cut)")
        );
        assert_eq!(session.draft(), &ClipDraft::default());
    }

    #[test]
    fn delete_of_full_video_is_protected() {
        let (mut store, storage) = open_store();
        let mut session = EditSession::new();
        session.set_mode(EditMode::Delete, store.clips()).expect("mode");

        let result = session.submit(&mut store, 52.0);

        assert!(matches!(result, Err(PlaylistError::ProtectedIndex { index: 0 })));
        assert_eq!(store.clips().len(), 1);
        assert_eq!(storage.save_count(), 1);
        assert!(session.error_message().is_some());
    }

    #[test]
    fn delete_resets_selection_to_full_video() {
        let (mut store, _) = open_store();
        let mut session = EditSession::new();
        fill(&mut session, "Intro", "0", "10", "a");
        session.submit(&mut store, 52.0).expect("add");

        session.set_mode(EditMode::Delete, store.clips()).expect("mode");
        session.select(1, store.clips()).expect("select");
        let outcome = session.submit(&mut store, 52.0).expect("delete");

        assert_eq!(outcome, SubmitOutcome::Deleted { index: 1 });
        assert_eq!(session.selected_index(), 0);
        assert_eq!(store.clips().len(), 1);
    }

    #[test]
    fn mode_change_clears_error_message() {
        let (mut store, _) = open_store();
        let mut session = EditSession::new();
        assert!(session.submit(&mut store, 52.0).is_err());
        assert!(session.error_message().is_some());

        session.set_mode(EditMode::Edit, store.clips()).expect("mode");

        assert_eq!(session.error_message(), None);
    }

    #[test]
    fn select_out_of_range_is_rejected() {
        let (store, _) = open_store();
        let mut session = EditSession::new();

        assert!(matches!(
            session.select(5, store.clips()),
            Err(PlaylistError::IndexOutOfRange { index: 5, len: 1 })
        ));
    }

    #[test]
    fn filter_is_trimmed_and_clearable() {
        let clips = ClipList::with_full_video("Full video", 52.0).with_appended(Clip {
            name: "Intro".to_string(),
            start: 0.0,
            end: 10.0,
            tags: vec!["a".to_string()],
        });
        let mut session = EditSession::new();

        session.set_filter("  a ");
        assert_eq!(session.filter_tag(), "a");
        assert_eq!(session.visible_indices(&clips), vec![1]);
        assert_eq!(session.filtered_view(&clips).len(), 1);

        session.clear_filter();
        assert_eq!(session.filtered_view(&clips), clips);
    }
}
