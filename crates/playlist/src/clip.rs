use serde::{Deserialize, Serialize};

use crate::error::{PlaylistError, Result};

/// Index of the full-video clip that can never be deleted.
pub const FULL_VIDEO_INDEX: usize = 0;

/// A named, tagged sub-range `[start, end)` of the source video in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub name: String,
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Clip {
    /// Builds the clip that spans the whole source video.
    pub fn full_video(name: impl Into<String>, end: f64) -> Self {
        Self {
            name: name.into(),
            start: 0.0,
            end,
            tags: Vec::new(),
        }
    }

    /// Returns true when one of the tags matches `tag` exactly.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|existing| existing == tag)
    }

    fn check_well_formed(&self, index: usize) -> Result<()> {
        let reason = if self.name.is_empty() {
            Some(format!("clip {index} has an empty name"))
        } else if !self.start.is_finite() || !self.end.is_finite() {
            Some(format!("clip {index} has a non-finite bound"))
        } else if self.start < 0.0 || self.end < 0.0 {
            Some(format!("clip {index} has a negative bound"))
        } else if self.start >= self.end {
            Some(format!(
                "clip {index} starts at {} but ends at {}",
                self.start, self.end
            ))
        } else if self.tags.iter().any(String::is_empty) {
            Some(format!("clip {index} has an empty tag"))
        } else {
            None
        };

        match reason {
            Some(reason) => Err(PlaylistError::InvalidClipList { reason }),
            None => Ok(()),
        }
    }
}

/// Ordered clip collection; insertion order is playback order.
///
/// The clip at [`FULL_VIDEO_INDEX`] represents the full video. It may be
/// edited but never removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipList {
    clips: Vec<Clip>,
}

impl ClipList {
    /// Builds a list from raw clips after checking its invariants.
    pub fn new(clips: Vec<Clip>) -> Result<Self> {
        let list = Self { clips };
        list.validate()?;
        Ok(list)
    }

    /// Builds the one-element list used when nothing was persisted.
    pub fn with_full_video(name: impl Into<String>, end: f64) -> Self {
        Self {
            clips: vec![Clip::full_video(name, end)],
        }
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Clip> {
        self.clips.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Clip> {
        self.clips.iter()
    }

    pub fn as_slice(&self) -> &[Clip] {
        &self.clips
    }

    /// Checks the list invariants: at least the full-video clip, and every
    /// clip with a non-empty name and `0 <= start < end`.
    pub fn validate(&self) -> Result<()> {
        if self.clips.is_empty() {
            return Err(PlaylistError::InvalidClipList {
                reason: "the list has no full-video clip".to_string(),
            });
        }
        self.clips
            .iter()
            .enumerate()
            .try_for_each(|(index, clip)| clip.check_well_formed(index))
    }

    /// Returns a new list with `clip` appended.
    pub fn with_appended(&self, clip: Clip) -> Self {
        let mut clips = self.clips.clone();
        clips.push(clip);
        Self { clips }
    }

    /// Returns a new list with the clip at `index` replaced.
    pub fn with_replaced(&self, index: usize, clip: Clip) -> Result<Self> {
        self.ensure_index(index)?;
        let mut clips = self.clips.clone();
        clips[index] = clip;
        Ok(Self { clips })
    }

    /// Returns a new list without the clip at `index`.
    ///
    /// Later clips shift down by one. The full-video clip is protected.
    pub fn with_removed(&self, index: usize) -> Result<Self> {
        if index == FULL_VIDEO_INDEX {
            return Err(PlaylistError::ProtectedIndex { index });
        }
        self.ensure_index(index)?;
        let mut clips = self.clips.clone();
        clips.remove(index);
        Ok(Self { clips })
    }

    /// Returns the clips carrying `tag`, or the whole list when `tag` is empty.
    ///
    /// # Example
    /// ```
    /// use playlist::{Clip, ClipList};
    ///
    /// let list = ClipList::with_full_video("Full video", 52.0).with_appended(Clip {
    ///     name: "Intro".to_string(),
    ///     start: 0.0,
    ///     end: 10.0,
    ///     tags: vec!["a".to_string()],
    /// });
    /// assert_eq!(list.filtered("a").len(), 1);
    /// assert_eq!(list.filtered("").len(), 2);
    /// ```
    pub fn filtered(&self, tag: &str) -> Self {
        Self {
            clips: self
                .filtered_indices(tag)
                .into_iter()
                .map(|index| self.clips[index].clone())
                .collect(),
        }
    }

    /// Returns the list positions of the clips [`ClipList::filtered`] keeps.
    pub fn filtered_indices(&self, tag: &str) -> Vec<usize> {
        self.clips
            .iter()
            .enumerate()
            .filter(|(_, clip)| tag.is_empty() || clip.has_tag(tag))
            .map(|(index, _)| index)
            .collect()
    }

    fn ensure_index(&self, index: usize) -> Result<()> {
        if index >= self.clips.len() {
            return Err(PlaylistError::IndexOutOfRange {
                index,
                len: self.clips.len(),
            });
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ClipList {
    type Item = &'a Clip;
    type IntoIter = std::slice::Iter<'a, Clip>;

    fn into_iter(self) -> Self::IntoIter {
        self.clips.iter()
    }
}

/// Splits comma-separated tag text, trimming each tag and dropping empties.
///
/// # Example
/// ```
/// use playlist::clip::parse_tags;
///
/// assert_eq!(parse_tags(" a, b ,,a"), vec!["a", "b", "a"]);
/// ```
pub fn parse_tags(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Joins tags back into editable text.
pub fn format_tags(tags: &[String]) -> String {
    tags.join(", ")
}

#[cfg(test)]
mod tests {
    use super::{Clip, ClipList, format_tags, parse_tags};
    use crate::error::PlaylistError;

    fn clip(name: &str, start: f64, end: f64, tags: &[&str]) -> Clip {
        Clip {
            name: name.to_string(),
            start,
            end,
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
        }
    }

    fn sample_list() -> ClipList {
        ClipList::new(vec![
            clip("Full video", 0.0, 52.0, &[]),
            clip("Intro", 0.0, 10.0, &["a", "b"]),
            clip("Chase", 12.0, 20.0, &["b"]),
            clip("Outro", 40.0, 52.0, &["A"]),
        ])
        .expect("sample list is valid")
    }

    #[test]
    fn remove_shifts_later_clips_down() {
        let list = sample_list();

        let updated = list.with_removed(1).expect("remove should succeed");

        assert_eq!(updated.len(), 3);
        assert_eq!(updated.get(1).map(|clip| clip.name.as_str()), Some("Chase"));
        assert_eq!(updated.get(2).map(|clip| clip.name.as_str()), Some("Outro"));
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn remove_full_video_is_protected() {
        let result = sample_list().with_removed(0);
        assert!(matches!(result, Err(PlaylistError::ProtectedIndex { index: 0 })));
    }

    #[test]
    fn replace_and_remove_reject_out_of_range_indices() {
        let list = sample_list();

        assert!(matches!(
            list.with_replaced(4, clip("x", 0.0, 1.0, &[])),
            Err(PlaylistError::IndexOutOfRange { index: 4, len: 4 })
        ));
        assert!(matches!(
            list.with_removed(9),
            Err(PlaylistError::IndexOutOfRange { index: 9, len: 4 })
        ));
    }

    #[test]
    fn replace_touches_only_the_target_index() {
        let list = sample_list();

        let updated = list
            .with_replaced(2, clip("Chase cut", 13.0, 18.0, &["c"]))
            .expect("replace should succeed");

        for index in [0, 1, 3] {
            assert_eq!(updated.get(index), list.get(index));
        }
        assert_eq!(updated.get(2), Some(&clip("Chase cut", 13.0, 18.0, &["c"])));
    }

    #[test]
    fn filter_is_exact_and_case_sensitive_subsequence() {
        let list = sample_list();

        assert_eq!(list.filtered_indices("b"), vec![1, 2]);
        assert_eq!(list.filtered_indices("a"), vec![1]);
        assert_eq!(list.filtered_indices("A"), vec![3]);
        assert!(list.filtered("missing").is_empty());
        assert_eq!(list.filtered(""), list);
    }

    #[test]
    fn validate_rejects_empty_lists_and_reversed_bounds() {
        assert!(ClipList::new(Vec::new()).is_err());
        assert!(ClipList::new(vec![clip("Full video", 10.0, 5.0, &[])]).is_err());
        assert!(ClipList::new(vec![clip("", 0.0, 5.0, &[])]).is_err());
        assert!(ClipList::new(vec![clip("Full video", -1.0, 5.0, &[])]).is_err());
    }

    #[test]
    fn tags_round_trip_through_editable_text() {
        let tags = parse_tags("a, b");
        assert_eq!(tags, vec!["a", "b"]);
        assert_eq!(format_tags(&tags), "a, b");
        assert!(parse_tags(" , ,").is_empty());
    }

    #[test]
    fn persisted_records_without_tags_deserialize_with_empty_tags() {
        let list: ClipList =
            serde_json::from_str(r#"[{"name":"Video completo","start":0,"end":52}]"#)
                .expect("legacy record should parse");
        assert_eq!(list.get(0).map(|clip| clip.tags.len()), Some(0));
        assert_eq!(list.get(0).map(|clip| clip.end), Some(52.0));
    }
}
