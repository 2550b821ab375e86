//! Tag filtering over the track set.
//!
//! A pure function recomputed per query — at personal-library scale there is
//! nothing to index. Matching is case-sensitive string equality with no
//! normalization: "Pop" and "pop" are distinct tags.

use crate::model::Track;

/// How the include set combines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagRequirement {
    /// Every requested tag must be present
    #[default]
    And,
    /// At least one requested tag must be present
    Or,
}

/// A tag query: include set, exclude set, combination mode.
#[derive(Debug, Clone, Default)]
pub struct TagFilter {
    pub tags: Vec<String>,
    pub exclude_tags: Vec<String>,
    pub requirement: TagRequirement,
}

impl TagFilter {
    /// Whether a track passes this filter.
    ///
    /// Exclusion wins unconditionally: a track carrying any excluded tag
    /// never matches. An empty include set matches every non-excluded track.
    pub fn matches(&self, track: &Track) -> bool {
        if self.exclude_tags.iter().any(|t| track.has_tag(t)) {
            return false;
        }

        if self.tags.is_empty() {
            return true;
        }

        match self.requirement {
            TagRequirement::And => self.tags.iter().all(|t| track.has_tag(t)),
            TagRequirement::Or => self.tags.iter().any(|t| track.has_tag(t)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TrackMetadata;

    fn filter<'a>(tracks: &'a [Track], query: &TagFilter) -> Vec<&'a Track> {
        tracks.iter().filter(|t| query.matches(t)).collect()
    }

    fn track_with_tags(id: &str, tags: &[&str]) -> Track {
        Track {
            id: id.to_string(),
            file_hash: format!("hash-{id}"),
            file_name: format!("{id}.mp3"),
            metadata: TrackMetadata {
                title: id.to_string(),
                artist: "Artist".to_string(),
                duration_secs: 60.0,
                volume_lufs: -14.0,
            },
            tags: tags.iter().map(|t| t.to_string()).collect(),
            added_at: 0,
        }
    }

    fn ids(matched: Vec<&Track>) -> Vec<&str> {
        matched.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_and_requires_every_tag() {
        let tracks = vec![
            track_with_tags("a", &["x", "y"]),
            track_with_tags("b", &["y"]),
            track_with_tags("c", &["z"]),
        ];

        let query = TagFilter {
            tags: vec!["x".to_string(), "y".to_string()],
            requirement: TagRequirement::And,
            ..Default::default()
        };
        assert_eq!(ids(filter(&tracks, &query)), vec!["a"]);
    }

    #[test]
    fn test_or_requires_any_tag() {
        let tracks = vec![
            track_with_tags("a", &["x", "y"]),
            track_with_tags("b", &["y"]),
            track_with_tags("c", &["z"]),
        ];

        let query = TagFilter {
            tags: vec!["x".to_string(), "y".to_string()],
            requirement: TagRequirement::Or,
            ..Default::default()
        };
        assert_eq!(ids(filter(&tracks, &query)), vec!["a", "b"]);
    }

    #[test]
    fn test_exclude_beats_include() {
        let tracks = vec![
            track_with_tags("a", &["x", "y"]),
            track_with_tags("b", &["y"]),
            track_with_tags("c", &["z"]),
        ];

        // Empty include set: everything without an excluded tag matches
        let query = TagFilter {
            exclude_tags: vec!["z".to_string()],
            ..Default::default()
        };
        assert_eq!(ids(filter(&tracks, &query)), vec!["a", "b"]);

        // Excluded even though it carries an included tag
        let query = TagFilter {
            tags: vec!["y".to_string()],
            exclude_tags: vec!["x".to_string()],
            requirement: TagRequirement::Or,
        };
        assert_eq!(ids(filter(&tracks, &query)), vec!["b"]);
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let tracks = vec![track_with_tags("a", &["x"]), track_with_tags("b", &[])];
        let query = TagFilter::default();
        assert_eq!(filter(&tracks, &query).len(), 2);
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let tracks = vec![track_with_tags("a", &["Pop"])];
        let query = TagFilter {
            tags: vec!["pop".to_string()],
            ..Default::default()
        };
        assert!(filter(&tracks, &query).is_empty());
    }
}
