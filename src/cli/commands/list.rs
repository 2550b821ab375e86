//! Listing command with artist and tag filters.

use super::App;
use crate::model::TrackWithPath;
use crate::tags::{TagFilter, TagRequirement};

pub async fn cmd_list(
    app: &App,
    artist: Option<&str>,
    tags: &[String],
    exclude_tags: &[String],
    any: bool,
) -> anyhow::Result<()> {
    let tracks = if let Some(artist) = artist {
        app.repo.list_by_artist(artist).await?
    } else {
        let filter = TagFilter {
            tags: tags.to_vec(),
            exclude_tags: exclude_tags.to_vec(),
            requirement: if any {
                TagRequirement::Or
            } else {
                TagRequirement::And
            },
        };
        app.repo.filter_by_tags(&filter).await?
    };

    if tracks.is_empty() {
        println!("No tracks.");
        return Ok(());
    }

    for entry in &tracks {
        println!("{}", format_track(entry));
    }
    println!("{} track(s).", tracks.len());
    Ok(())
}

fn format_track(entry: &TrackWithPath) -> String {
    let track = &entry.track;
    let tags = if track.tags.is_empty() {
        String::new()
    } else {
        format!("  [{}]", track.tags.join(", "))
    };
    format!(
        "{}  {} - {} ({}){}",
        track.id,
        track.metadata.artist,
        track.metadata.title,
        format_duration(track.metadata.duration_secs),
        tags
    )
}

/// Format a duration in seconds as M:SS.
fn format_duration(secs: f64) -> String {
    let total = secs.max(0.0).round() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
