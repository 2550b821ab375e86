//! Play history and recommendation commands.

use chrono::{DateTime, Utc};

use super::App;
use crate::history;
use crate::model::Track;

pub async fn cmd_history(app: &App) -> anyhow::Result<()> {
    let entries = app.history.all().await?;
    if entries.is_empty() {
        println!("No plays in the last {} days.", history::RETENTION_DAYS);
        return Ok(());
    }

    for entry in &entries {
        let when = DateTime::<Utc>::from_timestamp_millis(entry.played_at)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| entry.played_at.to_string());
        let title = match app.repo.get(&entry.track_id).await {
            Ok(track) => track.metadata.title,
            Err(_) => format!("(missing track {})", entry.track_id),
        };
        println!("{when}  {title}");
    }
    println!("{} play(s).", entries.len());
    Ok(())
}

pub async fn cmd_recommend(app: &App, days: i64) -> anyhow::Result<()> {
    let tracks: Vec<Track> = app
        .repo
        .list_all()
        .await?
        .into_iter()
        .map(|t| t.track)
        .collect();
    let entries = app.history.all().await?;

    let ranked = history::recommend(days, &tracks, &entries, Utc::now().timestamp_millis());
    if ranked.is_empty() {
        println!("Not enough listening data yet - play a few more tracks first.");
        return Ok(());
    }

    for (rank, track) in ranked.iter().enumerate() {
        println!(
            "{:2}. {} - {}",
            rank + 1,
            track.metadata.artist,
            track.metadata.title
        );
    }
    Ok(())
}
