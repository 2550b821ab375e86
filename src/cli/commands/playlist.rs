//! Playlist management commands.

use super::{App, PlaylistAction};

pub async fn cmd_playlist(app: &App, action: &PlaylistAction) -> anyhow::Result<()> {
    match action {
        PlaylistAction::Create { name } => {
            let playlist = app.playlists.create(name).await?;
            println!("Created playlist '{}' ({}).", playlist.name, playlist.id);
        }
        PlaylistAction::List => {
            let playlists = app.playlists.get_all().await?;
            if playlists.is_empty() {
                println!("No playlists.");
            }
            for playlist in playlists {
                println!(
                    "{}  {} ({} track(s))",
                    playlist.id,
                    playlist.name,
                    playlist.track_ids.len()
                );
            }
        }
        PlaylistAction::Show { playlist_id } => {
            let playlist = app.playlists.get(playlist_id).await?;
            println!("{}:", playlist.name);
            for track_id in &playlist.track_ids {
                // Dangling references are shown as such, not hidden: the
                // playlist record is the source of truth here
                match app.repo.get(track_id).await {
                    Ok(track) => println!(
                        "  {} - {}",
                        track.metadata.artist, track.metadata.title
                    ),
                    Err(_) => println!("  (missing track {track_id})"),
                }
            }
        }
        PlaylistAction::Add {
            playlist_id,
            track_id,
        } => {
            // Adding a known-good track keeps playlists free of typos;
            // existing dangling ids are handled by readers
            app.repo.get(track_id).await?;
            let playlist = app.playlists.add_track(playlist_id, track_id).await?;
            println!(
                "'{}' now holds {} track(s).",
                playlist.name,
                playlist.track_ids.len()
            );
        }
        PlaylistAction::Remove {
            playlist_id,
            track_id,
        } => {
            let playlist = app.playlists.remove_track(playlist_id, track_id).await?;
            println!(
                "'{}' now holds {} track(s).",
                playlist.name,
                playlist.track_ids.len()
            );
        }
        PlaylistAction::Rename {
            playlist_id,
            new_name,
        } => {
            let playlist = app.playlists.rename(playlist_id, new_name).await?;
            println!("Renamed to '{}'.", playlist.name);
        }
        PlaylistAction::Delete { playlist_id } => {
            app.playlists.delete(playlist_id).await?;
            println!("Deleted playlist {playlist_id}.");
        }
    }
    Ok(())
}
