//! Playlist storage and lifecycle operations.
//!
//! Playlists reference tracks by id only; they never own audio bytes or
//! track records. Membership is set-like (adding a track twice is a silent
//! no-op) while order is list-like (append at the end). A playlist may hold
//! ids of tracks that no longer exist — readers resolve and drop dangling
//! ids, the repository's delete cascade strips them best-effort.

use chrono::Utc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::events::{Event, EventBus};
use crate::model::Playlist;
use crate::store::{Store, collections};

/// Handle to the persisted playlists.
#[derive(Debug, Clone)]
pub struct PlaylistStore {
    store: Store,
    events: EventBus,
}

impl PlaylistStore {
    pub fn new(store: Store, events: EventBus) -> Self {
        Self { store, events }
    }

    /// Create a new empty playlist. The name must be non-empty.
    pub async fn create(&self, name: &str) -> Result<Playlist> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("playlist name must not be empty"));
        }

        let playlist = Playlist {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            track_ids: Vec::new(),
            created_at: Utc::now().timestamp_millis(),
        };
        self.store
            .set(collections::PLAYLISTS, &playlist.id, &playlist)
            .await?;

        tracing::info!("created playlist '{}' ({})", playlist.name, playlist.id);
        self.events.emit(Event::PlaylistChanged {
            playlist_id: playlist.id.clone(),
        });
        Ok(playlist)
    }

    /// Fetch a playlist by id.
    pub async fn get(&self, playlist_id: &str) -> Result<Playlist> {
        self.store
            .get(collections::PLAYLISTS, playlist_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("playlist {playlist_id}")))
    }

    /// All playlists, oldest first.
    pub async fn get_all(&self) -> Result<Vec<Playlist>> {
        let mut playlists: Vec<Playlist> = self.store.all(collections::PLAYLISTS).await?;
        playlists.sort_by_key(|p| p.created_at);
        Ok(playlists)
    }

    /// Append a track id, unless it is already present (no-op success).
    pub async fn add_track(&self, playlist_id: &str, track_id: &str) -> Result<Playlist> {
        let mut playlist = self.get(playlist_id).await?;
        if playlist.track_ids.iter().any(|id| id == track_id) {
            return Ok(playlist);
        }

        playlist.track_ids.push(track_id.to_string());
        self.save(&playlist).await?;
        Ok(playlist)
    }

    /// Remove a track id. Removing an absent id succeeds unchanged.
    pub async fn remove_track(&self, playlist_id: &str, track_id: &str) -> Result<Playlist> {
        let mut playlist = self.get(playlist_id).await?;
        let before = playlist.track_ids.len();
        playlist.track_ids.retain(|id| id != track_id);

        if playlist.track_ids.len() != before {
            self.save(&playlist).await?;
        }
        Ok(playlist)
    }

    /// Rename a playlist. The new name must be non-empty.
    pub async fn rename(&self, playlist_id: &str, new_name: &str) -> Result<Playlist> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(Error::validation("playlist name must not be empty"));
        }

        let mut playlist = self.get(playlist_id).await?;
        playlist.name = new_name.to_string();
        self.save(&playlist).await?;
        Ok(playlist)
    }

    /// Delete a playlist.
    pub async fn delete(&self, playlist_id: &str) -> Result<()> {
        // Existence check so unknown ids surface NotFound, not silent success
        let playlist = self.get(playlist_id).await?;
        self.store.delete(collections::PLAYLISTS, playlist_id).await?;

        tracing::info!("deleted playlist '{}' ({})", playlist.name, playlist_id);
        self.events.emit(Event::PlaylistChanged {
            playlist_id: playlist_id.to_string(),
        });
        Ok(())
    }

    /// Strip a track id from every playlist. Part of the repository's delete
    /// cascade; each playlist is its own store write.
    pub async fn strip_track(&self, track_id: &str) -> Result<()> {
        for playlist in self.store.all::<Playlist>(collections::PLAYLISTS).await? {
            if playlist.track_ids.iter().any(|id| id == track_id) {
                let mut updated = playlist;
                updated.track_ids.retain(|id| id != track_id);
                self.save(&updated).await?;
            }
        }
        Ok(())
    }

    async fn save(&self, playlist: &Playlist) -> Result<()> {
        self.store
            .set(collections::PLAYLISTS, &playlist.id, playlist)
            .await?;
        self.events.emit(Event::PlaylistChanged {
            playlist_id: playlist.id.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn temp_playlists() -> (PlaylistStore, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(&dir.path().join("test.db")).await.unwrap();
        (PlaylistStore::new(store, EventBus::default()), dir)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (playlists, _dir) = temp_playlists().await;

        let created = playlists.create("Morning Mix").await.unwrap();
        let fetched = playlists.get(&created.id).await.unwrap();

        assert_eq!(fetched.name, "Morning Mix");
        assert!(fetched.track_ids.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_empty_name() {
        let (playlists, _dir) = temp_playlists().await;
        assert!(matches!(
            playlists.create("   ").await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_get_unknown_is_not_found() {
        let (playlists, _dir) = temp_playlists().await;
        assert!(matches!(
            playlists.get("missing").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_add_track_appends_once() {
        let (playlists, _dir) = temp_playlists().await;
        let p = playlists.create("Mix").await.unwrap();

        playlists.add_track(&p.id, "t1").await.unwrap();
        playlists.add_track(&p.id, "t2").await.unwrap();
        // Duplicate add is a silent no-op
        let after = playlists.add_track(&p.id, "t1").await.unwrap();

        assert_eq!(after.track_ids, vec!["t1", "t2"]);
    }

    #[tokio::test]
    async fn test_remove_track_is_idempotent() {
        let (playlists, _dir) = temp_playlists().await;
        let p = playlists.create("Mix").await.unwrap();
        playlists.add_track(&p.id, "t1").await.unwrap();

        let after = playlists.remove_track(&p.id, "t1").await.unwrap();
        assert!(after.track_ids.is_empty());

        // Absent id: success, unchanged
        let again = playlists.remove_track(&p.id, "t1").await.unwrap();
        assert!(again.track_ids.is_empty());
    }

    #[tokio::test]
    async fn test_rename() {
        let (playlists, _dir) = temp_playlists().await;
        let p = playlists.create("Old").await.unwrap();

        playlists.rename(&p.id, "New").await.unwrap();
        assert_eq!(playlists.get(&p.id).await.unwrap().name, "New");

        assert!(matches!(
            playlists.rename(&p.id, "").await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_delete() {
        let (playlists, _dir) = temp_playlists().await;
        let p = playlists.create("Mix").await.unwrap();

        playlists.delete(&p.id).await.unwrap();
        assert!(matches!(playlists.get(&p.id).await, Err(Error::NotFound(_))));
        assert!(matches!(
            playlists.delete(&p.id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_strip_track_touches_every_playlist() {
        let (playlists, _dir) = temp_playlists().await;
        let a = playlists.create("A").await.unwrap();
        let b = playlists.create("B").await.unwrap();

        playlists.add_track(&a.id, "gone").await.unwrap();
        playlists.add_track(&a.id, "stays").await.unwrap();
        playlists.add_track(&b.id, "gone").await.unwrap();

        playlists.strip_track("gone").await.unwrap();

        assert_eq!(playlists.get(&a.id).await.unwrap().track_ids, vec!["stays"]);
        assert!(playlists.get(&b.id).await.unwrap().track_ids.is_empty());
    }

    #[tokio::test]
    async fn test_get_all_sorted_by_creation() {
        let (playlists, _dir) = temp_playlists().await;
        playlists.create("first").await.unwrap();
        playlists.create("second").await.unwrap();

        let all = playlists.get_all().await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
