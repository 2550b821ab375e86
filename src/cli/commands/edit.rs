//! Single-track operations: edit metadata, tags, rename, delete.

use super::App;
use crate::library::MetadataPatch;
use crate::prompt::Prompter;

pub async fn cmd_edit(
    app: &App,
    track_id: &str,
    title: Option<String>,
    artist: Option<String>,
) -> anyhow::Result<()> {
    if title.is_none() && artist.is_none() {
        println!("Nothing to change (pass --title and/or --artist).");
        return Ok(());
    }

    let track = app
        .repo
        .update_metadata(track_id, MetadataPatch { title, artist })
        .await?;
    println!(
        "Updated: {} - {}",
        track.metadata.artist, track.metadata.title
    );
    Ok(())
}

pub async fn cmd_tag(app: &App, track_id: &str, tags: Vec<String>) -> anyhow::Result<()> {
    let track = app.repo.update_tags(track_id, tags).await?;
    if track.tags.is_empty() {
        println!("Cleared tags of '{}'.", track.metadata.title);
    } else {
        println!("Tagged '{}': {}", track.metadata.title, track.tags.join(", "));
    }
    Ok(())
}

pub async fn cmd_rename(app: &App, track_id: &str, new_file_name: &str) -> anyhow::Result<()> {
    let track = app.repo.rename_file(track_id, new_file_name).await?;
    println!("Renamed to {} (title '{}').", track.file_name, track.metadata.title);
    Ok(())
}

pub async fn cmd_delete(
    app: &App,
    track_id: &str,
    skip_confirm: bool,
    prompter: &dyn Prompter,
) -> anyhow::Result<()> {
    let track = app.repo.get(track_id).await?;

    if !skip_confirm
        && !prompter.confirm(&format!("Delete \"{}\"?", track.metadata.title))
    {
        println!("Aborted.");
        return Ok(());
    }

    app.repo.delete(track_id).await?;
    prompter.message(&format!("Deleted \"{}\".", track.metadata.title));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::prompt::testing::FixedPrompter;
    use crate::test_utils::TempLibrary;

    /// Build an App over a TempLibrary's handles for command-level tests.
    fn app_for(lib: &TempLibrary) -> App {
        App {
            config: Config::default(),
            events: lib.events.clone(),
            repo: lib.repo.clone(),
            history: lib.history.clone(),
            playlists: lib.playlists.clone(),
        }
    }

    #[tokio::test]
    async fn test_delete_aborts_without_confirmation() {
        let lib = TempLibrary::new().await;
        let id = lib.import_one("song.wav", b"bytes").await;
        let app = app_for(&lib);

        let no = FixedPrompter::answering(false);
        cmd_delete(&app, &id, false, &no).await.unwrap();
        assert!(lib.repo.get(&id).await.is_ok());

        let yes = FixedPrompter::answering(true);
        cmd_delete(&app, &id, false, &yes).await.unwrap();
        assert!(lib.repo.get(&id).await.is_err());
        assert_eq!(yes.messages.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_with_yes_skips_prompt() {
        let lib = TempLibrary::new().await;
        let id = lib.import_one("song.wav", b"bytes").await;
        let app = app_for(&lib);

        // Prompter would refuse, but --yes bypasses it
        let no = FixedPrompter::answering(false);
        cmd_delete(&app, &id, true, &no).await.unwrap();
        assert!(lib.repo.get(&id).await.is_err());
    }
}
