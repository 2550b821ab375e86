//! Import command: bring audio files into the library.

use std::path::PathBuf;

use super::App;
use crate::library::{self, ImportStatus};

/// Import files and directories, printing one line per file.
pub async fn cmd_import(app: &App, inputs: &[PathBuf]) -> anyhow::Result<()> {
    let paths = library::expand_audio_paths(inputs);
    if paths.is_empty() {
        println!("Nothing to import.");
        return Ok(());
    }

    println!("Importing {} file(s)...", paths.len());
    let outcomes = app.repo.import_files(&paths).await;

    let mut duplicates = 0;
    let mut errors = 0;
    for outcome in &outcomes {
        match outcome.status {
            ImportStatus::Ok => {
                println!(
                    "  added     {} ({})",
                    outcome.file.display(),
                    outcome.track_id.as_deref().unwrap_or("?")
                );
            }
            ImportStatus::Duplicate => {
                duplicates += 1;
                println!(
                    "  duplicate {} (already {})",
                    outcome.file.display(),
                    outcome.track_id.as_deref().unwrap_or("?")
                );
            }
            ImportStatus::Error => {
                errors += 1;
                eprintln!(
                    "  error     {}: {}",
                    outcome.file.display(),
                    outcome.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }

    let added = outcomes.iter().filter(|o| o.success()).count();
    println!("Done: {added} added, {duplicates} duplicate(s), {errors} error(s).");
    Ok(())
}
