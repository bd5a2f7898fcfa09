use std::path::Path;
use crate::engine::EngineSettings;
use crate::errors::SweepError;
use tracing::info;

/// Make sure the engine script exists, cloning its repository when it does
/// not. Returns `true` when a clone was performed.
pub async fn ensure_engine(settings: &EngineSettings) -> Result<bool, SweepError> {
    if settings.script.exists() {
        return Ok(false);
    }

    if settings.install_dir.exists() {
        return Err(SweepError::Bootstrap(format!(
            "{} exists but {} is missing; remove it or point engine.script at the engine",
            settings.install_dir.display(),
            settings.script.display()
        )));
    }

    info!(
        repository = %settings.repository,
        dir = %settings.install_dir.display(),
        "Engine not found, downloading"
    );

    let repository = settings.repository.clone();
    let install_dir = settings.install_dir.clone();
    tokio::task::spawn_blocking(move || clone_repository(&repository, &install_dir))
        .await
        .map_err(|e| SweepError::Internal(format!("Clone task panicked: {}", e)))??;

    if !settings.script.exists() {
        return Err(SweepError::Bootstrap(format!(
            "cloned {} but {} is still missing",
            settings.repository,
            settings.script.display()
        )));
    }

    info!(script = %settings.script.display(), "Engine downloaded");
    Ok(true)
}

fn clone_repository(repository: &str, into: &Path) -> Result<(), SweepError> {
    git2::build::RepoBuilder::new()
        .clone(repository, into)
        .map_err(|e| SweepError::Git(format!("Failed to clone {}: {}", repository, e)))?;
    Ok(())
}
