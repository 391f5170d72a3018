use crate::{
    client::DalleApi,
    config::DownloadConfig,
    error::{DalleError, Result},
    models::Task,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    /// Files written, in completion order.
    pub files: Vec<PathBuf>,
    /// Tasks that were not `succeeded` and therefore not downloaded.
    pub skipped_tasks: Vec<String>,
}

/// Download one generation into `<images_path>/<id>.<extension>`.
///
/// A non-200 download is reported as the structured API error and no file is
/// created. If copying fails midway the partial file is removed.
pub async fn download_generation<A>(
    api: &A,
    generation_id: &str,
    config: &DownloadConfig,
) -> Result<PathBuf>
where
    A: DalleApi + ?Sized,
{
    download_to_file(api, generation_id, config, &CancellationToken::new()).await
}

async fn download_to_file<A>(
    api: &A,
    generation_id: &str,
    config: &DownloadConfig,
    cancel: &CancellationToken,
) -> Result<PathBuf>
where
    A: DalleApi + ?Sized,
{
    let stream = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(DalleError::Cancelled),
        stream = api.download(generation_id) => stream?,
    };
    let mut stream = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(DalleError::Cancelled),
        checked = stream.error_for_status() => checked?,
    };

    let path = config.file_path(generation_id);
    let mut file = tokio::fs::File::create(&path).await?;

    let copied = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DalleError::Cancelled),
        copied = stream.copy_to(&mut file, config.buffer_size) => copied,
    };

    match copied {
        Ok(bytes) => {
            log::debug!("Wrote {} bytes to {}", bytes, path.display());
            Ok(path)
        }
        Err(e) => {
            drop(file);
            if let Err(rm) = tokio::fs::remove_file(&path).await {
                log::warn!("Could not remove partial file {}: {}", path.display(), rm);
            }
            Err(e)
        }
    }
}

/// Download every generation of every succeeded task, at most
/// `config.concurrency` at a time.
///
/// The first failing worker cancels its siblings. All spawned workers are
/// joined before the first error is returned.
pub async fn download_all<A>(
    api: Arc<A>,
    tasks: &[Task],
    config: &DownloadConfig,
) -> Result<DownloadReport>
where
    A: DalleApi + ?Sized + 'static,
{
    config.validate()?;

    let limiter = Arc::new(Semaphore::new(config.concurrency));
    let cancel = CancellationToken::new();
    let mut workers = JoinSet::new();
    let mut report = DownloadReport::default();

    for task in tasks {
        if !task.is_succeeded() {
            log::info!("task id {} not completed yet.. skipping", task.id);
            report.skipped_tasks.push(task.id.clone());
            continue;
        }

        for generation in &task.generations.data {
            let api = Arc::clone(&api);
            let limiter = Arc::clone(&limiter);
            let cancel = cancel.clone();
            let config = config.clone();
            let generation_id = generation.id.clone();

            workers.spawn(async move {
                let _permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(DalleError::Cancelled),
                    permit = limiter.acquire_owned() => permit.map_err(|_| DalleError::Cancelled)?,
                };

                let result = download_to_file(api.as_ref(), &generation_id, &config, &cancel).await;
                if let Err(e) = &result {
                    if !matches!(e, DalleError::Cancelled) {
                        log::error!("Download of {} failed: {}", generation_id, e);
                    }
                    cancel.cancel();
                }
                result
            });
        }
    }

    log::info!("Downloading {} generations", workers.len());

    let mut first_error: Option<DalleError> = None;
    while let Some(joined) = workers.join_next().await {
        let outcome = match joined {
            Ok(outcome) => outcome,
            Err(join_err) => Err(DalleError::Worker(join_err.to_string())),
        };

        match outcome {
            Ok(path) => report.files.push(path),
            Err(e) => {
                cancel.cancel();
                // A sibling's Cancelled may be joined before the error that caused it.
                let replace = match &first_error {
                    None => true,
                    Some(DalleError::Cancelled) => !matches!(e, DalleError::Cancelled),
                    Some(_) => false,
                };
                if replace {
                    first_error = Some(e);
                }
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(report),
    }
}
