use std::collections::HashSet;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use futures_util::{TryStream, TryStreamExt, pin_mut};

use crate::error::{Error, Result};
use crate::flickr_client::PhotoService;
use crate::model::DownloadTarget;

/// What a finished (or dry) run went through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub photos: usize,
    pub folders: usize,
}

/// Writes every target of a stream to disk, in stream order.
pub struct DownloadExecutor<'a, P> {
    service: &'a P,
    dry_run: bool,
    folders: HashSet<PathBuf>,
}

impl<'a, P: PhotoService> DownloadExecutor<'a, P> {
    pub fn new(service: &'a P, dry_run: bool) -> DownloadExecutor<'a, P> {
        DownloadExecutor {
            service,
            dry_run,
            folders: HashSet::new(),
        }
    }

    pub async fn consume<S>(&mut self, targets: S) -> Result<DownloadSummary>
    where
        S: TryStream<Ok = DownloadTarget, Error = Error>,
    {
        let mut summary = DownloadSummary::default();
        let targets = targets.into_stream();
        pin_mut!(targets);

        while let Some(target) = targets.try_next().await? {
            if self.folders.insert(target.folder.clone()) {
                self.create_folder(&target.folder)?;
                summary.folders += 1;
            }
            self.save(&target).await?;
            summary.photos += 1;
        }

        if self.dry_run {
            log::info!(
                "Dry run: would download {} photos into {} folders",
                summary.photos,
                summary.folders
            );
        } else {
            log::info!(
                "Downloaded {} photos into {} folders",
                summary.photos,
                summary.folders
            );
        }

        Ok(summary)
    }

    fn create_folder(&self, folder: &Path) -> Result<()> {
        if !self.dry_run {
            std::fs::create_dir_all(folder).map_err(|source| Error::DirectoryCreateFailed {
                path: folder.to_path_buf(),
                source,
            })?;
        }
        log::trace!("Created folder {}", folder.display());
        Ok(())
    }

    async fn save(&self, target: &DownloadTarget) -> Result<()> {
        let photo = &target.photo;
        let source_url = self
            .service
            .photo_source(photo)
            .await
            .map_err(|err| Error::TransferFailed {
                target: target.folder.join(&photo.id).display().to_string(),
                reason: err.to_string(),
            })?;
        let destination = photo.destination(&target.folder, &source_url);
        log::debug!("Downloading photo {}...", destination.display());

        if self.dry_run {
            return Ok(());
        }

        let transfer_failed = |reason: String| Error::TransferFailed {
            target: destination.display().to_string(),
            reason,
        };

        let bytes = self
            .service
            .fetch_photo(&source_url)
            .await
            .map_err(|err| transfer_failed(err.to_string()))?;
        tokio::fs::write(&destination, bytes)
            .await
            .map_err(|err| transfer_failed(err.to_string()))?;

        if let Some(uploaded_at) = photo.uploaded_at {
            filetime::set_file_mtime(&destination, FileTime::from_unix_time(uploaded_at, 0))
                .map_err(|err| transfer_failed(err.to_string()))?;
        }

        Ok(())
    }
}
