use std::path::{Path, PathBuf};

use async_stream::try_stream;
use chrono::NaiveDateTime;
use futures_util::stream::{LocalBoxStream, StreamExt};

use crate::error::{Error, Result};
use crate::flickr_client::PhotoService;
use crate::model::{Account, DownloadTarget};
use crate::paging::{self, AccountPhotos, AlbumListing, AlbumPhotos};

/// Which photos a download covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every photo of the account, into the run folder itself.
    All,
    /// Photos of every album titled exactly like this, into `<run folder>/<title>`.
    Album(String),
    /// Photos of every album, one folder per album title. Photos outside any
    /// album are skipped, photos in several albums are written once per album.
    AllAlbums,
}

/// An ordered, lazily produced sequence of download targets.
pub type DownloadPlan<'a> = LocalBoxStream<'a, Result<DownloadTarget>>;

/// `<location>/<display name with spaces as underscores>_<YYYYMMDDHHMMSS>`
pub fn run_folder(location: &Path, display_name: &str, now: NaiveDateTime) -> PathBuf {
    let name = display_name.replace(' ', "_");
    let timestamp = now.format("%Y%m%d%H%M%S");
    location.join(format!("{name}_{timestamp}"))
}

/// Album title as a single path component, so every album folder stays a
/// direct child of the run folder.
pub fn folder_name(title: &str) -> String {
    let name = title.replace(['/', '\\'], "_");
    match name.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => name,
    }
}

pub struct DownloadPlanner<'a, P> {
    service: &'a P,
    account: &'a Account,
    root: PathBuf,
}

impl<'a, P: PhotoService> DownloadPlanner<'a, P> {
    pub fn new(service: &'a P, account: &'a Account, root: PathBuf) -> DownloadPlanner<'a, P> {
        DownloadPlanner {
            service,
            account,
            root,
        }
    }

    pub fn build_stream(self, selection: Selection) -> DownloadPlan<'a> {
        match selection {
            Selection::All => self.account_photos(),
            Selection::Album(title) => self.albums(Some(title)),
            Selection::AllAlbums => self.albums(None),
        }
    }

    fn account_photos(self) -> DownloadPlan<'a> {
        let DownloadPlanner {
            service,
            account,
            root,
        } = self;

        let targets = try_stream! {
            let (total, photos) = paging::enumerate(AccountPhotos { service, account }).await?;
            log::info!("Downloading {total} photos to {}", root.display());

            for await entry in photos {
                let (_, photo) = entry?;
                yield DownloadTarget {
                    folder: root.clone(),
                    photo,
                };
            }
        };
        targets.boxed_local()
    }

    /// `wanted` of `None` selects every album.
    fn albums(self, wanted: Option<String>) -> DownloadPlan<'a> {
        let DownloadPlanner {
            service,
            account,
            root,
        } = self;

        let targets = try_stream! {
            let (_, albums) = paging::enumerate(AlbumListing { service, account }).await?;
            let mut last_matched_page = None;
            let mut found = false;

            for await entry in albums {
                let (page, album) = entry?;

                if let Some(title) = &wanted {
                    if album.title != *title {
                        continue;
                    }
                    // Only the first album with this title on a page counts, later
                    // pages are still searched.
                    if last_matched_page == Some(page) {
                        log::debug!(
                            "Skipping album {} ({}), already matched on page {page}",
                            album.title,
                            album.id
                        );
                        continue;
                    }
                    last_matched_page = Some(page);
                    found = true;
                }

                log::trace!(
                    "Album {} ({}) lists {} photos",
                    album.title,
                    album.id,
                    album.photo_count
                );

                let folder = root.join(folder_name(&album.title));
                let title = album.title.clone();
                let (total, photos) =
                    paging::enumerate(AlbumPhotos { service, account, album }).await?;
                log::info!(
                    "Downloading album {title} ({total} photos) to {}",
                    folder.display()
                );

                for await entry in photos {
                    let (_, photo) = entry?;
                    yield DownloadTarget {
                        folder: folder.clone(),
                        photo,
                    };
                }
            }

            if let Some(title) = wanted {
                if !found {
                    Err::<(), _>(Error::AlbumNotFound(title))?;
                }
            }
        };
        targets.boxed_local()
    }
}
