//! Forward-only traversal of paginated listings.
//!
//! [`enumerate`] fetches page 1 to learn how many pages there are, then hands
//! out a stream that fetches each following page only once the consumer has
//! drained the previous one. At most one page of items is buffered. A fetch
//! error is yielded once and ends the stream.

use std::vec;

use futures_util::stream::{self, LocalBoxStream, StreamExt};

use crate::error::{Error, Result};
use crate::flickr_client::PhotoService;
use crate::model::{Account, Album, Page, Photo};

/// Something that can fetch page `n` (1-based) of a listing.
pub trait PageSource {
    type Item;

    async fn fetch_page(&self, page: u32) -> Result<Page<Self::Item>>;
}

/// Items of a listing, each with the page number it came from.
pub type Paged<'a, T> = LocalBoxStream<'a, Result<(u32, T)>>;

struct Cursor<S: PageSource> {
    source: S,
    page: u32,
    total_pages: u32,
    buffer: vec::IntoIter<S::Item>,
}

/// Fetches page 1 of `source` and returns the listing's total item count with a
/// lazy stream over every item.
pub async fn enumerate<'a, S>(source: S) -> Result<(u64, Paged<'a, S::Item>)>
where
    S: PageSource + 'a,
    S::Item: 'a,
{
    let first = source.fetch_page(1).await?;
    log::trace!(
        "Fetched page 1 of {} ({} items)",
        first.total_pages,
        first.items.len()
    );

    let total_items = first.total_items;
    let cursor = Cursor {
        source,
        page: 1,
        total_pages: first.total_pages,
        buffer: first.items.into_iter(),
    };

    let items = stream::try_unfold(cursor, |mut cursor| async move {
        loop {
            if let Some(item) = cursor.buffer.next() {
                let page = cursor.page;
                return Ok(Some(((page, item), cursor)));
            }
            if cursor.page >= cursor.total_pages {
                return Ok::<_, Error>(None);
            }

            let number = cursor.page + 1;
            let page = cursor.source.fetch_page(number).await?;
            log::trace!(
                "Fetched page {number} of {} ({} items)",
                cursor.total_pages,
                page.items.len()
            );
            cursor.page = number;
            cursor.buffer = page.items.into_iter();
        }
    });

    Ok((total_items, items.boxed_local()))
}

/// All photosets of an account.
pub struct AlbumListing<'a, P> {
    pub service: &'a P,
    pub account: &'a Account,
}

impl<P: PhotoService> PageSource for AlbumListing<'_, P> {
    type Item = Album;

    async fn fetch_page(&self, page: u32) -> Result<Page<Album>> {
        self.service.album_page(self.account, page).await
    }
}

/// Photos in one photoset.
pub struct AlbumPhotos<'a, P> {
    pub service: &'a P,
    pub account: &'a Account,
    pub album: Album,
}

impl<P: PhotoService> PageSource for AlbumPhotos<'_, P> {
    type Item = Photo;

    async fn fetch_page(&self, page: u32) -> Result<Page<Photo>> {
        self.service
            .album_photo_page(self.account, &self.album, page)
            .await
    }
}

/// Every photo of an account, in or out of albums.
pub struct AccountPhotos<'a, P> {
    pub service: &'a P,
    pub account: &'a Account,
}

impl<P: PhotoService> PageSource for AccountPhotos<'_, P> {
    type Item = Photo;

    async fn fetch_page(&self, page: u32) -> Result<Page<Photo>> {
        self.service.account_photo_page(self.account, page).await
    }
}
