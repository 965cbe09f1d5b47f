use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::flickr_client::PhotoService;
use crate::model::{Account, Album, Page, Photo};

pub fn account() -> Account {
    Account {
        id: "12345@N00".to_string(),
        display_name: "Jane Doe".to_string(),
    }
}

pub fn album(id: &str, title: &str) -> Album {
    Album {
        id: id.to_string(),
        title: title.to_string(),
        photo_count: 0,
    }
}

pub fn photo(id: &str) -> Photo {
    Photo {
        id: id.to_string(),
        source_url: Some(source_url(id)),
        uploaded_at: None,
    }
}

pub fn source_url(id: &str) -> String {
    format!("https://live.staticflickr.com/65535/{id}_abc_o.jpg")
}

fn page<T: Clone>(pages: &[Vec<T>], number: u32) -> Page<T> {
    Page {
        items: pages
            .get(number as usize - 1)
            .cloned()
            .unwrap_or_default(),
        total_pages: pages.len() as u32,
        total_items: pages.iter().map(|p| p.len() as u64).sum(),
    }
}

/// In-memory stand-in for Flickr.
#[derive(Default)]
pub struct FakeService {
    pub album_pages: Vec<Vec<Album>>,
    pub album_photos: HashMap<String, Vec<Vec<Photo>>>,
    pub account_photos: Vec<Vec<Photo>>,
    pub failing_urls: HashSet<String>,
    /// Photo ids whose source lookup fails.
    pub failing_sources: HashSet<String>,
    pub calls: RefCell<Vec<String>>,
}

impl FakeService {
    pub fn with_album(mut self, album: &Album, pages: Vec<Vec<Photo>>) -> Self {
        self.album_photos.insert(album.id.clone(), pages);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

impl PhotoService for FakeService {
    async fn find_account_by_email(&self, email: &str) -> Result<Account> {
        self.record(format!("find {email}"));
        Ok(account())
    }

    async fn album_page(&self, _account: &Account, page_number: u32) -> Result<Page<Album>> {
        self.record(format!("albums {page_number}"));
        Ok(page(&self.album_pages, page_number))
    }

    async fn album_photo_page(
        &self,
        _account: &Account,
        album: &Album,
        page_number: u32,
    ) -> Result<Page<Photo>> {
        self.record(format!("album {} {page_number}", album.id));
        let pages = self.album_photos.get(&album.id).cloned().unwrap_or_default();
        Ok(page(&pages, page_number))
    }

    async fn account_photo_page(&self, _account: &Account, page_number: u32) -> Result<Page<Photo>> {
        self.record(format!("photos {page_number}"));
        Ok(page(&self.account_photos, page_number))
    }

    async fn photo_source(&self, photo: &Photo) -> Result<String> {
        if self.failing_sources.contains(&photo.id) {
            return Err(Error::Api {
                code: 1,
                message: "Photo not found".to_string(),
            });
        }
        Ok(photo
            .source_url
            .clone()
            .unwrap_or_else(|| source_url(&photo.id)))
    }

    async fn fetch_photo(&self, source_url: &str) -> Result<Vec<u8>> {
        self.record(format!("fetch {source_url}"));
        if self.failing_urls.contains(source_url) {
            return Err(Error::Api {
                code: 404,
                message: "not found".to_string(),
            });
        }
        Ok(source_url.as_bytes().to_vec())
    }
}
