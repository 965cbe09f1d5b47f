use serde::{Deserialize, Deserializer, Serialize, de};
use std::path::{Path, PathBuf};

/// The Flickr user whose photos are being downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub display_name: String,
}

/// A photoset. Titles are not unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    pub id: String,
    pub title: String,
    pub photo_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    pub id: String,
    /// Largest source URL offered by the listing, if any.
    pub source_url: Option<String>,
    /// Upload time as a unix timestamp.
    pub uploaded_at: Option<i64>,
}

impl Photo {
    /// `id.extension`, with the extension taken from the last path segment of the
    /// retrieval URL.
    pub fn file_name(&self, source_url: &str) -> String {
        let id = &self.id;
        let extension = extension_hint(source_url);
        format!("{id}.{extension}")
    }

    pub fn destination(&self, folder: &Path, source_url: &str) -> PathBuf {
        folder.join(self.file_name(source_url))
    }
}

fn extension_hint(source_url: &str) -> &str {
    let without_query = source_url
        .split(['?', '#'])
        .next()
        .unwrap_or(source_url);
    let segment = without_query.rsplit('/').next().unwrap_or(without_query);
    match segment.rsplit_once('.') {
        Some((_, extension)) if !extension.is_empty() => extension,
        _ => "jpg",
    }
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_pages: u32,
    pub total_items: u64,
}

/// A photo together with the folder it is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub folder: PathBuf,
    pub photo: Photo,
}

// Wire models for the REST responses.

#[derive(Serialize, Deserialize)]
pub struct Content {
    #[serde(rename = "_content")]
    pub content: String,
}

#[derive(Serialize, Deserialize)]
pub struct FindByEmailResponse {
    pub user: User,
}

#[derive(Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: Content,
}

impl From<User> for Account {
    fn from(user: User) -> Self {
        Account {
            id: user.id,
            display_name: user.username.content,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct PhotosetListResponse {
    pub photosets: PhotosetList,
}

#[derive(Serialize, Deserialize)]
pub struct PhotosetList {
    #[serde(deserialize_with = "number_or_string")]
    pub pages: u64,
    #[serde(deserialize_with = "number_or_string")]
    pub total: u64,
    #[serde(default)]
    pub photoset: Vec<Photoset>,
}

#[derive(Serialize, Deserialize)]
pub struct Photoset {
    pub id: String,
    pub title: Content,
    #[serde(default, deserialize_with = "number_or_string")]
    pub photos: u64,
}

impl From<Photoset> for Album {
    fn from(photoset: Photoset) -> Self {
        Album {
            id: photoset.id,
            title: photoset.title.content,
            photo_count: photoset.photos,
        }
    }
}

impl From<PhotosetList> for Page<Album> {
    fn from(list: PhotosetList) -> Self {
        Page {
            items: list.photoset.into_iter().map(Album::from).collect(),
            total_pages: clamp_pages(list.pages),
            total_items: list.total,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct PhotosetPhotosResponse {
    pub photoset: PhotoList,
}

#[derive(Serialize, Deserialize)]
pub struct PeoplePhotosResponse {
    pub photos: PhotoList,
}

#[derive(Serialize, Deserialize)]
pub struct PhotoList {
    #[serde(deserialize_with = "number_or_string")]
    pub pages: u64,
    #[serde(deserialize_with = "number_or_string")]
    pub total: u64,
    #[serde(default)]
    pub photo: Vec<ListedPhoto>,
}

/// Size extras requested with every photo listing, largest first.
pub const SIZE_EXTRAS: [&str; 6] = ["url_o", "url_k", "url_h", "url_b", "url_c", "url_z"];

#[derive(Serialize, Deserialize)]
pub struct ListedPhoto {
    pub id: String,
    pub url_o: Option<String>,
    pub url_k: Option<String>,
    pub url_h: Option<String>,
    pub url_b: Option<String>,
    pub url_c: Option<String>,
    pub url_z: Option<String>,
    #[serde(default, deserialize_with = "optional_number_or_string")]
    pub dateupload: Option<u64>,
}

impl From<ListedPhoto> for Photo {
    fn from(listed: ListedPhoto) -> Self {
        let source_url = [
            listed.url_o,
            listed.url_k,
            listed.url_h,
            listed.url_b,
            listed.url_c,
            listed.url_z,
        ]
        .into_iter()
        .flatten()
        .next();

        Photo {
            id: listed.id,
            source_url,
            uploaded_at: listed.dateupload.and_then(|t| i64::try_from(t).ok()),
        }
    }
}

impl From<PhotoList> for Page<Photo> {
    fn from(list: PhotoList) -> Self {
        Page {
            items: list.photo.into_iter().map(Photo::from).collect(),
            total_pages: clamp_pages(list.pages),
            total_items: list.total,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct SizesResponse {
    pub sizes: Sizes,
}

#[derive(Serialize, Deserialize)]
pub struct Sizes {
    pub size: Vec<Size>,
}

#[derive(Serialize, Deserialize)]
pub struct Size {
    pub label: String,
    pub source: String,
}

impl Sizes {
    /// The original if it is offered, otherwise the largest (last) size.
    pub fn largest(&self) -> Option<&str> {
        self.size
            .iter()
            .find(|size| size.label == "Original")
            .or_else(|| self.size.last())
            .map(|size| size.source.as_str())
    }
}

fn clamp_pages(pages: u64) -> u32 {
    u32::try_from(pages).unwrap_or(u32::MAX)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    String(String),
}

impl NumberOrString {
    fn into_u64<E: de::Error>(self) -> Result<u64, E> {
        match self {
            NumberOrString::Number(n) => Ok(n),
            NumberOrString::String(s) => s.trim().parse().map_err(de::Error::custom),
        }
    }
}

/// Flickr sends counters sometimes as numbers, sometimes as strings.
fn number_or_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    NumberOrString::deserialize(deserializer)?.into_u64()
}

fn optional_number_or_string<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NumberOrString>::deserialize(deserializer)?
        .map(NumberOrString::into_u64)
        .transpose()
}
