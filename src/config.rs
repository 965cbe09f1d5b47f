use std::path::PathBuf;

use url::Url;

use crate::credentials::DEFAULT_FILE_NAME;
use crate::error::{Error, Result};
use crate::oauth::Consumer;

const REST_ENDPOINT: &str = "https://api.flickr.com/services/rest/";
const OAUTH_ENDPOINT: &str = "https://www.flickr.com/services/oauth/";
pub const DEFAULT_PAGE_SIZE: u32 = 500;
pub const MAX_VERBOSITY: u8 = 3;

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub rest: Url,
    /// Base for `request_token`, `authorize` and `access_token`.
    pub oauth: Url,
}

impl Endpoints {
    pub fn flickr() -> Result<Endpoints> {
        Ok(Endpoints {
            rest: Url::parse(REST_ENDPOINT)?,
            oauth: Url::parse(OAUTH_ENDPOINT)?,
        })
    }
}

/// Settings for one run, resolved once in `main` and handed to each component.
#[derive(Debug, Clone)]
pub struct Config {
    api_key: Option<String>,
    api_secret: Option<String>,
    pub credential_path: PathBuf,
    pub verbosity: u8,
    pub endpoints: Endpoints,
    pub page_size: u32,
}

impl Config {
    pub fn new(
        api_key: Option<String>,
        api_secret: Option<String>,
        credential_path: Option<PathBuf>,
        verbosity: u8,
    ) -> Result<Config> {
        let credential_path = match credential_path {
            Some(path) => path,
            None => default_credential_path()?,
        };

        Ok(Config {
            api_key: api_key.filter(|k| !k.is_empty()),
            api_secret: api_secret.filter(|s| !s.is_empty()),
            credential_path,
            verbosity: verbosity.min(MAX_VERBOSITY),
            endpoints: Endpoints::flickr()?,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// The API key and secret. Only commands that call Flickr need them.
    pub fn consumer(&self) -> Result<Consumer> {
        let key = self.api_key.clone().ok_or(Error::ConfigurationMissing {
            name: "Flickr API Key",
            env: "FLICKR_API_KEY",
        })?;
        let secret = self.api_secret.clone().ok_or(Error::ConfigurationMissing {
            name: "Flickr API Secret",
            env: "FLICKR_API_SECRET",
        })?;

        Ok(Consumer { key, secret })
    }
}

fn default_credential_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "could not determine the home directory",
        ))
    })?;
    Ok(home.join(DEFAULT_FILE_NAME))
}
