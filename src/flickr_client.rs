use reqwest::{Client, header};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::config::{Config, Endpoints};
use crate::credentials::Credential;
use crate::error::{Error, Result};
use crate::model::{
    Account, Album, FindByEmailResponse, Page, PeoplePhotosResponse, Photo,
    PhotosetListResponse, PhotosetPhotosResponse, SIZE_EXTRAS, SizesResponse,
};
use crate::oauth::{self, Consumer, Nonce};

const USER_AGENT: &str = concat!("flickr-downloader/", env!("CARGO_PKG_VERSION"));

/// Read access to a Flickr account's albums and photos.
pub trait PhotoService {
    async fn find_account_by_email(&self, email: &str) -> Result<Account>;

    async fn album_page(&self, account: &Account, page: u32) -> Result<Page<Album>>;

    async fn album_photo_page(
        &self,
        account: &Account,
        album: &Album,
        page: u32,
    ) -> Result<Page<Photo>>;

    async fn account_photo_page(&self, account: &Account, page: u32) -> Result<Page<Photo>>;

    /// URL of the largest available size of `photo`.
    async fn photo_source(&self, photo: &Photo) -> Result<String>;

    async fn fetch_photo(&self, source_url: &str) -> Result<Vec<u8>>;
}

/// A request token waiting for the user to approve it.
#[derive(Debug, Clone)]
pub struct PendingAuthorization {
    pub authorize_url: Url,
    pub request_token: Credential,
}

/// The OAuth 1.0a out-of-band flow.
pub trait Authorizer {
    async fn request_authorization(&self) -> Result<PendingAuthorization>;

    async fn exchange_verifier(
        &self,
        pending: &PendingAuthorization,
        verifier: &str,
    ) -> Result<Credential>;
}

pub struct FlickrClient {
    client: Client,
    consumer: Consumer,
    credential: Option<Credential>,
    endpoints: Endpoints,
    page_size: u32,
}

impl FlickrClient {
    pub fn new(consumer: Consumer, endpoints: Endpoints, page_size: u32) -> Result<FlickrClient> {
        Ok(FlickrClient {
            client: Self::build_client()?,
            consumer,
            credential: None,
            endpoints,
            page_size,
        })
    }

    pub fn from_config(config: &Config) -> Result<FlickrClient> {
        Self::new(
            config.consumer()?,
            config.endpoints.clone(),
            config.page_size,
        )
    }

    /// Sign every subsequent call with `credential` instead of sending the bare
    /// API key.
    pub fn with_credential(mut self, credential: Credential) -> FlickrClient {
        self.credential = Some(credential);
        self
    }

    fn build_client() -> Result<Client> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(USER_AGENT),
        );

        Ok(reqwest::Client::builder()
            .default_headers(headers)
            .build()?)
    }

    fn signed_url(
        &self,
        url: &Url,
        params: &[(String, String)],
        token: Option<&Credential>,
    ) -> Result<Url> {
        let signed = oauth::sign("GET", url, params, &self.consumer, token, &Nonce::generate())?;
        let mut url = url.clone();
        url.query_pairs_mut().extend_pairs(signed);
        Ok(url)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, args: &[(&str, String)]) -> Result<T> {
        let mut params: Vec<(String, String)> = vec![
            ("method".into(), method.into()),
            ("format".into(), "json".into()),
            ("nojsoncallback".into(), "1".into()),
        ];
        params.extend(args.iter().map(|(k, v)| (k.to_string(), v.clone())));

        let url = match &self.credential {
            Some(credential) => self.signed_url(&self.endpoints.rest, &params, Some(credential))?,
            None => {
                params.push(("api_key".into(), self.consumer.key.clone()));
                let mut url = self.endpoints.rest.clone();
                url.query_pairs_mut().extend_pairs(params);
                url
            }
        };

        log::trace!("Calling {method}");
        let response = self.client.get(url).send().await?.error_for_status()?;
        let body: Value = response.json().await?;

        if body.get("stat").and_then(Value::as_str) != Some("ok") {
            let code = body.get("code").and_then(Value::as_i64).unwrap_or(0);
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string();
            return Err(Error::Api { code, message });
        }

        Ok(serde_json::from_value(body)?)
    }

    fn listing_args(&self, page: u32) -> Vec<(&'static str, String)> {
        let extras = SIZE_EXTRAS
            .iter()
            .copied()
            .chain(["date_upload"])
            .collect::<Vec<_>>()
            .join(",");

        vec![
            ("page", page.to_string()),
            ("per_page", self.page_size.to_string()),
            ("extras", extras),
        ]
    }

    async fn oauth_call(
        &self,
        endpoint: &str,
        params: &[(String, String)],
        token: Option<&Credential>,
    ) -> Result<Credential> {
        let url = self.endpoints.oauth.join(endpoint)?;
        let url = self.signed_url(&url, params, token)?;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::OAuth(format!("{endpoint} returned {status}: {body}")));
        }

        oauth::parse_token_response(&body)
    }
}

impl PhotoService for FlickrClient {
    async fn find_account_by_email(&self, email: &str) -> Result<Account> {
        let response = self
            .call::<FindByEmailResponse>(
                "flickr.people.findByEmail",
                &[("find_email", email.to_string())],
            )
            .await;

        match response {
            Ok(response) => Ok(response.user.into()),
            Err(Error::Api { message, .. }) => Err(Error::AccountNotFound {
                email: email.to_string(),
                message,
            }),
            Err(err) => Err(err),
        }
    }

    async fn album_page(&self, account: &Account, page: u32) -> Result<Page<Album>> {
        let args = [
            ("user_id", account.id.clone()),
            ("page", page.to_string()),
            ("per_page", self.page_size.to_string()),
        ];
        let response: PhotosetListResponse = self.call("flickr.photosets.getList", &args).await?;
        Ok(response.photosets.into())
    }

    async fn album_photo_page(
        &self,
        account: &Account,
        album: &Album,
        page: u32,
    ) -> Result<Page<Photo>> {
        let mut args = self.listing_args(page);
        args.push(("photoset_id", album.id.clone()));
        args.push(("user_id", account.id.clone()));
        let response: PhotosetPhotosResponse =
            self.call("flickr.photosets.getPhotos", &args).await?;
        Ok(response.photoset.into())
    }

    async fn account_photo_page(&self, account: &Account, page: u32) -> Result<Page<Photo>> {
        let mut args = self.listing_args(page);
        args.push(("user_id", account.id.clone()));
        let response: PeoplePhotosResponse = self.call("flickr.people.getPhotos", &args).await?;
        Ok(response.photos.into())
    }

    async fn photo_source(&self, photo: &Photo) -> Result<String> {
        if let Some(source) = &photo.source_url {
            return Ok(source.clone());
        }

        let response: SizesResponse = self
            .call("flickr.photos.getSizes", &[("photo_id", photo.id.clone())])
            .await?;
        response
            .sizes
            .largest()
            .map(str::to_string)
            .ok_or_else(|| Error::Api {
                code: 0,
                message: format!("no sizes listed for photo {}", photo.id),
            })
    }

    async fn fetch_photo(&self, source_url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(source_url)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

impl Authorizer for FlickrClient {
    async fn request_authorization(&self) -> Result<PendingAuthorization> {
        let params = [("oauth_callback".to_string(), "oob".to_string())];
        let request_token = self.oauth_call("request_token", &params, None).await?;

        let mut authorize_url = self.endpoints.oauth.join("authorize")?;
        authorize_url
            .query_pairs_mut()
            .append_pair("oauth_token", &request_token.token)
            .append_pair("perms", "read");

        Ok(PendingAuthorization {
            authorize_url,
            request_token,
        })
    }

    async fn exchange_verifier(
        &self,
        pending: &PendingAuthorization,
        verifier: &str,
    ) -> Result<Credential> {
        let params = [("oauth_verifier".to_string(), verifier.to_string())];
        self.oauth_call("access_token", &params, Some(&pending.request_token))
            .await
    }
}
