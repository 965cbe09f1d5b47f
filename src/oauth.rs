//! OAuth 1.0a request signing (HMAC-SHA1), as required by the Flickr API.

use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use rand::{Rng, distributions::Alphanumeric};
use sha1::Sha1;
use url::Url;

use crate::credentials::Credential;
use crate::error::{Error, Result};

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const VERSION: &str = "1.0";

/// API key and secret identifying this application.
#[derive(Debug, Clone)]
pub struct Consumer {
    pub key: String,
    pub secret: String,
}

/// Per-request values that make a signature unique.
pub struct Nonce {
    pub nonce: String,
    pub timestamp: i64,
}

impl Nonce {
    pub fn generate() -> Self {
        let nonce = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();

        Nonce {
            nonce,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Percent encoding per RFC 3986, leaving only unreserved characters as-is.
pub fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Returns `params` extended with the `oauth_*` parameters and the signature for
/// a request to `url`. Query parameters already on `url` are not signed, pass
/// them in `params` instead.
pub fn sign(
    method: &str,
    url: &Url,
    params: &[(String, String)],
    consumer: &Consumer,
    token: Option<&Credential>,
    nonce: &Nonce,
) -> Result<Vec<(String, String)>> {
    let mut signed: Vec<(String, String)> = params.to_vec();
    signed.push(("oauth_consumer_key".into(), consumer.key.clone()));
    signed.push(("oauth_nonce".into(), nonce.nonce.clone()));
    signed.push(("oauth_signature_method".into(), SIGNATURE_METHOD.into()));
    signed.push(("oauth_timestamp".into(), nonce.timestamp.to_string()));
    if let Some(token) = token {
        signed.push(("oauth_token".into(), token.token.clone()));
    }
    signed.push(("oauth_version".into(), VERSION.into()));

    let base = signature_base(method, url, &signed);
    let key = format!(
        "{}&{}",
        encode(&consumer.secret),
        encode(token.map(|t| t.secret.as_str()).unwrap_or(""))
    );

    let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes())
        .map_err(|err| Error::OAuth(err.to_string()))?;
    mac.update(base.as_bytes());
    let signature = STANDARD.encode(mac.finalize().into_bytes());

    signed.push(("oauth_signature".into(), signature));
    Ok(signed)
}

fn signature_base(method: &str, url: &Url, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    encoded.sort();

    let normalized = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut base_url = url.clone();
    base_url.set_query(None);
    base_url.set_fragment(None);

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        encode(base_url.as_str()),
        encode(&normalized)
    )
}

/// Parses an `oauth_token=..&oauth_token_secret=..` response body.
pub fn parse_token_response(body: &str) -> Result<Credential> {
    let mut token = None;
    let mut secret = None;
    for (key, value) in url::form_urlencoded::parse(body.trim().as_bytes()) {
        match key.as_ref() {
            "oauth_token" => token = Some(value.into_owned()),
            "oauth_token_secret" => secret = Some(value.into_owned()),
            "oauth_problem" => return Err(Error::OAuth(value.into_owned())),
            _ => {}
        }
    }

    match (token, secret) {
        (Some(token), Some(secret)) => Ok(Credential { token, secret }),
        _ => Err(Error::OAuth(format!("unexpected token response: {body}"))),
    }
}
