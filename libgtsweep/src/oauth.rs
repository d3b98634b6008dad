//! OAuth 1.0a request signing
//!
//! The Twitter v1.1 API authenticates user-context requests with OAuth 1.0a
//! HMAC-SHA1 signatures. Every request carries an `Authorization` header built
//! from the consumer key/secret and the access token/secret of a
//! [`CredentialSet`].

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use secrecy::{ExposeSecret, SecretString};
use sha1::Sha1;
use url::Url;

use crate::credentials::CredentialSet;
use crate::error::PlatformError;

/// Everything except the RFC 3986 unreserved characters
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Signs requests on behalf of one user
#[derive(Debug)]
pub struct OAuth1Signer {
    consumer_key: String,
    consumer_secret: SecretString,
    token: String,
    token_secret: SecretString,
}

impl OAuth1Signer {
    pub fn new(credentials: &CredentialSet) -> Self {
        Self {
            consumer_key: credentials.consumer_key().to_string(),
            consumer_secret: SecretString::from(
                credentials.consumer_secret().expose_secret().to_string(),
            ),
            token: credentials.access_token().to_string(),
            token_secret: SecretString::from(
                credentials.access_secret().expose_secret().to_string(),
            ),
        }
    }

    /// Build the `Authorization` header for a request
    ///
    /// Query parameters in `url` are included in the signature. Requests sent
    /// by this crate carry no form body, so no other parameters are signed.
    pub fn authorization_header(&self, method: &str, url: &str) -> Result<String, PlatformError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        self.authorization_header_with(method, url, &BTreeMap::new(), &generate_nonce(), timestamp)
    }

    fn authorization_header_with(
        &self,
        method: &str,
        url: &str,
        body_params: &BTreeMap<String, String>,
        nonce: &str,
        timestamp: u64,
    ) -> Result<String, PlatformError> {
        let mut oauth_params: BTreeMap<String, String> = BTreeMap::new();
        oauth_params.insert("oauth_consumer_key".to_string(), self.consumer_key.clone());
        oauth_params.insert("oauth_nonce".to_string(), nonce.to_string());
        oauth_params.insert("oauth_signature_method".to_string(), "HMAC-SHA1".to_string());
        oauth_params.insert("oauth_timestamp".to_string(), timestamp.to_string());
        oauth_params.insert("oauth_token".to_string(), self.token.clone());
        oauth_params.insert("oauth_version".to_string(), "1.0".to_string());

        let mut signed_params = oauth_params.clone();
        for (k, v) in body_params {
            signed_params.insert(k.clone(), v.clone());
        }

        let signature = self.signature(method, url, &signed_params)?;
        oauth_params.insert("oauth_signature".to_string(), signature);

        let header_parts: Vec<String> = oauth_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .collect();

        Ok(format!("OAuth {}", header_parts.join(", ")))
    }

    /// HMAC-SHA1 over the signature base string
    fn signature(
        &self,
        method: &str,
        url: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<String, PlatformError> {
        let parsed_url = Url::parse(url)
            .map_err(|e| PlatformError::Api(format!("Invalid request URL '{}': {}", url, e)))?;

        let base_url = match parsed_url.port() {
            Some(port) => format!(
                "{}://{}:{}{}",
                parsed_url.scheme(),
                parsed_url.host_str().unwrap_or(""),
                port,
                parsed_url.path()
            ),
            None => format!(
                "{}://{}{}",
                parsed_url.scheme(),
                parsed_url.host_str().unwrap_or(""),
                parsed_url.path()
            ),
        };

        let mut all_params = params.clone();
        for (k, v) in parsed_url.query_pairs() {
            all_params.insert(k.to_string(), v.to_string());
        }

        let param_string = all_params
            .iter()
            .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let signature_base = format!(
            "{}&{}&{}",
            method.to_uppercase(),
            percent_encode(&base_url),
            percent_encode(&param_string)
        );

        let signing_key = format!(
            "{}&{}",
            percent_encode(self.consumer_secret.expose_secret()),
            percent_encode(self.token_secret.expose_secret())
        );

        let mut mac = Hmac::<Sha1>::new_from_slice(signing_key.as_bytes())
            .map_err(|e| PlatformError::Authentication(format!("Cannot sign request: {}", e)))?;
        mac.update(signature_base.as_bytes());

        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

fn generate_nonce() -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    let bytes: Vec<u8> = (0..32).map(|_| rand::random()).collect();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Percent-encode a string per RFC 3986
fn percent_encode(s: &str) -> String {
    utf8_percent_encode(s, OAUTH_ENCODE_SET).to_string()
}
