//! Posts to Twitter/X via the v2 `POST /2/tweets` endpoint.
//!
//! Requests are signed with OAuth 1.0a (HMAC-SHA1) user-context
//! credentials. The JSON body is not part of the signature base string.
//! Twitter rejects duplicate statuses, so every post carries a timestamp
//! suffix.

use async_trait::async_trait;
use base64::prelude::*;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use sha1::Sha1;

use crate::channel::{AlertChannel, DeliveryError};
use crate::delivery::{ensure_success, with_timestamp};

const TWEETS_URL: &str = "https://api.twitter.com/2/tweets";

/// RFC 3986 unreserved characters are the only ones OAuth leaves unescaped.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const NONCE_LEN: usize = 32;

/// The `[twitter]` config block.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TwitterConfig {
    pub api_key: String,
    pub api_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl TwitterConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
            && !self.api_secret.is_empty()
            && !self.access_token.is_empty()
            && !self.access_token_secret.is_empty()
    }
}

fn encode(s: &str) -> String {
    utf8_percent_encode(s, OAUTH_ENCODE_SET).to_string()
}

/// HMAC-SHA1 signature over the OAuth signature base string.
fn sign(
    consumer_secret: &str,
    token_secret: &str,
    method: &str,
    url: &str,
    params: &[(&str, &str)],
) -> Result<String, DeliveryError> {
    let mut pairs: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    pairs.sort();

    let param_string = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let base = format!("{method}&{}&{}", encode(url), encode(&param_string));
    let key = format!("{}&{}", encode(consumer_secret), encode(token_secret));

    let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes())
        .map_err(|e| DeliveryError::Signing(e.to_string()))?;
    mac.update(base.as_bytes());
    Ok(BASE64_STANDARD.encode(mac.finalize().into_bytes()))
}

/// Build the `Authorization: OAuth ...` header value.
///
/// `extra_params` are query or form parameters that must be covered by the
/// signature; JSON bodies contribute none.
fn authorization_header(
    config: &TwitterConfig,
    method: &str,
    url: &str,
    extra_params: &[(&str, &str)],
    nonce: &str,
    timestamp: u64,
) -> Result<String, DeliveryError> {
    let timestamp = timestamp.to_string();
    let oauth_params = [
        ("oauth_consumer_key", config.api_key.as_str()),
        ("oauth_nonce", nonce),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp.as_str()),
        ("oauth_token", config.access_token.as_str()),
        ("oauth_version", "1.0"),
    ];

    let signed: Vec<(&str, &str)> = oauth_params.iter().chain(extra_params).copied().collect();
    let signature = sign(
        &config.api_secret,
        &config.access_token_secret,
        method,
        url,
        &signed,
    )?;

    let fields = oauth_params
        .iter()
        .copied()
        .chain(std::iter::once(("oauth_signature", signature.as_str())))
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!("OAuth {fields}"))
}

fn nonce() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}

pub struct TwitterChannel {
    config: TwitterConfig,
    client: reqwest::Client,
}

impl TwitterChannel {
    pub fn new(config: TwitterConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl AlertChannel for TwitterChannel {
    fn name(&self) -> &'static str {
        "twitter"
    }

    async fn send(&self, message: &str) -> Result<(), DeliveryError> {
        let timestamp = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default();
        let auth = authorization_header(&self.config, "POST", TWEETS_URL, &[], &nonce(), timestamp)?;

        let response = self
            .client
            .post(TWEETS_URL)
            .header(reqwest::header::AUTHORIZATION, auth)
            .json(&serde_json::json!({ "text": with_timestamp(message) }))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // Credentials and expected signature from Twitter's "Creating a
    // signature" developer documentation.
    fn doc_config() -> TwitterConfig {
        TwitterConfig {
            api_key: "xvz1evFS4wEEPTGEFPHBog".to_string(),
            api_secret: "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw".to_string(),
            access_token: "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb".to_string(),
            access_token_secret: "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE".to_string(),
        }
    }

    const DOC_NONCE: &str = "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg";
    const DOC_TIMESTAMP: u64 = 1318622958;

    #[test]
    fn encode_leaves_unreserved_characters() {
        assert_eq!(encode("Ladies + Gentlemen"), "Ladies%20%2B%20Gentlemen");
        assert_eq!(encode("a-b.c_d~e"), "a-b.c_d~e");
        assert_eq!(encode("!"), "%21");
    }

    #[test]
    fn signature_matches_documented_example() {
        let header = authorization_header(
            &doc_config(),
            "POST",
            "https://api.twitter.com/1.1/statuses/update.json",
            &[
                ("status", "Hello Ladies + Gentlemen, a signed OAuth request!"),
                ("include_entities", "true"),
            ],
            DOC_NONCE,
            DOC_TIMESTAMP,
        )
        .expect("signing should succeed");

        assert!(header.starts_with("OAuth "));
        assert!(header.contains(r#"oauth_signature="hCtSmYh%2BiHYCEqBWrE7C7hYmtUk%3D""#));
        assert!(header.contains(r#"oauth_consumer_key="xvz1evFS4wEEPTGEFPHBog""#));
    }

    #[test]
    fn tweets_endpoint_signature_without_body_params() {
        let header =
            authorization_header(&doc_config(), "POST", TWEETS_URL, &[], DOC_NONCE, DOC_TIMESTAMP)
                .expect("signing should succeed");
        assert!(header.contains(r#"oauth_signature="KW%2FbTR%2F89oblzvjn7CwP2L8j5qQ%3D""#));
    }

    #[test]
    fn nonce_is_alphanumeric() {
        let n = nonce();
        assert_eq!(n.len(), NONCE_LEN);
        assert!(n.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn requires_all_four_credentials() {
        let mut cfg = doc_config();
        assert!(cfg.is_configured());
        cfg.access_token_secret.clear();
        assert!(!cfg.is_configured());
    }
}
