//! AWS Signature Version 4 request signing.
//!
//! Only what the agent runtime and the S3 REST calls need: header based
//! signing with the payload hashed in full.
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

use super::credentials::Credentials;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

#[derive(Error, Debug)]
pub enum SigningError {
    #[error("URL has no host: {0}")]
    MissingHost(String),

    #[error("Invalid signing key: {0}")]
    InvalidKey(String),
}

pub struct SigningParams<'a> {
    pub credentials: &'a Credentials,
    pub region: &'a str,
    pub service: &'a str,
    pub time: DateTime<Utc>,
    /// S3 requires the payload hash to travel as `x-amz-content-sha256`
    pub sign_content_sha256: bool,
}

/// Percent-encode with the SigV4 rules: everything but `A-Z a-z 0-9 - _ . ~`.
pub fn uri_encode(input: &str, encode_slash: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b'/' if !encode_slash => out.push('/'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Sign a request and return the headers the caller must attach.
///
/// `headers` are extra headers that take part in the signature (content type
/// for instance). They are returned again alongside the `x-amz-*` headers and
/// `authorization`, so the caller can set everything from one list. `host` is
/// signed but not returned since the HTTP client derives it from the URL.
///
/// Query strings are expected to be built with [`uri_encode`] already.
pub fn sign_request(
    method: &str,
    url: &Url,
    headers: &[(&str, &str)],
    payload: &[u8],
    params: &SigningParams<'_>,
) -> Result<Vec<(String, String)>, SigningError> {
    let amz_date = params.time.format("%Y%m%dT%H%M%SZ").to_string();
    let date = params.time.format("%Y%m%d").to_string();
    let payload_hash = hex::encode(Sha256::digest(payload));

    let mut signed: Vec<(String, String)> = headers
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value.trim().to_string()))
        .collect();
    signed.push(("host".to_string(), host_header(url)?));
    signed.push(("x-amz-date".to_string(), amz_date.clone()));
    if params.sign_content_sha256 {
        signed.push(("x-amz-content-sha256".to_string(), payload_hash.clone()));
    }
    if let Some(token) = &params.credentials.session_token {
        signed.push(("x-amz-security-token".to_string(), token.clone()));
    }
    signed.sort_by(|a, b| a.0.cmp(&b.0));

    let canonical_headers: String = signed
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name, value))
        .collect();
    let signed_header_names = signed
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(";");

    let canonical_request = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method,
        canonical_uri(url, params.service),
        canonical_query(url),
        canonical_headers,
        signed_header_names,
        payload_hash
    );

    let scope = format!(
        "{}/{}/{}/aws4_request",
        date, params.region, params.service
    );
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        scope,
        hex::encode(Sha256::digest(canonical_request.as_bytes()))
    );

    let key = signing_key(
        &params.credentials.secret_access_key,
        &date,
        params.region,
        params.service,
    )?;
    let signature = hex::encode(hmac(&key, string_to_sign.as_bytes())?);

    let authorization = format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        ALGORITHM, params.credentials.access_key_id, scope, signed_header_names, signature
    );

    let mut out: Vec<(String, String)> = signed
        .into_iter()
        .filter(|(name, _)| name != "host")
        .collect();
    out.push(("authorization".to_string(), authorization));
    Ok(out)
}

/// Derive the per-day, per-region, per-service signing key.
pub fn signing_key(
    secret_access_key: &str,
    date: &str,
    region: &str,
    service: &str,
) -> Result<Vec<u8>, SigningError> {
    let k_date = hmac(
        format!("AWS4{}", secret_access_key).as_bytes(),
        date.as_bytes(),
    )?;
    let k_region = hmac(&k_date, region.as_bytes())?;
    let k_service = hmac(&k_region, service.as_bytes())?;
    hmac(&k_service, b"aws4_request")
}

fn hmac(key: &[u8], data: &[u8]) -> Result<Vec<u8>, SigningError> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| SigningError::InvalidKey(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn host_header(url: &Url) -> Result<String, SigningError> {
    let host = url
        .host_str()
        .ok_or_else(|| SigningError::MissingHost(url.to_string()))?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

// S3 signs the path as sent; every other service encodes it a second time.
fn canonical_uri(url: &Url, service: &str) -> String {
    let path = match url.path() {
        "" => "/",
        path => path,
    };
    if service == "s3" {
        path.to_string()
    } else {
        uri_encode(path, false)
    }
}

fn canonical_query(url: &Url) -> String {
    let mut pairs: Vec<(&str, &str)> = url
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .collect();
    pairs.sort();
    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SECRET: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";

    #[test]
    fn test_uri_encode() {
        assert_eq!(uri_encode("scraped-data/a b.json", false), "scraped-data/a%20b.json");
        assert_eq!(uri_encode("scraped-data/", true), "scraped-data%2F");
        assert_eq!(uri_encode("a~b_c.d", true), "a~b_c.d");
        assert_eq!(uri_encode("é", true), "%C3%A9");
    }

    #[test]
    fn test_signing_key_matches_published_example() -> Result<(), SigningError> {
        let key = signing_key(SECRET, "20120215", "us-east-1", "iam")?;
        assert_eq!(
            hex::encode(key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
        Ok(())
    }

    #[test]
    fn test_get_vanilla_signature() -> Result<(), Box<dyn std::error::Error>> {
        let credentials = Credentials::new("AKIDEXAMPLE", SECRET);
        let params = SigningParams {
            credentials: &credentials,
            region: "us-east-1",
            service: "service",
            time: Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap(),
            sign_content_sha256: false,
        };
        let url = Url::parse("https://example.amazonaws.com/")?;

        let headers = sign_request("GET", &url, &[], b"", &params)?;

        let authorization = headers
            .iter()
            .find(|(name, _)| name == "authorization")
            .map(|(_, value)| value.as_str());
        assert_eq!(
            authorization,
            Some(
                "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/service/aws4_request, \
                 SignedHeaders=host;x-amz-date, \
                 Signature=5fa00fa31553b73ebf1942676e86291e8372ff2a2260956d9b8aae1d763fbf31"
            )
        );
        assert!(headers
            .iter()
            .any(|(name, value)| name == "x-amz-date" && value == "20150830T123600Z"));
        assert!(!headers.iter().any(|(name, _)| name == "host"));
        Ok(())
    }

    #[test]
    fn test_s3_signing_adds_content_hash_and_token() -> Result<(), Box<dyn std::error::Error>> {
        let credentials = Credentials::new("AKIDEXAMPLE", SECRET).with_session_token("session");
        let params = SigningParams {
            credentials: &credentials,
            region: "us-east-1",
            service: "s3",
            time: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            sign_content_sha256: true,
        };
        let url = Url::parse("http://127.0.0.1:9000/bucket?prefix=scraped-data%2F&list-type=2")?;

        let headers = sign_request("GET", &url, &[], b"", &params)?;
        let names: Vec<&str> = headers.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "x-amz-content-sha256",
                "x-amz-date",
                "x-amz-security-token",
                "authorization"
            ]
        );
        assert!(headers[3]
            .1
            .contains("SignedHeaders=host;x-amz-content-sha256;x-amz-date;x-amz-security-token"));
        Ok(())
    }

    #[test]
    fn test_canonical_query_is_sorted() -> Result<(), url::ParseError> {
        let url = Url::parse("https://h/b?prefix=p&list-type=2&continuation-token=t")?;
        assert_eq!(
            canonical_query(&url),
            "continuation-token=t&list-type=2&prefix=p"
        );
        Ok(())
    }

    #[test]
    fn test_canonical_uri_double_encodes_outside_s3() -> Result<(), url::ParseError> {
        let url = Url::parse("https://h/agents/A%3AB/text")?;
        assert_eq!(canonical_uri(&url, "s3"), "/agents/A%3AB/text");
        assert_eq!(canonical_uri(&url, "bedrock"), "/agents/A%253AB/text");
        Ok(())
    }
}
