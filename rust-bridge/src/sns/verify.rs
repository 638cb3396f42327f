//! SNS message signature verification.
//!
//! Authenticates that a message body was produced by SNS and not forged:
//! the signing certificate URL must be pinned to an SNS domain, and the
//! base64 signature must verify against the certificate's RSA public key
//! over the canonical ordering of the message's fields.
//!
//! Reference: https://docs.aws.amazon.com/sns/latest/dg/sns-verify-signature-of-message.html
//!
//! Verification works on the raw body (the signature covers the raw
//! representation); the parsed form produced later by the pipeline is not
//! consulted. Every failure here maps to a non-retryable 400.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::Verifier;
use rsa::RsaPublicKey;
use serde_json::Value;
use sha1::Sha1;
use sha2::Sha256;
use tracing::warn;
use url::Url;
use x509_parser::pem::parse_x509_pem;

use crate::error::{ApiError, ErrorKind};
use crate::pipeline::{RequestContext, Stage};

/// Fields every SNS message must carry before we even look at the signature.
const REQUIRED_FIELDS: &[&str] = &[
    "Type",
    "MessageId",
    "TopicArn",
    "Timestamp",
    "Message",
    "Signature",
    "SigningCertURL",
    "SignatureVersion",
];

/// Digest algorithm selected by the message's SignatureVersion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignatureVersion {
    /// SignatureVersion "1": SHA1withRSA
    Sha1,
    /// SignatureVersion "2": SHA256withRSA
    Sha256,
}

impl SignatureVersion {
    fn parse(value: &str) -> Result<Self, String> {
        match value {
            "1" => Ok(SignatureVersion::Sha1),
            "2" => Ok(SignatureVersion::Sha256),
            other => Err(format!("unsupported SignatureVersion '{other}'")),
        }
    }
}

/// Pipeline stage verifying the SNS signature of the raw request body.
pub struct SnsVerifyStage {
    client: Client,
    timeout: Duration,
}

impl SnsVerifyStage {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    async fn verify(&self, body: &[u8]) -> Result<(), String> {
        let message: Value =
            serde_json::from_slice(body).map_err(|e| format!("body is not valid JSON: {e}"))?;

        for &field in REQUIRED_FIELDS {
            required_str(&message, field)?;
        }

        let version = SignatureVersion::parse(required_str(&message, "SignatureVersion")?)?;
        let cert_url = validate_cert_url(required_str(&message, "SigningCertURL")?)?;
        let canonical = canonical_string(&message)?;
        let signature = required_str(&message, "Signature")?;

        let pem = fetch_certificate(&self.client, cert_url, self.timeout).await?;
        verify_signature(&pem, version, &canonical, signature)
    }
}

#[async_trait]
impl Stage for SnsVerifyStage {
    fn name(&self) -> &'static str {
        "sns_verify_stage"
    }

    async fn apply(&self, ctx: &mut RequestContext) -> Result<(), ApiError> {
        self.verify(&ctx.body).await.map_err(|reason| {
            warn!(reason = %reason, "sns_verification_failed");
            ApiError::new(
                ErrorKind::SnsVerificationFailed,
                "SNS Message failed verification",
            )
        })
    }
}

fn required_str<'a>(message: &'a Value, field: &str) -> Result<&'a str, String> {
    message
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("missing or non-string field '{field}'"))
}

/// The signing certificate must come from an SNS endpoint, nowhere else.
fn validate_cert_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| format!("invalid SigningCertURL: {e}"))?;

    if url.scheme() != "https" {
        return Err("SigningCertURL must use https".to_string());
    }
    if !url.path().ends_with(".pem") {
        return Err("SigningCertURL must point at a .pem".to_string());
    }

    let host = url
        .host_str()
        .ok_or_else(|| "SigningCertURL has no host".to_string())?;
    let region = host.strip_prefix("sns.").and_then(|rest| {
        rest.strip_suffix(".amazonaws.com.cn")
            .or_else(|| rest.strip_suffix(".amazonaws.com"))
    });
    match region {
        Some(r)
            if !r.is_empty()
                && r.chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-') =>
        {
            Ok(url)
        }
        _ => Err(format!("SigningCertURL host '{host}' is not an SNS endpoint")),
    }
}

/// Build the canonical signed string: selected fields in a fixed order,
/// each as a `Key\n` line followed by a `Value\n` line.
fn canonical_string(message: &Value) -> Result<String, String> {
    let keys: &[&str] = match required_str(message, "Type")? {
        "Notification" => &["Message", "MessageId", "Subject", "Timestamp", "TopicArn", "Type"],
        "SubscriptionConfirmation" | "UnsubscribeConfirmation" => &[
            "Message",
            "MessageId",
            "SubscribeURL",
            "Timestamp",
            "Token",
            "TopicArn",
            "Type",
        ],
        other => return Err(format!("unsignable message type '{other}'")),
    };

    let mut canonical = String::new();
    for key in keys {
        match message.get(key).and_then(Value::as_str) {
            Some(value) => {
                canonical.push_str(key);
                canonical.push('\n');
                canonical.push_str(value);
                canonical.push('\n');
            }
            // Subject is the only optional signed field
            None if *key == "Subject" => {}
            None => return Err(format!("missing or non-string field '{key}'")),
        }
    }
    Ok(canonical)
}

async fn fetch_certificate(
    client: &Client,
    url: Url,
    timeout: Duration,
) -> Result<Vec<u8>, String> {
    let response = client
        .get(url.clone())
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| format!("certificate fetch failed: {e}"))?;

    if !response.status().is_success() {
        return Err(format!(
            "certificate fetch returned status {}",
            response.status()
        ));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| format!("certificate read failed: {e}"))?;
    Ok(body.to_vec())
}

fn verify_signature(
    pem_bytes: &[u8],
    version: SignatureVersion,
    canonical: &str,
    signature_b64: &str,
) -> Result<(), String> {
    let signature_bytes = BASE64
        .decode(signature_b64.trim())
        .map_err(|e| format!("signature is not valid base64: {e}"))?;

    let (_, pem) = parse_x509_pem(pem_bytes)
        .map_err(|e| format!("certificate is not valid PEM: {e:?}"))?;
    let cert = pem
        .parse_x509()
        .map_err(|e| format!("certificate is not valid X.509: {e:?}"))?;

    let public_key = RsaPublicKey::from_public_key_der(cert.public_key().raw)
        .map_err(|e| format!("certificate key is not a supported RSA key: {e}"))?;

    let signature = rsa::pkcs1v15::Signature::try_from(signature_bytes.as_slice())
        .map_err(|e| format!("malformed signature: {e}"))?;

    let verified = match version {
        SignatureVersion::Sha1 => rsa::pkcs1v15::VerifyingKey::<Sha1>::new(public_key)
            .verify(canonical.as_bytes(), &signature),
        SignatureVersion::Sha256 => rsa::pkcs1v15::VerifyingKey::<Sha256>::new(public_key)
            .verify(canonical.as_bytes(), &signature),
    };

    verified.map_err(|_| "signature does not match message".to_string())
}
