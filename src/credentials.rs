use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provider credentials, tagged by `provider` when read from a config file.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum ProviderCredentials {
    S3(S3Credentials),
    Gcs(GcsCredentials),
}

impl ProviderCredentials {
    pub fn bucket(&self) -> &str {
        match self {
            ProviderCredentials::S3(s3) => &s3.bucket,
            ProviderCredentials::Gcs(gcs) => &gcs.bucket,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        match self {
            ProviderCredentials::S3(_) => "s3",
            ProviderCredentials::Gcs(_) => "gcs",
        }
    }
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderCredentials::S3(s3) => s3.fmt(f),
            ProviderCredentials::Gcs(gcs) => gcs.fmt(f),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct S3Credentials {
    pub region: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Custom endpoint for S3-compatible services.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl fmt::Debug for S3Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Credentials")
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("access_key_id", &redact(&self.access_key_id))
            .field("secret_access_key", &"***")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GcsCredentials {
    pub client_email: String,
    pub private_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_id: Option<String>,
    pub bucket: String,
}

impl GcsCredentials {
    /// Keys pasted from JSON often carry escaped newlines.
    pub fn normalized_private_key(&self) -> String {
        self.private_key.replace("\\n", "\n")
    }

    /// Renders the service-account document expected by the GCS client.
    pub fn service_account_json(&self) -> String {
        serde_json::json!({
            "client_email": self.client_email,
            "private_key": self.normalized_private_key(),
            "private_key_id": self.private_key_id.clone().unwrap_or_default(),
        })
        .to_string()
    }
}

impl fmt::Debug for GcsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GcsCredentials")
            .field("client_email", &self.client_email)
            .field("private_key", &"***")
            .field("private_key_id", &self.private_key_id.as_deref().map(redact))
            .field("bucket", &self.bucket)
            .finish()
    }
}

fn redact(value: &str) -> String {
    let visible: String = value.chars().take(4).collect();
    format!("{visible}***")
}

/// A file directly under a listed prefix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_are_tagged_by_provider() {
        let yaml = "provider: s3\nregion: eu-west-1\nbucket: landing\naccess_key_id: AKIAEXAMPLE\nsecret_access_key: hunter2\n";
        let creds: ProviderCredentials = serde_yaml::from_str(yaml).expect("parse s3");
        assert_eq!(creds.provider_name(), "s3");
        assert_eq!(creds.bucket(), "landing");

        let json = r#"{"provider":"gcs","client_email":"svc@example.iam","private_key":"-----BEGIN\\nKEY","bucket":"raw"}"#;
        let creds: ProviderCredentials = serde_json::from_str(json).expect("parse gcs");
        let ProviderCredentials::Gcs(gcs) = creds else {
            panic!("expected gcs credentials");
        };
        assert_eq!(gcs.normalized_private_key(), "-----BEGIN\nKEY");
    }

    #[test]
    fn debug_output_hides_secrets() {
        let creds = ProviderCredentials::S3(S3Credentials {
            region: "eu-west-1".into(),
            bucket: "landing".into(),
            access_key_id: "AKIAEXAMPLE".into(),
            secret_access_key: "hunter2".into(),
            endpoint: None,
        });
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("AKIAEXAMPLE"));
        assert!(rendered.contains("AKIA***"));
    }
}
