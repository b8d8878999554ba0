use std::fmt;

use crate::model::error::CsvBucketError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    AWS,
    GCS,
}

impl Provider {
    pub fn scheme(&self) -> &'static str {
        match self {
            Provider::AWS => "s3",
            Provider::GCS => "gs",
        }
    }
}

pub fn parse_provider_from_uri(bucket_uri: &str) -> Result<Provider, CsvBucketError> {
    match bucket_uri.split_once("://") {
        Some(("s3", _)) => Ok(Provider::AWS),
        Some(("gs", _)) => Ok(Provider::GCS),
        _ => Err(CsvBucketError::InvalidArgument(format!(
            "failed to parse provider of: {}, expected s3:// or gs://",
            bucket_uri
        ))),
    }
}

/// A bucket plus a key, or a key prefix when used for listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BucketLocation {
    provider: Provider,
    bucket: String,
    key: String,
}

impl BucketLocation {
    pub fn parse(bucket_uri: &str) -> Result<Self, CsvBucketError> {
        let provider = parse_provider_from_uri(bucket_uri)?;
        let rest = bucket_uri
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or("");

        let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return Err(CsvBucketError::InvalidArgument(format!(
                "missing bucket name in: {}",
                bucket_uri
            )));
        }
        if bucket.chars().any(|c| c.is_whitespace()) {
            return Err(CsvBucketError::InvalidArgument(format!(
                "invalid bucket name in: {}",
                bucket_uri
            )));
        }

        Ok(Self {
            provider,
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Empty keys and keys ending in `/` name a prefix rather than an object.
    pub fn is_prefix(&self) -> bool {
        self.key.is_empty() || self.key.ends_with('/')
    }

    pub fn file_name(&self) -> Option<&str> {
        if self.is_prefix() {
            return None;
        }
        self.key.rsplit('/').next()
    }

    pub fn join(&self, name: &str) -> Self {
        Self {
            provider: self.provider,
            bucket: self.bucket.clone(),
            key: format!("{}{}", self.key, name),
        }
    }
}

impl fmt::Display for BucketLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", self.provider.scheme(), self.bucket, self.key)
    }
}

pub fn is_csv_key(key: &str) -> bool {
    key.len() >= 4
        && key.is_char_boundary(key.len() - 4)
        && key[key.len() - 4..].eq_ignore_ascii_case(".csv")
}
