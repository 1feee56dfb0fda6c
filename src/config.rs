use crate::error::{Error, Result};
use std::env;
use std::time::Duration;

pub const DEFAULT_IMAGE_BUCKET: &str = "land-images";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the hosted backend
#[derive(Debug, Clone)]
pub struct Config {
    /// Project URL, e.g. `https://abcd.supabase.co`
    pub supabase_url: String,
    /// Public (anon) API key sent with every request
    pub anon_key: String,
    /// Storage bucket listing images are uploaded to
    pub image_bucket: String,
    pub request_timeout: Duration,
}

impl Config {
    pub fn new(supabase_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            supabase_url: supabase_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            image_bucket: DEFAULT_IMAGE_BUCKET.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Load from `NECTARIS_*` environment variables, reading `.env` first if present
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let url = required("NECTARIS_SUPABASE_URL")?;
        let key = required("NECTARIS_SUPABASE_ANON_KEY")?;
        let mut config = Config::new(url, key);

        if let Ok(bucket) = env::var("NECTARIS_IMAGE_BUCKET") {
            config.image_bucket = bucket;
        }
        if let Ok(secs) = env::var("NECTARIS_TIMEOUT_SECS") {
            let secs = secs
                .parse::<u64>()
                .map_err(|_| Error::Config(format!("NECTARIS_TIMEOUT_SECS is not a number: {}", secs)))?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.supabase_url, table)
    }

    pub fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{}", self.supabase_url, endpoint)
    }

    pub fn storage_object_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.supabase_url, bucket, key)
    }

    pub fn public_object_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.supabase_url, bucket, key)
    }
}

fn required(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("{} is not set", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_built_from_trimmed_base() {
        let config = Config::new("https://demo.supabase.co/", "anon");
        assert_eq!(
            config.rest_url("land_listings"),
            "https://demo.supabase.co/rest/v1/land_listings"
        );
        assert_eq!(
            config.auth_url("signup"),
            "https://demo.supabase.co/auth/v1/signup"
        );
        assert_eq!(
            config.public_object_url("land-images", "u/1.jpg"),
            "https://demo.supabase.co/storage/v1/object/public/land-images/u/1.jpg"
        );
    }

    #[test]
    fn defaults_apply() {
        let config = Config::new("http://localhost:54321", "anon");
        assert_eq!(config.image_bucket, DEFAULT_IMAGE_BUCKET);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }
}
