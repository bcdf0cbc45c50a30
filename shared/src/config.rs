use std::env;

const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
const DEFAULT_SITES: &str = "WFD01,BSN01,HSR01,MAR01,SKM01";
const DEFAULT_MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024; // 5MB

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is not a valid number: {value}")]
    InvalidNumber { name: &'static str, value: String },
}

/// Where the service account key comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum CredentialSource {
    Inline(String),
    File(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub admin_password: String,
    pub spreadsheet_id: String,
    pub worksheet_name: String,
    pub sheets_api_base: String,
    pub credentials: CredentialSource,
    pub photo_bucket: String,
    pub photo_prefix: String,
    pub photo_public_base_url: Option<String>,
    pub sites: Vec<String>,
    pub max_photo_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let admin_password = get("ADMIN_PASSWORD").unwrap_or_else(|| {
            tracing::warn!("ADMIN_PASSWORD not set, falling back to the built-in default");
            DEFAULT_ADMIN_PASSWORD.to_string()
        });

        let credentials = match get("GOOGLE_SERVICE_ACCOUNT_JSON") {
            Some(json) => CredentialSource::Inline(json),
            None => CredentialSource::File(
                get("GOOGLE_SERVICE_ACCOUNT_FILE").unwrap_or_else(|| "hybb-creds.json".to_string()),
            ),
        };

        let sites = get("SITES")
            .unwrap_or_else(|| DEFAULT_SITES.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_photo_bytes = match get("MAX_PHOTO_BYTES") {
            Some(value) => value.trim().parse::<usize>().map_err(|_| ConfigError::InvalidNumber {
                name: "MAX_PHOTO_BYTES",
                value,
            })?,
            None => DEFAULT_MAX_PHOTO_BYTES,
        };

        Ok(Self {
            admin_password,
            spreadsheet_id: get("SPREADSHEET_ID").ok_or(ConfigError::Missing("SPREADSHEET_ID"))?,
            worksheet_name: get("WORKSHEET_NAME").unwrap_or_else(|| "Requests".to_string()),
            sheets_api_base: get("SHEETS_API_BASE")
                .unwrap_or_else(|| "https://sheets.googleapis.com".to_string())
                .trim_end_matches('/')
                .to_string(),
            credentials,
            photo_bucket: get("PHOTO_BUCKET").ok_or(ConfigError::Missing("PHOTO_BUCKET"))?,
            photo_prefix: get("PHOTO_PREFIX")
                .unwrap_or_else(|| "requests".to_string())
                .trim_matches('/')
                .to_string(),
            photo_public_base_url: get("PHOTO_PUBLIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            sites,
            max_photo_bytes,
        })
    }

    pub fn is_known_site(&self, site: &str) -> bool {
        self.sites.iter().any(|s| s == site)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            Config::from_lookup(lookup(&[("SPREADSHEET_ID", "sheet-1"), ("PHOTO_BUCKET", "photos")]))
                .unwrap();

        assert_eq!(config.admin_password, "admin123");
        assert_eq!(config.worksheet_name, "Requests");
        assert_eq!(config.sheets_api_base, "https://sheets.googleapis.com");
        assert_eq!(
            config.credentials,
            CredentialSource::File("hybb-creds.json".to_string())
        );
        assert_eq!(config.sites, vec!["WFD01", "BSN01", "HSR01", "MAR01", "SKM01"]);
        assert_eq!(config.max_photo_bytes, 5 * 1024 * 1024);
        assert!(config.is_known_site("HSR01"));
        assert!(!config.is_known_site("--Select--"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("SPREADSHEET_ID", "sheet-1"),
            ("PHOTO_BUCKET", "photos"),
            ("ADMIN_PASSWORD", "s3cret"),
            ("SITES", " AAA01 , BBB02 ,"),
            ("PHOTO_PREFIX", "/uploads/"),
            ("PHOTO_PUBLIC_BASE_URL", "https://cdn.example.com/"),
            ("GOOGLE_SERVICE_ACCOUNT_JSON", "{}"),
            ("MAX_PHOTO_BYTES", "1024"),
        ]))
        .unwrap();

        assert_eq!(config.admin_password, "s3cret");
        assert_eq!(config.sites, vec!["AAA01", "BBB02"]);
        assert_eq!(config.photo_prefix, "uploads");
        assert_eq!(
            config.photo_public_base_url.as_deref(),
            Some("https://cdn.example.com")
        );
        assert_eq!(config.credentials, CredentialSource::Inline("{}".to_string()));
        assert_eq!(config.max_photo_bytes, 1024);
    }

    #[test]
    fn test_missing_and_invalid() {
        let err = Config::from_lookup(lookup(&[("PHOTO_BUCKET", "photos")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SPREADSHEET_ID")));

        let err = Config::from_lookup(lookup(&[
            ("SPREADSHEET_ID", "sheet-1"),
            ("PHOTO_BUCKET", "photos"),
            ("MAX_PHOTO_BYTES", "lots"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { .. }));
    }
}
