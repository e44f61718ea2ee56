use std::{path::PathBuf, time::Duration};

use thiserror::Error;

use crate::utils;

pub const PORTAL_ORIGIN: &str = "https://handson.unitedwaygreaternashville.org";
const DEFAULT_LISTING_PATH: &str = "/search";
const DEFAULT_ORG_ID: &str = "50c46743-c6ef-40a7-a527-3c37091eca39";
const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 10;
const DEFAULT_RENDER_SETTLE_MS: u64 = 2000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a non-negative integer, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

/// Where the `o_id` column of each scraped event comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrganizationId {
    Fixed(String),
    /// Use the organization name printed in the listing.
    Listed,
}

impl OrganizationId {
    pub fn resolve(&self, listed: &str) -> String {
        match self {
            OrganizationId::Fixed(id) => id.clone(),
            OrganizationId::Listed => listed.to_string(),
        }
    }

    fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case("listed") {
            OrganizationId::Listed
        } else {
            OrganizationId::Fixed(value.to_string())
        }
    }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub wait_timeout: Duration,
    pub settle_delay: Duration,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::from_secs(DEFAULT_RENDER_TIMEOUT_SECS),
            settle_delay: Duration::from_millis(DEFAULT_RENDER_SETTLE_MS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub listing_url: String,
    pub credentials: Option<Credentials>,
    pub organization_id: OrganizationId,
    pub image_url: Option<String>,
    pub tags: Option<Vec<String>>,
    pub render: RenderSettings,
    /// Records per transaction; 0 commits the whole batch at once.
    pub chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: utils::database_path(),
            listing_url: format!("{PORTAL_ORIGIN}{DEFAULT_LISTING_PATH}"),
            credentials: None,
            organization_id: OrganizationId::Fixed(DEFAULT_ORG_ID.to_string()),
            image_url: None,
            tags: None,
            render: RenderSettings::default(),
            chunk_size: 0,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                | Default                                   |
    /// |------------------------|-------------------------------------------|
    /// | `DATABASE_URI`         | `<data dir>/handson-sync/events.sqlite`   |
    /// | `HANDSON_LISTING_URL`  | `<portal>/search`                         |
    /// | `HANDSON_EMAIL`        | unset (`HON_EMAIL` also accepted)         |
    /// | `HANDSON_PASSWORD`     | unset (`HON_PASSWORD` also accepted)      |
    /// | `HANDSON_ORG_ID`       | portal fallback id; `listed` derives it   |
    /// | `HANDSON_IMAGE_URL`    | unset                                     |
    /// | `HANDSON_TAGS`         | unset, comma-separated                    |
    /// | `RENDER_TIMEOUT_SECS`  | `10`                                      |
    /// | `RENDER_SETTLE_MS`     | `2000`                                    |
    /// | `RECONCILE_CHUNK_SIZE` | `0`                                       |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Config::default();

        let email = get("HANDSON_EMAIL").or_else(|| get("HON_EMAIL"));
        let password = get("HANDSON_PASSWORD").or_else(|| get("HON_PASSWORD"));
        let credentials = match (email, password) {
            (Some(email), Some(password)) => Some(Credentials { email, password }),
            _ => None,
        };

        let tags = get("HANDSON_TAGS").map(|raw| {
            raw.split(',')
                .map(|tag| tag.trim().to_string())
                .filter(|tag| !tag.is_empty())
                .collect::<Vec<_>>()
        });

        let render = RenderSettings {
            wait_timeout: match parse_number("RENDER_TIMEOUT_SECS", get("RENDER_TIMEOUT_SECS"))? {
                Some(secs) => Duration::from_secs(secs),
                None => defaults.render.wait_timeout,
            },
            settle_delay: match parse_number("RENDER_SETTLE_MS", get("RENDER_SETTLE_MS"))? {
                Some(ms) => Duration::from_millis(ms),
                None => defaults.render.settle_delay,
            },
        };

        let chunk_size = parse_number("RECONCILE_CHUNK_SIZE", get("RECONCILE_CHUNK_SIZE"))?
            .map(|n| n as usize)
            .unwrap_or(defaults.chunk_size);

        Ok(Self {
            database_path: get("DATABASE_URI")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            listing_url: get("HANDSON_LISTING_URL").unwrap_or(defaults.listing_url),
            credentials,
            organization_id: get("HANDSON_ORG_ID")
                .map(|value| OrganizationId::parse(&value))
                .unwrap_or(defaults.organization_id),
            image_url: get("HANDSON_IMAGE_URL"),
            tags: tags.filter(|tags| !tags.is_empty()),
            render,
            chunk_size,
        })
    }
}

fn parse_number(name: &'static str, value: Option<String>) -> Result<Option<u64>, ConfigError> {
    value
        .map(|value| {
            value
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber { name, value })
        })
        .transpose()
}
