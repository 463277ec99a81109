//! Configuration for b2.
//!
//! Sources are read from, in increasing order of precedence:
//!
//! 1. built-in defaults (no sources),
//! 2. `config.toml`, `config.yaml` or `config.json` in the platform
//!    configuration directory, or a single file given explicitly,
//! 3. environment variables prefixed with `B2_`, nested with `__`, such as
//!    `B2_SOURCES__LOCAL__PATH=/srv/hydrus/db`.
//!
//! ```toml
//! default_source = "local"
//!
//! [sources.local]
//! type = "hydrus"
//! path = "/srv/hydrus/db"
//!
//! [sources.remote]
//! type = "cursor"
//! url = "https://booru.example"
//! login = "someone"
//! api_key = "..."
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

const ENV_PREFIX: &str = "B2_";
const DEFAULT_LIMIT: u32 = 100;

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Source used when none is named on the command line.
    #[serde(default)]
    pub default_source: Option<String>,
    #[serde(default)]
    pub sources: BTreeMap<String, SourceConfig>,
}

/// One configured booru, keyed by its name in [`Config::sources`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SourceConfig {
    /// A Hydrus client's database directory, read directly.
    Hydrus {
        path: PathBuf,
        #[serde(default)]
        display_name: Option<String>,
    },
    /// `/post/index.json` API, paged by number.
    Paged {
        url: Url,
        #[serde(default = "default_limit")]
        limit: u32,
        #[serde(default)]
        display_name: Option<String>,
    },
    /// `/posts.json` API, paged by number or by lowest post ID.
    Cursor {
        url: Url,
        #[serde(default = "default_limit")]
        limit: u32,
        #[serde(default)]
        login: Option<String>,
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default)]
        display_name: Option<String>,
    },
    /// A running Hydrus client's API.
    ClientApi {
        url: Url,
        access_key: String,
        #[serde(default)]
        search_inbox: bool,
        #[serde(default)]
        search_archive: bool,
        #[serde(default)]
        display_name: Option<String>,
    },
    /// Never returns any posts.
    None,
}

impl SourceConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Hydrus { .. } => "hydrus",
            Self::Paged { .. } => "paged",
            Self::Cursor { .. } => "cursor",
            Self::ClientApi { .. } => "client-api",
            Self::None => "none",
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        match self {
            Self::Hydrus { display_name, .. }
            | Self::Paged { display_name, .. }
            | Self::Cursor { display_name, .. }
            | Self::ClientApi { display_name, .. } => display_name.as_deref(),
            Self::None => None,
        }
    }

    fn validate(&self, name: &str) -> Result<()> {
        match self {
            Self::Cursor { login: Some(_), api_key: None, .. } | Self::Cursor { login: None, api_key: Some(_), .. } => {
                exn::bail!(ErrorKind::Invalid(format!("source {name} needs both a login and an API key, or neither")))
            },
            Self::Paged { limit: 0, .. } | Self::Cursor { limit: 0, .. } => {
                exn::bail!(ErrorKind::Invalid(format!("source {name} has a limit of zero")))
            },
            _ => Ok(()),
        }
    }
}

impl Config {
    /// Layer every configuration provider, reading `path` instead of the
    /// platform configuration directory when given.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let figment = Figment::from(Serialized::defaults(Self::default()));
        let figment = match path {
            Some(path) => {
                if !path.is_file() {
                    exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
                }
                debug!(path = %path.display(), "reading configuration file");
                match path.extension().and_then(|ext| ext.to_str()) {
                    Some("toml") => figment.merge(Toml::file_exact(path)),
                    Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
                    Some("json") => figment.merge(Json::file_exact(path)),
                    _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
                }
            },
            None => match ProjectDirs::from("", "", "b2") {
                Some(dirs) => {
                    let dir = dirs.config_dir();
                    debug!(dir = %dir.display(), "looking for configuration files");
                    figment
                        .merge(Toml::file_exact(dir.join("config.toml")))
                        .merge(Yaml::file_exact(dir.join("config.yaml")))
                        .merge(Json::file_exact(dir.join("config.json")))
                },
                None => {
                    debug!("no home directory, skipping configuration files");
                    figment
                },
            },
        };
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extract and validate configuration from an assembled figment.
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Extract)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::from_figment(&Self::figment(path)?)
    }

    fn validate(&self) -> Result<()> {
        if let Some(name) = &self.default_source
            && !self.sources.contains_key(name)
        {
            exn::bail!(ErrorKind::UnknownSource(name.clone()));
        }
        for (name, source) in &self.sources {
            source.validate(name)?;
        }
        Ok(())
    }

    /// Pick a source by name, falling back to the default source and then to
    /// the first one configured. `None` when there are no sources at all.
    pub fn select(&self, name: Option<&str>) -> Result<Option<(&str, &SourceConfig)>> {
        let Some(name) = name.or(self.default_source.as_deref()) else {
            return Ok(self.sources.iter().next().map(|(name, source)| (name.as_str(), source)));
        };
        let (name, source) =
            self.sources.get_key_value(name).ok_or_raise(|| ErrorKind::UnknownSource(name.to_string()))?;
        Ok(Some((name.as_str(), source)))
    }
}
