//! Configuration management for snapgate.
//!
//! Parses `snapgate.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `domain`
//! - `dynamic_routes[].loader.url`
//! - `dynamic_routes[].sitemap.source_url`

mod expand;

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Upper bound on URLs per sitemap file imposed by the sitemap protocol.
pub const SITEMAP_PROTOCOL_LIMIT: u64 = 50_000;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override the static asset root.
    pub build_folder: Option<PathBuf>,
    /// Override the prerendered store directory.
    pub store_dir: Option<PathBuf>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "snapgate.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Static asset root (relative string from TOML).
    build_folder: Option<String>,
    /// Public origin prepended to sitemap URLs.
    pub domain: String,
    /// Server configuration.
    pub server: ServerConfig,
    /// Store configuration (relative string from TOML).
    store: StoreConfigRaw,
    /// Rendering strategies.
    pub rendering: RenderingConfig,
    /// Sitemap settings.
    pub sitemap: SitemapConfig,
    /// Paths served from prerendered snapshots.
    pub static_routes: Vec<String>,
    /// Parameterized routes rendered from a template plus loaded data.
    pub dynamic_routes: Vec<DynamicRouteConfig>,

    /// Resolved filesystem paths (set after loading).
    #[serde(skip)]
    pub paths: PathsConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Main serving port.
    pub port: u16,
    /// Port advertised to the prerender phase.
    pub prerendering_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
            prerendering_port: 4050,
        }
    }
}

/// Raw store configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct StoreConfigRaw {
    dir: Option<String>,
}

/// Resolved filesystem locations.
#[derive(Debug, Default)]
pub struct PathsConfig {
    /// Static asset root holding the `index.html` shell.
    pub build_folder: PathBuf,
    /// Prerendered store directory.
    pub store_dir: PathBuf,
}

/// Which clients get the prerendered path for a route category.
#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RenderStrategy {
    /// Every client is served the optimized response.
    #[default]
    AllRequests,
    /// Only automated clients are; humans get the fallback.
    BotOnly,
}

/// Where the hydration script is placed in served HTML.
#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScriptPlacement {
    /// Right after the opening `<head>` tag.
    Head,
    /// Right before the closing `</body>` tag.
    #[default]
    Body,
}

/// Rendering configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RenderingConfig {
    /// Strategy for static routes.
    #[serde(rename = "static")]
    pub static_strategy: RenderStrategy,
    /// Strategy for dynamic routes.
    #[serde(rename = "dynamic")]
    pub dynamic_strategy: RenderStrategy,
    /// Hydration script placement.
    pub inject: ScriptPlacement,
}

/// Sitemap configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SitemapConfig {
    /// Maximum URLs per sitemap file.
    pub max_urls_per_file: u64,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            max_urls_per_file: SITEMAP_PROTOCOL_LIMIT,
        }
    }
}

/// A parameterized route declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct DynamicRouteConfig {
    /// Path pattern, e.g. `/post/:id`.
    pub path: String,
    /// Store key of the template snapshot.
    pub template_route: String,
    /// Data loader for matched requests.
    pub loader: LoaderConfig,
    /// Enumerable collection backing this route's sitemap.
    pub sitemap: Option<SitemapSourceConfig>,
}

/// Data loader declaration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoaderConfig {
    /// Fetch JSON over HTTP; `{name}` placeholders are filled from route params.
    Http {
        /// URL template.
        url: String,
    },
    /// Return fixed JSON data.
    Static {
        /// The data handed to the template.
        #[serde(default)]
        data: serde_json::Value,
    },
}

/// Sitemap collection declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct SitemapSourceConfig {
    /// Name used in sitemap document paths.
    pub unique_name: String,
    /// Number of items in the collection.
    pub total: u64,
    /// Generated URLs: `{index}` is replaced by the item index.
    pub url_template: Option<String>,
    /// `lastmod` value for generated URLs.
    pub last_updated_at: Option<String>,
    /// HTTP endpoint answering `?limit=&skip=` with `[{url, lastUpdatedAt}]`.
    pub source_url: Option<String>,
}

/// How a sitemap collection enumerates its items.
#[derive(Debug, PartialEq, Eq)]
pub enum SitemapSourceKind<'a> {
    /// Items generated from a URL template.
    Sequence {
        /// URL template containing `{index}`.
        url_template: &'a str,
    },
    /// Items fetched from an HTTP endpoint.
    Http {
        /// Endpoint URL.
        url: &'a str,
    },
}

impl SitemapSourceConfig {
    /// Determine the source kind.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` unless exactly one of
    /// `url_template` and `source_url` is set.
    pub fn kind(&self) -> Result<SitemapSourceKind<'_>, ConfigError> {
        match (&self.url_template, &self.source_url) {
            (Some(url_template), None) => Ok(SitemapSourceKind::Sequence { url_template }),
            (None, Some(url)) => Ok(SitemapSourceKind::Http { url }),
            _ => Err(ConfigError::Validation(format!(
                "sitemap '{}' requires exactly one of url_template or source_url",
                self.unique_name
            ))),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`server.host`").
        field: String,
        /// Error message (e.g., "${`HOST`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

/// Require a route path to be absolute.
fn require_absolute_path(path: &str, field: &str) -> Result<(), ConfigError> {
    if !path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "{field} must start with '/' (got '{path}')"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `snapgate.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, and the
    /// result is validated again so overrides cannot bypass checks.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or validation fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string, resolving paths against `base`.
    ///
    /// # Errors
    ///
    /// Returns error if parsing, expansion, or validation fails.
    pub fn from_toml_str(content: &str, base: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.expand_env_vars()?;
        config.resolve_paths(base);
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(build_folder) = &settings.build_folder {
            self.paths.build_folder.clone_from(build_folder);
        }
        if let Some(store_dir) = &settings.store_dir {
            self.paths.store_dir.clone_from(store_dir);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            build_folder: None,
            domain: "http://localhost:8080".to_owned(),
            server: ServerConfig::default(),
            store: StoreConfigRaw::default(),
            rendering: RenderingConfig::default(),
            sitemap: SitemapConfig::default(),
            static_routes: Vec::new(),
            dynamic_routes: Vec::new(),
            paths: PathsConfig {
                build_folder: base.join("dist"),
                store_dir: base.join("pre-rendered-data"),
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config_dir = path.parent().unwrap_or(Path::new("."));
        let mut config = Self::from_toml_str(&content, config_dir)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        require_http_url(&self.domain, "domain")?;
        self.validate_routes()?;
        self.validate_sitemaps()?;
        Ok(())
    }

    /// Validate server configuration.
    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }
        if self.server.port == self.server.prerendering_port {
            return Err(ConfigError::Validation(format!(
                "server.port and server.prerendering_port cannot be the same ({})",
                self.server.port
            )));
        }

        Ok(())
    }

    /// Validate static and dynamic route declarations.
    fn validate_routes(&self) -> Result<(), ConfigError> {
        for path in &self.static_routes {
            require_absolute_path(path, "static_routes")?;
        }
        for route in &self.dynamic_routes {
            require_absolute_path(&route.path, "dynamic_routes.path")?;
            require_absolute_path(&route.template_route, "dynamic_routes.template_route")?;
            if let LoaderConfig::Http { url } = &route.loader {
                require_http_url(url, "dynamic_routes.loader.url")?;
            }
        }
        Ok(())
    }

    /// Validate sitemap settings and collection declarations.
    fn validate_sitemaps(&self) -> Result<(), ConfigError> {
        let max = self.sitemap.max_urls_per_file;
        if max == 0 || max > SITEMAP_PROTOCOL_LIMIT {
            return Err(ConfigError::Validation(format!(
                "sitemap.max_urls_per_file must be between 1 and {SITEMAP_PROTOCOL_LIMIT}"
            )));
        }

        let sitemaps: Vec<&SitemapSourceConfig> = self
            .dynamic_routes
            .iter()
            .filter_map(|route| route.sitemap.as_ref())
            .collect();

        let mut seen = HashSet::new();
        for sitemap in &sitemaps {
            let name = sitemap.unique_name.as_str();
            require_non_empty(name, "dynamic_routes.sitemap.unique_name")?;
            if !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            {
                return Err(ConfigError::Validation(format!(
                    "sitemap unique_name '{name}' may only contain letters, digits, '_' and '-'"
                )));
            }
            if !seen.insert(name) {
                return Err(ConfigError::Validation(format!(
                    "duplicate sitemap unique_name '{name}'"
                )));
            }
            if let SitemapSourceKind::Http { url } = sitemap.kind()? {
                require_http_url(url, "dynamic_routes.sitemap.source_url")?;
            }
        }

        // A name like "posts-1" would shadow chunk 1 of "posts".
        for sitemap in &sitemaps {
            let name = sitemap.unique_name.as_str();
            if let Some((prefix, index)) = name.rsplit_once('-')
                && !index.is_empty()
                && index.chars().all(|c| c.is_ascii_digit())
                && seen.contains(prefix)
            {
                return Err(ConfigError::Validation(format!(
                    "sitemap unique_name '{name}' collides with chunk names of '{prefix}'"
                )));
            }
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;
        self.domain = expand::expand_env(&self.domain, "domain")?;

        for route in &mut self.dynamic_routes {
            if let LoaderConfig::Http { url } = &mut route.loader {
                *url = expand::expand_env(url, "dynamic_routes.loader.url")?;
            }
            if let Some(sitemap) = &mut route.sitemap
                && let Some(url) = &sitemap.source_url
            {
                sitemap.source_url = Some(expand::expand_env(
                    url,
                    "dynamic_routes.sitemap.source_url",
                )?);
            }
        }

        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.paths = PathsConfig {
            build_folder: resolve(self.build_folder.as_deref(), "dist"),
            store_dir: resolve(self.store.dir.as_deref(), "pre-rendered-data"),
        };
    }
}
