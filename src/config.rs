//! Configuration parsing, environment overrides and validation.
//!
//! Character Tally reads a TOML file (default `./config/tally.toml`). Every
//! section is optional and falls back to defaults, and any value can be
//! overridden through environment variables (a `.env` file is honored by
//! the binary).
//!
//! # Example
//!
//! ```toml
//! [db]
//! path = "./data/tally.sqlite"
//!
//! [server]
//! bind = "127.0.0.1:3000"
//!
//! [cache]
//! count_ttl_secs = 600
//!
//! [sources.superhero]
//! api_key = "..."
//! max_id = 731
//! ```
//!
//! # Environment variables
//!
//! | Variable | Field |
//! |----------|-------|
//! | `TALLY_DB_PATH` | `db.path` |
//! | `TALLY_BIND` | `server.bind` |
//! | `COUNT_CACHE_TTL_SECS` | `cache.count_ttl_secs` |
//! | `HTTP_TIMEOUT_SECS` | `http.timeout_secs` |
//! | `RICK_AND_MORTY_API_BASE` | `sources.rickandmorty.base_url` |
//! | `POKEMON_API_BASE` | `sources.pokemon.base_url` |
//! | `SUPERHERO_API_BASE` | `sources.superhero.base_url` |
//! | `SUPERHERO_API_KEY` | `sources.superhero.api_key` |
//! | `SUPERHERO_MAX_ID` | `sources.superhero.max_id` |
//! | `DRAGONBALL_API_BASE` | `sources.dragonball.base_url` |
//! | `DRAGONBALL_MAX_ID` | `sources.dragonball.max_id` |

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/tally.sqlite"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_count_ttl_secs")]
    pub count_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            count_ttl_secs: default_count_ttl_secs(),
        }
    }
}

impl CacheConfig {
    pub fn count_ttl(&self) -> Duration {
        Duration::from_secs(self.count_ttl_secs)
    }
}

fn default_count_ttl_secs() -> u64 {
    600
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SourcesConfig {
    #[serde(default)]
    pub rickandmorty: RickAndMortyConfig,
    #[serde(default)]
    pub pokemon: PokemonConfig,
    #[serde(default)]
    pub superhero: SuperheroConfig,
    #[serde(default)]
    pub dragonball: DragonBallConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RickAndMortyConfig {
    #[serde(default = "default_rickandmorty_base")]
    pub base_url: String,
}

impl Default for RickAndMortyConfig {
    fn default() -> Self {
        Self {
            base_url: default_rickandmorty_base(),
        }
    }
}

fn default_rickandmorty_base() -> String {
    "https://rickandmortyapi.com/api".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct PokemonConfig {
    #[serde(default = "default_pokemon_base")]
    pub base_url: String,
}

impl Default for PokemonConfig {
    fn default() -> Self {
        Self {
            base_url: default_pokemon_base(),
        }
    }
}

fn default_pokemon_base() -> String {
    "https://pokeapi.co/api/v2".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SuperheroConfig {
    #[serde(default = "default_superhero_base")]
    pub base_url: String,
    #[serde(default = "default_superhero_max_id")]
    pub max_id: u64,
    /// Required for this source to be offered at all.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for SuperheroConfig {
    fn default() -> Self {
        Self {
            base_url: default_superhero_base(),
            max_id: default_superhero_max_id(),
            api_key: None,
        }
    }
}

impl SuperheroConfig {
    /// The API key, treating an empty string as unset.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.trim().is_empty())
    }
}

fn default_superhero_base() -> String {
    "https://superheroapi.com/api".to_string()
}
fn default_superhero_max_id() -> u64 {
    731
}

#[derive(Debug, Deserialize, Clone)]
pub struct DragonBallConfig {
    #[serde(default = "default_dragonball_base")]
    pub base_url: String,
    #[serde(default = "default_dragonball_max_id")]
    pub max_id: u64,
}

impl Default for DragonBallConfig {
    fn default() -> Self {
        Self {
            base_url: default_dragonball_base(),
            max_id: default_dragonball_max_id(),
        }
    }
}

fn default_dragonball_base() -> String {
    "https://dragonball-api.com/api".to_string()
}
fn default_dragonball_max_id() -> u64 {
    58
}

impl Config {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Config> {
        let mut config = Config::default();
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Overlay values found through `lookup` (usually `std::env::var`).
    ///
    /// Unparsable numbers are ignored with a warning and the previous value
    /// is kept.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("TALLY_DB_PATH") {
            self.db.path = PathBuf::from(v);
        }
        if let Some(v) = lookup("TALLY_BIND") {
            self.server.bind = v;
        }
        if let Some(v) = lookup("RICK_AND_MORTY_API_BASE") {
            self.sources.rickandmorty.base_url = v;
        }
        if let Some(v) = lookup("POKEMON_API_BASE") {
            self.sources.pokemon.base_url = v;
        }
        if let Some(v) = lookup("SUPERHERO_API_BASE") {
            self.sources.superhero.base_url = v;
        }
        if let Some(v) = lookup("SUPERHERO_API_KEY") {
            self.sources.superhero.api_key = Some(v);
        }
        if let Some(v) = lookup("DRAGONBALL_API_BASE") {
            self.sources.dragonball.base_url = v;
        }
        override_number(&lookup, "COUNT_CACHE_TTL_SECS", &mut self.cache.count_ttl_secs);
        override_number(&lookup, "HTTP_TIMEOUT_SECS", &mut self.http.timeout_secs);
        override_number(&lookup, "SUPERHERO_MAX_ID", &mut self.sources.superhero.max_id);
        override_number(&lookup, "DRAGONBALL_MAX_ID", &mut self.sources.dragonball.max_id);
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache.count_ttl_secs == 0 {
            anyhow::bail!("cache.count_ttl_secs must be >= 1");
        }
        if self.http.timeout_secs == 0 {
            anyhow::bail!("http.timeout_secs must be >= 1");
        }
        if self.sources.superhero.max_id == 0 {
            anyhow::bail!("sources.superhero.max_id must be >= 1");
        }
        if self.sources.dragonball.max_id == 0 {
            anyhow::bail!("sources.dragonball.max_id must be >= 1");
        }

        let bases = [
            ("rickandmorty", &self.sources.rickandmorty.base_url),
            ("pokemon", &self.sources.pokemon.base_url),
            ("superhero", &self.sources.superhero.base_url),
            ("dragonball", &self.sources.dragonball.base_url),
        ];
        for (name, base) in bases {
            if base.trim().is_empty() {
                anyhow::bail!("sources.{}.base_url must not be empty", name);
            }
        }
        Ok(())
    }
}

fn override_number<F, T>(lookup: &F, key: &str, slot: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy + PartialOrd + Default + std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => *slot = value,
        _ => tracing::warn!(key, value = %raw, keeping = %slot, "ignoring invalid numeric override"),
    }
}

/// Load a config file, apply environment overrides and validate.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    config.apply_env_overrides(|key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}
