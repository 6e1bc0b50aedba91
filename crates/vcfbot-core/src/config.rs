use std::{env, fs, net::SocketAddr, path::Path};

use crate::{chunk::ChunkSize, errors::Error, Result};

/// Split sizes offered in the "how would you like to split them?" menu.
pub const DEFAULT_SPLIT_SIZES: [usize; 7] = [35, 40, 50, 75, 100, 150, 200];

/// Uploads above this size are rejected before download.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10MB

pub const DEFAULT_HEALTH_ADDR: &str = "0.0.0.0:10000";

/// Typed configuration, loaded from the environment (and `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,

    /// Allowed chunk sizes, in menu order.
    pub split_sizes: Vec<ChunkSize>,
    pub max_file_size: u64,

    /// Keep-alive HTTP endpoint; `None` disables it.
    pub health_addr: Option<SocketAddr>,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let split_sizes = match env_str("SPLIT_SIZES") {
            Some(raw) => parse_split_sizes(&raw)?,
            None => default_split_sizes(),
        };

        let max_file_size = env_u64("MAX_FILE_SIZE").unwrap_or(DEFAULT_MAX_FILE_SIZE);

        let health_addr = parse_health_addr(
            env_str("HEALTH_ADDR")
                .as_deref()
                .unwrap_or(DEFAULT_HEALTH_ADDR),
        )?;

        Ok(Self {
            telegram_bot_token,
            split_sizes,
            max_file_size,
            health_addr,
        })
    }

    /// Whether `size` is one of the menu entries.
    pub fn is_allowed_split(&self, size: ChunkSize) -> bool {
        self.split_sizes.contains(&size)
    }
}

pub fn default_split_sizes() -> Vec<ChunkSize> {
    DEFAULT_SPLIT_SIZES
        .iter()
        .filter_map(|&n| ChunkSize::new(n))
        .collect()
}

fn parse_split_sizes(raw: &str) -> Result<Vec<ChunkSize>> {
    let mut out = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let size = part
            .parse::<ChunkSize>()
            .map_err(|e| Error::Config(format!("SPLIT_SIZES: {e}")))?;
        if !out.contains(&size) {
            out.push(size);
        }
    }
    if out.is_empty() {
        return Err(Error::Config(
            "SPLIT_SIZES must list at least one size".to_string(),
        ));
    }
    Ok(out)
}

fn parse_health_addr(raw: &str) -> Result<Option<SocketAddr>> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("off") {
        return Ok(None);
    }
    raw.parse::<SocketAddr>()
        .map(Some)
        .map_err(|e| Error::Config(format!("HEALTH_ADDR {raw:?}: {e}")))
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let Some((key, val)) = parse_dotenv_line(raw) else {
            continue;
        };
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv_line(raw: &str) -> Option<(String, String)> {
    let line = raw.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let (k, v) = line.split_once('=')?;
    let key = k.trim();
    if key.is_empty() {
        return None;
    }

    let mut val = v.trim();
    // Strip optional surrounding quotes.
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        val = &val[1..val.len() - 1];
    }

    Some((key.to_string(), val.to_string()))
}
