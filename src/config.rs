use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use url::Url;

use crate::errors::ProxyError;
use crate::validate::Allowlist;

pub const DEFAULT_BASE_URL: &str = "https://api.ubicloud.com/cli";

/// Environment key for a program's executable override (`pg_dumpall` -> `UBI_PG_DUMPALL`).
pub fn override_env_key(program: &str) -> String {
    format!("UBI_{}", program.to_ascii_uppercase())
}

/// Settings read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub base_url: Url,
    pub debug: bool,
    pub program_overrides: HashMap<String, PathBuf>,
}

impl Config {
    pub fn new(token: impl Into<String>, base_url: Url) -> Self {
        Self {
            token: token.into(),
            base_url,
            debug: false,
            program_overrides: HashMap::new(),
        }
    }

    /// Read the configuration from the process environment.
    pub fn from_env(allowlist: &Allowlist) -> Result<Self, ProxyError> {
        Self::from_lookup(allowlist, |key| env::var(key).ok())
    }

    /// Same as `from_env` over an arbitrary lookup, so tests need not touch the real environment.
    pub fn from_lookup<F>(allowlist: &Allowlist, lookup: F) -> Result<Self, ProxyError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("UBI_TOKEN")
            .filter(|t| !t.is_empty())
            .ok_or(ProxyError::MissingToken)?;

        let raw_url = lookup("UBI_URL")
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&raw_url).map_err(|e| ProxyError::InvalidUrl(e.to_string()))?;

        let mut program_overrides = HashMap::new();
        for name in allowlist.names() {
            if let Some(path) = lookup(&override_env_key(name)).filter(|p| !p.is_empty()) {
                program_overrides.insert(name.to_string(), PathBuf::from(path));
            }
        }

        Ok(Self {
            token,
            base_url,
            debug: lookup("UBI_DEBUG").as_deref() == Some("1"),
            program_overrides,
        })
    }

    pub fn with_override(mut self, program: &str, path: impl Into<PathBuf>) -> Self {
        self.program_overrides
            .insert(program.to_string(), path.into());
        self
    }

    /// Executable to spawn for `program`: the override when present, else the bare name.
    pub fn executable_for(&self, program: &str) -> PathBuf {
        self.program_overrides
            .get(program)
            .cloned()
            .unwrap_or_else(|| PathBuf::from(program))
    }
}
