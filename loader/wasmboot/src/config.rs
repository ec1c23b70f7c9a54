//! CLI configuration.
//!
//! Flags win over environment variables:
//!
//! | Flag | Variable | Meaning |
//! |---|---|---|
//! | `--base=<url>` | `WASMBOOT_BASE` | Origin binaries are fetched from |
//! | `--root=<dir>` | `WASMBOOT_ROOT` | Local directory standing in for the host root |
//! | `--secure` | | Load in secure mode (`load` only) |
//! | `--max-ops=<n>` | | Operation limit for guest scripts |

use std::path::PathBuf;
use std::sync::Arc;

use url::Url;

use crate::error::FetchError;
use crate::fetch::{DirFetcher, Fetcher, HttpFetcher};

/// Options shared by the CLI commands.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BootConfig {
    pub base: Option<Url>,
    pub root: Option<PathBuf>,
    pub secure: bool,
    pub max_operations: Option<u64>,
}

impl BootConfig {
    /// Defaults from the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Defaults from `lookup`, which maps variable names to values.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = BootConfig::default();
        if let Some(base) = lookup("WASMBOOT_BASE") {
            match Url::parse(&base) {
                Ok(url) => config.base = Some(url),
                Err(e) => eprintln!("warning: ignoring WASMBOOT_BASE '{base}': {e}"),
            }
        }
        if let Some(root) = lookup("WASMBOOT_ROOT") {
            config.root = Some(PathBuf::from(root));
        }
        config
    }

    /// Apply flags, returning the positional arguments.
    pub fn apply_args(&mut self, args: &[String]) -> Vec<String> {
        let mut positional = Vec::new();
        for arg in args {
            if let Some(base) = arg.strip_prefix("--base=") {
                match Url::parse(base) {
                    Ok(url) => self.base = Some(url),
                    Err(e) => eprintln!("warning: ignoring --base '{base}': {e}"),
                }
            } else if let Some(root) = arg.strip_prefix("--root=") {
                self.root = Some(PathBuf::from(root));
            } else if arg == "--secure" {
                self.secure = true;
            } else if let Some(limit) = arg.strip_prefix("--max-ops=") {
                match limit.parse() {
                    Ok(n) => self.max_operations = Some(n),
                    Err(_) => eprintln!("warning: ignoring --max-ops '{limit}', expected a number"),
                }
            } else if arg.starts_with('-') {
                eprintln!("warning: unknown option '{arg}'");
            } else {
                positional.push(arg.clone());
            }
        }
        positional
    }

    /// Pick a fetcher: `root` first, then `base`, then the script's origin.
    pub fn fetcher(&self, script_url: Option<&Url>) -> Result<Option<Arc<dyn Fetcher>>, FetchError> {
        if let Some(root) = &self.root {
            return Ok(Some(Arc::new(DirFetcher::new(root.clone()))));
        }
        if let Some(base) = &self.base {
            return Ok(Some(Arc::new(HttpFetcher::new(base.clone()))));
        }
        match script_url {
            Some(url) if matches!(url.scheme(), "http" | "https") => {
                Ok(Some(Arc::new(HttpFetcher::for_script(url)?)))
            }
            _ => Ok(None),
        }
    }

    /// The code-execution provider for permissive loads.
    pub fn provider(&self) -> Arc<dyn wb_exec::CodeExecutionProvider> {
        #[cfg(feature = "scripting")]
        {
            if let Some(limit) = self.max_operations {
                return Arc::new(wb_exec::ScriptProvider::new().with_max_operations(limit));
            }
        }
        wb_exec::default_provider()
    }
}
