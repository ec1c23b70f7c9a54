//! Command handlers for the wasmboot CLI.
//!
//! Each handler returns the loaded module (if any) so `main` only has to
//! report errors and pick an exit code.

use url::Url;
use wb_locate::Invocation;

use crate::bootstrap::{Bootstrapper, LoadedModule, StartRoutine};
use crate::config::BootConfig;
use crate::environment::Environment;
use crate::error::{BootError, FetchError};
use crate::std_caps::standard_capabilities;

/// Why a command failed.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("invalid script URL '{url}': {source}")]
    BadUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("nowhere to fetch `{identifier}` from; pass --base=<url> or --root=<dir>")]
    NoSource { identifier: String },
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Boot(#[from] BootError),
}

/// `wasmboot boot <script-url>`: behave as if evaluated from `script_url`.
///
/// Returns `Ok(None)` when the URL names no module; nothing is fetched.
pub async fn boot_script(
    script_url: &str,
    config: &BootConfig,
) -> Result<Option<LoadedModule>, CommandError> {
    let url = Url::parse(script_url).map_err(|source| CommandError::BadUrl {
        url: script_url.to_string(),
        source,
    })?;

    let reference = match Invocation::detect(&url) {
        Invocation::ExportLoader => {
            println!("{url} names no module; loader exported for explicit invocation");
            return Ok(None);
        }
        Invocation::Load(reference) => reference,
    };

    let Some(fetcher) = config.fetcher(Some(&url))? else {
        return Err(CommandError::NoSource {
            identifier: reference.identifier().to_string(),
        });
    };
    let bootstrapper = Bootstrapper::with_fetcher(fetcher).with_provider(config.provider());

    let loaded = crate::autorun(&url, &bootstrapper).await?;
    if let Some(loaded) = &loaded {
        report(loaded);
    }
    Ok(loaded)
}

/// `wasmboot load <identifier>`: invoke the loader directly.
///
/// Permissive loads get the standard capabilities (`log`).
pub async fn load_module(
    identifier: &str,
    config: &BootConfig,
) -> Result<LoadedModule, CommandError> {
    let Some(fetcher) = config.fetcher(None)? else {
        return Err(CommandError::NoSource {
            identifier: identifier.to_string(),
        });
    };
    let bootstrapper = Bootstrapper::with_fetcher(fetcher).with_provider(config.provider());

    let env = if config.secure {
        Environment::Secure
    } else {
        Environment::Permissive(standard_capabilities())
    };

    let loaded = bootstrapper.load(identifier, env).await?;
    report(&loaded);
    Ok(loaded)
}

fn report(loaded: &LoadedModule) {
    let how = match loaded.start_routine() {
        StartRoutine::Environment => "started by the environment",
        StartRoutine::Export => "ran _start",
        StartRoutine::None => "no start routine",
    };
    println!("loaded `{}`: {how}", loaded.identifier());
}
