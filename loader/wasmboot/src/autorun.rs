//! Auto-run hook for shells that evaluate the bootstrapper from a script URL.

use url::Url;
use wb_locate::Invocation;

use crate::bootstrap::{Bootstrapper, LoadedModule};
use crate::environment::Environment;
use crate::error::BootError;

/// Load the module `script_url` names, if any.
///
/// Returns `Ok(None)` without fetching anything when the URL has no
/// fragment: the caller should hand `bootstrapper` to whoever will invoke
/// [`Bootstrapper::load`] explicitly.
///
/// A `?secure` query selects [`Environment::Secure`]; anything else selects a
/// permissive environment with no extra capabilities.
pub async fn autorun(
    script_url: &Url,
    bootstrapper: &Bootstrapper,
) -> Result<Option<LoadedModule>, BootError> {
    match Invocation::detect(script_url) {
        Invocation::ExportLoader => {
            tracing::debug!(%script_url, "no module fragment, exporting loader");
            Ok(None)
        }
        Invocation::Load(reference) => {
            tracing::debug!(%script_url, %reference, "auto-running");
            let env = Environment::from_reference(&reference);
            bootstrapper
                .load(reference.identifier(), env)
                .await
                .map(Some)
        }
    }
}
