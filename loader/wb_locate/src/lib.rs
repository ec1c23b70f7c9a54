//! Script URL detection and module addressing.
//!
//! A bootstrapped module is named by the URL of the script that loaded the
//! bootstrapper. The fragment carries the module identifier and the query
//! string selects the security mode:
//!
//! ```text
//! https://host/loader.js#clock          → load `/wasm/clock.wasm`, permissive
//! https://host/loader.js?secure#clock   → load `/wasm/clock.wasm`, secure
//! https://host/loader.js#clock?secure   → same as above
//! https://host/loader.js                → nothing to load, export the loader
//! ```
//!
//! This crate only answers "what should be loaded, and how". Fetching and
//! instantiation live in `wasmboot`.

use std::fmt;

use url::Url;

/// Directory under the host root that holds guest binaries.
pub const RESOURCE_DIR: &str = "/wasm/";

/// File extension of guest binaries.
pub const RESOURCE_EXT: &str = ".wasm";

/// The literal query string that selects secure mode.
pub const SECURE_QUERY: &str = "secure";

/// Path of the binary for `identifier`, relative to the host root.
///
/// The identifier is used verbatim. Callers are responsible for supplying
/// an identifier that is safe to place in a path.
pub fn resource_path(identifier: &str) -> String {
    format!("{RESOURCE_DIR}{identifier}{RESOURCE_EXT}")
}

/// A module to load, derived from the bootstrapper's own retrieval location.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModuleReference {
    identifier: String,
    secure: bool,
}

impl ModuleReference {
    pub fn new(identifier: impl Into<String>, secure: bool) -> Self {
        ModuleReference {
            identifier: identifier.into(),
            secure,
        }
    }

    /// Derive a reference from a script URL.
    ///
    /// Returns `None` when the fragment is absent or names no module; that is
    /// the signal to export the loader rather than run it.
    ///
    /// Secure mode is selected when the query string is exactly `secure`.
    /// A query written inside the fragment (`#id?secure`) counts as well,
    /// since that spelling is common in hand-written script tags and a URL
    /// parser folds it into the fragment.
    ///
    /// Any other text after `?` in the fragment is dropped: `#app?v=2` loads
    /// `/wasm/app.wasm` in permissive mode. A browser fetching `app?v=2.wasm`
    /// would not find the binary either, so nothing usable is lost.
    pub fn from_script_url(url: &Url) -> Option<Self> {
        let fragment = url.fragment()?;
        let (identifier, fragment_query) = match fragment.split_once('?') {
            Some((identifier, query)) => (identifier, Some(query)),
            None => (fragment, None),
        };

        if identifier.is_empty() {
            return None;
        }

        let secure = url.query() == Some(SECURE_QUERY) || fragment_query == Some(SECURE_QUERY);
        Some(ModuleReference::new(identifier, secure))
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// Path of this module's binary relative to the host root.
    pub fn resource_path(&self) -> String {
        resource_path(&self.identifier)
    }
}

impl fmt::Display for ModuleReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.secure {
            write!(f, "{} (secure)", self.identifier)
        } else {
            write!(f, "{}", self.identifier)
        }
    }
}

/// What the bootstrapper should do when evaluated from a script URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Invocation {
    /// The URL names a module: load it now.
    Load(ModuleReference),
    /// No module named: make the loader available to an external invoker.
    ExportLoader,
}

impl Invocation {
    pub fn detect(script_url: &Url) -> Self {
        match ModuleReference::from_script_url(script_url) {
            Some(reference) => Invocation::Load(reference),
            None => Invocation::ExportLoader,
        }
    }
}
