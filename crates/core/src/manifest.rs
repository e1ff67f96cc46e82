//! Resolved asset locator sets.

use url::Url;

use crate::Error;
use crate::classify::RoutingPolicy;
use crate::config::AppConfig;
use crate::locator;

/// The three locator categories supplied at deploy time, resolved to absolute URLs.
#[derive(Debug, Clone, Default)]
pub struct AssetManifest {
    /// Same-origin assets; every one must be cached for install to succeed.
    pub shell: Vec<Url>,
    /// Cross-origin static assets, cached best-effort.
    pub external: Vec<Url>,
    /// Cross-origin realtime assets; never pre-populated or persisted.
    pub realtime: Vec<Url>,
}

impl AssetManifest {
    /// Resolve the three locator lists of `config` against its scope.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let scope = locator::parse_scope(&config.scope).map_err(|e| Error::InvalidLocator(e.to_string()))?;
        Ok(Self {
            shell: resolve_all(&scope, &config.shell_assets)?,
            external: resolve_all(&scope, &config.external_assets)?,
            realtime: resolve_all(&scope, &config.realtime_assets)?,
        })
    }

    /// Build a manifest from already-absolute locator strings.
    pub fn parse(shell: &[&str], external: &[&str], realtime: &[&str]) -> Result<Self, Error> {
        let parse = |items: &[&str]| -> Result<Vec<Url>, Error> {
            items
                .iter()
                .map(|s| Url::parse(s).map_err(|e| Error::InvalidLocator(format!("{s}: {e}"))))
                .collect()
        };
        Ok(Self { shell: parse(shell)?, external: parse(external)?, realtime: parse(realtime)? })
    }
}

fn resolve_all(scope: &Url, locators: &[String]) -> Result<Vec<Url>, Error> {
    locators
        .iter()
        .map(|l| locator::resolve(scope, l).map_err(|e| Error::InvalidLocator(format!("{l}: {e}"))))
        .collect()
}

impl RoutingPolicy {
    /// Routing table for a deploy: configured domains and extensions plus the
    /// manifest's realtime locators.
    pub fn from_config(config: &AppConfig, manifest: &AssetManifest) -> Self {
        Self::new(
            config.realtime_domains.iter().cloned(),
            manifest.realtime.iter().map(|u| u.as_str().to_string()),
            config.static_extensions.iter().cloned(),
        )
    }
}
