//! Tenant settings: the GitHub-backed VDR, Orbit credentials, and which
//! console apps are switched on.
//!
//! Secrets never leave the server in clear text. [`TenantConfig::redacted`]
//! masks them with [`REDACTED`], and a patch that sends the mask back keeps
//! the stored value.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Placeholder shown instead of a stored secret.
pub const REDACTED: &str = "********";

const RAW_GITHUB_BASE: &str = "https://raw.githubusercontent.com";

/// A console app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppId {
    /// Credentials catalogue.
    Credentials,
    /// Data types, vocabularies, and the mapping canvas.
    DataCatalogue,
    /// VCT builder and zone templates.
    VctBuilder,
    /// Proof templates and proof requests.
    ProofTemplates,
    /// Tenant settings. Always enabled.
    Settings,
}

impl AppId {
    /// Every app, in menu order.
    pub const ALL: [AppId; 5] = [
        AppId::Credentials,
        AppId::DataCatalogue,
        AppId::VctBuilder,
        AppId::ProofTemplates,
        AppId::Settings,
    ];

    /// Kebab-case id.
    pub fn as_str(self) -> &'static str {
        match self {
            AppId::Credentials => "credentials",
            AppId::DataCatalogue => "data-catalogue",
            AppId::VctBuilder => "vct-builder",
            AppId::ProofTemplates => "proof-templates",
            AppId::Settings => "settings",
        }
    }

    /// Menu title.
    pub fn title(self) -> &'static str {
        match self {
            AppId::Credentials => "Credentials",
            AppId::DataCatalogue => "Data Catalogue",
            AppId::VctBuilder => "VCT Builder",
            AppId::ProofTemplates => "Proof Templates",
            AppId::Settings => "Settings",
        }
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        AppId::ALL
            .into_iter()
            .find(|app| app.as_str() == s)
            .ok_or_else(|| Error::not_found("apps", s))
    }
}

/// GitHub repository used as the VDR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubSettings {
    /// Repository owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Branch published files are committed to.
    pub branch: String,
    /// Directory inside the repository.
    pub base_path: String,
    /// Access token with contents write permission.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for GithubSettings {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            branch: "main".to_string(),
            base_path: String::new(),
            token: None,
        }
    }
}

impl GithubSettings {
    /// Whether owner and repo are set.
    pub fn is_configured(&self) -> bool {
        !self.owner.trim().is_empty() && !self.repo.trim().is_empty()
    }

    /// `path` joined under `base_path`, without leading or doubled slashes.
    pub fn repo_path(&self, path: &str) -> String {
        join_path(&[&self.base_path, path])
    }

    /// Public raw URL for a file published at `path`.
    pub fn vdr_url(&self, path: &str) -> Result<String> {
        if !self.is_configured() {
            return Err(Error::config("GitHub owner and repo must be configured"));
        }
        let branch = if self.branch.trim().is_empty() {
            "main"
        } else {
            self.branch.trim()
        };
        Ok(format!(
            "{RAW_GITHUB_BASE}/{}",
            join_path(&[self.owner.trim(), self.repo.trim(), branch, &self.repo_path(path)])
        ))
    }
}

/// Orbit LOB verifier credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitSettings {
    /// API base URL.
    pub base_url: String,
    /// Line-of-business id.
    pub lob_id: String,
    /// API key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl OrbitSettings {
    /// Whether every credential is present.
    pub fn is_configured(&self) -> bool {
        !self.base_url.trim().is_empty()
            && !self.lob_id.trim().is_empty()
            && self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Fill empty fields from `fallback` (the environment-driven defaults).
    pub fn resolved(&self, fallback: &OrbitSettings) -> OrbitSettings {
        fn pick(own: &str, fallback: &str) -> String {
            if own.trim().is_empty() {
                fallback.to_string()
            } else {
                own.to_string()
            }
        }
        OrbitSettings {
            base_url: pick(&self.base_url, &fallback.base_url),
            lob_id: pick(&self.lob_id, &fallback.lob_id),
            api_key: self
                .api_key
                .clone()
                .filter(|k| !k.is_empty())
                .or_else(|| fallback.api_key.clone().filter(|k| !k.is_empty())),
        }
    }
}

/// Settings for one tenant of the console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantConfig {
    /// Tenant id.
    pub tenant_id: String,
    /// Name shown in the console header.
    pub display_name: String,
    /// VDR repository.
    pub github: GithubSettings,
    /// Orbit verifier credentials.
    pub orbit: OrbitSettings,
    /// App enablement; apps missing from the map are enabled.
    pub apps: BTreeMap<AppId, bool>,
    /// Last update time.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            tenant_id: "default".to_string(),
            display_name: "Cornerstone Network".to_string(),
            github: GithubSettings::default(),
            orbit: OrbitSettings::default(),
            apps: BTreeMap::new(),
            updated_at: None,
        }
    }
}

/// Partial update of the GitHub settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubSettingsPatch {
    /// New owner.
    pub owner: Option<String>,
    /// New repository.
    pub repo: Option<String>,
    /// New branch.
    pub branch: Option<String>,
    /// New base path.
    pub base_path: Option<String>,
    /// New token; [`REDACTED`] keeps, empty clears.
    pub token: Option<String>,
}

/// Partial update of the Orbit settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitSettingsPatch {
    /// New base URL.
    pub base_url: Option<String>,
    /// New LOB id.
    pub lob_id: Option<String>,
    /// New API key; [`REDACTED`] keeps, empty clears.
    pub api_key: Option<String>,
}

/// Partial update of the tenant settings. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantConfigPatch {
    /// New display name.
    pub display_name: Option<String>,
    /// GitHub changes.
    pub github: Option<GithubSettingsPatch>,
    /// Orbit changes.
    pub orbit: Option<OrbitSettingsPatch>,
    /// App enablement changes.
    pub apps: Option<BTreeMap<AppId, bool>>,
}

fn apply_secret(current: &mut Option<String>, incoming: Option<String>) {
    match incoming {
        None => {}
        Some(value) if value == REDACTED => {}
        Some(value) if value.is_empty() => *current = None,
        Some(value) => *current = Some(value),
    }
}

fn redact(secret: &Option<String>) -> Option<String> {
    secret
        .as_ref()
        .filter(|s| !s.is_empty())
        .map(|_| REDACTED.to_string())
}

fn join_path(parts: &[&str]) -> String {
    parts
        .iter()
        .flat_map(|part| part.split('/'))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

impl TenantConfig {
    /// Whether `app` is enabled.
    pub fn is_app_enabled(&self, app: AppId) -> bool {
        app == AppId::Settings || self.apps.get(&app).copied().unwrap_or(true)
    }

    /// Fail with [`Error::AppDisabled`] unless `app` is enabled.
    pub fn require_app(&self, app: AppId) -> Result<()> {
        if self.is_app_enabled(app) {
            Ok(())
        } else {
            Err(Error::AppDisabled {
                app: app.to_string(),
            })
        }
    }

    /// Enable or disable an app. The settings app cannot be disabled.
    pub fn set_app_enabled(&mut self, app: AppId, enabled: bool) -> Result<()> {
        if app == AppId::Settings && !enabled {
            return Err(Error::validation_field(
                "apps.settings",
                "the settings app cannot be disabled",
            ));
        }
        self.apps.insert(app, enabled);
        Ok(())
    }

    /// Every app with its enabled flag, in menu order.
    pub fn app_states(&self) -> Vec<(AppId, bool)> {
        AppId::ALL
            .into_iter()
            .map(|app| (app, self.is_app_enabled(app)))
            .collect()
    }

    /// A copy safe to return to clients.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.github.token = redact(&self.github.token);
        copy.orbit.api_key = redact(&self.orbit.api_key);
        copy
    }

    /// Apply a partial update. On error `self` is unchanged.
    pub fn apply(&mut self, patch: TenantConfigPatch) -> Result<()> {
        let mut next = self.clone();
        if let Some(name) = patch.display_name {
            next.display_name = name;
        }
        if let Some(github) = patch.github {
            let g = &mut next.github;
            if let Some(owner) = github.owner {
                g.owner = owner.trim().to_string();
            }
            if let Some(repo) = github.repo {
                g.repo = repo.trim().to_string();
            }
            if let Some(branch) = github.branch {
                g.branch = branch.trim().to_string();
            }
            if let Some(base_path) = github.base_path {
                g.base_path = join_path(&[&base_path]);
            }
            apply_secret(&mut g.token, github.token);
        }
        if let Some(orbit) = patch.orbit {
            let o = &mut next.orbit;
            if let Some(base_url) = orbit.base_url {
                o.base_url = base_url.trim().trim_end_matches('/').to_string();
            }
            if let Some(lob_id) = orbit.lob_id {
                o.lob_id = lob_id.trim().to_string();
            }
            apply_secret(&mut o.api_key, orbit.api_key);
        }
        if let Some(apps) = patch.apps {
            for (app, enabled) in apps {
                next.set_app_enabled(app, enabled)?;
            }
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Public raw URL of a file published to the VDR.
    pub fn vdr_url(&self, path: &str) -> Result<String> {
        self.github.vdr_url(path)
    }

    /// Check settings consistency.
    pub fn validate(&self) -> Result<()> {
        if self.tenant_id.trim().is_empty() {
            return Err(Error::validation_field("tenant_id", "must not be empty"));
        }
        if self.display_name.trim().is_empty() {
            return Err(Error::validation_field("display_name", "must not be empty"));
        }
        if self.github.branch.trim().is_empty() {
            return Err(Error::validation_field("github.branch", "must not be empty"));
        }
        let base_url = self.orbit.base_url.trim();
        if !base_url.is_empty()
            && !(base_url.starts_with("https://") || base_url.starts_with("http://"))
        {
            return Err(Error::validation_field(
                "orbit.base_url",
                "must be an http(s) URL",
            ));
        }
        if self.apps.get(&AppId::Settings) == Some(&false) {
            return Err(Error::validation_field(
                "apps.settings",
                "the settings app cannot be disabled",
            ));
        }
        Ok(())
    }
}
