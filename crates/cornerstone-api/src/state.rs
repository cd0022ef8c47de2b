//! Application state shared across handlers.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use cornerstone_auth::AuthConfig;
use cornerstone_client::{GithubVdr, OrbitClient, Vdr, Verifier};
use cornerstone_core::model::{
    AppId, Credential, DataType, OrbitSettings, ProofRequest, ProofTemplate, TenantConfig,
    VctDefinition, VocabType, ZoneTemplate,
};
use cornerstone_core::{Error, Record, Result, ServiceHandle, ServiceState};
use cornerstone_storage::{DocumentStore, JsonFileRepository, MemoryRepository, Repository};
use tokio::sync::Mutex;

use crate::config::ConsoleConfig;

/// Shared pointer handed to every handler.
pub type SharedState = Arc<AppState>;

/// Name of the tenant settings document.
pub const TENANT_DOCUMENT: &str = "tenant";

/// One repository per console collection.
pub struct Repositories {
    /// Credentials catalogue.
    pub credentials: Arc<dyn Repository<Credential>>,
    /// Data types.
    pub data_types: Arc<dyn Repository<DataType>>,
    /// Vocabulary types.
    pub vocab_types: Arc<dyn Repository<VocabType>>,
    /// VCT definitions.
    pub vcts: Arc<dyn Repository<VctDefinition>>,
    /// Zone templates.
    pub zone_templates: Arc<dyn Repository<ZoneTemplate>>,
    /// Proof templates.
    pub proof_templates: Arc<dyn Repository<ProofTemplate>>,
    /// Proof requests.
    pub proof_requests: Arc<dyn Repository<ProofRequest>>,
}

impl Repositories {
    /// JSON-file repositories under `data_dir`.
    pub async fn open(data_dir: &Path) -> Result<Self> {
        async fn collection<T: Record>(dir: &Path) -> Result<Arc<dyn Repository<T>>> {
            Ok(Arc::new(JsonFileRepository::<T>::open(dir).await?))
        }
        Ok(Self {
            credentials: collection(data_dir).await?,
            data_types: collection(data_dir).await?,
            vocab_types: collection(data_dir).await?,
            vcts: collection(data_dir).await?,
            zone_templates: collection(data_dir).await?,
            proof_templates: collection(data_dir).await?,
            proof_requests: collection(data_dir).await?,
        })
    }

    /// Empty in-memory repositories.
    pub fn in_memory() -> Self {
        Self {
            credentials: Arc::new(MemoryRepository::new()),
            data_types: Arc::new(MemoryRepository::new()),
            vocab_types: Arc::new(MemoryRepository::new()),
            vcts: Arc::new(MemoryRepository::new()),
            zone_templates: Arc::new(MemoryRepository::new()),
            proof_templates: Arc::new(MemoryRepository::new()),
            proof_requests: Arc::new(MemoryRepository::new()),
        }
    }
}

/// Health of the services the console depends on.
pub struct Services {
    /// Record storage.
    pub storage: ServiceHandle,
    /// Orbit verifier.
    pub orbit: ServiceHandle,
    /// GitHub VDR.
    pub vdr: ServiceHandle,
}

impl Services {
    fn new() -> Self {
        Self {
            storage: ServiceHandle::new("storage"),
            orbit: ServiceHandle::new("orbit"),
            vdr: ServiceHandle::new("vdr"),
        }
    }

    /// Report the outcome of an outbound call on `handle`.
    pub fn record<T>(handle: &ServiceHandle, result: &Result<T>) {
        match result {
            Ok(_) => handle.set_state(ServiceState::Ready),
            Err(err @ (Error::Upstream { .. } | Error::Config { .. })) => {
                handle.set_state(ServiceState::Degraded(err.to_string()));
            }
            Err(_) => {}
        }
    }
}

/// Everything a request handler needs.
pub struct AppState {
    /// Record collections.
    pub repos: Repositories,
    /// Tenant settings.
    pub tenant: DocumentStore<TenantConfig>,
    /// Proof-request verifier.
    pub verifier: Arc<dyn Verifier>,
    /// Verifiable data registry.
    pub vdr: Arc<dyn Vdr>,
    /// Orbit credentials used where the tenant settings leave them empty.
    pub orbit_defaults: OrbitSettings,
    /// Authentication settings applied by the router.
    pub auth: AuthConfig,
    /// Service health.
    pub services: Services,
    /// Held by reference checks before a delete and by writes that add
    /// references to vocabulary types or zone templates.
    pub references: Mutex<()>,
    /// Process start.
    pub started: Instant,
}

impl AppState {
    /// Open persistent state as described by `config`.
    pub async fn open(config: &ConsoleConfig) -> Result<Self> {
        let data_dir = &config.storage.data_dir;
        tokio::fs::create_dir_all(data_dir)
            .await
            .map_err(|e| Error::io_with_path(e, data_dir))?;

        let repos = Repositories::open(data_dir).await?;
        let tenant = DocumentStore::open(data_dir, TENANT_DOCUMENT).await?;
        log::info!("Opened data directory {}", data_dir.display());

        let state = Self {
            repos,
            tenant,
            verifier: Arc::new(OrbitClient::new()),
            vdr: Arc::new(GithubVdr::new(config.github.api_base.clone())),
            orbit_defaults: config.orbit.clone(),
            auth: config.auth.clone(),
            services: Services::new(),
            references: Mutex::new(()),
            started: Instant::now(),
        };
        state.refresh_service_states().await;
        Ok(state)
    }

    /// In-memory state with the given outbound clients.
    pub fn in_memory(verifier: Arc<dyn Verifier>, vdr: Arc<dyn Vdr>) -> Self {
        let services = Services::new();
        services.storage.set_state(ServiceState::Ready);
        Self {
            repos: Repositories::in_memory(),
            tenant: DocumentStore::in_memory(TenantConfig::default()),
            verifier,
            vdr,
            orbit_defaults: OrbitSettings::default(),
            auth: AuthConfig::default(),
            services,
            references: Mutex::new(()),
            started: Instant::now(),
        }
    }

    /// Set the Orbit fallback credentials.
    pub fn with_orbit_defaults(mut self, orbit: OrbitSettings) -> Self {
        self.orbit_defaults = orbit;
        self
    }

    /// Set the authentication settings.
    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    /// Current tenant settings.
    pub async fn tenant(&self) -> TenantConfig {
        self.tenant.get().await
    }

    /// Fail with `AppDisabled` unless `app` is enabled for the tenant.
    pub async fn require_app(&self, app: AppId) -> Result<()> {
        self.tenant.get().await.require_app(app)
    }

    /// Orbit credentials after applying the fallback.
    pub async fn orbit_settings(&self) -> OrbitSettings {
        self.tenant.get().await.orbit.resolved(&self.orbit_defaults)
    }

    /// Recompute service states from the current settings.
    pub async fn refresh_service_states(&self) {
        self.services.storage.set_state(ServiceState::Ready);

        let tenant = self.tenant.get().await;
        if tenant.orbit.resolved(&self.orbit_defaults).is_configured() {
            self.services.orbit.set_state(ServiceState::Ready);
        } else {
            self.services
                .orbit
                .set_state(ServiceState::Degraded("credentials not configured".into()));
        }
        if tenant.github.is_configured() {
            self.services.vdr.set_state(ServiceState::Ready);
        } else {
            self.services
                .vdr
                .set_state(ServiceState::Degraded("repository not configured".into()));
        }
    }
}
