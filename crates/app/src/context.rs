//! App Context

use std::{path::PathBuf, sync::Arc};

use storefront::{
    cart::{CartLedger, FileSnapshotStore},
    coupons::{CouponError, DiscountPercent},
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    admin::{AdminGate, AdminService},
    catalog::{CatalogService, RemoteCatalogService, RemoteSettings},
    checkout::{CheckoutOrchestrator, CheckoutSettings},
    config::{AppConfig, StoreConfig},
    coupons::{CouponsService, RemoteCouponsService},
    launcher::{ChannelLauncher, DisabledLauncher, SystemLauncher},
    records::{RecordStoreClient, RecordStoreConfig, RecordStoreError},
    session::{Session, WelcomeCode},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to build record store client")]
    Records(#[from] RecordStoreError),

    #[error("invalid welcome discount")]
    WelcomeCode(#[from] CouponError),
}

/// Services and resolved settings shared by every command.
#[derive(Clone)]
pub struct AppContext {
    pub catalog: Arc<dyn CatalogService>,
    pub coupons: Arc<dyn CouponsService>,
    pub launcher: Arc<dyn ChannelLauncher>,
    pub store: StoreConfig,
    pub snapshot_path: PathBuf,
    pub admin: AdminGate,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("store", &self.store)
            .field("snapshot_path", &self.snapshot_path)
            .field("admin", &self.admin)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Build application context from configuration.
    ///
    /// With `open_links` false the checkout link is printed instead of
    /// opened.
    ///
    /// # Errors
    ///
    /// Returns an error when the record store URL is invalid or the client
    /// cannot be built.
    pub fn from_config(config: &AppConfig, open_links: bool) -> Result<Self, AppInitError> {
        let records = RecordStoreClient::new(RecordStoreConfig {
            base_url: config.remote.remote_url.clone(),
            api_key: config.remote.remote_api_key.clone(),
            timeout: config.remote.timeout(),
        })?;

        let launcher: Arc<dyn ChannelLauncher> = if open_links {
            Arc::new(SystemLauncher::new())
        } else {
            Arc::new(DisabledLauncher)
        };

        Ok(Self {
            catalog: Arc::new(RemoteCatalogService::new(records.clone())),
            coupons: Arc::new(RemoteCouponsService::new(records)),
            launcher,
            store: config.store.clone(),
            snapshot_path: config.storage.cart_snapshot_path.clone(),
            admin: AdminGate::new(config.admin.admin_secret.clone()),
        })
    }

    /// Overlay the remote settings row on the local store settings.
    ///
    /// A missing row or a failed fetch keeps the local values.
    pub async fn resolve_settings(&mut self) {
        match self.catalog.fetch_settings().await {
            Ok(Some(settings)) => apply_remote_settings(&mut self.store, &settings),
            Ok(None) => debug!("no remote settings row; using local settings"),
            Err(error) => warn!(%error, "failed to fetch remote settings; using local settings"),
        }
    }

    /// Start a session over the persisted cart with a fresh welcome code.
    ///
    /// # Errors
    ///
    /// Returns an error when the configured welcome discount is out of range.
    pub fn open_session(&self) -> Result<Session<FileSnapshotStore>, AppInitError> {
        let discount = DiscountPercent::new(i64::from(self.store.welcome_discount))?;
        let welcome = WelcomeCode::generate(discount)?;

        Ok(Session::start(
            CartLedger::new(FileSnapshotStore::new(&self.snapshot_path)),
            welcome,
        ))
    }

    /// Checkout settings derived from the resolved store settings.
    pub fn checkout_settings(&self) -> CheckoutSettings {
        CheckoutSettings::from(&self.store)
    }

    /// A checkout orchestrator over this context's services.
    pub fn orchestrator(&self) -> CheckoutOrchestrator {
        CheckoutOrchestrator::new(
            Arc::clone(&self.coupons),
            Arc::clone(&self.launcher),
            self.checkout_settings(),
        )
    }

    /// Admin operations over this context's services.
    pub fn admin_service(&self) -> AdminService {
        AdminService::new(Arc::clone(&self.coupons), Arc::clone(&self.catalog))
    }
}

fn apply_remote_settings(store: &mut StoreConfig, settings: &RemoteSettings) {
    if let Some(destination) = settings.destination() {
        info!(destination, "using remote messaging destination");
        store.whatsapp_number = destination.to_string();
    }

    if let Some(discount) = settings.welcome_discount {
        match DiscountPercent::new(discount) {
            Ok(percent) => {
                info!(%percent, "using remote welcome discount");
                store.welcome_discount = percent.value();
            }
            Err(error) => warn!(%error, "ignoring remote welcome discount"),
        }
    }
}
