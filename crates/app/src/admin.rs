//! Admin
//!
//! Store-owner operations behind a single shared secret: coupon issuance,
//! listing and revocation, and the catalog dashboard.

use std::{fmt, sync::Arc};

use storefront::{
    coupons::{Coupon, CouponCode, CouponError, DiscountPercent},
    metrics::StoreMetrics,
    products::{Category, Product},
};
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    catalog::{CatalogService, CatalogServiceError},
    coupons::{CouponsService, CouponsServiceError},
};

/// Admin errors.
#[derive(Debug, Error)]
pub enum AdminError {
    /// No admin secret is configured, so admin is disabled.
    #[error("admin access is not configured")]
    NotConfigured,

    /// The presented secret does not match.
    #[error("access denied")]
    Denied,

    /// A coupon operation failed.
    #[error(transparent)]
    Coupons(#[from] CouponsServiceError),

    /// Catalog data could not be loaded.
    #[error("failed to load catalog")]
    Catalog(#[from] CatalogServiceError),
}

impl From<CouponError> for AdminError {
    fn from(error: CouponError) -> Self {
        Self::Coupons(error.into())
    }
}

/// Checks the shared admin secret.
#[derive(Clone)]
pub struct AdminGate {
    secret: Option<String>,
}

impl fmt::Debug for AdminGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminGate")
            .field("configured", &self.is_configured())
            .finish()
    }
}

impl AdminGate {
    /// Create a gate. A blank secret disables admin access.
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|secret| !secret.trim().is_empty()),
        }
    }

    /// Whether a secret is configured.
    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Compare `presented` against the configured secret in constant time.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::NotConfigured`] when no secret is set and
    /// [`AdminError::Denied`] when the secrets differ.
    pub fn verify(&self, presented: &str) -> Result<(), AdminError> {
        let Some(secret) = &self.secret else {
            return Err(AdminError::NotConfigured);
        };

        if bool::from(presented.as_bytes().ct_eq(secret.as_bytes())) {
            Ok(())
        } else {
            warn!("rejected admin secret");

            Err(AdminError::Denied)
        }
    }
}

/// Catalog snapshot for the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    /// Every product.
    pub products: Vec<Product>,

    /// Every category.
    pub categories: Vec<Category>,
}

impl Dashboard {
    /// Figures derived from the snapshot.
    pub fn metrics(&self) -> StoreMetrics<'_> {
        StoreMetrics::compute(&self.products, &self.categories)
    }
}

/// Store-owner operations. Callers check the [`AdminGate`] first.
#[derive(Clone)]
pub struct AdminService {
    coupons: Arc<dyn CouponsService>,
    catalog: Arc<dyn CatalogService>,
}

impl fmt::Debug for AdminService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminService").finish_non_exhaustive()
    }
}

impl AdminService {
    /// Create the service.
    pub fn new(coupons: Arc<dyn CouponsService>, catalog: Arc<dyn CatalogService>) -> Self {
        Self { coupons, catalog }
    }

    /// Issue a new `WELCOME-` coupon.
    ///
    /// # Errors
    ///
    /// Returns an error when `discount` is outside 1-100 (checked before
    /// any remote call) or the coupon store rejects the insert.
    pub async fn issue_coupon(&self, discount: i64) -> Result<Coupon, AdminError> {
        let discount = DiscountPercent::new(discount)?;

        let coupon = self.coupons.create_coupon(discount).await?;

        info!(code = %coupon.code, %discount, "admin issued coupon");

        Ok(coupon)
    }

    /// Every coupon, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error when the coupon store cannot be read.
    pub async fn list_coupons(&self) -> Result<Vec<Coupon>, AdminError> {
        Ok(self.coupons.list_coupons().await?)
    }

    /// Delete a coupon by code.
    ///
    /// # Errors
    ///
    /// Returns an error when the code is blank, unknown, or the delete
    /// fails.
    pub async fn revoke_coupon(&self, code: &str) -> Result<CouponCode, AdminError> {
        let code = CouponCode::parse(code)?;

        self.coupons.delete_coupon(&code).await?;

        info!(%code, "admin revoked coupon");

        Ok(code)
    }

    /// Load the catalog for the dashboard.
    ///
    /// # Errors
    ///
    /// Returns an error when products or categories cannot be loaded.
    pub async fn dashboard(&self) -> Result<Dashboard, AdminError> {
        let (products, categories) = tokio::try_join!(
            self.catalog.list_products(),
            self.catalog.list_categories()
        )?;

        Ok(Dashboard {
            products,
            categories,
        })
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use storefront::fixtures;
    use testresult::TestResult;

    use crate::catalog::MockCatalogService;
    use crate::coupons::MockCouponsService;

    use super::*;

    fn service(coupons: MockCouponsService, catalog: MockCatalogService) -> AdminService {
        AdminService::new(Arc::new(coupons), Arc::new(catalog))
    }

    #[test]
    fn gate_accepts_only_the_configured_secret() -> TestResult {
        let gate = AdminGate::new(Some("s3cret".to_string()));

        gate.verify("s3cret")?;

        assert!(matches!(gate.verify("s3cre"), Err(AdminError::Denied)));
        assert!(matches!(gate.verify("s3cret!"), Err(AdminError::Denied)));
        assert!(matches!(gate.verify(""), Err(AdminError::Denied)));

        Ok(())
    }

    #[test]
    fn blank_secret_disables_admin() {
        let gate = AdminGate::new(Some("   ".to_string()));

        assert!(!gate.is_configured());
        assert!(matches!(gate.verify("   "), Err(AdminError::NotConfigured)));
        assert!(matches!(
            AdminGate::new(None).verify("anything"),
            Err(AdminError::NotConfigured)
        ));
    }

    #[test]
    fn gate_debug_never_shows_the_secret() {
        let gate = AdminGate::new(Some("s3cret".to_string()));

        assert!(!format!("{gate:?}").contains("s3cret"));
    }

    #[tokio::test]
    async fn out_of_range_discount_never_reaches_the_store() {
        let mut coupons = MockCouponsService::new();
        coupons.expect_create_coupon().never();

        let admin = service(coupons, MockCatalogService::new());

        for discount in [0, 101, -5] {
            let result = admin.issue_coupon(discount).await;

            assert!(
                matches!(
                    result,
                    Err(AdminError::Coupons(CouponsServiceError::Coupon(
                        CouponError::DiscountOutOfRange(_)
                    )))
                ),
                "expected DiscountOutOfRange for {discount}, got {result:?}"
            );
        }
    }

    #[tokio::test]
    async fn issue_coupon_creates_with_the_discount() -> TestResult {
        let discount = DiscountPercent::new(30)?;
        let created = Coupon::new(CouponCode::parse("WELCOME-ABC123")?, discount);

        let mut coupons = MockCouponsService::new();
        coupons
            .expect_create_coupon()
            .with(eq(discount))
            .times(1)
            .return_once(move |_| Ok(created));

        let coupon = service(coupons, MockCatalogService::new())
            .issue_coupon(30)
            .await?;

        assert_eq!(coupon.code.as_str(), "WELCOME-ABC123");

        Ok(())
    }

    #[tokio::test]
    async fn revoke_normalises_the_code() -> TestResult {
        let mut coupons = MockCouponsService::new();
        coupons
            .expect_delete_coupon()
            .with(eq(CouponCode::parse("WELCOME-ABC123")?))
            .times(1)
            .returning(|_| Ok(()));

        let code = service(coupons, MockCatalogService::new())
            .revoke_coupon("  welcome-abc123 ")
            .await?;

        assert_eq!(code.as_str(), "WELCOME-ABC123");

        Ok(())
    }

    #[tokio::test]
    async fn dashboard_combines_products_and_categories() -> TestResult {
        let products = fixtures::catalog()?;

        let mut catalog = MockCatalogService::new();
        catalog
            .expect_list_products()
            .return_once(move || Ok(products));
        catalog.expect_list_categories().returning(|| Ok(Vec::new()));

        let dashboard = service(MockCouponsService::new(), catalog)
            .dashboard()
            .await?;
        let metrics = dashboard.metrics();

        assert_eq!(metrics.total_products, 4);
        assert_eq!(metrics.total_categories, 0);
        assert_eq!(metrics.total_views, 15);

        Ok(())
    }
}
