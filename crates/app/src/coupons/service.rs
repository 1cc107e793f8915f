//! Coupons service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use serde::Serialize;
use storefront::{
    codes::{self, WELCOME_PREFIX},
    coupons::{Coupon, CouponCode, DiscountPercent},
};
use tracing::info;

use crate::{
    coupons::CouponsServiceError,
    records::{COUPONS, Query, RecordStoreClient},
};

#[derive(Debug, Serialize)]
struct NewCouponRecord<'a> {
    code: &'a str,
    discount: u8,
    is_used: bool,
}

#[derive(Debug, Serialize)]
struct RedeemedRecord {
    is_used: bool,
    used_at: Timestamp,
}

/// Coupons stored in the remote record store.
#[derive(Debug, Clone)]
pub struct RemoteCouponsService {
    records: RecordStoreClient,
}

impl RemoteCouponsService {
    /// Create a service backed by `records`.
    #[must_use]
    pub fn new(records: RecordStoreClient) -> Self {
        Self { records }
    }
}

#[async_trait]
impl CouponsService for RemoteCouponsService {
    #[tracing::instrument(name = "coupons.service.fetch_coupon", skip(self), fields(code = %code), err)]
    async fn fetch_coupon(
        &self,
        code: &CouponCode,
    ) -> Result<Option<Coupon>, CouponsServiceError> {
        let coupons: Vec<Coupon> = self
            .records
            .select(COUPONS, &Query::new().eq("code", code).limit(1))
            .await?;

        Ok(coupons.into_iter().next())
    }

    #[tracing::instrument(name = "coupons.service.mark_used", skip(self), fields(code = %code), err)]
    async fn mark_used(&self, code: &CouponCode) -> Result<(), CouponsServiceError> {
        // Only unused rows match, so a repeat call never moves `used_at`.
        let updated: Vec<Coupon> = self
            .records
            .update(
                COUPONS,
                &Query::new().eq("code", code).eq("is_used", false),
                &RedeemedRecord {
                    is_used: true,
                    used_at: Timestamp::now(),
                },
            )
            .await?;

        info!(updated = updated.len(), "marked coupon used");

        Ok(())
    }

    #[tracing::instrument(name = "coupons.service.create_coupon", skip(self), fields(discount = %discount), err)]
    async fn create_coupon(
        &self,
        discount: DiscountPercent,
    ) -> Result<Coupon, CouponsServiceError> {
        let code = codes::generate(WELCOME_PREFIX);

        let created: Vec<Coupon> = self
            .records
            .insert(
                COUPONS,
                &NewCouponRecord {
                    code: &code,
                    discount: discount.value(),
                    is_used: false,
                },
            )
            .await?;

        let coupon = created
            .into_iter()
            .next()
            .ok_or(CouponsServiceError::InvalidRecord)?;

        info!(code = %coupon.code, "created coupon");

        Ok(coupon)
    }

    #[tracing::instrument(name = "coupons.service.list_coupons", skip(self), err)]
    async fn list_coupons(&self) -> Result<Vec<Coupon>, CouponsServiceError> {
        Ok(self
            .records
            .select(COUPONS, &Query::new().order_desc("created_at"))
            .await?)
    }

    #[tracing::instrument(name = "coupons.service.delete_coupon", skip(self), fields(code = %code), err)]
    async fn delete_coupon(&self, code: &CouponCode) -> Result<(), CouponsServiceError> {
        let deleted: Vec<Coupon> = self
            .records
            .delete(COUPONS, &Query::new().eq("code", code))
            .await?;

        if deleted.is_empty() {
            return Err(CouponsServiceError::NotFound);
        }

        info!("deleted coupon");

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait CouponsService: Send + Sync {
    /// Look up a coupon by its canonical code.
    async fn fetch_coupon(&self, code: &CouponCode)
    -> Result<Option<Coupon>, CouponsServiceError>;

    /// Flag a coupon as redeemed now. Idempotent: an already-used coupon
    /// keeps its original redemption time.
    async fn mark_used(&self, code: &CouponCode) -> Result<(), CouponsServiceError>;

    /// Issue a new `WELCOME-` coupon with the given discount.
    async fn create_coupon(&self, discount: DiscountPercent)
    -> Result<Coupon, CouponsServiceError>;

    /// Every coupon, newest first.
    async fn list_coupons(&self) -> Result<Vec<Coupon>, CouponsServiceError>;

    /// Delete a coupon.
    async fn delete_coupon(&self, code: &CouponCode) -> Result<(), CouponsServiceError>;
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use testresult::TestResult;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, method, path, query_param},
    };

    use crate::records::{RecordStoreConfig, RecordStoreError};

    use super::*;

    fn service(server: &MockServer) -> Result<RemoteCouponsService, RecordStoreError> {
        Ok(RemoteCouponsService::new(RecordStoreClient::new(
            RecordStoreConfig {
                base_url: server.uri(),
                api_key: "key".to_string(),
                timeout: Duration::from_secs(5),
            },
        )?))
    }

    #[tokio::test]
    async fn fetch_coupon_filters_on_exact_code() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/coupons"))
            .and(query_param("code", "eq.PROMO15"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": 4,
                "code": "PROMO15",
                "discount": 15,
                "is_used": false,
                "used_at": null,
                "created_at": "2025-03-01T12:00:00Z"
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let coupon = service(&server)?
            .fetch_coupon(&CouponCode::parse("promo15")?)
            .await?;

        assert_eq!(
            coupon.map(|coupon| coupon.discount_percent.value()),
            Some(15)
        );

        Ok(())
    }

    #[tokio::test]
    async fn missing_coupon_is_none() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/coupons"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let coupon = service(&server)?
            .fetch_coupon(&CouponCode::parse("nope")?)
            .await?;

        assert_eq!(coupon, None);

        Ok(())
    }

    #[tokio::test]
    async fn mark_used_only_patches_unused_rows() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/rest/v1/coupons"))
            .and(query_param("code", "eq.PROMO15"))
            .and(query_param("is_used", "eq.false"))
            .and(body_partial_json(json!({ "is_used": true })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        service(&server)?
            .mark_used(&CouponCode::parse("PROMO15")?)
            .await?;

        Ok(())
    }

    #[tokio::test]
    async fn create_coupon_issues_a_welcome_code() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/coupons"))
            .and(body_partial_json(json!({ "discount": 25, "is_used": false })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
                "id": 9,
                "code": "WELCOME-Q1W2E3",
                "discount": 25,
                "is_used": false
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let coupon = service(&server)?
            .create_coupon(DiscountPercent::new(25)?)
            .await?;

        assert_eq!(coupon.code.as_str(), "WELCOME-Q1W2E3");

        Ok(())
    }

    #[tokio::test]
    async fn deleting_an_unknown_coupon_is_not_found() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/rest/v1/coupons"))
            .and(query_param("code", "eq.GONE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let result = service(&server)?
            .delete_coupon(&CouponCode::parse("gone")?)
            .await;

        assert!(
            matches!(result, Err(CouponsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn store_failures_are_remote_errors() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/coupons"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = service(&server)?.list_coupons().await;

        assert!(
            matches!(result, Err(CouponsServiceError::Remote(_))),
            "expected Remote, got {result:?}"
        );

        Ok(())
    }
}
