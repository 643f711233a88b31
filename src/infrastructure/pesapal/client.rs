use anyhow::Result;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::error;

use crate::config::config_model::Pesapal;
use crate::domain::value_objects::orders::OrderSubmission;
use crate::infrastructure::pesapal::token::{CachedToken, TokenCache};

const BASE_LIVE: &str = "https://pay.pesapal.com/v3";
const BASE_SANDBOX: &str = "https://cybqa.pesapal.com/pesapalv3";

const GATEWAY_TIMEOUT: Duration = Duration::from_secs(15);
const SUBMIT_TIMEOUT: Duration = Duration::from_secs(20);

/// Minimal Pesapal v3 client built on reqwest.
///
/// Responses are normalized here: the gateway uses inconsistent casing and
/// key names across environments, so every observed variant is declared as a
/// serde alias and callers only ever see the canonical shape.
pub struct PesapalClient {
    http: reqwest::Client,
    base_url: String,
    consumer_key: String,
    consumer_secret: String,
    callback_url: String,
    token_cache: TokenCache,
}

#[derive(Debug, Clone)]
pub struct IpnRegistration {
    pub ipn_id: String,
    pub url: Option<String>,
    pub raw: Value,
}

#[derive(Debug, Clone)]
pub struct SubmittedOrder {
    pub checkout_url: Option<String>,
    pub tracking_id: Option<String>,
    pub raw: Value,
}

#[derive(Debug, Clone)]
pub struct TransactionStatus {
    pub status: Option<String>,
    pub tracking_id: Option<String>,
    pub merchant_reference: Option<String>,
    pub raw: Value,
}

impl TransactionStatus {
    pub fn is_completed(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|status| status.eq_ignore_ascii_case("COMPLETED"))
    }
}

#[derive(Debug, Deserialize)]
struct IpnRegistrationFields {
    #[serde(alias = "notification_id", alias = "notificationId")]
    ipn_id: String,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SubmittedOrderFields {
    #[serde(default, alias = "payment_url", alias = "url", alias = "redirect_url")]
    checkout_url: Option<String>,
    #[serde(default, alias = "order_tracking_id", alias = "orderTrackingId")]
    tracking_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TransactionStatusFields {
    #[serde(
        default,
        alias = "transaction_status",
        alias = "payment_status_description"
    )]
    status: Option<String>,
    #[serde(default, alias = "order_tracking_id", alias = "orderTrackingId")]
    tracking_id: Option<String>,
    #[serde(default, alias = "merchant_reference", alias = "merchantReference")]
    merchant_reference: Option<String>,
}

impl PesapalClient {
    pub fn new(config: &Pesapal) -> Self {
        let base_url = if config.test_mode {
            BASE_SANDBOX
        } else {
            BASE_LIVE
        };

        Self {
            http: reqwest::Client::new(),
            base_url: base_url.to_string(),
            consumer_key: config.consumer_key.clone(),
            consumer_secret: config.consumer_secret.clone(),
            callback_url: config.callback_url.clone(),
            token_cache: TokenCache::new(),
        }
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        error!(
            status = %status,
            response_body = %body,
            context = %context,
            "pesapal api request failed"
        );

        anyhow::bail!("Pesapal API request failed: {} (status {})", context, status);
    }

    async fn access_token(&self) -> Result<String> {
        self.token_cache.bearer_token(|| self.request_token()).await
    }

    async fn request_token(&self) -> Result<CachedToken> {
        #[derive(Deserialize)]
        struct TokenResponse {
            token: String,
        }

        let payload = serde_json::json!({
            "consumer_key": self.consumer_key,
            "consumer_secret": self.consumer_secret,
        });

        let resp = self
            .http
            .post(format!("{}/api/Auth/RequestToken", self.base_url))
            .timeout(GATEWAY_TIMEOUT)
            .json(&payload)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "request token").await?;

        let parsed: TokenResponse = resp.json().await?;
        Ok(CachedToken::leased_now(parsed.token))
    }

    /// Registers the IPN callback URL. Not deduplicated: calling twice
    /// registers twice. The returned id must be persisted to configuration
    /// and supplied on order submission.
    pub async fn register_ipn(&self, callback_url: &str) -> Result<IpnRegistration> {
        let token = self.access_token().await?;
        let payload = serde_json::json!({
            "url": callback_url,
            "ipn_notification_type": "POST",
        });

        let resp = self
            .http
            .post(format!("{}/api/URLSetup/RegisterIPN", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .timeout(GATEWAY_TIMEOUT)
            .json(&payload)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "register ipn").await?;

        let raw: Value = resp.json().await?;
        let fields: IpnRegistrationFields = serde_json::from_value(raw.clone())?;
        Ok(IpnRegistration {
            ipn_id: fields.ipn_id,
            url: fields.url,
            raw,
        })
    }

    /// Submits a payment order. Single attempt; the caller decides what a
    /// failure means.
    pub async fn submit_order(&self, submission: OrderSubmission) -> Result<SubmittedOrder> {
        let token = self.access_token().await?;
        let payload = serde_json::json!({
            "id": submission.merchant_reference,
            "amount": f64::from(submission.amount_minor) / 100.0,
            "currency": "KES",
            "description": submission.description,
            "callback_url": self.callback_url,
            "notification_id": submission.notification_id,
            "billing_address": {
                "email_address": submission.email,
                "phone_number": submission.phone,
                "country_code": "KE",
                "first_name": "Customer",
                "last_name": "User",
            },
        });

        let resp = self
            .http
            .post(format!(
                "{}/api/Transactions/SubmitOrderRequest",
                self.base_url
            ))
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .timeout(SUBMIT_TIMEOUT)
            .json(&payload)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "submit order").await?;

        let raw: Value = resp.json().await?;
        let fields: SubmittedOrderFields = serde_json::from_value(raw.clone()).unwrap_or_default();
        Ok(SubmittedOrder {
            checkout_url: fields.checkout_url,
            tracking_id: fields.tracking_id,
            raw,
        })
    }

    /// Synchronous status poll; no retry or backoff, the caller decides.
    pub async fn transaction_status(&self, tracking_id: &str) -> Result<TransactionStatus> {
        let token = self.access_token().await?;

        let resp = self
            .http
            .get(format!(
                "{}/api/Transactions/GetTransactionStatus",
                self.base_url
            ))
            .query(&[("orderTrackingId", tracking_id)])
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .timeout(GATEWAY_TIMEOUT)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "get transaction status").await?;

        let raw: Value = resp.json().await?;
        let fields: TransactionStatusFields =
            serde_json::from_value(raw.clone()).unwrap_or_default();
        Ok(TransactionStatus {
            status: fields.status,
            tracking_id: fields.tracking_id,
            merchant_reference: fields.merchant_reference,
            raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submitted_order_accepts_every_checkout_url_variant() {
        for key in ["checkout_url", "payment_url", "url", "redirect_url"] {
            let raw = serde_json::json!({ key: "https://pay.example/redirect" });
            let fields: SubmittedOrderFields = serde_json::from_value(raw).unwrap();
            assert_eq!(
                fields.checkout_url.as_deref(),
                Some("https://pay.example/redirect"),
                "variant {key} not normalized"
            );
        }
    }

    #[test]
    fn submitted_order_accepts_both_tracking_id_casings() {
        for key in ["order_tracking_id", "orderTrackingId"] {
            let raw = serde_json::json!({ key: "trk-1" });
            let fields: SubmittedOrderFields = serde_json::from_value(raw).unwrap();
            assert_eq!(fields.tracking_id.as_deref(), Some("trk-1"));
        }
    }

    #[test]
    fn transaction_status_accepts_every_status_key() {
        for key in ["status", "transaction_status", "payment_status_description"] {
            let raw = serde_json::json!({ key: "COMPLETED" });
            let fields: TransactionStatusFields = serde_json::from_value(raw).unwrap();
            assert_eq!(fields.status.as_deref(), Some("COMPLETED"));
        }
    }

    #[test]
    fn transaction_status_normalizes_merchant_reference_casing() {
        let raw = serde_json::json!({ "merchantReference": "sub_x_1" });
        let fields: TransactionStatusFields = serde_json::from_value(raw).unwrap();
        assert_eq!(fields.merchant_reference.as_deref(), Some("sub_x_1"));
    }

    #[test]
    fn completed_compare_is_case_insensitive() {
        let status = TransactionStatus {
            status: Some("Completed".to_string()),
            tracking_id: None,
            merchant_reference: None,
            raw: Value::Null,
        };
        assert!(status.is_completed());
    }

    #[test]
    fn absent_status_is_not_completed() {
        let status = TransactionStatus {
            status: None,
            tracking_id: None,
            merchant_reference: None,
            raw: Value::Null,
        };
        assert!(!status.is_completed());
    }

    #[test]
    fn ipn_registration_accepts_notification_id_alias() {
        let raw = serde_json::json!({ "notification_id": "ipn-1", "url": "https://svc/ipn" });
        let fields: IpnRegistrationFields = serde_json::from_value(raw).unwrap();
        assert_eq!(fields.ipn_id, "ipn-1");
    }
}
