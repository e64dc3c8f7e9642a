//! 支付网关客户端与回调签名校验
//!
//! 回调签名是网关用共享密钥对 `"{order_id}|{payment_id}"` 计算的
//! HMAC-SHA256（hex 编码）。校验走 `ring::hmac::verify`，常数时间
//! 比较，防时序侧信道。

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use ring::hmac;
use serde::Deserialize;

use shared::error::{AppError, AppResult};

/// 网关侧创建的支付订单
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    #[serde(rename = "amount")]
    pub amount_minor: i64,
    pub currency: String,
}

/// 支付网关协作方
///
/// 实现方必须对调用限定耗时；超时按失败向调用方上抛，不做静默重试。
#[async_trait]
pub trait PaymentGateway: Send + Sync + fmt::Debug {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> AppResult<GatewayOrder>;
}

/// HTTP 实现：Basic 认证 + 每次调用超时
#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    http: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl HttpPaymentGateway {
    pub fn new(base_url: &str, key_id: &str, key_secret: &str, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            key_id: key_id.to_string(),
            key_secret: key_secret.to_string(),
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> AppResult<GatewayOrder> {
        let url = format!("{}/v1/orders", self.base_url);
        let body = serde_json::json!({
            "amount": amount_minor,
            "currency": currency,
            "receipt": receipt,
        });

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    tracing::warn!(receipt = %receipt, "Payment gateway timed out");
                    AppError::gateway_timeout("Payment gateway did not answer in time")
                } else {
                    tracing::warn!(receipt = %receipt, error = %e, "Payment gateway unreachable");
                    AppError::gateway(format!("Payment gateway request failed: {e}"))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(receipt = %receipt, status = %status, body = %text, "Gateway rejected order");
            return Err(AppError::gateway(format!(
                "Payment gateway rejected order ({status})"
            )));
        }

        response
            .json::<GatewayOrder>()
            .await
            .map_err(|e| AppError::gateway(format!("Invalid gateway response: {e}")))
    }
}

/// 计算回调签名（测试与客户端模拟用；生产中由网关计算）
pub fn sign(secret: &str, order_id: &str, payment_id: &str) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    let tag = hmac::sign(&key, format!("{order_id}|{payment_id}").as_bytes());
    hex::encode(tag.as_ref())
}

/// 校验回调签名（常数时间比较）
///
/// 非法 hex、长度不符一律按校验失败处理。
pub fn verify_signature(secret: &str, order_id: &str, payment_id: &str, signature: &str) -> bool {
    let Ok(provided) = hex::decode(signature) else {
        return false;
    };
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    hmac::verify(
        &key,
        format!("{order_id}|{payment_id}").as_bytes(),
        &provided,
    )
    .is_ok()
}
