//! Stripe REST client implementing the payment provider seam.

use async_trait::async_trait;
use domain::models::{CheckoutSession, LineItem};
use domain::services::{PaymentProvider, PaymentProviderError};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::PaymentsConfig;

#[derive(Debug, Deserialize)]
struct StripeSession {
    id: String,
    payment_intent: Option<String>,
    customer_email: Option<String>,
    customer_details: Option<CustomerDetails>,
    #[serde(default)]
    metadata: HashMap<String, String>,
    created: i64,
    payment_link: Option<String>,
    line_items: Option<StripeList<StripeLineItem>>,
}

#[derive(Debug, Deserialize)]
struct CustomerDetails {
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeList<T> {
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct StripeLineItem {
    quantity: Option<i64>,
    currency: Option<String>,
    price: Option<StripePrice>,
}

#[derive(Debug, Deserialize)]
struct StripePrice {
    id: String,
    unit_amount: Option<i64>,
    currency: String,
    product: Option<ProductRef>,
}

/// `product` is an id unless expanded.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProductRef {
    Id(String),
    Expanded { id: String },
}

impl ProductRef {
    fn into_id(self) -> String {
        match self {
            ProductRef::Id(id) | ProductRef::Expanded { id } => id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetails,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetails {
    message: Option<String>,
}

impl From<StripeSession> for CheckoutSession {
    fn from(session: StripeSession) -> Self {
        let payment_link = session.payment_link;
        let line_items = session
            .line_items
            .map(|list| list.data)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| {
                let price = item.price?;
                Some(LineItem {
                    price_id: price.id,
                    product_id: price.product.map(ProductRef::into_id),
                    payment_link: payment_link.clone(),
                    quantity: item.quantity.unwrap_or(1),
                    unit_amount: price.unit_amount,
                    currency: item.currency.unwrap_or(price.currency),
                })
            })
            .collect();

        CheckoutSession {
            id: session.id,
            payment_intent: session.payment_intent,
            customer_email: session
                .customer_email
                .or_else(|| session.customer_details.and_then(|d| d.email)),
            metadata: session.metadata,
            created: session.created,
            line_items,
        }
    }
}

/// Talks to the Stripe API with a secret key and a bounded timeout.
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl StripeClient {
    pub fn new(config: &PaymentsConfig) -> Result<Self, PaymentProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| PaymentProviderError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            api_key: config.provider_api_key.clone(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn api_error(response: reqwest::Response) -> PaymentProviderError {
        let status = response.status().as_u16();
        let message = response
            .json::<StripeErrorBody>()
            .await
            .ok()
            .and_then(|b| b.error.message)
            .unwrap_or_else(|| "no error message".to_string());
        PaymentProviderError::Api { status, message }
    }
}

fn transport(e: reqwest::Error) -> PaymentProviderError {
    PaymentProviderError::Transport(e.to_string())
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, PaymentProviderError> {
        let url = format!("{}/v1/checkout/sessions/{}", self.base_url, session_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(&[("expand[]", "line_items.data.price.product")])
            .send()
            .await
            .map_err(transport)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(PaymentProviderError::SessionNotFound(session_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let session: StripeSession = response
            .json()
            .await
            .map_err(|e| PaymentProviderError::Decode(e.to_string()))?;
        Ok(session.into())
    }

    async fn deactivate_payment_link(&self, link_id: &str) -> Result<(), PaymentProviderError> {
        let url = format!("{}/v1/payment_links/{}", self.base_url, link_id);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .form(&[("active", "false")])
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        tracing::info!(link_id = %link_id, "Payment link deactivated");
        Ok(())
    }
}
