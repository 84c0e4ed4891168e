//! Payment processor collaborator.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::models::CheckoutSession;

/// Errors talking to the payment processor.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaymentProviderError {
    #[error("Payment processor returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Payment processor unreachable: {0}")]
    Transport(String),

    #[error("Unexpected payment processor response: {0}")]
    Decode(String),

    #[error("Checkout session not found: {0}")]
    SessionNotFound(String),
}

impl PaymentProviderError {
    /// Whether a redelivery of the webhook could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            PaymentProviderError::Api { status, .. } => *status == 429 || *status >= 500,
            PaymentProviderError::Transport(_) => true,
            PaymentProviderError::Decode(_) | PaymentProviderError::SessionNotFound(_) => false,
        }
    }
}

/// Read/write access to the payment processor.
#[async_trait::async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Fetches a checkout session with its line items expanded.
    async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, PaymentProviderError>;

    /// Stops a payment link from accepting further purchases.
    async fn deactivate_payment_link(&self, link_id: &str) -> Result<(), PaymentProviderError>;
}

/// In-memory payment provider for development and testing.
#[derive(Debug, Clone, Default)]
pub struct MockPaymentProvider {
    sessions: Arc<Mutex<HashMap<String, CheckoutSession>>>,
    deactivated: Arc<Mutex<Vec<String>>>,
    failure: Option<PaymentProviderError>,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose every call fails with `error`.
    pub fn failing(error: PaymentProviderError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Registers a session to be returned by `retrieve_checkout_session`.
    pub fn with_session(self, session: CheckoutSession) -> Self {
        self.insert_session(session);
        self
    }

    pub fn insert_session(&self, session: CheckoutSession) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.insert(session.id.clone(), session);
        }
    }

    /// Payment links deactivated so far.
    pub fn deactivated_links(&self) -> Vec<String> {
        self.deactivated
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, PaymentProviderError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        self.sessions
            .lock()
            .ok()
            .and_then(|sessions| sessions.get(session_id).cloned())
            .ok_or_else(|| PaymentProviderError::SessionNotFound(session_id.to_string()))
    }

    async fn deactivate_payment_link(&self, link_id: &str) -> Result<(), PaymentProviderError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        if let Ok(mut deactivated) = self.deactivated.lock() {
            deactivated.push(link_id.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(PaymentProviderError::Transport("timeout".into()).is_retryable());
        assert!(PaymentProviderError::Api { status: 503, message: String::new() }.is_retryable());
        assert!(PaymentProviderError::Api { status: 429, message: String::new() }.is_retryable());
        assert!(!PaymentProviderError::Api { status: 400, message: String::new() }.is_retryable());
        assert!(!PaymentProviderError::Decode("bad".into()).is_retryable());
    }

    #[tokio::test]
    async fn test_mock_returns_registered_session() {
        let provider = MockPaymentProvider::new().with_session(CheckoutSession {
            id: "cs_1".into(),
            ..Default::default()
        });

        assert_eq!(provider.retrieve_checkout_session("cs_1").await.unwrap().id, "cs_1");
        assert!(matches!(
            provider.retrieve_checkout_session("cs_2").await,
            Err(PaymentProviderError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_mock_records_deactivations() {
        let provider = MockPaymentProvider::new();
        provider.deactivate_payment_link("plink_1").await.unwrap();
        assert_eq!(provider.deactivated_links(), vec!["plink_1".to_string()]);
    }

    #[test]
    fn test_mock_failure() {
        let provider = MockPaymentProvider::failing(PaymentProviderError::Transport("down".into()));
        let result = tokio_test::block_on(provider.retrieve_checkout_session("cs_1"));
        assert_eq!(result.unwrap_err(), PaymentProviderError::Transport("down".into()));
    }
}
