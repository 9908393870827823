//! Transport Provider
//!
//! Holds the primary transport used for REST commands and a secondary
//! transport for direct file downloads. The secondary one is only built the
//! first time a download needs it.

use std::sync::{Arc, Mutex};
use tracing::debug;

use super::client::{HttpTransport, ReqwestTransport};
use super::errors::RestError;
use crate::config::ClientConfig;

/// Builds the secondary transport on first use
pub type TransportFactory = Box<dyn Fn() -> Result<Arc<dyn HttpTransport>, RestError> + Send + Sync>;

pub struct TransportProvider {
    /// Transport for upload commands
    primary: Arc<dyn HttpTransport>,
    /// Lazily created download transport; the lock also guards `set_secondary`
    secondary: Mutex<Option<Arc<dyn HttpTransport>>>,
    factory: TransportFactory,
}

impl TransportProvider {
    pub fn new(primary: Arc<dyn HttpTransport>, factory: TransportFactory) -> Self {
        Self {
            primary,
            secondary: Mutex::new(None),
            factory,
        }
    }

    /// Two reqwest transports sharing the configured timeout
    pub fn from_config(config: &ClientConfig) -> Result<Self, RestError> {
        let timeout = config.request_timeout;
        let primary = Arc::new(ReqwestTransport::with_timeout(timeout)?);

        Ok(Self::new(
            primary,
            Box::new(move || -> Result<Arc<dyn HttpTransport>, RestError> {
                Ok(Arc::new(ReqwestTransport::with_timeout(timeout)?))
            }),
        ))
    }

    pub fn primary(&self) -> Arc<dyn HttpTransport> {
        Arc::clone(&self.primary)
    }

    /// Get the download transport, creating it if this is the first use
    pub fn secondary(&self) -> Result<Arc<dyn HttpTransport>, RestError> {
        let mut slot = self.secondary.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(transport) = slot.as_ref() {
            return Ok(Arc::clone(transport));
        }

        let transport = (self.factory)()?;
        debug!("Created secondary download transport");
        *slot = Some(Arc::clone(&transport));
        Ok(transport)
    }

    /// Replace the download transport
    pub fn set_secondary(&self, transport: Arc<dyn HttpTransport>) {
        let mut slot = self.secondary.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(transport);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::mock::MockTransport;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_provider() -> (TransportProvider, Arc<AtomicUsize>) {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let provider = TransportProvider::new(
            MockTransport::new(),
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                let transport: Arc<dyn HttpTransport> = MockTransport::new();
                Ok(transport)
            }),
        );
        (provider, built)
    }

    #[test]
    fn test_secondary_is_lazy() {
        let (provider, built) = counting_provider();
        let _ = provider.primary();
        assert_eq!(built.load(Ordering::SeqCst), 0);

        let first = provider.secondary().unwrap();
        let second = provider.secondary().unwrap();
        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_secondary_built_once_across_threads() {
        let (provider, built) = counting_provider();
        let provider = Arc::new(provider);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let provider = Arc::clone(&provider);
                std::thread::spawn(move || provider.secondary().unwrap())
            })
            .collect();
        let transports: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert!(transports.iter().all(|t| Arc::ptr_eq(t, &transports[0])));
    }

    #[test]
    fn test_set_secondary_skips_factory() {
        let (provider, built) = counting_provider();
        let replacement: Arc<dyn HttpTransport> = MockTransport::new();

        provider.set_secondary(Arc::clone(&replacement));

        assert!(Arc::ptr_eq(&provider.secondary().unwrap(), &replacement));
        assert_eq!(built.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_factory_failure_is_retried_next_time() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let provider = TransportProvider::new(
            MockTransport::new(),
            Box::new(move || {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    return Err(RestError::Request("no TLS backend".into()));
                }
                let transport: Arc<dyn HttpTransport> = MockTransport::new();
                Ok(transport)
            }),
        );

        assert!(provider.secondary().is_err());
        assert!(provider.secondary().is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
