//! mTLS Resource Operations
//!
//! Stateless wrapper around the three remote operations. Each performs
//! exactly one API call; there is no retry, no caching, and no local state.

use std::path::Path;

use tracing::{debug, info};

use crate::cloudflare::MtlsApi;
use crate::error::MtlsError;

/// mTLS certificate manager
pub struct MtlsManager<A> {
    api: A,
}

impl<A: MtlsApi> MtlsManager<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Upload a PEM CA bundle as a new account-scoped certificate.
    ///
    /// The bundle is read fully as text before the call; an unreadable path
    /// aborts the operation without issuing the remote request. Returns the
    /// id Cloudflare assigned to the new certificate.
    pub async fn import_bundle(
        &self,
        account_id: &str,
        bundle_path: &Path,
    ) -> Result<String, MtlsError> {
        info!("Importing CA bundle from {}", bundle_path.display());

        let bundle = tokio::fs::read_to_string(bundle_path)
            .await
            .map_err(|source| MtlsError::BundleRead {
                path: bundle_path.display().to_string(),
                source,
            })?;

        let certificate = self.api.create_certificate(account_id, &bundle).await?;
        debug!("Created certificate: {:?}", certificate);

        Ok(certificate.id)
    }

    /// Replace the hostname set associated with a certificate in a zone.
    ///
    /// The full desired list is sent each call; the endpoint replaces the
    /// previous association set rather than merging. Returns the hostnames
    /// the API reports as now associated, order preserved.
    pub async fn update_associates(
        &self,
        zone_id: &str,
        mtls_certificate_id: &str,
        hostnames: &[String],
    ) -> Result<Vec<String>, MtlsError> {
        info!("Updating hostname associations for zone {}", zone_id);

        self.api
            .update_hostname_associations(zone_id, mtls_certificate_id, hostnames)
            .await
    }

    /// Fetch the hostnames currently associated with a certificate.
    ///
    /// An empty list means Cloudflare reports zero associations; failures
    /// surface as errors, never as an empty list.
    pub async fn get_associates(
        &self,
        zone_id: &str,
        mtls_certificate_id: &str,
    ) -> Result<Vec<String>, MtlsError> {
        info!(
            "Fetching hostname associations for certificate {}",
            mtls_certificate_id
        );

        self.api
            .get_hostname_associations(zone_id, mtls_certificate_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::cloudflare::MtlsCertificate;

    /// Scripted stand-in for the live API
    struct FakeApi {
        certificate_id: &'static str,
        hostnames: Result<Vec<String>, &'static str>,
        calls: Arc<Mutex<Vec<&'static str>>>,
    }

    impl FakeApi {
        fn new() -> Self {
            Self {
                certificate_id: "cert-id",
                hostnames: Ok(Vec::new()),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl MtlsApi for FakeApi {
        async fn create_certificate(
            &self,
            _account_id: &str,
            _bundle_pem: &str,
        ) -> Result<MtlsCertificate, MtlsError> {
            self.calls.lock().unwrap().push("create");
            Ok(MtlsCertificate {
                id: self.certificate_id.to_string(),
                ca: true,
                issuer: None,
                serial_number: None,
                uploaded_on: None,
                expires_on: None,
            })
        }

        async fn update_hostname_associations(
            &self,
            _zone_id: &str,
            _mtls_certificate_id: &str,
            hostnames: &[String],
        ) -> Result<Vec<String>, MtlsError> {
            self.calls.lock().unwrap().push("update");
            match &self.hostnames {
                // Echo back whatever was sent, like the live endpoint
                Ok(_) => Ok(hostnames.to_vec()),
                Err(message) => Err(MtlsError::Api(message.to_string())),
            }
        }

        async fn get_hostname_associations(
            &self,
            _zone_id: &str,
            _mtls_certificate_id: &str,
        ) -> Result<Vec<String>, MtlsError> {
            self.calls.lock().unwrap().push("get");
            self.hostnames
                .clone()
                .map_err(|message| MtlsError::Api(message.to_string()))
        }
    }

    fn hostnames(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[tokio::test]
    async fn test_import_bundle_returns_certificate_id() {
        let mut api = FakeApi::new();
        api.certificate_id = "abc123";
        let manager = MtlsManager::new(api);

        let dir = tempfile::tempdir().unwrap();
        let bundle_path = dir.path().join("ca.pem");
        std::fs::write(&bundle_path, "-----BEGIN CERTIFICATE-----\n").unwrap();

        let id = manager.import_bundle("acct-1", &bundle_path).await.unwrap();
        assert_eq!(id, "abc123");
    }

    #[tokio::test]
    async fn test_import_bundle_missing_file_skips_remote_call() {
        let api = FakeApi::new();
        let calls = api.calls.clone();
        let manager = MtlsManager::new(api);

        let err = manager
            .import_bundle("acct-1", Path::new("/nonexistent/ca.pem"))
            .await
            .unwrap_err();

        assert!(matches!(err, MtlsError::BundleRead { .. }));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_associates_preserves_order() {
        let manager = MtlsManager::new(FakeApi::new());

        let sent = hostnames(&["a.example.com", "b.example.com"]);
        let associated = manager.update_associates("z1", "c1", &sent).await.unwrap();

        assert_eq!(associated, sent);
    }

    #[tokio::test]
    async fn test_update_associates_error_is_not_an_empty_list() {
        let mut api = FakeApi::new();
        api.hostnames = Err("certificate not found");
        let manager = MtlsManager::new(api);

        let err = manager
            .update_associates("z1", "c1", &hostnames(&["a.example.com"]))
            .await
            .unwrap_err();

        assert!(matches!(err, MtlsError::Api(_)));
    }

    #[tokio::test]
    async fn test_get_associates_empty_is_success() {
        let manager = MtlsManager::new(FakeApi::new());

        let associated = manager.get_associates("z1", "c1").await.unwrap();
        assert!(associated.is_empty());
    }

    #[tokio::test]
    async fn test_get_associates_failure_is_distinguishable_from_empty() {
        let mut api = FakeApi::new();
        api.hostnames = Err("zone not found");
        let manager = MtlsManager::new(api);

        let err = manager.get_associates("z1", "c1").await.unwrap_err();
        assert!(matches!(err, MtlsError::Api(_)));
    }
}
