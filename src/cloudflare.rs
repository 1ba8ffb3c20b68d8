//! Cloudflare mTLS API Client
//!
//! Type-safe wrapper over the v4 REST API endpoints for account-scoped mTLS
//! certificates and zone-scoped certificate hostname associations.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::error::MtlsError;

const CLOUDFLARE_API: &str = "https://api.cloudflare.com/client/v4";

// ============================================================
// API Abstraction
// ============================================================

/// The three remote operations this tool performs.
///
/// `CloudflareClient` is the live implementation; tests substitute a fake
/// so the suite never contacts the remote service.
#[async_trait]
pub trait MtlsApi: Send + Sync {
    /// Upload a PEM CA bundle as a new account-scoped mTLS certificate
    async fn create_certificate(
        &self,
        account_id: &str,
        bundle_pem: &str,
    ) -> Result<MtlsCertificate, MtlsError>;

    /// Replace the hostnames associated with a certificate in a zone
    async fn update_hostname_associations(
        &self,
        zone_id: &str,
        mtls_certificate_id: &str,
        hostnames: &[String],
    ) -> Result<Vec<String>, MtlsError>;

    /// Fetch the hostnames currently associated with a certificate in a zone
    async fn get_hostname_associations(
        &self,
        zone_id: &str,
        mtls_certificate_id: &str,
    ) -> Result<Vec<String>, MtlsError>;
}

// ============================================================
// API Response Types
// ============================================================

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiError>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: i32,
    message: String,
}

impl<T> ApiResponse<T> {
    /// Turn a `success == false` envelope into an error carrying the
    /// provider's own messages.
    fn check_success(&self) -> Result<(), MtlsError> {
        if self.success {
            return Ok(());
        }
        let errors: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{} (code {})", e.message, e.code))
            .collect();
        Err(MtlsError::Api(errors.join(", ")))
    }
}

/// An mTLS certificate as reported by Cloudflare.
///
/// Only `id` is load-bearing; the rest is metadata the endpoint returns.
#[derive(Debug, Clone, Deserialize)]
pub struct MtlsCertificate {
    pub id: String,
    #[serde(default)]
    pub ca: bool,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub uploaded_on: Option<String>,
    #[serde(default)]
    pub expires_on: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateCertificateRequest<'a> {
    ca: bool,
    certificates: &'a str,
}

#[derive(Debug, Serialize)]
struct UpdateAssociationsRequest<'a> {
    mtls_certificate_id: &'a str,
    hostnames: &'a [String],
}

#[derive(Debug, Default, Deserialize)]
struct HostnameAssociations {
    #[serde(default)]
    hostnames: Vec<String>,
}

// ============================================================
// Client Implementation
// ============================================================

/// Cloudflare API client
pub struct CloudflareClient {
    client: Client,
    api_token: String,
}

impl CloudflareClient {
    /// Create a new Cloudflare client from resolved configuration.
    ///
    /// With `verify_ssl` off the client accepts any server certificate;
    /// intended only for non-production diagnostics.
    pub fn new(config: &Config) -> Result<Self, MtlsError> {
        let mut builder =
            Client::builder().user_agent(concat!("cloudflare-mtls/", env!("CARGO_PKG_VERSION")));

        if !config.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            api_token: config.api_token.clone(),
        })
    }
}

#[async_trait]
impl MtlsApi for CloudflareClient {
    async fn create_certificate(
        &self,
        account_id: &str,
        bundle_pem: &str,
    ) -> Result<MtlsCertificate, MtlsError> {
        debug!("Uploading CA bundle to account {}", account_id);

        let url = format!("{}/accounts/{}/mtls_certificates", CLOUDFLARE_API, account_id);

        let request = CreateCertificateRequest {
            ca: true,
            certificates: bundle_pem,
        };

        let response: ApiResponse<MtlsCertificate> = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&request)
            .send()
            .await?
            .json()
            .await?;

        response.check_success()?;
        response
            .result
            .ok_or_else(|| MtlsError::Api("no certificate in response".to_string()))
    }

    async fn update_hostname_associations(
        &self,
        zone_id: &str,
        mtls_certificate_id: &str,
        hostnames: &[String],
    ) -> Result<Vec<String>, MtlsError> {
        debug!("Replacing hostname associations in zone {}", zone_id);

        let url = format!(
            "{}/zones/{}/certificate_authorities/hostname_associations",
            CLOUDFLARE_API, zone_id
        );

        let request = UpdateAssociationsRequest {
            mtls_certificate_id,
            hostnames,
        };

        let response: ApiResponse<HostnameAssociations> = self
            .client
            .put(&url)
            .bearer_auth(&self.api_token)
            .json(&request)
            .send()
            .await?
            .json()
            .await?;

        response.check_success()?;
        Ok(response.result.unwrap_or_default().hostnames)
    }

    async fn get_hostname_associations(
        &self,
        zone_id: &str,
        mtls_certificate_id: &str,
    ) -> Result<Vec<String>, MtlsError> {
        debug!(
            "Fetching hostname associations for certificate {}",
            mtls_certificate_id
        );

        let url = format!(
            "{}/zones/{}/certificate_authorities/hostname_associations",
            CLOUDFLARE_API, zone_id
        );

        let response: ApiResponse<HostnameAssociations> = self
            .client
            .get(&url)
            .bearer_auth(&self.api_token)
            .query(&[("mtls_certificate_id", mtls_certificate_id)])
            .send()
            .await?
            .json()
            .await?;

        response.check_success()?;
        Ok(response.result.unwrap_or_default().hostnames)
    }
}
