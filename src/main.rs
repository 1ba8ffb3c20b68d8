//! Cloudflare mTLS Manager
//!
//! CLI for uploading CA bundles as Cloudflare mTLS certificates and for
//! managing the hostnames associated with them.
//!
//! # Usage
//! ```bash
//! # Upload a CA bundle
//! cloudflare-mtls import-bundle --account aabbcc --bundle ./ca.pem
//!
//! # Replace the hostnames associated with a certificate
//! cloudflare-mtls update-associates --zone_id z123 --mtls_certificate_id c456 \
//!     --hostnames a.example.com b.example.com
//!
//! # Inspect the current associations
//! cloudflare-mtls get-associates --zone_id z123 --mtls_certificate_id c456
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, warn, Level};
use tracing_subscriber::FmtSubscriber;

mod cloudflare;
mod config;
mod error;
mod manager;

use cloudflare::CloudflareClient;
use config::Config;
use manager::MtlsManager;

// ============================================================
// CLI Definition
// ============================================================

#[derive(Parser)]
#[command(name = "cloudflare-mtls")]
#[command(about = "Cloudflare mTLS certificate manager", long_about = None)]
#[command(version)]
struct Cli {
    /// Cloudflare API token
    #[arg(long, global = true, env = config::TOKEN_ENV_VAR, hide_env_values = true)]
    api_token: Option<String>,

    /// Skip TLS verification on outbound API calls (not recommended for prod)
    #[arg(long, global = true)]
    insecure: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a new CA certificate bundle
    ImportBundle {
        /// Cloudflare account ID
        #[arg(long)]
        account: String,

        /// Path to the .pem bundle file
        #[arg(long)]
        bundle: PathBuf,
    },

    /// Associate hostnames with a certificate
    UpdateAssociates {
        /// Zone (site) ID
        #[arg(long = "zone_id")]
        zone_id: String,

        /// mTLS certificate ID
        #[arg(long = "mtls_certificate_id")]
        mtls_certificate_id: String,

        /// Hostnames to associate (space separated)
        #[arg(long, num_args = 1.., required = true)]
        hostnames: Vec<String>,
    },

    /// Check existing hostname associations
    GetAssociates {
        /// Zone (site) ID
        #[arg(long = "zone_id")]
        zone_id: String,

        /// mTLS certificate ID
        #[arg(long = "mtls_certificate_id")]
        mtls_certificate_id: String,

        /// Hostnames to check for membership in the associated list
        #[arg(long, num_args = 1..)]
        hostnames: Vec<String>,
    },
}

// ============================================================
// Main Entry Point
// ============================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up CLOUDFLARE_API_KEY from a local .env when present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Resolve credentials before touching the network
    let config = Config::new(cli.api_token, !cli.insecure)?;
    if cli.insecure {
        warn!("TLS verification disabled for outbound API calls");
    }

    let manager = MtlsManager::new(CloudflareClient::new(&config)?);

    match cli.command {
        Commands::ImportBundle { account, bundle } => {
            match manager.import_bundle(&account, &bundle).await {
                Ok(id) => println!("✅ Certificate created with ID: {}", id),
                Err(e) => error!("Import failed: {}", e),
            }
        }

        Commands::UpdateAssociates {
            zone_id,
            mtls_certificate_id,
            hostnames,
        } => {
            match manager
                .update_associates(&zone_id, &mtls_certificate_id, &hostnames)
                .await
            {
                Ok(associated) if associated.is_empty() => {
                    println!("The certificate now has no associated hostnames.")
                }
                Ok(associated) => {
                    println!("✅ Hostnames now associated: {}", associated.join(", "))
                }
                Err(e) => error!("Update failed: {}", e),
            }
        }

        Commands::GetAssociates {
            zone_id,
            mtls_certificate_id,
            hostnames,
        } => match manager.get_associates(&zone_id, &mtls_certificate_id).await {
            Ok(associated) => {
                if associated.is_empty() {
                    println!("No associated hostnames found.");
                } else {
                    println!("Associated hostnames: {}", associated.join(", "));
                }

                for (hostname, present) in check_membership(&hostnames, &associated) {
                    if present {
                        println!("   -> '{}' IS associated", hostname);
                    } else {
                        println!("   -> '{}' is NOT associated", hostname);
                    }
                }
            }
            Err(e) => error!("Lookup failed: {}", e),
        },
    }

    Ok(())
}

/// Per-hostname membership verdicts for the get-associates post-step
fn check_membership<'a>(requested: &'a [String], associated: &[String]) -> Vec<(&'a str, bool)> {
    requested
        .iter()
        .map(|hostname| (hostname.as_str(), associated.contains(hostname)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_verdicts() {
        let requested = vec!["a.example.com".to_string(), "z.example.com".to_string()];
        let associated = vec!["a.example.com".to_string()];

        let verdicts = check_membership(&requested, &associated);
        assert_eq!(
            verdicts,
            vec![("a.example.com", true), ("z.example.com", false)]
        );
    }

    #[test]
    fn test_import_bundle_requires_bundle_flag() {
        let result = Cli::try_parse_from(["cloudflare-mtls", "import-bundle", "--account", "a1"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_update_associates_requires_hostnames() {
        let result = Cli::try_parse_from([
            "cloudflare-mtls",
            "update-associates",
            "--zone_id",
            "z1",
            "--mtls_certificate_id",
            "c1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_get_associates_hostnames_are_optional() {
        let cli = Cli::try_parse_from([
            "cloudflare-mtls",
            "get-associates",
            "--zone_id",
            "z1",
            "--mtls_certificate_id",
            "c1",
        ])
        .unwrap();

        match cli.command {
            Commands::GetAssociates { hostnames, .. } => assert!(hostnames.is_empty()),
            _ => panic!("expected get-associates"),
        }
    }

    #[test]
    fn test_hostname_lists_keep_argument_order() {
        let cli = Cli::try_parse_from([
            "cloudflare-mtls",
            "update-associates",
            "--zone_id",
            "z1",
            "--mtls_certificate_id",
            "c1",
            "--hostnames",
            "a.example.com",
            "b.example.com",
        ])
        .unwrap();

        match cli.command {
            Commands::UpdateAssociates { hostnames, .. } => {
                assert_eq!(hostnames, vec!["a.example.com", "b.example.com"])
            }
            _ => panic!("expected update-associates"),
        }
    }
}
