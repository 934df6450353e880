//! gridcred CLI library.
#![forbid(unsafe_code)]
//!
//! Wires the PKI and client crates into the single credential-request flow:
//! configure trust, generate a key pair, build the certification request,
//! exchange it for a certificate, and materialize the credential on disk.

use std::fs;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use gridcred_client::{AuthToken, CredentialIssuanceClient, IssuerConfig, TrustContext};
use gridcred_pki::{Credential, CsrBuilder, SigningKey, WriteOutcome, WritePolicy};

pub mod cli;
pub mod proxy;

pub use cli::Cli;

/// Runs one credential-request flow.
///
/// # Errors
///
/// Returns the first error of the flow; nothing is retried, and no output
/// file is left behind on failure.
pub async fn run(cli: Cli) -> Result<()> {
    // Trust must be settled before the first connection is opened.
    let bundle = match &cli.ca_bundle {
        Some(path) => Some(
            fs::read(path).with_context(|| format!("cannot read CA bundle {}", path.display()))?,
        ),
        None => None,
    };
    let trust = TrustContext::configure(bundle.is_some(), bundle.as_deref());

    let config = IssuerConfig::new(&cli.url)?.with_timeout(Duration::from_secs(cli.timeout));
    let mut client = CredentialIssuanceClient::new(config, trust);
    client.open()?;

    info!("Generating key pair");
    let key = SigningKey::generate(cli.key_algorithm.into())?;
    let csr = CsrBuilder::new().build(&key)?;

    info!("Requesting credential from {}", cli.url);
    let token = AuthToken::new(cli.token.clone());
    let certificate = client.issue(&csr.to_pem(), &token, cli.lifetime).await?;
    client.close();

    let credential = Credential::new(key, certificate);
    info!("Received credential for {}", credential.subject_name());

    let path = match &cli.output {
        Some(path) => path.clone(),
        None => proxy::default_proxy_path()?,
    };
    let policy = WritePolicy::new(
        Duration::from_secs(cli.max_cleartext_lifetime),
        WritePolicy::default().min_passphrase_len(),
    );
    let outcome = credential.write_to_file(&path, cli.passphrase.as_deref(), &policy)?;

    println!("Credential for {}", credential.subject_name());
    println!("  legacy subject: {}", credential.subject_name_legacy());
    println!("  valid until:    {}", credential.not_after());
    match outcome {
        WriteOutcome::Pem(path) => println!("  written to:     {}", path.display()),
        WriteOutcome::Pkcs12(path) => {
            println!("  written to:     {} (PKCS#12)", path.display());
        }
    }

    Ok(())
}
