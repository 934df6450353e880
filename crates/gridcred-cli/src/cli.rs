//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use gridcred_pki::KeyAlgorithm;

/// gridcred - retrieve a short-lived X.509 credential.
#[derive(Parser, Debug, Clone)]
#[command(name = "gridcred")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Credential issuer URL (must be https).
    #[arg(long, env = "GRIDCRED_URL")]
    pub url: String,

    /// Single-use authentication token.
    #[arg(long, env = "GRIDCRED_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Requested credential lifetime in seconds (0 = server default).
    #[arg(long, default_value_t = 0)]
    pub lifetime: u64,

    /// Where to write the credential (default: the conventional per-user
    /// proxy path).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// PEM bundle of CA certificates to trust instead of the system store.
    #[arg(long)]
    pub ca_bundle: Option<PathBuf>,

    /// Key algorithm for the generated pair.
    #[arg(long, value_enum, default_value_t = KeyAlg::Rsa2048)]
    pub key_algorithm: KeyAlg,

    /// Passphrase for encrypted export of long-lived credentials.
    #[arg(long, env = "GRIDCRED_PASSPHRASE", hide_env_values = true)]
    pub passphrase: Option<String>,

    /// Longest remaining lifetime in seconds a credential may have and
    /// still be written as cleartext PEM.
    #[arg(long, default_value_t = 43_200)]
    pub max_cleartext_lifetime: u64,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 60)]
    pub timeout: u64,
}

/// Key algorithm options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum KeyAlg {
    /// RSA with a 2048-bit modulus.
    #[default]
    Rsa2048,
    /// RSA with a 4096-bit modulus.
    Rsa4096,
    /// ECDSA over NIST P-256.
    EcdsaP256,
}

impl From<KeyAlg> for KeyAlgorithm {
    fn from(alg: KeyAlg) -> Self {
        match alg {
            KeyAlg::Rsa2048 => Self::Rsa { bits: 2048 },
            KeyAlg::Rsa4096 => Self::Rsa { bits: 4096 },
            KeyAlg::EcdsaP256 => Self::EcdsaP256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn minimal_invocation_parses() {
        let cli = Cli::parse_from([
            "gridcred",
            "--url",
            "https://ca.example.org/issue",
            "--token",
            "tok123",
        ]);
        assert_eq!(cli.url, "https://ca.example.org/issue");
        assert_eq!(cli.lifetime, 0);
        assert_eq!(cli.key_algorithm, KeyAlg::Rsa2048);
        assert_eq!(cli.max_cleartext_lifetime, 43_200);
        assert!(cli.output.is_none());
        assert!(cli.passphrase.is_none());
    }

    #[test]
    fn full_invocation_parses() {
        let cli = Cli::parse_from([
            "gridcred",
            "--url",
            "https://ca.example.org/issue",
            "--token",
            "tok123",
            "--lifetime",
            "3600",
            "--output",
            "/tmp/proxy.pem",
            "--key-algorithm",
            "ecdsa-p256",
            "--max-cleartext-lifetime",
            "7200",
        ]);
        assert_eq!(cli.lifetime, 3600);
        assert_eq!(cli.key_algorithm, KeyAlg::EcdsaP256);
        assert_eq!(cli.max_cleartext_lifetime, 7200);
        assert_eq!(cli.output.unwrap(), PathBuf::from("/tmp/proxy.pem"));
    }

    #[test]
    fn key_algorithm_conversion() {
        assert_eq!(
            KeyAlgorithm::from(KeyAlg::Rsa2048),
            KeyAlgorithm::Rsa { bits: 2048 }
        );
        assert_eq!(
            KeyAlgorithm::from(KeyAlg::Rsa4096),
            KeyAlgorithm::Rsa { bits: 4096 }
        );
        assert_eq!(KeyAlgorithm::from(KeyAlg::EcdsaP256), KeyAlgorithm::EcdsaP256);
    }
}
