//! Certificate Validation
//!
//! Structural checks for the certificate, private key and optional chain
//! files handed to a command. No side effects beyond reading the files.

use anyhow::{bail, Result};
use std::fs;
use std::io::ErrorKind;
use tracing::debug;

/// Validates certificate material before it is uploaded
pub trait CertificateValidator: Send + Sync {
    /// Check `cert_path`, `key_path` and, when non-empty, `chain_path`.
    ///
    /// `command` names the invoking command in usage errors.
    fn validate(&self, command: &str, cert_path: &str, key_path: &str, chain_path: &str)
        -> Result<()>;
}

/// Validator that parses PEM files and the X.509 certificates inside them
#[derive(Debug, Clone, Copy, Default)]
pub struct PemCertificateValidator;

#[derive(Clone, Copy)]
enum Material {
    Certificate,
    PrivateKey,
    Chain,
}

impl Material {
    fn label(self) -> &'static str {
        match self {
            Material::Certificate => "certificate",
            Material::PrivateKey => "key",
            Material::Chain => "chain",
        }
    }
}

impl PemCertificateValidator {
    fn read(material: Material, path: &str, errors: &mut Vec<String>) -> Option<Vec<u8>> {
        let label = material.label();

        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => {
                errors.push(format!("{label} is a directory: {path}"));
                return None;
            }
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                errors.push(format!("{label} file not found: {path}"));
                return None;
            }
            Err(e) => {
                errors.push(format!("{label} file not readable: {path}: {e}"));
                return None;
            }
        }

        match fs::read(path) {
            Ok(contents) => Some(contents),
            Err(e) => {
                errors.push(format!("{label} file not readable: {path}: {e}"));
                None
            }
        }
    }

    fn check(material: Material, path: &str, contents: &[u8], errors: &mut Vec<String>) {
        let blocks = match pem::parse_many(contents) {
            Ok(blocks) if !blocks.is_empty() => blocks,
            _ => {
                errors.push(format!("failed to parse {}: {path}", material.label()));
                return;
            }
        };

        let valid = match material {
            Material::PrivateKey => blocks.len() == 1 && blocks[0].tag().ends_with("PRIVATE KEY"),
            Material::Certificate | Material::Chain => blocks.iter().all(|block| {
                block.tag() == "CERTIFICATE"
                    && x509_parser::parse_x509_certificate(block.contents()).is_ok()
            }),
        };

        if !valid {
            errors.push(format!("failed to parse {}: {path}", material.label()));
        }
    }
}

impl CertificateValidator for PemCertificateValidator {
    fn validate(
        &self,
        command: &str,
        cert_path: &str,
        key_path: &str,
        chain_path: &str,
    ) -> Result<()> {
        debug!(
            command = %command,
            cert_path = %cert_path,
            key_path = %key_path,
            "Validating certificate files"
        );

        let mut missing = Vec::new();
        if cert_path.is_empty() {
            missing.push("--cert");
        }
        if key_path.is_empty() {
            missing.push("--key");
        }
        if !missing.is_empty() {
            bail!("{} required for {}", missing.join(" and "), command);
        }

        let mut errors = Vec::new();
        let mut files = vec![(Material::Certificate, cert_path), (Material::PrivateKey, key_path)];
        if !chain_path.is_empty() {
            files.push((Material::Chain, chain_path));
        }

        for (material, path) in files {
            if let Some(contents) = Self::read(material, path, &mut errors) {
                Self::check(material, path, &contents, &mut errors);
            }
        }

        if !errors.is_empty() {
            bail!("{}", errors.join("\n"));
        }

        Ok(())
    }
}
