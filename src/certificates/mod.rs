//! Load Balancer Certificates
//!
//! - `validator`: structural checks on certificate, key and chain files
//! - `manager`: upload/describe/delete against the certificate store, and
//!   the certificate naming scheme

pub mod manager;
pub mod validator;

pub use manager::{
    certificate_name, Certificate, CertificateManager, CertificateStore, CertificateStoreError,
    StoreCertificateManager,
};
pub use validator::{CertificateValidator, PemCertificateValidator};
