//! # edged-core
//!
//! Secret binding validation and resolution for the edged agent.
//!
//! A deployment request names a top-level service and supplies secret
//! bindings, each mapping the secret names a service declares to
//! references in the external secret manager (the trust store). Before
//! anything is deployed, the agent proves three things:
//!
//! - every secret declared by the service, and by every service in its
//!   transitive dependency graph, is covered by a binding whose scope
//!   matches that service ([`secrets::resolve_consumption`]);
//! - every reference in a consumed binding parses as an organization
//!   or user level secret name ([`secrets::parse_vault_secret_name`]);
//! - every referenced secret exists in the trust store
//!   ([`secrets::verify_bindings`]).
//!
//! Bindings the graph never consumed are reported back as redundant
//! rather than failing the request ([`secrets::partition_bindings`]).
//!
//! The exchange and the trust store are reached through the
//! [`service::ServiceResolver`] and [`secrets::SecretExistsCheck`]
//! traits, so the whole engine runs against fakes in tests.
//!
//! ## Example
//!
//! ```rust
//! use edged_core::secrets::{BoundSecret, SecretBinding, parse_vault_secret_name};
//!
//! let binding = SecretBinding {
//!     service_org: "myorg".to_string(),
//!     service_url: "gps".to_string(),
//!     service_arch: "amd64".to_string(),
//!     service_version_range: "[1.0.0,INFINITY)".to_string(),
//!     secrets: vec![BoundSecret::new("apikey", "user/fred/gps-key")],
//! };
//!
//! let parsed = parse_vault_secret_name(&binding.secrets[0].reference).unwrap();
//! assert_eq!(parsed.user.as_deref(), Some("fred"));
//! assert_eq!(parsed.name, "gps-key");
//! ```

pub mod config;
pub mod secrets;
pub mod service;
pub mod version;
