//! Secret binding validation and resolution.
//!
//! A deployment request binds the secret names a service declares to
//! references in the external secret manager. This module proves the
//! bindings complete and well formed before anything is deployed:
//!
//! - [`SecretBinding`] and [`BoundSecret`] carry the wire form;
//! - [`parse_vault_secret_name`] parses secret manager references;
//! - [`validate_single_service`] matches bindings to one resolved
//!   service and checks coverage of its declared secrets;
//! - [`resolve_consumption`] drives the validator over a whole
//!   resolved dependency graph, across architectures;
//! - [`partition_bindings`] splits the input bindings into needed and
//!   redundant groups from the recorded consumption;
//! - [`verify_bindings`] and [`verify_bindings_strict`] check that the
//!   referenced secrets exist in the trust store.

mod binding;
mod error;
mod partition;
mod resolve;
mod validator;
mod vault_name;
mod verify;

pub use binding::{BoundSecret, SecretBinding};
pub use error::{BindingError, SecretStoreError};
pub use partition::partition_bindings;
pub use resolve::{resolve_consumption, validate_service_graph};
pub use validator::{
    ConsumptionMap, ServiceBindingOutcome, find_binding_for_service, validate_single_service,
};
pub use vault_name::{VaultSecretRef, parse_vault_secret_name};
pub use verify::{SecretExistsCheck, verify_bindings, verify_bindings_strict};
