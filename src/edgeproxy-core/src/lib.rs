//! Gateway provisioning engine: services, routes and plugins on the admin
//! API, consumer credentials, and TLS material from the secret store.

pub mod core;
pub mod helpers;
pub mod models;

pub use crate::core::*;
pub use helpers::*;
pub use models::*;
