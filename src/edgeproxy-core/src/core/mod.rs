pub mod admin;
pub mod consumer;
pub mod provisioning;
pub mod requestor;
pub mod resource;
pub mod routes;

pub use admin::*;
pub use consumer::*;
pub use provisioning::*;
pub use requestor::*;
pub use resource::*;
pub use routes::*;
