pub mod certs;
pub mod collection;
pub mod consumers;
pub mod plugins;
pub mod services;
pub mod settings;

pub use certs::*;
pub use collection::*;
pub use consumers::*;
pub use plugins::*;
pub use services::*;
pub use settings::*;
