pub mod cert_loader;
pub mod tls;
pub mod tokens;

pub use cert_loader::*;
pub use tls::*;
pub use tokens::*;
