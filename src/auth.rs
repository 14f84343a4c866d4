//! Credential, identity, and claim types shared by the client and the session.

pub mod claims;
pub mod credentials;
pub mod secret;

pub use claims::*;
pub use credentials::*;
pub use secret::*;
