mod attributes;
mod authenticator;
pub mod constants;
mod error;
mod options;
mod request;

pub use attributes::{AttributeSource, Attributes};
pub use authenticator::ShibAuthenticator;
pub use error::AuthError;
pub use options::{LoginOptions, LogoutOptions};
pub use request::RequestInfo;
