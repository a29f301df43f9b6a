mod shib_session;

pub use shib_session::{ShibSession, shib_session_middleware};
