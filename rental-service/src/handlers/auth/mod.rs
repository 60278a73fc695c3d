pub mod mfa;
pub mod oauth;
pub mod registration;
pub mod session;

pub use oauth::{oauth_callback, oauth_link, oauth_start, oauth_unlink};
pub use registration::register;
pub use session::{login, mfa_login};
