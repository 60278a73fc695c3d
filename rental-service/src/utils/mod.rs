pub mod pagination;
pub mod password;
pub mod validation;

pub use pagination::{Page, PageParams};
pub use password::{hash_password, verify_password, Password, PasswordHashString};
pub use validation::{validate_not_blank, validate_totp_code, ValidatedJson};
