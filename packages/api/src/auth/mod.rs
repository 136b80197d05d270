//! Local email + password accounts and bearer-token authentication.

mod extract;
mod password;
mod token;

pub use extract::AuthUser;
pub use password::{hash_password, verify_password, PasswordError};
pub use token::{Claims, TokenError, TokenKey, Tokens};
