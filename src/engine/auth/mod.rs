//! Auth Module
//!
//! Password hashing and the account registration/login service

pub mod password;
pub mod service;

pub use password::PasswordService;
pub use service::{AuthError, AuthService, ProfileFields};
