//! # Surge Auth
//!
//! Identity for the flash-sale backend: user records, salted password
//! hashing, and JWT session tokens.
//!
//! The crate is split the same way the rest of the workspace is: pure pieces
//! ([`password`], [`token`]) with no I/O, a storage trait ([`store`]) with a
//! `PostgreSQL` implementation ([`pg`]), and a service ([`service`]) that
//! wires them together for register/login.
//!
//! Passwords are hashed as SHA-256 over a per-user random salt plus the
//! password, compared in constant time. Tokens are HS256 JWTs carrying the
//! user id, email, and role.

pub mod error;
pub mod password;
pub mod pg;
pub mod service;
pub mod store;
pub mod token;
pub mod user;

#[cfg(feature = "test-utils")]
pub mod mocks;

pub use error::AuthError;
pub use pg::PgUserStore;
pub use service::AuthService;
pub use store::UserStore;
pub use token::{Claims, TokenSigner};
pub use user::{Role, User, UserProfile};
