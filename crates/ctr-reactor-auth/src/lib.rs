//! # ctr-reactor-auth
//!
//! The authentication and session core.
//!
//! - **Credential hashing** with Argon2id in PHC format (`hashers`)
//! - **Input validation** for emails and password policy (`validators`)
//! - **Session tokens**: random bearer tokens and their SHA-256 lookup hashes (`tokens`)
//! - **User and session records** (`user`)
//! - **User stores** over embedded `SQLite` or managed `PostgreSQL` behind one trait (`store`)
//! - **Session manager**: signup, login, session resolution, logout (`session`)
//! - **Admin gate**: shared secret, IP allowlist, password header, signed cookie (`admin_gate`)
//!
//! All CPU-bound cryptographic work runs on `tokio::task::spawn_blocking`.
//! All traits are `Send + Sync` so one instance serves every request.

pub mod admin_gate;
pub mod hashers;
pub mod session;
pub mod store;
pub mod tokens;
pub mod user;
pub mod validators;

pub use admin_gate::{AdminGate, AdminRequest};
pub use hashers::{Argon2Hasher, CredentialHasher};
pub use session::{IssuedSession, LoginOutcome, SessionManager, SignupOutcome};
pub use store::{connect_store, PostgresUserStore, SqliteUserStore, UserStore};
pub use tokens::{generate_token, hash_token};
pub use user::{normalize_email, NewUser, Session, User, UserId};
