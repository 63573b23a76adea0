pub mod controller;
pub mod store;

pub use controller::{extract_token, Credentials, Gate, SessionController, SessionState, TOKEN_FIELDS};
pub use store::{CredentialStore, FileStore, MemoryStore, SharedStore, StoreError};
