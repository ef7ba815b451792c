//! Authentication module
//!
//! Everything the HTTP client needs to know about the session:
//! the credential and where it lives, how 401 bodies are classified,
//! and who is told when the session ends.

mod classifier;
mod notifier;
mod store;
mod types;

pub use classifier::{
    default_rules, AccountState, AccountStateClassifier, AccountStateRule, RuleClassifier,
};
pub use notifier::{BroadcastNotifier, NoopNotifier, SessionEvent, SessionExpiredNotifier};
pub use store::{CredentialStore, FileCredentialStore, InMemoryCredentialStore};
pub use types::{extract_jsonpath, Credential};
