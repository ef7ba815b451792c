//! Account-state classification
//!
//! The backend answers 401 both for an expired access token and for accounts
//! that can never be authorized (awaiting approval, rejected, locked, wrong
//! password). Only the former may trigger a session refresh, so every 401
//! body goes through an [`AccountStateClassifier`] first.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Standing of the account behind a 401 response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountState {
    /// Registration not yet approved by an administrator
    PendingApproval,
    /// Registration was rejected
    Rejected,
    /// Account locked or deactivated
    Locked,
    /// Wrong email or password
    InvalidCredentials,
    /// Nothing account-specific; an ordinary expired session
    Other,
}

impl AccountState {
    /// Whether this state bypasses the refresh protocol
    pub fn blocks_refresh(self) -> bool {
        self != AccountState::Other
    }

    /// Whether the stored credential must be dropped
    pub fn clears_credential(self) -> bool {
        matches!(self, AccountState::Locked | AccountState::Rejected)
    }
}

impl fmt::Display for AccountState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AccountState::PendingApproval => "pending approval",
            AccountState::Rejected => "rejected",
            AccountState::Locked => "locked",
            AccountState::InvalidCredentials => "invalid credentials",
            AccountState::Other => "unauthorized",
        };
        f.write_str(s)
    }
}

/// Maps a server error message to an [`AccountState`]
pub trait AccountStateClassifier: Send + Sync {
    /// Classify a server-provided error message
    fn classify(&self, message: &str) -> AccountState;
}

impl<F> AccountStateClassifier for F
where
    F: Fn(&str) -> AccountState + Send + Sync,
{
    fn classify(&self, message: &str) -> AccountState {
        self(message)
    }
}

/// One configurable classification rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStateRule {
    /// Case-insensitive regular expression matched against the message
    pub pattern: String,
    /// State assigned when the pattern matches
    pub state: AccountState,
}

impl AccountStateRule {
    /// Create a new rule
    pub fn new(pattern: impl Into<String>, state: AccountState) -> Self {
        Self {
            pattern: pattern.into(),
            state,
        }
    }
}

/// Default rule table, in match order
pub fn default_rules() -> Vec<AccountStateRule> {
    vec![
        AccountStateRule::new(
            r"pending|awaiting approval|not (yet )?approved",
            AccountState::PendingApproval,
        ),
        AccountStateRule::new(r"rejected", AccountState::Rejected),
        AccountStateRule::new(
            r"locked|deactivated|disabled|suspended",
            AccountState::Locked,
        ),
        AccountStateRule::new(
            r"invalid (credentials|email|password|username)|incorrect (email|password)|wrong password|bad credentials",
            AccountState::InvalidCredentials,
        ),
    ]
}

static DEFAULT_CLASSIFIER: Lazy<RuleClassifier> = Lazy::new(|| RuleClassifier {
    rules: default_rules()
        .into_iter()
        .filter_map(|rule| compile(&rule.pattern).ok().map(|re| (re, rule.state)))
        .collect(),
});

fn compile(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// Regex table classifier; the first matching rule wins
#[derive(Debug, Clone)]
pub struct RuleClassifier {
    rules: Vec<(Regex, AccountState)>,
}

impl RuleClassifier {
    /// Compile a classifier from rules
    pub fn from_rules(rules: &[AccountStateRule]) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|rule| {
                compile(&rule.pattern)
                    .map(|re| (re, rule.state))
                    .map_err(|e| {
                        Error::config(format!(
                            "Invalid account-state pattern '{}': {e}",
                            rule.pattern
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Number of compiled rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleClassifier {
    fn default() -> Self {
        DEFAULT_CLASSIFIER.clone()
    }
}

impl AccountStateClassifier for RuleClassifier {
    fn classify(&self, message: &str) -> AccountState {
        self.rules
            .iter()
            .find(|(re, _)| re.is_match(message))
            .map_or(AccountState::Other, |(_, state)| *state)
    }
}
