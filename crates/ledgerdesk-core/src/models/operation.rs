use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Credits added to the account.
    Credit,
    /// Credits deducted from the account.
    Debit,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationKind::Credit => write!(f, "credit"),
            OperationKind::Debit => write!(f, "debit"),
        }
    }
}

/// One entry of the account's operations ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: OperationKind,
    /// Credits added or deducted by this entry.
    pub amount: f64,
    /// Account balance after the entry was applied.
    pub balance_after: f64,
    /// Free-form description of what the entry was for.
    pub concept: String,
    pub created_at: DateTime<Utc>,
}
