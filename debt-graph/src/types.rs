//! Core types for the debt ledger
//!
//! All types are designed for:
//! - Exact arithmetic (integer cents, never floating point)
//! - Dense arena indexing (user ids are `Vec` indices)
//! - Deterministic serialization (serde_json)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Monetary amount in the smallest currency subdivision.
///
/// Overflow is not checked; keeping realistic inputs within range is the
/// caller's responsibility.
pub type Cents = i64;

/// Dense user identifier in `[0, num_users)`, assigned in first-seen order.
pub type UserId = usize;

/// A single IOU: `receiver` owes `lender` an additional `cents`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transaction {
    /// User who lent the money
    pub lender: String,

    /// User who received the money and now owes it
    pub receiver: String,

    /// Amount lent (may be zero or negative)
    pub cents: Cents,
}

impl Transaction {
    /// Create new transaction
    pub fn new(lender: impl Into<String>, receiver: impl Into<String>, cents: Cents) -> Self {
        Self {
            lender: lender.into(),
            receiver: receiver.into(),
            cents,
        }
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}: {}", self.lender, self.receiver, self.cents)
    }
}

/// Ordered list of transactions, the unit of ingestion and output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtList {
    /// Transactions in ingestion order
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl DebtList {
    /// Create empty debt list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transaction
    pub fn push(&mut self, transaction: Transaction) {
        self.transactions.push(transaction);
    }

    /// Number of transactions
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Whether the list holds no transactions
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Iterate over transactions
    pub fn iter(&self) -> std::slice::Iter<'_, Transaction> {
        self.transactions.iter()
    }

    /// Sum of all transaction amounts
    pub fn total_cents(&self) -> Cents {
        self.transactions.iter().map(|t| t.cents).sum()
    }

    /// Parse from JSON
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Load from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

impl FromIterator<Transaction> for DebtList {
    fn from_iter<I: IntoIterator<Item = Transaction>>(iter: I) -> Self {
        Self {
            transactions: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for DebtList {
    type Item = Transaction;
    type IntoIter = std::vec::IntoIter<Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.transactions.into_iter()
    }
}

impl<'a> IntoIterator for &'a DebtList {
    type Item = &'a Transaction;
    type IntoIter = std::slice::Iter<'a, Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.transactions.iter()
    }
}

/// Id-level debt edge: `receiver_id` owes `lender_id` exactly `debt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DebtEdge {
    /// User who owes
    pub receiver_id: UserId,

    /// User who is owed
    pub lender_id: UserId,

    /// Signed net debt
    pub debt: Cents,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debt_list_json() {
        let json = r#"{"transactions":[{"lender":"alice","receiver":"bob","cents":100}]}"#;
        let list = DebtList::from_json(json).unwrap();

        assert_eq!(list.len(), 1);
        assert_eq!(list.transactions[0], Transaction::new("alice", "bob", 100));
        assert_eq!(list.to_json().unwrap(), json);
    }

    #[test]
    fn test_debt_list_missing_transactions_is_empty() {
        let list = DebtList::from_json("{}").unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_debt_list_malformed_json() {
        let result = DebtList::from_json(r#"{"transactions":[{"lender":"a"}]}"#);
        assert!(matches!(result, Err(crate::Error::Serialization(_))));
    }

    #[test]
    fn test_debt_list_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debts.json");
        std::fs::write(
            &path,
            r#"{"transactions":[{"lender":"x","receiver":"y","cents":-5}]}"#,
        )
        .unwrap();

        let list = DebtList::from_json_file(&path).unwrap();
        assert_eq!(list.total_cents(), -5);

        let missing = DebtList::from_json_file(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(crate::Error::Io(_))));
    }

    #[test]
    fn test_transaction_display() {
        let t = Transaction::new("alice", "bob", 250);
        assert_eq!(t.to_string(), "alice -> bob: 250");
    }
}
