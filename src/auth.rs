//! Operator authorization for campaign administration.

use std::collections::HashSet;

use crate::error::SpinError;

/// Decides which wallets may administer campaigns.
pub trait OperatorPolicy: Send + Sync + std::fmt::Debug {
    /// Returns `true` if `wallet_address` is an operator.
    fn is_operator(&self, wallet_address: &str) -> bool;

    /// Resolves the caller and checks it is an operator.
    ///
    /// # Errors
    ///
    /// Returns [`SpinError::Unauthorized`] if the caller is missing or not
    /// an operator.
    fn authorize<'a>(&self, caller: Option<&'a str>) -> Result<&'a str, SpinError> {
        let caller = caller
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| SpinError::Unauthorized("missing operator wallet".to_string()))?;
        if !self.is_operator(caller) {
            tracing::warn!(wallet = caller, "operator check failed");
            return Err(SpinError::Unauthorized(format!(
                "wallet {caller} is not an operator"
            )));
        }
        Ok(caller)
    }
}

/// Fixed operator set, loaded from `OPERATOR_ADDRESSES`.
#[derive(Debug, Clone, Default)]
pub struct StaticOperatorList {
    operators: HashSet<String>,
}

impl StaticOperatorList {
    /// Builds the set from wallet addresses, ignoring blanks.
    #[must_use]
    pub fn new<I, S>(operators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            operators: operators
                .into_iter()
                .map(|s| s.as_ref().trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Parses a comma-separated list.
    #[must_use]
    pub fn from_csv(csv: &str) -> Self {
        Self::new(csv.split(','))
    }

    /// Number of configured operators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operators.len()
    }

    /// Returns `true` if no operator is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

impl OperatorPolicy for StaticOperatorList {
    fn is_operator(&self, wallet_address: &str) -> bool {
        self.operators.contains(wallet_address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_ignores_blanks() {
        let list = StaticOperatorList::from_csv(" 0xops , ,0xadmin,");
        assert_eq!(list.len(), 2);
        assert!(list.is_operator("0xops"));
        assert!(!list.is_operator("0xuser"));
    }

    #[test]
    fn authorize_requires_caller() {
        let list = StaticOperatorList::from_csv("0xops");
        assert!(matches!(
            list.authorize(None),
            Err(SpinError::Unauthorized(_))
        ));
        assert!(matches!(
            list.authorize(Some("  ")),
            Err(SpinError::Unauthorized(_))
        ));
        assert!(matches!(
            list.authorize(Some("0xuser")),
            Err(SpinError::Unauthorized(_))
        ));
        assert!(matches!(list.authorize(Some("0xops")), Ok("0xops")));
    }
}
