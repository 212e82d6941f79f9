//! Error types for the `lattice-rules` crate.

/// Errors raised while loading a transition table or resolving a rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleTableError {
    /// A rule string could not be parsed.
    #[error("malformed rule \"{rule}\": {reason}")]
    Malformed {
        /// The offending rule text, as written in the table.
        rule: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The generic rule-table type was selected without a table.
    #[error("cell type rule_table needs a rule table")]
    MissingTable,
}
