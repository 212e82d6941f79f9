//! Static registry from [`CellKind`] to rule objects.
//!
//! The set of rule families is closed, so resolution is a single `match`
//! built once per grid rather than a lookup by type name.

use lattice_grid::CellRule;
use lattice_types::CellKind;
use tracing::debug;

use crate::conway::Conway;
use crate::error::RuleTableError;
use crate::fire::Fire;
use crate::percolation::Percolation;
use crate::rps::Rps;
use crate::rule_table::{RuleTable, RuleTableRule};
use crate::segregation::Segregation;
use crate::wator::WaTor;

/// Build the rule for `kind`.
///
/// `table` is the transition table text for [`CellKind::RuleTable`]; other
/// kinds ignore it.
///
/// # Errors
///
/// Returns [`RuleTableError::MissingTable`] if the generic rule-table kind
/// is selected without a table, or [`RuleTableError::Malformed`] if a table
/// fails to parse.
pub fn rule_for(kind: CellKind, table: Option<&str>) -> Result<Box<dyn CellRule>, RuleTableError> {
    let rule: Box<dyn CellRule> = match kind {
        CellKind::Conway => Box::new(Conway),
        CellKind::Fire => Box::new(Fire),
        CellKind::Percolation => Box::new(Percolation),
        CellKind::Segregation => Box::new(Segregation),
        CellKind::WaTor => Box::new(WaTor),
        CellKind::Rps => Box::new(Rps),
        CellKind::RuleTable => {
            let text = table.ok_or(RuleTableError::MissingTable)?;
            Box::new(RuleTableRule::new(RuleTable::parse(text)?))
        }
        CellKind::BylLoop => Box::new(RuleTableRule::byl_loop()?),
    };
    debug!(%kind, edge = ?rule.default_edge(), "Rule resolved");
    Ok(rule)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_resolves_to_itself() {
        for kind in CellKind::ALL {
            let rule = rule_for(kind, Some("012345")).unwrap();
            assert_eq!(rule.kind(), kind);
        }
    }

    #[test]
    fn rule_table_needs_text() {
        assert_eq!(
            rule_for(CellKind::RuleTable, None).unwrap_err(),
            RuleTableError::MissingTable
        );
        assert!(rule_for(CellKind::BylLoop, None).is_ok());
    }
}
