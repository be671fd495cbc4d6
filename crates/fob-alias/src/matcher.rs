//! First-match alias lookup.

use crate::table::{AliasRule, AliasTable};

/// Find the rule that applies to `specifier`.
///
/// Rules are tried in table order and the first one whose boundary-aware
/// pattern matches is returned. A shorter prefix declared earlier beats a
/// longer one declared later.
pub fn find_match<'t>(table: &'t AliasTable, specifier: &str) -> Option<&'t AliasRule> {
    table.rules().iter().find(|rule| rule.matches(specifier))
}
