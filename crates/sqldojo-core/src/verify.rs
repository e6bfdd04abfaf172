//! Structural equivalence of result sets.
//!
//! SQL result sets are multisets of rows: neither row order nor column
//! order is significant unless the exercise itself demands an ORDER BY,
//! which the exercise author expresses through the reference query, not
//! here. Column names carry no weight either; a row is judged purely as a
//! multiset of values. See DESIGN.md for the column-name decision.

use crate::model::ResultSet;
use crate::value::SqlValue;

/// Canonical form of one row: the canonical value strings in sorted order,
/// each field length-prefixed. Sorting makes the form independent of
/// projection order; the length prefix makes field boundaries unforgeable,
/// since untrusted text can appear inside a field but can never delimit one.
pub fn canonical_row(row: &[SqlValue]) -> String {
    let mut fields: Vec<String> = row.iter().map(SqlValue::canonical).collect();
    fields.sort_unstable();
    let mut out = String::new();
    for f in fields {
        out.push_str(&f.len().to_string());
        out.push(':');
        out.push_str(&f);
    }
    out
}

fn canonical_rows(rs: &ResultSet) -> Vec<String> {
    let mut rows: Vec<String> = rs.rows.iter().map(|r| canonical_row(r)).collect();
    rows.sort_unstable();
    rows
}

/// True iff the two result sets contain the same multiset of rows under
/// canonical value comparison. O(n log n).
pub fn equivalent(candidate: &ResultSet, reference: &ResultSet) -> bool {
    if candidate.rows.len() != reference.rows.len() {
        return false;
    }
    canonical_rows(candidate) == canonical_rows(reference)
}
