//! Composite resource identifiers
//!
//! Resources owned by a parent are tracked under an ID made of the parent
//! and child identifiers joined with `/`, e.g. `<instance_id>/<topic_id>`.

use crate::error::{Error, Result};

pub const ID_SEPARATOR: char = '/';

/// Join identifier parts into a composite ID
pub fn join_id(parts: &[&str]) -> String {
    parts.join(&ID_SEPARATOR.to_string())
}

/// Split a composite ID into exactly `N` non-empty parts
pub fn split_id<const N: usize>(id: &str) -> Result<[String; N]> {
    let parts: Vec<String> = id.split(ID_SEPARATOR).map(str::to_string).collect();
    if parts.len() != N || parts.iter().any(|p| p.is_empty()) {
        return Err(Error::Validation(format!(
            "incorrect ID {}: expected {} parts separated by '{}'",
            id, N, ID_SEPARATOR
        )));
    }
    parts
        .try_into()
        .map_err(|_| Error::Validation(format!("incorrect ID {}", id)))
}
