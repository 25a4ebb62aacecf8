//! Version allocation for program documents.
//!
//! Versions are dot-separated strings of the form `X.Y.Z`. Every save bumps
//! the third segment by one; the first two are carried over untouched. There
//! is no carry between segments and no zero padding, so `1.0.9` becomes
//! `1.0.10`.

/// The version assigned to the first snapshot of every program.
pub const INITIAL_VERSION: &str = "1.0.0";

/// Compute the version that follows `previous`.
///
/// Missing, empty, or malformed input (fewer than three segments, or a third
/// segment that is not a non-negative integer) resets to [`INITIAL_VERSION`]
/// instead of failing. Segments beyond the third are preserved.
pub fn next_version(previous: Option<&str>) -> String {
  let Some(previous) = previous.filter(|v| !v.is_empty()) else {
    return INITIAL_VERSION.to_owned();
  };

  let mut parts: Vec<String> = previous.split('.').map(str::to_owned).collect();
  if parts.len() < 3 {
    tracing::warn!(previous, "malformed document version; resetting");
    return INITIAL_VERSION.to_owned();
  }

  let Some(patch) = parts[2]
    .parse::<u64>()
    .ok()
    .and_then(|p| p.checked_add(1))
  else {
    tracing::warn!(previous, "unparseable patch segment; resetting");
    return INITIAL_VERSION.to_owned();
  };

  parts[2] = patch.to_string();
  parts.join(".")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn increments_patch_segment() {
    assert_eq!(next_version(Some("1.0.0")), "1.0.1");
    assert_eq!(next_version(Some("3.2.41")), "3.2.42");
  }

  #[test]
  fn no_carry_past_nine() {
    assert_eq!(next_version(Some("2.5.9")), "2.5.10");
    assert_eq!(next_version(Some("1.0.99")), "1.0.100");
  }

  #[test]
  fn missing_or_empty_resets() {
    assert_eq!(next_version(None), "1.0.0");
    assert_eq!(next_version(Some("")), "1.0.0");
  }

  #[test]
  fn too_few_segments_resets() {
    assert_eq!(next_version(Some("1.0")), "1.0.0");
    assert_eq!(next_version(Some("7")), "1.0.0");
  }

  #[test]
  fn non_numeric_patch_resets() {
    assert_eq!(next_version(Some("1.0.x")), "1.0.0");
    assert_eq!(next_version(Some("1.0.-1")), "1.0.0");
  }

  #[test]
  fn extra_segments_are_kept() {
    assert_eq!(next_version(Some("1.0.4.7")), "1.0.5.7");
  }

  #[test]
  fn leading_zeros_are_not_preserved() {
    assert_eq!(next_version(Some("1.0.007")), "1.0.8");
  }
}
