//! Build metadata embedded at compile time.
//!
//! Set `SVC_REVISION` when building (for example `SVC_REVISION=$(git rev-parse HEAD)`).

const REVISION: &str = match option_env!("SVC_REVISION") {
    Some(rev) => rev,
    None => "",
};

/// Returns the first `n` characters of the build revision.
///
/// The whole revision is returned when `n` exceeds its length, and an empty
/// string when no revision was embedded.
pub fn revision(n: usize) -> &'static str {
    REVISION.get(..n).unwrap_or(REVISION)
}
