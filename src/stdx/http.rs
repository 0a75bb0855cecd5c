pub static DEFAULT_USER_AGENT: &str =
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

/// Cuts a response body right after its last `}`.
///
/// The upstream JSON endpoints append bytes of unknown meaning after the
/// document. They are never interpreted, only dropped. Returns `None` when the
/// body has no `}` at all.
pub fn truncate_after_last_brace(body: &str) -> Option<&str> {
    let end = body.rfind('}')?;
    // `}` is a single byte, so `end + 1` is always a char boundary.
    body.get(..=end)
}
