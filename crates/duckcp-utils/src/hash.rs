/// Hex-encoded BLAKE3 digest of a UTF-8 text.
///
/// # Example
///
/// ```
/// use duckcp_utils::hash::digest_text;
///
/// assert_eq!(digest_text("a:1"), digest_text("a:1"));
/// assert_ne!(digest_text("a:1"), digest_text("a:2"));
/// ```
pub fn digest_text(text: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(text.as_bytes());
    hasher.finalize().to_hex().to_string()
}
