//! Response normalizer

/// Clean a raw model output.
///
/// Strips leading and trailing whitespace. Pure and idempotent:
/// `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_string()
}
