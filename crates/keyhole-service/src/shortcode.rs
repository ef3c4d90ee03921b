use keyhole_core::ServiceError;
use sha2::{Digest, Sha256};
use url::Url;

/// Base-62 digit alphabet. The position of a character is its value:
/// position 0 is `0`, position 61 is `z`.
const BASE62_ALPHABET: &[u8; 62] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Produces deterministic short codes from long URLs.
///
/// The pipeline is canonicalize → SHA-256 → base-62. The same canonical
/// URL always yields the same code; uniqueness across inserts is the
/// service's job, achieved by perturbing the input per attempt.
#[derive(Debug, Clone)]
pub struct ShortCodeGenerator {
    code_length: usize,
}

impl ShortCodeGenerator {
    pub fn new(code_length: usize) -> Self {
        Self { code_length }
    }

    /// Generates a short code for the given long URL.
    ///
    /// Fails with [`ServiceError::InvalidUrl`] when the URL does not
    /// parse and with [`ServiceError::GenerationFailed`] when the
    /// base-62 encoding is shorter than the configured code length.
    pub fn generate(&self, long_url: &str) -> Result<String, ServiceError> {
        let canonical = canonicalize(long_url)?;
        let encoded = encode_base62(hash_url(&canonical));
        if encoded.len() < self.code_length {
            return Err(ServiceError::GenerationFailed(format!(
                "base-62 encoding '{}' is shorter than the configured code length {}",
                encoded, self.code_length
            )));
        }
        Ok(encoded[..self.code_length].to_string())
    }
}

/// Canonicalizes a long URL so trivially-equivalent forms collapse to
/// the same string.
///
/// Rules, in order: parse; lowercase the host; drop the scheme's
/// default port; trim a single trailing `/` from the path; discard the
/// fragment; keep the query verbatim. The `url` crate already
/// lowercases registered hosts and strips known default ports during
/// parsing; the remainder is handled while reassembling.
pub fn canonicalize(long_url: &str) -> Result<String, ServiceError> {
    let parsed =
        Url::parse(long_url.trim()).map_err(|e| ServiceError::InvalidUrl(e.to_string()))?;

    let mut canonical = String::with_capacity(long_url.len());
    canonical.push_str(parsed.scheme());
    canonical.push_str("://");
    if let Some(host) = parsed.host_str() {
        canonical.push_str(host);
    }
    if let Some(port) = parsed.port() {
        canonical.push(':');
        canonical.push_str(&port.to_string());
    }

    let path = parsed.path();
    canonical.push_str(path.strip_suffix('/').unwrap_or(path));

    if let Some(query) = parsed.query() {
        canonical.push('?');
        canonical.push_str(query);
    }
    // The fragment never reaches the server; it is dropped.

    Ok(canonical)
}

/// Derives a 64-bit value from the canonical URL: the first 8 bytes of
/// its SHA-256 digest, big-endian.
pub fn hash_url(canonical: &str) -> u64 {
    let digest = Sha256::digest(canonical.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

/// Standard positional base-62 encoding; zero encodes to `"0"`.
pub fn encode_base62(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut encoded = String::new();
    while value > 0 {
        encoded.insert(0, BASE62_ALPHABET[(value % 62) as usize] as char);
        value /= 62;
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_lowercases_the_host() {
        assert_eq!(
            canonicalize("https://EXAMPLE.COM/page").unwrap(),
            "https://example.com/page"
        );
    }

    #[test]
    fn canonicalize_strips_default_ports() {
        assert_eq!(
            canonicalize("https://example.com:443/page").unwrap(),
            "https://example.com/page"
        );
        assert_eq!(
            canonicalize("http://example.com:80/page").unwrap(),
            "http://example.com/page"
        );
    }

    #[test]
    fn canonicalize_keeps_non_default_ports() {
        assert_eq!(
            canonicalize("https://example.com:8443/page").unwrap(),
            "https://example.com:8443/page"
        );
    }

    #[test]
    fn canonicalize_trims_a_single_trailing_slash() {
        assert_eq!(
            canonicalize("https://example.com/page/").unwrap(),
            "https://example.com/page"
        );
        assert_eq!(
            canonicalize("https://example.com/").unwrap(),
            "https://example.com"
        );
    }

    #[test]
    fn canonicalize_drops_the_fragment() {
        assert_eq!(
            canonicalize("https://example.com/page#top").unwrap(),
            "https://example.com/page"
        );
    }

    #[test]
    fn canonicalize_preserves_the_query_verbatim() {
        assert_eq!(
            canonicalize("https://example.com/page?b=2&a=1").unwrap(),
            "https://example.com/page?b=2&a=1"
        );
    }

    #[test]
    fn canonicalize_rejects_garbage() {
        assert!(matches!(
            canonicalize("not-a-valid-url"),
            Err(ServiceError::InvalidUrl(_))
        ));
    }

    #[test]
    fn equivalent_urls_produce_the_same_code() {
        let generator = ShortCodeGenerator::new(7);
        let reference = generator.generate("https://example.com/page").unwrap();

        for variant in [
            "https://EXAMPLE.COM/page",
            "https://example.com:443/page",
            "https://example.com/page/",
            "https://example.com/page#top",
        ] {
            assert_eq!(generator.generate(variant).unwrap(), reference);
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let generator = ShortCodeGenerator::new(7);
        let first = generator.generate("https://example.com/stable").unwrap();
        let second = generator.generate("https://example.com/stable").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn perturbed_inputs_produce_different_codes() {
        let generator = ShortCodeGenerator::new(7);
        let zero = generator.generate("https://collision.example0").unwrap();
        let one = generator.generate("https://collision.example1").unwrap();
        assert_ne!(zero, one);
    }

    #[test]
    fn generated_code_has_the_configured_length() {
        for length in [4, 6, 7, 10] {
            let generator = ShortCodeGenerator::new(length);
            let code = generator.generate("https://example.com/page").unwrap();
            assert_eq!(code.len(), length);
            assert!(code.bytes().all(|b| b.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn code_length_beyond_the_encoding_fails() {
        // A u64 encodes to at most 11 base-62 digits.
        let generator = ShortCodeGenerator::new(12);
        assert!(matches!(
            generator.generate("https://example.com/page"),
            Err(ServiceError::GenerationFailed(_))
        ));
    }

    #[test]
    fn encode_base62_zero_is_the_zero_digit() {
        assert_eq!(encode_base62(0), "0");
    }

    #[test]
    fn encode_base62_known_values() {
        assert_eq!(encode_base62(1), "1");
        assert_eq!(encode_base62(10), "A");
        assert_eq!(encode_base62(61), "z");
        assert_eq!(encode_base62(62), "10");
        assert_eq!(encode_base62(62 * 62), "100");
        assert_eq!(encode_base62(u64::MAX), "LygHa16AHYF");
    }

    #[test]
    fn hash_url_uses_the_big_endian_digest_prefix() {
        // SHA-256("abc") starts with ba7816bf8f01cfea.
        assert_eq!(hash_url("abc"), 0xba7816bf8f01cfea);
    }
}
