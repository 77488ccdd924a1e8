use sha2::{Digest, Sha256};

/// Content-derived canonical identifier for a source image: the SHA-256
/// digest of its raw bytes, lowercase hex. Identical bytes always hash to
/// the identical name, so re-uploads of the same image share a base
/// filename.
pub fn content_address(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
