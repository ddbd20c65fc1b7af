//! Content digests replacing uploaded files in the canonical string.
//!
//! Raw upload bytes never enter the canonical string. Each file is hashed and
//! base64-encoded (standard alphabet, padded); multiple files under the same
//! field are joined with the delimiter, without a trailing delimiter.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use digest::Digest;
use restsign_core::DigestAlgorithm;

/// Compute the base64-encoded digest of a single file payload.
///
/// # Examples
///
/// ```
/// use restsign_auth::digest::digest_file;
/// use restsign_core::DigestAlgorithm;
///
/// assert_eq!(digest_file(b"hello", DigestAlgorithm::Md5), "XUFAKrxLKna5cZ2REBfFkg==");
/// ```
#[must_use]
pub fn digest_file(data: &[u8], algorithm: DigestAlgorithm) -> String {
    match algorithm {
        DigestAlgorithm::Md5 => BASE64_STANDARD.encode(md5::Md5::digest(data)),
        DigestAlgorithm::Sha256 => BASE64_STANDARD.encode(sha2::Sha256::digest(data)),
    }
}

/// Digest every file of one multipart field and join the results.
///
/// An empty file list yields an empty string.
#[must_use]
pub fn digest_files<B: AsRef<[u8]>>(
    files: &[B],
    algorithm: DigestAlgorithm,
    delimiter: char,
) -> String {
    let mut joined = String::new();
    for (idx, file) in files.iter().enumerate() {
        if idx > 0 {
            joined.push(delimiter);
        }
        joined.push_str(&digest_file(file.as_ref(), algorithm));
    }
    joined
}
