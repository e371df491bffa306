use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

use crate::error::TokenError;

/// Encode a wire segment as unpadded url-safe base64.
pub(crate) fn encode_segment(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode an unpadded url-safe base64 wire segment.
///
/// A segment that does not decode is indistinguishable from a corrupted or
/// forged token, so the failure surfaces as [`TokenError::BadSignature`]
/// without further detail.
pub(crate) fn decode_segment(segment: &str) -> Result<Vec<u8>, TokenError> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::BadSignature)
}
