use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;

pub const RESET_TOKEN_LEN: usize = 32;

/// URL-safe password reset token built from 32 bytes of OS randomness.
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    let mut token = URL_SAFE_NO_PAD.encode(bytes);
    token.truncate(RESET_TOKEN_LEN);
    token
}
