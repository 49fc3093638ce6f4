//! SASL response builders for AUTHENTICATE.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Builds the base64 initial response for SASL PLAIN (RFC 4616).
#[must_use]
pub fn plain_response(username: &str, password: &str) -> String {
    STANDARD.encode(format!("\0{username}\0{password}"))
}

/// Builds the base64 initial response for XOAUTH2.
#[must_use]
pub fn xoauth2_response(username: &str, access_token: &str) -> String {
    STANDARD.encode(format!(
        "user={username}\x01auth=Bearer {access_token}\x01\x01"
    ))
}

/// Encodes one step of the AUTHENTICATE LOGIN exchange.
#[must_use]
pub fn login_step(value: &str) -> String {
    STANDARD.encode(value.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_embeds_nul_separators() {
        // base64("\0tim\0tanstaaftanstaaf") from RFC 4616
        assert_eq!(
            plain_response("tim", "tanstaaftanstaaf"),
            "AHRpbQB0YW5zdGFhZnRhbnN0YWFm"
        );
    }

    #[test]
    fn xoauth2_shape() {
        let resp = xoauth2_response("user@example.com", "token");
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(resp)
            .unwrap_or_default();
        assert_eq!(
            decoded,
            b"user=user@example.com\x01auth=Bearer token\x01\x01"
        );
    }

    #[test]
    fn login_step_is_plain_base64() {
        assert_eq!(login_step("user"), "dXNlcg==");
    }
}
