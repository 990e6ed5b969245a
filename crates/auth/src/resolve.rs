use crate::{RequestIdentity, TokenCodec};

/// Resolve the caller's identity from a raw, possibly-absent token.
///
/// Verification failure is not a rejection: the request simply carries no
/// identity, and guards that need one reject later.
pub fn resolve_identity(codec: &TokenCodec, token: Option<&str>) -> Option<RequestIdentity> {
    match codec.verify(token) {
        Ok(username) => Some(RequestIdentity::new(username)),
        Err(err) => {
            if token.is_some() {
                tracing::debug!(error = %err, "token rejected; continuing anonymously");
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TokenConfig;
    use messagely_core::Username;

    #[test]
    fn valid_token_attaches_identity() {
        let codec = TokenCodec::new(&TokenConfig::new("s"));
        let token = codec.issue(&Username::parse("alice").unwrap()).unwrap();

        let identity = resolve_identity(&codec, Some(&token)).unwrap();
        assert!(identity.is("alice"));
    }

    #[test]
    fn missing_or_bad_token_leaves_request_anonymous() {
        let codec = TokenCodec::new(&TokenConfig::new("s"));
        let foreign = TokenCodec::new(&TokenConfig::new("other"))
            .issue(&Username::parse("alice").unwrap())
            .unwrap();

        assert_eq!(resolve_identity(&codec, None), None);
        assert_eq!(resolve_identity(&codec, Some("")), None);
        assert_eq!(resolve_identity(&codec, Some("junk")), None);
        assert_eq!(resolve_identity(&codec, Some(&foreign)), None);
    }
}
