use messagely_core::Username;

/// Request-scoped identity, attached only after a token fully verified.
///
/// There is no partially-trusted variant: a request either carries one of
/// these or is anonymous.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestIdentity {
    username: Username,
}

impl RequestIdentity {
    pub fn new(username: Username) -> Self {
        Self { username }
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    /// True when this identity is `target`.
    pub fn is(&self, target: &str) -> bool {
        self.username.as_str() == target
    }
}
