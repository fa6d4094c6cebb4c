use std::sync::{Arc, RwLock};

/// Shared bearer credential.
///
/// Cleared on any 401 so every service sees the unauthenticated state at once.
/// Token acquisition and refresh happen elsewhere.
#[derive(Clone, Default)]
pub struct Credential {
    token: Arc<RwLock<Option<String>>>,
}

impl Credential {
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: Arc::new(RwLock::new(token.filter(|t| !t.trim().is_empty()))),
        }
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|guard| guard.clone())
    }

    #[must_use]
    pub fn is_present(&self) -> bool {
        self.token.read().is_ok_and(|guard| guard.is_some())
    }

    pub fn set(&self, token: impl Into<String>) {
        if let Ok(mut guard) = self.token.write() {
            *guard = Some(token.into());
        }
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.token.write() {
            if guard.take().is_some() {
                tracing::info!("credential cleared; re-authentication required");
            }
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("present", &self.is_present())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let credential = Credential::new(Some("abc".into()));
        let other = credential.clone();
        other.clear();
        assert!(!credential.is_present());
        credential.set("def");
        assert_eq!(other.token().as_deref(), Some("def"));
    }

    #[test]
    fn blank_token_counts_as_absent() {
        assert!(!Credential::new(Some("  ".into())).is_present());
    }
}
