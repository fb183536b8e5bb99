use secrecy::SecretString;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Runtime context for a single gateway call
///
/// Cloned into every tool execution and follow-up dispatch spawned on
/// behalf of the caller, so cancelling the token reaches all of them.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Identifier attached to every log line emitted for this call
    pub correlation_id: Uuid,
    /// Caller-owned cancellation signal
    pub cancellation: CancellationToken,
    /// User-provided API key that overrides the configured key
    pub api_key: Option<SecretString>,
}

impl RequestContext {
    /// Create a context with a fresh correlation id and its own token
    pub fn new() -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            cancellation: CancellationToken::new(),
            api_key: None,
        }
    }

    /// Create a context bound to an existing cancellation token
    ///
    /// The context receives a child token: cancelling the parent cancels
    /// the request, but cancelling the request leaves the parent intact.
    pub fn with_parent(parent: &CancellationToken) -> Self {
        Self {
            cancellation: parent.child_token(),
            ..Self::new()
        }
    }

    /// Attach a caller-supplied API key
    #[must_use]
    pub fn with_api_key(mut self, api_key: SecretString) -> Self {
        self.api_key = Some(api_key);
        self
    }

    /// Whether the caller has cancelled this request
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_context_has_no_key_and_is_live() {
        let ctx = RequestContext::new();
        assert!(ctx.api_key.is_none());
        assert!(!ctx.is_cancelled());
    }

    #[test]
    fn contexts_get_distinct_correlation_ids() {
        assert_ne!(RequestContext::new().correlation_id, RequestContext::new().correlation_id);
    }

    #[test]
    fn parent_cancellation_propagates() {
        let parent = CancellationToken::new();
        let ctx = RequestContext::with_parent(&parent);

        parent.cancel();
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn child_cancellation_does_not_reach_parent() {
        let parent = CancellationToken::new();
        let ctx = RequestContext::with_parent(&parent);

        ctx.cancellation.cancel();
        assert!(!parent.is_cancelled());
    }
}
