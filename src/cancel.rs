use tokio_util::sync::CancellationToken;

/// Caller-held handle that aborts an in-flight request.
///
/// Cancelling settles the pending call with [`crate::RelayError::Cancelled`],
/// drops the underlying network call, prevents any pending retry from
/// firing, and skips the cache write.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    inner: CancellationToken,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            inner: CancellationToken::new(),
        }
    }

    /// Aborts the request this token was attached to.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    pub(crate) async fn cancelled(&self) {
        self.inner.cancelled().await;
    }
}

#[cfg(test)]
mod tests {
    use super::CancelToken;

    #[test]
    fn clones_share_cancellation_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_future_resolves_after_cancel() {
        let token = CancelToken::new();
        token.cancel();
        token.cancelled().await;
    }
}
