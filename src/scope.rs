use crate::error::{Error, Result};
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Lifetime of one mounted view
///
/// Requests issued through [`ViewScope::run`] resolve to [`Error::Cancelled`]
/// once the view is torn down, so late responses never reach disposed state.
/// Dropping the scope tears it down.
#[derive(Debug, Default)]
pub struct ViewScope {
    token: CancellationToken,
}

/// Cloneable handle used to tear a scope down from elsewhere
#[derive(Debug, Clone)]
pub struct ScopeHandle {
    token: CancellationToken,
}

impl ViewScope {
    pub fn mount() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> ScopeHandle {
        ScopeHandle {
            token: self.token.clone(),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }

    pub fn teardown(&self) {
        self.token.cancel();
    }

    pub async fn run<F, T>(&self, request: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.token.is_cancelled() {
            return Err(Error::Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                debug!("Dropping response for a closed view");
                Err(Error::Cancelled)
            }
            result = request => result,
        }
    }
}

impl ScopeHandle {
    pub fn teardown(&self) {
        self.token.cancel();
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn active_scope_passes_result_through() {
        let scope = ViewScope::mount();
        let value = scope.run(async { Ok::<_, Error>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn teardown_discards_in_flight_response() {
        let scope = ViewScope::mount();
        let handle = scope.handle();

        let closer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            handle.teardown();
        });

        let result = scope
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, Error>(())
            })
            .await;

        closer.await.unwrap();
        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(!scope.is_active());
    }

    #[tokio::test]
    async fn closed_scope_rejects_new_requests() {
        let scope = ViewScope::mount();
        scope.teardown();
        let result = scope.run(async { Ok::<_, Error>(()) }).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
