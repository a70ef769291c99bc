//! The dispatcher: a fixed `functionality → handler` table plus the
//! pure-checks/pre-handle/handle fan-out operations. A lookup table rather
//! than a hardcoded match arm per functionality — the set of handlers is
//! still fixed at construction, adding one is a redeploy-time decision, not
//! a runtime hot-swap.

use async_trait::async_trait;
use ledger_api::handler::{HandleContextView, RequiredKeys, TransactionHandler};
use ledger_telemetry::sinks::error_metrics;
use ledger_types::error::{HandleError, PreCheckError};
use ledger_types::ids::Functionality;
use std::collections::HashMap;
use std::sync::Arc;

/// The fixed table of handlers a node was started with.
pub struct Dispatcher {
    handlers: HashMap<Functionality, Arc<dyn TransactionHandler>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, functionality: Functionality, handler: Arc<dyn TransactionHandler>) {
        self.handlers.insert(functionality, handler);
    }

    fn lookup(&self, functionality: Functionality) -> Result<&Arc<dyn TransactionHandler>, HandleError> {
        self.handlers.get(&functionality).ok_or_else(|| {
            error_metrics().inc_error("dispatch", "HANDLE_UNKNOWN_FUNCTIONALITY");
            HandleError::UnknownFunctionality
        })
    }

    pub fn dispatch_pure_checks(
        &self,
        functionality: Functionality,
        transaction_bytes: &[u8],
    ) -> Result<(), HandleError> {
        let handler = self.lookup(functionality)?;
        handler
            .pure_checks(transaction_bytes)
            .map_err(HandleError::from)
    }

    pub fn dispatch_pre_handle(
        &self,
        functionality: Functionality,
        transaction_bytes: &[u8],
    ) -> Result<RequiredKeys, HandleError> {
        let handler = self.lookup(functionality)?;
        handler
            .pre_handle(transaction_bytes)
            .map_err(HandleError::from)
    }

    pub async fn dispatch_handle(
        &self,
        functionality: Functionality,
        ctx: &mut dyn HandleContextView,
    ) -> Result<(), HandleError> {
        let handler = self.lookup(functionality)?.clone();
        handler.handle(ctx).await?;
        handler.finalize(ctx).await
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// A handler whose body always succeeds and touches no state; used as the
/// dispatcher's own test double, and by `ledger-services` as the base for
/// the no-op system functionality.
pub struct NoopHandler;

#[async_trait]
impl TransactionHandler for NoopHandler {
    fn pure_checks(&self, _transaction_bytes: &[u8]) -> Result<(), PreCheckError> {
        Ok(())
    }

    fn pre_handle(&self, _transaction_bytes: &[u8]) -> Result<RequiredKeys, PreCheckError> {
        Ok(RequiredKeys::default())
    }

    async fn handle(&self, _ctx: &mut dyn HandleContextView) -> Result<(), HandleError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_functionality_is_unknown() {
        let dispatcher = Dispatcher::new();
        let err = dispatcher
            .dispatch_pure_checks(Functionality(99), &[])
            .unwrap_err();
        assert_eq!(err, HandleError::UnknownFunctionality);
    }

    #[test]
    fn registered_functionality_dispatches_pure_checks() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(Functionality(1), Arc::new(NoopHandler));
        assert!(dispatcher.dispatch_pure_checks(Functionality(1), &[]).is_ok());
    }
}
