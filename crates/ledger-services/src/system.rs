//! A system service that does nothing beyond accepting a transaction: a
//! cheap handler with no state footprint, used by round-executor tests.

use async_trait::async_trait;
use ledger_api::handler::{HandleContextView, RequiredKeys, TransactionHandler};
use ledger_types::error::{HandleError, PreCheckError};

pub struct SystemNoopHandler;

#[async_trait]
impl TransactionHandler for SystemNoopHandler {
    fn pure_checks(&self, _transaction_bytes: &[u8]) -> Result<(), PreCheckError> {
        Ok(())
    }

    fn pre_handle(&self, _transaction_bytes: &[u8]) -> Result<RequiredKeys, PreCheckError> {
        Ok(RequiredKeys {
            payer_key_required: true,
            ..RequiredKeys::default()
        })
    }

    async fn handle(&self, _ctx: &mut dyn HandleContextView) -> Result<(), HandleError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_checks_always_pass() {
        assert!(SystemNoopHandler.pure_checks(&[]).is_ok());
    }

    #[test]
    fn pre_handle_requires_the_payer_key() {
        let required = SystemNoopHandler.pre_handle(&[]).unwrap();
        assert!(required.payer_key_required);
        assert!(required.non_payer_keys.is_empty());
    }
}
