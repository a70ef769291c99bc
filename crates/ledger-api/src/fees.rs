//! The fee-manager boundary. Fee schedules and pricing curves are owned by
//! the embedding platform; the core only asks for a calculator and reads the
//! result back.

use ledger_types::ids::{AccountId, ConsensusTimestamp, Functionality};

/// The fees a handler ultimately charges, split into network, node, and
/// service shares so each can be routed to a different beneficiary.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Fees {
    pub network_fee: u64,
    pub node_fee: u64,
    pub service_fee: u64,
}

impl Fees {
    pub const FREE: Fees = Fees {
        network_fee: 0,
        node_fee: 0,
        service_fee: 0,
    };

    pub fn total(&self) -> u64 {
        self.network_fee + self.node_fee + self.service_fee
    }
}

/// Produced by `FeeManager::create_fee_calculator`, bound to one
/// transaction's body, payer key, and signature shape.
pub trait FeeCalculator: Send + Sync {
    fn calculate(&self) -> Fees;
}

/// Pricing data returned by `FeeManager::fee_data`, consulted by handlers
/// that need the raw schedule rather than a bound calculator.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct FeeData {
    pub base_price: u64,
    pub price_per_byte: u64,
}

/// Computes transaction fees without prescribing how the schedule itself is
/// priced.
pub trait FeeManager: Send + Sync {
    fn create_fee_calculator(
        &self,
        payer: AccountId,
        functionality: Functionality,
        num_sigs: usize,
        sig_map_size: usize,
        consensus_time: ConsensusTimestamp,
        sub_type: u8,
    ) -> Box<dyn FeeCalculator>;

    fn fee_data(
        &self,
        functionality: Functionality,
        consensus_time: ConsensusTimestamp,
        sub_type: u8,
    ) -> FeeData;
}
