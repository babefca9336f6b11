use commons::ContractTokenAmount;
use concordium_std::*;

#[derive(Debug, Serialize, SchemaType)]
pub struct TokenInitParams {
    /// Number of tokens that will ever exist.
    pub total_supply: ContractTokenAmount,
    /// The only contract allowed to lock and unlock balances.
    pub auction_engine: ContractAddress,
    /// Time after initialization during which the ledger serves requests.
    pub lifetime: Duration,
}

#[derive(Debug, Serialize, SchemaType)]
pub struct TransferParams {
    pub to: Address,
    pub amount: ContractTokenAmount,
}

#[derive(Debug, Serialize, SchemaType)]
pub struct ApproveParams {
    pub spender: Address,
    pub amount: ContractTokenAmount,
}

#[derive(Debug, Serialize, SchemaType)]
pub struct TransferFromParams {
    pub from: Address,
    pub to: Address,
    pub amount: ContractTokenAmount,
}
