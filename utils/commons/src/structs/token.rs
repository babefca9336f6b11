use super::*;

/// Parameter of the ledger `allowance` query.
#[derive(Debug, Clone, Copy, Serialize, SchemaType, PartialEq, Eq)]
pub struct AllowanceParams {
    /// Address whose tokens may be spent.
    pub owner: Address,
    /// Address allowed to spend them.
    pub spender: Address,
}

/// Parameter of the privileged ledger `lock` call: escrow `amount` of the
/// owner's unlocked tokens, consuming the engine's allowance.
#[derive(Debug, Clone, Copy, Serialize, SchemaType, PartialEq, Eq)]
pub struct LockParams {
    pub owner: Address,
    pub amount: ContractTokenAmount,
}

/// Parameter of the privileged ledger `unlock` call: release `amount` of
/// `from`'s escrowed tokens into `to`'s unlocked balance.
#[derive(Debug, Clone, Copy, Serialize, SchemaType, PartialEq, Eq)]
pub struct UnlockParams {
    pub from: Address,
    pub to: Address,
    pub amount: ContractTokenAmount,
}
