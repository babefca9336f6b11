use super::*;

pub type ContractResult<A> = Result<A, CustomContractError>;

/// The ledger manages a single fungible token, so no token ID is needed.
pub type ContractTokenId = TokenIdUnit;

/// Contract token amount type.
pub type ContractTokenAmount = TokenAmountU64;

/// Sequential auction identifier, starting from zero.
pub type AuctionId = u64;
