use super::*;

/// The custom errors both contracts can produce. The ledger and the engine
/// share this enum, so a reject code returned by the ledger means the same
/// thing inside the engine.
#[derive(Serialize, Debug, PartialEq, Eq, Reject, SchemaType)]
pub enum CustomContractError {
    /// Failed parsing the parameter (Error code: -1).
    #[from(ParseError)]
    ParseParams,
    /// Failed logging: Log is full (Error code: -2).
    LogFull,
    /// Failed logging: Log is malformed (Error code: -3).
    LogMalformed,
    /// Sender is not allowed to perform this action (Error code: -4).
    Unauthorized,
    /// Operation is not permitted in the current auction state (Error code: -5).
    InvalidState,
    /// Seller did not approve enough tokens for the auction (Error code: -6).
    InsufficientAllowance,
    /// Spending more than the approved allowance (Error code: -7).
    AllowanceExceeded,
    /// Not enough unlocked or locked tokens (Error code: -8).
    InsufficientBalance,
    /// The ledger is past its lifetime and frozen for good (Error code: -9).
    LedgerDestroyed,
    /// Inconsistent auction prices or empty supply (Error code: -10).
    InvalidAuctionParams,
    /// No auction with the given id (Error code: -11).
    UnknownAuction,
    /// Bid carries no amount (Error code: -12).
    BidTooLow,
    /// The auction ran for its maximum duration and must be ended (Error code: -13).
    AuctionExpired,
    /// Only account addresses can sell and bid (Error code: -14).
    OnlyAccountAddress,
    /// Arithmetic overflow (Error code: -15).
    Overflow,
    /// Failed to invoke a contract (Error code: -16).
    InvokeContractError,
    /// Failed to invoke a transfer (Error code: -17).
    InvokeTransferError,
    /// Incompatible contract (Error code: -18).
    Incompatible,
}

/// Mapping the logging errors to CustomContractError.
impl From<LogError> for CustomContractError {
    fn from(le: LogError) -> Self {
        match le {
            LogError::Full => Self::LogFull,
            LogError::Malformed => Self::LogMalformed,
        }
    }
}

/// Mapping errors related to contract invocations to CustomContractError.
///
/// Rejections of the token ledger are translated back into the variant the
/// ledger raised.
impl<T> From<CallContractError<T>> for CustomContractError {
    fn from(cce: CallContractError<T>) -> Self {
        match cce {
            CallContractError::MissingEntrypoint | CallContractError::MessageFailed => {
                Self::Incompatible
            }
            CallContractError::LogicReject { reason, .. } => match reason {
                // CustomContractError::ParseParams | Concordium ParseError
                -1 | -2147483646 => Self::Incompatible,
                -4 => Self::Unauthorized,
                -6 => Self::InsufficientAllowance,
                -7 => Self::AllowanceExceeded,
                -8 => Self::InsufficientBalance,
                -9 => Self::LedgerDestroyed,
                -15 => Self::Overflow,
                _ => Self::InvokeContractError,
            },
            _ => Self::InvokeContractError,
        }
    }
}

/// Mapping errors related to transfer invocations to CustomContractError.
impl From<TransferError> for CustomContractError {
    fn from(_te: TransferError) -> Self {
        Self::InvokeTransferError
    }
}

/// Failure of a read-only query against another contract.
#[derive(Debug)]
pub enum ContractReadError<R> {
    Call(CallContractError<R>),
    Compatibility,
    Parse,
}

impl<R> From<ContractReadError<R>> for CustomContractError {
    fn from(error: ContractReadError<R>) -> Self {
        match error {
            ContractReadError::Call(e) => e.into(),
            ContractReadError::Compatibility | ContractReadError::Parse => Self::Incompatible,
        }
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;

    #[concordium_test]
    fn test_ledger_reject_codes_map_back() {
        let reject = |reason| CallContractError::LogicReject {
            reason,
            return_value: (),
        };

        claim_eq!(
            CustomContractError::from(reject(-4)),
            CustomContractError::Unauthorized
        );
        claim_eq!(
            CustomContractError::from(reject(-7)),
            CustomContractError::AllowanceExceeded
        );
        claim_eq!(
            CustomContractError::from(reject(-8)),
            CustomContractError::InsufficientBalance
        );
        claim_eq!(
            CustomContractError::from(reject(-9)),
            CustomContractError::LedgerDestroyed
        );
        claim_eq!(
            CustomContractError::from(reject(-100)),
            CustomContractError::InvokeContractError
        );
        claim_eq!(
            CustomContractError::from(CallContractError::<()>::MissingEntrypoint),
            CustomContractError::Incompatible
        );
    }

    #[concordium_test]
    fn test_reject_codes_are_stable() {
        claim_eq!(Reject::from(CustomContractError::Unauthorized).error_code.get(), -4);
        claim_eq!(Reject::from(CustomContractError::InvalidState).error_code.get(), -5);
        claim_eq!(
            Reject::from(CustomContractError::LedgerDestroyed).error_code.get(),
            -9
        );
        claim_eq!(Reject::from(CustomContractError::Incompatible).error_code.get(), -18);
    }
}
