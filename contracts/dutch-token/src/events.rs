use commons::{ContractTokenAmount, APPROVAL_TAG, LOCK_TAG, UNLOCK_TAG};
use concordium_std::*;

/// Tokens moved from unlocked into escrow.
#[derive(Debug, Serial)]
pub struct LockEvent {
    pub owner: Address,
    pub amount: ContractTokenAmount,
}

/// Tokens released from escrow.
#[derive(Debug, Serial)]
pub struct UnlockEvent {
    /// Owner of the escrow.
    pub from: Address,
    /// Receiver of the unlocked tokens.
    pub to: Address,
    pub amount: ContractTokenAmount,
}

/// A new allowance was set.
#[derive(Debug, Serial)]
pub struct ApprovalEvent {
    pub owner: Address,
    pub spender: Address,
    pub amount: ContractTokenAmount,
}

/// Tagged ledger event to be serialized for the event log.
///
/// Plain token movements are logged as CIS-2 events, these cover what CIS-2
/// has no event for.
#[derive(Debug)]
pub enum LedgerEvent {
    Lock(LockEvent),
    Unlock(UnlockEvent),
    Approval(ApprovalEvent),
}

impl LedgerEvent {
    pub fn lock(owner: Address, amount: ContractTokenAmount) -> Self {
        Self::Lock(LockEvent { owner, amount })
    }

    pub fn unlock(from: Address, to: Address, amount: ContractTokenAmount) -> Self {
        Self::Unlock(UnlockEvent { from, to, amount })
    }

    pub fn approval(owner: Address, spender: Address, amount: ContractTokenAmount) -> Self {
        Self::Approval(ApprovalEvent {
            owner,
            spender,
            amount,
        })
    }
}

impl Serial for LedgerEvent {
    fn serial<W: Write>(&self, out: &mut W) -> Result<(), W::Err> {
        match self {
            LedgerEvent::Lock(event) => {
                out.write_u8(LOCK_TAG)?;
                event.serial(out)
            }
            LedgerEvent::Unlock(event) => {
                out.write_u8(UNLOCK_TAG)?;
                event.serial(out)
            }
            LedgerEvent::Approval(event) => {
                out.write_u8(APPROVAL_TAG)?;
                event.serial(out)
            }
        }
    }
}
