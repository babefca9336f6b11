//! A fixed-supply fungible token with auction escrow.
//!
//! # Description
//! The whole supply is credited to the account deploying the contract.
//! Besides the usual transfer and allowance functions every holder has a
//! locked balance. Locked tokens can only be moved by the auction engine
//! contract fixed at initialization: the engine locks a seller's tokens when
//! an auction is created and unlocks them to the winners on settlement.
//!
//! The contract has a limited lifetime. Once it has passed, every function
//! including the views rejects with `LedgerDestroyed`.

#![cfg_attr(not(feature = "std"), no_std)]

mod contract;
mod events;
mod external;
mod state;
