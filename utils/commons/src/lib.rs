//! Types, errors and helpers shared by the `DutchToken` ledger and the
//! `DutchAuction` engine contracts.
#![cfg_attr(not(feature = "std"), no_std)]
pub use crate::{
    constants::*, errors::*, pricing::*, structs::*, token_client::*, types::*,
};
use concordium_cis2::*;
use concordium_std::*;

pub mod test;

mod constants;
mod errors;
mod pricing;
mod structs;
mod token_client;
mod types;
