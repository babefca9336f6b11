use commons::{AuctionId, ContractTokenAmount, PriceCurve};
use concordium_std::*;

use crate::state::{Auction, AuctionState};

#[derive(Debug, Clone, SchemaType, Serialize)]
pub struct AuctionInitParams {
    /// The `DutchToken` ledger whose tokens are auctioned.
    pub token: ContractAddress,
}

#[derive(Debug, Clone, SchemaType, Serialize)]
pub struct CreateAuctionParams {
    /// Unit price at the moment the auction starts.
    pub start_price: Amount,
    /// Lowest unit price, must be positive and not above `start_price`.
    pub reserve_price: Amount,
    /// Price decrease per elapsed minute.
    pub price_drop_rate: Amount,
    /// Tokens offered, locked on the ledger at creation.
    pub initial_supply: ContractTokenAmount,
}

impl CreateAuctionParams {
    pub fn curve(&self) -> PriceCurve {
        PriceCurve {
            start_price: self.start_price,
            reserve_price: self.reserve_price,
            price_drop_rate: self.price_drop_rate,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.curve().is_valid() && self.initial_supply.0 > 0
    }
}

#[derive(Debug, Clone, Copy, SchemaType, Serialize)]
pub struct CommitmentParams {
    pub auction_id: AuctionId,
    pub account: AccountAddress,
}

/// Full auction record returned by `viewAuction`.
#[derive(Debug, Clone, SchemaType, Serialize, PartialEq, Eq)]
pub struct AuctionView {
    pub seller: AccountAddress,
    pub start_price: Amount,
    pub reserve_price: Amount,
    pub price_drop_rate: Amount,
    pub initial_supply: ContractTokenAmount,
    pub remaining_supply: ContractTokenAmount,
    pub start_time: Option<Timestamp>,
    pub total_commitment: Amount,
    pub final_price: Option<Amount>,
    pub state: AuctionState,
    pub unsettled_bidders: u32,
    pub reclaimed: bool,
}

impl From<Auction> for AuctionView {
    fn from(auction: Auction) -> Self {
        Self {
            seller: auction.seller,
            start_price: auction.curve.start_price,
            reserve_price: auction.curve.reserve_price,
            price_drop_rate: auction.curve.price_drop_rate,
            initial_supply: auction.initial_supply,
            remaining_supply: auction.remaining_supply,
            start_time: auction.start_time,
            total_commitment: auction.total_commitment,
            final_price: auction.final_price,
            state: auction.state,
            unsettled_bidders: auction.unsettled_bidders,
            reclaimed: auction.reclaimed,
        }
    }
}
