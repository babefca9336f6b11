use commons::{
    AuctionId, ContractTokenAmount, Settlement, AUCTION_COMPLETED_TAG, AUCTION_CREATED_TAG,
    AUCTION_ENDED_TAG, AUCTION_STARTED_TAG, BID_TAG, RECLAIMED_TAG, SETTLED_TAG,
};
use concordium_std::*;

use crate::external::CreateAuctionParams;

/// Auction creation event data.
#[derive(Debug, Serial)]
pub struct AuctionCreatedEvent<'a> {
    pub auction_id: AuctionId,
    /// Seller account address.
    pub seller: &'a AccountAddress,
    /// Prices and supply of the auction.
    pub params: &'a CreateAuctionParams,
}

/// Auction start event data.
#[derive(Debug, Serial)]
pub struct AuctionStartedEvent {
    pub auction_id: AuctionId,
    pub start_time: Timestamp,
}

/// Bid event data.
#[derive(Debug, Serial)]
pub struct BidEvent<'a> {
    pub auction_id: AuctionId,
    /// Bidder account address.
    pub bidder: &'a AccountAddress,
    /// Amount attached to this bid.
    pub amount: Amount,
    /// Total commitment of the bidder after this bid.
    pub commitment: Amount,
}

/// Auction end event data.
#[derive(Debug, Serial)]
pub struct AuctionEndedEvent {
    pub auction_id: AuctionId,
    pub final_price: Amount,
    pub total_commitment: Amount,
}

/// Settlement event data.
#[derive(Debug, Serial)]
pub struct SettledEvent<'a> {
    pub auction_id: AuctionId,
    pub bidder: &'a AccountAddress,
    pub settlement: &'a Settlement,
}

/// Reclaim event data.
#[derive(Debug, Serial)]
pub struct ReclaimedEvent<'a> {
    pub auction_id: AuctionId,
    pub seller: &'a AccountAddress,
    /// Unsold tokens returned to the seller.
    pub amount: ContractTokenAmount,
}

/// Tagged Custom event to be serialized for the event log.
#[derive(Debug)]
pub enum AuctionEvents<'a> {
    Created(AuctionCreatedEvent<'a>),
    Started(AuctionStartedEvent),
    Bid(BidEvent<'a>),
    Ended(AuctionEndedEvent),
    Settled(SettledEvent<'a>),
    Completed(AuctionId),
    Reclaimed(ReclaimedEvent<'a>),
}

impl<'a> AuctionEvents<'a> {
    pub fn created(
        auction_id: AuctionId,
        seller: &'a AccountAddress,
        params: &'a CreateAuctionParams,
    ) -> Self {
        Self::Created(AuctionCreatedEvent {
            auction_id,
            seller,
            params,
        })
    }

    pub fn started(auction_id: AuctionId, start_time: Timestamp) -> Self {
        Self::Started(AuctionStartedEvent {
            auction_id,
            start_time,
        })
    }

    pub fn bid(
        auction_id: AuctionId,
        bidder: &'a AccountAddress,
        amount: Amount,
        commitment: Amount,
    ) -> Self {
        Self::Bid(BidEvent {
            auction_id,
            bidder,
            amount,
            commitment,
        })
    }

    pub fn ended(auction_id: AuctionId, final_price: Amount, total_commitment: Amount) -> Self {
        Self::Ended(AuctionEndedEvent {
            auction_id,
            final_price,
            total_commitment,
        })
    }

    pub fn settled(
        auction_id: AuctionId,
        bidder: &'a AccountAddress,
        settlement: &'a Settlement,
    ) -> Self {
        Self::Settled(SettledEvent {
            auction_id,
            bidder,
            settlement,
        })
    }

    pub fn reclaimed(
        auction_id: AuctionId,
        seller: &'a AccountAddress,
        amount: ContractTokenAmount,
    ) -> Self {
        Self::Reclaimed(ReclaimedEvent {
            auction_id,
            seller,
            amount,
        })
    }
}

impl<'a> Serial for AuctionEvents<'a> {
    fn serial<W: Write>(&self, out: &mut W) -> Result<(), W::Err> {
        match self {
            AuctionEvents::Created(event) => {
                out.write_u8(AUCTION_CREATED_TAG)?;
                event.serial(out)
            }
            AuctionEvents::Started(event) => {
                out.write_u8(AUCTION_STARTED_TAG)?;
                event.serial(out)
            }
            AuctionEvents::Bid(event) => {
                out.write_u8(BID_TAG)?;
                event.serial(out)
            }
            AuctionEvents::Ended(event) => {
                out.write_u8(AUCTION_ENDED_TAG)?;
                event.serial(out)
            }
            AuctionEvents::Settled(event) => {
                out.write_u8(SETTLED_TAG)?;
                event.serial(out)
            }
            AuctionEvents::Completed(auction_id) => {
                out.write_u8(AUCTION_COMPLETED_TAG)?;
                auction_id.serial(out)
            }
            AuctionEvents::Reclaimed(event) => {
                out.write_u8(RECLAIMED_TAG)?;
                event.serial(out)
            }
        }
    }
}
