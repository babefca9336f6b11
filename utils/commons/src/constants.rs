/// Tag for the Lock event of the token ledger.
pub const LOCK_TAG: u8 = u8::MAX - 5;

/// Tag for the Unlock event of the token ledger.
pub const UNLOCK_TAG: u8 = u8::MAX - 6;

/// Tag for the Approval event of the token ledger.
pub const APPROVAL_TAG: u8 = u8::MAX - 7;

/// Tag for the AuctionCreated event.
pub const AUCTION_CREATED_TAG: u8 = u8::MAX - 8;

/// Tag for the AuctionStarted event.
pub const AUCTION_STARTED_TAG: u8 = u8::MAX - 9;

/// Tag for the Bid event.
pub const BID_TAG: u8 = u8::MAX - 10;

/// Tag for the AuctionEnded event.
pub const AUCTION_ENDED_TAG: u8 = u8::MAX - 11;

/// Tag for the Settled event.
pub const SETTLED_TAG: u8 = u8::MAX - 12;

/// Tag for the AuctionCompleted event.
pub const AUCTION_COMPLETED_TAG: u8 = u8::MAX - 13;

/// Tag for the Reclaimed event.
pub const RECLAIMED_TAG: u8 = u8::MAX - 14;

/// Full name of the auctioned token.
pub const TOKEN_NAME: &str = "DutchToken";

/// Ticker of the auctioned token.
pub const TOKEN_SYMBOL: &str = "DUT";

/// Length of a single price step, in milliseconds. The price stays constant
/// within a step and drops by `price_drop_rate` on every step boundary.
pub const DECAY_STEP_MILLIS: u64 = 60 * 1000;

/// Maximum running time of an auction, in milliseconds. From then on the price
/// is pinned to the reserve, bids are refused and anyone may end the auction.
pub const MAX_AUCTION_DURATION_MILLIS: u64 = 20 * DECAY_STEP_MILLIS;
