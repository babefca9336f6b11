//! Descending price auctions for `DutchToken` supply.
//!
//! # Description
//! A seller approves this contract on the token ledger and creates an
//! auction, which locks the offered tokens on the ledger. Once started, the
//! unit price drops by a fixed amount every minute until it reaches the
//! reserve. Bidders commit CCD while the auction runs. After the auction is
//! ended every bidder settles their own commitment: they receive as many
//! tokens as the commitment buys at the final price, capped by what is left,
//! and the rest of the commitment is refunded. An auction that ended without
//! bids is completed by the first `completeAuction` call from anybody.
//!
//! Unsold tokens are returned to the seller only after every bidder has
//! settled. Bidders settle themselves, so a single bidder who never calls
//! `completeAuction` keeps the unsold supply locked on the ledger for good.

#![cfg_attr(not(feature = "std"), no_std)]

mod contract;
mod events;
mod external;
mod state;
