use commons::{
    is_past_max_duration, remaining_at_price, settle, AuctionId, ContractResult,
    ContractTokenAmount, CustomContractError, PriceCurve, Settlement,
};
use concordium_std::*;

use crate::external::CreateAuctionParams;

#[derive(Debug, Clone, Copy, Serialize, SchemaType, PartialEq, Eq)]
pub enum AuctionState {
    /// Created, tokens locked, price clock not running.
    NotStarted,
    /// Accepting bids while the price decays.
    Running,
    /// Bidding closed, bidders are settling.
    Ended,
    /// Every bidder settled.
    Completed,
}

#[derive(Debug, Clone, Serialize)]
pub struct Auction {
    pub seller: AccountAddress,
    pub curve: PriceCurve,
    pub initial_supply: ContractTokenAmount,
    /// Locked tokens not yet handed to a bidder or back to the seller.
    pub remaining_supply: ContractTokenAmount,
    pub start_time: Option<Timestamp>,
    pub total_commitment: Amount,
    pub final_price: Option<Amount>,
    pub state: AuctionState,
    /// Bidders with a commitment that has not been settled yet.
    pub unsettled_bidders: u32,
    /// Unsold tokens were returned to the seller.
    pub reclaimed: bool,
}

impl Auction {
    fn new(seller: AccountAddress, params: &CreateAuctionParams) -> Self {
        Self {
            seller,
            curve: params.curve(),
            initial_supply: params.initial_supply,
            remaining_supply: params.initial_supply,
            start_time: None,
            total_commitment: Amount::zero(),
            final_price: None,
            state: AuctionState::NotStarted,
            unsettled_bidders: 0,
            reclaimed: false,
        }
    }

    fn ensure_state(&self, state: AuctionState) -> ContractResult<()> {
        ensure_eq!(self.state, state, CustomContractError::InvalidState);
        Ok(())
    }

    /// Time since the auction started, zero if it never did.
    fn elapsed(&self, slot_time: Timestamp) -> Duration {
        self.start_time
            .and_then(|start| slot_time.duration_since(start))
            .unwrap_or_else(|| Duration::from_millis(0))
    }

    /// Unit price at `slot_time`. Only defined while the auction runs.
    pub fn current_price(&self, slot_time: Timestamp) -> ContractResult<Amount> {
        self.ensure_state(AuctionState::Running)?;
        Ok(self.curve.price_at(self.elapsed(slot_time)))
    }

    /// Tokens that could still be bought at the current price once every
    /// commitment so far is converted.
    pub fn remain_maximum_token(&self, slot_time: Timestamp) -> ContractTokenAmount {
        match self.current_price(slot_time) {
            Ok(price) => remaining_at_price(self.remaining_supply, self.total_commitment, price),
            Err(_) => self.remaining_supply,
        }
    }
}

/// What the contract has to execute after a bidder settled.
#[must_use]
#[derive(Debug, PartialEq, Eq)]
pub struct Completion {
    pub seller: AccountAddress,
    pub settlement: Settlement,
    /// This was the last unsettled bidder.
    pub completed: bool,
}

/// Outcome of ending the bidding.
#[derive(Debug, PartialEq, Eq)]
pub struct EndOutcome {
    pub final_price: Amount,
    pub total_commitment: Amount,
}

/// The contract state.
#[derive(Serial, DeserialWithState, StateClone)]
#[concordium(state_parameter = "S")]
pub struct State<S: HasStateApi> {
    /// The `DutchToken` ledger.
    pub token: ContractAddress,
    /// Identifier the next auction will get.
    pub next_auction_id: AuctionId,
    auctions: StateMap<AuctionId, Auction, S>,
    commitments: StateMap<(AuctionId, AccountAddress), Amount, S>,
}

impl<S: HasStateApi> State<S> {
    /// Create a new state with no auctions.
    pub fn new(state_builder: &mut StateBuilder<S>, token: ContractAddress) -> Self {
        State {
            token,
            next_auction_id: 0,
            auctions: state_builder.new_map(),
            commitments: state_builder.new_map(),
        }
    }

    pub fn auction(&self, auction_id: AuctionId) -> ContractResult<Auction> {
        self.auctions
            .get(&auction_id)
            .map(|auction| (*auction).clone())
            .ok_or(CustomContractError::UnknownAuction)
    }

    pub fn commitment(&self, auction_id: AuctionId, account: &AccountAddress) -> Amount {
        self.commitments
            .get(&(auction_id, *account))
            .map(|amount| *amount)
            .unwrap_or_else(Amount::zero)
    }

    /// Register a new auction and return its identifier. The caller is
    /// responsible for locking the supply on the ledger.
    pub fn create(
        &mut self,
        seller: AccountAddress,
        params: &CreateAuctionParams,
    ) -> ContractResult<AuctionId> {
        ensure!(params.is_valid(), CustomContractError::InvalidAuctionParams);

        let auction_id = self.next_auction_id;
        self.next_auction_id = auction_id
            .checked_add(1)
            .ok_or(CustomContractError::Overflow)?;
        self.auctions.insert(auction_id, Auction::new(seller, params));

        Ok(auction_id)
    }

    pub fn start(
        &mut self,
        auction_id: AuctionId,
        sender: &Address,
        slot_time: Timestamp,
    ) -> ContractResult<()> {
        let mut auction = self.auction(auction_id)?;
        ensure!(
            sender.matches_account(&auction.seller),
            CustomContractError::Unauthorized
        );
        auction.ensure_state(AuctionState::NotStarted)?;

        auction.start_time = Some(slot_time);
        auction.state = AuctionState::Running;
        self.auctions.insert(auction_id, auction);

        Ok(())
    }

    /// Add `amount` to the commitment of `bidder`, returning the new total of
    /// the bidder.
    pub fn bid(
        &mut self,
        auction_id: AuctionId,
        bidder: AccountAddress,
        amount: Amount,
        slot_time: Timestamp,
    ) -> ContractResult<Amount> {
        let mut auction = self.auction(auction_id)?;
        auction.ensure_state(AuctionState::Running)?;
        ensure!(amount > Amount::zero(), CustomContractError::BidTooLow);
        ensure!(
            !is_past_max_duration(auction.elapsed(slot_time)),
            CustomContractError::AuctionExpired
        );

        let previous = self.commitment(auction_id, &bidder);
        if previous == Amount::zero() {
            auction.unsettled_bidders = auction
                .unsettled_bidders
                .checked_add(1)
                .ok_or(CustomContractError::Overflow)?;
        }
        let commitment = checked_add(previous, amount)?;
        auction.total_commitment = checked_add(auction.total_commitment, amount)?;

        self.commitments.insert((auction_id, bidder), commitment);
        self.auctions.insert(auction_id, auction);

        Ok(commitment)
    }

    /// Close the bidding and freeze the final price.
    ///
    /// The seller may end a running auction at any time after its start,
    /// anybody else only once it ran for the maximum duration.
    pub fn end(
        &mut self,
        auction_id: AuctionId,
        sender: &Address,
        slot_time: Timestamp,
    ) -> ContractResult<EndOutcome> {
        let mut auction = self.auction(auction_id)?;
        auction.ensure_state(AuctionState::Running)?;
        ensure!(
            auction.start_time.map_or(false, |start| slot_time > start),
            CustomContractError::InvalidState
        );
        ensure!(
            sender.matches_account(&auction.seller)
                || is_past_max_duration(auction.elapsed(slot_time)),
            CustomContractError::Unauthorized
        );

        let final_price = auction.current_price(slot_time)?;
        auction.final_price = Some(final_price);
        auction.state = AuctionState::Ended;

        let outcome = EndOutcome {
            final_price,
            total_commitment: auction.total_commitment,
        };
        self.auctions.insert(auction_id, auction);

        Ok(outcome)
    }

    /// Settle the commitment of `bidder`. Returns `None` and changes nothing
    /// when the bidder has no commitment, so settling twice is harmless.
    ///
    /// An auction that ended without bids has nobody to settle. The first
    /// call then completes it with an empty settlement.
    pub fn complete(
        &mut self,
        auction_id: AuctionId,
        bidder: AccountAddress,
    ) -> ContractResult<Option<Completion>> {
        let mut auction = self.auction(auction_id)?;
        auction.ensure_state(AuctionState::Ended)?;
        let final_price = auction
            .final_price
            .ok_or(CustomContractError::InvalidState)?;

        let commitment = self.commitment(auction_id, &bidder);
        if commitment == Amount::zero() {
            if auction.unsettled_bidders > 0 {
                return Ok(None);
            }
            let seller = auction.seller;
            auction.state = AuctionState::Completed;
            self.auctions.insert(auction_id, auction);
            return Ok(Some(Completion {
                seller,
                settlement: Settlement::empty(),
                completed: true,
            }));
        }

        let settlement = settle(commitment, final_price, auction.remaining_supply)?;

        auction.remaining_supply = ContractTokenAmount::from(
            auction
                .remaining_supply
                .0
                .checked_sub(settlement.tokens.0)
                .ok_or(CustomContractError::Overflow)?,
        );
        auction.unsettled_bidders = auction
            .unsettled_bidders
            .checked_sub(1)
            .ok_or(CustomContractError::Overflow)?;
        let completed = auction.unsettled_bidders == 0;
        if completed {
            auction.state = AuctionState::Completed;
        }

        let seller = auction.seller;
        self.commitments.remove(&(auction_id, bidder));
        self.auctions.insert(auction_id, auction);

        Ok(Some(Completion {
            seller,
            settlement,
            completed,
        }))
    }

    /// Mark the unsold tokens as returned to the seller and return their
    /// amount.
    pub fn reclaim(
        &mut self,
        auction_id: AuctionId,
        sender: &Address,
    ) -> ContractResult<ContractTokenAmount> {
        let mut auction = self.auction(auction_id)?;
        ensure!(
            sender.matches_account(&auction.seller),
            CustomContractError::Unauthorized
        );
        auction.ensure_state(AuctionState::Completed)?;
        ensure!(!auction.reclaimed, CustomContractError::InvalidState);

        let unsold = auction.remaining_supply;
        auction.remaining_supply = ContractTokenAmount::from(0);
        auction.reclaimed = true;
        self.auctions.insert(auction_id, auction);

        Ok(unsold)
    }
}

fn checked_add(a: Amount, b: Amount) -> ContractResult<Amount> {
    a.micro_ccd
        .checked_add(b.micro_ccd)
        .map(Amount::from_micro_ccd)
        .ok_or(CustomContractError::Overflow)
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use commons::DECAY_STEP_MILLIS;
    use concordium_std::test_infrastructure::*;

    const SELLER: AccountAddress = AccountAddress([1; 32]);
    const BIDDER_1: AccountAddress = AccountAddress([16; 32]);
    const BIDDER_2: AccountAddress = AccountAddress([17; 32]);
    const BIDDER_3: AccountAddress = AccountAddress([18; 32]);
    const TOKEN: ContractAddress = ContractAddress {
        index: 1,
        subindex: 0,
    };

    fn params() -> CreateAuctionParams {
        CreateAuctionParams {
            start_price: Amount::from_micro_ccd(1000),
            reserve_price: Amount::from_micro_ccd(500),
            price_drop_rate: Amount::from_micro_ccd(25),
            initial_supply: ContractTokenAmount::from(100),
        }
    }

    fn at_minutes(m: u64) -> Timestamp {
        Timestamp::from_timestamp_millis(1_000_000 + m * DECAY_STEP_MILLIS)
    }

    fn seller() -> Address {
        Address::Account(SELLER)
    }

    fn new_state() -> State<TestStateApi> {
        let mut state_builder = TestStateBuilder::new();
        State::new(&mut state_builder, TOKEN)
    }

    fn running_state() -> State<TestStateApi> {
        let mut state = new_state();
        let id = state
            .create(SELLER, &params())
            .expect_report("Auction should be created");
        state
            .start(id, &seller(), at_minutes(0))
            .expect_report("Auction should start");
        state
    }

    #[concordium_test]
    fn test_create_assigns_sequential_ids() {
        let mut state = new_state();

        claim_eq!(state.create(SELLER, &params()), Ok(0));
        claim_eq!(state.create(BIDDER_1, &params()), Ok(1));
        claim_eq!(state.next_auction_id, 2);

        let auction = state.auction(1).expect_report("Auction should exist");
        claim_eq!(auction.seller, BIDDER_1);
        claim_eq!(auction.state, AuctionState::NotStarted);
        claim_eq!(auction.remaining_supply, ContractTokenAmount::from(100));
        claim_eq!(state.auction(2).map(|_| ()), Err(CustomContractError::UnknownAuction));
    }

    #[concordium_test]
    fn test_create_rejects_bad_params() {
        let mut state = new_state();
        let bad = [
            CreateAuctionParams {
                reserve_price: Amount::from_micro_ccd(1001),
                ..params()
            },
            CreateAuctionParams {
                reserve_price: Amount::zero(),
                ..params()
            },
            CreateAuctionParams {
                initial_supply: ContractTokenAmount::from(0),
                ..params()
            },
        ];

        for params in bad.iter() {
            claim_eq!(
                state.create(SELLER, params),
                Err(CustomContractError::InvalidAuctionParams)
            );
        }
        claim_eq!(state.next_auction_id, 0);
    }

    #[concordium_test]
    fn test_start_only_by_seller_and_once() {
        let mut state = new_state();
        let id = state
            .create(SELLER, &params())
            .expect_report("Auction should be created");

        claim_eq!(
            state.start(id, &Address::Account(BIDDER_1), at_minutes(0)),
            Err(CustomContractError::Unauthorized)
        );
        claim_eq!(state.start(id, &seller(), at_minutes(0)), Ok(()));
        claim_eq!(
            state.start(id, &seller(), at_minutes(1)),
            Err(CustomContractError::InvalidState)
        );

        let auction = state.auction(id).expect_report("Auction should exist");
        claim_eq!(auction.start_time, Some(at_minutes(0)));
        claim_eq!(auction.state, AuctionState::Running);
    }

    #[concordium_test]
    fn test_price_only_while_running() {
        let mut state = new_state();
        let id = state
            .create(SELLER, &params())
            .expect_report("Auction should be created");
        let auction = state.auction(id).expect_report("Auction should exist");
        claim_eq!(
            auction.current_price(at_minutes(0)),
            Err(CustomContractError::InvalidState)
        );

        claim_eq!(state.start(id, &seller(), at_minutes(0)), Ok(()));
        let auction = state.auction(id).expect_report("Auction should exist");
        claim_eq!(
            auction.current_price(at_minutes(2)),
            Ok(Amount::from_micro_ccd(950))
        );
    }

    #[concordium_test]
    fn test_bids_accumulate() {
        let mut state = running_state();

        claim_eq!(
            state.bid(0, BIDDER_1, Amount::from_micro_ccd(300), at_minutes(1)),
            Ok(Amount::from_micro_ccd(300))
        );
        claim_eq!(
            state.bid(0, BIDDER_1, Amount::from_micro_ccd(200), at_minutes(2)),
            Ok(Amount::from_micro_ccd(500))
        );
        claim_eq!(
            state.bid(0, BIDDER_2, Amount::from_micro_ccd(700), at_minutes(3)),
            Ok(Amount::from_micro_ccd(700))
        );

        let auction = state.auction(0).expect_report("Auction should exist");
        claim_eq!(auction.total_commitment, Amount::from_micro_ccd(1200));
        claim_eq!(auction.unsettled_bidders, 2);
        claim_eq!(state.commitment(0, &BIDDER_1), Amount::from_micro_ccd(500));
    }

    #[concordium_test]
    fn test_bid_rejections() {
        let mut state = new_state();
        let id = state
            .create(SELLER, &params())
            .expect_report("Auction should be created");
        claim_eq!(
            state.bid(id, BIDDER_1, Amount::from_micro_ccd(1), at_minutes(0)),
            Err(CustomContractError::InvalidState)
        );

        let mut state = running_state();
        claim_eq!(
            state.bid(0, BIDDER_1, Amount::zero(), at_minutes(1)),
            Err(CustomContractError::BidTooLow)
        );
        claim_eq!(
            state.bid(0, BIDDER_1, Amount::from_micro_ccd(1), at_minutes(20)),
            Err(CustomContractError::AuctionExpired)
        );
        claim_eq!(
            state.bid(7, BIDDER_1, Amount::from_micro_ccd(1), at_minutes(1)),
            Err(CustomContractError::UnknownAuction)
        );
    }

    #[concordium_test]
    fn test_end_rules() {
        let mut state = running_state();

        claim_eq!(
            state.end(0, &seller(), at_minutes(0)),
            Err(CustomContractError::InvalidState)
        );
        claim_eq!(
            state.end(0, &Address::Account(BIDDER_1), at_minutes(19)),
            Err(CustomContractError::Unauthorized)
        );

        claim_eq!(
            state.bid(0, BIDDER_1, Amount::from_micro_ccd(100_000), at_minutes(1)),
            Ok(Amount::from_micro_ccd(100_000))
        );
        claim_eq!(
            state.end(0, &seller(), at_minutes(3)),
            Ok(EndOutcome {
                final_price: Amount::from_micro_ccd(925),
                total_commitment: Amount::from_micro_ccd(100_000),
            })
        );
        claim_eq!(
            state.end(0, &seller(), at_minutes(4)),
            Err(CustomContractError::InvalidState)
        );

        let auction = state.auction(0).expect_report("Auction should exist");
        claim_eq!(auction.state, AuctionState::Ended);
        claim_eq!(auction.final_price, Some(Amount::from_micro_ccd(925)));
    }

    #[concordium_test]
    fn test_force_end_after_max_duration() {
        let mut state = running_state();
        claim_eq!(
            state.bid(0, BIDDER_1, Amount::from_micro_ccd(1000), at_minutes(1)),
            Ok(Amount::from_micro_ccd(1000))
        );

        let outcome = state
            .end(0, &Address::Account(BIDDER_2), at_minutes(20))
            .expect_report("Anybody can end an expired auction");
        claim_eq!(outcome.final_price, Amount::from_micro_ccd(500));
    }

    #[concordium_test]
    fn test_end_without_bids_completes_on_first_settle() {
        let mut state = running_state();

        let outcome = state
            .end(0, &seller(), at_minutes(1))
            .expect_report("Auction should end");
        claim_eq!(outcome.total_commitment, Amount::zero());
        claim_eq!(
            state.auction(0).map(|a| a.state),
            Ok(AuctionState::Ended)
        );
        claim_eq!(
            state.reclaim(0, &seller()),
            Err(CustomContractError::InvalidState)
        );

        claim_eq!(
            state.complete(0, BIDDER_2),
            Ok(Some(Completion {
                seller: SELLER,
                settlement: Settlement::empty(),
                completed: true,
            }))
        );
        claim_eq!(
            state.auction(0).map(|a| a.state),
            Ok(AuctionState::Completed)
        );
        claim_eq!(
            state.complete(0, BIDDER_2),
            Err(CustomContractError::InvalidState)
        );
        claim_eq!(state.reclaim(0, &seller()), Ok(ContractTokenAmount::from(100)));
    }

    #[concordium_test]
    fn test_complete_is_once_per_bidder() {
        let mut state = running_state();
        for (bidder, amount) in [(BIDDER_1, 30_000u64), (BIDDER_2, 2_300)].iter() {
            claim!(state
                .bid(0, *bidder, Amount::from_micro_ccd(*amount), at_minutes(1))
                .is_ok());
        }
        claim!(state.end(0, &seller(), at_minutes(1)).is_ok());

        let first = state
            .complete(0, BIDDER_2)
            .expect_report("Settlement should succeed");
        claim_eq!(
            first,
            Some(Completion {
                seller: SELLER,
                settlement: Settlement {
                    tokens: ContractTokenAmount::from(2),
                    cost: Amount::from_micro_ccd(1_950),
                    refund: Amount::from_micro_ccd(350),
                },
                completed: false,
            })
        );

        // A second call finds no commitment left.
        claim_eq!(state.complete(0, BIDDER_2), Ok(None));
        claim_eq!(state.complete(0, BIDDER_3), Ok(None));

        let last = state
            .complete(0, BIDDER_1)
            .expect_report("Settlement should succeed")
            .expect_report("Bidder has a commitment");
        claim_eq!(last.settlement.tokens, ContractTokenAmount::from(30));
        claim!(last.completed);

        let auction = state.auction(0).expect_report("Auction should exist");
        claim_eq!(auction.state, AuctionState::Completed);
        claim_eq!(auction.remaining_supply, ContractTokenAmount::from(68));
        claim_eq!(
            state.complete(0, BIDDER_1),
            Err(CustomContractError::InvalidState)
        );
    }

    #[concordium_test]
    fn test_winners_never_exceed_supply() {
        let mut state = running_state();
        let bidders = [BIDDER_1, BIDDER_2, BIDDER_3];
        for bidder in bidders.iter() {
            claim!(state
                .bid(0, *bidder, Amount::from_micro_ccd(40_000), at_minutes(0))
                .is_ok());
        }
        claim!(state.end(0, &seller(), at_minutes(20)).is_ok());

        let mut sold = 0u64;
        for bidder in bidders.iter() {
            let completion = state
                .complete(0, *bidder)
                .expect_report("Settlement should succeed")
                .expect_report("Bidder has a commitment");
            sold += completion.settlement.tokens.0;
        }

        claim_eq!(sold, 100);
        claim_eq!(
            state.auction(0).map(|a| a.remaining_supply),
            Ok(ContractTokenAmount::from(0))
        );
    }

    #[concordium_test]
    fn test_reclaim_rules() {
        let mut state = running_state();
        claim!(state
            .bid(0, BIDDER_1, Amount::from_micro_ccd(5_000), at_minutes(0))
            .is_ok());
        claim!(state.end(0, &seller(), at_minutes(1)).is_ok());

        claim_eq!(
            state.reclaim(0, &seller()),
            Err(CustomContractError::InvalidState)
        );
        claim!(state.complete(0, BIDDER_1).is_ok());

        claim_eq!(
            state.reclaim(0, &Address::Account(BIDDER_1)),
            Err(CustomContractError::Unauthorized)
        );
        claim_eq!(state.reclaim(0, &seller()), Ok(ContractTokenAmount::from(95)));
        claim_eq!(
            state.reclaim(0, &seller()),
            Err(CustomContractError::InvalidState)
        );
    }

    #[concordium_test]
    fn test_remain_maximum_token() {
        let mut state = running_state();
        claim!(state
            .bid(0, BIDDER_1, Amount::from_micro_ccd(10_000), at_minutes(0))
            .is_ok());

        let auction = state.auction(0).expect_report("Auction should exist");
        // 10 tokens at 1000 per unit.
        claim_eq!(
            auction.remain_maximum_token(at_minutes(0)),
            ContractTokenAmount::from(90)
        );
        // 20 tokens at the reserve.
        claim_eq!(
            auction.remain_maximum_token(at_minutes(25)),
            ContractTokenAmount::from(80)
        );
    }
}
