use commons::{
    AuctionId, ContractResult, ContractTokenAmount, CustomContractError, HostDutchTokenExt,
    Settlement,
};
use concordium_std::*;

use crate::events::AuctionEvents;
use crate::external::*;
use crate::state::{AuctionState, State};

/// Initialize the engine for the given token ledger with no auctions.
#[init(contract = "DutchAuction", parameter = "AuctionInitParams")]
fn contract_init<S: HasStateApi>(
    ctx: &impl HasInitContext,
    state_builder: &mut StateBuilder<S>,
) -> InitResult<State<S>> {
    let params: AuctionInitParams = ctx.parameter_cursor().get()?;
    Ok(State::new(state_builder, params.token))
}

/// Create an auction and lock the offered tokens on the ledger. The seller
/// must have approved at least `initial_supply` to this contract beforehand.
///
/// It rejects if:
/// - It fails to parse the parameter.
/// - Sender is not an account.
/// - Prices or supply are inconsistent.
/// - The allowance on the ledger is below `initial_supply`.
/// - The ledger rejects the lock.
#[receive(
    contract = "DutchAuction",
    name = "createAuction",
    parameter = "CreateAuctionParams",
    return_value = "AuctionId",
    mutable,
    enable_logger
)]
fn contract_create_auction<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<AuctionId> {
    let params: CreateAuctionParams = ctx.parameter_cursor().get()?;

    let seller = if let Address::Account(seller) = ctx.sender() {
        seller
    } else {
        bail!(CustomContractError::OnlyAccountAddress);
    };

    ensure!(params.is_valid(), CustomContractError::InvalidAuctionParams);

    let token = host.state().token;
    let owner = Address::Account(seller);
    let allowance = host.dut_allowance(&token, owner, Address::Contract(ctx.self_address()))?;
    ensure!(
        allowance.0 >= params.initial_supply.0,
        CustomContractError::InsufficientAllowance
    );

    let auction_id = host.state_mut().create(seller, &params)?;

    host.dut_lock(&token, owner, params.initial_supply)?;

    logger.log(&AuctionEvents::created(auction_id, &seller, &params))?;

    Ok(auction_id)
}

/// Start the price clock. Seller only.
#[receive(
    contract = "DutchAuction",
    name = "startAuction",
    parameter = "AuctionId",
    mutable,
    enable_logger
)]
fn contract_start_auction<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let auction_id: AuctionId = ctx.parameter_cursor().get()?;
    let slot_time = ctx.metadata().slot_time();

    host.state_mut()
        .start(auction_id, &ctx.sender(), slot_time)?;

    logger.log(&AuctionEvents::started(auction_id, slot_time))?;

    Ok(())
}

/// Commit the attached CCD to a running auction.
///
/// It rejects if:
/// - It fails to parse the parameter.
/// - Sender is not an account.
/// - The auction is not running.
/// - Nothing is attached.
/// - 20 minutes or more passed since the start. The auction stays running
///   until somebody ends it, but bids fail with `AuctionExpired`.
#[receive(
    contract = "DutchAuction",
    name = "bid",
    parameter = "AuctionId",
    mutable,
    payable,
    enable_logger
)]
fn contract_bid<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    amount: Amount,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let auction_id: AuctionId = ctx.parameter_cursor().get()?;

    let bidder = if let Address::Account(bidder) = ctx.sender() {
        bidder
    } else {
        bail!(CustomContractError::OnlyAccountAddress);
    };

    let commitment =
        host.state_mut()
            .bid(auction_id, bidder, amount, ctx.metadata().slot_time())?;

    logger.log(&AuctionEvents::bid(auction_id, &bidder, amount, commitment))?;

    Ok(())
}

/// Close the bidding and freeze the final price. The seller may do so any
/// time after the start, anybody else once the maximum duration has passed.
#[receive(
    contract = "DutchAuction",
    name = "endAuction",
    parameter = "AuctionId",
    mutable,
    enable_logger
)]
fn contract_end_auction<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let auction_id: AuctionId = ctx.parameter_cursor().get()?;

    let outcome = host
        .state_mut()
        .end(auction_id, &ctx.sender(), ctx.metadata().slot_time())?;

    logger.log(&AuctionEvents::ended(
        auction_id,
        outcome.final_price,
        outcome.total_commitment,
    ))?;

    Ok(())
}

/// Settle the commitment of the sender: bought tokens are unlocked to the
/// sender, their cost goes to the seller and the rest is refunded.
///
/// Calling it without a commitment does nothing and returns an empty
/// settlement, except on an auction that ended without bids: the first such
/// call completes it.
#[receive(
    contract = "DutchAuction",
    name = "completeAuction",
    parameter = "AuctionId",
    return_value = "Settlement",
    mutable,
    enable_logger
)]
fn contract_complete_auction<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<Settlement> {
    let auction_id: AuctionId = ctx.parameter_cursor().get()?;

    let bidder = if let Address::Account(bidder) = ctx.sender() {
        bidder
    } else {
        bail!(CustomContractError::OnlyAccountAddress);
    };

    let completion = match host.state_mut().complete(auction_id, bidder)? {
        Some(completion) => completion,
        None => return Ok(Settlement::empty()),
    };
    let settlement = completion.settlement;
    let token = host.state().token;

    if settlement.tokens.0 > 0 {
        host.dut_unlock(
            &token,
            Address::Account(completion.seller),
            Address::Account(bidder),
            settlement.tokens,
        )?;
    }
    if settlement.refund > Amount::zero() {
        host.invoke_transfer(&bidder, settlement.refund)?;
    }
    if settlement.cost > Amount::zero() {
        host.invoke_transfer(&completion.seller, settlement.cost)?;
    }

    if settlement != Settlement::empty() {
        logger.log(&AuctionEvents::settled(auction_id, &bidder, &settlement))?;
    }
    if completion.completed {
        logger.log(&AuctionEvents::Completed(auction_id))?;
    }

    Ok(settlement)
}

/// Return the unsold tokens of a completed auction to the seller. Seller
/// only, once.
///
/// It rejects with `InsufficientBalance` if the ledger holds less in escrow
/// for the seller than the auction has left to return.
#[receive(
    contract = "DutchAuction",
    name = "reclaimTokens",
    parameter = "AuctionId",
    mutable,
    enable_logger
)]
fn contract_reclaim_tokens<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let auction_id: AuctionId = ctx.parameter_cursor().get()?;

    let seller = host.state().auction(auction_id)?.seller;
    let unsold = host.state_mut().reclaim(auction_id, &ctx.sender())?;
    let token = host.state().token;

    if unsold.0 > 0 {
        let owner = Address::Account(seller);
        let escrow = host.dut_locked_balance_of(&token, owner)?;
        ensure!(
            escrow.0 >= unsold.0,
            CustomContractError::InsufficientBalance
        );
        host.dut_unlock(&token, owner, owner, unsold)?;
    }

    logger.log(&AuctionEvents::reclaimed(auction_id, &seller, unsold))?;

    Ok(())
}

#[receive(contract = "DutchAuction", name = "auctionCount", return_value = "u64")]
fn contract_auction_count<S: HasStateApi>(
    _ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<u64> {
    Ok(host.state().next_auction_id)
}

#[receive(
    contract = "DutchAuction",
    name = "getState",
    parameter = "AuctionId",
    return_value = "AuctionState"
)]
fn contract_get_state<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<AuctionState> {
    let auction_id: AuctionId = ctx.parameter_cursor().get()?;
    Ok(host.state().auction(auction_id)?.state)
}

/// Unit price at the current slot time. Rejects unless the auction runs.
#[receive(
    contract = "DutchAuction",
    name = "currentPrice",
    parameter = "AuctionId",
    return_value = "Amount"
)]
fn contract_current_price<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<Amount> {
    let auction_id: AuctionId = ctx.parameter_cursor().get()?;
    host.state()
        .auction(auction_id)?
        .current_price(ctx.metadata().slot_time())
}

#[receive(
    contract = "DutchAuction",
    name = "startPrice",
    parameter = "AuctionId",
    return_value = "Amount"
)]
fn contract_start_price<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<Amount> {
    let auction_id: AuctionId = ctx.parameter_cursor().get()?;
    Ok(host.state().auction(auction_id)?.curve.start_price)
}

#[receive(
    contract = "DutchAuction",
    name = "reservePrice",
    parameter = "AuctionId",
    return_value = "Amount"
)]
fn contract_reserve_price<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<Amount> {
    let auction_id: AuctionId = ctx.parameter_cursor().get()?;
    Ok(host.state().auction(auction_id)?.curve.reserve_price)
}

#[receive(
    contract = "DutchAuction",
    name = "startTime",
    parameter = "AuctionId",
    return_value = "Option<Timestamp>"
)]
fn contract_start_time<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<Option<Timestamp>> {
    let auction_id: AuctionId = ctx.parameter_cursor().get()?;
    Ok(host.state().auction(auction_id)?.start_time)
}

/// Tokens still purchasable at the current price while the auction runs,
/// the unsettled remainder otherwise.
#[receive(
    contract = "DutchAuction",
    name = "remainMaximumToken",
    parameter = "AuctionId",
    return_value = "ContractTokenAmount"
)]
fn contract_remain_maximum_token<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<ContractTokenAmount> {
    let auction_id: AuctionId = ctx.parameter_cursor().get()?;
    Ok(host
        .state()
        .auction(auction_id)?
        .remain_maximum_token(ctx.metadata().slot_time()))
}

#[receive(
    contract = "DutchAuction",
    name = "finalPrice",
    parameter = "AuctionId",
    return_value = "Option<Amount>"
)]
fn contract_final_price<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<Option<Amount>> {
    let auction_id: AuctionId = ctx.parameter_cursor().get()?;
    Ok(host.state().auction(auction_id)?.final_price)
}

#[receive(
    contract = "DutchAuction",
    name = "commitmentOf",
    parameter = "CommitmentParams",
    return_value = "Amount"
)]
fn contract_commitment_of<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<Amount> {
    let params: CommitmentParams = ctx.parameter_cursor().get()?;
    let state = host.state();
    // Unknown auctions are an error, unknown bidders just have nothing.
    state.auction(params.auction_id)?;
    Ok(state.commitment(params.auction_id, &params.account))
}

#[receive(
    contract = "DutchAuction",
    name = "viewAuction",
    parameter = "AuctionId",
    return_value = "AuctionView"
)]
fn contract_view_auction<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<AuctionView> {
    let auction_id: AuctionId = ctx.parameter_cursor().get()?;
    Ok(host.state().auction(auction_id)?.into())
}

#[receive(
    contract = "DutchAuction",
    name = "tokenContract",
    return_value = "ContractAddress"
)]
fn contract_token_contract<S: HasStateApi>(
    _ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<ContractAddress> {
    Ok(host.state().token)
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use commons::{test::*, AllowanceParams, LockParams, UnlockParams, DECAY_STEP_MILLIS};
    use test_infrastructure::*;

    const SELLER: AccountAddress = AccountAddress([1; 32]);
    const BIDDER_1: AccountAddress = AccountAddress([16; 32]);
    const BIDDER_2: AccountAddress = AccountAddress([17; 32]);
    const TOKEN: ContractAddress = ContractAddress {
        index: 1,
        subindex: 0,
    };
    const ENGINE: ContractAddress = ContractAddress {
        index: 2,
        subindex: 0,
    };
    const AUCTION: AuctionId = 0;

    fn at_minutes(m: u64) -> Timestamp {
        Timestamp::from_timestamp_millis(1_000_000 + m * DECAY_STEP_MILLIS)
    }

    fn create_params() -> CreateAuctionParams {
        CreateAuctionParams {
            start_price: Amount::from_micro_ccd(1000),
            reserve_price: Amount::from_micro_ccd(500),
            price_drop_rate: Amount::from_micro_ccd(25),
            initial_supply: ContractTokenAmount::from(100),
        }
    }

    fn receive_ctx<'a>(
        sender: Address,
        parameter: &'a [u8],
        slot_time: Timestamp,
    ) -> TestReceiveContext<'a> {
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(sender)
            .set_self_address(ENGINE)
            .set_parameter(parameter)
            .set_metadata_slot_time(slot_time);
        ctx
    }

    fn default_host() -> TestHost<State<TestStateApi>> {
        let mut state_builder = TestStateBuilder::new();
        let state = State::new(&mut state_builder, TOKEN);
        TestHost::new(state, state_builder)
    }

    fn mock_ledger_for_create(host: &mut TestHost<State<TestStateApi>>, allowance: u64) {
        host.setup_mock_entrypoint(
            TOKEN,
            OwnedEntrypointName::new_unchecked("allowance".into()),
            parse_and_check_mock::<AllowanceParams, _>(
                |params| {
                    params.owner == Address::Account(SELLER)
                        && params.spender == Address::Contract(ENGINE)
                },
                ContractTokenAmount::from(allowance),
            ),
        );
        host.setup_mock_entrypoint(
            TOKEN,
            OwnedEntrypointName::new_unchecked("lock".into()),
            parse_and_check_mock::<LockParams, _>(
                |params| {
                    params.owner == Address::Account(SELLER)
                        && params.amount == ContractTokenAmount::from(100)
                },
                (),
            ),
        );
    }

    /// Host with one auction created by `SELLER` and started at minute zero.
    fn running_host() -> TestHost<State<TestStateApi>> {
        let mut host = default_host();
        let id = host
            .state_mut()
            .create(SELLER, &create_params())
            .expect_report("Auction should be created");
        host.state_mut()
            .start(id, &Address::Account(SELLER), at_minutes(0))
            .expect_report("Auction should start");
        host
    }

    #[concordium_test]
    fn test_init() {
        let parameter_bytes = to_bytes(&AuctionInitParams { token: TOKEN });
        let mut ctx = TestInitContext::empty();
        ctx.set_parameter(&parameter_bytes);
        let mut state_builder = TestStateBuilder::new();

        let state =
            contract_init(&ctx, &mut state_builder).expect_report("Initialization should pass");

        claim_eq!(state.token, TOKEN);
        claim_eq!(state.next_auction_id, 0);
    }

    #[concordium_test]
    fn test_create_auction() {
        let mut host = default_host();
        mock_ledger_for_create(&mut host, 1000);

        let parameter_bytes = to_bytes(&create_params());
        let ctx = receive_ctx(Address::Account(SELLER), &parameter_bytes, at_minutes(0));
        let mut logger = TestLogger::init();

        let result = contract_create_auction(&ctx, &mut host, &mut logger);

        claim_eq!(result, Ok(0));
        claim_eq!(host.state().next_auction_id, 1);
        claim_eq!(
            host.state().auction(0).map(|a| a.state),
            Ok(AuctionState::NotStarted)
        );
        claim_eq!(
            logger.logs,
            vec![to_bytes(&AuctionEvents::created(
                0,
                &SELLER,
                &create_params()
            ))]
        );
    }

    #[concordium_test]
    fn test_create_auction_without_allowance() {
        let mut host = default_host();
        mock_ledger_for_create(&mut host, 99);

        let parameter_bytes = to_bytes(&create_params());
        let ctx = receive_ctx(Address::Account(SELLER), &parameter_bytes, at_minutes(0));
        let mut logger = TestLogger::init();

        let result = contract_create_auction(&ctx, &mut host, &mut logger);

        claim_eq!(result, Err(CustomContractError::InsufficientAllowance));
        claim_eq!(host.state().next_auction_id, 0);
        claim_eq!(logger.logs.len(), 0);
    }

    #[concordium_test]
    fn test_create_auction_rejected_by_ledger() {
        let mut host = default_host();
        mock_ledger_for_create(&mut host, 1000);
        host.setup_mock_entrypoint(
            TOKEN,
            OwnedEntrypointName::new_unchecked("lock".into()),
            trap_mock(),
        );

        let parameter_bytes = to_bytes(&create_params());
        let ctx = receive_ctx(Address::Account(SELLER), &parameter_bytes, at_minutes(0));
        let mut logger = TestLogger::init();

        let result = contract_create_auction(&ctx, &mut host, &mut logger);

        claim_eq!(result, Err(CustomContractError::InvokeContractError));
    }

    #[concordium_test]
    fn test_create_auction_checks_sender_and_params() {
        let mut host = default_host();
        mock_ledger_for_create(&mut host, 1000);
        let mut logger = TestLogger::init();

        let parameter_bytes = to_bytes(&create_params());
        let ctx = receive_ctx(Address::Contract(TOKEN), &parameter_bytes, at_minutes(0));
        claim_eq!(
            contract_create_auction(&ctx, &mut host, &mut logger),
            Err(CustomContractError::OnlyAccountAddress)
        );

        let parameter_bytes = to_bytes(&CreateAuctionParams {
            reserve_price: Amount::from_micro_ccd(2000),
            ..create_params()
        });
        let ctx = receive_ctx(Address::Account(SELLER), &parameter_bytes, at_minutes(0));
        claim_eq!(
            contract_create_auction(&ctx, &mut host, &mut logger),
            Err(CustomContractError::InvalidAuctionParams)
        );
    }

    /// Supply 100 at 1000 dropping by 25 per minute down to 500, a single
    /// bidder committing 100000.
    #[concordium_test]
    fn test_full_auction() {
        let mut host = default_host();
        mock_ledger_for_create(&mut host, 1000);
        let mut logger = TestLogger::init();
        let auction_bytes = to_bytes(&AUCTION);

        let parameter_bytes = to_bytes(&create_params());
        let ctx = receive_ctx(Address::Account(SELLER), &parameter_bytes, at_minutes(0));
        claim_eq!(
            contract_create_auction(&ctx, &mut host, &mut logger),
            Ok(AUCTION)
        );

        let ctx = receive_ctx(Address::Account(SELLER), &auction_bytes, at_minutes(0));
        claim_eq!(
            contract_start_auction(&ctx, &mut host, &mut logger),
            Ok(())
        );

        let ctx = receive_ctx(Address::Account(BIDDER_1), &auction_bytes, at_minutes(1));
        let price = contract_current_price(&ctx, &host).expect_report("Auction is running");
        claim!(price < Amount::from_micro_ccd(1000));
        claim!(price >= Amount::from_micro_ccd(500));

        let commitment = Amount::from_micro_ccd(100_000);
        claim_eq!(
            contract_bid(&ctx, &mut host, commitment, &mut logger),
            Ok(())
        );

        let ctx = receive_ctx(Address::Account(SELLER), &auction_bytes, at_minutes(1));
        claim_eq!(contract_end_auction(&ctx, &mut host, &mut logger), Ok(()));
        let final_price = host
            .state()
            .auction(AUCTION)
            .ok()
            .and_then(|a| a.final_price)
            .expect_report("Final price should be set");
        claim_eq!(final_price, Amount::from_micro_ccd(975));

        let tokens = (commitment.micro_ccd / final_price.micro_ccd).min(100);
        let cost = Amount::from_micro_ccd(tokens * final_price.micro_ccd);
        let refund = Amount::from_micro_ccd(commitment.micro_ccd - cost.micro_ccd);

        host.setup_mock_entrypoint(
            TOKEN,
            OwnedEntrypointName::new_unchecked("unlock".into()),
            parse_and_check_mock::<UnlockParams, _>(
                move |params| {
                    params.from == Address::Account(SELLER)
                        && params.to == Address::Account(BIDDER_1)
                        && params.amount == ContractTokenAmount::from(tokens)
                },
                (),
            ),
        );
        host.set_self_balance(commitment);

        let ctx = receive_ctx(Address::Account(BIDDER_1), &auction_bytes, at_minutes(2));
        let settlement = contract_complete_auction(&ctx, &mut host, &mut logger)
            .expect_report("Completion should succeed");

        claim_eq!(
            settlement,
            Settlement {
                tokens: ContractTokenAmount::from(100),
                cost: Amount::from_micro_ccd(97_500),
                refund: Amount::from_micro_ccd(2_500),
            }
        );
        claim_eq!(settlement.cost, cost);
        claim_eq!(settlement.refund, refund);
        claim!(host.transfer_occurred(&BIDDER_1, refund));
        claim!(host.transfer_occurred(&SELLER, cost));
        claim_eq!(
            contract_get_state(&ctx, &host),
            Ok(AuctionState::Completed)
        );
        claim_eq!(
            contract_commitment_of(
                &receive_ctx(
                    Address::Account(BIDDER_1),
                    &to_bytes(&CommitmentParams {
                        auction_id: AUCTION,
                        account: BIDDER_1,
                    }),
                    at_minutes(2)
                ),
                &host
            ),
            Ok(Amount::zero())
        );

        // Completed auctions reject further settlement.
        claim_eq!(
            contract_complete_auction(&ctx, &mut host, &mut logger),
            Err(CustomContractError::InvalidState)
        );

        // Everything was sold, nothing to unlock.
        let ctx = receive_ctx(Address::Account(SELLER), &auction_bytes, at_minutes(3));
        claim_eq!(
            contract_reclaim_tokens(&ctx, &mut host, &mut logger),
            Ok(())
        );

        let last = logger.logs.last().cloned();
        claim_eq!(
            last,
            Some(to_bytes(&AuctionEvents::reclaimed(
                AUCTION,
                &SELLER,
                ContractTokenAmount::from(0)
            )))
        );
    }

    #[concordium_test]
    fn test_complete_twice_pays_once() {
        let mut host = running_host();
        host.state_mut()
            .bid(AUCTION, BIDDER_1, Amount::from_micro_ccd(2_300), at_minutes(0))
            .expect_report("Bid should pass");
        host.state_mut()
            .bid(AUCTION, BIDDER_2, Amount::from_micro_ccd(5_000), at_minutes(0))
            .expect_report("Bid should pass");
        host.state_mut()
            .end(AUCTION, &Address::Account(SELLER), at_minutes(1))
            .expect_report("Auction should end");

        host.setup_mock_entrypoint(
            TOKEN,
            OwnedEntrypointName::new_unchecked("unlock".into()),
            parse_and_ok_mock::<UnlockParams, _>(()),
        );
        host.set_self_balance(Amount::from_micro_ccd(7_300));

        let auction_bytes = to_bytes(&AUCTION);
        let ctx = receive_ctx(Address::Account(BIDDER_1), &auction_bytes, at_minutes(2));
        let mut logger = TestLogger::init();

        let first = contract_complete_auction(&ctx, &mut host, &mut logger);
        claim_eq!(
            first.map(|s| s.tokens),
            Ok(ContractTokenAmount::from(2))
        );
        claim_eq!(logger.logs.len(), 1);

        let second = contract_complete_auction(&ctx, &mut host, &mut logger);
        claim_eq!(second, Ok(Settlement::empty()));
        claim_eq!(logger.logs.len(), 1, "Nothing should happen the second time");

        claim_eq!(
            host.state().auction(AUCTION).map(|a| a.state),
            Ok(AuctionState::Ended)
        );
    }

    #[concordium_test]
    fn test_bid_from_contract_rejected() {
        let mut host = running_host();
        let auction_bytes = to_bytes(&AUCTION);
        let ctx = receive_ctx(Address::Contract(TOKEN), &auction_bytes, at_minutes(1));
        let mut logger = TestLogger::init();

        claim_eq!(
            contract_bid(&ctx, &mut host, Amount::from_micro_ccd(10), &mut logger),
            Err(CustomContractError::OnlyAccountAddress)
        );
    }

    #[concordium_test]
    fn test_force_end() {
        let mut host = running_host();
        let auction_bytes = to_bytes(&AUCTION);
        let mut logger = TestLogger::init();

        let ctx = receive_ctx(Address::Account(BIDDER_1), &auction_bytes, at_minutes(19));
        claim_eq!(
            contract_end_auction(&ctx, &mut host, &mut logger),
            Err(CustomContractError::Unauthorized)
        );

        let ctx = receive_ctx(Address::Account(BIDDER_1), &auction_bytes, at_minutes(20));
        claim_eq!(contract_end_auction(&ctx, &mut host, &mut logger), Ok(()));
        claim_eq!(
            logger.logs,
            vec![
                to_bytes(&AuctionEvents::ended(
                    AUCTION,
                    Amount::from_micro_ccd(500),
                    Amount::zero()
                )),
            ]
        );
        claim_eq!(
            host.state().auction(AUCTION).map(|a| a.state),
            Ok(AuctionState::Ended)
        );
    }

    /// Ledger that holds `escrow` tokens locked for `SELLER` and expects all
    /// 100 auctioned tokens to be unlocked back to them.
    fn mock_ledger_for_reclaim(host: &mut TestHost<State<TestStateApi>>, escrow: u64) {
        host.setup_mock_entrypoint(
            TOKEN,
            OwnedEntrypointName::new_unchecked("lockedBalanceOf".into()),
            parse_and_check_mock::<Address, _>(
                |owner| *owner == Address::Account(SELLER),
                ContractTokenAmount::from(escrow),
            ),
        );
        host.setup_mock_entrypoint(
            TOKEN,
            OwnedEntrypointName::new_unchecked("unlock".into()),
            parse_and_check_mock::<UnlockParams, _>(
                |params| {
                    params.from == Address::Account(SELLER)
                        && params.to == Address::Account(SELLER)
                        && params.amount == ContractTokenAmount::from(100)
                },
                (),
            ),
        );
    }

    #[concordium_test]
    fn test_reclaim_unsold_tokens() {
        let mut host = running_host();
        mock_ledger_for_reclaim(&mut host, 100);
        let auction_bytes = to_bytes(&AUCTION);
        let mut logger = TestLogger::init();

        let ctx = receive_ctx(Address::Account(SELLER), &auction_bytes, at_minutes(5));
        claim_eq!(contract_end_auction(&ctx, &mut host, &mut logger), Ok(()));

        // Nobody bid, yet the seller has to wait for a completion.
        let ctx = receive_ctx(Address::Account(SELLER), &auction_bytes, at_minutes(6));
        claim_eq!(
            contract_reclaim_tokens(&ctx, &mut host, &mut logger),
            Err(CustomContractError::InvalidState)
        );

        let ctx = receive_ctx(Address::Account(BIDDER_2), &auction_bytes, at_minutes(6));
        claim_eq!(
            contract_complete_auction(&ctx, &mut host, &mut logger),
            Ok(Settlement::empty())
        );
        claim_eq!(
            contract_get_state(&ctx, &host),
            Ok(AuctionState::Completed)
        );
        claim_eq!(
            contract_reclaim_tokens(&ctx, &mut host, &mut logger),
            Err(CustomContractError::Unauthorized)
        );

        let ctx = receive_ctx(Address::Account(SELLER), &auction_bytes, at_minutes(7));
        claim_eq!(
            contract_reclaim_tokens(&ctx, &mut host, &mut logger),
            Ok(())
        );
        claim_eq!(
            contract_reclaim_tokens(&ctx, &mut host, &mut logger),
            Err(CustomContractError::InvalidState)
        );

        claim_eq!(
            logger.logs,
            vec![
                to_bytes(&AuctionEvents::ended(
                    AUCTION,
                    Amount::from_micro_ccd(875),
                    Amount::zero()
                )),
                to_bytes(&AuctionEvents::Completed(AUCTION)),
                to_bytes(&AuctionEvents::reclaimed(
                    AUCTION,
                    &SELLER,
                    ContractTokenAmount::from(100)
                )),
            ]
        );
    }

    #[concordium_test]
    fn test_reclaim_checks_escrow() {
        let mut host = running_host();
        mock_ledger_for_reclaim(&mut host, 99);
        host.state_mut()
            .end(AUCTION, &Address::Account(SELLER), at_minutes(1))
            .expect_report("Auction should end");
        let completion = host
            .state_mut()
            .complete(AUCTION, BIDDER_1)
            .expect_report("Empty auction should complete");
        claim!(completion.is_some());

        let auction_bytes = to_bytes(&AUCTION);
        let ctx = receive_ctx(Address::Account(SELLER), &auction_bytes, at_minutes(2));
        let mut logger = TestLogger::init();

        claim_eq!(
            contract_reclaim_tokens(&ctx, &mut host, &mut logger),
            Err(CustomContractError::InsufficientBalance)
        );
        claim!(logger.logs.is_empty());
    }

    #[concordium_test]
    fn test_views() {
        let mut host = running_host();
        host.state_mut()
            .bid(AUCTION, BIDDER_1, Amount::from_micro_ccd(10_000), at_minutes(0))
            .expect_report("Bid should pass");

        let auction_bytes = to_bytes(&AUCTION);
        let ctx = receive_ctx(Address::Account(BIDDER_2), &auction_bytes, at_minutes(4));

        claim_eq!(contract_auction_count(&ctx, &host), Ok(1));
        claim_eq!(contract_get_state(&ctx, &host), Ok(AuctionState::Running));
        claim_eq!(
            contract_start_price(&ctx, &host),
            Ok(Amount::from_micro_ccd(1000))
        );
        claim_eq!(
            contract_reserve_price(&ctx, &host),
            Ok(Amount::from_micro_ccd(500))
        );
        claim_eq!(contract_start_time(&ctx, &host), Ok(Some(at_minutes(0))));
        claim_eq!(
            contract_current_price(&ctx, &host),
            Ok(Amount::from_micro_ccd(900))
        );
        // 10000 buys 11 tokens at 900.
        claim_eq!(
            contract_remain_maximum_token(&ctx, &host),
            Ok(ContractTokenAmount::from(89))
        );
        claim_eq!(contract_final_price(&ctx, &host), Ok(None));
        claim_eq!(contract_token_contract(&ctx, &host), Ok(TOKEN));

        let view = contract_view_auction(&ctx, &host).expect_report("Auction should exist");
        claim_eq!(view.seller, SELLER);
        claim_eq!(view.total_commitment, Amount::from_micro_ccd(10_000));
        claim_eq!(view.unsettled_bidders, 1);

        let unknown_bytes = to_bytes(&5u64);
        let ctx = receive_ctx(Address::Account(BIDDER_2), &unknown_bytes, at_minutes(4));
        claim_eq!(
            contract_get_state(&ctx, &host),
            Err(CustomContractError::UnknownAuction)
        );
    }
}
