use commons::{
    AllowanceParams, ContractResult, ContractTokenAmount, ContractTokenId, CustomContractError,
    LockParams, UnlockParams, TOKEN_NAME, TOKEN_SYMBOL,
};
use concordium_cis2::{Cis2Event, MintEvent, TokenIdUnit, TransferEvent};
use concordium_std::*;

use crate::events::LedgerEvent;
use crate::external::*;
use crate::state::State;

type TokenEvent = Cis2Event<ContractTokenId, ContractTokenAmount>;

/// Initialize the ledger and credit the whole supply to the deploying account.
#[init(
    contract = "DutchToken",
    parameter = "TokenInitParams",
    enable_logger
)]
fn contract_init<S: HasStateApi>(
    ctx: &impl HasInitContext,
    state_builder: &mut StateBuilder<S>,
    logger: &mut impl HasLogger,
) -> InitResult<State<S>> {
    let params: TokenInitParams = ctx.parameter_cursor().get()?;
    let owner = Address::Account(ctx.init_origin());
    let amount = params.total_supply;

    let state = State::new(state_builder, params, owner, ctx.metadata().slot_time());

    logger
        .log(&TokenEvent::Mint(MintEvent {
            token_id: TokenIdUnit(),
            amount,
            owner,
        }))
        .map_err(CustomContractError::from)?;

    Ok(state)
}

/// Transfer unlocked tokens of the sender.
///
/// It rejects if:
/// - The ledger lifetime has passed.
/// - It fails to parse the parameter.
/// - The sender does not own enough unlocked tokens.
#[receive(
    contract = "DutchToken",
    name = "transfer",
    parameter = "TransferParams",
    mutable,
    enable_logger
)]
fn contract_transfer<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    host.state().ensure_alive(ctx.metadata().slot_time())?;
    let params: TransferParams = ctx.parameter_cursor().get()?;
    let from = ctx.sender();

    host.state_mut().transfer(&from, &params.to, params.amount)?;

    logger.log(&transfer_event(from, params.to, params.amount))?;

    Ok(())
}

/// Set the number of the sender's tokens `spender` may move. Overwrites any
/// previous allowance.
#[receive(
    contract = "DutchToken",
    name = "approve",
    parameter = "ApproveParams",
    mutable,
    enable_logger
)]
fn contract_approve<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    host.state().ensure_alive(ctx.metadata().slot_time())?;
    let params: ApproveParams = ctx.parameter_cursor().get()?;
    let owner = ctx.sender();

    host.state_mut()
        .approve(owner, params.spender, params.amount);

    logger.log(&LedgerEvent::approval(owner, params.spender, params.amount))?;

    Ok(())
}

/// Transfer unlocked tokens on behalf of another address.
///
/// It rejects if:
/// - The ledger lifetime has passed.
/// - It fails to parse the parameter.
/// - The allowance of the sender is too small.
/// - `from` does not own enough unlocked tokens.
#[receive(
    contract = "DutchToken",
    name = "transferFrom",
    parameter = "TransferFromParams",
    mutable,
    enable_logger
)]
fn contract_transfer_from<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    host.state().ensure_alive(ctx.metadata().slot_time())?;
    let params: TransferFromParams = ctx.parameter_cursor().get()?;

    host.state_mut()
        .transfer_from(&ctx.sender(), &params.from, &params.to, params.amount)?;

    logger.log(&transfer_event(params.from, params.to, params.amount))?;

    Ok(())
}

/// Move tokens of `owner` into escrow. Only callable by the auction engine.
///
/// It rejects if:
/// - The ledger lifetime has passed.
/// - The sender is not the auction engine.
/// - It fails to parse the parameter.
/// - `owner` approved less than `amount` to the engine.
/// - `owner` does not own enough unlocked tokens.
#[receive(
    contract = "DutchToken",
    name = "lock",
    parameter = "LockParams",
    mutable,
    enable_logger
)]
fn contract_lock<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    host.state().ensure_alive(ctx.metadata().slot_time())?;
    ensure!(
        host.state().is_auction_engine(&ctx.sender()),
        CustomContractError::Unauthorized
    );
    let params: LockParams = ctx.parameter_cursor().get()?;

    host.state_mut().lock(&params.owner, params.amount)?;

    logger.log(&LedgerEvent::lock(params.owner, params.amount))?;

    Ok(())
}

/// Release escrowed tokens of `from` to `to`. Only callable by the auction
/// engine.
///
/// It rejects if:
/// - The ledger lifetime has passed.
/// - The sender is not the auction engine.
/// - It fails to parse the parameter.
/// - `from` has less than `amount` locked.
#[receive(
    contract = "DutchToken",
    name = "unlock",
    parameter = "UnlockParams",
    mutable,
    enable_logger
)]
fn contract_unlock<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    host.state().ensure_alive(ctx.metadata().slot_time())?;
    ensure!(
        host.state().is_auction_engine(&ctx.sender()),
        CustomContractError::Unauthorized
    );
    let params: UnlockParams = ctx.parameter_cursor().get()?;

    host.state_mut()
        .unlock(&params.from, &params.to, params.amount)?;

    logger.log(&LedgerEvent::unlock(params.from, params.to, params.amount))?;
    if params.from != params.to {
        logger.log(&transfer_event(params.from, params.to, params.amount))?;
    }

    Ok(())
}

#[receive(
    contract = "DutchToken",
    name = "balanceOf",
    parameter = "Address",
    return_value = "ContractTokenAmount"
)]
fn contract_balance_of<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<ContractTokenAmount> {
    host.state().ensure_alive(ctx.metadata().slot_time())?;
    let address: Address = ctx.parameter_cursor().get()?;
    Ok(host.state().balance_of(&address))
}

#[receive(
    contract = "DutchToken",
    name = "lockedBalanceOf",
    parameter = "Address",
    return_value = "ContractTokenAmount"
)]
fn contract_locked_balance_of<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<ContractTokenAmount> {
    host.state().ensure_alive(ctx.metadata().slot_time())?;
    let address: Address = ctx.parameter_cursor().get()?;
    Ok(host.state().locked_balance_of(&address))
}

#[receive(
    contract = "DutchToken",
    name = "allowance",
    parameter = "AllowanceParams",
    return_value = "ContractTokenAmount"
)]
fn contract_allowance<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<ContractTokenAmount> {
    host.state().ensure_alive(ctx.metadata().slot_time())?;
    let params: AllowanceParams = ctx.parameter_cursor().get()?;
    Ok(host.state().allowance(&params.owner, &params.spender))
}

#[receive(
    contract = "DutchToken",
    name = "totalSupply",
    return_value = "ContractTokenAmount"
)]
fn contract_total_supply<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<ContractTokenAmount> {
    host.state().ensure_alive(ctx.metadata().slot_time())?;
    Ok(host.state().total_supply)
}

#[receive(contract = "DutchToken", name = "name", return_value = "String")]
fn contract_name<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<String> {
    host.state().ensure_alive(ctx.metadata().slot_time())?;
    Ok(TOKEN_NAME.into())
}

#[receive(contract = "DutchToken", name = "symbol", return_value = "String")]
fn contract_symbol<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<String> {
    host.state().ensure_alive(ctx.metadata().slot_time())?;
    Ok(TOKEN_SYMBOL.into())
}

/// The contract allowed to lock and unlock balances.
#[receive(
    contract = "DutchToken",
    name = "auctionEngine",
    return_value = "ContractAddress"
)]
fn contract_auction_engine<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<ContractAddress> {
    host.state().ensure_alive(ctx.metadata().slot_time())?;
    Ok(host.state().auction_engine)
}

fn transfer_event(from: Address, to: Address, amount: ContractTokenAmount) -> TokenEvent {
    Cis2Event::Transfer(TransferEvent {
        token_id: TokenIdUnit(),
        amount,
        from,
        to,
    })
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use test_infrastructure::*;

    const OWNER: AccountAddress = AccountAddress([1; 32]);
    const OWNER_ADDR: Address = Address::Account(OWNER);
    const USER_1: Address = Address::Account(AccountAddress([16; 32]));
    const USER_2: Address = Address::Account(AccountAddress([17; 32]));
    const ENGINE: ContractAddress = ContractAddress {
        index: 2,
        subindex: 0,
    };
    const TOTAL_SUPPLY: u64 = 2048;

    fn amount(value: u64) -> ContractTokenAmount {
        ContractTokenAmount::from(value)
    }

    fn created_at() -> Timestamp {
        Timestamp::from_timestamp_millis(10_000)
    }

    fn lifetime() -> Duration {
        Duration::from_days(7)
    }

    fn after_lifetime() -> Timestamp {
        created_at()
            .checked_add(lifetime())
            .and_then(|t| t.checked_add(Duration::from_millis(1)))
            .expect_report("Timestamp overflow")
    }

    fn init_params() -> TokenInitParams {
        TokenInitParams {
            total_supply: amount(TOTAL_SUPPLY),
            auction_engine: ENGINE,
            lifetime: lifetime(),
        }
    }

    fn default_host() -> TestHost<State<TestStateApi>> {
        let mut state_builder = TestStateBuilder::new();
        let state = State::new(&mut state_builder, init_params(), OWNER_ADDR, created_at());
        TestHost::new(state, state_builder)
    }

    fn receive_ctx<'a>(sender: Address, parameter: &'a [u8]) -> TestReceiveContext<'a> {
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(sender);
        ctx.set_parameter(parameter);
        ctx.set_metadata_slot_time(created_at());
        ctx
    }

    #[concordium_test]
    fn test_init() {
        let parameter_bytes = to_bytes(&init_params());
        let mut ctx = TestInitContext::empty();
        ctx.set_init_origin(OWNER);
        ctx.set_parameter(&parameter_bytes);
        ctx.set_metadata_slot_time(created_at());

        let mut state_builder = TestStateBuilder::new();
        let mut logger = TestLogger::init();

        let state = contract_init(&ctx, &mut state_builder, &mut logger)
            .expect_report("Initialization should pass");

        claim_eq!(state.total_supply, amount(TOTAL_SUPPLY));
        claim_eq!(state.auction_engine, ENGINE);
        claim_eq!(state.created_at, created_at());
        claim_eq!(state.balance_of(&OWNER_ADDR), amount(TOTAL_SUPPLY));
        claim_eq!(state.locked_balance_of(&OWNER_ADDR), amount(0));

        claim_eq!(logger.logs.len(), 1, "Only the mint should be logged");
        claim_eq!(
            logger.logs[0],
            to_bytes(&TokenEvent::Mint(MintEvent {
                token_id: TokenIdUnit(),
                amount: amount(TOTAL_SUPPLY),
                owner: OWNER_ADDR,
            }))
        );
    }

    #[concordium_test]
    fn test_transfer() {
        let mut host = default_host();
        let parameter_bytes = to_bytes(&TransferParams {
            to: USER_1,
            amount: amount(1000),
        });
        let ctx = receive_ctx(OWNER_ADDR, &parameter_bytes);
        let mut logger = TestLogger::init();

        let result = contract_transfer(&ctx, &mut host, &mut logger);

        claim_eq!(result, Ok(()));
        claim_eq!(host.state().balance_of(&OWNER_ADDR), amount(1048));
        claim_eq!(host.state().balance_of(&USER_1), amount(1000));
        claim_eq!(
            logger.logs,
            vec![to_bytes(&transfer_event(OWNER_ADDR, USER_1, amount(1000)))]
        );
    }

    #[concordium_test]
    fn test_transfer_insufficient_balance() {
        let mut host = default_host();
        let parameter_bytes = to_bytes(&TransferParams {
            to: USER_2,
            amount: amount(1),
        });
        let ctx = receive_ctx(USER_1, &parameter_bytes);
        let mut logger = TestLogger::init();

        let result = contract_transfer(&ctx, &mut host, &mut logger);

        claim_eq!(result, Err(CustomContractError::InsufficientBalance));
        claim_eq!(logger.logs.len(), 0);
    }

    #[concordium_test]
    fn test_approve_and_transfer_from() {
        let mut host = default_host();
        let mut logger = TestLogger::init();

        let parameter_bytes = to_bytes(&ApproveParams {
            spender: USER_1,
            amount: amount(300),
        });
        let ctx = receive_ctx(OWNER_ADDR, &parameter_bytes);
        claim_eq!(contract_approve(&ctx, &mut host, &mut logger), Ok(()));
        claim_eq!(
            logger.logs[0],
            to_bytes(&LedgerEvent::approval(OWNER_ADDR, USER_1, amount(300)))
        );

        let parameter_bytes = to_bytes(&TransferFromParams {
            from: OWNER_ADDR,
            to: USER_2,
            amount: amount(200),
        });
        let ctx = receive_ctx(USER_1, &parameter_bytes);
        claim_eq!(
            contract_transfer_from(&ctx, &mut host, &mut logger),
            Ok(())
        );
        claim_eq!(host.state().allowance(&OWNER_ADDR, &USER_1), amount(100));
        claim_eq!(host.state().balance_of(&USER_2), amount(200));

        // The remaining allowance does not cover another 200.
        claim_eq!(
            contract_transfer_from(&ctx, &mut host, &mut logger),
            Err(CustomContractError::AllowanceExceeded)
        );
        claim_eq!(host.state().balance_of(&USER_2), amount(200));
    }

    #[concordium_test]
    fn test_lock_by_engine() {
        let mut host = default_host();
        host.state_mut()
            .approve(OWNER_ADDR, Address::Contract(ENGINE), amount(1000));

        let parameter_bytes = to_bytes(&LockParams {
            owner: OWNER_ADDR,
            amount: amount(1000),
        });
        let ctx = receive_ctx(Address::Contract(ENGINE), &parameter_bytes);
        let mut logger = TestLogger::init();

        claim_eq!(contract_lock(&ctx, &mut host, &mut logger), Ok(()));
        claim_eq!(host.state().balance_of(&OWNER_ADDR), amount(1048));
        claim_eq!(host.state().locked_balance_of(&OWNER_ADDR), amount(1000));
        claim_eq!(
            host.state()
                .allowance(&OWNER_ADDR, &Address::Contract(ENGINE)),
            amount(0)
        );
        claim_eq!(
            logger.logs,
            vec![to_bytes(&LedgerEvent::lock(OWNER_ADDR, amount(1000)))]
        );
    }

    #[concordium_test]
    fn test_lock_unlock_reject_other_senders() {
        let mut host = default_host();
        host.state_mut()
            .approve(OWNER_ADDR, USER_1, amount(1000));
        let mut logger = TestLogger::init();

        let parameter_bytes = to_bytes(&LockParams {
            owner: OWNER_ADDR,
            amount: amount(10),
        });
        let ctx = receive_ctx(USER_1, &parameter_bytes);
        claim_eq!(
            contract_lock(&ctx, &mut host, &mut logger),
            Err(CustomContractError::Unauthorized)
        );

        let other_contract = Address::Contract(ContractAddress {
            index: 9,
            subindex: 0,
        });
        let parameter_bytes = to_bytes(&UnlockParams {
            from: OWNER_ADDR,
            to: USER_1,
            amount: amount(10),
        });
        let ctx = receive_ctx(other_contract, &parameter_bytes);
        claim_eq!(
            contract_unlock(&ctx, &mut host, &mut logger),
            Err(CustomContractError::Unauthorized)
        );

        claim_eq!(host.state().balance_of(&OWNER_ADDR), amount(TOTAL_SUPPLY));
        claim_eq!(logger.logs.len(), 0);
    }

    #[concordium_test]
    fn test_unlock_to_winner() {
        let mut host = default_host();
        host.state_mut()
            .approve(OWNER_ADDR, Address::Contract(ENGINE), amount(100));
        claim_eq!(host.state_mut().lock(&OWNER_ADDR, amount(100)), Ok(()));

        let parameter_bytes = to_bytes(&UnlockParams {
            from: OWNER_ADDR,
            to: USER_1,
            amount: amount(60),
        });
        let ctx = receive_ctx(Address::Contract(ENGINE), &parameter_bytes);
        let mut logger = TestLogger::init();

        claim_eq!(contract_unlock(&ctx, &mut host, &mut logger), Ok(()));
        claim_eq!(host.state().locked_balance_of(&OWNER_ADDR), amount(40));
        claim_eq!(host.state().balance_of(&USER_1), amount(60));
        claim_eq!(
            logger.logs,
            vec![
                to_bytes(&LedgerEvent::unlock(OWNER_ADDR, USER_1, amount(60))),
                to_bytes(&transfer_event(OWNER_ADDR, USER_1, amount(60))),
            ]
        );

        let parameter_bytes = to_bytes(&UnlockParams {
            from: OWNER_ADDR,
            to: OWNER_ADDR,
            amount: amount(41),
        });
        let ctx = receive_ctx(Address::Contract(ENGINE), &parameter_bytes);
        claim_eq!(
            contract_unlock(&ctx, &mut host, &mut logger),
            Err(CustomContractError::InsufficientBalance)
        );
    }

    #[concordium_test]
    fn test_views() {
        let host = default_host();
        let parameter_bytes = to_bytes(&OWNER_ADDR);
        let ctx = receive_ctx(USER_1, &parameter_bytes);

        claim_eq!(
            contract_balance_of(&ctx, &host),
            Ok(amount(TOTAL_SUPPLY))
        );
        claim_eq!(contract_locked_balance_of(&ctx, &host), Ok(amount(0)));
        claim_eq!(contract_total_supply(&ctx, &host), Ok(amount(TOTAL_SUPPLY)));
        claim_eq!(contract_name(&ctx, &host), Ok(String::from("DutchToken")));
        claim_eq!(contract_symbol(&ctx, &host), Ok(String::from("DUT")));
        claim_eq!(contract_auction_engine(&ctx, &host), Ok(ENGINE));

        let parameter_bytes = to_bytes(&AllowanceParams {
            owner: OWNER_ADDR,
            spender: Address::Contract(ENGINE),
        });
        let ctx = receive_ctx(USER_1, &parameter_bytes);
        claim_eq!(contract_allowance(&ctx, &host), Ok(amount(0)));
    }

    #[concordium_test]
    fn test_destroyed_after_lifetime() {
        let mut host = default_host();
        let mut logger = TestLogger::init();

        let parameter_bytes = to_bytes(&OWNER_ADDR);
        let mut ctx = receive_ctx(USER_1, &parameter_bytes);
        ctx.set_metadata_slot_time(after_lifetime());
        claim_eq!(
            contract_balance_of(&ctx, &host),
            Err(CustomContractError::LedgerDestroyed)
        );
        claim_eq!(
            contract_total_supply(&ctx, &host),
            Err(CustomContractError::LedgerDestroyed)
        );

        let parameter_bytes = to_bytes(&TransferParams {
            to: USER_1,
            amount: amount(1),
        });
        let mut ctx = receive_ctx(OWNER_ADDR, &parameter_bytes);
        ctx.set_metadata_slot_time(after_lifetime());
        claim_eq!(
            contract_transfer(&ctx, &mut host, &mut logger),
            Err(CustomContractError::LedgerDestroyed)
        );
        claim_eq!(host.state().balance_of(&OWNER_ADDR), amount(TOTAL_SUPPLY));
    }
}
