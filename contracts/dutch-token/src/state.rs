use commons::{ContractResult, ContractTokenAmount, CustomContractError};
use concordium_std::*;

use crate::external::TokenInitParams;

/// The contract state.
#[derive(Serial, DeserialWithState, StateClone)]
#[concordium(state_parameter = "S")]
pub struct State<S: HasStateApi> {
    /// Number of tokens in existence, unlocked and locked together.
    pub total_supply: ContractTokenAmount,
    /// The auction engine allowed to lock and unlock balances.
    pub auction_engine: ContractAddress,
    /// Slot time of the contract initialization.
    pub created_at: Timestamp,
    /// How long the ledger stays usable after `created_at`.
    pub lifetime: Duration,
    /// Freely transferable balances.
    balances: StateMap<Address, ContractTokenAmount, S>,
    /// Balances escrowed by the auction engine.
    locked: StateMap<Address, ContractTokenAmount, S>,
    /// Delegated spending budgets, keyed by `(owner, spender)`.
    allowances: StateMap<(Address, Address), ContractTokenAmount, S>,
}

impl<S: HasStateApi> State<S> {
    /// Creates a new state with the whole supply owned by `origin`.
    pub fn new(
        state_builder: &mut StateBuilder<S>,
        params: TokenInitParams,
        origin: Address,
        slot_time: Timestamp,
    ) -> Self {
        let mut balances = state_builder.new_map();
        if params.total_supply.0 > 0 {
            balances.insert(origin, params.total_supply);
        }

        Self {
            total_supply: params.total_supply,
            auction_engine: params.auction_engine,
            created_at: slot_time,
            lifetime: params.lifetime,
            balances,
            locked: state_builder.new_map(),
            allowances: state_builder.new_map(),
        }
    }

    /// Reject every request once the lifetime has passed.
    pub fn ensure_alive(&self, slot_time: Timestamp) -> ContractResult<()> {
        let alive = slot_time
            .duration_since(self.created_at)
            .map(|elapsed| elapsed <= self.lifetime)
            .unwrap_or(true);
        ensure!(alive, CustomContractError::LedgerDestroyed);
        Ok(())
    }

    pub fn is_auction_engine(&self, address: &Address) -> bool {
        matches!(address, Address::Contract(contract) if *contract == self.auction_engine)
    }

    pub fn balance_of(&self, address: &Address) -> ContractTokenAmount {
        read_amount(&self.balances, address)
    }

    pub fn locked_balance_of(&self, address: &Address) -> ContractTokenAmount {
        read_amount(&self.locked, address)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> ContractTokenAmount {
        self.allowances
            .get(&(*owner, *spender))
            .map(|amount| *amount)
            .unwrap_or_else(|| ContractTokenAmount::from(0))
    }

    /// Overwrite the budget `spender` has on `owner`'s tokens.
    pub fn approve(&mut self, owner: Address, spender: Address, amount: ContractTokenAmount) {
        if amount.0 == 0 {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), amount);
        }
    }

    /// Move unlocked tokens between two addresses.
    pub fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: ContractTokenAmount,
    ) -> ContractResult<()> {
        debit(&mut self.balances, from, amount)?;
        credit(&mut self.balances, to, amount)
    }

    /// Move unlocked tokens on behalf of `from`, spending the allowance it
    /// granted to `spender`. Both budgets are checked before anything moves.
    pub fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: ContractTokenAmount,
    ) -> ContractResult<()> {
        let allowance = self.allowance(from, spender);
        ensure!(
            amount.0 <= allowance.0,
            CustomContractError::AllowanceExceeded
        );
        ensure!(
            amount.0 <= self.balance_of(from).0,
            CustomContractError::InsufficientBalance
        );

        self.approve(*from, *spender, ContractTokenAmount::from(allowance.0 - amount.0));
        self.transfer(from, to, amount)
    }

    /// Escrow `amount` of `owner`'s unlocked tokens, consuming the allowance
    /// granted to the auction engine.
    pub fn lock(&mut self, owner: &Address, amount: ContractTokenAmount) -> ContractResult<()> {
        let engine = Address::Contract(self.auction_engine);
        let allowance = self.allowance(owner, &engine);
        ensure!(
            amount.0 <= allowance.0,
            CustomContractError::AllowanceExceeded
        );
        ensure!(
            amount.0 <= self.balance_of(owner).0,
            CustomContractError::InsufficientBalance
        );

        self.approve(*owner, engine, ContractTokenAmount::from(allowance.0 - amount.0));
        debit(&mut self.balances, owner, amount)?;
        credit(&mut self.locked, owner, amount)
    }

    /// Release `amount` of `from`'s escrow into the unlocked balance of `to`.
    pub fn unlock(
        &mut self,
        from: &Address,
        to: &Address,
        amount: ContractTokenAmount,
    ) -> ContractResult<()> {
        debit(&mut self.locked, from, amount)?;
        credit(&mut self.balances, to, amount)
    }
}

fn read_amount<S: HasStateApi>(
    map: &StateMap<Address, ContractTokenAmount, S>,
    address: &Address,
) -> ContractTokenAmount {
    map.get(address)
        .map(|amount| *amount)
        .unwrap_or_else(|| ContractTokenAmount::from(0))
}

fn debit<S: HasStateApi>(
    map: &mut StateMap<Address, ContractTokenAmount, S>,
    address: &Address,
    amount: ContractTokenAmount,
) -> ContractResult<()> {
    let balance = read_amount(map, address);
    let rest = balance
        .0
        .checked_sub(amount.0)
        .ok_or(CustomContractError::InsufficientBalance)?;

    if rest == 0 {
        map.remove(address);
    } else {
        map.insert(*address, ContractTokenAmount::from(rest));
    }
    Ok(())
}

fn credit<S: HasStateApi>(
    map: &mut StateMap<Address, ContractTokenAmount, S>,
    address: &Address,
    amount: ContractTokenAmount,
) -> ContractResult<()> {
    if amount.0 == 0 {
        return Ok(());
    }
    let balance = read_amount(map, address)
        .0
        .checked_add(amount.0)
        .ok_or(CustomContractError::Overflow)?;
    map.insert(*address, ContractTokenAmount::from(balance));
    Ok(())
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use concordium_std::test_infrastructure::*;

    const OWNER: Address = Address::Account(AccountAddress([1; 32]));
    const USER_1: Address = Address::Account(AccountAddress([16; 32]));
    const USER_2: Address = Address::Account(AccountAddress([17; 32]));
    const ENGINE: ContractAddress = ContractAddress {
        index: 2,
        subindex: 0,
    };

    fn amount(value: u64) -> ContractTokenAmount {
        ContractTokenAmount::from(value)
    }

    fn default_state() -> State<TestStateApi> {
        let mut state_builder = TestStateBuilder::new();
        State::new(
            &mut state_builder,
            TokenInitParams {
                total_supply: amount(2048),
                auction_engine: ENGINE,
                lifetime: Duration::from_days(30),
            },
            OWNER,
            Timestamp::from_timestamp_millis(0),
        )
    }

    fn circulating(state: &State<TestStateApi>, holders: &[Address]) -> u64 {
        holders
            .iter()
            .map(|a| state.balance_of(a).0 + state.locked_balance_of(a).0)
            .sum()
    }

    #[concordium_test]
    fn test_supply_is_conserved_by_every_move() {
        let mut state = default_state();
        let holders = [OWNER, USER_1, USER_2];
        let engine = Address::Contract(ENGINE);

        claim_eq!(circulating(&state, &holders), 2048);

        claim_eq!(state.transfer(&OWNER, &USER_1, amount(1000)), Ok(()));
        claim_eq!(circulating(&state, &holders), 2048);

        state.approve(USER_1, engine, amount(400));
        claim_eq!(state.lock(&USER_1, amount(300)), Ok(()));
        claim_eq!(circulating(&state, &holders), 2048);
        claim_eq!(state.locked_balance_of(&USER_1), amount(300));
        claim_eq!(state.allowance(&USER_1, &engine), amount(100));

        claim_eq!(state.unlock(&USER_1, &USER_2, amount(120)), Ok(()));
        claim_eq!(circulating(&state, &holders), 2048);
        claim_eq!(state.balance_of(&USER_2), amount(120));
        claim_eq!(state.locked_balance_of(&USER_1), amount(180));
    }

    #[concordium_test]
    fn test_failed_transfer_from_changes_nothing() {
        let mut state = default_state();
        state.approve(OWNER, USER_1, amount(10));

        claim_eq!(
            state.transfer_from(&USER_1, &OWNER, &USER_2, amount(11)),
            Err(CustomContractError::AllowanceExceeded)
        );
        claim_eq!(
            state.transfer_from(&USER_2, &USER_1, &OWNER, amount(1)),
            Err(CustomContractError::AllowanceExceeded)
        );

        state.approve(USER_2, USER_1, amount(10));
        claim_eq!(
            state.transfer_from(&USER_1, &USER_2, &OWNER, amount(5)),
            Err(CustomContractError::InsufficientBalance)
        );
        claim_eq!(state.allowance(&USER_2, &USER_1), amount(10));
        claim_eq!(state.balance_of(&OWNER), amount(2048));
    }

    #[concordium_test]
    fn test_transfer_to_self_keeps_balance() {
        let mut state = default_state();

        claim_eq!(state.transfer(&OWNER, &OWNER, amount(2048)), Ok(()));
        claim_eq!(state.balance_of(&OWNER), amount(2048));
    }

    #[concordium_test]
    fn test_lock_requires_allowance_and_balance() {
        let mut state = default_state();
        let engine = Address::Contract(ENGINE);

        claim_eq!(
            state.lock(&OWNER, amount(1)),
            Err(CustomContractError::AllowanceExceeded)
        );

        state.approve(USER_1, engine, amount(50));
        claim_eq!(
            state.lock(&USER_1, amount(50)),
            Err(CustomContractError::InsufficientBalance)
        );
        claim_eq!(state.allowance(&USER_1, &engine), amount(50));
    }

    #[concordium_test]
    fn test_unlock_more_than_locked_fails() {
        let mut state = default_state();
        state.approve(OWNER, Address::Contract(ENGINE), amount(10));
        claim_eq!(state.lock(&OWNER, amount(10)), Ok(()));

        claim_eq!(
            state.unlock(&OWNER, &USER_1, amount(11)),
            Err(CustomContractError::InsufficientBalance)
        );
        claim_eq!(state.locked_balance_of(&OWNER), amount(10));
        claim_eq!(state.balance_of(&USER_1), amount(0));
    }

    #[concordium_test]
    fn test_lifetime_boundary() {
        let state = default_state();
        let limit = Timestamp::from_timestamp_millis(0)
            .checked_add(Duration::from_days(30))
            .expect_report("Timestamp overflow");

        claim_eq!(state.ensure_alive(limit), Ok(()));
        claim_eq!(
            state.ensure_alive(
                limit
                    .checked_add(Duration::from_millis(1))
                    .expect_report("Timestamp overflow")
            ),
            Err(CustomContractError::LedgerDestroyed)
        );
    }

    #[concordium_test]
    fn test_only_the_engine_contract_is_recognized() {
        let state = default_state();

        claim!(state.is_auction_engine(&Address::Contract(ENGINE)));
        claim!(!state.is_auction_engine(&OWNER));
        claim!(!state.is_auction_engine(&Address::Contract(ContractAddress {
            index: 3,
            subindex: 0
        })));
    }
}
