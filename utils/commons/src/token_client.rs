use super::*;

/// Calls from the auction engine into the `DutchToken` ledger.
pub trait HostDutchTokenExt<S>: HasHost<S> {
    /// Query how many of `owner`'s tokens `spender` may move.
    fn dut_allowance(
        &self,
        token: &ContractAddress,
        owner: Address,
        spender: Address,
    ) -> Result<ContractTokenAmount, ContractReadError<Self::ReturnValueType>> {
        let mut result = self
            .invoke_contract_read_only(
                token,
                &AllowanceParams { owner, spender },
                EntrypointName::new_unchecked("allowance"),
                Amount::zero(),
            )
            .map_err(ContractReadError::Call)?
            .ok_or(ContractReadError::Compatibility)?;

        ContractTokenAmount::deserial(&mut result).map_err(|_| ContractReadError::Parse)
    }

    /// Query the escrowed balance of `address`.
    fn dut_locked_balance_of(
        &self,
        token: &ContractAddress,
        address: Address,
    ) -> Result<ContractTokenAmount, ContractReadError<Self::ReturnValueType>> {
        let mut result = self
            .invoke_contract_read_only(
                token,
                &address,
                EntrypointName::new_unchecked("lockedBalanceOf"),
                Amount::zero(),
            )
            .map_err(ContractReadError::Call)?
            .ok_or(ContractReadError::Compatibility)?;

        ContractTokenAmount::deserial(&mut result).map_err(|_| ContractReadError::Parse)
    }

    /// Move `amount` of `owner`'s tokens into escrow.
    fn dut_lock(
        &mut self,
        token: &ContractAddress,
        owner: Address,
        amount: ContractTokenAmount,
    ) -> Result<(), CallContractError<Self::ReturnValueType>> {
        self.invoke_contract(
            token,
            &LockParams { owner, amount },
            EntrypointName::new_unchecked("lock"),
            Amount::zero(),
        )?;
        Ok(())
    }

    /// Release `amount` of `from`'s escrow into `to`'s unlocked balance.
    fn dut_unlock(
        &mut self,
        token: &ContractAddress,
        from: Address,
        to: Address,
        amount: ContractTokenAmount,
    ) -> Result<(), CallContractError<Self::ReturnValueType>> {
        self.invoke_contract(
            token,
            &UnlockParams { from, to, amount },
            EntrypointName::new_unchecked("unlock"),
            Amount::zero(),
        )?;
        Ok(())
    }
}

impl<S, H: HasHost<S>> HostDutchTokenExt<S> for H {}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use crate::test::*;
    use concordium_std::test_infrastructure::*;

    const TOKEN: ContractAddress = ContractAddress {
        index: 1,
        subindex: 0,
    };
    const ENGINE: Address = Address::Contract(ContractAddress {
        index: 2,
        subindex: 0,
    });
    const SELLER: Address = Address::Account(AccountAddress([1; 32]));

    #[concordium_test]
    fn test_allowance() {
        let mut host = TestHost::new((), TestStateBuilder::new());
        host.setup_mock_entrypoint(
            TOKEN,
            OwnedEntrypointName::new_unchecked("allowance".into()),
            parse_and_check_mock::<AllowanceParams, _>(
                |params| params.owner == SELLER && params.spender == ENGINE,
                ContractTokenAmount::from(40),
            ),
        );

        claim_eq!(
            host.dut_allowance(&TOKEN, SELLER, ENGINE)
                .map_err(CustomContractError::from),
            Ok(ContractTokenAmount::from(40))
        );
    }

    #[concordium_test]
    fn test_locked_balance_of() {
        let mut host = TestHost::new((), TestStateBuilder::new());
        host.setup_mock_entrypoint(
            TOKEN,
            OwnedEntrypointName::new_unchecked("lockedBalanceOf".into()),
            parse_and_ok_mock::<Address, _>(ContractTokenAmount::from(100)),
        );

        claim_eq!(
            host.dut_locked_balance_of(&TOKEN, SELLER)
                .map_err(CustomContractError::from),
            Ok(ContractTokenAmount::from(100))
        );
    }

    #[concordium_test]
    fn test_malformed_answer_is_incompatible() {
        let mut host = TestHost::new((), TestStateBuilder::new());
        host.setup_mock_entrypoint(
            TOKEN,
            OwnedEntrypointName::new_unchecked("lockedBalanceOf".into()),
            parse_and_ok_mock::<Address, _>(()),
        );

        // The mocked ledger answers with an empty return value.
        claim_eq!(
            host.dut_locked_balance_of(&TOKEN, SELLER)
                .map_err(CustomContractError::from),
            Err(CustomContractError::Incompatible)
        );
    }

    #[concordium_test]
    fn test_lock_rejected() {
        let mut host = TestHost::new((), TestStateBuilder::new());
        host.setup_mock_entrypoint(
            TOKEN,
            OwnedEntrypointName::new_unchecked("lock".into()),
            trap_mock(),
        );

        claim!(host
            .dut_lock(&TOKEN, SELLER, ContractTokenAmount::from(1))
            .is_err());
    }
}
