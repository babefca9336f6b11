//! Mocked ledger entrypoints for unit tests of contracts that call the ledger.
//!
//! Compiled with the `std` feature so the tests of dependent crates can use
//! them.

#[cfg(feature = "std")]
pub use inner::*;

#[cfg(feature = "std")]
mod inner {
    use concordium_std::test_infrastructure::MockFn;
    use concordium_std::*;

    /// Decode the raw call parameter, trapping like the ledger would on
    /// malformed input.
    fn read_param<D: Deserial>(raw: impl AsRef<[u8]>) -> Option<D> {
        D::deserial(&mut Cursor::new(raw)).ok()
    }

    /// Ledger entrypoint that answers `answer` when the parameter of type `D`
    /// satisfies `accepts`, and traps otherwise.
    pub fn parse_and_check_mock<D: Deserial, S>(
        accepts: impl Fn(&D) -> bool + 'static,
        answer: impl Clone + Serial + 'static,
    ) -> MockFn<S> {
        MockFn::new(move |raw, _amount, _balance, _state| {
            let param = read_param::<D>(raw).ok_or(CallContractError::Trap)?;
            if accepts(&param) {
                Ok((false, Some(answer.clone())))
            } else {
                Err(CallContractError::Trap)
            }
        })
    }

    /// Ledger entrypoint that answers `answer` to any well-formed `D`.
    pub fn parse_and_ok_mock<D: Deserial, S>(
        answer: impl Clone + Serial + 'static,
    ) -> MockFn<S> {
        parse_and_check_mock::<D, S>(|_| true, answer)
    }

    /// Ledger entrypoint that refuses every call.
    pub fn trap_mock<S>() -> MockFn<S> {
        MockFn::new(|_raw, _amount, _balance, _state| {
            Err::<(bool, Option<()>), _>(CallContractError::Trap)
        })
    }
}
