use super::*;

/// Price parameters of a single auction.
#[derive(Debug, Clone, Copy, Serialize, SchemaType, PartialEq, Eq)]
pub struct PriceCurve {
    /// Unit price at the moment the auction starts.
    pub start_price: Amount,
    /// Lowest unit price the auction can reach.
    pub reserve_price: Amount,
    /// Amount the unit price drops on every decay step.
    pub price_drop_rate: Amount,
}

impl PriceCurve {
    /// A curve is usable when the reserve is positive and not above the start.
    pub fn is_valid(&self) -> bool {
        self.reserve_price > Amount::zero() && self.reserve_price <= self.start_price
    }

    /// Unit price after `elapsed` has passed since the auction start.
    ///
    /// The price is a step function: it drops by `price_drop_rate` every
    /// [`DECAY_STEP_MILLIS`], never goes below the reserve and is pinned to the
    /// reserve once [`MAX_AUCTION_DURATION_MILLIS`] has elapsed.
    pub fn price_at(&self, elapsed: Duration) -> Amount {
        if is_past_max_duration(elapsed) {
            return self.reserve_price;
        }

        let steps = elapsed.millis() / DECAY_STEP_MILLIS;
        let decay = self.price_drop_rate.micro_ccd.saturating_mul(steps);
        let price = self.start_price.micro_ccd.saturating_sub(decay);

        Amount::from_micro_ccd(price.max(self.reserve_price.micro_ccd))
    }
}

/// Whether an auction running for `elapsed` reached its maximum duration.
pub fn is_past_max_duration(elapsed: Duration) -> bool {
    elapsed.millis() >= MAX_AUCTION_DURATION_MILLIS
}

/// Outcome of settling one bidder's commitment.
#[derive(Debug, Clone, Copy, Serialize, SchemaType, PartialEq, Eq)]
pub struct Settlement {
    /// Tokens moved from the seller's escrow to the bidder.
    pub tokens: ContractTokenAmount,
    /// Part of the commitment paid to the seller.
    pub cost: Amount,
    /// Part of the commitment returned to the bidder.
    pub refund: Amount,
}

impl Settlement {
    /// Nothing bought, nothing refunded.
    pub fn empty() -> Self {
        Self {
            tokens: ContractTokenAmount::from(0),
            cost: Amount::zero(),
            refund: Amount::zero(),
        }
    }
}

/// Split `commitment` into bought tokens and a refund at `final_price`, never
/// handing out more than `remaining_supply`.
///
/// `cost + refund == commitment` always holds.
pub fn settle(
    commitment: Amount,
    final_price: Amount,
    remaining_supply: ContractTokenAmount,
) -> ContractResult<Settlement> {
    ensure!(
        final_price > Amount::zero(),
        CustomContractError::InvalidAuctionParams
    );

    let tokens = (commitment.micro_ccd / final_price.micro_ccd).min(remaining_supply.0);
    let cost = tokens
        .checked_mul(final_price.micro_ccd)
        .ok_or(CustomContractError::Overflow)?;
    let refund = commitment
        .micro_ccd
        .checked_sub(cost)
        .ok_or(CustomContractError::Overflow)?;

    Ok(Settlement {
        tokens: ContractTokenAmount::from(tokens),
        cost: Amount::from_micro_ccd(cost),
        refund: Amount::from_micro_ccd(refund),
    })
}

/// Tokens still purchasable at `price` once `total_commitment` is converted
/// into tokens at that price.
pub fn remaining_at_price(
    remaining_supply: ContractTokenAmount,
    total_commitment: Amount,
    price: Amount,
) -> ContractTokenAmount {
    if price == Amount::zero() {
        return remaining_supply;
    }
    let demanded = total_commitment.micro_ccd / price.micro_ccd;
    ContractTokenAmount::from(remaining_supply.0.saturating_sub(demanded))
}

#[concordium_cfg_test]
mod tests {
    use super::*;

    fn curve() -> PriceCurve {
        PriceCurve {
            start_price: Amount::from_micro_ccd(1000),
            reserve_price: Amount::from_micro_ccd(500),
            price_drop_rate: Amount::from_micro_ccd(25),
        }
    }

    fn minutes(m: u64) -> Duration {
        Duration::from_millis(m * DECAY_STEP_MILLIS)
    }

    #[concordium_test]
    fn test_price_is_constant_within_a_step() {
        let curve = curve();

        claim_eq!(curve.price_at(Duration::from_millis(0)), curve.start_price);
        claim_eq!(
            curve.price_at(Duration::from_millis(DECAY_STEP_MILLIS - 1)),
            curve.start_price
        );
        claim_eq!(curve.price_at(minutes(1)), Amount::from_micro_ccd(975));
        claim_eq!(curve.price_at(minutes(4)), Amount::from_micro_ccd(900));
    }

    #[concordium_test]
    fn test_price_stays_within_bounds() {
        let curve = curve();
        let mut previous = curve.start_price;

        // Probe every half step well past the maximum duration.
        for half_steps in 0..60 {
            let elapsed = Duration::from_millis(half_steps * DECAY_STEP_MILLIS / 2);
            let price = curve.price_at(elapsed);
            claim!(price <= curve.start_price);
            claim!(price >= curve.reserve_price);
            claim!(price <= previous, "price must never go up");
            previous = price;
        }
    }

    #[concordium_test]
    fn test_price_pinned_to_reserve_after_max_duration() {
        let steep = PriceCurve {
            price_drop_rate: Amount::from_micro_ccd(1),
            ..curve()
        };

        claim_eq!(steep.price_at(minutes(19)), Amount::from_micro_ccd(981));
        claim_eq!(steep.price_at(minutes(20)), steep.reserve_price);
        claim_eq!(steep.price_at(minutes(500)), steep.reserve_price);
    }

    #[concordium_test]
    fn test_price_drop_does_not_underflow() {
        let curve = PriceCurve {
            price_drop_rate: Amount::from_micro_ccd(u64::MAX),
            ..curve()
        };

        claim_eq!(curve.price_at(minutes(3)), curve.reserve_price);
    }

    #[concordium_test]
    fn test_curve_validation() {
        claim!(curve().is_valid());
        claim!(!PriceCurve {
            reserve_price: Amount::from_micro_ccd(1001),
            ..curve()
        }
        .is_valid());
        claim!(!PriceCurve {
            reserve_price: Amount::zero(),
            ..curve()
        }
        .is_valid());
    }

    #[concordium_test]
    fn test_settle_caps_at_remaining_supply() {
        let settlement = settle(
            Amount::from_micro_ccd(100_000),
            Amount::from_micro_ccd(500),
            ContractTokenAmount::from(100),
        )
        .expect_report("Settlement should succeed");

        claim_eq!(settlement.tokens, ContractTokenAmount::from(100));
        claim_eq!(settlement.cost, Amount::from_micro_ccd(50_000));
        claim_eq!(settlement.refund, Amount::from_micro_ccd(50_000));
    }

    #[concordium_test]
    fn test_settle_rounds_down_and_refunds_the_rest() {
        let settlement = settle(
            Amount::from_micro_ccd(2_300),
            Amount::from_micro_ccd(975),
            ContractTokenAmount::from(100),
        )
        .expect_report("Settlement should succeed");

        claim_eq!(settlement.tokens, ContractTokenAmount::from(2));
        claim_eq!(settlement.cost, Amount::from_micro_ccd(1_950));
        claim_eq!(settlement.refund, Amount::from_micro_ccd(350));
    }

    #[concordium_test]
    fn test_settle_below_price_is_full_refund() {
        let settlement = settle(
            Amount::from_micro_ccd(499),
            Amount::from_micro_ccd(500),
            ContractTokenAmount::from(100),
        )
        .expect_report("Settlement should succeed");

        claim_eq!(settlement.tokens, ContractTokenAmount::from(0));
        claim_eq!(settlement.refund, Amount::from_micro_ccd(499));
    }

    #[concordium_test]
    fn test_sequential_settlements_never_oversell() {
        let price = Amount::from_micro_ccd(500);
        let initial = 100u64;
        let mut remaining = ContractTokenAmount::from(initial);
        let mut sold = 0u64;

        for commitment in [30_000u64, 30_000, 30_000, 1_000] {
            let commitment = Amount::from_micro_ccd(commitment);
            let settlement =
                settle(commitment, price, remaining).expect_report("Settlement should succeed");
            claim_eq!(
                settlement.cost.micro_ccd + settlement.refund.micro_ccd,
                commitment.micro_ccd
            );
            remaining = ContractTokenAmount::from(remaining.0 - settlement.tokens.0);
            sold += settlement.tokens.0;
        }

        claim_eq!(sold, initial);
        claim_eq!(remaining, ContractTokenAmount::from(0));
    }

    #[concordium_test]
    fn test_settle_rejects_zero_price() {
        claim_eq!(
            settle(
                Amount::from_micro_ccd(1),
                Amount::zero(),
                ContractTokenAmount::from(1)
            ),
            Err(CustomContractError::InvalidAuctionParams)
        );
    }

    #[concordium_test]
    fn test_remaining_at_price() {
        let remaining = ContractTokenAmount::from(100);

        claim_eq!(
            remaining_at_price(remaining, Amount::from_micro_ccd(10_000), Amount::from_micro_ccd(500)),
            ContractTokenAmount::from(80)
        );
        claim_eq!(
            remaining_at_price(remaining, Amount::from_micro_ccd(100_000), Amount::from_micro_ccd(500)),
            ContractTokenAmount::from(0)
        );
    }
}
