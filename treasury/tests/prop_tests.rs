use proptest::prelude::*;

use concord_governance::Warrant;
use concord_nullables::NullLedger;
use concord_treasury::{ActionStatus, TreasuryManager};
use concord_types::{Amount, FundTransfer, Principal, RiskTier, Timestamp, TreasuryParams};

fn params() -> TreasuryParams {
    TreasuryParams {
        direct_ceiling: Amount::new(100),
        elevated_ceiling: Amount::new(1_000),
        min_reserve: Amount::new(300),
    }
}

#[derive(Clone, Debug)]
enum Step {
    Direct(u128),
    Governed(u128, bool),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (1u128..200).prop_map(Step::Direct),
        (1u128..3_000, any::<bool>()).prop_map(|(a, s)| Step::Governed(a, s)),
    ]
}

proptest! {
    /// Funds are only moved, never created, and direct payouts never take
    /// the treasury below its reserve.
    #[test]
    fn payouts_conserve_funds_and_reserve(
        initial in 0u128..5_000,
        steps in prop::collection::vec(step(), 1..30),
    ) {
        let clerk = Principal::new("clerk");
        let vendor = Principal::new("vendor");
        let mut treasury = TreasuryManager::new(params(), [clerk.clone()]).unwrap();
        let mut ledger = NullLedger::with_balances([(Principal::treasury(), Amount::new(initial))]);

        for (i, step) in steps.into_iter().enumerate() {
            let now = Timestamp::new(i as u64);
            match step {
                Step::Direct(amount) => {
                    let id = treasury
                        .propose_disbursement(&clerk, Amount::new(amount), &vendor, now)
                        .unwrap();
                    let before = ledger.balance(&Principal::treasury());
                    if treasury.execute_direct(id, &clerk, now, &mut ledger).is_ok() {
                        prop_assert!(amount <= 100);
                        prop_assert!(ledger.balance(&Principal::treasury()) >= params().min_reserve);
                        prop_assert_eq!(before.raw() - amount, ledger.balance(&Principal::treasury()).raw());
                    }
                }
                Step::Governed(amount, supermajority) => {
                    let id = treasury
                        .propose_disbursement(&clerk, Amount::new(amount), &vendor, now)
                        .unwrap();
                    let tier = treasury.action(id).unwrap().tier;
                    let warrant = Warrant::for_tests(i as u64, supermajority);
                    let result = treasury.execute_governed(&warrant, id, tier, now, &mut ledger);
                    if tier == RiskTier::Critical && !supermajority {
                        prop_assert!(result.is_err());
                    }
                    if result.is_ok() {
                        prop_assert_eq!(treasury.action(id).unwrap().status, ActionStatus::Executed);
                    }
                }
            }
            prop_assert_eq!(ledger.total_supply(), Amount::new(initial));
        }
    }
}
