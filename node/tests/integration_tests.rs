//! End-to-end scenarios through the node:
//! governance approval → dispatch → oracle rounds → reward claims → treasury.
//!
//! These tests drive every component the way a host would, through the
//! node's entry points only, over a nullable clock and ledger.

use concord_governance::{Action, Governed, ProposalStatus};
use concord_node::{parse_script, CallOutcome, ConcordNode, NodeConfig, NodeError};
use concord_nullables::{NullClock, NullLedger, NullStore};
use concord_oracle::{DeactivationReason, FailureReason, FinalizeOutcome, OperatorStatus};
use concord_treasury::ActionStatus;
use concord_types::{
    Amount, ContributionReport, CurveKind, ErrorKind, GovernanceParams, Oracle, OracleParams,
    Principal, RewardCurve, RiskTier, RoundId, Timestamp, TreasuryParams,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const STAKE: u128 = 1_000;
const TIMELOCK: u64 = 100;

type Node = ConcordNode<NullClock, NullLedger>;

fn signer(n: u8) -> Principal {
    Principal::new(format!("signer-{n}"))
}

fn op(n: u8) -> Principal {
    Principal::new(format!("op-{n}"))
}

fn config() -> NodeConfig {
    NodeConfig {
        genesis_signers: (1..=5).map(signer).collect(),
        direct_signers: vec![Principal::new("dave")],
        governance: GovernanceParams {
            threshold: 3,
            supermajority: 4,
            timelock: TIMELOCK,
            proposal_ttl: 1_000,
            cancel_quorum: 2,
            proposer_may_cancel: true,
            max_pause_duration: 500,
        },
        oracle: OracleParams {
            min_stake: Amount::new(STAKE),
            commit_duration: 10,
            reveal_duration: 10,
            min_reveals: 1,
            no_reveal_penalty: Amount::new(200),
            ..OracleParams::default()
        },
        reward_curve: RewardCurve {
            kind: CurveKind::Linear,
            per_point: Amount::new(1),
            cap_per_contributor: Amount::new(100),
            round_budget: Amount::new(100),
        },
        treasury: TreasuryParams {
            direct_ceiling: Amount::new(1_000),
            elevated_ceiling: Amount::new(10_000),
            min_reserve: Amount::new(500),
        },
        ..NodeConfig::default()
    }
}

fn funded_ledger() -> NullLedger {
    let mut ledger =
        NullLedger::with_balances((1..=6).map(|n| (op(n), Amount::new(10 * STAKE))));
    ledger.credit(&Principal::reward_pool(), Amount::new(10_000));
    ledger.credit(&Principal::new("donor"), Amount::new(50_000));
    ledger
}

fn node() -> (Node, NullClock) {
    let clock = NullClock::new(0);
    let node = ConcordNode::new(&config(), clock.clone(), funded_ledger()).unwrap();
    (node, clock)
}

/// Propose, collect signatures up to `signatures`, wait out the timelock and
/// execute.
fn pass(node: &mut Node, clock: &NullClock, action: Action, signatures: u8) -> u64 {
    let id = node.propose(action, &signer(1)).unwrap();
    for n in 2..=signatures {
        node.sign(id, &signer(n)).unwrap();
    }
    clock.advance(TIMELOCK);
    node.execute(id).unwrap();
    id
}

fn admit(node: &mut Node, clock: &NullClock, operators: u8) {
    for n in 1..=operators {
        node.apply_as_operator(&op(n), Amount::new(STAKE)).unwrap();
        pass(node, clock, Action::ApproveOperator { operator: op(n) }, 3);
    }
}

fn value_a() -> ContributionReport {
    ContributionReport::new().with("alice", 10).with("bob", 5)
}

fn value_b() -> ContributionReport {
    ContributionReport::new().with("alice", 99)
}

fn salt(n: u8) -> Vec<u8> {
    format!("salt-{n}").into_bytes()
}

/// Open `round`, commit every `(operator, value)`, then reveal those listed
/// in `revealers`. Leaves the clock inside the reveal window.
fn run_round(
    node: &mut Node,
    clock: &NullClock,
    round: &RoundId,
    commits: &[(u8, ContributionReport)],
    revealers: &[u8],
) {
    node.open_round(round.clone(), &op(1)).unwrap();
    clock.advance(1);
    for (n, value) in commits {
        let digest = node.commitment_for(round, &op(*n), &salt(*n), value);
        node.commit(round, &op(*n), digest).unwrap();
    }
    clock.advance(10);
    for (n, value) in commits {
        if revealers.contains(n) {
            node.reveal(round, &op(*n), &salt(*n), value.clone()).unwrap();
        }
    }
}

// ---------------------------------------------------------------------------
// 1. Governance timelock
// ---------------------------------------------------------------------------

#[test]
fn three_of_five_waits_out_the_timelock() {
    let (mut node, clock) = node();
    let action = Action::AddDirectSigner {
        signer: Principal::new("erin"),
    };
    let id = node.propose(action, &signer(1)).unwrap();
    assert_eq!(node.sign(id, &signer(2)).unwrap(), ProposalStatus::Pending);
    assert_eq!(node.sign(id, &signer(3)).unwrap(), ProposalStatus::Approved);

    clock.set(50);
    let err = node.execute(id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TimelockActive);
    assert!(!node.treasury().is_direct_signer(&Principal::new("erin")));

    clock.set(101);
    node.execute(id).unwrap();
    assert!(node.treasury().is_direct_signer(&Principal::new("erin")));
    assert_eq!(
        node.governance().proposal(id).unwrap().status,
        ProposalStatus::Executed
    );
}

#[test]
fn failed_dispatch_leaves_proposal_approved() {
    let (mut node, clock) = node();
    let id = node
        .propose(
            Action::Disburse {
                action_id: 42,
                tier: RiskTier::Elevated,
            },
            &signer(1),
        )
        .unwrap();
    node.sign(id, &signer(2)).unwrap();
    node.sign(id, &signer(3)).unwrap();
    clock.advance(TIMELOCK);

    let err = node.execute(id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(
        node.governance().proposal(id).unwrap().status,
        ProposalStatus::Approved
    );
}

#[test]
fn insecure_curve_change_is_refused() {
    let (mut node, clock) = node();
    let generous = RewardCurve {
        round_budget: Amount::new(10_000),
        ..config().reward_curve
    };
    let id = node
        .propose(Action::SetRewardCurve { curve: generous }, &signer(1))
        .unwrap();
    node.sign(id, &signer(2)).unwrap();
    node.sign(id, &signer(3)).unwrap();
    clock.advance(TIMELOCK);

    let err = node.execute(id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    assert_eq!(node.rewards().curve(), &config().reward_curve);
}

// ---------------------------------------------------------------------------
// 2. Oracle rounds through the node
// ---------------------------------------------------------------------------

#[test]
fn disagreement_finalizes_majority_and_pays_contributors() {
    let (mut node, clock) = node();
    admit(&mut node, &clock, 4);
    let round = RoundId::new("commits", 1);
    let commits = [
        (1, value_a()),
        (2, value_a()),
        (3, value_a()),
        (4, value_b()),
    ];
    run_round(&mut node, &clock, &round, &commits, &[1, 2, 3, 4]);

    clock.advance(10);
    assert_eq!(
        node.finalize(&round).unwrap(),
        FinalizeOutcome::Finalized { seq: 1 }
    );
    let record = node.oracle().consensus(1).unwrap();
    assert_eq!(record.value, value_a());
    assert_eq!(node.oracle().operator(&op(1)).unwrap().reliability_bps, 8_200);
    assert_eq!(node.oracle().operator(&op(4)).unwrap().reliability_bps, 7_200);
    assert_eq!(node.oracle().operator(&op(4)).unwrap().stake, Amount::new(STAKE));
    assert_eq!(node.treasury_balance(), Amount::ZERO);

    let alice = Principal::new("alice");
    assert_eq!(node.pending_reward(&alice), Amount::new(10));
    let receipt = node.claim(&alice).unwrap();
    assert_eq!(receipt.amount, Amount::new(10));
    assert_eq!(node.balance(&alice), Amount::new(10));
    assert_eq!(node.claim(&alice).unwrap_err().kind(), ErrorKind::NothingToClaim);

    let bob = Principal::new("bob");
    assert_eq!(node.claim(&bob).unwrap().amount, Amount::new(5));
}

#[test]
fn missing_reveal_is_slashed_into_the_treasury() {
    let (mut node, clock) = node();
    admit(&mut node, &clock, 4);
    let round = RoundId::new("commits", 1);
    let commits = [
        (1, value_a()),
        (2, value_a()),
        (3, value_a()),
        (4, value_a()),
    ];
    run_round(&mut node, &clock, &round, &commits, &[1, 2, 3]);

    clock.advance(10);
    assert_eq!(
        node.finalize(&round).unwrap(),
        FinalizeOutcome::Finalized { seq: 1 }
    );
    let slashed = node.oracle().operator(&op(4)).unwrap();
    assert_eq!(slashed.stake, Amount::new(800));
    assert_eq!(slashed.reliability_bps, 5_600);
    assert_eq!(
        slashed.status,
        OperatorStatus::Inactive(DeactivationReason::InsufficientStake)
    );
    assert_eq!(node.treasury_balance(), Amount::new(200));
    assert_eq!(
        node.balance(&Principal::oracle_escrow()),
        Amount::new(3 * STAKE + 800)
    );

    // Topping up does not reactivate; governance must re-approve.
    node.add_stake(&op(4), Amount::new(200)).unwrap();
    assert!(!node.oracle().operator(&op(4)).unwrap().is_active());
    pass(&mut node, &clock, Action::ApproveOperator { operator: op(4) }, 3);
    assert!(node.oracle().operator(&op(4)).unwrap().is_active());
}

#[test]
fn round_without_quorum_fails_without_slashing() {
    let (mut node, clock) = node();
    admit(&mut node, &clock, 4);
    let round = RoundId::new("commits", 1);
    let commits = [
        (1, value_a()),
        (2, value_a()),
        (3, value_a()),
        (4, value_a()),
    ];
    run_round(&mut node, &clock, &round, &commits, &[1]);

    clock.advance(10);
    let outcome = node.finalize(&round).unwrap();
    assert!(matches!(
        outcome,
        FinalizeOutcome::Failed(FailureReason::QuorumNotMet { reveals: 1, .. })
    ));
    assert_eq!(node.oracle().latest_seq(), 0);
    assert_eq!(node.treasury_balance(), Amount::ZERO);
    assert_eq!(node.oracle().operator(&op(4)).unwrap().stake, Amount::new(STAKE));
}

// ---------------------------------------------------------------------------
// 3. Emergency pause
// ---------------------------------------------------------------------------

#[test]
fn emergency_pause_blocks_claims_until_it_lapses() {
    let (mut node, clock) = node();
    admit(&mut node, &clock, 3);
    let round = RoundId::new("commits", 1);
    let commits = [(1, value_a()), (2, value_a()), (3, value_a())];
    run_round(&mut node, &clock, &round, &commits, &[1, 2, 3]);
    clock.advance(10);
    node.finalize(&round).unwrap();

    // Threshold signatures are not enough for a pause.
    let id = node
        .propose(Action::EmergencyPause { duration: 50 }, &signer(1))
        .unwrap();
    node.sign(id, &signer(2)).unwrap();
    assert_eq!(node.sign(id, &signer(3)).unwrap(), ProposalStatus::Pending);
    assert_eq!(node.sign(id, &signer(4)).unwrap(), ProposalStatus::Approved);
    clock.advance(TIMELOCK);
    node.execute(id).unwrap();

    let alice = Principal::new("alice");
    let err = node.claim(&alice).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert_eq!(node.balance(&alice), Amount::ZERO);
    let err = node
        .open_round(RoundId::new("commits", 2), &op(1))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    clock.advance(50);
    assert_eq!(node.claim(&alice).unwrap().amount, Amount::new(10));
}

#[test]
fn lift_pause_reopens_claims_early() {
    let (mut node, clock) = node();
    pass(&mut node, &clock, Action::EmergencyPause { duration: 500 }, 4);
    assert!(node.rewards().is_paused(Timestamp::new(100)));
    assert!(node.oracle().is_paused(Timestamp::new(599)));
    pass(&mut node, &clock, Action::LiftPause, 3);
    assert!(node.rewards().paused_until().is_none());
    assert!(node.treasury().paused_until().is_none());
    assert!(node.oracle().paused_until().is_none());
}

// ---------------------------------------------------------------------------
// 4. Treasury tiers
// ---------------------------------------------------------------------------

#[test]
fn disbursement_tiers_route_to_the_right_authority() {
    let (mut node, clock) = node();
    let donor = Principal::new("donor");
    let grantee = Principal::new("grantee");
    node.deposit(&donor, Amount::new(20_000)).unwrap();

    let small = node
        .propose_disbursement(&signer(1), Amount::new(900), &grantee)
        .unwrap();
    node.execute_direct(small, &Principal::new("dave")).unwrap();
    assert_eq!(node.balance(&grantee), Amount::new(900));

    let elevated = node
        .propose_disbursement(&signer(1), Amount::new(5_000), &grantee)
        .unwrap();
    let err = node
        .execute_direct(elevated, &Principal::new("dave"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TierExceedsDirectAuthority);
    pass(
        &mut node,
        &clock,
        Action::Disburse {
            action_id: elevated,
            tier: RiskTier::Elevated,
        },
        3,
    );
    assert_eq!(node.balance(&grantee), Amount::new(5_900));

    let critical = node
        .propose_disbursement(&signer(1), Amount::new(12_000), &grantee)
        .unwrap();
    pass(
        &mut node,
        &clock,
        Action::Disburse {
            action_id: critical,
            tier: RiskTier::Critical,
        },
        4,
    );
    assert_eq!(node.balance(&grantee), Amount::new(17_900));
    assert_eq!(node.treasury_balance(), Amount::new(2_100));
    assert!(node
        .treasury()
        .actions()
        .all(|a| a.status == ActionStatus::Executed));
}

#[test]
fn emptying_the_treasury_needs_a_supermajority() {
    let (mut node, clock) = node();
    let mallory = Principal::new("mallory");
    node.deposit(&Principal::new("donor"), Amount::new(50_000))
        .unwrap();
    let id = node
        .propose_disbursement(&signer(1), Amount::new(50_000), &mallory)
        .unwrap();

    let err = node.execute_direct(id, &Principal::new("dave")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TierExceedsDirectAuthority);
    assert_eq!(node.treasury_balance(), Amount::new(50_000));

    let proposal = node
        .propose(
            Action::Disburse {
                action_id: id,
                tier: RiskTier::Critical,
            },
            &signer(1),
        )
        .unwrap();
    for n in 2..=3 {
        node.sign(proposal, &signer(n)).unwrap();
    }
    clock.advance(TIMELOCK);
    let err = node.execute(proposal).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert_eq!(node.balance(&mallory), Amount::ZERO);

    node.sign(proposal, &signer(4)).unwrap();
    node.execute(proposal).unwrap();
    assert_eq!(node.balance(&mallory), Amount::new(50_000));
    assert_eq!(node.treasury_balance(), Amount::ZERO);
}

#[test]
fn governed_disbursement_runs_while_paused() {
    let (mut node, clock) = node();
    node.deposit(&Principal::new("donor"), Amount::new(5_000))
        .unwrap();
    let id = node
        .propose_disbursement(&signer(1), Amount::new(300), &Principal::new("grantee"))
        .unwrap();
    pass(&mut node, &clock, Action::EmergencyPause { duration: 500 }, 4);

    let err = node.execute_direct(id, &Principal::new("dave")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    pass(
        &mut node,
        &clock,
        Action::Disburse {
            action_id: id,
            tier: RiskTier::Direct,
        },
        3,
    );
    assert_eq!(node.balance(&Principal::new("grantee")), Amount::new(300));
}

// ---------------------------------------------------------------------------
// 5. Persistence and configuration
// ---------------------------------------------------------------------------

#[test]
fn round_resumes_after_a_store_round_trip() {
    let (mut node, clock) = node();
    admit(&mut node, &clock, 3);
    let round = RoundId::new("commits", 1);
    let commits = [(1, value_a()), (2, value_a()), (3, value_a())];
    run_round(&mut node, &clock, &round, &commits, &[1, 2]);

    let store = NullStore::new();
    node.save_to_store(&store).unwrap();
    let mut restored =
        ConcordNode::load_from_store(&store, &config(), clock.clone(), node.ledger().clone())
            .unwrap();

    restored
        .reveal(&round, &op(3), &salt(3), value_a())
        .unwrap();
    clock.advance(10);
    assert_eq!(
        restored.finalize(&round).unwrap(),
        FinalizeOutcome::Finalized { seq: 1 }
    );
    assert_eq!(
        restored.claim(&Principal::new("bob")).unwrap().amount,
        Amount::new(5)
    );
}

#[test]
fn config_file_builds_a_node() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("concord.toml");
    std::fs::write(&path, config().to_toml_string().unwrap()).unwrap();

    let loaded = NodeConfig::from_toml_file(&path).unwrap();
    assert_eq!(loaded, config());
    let node = ConcordNode::new(&loaded, NullClock::new(0), NullLedger::new()).unwrap();
    assert_eq!(node.governance().signers().len(), 5);
    assert!(node.treasury().is_direct_signer(&Principal::new("dave")));
}

#[test]
fn malformed_config_file_is_a_config_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("concord.toml");
    std::fs::write(&path, "genesis_signers = 7").unwrap();
    assert!(matches!(
        NodeConfig::from_toml_file(&path),
        Err(NodeError::Config(_))
    ));
}

// ---------------------------------------------------------------------------
// 6. Script replay
// ---------------------------------------------------------------------------

#[test]
fn scripted_calls_replay_deterministically() {
    let script = r#"[
        { "at": 0, "call": "apply_as_operator", "candidate": "op-1", "stake": 1000 },
        { "at": 1, "call": "propose", "proposer": "signer-1",
          "action": { "approve_operator": { "operator": "op-1" } } },
        { "at": 2, "call": "sign", "id": 1, "signer": "signer-2" },
        { "at": 3, "call": "sign", "id": 1, "signer": "signer-3" },
        { "at": 101, "call": "execute", "id": 1 },
        { "at": 110, "call": "open_round", "opener": "op-1",
          "round": { "subject": "commits", "epoch": 1 } },
        { "at": 111, "call": "commit", "operator": "op-1", "salt": "s",
          "round": { "subject": "commits", "epoch": 1 }, "value": { "alice": 7 } },
        { "at": 121, "call": "reveal", "operator": "op-1", "salt": "s",
          "round": { "subject": "commits", "epoch": 1 }, "value": { "alice": 7 } },
        { "at": 130, "call": "finalize", "round": { "subject": "commits", "epoch": 1 } },
        { "at": 131, "call": "claim", "contributor": "alice" }
    ]"#;

    let run = || {
        let (mut node, clock) = node();
        let mut outcomes = Vec::new();
        for step in parse_script(script).unwrap() {
            clock.set(step.at);
            outcomes.push(node.apply(&step.call).map_err(|e| e.kind()));
        }
        outcomes
    };

    let outcomes = run();
    assert!(outcomes.iter().all(Result::is_ok), "{outcomes:?}");
    assert_eq!(outcomes[8], Ok(CallOutcome::Finalized { seq: 1 }));
    assert_eq!(
        outcomes[9],
        Ok(CallOutcome::Paid {
            amount: Amount::new(7),
            records: 1,
            through_seq: 1,
        })
    );
    assert_eq!(run(), outcomes);
}
