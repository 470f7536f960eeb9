mod helpers;

use helpers::*;
use duel_ledger::config::LedgerConfig;
use duel_ledger::error::LedgerError;
use duel_ledger::models::*;
use duel_ledger::store::DuelStore;
use futures::future::join_all;
use rust_decimal::Decimal;
use uuid::Uuid;

/// End-to-end test: complete flow from duel creation to claimed winnings
#[tokio::test]
async fn test_complete_duel_lifecycle() {
    let t = TestLedger::new();
    let creator = Uuid::new_v4();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let carol = Uuid::new_v4();

    // Step 1: Creator opens the duel
    let duel = t
        .state
        .ledger
        .open_duel(
            creator,
            "Will it rain in Lisbon tomorrow?".to_string(),
            DuelCategory::Weather,
            DuelKind::Public,
            Decimal::new(10, 0),
            future_deadline(3600),
        )
        .await
        .expect("Failed to open duel");

    assert_eq!(duel.status, DuelStatus::Pending);

    let (yes_pct, no_pct) = t.state.ledger.quote(duel.id).await.expect("Failed to quote");
    assert_eq!(yes_pct, Decimal::new(50, 0));
    assert_eq!(no_pct, Decimal::new(50, 0));

    // Step 2: First stake activates the duel
    let outcome = t
        .state
        .ledger
        .place_stake(duel.id, alice, Side::Yes, Decimal::new(10, 0), None)
        .await
        .expect("Failed to place stake");
    assert_eq!(outcome.duel.status, DuelStatus::Active);
    assert_eq!(outcome.yes_pct, Decimal::ONE_HUNDRED);

    // Step 3: Opposing stake moves the odds
    let outcome = t
        .state
        .ledger
        .place_stake(duel.id, bob, Side::No, Decimal::new(30, 0), None)
        .await
        .expect("Failed to place stake");
    assert_eq!(outcome.yes_pct, Decimal::new(25, 0));
    assert_eq!(outcome.no_pct, Decimal::new(75, 0));
    assert_eq!(outcome.pool_total, Decimal::new(40, 0));

    // Step 4: A third participant joins the yes side
    let outcome = t
        .state
        .ledger
        .place_stake(duel.id, carol, Side::Yes, Decimal::new(10, 0), None)
        .await
        .expect("Failed to place stake");
    assert_eq!(outcome.yes_pct, Decimal::new(40, 0));
    assert_eq!(outcome.no_pct, Decimal::new(60, 0));
    assert_eq!(outcome.pool_total, Decimal::new(50, 0));

    // Step 5: Illegal moves bounce off without changing the pool
    let result = t
        .state
        .ledger
        .place_stake(duel.id, bob, Side::Yes, Decimal::new(5, 0), None)
        .await;
    assert!(matches!(result, Err(LedgerError::SideAlreadyChosen(Side::No))));

    let result = t
        .state
        .ledger
        .place_stake(duel.id, creator, Side::Yes, Decimal::new(5, 0), None)
        .await;
    assert!(matches!(result, Err(LedgerError::SelfStakeForbidden)));

    let result = t.state.ledger.cancel(duel.id, creator).await;
    assert!(matches!(result, Err(LedgerError::HasParticipants(3))));

    let current = t.state.ledger.get(duel.id).await.expect("Failed to get duel");
    assert_eq!(current.pool_total(), Decimal::new(50, 0));

    // Step 6: Resolution is gated on the deadline and the creator
    let result = t.state.ledger.resolve(duel.id, creator, Side::Yes).await;
    assert!(matches!(result, Err(LedgerError::ResolutionTooEarly)));

    expire_duel(&t, duel.id).await;

    let result = t.state.ledger.resolve(duel.id, alice, Side::Yes).await;
    assert!(matches!(result, Err(LedgerError::Unauthorized(_))));

    // Step 7: Creator resolves yes; payouts are frozen into the record
    let resolved = t
        .state
        .ledger
        .resolve(duel.id, creator, Side::Yes)
        .await
        .expect("Failed to resolve duel");

    assert_eq!(resolved.status, DuelStatus::Resolved);
    assert_eq!(resolved.outcome, Some(Side::Yes));

    // Alice and Carol each staked half the winning side of a 50 pool
    assert_eq!(resolved.participant(alice).unwrap().payout, Decimal::new(25, 0));
    assert_eq!(resolved.participant(carol).unwrap().payout, Decimal::new(25, 0));
    assert_eq!(resolved.participant(bob).unwrap().payout, Decimal::ZERO);

    let distributed: Decimal = resolved.participants.iter().map(|p| p.payout).sum();
    assert_eq!(distributed, Decimal::new(50, 0));

    // Step 8: No stake can land after resolution
    let result = t
        .state
        .ledger
        .place_stake(duel.id, Uuid::new_v4(), Side::Yes, Decimal::new(5, 0), None)
        .await;
    assert!(matches!(
        result,
        Err(LedgerError::DuelNotAcceptingStakes(DuelStatus::Resolved))
    ));

    // Step 9: Winners claim, losers cannot, repeats are rejected
    let receipt = t
        .state
        .claims
        .claim(duel.id, alice)
        .await
        .expect("Failed to claim winnings");
    assert_eq!(receipt.amount, Decimal::new(25, 0));

    let result = t.state.claims.claim(duel.id, bob).await;
    assert!(matches!(result, Err(LedgerError::NotAWinner)));

    t.state
        .claims
        .claim(duel.id, carol)
        .await
        .expect("Failed to claim winnings");

    let result = t.state.claims.claim(duel.id, alice).await;
    assert!(matches!(result, Err(LedgerError::AlreadyClaimed)));

    assert_eq!(t.settlement.settle_calls(), 2);

    // Step 10: The final record carries the whole story
    let final_duel = t.state.ledger.get(duel.id).await.expect("Failed to get duel");
    assert!(final_duel.participant(alice).unwrap().claimed);
    assert!(final_duel.participant(carol).unwrap().claimed);
    assert!(!final_duel.participant(bob).unwrap().claimed);
    assert!(final_duel.participant(alice).unwrap().receipt.is_some());

    // Odds stay quotable, frozen where the pool ended
    let (yes_pct, no_pct) = t.state.ledger.quote(duel.id).await.expect("Failed to quote");
    assert_eq!(yes_pct, Decimal::new(40, 0));
    assert_eq!(no_pct, Decimal::new(60, 0));

    // The probability history saw the odds move
    let history = t
        .state
        .probability
        .history(duel.id, past_deadline(86400), 50)
        .await
        .expect("Failed to read history");
    assert!(history.len() >= 3);
}

/// E2E test: concurrent stakes all land and the pool stays consistent
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_stakes_conserve_pool() {
    let t = TestLedger::with_config(LedgerConfig {
        max_write_retries: 25,
        ..LedgerConfig::default()
    });
    let f = TestFixtures::create(&t).await;

    let mut handles = Vec::new();
    for i in 1..=10i64 {
        let ledger = t.state.ledger.clone();
        let duel_id = f.duel.id;
        let side = if i % 2 == 0 { Side::Yes } else { Side::No };

        handles.push(tokio::spawn(async move {
            ledger
                .place_stake(duel_id, Uuid::new_v4(), side, Decimal::new(i, 0), None)
                .await
        }));
    }

    for handle in handles {
        handle
            .await
            .expect("Stake task panicked")
            .expect("Concurrent stake should succeed");
    }

    // Every stake landed exactly once: 1+2+...+10
    let duel = t.state.ledger.get(f.duel.id).await.expect("Failed to get duel");
    assert_eq!(duel.participants.len(), 10);
    assert_eq!(duel.pool_total(), Decimal::new(55, 0));
    assert_eq!(duel.side_total(Side::Yes), Decimal::new(30, 0));
    assert_eq!(duel.side_total(Side::No), Decimal::new(25, 0));

    // One version per committed write, no lost updates
    let versioned = t
        .store
        .find_by_id(f.duel.id)
        .await
        .expect("Failed to read store")
        .expect("Duel should exist");
    assert_eq!(versioned.version, 11);

    // Resolution over the contended pool still conserves it
    expire_duel(&t, f.duel.id).await;
    let resolved = t
        .state
        .ledger
        .resolve(f.duel.id, f.creator, Side::Yes)
        .await
        .expect("Failed to resolve duel");

    let distributed: Decimal = resolved.participants.iter().map(|p| p.payout).sum();
    let drift = (distributed - Decimal::new(55, 0)).abs();
    assert!(drift <= Decimal::new(1, 9), "Payouts drifted by {}", drift);
}

/// E2E test: duplicate concurrent claims settle exactly once
#[tokio::test]
async fn test_concurrent_claims_settle_once() {
    let t = TestLedger::new();
    let f = TestFixtures::create(&t).await;

    t.state
        .ledger
        .place_stake(f.duel.id, f.alice, Side::Yes, Decimal::new(10, 0), None)
        .await
        .expect("Failed to place stake");
    t.state
        .ledger
        .place_stake(f.duel.id, f.bob, Side::No, Decimal::new(30, 0), None)
        .await
        .expect("Failed to place stake");

    expire_duel(&t, f.duel.id).await;
    t.state
        .ledger
        .resolve(f.duel.id, f.creator, Side::Yes)
        .await
        .expect("Failed to resolve duel");

    // Hold the first claim inside the settlement call so the second
    // arrives while it is still in flight
    t.settlement.set_delay_ms(25);

    let first = t.state.claims.claim(f.duel.id, f.alice);
    let second = t.state.claims.claim(f.duel.id, f.alice);
    let results = join_all(vec![first, second]).await;

    let ok_count = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(ok_count, 1);

    let rejected = results
        .into_iter()
        .find(|r| r.is_err())
        .expect("One claim should be rejected")
        .unwrap_err();
    assert!(matches!(rejected, LedgerError::ClaimInFlight));

    // The settlement service was invoked exactly once
    assert_eq!(t.settlement.settle_calls(), 1);

    let duel = t.state.ledger.get(f.duel.id).await.expect("Failed to get duel");
    assert!(duel.participant(f.alice).unwrap().claimed);

    // A later claim attempt sees the recorded claim, not the guard
    let result = t.state.claims.claim(f.duel.id, f.alice).await;
    assert!(matches!(result, Err(LedgerError::AlreadyClaimed)));
    assert_eq!(t.settlement.settle_calls(), 1);
}

/// E2E test: two independent winners claim concurrently without treading
/// on each other's receipts
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_claims_by_different_winners() {
    let t = TestLedger::new();
    let f = TestFixtures::create(&t).await;

    t.state
        .ledger
        .place_stake(f.duel.id, f.alice, Side::Yes, Decimal::new(10, 0), None)
        .await
        .expect("Failed to place stake");
    t.state
        .ledger
        .place_stake(f.duel.id, f.carol, Side::Yes, Decimal::new(10, 0), None)
        .await
        .expect("Failed to place stake");
    t.state
        .ledger
        .place_stake(f.duel.id, f.bob, Side::No, Decimal::new(20, 0), None)
        .await
        .expect("Failed to place stake");

    expire_duel(&t, f.duel.id).await;
    t.state
        .ledger
        .resolve(f.duel.id, f.creator, Side::Yes)
        .await
        .expect("Failed to resolve duel");

    t.settlement.set_delay_ms(10);

    let claims_a = t.state.claims.clone();
    let claims_b = t.state.claims.clone();
    let duel_id = f.duel.id;
    let (alice, carol) = (f.alice, f.carol);

    let h1 = tokio::spawn(async move { claims_a.claim(duel_id, alice).await });
    let h2 = tokio::spawn(async move { claims_b.claim(duel_id, carol).await });

    let r1 = h1.await.expect("Claim task panicked").expect("Alice claim should succeed");
    let r2 = h2.await.expect("Claim task panicked").expect("Carol claim should succeed");

    // Each winner took half of the 40 pool
    assert_eq!(r1.amount, Decimal::new(20, 0));
    assert_eq!(r2.amount, Decimal::new(20, 0));
    assert_eq!(t.settlement.settle_calls(), 2);

    let duel = t.state.ledger.get(f.duel.id).await.expect("Failed to get duel");
    assert!(duel.participant(f.alice).unwrap().claimed);
    assert!(duel.participant(f.carol).unwrap().claimed);
}
