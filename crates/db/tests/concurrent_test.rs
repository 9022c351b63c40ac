//! Concurrent access tests for the PostgreSQL shop store.
//!
//! These verify that row locks keep stock and balances consistent when many
//! operations race on the same rows:
//! - Concurrent purchases never oversell
//! - Concurrent debits never overdraw
//! - The ledger still sums to the balance afterwards
//! - Admins adjusting each other's accounts do not deadlock

mod common;

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use mapmem_core::shop::{
    AdminAdjustment, LedgerEntryKind, NewLedgerEntry, PurchaseRequest, ShopCoordinator,
    ShopError, ShopStore, ShopTransaction,
};
use mapmem_db::{CatalogRepository, PgShopStore};
use tokio::sync::Barrier;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_purchases_of_last_unit() {
    let Some(db) = common::connect().await else {
        return;
    };
    let account = common::funded_account(&db, 1000).await;
    let item = common::item(&db, 10, 1).await;
    let coordinator = Arc::new(ShopCoordinator::new(PgShopStore::new(db.clone())));

    const RACERS: usize = 2;
    let barrier = Arc::new(Barrier::new(RACERS));

    let handles: Vec<_> = (0..RACERS)
        .map(|_| {
            let coordinator = Arc::clone(&coordinator);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                coordinator
                    .purchase(PurchaseRequest {
                        account_id: account,
                        item_id: item,
                        quantity: 1,
                    })
                    .await
            })
        })
        .collect();

    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let out_of_stock = results
        .iter()
        .filter(|r| matches!(r, Err(ShopError::InsufficientStock { .. })))
        .count();
    assert_eq!(successes, 1);
    assert_eq!(out_of_stock, 1);

    let stored = CatalogRepository::new(db.clone()).find_by_id(item).await.unwrap();
    assert_eq!(stored.stock, 0);
    assert_eq!(coordinator.balance(account).await.unwrap(), 990);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_debits_never_overdraw() {
    let Some(db) = common::connect().await else {
        return;
    };
    let account = common::funded_account(&db, 100).await;
    let coordinator = Arc::new(ShopCoordinator::new(PgShopStore::new(db.clone())));

    const DEBITS: usize = 20;
    let barrier = Arc::new(Barrier::new(DEBITS));

    let handles: Vec<_> = (0..DEBITS)
        .map(|_| {
            let coordinator = Arc::clone(&coordinator);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                coordinator
                    .admin_debit(AdminAdjustment {
                        actor_id: account,
                        target_account_id: account,
                        amount: 10,
                        description: "concurrent debit".to_string(),
                    })
                    .await
            })
        })
        .collect();

    let successes = join_all(handles)
        .await
        .into_iter()
        .filter(|joined| matches!(joined, Ok(Ok(_))))
        .count();

    assert_eq!(successes, 10);
    let (balance, sum) = coordinator.audit_account(account).await.unwrap();
    assert_eq!(balance, 0);
    assert_eq!(sum, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mixed_traffic_keeps_ledger_consistent() {
    let Some(db) = common::connect().await else {
        return;
    };
    let account = common::funded_account(&db, 500).await;
    let item = common::item(&db, 7, 30).await;
    let coordinator = Arc::new(ShopCoordinator::new(PgShopStore::new(db.clone())));

    const TASKS: usize = 40;
    let barrier = Arc::new(Barrier::new(TASKS));

    let handles: Vec<_> = (0..TASKS)
        .map(|i| {
            let coordinator = Arc::clone(&coordinator);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                match i % 3 {
                    0 => coordinator
                        .purchase(PurchaseRequest {
                            account_id: account,
                            item_id: item,
                            quantity: 2,
                        })
                        .await
                        .map(|_| ()),
                    1 => coordinator
                        .admin_credit(AdminAdjustment {
                            actor_id: account,
                            target_account_id: account,
                            amount: 15,
                            description: "top up".to_string(),
                        })
                        .await
                        .map(|_| ()),
                    _ => coordinator
                        .admin_debit(AdminAdjustment {
                            actor_id: account,
                            target_account_id: account,
                            amount: 25,
                            description: "fee".to_string(),
                        })
                        .await
                        .map(|_| ()),
                }
            })
        })
        .collect();

    for joined in join_all(handles).await {
        if let Ok(Err(err)) = joined {
            assert!(!err.is_storage(), "unexpected storage error: {err}");
        }
    }

    let (balance, sum) = coordinator.audit_account(account).await.unwrap();
    assert!(balance >= 0);
    assert_eq!(balance, sum);
    let stored = CatalogRepository::new(db.clone()).find_by_id(item).await.unwrap();
    assert!(stored.stock >= 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_admins_crediting_each_other_interleaved() {
    let Some(db) = common::connect().await else {
        return;
    };
    let admin_a = common::funded_account(&db, 0).await;
    let admin_b = common::funded_account(&db, 0).await;
    let store = PgShopStore::new(db.clone());

    // Both account rows are locked before either ledger row names the other
    // admin as actor.
    let mut a_credits_b = store.begin().await.unwrap();
    a_credits_b.lock_account(admin_b).await.unwrap();
    a_credits_b.apply_delta(admin_b, 10).await.unwrap();

    let mut b_credits_a = store.begin().await.unwrap();
    b_credits_a.lock_account(admin_a).await.unwrap();
    b_credits_a.apply_delta(admin_a, 20).await.unwrap();

    let credit = |account_id, actor_id, amount| NewLedgerEntry {
        account_id,
        actor_id: Some(actor_id),
        kind: LedgerEntryKind::AdminCredit,
        amount,
        description: "mutual credit".to_string(),
    };

    let appended = tokio::time::timeout(Duration::from_secs(10), async {
        tokio::join!(
            a_credits_b.append_ledger(credit(admin_b, admin_a, 10)),
            b_credits_a.append_ledger(credit(admin_a, admin_b, 20)),
        )
    })
    .await
    .expect("ledger inserts blocked on account locks");

    appended.0.unwrap();
    appended.1.unwrap();
    a_credits_b.commit().await.unwrap();
    b_credits_a.commit().await.unwrap();

    let coordinator = ShopCoordinator::new(store);
    assert_eq!(coordinator.audit_account(admin_a).await.unwrap(), (20, 20));
    assert_eq!(coordinator.audit_account(admin_b).await.unwrap(), (10, 10));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_mutual_admin_credits() {
    let Some(db) = common::connect().await else {
        return;
    };
    let admin_a = common::funded_account(&db, 0).await;
    let admin_b = common::funded_account(&db, 0).await;
    let coordinator = Arc::new(ShopCoordinator::new(PgShopStore::new(db.clone())));

    const CREDITS: usize = 20;
    let barrier = Arc::new(Barrier::new(CREDITS));

    let handles: Vec<_> = (0..CREDITS)
        .map(|i| {
            let coordinator = Arc::clone(&coordinator);
            let barrier = Arc::clone(&barrier);
            let (actor_id, target_account_id) = if i % 2 == 0 {
                (admin_a, admin_b)
            } else {
                (admin_b, admin_a)
            };
            tokio::spawn(async move {
                barrier.wait().await;
                coordinator
                    .admin_credit(AdminAdjustment {
                        actor_id,
                        target_account_id,
                        amount: 5,
                        description: "mutual credit".to_string(),
                    })
                    .await
            })
        })
        .collect();

    for joined in join_all(handles).await {
        joined.expect("task panicked").unwrap();
    }

    assert_eq!(coordinator.audit_account(admin_a).await.unwrap(), (50, 50));
    assert_eq!(coordinator.audit_account(admin_b).await.unwrap(), (50, 50));
}
