//! Property-based tests for the shop coordinator.
//!
//! - Ledger sum equals balance after any sequence of operations
//! - Balance and stock never go negative
//! - Failed operations write nothing

use mapmem_shared::types::{AccountId, ItemId};
use proptest::prelude::*;

use super::coordinator::ShopCoordinator;
use super::memory::InMemoryShopStore;
use super::types::{AdminAdjustment, PurchaseRequest, ShopItem};

#[derive(Debug, Clone)]
enum Op {
    Purchase { item: usize, quantity: i32 },
    Credit(i64),
    Debit(i64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..3, -1i32..5).prop_map(|(item, quantity)| Op::Purchase { item, quantity }),
        (-5i64..500).prop_map(Op::Credit),
        (-5i64..500).prop_map(Op::Debit),
    ]
}

fn run<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_ledger_sum_matches_balance(
        prices in prop::collection::vec(0i64..200, 3),
        stocks in prop::collection::vec(0i32..6, 3),
        ops in prop::collection::vec(op_strategy(), 1..40),
    ) {
        run(async {
            let store = InMemoryShopStore::new();
            let account = AccountId::new();
            let admin = AccountId::new();
            store.insert_account(account, 0).await;

            let items: Vec<ItemId> = (0..3).map(|_| ItemId::new()).collect();
            for (i, id) in items.iter().enumerate() {
                store.insert_item(ShopItem {
                    id: *id,
                    name: format!("item-{i}"),
                    price: prices[i],
                    stock: stocks[i],
                    is_active: true,
                }).await;
            }

            let coordinator = ShopCoordinator::new(store.clone());
            let mut committed = 0;

            for op in ops {
                let before = store.ledger_len().await;
                let result = match op {
                    Op::Purchase { item, quantity } => coordinator
                        .purchase(PurchaseRequest { account_id: account, item_id: items[item], quantity })
                        .await
                        .map(|_| ()),
                    Op::Credit(amount) => coordinator
                        .admin_credit(AdminAdjustment {
                            actor_id: admin,
                            target_account_id: account,
                            amount,
                            description: "credit".to_string(),
                        })
                        .await
                        .map(|_| ()),
                    Op::Debit(amount) => coordinator
                        .admin_debit(AdminAdjustment {
                            actor_id: admin,
                            target_account_id: account,
                            amount,
                            description: "debit".to_string(),
                        })
                        .await
                        .map(|_| ()),
                };
                let after = store.ledger_len().await;

                if result.is_ok() {
                    committed += 1;
                    prop_assert_eq!(after, before + 1);
                } else {
                    prop_assert_eq!(after, before);
                }

                let (balance, sum) = coordinator.audit_account(account).await.unwrap();
                prop_assert!(balance >= 0);
                prop_assert_eq!(balance, sum);
                for id in &items {
                    prop_assert!(store.item(*id).await.unwrap().stock >= 0);
                }
            }

            prop_assert_eq!(store.ledger_len().await, committed);
            Ok(())
        })?;
    }

    #[test]
    fn prop_owned_plus_stock_is_conserved(
        stock in 0i32..20,
        quantities in prop::collection::vec(1i32..6, 1..15),
    ) {
        run(async {
            let store = InMemoryShopStore::new();
            let account = AccountId::new();
            let item = ItemId::new();
            store.insert_account(account, 1_000_000).await;
            store.insert_item(ShopItem {
                id: item,
                name: "pin".to_string(),
                price: 3,
                stock,
                is_active: true,
            }).await;
            let coordinator = ShopCoordinator::new(store.clone());

            for quantity in quantities {
                let _ = coordinator
                    .purchase(PurchaseRequest { account_id: account, item_id: item, quantity })
                    .await;
                let remaining = store.item(item).await.unwrap().stock;
                let owned = store.owned_quantity(account, item).await.unwrap_or(0);
                prop_assert_eq!(remaining + owned, stock);
                prop_assert_eq!(
                    coordinator.balance(account).await.unwrap(),
                    1_000_000 - i64::from(owned) * 3
                );
            }
            Ok(())
        })?;
    }
}
