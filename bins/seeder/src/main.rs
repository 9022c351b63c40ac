//! Database seeder for Map Memories development and testing.
//!
//! Seeds an admin account, a test user with an opening balance, and a few
//! catalog items, then prints bearer tokens for both accounts.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use mapmem_core::shop::{AdminAdjustment, ShopCoordinator};
use mapmem_db::entities::accounts;
use mapmem_db::repositories::{CreateItemInput, ItemFilter};
use mapmem_db::{CatalogRepository, PgShopStore};
use mapmem_shared::types::{AccountId, PageRequest};
use mapmem_shared::{AppConfig, JwtService, ROLE_ADMIN, ROLE_USER};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

/// Admin account ID (consistent for all seeds)
const ADMIN_ACCOUNT_ID: Uuid = Uuid::from_u128(1);
/// Test user account ID (consistent for all seeds)
const TEST_ACCOUNT_ID: Uuid = Uuid::from_u128(2);

const OPENING_BALANCE: i64 = 1_000;

/// (name, description, price, stock, item type)
const ITEMS: [(&str, &str, i64, i32, &str); 4] = [
    ("Lighthouse", "A coastal lighthouse marker", 150, 50, "marker"),
    ("Mountain Peak", "Snow-capped summit marker", 300, 20, "marker"),
    ("Old Compass", "Brass compass frame", 500, 5, "frame"),
    ("Golden Route", "Highlights a travelled route", 1_200, 1, "route"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;

    println!("Connecting to database...");
    let db = mapmem_db::connect_with(&config.database)
        .await
        .context("failed to connect to database")?;

    println!("Seeding accounts...");
    seed_account(&db, ADMIN_ACCOUNT_ID, "Admin").await?;
    let created = seed_account(&db, TEST_ACCOUNT_ID, "Test Traveller").await?;

    if created {
        println!("Crediting opening balance...");
        ShopCoordinator::new(PgShopStore::new(db.clone()))
            .admin_credit(AdminAdjustment {
                actor_id: AccountId::from_uuid(ADMIN_ACCOUNT_ID),
                target_account_id: AccountId::from_uuid(TEST_ACCOUNT_ID),
                amount: OPENING_BALANCE,
                description: "Opening balance".to_string(),
            })
            .await
            .context("failed to credit opening balance")?;
    }

    println!("Seeding catalog items...");
    seed_items(&db).await?;

    let jwt = JwtService::new(config.jwt.to_jwt_config());
    println!("Seeding complete!");
    println!();
    println!(
        "Admin token: {}",
        jwt.generate_access_token(ADMIN_ACCOUNT_ID, ROLE_ADMIN)?
    );
    println!(
        "User token:  {}",
        jwt.generate_access_token(TEST_ACCOUNT_ID, ROLE_USER)?
    );

    Ok(())
}

/// Inserts an account unless it exists. Returns true if it was created.
async fn seed_account(db: &DatabaseConnection, id: Uuid, name: &str) -> anyhow::Result<bool> {
    if accounts::Entity::find_by_id(id).one(db).await?.is_some() {
        println!("  Account {name} already exists, skipping...");
        return Ok(false);
    }

    let now = chrono::Utc::now().into();
    accounts::ActiveModel {
        id: Set(id),
        display_name: Set(name.to_string()),
        balance: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .with_context(|| format!("failed to insert account {name}"))?;

    println!("  Created account: {name} ({id})");
    Ok(true)
}

/// Inserts the sample catalog if the catalog is empty.
async fn seed_items(db: &DatabaseConnection) -> anyhow::Result<()> {
    let catalog = CatalogRepository::new(db.clone());
    let filter = ItemFilter {
        item_type: None,
        active_only: false,
    };
    let (_, total) = catalog.list_items(&filter, PageRequest::default()).await?;
    if total > 0 {
        println!("  Catalog already has {total} items, skipping...");
        return Ok(());
    }

    for (name, description, price, stock, item_type) in ITEMS {
        catalog
            .create_item(CreateItemInput {
                name: name.to_string(),
                description: description.to_string(),
                image_base64: String::new(),
                price,
                stock,
                item_type: Some(item_type.to_string()),
            })
            .await
            .with_context(|| format!("failed to insert item {name}"))?;
    }
    println!("  Inserted {} items", ITEMS.len());
    Ok(())
}
