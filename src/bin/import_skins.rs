//! Offline catalog import. Downloads the public CS2 skin catalog JSON,
//! derives the wear conditions each skin can exist in from its float
//! range and seeds a price row per condition. Re-running refreshes
//! prices without duplicating rows.

use std::{env, error::Error};

use futures::{stream, StreamExt as _, TryStreamExt as _};
use serde::Deserialize;
use tokio::{fs, task};
use tracing_subscriber::{
    layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

use lilo_store::{db, Config};

/// Upserts kept in flight at once on the pipelined connection.
const IMPORT_PIPELINE: usize = 16;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = fs::read_to_string("config.toml").await?;
    let config = toml::from_str::<Config>(&config)?;
    let source_url = env::args()
        .nth(1)
        .unwrap_or(config.catalog.source_url);

    let (db_client, db_connection) = db::connect(config.db).await?;

    task::spawn(async move {
        if let Err(e) = db_connection.await {
            panic!("database connection failed: {e}");
        }
    });

    tracing::info!("downloading catalog from {source_url}");
    let entries = reqwest::get(&source_url)
        .await?
        .error_for_status()?
        .json::<Vec<CatalogEntry>>()
        .await?;
    tracing::info!("downloaded {} catalog entries", entries.len());

    let mut skins = Vec::new();
    let mut skipped = 0;
    for entry in entries {
        match prepare(entry) {
            Some(prepared) => skins.push(prepared),
            None => skipped += 1,
        }
    }

    let db_client = &db_client;
    let imported = stream::iter(skins)
        .map(|(skin, prices)| async move {
            let id = db_client.upsert_skin(&skin).await?;
            for price in &prices {
                db_client.upsert_condition_price(id, price).await?;
            }
            Ok::<_, db::Error>(())
        })
        .buffer_unordered(IMPORT_PIPELINE)
        .try_fold(0, |count, ()| async move { Ok(count + 1) })
        .await?;

    tracing::info!("imported {imported} skins, skipped {skipped} entries");

    Ok(())
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    name: String,
    weapon: Option<CatalogWeapon>,
    rarity: CatalogRarity,
    min_float: Option<f64>,
    max_float: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CatalogWeapon {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CatalogRarity {
    name: String,
}

/// Turns a catalog entry into a skin plus its seeded price rows. Entries
/// without a weapon (agents, patches) or with a rarity tier the store does
/// not price are skipped.
fn prepare(
    entry: CatalogEntry,
) -> Option<(db::Skin, Vec<db::skin::ConditionPrice>)> {
    let Some(weapon) = entry.weapon else {
        tracing::warn!("skipping {:?}: no weapon", entry.name);
        return None;
    };
    let Some(rarity) =
        db::skin::Rarity::from_display_name(&entry.rarity.name)
    else {
        tracing::warn!(
            "skipping {:?}: unknown rarity {:?}",
            entry.name,
            entry.rarity.name,
        );
        return None;
    };

    // The game's default wear range, used when the catalog omits floats.
    let min_float = entry.min_float.unwrap_or(0.06);
    let max_float = entry.max_float.unwrap_or(0.8);

    let prices = db::skin::Condition::in_float_range(min_float, max_float)
        .into_iter()
        .map(|condition| seed_price(rarity, condition))
        .collect();
    let skin = db::Skin {
        id: db::skin::Id::new(),
        name: entry.name,
        weapon: weapon.name,
        rarity,
    };

    Some((skin, prices))
}

fn seed_price(
    rarity: db::skin::Rarity,
    condition: db::skin::Condition,
) -> db::skin::ConditionPrice {
    let price =
        round_cents(rarity_base_price(rarity) * condition_factor(condition));
    db::skin::ConditionPrice {
        condition,
        base_price: price,
        current_price: price,
    }
}

/// Seed price in USD for a Factory New skin of the given tier.
fn rarity_base_price(rarity: db::skin::Rarity) -> f64 {
    match rarity {
        db::skin::Rarity::Consumer => 0.5,
        db::skin::Rarity::Industrial => 1.0,
        db::skin::Rarity::MilSpec => 3.0,
        db::skin::Rarity::Restricted => 8.0,
        db::skin::Rarity::Classified => 20.0,
        db::skin::Rarity::Covert => 45.0,
        db::skin::Rarity::Contraband => 90.0,
        db::skin::Rarity::Extraordinary => 120.0,
    }
}

fn condition_factor(condition: db::skin::Condition) -> f64 {
    match condition {
        db::skin::Condition::FactoryNew => 1.0,
        db::skin::Condition::MinimalWear => 0.85,
        db::skin::Condition::FieldTested => 0.65,
        db::skin::Condition::WellWorn => 0.5,
        db::skin::Condition::BattleScarred => 0.4,
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
