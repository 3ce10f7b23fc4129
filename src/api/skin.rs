use serde::{Deserialize, Serialize};

use crate::db;

pub use crate::db::skin::{Condition, Id, Rarity};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Skin {
    pub id: Id,
    pub name: String,
    pub weapon: String,
    pub rarity: Rarity,
    pub rarity_name: String,
    pub min_price: f64,
    pub conditions: Vec<ConditionPrice>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ConditionPrice {
    pub condition: Condition,
    pub condition_name: String,
    pub base_price: f64,
    pub current_price: f64,
}

impl From<db::skin::ConditionPrice> for ConditionPrice {
    fn from(price: db::skin::ConditionPrice) -> Self {
        Self {
            condition: price.condition,
            condition_name: price.condition.name().to_string(),
            base_price: price.base_price,
            current_price: price.current_price,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct List {
    pub data: Vec<Skin>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    #[serde(rename = "totalPages")]
    pub total_pages: usize,
}
