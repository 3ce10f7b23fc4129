use std::{collections::HashMap, error::Error as StdError};

use enum_utils::TryFromRepr;
use serde::{Deserialize, Serialize};
use tokio_postgres::{
    types::{
        accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql,
        Type,
    },
    Error,
};
use uuid::Uuid;

use super::Client;

#[derive(Clone, Debug)]
pub struct Skin {
    pub id: Id,
    pub name: String,
    pub weapon: String,
    pub rarity: Rarity,
}

/// One price row per wear condition a skin can exist in.
#[derive(Clone, Copy, Debug)]
pub struct ConditionPrice {
    pub condition: Condition,
    pub base_price: f64,
    pub current_price: f64,
}

/// A catalog row matched by a search, with the cheapest current price
/// across the condition rows the search considered.
#[derive(Clone, Debug)]
pub struct SkinMatch {
    pub id: Id,
    pub name: String,
    pub weapon: String,
    pub rarity: Rarity,
    pub min_price: f64,
}

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize,
)]
pub struct Id(Uuid);

impl Id {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<u128> for Id {
    fn from(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }
}

impl FromSql<'_> for Id {
    accepts!(UUID);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        Uuid::from_sql(ty, raw).map(Self)
    }
}

impl ToSql for Id {
    accepts!(UUID);

    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.0.to_sql(ty, out)
    }
}

/// CS2 cosmetic wear tier. The float brackets follow the game's wear
/// rendering: a skin's float value decides which tier it displays as.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, TryFromRepr, PartialEq, Serialize,
)]
#[repr(u8)]
pub enum Condition {
    #[serde(rename = "fn")]
    FactoryNew = 1,

    #[serde(rename = "mw")]
    MinimalWear = 2,

    #[serde(rename = "ft")]
    FieldTested = 3,

    #[serde(rename = "ww")]
    WellWorn = 4,

    #[serde(rename = "bs")]
    BattleScarred = 5,
}

impl Condition {
    pub const ALL: [Self; 5] = [
        Self::FactoryNew,
        Self::MinimalWear,
        Self::FieldTested,
        Self::WellWorn,
        Self::BattleScarred,
    ];

    pub fn from_slug(value: &str) -> Option<Self> {
        match value {
            "fn" => Some(Self::FactoryNew),
            "mw" => Some(Self::MinimalWear),
            "ft" => Some(Self::FieldTested),
            "ww" => Some(Self::WellWorn),
            "bs" => Some(Self::BattleScarred),
            _ => None,
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::FactoryNew => "fn",
            Self::MinimalWear => "mw",
            Self::FieldTested => "ft",
            Self::WellWorn => "ww",
            Self::BattleScarred => "bs",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::FactoryNew => "Factory New",
            Self::MinimalWear => "Minimal Wear",
            Self::FieldTested => "Field-Tested",
            Self::WellWorn => "Well-Worn",
            Self::BattleScarred => "Battle-Scarred",
        }
    }

    /// Wear bracket as `[lo, hi)`.
    pub fn float_bracket(self) -> (f64, f64) {
        match self {
            Self::FactoryNew => (0.0, 0.07),
            Self::MinimalWear => (0.07, 0.15),
            Self::FieldTested => (0.15, 0.38),
            Self::WellWorn => (0.38, 0.45),
            Self::BattleScarred => (0.45, 1.0),
        }
    }

    pub fn from_float(value: f64) -> Self {
        match value {
            v if v < 0.07 => Self::FactoryNew,
            v if v < 0.15 => Self::MinimalWear,
            v if v < 0.38 => Self::FieldTested,
            v if v < 0.45 => Self::WellWorn,
            _ => Self::BattleScarred,
        }
    }

    /// Conditions a skin with float range `[min, max)` can drop in. A
    /// degenerate range maps to the single bracket containing `min`.
    pub fn in_float_range(min: f64, max: f64) -> Vec<Self> {
        if max <= min {
            return vec![Self::from_float(min)];
        }
        Self::ALL
            .into_iter()
            .filter(|condition| {
                let (lo, hi) = condition.float_bracket();
                min < hi && lo < max
            })
            .collect()
    }
}

impl FromSql<'_> for Condition {
    accepts!(INT2);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        let repr = i16::from_sql(ty, raw)?;
        let repr = u8::try_from(repr)?;
        let condition =
            Self::try_from(repr).map_err(|_| "invalid condition")?;
        Ok(condition)
    }
}

impl ToSql for Condition {
    accepts!(INT2);

    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        let repr = i16::from((*self) as u8);
        repr.to_sql(ty, out)
    }
}

/// CS2 item quality classification.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, TryFromRepr, PartialEq, Serialize,
)]
#[repr(u8)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Consumer = 1,
    Industrial = 2,
    MilSpec = 3,
    Restricted = 4,
    Classified = 5,
    Covert = 6,
    Contraband = 7,
    Extraordinary = 8,
}

impl Rarity {
    pub fn from_slug(value: &str) -> Option<Self> {
        match value {
            "consumer" => Some(Self::Consumer),
            "industrial" => Some(Self::Industrial),
            "mil_spec" => Some(Self::MilSpec),
            "restricted" => Some(Self::Restricted),
            "classified" => Some(Self::Classified),
            "covert" => Some(Self::Covert),
            "contraband" => Some(Self::Contraband),
            "extraordinary" => Some(Self::Extraordinary),
            _ => None,
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::Consumer => "consumer",
            Self::Industrial => "industrial",
            Self::MilSpec => "mil_spec",
            Self::Restricted => "restricted",
            Self::Classified => "classified",
            Self::Covert => "covert",
            Self::Contraband => "contraband",
            Self::Extraordinary => "extraordinary",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Consumer => "Consumer Grade",
            Self::Industrial => "Industrial Grade",
            Self::MilSpec => "Mil-Spec Grade",
            Self::Restricted => "Restricted",
            Self::Classified => "Classified",
            Self::Covert => "Covert",
            Self::Contraband => "Contraband",
            Self::Extraordinary => "Extraordinary",
        }
    }

    /// Maps the display names used by the public catalog JSON.
    pub fn from_display_name(value: &str) -> Option<Self> {
        match value {
            "Consumer Grade" => Some(Self::Consumer),
            "Industrial Grade" => Some(Self::Industrial),
            "Mil-Spec Grade" => Some(Self::MilSpec),
            "Restricted" => Some(Self::Restricted),
            "Classified" => Some(Self::Classified),
            "Covert" => Some(Self::Covert),
            "Contraband" => Some(Self::Contraband),
            "Extraordinary" => Some(Self::Extraordinary),
            _ => None,
        }
    }
}

impl FromSql<'_> for Rarity {
    accepts!(INT2);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        let repr = i16::from_sql(ty, raw)?;
        let repr = u8::try_from(repr)?;
        let rarity = Self::try_from(repr).map_err(|_| "invalid rarity")?;
        Ok(rarity)
    }
}

impl ToSql for Rarity {
    accepts!(INT2);

    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        let repr = i16::from((*self) as u8);
        repr.to_sql(ty, out)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Sort {
    #[default]
    Name,
    PriceAsc,
    PriceDesc,
}

impl Sort {
    pub fn from_slug(value: &str) -> Option<Self> {
        match value {
            "name" => Some(Self::Name),
            "price_asc" => Some(Self::PriceAsc),
            "price_desc" => Some(Self::PriceDesc),
            _ => None,
        }
    }
}

/// A catalog search. Empty vectors and `None` bounds disable the
/// corresponding filter. The price bounds are inclusive and apply to the
/// cheapest current price across the (condition-filtered) price rows.
#[derive(Clone, Debug, Default)]
pub struct Search {
    pub name: Option<String>,
    pub weapons: Vec<String>,
    pub rarities: Vec<Rarity>,
    pub conditions: Vec<Condition>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub sort: Sort,
}

const SEARCH_SQL: &str = "\
    SELECT s.id, s.name, s.weapon, s.rarity, \
           MIN(p.current_price) AS min_price \
    FROM skins s \
    JOIN skin_condition_prices p ON p.skin_id = s.id \
    WHERE ($1::TEXT IS NULL OR s.name ILIKE '%' || $1 || '%') \
      AND (cardinality($2::TEXT[]) = 0 OR s.weapon = ANY($2)) \
      AND (cardinality($3::INT2[]) = 0 OR s.rarity = ANY($3)) \
      AND (cardinality($4::INT2[]) = 0 OR p.condition = ANY($4)) \
    GROUP BY s.id, s.name, s.weapon, s.rarity \
    HAVING ($5::FLOAT8 IS NULL OR MIN(p.current_price) >= $5) \
       AND ($6::FLOAT8 IS NULL OR MIN(p.current_price) <= $6)";

impl Client {
    pub async fn search_skins_page(
        &self,
        search: &Search,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<SkinMatch>, Error> {
        let offset = i64::try_from(offset).unwrap();
        let limit = i64::try_from(limit).unwrap();

        let order = match search.sort {
            Sort::Name => "s.name ASC",
            Sort::PriceAsc => "min_price ASC, s.name ASC",
            Sort::PriceDesc => "min_price DESC, s.name ASC",
        };
        let sql =
            format!("{SEARCH_SQL} ORDER BY {order} OFFSET $7 LIMIT $8");

        Ok(self
            .0
            .query(
                &sql,
                &[
                    &search.name,
                    &search.weapons,
                    &search.rarities,
                    &search.conditions,
                    &search.price_min,
                    &search.price_max,
                    &offset,
                    &limit,
                ],
            )
            .await?
            .into_iter()
            .map(|row| SkinMatch {
                id: row.get("id"),
                name: row.get("name"),
                weapon: row.get("weapon"),
                rarity: row.get("rarity"),
                min_price: row.get("min_price"),
            })
            .collect())
    }

    pub async fn search_skins_count(
        &self,
        search: &Search,
    ) -> Result<usize, Error> {
        const SQL: &str = "\
            SELECT COUNT(*) \
            FROM (\
                SELECT s.id \
                FROM skins s \
                JOIN skin_condition_prices p ON p.skin_id = s.id \
                WHERE ($1::TEXT IS NULL OR s.name ILIKE '%' || $1 || '%') \
                  AND (cardinality($2::TEXT[]) = 0 OR s.weapon = ANY($2)) \
                  AND (cardinality($3::INT2[]) = 0 OR s.rarity = ANY($3)) \
                  AND (cardinality($4::INT2[]) = 0 \
                       OR p.condition = ANY($4)) \
                GROUP BY s.id \
                HAVING ($5::FLOAT8 IS NULL \
                        OR MIN(p.current_price) >= $5) \
                   AND ($6::FLOAT8 IS NULL \
                        OR MIN(p.current_price) <= $6)\
            ) AS matching";
        Ok(self
            .0
            .query_one(
                SQL,
                &[
                    &search.name,
                    &search.weapons,
                    &search.rarities,
                    &search.conditions,
                    &search.price_min,
                    &search.price_max,
                ],
            )
            .await?
            .get::<_, i64>(0)
            .try_into()
            .unwrap())
    }

    pub async fn get_condition_prices(
        &self,
        skin_ids: &[Id],
    ) -> Result<HashMap<Id, Vec<ConditionPrice>>, Error> {
        const SQL: &str = "\
            SELECT skin_id, condition, base_price, current_price \
            FROM skin_condition_prices \
            WHERE skin_id IN (SELECT unnest($1::UUID[])) \
            ORDER BY skin_id, condition";

        let mut prices: HashMap<Id, Vec<ConditionPrice>> = HashMap::new();
        for row in self.0.query(SQL, &[&skin_ids]).await? {
            prices.entry(row.get("skin_id")).or_default().push(
                ConditionPrice {
                    condition: row.get("condition"),
                    base_price: row.get("base_price"),
                    current_price: row.get("current_price"),
                },
            );
        }
        Ok(prices)
    }

    /// Inserts or refreshes a catalog row, keyed by market name. Returns
    /// the stored id, which for an existing skin differs from the
    /// candidate id in `skin`.
    pub async fn upsert_skin(&self, skin: &Skin) -> Result<Id, Error> {
        const SQL: &str = "\
            INSERT INTO skins (id, name, weapon, rarity) \
            VALUES ($1, $2, $3, $4) \
            ON CONFLICT (name) DO UPDATE \
            SET weapon = EXCLUDED.weapon, \
                rarity = EXCLUDED.rarity \
            RETURNING id";
        Ok(self
            .0
            .query_one(
                SQL,
                &[&skin.id, &skin.name, &skin.weapon, &skin.rarity],
            )
            .await?
            .get("id"))
    }

    pub async fn upsert_condition_price(
        &self,
        skin_id: Id,
        price: &ConditionPrice,
    ) -> Result<(), Error> {
        const SQL: &str = "\
            INSERT INTO skin_condition_prices (skin_id, condition, \
                                               base_price, current_price) \
            VALUES ($1, $2, $3, $4) \
            ON CONFLICT (skin_id, condition) DO UPDATE \
            SET base_price = EXCLUDED.base_price, \
                current_price = EXCLUDED.current_price";
        self.0
            .execute(
                SQL,
                &[
                    &skin_id,
                    &price.condition,
                    &price.base_price,
                    &price.current_price,
                ],
            )
            .await
            .map(drop)
    }
}
