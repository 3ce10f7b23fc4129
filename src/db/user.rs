use std::{collections::HashMap, error::Error as StdError};

use derive_more::Display;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
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
pub struct User {
    pub id: Id,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub trade_link: Option<String>,
    pub phone: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    Hash,
    PartialEq,
    Serialize,
)]
pub struct Id(Uuid);

impl Id {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> Option<Self> {
        value.parse::<Uuid>().ok().map(Self)
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

impl Client {
    /// Creates the row on first sign-in and returns the stored row either
    /// way. Profile fields of an existing user are left untouched.
    pub async fn upsert_user(&self, user: &User) -> Result<User, Error> {
        const SQL: &str = "\
            INSERT INTO users (id, email, name, avatar_url, trade_link, \
                               phone, created_at, updated_at) \
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
            ON CONFLICT (email) DO UPDATE \
            SET email = EXCLUDED.email \
            RETURNING id, email, name, avatar_url, trade_link, phone, \
                      created_at, updated_at";
        let row = self
            .0
            .query_one(
                SQL,
                &[
                    &user.id,
                    &user.email,
                    &user.name,
                    &user.avatar_url,
                    &user.trade_link,
                    &user.phone,
                    &user.created_at,
                    &user.updated_at,
                ],
            )
            .await?;
        Ok(User {
            id: row.get("id"),
            email: row.get("email"),
            name: row.get("name"),
            avatar_url: row.get("avatar_url"),
            trade_link: row.get("trade_link"),
            phone: row.get("phone"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    pub async fn get_user_by_id(&self, id: Id) -> Result<Option<User>, Error> {
        const SQL: &str = "\
            SELECT id, email, name, avatar_url, trade_link, phone, \
                   created_at, updated_at \
            FROM users \
            WHERE id = $1 \
            LIMIT 1";
        Ok(self.0.query_opt(SQL, &[&id]).await?.map(|row| User {
            id: row.get("id"),
            email: row.get("email"),
            name: row.get("name"),
            avatar_url: row.get("avatar_url"),
            trade_link: row.get("trade_link"),
            phone: row.get("phone"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }))
    }

    pub async fn update_user(&self, user: &User) -> Result<(), Error> {
        const SQL: &str = "\
            UPDATE users \
            SET name = $2, \
                avatar_url = $3, \
                trade_link = $4, \
                phone = $5, \
                updated_at = $6 \
            WHERE id = $1";
        self.0
            .execute(
                SQL,
                &[
                    &user.id,
                    &user.name,
                    &user.avatar_url,
                    &user.trade_link,
                    &user.phone,
                    &user.updated_at,
                ],
            )
            .await
            .map(drop)
    }

    pub async fn get_users_by_ids(
        &self,
        ids: &[Id],
    ) -> Result<HashMap<Id, User>, Error> {
        const SQL: &str = "\
            SELECT id, email, name, avatar_url, trade_link, phone, \
                   created_at, updated_at \
            FROM users \
            WHERE id IN (SELECT unnest($1::UUID[])) \
            LIMIT $2";

        let limit = i64::try_from(ids.len()).unwrap();

        Ok(self
            .0
            .query(SQL, &[&ids, &limit])
            .await?
            .into_iter()
            .map(|row| {
                let id = row.get("id");
                let user = User {
                    id,
                    email: row.get("email"),
                    name: row.get("name"),
                    avatar_url: row.get("avatar_url"),
                    trade_link: row.get("trade_link"),
                    phone: row.get("phone"),
                    created_at: row.get("created_at"),
                    updated_at: row.get("updated_at"),
                };
                (id, user)
            })
            .collect())
    }
}
