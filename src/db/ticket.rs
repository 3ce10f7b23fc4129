use std::error::Error as StdError;

use derive_more::Display;
use enum_utils::TryFromRepr;
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

use super::{skin, user, Client};

#[derive(Clone, Debug)]
pub struct Ticket {
    pub id: Id,
    pub user_id: user::Id,
    pub ticket_type: TicketType,
    pub skin_name: String,
    pub condition: skin::Condition,
    pub status: Status,
    pub quoted_price: Option<f64>,
    pub user_notes: Option<String>,
    pub admin_notes: Option<String>,
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
        Id(Uuid::new_v4())
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

#[derive(
    Clone, Copy, Debug, Deserialize, Eq, TryFromRepr, PartialEq, Serialize,
)]
#[repr(u8)]
#[serde(rename_all = "snake_case")]
pub enum TicketType {
    /// User wants to buy a skin from the store.
    Buy = 1,

    /// User offers a skin from their inventory to the store.
    Sell = 2,
}

impl TicketType {
    pub fn from_slug(value: &str) -> Option<Self> {
        match value {
            "buy" => Some(Self::Buy),
            "sell" => Some(Self::Sell),
            _ => None,
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl FromSql<'_> for TicketType {
    accepts!(INT2);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        let repr = i16::from_sql(ty, raw)?;
        let repr = u8::try_from(repr)?;
        let ticket_type =
            Self::try_from(repr).map_err(|_| "invalid ticket type")?;
        Ok(ticket_type)
    }
}

impl ToSql for TicketType {
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

#[derive(
    Clone, Copy, Debug, Deserialize, Eq, TryFromRepr, PartialEq, Serialize,
)]
#[repr(u8)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Submitted and waiting for staff review.
    Pending = 1,

    /// Staff attached a price; the owner decides whether to proceed.
    QuoteSent = 2,

    /// Both sides agreed; the trade is being carried out.
    Processing = 3,

    /// Trade done, ticket closed.
    Completed = 4,

    /// Withdrawn or declined by either side.
    Cancelled = 5,
}

impl Status {
    pub fn from_slug(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "quote_sent" => Some(Self::QuoteSent),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::QuoteSent => "quote_sent",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether the ticket owner may move a ticket from `self` to `to`.
    /// Re-setting the current status is a permitted no-op, so repeating
    /// an update stays safe.
    pub fn owner_may_move(self, to: Self) -> bool {
        self == to
            || matches!(
                (self, to),
                (Self::Pending, Self::Cancelled)
                    | (Self::QuoteSent, Self::Processing)
                    | (Self::QuoteSent, Self::Cancelled)
            )
    }

    /// Whether staff may move a ticket from `self` to `to`.
    pub fn admin_may_move(self, to: Self) -> bool {
        if self == to {
            return true;
        }
        match self {
            Self::Pending => matches!(
                to,
                Self::QuoteSent
                    | Self::Processing
                    | Self::Completed
                    | Self::Cancelled
            ),
            Self::QuoteSent => matches!(
                to,
                Self::Processing | Self::Completed | Self::Cancelled
            ),
            Self::Processing => {
                matches!(to, Self::Completed | Self::Cancelled)
            }
            Self::Completed | Self::Cancelled => false,
        }
    }
}

impl FromSql<'_> for Status {
    accepts!(INT2);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        let repr = i16::from_sql(ty, raw)?;
        let repr = u8::try_from(repr)?;
        let status = Self::try_from(repr).map_err(|_| "invalid status")?;
        Ok(status)
    }
}

impl ToSql for Status {
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

impl Client {
    pub async fn get_ticket_by_id(
        &self,
        id: Id,
    ) -> Result<Option<Ticket>, Error> {
        const SQL: &str = "\
            SELECT id, user_id, ticket_type, skin_name, condition, \
                   status, quoted_price, user_notes, admin_notes, \
                   created_at, updated_at \
            FROM tickets \
            WHERE id = $1";
        Ok(self.0.query_opt(SQL, &[&id]).await?.map(|row| Ticket {
            id: row.get("id"),
            user_id: row.get("user_id"),
            ticket_type: row.get("ticket_type"),
            skin_name: row.get("skin_name"),
            condition: row.get("condition"),
            status: row.get("status"),
            quoted_price: row.get("quoted_price"),
            user_notes: row.get("user_notes"),
            admin_notes: row.get("admin_notes"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }))
    }

    pub async fn insert_ticket(&self, ticket: &Ticket) -> Result<(), Error> {
        const SQL: &str = "\
            INSERT INTO tickets (id, user_id, ticket_type, skin_name, \
                                 condition, status, quoted_price, \
                                 user_notes, admin_notes, created_at, \
                                 updated_at) \
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)";
        self.0
            .execute(
                SQL,
                &[
                    &ticket.id,
                    &ticket.user_id,
                    &ticket.ticket_type,
                    &ticket.skin_name,
                    &ticket.condition,
                    &ticket.status,
                    &ticket.quoted_price,
                    &ticket.user_notes,
                    &ticket.admin_notes,
                    &ticket.created_at,
                    &ticket.updated_at,
                ],
            )
            .await
            .map(drop)
    }

    /// Writes the owner-editable fields (status and user notes), guarded
    /// by the status the caller read, and returns the stored row. `None`
    /// means a concurrent update changed the status first and nothing
    /// was written.
    pub async fn update_ticket_as_owner(
        &self,
        ticket: &Ticket,
        read_status: Status,
    ) -> Result<Option<Ticket>, Error> {
        const SQL: &str = "\
            UPDATE tickets \
            SET status = $2, \
                user_notes = $3, \
                updated_at = $4 \
            WHERE id = $1 \
              AND status = $5 \
            RETURNING id, user_id, ticket_type, skin_name, condition, \
                      status, quoted_price, user_notes, admin_notes, \
                      created_at, updated_at";
        Ok(self
            .0
            .query_opt(
                SQL,
                &[
                    &ticket.id,
                    &ticket.status,
                    &ticket.user_notes,
                    &ticket.updated_at,
                    &read_status,
                ],
            )
            .await?
            .map(|row| Ticket {
                id: row.get("id"),
                user_id: row.get("user_id"),
                ticket_type: row.get("ticket_type"),
                skin_name: row.get("skin_name"),
                condition: row.get("condition"),
                status: row.get("status"),
                quoted_price: row.get("quoted_price"),
                user_notes: row.get("user_notes"),
                admin_notes: row.get("admin_notes"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            }))
    }

    /// Writes the staff-editable fields (status, quote and admin notes)
    /// under the same status guard. The owner's notes are never part of
    /// the SET list; an interleaved owner edit survives this write.
    pub async fn update_ticket_as_admin(
        &self,
        ticket: &Ticket,
        read_status: Status,
    ) -> Result<Option<Ticket>, Error> {
        const SQL: &str = "\
            UPDATE tickets \
            SET status = $2, \
                quoted_price = $3, \
                admin_notes = $4, \
                updated_at = $5 \
            WHERE id = $1 \
              AND status = $6 \
            RETURNING id, user_id, ticket_type, skin_name, condition, \
                      status, quoted_price, user_notes, admin_notes, \
                      created_at, updated_at";
        Ok(self
            .0
            .query_opt(
                SQL,
                &[
                    &ticket.id,
                    &ticket.status,
                    &ticket.quoted_price,
                    &ticket.admin_notes,
                    &ticket.updated_at,
                    &read_status,
                ],
            )
            .await?
            .map(|row| Ticket {
                id: row.get("id"),
                user_id: row.get("user_id"),
                ticket_type: row.get("ticket_type"),
                skin_name: row.get("skin_name"),
                condition: row.get("condition"),
                status: row.get("status"),
                quoted_price: row.get("quoted_price"),
                user_notes: row.get("user_notes"),
                admin_notes: row.get("admin_notes"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            }))
    }

    pub async fn get_tickets_page(
        &self,
        user_id: Option<user::Id>,
        status: Option<Status>,
        ticket_type: Option<TicketType>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Ticket>, Error> {
        let offset = i64::try_from(offset).unwrap();
        let limit = i64::try_from(limit).unwrap();

        const SQL: &str = "\
            SELECT id, user_id, ticket_type, skin_name, condition, \
                   status, quoted_price, user_notes, admin_notes, \
                   created_at, updated_at \
            FROM tickets \
            WHERE ($1::UUID IS NULL OR user_id = $1) \
              AND ($2::INT2 IS NULL OR status = $2) \
              AND ($3::INT2 IS NULL OR ticket_type = $3) \
            ORDER BY created_at DESC, \
                     id DESC \
            OFFSET $4 LIMIT $5";
        Ok(self
            .0
            .query(SQL, &[&user_id, &status, &ticket_type, &offset, &limit])
            .await?
            .into_iter()
            .map(|row| Ticket {
                id: row.get("id"),
                user_id: row.get("user_id"),
                ticket_type: row.get("ticket_type"),
                skin_name: row.get("skin_name"),
                condition: row.get("condition"),
                status: row.get("status"),
                quoted_price: row.get("quoted_price"),
                user_notes: row.get("user_notes"),
                admin_notes: row.get("admin_notes"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            })
            .collect())
    }

    pub async fn get_tickets_count(
        &self,
        user_id: Option<user::Id>,
        status: Option<Status>,
        ticket_type: Option<TicketType>,
    ) -> Result<usize, Error> {
        const SQL: &str = "\
            SELECT COUNT(*) \
            FROM tickets \
            WHERE ($1::UUID IS NULL OR user_id = $1) \
              AND ($2::INT2 IS NULL OR status = $2) \
              AND ($3::INT2 IS NULL OR ticket_type = $3)";
        Ok(self
            .0
            .query_one(SQL, &[&user_id, &status, &ticket_type])
            .await?
            .get::<_, i64>(0)
            .try_into()
            .unwrap())
    }
}
