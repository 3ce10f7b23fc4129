use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{api, db};

pub use crate::db::{
    skin::Condition,
    ticket::{Id, Status, TicketType},
};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Ticket {
    pub id: Id,
    #[serde(rename = "type")]
    pub ticket_type: TicketType,
    pub skin_name: String,
    pub condition: Condition,
    pub condition_name: String,
    pub status: Status,
    pub quoted_price: Option<f64>,
    pub user_notes: Option<String>,
    pub admin_notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<db::Ticket> for Ticket {
    fn from(ticket: db::Ticket) -> Self {
        Self {
            id: ticket.id,
            ticket_type: ticket.ticket_type,
            skin_name: ticket.skin_name,
            condition: ticket.condition,
            condition_name: ticket.condition.name().to_string(),
            status: ticket.status,
            quoted_price: ticket.quoted_price,
            user_notes: ticket.user_notes,
            admin_notes: ticket.admin_notes,
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
        }
    }
}

/// A ticket as the staff dashboard sees it, with the owner embedded.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AdminTicket {
    pub id: Id,
    #[serde(rename = "type")]
    pub ticket_type: TicketType,
    pub skin_name: String,
    pub condition: Condition,
    pub condition_name: String,
    pub status: Status,
    pub quoted_price: Option<f64>,
    pub user_notes: Option<String>,
    pub admin_notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub user: api::User,
}

impl AdminTicket {
    pub fn new(ticket: db::Ticket, user: api::User) -> Self {
        Self {
            id: ticket.id,
            ticket_type: ticket.ticket_type,
            skin_name: ticket.skin_name,
            condition: ticket.condition,
            condition_name: ticket.condition.name().to_string(),
            status: ticket.status,
            quoted_price: ticket.quoted_price,
            user_notes: ticket.user_notes,
            admin_notes: ticket.admin_notes,
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
            user,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct List {
    pub tickets: Vec<Ticket>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    #[serde(rename = "totalPages")]
    pub total_pages: usize,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AdminList {
    pub tickets: Vec<AdminTicket>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    #[serde(rename = "totalPages")]
    pub total_pages: usize,
}
