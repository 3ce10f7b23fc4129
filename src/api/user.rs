use serde::{Deserialize, Serialize};

use crate::{admin, db};

pub use crate::db::user::Id;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct User {
    pub id: Id,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub trade_link: Option<String>,
    pub phone: Option<String>,
    pub is_admin: bool,
}

impl From<db::User> for User {
    fn from(user: db::User) -> Self {
        Self {
            id: user.id,
            is_admin: admin::is_admin(&user.email),
            email: user.email,
            name: user.name,
            avatar_url: user.avatar_url,
            trade_link: user.trade_link,
            phone: user.phone,
        }
    }
}
