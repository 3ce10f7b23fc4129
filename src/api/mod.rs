pub mod skin;
pub mod ticket;
pub mod user;

use serde::{Deserialize, Serialize};

pub use self::{skin::Skin, ticket::Ticket, user::User};

/// Body shape every failed request renders as.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Error {
    pub error: String,
}

pub const DEFAULT_PAGE_LIMIT: usize = 20;
pub const MAX_PAGE_LIMIT: usize = 100;

/// A validated pagination window.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Page {
    pub number: usize,
    pub limit: usize,
    pub offset: usize,
}

/// Resolves the page/limit query parameters, defaulting to the first page
/// of [`DEFAULT_PAGE_LIMIT`] rows. The limit must be between 1 and
/// [`MAX_PAGE_LIMIT`]; the page must be nonzero and its offset must fit
/// the database's integer range.
pub fn page_params(page: Option<usize>, limit: Option<usize>) -> Option<Page> {
    let number = page.unwrap_or(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    if number == 0 || limit == 0 || limit > MAX_PAGE_LIMIT {
        return None;
    }
    let offset = (number - 1)
        .checked_mul(limit)
        .filter(|&offset| i64::try_from(offset).is_ok())?;
    Some(Page {
        number,
        limit,
        offset,
    })
}

pub fn page_count(total: usize, limit: usize) -> usize {
    total.div_ceil(limit)
}
