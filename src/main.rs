use std::{error::Error, sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Query, State},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        request, HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, RequestPartsExt as _, Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use derive_more::From;
use itertools::Itertools as _;
use jsonwebtoken::{
    decode, encode, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::{fs, net, task};
use tower_http::cors::CorsLayer;
use tracing_subscriber::{
    layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

use lilo_store::{admin, api, db, Config};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = fs::read_to_string("config.toml").await?;
    let config = toml::from_str::<Config>(&config)?;

    let (db_client, db_connection) = db::connect(config.db).await?;

    task::spawn(async move {
        if let Err(e) = db_connection.await {
            panic!("database connection failed: {e}");
        }
    });

    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);
    for origin in &config.http.cors.allowed_origins {
        cors = cors.allow_origin(origin.parse::<HeaderValue>()?);
    }

    let app = Router::new()
        .route("/api/auth/session", post(sign_in))
        .route("/api/user", get(get_user).put(edit_user))
        .route(
            "/api/tickets",
            get(list_tickets).post(add_ticket).put(edit_ticket),
        )
        .route(
            "/api/admin/tickets",
            get(admin_list_tickets).put(admin_edit_ticket),
        )
        .route("/api/skins", get(search_skins))
        .layer(cors)
        .with_state(Arc::new(AppState {
            db_client,
            jwt_expiration_time: config.jwt.expiration_time,
            jwt_decoding_key: DecodingKey::from_secret(
                config.jwt.secret.as_bytes(),
            ),
            jwt_encoding_key: EncodingKey::from_secret(
                config.jwt.secret.as_bytes(),
            ),
        }));

    let listener = net::TcpListener::bind(config.http.server.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Deserialize)]
struct SignInInput {
    email: String,
    name: String,
    avatar_url: Option<String>,
}

/// Exchanges a provider-verified identity for a bearer session. The user
/// row is created on first sign-in; later sign-ins return the stored row
/// untouched, so profile edits survive.
async fn sign_in(
    State(state): State<SharedAppState>,
    Json(SignInInput {
        email,
        name,
        avatar_url,
    }): Json<SignInInput>,
) -> Result<String, SignInError> {
    use SignInError as E;

    let email = email.trim().to_string();
    if email.is_empty() || !email.contains('@') {
        return Err(E::InvalidEmail);
    }
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(E::InvalidName);
    }

    let now = OffsetDateTime::now_utc();
    let user = state
        .db_client
        .upsert_user(&db::User {
            id: db::user::Id::new(),
            email,
            name,
            avatar_url: avatar_url.and_then(none_if_empty),
            trade_link: None,
            phone: None,
            created_at: now,
            updated_at: now,
        })
        .await?;

    let expires_at = OffsetDateTime::now_utc() + state.jwt_expiration_time;
    encode(
        &Header::default(),
        &AuthClaims {
            user_id: user.id,
            email: user.email,
            exp: expires_at.unix_timestamp(),
        },
        &state.jwt_encoding_key,
    )
    .map_err(|_| E::TokenEncoding)
}

#[derive(Debug, From)]
pub enum SignInError {
    #[from]
    DbError(db::Error),
    InvalidEmail,
    InvalidName,
    TokenEncoding,
}

impl IntoResponse for SignInError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidEmail => error_response(
                StatusCode::BAD_REQUEST,
                "missing or invalid email",
            ),
            Self::InvalidName => error_response(
                StatusCode::BAD_REQUEST,
                "missing or invalid name",
            ),
            Self::DbError(e) => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &e.to_string(),
            ),
            Self::TokenEncoding => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to issue a session token",
            ),
        }
    }
}

async fn get_user(
    State(state): State<SharedAppState>,
    auth_claims: AuthClaims,
) -> Result<Json<api::User>, GetUserError> {
    use GetUserError as E;

    let my = state
        .db_client
        .get_user_by_id(auth_claims.user_id)
        .await?
        .ok_or(E::UserNotFound)?;

    Ok(Json(my.into()))
}

#[derive(Debug, From)]
pub enum GetUserError {
    #[from]
    DbError(db::Error),
    UserNotFound,
}

impl IntoResponse for GetUserError {
    fn into_response(self) -> Response {
        match self {
            Self::UserNotFound => {
                error_response(StatusCode::NOT_FOUND, "user not found")
            }
            Self::DbError(e) => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &e.to_string(),
            ),
        }
    }
}

#[derive(Deserialize)]
struct EditUserInput {
    name: Option<String>,
    avatar_url: Option<String>,
    trade_link: Option<String>,
    phone: Option<String>,
}

/// Profile-field edits. Provided fields overwrite, absent fields stay and
/// an empty string clears an optional field. Email is the identity key
/// and cannot change.
async fn edit_user(
    State(state): State<SharedAppState>,
    auth_claims: AuthClaims,
    Json(input): Json<EditUserInput>,
) -> Result<Json<api::User>, EditUserError> {
    use EditUserError as E;

    let mut my = state
        .db_client
        .get_user_by_id(auth_claims.user_id)
        .await?
        .ok_or(E::UserNotFound)?;

    if let Some(name) = input.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(E::InvalidName);
        }
        my.name = name;
    }
    if let Some(avatar_url) = input.avatar_url {
        my.avatar_url = none_if_empty(avatar_url);
    }
    if let Some(trade_link) = input.trade_link {
        my.trade_link = none_if_empty(trade_link);
    }
    if let Some(phone) = input.phone {
        my.phone = none_if_empty(phone);
    }
    my.updated_at = OffsetDateTime::now_utc();

    state.db_client.update_user(&my).await?;

    Ok(Json(my.into()))
}

#[derive(Debug, From)]
pub enum EditUserError {
    #[from]
    DbError(db::Error),
    InvalidName,
    UserNotFound,
}

impl IntoResponse for EditUserError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidName => error_response(
                StatusCode::BAD_REQUEST,
                "name cannot be blank",
            ),
            Self::UserNotFound => {
                error_response(StatusCode::NOT_FOUND, "user not found")
            }
            Self::DbError(e) => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &e.to_string(),
            ),
        }
    }
}

#[derive(Deserialize)]
struct ListTicketsInput {
    status: Option<String>,
    #[serde(rename = "type")]
    ticket_type: Option<String>,
    page: Option<usize>,
    limit: Option<usize>,
}

async fn list_tickets(
    State(state): State<SharedAppState>,
    auth_claims: AuthClaims,
    Query(input): Query<ListTicketsInput>,
) -> Result<Json<api::ticket::List>, ListTicketsError> {
    use ListTicketsError as E;

    let status = match input.status.as_deref() {
        None => None,
        Some(value) => Some(
            db::ticket::Status::from_slug(value).ok_or(E::InvalidStatus)?,
        ),
    };
    let ticket_type = match input.ticket_type.as_deref() {
        None => None,
        Some(value) => Some(
            db::ticket::TicketType::from_slug(value)
                .ok_or(E::InvalidType)?,
        ),
    };
    let page = api::page_params(input.page, input.limit)
        .ok_or(E::InvalidPagination)?;

    let user_id = Some(auth_claims.user_id);
    let page_fut = state.db_client.get_tickets_page(
        user_id,
        status,
        ticket_type,
        page.offset,
        page.limit,
    );
    let count_fut =
        state
            .db_client
            .get_tickets_count(user_id, status, ticket_type);
    let (rows, total) = tokio::try_join!(page_fut, count_fut)?;

    Ok(Json(api::ticket::List {
        tickets: rows.into_iter().map(Into::into).collect(),
        total,
        page: page.number,
        limit: page.limit,
        total_pages: api::page_count(total, page.limit),
    }))
}

#[derive(Debug, From)]
pub enum ListTicketsError {
    #[from]
    DbError(db::Error),
    InvalidPagination,
    InvalidStatus,
    InvalidType,
}

impl IntoResponse for ListTicketsError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidPagination => error_response(
                StatusCode::BAD_REQUEST,
                "page and limit must be positive",
            ),
            Self::InvalidStatus => error_response(
                StatusCode::BAD_REQUEST,
                "invalid status filter",
            ),
            Self::InvalidType => error_response(
                StatusCode::BAD_REQUEST,
                "invalid type filter",
            ),
            Self::DbError(e) => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &e.to_string(),
            ),
        }
    }
}

#[derive(Deserialize)]
struct AddTicketInput {
    #[serde(rename = "type")]
    ticket_type: Option<String>,
    skin_name: Option<String>,
    condition: Option<String>,
    user_notes: Option<String>,
}

/// Creates a buy or sell request. The skin is referenced by its market
/// name rather than a catalog key: sell requests may legitimately name
/// skins the store does not list yet.
async fn add_ticket(
    State(state): State<SharedAppState>,
    auth_claims: AuthClaims,
    Json(input): Json<AddTicketInput>,
) -> Result<Json<api::Ticket>, AddTicketError> {
    use AddTicketError as E;

    let ticket_type = input
        .ticket_type
        .as_deref()
        .and_then(db::ticket::TicketType::from_slug)
        .ok_or(E::InvalidType)?;
    let condition = input
        .condition
        .as_deref()
        .and_then(db::skin::Condition::from_slug)
        .ok_or(E::InvalidCondition)?;
    let skin_name = input
        .skin_name
        .and_then(none_if_empty)
        .ok_or(E::MissingSkinName)?;

    let my = state
        .db_client
        .get_user_by_id(auth_claims.user_id)
        .await?
        .ok_or(E::UserNotFound)?;

    let now = OffsetDateTime::now_utc();
    let ticket = db::Ticket {
        id: db::ticket::Id::new(),
        user_id: my.id,
        ticket_type,
        skin_name,
        condition,
        status: db::ticket::Status::Pending,
        quoted_price: None,
        user_notes: input.user_notes.and_then(none_if_empty),
        admin_notes: None,
        created_at: now,
        updated_at: now,
    };

    state.db_client.insert_ticket(&ticket).await?;

    Ok(Json(ticket.into()))
}

#[derive(Debug, From)]
pub enum AddTicketError {
    #[from]
    DbError(db::Error),
    InvalidCondition,
    InvalidType,
    MissingSkinName,
    UserNotFound,
}

impl IntoResponse for AddTicketError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidCondition => error_response(
                StatusCode::BAD_REQUEST,
                "missing or invalid condition",
            ),
            Self::InvalidType => error_response(
                StatusCode::BAD_REQUEST,
                "missing or invalid ticket type",
            ),
            Self::MissingSkinName => error_response(
                StatusCode::BAD_REQUEST,
                "missing skin name",
            ),
            Self::UserNotFound => {
                error_response(StatusCode::NOT_FOUND, "user not found")
            }
            Self::DbError(e) => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &e.to_string(),
            ),
        }
    }
}

#[derive(Deserialize)]
struct EditTicketInput {
    id: Option<String>,
    status: Option<String>,
    user_notes: Option<String>,
}

/// The owner's side of the ticket lifecycle: cancel while pending, accept
/// or decline a quote. Staff changes go through the admin route.
async fn edit_ticket(
    State(state): State<SharedAppState>,
    auth_claims: AuthClaims,
    Json(input): Json<EditTicketInput>,
) -> Result<Json<api::Ticket>, EditTicketError> {
    use EditTicketError as E;

    let id = input
        .id
        .as_deref()
        .and_then(db::ticket::Id::parse)
        .ok_or(E::InvalidId)?;
    let new_status = match input.status.as_deref() {
        None => None,
        Some(value) => Some(
            db::ticket::Status::from_slug(value).ok_or(E::InvalidStatus)?,
        ),
    };

    let mut ticket = state
        .db_client
        .get_ticket_by_id(id)
        .await?
        .ok_or(E::TicketNotFound)?;
    if ticket.user_id != auth_claims.user_id {
        return Err(E::NotTicketOwner);
    }

    let read_status = ticket.status;
    if let Some(to) = new_status {
        if !ticket.status.owner_may_move(to) {
            return Err(E::IllegalTransition);
        }
        ticket.status = to;
    }
    if let Some(notes) = input.user_notes {
        // The notes fields double as a message thread, so they stay
        // editable in every state.
        ticket.user_notes = none_if_empty(notes);
    }
    ticket.updated_at = OffsetDateTime::now_utc();

    let ticket = state
        .db_client
        .update_ticket_as_owner(&ticket, read_status)
        .await?
        .ok_or(E::UpdateConflict)?;

    Ok(Json(ticket.into()))
}

#[derive(Debug, From)]
pub enum EditTicketError {
    #[from]
    DbError(db::Error),
    IllegalTransition,
    InvalidId,
    InvalidStatus,
    NotTicketOwner,
    TicketNotFound,
    UpdateConflict,
}

impl IntoResponse for EditTicketError {
    fn into_response(self) -> Response {
        match self {
            Self::IllegalTransition => error_response(
                StatusCode::BAD_REQUEST,
                "illegal status transition",
            ),
            Self::InvalidId => error_response(
                StatusCode::BAD_REQUEST,
                "missing or invalid ticket id",
            ),
            Self::InvalidStatus => {
                error_response(StatusCode::BAD_REQUEST, "invalid status")
            }
            Self::NotTicketOwner => {
                error_response(StatusCode::FORBIDDEN, "not the ticket owner")
            }
            Self::TicketNotFound => {
                error_response(StatusCode::NOT_FOUND, "ticket not found")
            }
            Self::UpdateConflict => error_response(
                StatusCode::CONFLICT,
                "ticket was changed by a concurrent update",
            ),
            Self::DbError(e) => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &e.to_string(),
            ),
        }
    }
}

#[derive(Deserialize)]
struct AdminListTicketsInput {
    status: Option<String>,
    #[serde(rename = "type")]
    ticket_type: Option<String>,
    user_id: Option<String>,
    page: Option<usize>,
    limit: Option<usize>,
}

async fn admin_list_tickets(
    State(state): State<SharedAppState>,
    _: AdminClaims,
    Query(input): Query<AdminListTicketsInput>,
) -> Result<Json<api::ticket::AdminList>, AdminListTicketsError> {
    use AdminListTicketsError as E;

    let status = match input.status.as_deref() {
        None => None,
        Some(value) => Some(
            db::ticket::Status::from_slug(value).ok_or(E::InvalidStatus)?,
        ),
    };
    let ticket_type = match input.ticket_type.as_deref() {
        None => None,
        Some(value) => Some(
            db::ticket::TicketType::from_slug(value)
                .ok_or(E::InvalidType)?,
        ),
    };
    let user_id = match input.user_id.as_deref() {
        None => None,
        Some(value) => {
            Some(db::user::Id::parse(value).ok_or(E::InvalidUserId)?)
        }
    };
    let page = api::page_params(input.page, input.limit)
        .ok_or(E::InvalidPagination)?;

    let page_fut = state.db_client.get_tickets_page(
        user_id,
        status,
        ticket_type,
        page.offset,
        page.limit,
    );
    let count_fut =
        state
            .db_client
            .get_tickets_count(user_id, status, ticket_type);
    let (rows, total) = tokio::try_join!(page_fut, count_fut)?;

    let user_ids = rows
        .iter()
        .map(|ticket| ticket.user_id)
        .unique()
        .collect::<Vec<_>>();
    let users = state.db_client.get_users_by_ids(&user_ids).await?;

    let tickets = rows
        .into_iter()
        .map(|ticket| {
            let user =
                users.get(&ticket.user_id).ok_or(E::UserNotFound)?;
            Ok::<_, E>(api::ticket::AdminTicket::new(
                ticket,
                user.clone().into(),
            ))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(api::ticket::AdminList {
        tickets,
        total,
        page: page.number,
        limit: page.limit,
        total_pages: api::page_count(total, page.limit),
    }))
}

#[derive(Debug, From)]
pub enum AdminListTicketsError {
    #[from]
    DbError(db::Error),
    InvalidPagination,
    InvalidStatus,
    InvalidType,
    InvalidUserId,
    UserNotFound,
}

impl IntoResponse for AdminListTicketsError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidPagination => error_response(
                StatusCode::BAD_REQUEST,
                "page and limit must be positive",
            ),
            Self::InvalidStatus => error_response(
                StatusCode::BAD_REQUEST,
                "invalid status filter",
            ),
            Self::InvalidType => error_response(
                StatusCode::BAD_REQUEST,
                "invalid type filter",
            ),
            Self::InvalidUserId => error_response(
                StatusCode::BAD_REQUEST,
                "invalid user id filter",
            ),
            Self::UserNotFound => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "user not found",
            ),
            Self::DbError(e) => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &e.to_string(),
            ),
        }
    }
}

#[derive(Deserialize)]
struct AdminEditTicketInput {
    id: Option<String>,
    status: Option<String>,
    quoted_price: Option<f64>,
    admin_notes: Option<String>,
}

/// The staff side of the lifecycle: attach a quote, move the ticket
/// forward, or close it. A quote can only be edited while the ticket is
/// pending or quoted, and sending a quote requires a price.
async fn admin_edit_ticket(
    State(state): State<SharedAppState>,
    _: AdminClaims,
    Json(input): Json<AdminEditTicketInput>,
) -> Result<Json<api::ticket::AdminTicket>, AdminEditTicketError> {
    use AdminEditTicketError as E;

    let id = input
        .id
        .as_deref()
        .and_then(db::ticket::Id::parse)
        .ok_or(E::InvalidId)?;
    let new_status = match input.status.as_deref() {
        None => None,
        Some(value) => Some(
            db::ticket::Status::from_slug(value).ok_or(E::InvalidStatus)?,
        ),
    };

    let mut ticket = state
        .db_client
        .get_ticket_by_id(id)
        .await?
        .ok_or(E::TicketNotFound)?;

    let read_status = ticket.status;
    if let Some(price) = input.quoted_price {
        if price.is_nan() || price <= 0.0 {
            return Err(E::InvalidQuote);
        }
        if !matches!(
            ticket.status,
            db::ticket::Status::Pending | db::ticket::Status::QuoteSent,
        ) {
            return Err(E::QuoteNotEditable);
        }
        ticket.quoted_price = Some(price);
    }
    if let Some(to) = new_status {
        if !ticket.status.admin_may_move(to) {
            return Err(E::IllegalTransition);
        }
        if to == db::ticket::Status::QuoteSent
            && ticket.quoted_price.is_none()
        {
            return Err(E::MissingQuote);
        }
        ticket.status = to;
    }
    if let Some(notes) = input.admin_notes {
        ticket.admin_notes = none_if_empty(notes);
    }
    ticket.updated_at = OffsetDateTime::now_utc();

    let ticket = state
        .db_client
        .update_ticket_as_admin(&ticket, read_status)
        .await?
        .ok_or(E::UpdateConflict)?;

    let owner = state
        .db_client
        .get_user_by_id(ticket.user_id)
        .await?
        .ok_or(E::UserNotFound)?;

    Ok(Json(api::ticket::AdminTicket::new(ticket, owner.into())))
}

#[derive(Debug, From)]
pub enum AdminEditTicketError {
    #[from]
    DbError(db::Error),
    IllegalTransition,
    InvalidId,
    InvalidQuote,
    InvalidStatus,
    MissingQuote,
    QuoteNotEditable,
    TicketNotFound,
    UpdateConflict,
    UserNotFound,
}

impl IntoResponse for AdminEditTicketError {
    fn into_response(self) -> Response {
        match self {
            Self::IllegalTransition => error_response(
                StatusCode::BAD_REQUEST,
                "illegal status transition",
            ),
            Self::InvalidId => error_response(
                StatusCode::BAD_REQUEST,
                "missing or invalid ticket id",
            ),
            Self::InvalidQuote => error_response(
                StatusCode::BAD_REQUEST,
                "quoted price must be positive",
            ),
            Self::InvalidStatus => {
                error_response(StatusCode::BAD_REQUEST, "invalid status")
            }
            Self::MissingQuote => error_response(
                StatusCode::BAD_REQUEST,
                "cannot send a quote without a price",
            ),
            Self::QuoteNotEditable => error_response(
                StatusCode::BAD_REQUEST,
                "quote can only change while the ticket is being quoted",
            ),
            Self::TicketNotFound => {
                error_response(StatusCode::NOT_FOUND, "ticket not found")
            }
            Self::UpdateConflict => error_response(
                StatusCode::CONFLICT,
                "ticket was changed by a concurrent update",
            ),
            Self::UserNotFound => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "user not found",
            ),
            Self::DbError(e) => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &e.to_string(),
            ),
        }
    }
}

#[derive(Deserialize)]
struct SearchSkinsInput {
    search: Option<String>,
    weapons: Option<String>,
    rarities: Option<String>,
    conditions: Option<String>,
    price_min: Option<f64>,
    price_max: Option<f64>,
    sort: Option<String>,
    page: Option<usize>,
    limit: Option<usize>,
}

/// Catalog search, open to anonymous callers. Multi-select filters arrive
/// comma-separated; every filter is evaluated inside the query so the
/// page and the reported total always agree.
async fn search_skins(
    State(state): State<SharedAppState>,
    Query(input): Query<SearchSkinsInput>,
) -> Result<Json<api::skin::List>, SearchSkinsError> {
    use SearchSkinsError as E;

    let mut rarities = Vec::new();
    if let Some(value) = input.rarities.as_deref() {
        for part in value.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            rarities
                .push(db::skin::Rarity::from_slug(part).ok_or(E::InvalidRarity)?);
        }
    }
    let mut conditions = Vec::new();
    if let Some(value) = input.conditions.as_deref() {
        for part in value.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            conditions.push(
                db::skin::Condition::from_slug(part)
                    .ok_or(E::InvalidCondition)?,
            );
        }
    }
    let weapons = input
        .weapons
        .as_deref()
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    let sort = match input.sort.as_deref() {
        None => db::skin::Sort::default(),
        Some(value) => {
            db::skin::Sort::from_slug(value).ok_or(E::InvalidSort)?
        }
    };
    let page = api::page_params(input.page, input.limit)
        .ok_or(E::InvalidPagination)?;

    let search = db::skin::Search {
        name: input.search.and_then(none_if_empty),
        weapons,
        rarities,
        conditions,
        price_min: input.price_min,
        price_max: input.price_max,
        sort,
    };

    let page_fut = state
        .db_client
        .search_skins_page(&search, page.offset, page.limit);
    let count_fut = state.db_client.search_skins_count(&search);
    let (hits, total) = tokio::try_join!(page_fut, count_fut)?;

    let skin_ids = hits.iter().map(|hit| hit.id).collect::<Vec<_>>();
    let mut prices = state.db_client.get_condition_prices(&skin_ids).await?;

    let data = hits
        .into_iter()
        .map(|hit| api::Skin {
            id: hit.id,
            rarity: hit.rarity,
            rarity_name: hit.rarity.name().to_string(),
            name: hit.name,
            weapon: hit.weapon,
            min_price: hit.min_price,
            conditions: prices
                .remove(&hit.id)
                .unwrap_or_default()
                .into_iter()
                .map(Into::into)
                .collect(),
        })
        .collect();

    Ok(Json(api::skin::List {
        data,
        total,
        page: page.number,
        limit: page.limit,
        total_pages: api::page_count(total, page.limit),
    }))
}

#[derive(Debug, From)]
pub enum SearchSkinsError {
    #[from]
    DbError(db::Error),
    InvalidCondition,
    InvalidPagination,
    InvalidRarity,
    InvalidSort,
}

impl IntoResponse for SearchSkinsError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidCondition => error_response(
                StatusCode::BAD_REQUEST,
                "invalid condition filter",
            ),
            Self::InvalidPagination => error_response(
                StatusCode::BAD_REQUEST,
                "page and limit must be positive",
            ),
            Self::InvalidRarity => error_response(
                StatusCode::BAD_REQUEST,
                "invalid rarity filter",
            ),
            Self::InvalidSort => {
                error_response(StatusCode::BAD_REQUEST, "invalid sort")
            }
            Self::DbError(e) => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &e.to_string(),
            ),
        }
    }
}

fn none_if_empty(value: String) -> Option<String> {
    let value = value.trim().to_string();
    (!value.is_empty()).then_some(value)
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(api::Error {
            error: message.to_string(),
        }),
    )
        .into_response()
}

type SharedAppState = Arc<AppState>;

struct AppState {
    db_client: db::Client,

    jwt_expiration_time: Duration,

    jwt_decoding_key: DecodingKey,

    jwt_encoding_key: EncodingKey,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AuthClaims {
    user_id: api::user::Id,
    email: String,
    exp: i64,
}

#[async_trait]
impl FromRequestParts<SharedAppState> for AuthClaims {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut request::Parts,
        state: &SharedAppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AuthError::InvalidToken)?;
        let token_data = decode::<Self>(
            bearer.token(),
            &state.jwt_decoding_key,
            &Validation::default(),
        )
        .map_err(|_| AuthError::InvalidToken)?;

        Ok(token_data.claims)
    }
}

#[derive(Debug)]
pub enum AuthError {
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidToken => error_response(
                StatusCode::UNAUTHORIZED,
                "missing or invalid token",
            ),
        }
    }
}

/// Proof that the session email is on the staff allowlist. Admin routes
/// render every authentication failure as 403, including a missing or
/// invalid token.
pub struct AdminClaims;

#[async_trait]
impl FromRequestParts<SharedAppState> for AdminClaims {
    type Rejection = AdminError;

    async fn from_request_parts(
        parts: &mut request::Parts,
        state: &SharedAppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = AuthClaims::from_request_parts(parts, state)
            .await
            .map_err(|_| AdminError::Forbidden)?;
        if !admin::is_admin(&claims.email) {
            return Err(AdminError::Forbidden);
        }

        Ok(Self)
    }
}

#[derive(Debug)]
pub enum AdminError {
    Forbidden,
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        match self {
            Self::Forbidden => {
                error_response(StatusCode::FORBIDDEN, "forbidden")
            }
        }
    }
}
