pub mod common;

use lilo_store::{db, Config};
use time::OffsetDateTime;

// The edit handlers read a ticket, then write it back under a status
// guard. These tests drive the guarded writes directly to replay two
// callers working from the same read.

async fn db_client() -> db::Client {
    let config = tokio::fs::read_to_string("config.toml")
        .await
        .expect("failed to read config.toml");
    let config =
        toml::from_str::<Config>(&config).expect("failed to parse config.toml");

    let (client, connection) = db::connect(config.db)
        .await
        .expect("failed to connect to the database");
    tokio::task::spawn(async move {
        if let Err(e) = connection.await {
            panic!("database connection failed: {e}");
        }
    });

    client
}

#[tokio::test]
async fn notes_edit_from_a_stale_read_keeps_a_fresh_quote() {
    let client = common::Client::new()
        .auth(&common::unique_email(), "Alice")
        .await;
    let created = client
        .add_ticket("sell", "AK-47 | Redline", "ft")
        .await
        .unwrap();

    let db_client = db_client().await;
    let snapshot = db_client
        .get_ticket_by_id(created.id)
        .await
        .unwrap()
        .expect("ticket should be stored");

    // Staff attach a quote without sending it, leaving the ticket pending.
    let mut quote = snapshot.clone();
    quote.quoted_price = Some(25.5);
    quote.updated_at = OffsetDateTime::now_utc();
    let written = db_client
        .update_ticket_as_admin(&quote, snapshot.status)
        .await
        .unwrap();
    assert!(written.is_some());

    // The owner's edit still works from the older read. The status never
    // changed, so it lands; the quote must survive it.
    let mut notes = snapshot.clone();
    notes.user_notes = Some("only selling this week".to_string());
    notes.updated_at = OffsetDateTime::now_utc();
    let merged = db_client
        .update_ticket_as_owner(&notes, snapshot.status)
        .await
        .unwrap()
        .expect("same-status edit should land");

    assert_eq!(merged.status, db::ticket::Status::Pending);
    assert_eq!(merged.quoted_price, Some(25.5));
    assert_eq!(merged.user_notes.as_deref(), Some("only selling this week"));
}

#[tokio::test]
async fn quote_from_a_stale_read_keeps_fresh_owner_notes() {
    let client = common::Client::new()
        .auth(&common::unique_email(), "Alice")
        .await;
    let created = client
        .add_ticket("sell", "AK-47 | Redline", "ft")
        .await
        .unwrap();

    let db_client = db_client().await;
    let snapshot = db_client
        .get_ticket_by_id(created.id)
        .await
        .unwrap()
        .expect("ticket should be stored");

    let mut notes = snapshot.clone();
    notes.user_notes = Some("cash only".to_string());
    notes.updated_at = OffsetDateTime::now_utc();
    assert!(db_client
        .update_ticket_as_owner(&notes, snapshot.status)
        .await
        .unwrap()
        .is_some());

    let mut quote = snapshot.clone();
    quote.quoted_price = Some(40.0);
    quote.updated_at = OffsetDateTime::now_utc();
    let merged = db_client
        .update_ticket_as_admin(&quote, snapshot.status)
        .await
        .unwrap()
        .expect("same-status edit should land");

    assert_eq!(merged.user_notes.as_deref(), Some("cash only"));
    assert_eq!(merged.quoted_price, Some(40.0));
}

#[tokio::test]
async fn stale_status_edit_writes_nothing() {
    let client = common::Client::new()
        .auth(&common::unique_email(), "Alice")
        .await;
    let created = client
        .add_ticket("sell", "AK-47 | Redline", "ft")
        .await
        .unwrap();

    let db_client = db_client().await;
    let snapshot = db_client
        .get_ticket_by_id(created.id)
        .await
        .unwrap()
        .expect("ticket should be stored");

    // Staff send the quote first, moving the ticket to quote_sent.
    let mut quote = snapshot.clone();
    quote.status = db::ticket::Status::QuoteSent;
    quote.quoted_price = Some(25.5);
    quote.updated_at = OffsetDateTime::now_utc();
    assert!(db_client
        .update_ticket_as_admin(&quote, snapshot.status)
        .await
        .unwrap()
        .is_some());

    // The owner's cancel still references the pending read. The guard
    // must reject it without writing any of its fields.
    let mut cancel = snapshot.clone();
    cancel.status = db::ticket::Status::Cancelled;
    cancel.user_notes = Some("never mind".to_string());
    cancel.updated_at = OffsetDateTime::now_utc();
    let rejected = db_client
        .update_ticket_as_owner(&cancel, snapshot.status)
        .await
        .unwrap();
    assert!(rejected.is_none());

    let stored = db_client
        .get_ticket_by_id(created.id)
        .await
        .unwrap()
        .expect("ticket should be stored");
    assert_eq!(stored.status, db::ticket::Status::QuoteSent);
    assert_eq!(stored.quoted_price, Some(25.5));
    assert_eq!(stored.user_notes, None);
}
