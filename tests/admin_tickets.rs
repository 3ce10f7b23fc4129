pub mod common;

use lilo_store::api;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn lists_tickets_with_owner_embedded() {
    let email = common::unique_email();
    let alice = common::Client::new().auth(&email, "Alice").await;
    let owner = alice.user().await.unwrap();
    let ticket = alice
        .add_ticket("sell", "AK-47 | Redline", "ft")
        .await
        .unwrap();

    let admin = common::Client::new()
        .auth("admin@lilo.store", "Store Admin")
        .await;
    let list = admin
        .admin_get_tickets(&format!("user_id={}", owner.id))
        .await
        .unwrap();

    assert_eq!(list.total, 1);
    match list.tickets.as_slice() {
        [only] => {
            assert_eq!(only.id, ticket.id);
            assert_eq!(only.skin_name, "AK-47 | Redline");
            assert_eq!(only.user, owner);
        }
        found => panic!("expected one ticket, found {found:?}"),
    }
}

#[tokio::test]
async fn forbids_non_staff() {
    let status = common::Client::new()
        .auth(&common::unique_email(), "Alice")
        .await
        .admin_get_tickets("")
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn forbids_missing_token() {
    let status = common::Client::new()
        .admin_get_tickets("")
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn sends_quote() {
    let alice = common::Client::new()
        .auth(&common::unique_email(), "Alice")
        .await;
    let ticket = alice
        .add_ticket("sell", "AK-47 | Redline", "ft")
        .await
        .unwrap();

    let admin = common::Client::new()
        .auth("admin@lilo.store", "Store Admin")
        .await;
    let ticket = admin.admin_send_quote(ticket.id, 25.5).await.unwrap();

    assert_eq!(ticket.status, api::ticket::Status::QuoteSent);
    assert_eq!(ticket.quoted_price, Some(25.5));
}

#[tokio::test]
async fn cant_send_quote_without_price() {
    let alice = common::Client::new()
        .auth(&common::unique_email(), "Alice")
        .await;
    let ticket = alice
        .add_ticket("sell", "AK-47 | Redline", "ft")
        .await
        .unwrap();

    let admin = common::Client::new()
        .auth("admin@lilo.store", "Store Admin")
        .await;
    let status = admin
        .admin_edit_ticket(json!({
            "id": ticket.id.to_string(),
            "status": "quote_sent",
        }))
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rejects_non_positive_quote() {
    let alice = common::Client::new()
        .auth(&common::unique_email(), "Alice")
        .await;
    let ticket = alice
        .add_ticket("sell", "AK-47 | Redline", "ft")
        .await
        .unwrap();

    let admin = common::Client::new()
        .auth("admin@lilo.store", "Store Admin")
        .await;
    let status = admin
        .admin_send_quote(ticket.id, 0.0)
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let status = admin
        .admin_send_quote(ticket.id, -3.0)
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn walks_the_full_lifecycle() {
    let alice = common::Client::new()
        .auth(&common::unique_email(), "Alice")
        .await;
    let ticket = alice
        .add_ticket("sell", "AK-47 | Redline", "ft")
        .await
        .unwrap();

    let admin = common::Client::new()
        .auth("admin@lilo.store", "Store Admin")
        .await;
    admin.admin_send_quote(ticket.id, 25.5).await.unwrap();
    alice
        .edit_ticket_status(ticket.id, "processing")
        .await
        .unwrap();
    let done = admin
        .admin_edit_ticket(json!({
            "id": ticket.id.to_string(),
            "status": "completed",
        }))
        .await
        .unwrap();

    assert_eq!(done.status, api::ticket::Status::Completed);
    assert_eq!(done.quoted_price, Some(25.5));
}

#[tokio::test]
async fn completing_twice_is_a_noop() {
    let alice = common::Client::new()
        .auth(&common::unique_email(), "Alice")
        .await;
    let ticket = alice
        .add_ticket("sell", "AK-47 | Redline", "ft")
        .await
        .unwrap();

    let admin = common::Client::new()
        .auth("admin@lilo.store", "Store Admin")
        .await;
    admin
        .admin_edit_ticket(json!({
            "id": ticket.id.to_string(),
            "status": "completed",
        }))
        .await
        .unwrap();
    let again = admin
        .admin_edit_ticket(json!({
            "id": ticket.id.to_string(),
            "status": "completed",
        }))
        .await
        .unwrap();

    assert_eq!(again.status, api::ticket::Status::Completed);
}

#[tokio::test]
async fn cant_reopen_completed_ticket() {
    let alice = common::Client::new()
        .auth(&common::unique_email(), "Alice")
        .await;
    let ticket = alice
        .add_ticket("sell", "AK-47 | Redline", "ft")
        .await
        .unwrap();

    let admin = common::Client::new()
        .auth("admin@lilo.store", "Store Admin")
        .await;
    admin
        .admin_edit_ticket(json!({
            "id": ticket.id.to_string(),
            "status": "completed",
        }))
        .await
        .unwrap();

    let status = admin
        .admin_edit_ticket(json!({
            "id": ticket.id.to_string(),
            "status": "pending",
        }))
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cant_quote_a_processing_ticket() {
    let alice = common::Client::new()
        .auth(&common::unique_email(), "Alice")
        .await;
    let ticket = alice
        .add_ticket("sell", "AK-47 | Redline", "ft")
        .await
        .unwrap();

    let admin = common::Client::new()
        .auth("admin@lilo.store", "Store Admin")
        .await;
    admin.admin_send_quote(ticket.id, 25.5).await.unwrap();
    alice
        .edit_ticket_status(ticket.id, "processing")
        .await
        .unwrap();

    let status = admin
        .admin_edit_ticket(json!({
            "id": ticket.id.to_string(),
            "quoted_price": 30.0,
        }))
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn keeps_admin_notes() {
    let alice = common::Client::new()
        .auth(&common::unique_email(), "Alice")
        .await;
    let ticket = alice
        .add_ticket("sell", "AK-47 | Redline", "ft")
        .await
        .unwrap();

    let admin = common::Client::new()
        .auth("admin@lilo.store", "Store Admin")
        .await;
    let ticket = admin
        .admin_edit_ticket(json!({
            "id": ticket.id.to_string(),
            "admin_notes": "float checked, stickers scraped",
        }))
        .await
        .unwrap();

    assert_eq!(
        ticket.admin_notes.as_deref(),
        Some("float checked, stickers scraped"),
    );
}

#[tokio::test]
async fn filters_by_status() {
    let alice = common::Client::new()
        .auth(&common::unique_email(), "Alice")
        .await;
    let owner = alice.user().await.unwrap();
    let ticket = alice
        .add_ticket("sell", "AK-47 | Redline", "ft")
        .await
        .unwrap();
    alice
        .add_ticket("buy", "AWP | Asiimov", "bs")
        .await
        .unwrap();

    let admin = common::Client::new()
        .auth("admin@lilo.store", "Store Admin")
        .await;
    admin.admin_send_quote(ticket.id, 25.5).await.unwrap();

    let list = admin
        .admin_get_tickets(&format!(
            "user_id={}&status=quote_sent",
            owner.id,
        ))
        .await
        .unwrap();
    assert_eq!(list.total, 1);
    match list.tickets.as_slice() {
        [only] => {
            assert_eq!(only.status, api::ticket::Status::QuoteSent)
        }
        found => panic!("expected one ticket, found {found:?}"),
    }
}

#[tokio::test]
async fn rejects_malformed_user_id_filter() {
    let admin = common::Client::new()
        .auth("admin@lilo.store", "Store Admin")
        .await;

    let status = admin
        .admin_get_tickets("user_id=not-a-uuid")
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
