use constcat::concat;
use lilo_store::api;
use reqwest::StatusCode;
use serde_json::json;

const BASE_URL: &str = "http://localhost:3000";

pub struct Client {
    inner: reqwest::Client,
    pub auth_token: Option<String>,
}

/// Unique sign-in email, so tests never share a user.
pub fn unique_email() -> String {
    format!("{}@example.com", uuid::Uuid::new_v4())
}

impl Client {
    pub fn new() -> Self {
        Self {
            inner: reqwest::Client::new(),
            auth_token: None,
        }
    }

    pub async fn auth(mut self, email: &str, name: &str) -> Self {
        const URL: &str = concat!(BASE_URL, "/api/auth/session");

        self.auth_token = Some(
            self.inner
                .post(URL)
                .json(&json!({
                    "email": email,
                    "name": name,
                }))
                .send()
                .await
                .expect("failed to send a request")
                .error_for_status()
                .expect("wrong status code")
                .text()
                .await
                .expect("failed to get a response"),
        );

        self
    }

    pub async fn try_auth(
        &self,
        body: serde_json::Value,
    ) -> Result<String, StatusCode> {
        const URL: &str = concat!(BASE_URL, "/api/auth/session");

        Ok(self
            .inner
            .post(URL)
            .json(&body)
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .text()
            .await
            .expect("failed to get a response"))
    }

    pub async fn user(&self) -> Result<api::User, StatusCode> {
        const URL: &str = concat!(BASE_URL, "/api/user");

        let mut req = self.inner.get(URL);
        if let Some(token) = &self.auth_token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        Ok(req
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<api::User>()
            .await
            .expect("failed to get a response"))
    }

    pub async fn edit_user(
        &self,
        body: serde_json::Value,
    ) -> Result<api::User, StatusCode> {
        const URL: &str = concat!(BASE_URL, "/api/user");

        let mut req = self.inner.put(URL);
        if let Some(token) = &self.auth_token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        Ok(req
            .json(&body)
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<api::User>()
            .await
            .expect("failed to get a response"))
    }

    pub async fn get_tickets(
        &self,
        query: &str,
    ) -> Result<api::ticket::List, StatusCode> {
        const URL: &str = concat!(BASE_URL, "/api/tickets");

        let mut req = self.inner.get(format!("{URL}?{query}"));
        if let Some(token) = &self.auth_token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        Ok(req
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<api::ticket::List>()
            .await
            .expect("failed to get a response"))
    }

    pub async fn add_ticket(
        &self,
        ticket_type: &str,
        skin_name: &str,
        condition: &str,
    ) -> Result<api::Ticket, StatusCode> {
        const URL: &str = concat!(BASE_URL, "/api/tickets");

        let mut req = self.inner.post(URL);
        if let Some(token) = &self.auth_token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        Ok(req
            .json(&json!({
                "type": ticket_type,
                "skin_name": skin_name,
                "condition": condition,
            }))
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<api::Ticket>()
            .await
            .expect("failed to get a response"))
    }

    pub async fn edit_ticket(
        &self,
        body: serde_json::Value,
    ) -> Result<api::Ticket, StatusCode> {
        const URL: &str = concat!(BASE_URL, "/api/tickets");

        let mut req = self.inner.put(URL);
        if let Some(token) = &self.auth_token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        Ok(req
            .json(&body)
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<api::Ticket>()
            .await
            .expect("failed to get a response"))
    }

    pub async fn edit_ticket_status(
        &self,
        id: api::ticket::Id,
        status: &str,
    ) -> Result<api::Ticket, StatusCode> {
        self.edit_ticket(json!({
            "id": id.to_string(),
            "status": status,
        }))
        .await
    }

    pub async fn edit_ticket_notes(
        &self,
        id: api::ticket::Id,
        notes: &str,
    ) -> Result<api::Ticket, StatusCode> {
        self.edit_ticket(json!({
            "id": id.to_string(),
            "user_notes": notes,
        }))
        .await
    }

    pub async fn admin_get_tickets(
        &self,
        query: &str,
    ) -> Result<api::ticket::AdminList, StatusCode> {
        const URL: &str = concat!(BASE_URL, "/api/admin/tickets");

        let mut req = self.inner.get(format!("{URL}?{query}"));
        if let Some(token) = &self.auth_token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        Ok(req
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<api::ticket::AdminList>()
            .await
            .expect("failed to get a response"))
    }

    pub async fn admin_edit_ticket(
        &self,
        body: serde_json::Value,
    ) -> Result<api::ticket::AdminTicket, StatusCode> {
        const URL: &str = concat!(BASE_URL, "/api/admin/tickets");

        let mut req = self.inner.put(URL);
        if let Some(token) = &self.auth_token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        Ok(req
            .json(&body)
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<api::ticket::AdminTicket>()
            .await
            .expect("failed to get a response"))
    }

    pub async fn admin_send_quote(
        &self,
        id: api::ticket::Id,
        price: f64,
    ) -> Result<api::ticket::AdminTicket, StatusCode> {
        self.admin_edit_ticket(json!({
            "id": id.to_string(),
            "status": "quote_sent",
            "quoted_price": price,
        }))
        .await
    }

    pub async fn get_skins(
        &self,
        query: &str,
    ) -> Result<api::skin::List, StatusCode> {
        const URL: &str = concat!(BASE_URL, "/api/skins");

        Ok(self
            .inner
            .get(format!("{URL}?{query}"))
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<api::skin::List>()
            .await
            .expect("failed to get a response"))
    }
}
