//! Authentication against Supabase GoTrue

mod session;
mod types;

use reqwest::Client;
use serde_json::json;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

use crate::config::ClientOptions;
use crate::error::Error;
use crate::fetch::{Fetch, FetchBuilder};

pub use session::*;
pub use types::*;

/// Client for Supabase Authentication
#[derive(Clone)]
pub struct Auth {
    /// The base URL for the Supabase project
    url: String,

    /// The anonymous API key for the Supabase project
    key: String,

    /// HTTP client used for requests
    client: Client,

    /// The current session
    session: Arc<RwLock<Option<Session>>>,

    /// Session transitions, fanned out to every subscriber
    events: broadcast::Sender<AuthChange>,

    /// Client options
    options: ClientOptions,
}

impl Auth {
    /// Create a new Auth client
    pub(crate) fn new(url: &str, key: &str, client: Client, options: ClientOptions) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            url: url.to_string(),
            key: key.to_string(),
            client,
            session: Arc::new(RwLock::new(None)),
            events,
            options,
        }
    }

    fn get_auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.url, path)
    }

    fn request<'a>(&'a self, fetch: FetchBuilder<'a>) -> FetchBuilder<'a> {
        fetch
            .header("apikey", &self.key)
            .header("X-Client-Info", &self.options.client_info)
            .timeout(self.options.request_timeout)
            .on_error(Error::Auth)
    }

    /// Sign up a new user; `data` lands in `user_metadata`
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        data: Option<serde_json::Value>,
    ) -> Result<SignUpResponse, Error> {
        let url = self.get_auth_url("/signup");

        let mut body = json!({
            "email": email,
            "password": password,
        });
        if let Some(data) = data {
            body["data"] = data;
        }

        let value = self
            .request(Fetch::post(&self.client, &url))
            .json(&body)?
            .execute::<serde_json::Value>()
            .await?;

        // auto-confirm projects answer with a session, the rest with the bare user
        if value.get("access_token").is_some() {
            let session = serde_json::from_value::<Session>(value)?.with_expiry_from_now();
            self.store(AuthChangeEvent::SignedIn, Some(session.clone()));
            Ok(SignUpResponse {
                user: Some(session.user.clone()),
                session: Some(session),
            })
        } else {
            let user = serde_json::from_value::<User>(value)?;
            Ok(SignUpResponse {
                user: Some(user),
                session: None,
            })
        }
    }

    /// Sign in a user with email and password
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, Error> {
        let url = self.get_auth_url("/token");

        let body = json!({
            "email": email,
            "password": password,
        });

        let session = self
            .request(Fetch::post(&self.client, &url))
            .query([("grant_type", "password")])
            .json(&body)?
            .execute::<Session>()
            .await?
            .with_expiry_from_now();

        self.store(AuthChangeEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    /// Sign out the current user. Signing out without a session is a no-op.
    pub async fn sign_out(&self) -> Result<(), Error> {
        let Some(session) = self.get_session() else {
            return Ok(());
        };

        let url = self.get_auth_url("/logout");
        self.request(Fetch::post(&self.client, &url))
            .bearer_auth(&session.access_token)
            .execute_empty()
            .await?;

        self.store(AuthChangeEvent::SignedOut, None);
        Ok(())
    }

    /// Get the user behind the current session from the server
    pub async fn get_user(&self) -> Result<User, Error> {
        let token = self
            .get_session()
            .map(|s| s.access_token)
            .ok_or_else(|| Error::auth("Not logged in"))?;

        let url = self.get_auth_url("/user");
        self.request(Fetch::get(&self.client, &url))
            .bearer_auth(&token)
            .execute::<User>()
            .await
    }

    /// Get the current session
    pub fn get_session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Receive every subsequent session transition
    pub fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.events.subscribe()
    }

    fn store(&self, event: AuthChangeEvent, session: Option<Session>) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = session.clone();
        // no subscribers is fine
        let _ = self.events.send(AuthChange { event, session });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session_body(user_id: &str) -> serde_json::Value {
        json!({
            "access_token": "access-1",
            "refresh_token": "refresh-1",
            "token_type": "bearer",
            "expires_in": 3600,
            "user": {
                "id": user_id,
                "email": "ana@example.com",
                "user_metadata": { "full_name": "Ana Machava" },
                "app_metadata": {},
                "created_at": "2024-01-01T00:00:00Z"
            }
        })
    }

    #[tokio::test]
    async fn sign_in_stores_session_and_broadcasts() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_body("user-1")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let auth = Auth::new(&mock_server.uri(), "anon", Client::new(), ClientOptions::default());
        let mut events = auth.subscribe();

        let session = auth
            .sign_in_with_password("ana@example.com", "secret")
            .await
            .unwrap();

        assert_eq!(session.user.id, "user-1");
        assert!(session.expires_at.is_some());
        assert_eq!(auth.get_session().unwrap().access_token, "access-1");

        let change = events.recv().await.unwrap();
        assert_eq!(change.event, AuthChangeEvent::SignedIn);
        assert_eq!(change.session.unwrap().user.display_name(), "Ana Machava");
    }

    #[tokio::test]
    async fn sign_up_without_confirmation_returns_user_only() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .and(body_partial_json(json!({ "data": { "full_name": "Ana" } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "user-2",
                "email": "ana@example.com",
                "user_metadata": { "full_name": "Ana" }
            })))
            .mount(&mock_server)
            .await;

        let auth = Auth::new(&mock_server.uri(), "anon", Client::new(), ClientOptions::default());
        let response = auth
            .sign_up("ana@example.com", "secret", Some(json!({ "full_name": "Ana" })))
            .await
            .unwrap();

        assert_eq!(response.user.unwrap().id, "user-2");
        assert!(response.session.is_none());
        assert!(auth.get_session().is_none());
    }

    #[tokio::test]
    async fn bad_credentials_surface_gotrue_message() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&mock_server)
            .await;

        let auth = Auth::new(&mock_server.uri(), "anon", Client::new(), ClientOptions::default());
        let result = auth.sign_in_with_password("ana@example.com", "wrong").await;

        match result {
            Err(Error::Auth(msg)) => assert_eq!(msg, "Invalid login credentials"),
            other => panic!("Expected auth error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn sign_out_clears_session() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_body("user-1")))
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let auth = Auth::new(&mock_server.uri(), "anon", Client::new(), ClientOptions::default());
        auth.sign_in_with_password("ana@example.com", "secret").await.unwrap();
        auth.sign_out().await.unwrap();

        assert!(auth.get_session().is_none());
    }
}
