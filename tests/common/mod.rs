//! In-memory stand-ins for the service layer, shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use candidatura::auth::{AuthChange, Session, SignUpResponse, User};
use candidatura::error::{Error, Result};
use candidatura::models::{
    Booking, Candidatura, CandidaturaUpdate, Message, Model, NewBooking, NewCandidatura,
    NewMessage, NewReview, Review, Service,
};
use candidatura::services::{AuthApi, DataApi, FileStore};
use serde_json::{json, Value};
use tokio::sync::broadcast;

/// Records every call and the rows written
#[derive(Default)]
pub struct FakeData {
    calls: Mutex<HashMap<&'static str, usize>>,
    pub inserted: Mutex<Vec<Value>>,
    pub fail_inserts: Option<String>,
}

impl FakeData {
    pub fn failing_inserts(message: &str) -> Self {
        Self {
            fail_inserts: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.calls.lock().unwrap().get(operation).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    pub fn inserted(&self) -> Vec<Value> {
        self.inserted.lock().unwrap().clone()
    }

    fn record(&self, operation: &'static str) {
        *self.calls.lock().unwrap().entry(operation).or_default() += 1;
    }

    /// Store `row`, echoing it back with an id the way PostgREST does
    fn insert<T: serde::de::DeserializeOwned>(&self, row: Value) -> Result<Vec<T>> {
        if let Some(message) = &self.fail_inserts {
            return Err(Error::database(message));
        }
        let mut inserted = self.inserted.lock().unwrap();
        let mut stored = row;
        stored["id"] = json!(inserted.len() + 1);
        inserted.push(stored.clone());
        Ok(vec![serde_json::from_value(stored)?])
    }
}

#[async_trait]
impl DataApi for FakeData {
    async fn create_candidatura(&self, candidatura: &NewCandidatura) -> Result<Vec<Value>> {
        self.record("create_candidatura");
        self.insert(serde_json::to_value(candidatura)?)
    }

    async fn get_candidaturas(&self) -> Result<Vec<Candidatura>> {
        self.record("get_candidaturas");
        let rows = self.inserted();
        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(Error::from))
            .collect()
    }

    async fn update_candidatura(&self, _: &str, _: &CandidaturaUpdate) -> Result<Vec<Candidatura>> {
        self.record("update_candidatura");
        Ok(Vec::new())
    }

    async fn get_models(&self) -> Result<Vec<Model>> {
        self.record("get_models");
        Ok(vec![serde_json::from_value(json!({
            "id": "m-1",
            "is_active": true,
            "user": { "full_name": "Luana", "email": "luana@example.com" }
        }))?])
    }

    async fn get_model_by_id(&self, id: &str) -> Result<Model> {
        self.record("get_model_by_id");
        Ok(serde_json::from_value(json!({ "id": id, "is_active": true }))?)
    }

    async fn get_services(&self) -> Result<Vec<Service>> {
        self.record("get_services");
        Ok(vec![serde_json::from_value(json!({ "id": 1, "name": "Fotografia", "is_active": true }))?])
    }

    async fn create_booking(&self, booking: &NewBooking) -> Result<Vec<Booking>> {
        self.record("create_booking");
        self.insert(serde_json::to_value(booking)?)
    }

    async fn get_user_bookings(&self, _: &str) -> Result<Vec<Booking>> {
        self.record("get_user_bookings");
        Ok(Vec::new())
    }

    async fn send_message(&self, message: &NewMessage) -> Result<Vec<Message>> {
        self.record("send_message");
        self.insert(serde_json::to_value(message)?)
    }

    async fn get_conversation(&self, _: &str, _: &str) -> Result<Vec<Message>> {
        self.record("get_conversation");
        Ok(Vec::new())
    }

    async fn create_review(&self, review: &NewReview) -> Result<Vec<Review>> {
        self.record("create_review");
        self.insert(serde_json::to_value(review)?)
    }

    async fn get_model_reviews(&self, _: &str) -> Result<Vec<Review>> {
        self.record("get_model_reviews");
        Ok(Vec::new())
    }

    async fn insert_row(&self, _: &str, row: &Value) -> Result<Vec<Value>> {
        self.record("insert_row");
        self.insert(row.clone())
    }
}

/// Object store that keeps uploads in memory
#[derive(Default)]
pub struct FakeFiles {
    pub uploads: Mutex<Vec<(String, String, usize, String)>>,
    pub fail_uploads: bool,
}

impl FakeFiles {
    pub fn failing() -> Self {
        Self {
            fail_uploads: true,
            ..Default::default()
        }
    }

    /// `(bucket, path, size, content type)` per upload
    pub fn uploads(&self) -> Vec<(String, String, usize, String)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileStore for FakeFiles {
    async fn upload_file(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        if self.fail_uploads {
            return Err(Error::storage("Bucket not found"));
        }
        self.uploads.lock().unwrap().push((
            bucket.to_string(),
            path.to_string(),
            bytes.len(),
            content_type.to_string(),
        ));
        Ok(path.to_string())
    }

    fn public_url(&self, bucket: &str, path: &str) -> Result<String> {
        Ok(format!("https://cdn.test/{bucket}/{path}"))
    }

    async fn remove_file(&self, _: &str, _: &str) -> Result<()> {
        Ok(())
    }
}

/// Auth client whose session the test sets directly
pub struct FakeAuth {
    pub session: Mutex<Option<Session>>,
    /// Whether `get_user` accepts the held token
    pub token_valid: bool,
    pub events: broadcast::Sender<AuthChange>,
}

impl Default for FakeAuth {
    fn default() -> Self {
        let (events, _) = broadcast::channel(8);
        Self {
            session: Mutex::new(None),
            token_valid: true,
            events,
        }
    }
}

impl FakeAuth {
    pub fn signed_in(user_id: &str) -> Self {
        let auth = Self::default();
        *auth.session.lock().unwrap() = Some(session(user_id));
        auth
    }

    /// Holds a session the backend no longer accepts
    pub fn revoked(user_id: &str) -> Self {
        Self {
            token_valid: false,
            ..Self::signed_in(user_id)
        }
    }
}

#[async_trait]
impl AuthApi for FakeAuth {
    async fn sign_up(&self, _: &str, _: &str, _: Option<Value>) -> Result<SignUpResponse> {
        Ok(SignUpResponse {
            user: None,
            session: None,
        })
    }

    async fn sign_in(&self, _: &str, _: &str) -> Result<Session> {
        Err(Error::auth("Invalid login credentials"))
    }

    async fn sign_out(&self) -> Result<()> {
        Ok(())
    }

    async fn get_user(&self) -> Result<User> {
        match self.current_session() {
            Some(session) if self.token_valid => Ok(session.user),
            _ => Err(Error::auth("invalid JWT")),
        }
    }

    fn current_session(&self) -> Option<Session> {
        self.session.lock().unwrap().clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.events.subscribe()
    }
}

pub fn session(user_id: &str) -> Session {
    serde_json::from_value(json!({
        "access_token": "access",
        "refresh_token": "refresh",
        "expires_in": 3600,
        "user": {
            "id": user_id,
            "email": "ana@example.com",
            "user_metadata": { "full_name": "Ana Machava" }
        }
    }))
    .unwrap()
}
