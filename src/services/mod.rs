//! Service access layer: one trait method per backend call.
//!
//! Handlers and managers hold these as `Arc<dyn ...>` so tests can swap in
//! fakes. Implementations make exactly one backend request per call and never
//! retry.

mod supabase;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::auth::{AuthChange, Session, SignUpResponse, User};
use crate::error::Result;
use crate::models::{
    Booking, Candidatura, CandidaturaUpdate, Message, Model, NewBooking, NewCandidatura,
    NewMessage, NewReview, Review, Service,
};

pub use supabase::SupabaseService;

/// Table names
pub mod tables {
    pub const CANDIDATURAS: &str = "candidaturas";
    pub const MODELS: &str = "models";
    pub const SERVICES: &str = "services";
    pub const BOOKINGS: &str = "bookings";
    pub const MESSAGES: &str = "messages";
    pub const REVIEWS: &str = "reviews";
}

/// Row reads and writes
#[async_trait]
pub trait DataApi: Send + Sync {
    /// Inserted rows exactly as the backend returned them
    async fn create_candidatura(&self, candidatura: &NewCandidatura) -> Result<Vec<Value>>;

    /// Newest first
    async fn get_candidaturas(&self) -> Result<Vec<Candidatura>>;

    async fn update_candidatura(
        &self,
        id: &str,
        update: &CandidaturaUpdate,
    ) -> Result<Vec<Candidatura>>;

    /// Active models with their user's name and email, newest first
    async fn get_models(&self) -> Result<Vec<Model>>;

    /// One model with its user and offered services
    async fn get_model_by_id(&self, id: &str) -> Result<Model>;

    /// Active services by name
    async fn get_services(&self) -> Result<Vec<Service>>;

    async fn create_booking(&self, booking: &NewBooking) -> Result<Vec<Booking>>;

    /// A client's bookings with model and service embedded, newest first
    async fn get_user_bookings(&self, user_id: &str) -> Result<Vec<Booking>>;

    async fn send_message(&self, message: &NewMessage) -> Result<Vec<Message>>;

    /// Messages between two users in either direction, oldest first
    async fn get_conversation(&self, user_a: &str, user_b: &str) -> Result<Vec<Message>>;

    async fn create_review(&self, review: &NewReview) -> Result<Vec<Review>>;

    /// A model's reviews with the reviewer's name, newest first
    async fn get_model_reviews(&self, model_id: &str) -> Result<Vec<Review>>;

    /// Untyped insert for the legacy JSON endpoint
    async fn insert_row(&self, table: &str, row: &Value) -> Result<Vec<Value>>;
}

/// Object storage
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store `bytes` at `path` and return the path inside the bucket
    async fn upload_file(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String>;

    /// Public URL of an object; computed locally
    fn public_url(&self, bucket: &str, path: &str) -> Result<String>;

    async fn remove_file(&self, bucket: &str, path: &str) -> Result<()>;
}

/// Sign-up, sign-in and session change notifications
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: Option<Value>,
    ) -> Result<SignUpResponse>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    async fn sign_out(&self) -> Result<()>;

    /// Ask the backend who the current session belongs to
    async fn get_user(&self) -> Result<User>;

    fn current_session(&self) -> Option<Session>;

    fn subscribe(&self) -> broadcast::Receiver<AuthChange>;
}
