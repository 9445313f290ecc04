//! Client-side orchestration on top of the service layer.
//!
//! Reads go through a five minute [`Cache`]; writes clear the tags they
//! affect. Writes that belong to a user (bookings, messages, reviews) are
//! refused locally when nobody is signed in.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::cache::{Cache, CacheKey, Tag};
use crate::error::{Error, Result};
use crate::models::{
    Booking, BookingRequest, BookingStatus, Candidatura, CandidaturaStatus, Message, Model,
    NewBooking, NewCandidatura, NewMessage, NewReview, Review, ReviewRequest, Service,
};
use crate::services::{DataApi, FileStore};
use crate::session::SessionManager;
use crate::storage::content_type_for;

/// Bucket and folder for photos submitted through the manager
pub const PHOTO_BUCKET: &str = "photos";
pub const PHOTO_FOLDER: &str = "candidaturas";

const DEFAULT_COUNTRY: &str = "Moçambique";
const NOT_AUTHENTICATED: &str = "user not authenticated";

/// Result shape handed to UI code: `{"success": true, "data": ..}` or
/// `{"success": false, "error": ".."}`
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    Failure(String),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Outcome::Success(data) => Some(data),
            Outcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(error) => Some(error),
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            Outcome::Success(data) => Some(data),
            Outcome::Failure(_) => None,
        }
    }
}

impl<T> From<Result<T>> for Outcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Outcome::Success(data),
            Err(err) => Outcome::Failure(err.detail()),
        }
    }
}

impl<T: Serialize> Serialize for Outcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Outcome", 2)?;
        match self {
            Outcome::Success(data) => {
                state.serialize_field("success", &true)?;
                state.serialize_field("data", data)?;
            }
            Outcome::Failure(error) => {
                state.serialize_field("success", &false)?;
                state.serialize_field("error", error)?;
            }
        }
        state.end()
    }
}

/// A photo picked in the application form
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// The application form as the browser page collects it
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApplicationForm {
    pub name: String,
    pub age: i32,
    /// Defaults to Moçambique when left empty
    pub country: Option<String>,
    pub province: Option<String>,
    pub email: String,
    pub whatsapp: String,
    /// The `termos` checkbox
    pub terms_accepted: bool,
    pub photo: Option<PhotoUpload>,
}

pub struct ApplicationManager {
    data: Arc<dyn DataApi>,
    files: Arc<dyn FileStore>,
    session: Arc<SessionManager>,
    cache: Cache,
}

impl ApplicationManager {
    pub fn new(data: Arc<dyn DataApi>, files: Arc<dyn FileStore>, session: Arc<SessionManager>) -> Self {
        Self::with_cache(data, files, session, Cache::default())
    }

    pub fn with_cache(
        data: Arc<dyn DataApi>,
        files: Arc<dyn FileStore>,
        session: Arc<SessionManager>,
        cache: Cache,
    ) -> Self {
        Self {
            data,
            files,
            session,
            cache,
        }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Upload the photo if there is one, then insert the candidatura
    pub async fn submit_candidatura(&self, form: ApplicationForm) -> Outcome<Candidatura> {
        let result = self.try_submit(form).await;
        if result.is_ok() {
            self.cache.invalidate(&Tag::Candidaturas);
        }
        result.into()
    }

    async fn try_submit(&self, form: ApplicationForm) -> Result<Candidatura> {
        let mut foto_url = None;
        let mut foto_nome = None;

        if let Some(photo) = form.photo {
            let path = format!(
                "{}/{}_{}",
                PHOTO_FOLDER,
                Utc::now().timestamp_millis(),
                photo.file_name
            );
            let content_type = content_type_for(&photo.file_name);
            let stored = self
                .files
                .upload_file(PHOTO_BUCKET, &path, photo.bytes, content_type.as_ref())
                .await?;
            foto_url = Some(self.files.public_url(PHOTO_BUCKET, &stored)?);
            foto_nome = Some(photo.file_name);
        }

        let country = form
            .country
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_COUNTRY.to_string());

        let candidatura = NewCandidatura {
            name: form.name,
            age: form.age,
            country: Some(country),
            province: form.province,
            email: form.email,
            whatsapp: form.whatsapp,
            foto_url,
            foto_path: None,
            foto_nome,
            termos_aceitos: form.terms_accepted,
            status: CandidaturaStatus::Pendente,
            notas: String::new(),
        };

        let row = first_row(self.data.create_candidatura(&candidatura).await?)?;
        Ok(serde_json::from_value(row)?)
    }

    pub async fn get_candidaturas(&self) -> Outcome<Vec<Candidatura>> {
        let key = CacheKey::new("get_candidaturas").tag(Tag::Candidaturas);
        self.cached(key, self.data.get_candidaturas()).await.into()
    }

    pub async fn get_models(&self) -> Outcome<Vec<Model>> {
        let key = CacheKey::new("get_models").tag(Tag::Models);
        self.cached(key, self.data.get_models()).await.into()
    }

    pub async fn get_model_by_id(&self, id: &str) -> Outcome<Model> {
        let key = CacheKey::new("get_model_by_id")
            .arg(id)
            .tag(Tag::Models)
            .tag(Tag::Model(id.to_string()));
        self.cached(key, self.data.get_model_by_id(id)).await.into()
    }

    pub async fn get_services(&self) -> Outcome<Vec<Service>> {
        let key = CacheKey::new("get_services").tag(Tag::Services);
        self.cached(key, self.data.get_services()).await.into()
    }

    pub async fn create_booking(&self, request: BookingRequest) -> Outcome<Booking> {
        let result = async {
            let client_id = self.require_user()?;
            let booking = NewBooking {
                client_id,
                model_id: request.model_id,
                service_id: request.service_id,
                status: BookingStatus::Pending,
                details: request.details,
            };
            let row = first_row(self.data.create_booking(&booking).await?)?;
            self.cache.invalidate(&Tag::Bookings);
            Ok::<_, Error>(row)
        }
        .await;
        result.into()
    }

    /// The signed-in client's bookings; empty when nobody is signed in
    pub async fn get_user_bookings(&self) -> Outcome<Vec<Booking>> {
        let Some(user_id) = self.session.user_id() else {
            return Outcome::Success(Vec::new());
        };
        let key = CacheKey::new("get_user_bookings")
            .arg(user_id.as_str())
            .tag(Tag::Bookings)
            .tag(Tag::User(user_id.clone()));
        self.cached(key, self.data.get_user_bookings(&user_id))
            .await
            .into()
    }

    pub async fn send_message(
        &self,
        receiver_id: &str,
        content: &str,
        booking_id: Option<&str>,
    ) -> Outcome<Message> {
        let result = async {
            let sender_id = self.require_user()?;
            let message = NewMessage {
                sender_id,
                receiver_id: receiver_id.to_string(),
                content: content.to_string(),
                booking_id: booking_id.map(str::to_string),
            };
            let row = first_row(self.data.send_message(&message).await?)?;
            self.cache.invalidate(&Tag::Messages);
            Ok::<_, Error>(row)
        }
        .await;
        result.into()
    }

    /// Messages between the signed-in user and `other_user_id`, oldest first
    pub async fn get_conversation(&self, other_user_id: &str) -> Outcome<Vec<Message>> {
        let Some(user_id) = self.session.user_id() else {
            return Outcome::Success(Vec::new());
        };
        let key = CacheKey::new("get_conversation")
            .arg(user_id.as_str())
            .arg(other_user_id)
            .tag(Tag::Messages)
            .tag(Tag::User(user_id.clone()));
        self.cached(key, self.data.get_conversation(&user_id, other_user_id))
            .await
            .into()
    }

    pub async fn create_review(&self, request: ReviewRequest) -> Outcome<Review> {
        let result = async {
            let client_id = self.require_user()?;
            let model_id = request.model_id.clone();
            let review = NewReview {
                client_id,
                model_id: request.model_id,
                booking_id: request.booking_id,
                rating: request.rating,
                comment: request.comment,
                is_anonymous: request.is_anonymous,
            };
            let row = first_row(self.data.create_review(&review).await?)?;
            self.cache.invalidate(&Tag::Reviews);
            self.cache.invalidate(&Tag::Model(model_id));
            Ok::<_, Error>(row)
        }
        .await;
        result.into()
    }

    pub async fn get_model_reviews(&self, model_id: &str) -> Outcome<Vec<Review>> {
        let key = CacheKey::new("get_model_reviews")
            .arg(model_id)
            .tag(Tag::Reviews)
            .tag(Tag::Model(model_id.to_string()));
        self.cached(key, self.data.get_model_reviews(model_id))
            .await
            .into()
    }

    fn require_user(&self) -> Result<String> {
        self.session
            .user_id()
            .ok_or(Error::AuthRequired(NOT_AUTHENTICATED))
    }

    /// Serve `key` from the cache, or run `fetch` and remember its result.
    /// `fetch` is only polled on a miss.
    async fn cached<T, F>(&self, key: CacheKey, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: Future<Output = Result<T>>,
    {
        if let Some(value) = self.cache.get(&key) {
            match serde_json::from_value(value) {
                Ok(hit) => return Ok(hit),
                Err(err) => tracing::warn!(?key, %err, "dropping unreadable cache entry"),
            }
        }

        let fresh = fetch.await?;
        self.cache.insert(key, serde_json::to_value(&fresh)?);
        Ok(fresh)
    }
}

fn first_row<T>(rows: Vec<T>) -> Result<T> {
    rows.into_iter()
        .next()
        .ok_or_else(|| Error::database("insert returned no rows"))
}
