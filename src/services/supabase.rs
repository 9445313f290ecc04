use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::auth::{AuthChange, Session, SignUpResponse, User};
use crate::error::{Error, Result};
use crate::models::{
    Booking, Candidatura, CandidaturaUpdate, Message, Model, NewBooking, NewCandidatura,
    NewMessage, NewReview, Review, Service,
};
use crate::postgrest::{any_of, Filter, Order};
use crate::services::{tables, AuthApi, DataApi, FileStore};
use crate::storage::FileOptions;
use crate::Supabase;

/// [`DataApi`], [`FileStore`] and [`AuthApi`] over a Supabase project
#[derive(Clone)]
pub struct SupabaseService {
    supabase: Supabase,
}

impl SupabaseService {
    pub fn new(supabase: Supabase) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl DataApi for SupabaseService {
    async fn create_candidatura(&self, candidatura: &NewCandidatura) -> Result<Vec<Value>> {
        self.supabase
            .from(tables::CANDIDATURAS)
            .insert([candidatura])
            .execute()
            .await
    }

    async fn get_candidaturas(&self) -> Result<Vec<Candidatura>> {
        self.supabase
            .from(tables::CANDIDATURAS)
            .select("*")
            .order("created_at", Order::Desc)
            .execute()
            .await
    }

    async fn update_candidatura(
        &self,
        id: &str,
        update: &CandidaturaUpdate,
    ) -> Result<Vec<Candidatura>> {
        self.supabase
            .from(tables::CANDIDATURAS)
            .update(update)
            .eq("id", id)
            .execute()
            .await
    }

    async fn get_models(&self) -> Result<Vec<Model>> {
        self.supabase
            .from(tables::MODELS)
            .select(
                r#"
                *,
                user:users(full_name, email)
                "#,
            )
            .eq("is_active", true)
            .order("created_at", Order::Desc)
            .execute()
            .await
    }

    async fn get_model_by_id(&self, id: &str) -> Result<Model> {
        self.supabase
            .from(tables::MODELS)
            .select(
                r#"
                *,
                user:users(full_name, email),
                model_services(
                  *,
                  service:services(*)
                )
                "#,
            )
            .eq("id", id)
            .single()
            .execute_single()
            .await
    }

    async fn get_services(&self) -> Result<Vec<Service>> {
        self.supabase
            .from(tables::SERVICES)
            .select("*")
            .eq("is_active", true)
            .order("name", Order::Asc)
            .execute()
            .await
    }

    async fn create_booking(&self, booking: &NewBooking) -> Result<Vec<Booking>> {
        self.supabase
            .from(tables::BOOKINGS)
            .insert([booking])
            .execute()
            .await
    }

    async fn get_user_bookings(&self, user_id: &str) -> Result<Vec<Booking>> {
        self.supabase
            .from(tables::BOOKINGS)
            .select(
                r#"
                *,
                model:models(*),
                service:services(*)
                "#,
            )
            .eq("client_id", user_id)
            .order("created_at", Order::Desc)
            .execute()
            .await
    }

    async fn send_message(&self, message: &NewMessage) -> Result<Vec<Message>> {
        self.supabase
            .from(tables::MESSAGES)
            .insert([message])
            .execute()
            .await
    }

    async fn get_conversation(&self, user_a: &str, user_b: &str) -> Result<Vec<Message>> {
        let either_direction = any_of(&[
            vec![Filter::eq("sender_id", user_a), Filter::eq("receiver_id", user_b)],
            vec![Filter::eq("sender_id", user_b), Filter::eq("receiver_id", user_a)],
        ]);

        self.supabase
            .from(tables::MESSAGES)
            .select("*")
            .or(&either_direction)
            .order("created_at", Order::Asc)
            .execute()
            .await
    }

    async fn create_review(&self, review: &NewReview) -> Result<Vec<Review>> {
        self.supabase
            .from(tables::REVIEWS)
            .insert([review])
            .execute()
            .await
    }

    async fn get_model_reviews(&self, model_id: &str) -> Result<Vec<Review>> {
        self.supabase
            .from(tables::REVIEWS)
            .select(
                r#"
                *,
                client:users(full_name)
                "#,
            )
            .eq("model_id", model_id)
            .order("created_at", Order::Desc)
            .execute()
            .await
    }

    async fn insert_row(&self, table: &str, row: &Value) -> Result<Vec<Value>> {
        self.supabase.from(table).insert([row]).execute().await
    }
}

#[async_trait]
impl FileStore for SupabaseService {
    async fn upload_file(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        let storage = self.supabase.storage();
        let uploaded = storage
            .from(bucket)
            .upload(path, bytes, FileOptions::new().with_content_type(content_type))
            .await?;

        // the key comes back as `<bucket>/<path>`
        let prefix = format!("{bucket}/");
        Ok(uploaded
            .key
            .strip_prefix(&prefix)
            .unwrap_or(uploaded.key.as_str())
            .to_string())
    }

    fn public_url(&self, bucket: &str, path: &str) -> Result<String> {
        self.supabase.storage().from(bucket).get_public_url(path)
    }

    async fn remove_file(&self, bucket: &str, path: &str) -> Result<()> {
        self.supabase.storage().from(bucket).remove(&[path]).await
    }
}

#[async_trait]
impl AuthApi for SupabaseService {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: Option<Value>,
    ) -> Result<SignUpResponse> {
        self.supabase.auth().sign_up(email, password, metadata).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(Error::auth("email and password are required"));
        }
        self.supabase
            .auth()
            .sign_in_with_password(email, password)
            .await
    }

    async fn sign_out(&self) -> Result<()> {
        self.supabase.auth().sign_out().await
    }

    async fn get_user(&self) -> Result<User> {
        self.supabase.auth().get_user().await
    }

    fn current_session(&self) -> Option<Session> {
        self.supabase.auth().get_session()
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.supabase.auth().subscribe()
    }
}
