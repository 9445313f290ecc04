//! Submits the application form to the intake server and reports back.
//!
//! [`FormHandler`] is what the browser script does, minus the DOM: the form
//! goes out as multipart, failures become one readable message, and a
//! successful submission clears the form.

use std::path::Path;

use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::error::{Error, Result};
use crate::storage::content_type_for;

const SUBMIT_PATH: &str = "/api/candidatura";
const GENERIC_FAILURE: &str = "failed to submit application";
const UNKNOWN_SERVER_ERROR: &str = "unknown server error";
const CONFIRMATION: &str = "application submitted";

/// Where user-facing feedback goes
pub trait Notifier {
    /// Submission went through
    fn confirm(&self, message: &str);

    /// Submission failed; `message` is ready to show as is
    fn alert(&self, message: &str);
}

/// Feedback through the log, for headless use
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn confirm(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn alert(&self, message: &str) {
        tracing::error!("{message}");
    }
}

/// A file picked for the `foto` field
#[derive(Debug, Clone, PartialEq)]
pub struct FilePick {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl FilePick {
    pub async fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::general(format!("not a file path: {}", path.display())))?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        Ok(Self { file_name, bytes })
    }
}

/// Field values of the form, in input order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    fields: Vec<(String, String)>,
    photo: Option<FilePick>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a text field, replacing an earlier value
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.fields.retain(|(n, _)| n != name);
        self.fields.push((name.to_string(), value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_photo(&mut self, photo: FilePick) -> &mut Self {
        self.photo = Some(photo);
        self
    }

    pub fn photo(&self) -> Option<&FilePick> {
        self.photo.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.photo.is_none()
    }

    /// Clear every field
    pub fn reset(&mut self) {
        self.fields.clear();
        self.photo = None;
    }

    fn to_multipart(&self) -> Result<Form> {
        let mut form = Form::new();
        for (name, value) in &self.fields {
            form = form.text(name.clone(), value.clone());
        }
        if let Some(photo) = &self.photo {
            let part = Part::bytes(photo.bytes.clone())
                .file_name(photo.file_name.clone())
                .mime_str(content_type_for(&photo.file_name).as_ref())?;
            form = form.part("foto", part);
        }
        Ok(form)
    }
}

pub struct FormHandler<N> {
    client: Client,
    endpoint: Url,
    notifier: N,
}

impl<N: Notifier> FormHandler<N> {
    /// Handler posting to `<server_url>/api/candidatura`
    pub fn new(server_url: &str, notifier: N) -> Result<Self> {
        let endpoint = Url::parse(server_url)?.join(SUBMIT_PATH)?;
        Ok(Self {
            client: Client::new(),
            endpoint,
            notifier,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Post the form once. On success the form is reset and the server's
    /// JSON answer returned; on failure the user is alerted and the form
    /// is left as it was.
    pub async fn submit(&self, form: &mut FormData) -> Result<Value> {
        match self.send(form).await {
            Ok(body) => {
                tracing::debug!(response = %body, "application accepted");
                self.notifier.confirm(CONFIRMATION);
                form.reset();
                Ok(body)
            }
            Err(err) => {
                let message = err.detail();
                tracing::error!(error = %message, "application submission failed");
                self.notifier.alert(&format!("error submitting: {message}"));
                Err(err)
            }
        }
    }

    async fn send(&self, form: &FormData) -> Result<Value> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form.to_multipart()?)
            .send()
            .await?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("application/json"));
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::General(failure_message(is_json, &body)));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Message for a rejected submission: the JSON `error` field, else the body
/// text, else a generic line
pub fn failure_message(is_json: bool, body: &str) -> String {
    if is_json {
        return serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());
    }

    let text = body.trim();
    if text.is_empty() {
        UNKNOWN_SERVER_ERROR.to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_message_prefers_json_error() {
        assert_eq!(
            failure_message(true, r#"{"error":"required fields missing"}"#),
            "required fields missing"
        );
        assert_eq!(failure_message(true, r#"{"message":"?"}"#), GENERIC_FAILURE);
        assert_eq!(failure_message(true, "not json"), GENERIC_FAILURE);
    }

    #[test]
    fn failure_message_falls_back_to_text() {
        assert_eq!(failure_message(false, "Bad Gateway\n"), "Bad Gateway");
        assert_eq!(failure_message(false, "  "), UNKNOWN_SERVER_ERROR);
    }

    #[test]
    fn form_set_replaces_and_reset_clears() {
        let mut form = FormData::new();
        form.set("nome", "Ana").set("nome", "Ana Machava");
        assert_eq!(form.get("nome"), Some("Ana Machava"));

        form.reset();
        assert!(form.is_empty());
    }

    #[test]
    fn endpoint_is_joined_onto_server_url() {
        let handler = FormHandler::new("http://localhost:3000/", LogNotifier).unwrap();
        assert_eq!(handler.endpoint().as_str(), "http://localhost:3000/api/candidatura");
    }
}
