//! Store registration.
//!
//! A permanent store is identified by its 10-digit corporate registration
//! number; a temporary (pop-up) store instead has an opening and a closing
//! date. The form is uploaded as multipart: a `storeData` JSON part plus an
//! optional `image` part.

use chrono::{NaiveDate, NaiveTime};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::error::{ApiError, ValidationError};

const REGISTRATION_NUMBER_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StoreType {
    #[default]
    #[serde(rename = "상시")]
    Permanent,
    #[serde(rename = "임시")]
    Temporary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Holiday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

fn serialize_hhmm<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match time {
        Some(t) => serializer.serialize_str(&t.format("%H:%M").to_string()),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreForm {
    pub name: String,
    pub store_type: StoreType,
    pub corporate_registration_number: String,
    pub open_date: Option<NaiveDate>,
    pub close_date: Option<NaiveDate>,
    #[serde(serialize_with = "serialize_hhmm")]
    pub open_time: Option<NaiveTime>,
    #[serde(serialize_with = "serialize_hhmm")]
    pub close_time: Option<NaiveTime>,
    pub notice: String,
    pub address: String,
    pub description: String,
    pub holidays: BTreeSet<Holiday>,
}

pub fn is_valid_registration_number(number: &str) -> bool {
    number.len() == REGISTRATION_NUMBER_LEN && number.chars().all(|c| c.is_ascii_digit())
}

impl StoreForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::Required("name"));
        }
        match self.store_type {
            StoreType::Permanent => {
                if !is_valid_registration_number(&self.corporate_registration_number) {
                    return Err(ValidationError::RegistrationNumberFormat);
                }
            }
            StoreType::Temporary => {
                let open = self.open_date.ok_or(ValidationError::Required("openDate"))?;
                let close = self
                    .close_date
                    .ok_or(ValidationError::Required("closeDate"))?;
                if open > close {
                    return Err(ValidationError::DateRange);
                }
            }
        }
        if self.address.trim().is_empty() {
            return Err(ValidationError::Required("address"));
        }
        if self.open_time.is_none() {
            return Err(ValidationError::Required("openTime"));
        }
        if self.close_time.is_none() {
            return Err(ValidationError::Required("closeTime"));
        }
        Ok(())
    }
}

/// Store picture attached to a registration.
#[derive(Debug, Clone)]
pub struct StoreImage {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl StoreImage {
    pub async fn from_path(path: &Path) -> Result<Self, String> {
        let mime = image_mime(path).ok_or_else(|| {
            format!("Unsupported image type: {}", path.display())
        })?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("store-image")
            .to_string();
        Ok(Self {
            file_name,
            mime,
            bytes,
        })
    }
}

fn image_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

fn registration_form(store_json: &str, image: Option<&StoreImage>) -> Result<Form, ApiError> {
    let data = Part::text(store_json.to_string())
        .mime_str("application/json")
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
    let mut form = Form::new().part("storeData", data);
    if let Some(image) = image {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(image.mime)
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        form = form.part("image", part);
    }
    Ok(form)
}

/// `true` when another store already uses `number`.
pub async fn is_duplicated_registration_number(
    api: &ApiClient,
    number: &str,
) -> Result<bool, ApiError> {
    if !is_valid_registration_number(number) {
        return Err(ApiError::InvalidRequest(
            ValidationError::RegistrationNumberFormat.to_string(),
        ));
    }
    let body: Value = api
        .get_json(&format!("/api/stores/duplicate/{number}"))
        .await?;
    Ok(duplicate_flag(&body))
}

/// The backend reports the flag either as a boolean or as `"true"`.
fn duplicate_flag(body: &Value) -> bool {
    match body.get("isDuplicated") {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim() == "true",
        _ => false,
    }
}

pub async fn register_store(
    api: &ApiClient,
    login_id: &str,
    form: &StoreForm,
    image: Option<&StoreImage>,
) -> Result<Value, ApiError> {
    form.validate()
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
    let store_json =
        serde_json::to_string(form).map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
    let url = api.endpoint(&format!("/api/sellers/{login_id}/stores"));

    let resp = api
        .execute(true, |http| {
            Ok(http
                .post(&url)
                .multipart(registration_form(&store_json, image)?))
        })
        .await?;
    let body_text = resp
        .text()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))?;
    info!(login_id, store = %form.name, "store registered");
    Ok(created_store(login_id, &body_text))
}

/// The created store as returned by the backend. An empty body is `Null`;
/// a non-JSON body is kept as a string.
fn created_store(login_id: &str, body_text: &str) -> Value {
    let trimmed = body_text.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    match serde_json::from_str(trimmed) {
        Ok(created) => created,
        Err(e) => {
            warn!(login_id, error = %e, "store registration response is not JSON");
            Value::String(trimmed.to_string())
        }
    }
}
