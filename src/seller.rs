//! Seller account: sign-up, sign-in, password reset and profile management.
//!
//! Form validation runs locally before anything is sent. Identity, e-mail
//! and phone verification providers live behind the backend; this module
//! only tracks whether each verification step has been completed.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::{read_json, ApiClient};
use crate::error::{ApiError, ValidationError};
use crate::session::Session;

pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 20;
pub const USERNAME_MIN_LEN: usize = 2;
const PHONE_MAX_DIGITS: usize = 11;

// ---------------------------------------------------------------------------
// Field rules
// ---------------------------------------------------------------------------

pub fn validate_login_id(login_id: &str) -> Result<(), ValidationError> {
    if login_id.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(ValidationError::LoginIdCharset)
    }
}

/// Non-empty names need at least two characters.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let len = username.chars().count();
    if len > 0 && len < USERNAME_MIN_LEN {
        return Err(ValidationError::UsernameTooShort(USERNAME_MIN_LEN));
    }
    Ok(())
}

pub fn validate_password_length(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if (PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len) {
        Ok(())
    } else {
        Err(ValidationError::PasswordLength {
            min: PASSWORD_MIN_LEN,
            max: PASSWORD_MAX_LEN,
        })
    }
}

/// Format a phone number as `NN(N)-NNN(N)-NNNN`.
///
/// Non-digits are dropped and input is capped at 11 digits. Digit counts
/// that do not fit the pattern come back as bare digits.
pub fn format_phone_number(raw: &str) -> String {
    let digits: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(PHONE_MAX_DIGITS)
        .collect();
    let Some((head, middle)) = phone_groups(digits.len()) else {
        return digits;
    };
    format!(
        "{}-{}-{}",
        &digits[..head],
        &digits[head..head + middle],
        &digits[head + middle..]
    )
}

/// Widest head and middle groups that leave exactly four trailing digits.
fn phone_groups(len: usize) -> Option<(usize, usize)> {
    for head in [3, 2] {
        for middle in [4, 3] {
            if head + middle + 4 == len {
                return Some((head, middle));
            }
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Sign-up
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignUpField {
    LoginId,
    Password,
    ConfirmPassword,
    Username,
}

#[derive(Debug, Clone, Default)]
pub struct SignUpForm {
    pub login_id: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub username: String,
    pub mobile: String,
    pub login_id_checked: bool,
    pub email_verified: bool,
    pub phone_verified: bool,
}

/// Body of `POST /api/sellers/signup`, produced only by a passing
/// [`SignUpForm::validate`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub login_id: String,
    pub email: String,
    pub password: String,
    pub username: String,
    pub mobile: String,
}

impl SignUpForm {
    pub fn set_mobile(&mut self, raw: &str) {
        self.mobile = format_phone_number(raw);
    }

    /// Compare the code the seller typed with the one the backend e-mailed.
    pub fn confirm_email_code(&mut self, sent_code: &str, entered: &str) -> bool {
        let sent = sent_code.trim();
        self.email_verified = !sent.is_empty() && sent == entered.trim();
        self.email_verified
    }

    /// Live check for a single field, as the form is being filled in.
    pub fn field_error(&self, field: SignUpField) -> Option<ValidationError> {
        match field {
            SignUpField::LoginId => validate_login_id(&self.login_id).err(),
            SignUpField::Username => validate_username(&self.username).err(),
            SignUpField::Password | SignUpField::ConfirmPassword => {
                if self.password.is_empty() && self.confirm_password.is_empty() {
                    return None;
                }
                if let Err(e) = validate_password_length(&self.password) {
                    return Some(e);
                }
                if !self.confirm_password.is_empty() && self.password != self.confirm_password {
                    return Some(ValidationError::PasswordMismatch);
                }
                None
            }
        }
    }

    /// Check the whole form before submitting; the first failing rule wins.
    pub fn validate(&self) -> Result<SignUpRequest, ValidationError> {
        validate_login_id(&self.login_id)?;
        let fields = [
            &self.login_id,
            &self.email,
            &self.password,
            &self.confirm_password,
            &self.username,
            &self.mobile,
        ];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(ValidationError::MissingFields);
        }
        if !self.login_id_checked {
            return Err(ValidationError::LoginIdNotChecked);
        }
        if !self.email_verified {
            return Err(ValidationError::EmailNotVerified);
        }
        if !self.phone_verified {
            return Err(ValidationError::PhoneNotVerified);
        }
        validate_password_length(&self.password)?;
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        Ok(SignUpRequest {
            login_id: self.login_id.clone(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            username: self.username.trim().to_string(),
            mobile: self.mobile.clone(),
        })
    }
}

pub async fn sign_up(api: &ApiClient, request: &SignUpRequest) -> Result<String, ApiError> {
    let message = api.post_public("/api/sellers/signup", request).await?;
    info!(login_id = %request.login_id, "seller signed up");
    Ok(message)
}

/// Ask the backend whether `login_id` is still free.
pub async fn check_login_id(api: &ApiClient, login_id: &str) -> Result<String, ApiError> {
    validate_login_id(login_id).map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
    api.post_public(
        "/api/auth/check-login-id",
        &serde_json::json!({ "loginId": login_id }),
    )
    .await
}

// ---------------------------------------------------------------------------
// Sign-in
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    #[serde(default)]
    pub token_type: String,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
}

/// Exchange credentials for a token pair and build the resulting session.
pub async fn sign_in(api: &ApiClient, login_id: &str, password: &str) -> Result<Session, ApiError> {
    validate_login_id(login_id).map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
    if login_id.is_empty() || password.is_empty() {
        return Err(ApiError::InvalidRequest(
            ValidationError::MissingFields.to_string(),
        ));
    }
    let url = api.endpoint("/api/auth/login");
    let body = serde_json::json!({ "loginId": login_id, "password": password });
    let resp = api
        .execute(false, |http| Ok(http.post(&url).json(&body)))
        .await?;
    let tokens: TokenResponse = read_json(resp).await?;
    info!(login_id, "seller signed in");
    Ok(Session::new(
        login_id,
        tokens.token_type,
        tokens.access_token,
        tokens.refresh_token,
    ))
}

// ---------------------------------------------------------------------------
// Password reset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetForm {
    pub login_id: String,
    pub email: String,
    pub mobile: String,
}

impl PasswordResetForm {
    pub fn set_mobile(&mut self, raw: &str) {
        self.mobile = format_phone_number(raw);
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if [&self.login_id, &self.email, &self.mobile]
            .iter()
            .any(|f| f.trim().is_empty())
        {
            return Err(ValidationError::MissingFields);
        }
        Ok(())
    }
}

pub async fn reset_password(api: &ApiClient, form: &PasswordResetForm) -> Result<String, ApiError> {
    form.validate()
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
    api.post_public("/api/auth/password/reset", form).await
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seller {
    pub login_id: String,
    pub username: String,
    pub email: String,
    pub mobile: String,
    #[serde(default)]
    pub done_click_count_setting: Option<bool>,
}

/// Editable profile fields for `PUT /api/sellers/{loginId}`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done_click_count_setting: Option<bool>,
}

impl SellerUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(username) = &self.username {
            if username.trim().is_empty() {
                return Err(ValidationError::Required("username"));
            }
            validate_username(username.trim())?;
        }
        Ok(())
    }
}

pub async fn get_seller(api: &ApiClient, login_id: &str) -> Result<Seller, ApiError> {
    api.get_json(&format!("/api/sellers/{login_id}")).await
}

pub async fn update_seller(
    api: &ApiClient,
    login_id: &str,
    update: &SellerUpdate,
) -> Result<Seller, ApiError> {
    update
        .validate()
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
    let seller = api
        .put_json(&format!("/api/sellers/{login_id}"), update)
        .await?;
    info!(login_id, "seller profile updated");
    Ok(seller)
}

/// Delete the seller account. The session's tokens are wiped on success;
/// removing persisted credentials is up to the caller.
pub async fn delete_seller(api: &ApiClient, login_id: &str) -> Result<(), ApiError> {
    api.send_empty(Method::DELETE, &format!("/api/sellers/{login_id}"))
        .await?;
    api.session().clear();
    info!(login_id, "seller account deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_form() -> SignUpForm {
        SignUpForm {
            login_id: "seller01".into(),
            email: "seller@example.com".into(),
            password: "hunter2hunter2".into(),
            confirm_password: "hunter2hunter2".into(),
            username: "Kim".into(),
            mobile: "010-1234-5678".into(),
            login_id_checked: true,
            email_verified: true,
            phone_verified: true,
        }
    }

    #[test]
    fn phone_numbers_are_grouped_by_length() {
        assert_eq!(format_phone_number("01012345678"), "010-1234-5678");
        assert_eq!(format_phone_number("0311234567"), "031-123-4567");
        assert_eq!(format_phone_number("021234567"), "02-123-4567");
        assert_eq!(format_phone_number("010-12"), "01012");
    }

    #[test]
    fn phone_input_is_capped_at_eleven_digits() {
        assert_eq!(format_phone_number("010 1234 5678 99"), "010-1234-5678");
    }

    #[test]
    fn complete_form_produces_request() {
        let request = complete_form().validate().expect("form is valid");
        assert_eq!(request.login_id, "seller01");
        let json = serde_json::to_value(&request).expect("serialize");
        assert!(json.get("loginId").is_some());
        assert!(json.get("confirmPassword").is_none());
    }

    #[test]
    fn login_id_charset_is_checked_before_anything_else() {
        let form = SignUpForm {
            login_id: "seller_01".into(),
            ..Default::default()
        };
        assert_eq!(form.validate().unwrap_err(), ValidationError::LoginIdCharset);
    }

    #[test]
    fn verification_steps_are_required_in_order() {
        let mut form = complete_form();
        form.login_id_checked = false;
        form.email_verified = false;
        assert_eq!(form.validate().unwrap_err(), ValidationError::LoginIdNotChecked);

        form.login_id_checked = true;
        assert_eq!(form.validate().unwrap_err(), ValidationError::EmailNotVerified);

        form.email_verified = true;
        form.phone_verified = false;
        assert_eq!(form.validate().unwrap_err(), ValidationError::PhoneNotVerified);
    }

    #[test]
    fn password_rules() {
        let mut form = complete_form();
        form.password = "short".into();
        form.confirm_password = "short".into();
        assert_eq!(
            form.validate().unwrap_err(),
            ValidationError::PasswordLength { min: 8, max: 20 }
        );

        form.password = "a".repeat(21);
        form.confirm_password = form.password.clone();
        assert!(matches!(
            form.validate(),
            Err(ValidationError::PasswordLength { .. })
        ));

        form.password = "longenough1".into();
        form.confirm_password = "longenough2".into();
        assert_eq!(form.validate().unwrap_err(), ValidationError::PasswordMismatch);
    }

    #[test]
    fn missing_field_is_reported() {
        let mut form = complete_form();
        form.mobile.clear();
        assert_eq!(form.validate().unwrap_err(), ValidationError::MissingFields);
    }

    #[test]
    fn live_field_checks() {
        let mut form = SignUpForm::default();
        assert_eq!(form.field_error(SignUpField::Password), None);

        form.username = "K".into();
        assert_eq!(
            form.field_error(SignUpField::Username),
            Some(ValidationError::UsernameTooShort(2))
        );

        form.password = "password1".into();
        form.confirm_password = "password2".into();
        assert_eq!(
            form.field_error(SignUpField::ConfirmPassword),
            Some(ValidationError::PasswordMismatch)
        );
    }

    #[test]
    fn email_code_must_match_exactly() {
        let mut form = SignUpForm::default();
        assert!(!form.confirm_email_code("482913", "482914"));
        assert!(!form.email_verified);
        assert!(form.confirm_email_code("482913", " 482913 "));
        assert!(form.email_verified);
        assert!(!form.confirm_email_code("", ""));
    }

    #[test]
    fn password_reset_requires_every_field() {
        let mut form = PasswordResetForm {
            login_id: "seller01".into(),
            email: "seller@example.com".into(),
            ..Default::default()
        };
        assert_eq!(form.validate(), Err(ValidationError::MissingFields));
        form.set_mobile("01012345678");
        assert_eq!(form.mobile, "010-1234-5678");
        assert!(form.validate().is_ok());
    }

    #[test]
    fn seller_update_skips_unset_fields() {
        let update = SellerUpdate {
            done_click_count_setting: Some(true),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).expect("serialize");
        assert_eq!(json, serde_json::json!({ "doneClickCountSetting": true }));

        let bad = SellerUpdate {
            username: Some("K".into()),
            ..Default::default()
        };
        assert_eq!(bad.validate(), Err(ValidationError::UsernameTooShort(2)));
    }

    mod server {
        use super::*;
        use crate::session::AUTHORIZATION_HEADER;
        use crate::test_support::{anonymous_client, header, serve, signed_in_client};
        use axum::extract::{Path, State};
        use axum::http::{HeaderMap, StatusCode};
        use axum::response::{IntoResponse, Response};
        use axum::routing::{get, post};
        use axum::{Json, Router};
        use serde_json::{json, Value};
        use std::sync::{Arc, Mutex};

        /// (route, authorization header, request body) per call.
        type Log = Arc<Mutex<Vec<(String, Option<String>, Value)>>>;

        fn push(log: &Log, route: &str, headers: &HeaderMap, body: Value) {
            log.lock().expect("log lock").push((
                route.to_string(),
                header(headers, AUTHORIZATION_HEADER),
                body,
            ));
        }

        async fn signup(State(log): State<Log>, headers: HeaderMap, Json(body): Json<Value>) -> String {
            push(&log, "signup", &headers, body);
            "회원가입이 완료되었습니다.".to_string()
        }

        async fn check_id(State(log): State<Log>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
            let taken = body["loginId"] == "taken01";
            push(&log, "check-login-id", &headers, body);
            if taken {
                (
                    StatusCode::CONFLICT,
                    Json(json!({ "message": "이미 존재하는 아이디입니다." })),
                )
                    .into_response()
            } else {
                "사용 가능한 아이디입니다.".into_response()
            }
        }

        async fn login(State(log): State<Log>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
            push(&log, "login", &headers, body);
            Json(json!({
                "tokenType": "Bearer",
                "accessToken": "acc-9",
                "refreshToken": "ref-9"
            }))
        }

        async fn reset(State(log): State<Log>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
            push(&log, "password-reset", &headers, body);
            Json(json!("임시 비밀번호가 발송되었습니다."))
        }

        fn profile(login_id: &str) -> Value {
            json!({
                "loginId": login_id,
                "username": "Kim",
                "email": "seller@example.com",
                "mobile": "010-1234-5678",
                "doneClickCountSetting": false
            })
        }

        async fn get_profile(
            State(log): State<Log>,
            Path(login_id): Path<String>,
            headers: HeaderMap,
        ) -> Json<Value> {
            push(&log, "get-seller", &headers, Value::Null);
            Json(profile(&login_id))
        }

        async fn put_profile(
            State(log): State<Log>,
            Path(login_id): Path<String>,
            headers: HeaderMap,
            Json(body): Json<Value>,
        ) -> Json<Value> {
            let mut seller = profile(&login_id);
            if let (Some(seller), Some(update)) = (seller.as_object_mut(), body.as_object()) {
                for (key, value) in update {
                    seller.insert(key.clone(), value.clone());
                }
            }
            push(&log, "put-seller", &headers, body);
            Json(seller)
        }

        async fn delete_profile(State(log): State<Log>, headers: HeaderMap) -> StatusCode {
            push(&log, "delete-seller", &headers, Value::Null);
            StatusCode::NO_CONTENT
        }

        async fn backend() -> (String, Log) {
            let log: Log = Arc::default();
            let router = Router::new()
                .route("/api/sellers/signup", post(signup))
                .route("/api/auth/check-login-id", post(check_id))
                .route("/api/auth/login", post(login))
                .route("/api/auth/password/reset", post(reset))
                .route(
                    "/api/sellers/:login_id",
                    get(get_profile).put(put_profile).delete(delete_profile),
                )
                .with_state(log.clone());
            (serve(router).await, log)
        }

        fn calls(log: &Log) -> Vec<(String, Option<String>, Value)> {
            log.lock().expect("log lock").clone()
        }

        #[tokio::test]
        async fn sign_up_posts_the_validated_request() {
            let (base, log) = backend().await;
            let api = anonymous_client(&base);
            let request = complete_form().validate().expect("form is valid");

            let message = sign_up(&api, &request).await.expect("sign up");
            assert_eq!(message, "회원가입이 완료되었습니다.");

            let recorded = calls(&log);
            assert_eq!(recorded.len(), 1);
            let (route, authorization, body) = &recorded[0];
            assert_eq!(route, "signup");
            assert_eq!(authorization, &None);
            assert_eq!(body["loginId"], "seller01");
            assert_eq!(body["mobile"], "010-1234-5678");
            assert!(body.get("confirmPassword").is_none());
        }

        #[tokio::test]
        async fn check_login_id_reports_free_and_taken_ids() {
            let (base, log) = backend().await;
            let api = anonymous_client(&base);

            let free = check_login_id(&api, "seller01").await.expect("free id");
            assert_eq!(free, "사용 가능한 아이디입니다.");

            let err = check_login_id(&api, "taken01")
                .await
                .expect_err("taken id");
            match err {
                ApiError::Status { status, message } => {
                    assert_eq!(status, reqwest::StatusCode::CONFLICT);
                    assert_eq!(message, "이미 존재하는 아이디입니다.");
                }
                other => panic!("unexpected error: {other:?}"),
            }

            let bad = check_login_id(&api, "seller 01").await.expect_err("bad charset");
            assert!(matches!(bad, ApiError::InvalidRequest(_)));
            assert_eq!(calls(&log).len(), 2, "invalid ids never reach the backend");
        }

        #[tokio::test]
        async fn sign_in_builds_a_session_from_the_token_pair() {
            let (base, log) = backend().await;
            let api = anonymous_client(&base);

            let session = sign_in(&api, "seller01", "hunter2hunter2")
                .await
                .expect("sign in");
            assert_eq!(session.login_id(), "seller01");
            assert!(session.is_logged_in());
            assert_eq!(
                session.auth_headers(),
                Some(("Bearer acc-9".to_string(), "ref-9".to_string()))
            );

            let recorded = calls(&log);
            assert_eq!(recorded[0].0, "login");
            assert_eq!(
                recorded[0].2,
                json!({ "loginId": "seller01", "password": "hunter2hunter2" })
            );
        }

        #[tokio::test]
        async fn reset_password_returns_the_backend_message() {
            let (base, log) = backend().await;
            let api = anonymous_client(&base);
            let mut form = PasswordResetForm {
                login_id: "seller01".into(),
                email: "seller@example.com".into(),
                ..Default::default()
            };
            form.set_mobile("01012345678");

            let message = reset_password(&api, &form).await.expect("reset");
            assert_eq!(message, "임시 비밀번호가 발송되었습니다.");
            assert_eq!(
                calls(&log)[0].2,
                json!({
                    "loginId": "seller01",
                    "email": "seller@example.com",
                    "mobile": "010-1234-5678"
                })
            );
        }

        #[tokio::test]
        async fn profile_round_trip_uses_the_session_tokens() {
            let (base, log) = backend().await;
            let api = signed_in_client(&base);

            let seller = get_seller(&api, "seller01").await.expect("get");
            assert_eq!(seller.username, "Kim");
            assert_eq!(seller.done_click_count_setting, Some(false));

            let update = SellerUpdate {
                done_click_count_setting: Some(true),
                ..Default::default()
            };
            let updated = update_seller(&api, "seller01", &update)
                .await
                .expect("update");
            assert_eq!(updated.done_click_count_setting, Some(true));

            let recorded = calls(&log);
            assert_eq!(recorded[1].0, "put-seller");
            assert_eq!(recorded[1].2, json!({ "doneClickCountSetting": true }));
            assert!(recorded
                .iter()
                .all(|(_, auth, _)| auth.as_deref() == Some("Bearer acc-1")));
        }

        #[tokio::test]
        async fn deleting_the_account_clears_the_session() {
            let (base, log) = backend().await;
            let api = signed_in_client(&base);

            delete_seller(&api, "seller01").await.expect("delete");
            assert!(!api.session().is_logged_in());
            assert_eq!(calls(&log)[0].0, "delete-seller");
        }
    }
}
