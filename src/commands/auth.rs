use anyhow::{anyhow, Context};
use std::sync::Arc;
use tracing::warn;

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::seller::{self, PasswordResetForm, SellerUpdate};
use crate::session::Session;
use crate::storage;

/// Client for calls that need no session.
pub fn public_client(config: &ClientConfig) -> anyhow::Result<ApiClient> {
    ApiClient::new(&config.api_url, config.timeout, Arc::new(Session::anonymous()))
        .context("failed to create API client")
}

/// Client bound to the stored session.
pub fn session_client(config: &ClientConfig) -> anyhow::Result<Arc<ApiClient>> {
    let session = storage::load_session()
        .ok_or_else(|| anyhow!("not signed in, run `seller-console login` first"))?;
    let client = ApiClient::new(&config.api_url, config.timeout, Arc::new(session))
        .context("failed to create API client")?;
    Ok(Arc::new(client))
}

/// Persist a refreshed access token, or forget the session when the backend
/// rejected the refresh token.
pub fn sync_stored_session(api: &ApiClient) {
    let session = api.session();
    let result = if session.is_logged_in() {
        storage::save_session(session)
    } else {
        storage::clear_session()
    };
    if let Err(e) = result {
        warn!(error = %e, "failed to update stored session");
    }
}

pub async fn login(config: &ClientConfig, login_id: &str, password: &str) -> anyhow::Result<()> {
    let api = public_client(config)?;
    let session = seller::sign_in(&api, login_id, password)
        .await
        .context("sign-in failed")?;
    storage::save_session(&session).map_err(|e| anyhow!("failed to store session: {e}"))?;
    println!("signed in as {login_id}");
    Ok(())
}

pub fn logout() -> anyhow::Result<()> {
    storage::clear_session().map_err(|e| anyhow!("failed to clear session: {e}"))?;
    println!("signed out");
    Ok(())
}

pub async fn profile(api: &ApiClient) -> anyhow::Result<()> {
    let login_id = api.session().login_id().to_string();
    let seller = seller::get_seller(api, &login_id)
        .await
        .context("failed to load profile")?;
    println!("login id : {}", seller.login_id);
    println!("name     : {}", seller.username);
    println!("e-mail   : {}", seller.email);
    println!("mobile   : {}", seller.mobile);
    let confirm = match seller.done_click_count_setting {
        Some(true) => "double click",
        Some(false) => "single click",
        None => "not set",
    };
    println!("confirm  : {confirm}");
    Ok(())
}

pub async fn set_double_click(api: &ApiClient, enabled: bool) -> anyhow::Result<()> {
    let login_id = api.session().login_id().to_string();
    let update = SellerUpdate {
        done_click_count_setting: Some(enabled),
        ..Default::default()
    };
    let seller = seller::update_seller(api, &login_id, &update)
        .await
        .context("failed to update confirmation setting")?;
    println!(
        "double-click confirmation {}",
        if seller.done_click_count_setting.unwrap_or(enabled) {
            "enabled"
        } else {
            "disabled"
        }
    );
    Ok(())
}

pub async fn reset_password(
    config: &ClientConfig,
    login_id: &str,
    email: &str,
    mobile: &str,
) -> anyhow::Result<()> {
    let api = public_client(config)?;
    let mut form = PasswordResetForm {
        login_id: login_id.trim().to_string(),
        email: email.trim().to_string(),
        ..Default::default()
    };
    form.set_mobile(mobile);
    match seller::reset_password(&api, &form).await {
        Ok(message) => {
            println!("{message}");
            Ok(())
        }
        Err(ApiError::Status { message, .. }) => Err(anyhow!(message)),
        Err(e) => Err(e).context("password reset failed"),
    }
}
