//! Keeps the signed-in seller's token pair between CLI runs.
//!
//! Each session field is its own `keyring` entry under the `seller-console`
//! service. Only the CLI reads from here; the library itself always receives
//! an explicit [`Session`].

use keyring::Entry;
use tracing::{info, warn};

use crate::session::Session;

const SERVICE_NAME: &str = "seller-console";

const KEY_LOGIN_ID: &str = "login_id";
const KEY_TOKEN_TYPE: &str = "token_type";
const KEY_ACCESS_TOKEN: &str = "access_token";
const KEY_REFRESH_TOKEN: &str = "refresh_token";

/// Write order of a saved session.
const ALL_KEYS: &[&str] = &[
    KEY_LOGIN_ID,
    KEY_TOKEN_TYPE,
    KEY_ACCESS_TOKEN,
    KEY_REFRESH_TOKEN,
];

fn entry(key: &str) -> keyring::Result<Entry> {
    Entry::new(SERVICE_NAME, key)
}

/// One stored session field. A field that was never written reads as `None`;
/// backend errors are logged and read as `None` too, so a broken keyring
/// behaves like a signed-out CLI.
fn read_field(key: &str) -> Option<String> {
    match entry(key).and_then(|e| e.get_password()) {
        Ok(value) => Some(value),
        Err(keyring::Error::NoEntry) => None,
        Err(e) => {
            warn!(key, error = %e, "could not read stored session field");
            None
        }
    }
}

fn write_field(key: &str, value: &str) -> Result<(), String> {
    entry(key)
        .and_then(|e| e.set_password(value))
        .map_err(|e| format!("{key}: {e}"))
}

fn remove_field(key: &str) -> Result<(), String> {
    match entry(key).and_then(|e| e.delete_credential()) {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(format!("{key}: {e}")),
    }
}

/// Key/value pairs written for a session, in `ALL_KEYS` order.
fn session_fields(session: &Session) -> [(&'static str, String); 4] {
    [
        (KEY_LOGIN_ID, session.login_id().to_string()),
        (KEY_TOKEN_TYPE, session.token_type()),
        (KEY_ACCESS_TOKEN, session.access_token()),
        (KEY_REFRESH_TOKEN, session.refresh_token()),
    ]
}

// ---------------------------------------------------------------------------
// Session API
// ---------------------------------------------------------------------------

/// Build a session from the stored credentials. `None` when no access token
/// has been stored yet.
pub fn load_session() -> Option<Session> {
    let access_token = read_field(KEY_ACCESS_TOKEN).filter(|t| !t.trim().is_empty())?;
    let login_id = read_field(KEY_LOGIN_ID).unwrap_or_default();
    let token_type = read_field(KEY_TOKEN_TYPE).unwrap_or_default();
    let refresh_token = read_field(KEY_REFRESH_TOKEN).unwrap_or_default();
    Some(Session::new(login_id, token_type, access_token, refresh_token))
}

pub fn save_session(session: &Session) -> Result<(), String> {
    for (key, value) in session_fields(session) {
        write_field(key, &value)?;
    }
    info!(login_id = %session.login_id(), "seller session stored");
    Ok(())
}

/// Remove every stored session field (sign-out, account deletion, expired
/// refresh token). Keeps going past individual failures.
pub fn clear_session() -> Result<(), String> {
    let errors: Vec<String> = ALL_KEYS
        .iter()
        .filter_map(|key| remove_field(key).err())
        .collect();
    if errors.is_empty() {
        info!("seller session cleared from credential store");
        Ok(())
    } else {
        Err(errors.join("; "))
    }
}
