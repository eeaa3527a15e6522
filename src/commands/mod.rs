//! Command-line handlers, one per subcommand.

pub mod auth;
pub mod orders;

use crate::api::ApiClient;
use crate::config::{Cli, Command};
use crate::orders::OrderAction;

/// Write back whatever happened to the session (refresh or expiry) before
/// returning the command's result.
fn finish(api: &ApiClient, result: anyhow::Result<()>) -> anyhow::Result<()> {
    auth::sync_stored_session(api);
    result
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let config = cli.client_config();
    match cli.command {
        Command::Login { login_id, password } => auth::login(&config, &login_id, &password).await,
        Command::Logout => auth::logout(),
        Command::ResetPassword {
            login_id,
            email,
            mobile,
        } => auth::reset_password(&config, &login_id, &email, &mobile).await,
        Command::Orders {
            store_id,
            tab,
            date,
        } => {
            let api = auth::session_client(&config)?;
            let result = orders::show_orders(api.clone(), store_id, &tab, date).await;
            finish(&api, result)
        }
        Command::Cancel { store_id, order_id } => {
            let api = auth::session_client(&config)?;
            let result =
                orders::order_action(api.clone(), store_id, order_id, OrderAction::Cancel).await;
            finish(&api, result)
        }
        Command::Complete { store_id, order_id } => {
            let api = auth::session_client(&config)?;
            let result =
                orders::order_action(api.clone(), store_id, order_id, OrderAction::Complete).await;
            finish(&api, result)
        }
        Command::Profile => {
            let api = auth::session_client(&config)?;
            let result = auth::profile(&api).await;
            finish(&api, result)
        }
        Command::DoubleClick { enabled } => {
            let api = auth::session_client(&config)?;
            let result = auth::set_double_click(&api, enabled).await;
            finish(&api, result)
        }
    }
}
