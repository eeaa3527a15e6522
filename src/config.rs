//! Command-line and environment configuration.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::api::{normalize_api_url, DEFAULT_API_URL};

#[derive(Parser, Debug)]
#[command(name = "seller-console")]
#[command(author, version, about = "Seller console for the marketplace backend", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Base URL of the seller backend
    #[arg(long, env = "SELLER_API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "SELLER_TIMEOUT_SECS", default_value_t = 30, global = true)]
    pub timeout_secs: u64,

    /// Directory for rolling log files
    #[arg(long, env = "SELLER_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Sign in and store the session in the OS credential store
    Login {
        #[arg(long, env = "SELLER_LOGIN_ID")]
        login_id: String,
        #[arg(long, env = "SELLER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show one dashboard tab for a store
    Orders {
        #[arg(long)]
        store_id: i64,
        /// received, done or canceled
        #[arg(long, default_value = "received")]
        tab: String,
        /// Day shown on the done/canceled tabs (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Cancel an order
    Cancel {
        #[arg(long)]
        store_id: i64,
        order_id: i64,
    },
    /// Mark an order as done
    Complete {
        #[arg(long)]
        store_id: i64,
        order_id: i64,
    },
    /// Show the signed-in seller's profile
    Profile,
    /// Turn double-click confirmation on or off
    DoubleClick {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Request a password reset
    ResetPassword {
        #[arg(long)]
        login_id: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        mobile: String,
    },
}

/// Resolved client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub timeout: Duration,
}

impl Cli {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_url: normalize_api_url(&self.api_url),
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn defaults_apply_without_environment() {
        std::env::remove_var("SELLER_API_URL");
        std::env::remove_var("SELLER_TIMEOUT_SECS");
        let cli = Cli::try_parse_from(["seller-console", "logout"]).expect("parse");
        assert_eq!(cli.command, Command::Logout);
        let config = cli.client_config();
        assert_eq!(config.api_url, "http://localhost:8080");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    #[serial]
    fn environment_overrides_api_url() {
        std::env::set_var("SELLER_API_URL", "sellers.example.com/api/");
        let cli = Cli::try_parse_from(["seller-console", "profile"]).expect("parse");
        std::env::remove_var("SELLER_API_URL");
        assert_eq!(cli.client_config().api_url, "https://sellers.example.com");
    }

    #[test]
    #[serial]
    fn orders_command_parses_tab_and_date() {
        let cli = Cli::try_parse_from([
            "seller-console",
            "orders",
            "--store-id",
            "3",
            "--tab",
            "done",
            "--date",
            "2024-06-01",
        ])
        .expect("parse");
        assert_eq!(
            cli.command,
            Command::Orders {
                store_id: 3,
                tab: "done".into(),
                date: NaiveDate::from_ymd_opt(2024, 6, 1),
            }
        );
    }

    #[test]
    #[serial]
    fn cancel_takes_positional_order_id() {
        let cli =
            Cli::try_parse_from(["seller-console", "cancel", "--store-id", "1", "42"]).expect("parse");
        assert_eq!(
            cli.command,
            Command::Cancel {
                store_id: 1,
                order_id: 42
            }
        );
    }

    #[test]
    #[serial]
    fn zero_timeout_is_clamped() {
        let cli = Cli::try_parse_from(["seller-console", "--timeout-secs", "0", "logout"])
            .expect("parse");
        assert_eq!(cli.client_config().timeout, Duration::from_secs(1));
    }
}
