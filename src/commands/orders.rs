use chrono::{Local, NaiveDate};
use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::orders::{
    ActionOutcome, DashboardParams, Order, OrderAction, OrderDashboard, OrderStatus,
    CONFIRMATION_WINDOW,
};

fn status_label(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Received => "received",
        OrderStatus::Done => "done",
        OrderStatus::Canceled => "canceled",
    }
}

fn order_line(order: &Order) -> String {
    format!(
        "#{:<6} {:<9} {}  items={:<3} total={}",
        order.order_id,
        status_label(order.status),
        order.created_at.format("%Y-%m-%d %H:%M"),
        order.order_items.len(),
        order.total()
    )
}

async fn open_dashboard(
    api: Arc<ApiClient>,
    store_id: i64,
    selected_date: NaiveDate,
    order_type: &str,
) -> OrderDashboard {
    let login_id = api.session().login_id().to_string();
    let dashboard = OrderDashboard::new(
        api,
        DashboardParams {
            store_id,
            login_id,
            selected_date,
            order_type: order_type.to_string(),
        },
    );
    dashboard.activate().await;
    dashboard
}

/// Print one dashboard tab.
pub async fn show_orders(
    api: Arc<ApiClient>,
    store_id: i64,
    tab: &str,
    date: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let selected_date = date.unwrap_or_else(|| Local::now().date_naive());
    let dashboard = open_dashboard(api, store_id, selected_date, tab).await;

    let filtered = dashboard.filtered_orders();
    println!(
        "store {store_id} / {tab} / {selected_date}: {} order(s)",
        filtered.len()
    );
    for order in &filtered {
        println!("  {}", order_line(order));
    }
    println!("tab total: {}", dashboard.tab_total());
    Ok(())
}

/// Read one line from stdin on a dedicated thread.
///
/// The receiver yields `None` at end of input or on a read error. The thread
/// is detached, so an unanswered prompt never keeps the runtime alive.
fn read_stdin_line() -> oneshot::Receiver<Option<String>> {
    let (tx, rx) = oneshot::channel();
    std::thread::spawn(move || {
        let mut line = String::new();
        let read = match std::io::stdin().lock().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line),
            Err(e) => {
                warn!(error = %e, "failed to read confirmation from stdin");
                None
            }
        };
        let _ = tx.send(read);
    });
    rx
}

/// `true` only when a line arrived inside `window`. End of input, a dropped
/// reader and a timeout all count as "not confirmed".
async fn confirmed_within(line: oneshot::Receiver<Option<String>>, window: Duration) -> bool {
    matches!(tokio::time::timeout(window, line).await, Ok(Ok(Some(_))))
}

/// Cancel or complete one order. With double-click confirmation enabled the
/// seller is asked to press Enter again inside the confirmation window.
pub async fn order_action(
    api: Arc<ApiClient>,
    store_id: i64,
    order_id: i64,
    action: OrderAction,
) -> anyhow::Result<()> {
    run_order_action(api, store_id, order_id, action, read_stdin_line).await
}

async fn run_order_action<F>(
    api: Arc<ApiClient>,
    store_id: i64,
    order_id: i64,
    action: OrderAction,
    read_confirmation: F,
) -> anyhow::Result<()>
where
    F: FnOnce() -> oneshot::Receiver<Option<String>>,
{
    let today = Local::now().date_naive();
    let dashboard = open_dashboard(api, store_id, today, "received").await;
    if dashboard.order(order_id).is_none() {
        println!("order #{order_id} is not in store {store_id}'s order list, sending anyway");
    }

    let mut outcome = request(&dashboard, action, order_id).await;
    if outcome == ActionOutcome::AwaitingConfirmation {
        println!(
            "press Enter within {}s to confirm {} of order #{order_id}",
            CONFIRMATION_WINDOW.as_secs(),
            action.as_str()
        );
        if confirmed_within(read_confirmation(), CONFIRMATION_WINDOW).await {
            outcome = request(&dashboard, action, order_id).await;
        } else {
            info!(order_id, action = action.as_str(), "confirmation not given in time");
        }
    }

    match outcome {
        ActionOutcome::Committed => {
            let status = dashboard
                .order(order_id)
                .map(|o| status_label(o.status))
                .unwrap_or(status_label(action.target_status()));
            println!("order #{order_id} is now {status}");
            Ok(())
        }
        ActionOutcome::AwaitingConfirmation => {
            println!("order #{order_id} was not confirmed, nothing changed");
            Ok(())
        }
        ActionOutcome::Failed => {
            anyhow::bail!("{} of order #{order_id} failed, see the log for details", action.as_str())
        }
    }
}

async fn request(dashboard: &OrderDashboard, action: OrderAction, order_id: i64) -> ActionOutcome {
    match action {
        OrderAction::Cancel => dashboard.request_cancel(order_id).await,
        OrderAction::Complete => dashboard.request_complete(order_id).await,
    }
}
