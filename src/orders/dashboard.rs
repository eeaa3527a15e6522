//! Seller order dashboard state.
//!
//! Owns the in-memory order list of one store, the seller's double-click
//! setting and the two confirmation trackers. Network failures never escape:
//! they are logged and the affected state keeps its previous value.

use chrono::{Local, NaiveDate};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, info, warn};

use super::backend::OrderBackend;
use super::confirm::{ConfirmState, ConfirmationTracker};
use super::filter::{filter_orders, tab_total};
use super::model::{Order, OrderAction, OrderId, OrderTab};

/// Construction parameters of a dashboard.
#[derive(Debug, Clone)]
pub struct DashboardParams {
    pub store_id: i64,
    pub login_id: String,
    pub selected_date: NaiveDate,
    /// Raw tab name (`received`, `done`, `canceled`).
    pub order_type: String,
}

/// What a cancel/complete request ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// First click with double-click enabled; waiting for the second one.
    AwaitingConfirmation,
    /// The backend accepted the action and the local status was updated.
    Committed,
    /// The backend call failed; local state is unchanged.
    Failed,
}

struct DashboardState {
    orders: Vec<Order>,
    is_loading: bool,
    /// Order fetches started and not yet settled.
    reloads_in_flight: usize,
    /// Sequence number of the last started fetch, and of the newest one
    /// whose result was applied.
    reload_seq: u64,
    applied_seq: u64,
    double_click: bool,
    selected_date: NaiveDate,
    tab: Option<OrderTab>,
}

pub struct OrderDashboard {
    backend: Arc<dyn OrderBackend>,
    store_id: i64,
    login_id: String,
    state: Mutex<DashboardState>,
    cancels: ConfirmationTracker,
    completes: ConfirmationTracker,
}

fn parse_tab(order_type: &str) -> Option<OrderTab> {
    match order_type.parse::<OrderTab>() {
        Ok(tab) => Some(tab),
        Err(e) => {
            warn!(order_type, error = %e, "unrecognized order type, no orders will match");
            None
        }
    }
}

impl OrderDashboard {
    /// Create an inactive dashboard. It reports loading until the first
    /// order fetch started by [`activate`](Self::activate) settles.
    pub fn new(backend: Arc<dyn OrderBackend>, params: DashboardParams) -> Self {
        let tab = parse_tab(&params.order_type);
        Self {
            backend,
            store_id: params.store_id,
            login_id: params.login_id,
            state: Mutex::new(DashboardState {
                orders: Vec::new(),
                is_loading: true,
                reloads_in_flight: 0,
                reload_seq: 0,
                applied_seq: 0,
                double_click: false,
                selected_date: params.selected_date,
                tab,
            }),
            cancels: ConfirmationTracker::new(OrderAction::Cancel),
            completes: ConfirmationTracker::new(OrderAction::Complete),
        }
    }

    fn state(&self) -> MutexGuard<'_, DashboardState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fetch the orders and the double-click setting concurrently.
    pub async fn activate(&self) {
        info!(store_id = self.store_id, login_id = %self.login_id, "activating order dashboard");
        tokio::join!(self.reload(), self.load_double_click_setting());
    }

    /// Re-fetch the store's orders. A failed fetch keeps the current list.
    ///
    /// Overlapping reloads keep the dashboard loading until the last one
    /// settles, and a slower older response never replaces a newer list.
    pub async fn reload(&self) {
        let seq = {
            let mut state = self.state();
            state.reload_seq += 1;
            state.reloads_in_flight += 1;
            state.is_loading = true;
            state.reload_seq
        };
        let result = self.backend.fetch_orders(self.store_id).await;

        let mut state = self.state();
        match result {
            Ok(orders) if seq > state.applied_seq => {
                info!(store_id = self.store_id, count = orders.len(), "orders loaded");
                state.orders = orders;
                state.applied_seq = seq;
            }
            Ok(_) => {
                info!(store_id = self.store_id, seq, "discarding superseded order list");
            }
            Err(e) => {
                error!(store_id = self.store_id, error = %e, "failed to load orders");
            }
        }
        state.reloads_in_flight = state.reloads_in_flight.saturating_sub(1);
        state.is_loading = state.reloads_in_flight > 0;
    }

    async fn load_double_click_setting(&self) {
        match self
            .backend
            .fetch_double_click_setting(&self.login_id)
            .await
        {
            Ok(enabled) => {
                info!(login_id = %self.login_id, enabled, "double-click setting loaded");
                self.state().double_click = enabled;
            }
            Err(e) => {
                error!(login_id = %self.login_id, error = %e, "failed to load double-click setting");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn is_loading(&self) -> bool {
        self.state().is_loading
    }

    pub fn double_click_enabled(&self) -> bool {
        self.state().double_click
    }

    pub fn orders(&self) -> Vec<Order> {
        self.state().orders.clone()
    }

    pub fn order(&self, order_id: OrderId) -> Option<Order> {
        self.state()
            .orders
            .iter()
            .find(|o| o.order_id == order_id)
            .cloned()
    }

    pub fn pending_cancels(&self) -> Vec<OrderId> {
        self.cancels.pending_ids()
    }

    pub fn pending_completes(&self) -> Vec<OrderId> {
        self.completes.pending_ids()
    }

    pub fn confirm_state(&self, action: OrderAction, order_id: OrderId) -> ConfirmState {
        self.tracker(action).state(order_id)
    }

    /// Orders on the current tab.
    pub fn filtered_orders(&self) -> Vec<Order> {
        let today = Local::now().date_naive();
        let state = self.state();
        filter_orders(&state.orders, state.tab, state.selected_date, today)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Sum of the order totals on the current tab.
    pub fn tab_total(&self) -> i64 {
        let today = Local::now().date_naive();
        let state = self.state();
        tab_total(filter_orders(
            &state.orders,
            state.tab,
            state.selected_date,
            today,
        ))
    }

    pub fn order_total(order: &Order) -> i64 {
        order.total()
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    pub fn set_selected_date(&self, date: NaiveDate) {
        self.state().selected_date = date;
    }

    pub fn set_order_type(&self, order_type: &str) {
        self.state().tab = parse_tab(order_type);
    }

    /// Append an order that arrived outside the initial fetch. Ids are not
    /// deduplicated.
    pub fn add_new_order(&self, order: Order) {
        info!(order_id = order.order_id, "new order added");
        self.state().orders.push(order);
    }

    pub async fn request_cancel(&self, order_id: OrderId) -> ActionOutcome {
        self.request(OrderAction::Cancel, order_id).await
    }

    pub async fn request_complete(&self, order_id: OrderId) -> ActionOutcome {
        self.request(OrderAction::Complete, order_id).await
    }

    fn tracker(&self, action: OrderAction) -> &ConfirmationTracker {
        match action {
            OrderAction::Cancel => &self.cancels,
            OrderAction::Complete => &self.completes,
        }
    }

    async fn request(&self, action: OrderAction, order_id: OrderId) -> ActionOutcome {
        let double_click = self.double_click_enabled();
        if double_click {
            match self.tracker(action).request(order_id) {
                ConfirmState::Committed => {}
                ConfirmState::PendingConfirmation | ConfirmState::Idle => {
                    return ActionOutcome::AwaitingConfirmation;
                }
            }
        }
        self.commit(action, order_id).await
    }

    async fn commit(&self, action: OrderAction, order_id: OrderId) -> ActionOutcome {
        let result = match action {
            OrderAction::Cancel => self.backend.cancel_order(order_id).await,
            OrderAction::Complete => self.backend.complete_order(order_id).await,
        };
        match result {
            Ok(()) => {
                let status = action.target_status();
                let mut state = self.state();
                for order in state.orders.iter_mut().filter(|o| o.order_id == order_id) {
                    order.status = status;
                }
                info!(order_id, action = action.as_str(), "order status updated");
                ActionOutcome::Committed
            }
            Err(e) => {
                error!(order_id, action = action.as_str(), error = %e, "order action failed");
                ActionOutcome::Failed
            }
        }
    }
}

impl Drop for OrderDashboard {
    fn drop(&mut self) {
        self.cancels.clear();
        self.completes.clear();
    }
}
