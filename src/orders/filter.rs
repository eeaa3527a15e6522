//! Tab filtering and totals over the dashboard's order list.
//!
//! Pure functions, recomputed on every read. `today` is passed in so the
//! day bucketing can be tested without touching the clock.

use chrono::NaiveDate;

use super::model::{Order, OrderTab};

/// Orders shown on `tab`.
///
/// The received tab only shows today's orders; the done and canceled tabs
/// show the day picked in `selected_date`. `None` (an order type that did not
/// parse) matches nothing.
pub fn filter_orders<'a>(
    orders: &'a [Order],
    tab: Option<OrderTab>,
    selected_date: NaiveDate,
    today: NaiveDate,
) -> Vec<&'a Order> {
    let Some(tab) = tab else {
        return Vec::new();
    };
    let day = match tab {
        OrderTab::Received => today,
        OrderTab::Done | OrderTab::Canceled => selected_date,
    };
    orders
        .iter()
        .filter(|order| order.status == tab.status() && order.created_day() == day)
        .collect()
}

pub fn tab_total<'a, I>(orders: I) -> i64
where
    I: IntoIterator<Item = &'a Order>,
{
    orders.into_iter().map(Order::total).sum()
}
