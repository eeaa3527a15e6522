//! Order dashboard: model, backend seam, confirmation tracking and the
//! dashboard state manager itself.

pub mod backend;
pub mod confirm;
pub mod dashboard;
pub mod filter;
pub mod model;

pub use backend::OrderBackend;
pub use confirm::{ConfirmState, ConfirmationTracker, CONFIRMATION_WINDOW};
pub use dashboard::{ActionOutcome, DashboardParams, OrderDashboard};
pub use model::{Order, OrderAction, OrderId, OrderItem, OrderStatus, OrderTab};
