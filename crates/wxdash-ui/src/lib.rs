//! Front-end glue for wxdash: runtime, async services and the dashboard view-model.

pub mod bridge;
pub mod error_mapping;
pub mod models;
pub mod services;
pub mod view;

pub use bridge::{initialize_dashboard_services, AppGateway, DashboardServices};
pub use error_mapping::AppErrorExt;
pub use models::{DashboardModel, DashboardSignal};
