//! HTTP API handlers

pub mod health;
pub mod model_info;
pub mod predict;
pub mod ui;

pub use health::health_routes;
pub use model_info::model_routes;
pub use predict::predict_routes;
pub use ui::ui_routes;
