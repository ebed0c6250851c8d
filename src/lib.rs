pub mod app;
pub mod config;
pub mod curriculum;
pub mod errors;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod reconcile;
pub mod state;
pub mod stats;
pub mod store;
pub mod ui;

pub use app::router;
pub use config::{Backend, Config};
pub use curriculum::{load_curriculum, Curriculum};
pub use reconcile::{build_view_models, completion_ratio, Transition, Tracker};
pub use state::AppState;
pub use store::{ProgressStore, Scope};
