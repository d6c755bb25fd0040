pub mod cli;
pub mod config;
pub mod controller;
pub mod form;
pub mod logging;
pub mod models;
pub mod presenter;
pub mod store;
pub mod tui;
pub mod utils;

pub use config::{Config, StoreBackend};
pub use controller::TaskController;
pub use models::{Category, Priority, Task};
pub use store::{open_stores, CategoryStore, StoreError, TaskStore};
pub use utils::Profile;
