mod database {
    pub mod actions;
    pub mod error;
    pub mod export;
    pub mod form;
    pub mod memory;
    pub mod pagination;
    pub mod postgres;
    pub mod schema;
    pub mod store;
}
mod config;
mod constants;

pub use config::*;
pub use constants::*;
pub use database::*;
pub use actions::*;
