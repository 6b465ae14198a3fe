pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod harvester;
pub mod ledger;
pub mod models;
