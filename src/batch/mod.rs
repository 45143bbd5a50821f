pub mod config;
pub mod contract;
pub mod ekf;
pub mod history;
pub mod srif;
