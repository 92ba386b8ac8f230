pub mod config;
pub mod serviceaccount;
