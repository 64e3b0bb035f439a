pub mod audit;
pub mod client_info;
pub mod identity;
pub mod kv_store;
pub mod profile_store;
