pub mod audit;
pub mod client_info;
pub mod identity;
pub mod profiles;
pub mod stores;
