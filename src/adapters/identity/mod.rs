pub mod rest_identity;
