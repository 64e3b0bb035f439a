pub mod http_client_info;
