pub mod account;
pub mod export;
pub mod helpers;
pub mod init;
pub mod lockout;
pub mod log;
pub mod login;
pub mod logout;
pub mod register;
pub mod reset;
pub mod session;
pub mod users;
pub mod verify;
