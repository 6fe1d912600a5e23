pub mod accounts;
pub mod logging;
pub mod media;
pub mod password;
pub mod server;
