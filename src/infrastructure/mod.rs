pub mod http;
pub mod interaction;
pub mod memory;
pub mod notify;
pub mod session;
