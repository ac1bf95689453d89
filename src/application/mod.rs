pub mod access;
pub mod drag;
pub mod dto;
pub mod errors;
pub mod hierarchy;
pub mod ports;
pub mod services;
pub mod use_cases;
