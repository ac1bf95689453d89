pub mod api_keys_port;
pub mod auth_port;
pub mod items_port;
pub mod notifier;
pub mod pointer_listeners;
pub mod press_timer;
pub mod session_store;
pub mod spatial_query;
