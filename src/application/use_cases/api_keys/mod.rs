pub mod create_key;
pub mod delete_key;
pub mod list_keys;
