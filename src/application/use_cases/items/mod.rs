pub mod create_item;
pub mod delete_item;
pub mod generate_token;
pub mod load_file;
pub mod move_item;
pub mod reveal_password;
pub mod update_item;
