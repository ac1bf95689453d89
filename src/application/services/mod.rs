pub mod vault_view;
