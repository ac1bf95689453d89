pub mod api_keys;
pub mod auth;
pub mod items;
#[cfg(test)]
pub(crate) mod testing;
