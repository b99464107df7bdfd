pub(crate) mod client;
pub(crate) mod error;
pub(crate) mod models;
