pub mod client;
pub mod error;
mod graphql;
mod rest;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;
