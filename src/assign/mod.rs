pub mod cache;
pub mod matcher;
pub mod naming;
pub mod retry;
