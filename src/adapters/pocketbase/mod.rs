//! PocketBase record store
//!
//! Talks to PocketBase's REST API as an admin. The collection is created on
//! first use from the record field catalog.

pub mod adapter;
pub mod client;

pub use adapter::PocketBaseAdapter;
pub use client::PocketBaseClient;
