//! Pub/Sub backend capability: the transport trait, the REST client that
//! implements it, and the retry policy consulted on every dispatch attempt.

pub mod client;
pub mod retry;
