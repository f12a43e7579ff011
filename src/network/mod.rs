mod client;
mod error;
mod worker;

#[cfg(test)]
mod stub;

pub use client::ApiClient;
pub use worker::ChatWorker;
