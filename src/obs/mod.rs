//! OBS integration over obs-websocket v5.

pub mod client;
pub mod protocol;

pub use client::ObsClient;
