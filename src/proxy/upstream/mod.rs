pub mod client;
pub mod models;
pub mod payload;
pub mod transport;

pub use client::UpstreamClient;
pub use transport::{PanelCall, PanelHttp, PanelTransport};
