#![forbid(unsafe_code)]

pub mod checker;
pub mod client;
pub mod config;
pub mod error;
pub mod model;

pub use checker::{extract_streams, fetch_streams, streams_url};
pub use client::{HttpClient, HttpResponse, ReqwestClient, TransportError};
pub use config::CheckerConfig;
pub use error::CheckError;
pub use model::{StreamList, StreamRecord};
