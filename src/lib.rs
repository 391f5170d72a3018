//! # rdalle
//!
//! Async client for the DALL-E labs API. Submit a text-to-image task, poll it
//! until it finishes, list earlier tasks, share a generation publicly and
//! download the generated images.
//!
//! ```no_run
//! use rdalle::{wait_for_task, ClientConfig, DalleApi, DalleClient, PollConfig};
//!
//! # async fn example() -> rdalle::Result<()> {
//! let client = DalleClient::new(ClientConfig::new("sk-..."))?;
//! let task = client.generate("neon sports car driving into sunset, synthwave").await?;
//! let task = wait_for_task(&client, &task.id, &PollConfig::default()).await?;
//!
//! for generation in &task.generations.data {
//!     let image = client.download(&generation.id).await?.error_for_status().await?;
//!     let bytes = image.bytes().await?;
//!     println!("{}: {} bytes", generation.id, bytes.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod workflow;

pub use client::{DalleApi, DalleClient, HttpRequest, HttpResponse, HttpTransport, ImageStream, Method, ReqwestTransport};
pub use config::{ClientConfig, DownloadConfig, PollConfig};
pub use error::{ApiError, DalleError, Result};
pub use models::*;
pub use workflow::{download_all, download_generation, wait_for_task, DownloadReport};
