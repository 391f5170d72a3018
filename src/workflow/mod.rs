//! Drivers that sequence client calls: waiting on a task and fanning out downloads.

pub mod download;
pub mod poll;

pub use download::{download_all, download_generation, DownloadReport};
pub use poll::wait_for_task;
