use rdalle::{download_all, DalleApi, DalleClient, DownloadConfig, ListTasksRequest};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    rdalle::logger::init()?;
    match dotenv::dotenv() {
        Ok(_) => log::info!(".env file loaded"),
        Err(_) => log::warn!("No .env file found"),
    }

    let config = DownloadConfig::from_env()?;
    rdalle::logger::log_download_info(&config);

    let client = Arc::new(DalleClient::from_env()?);
    let tasks = client.list_tasks(ListTasksRequest::new()).await?;

    let report = download_all(client, &tasks.data, &config).await?;
    for file in &report.files {
        println!("{}", file.display());
    }

    Ok(())
}
