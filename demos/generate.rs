use rdalle::{download_generation, wait_for_task, DalleApi, DalleClient, DownloadConfig, PollConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    rdalle::logger::init()?;
    match dotenv::dotenv() {
        Ok(_) => log::info!(".env file loaded"),
        Err(_) => log::warn!("No .env file found"),
    }

    let client = DalleClient::from_env()?;

    let task = client
        .generate("neon sports car driving into sunset, synthwave, cyberpunk")
        .await?;
    println!("task id {}", task.id);

    let task = wait_for_task(&client, &task.id, &PollConfig::default()).await?;
    println!("{} images generated", task.generations.data.len());

    // Files land in the working directory, one per generation.
    let config = DownloadConfig::new()
        .with_images_path(".")
        .with_buffer_size(512);
    let downloads = task
        .generations
        .data
        .iter()
        .map(|generation| download_generation(&client, &generation.id, &config));

    for result in futures::future::join_all(downloads).await {
        println!("saved {}", result?.display());
    }

    Ok(())
}
