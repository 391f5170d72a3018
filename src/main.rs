use clap::{Parser, Subcommand};
use rdalle::{
    download_all, logger, wait_for_task, ClientConfig, DalleApi, DalleClient, DownloadConfig,
    ListTasksRequest, PollConfig, Task,
};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "rdalle", version, about = "DALL-E labs API client")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a text-to-image task
    Generate {
        caption: String,
        /// Return right after submitting instead of polling
        #[arg(long)]
        no_wait: bool,
        /// Download the images once the task succeeded
        #[arg(long, conflicts_with = "no_wait")]
        download: bool,
    },
    /// List earlier tasks
    List {
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show one task
    Get { task_id: String },
    /// Make a generation public and print its image path
    Share { generation_id: String },
    /// Download every generation of every succeeded task
    DownloadAll,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        log::error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let mut log_config = logger::LoggerConfig::from_env();
    if cli.verbose {
        log_config = log_config.with_level(logger::LogLevel::Debug);
    }
    logger::init_with_config(log_config)?;
    if !dotenv_loaded {
        log::debug!("No .env file found, using process environment");
    }

    let config = ClientConfig::from_env()?;
    logger::log_client_info(&config);
    let client = Arc::new(DalleClient::new(config)?);

    match cli.command {
        Command::Generate {
            caption,
            no_wait,
            download,
        } => {
            let task = client.generate(&caption).await?;
            println!("task id {}", task.id);
            if no_wait {
                return Ok(());
            }

            let _timer = logger::timer("Generation");
            let task = wait_for_task(client.as_ref(), &task.id, &PollConfig::from_env()?).await?;
            println!("{} images generated", task.generations.data.len());
            print_task(&task);

            if download {
                let download_config = DownloadConfig::from_env()?;
                let report = download_all(Arc::clone(&client), &[task], &download_config).await?;
                for file in report.files {
                    println!("{}", file.display());
                }
            }
        }
        Command::List { limit } => {
            let request = ListTasksRequest { limit };
            let tasks = client.list_tasks(request).await?;
            for task in &tasks.data {
                println!(
                    "{}\t{}\t{}\t{}",
                    task.id,
                    task.status,
                    task.generations.data.len(),
                    task.prompt.prompt.caption
                );
            }
        }
        Command::Get { task_id } => {
            let task = client.get_task(&task_id).await?;
            print_task(&task);
        }
        Command::Share { generation_id } => {
            println!("{}", client.share(&generation_id).await?);
        }
        Command::DownloadAll => {
            let download_config = DownloadConfig::from_env()?;
            logger::log_download_info(&download_config);

            let _timer = logger::timer("Download");
            let tasks = client.list_tasks(ListTasksRequest::new()).await?;
            let report = download_all(Arc::clone(&client), &tasks.data, &download_config).await?;
            println!(
                "{} images downloaded, {} tasks skipped",
                report.files.len(),
                report.skipped_tasks.len()
            );
        }
    }

    Ok(())
}

fn print_task(task: &Task) {
    println!("id:      {}", task.id);
    println!("status:  {}", task.status);
    println!("caption: {}", task.prompt.prompt.caption);
    for generation in &task.generations.data {
        println!("  {}  {}", generation.id, generation.generation.image_path);
    }
}
