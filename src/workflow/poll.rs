use crate::{
    client::DalleApi,
    config::PollConfig,
    error::{DalleError, Result},
    models::{Task, TaskStatus},
};

/// Poll a task at a fixed interval until it reaches a terminal status.
///
/// Returns the task once it has succeeded. A rejected task ends the loop at
/// once with [`DalleError::TaskRejected`]. Fetch errors are returned as-is;
/// nothing is retried.
pub async fn wait_for_task<A>(api: &A, task_id: &str, config: &PollConfig) -> Result<Task>
where
    A: DalleApi + ?Sized,
{
    let mut attempts: u32 = 0;

    loop {
        if let Some(max) = config.max_attempts {
            if attempts >= max {
                log::warn!("Giving up on task {} after {} polls", task_id, attempts);
                return Err(DalleError::PollExhausted {
                    task_id: task_id.to_string(),
                    attempts,
                });
            }
        }

        tokio::time::sleep(config.interval).await;
        attempts += 1;

        let task = api.get_task(task_id).await?;
        match task.status {
            TaskStatus::Succeeded => {
                log::info!(
                    "Task {} succeeded with {} generations",
                    task.id,
                    task.generations.data.len()
                );
                return Ok(task);
            }
            TaskStatus::Rejected => {
                log::error!("Task {} was rejected", task.id);
                return Err(DalleError::TaskRejected { task_id: task.id });
            }
            _ => {
                log::info!("Task {} still {} (poll {})", task_id, task.status, attempts);
            }
        }
    }
}
