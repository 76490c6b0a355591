use std::sync::Arc;

use anyhow::Result;
use log::info;

use schedule_sqlite::{ScheduleRepo, Store};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let path =
        std::env::var("SCHEDULE_DB_PATH").unwrap_or_else(|_| "student_schedule.db".to_string());

    let store = Arc::new(Store::new(path));
    store.initialize().await?;
    store.debug_dump().await;

    let schedule = ScheduleRepo::new(Arc::clone(&store));
    let items = schedule.get_all().await?;
    info!("Schedule holds {} items", items.len());
    for item in items {
        info!(
            "{} {} {} ({}, {})",
            item.day_of_week, item.time, item.subject, item.teacher_name, item.lesson_type
        );
    }

    Ok(())
}
