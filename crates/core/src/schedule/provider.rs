use crate::console::{Command, CommandContext, CONSOLE};
use crate::container::Container;
use crate::errors::BoxError;
use crate::foundation::TIMEZONE;
use crate::providers::{ProviderError, ServiceProvider};
use crate::schedule::{Schedule, SCHEDULE};
use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration;

/// Provider binding the task schedule and its console commands
pub struct ScheduleServiceProvider;

#[async_trait]
impl ServiceProvider for ScheduleServiceProvider {
    fn name(&self) -> &'static str {
        "schedule"
    }

    fn register(&self, container: &Container) -> Result<(), ProviderError> {
        container.bind(&SCHEDULE, |c| {
            let timezone = match c.resolve(&TIMEZONE) {
                Ok(timezone) => *timezone,
                Err(err) if err.is_binding_not_found() => Tz::UTC,
                Err(err) => return Err(err.into()),
            };
            Ok(Arc::new(Schedule::with_timezone(timezone)))
        });
        Ok(())
    }

    async fn boot(&self, container: &Container) -> Result<(), ProviderError> {
        if container.has(&CONSOLE) {
            let console = container.resolve(&CONSOLE)?;
            console.register(ScheduleListCommand);
            console.register(ScheduleWorkCommand);
        }
        Ok(())
    }
}

/// `schedule:list`
pub struct ScheduleListCommand;

#[async_trait]
impl Command for ScheduleListCommand {
    fn name(&self) -> &str {
        "schedule:list"
    }

    fn description(&self) -> &str {
        "List the scheduled tasks"
    }

    async fn handle(&self, ctx: &CommandContext<'_>) -> Result<(), BoxError> {
        let schedule = ctx.container.resolve(&SCHEDULE)?;
        let now = Utc::now();

        if schedule.is_empty() {
            println!("No scheduled tasks have been defined.");
            return Ok(());
        }

        for task in schedule.tasks() {
            let next = task
                .next_run(now, schedule.timezone())
                .map(|at| at.with_timezone(&schedule.timezone()).to_rfc3339())
                .unwrap_or_else(|| "never".to_string());
            println!("{:<20} {:<20} next: {}", task.expression(), task.name(), next);
        }
        Ok(())
    }
}

/// `schedule:work`: run due tasks until interrupted
pub struct ScheduleWorkCommand;

#[async_trait]
impl Command for ScheduleWorkCommand {
    fn name(&self) -> &str {
        "schedule:work"
    }

    fn description(&self) -> &str {
        "Run the schedule worker in the foreground"
    }

    async fn handle(&self, ctx: &CommandContext<'_>) -> Result<(), BoxError> {
        let schedule = ctx.container.resolve(&SCHEDULE)?;
        schedule
            .work(Duration::from_secs(1), async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await;
        Ok(())
    }
}
