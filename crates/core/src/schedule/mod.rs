//! Cron-driven task schedule
//!
//! Tasks are registered under a name with a 6-field cron expression
//! (`sec min hour day-of-month month day-of-week`) and run by
//! [`Schedule::run_due`] or the long-running [`Schedule::work`] loop.
//! Expressions are evaluated in the schedule's timezone (`UTC` unless the
//! application configures `app.timezone`).

pub mod provider;

pub use provider::*;

use crate::container::ServiceKey;
use crate::errors::BoxError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use parking_lot::RwLock;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Container key of the schedule
pub const SCHEDULE: ServiceKey<Schedule> = ServiceKey::new("schedule");

/// Scheduling errors
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Invalid cron expression: {0}")]
    InvalidCron(String),

    #[error("Scheduled task not found: {0}")]
    TaskNotFound(String),

    #[error("Scheduled task '{0}' is already defined")]
    DuplicateTask(String),
}

/// Result type for scheduling operations
pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Parsed cron expression that keeps its source text
#[derive(Debug, Clone)]
pub struct CronExpression {
    expression: String,
    schedule: cron::Schedule,
}

impl CronExpression {
    /// Parse a 6-field cron expression
    ///
    /// - `0 * * * * *` every minute
    /// - `0 0 0 * * *` daily at midnight
    /// - `0 0 9-17 * * 1-5` weekdays 9-5
    pub fn new(expression: &str) -> ScheduleResult<Self> {
        let schedule = cron::Schedule::from_str(expression)
            .map_err(|e| ScheduleError::InvalidCron(format!("{}: {}", expression, e)))?;

        Ok(Self {
            expression: expression.to_string(),
            schedule,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.expression
    }

    /// First fire time strictly after `after`, with the fields read as
    /// wall-clock time in `timezone`
    pub fn next_run_time(&self, after: DateTime<Utc>, timezone: Tz) -> Option<DateTime<Utc>> {
        self.schedule
            .after(&after.with_timezone(&timezone))
            .next()
            .map(|at| at.with_timezone(&Utc))
    }
}

/// A unit of scheduled work
#[async_trait]
pub trait Job: Send + Sync {
    async fn run(&self) -> Result<(), BoxError>;
}

#[async_trait]
impl<F> Job for F
where
    F: Fn() -> Result<(), BoxError> + Send + Sync,
{
    async fn run(&self) -> Result<(), BoxError> {
        self()
    }
}

/// A named job with its cron expression
pub struct ScheduledTask {
    name: String,
    cron: CronExpression,
    job: Arc<dyn Job>,
}

impl ScheduledTask {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expression(&self) -> &str {
        self.cron.as_str()
    }

    pub fn next_run(&self, after: DateTime<Utc>, timezone: Tz) -> Option<DateTime<Utc>> {
        self.cron.next_run_time(after, timezone)
    }
}

impl std::fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("name", &self.name)
            .field("cron", &self.cron.as_str())
            .finish()
    }
}

/// Outcome of one task execution
#[derive(Debug)]
pub struct TaskRun {
    pub name: String,
    pub scheduled_for: DateTime<Utc>,
    pub result: Result<(), BoxError>,
}

impl TaskRun {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Task schedule
#[derive(Debug)]
pub struct Schedule {
    tasks: RwLock<Vec<Arc<ScheduledTask>>>,
    timezone: Tz,
}

impl Default for Schedule {
    fn default() -> Self {
        Self::with_timezone(Tz::UTC)
    }
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty schedule evaluating cron fields in `timezone`
    pub fn with_timezone(timezone: Tz) -> Self {
        Self {
            tasks: RwLock::new(Vec::new()),
            timezone,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Register `job` under `name`, firing on `cron_expr`
    pub fn call<J: Job + 'static>(&self, name: impl Into<String>, cron_expr: &str, job: J) -> ScheduleResult<()> {
        let name = name.into();
        let cron = CronExpression::new(cron_expr)?;

        let mut tasks = self.tasks.write();
        if tasks.iter().any(|task| task.name == name) {
            return Err(ScheduleError::DuplicateTask(name));
        }

        tracing::debug!("Scheduled task '{}' ({})", name, cron.as_str());
        tasks.push(Arc::new(ScheduledTask {
            name,
            cron,
            job: Arc::new(job),
        }));
        Ok(())
    }

    /// Registered tasks in registration order
    pub fn tasks(&self) -> Vec<Arc<ScheduledTask>> {
        self.tasks.read().clone()
    }

    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }

    /// Next fire time of a task
    pub fn next_run(&self, name: &str, after: DateTime<Utc>) -> ScheduleResult<Option<DateTime<Utc>>> {
        self.tasks
            .read()
            .iter()
            .find(|task| task.name == name)
            .map(|task| task.next_run(after, self.timezone))
            .ok_or_else(|| ScheduleError::TaskNotFound(name.to_string()))
    }

    /// Tasks with a fire time in `(after, until]`, paired with that time
    pub fn due_tasks(&self, after: DateTime<Utc>, until: DateTime<Utc>) -> Vec<(Arc<ScheduledTask>, DateTime<Utc>)> {
        self.tasks
            .read()
            .iter()
            .filter_map(|task| match task.next_run(after, self.timezone) {
                Some(at) if at <= until => Some((Arc::clone(task), at)),
                _ => None,
            })
            .collect()
    }

    /// Run every task due in `(after, until]`
    ///
    /// A failing task does not stop the others.
    pub async fn run_due(&self, after: DateTime<Utc>, until: DateTime<Utc>) -> Vec<TaskRun> {
        let mut runs = Vec::new();

        for (task, scheduled_for) in self.due_tasks(after, until) {
            tracing::info!("Running scheduled task '{}'", task.name);
            let result = task.job.run().await;
            if let Err(e) = &result {
                tracing::error!("Scheduled task '{}' failed: {}", task.name, e);
            }
            runs.push(TaskRun {
                name: task.name.clone(),
                scheduled_for,
                result,
            });
        }

        runs
    }

    /// Run due tasks every `tick` until `shutdown` resolves
    pub async fn work<S>(&self, tick: Duration, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut interval = tokio::time::interval(tick);
        let mut last = Utc::now();

        tracing::info!(
            "Schedule worker started with {} task(s) in {}",
            self.len(),
            self.timezone
        );
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = interval.tick() => {
                    let now = Utc::now();
                    self.run_due(last, now).await;
                    last = now;
                }
            }
        }
        tracing::info!("Schedule worker stopped");
    }
}
