// Pipeline - sequential replay of undo/redo invocations
//
// Batches run one after another, and invocations inside a batch run in list
// order. A failing operation is recorded and the replay moves on; only a
// failing `before` middleware stops it.

use crate::command::descriptor::{Invocation, Method};
use crate::command::instance::{Instance, InstanceRegistry};
use crate::command::trait_def::{CommandResult, Operation, OperationFuture};
use crate::logging::{Level, SharedLogger, log};
use std::sync::Arc;

/// What to replay: one invocation, one batch, or several batches
#[derive(Debug, Clone)]
pub enum Replay {
    One(Invocation),
    Batch(Vec<Invocation>),
    Batches(Vec<Vec<Invocation>>),
}

impl Replay {
    pub fn into_batches(self) -> Vec<Vec<Invocation>> {
        match self {
            Replay::One(invocation) => vec![vec![invocation]],
            Replay::Batch(batch) => vec![batch],
            Replay::Batches(batches) => batches,
        }
    }
}

impl From<Invocation> for Replay {
    fn from(invocation: Invocation) -> Self {
        Replay::One(invocation)
    }
}

impl From<Vec<Invocation>> for Replay {
    fn from(batch: Vec<Invocation>) -> Self {
        Replay::Batch(batch)
    }
}

impl From<Vec<Vec<Invocation>>> for Replay {
    fn from(batches: Vec<Vec<Invocation>>) -> Self {
        Replay::Batches(batches)
    }
}

/// Outcome of a replay
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Operations that were invoked, successfully or not
    pub executed: usize,
    /// Invocations skipped because their target could not be resolved
    pub skipped: usize,
    /// Failure messages in the order they happened
    pub errors: Vec<String>,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

enum Target {
    Operation(Operation),
    Instance(Arc<dyn Instance>, String),
}

impl Target {
    fn invoke(&self, args: Vec<serde_json::Value>) -> OperationFuture {
        match self {
            Target::Operation(operation) => operation(args),
            Target::Instance(instance, method) => instance.invoke(method, args),
        }
    }
}

/// Runs invocations against direct operations or registry instances
pub struct Pipeline {
    id_field: String,
    registry: Option<Arc<dyn InstanceRegistry>>,
    logger: SharedLogger,
}

impl Pipeline {
    pub fn new(
        id_field: impl Into<String>,
        registry: Option<Arc<dyn InstanceRegistry>>,
        logger: SharedLogger,
    ) -> Self {
        Self {
            id_field: id_field.into(),
            registry,
            logger,
        }
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Replay every batch in order
    ///
    /// Operation failures are collected into the report and logged once per
    /// batch. Returns an error only if a `before` middleware fails, in which
    /// case nothing after it runs.
    pub async fn run(&self, replay: impl Into<Replay>) -> CommandResult<RunReport> {
        let replay: Replay = replay.into();
        let mut report = RunReport::default();

        for batch in replay.into_batches() {
            let mut errors = Vec::new();

            for invocation in &batch {
                self.run_one(invocation, &mut report, &mut errors).await?;
            }

            if !errors.is_empty() {
                log(
                    self.logger.as_ref(),
                    Level::Error,
                    &format!("StateManager.run|{}", errors.join("; ")),
                );
                report.errors.append(&mut errors);
            }
        }

        Ok(report)
    }

    fn resolve(&self, invocation: &Invocation) -> Option<Target> {
        match invocation.method()? {
            Method::Call(operation) => Some(Target::Operation(Arc::clone(operation))),
            Method::Named(name) => {
                let id = invocation.attribute(&self.id_field);
                let instance = self.registry.as_ref()?.get_instance(id)?;
                Some(Target::Instance(instance, name.clone()))
            }
        }
    }

    async fn run_one(
        &self,
        invocation: &Invocation,
        report: &mut RunReport,
        errors: &mut Vec<String>,
    ) -> CommandResult<()> {
        let Some(target) = self.resolve(invocation) else {
            report.skipped += 1;
            return Ok(());
        };

        let mut args = invocation.argument_list();
        if let Some(before) = invocation.before() {
            if let Some(extra) = before(invocation.attributes()).await? {
                args.push(extra);
            }
        }

        report.executed += 1;
        match target.invoke(args).await {
            Ok(result) => {
                if let Some(after) = invocation.after() {
                    if let Err(err) = after(result, invocation.attributes()).await {
                        errors.push(err.to_string());
                    }
                }
            }
            Err(err) => errors.push(err.to_string()),
        }

        Ok(())
    }
}
