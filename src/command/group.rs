use std::collections::HashMap;
use std::future::Future;

use tokio::process::Child;
use tokio::task::{Id, JoinSet};
use tracing::{debug, warn};

use super::runner::{finish, spawn};
use super::{CommandError, CommandOutput, CommandSpec};

/// A launched command, owned by the group until its output is drained.
struct ProcessHandle {
    name: String,
    spec: CommandSpec,
    child: Child,
}

type Supervised = Result<CommandOutput, CommandError>;

/// One supervising task per live child, keyed back to the command name.
#[derive(Default)]
struct Supervisors {
    tasks: JoinSet<Supervised>,
    names: HashMap<Id, (String, bool)>,
}

impl Supervisors {
    fn spawn<F>(&mut self, name: String, split: bool, task: F)
    where
        F: Future<Output = Supervised> + Send + 'static,
    {
        let id = self.tasks.spawn(task).id();
        self.names.insert(id, (name, split));
    }

    /// Drain tasks in completion order. Every supervised name ends up in
    /// `output`, even when its task dies.
    async fn drain(mut self, output: &mut HashMap<String, CommandOutput>) {
        while let Some(joined) = self.tasks.join_next_with_id().await {
            let (id, result) = match joined {
                Ok((id, result)) => (id, result),
                Err(err) => {
                    warn!(error = %err, "process supervisor task failed");
                    (err.id(), Err(CommandError::Supervisor))
                }
            };
            let Some((name, split)) = self.names.remove(&id) else {
                continue;
            };
            let captured = match result {
                Ok(captured) => captured,
                Err(err) => {
                    warn!(%name, error = %err, "command failed");
                    match err {
                        CommandError::NonZeroExit { output, .. } => output,
                        _ => CommandOutput::empty(split),
                    }
                }
            };
            output.insert(name, captured);
        }
    }
}

/// Launch every command, then wait for all of them.
///
/// Every process is started before any is waited on. Each live child is
/// handed to its own supervising task and completions are picked up in
/// whatever order they happen; the call returns once the last one is done.
/// There is no overall deadline: each command is expected to bound its own
/// runtime.
///
/// A command that cannot be spawned or waited on is recorded with empty
/// output, so the result always has one entry per requested name.
pub async fn run_parallel<I>(commands: I) -> HashMap<String, CommandOutput>
where
    I: IntoIterator<Item = (String, CommandSpec)>,
{
    let mut output = HashMap::new();
    let mut handles = Vec::new();

    for (name, spec) in commands {
        match spawn(&spec) {
            Ok(child) => handles.push(ProcessHandle { name, spec, child }),
            Err(err) => {
                warn!(%name, error = %err, "command did not start");
                output.insert(name, CommandOutput::empty(spec.split));
            }
        }
    }

    debug!(running = handles.len(), "process group launched");

    let mut supervisors = Supervisors::default();
    for ProcessHandle { name, spec, child } in handles {
        let split = spec.split;
        supervisors.spawn(name, split, async move {
            match child.wait_with_output().await {
                Ok(raw) => finish(&spec, raw),
                Err(source) => Err(CommandError::Wait {
                    program: spec.program.clone(),
                    source,
                }),
            }
        });
    }
    supervisors.drain(&mut output).await;

    output
}
