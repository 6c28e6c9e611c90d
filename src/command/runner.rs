use std::process::{Output, Stdio};

use tokio::process::{Child, Command};
use tracing::debug;

use super::{CommandError, CommandOutput, CommandSpec};

/// Run one command to completion and return its combined output.
///
/// A nonzero exit is only an error when the spec is `checked`; otherwise the
/// captured text is handed back for the caller to interpret.
pub async fn run(spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
    let child = spawn(spec)?;
    let output = child
        .wait_with_output()
        .await
        .map_err(|source| CommandError::Wait {
            program: spec.program.clone(),
            source,
        })?;
    finish(spec, output)
}

pub(crate) fn spawn(spec: &CommandSpec) -> Result<Child, CommandError> {
    debug!(command = %spec.display(), "spawning");
    Command::new(&spec.program)
        .args(&spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| CommandError::Spawn {
            program: spec.program.clone(),
            source,
        })
}

pub(crate) fn finish(spec: &CommandSpec, output: Output) -> Result<CommandOutput, CommandError> {
    let code = output.status.code();
    debug!(command = %spec.program, ?code, bytes = output.stdout.len() + output.stderr.len(), "exited");

    let captured = CommandOutput::from_text(combine(&output), spec.split);
    if spec.check && !output.status.success() {
        return Err(CommandError::NonZeroExit {
            program: spec.program.clone(),
            code,
            output: captured,
        });
    }
    Ok(captured)
}

fn combine(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text
}
