use crate::commands::RunArgs;
use crate::output;

use color_eyre::Result;

use kfp_local::{SpecParser, SpecValidator, TaskRunner};

/// Show what a run would launch, using whatever outputs are already recorded
pub fn execute(args: &RunArgs) -> Result<()> {
    let config = args.config()?;

    output::status("Loading", &format!("{}", args.pipeline.display()));
    let spec = SpecParser::load(&args.pipeline)?;

    if let Err(errors) = SpecValidator::validate(&spec) {
        for error in &errors {
            output::warning(&format!("{}: {}", error.path, error.message));
        }
    }

    let runner = TaskRunner::new(spec, config)?;
    let plan = runner.plan(&args.tasks)?;
    let total = plan.len();

    for (index, step) in plan.iter().enumerate() {
        output::task_header(index, total, &step.task);
        match &step.command {
            Ok(command) => println!("{}", command.command_line()),
            Err(e) => output::warning(&e.user_message()),
        }
    }

    Ok(())
}
