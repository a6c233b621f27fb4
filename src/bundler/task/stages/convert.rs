use super::{library_class_path, stage_future};
use crate::bundler::{
    Error, Result,
    builder::Tool,
    settings::{BuildContext, Project},
    task::{StageKind, Task, TaskFuture},
    utils::{
        ArgumentBuilder, fs,
        process::{Invocation, run_tool},
    },
};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

/// Converts compiled classes and library jars to dex with `d8`.
pub struct Convert {
    project: Arc<Project>,
    context: Arc<BuildContext>,
}

impl Convert {
    pub fn new(project: Arc<Project>, context: Arc<BuildContext>) -> Self {
        Self { project, context }
    }

    pub fn arguments(&self, d8: &Path, android_jar: &Path, inputs: &[PathBuf]) -> ArgumentBuilder {
        let project = &self.project;
        let mut args = ArgumentBuilder::program(d8);
        args.arg(if project.debuggable() { "--debug" } else { "--release" })
            .flag_value("--lib", android_jar)
            .flag_value("--min-api", project.min_api().to_string())
            .flag_value("--thread-count", num_cpus::get().to_string())
            .flag_value("--output", project.dex_dir())
            .add(inputs);
        args
    }

    async fn execute(&self) -> Result<()> {
        let project = &self.project;
        let classes = fs::collect_files(vec![project.classes_dir()], |p| {
            fs::has_extension(p, "class")
        })
        .await?;
        if classes.is_empty() {
            return Err(Error::Configuration(format!(
                "no compiled classes in {}",
                project.classes_dir().display()
            )));
        }

        let d8 = self.context.tools().resolve(Tool::D8)?;
        let android_jar = self.context.tools().resolve_android_jar()?;

        fs::create_dir_all(&project.dex_dir(), true).await?;

        let mut inputs = classes;
        inputs.extend(library_class_path(project, &self.context));
        let args = self.arguments(&d8, &android_jar, &inputs);
        run_tool(
            self.context.invoker(),
            &Invocation::new(args.into_vec(), project.root()),
        )
        .await?;

        log::info!("Converted {} inputs to dex", inputs.len());
        Ok(())
    }
}

impl Task for Convert {
    fn name(&self) -> &str {
        StageKind::Convert.name()
    }

    fn run(&self) -> TaskFuture<'_> {
        stage_future(StageKind::Convert, self.execute())
    }
}
