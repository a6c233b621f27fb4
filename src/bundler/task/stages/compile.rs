use super::{
    join_paths, libraries, library_class_path, resources::generate_r_sources, stage_future,
};
use crate::bundler::{
    Error, Result,
    builder::Tool,
    error::ErrorExt,
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

/// Compiles the project's Java sources with `javac`.
///
/// `R.java` sources are generated first, then every `.java` file under the
/// source roots and the generated-source directory is compiled into
/// `<out>/classes` against `android.jar` and the library jars.
pub struct Compile {
    project: Arc<Project>,
    context: Arc<BuildContext>,
}

impl Compile {
    pub fn new(project: Arc<Project>, context: Arc<BuildContext>) -> Self {
        Self { project, context }
    }

    /// Builds the `javac` argument vector; sources are read from `source_list`.
    pub fn arguments(
        &self,
        javac: &Path,
        android_jar: &Path,
        class_path: &[PathBuf],
        source_list: &Path,
    ) -> Result<ArgumentBuilder> {
        let mut args = ArgumentBuilder::program(javac);
        args.add(["-encoding", "UTF-8"])
            .flag_if(self.context.verbose(), "-verbose")
            .flag_if(!self.context.verbose(), "-nowarn")
            .flag_if(self.project.debuggable(), "-g")
            .flag_value("-bootclasspath", android_jar);
        if !class_path.is_empty() {
            args.flag_value("-classpath", join_paths(class_path)?);
        }
        args.flag_value("-d", self.project.classes_dir())
            .arg(format!("@{}", source_list.display()));
        Ok(args)
    }

    async fn execute(&self) -> Result<()> {
        let project = &self.project;
        let libraries = libraries(project, &self.context);

        generate_r_sources(project, &self.context, &libraries).await?;

        let mut roots = project.source_roots().to_vec();
        roots.push(project.generated_source_dir());
        let sources = fs::collect_files(roots, |p| fs::has_extension(p, "java")).await?;
        if sources.is_empty() {
            return Err(Error::Configuration(format!(
                "no Java sources found under {}",
                project
                    .source_roots()
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }

        let javac = self.context.tools().resolve(Tool::Javac)?;
        let android_jar = self.context.tools().resolve_android_jar()?;

        fs::create_dir_all(&project.classes_dir(), true).await?;

        let source_list = write_source_list(self.context.work_dir(), &sources).await?;
        let class_path = library_class_path(project, &self.context);
        let args = self.arguments(&javac, &android_jar, &class_path, &source_list)?;
        let invocation = Invocation::new(args.into_vec(), project.root());
        run_tool(self.context.invoker(), &invocation).await?;

        log::info!(
            "Compiled {} source files into {}",
            sources.len(),
            project.classes_dir().display()
        );
        Ok(())
    }
}

/// Writes a `javac` argument file listing `sources`, one quoted path per line.
async fn write_source_list(work_dir: &Path, sources: &[PathBuf]) -> Result<PathBuf> {
    fs::create_dir_all(work_dir, false).await?;
    let list = work_dir.join("javac-sources.txt");
    let content: String = sources
        .iter()
        .map(|p| format!("\"{}\"\n", p.to_string_lossy().replace('\\', "/")))
        .collect();
    tokio::fs::write(&list, content)
        .await
        .fs_context("writing javac source list", &list)?;
    Ok(list)
}

impl Task for Compile {
    fn name(&self) -> &str {
        StageKind::Compile.name()
    }

    fn run(&self) -> TaskFuture<'_> {
        stage_future(StageKind::Compile, self.execute())
    }
}
