use super::{libraries, stage_future};
use crate::bundler::{
    Error, Result,
    builder::Tool,
    error::Context,
    extract::ExtractedLibrary,
    settings::{BuildContext, Project},
    task::{StageKind, Task, TaskFuture},
    utils::{
        ArgumentBuilder, fs,
        process::{Invocation, run_tool},
    },
};
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Packages compiled resources and assets into `resources.ap_` with `aapt`.
pub struct PackageResources {
    project: Arc<Project>,
    context: Arc<BuildContext>,
}

impl PackageResources {
    pub fn new(project: Arc<Project>, context: Arc<BuildContext>) -> Self {
        Self { project, context }
    }

    /// Builds the `aapt package` argument vector.
    pub fn arguments(
        &self,
        aapt: &Path,
        android_jar: &Path,
        libraries: &[ExtractedLibrary],
    ) -> ArgumentBuilder {
        let project = &self.project;
        let mut args = ArgumentBuilder::program(aapt);
        args.add(["package", "-f", "--auto-add-overlay"])
            .flag_value("-M", project.manifest())
            .flag_value("-I", android_jar)
            .flag_value("-F", project.resource_package())
            .flag_value("--min-sdk-version", project.min_api().to_string());
        append_resource_dirs(&mut args, project, libraries);
        args.flag_if(project.debuggable(), "--debug-mode")
            .flag_if(self.context.verbose(), "-v");
        project.packaging().append_args(&mut args);
        args
    }

    async fn execute(&self) -> Result<()> {
        require_manifest(&self.project)?;
        let aapt = self.context.tools().resolve(Tool::Aapt)?;
        let android_jar = self.context.tools().resolve_android_jar()?;

        fs::create_dir_all(self.project.output_dir(), false).await?;
        fs::remove_file(&self.project.resource_package()).await?;

        let args = self.arguments(&aapt, &android_jar, &libraries(&self.project, &self.context));
        run_aapt(&self.context, &self.project, args).await?;

        log::info!(
            "Packaged resources into {}",
            self.project.resource_package().display()
        );
        Ok(())
    }
}

impl Task for PackageResources {
    fn name(&self) -> &str {
        StageKind::PackageResources.name()
    }

    fn run(&self) -> TaskFuture<'_> {
        stage_future(StageKind::PackageResources, self.execute())
    }
}

/// Appends `-S`/`-A` for the project, then each library in dependency order.
///
/// Directories that do not exist are skipped.
fn append_resource_dirs(
    args: &mut ArgumentBuilder,
    project: &Project,
    libraries: &[ExtractedLibrary],
) {
    args.flag_value("-S", existing_dir(project.res_dir()))
        .flag_value("-A", existing_dir(project.assets_dir()));
    for library in libraries {
        args.flag_value("-S", library.res_dir())
            .flag_value("-A", library.assets_dir());
    }
}

fn existing_dir(path: &Path) -> Option<PathBuf> {
    path.is_dir().then(|| path.to_path_buf())
}

fn require_manifest(project: &Project) -> Result<()> {
    if project.manifest().is_file() {
        Ok(())
    } else {
        Err(Error::Configuration(format!(
            "manifest {} does not exist",
            project.manifest().display()
        )))
    }
}

/// Runs `aapt`, treating an `ERROR` line on stderr as failure.
async fn run_aapt(context: &BuildContext, project: &Project, args: ArgumentBuilder) -> Result<()> {
    let invocation = Invocation::new(args.into_vec(), project.root());
    let output = run_tool(context.invoker(), &invocation).await?;
    if let Some(line) = output.reported_error() {
        return Err(Error::ToolFailed {
            tool: invocation.tool_name(),
            code: output.code,
            detail: line.to_string(),
        });
    }
    Ok(())
}

/// Generates `R.java` sources for every library and the application.
///
/// Runs ahead of compilation, since the fixed order packages resources only
/// after compiling. Libraries get non-constant ids in their own package. A
/// library declaring the application's package, or one already generated,
/// is skipped: its `R.java` would land on the same path.
pub(super) async fn generate_r_sources(
    project: &Project,
    context: &BuildContext,
    libraries: &[ExtractedLibrary],
) -> Result<()> {
    let gen_dir = project.generated_source_dir();
    fs::create_dir_all(&gen_dir, true).await?;

    let has_resources =
        project.res_dir().is_dir() || libraries.iter().any(|l| l.res_dir().is_some());
    if !has_resources {
        log::debug!("No resources to generate R sources for");
        return Ok(());
    }

    require_manifest(project)?;
    let aapt = context.tools().resolve(Tool::Aapt)?;
    let android_jar = context.tools().resolve_android_jar()?;

    let mut generated = HashSet::from([project.package().to_string()]);
    for library in libraries {
        let (Some(manifest), Some(res)) = (library.manifest(), library.res_dir()) else {
            continue;
        };
        let package = library
            .package_name()
            .with_context(|| format!("reading package of {}", library.archive().display()))?;
        if let Some(package) = package
            && !generated.insert(package.clone())
        {
            log::warn!(
                "Skipping R sources for {}: package {} is already generated",
                library.archive().display(),
                package
            );
            continue;
        }
        let mut args = ArgumentBuilder::program(&aapt);
        args.add(["package", "--no-crunch", "-f", "--auto-add-overlay"])
            .flag_if(context.verbose(), "-v")
            .arg("--non-constant-id")
            .flag_value("-M", manifest)
            .flag_value("-I", &android_jar)
            .flag_value("-S", res)
            .flag_value("-A", library.assets_dir())
            .arg("-m")
            .flag_value("-J", &gen_dir);
        log::debug!("Generating R sources for {}", library.archive().display());
        run_aapt(context, project, args).await?;
    }

    let mut args = ArgumentBuilder::program(&aapt);
    args.add(["package", "-f", "--auto-add-overlay"])
        .flag_value("-M", project.manifest())
        .flag_value("-I", &android_jar);
    append_resource_dirs(&mut args, project, libraries);
    args.arg("-m").flag_value("-J", &gen_dir);
    run_aapt(context, project, args).await
}
