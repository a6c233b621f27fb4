use super::stage_future;
use crate::bundler::{
    Error, Result,
    builder::Tool,
    error::Context,
    settings::{AssetFilter, BuildContext, PackagingOptions, Project},
    task::{StageKind, Task, TaskFuture},
    utils::{
        ArgumentBuilder, fs,
        process::{Invocation, run_tool},
    },
};
use std::{
    collections::HashSet,
    fs::File,
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
    sync::Arc,
};
use zip::{CompressionMethod, ZipArchive, ZipWriter, write::SimpleFileOptions};

/// Assembles the unsigned APK from the resource package, the dex files and
/// the non-Java resources of the source roots, then optionally aligns it.
pub struct Archive {
    project: Arc<Project>,
    context: Arc<BuildContext>,
}

/// Inputs of one APK assembly, moved onto the blocking pool.
struct Assembly {
    resource_package: PathBuf,
    dex_files: Vec<PathBuf>,
    source_roots: Vec<PathBuf>,
    output: PathBuf,
    options: PackagingOptions,
    filter: AssetFilter,
}

impl Archive {
    pub fn new(project: Arc<Project>, context: Arc<BuildContext>) -> Self {
        Self { project, context }
    }

    async fn execute(&self) -> Result<()> {
        let project = &self.project;
        let resource_package = project.resource_package();
        if !resource_package.is_file() {
            return Err(Error::GenericError(format!(
                "resource package {} is missing",
                resource_package.display()
            )));
        }

        let dex_files = fs::collect_files(vec![project.dex_dir()], |p| {
            let is_dex_name = p
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("classes"));
            is_dex_name && fs::has_extension(p, "dex")
        })
        .await?;
        if dex_files.is_empty() {
            return Err(Error::GenericError(format!(
                "no dex files in {}",
                project.dex_dir().display()
            )));
        }

        let unsigned = project.unsigned_apk();
        fs::remove_file(&unsigned).await?;
        fs::remove_file(&project.aligned_apk()).await?;

        let assembly = Assembly {
            resource_package,
            dex_files,
            source_roots: project.source_roots().to_vec(),
            output: unsigned.clone(),
            options: project.packaging().clone(),
            filter: project
                .packaging()
                .asset_filter()
                .context("parsing ignore_assets")?,
        };
        let entries = fs::run_blocking(move || assembly.write()).await?;
        log::info!("Assembled {} with {} entries", unsigned.display(), entries);

        if self.context.tools().align {
            let zipalign = self.context.tools().resolve(Tool::Zipalign)?;
            let mut args = ArgumentBuilder::program(zipalign);
            args.add(["-f", "-p", "4"])
                .arg(&unsigned)
                .arg(project.aligned_apk());
            run_tool(
                self.context.invoker(),
                &Invocation::new(args.into_vec(), project.root()),
            )
            .await?;
            log::info!("Aligned {}", project.aligned_apk().display());
        }
        Ok(())
    }
}

/// APK the sign stage consumes.
pub(super) fn sign_input(project: &Project, context: &BuildContext) -> PathBuf {
    if context.tools().align {
        project.aligned_apk()
    } else {
        project.unsigned_apk()
    }
}

impl Assembly {
    fn options_for(&self, name: &str) -> SimpleFileOptions {
        let method = if self.options.is_stored(name) {
            CompressionMethod::Stored
        } else {
            CompressionMethod::Deflated
        };
        SimpleFileOptions::default().compression_method(method)
    }

    /// Writes the archive, returning the number of entries.
    fn write(self) -> Result<usize> {
        let mut zip = ZipWriter::new(BufWriter::new(File::create(&self.output)?));
        let mut names = HashSet::new();

        let mut resources = ZipArchive::new(BufReader::new(File::open(&self.resource_package)?))?;
        for i in 0..resources.len() {
            let mut entry = resources.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            if !names.insert(name.clone()) {
                continue;
            }
            zip.start_file(name.as_str(), self.options_for(&name))?;
            std::io::copy(&mut entry, &mut zip)?;
        }

        for dex in &self.dex_files {
            let name = dex
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .with_context(|| format!("dex path {} has no file name", dex.display()))?;
            self.add_file(&mut zip, &mut names, dex, name)?;
        }

        for root in self.source_roots.iter().filter(|r| r.is_dir()) {
            let mut files = Vec::new();
            for entry in walkdir::WalkDir::new(root).follow_links(true) {
                let entry = entry?;
                if entry.file_type().is_file() && !fs::has_extension(entry.path(), "java") {
                    files.push(entry.into_path());
                }
            }
            files.sort();
            for file in files {
                let relative = file.strip_prefix(root)?;
                if self.filter.is_ignored(relative) {
                    log::debug!("Ignoring {}", relative.display());
                    continue;
                }
                let name = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                self.add_file(&mut zip, &mut names, &file, name)?;
            }
        }

        zip.finish()?;
        Ok(names.len())
    }

    fn add_file(
        &self,
        zip: &mut ZipWriter<BufWriter<File>>,
        names: &mut HashSet<String>,
        path: &Path,
        name: String,
    ) -> Result<()> {
        if !names.insert(name.clone()) {
            log::warn!("Skipping duplicate archive entry {}", name);
            return Ok(());
        }
        zip.start_file(name.as_str(), self.options_for(&name))?;
        let mut input = File::open(path)?;
        std::io::copy(&mut input, zip)?;
        Ok(())
    }
}

impl Task for Archive {
    fn name(&self) -> &str {
        StageKind::Archive.name()
    }

    fn run(&self) -> TaskFuture<'_> {
        stage_future(StageKind::Archive, self.execute())
    }
}
