//! The fixed build pipeline for one project.

use crate::bundler::{
    builder::SigningIdentity,
    runner::Runner,
    settings::{BuildContext, Project},
    task::{
        StageKind, Task,
        stages::{Archive, Compile, Convert, ExtractDependencies, PackageResources, Sign},
    },
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Builds the stage tasks for one project, in [`StageKind::PIPELINE`] order.
#[derive(Clone, Debug)]
pub struct Pipeline {
    project: Arc<Project>,
    context: Arc<BuildContext>,
    identity: Arc<SigningIdentity>,
}

impl Pipeline {
    pub fn new(project: Project, context: BuildContext, identity: SigningIdentity) -> Self {
        Self {
            project: Arc::new(project),
            context: Arc::new(context),
            identity: Arc::new(identity),
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    /// Creates the task for one stage.
    pub fn task(&self, kind: StageKind) -> Box<dyn Task> {
        let project = Arc::clone(&self.project);
        let context = Arc::clone(&self.context);
        match kind {
            StageKind::ExtractDependencies => Box::new(ExtractDependencies::new(project, context)),
            StageKind::Compile => Box::new(Compile::new(project, context)),
            StageKind::PackageResources => Box::new(PackageResources::new(project, context)),
            StageKind::Convert => Box::new(Convert::new(project, context)),
            StageKind::Archive => Box::new(Archive::new(project, context)),
            StageKind::Sign => Box::new(Sign::new(project, context, Arc::clone(&self.identity))),
        }
    }

    /// A runner loaded with every stage.
    pub fn runner(&self, cancel: CancellationToken) -> Runner {
        let mut runner = Runner::with_cancellation(cancel);
        for kind in StageKind::PIPELINE {
            runner.add_task(self.task(kind));
        }
        runner
    }
}
