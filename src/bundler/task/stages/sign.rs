use super::{archive::sign_input, stage_future};
use crate::bundler::{
    Error, Result,
    builder::{SigningIdentity, Tool},
    settings::{BuildContext, Project},
    task::{StageKind, Task, TaskFuture},
    utils::{
        ArgumentBuilder, fs,
        process::{Invocation, run_tool},
    },
};
use std::{path::Path, sync::Arc};

const STORE_SECRET_VAR: &str = "KODEGEN_APKSIGNER_KS_PASS";
const KEY_SECRET_VAR: &str = "KODEGEN_APKSIGNER_KEY_PASS";

/// Signs the archive with `apksigner`, producing the final artifact.
///
/// Secrets reach `apksigner` only through its environment.
pub struct Sign {
    project: Arc<Project>,
    context: Arc<BuildContext>,
    identity: Arc<SigningIdentity>,
}

impl Sign {
    pub fn new(
        project: Arc<Project>,
        context: Arc<BuildContext>,
        identity: Arc<SigningIdentity>,
    ) -> Self {
        Self {
            project,
            context,
            identity,
        }
    }

    /// Builds the signing invocation for `input`.
    pub fn invocation(&self, apksigner: &Path, input: &Path) -> Invocation {
        let mut args = ArgumentBuilder::program(apksigner);
        args.arg("sign")
            .flag_value("--ks", self.identity.store())
            .flag_value("--ks-key-alias", self.identity.alias())
            .flag_value("--ks-pass", format!("env:{STORE_SECRET_VAR}"))
            .flag_value("--key-pass", format!("env:{KEY_SECRET_VAR}"))
            .add_opt(self.context.verbose().then_some("-v"))
            .flag_value("--out", self.project.signed_apk())
            .arg(input);
        Invocation::new(args.into_vec(), self.project.root())
            .env(STORE_SECRET_VAR, self.identity.store_secret().expose())
            .env(KEY_SECRET_VAR, self.identity.key_secret().expose())
    }

    async fn execute(&self) -> Result<()> {
        let input = sign_input(&self.project, &self.context);
        if !input.is_file() {
            return Err(Error::GenericError(format!(
                "unsigned archive {} is missing",
                input.display()
            )));
        }

        let apksigner = self.context.tools().resolve(Tool::Apksigner)?;
        fs::remove_file(&self.project.signed_apk()).await?;

        log::debug!("Signing with {}", self.identity);
        let invocation = self.invocation(&apksigner, &input);
        run_tool(self.context.invoker(), &invocation)
            .await
            .map_err(|e| match e {
                Error::ToolFailed { detail, .. } => Error::Sign(detail),
                other => other,
            })?;

        log::info!("Signed {}", self.project.signed_apk().display());
        Ok(())
    }
}

impl Task for Sign {
    fn name(&self) -> &str {
        StageKind::Sign.name()
    }

    fn run(&self) -> TaskFuture<'_> {
        stage_future(StageKind::Sign, self.execute())
    }
}
