use crate::bundler::error::FailureKind;
use std::fmt;

/// The closed set of pipeline stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageKind {
    ExtractDependencies,
    Compile,
    PackageResources,
    Convert,
    Archive,
    Sign,
}

impl StageKind {
    /// Every stage in the fixed pipeline order.
    pub const PIPELINE: [StageKind; 6] = [
        StageKind::ExtractDependencies,
        StageKind::Compile,
        StageKind::PackageResources,
        StageKind::Convert,
        StageKind::Archive,
        StageKind::Sign,
    ];

    /// Task name used in logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            StageKind::ExtractDependencies => "extract-dependencies",
            StageKind::Compile => "compile",
            StageKind::PackageResources => "package-resources",
            StageKind::Convert => "convert",
            StageKind::Archive => "archive",
            StageKind::Sign => "sign",
        }
    }

    /// Kind reported for errors that do not classify themselves.
    pub fn default_failure(&self) -> FailureKind {
        match self {
            StageKind::ExtractDependencies => FailureKind::Extraction,
            _ => FailureKind::ToolInvocation,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
