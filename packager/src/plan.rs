//! Turns a packaging descriptor into merger inputs.
//!
//! The descriptor holds plain strings; the plan validates them into
//! [`SourceArtifact`]s and [`Relocations`] and works out the effective
//! instruction set.

use crate::error::Result;
use crate::identity::{ComponentIdentity, ModuleCoordinate, ProjectPath};
use crate::merge::{Instructions, SourceArtifact};
use crate::relocation::{RelocationRule, Relocations};
use log::debug;
use packwright::{ArtifactSpec, DeclaredIdentity, PackagingConfig, RelocationSpec};

/// Validated inputs of a packaging run.
#[derive(Debug, Clone)]
pub struct PackagingPlan {
    /// Instructions including any derived `Bundle-Version`.
    pub instructions: Instructions,
    /// The artifacts packaged into the jar.
    pub artifacts: Vec<SourceArtifact>,
    /// Relocations in declaration order.
    pub relocations: Relocations,
    /// Whether the bundle step runs.
    pub enabled: bool,
}

impl PackagingPlan {
    /// Validates `config` into a plan.
    ///
    /// # Errors
    ///
    /// Returns an error when an artifact identity or a relocation filter is
    /// invalid.
    ///
    /// # Examples
    ///
    /// ```
    /// use packwright::PackagingConfig;
    /// use packwright_packager::plan::PackagingPlan;
    ///
    /// let config: PackagingConfig = concat!(
    ///     "[[artifact]]\n",
    ///     "path = \"libs/core.jar\"\n",
    ///     "project = \":core\"\n",
    /// )
    /// .parse()?;
    /// let plan = PackagingPlan::from_config(&config)?;
    /// assert_eq!(plan.artifacts.len(), 1);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_config(config: &PackagingConfig) -> Result<Self> {
        let artifacts = config
            .artifact
            .iter()
            .map(source_artifact)
            .collect::<Result<Vec<_>>>()?;
        let relocations = config
            .relocate
            .iter()
            .map(relocation_rule)
            .collect::<Result<Relocations>>()?;

        debug!(
            "planned {} artifacts and {} relocations",
            artifacts.len(),
            relocations.rules().len()
        );

        Ok(Self {
            instructions: config.effective_instructions(),
            artifacts,
            relocations,
            enabled: config.enabled,
        })
    }
}

fn source_artifact(spec: &ArtifactSpec) -> Result<SourceArtifact> {
    let identity = match spec.identity()? {
        DeclaredIdentity::Module(coordinate) => {
            ComponentIdentity::Module(ModuleCoordinate::try_from(coordinate)?)
        }
        DeclaredIdentity::Project(path) => ComponentIdentity::Project(ProjectPath::try_from(path)?),
        DeclaredIdentity::Undeclared => ComponentIdentity::Opaque(spec.path.to_string()),
    };
    Ok(SourceArtifact::new(spec.path.as_std_path(), identity))
}

fn relocation_rule(spec: &RelocationSpec) -> Result<RelocationRule> {
    let mut rule = RelocationRule::new(spec.pattern.as_str(), spec.shaded.as_str());
    for glob in &spec.include {
        rule = rule.include(glob)?;
    }
    for glob in &spec.exclude {
        rule = rule.exclude(glob)?;
    }
    Ok(rule)
}
