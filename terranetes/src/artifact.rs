//! Renderable payloads and where they are written.

use camino::{Utf8Path, Utf8PathBuf};

use crate::document::ConfigDocument;
use crate::kubernetes::KubeManifest;
use crate::terraform::TerraformDocument;
use crate::{Result, TerranetesError};

/// Data an artifact renders.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    /// Terraform JSON.
    Terraform(TerraformDocument),
    /// Kubernetes YAML stream.
    Kubernetes(KubeManifest),
    /// Generic JSON, YAML or INI.
    Config(ConfigDocument),
}

impl Payload {
    /// Short name used in diagnostics.
    #[must_use]
    pub const fn format_name(&self) -> &'static str {
        match self {
            Self::Terraform(_) => "terraform",
            Self::Kubernetes(_) => "kubernetes",
            Self::Config(doc) => doc.format().as_str(),
        }
    }

    /// Suffix replacing the input extension when no output is given.
    #[must_use]
    pub const fn suffix(&self) -> &'static str {
        match self {
            Self::Terraform(_) => ".tf.json",
            Self::Kubernetes(_) => ".yaml",
            Self::Config(doc) => doc.format().suffix(),
        }
    }

    /// Serialise the payload.
    ///
    /// # Errors
    ///
    /// Propagates the payload's render error.
    pub fn render(&self) -> Result<String> {
        match self {
            Self::Terraform(doc) => doc.render(),
            Self::Kubernetes(manifest) => manifest.render(),
            Self::Config(doc) => doc.render(),
        }
    }
}

/// A payload plus the paths that decide its destination.
#[derive(Clone, Debug, PartialEq)]
pub struct Artifact {
    input: Option<Utf8PathBuf>,
    output: Option<Utf8PathBuf>,
    payload: Payload,
}

impl Artifact {
    /// Artifact without input or output paths.
    #[must_use]
    pub const fn new(payload: Payload) -> Self {
        Self {
            input: None,
            output: None,
            payload,
        }
    }

    /// Set the script the artifact was produced by.
    #[must_use]
    pub fn with_input(mut self, input: impl Into<Utf8PathBuf>) -> Self {
        self.input = Some(input.into());
        self
    }

    /// Set an explicit destination.
    #[must_use]
    pub fn with_output(mut self, output: impl Into<Utf8PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Replace the explicit destination.
    pub fn set_output(&mut self, output: Option<Utf8PathBuf>) {
        self.output = output;
    }

    /// Script the artifact was produced by.
    #[must_use]
    pub fn input(&self) -> Option<&Utf8Path> {
        self.input.as_deref()
    }

    /// Explicit destination, if any.
    #[must_use]
    pub fn output(&self) -> Option<&Utf8Path> {
        self.output.as_deref()
    }

    /// Payload.
    #[must_use]
    pub const fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Mutable payload.
    pub const fn payload_mut(&mut self) -> &mut Payload {
        &mut self.payload
    }

    /// Destination: the explicit output, else the input path with its
    /// extension replaced by the payload suffix.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use terranetes::artifact::{Artifact, Payload};
    /// use terranetes::terraform::TerraformDocument;
    ///
    /// let artifact = Artifact::new(Payload::Terraform(TerraformDocument::new()))
    ///     .with_input("infra/main.tn");
    /// assert_eq!(artifact.output_path()?, "infra/main.tf.json");
    /// # Ok::<_, terranetes::TerranetesError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`TerranetesError::MissingOutputTarget`] when neither path is
    /// known.
    pub fn output_path(&self) -> Result<Utf8PathBuf> {
        if let Some(output) = &self.output {
            return Ok(output.clone());
        }
        let input = self
            .input
            .as_ref()
            .ok_or(TerranetesError::MissingOutputTarget {
                format: self.payload.format_name(),
            })?;
        let stem = input.with_extension("");
        Ok(Utf8PathBuf::from(format!("{stem}{}", self.payload.suffix())))
    }

    /// Serialise the payload.
    ///
    /// # Errors
    ///
    /// Propagates the payload's render error.
    pub fn render_to_string(&self) -> Result<String> {
        self.payload.render()
    }
}
