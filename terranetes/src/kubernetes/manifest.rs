//! Ordered collections of Kubernetes objects rendered as a YAML stream.

use super::KubeObject;
use crate::{Result, emit};

/// Objects rendered as one YAML document each, in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KubeManifest {
    objects: Vec<KubeObject>,
}

impl KubeManifest {
    /// Empty manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a copy of `object`.
    pub fn add(&mut self, object: &KubeObject) -> &mut Self {
        self.objects.push(object.clone());
        self
    }

    /// Append copies of every object in order.
    pub fn add_all<'a, I>(&mut self, objects: I) -> &mut Self
    where
        I: IntoIterator<Item = &'a KubeObject>,
    {
        self.objects.extend(objects.into_iter().cloned());
        self
    }

    /// Copy of this manifest with `object` appended; `self` is untouched.
    #[must_use]
    pub fn with_object(&self, object: &KubeObject) -> Self {
        let mut fork = self.clone();
        fork.add(object);
        fork
    }

    /// Objects in insertion order.
    #[must_use]
    pub fn objects(&self) -> &[KubeObject] {
        &self.objects
    }

    /// Render every object as a YAML stream.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TerranetesError::Render`] when serialisation fails.
    pub fn render(&self) -> Result<String> {
        let rendered: Vec<_> = self.objects.iter().map(KubeObject::render).collect();
        emit::yaml_stream(&rendered)
    }
}
