//! A single Kubernetes object.

use std::fmt;

use serde_json::{Map, Value};

use crate::merge::merge_value;
use crate::{Result, TerranetesError, loads};

/// Kind tag attached to an object independently of its body.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KubeKind {
    /// `Deployment`
    Deployment,
    /// `ConfigMap`
    ConfigMap,
    /// `Service`
    Service,
    /// `Job`
    Job,
    /// `StatefulSet`
    StatefulSet,
    /// `Ingress`
    Ingress,
    /// `Secret`
    Secret,
    /// Any kind without a dedicated constructor.
    Custom(String),
}

impl KubeKind {
    /// Kinds with a dedicated constructor.
    pub const KNOWN: [Self; 7] = [
        Self::Deployment,
        Self::ConfigMap,
        Self::Service,
        Self::Job,
        Self::StatefulSet,
        Self::Ingress,
        Self::Secret,
    ];

    /// Kind name as written in manifests.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Deployment => "Deployment",
            Self::ConfigMap => "ConfigMap",
            Self::Service => "Service",
            Self::Job => "Job",
            Self::StatefulSet => "StatefulSet",
            Self::Ingress => "Ingress",
            Self::Secret => "Secret",
            Self::Custom(name) => name,
        }
    }

    /// Map a manifest `kind` to its tag, keeping unknown names as custom kinds.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .unwrap_or_else(|| Self::Custom(name.to_owned()))
    }
}

impl fmt::Display for KubeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Kubernetes object: a mapping body plus an optional kind tag.
///
/// The tag fills in `kind` at render time when the body does not set one.
#[derive(Clone, Debug, PartialEq)]
pub struct KubeObject {
    kind: Option<KubeKind>,
    body: Value,
}

macro_rules! typed_constructor {
    ($(#[$doc:meta] $name:ident => $kind:ident),* $(,)?) => {
        $(
            #[$doc]
            #[must_use]
            pub const fn $name(body: Value) -> Self {
                Self::new(Some(KubeKind::$kind), body)
            }
        )*
    };
}

macro_rules! field_accessors {
    ($(#[$doc:meta] $get:ident, $set:ident => $key:literal),* $(,)?) => {
        $(
            #[$doc]
            #[must_use]
            pub fn $get(&self) -> Option<&Value> {
                self.body.get($key)
            }

            #[$doc]
            ///
            /// A non-mapping body is replaced by a mapping first.
            pub fn $set(&mut self, value: Value) {
                self.set_field($key, value);
            }
        )*
    };
}

impl KubeObject {
    /// Object with an optional kind tag.
    #[must_use]
    pub const fn new(kind: Option<KubeKind>, body: Value) -> Self {
        Self { kind, body }
    }

    typed_constructor! {
        /// `Deployment` object.
        deployment => Deployment,
        /// `ConfigMap` object.
        config_map => ConfigMap,
        /// `Service` object.
        service => Service,
        /// `Job` object.
        job => Job,
        /// `StatefulSet` object.
        stateful_set => StatefulSet,
        /// `Ingress` object.
        ingress => Ingress,
        /// `Secret` object.
        secret => Secret,
    }

    /// Object built from a parsed manifest document, tagged from its `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`TerranetesError::InvalidObject`] when the document is not a
    /// mapping or has no string `kind`.
    pub fn from_document(body: Value) -> Result<Self> {
        let kind = match body.get("kind") {
            Some(Value::String(name)) => KubeKind::from_name(name),
            Some(_) => return Err(invalid("'kind' must be a string")),
            None if body.is_object() => return Err(invalid("document has no 'kind'")),
            None => return Err(invalid("document is not a mapping")),
        };
        Ok(Self::new(Some(kind), body))
    }

    /// Effective kind: the body's `kind` if set, else the tag.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.body
            .get("kind")
            .and_then(Value::as_str)
            .or_else(|| self.kind.as_ref().map(KubeKind::as_str))
    }

    /// Kind tag given at construction.
    #[must_use]
    pub const fn kind_tag(&self) -> Option<&KubeKind> {
        self.kind.as_ref()
    }

    /// Set `kind` in the body.
    pub fn set_kind(&mut self, kind: &str) {
        self.set_field("kind", Value::String(kind.to_owned()));
    }

    field_accessors! {
        /// The `apiVersion` field.
        api_version, set_api_version => "apiVersion",
        /// The `metadata` field.
        metadata, set_metadata => "metadata",
        /// The `spec` field.
        spec, set_spec => "spec",
    }

    /// Object body.
    #[must_use]
    pub const fn body(&self) -> &Value {
        &self.body
    }

    /// Mutable object body.
    pub const fn body_mut(&mut self) -> &mut Value {
        &mut self.body
    }

    /// Deep-merge `partial` into the body.
    pub fn update(&mut self, partial: Value) {
        merge_value(&mut self.body, partial);
    }

    /// Body as written to the manifest, with `kind` filled from the tag when
    /// the body does not set one.
    #[must_use]
    pub fn render(&self) -> Value {
        let mut rendered = self.body.clone();
        if let (Some(kind), Value::Object(map)) = (&self.kind, &mut rendered) {
            map.entry("kind")
                .or_insert_with(|| Value::String(kind.as_str().to_owned()));
        }
        rendered
    }

    fn set_field(&mut self, key: &str, value: Value) {
        if !self.body.is_object() {
            self.body = Value::Object(Map::new());
        }
        if let Some(map) = self.body.as_object_mut() {
            map.insert(key.to_owned(), value);
        }
    }
}

fn invalid(message: &str) -> TerranetesError {
    TerranetesError::InvalidObject {
        message: message.to_owned(),
    }
}

/// Parse a single YAML document into an object.
///
/// # Errors
///
/// Returns [`TerranetesError::Parse`] for invalid YAML and
/// [`TerranetesError::InvalidObject`] when the document lacks a `kind`.
pub fn from_yaml(text: &str) -> Result<KubeObject> {
    KubeObject::from_document(loads::yaml(text)?)
}

/// Parse every document of a YAML stream into objects.
///
/// # Errors
///
/// As [`from_yaml`], for the first failing document.
pub fn many_from_yaml(text: &str) -> Result<Vec<KubeObject>> {
    loads::yaml_all(text)?
        .into_iter()
        .map(KubeObject::from_document)
        .collect()
}
