//! Kubernetes objects and multi-document manifests.

mod manifest;
mod object;

pub use manifest::KubeManifest;
pub use object::{KubeKind, KubeObject, from_yaml, many_from_yaml};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TerranetesError;
    use anyhow::Result;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn config_map_kind_is_filled_on_render() -> Result<()> {
        let object = KubeObject::config_map(json!({
            "apiVersion": "v1",
            "metadata": {"name": "foobar", "labels": {"grafana_dashboard": "1", "env": "prd"}},
            "data": {}
        }));
        let mut manifest = KubeManifest::new();
        manifest.add(&object);
        assert_eq!(
            manifest.render()?,
            "apiVersion: v1\ndata: {}\nkind: ConfigMap\nmetadata:\n  labels:\n    env: prd\n    grafana_dashboard: '1'\n  name: foobar\n"
        );
        Ok(())
    }

    #[rstest]
    fn explicit_kind_in_body_wins() {
        let object = KubeObject::secret(json!({"kind": "Other"}));
        assert_eq!(object.kind(), Some("Other"));
        assert_eq!(object.render(), json!({"kind": "Other"}));
    }

    #[rstest]
    fn secret_tag_renders_secret() {
        assert_eq!(
            KubeObject::secret(json!({})).render(),
            json!({"kind": "Secret"})
        );
    }

    #[rstest]
    fn many_from_yaml_maps_kinds() -> Result<()> {
        let objects = many_from_yaml(
            "\n---\napiVersion: v1\nkind: Service\n---\napiVersion: v2\nkind: Deployment\n---\nkind: Widget\n",
        )?;
        let tags: Vec<_> = objects.iter().filter_map(KubeObject::kind_tag).cloned().collect();
        assert_eq!(
            tags,
            [
                KubeKind::Service,
                KubeKind::Deployment,
                KubeKind::Custom("Widget".to_owned())
            ]
        );
        Ok(())
    }

    #[rstest]
    fn document_without_kind_is_rejected() {
        let err = from_yaml("apiVersion: v1\n").expect_err("missing kind");
        assert!(matches!(err, TerranetesError::InvalidObject { .. }));
    }

    #[rstest]
    fn manifest_keeps_insertion_order() -> Result<()> {
        let mut manifest = KubeManifest::new();
        manifest
            .add(&KubeObject::service(json!({"metadata": {"name": "b"}})))
            .add(&KubeObject::job(json!({"metadata": {"name": "a"}})));
        let fork = manifest.with_object(&KubeObject::ingress(json!({})));
        assert_eq!(manifest.objects().len(), 2);
        assert_eq!(fork.objects().len(), 3);
        assert_eq!(
            manifest.render()?,
            "kind: Service\nmetadata:\n  name: b\n---\nkind: Job\nmetadata:\n  name: a\n"
        );
        Ok(())
    }

    #[rstest]
    fn accessors_read_and_write_fields() {
        let mut object = KubeObject::deployment(json!({}));
        object.set_api_version(json!("apps/v1"));
        object.set_spec(json!({"replicas": 2}));
        object.update(json!({"spec": {"paused": false}}));
        assert_eq!(object.api_version(), Some(&json!("apps/v1")));
        assert_eq!(object.spec(), Some(&json!({"replicas": 2, "paused": false})));
        assert_eq!(object.metadata(), None);
    }
}
