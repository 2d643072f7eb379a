//! Tests for the Lua runner and its script API.

use anyhow::{Result, anyhow, bail};
use rstest::rstest;
use serde_json::{Map, Value, json};
use test_helpers::FixtureTree;

use super::LuaRunner;
use crate::TerranetesError;
use crate::artifact::{Artifact, Payload};
use crate::environment::ExecutionEnv;
use crate::kubernetes::KubeObject;
use crate::script::{Harvest, ScriptRunner};
use crate::values::ValueStack;

struct Run {
    tree: FixtureTree,
    env: ExecutionEnv,
    outcome: crate::Result<Harvest>,
}

fn run_with(runner: LuaRunner, source: &str, files: &[(&str, &str)]) -> Result<Run> {
    let tree = FixtureTree::with_files(files.iter().copied())?;
    let script = tree.write("main.tn", source)?;
    let mut root = Map::new();
    root.insert("foo".to_owned(), json!("top"));
    let mut env = ExecutionEnv::new(tree.root()).with_values(ValueStack::with_root(root));
    let outcome = runner.run(&script, &mut env);
    Ok(Run { tree, env, outcome })
}

fn harvest(source: &str) -> Result<Harvest> {
    Ok(run_with(LuaRunner::new(), source, &[])?.outcome?)
}

fn failure(source: &str) -> Result<TerranetesError> {
    match run_with(LuaRunner::new(), source, &[])?.outcome {
        Ok(_) => bail!("script unexpectedly succeeded"),
        Err(err) => Ok(err),
    }
}

fn data(artifact: &Artifact) -> Value {
    match artifact.payload() {
        Payload::Terraform(doc) => doc.data().clone(),
        Payload::Kubernetes(manifest) => {
            Value::Array(manifest.objects().iter().map(KubeObject::render).collect())
        }
        Payload::Config(doc) => Value::Object(doc.data().clone()),
    }
}

fn only(harvest: &Harvest) -> Result<&Artifact> {
    match harvest.declared.as_slice() {
        [artifact] if harvest.registered.is_empty() => Ok(artifact),
        _ => Err(anyhow!("expected one artifact, got {}", harvest.len())),
    }
}

fn outputs(artifacts: &[Artifact]) -> Vec<String> {
    artifacts
        .iter()
        .filter_map(|artifact| artifact.output().map(ToString::to_string))
        .collect()
}

#[rstest]
fn resources_merge_into_one_document() -> Result<()> {
    let harvest = harvest(
        r#"
        ctx = tf.context{}
        ctx:add(tf.resource("a", "b", {count = 1}))
           :add(tf.resource("a", "c", {count = 2}))
        ctx:add{tf.resource("b", "b", {count = 3})}
        "#,
    )?;
    let artifact = only(&harvest)?;
    assert_eq!(
        data(artifact),
        json!({"resource": {"a": {"b": {"count": 1}, "c": {"count": 2}}, "b": {"b": {"count": 3}}}})
    );
    Ok(())
}

#[rstest]
fn declared_contexts_precede_registered_ones() -> Result<()> {
    let harvest = harvest(
        r#"
        b = k8s.context{output = "b.yaml"}
        a = tf.context{output = "a.tf.json"}
        alias = a
        extra = register(cfg.json{output = "x.json"})
        register(cfg.ini("late.ini"))
        register(a)
        local hidden = cfg.yaml("hidden.yaml")
        "#,
    )?;
    assert_eq!(outputs(&harvest.declared), ["b.yaml", "a.tf.json", "x.json"]);
    assert_eq!(outputs(&harvest.registered), ["late.ini"]);
    Ok(())
}

#[rstest]
fn contexts_record_the_script_as_input() -> Result<()> {
    let run = run_with(LuaRunner::new(), "ctx = cfg.json{}", &[])?;
    let harvest = run.outcome?;
    let artifact = only(&harvest)?;
    assert_eq!(artifact.input(), Some(run.tree.path("main.tn").as_path()));
    assert_eq!(artifact.output_path()?, run.tree.path("main.json"));
    Ok(())
}

#[rstest]
fn block_handles_alias_and_copies_do_not() -> Result<()> {
    let harvest = harvest(
        r#"
        r = tf.resource("aws_s3_bucket", "logs", {tags = {env = "dev"}})
        alias = r
        alias.body.tags.env = "prd"
        r.body.acl = "private"
        r.name = "audit"
        c = r:copy()
        c.body.acl = "public"
        ctx = tf.context{}
        ctx:add(r)
        r.body.acl = "changed after add"
        "#,
    )?;
    assert_eq!(
        data(only(&harvest)?),
        json!({"resource": {"aws_s3_bucket": {"audit": {"acl": "private", "tags": {"env": "prd"}}}}})
    );
    Ok(())
}

#[rstest]
fn body_proxies_cover_sequences_and_iteration() -> Result<()> {
    let harvest = harvest(
        r#"
        r = tf.resource("t", "n", {ports = {80}})
        r.body.ports[2] = 443
        local keys = {}
        for k in pairs(r.body) do keys[#keys + 1] = k end
        inspect = cfg.json("inspect.json")
        inspect:add{count = #r.body.ports, keys = keys, first = r.body.ports[1], missing = r.body.nope}
        "#,
    )?;
    assert_eq!(
        data(only(&harvest)?),
        json!({"count": 2, "keys": ["ports"], "first": 80})
    );
    Ok(())
}

#[rstest]
fn strict_contexts_reject_duplicates() -> Result<()> {
    let err = failure(
        r#"
        ctx = tf.context{strict = true}
        ctx:add(tf.resource("t", "n", {a = 1}))
        ctx:add(tf.resource("t", "n", {a = 2}))
        "#,
    )?;
    let Some(TerranetesError::DuplicateBlock(duplicate)) = err.script_cause() else {
        bail!("expected a duplicate block error, got {err}");
    };
    assert_eq!(duplicate.existing.body(), &json!({"a": 1}));
    assert_eq!(duplicate.incoming.body(), &json!({"a": 2}));
    Ok(())
}

#[rstest]
#[case(true, false)]
#[case(false, true)]
fn runner_strictness_is_the_context_default(#[case] strict: bool, #[case] succeeds: bool) -> Result<()> {
    let run = run_with(
        LuaRunner::new().with_strict(strict),
        r#"
        ctx = tf.context{}
        ctx:add(tf.locals{a = 1}):add(tf.locals{a = 2})
        "#,
        &[],
    )?;
    assert_eq!(run.outcome.is_ok(), succeeds);
    Ok(())
}

#[rstest]
fn value_scopes_nest_and_restore() -> Result<()> {
    let run = run_with(
        LuaRunner::new(),
        r#"
        local seen = {}
        seen.outer = value("foo", "none")
        with_values({foo = "inner"}, function()
            seen.inner = value("foo")
            set_value("bar", 1)
            seen.bar = value("bar")
        end)
        seen.after = value("foo")
        seen.bar_after = value("bar", "gone")
        seen.failed = pcall(with_values, {foo = "x"}, function() error("boom") end)
        seen.after_error = value("foo")
        out = cfg.json("seen.json")
        out:add(seen)
        "#,
        &[],
    )?;
    let harvest = run.outcome?;
    assert_eq!(
        data(only(&harvest)?),
        json!({
            "outer": "top",
            "inner": "inner",
            "bar": 1,
            "after": "top",
            "bar_after": "gone",
            "failed": false,
            "after_error": "top"
        })
    );
    assert_eq!(run.env.values().get("foo"), Some(&json!("top")));
    assert_eq!(run.env.values().depth(), 1);
    Ok(())
}

#[rstest]
fn values_survive_script_failures() -> Result<()> {
    let run = run_with(
        LuaRunner::new(),
        r#"with_values({foo = "inner"}, function() error("boom") end)"#,
        &[],
    )?;
    assert!(matches!(run.outcome, Err(TerranetesError::Script { .. })));
    assert_eq!(run.env.values().get("foo"), Some(&json!("top")));
    Ok(())
}

#[rstest]
fn outputs_and_variables_from_tables() -> Result<()> {
    let harvest = harvest(
        r#"
        ctx = tf.context{}
        ctx:add(tf.output{endpoint = "https://x"})
        ctx:add(tf.variables{region = "eu"})
        ctx:add(tf.output("id", {value = 3, sensitive = true}))
        "#,
    )?;
    assert_eq!(
        data(only(&harvest)?),
        json!({
            "output": {"endpoint": {"value": "https://x"}, "id": {"value": 3, "sensitive": true}},
            "variable": {"region": {"default": "eu"}}
        })
    );
    Ok(())
}

#[rstest]
fn addition_forks_the_context() -> Result<()> {
    let harvest = harvest(
        r#"
        base = tf.context{}
        base:add(tf.locals{a = 1})
        fork = base + tf.locals{b = 2}
        "#,
    )?;
    let found: Vec<_> = harvest.declared.iter().map(data).collect();
    assert_eq!(
        found,
        [json!({"locals": {"a": 1}}), json!({"locals": {"a": 1, "b": 2}})]
    );
    Ok(())
}

#[rstest]
fn lookup_reads_merged_data() -> Result<()> {
    let harvest = harvest(
        r#"
        local ctx = tf.context{}
        ctx:add(tf.resource("a", "b", {count = 1}))
        inspect = cfg.json("inspect.json")
        inspect:add{count = ctx:lookup("resource", "a", "b", "count"), missing = ctx:lookup("resource", "zzz")}
        "#,
    )?;
    assert_eq!(data(only(&harvest)?), json!({"count": 1}));
    Ok(())
}

#[rstest]
fn kubernetes_objects_fill_their_kind() -> Result<()> {
    let harvest = harvest(
        r#"
        m = k8s.context{output = "m.yaml"}
        cm = k8s.config_map{apiVersion = "v1", metadata = {name = "foobar"}, data = {}}
        cm.metadata.labels = {env = "prd"}
        m:add(cm):add(k8s.object("Widget", {spec = {size = 1}}))
        "#,
    )?;
    assert_eq!(
        only(&harvest)?.render_to_string()?,
        "apiVersion: v1\ndata: {}\nkind: ConfigMap\nmetadata:\n  labels:\n    env: prd\n  name: foobar\n---\nkind: Widget\nspec:\n  size: 1\n"
    );
    Ok(())
}

#[rstest]
fn builder_shapes_nodes_explicitly() -> Result<()> {
    let harvest = harvest(
        r#"
        local b = builder()
        b:key("spec"):key("ports"):index(2):key("port"):set(80)
        ports = cfg.json("ports.json")
        ports:add(b)
        "#,
    )?;
    assert_eq!(
        data(only(&harvest)?),
        json!({"spec": {"ports": [null, {"port": 80}]}})
    );
    Ok(())
}

#[rstest]
fn builder_conflicts_fail_loudly() -> Result<()> {
    let err = failure(
        r#"
        local b = builder()
        b:key("a")
        b:index(1)
        "#,
    )?;
    assert!(matches!(
        err.script_cause(),
        Some(TerranetesError::AccessMismatch {
            actual: "mapping",
            requested: "sequence"
        })
    ));
    Ok(())
}

#[rstest]
fn builder_rejects_runaway_positions() -> Result<()> {
    let err = failure(
        r#"
        local b = builder()
        b:index(math.maxinteger)
        "#,
    )?;
    assert!(matches!(
        err.script_cause(),
        Some(TerranetesError::SequenceGap { len: 0, .. })
    ));
    Ok(())
}

#[rstest]
fn hcl_blocks_and_files_load() -> Result<()> {
    let run = run_with(
        LuaRunner::new(),
        r#"
        ctx = tf.context{}
        ctx:add(tf.many_from_hcl('variable "b" {}\nvariable "a" {\n  default = 1\n}\n'))
        ctx:add(tf.hcl_file("extra.tf"))
        settings = cfg.yaml("settings.yaml")
        settings:add(yaml(read_file("data.yaml")))
        "#,
        &[
            ("extra.tf", "locals {\n  region = \"eu\"\n}\n"),
            ("data.yaml", "k: v\n"),
        ],
    )?;
    let harvest = run.outcome?;
    let found: Vec<_> = harvest.declared.iter().map(data).collect();
    assert_eq!(
        found,
        [
            json!({"variable": {"a": {"default": 1}, "b": {}}, "locals": {"region": "eu"}}),
            json!({"k": "v"})
        ]
    );
    Ok(())
}

#[rstest]
fn unknown_hcl_keywords_surface_as_script_causes() -> Result<()> {
    let err = failure(r#"tf.from_hcl('widget "x" {}')"#)?;
    assert!(matches!(
        err.script_cause(),
        Some(TerranetesError::UnknownBlockKind { keyword }) if keyword == "widget"
    ));
    Ok(())
}

#[rstest]
fn interpreter_errors_name_the_script() -> Result<()> {
    let run = run_with(LuaRunner::new(), r#"error("boom")"#, &[])?;
    let Err(TerranetesError::Script { path, source }) = run.outcome else {
        bail!("expected a script error");
    };
    assert_eq!(path, run.tree.path("main.tn"));
    assert!(source.to_string().contains("boom"));
    Ok(())
}

#[rstest]
fn wrong_arity_renames_are_rejected() -> Result<()> {
    let err = failure(
        r#"
        local v = tf.variable("x")
        v.type = "nope"
        "#,
    )?;
    assert!(matches!(
        err.script_cause(),
        Some(TerranetesError::IdentityArity { kind: "variable", arity: 1 })
    ));
    Ok(())
}
