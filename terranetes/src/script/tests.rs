//! Tests for compilation scoping and rendering.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use rstest::rstest;
use serde_json::{Value, json};
use test_helpers::FixtureTree;

use super::*;
use crate::artifact::{Artifact, Payload};
use crate::document::ConfigDocument;
use crate::environment::ExecutionEnv;

#[derive(Debug, PartialEq)]
struct Seen {
    working_dir: Utf8PathBuf,
    search_path: Vec<Utf8PathBuf>,
    file: Option<Value>,
}

#[derive(Clone, Default)]
struct Recorder(Rc<RefCell<Vec<Seen>>>);

impl ScriptRunner for Recorder {
    fn run(&self, path: &Utf8Path, env: &mut ExecutionEnv) -> crate::Result<Harvest> {
        self.0.borrow_mut().push(Seen {
            working_dir: env.working_dir().to_path_buf(),
            search_path: env.search_path().to_vec(),
            file: env.values().get(FILE_KEY).cloned(),
        });
        Ok(Harvest {
            declared: vec![Artifact::new(Payload::Config(ConfigDocument::json())).with_input(path)],
            registered: Vec::new(),
        })
    }
}

#[rstest]
fn runners_see_the_scoped_environment() -> Result<()> {
    let tree = FixtureTree::with_files([("app/main.tn", "")])?;
    tree.mkdir("terranetes")?;
    let recorder = Recorder::default();
    let compiler = Compiler::new(recorder.clone());
    let mut env = ExecutionEnv::new(tree.root());

    let unit = compiler.compile(Utf8Path::new("app/main.tn"), &mut env)?;

    assert_eq!(
        *recorder.0.borrow(),
        [Seen {
            working_dir: tree.path("app"),
            search_path: vec![tree.path("terranetes")],
            file: Some(json!(tree.path("app/main.tn").as_str())),
        }]
    );
    assert_eq!(unit.path(), tree.path("app/main.tn").as_path());
    assert_eq!(unit.base_dir(), tree.path("app").as_path());
    assert_eq!(unit.library_dir(), Some(tree.path("terranetes").as_path()));
    assert_eq!(unit.artifacts().len(), 1);
    assert_eq!(env.working_dir(), tree.root());
    assert!(env.search_path().is_empty());
    assert_eq!(env.values().get(FILE_KEY), None);
    Ok(())
}

#[rstest]
fn lua_scripts_require_library_modules() -> Result<()> {
    let tree = FixtureTree::with_files([
        (
            "app/main.tn",
            r#"
            local naming = require("naming")
            local shared = require("shared")
            ctx = cfg.json{output = "out/c.json"}
            ctx:add{name = naming.prefix .. "-svc", region = shared.region, file = value("__file__")}
            "#,
        ),
        ("terranetes/naming.lua", "return {prefix = \"acme\"}\n"),
        ("terranetes/shared/init.lua", "return {region = \"eu\"}\n"),
    ])?;
    let compiler = Compiler::default();
    let mut env = ExecutionEnv::new(tree.root());

    let unit = compiler.compile(&tree.path("app/main.tn"), &mut env)?;
    let written = compiler.render(&unit, &mut env)?;

    assert_eq!(written, [tree.path("app/out/c.json")]);
    let rendered: Value = serde_json::from_str(&tree.read("app/out/c.json")?)?;
    assert_eq!(
        rendered,
        json!({
            "name": "acme-svc",
            "region": "eu",
            "file": tree.path("app/main.tn").as_str()
        })
    );
    Ok(())
}

#[rstest]
fn default_outputs_sit_next_to_the_script() -> Result<()> {
    let tree = FixtureTree::with_files([(
        "infra/main.tn",
        "ctx = tf.context{}\nctx:add(tf.locals{a = 1})\n",
    )])?;
    let compiler = Compiler::default();
    let mut env = ExecutionEnv::new(tree.root());
    let unit = compiler.compile(&tree.path("infra/main.tn"), &mut env)?;
    let written = compiler.render(&unit, &mut env)?;
    assert_eq!(written, [tree.path("infra/main.tf.json")]);
    assert_eq!(
        tree.read("infra/main.tf.json")?,
        "{\n    \"locals\": {\n        \"a\": 1\n    }\n}"
    );
    Ok(())
}

#[rstest]
fn custom_extensions_drive_discovery() -> Result<()> {
    let tree = FixtureTree::with_files([("a.tn", ""), ("b.cfg", "")])?;
    let compiler = Compiler::new(Recorder::default()).with_extension("cfg");
    assert_eq!(compiler.extension(), "cfg");
    assert_eq!(compiler.discover(tree.root())?, [tree.path("b.cfg")]);
    Ok(())
}

#[rstest]
fn library_resolution_errors_abort_compilation() -> Result<()> {
    let tree = FixtureTree::with_files([("a/b/c/main.tn", "")])?;
    let compiler = Compiler::new(Recorder::default())
        .with_library(LibraryResolver::new("terranetes-lib-never-present", 1));
    let mut env = ExecutionEnv::new(tree.root());
    let err = compiler
        .compile(&tree.path("a/b/c/main.tn"), &mut env)
        .expect_err("depth bound is exceeded");
    assert!(matches!(
        err,
        crate::TerranetesError::TraversalDepthExceeded { max_depth: 1, .. }
    ));
    Ok(())
}
