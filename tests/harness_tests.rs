//! Integration tests for the crossrun harness pipeline
//!
//! Engines are replaced by a scripted executor so the run matrix, outcome classification and report can be
//! checked without engine binaries. The `unix` tests at the end run real processes.

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crossrun::harness::bundler::{BundleError, BundleRequest, Bundler};
use crossrun::harness::registry::{EngineDescriptor, EngineRegistry};
use crossrun::harness::runner::{Diagnostic, RawOutput};
use crossrun::{
    AssembledProgram, EngineExecutor, ExecutionOutcome, Harness, HarnessConfig, ProcessExecutor, Reporter, TextReporter,
};

// =============================================================================
// Fixtures
// =============================================================================

type Script = Box<dyn Fn(&EngineDescriptor, &AssembledProgram) -> io::Result<RawOutput>>;

/// Records every invocation and answers from a script.
struct ScriptedExecutor {
    script: Script,
    calls: RefCell<Vec<(String, PathBuf)>>,
}

impl ScriptedExecutor {
    fn new(script: impl Fn(&EngineDescriptor, &AssembledProgram) -> io::Result<RawOutput> + 'static) -> Self {
        Self {
            script: Box::new(script),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<(String, PathBuf)> {
        self.calls.borrow().clone()
    }
}

impl EngineExecutor for ScriptedExecutor {
    fn execute(&self, engine: &EngineDescriptor, program: &AssembledProgram) -> io::Result<RawOutput> {
        self.calls
            .borrow_mut()
            .push((engine.name.clone(), program.spec_path.clone()));
        (self.script)(engine, program)
    }
}

fn stdout(text: &str) -> io::Result<RawOutput> {
    Ok(RawOutput {
        stdout: text.to_string(),
        stderr: String::new(),
    })
}

fn engines(names: &[&str]) -> EngineRegistry {
    EngineRegistry::new(
        names
            .iter()
            .map(|n| EngineDescriptor::new(*n, format!("engines/{}", n)))
            .collect(),
    )
}

fn programs(names: &[&str]) -> Vec<AssembledProgram> {
    names
        .iter()
        .map(|n| AssembledProgram {
            spec_path: PathBuf::from(format!("specs/{}", n)),
            source: format!("// {}", n),
        })
        .collect()
}

const ONE_PASS_ONE_FAIL: &str = r#"[
    {"fullName": "membrane wraps objects", "status": "passed", "failedExpectations": []},
    {"fullName": "membrane blocks writes", "status": "failed",
     "failedExpectations": [{"message": "Expected true to be false."}, {"message": "Expected 1 to be 2."}]}
]"#;

// =============================================================================
// Run matrix
// =============================================================================

#[test]
fn test_two_engines_one_spec_end_to_end() {
    let harness = Harness::new(engines(&["v8", "quickjs"]), programs(&["a.spec.js"]));
    let executor = ScriptedExecutor::new(|_, _| stdout(ONE_PASS_ONE_FAIL));

    let report = harness.run(&executor);

    assert_eq!(report.status_lines.len(), 4);
    assert_eq!(report.failures.len(), 2);
    assert!(report.failures.iter().all(|f| f.result.failed_expectations.len() == 2));
    insta::assert_snapshot!(TextReporter.render(&report).unwrap(), @r"
    (v8) membrane wraps objects: PASSED
    (v8) membrane blocks writes: FAILED
    (quickjs) membrane wraps objects: PASSED
    (quickjs) membrane blocks writes: FAILED

    membrane blocks writes FAILED:
    (v8) specs/a.spec.js
        Expected true to be false.
        Expected 1 to be 2.

    membrane blocks writes FAILED:
    (quickjs) specs/a.spec.js
        Expected true to be false.
        Expected 1 to be 2.

    2 passed, 2 failed, 0 other (2 runs, 0 excluded)
    ");
}

#[test]
fn test_every_pair_runs_once_engine_major() {
    let harness = Harness::new(engines(&["e1", "e2", "e3"]), programs(&["a.spec.js", "b.spec.js"]));
    let executor = ScriptedExecutor::new(|_, _| stdout("[]"));

    let records = harness.execute(&executor);

    assert_eq!(records.len(), 6);
    let order: Vec<(String, String)> = executor
        .calls()
        .into_iter()
        .map(|(e, p)| (e, p.file_name().unwrap().to_string_lossy().into_owned()))
        .collect();
    let expected: Vec<(String, String)> = ["e1", "e2", "e3"]
        .iter()
        .flat_map(|e| ["a.spec.js", "b.spec.js"].map(|p| (e.to_string(), p.to_string())))
        .collect();
    assert_eq!(order, expected);
}

#[test]
fn test_non_json_output_is_excluded_and_later_runs_continue() {
    let harness = Harness::new(engines(&["v8"]), programs(&["a.spec.js", "b.spec.js"]));
    let executor = ScriptedExecutor::new(|_, program| {
        if program.spec_path.ends_with("a.spec.js") {
            stdout("Uncaught ReferenceError: jasmine is not defined")
        } else {
            stdout(ONE_PASS_ONE_FAIL)
        }
    });

    let report = harness.run(&executor);

    assert_eq!(executor.calls().len(), 2);
    assert_eq!(report.diagnostics.len(), 1);
    match &report.diagnostics[0].diagnostic {
        Diagnostic::MalformedOutput { raw, .. } => {
            assert_eq!(raw, "Uncaught ReferenceError: jasmine is not defined");
        }
        other => panic!("expected malformed output, got {other:?}"),
    }
    assert_eq!(report.status_lines.len(), 2);
    assert_eq!(report.tally.excluded_runs, 1);
}

#[test]
fn test_stderr_excludes_pair_regardless_of_stdout() {
    let harness = Harness::new(engines(&["v8", "quickjs"]), programs(&["a.spec.js"]));
    let executor = ScriptedExecutor::new(|engine, _| {
        Ok(RawOutput {
            stdout: ONE_PASS_ONE_FAIL.to_string(),
            stderr: if engine.name == "v8" {
                "warning: deprecated flag".to_string()
            } else {
                String::new()
            },
        })
    });

    let records = harness.execute(&executor);

    assert!(matches!(
        records[0].outcome,
        ExecutionOutcome::Diagnostic(Diagnostic::EngineError { .. })
    ));
    assert!(matches!(records[1].outcome, ExecutionOutcome::Results(_)));
    let report = harness.run(&executor);
    assert!(report.status_lines.iter().all(|l| l.engine == "quickjs"));
    assert_eq!(report.failures.len(), 1);
}

#[test]
fn test_launch_failure_does_not_stop_the_matrix() {
    let harness = Harness::new(engines(&["ghost", "v8"]), programs(&["a.spec.js"]));
    let executor = ScriptedExecutor::new(|engine, _| {
        if engine.name == "ghost" {
            Err(io::Error::new(io::ErrorKind::NotFound, "no such file"))
        } else {
            stdout("[]")
        }
    });

    let report = harness.run(&executor);

    assert_eq!(executor.calls().len(), 2);
    assert!(matches!(
        report.diagnostics[0].diagnostic,
        Diagnostic::LaunchFailure { .. }
    ));
    assert!(report.is_success(false));
    assert!(!report.is_success(true));
}

// =============================================================================
// Preparation
// =============================================================================

/// Answers each bundle request with a marker comment.
struct MarkerBundler;

impl Bundler for MarkerBundler {
    async fn generate(&self, request: &BundleRequest) -> Result<String, BundleError> {
        Ok(format!("/* {} bundle */\n", request.format.as_str()))
    }
}

fn write(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn package_fixture(root: &Path) -> HarnessConfig {
    let config = HarnessConfig::new()
        .with_package_root(root)
        .with_spec_glob(format!("{}/specs/*.spec.js", root.display()));
    write(&config.registry, r#"{"installed": {"v8": "12.0", "quickjs": "2024"}}"#);
    write(&config.environment, "globalThis.setTimeout = () => {};\n");
    write(&config.reporter, "// reporter\n");
    write(&config.library, "// library\n");
    write(&config.driver, "jasmine.getEnv().execute();\n");
    write(
        &root.join("specs/b.spec.js"),
        "import { thing } from '../thing';\n\ndescribe('b', () => {\n    it('uses window', () => {\n        expect(window.thing).toBe(thing);\n    });\n});\n",
    );
    write(&root.join("specs/a.spec.js"), "describe('a', () => {});\n");
    config
}

#[tokio::test]
async fn test_prepare_assembles_one_program_per_spec() {
    let dir = tempfile::tempdir().unwrap();
    let config = package_fixture(dir.path());

    let harness = Harness::prepare(&config, &MarkerBundler).await.unwrap();

    let names: Vec<&str> = harness.engines().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["v8", "quickjs"]);
    assert_eq!(harness.programs().len(), 2);
    assert!(harness.programs()[0].spec_path.ends_with("a.spec.js"));
    for program in harness.programs() {
        assert!(program.source.ends_with("jasmine.getEnv().execute();"));
    }

    insta::assert_snapshot!(harness.programs()[1].source, @r"
    globalThis.setTimeout = () => {};

    /* es bundle */

    /* iife bundle */

    // reporter

    // library

    describe('b', () => {
        it('uses window', () => {
            expect(globalThis.thing).toBe(thing);
        });
    });

    jasmine.getEnv().execute();
    ");
}

#[tokio::test]
async fn test_prepare_fails_on_invalid_spec() {
    let dir = tempfile::tempdir().unwrap();
    let config = package_fixture(dir.path());
    write(&dir.path().join("specs/c.spec.js"), "describe('c', () => {\n");

    let err = Harness::prepare(&config, &MarkerBundler).await.unwrap_err();
    assert!(err.to_string().contains("c.spec.js"), "{err}");
}

// =============================================================================
// Real processes
// =============================================================================

#[cfg(unix)]
fn script_engine(dir: &Path, name: &str, body: &str) -> EngineDescriptor {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    EngineDescriptor::new(name, path)
}

#[cfg(unix)]
#[test]
fn test_process_executor_passes_program_path() {
    let dir = tempfile::tempdir().unwrap();
    // Echo the program text back inside a result name.
    let engine = script_engine(
        dir.path(),
        "echo-engine",
        r#"printf '[{"fullName":"%s","status":"passed"}]' "$(cat "$1")""#,
    );
    let program = AssembledProgram {
        spec_path: PathBuf::from("a.spec.js"),
        source: "program text".to_string(),
    };

    let output = ProcessExecutor.execute(&engine, &program).unwrap();

    assert_eq!(output.stderr, "");
    match ExecutionOutcome::classify(output) {
        ExecutionOutcome::Results(results) => assert_eq!(results[0].full_name, "program text"),
        other => panic!("expected results, got {other:?}"),
    }
}

#[cfg(unix)]
#[test]
fn test_process_executor_captures_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let engine = script_engine(dir.path(), "noisy-engine", "echo '[]'; echo 'SyntaxError: oops' >&2");
    let program = AssembledProgram {
        spec_path: PathBuf::from("a.spec.js"),
        source: "1;".to_string(),
    };

    let outcome = ExecutionOutcome::classify(ProcessExecutor.execute(&engine, &program).unwrap());

    assert_eq!(
        outcome,
        ExecutionOutcome::Diagnostic(Diagnostic::EngineError {
            stderr: "SyntaxError: oops\n".to_string()
        })
    );
}
