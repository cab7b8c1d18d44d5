//! Unit tests for the test harness

use core_types::{JsError, Value};
use test262_harness::harness::loader_failure;
use test262_harness::{
    FailureKind, HarnessConfig, HarnessError, IncludeRegistry, MetadataError, Mode, ScriptedEngine,
    Test262Harness, TestFile, Verdict,
};

fn helpers() -> IncludeRegistry {
    IncludeRegistry::native([
        "assert.js",
        "sta.js",
        "doneprintHandle.js",
        "propertyHelper.js",
        "compareArray.js",
    ])
}

fn harness(engine: ScriptedEngine) -> Test262Harness<ScriptedEngine> {
    harness_with(engine, HarnessConfig::default())
}

fn harness_with(engine: ScriptedEngine, config: HarnessConfig) -> Test262Harness<ScriptedEngine> {
    Test262Harness::new(engine, config, helpers())
}

fn case(id: &str, frontmatter: &str) -> TestFile {
    TestFile::from_source(id, format!("/*---\n{}---*/\n", frontmatter), true).unwrap()
}

#[test]
fn test_variants_follow_flags() {
    let h = harness(ScriptedEngine::new());
    let variants = |fm: &str| h.variants(&case("v.js", fm).metadata);

    assert_eq!(variants("description: x\n"), vec![Mode::Sloppy, Mode::Strict]);
    assert_eq!(variants("flags: [onlyStrict]\n"), vec![Mode::Strict]);
    assert_eq!(variants("flags: [noStrict]\n"), vec![Mode::Sloppy]);
    assert_eq!(variants("flags: [raw]\n"), vec![Mode::Sloppy]);
    assert_eq!(variants("flags: [module]\n"), vec![Mode::Module]);
}

#[test]
fn test_strict_variants_can_be_disabled() {
    let config = HarnessConfig {
        strict_variants: false,
        ..Default::default()
    };
    let h = harness_with(ScriptedEngine::new(), config);
    assert_eq!(h.variants(&case("v.js", "description: x\n").metadata), vec![Mode::Sloppy]);
}

#[test]
fn test_passing_case_runs_both_variants() {
    let engine = ScriptedEngine::new().script("ok.js", |ctx| {
        ctx.report_compare(&Value::Smi(1), &Value::Double(1.0))
    });
    let results = harness(engine).run_test(&case("ok.js", "description: ok\n"));

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].mode, Some(Mode::Sloppy));
    assert_eq!(results[1].mode, Some(Mode::Strict));
    assert!(results.iter().all(|r| r.verdict.is_pass()));
    assert!(results.iter().all(|r| r.warnings.is_empty()));
}

#[test]
fn test_strict_variant_observes_strictness() {
    let engine = ScriptedEngine::new().script("s.js", |ctx| {
        if ctx.strict {
            Err(JsError::test262("strict only failure"))
        } else {
            Ok(())
        }
    });
    let config = HarnessConfig {
        expect_report_compare: false,
        ..Default::default()
    };
    let results = harness_with(engine, config).run_test(&case("s.js", "description: s\n"));

    assert!(results[0].verdict.is_pass());
    let failure = results[1].verdict.failure().unwrap();
    assert_eq!(failure.kind, FailureKind::Assertion);
    assert!(failure.message.contains("strict only failure"));
}

#[test]
fn test_missing_report_compare_is_a_warning() {
    let engine = ScriptedEngine::new().script("w.js", |_| Ok(()));
    let results = harness(engine).run_test(&case("w.js", "flags: [onlyStrict]\n"));

    assert_eq!(results.len(), 1);
    assert!(results[0].verdict.is_pass());
    assert_eq!(results[0].warnings, vec!["reportCompare was never called"]);
}

#[test]
fn test_includes_reach_the_realm() {
    let engine = ScriptedEngine::new().script("i.js", |ctx| {
        let loaded = ["assert.js", "sta.js", "propertyHelper.js"]
            .iter()
            .all(|name| ctx.has_include(name));
        if loaded && !ctx.has_include("doneprintHandle.js") {
            ctx.report_compare(&Value::Boolean(true), &Value::Boolean(true))
        } else {
            Err(JsError::test262("helpers missing"))
        }
    });
    let results = harness(engine).run_test(&case(
        "i.js",
        "includes: [propertyHelper.js]\nflags: [noStrict]\n",
    ));
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].verdict, Verdict::Passed);
}

#[test]
fn test_unsupported_feature_skips() {
    let config = HarnessConfig::from_yaml_str("features:\n  unsupported: [Atomics]\n").unwrap();
    let h = harness_with(ScriptedEngine::new(), config);
    let results = h.run_test(&case("f.js", "features: [Atomics, class]\n"));

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].mode, None);
    assert_eq!(
        results[0].verdict,
        Verdict::Skipped("unsupported features: Atomics".to_string())
    );
}

#[test]
fn test_can_block_flags_skip() {
    let config = HarnessConfig {
        can_block: false,
        ..Default::default()
    };
    let h = harness_with(ScriptedEngine::new(), config);
    let results = h.run_test(&case("b.js", "flags: [CanBlockIsTrue]\n"));
    assert!(results[0].verdict.is_skip());
}

#[test]
fn test_reftest_skip() {
    let file = TestFile::from_source(
        "r.js",
        "// |reftest| skip -- slow\n/*---\ndescription: r\n---*/\n",
        true,
    )
    .unwrap();
    let results = harness(ScriptedEngine::new()).run_test(&file);
    assert_eq!(results[0].verdict, Verdict::Skipped("reftest skip".to_string()));
}

#[test]
fn test_unknown_include_is_errored() {
    let results =
        harness(ScriptedEngine::new()).run_test(&case("u.js", "includes: [nope.js]\n"));

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].mode, None);
    assert!(results[0].is_errored());
    assert_eq!(
        results[0].verdict.failure().unwrap().kind,
        FailureKind::UnknownInclude
    );
}

#[test]
fn test_loader_failure_mapping() {
    let missing = HarnessError::Metadata {
        path: "a.js".to_string(),
        source: MetadataError::Missing,
    };
    assert_eq!(loader_failure(&missing).kind, FailureKind::MissingMetadata);

    let malformed = HarnessError::Metadata {
        path: "a.js".to_string(),
        source: MetadataError::Malformed("bad".to_string()),
    };
    assert_eq!(loader_failure(&malformed).kind, FailureKind::MalformedMetadata);

    let engine = HarnessError::Engine("spawn failed".to_string());
    assert_eq!(loader_failure(&engine).kind, FailureKind::Host);
}
