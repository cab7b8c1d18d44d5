//! Unit tests for test file and metadata parsing

use std::fs;
use tempfile::TempDir;
use test262_harness::{Flag, HarnessError, MetadataError, Phase, TestFile, TestMetadata};

#[test]
fn test_parse_basic_metadata() {
    let source = r#"/*---
description: Test for addition operator
info: |
  The addition operator either performs string concatenation
  or numeric addition.
esid: sec-addition-operator-plus
---*/
1 + 1;
"#;

    let metadata = TestMetadata::parse(source).unwrap();
    assert_eq!(metadata.description, "Test for addition operator");
    assert!(metadata.info.unwrap().contains("string concatenation"));
    assert_eq!(metadata.esid.as_deref(), Some("sec-addition-operator-plus"));
    assert!(metadata.negative.is_none());
}

#[test]
fn test_parse_negative_expectation_parse_phase() {
    let source = r#"/*---
description: Early error for reserved word
negative:
  phase: parse
  type: SyntaxError
---*/
$DONOTEVALUATE();
var class = 1;
"#;

    let metadata = TestMetadata::parse(source).unwrap();
    let neg = metadata.negative.as_ref().unwrap();
    assert_eq!(neg.phase, Phase::Parse);
    assert_eq!(neg.error_type, "SyntaxError");
}

#[test]
fn test_parse_negative_expectation_runtime_phase() {
    let source = r#"/*---
description: Runtime error for undefined variable
negative:
  phase: runtime
  type: ReferenceError
---*/
undefinedVar;
"#;

    let metadata = TestMetadata::parse(source).unwrap();
    assert_eq!(metadata.expected_error_type(), Some("ReferenceError"));
    assert_eq!(metadata.negative.unwrap().phase, Phase::Runtime);
}

#[test]
fn test_parse_negative_expectation_resolution_phase() {
    let source = r#"/*---
description: Module resolution error
negative:
  phase: resolution
  type: SyntaxError
flags: [module]
---*/
import { x } from './nonexistent.js';
"#;

    let metadata = TestMetadata::parse(source).unwrap();
    assert!(metadata.is_module());
    assert_eq!(metadata.negative.unwrap().phase, Phase::Resolution);
}

#[test]
fn test_unknown_phase_is_rejected() {
    let source = r#"/*---
description: bad phase
negative:
  phase: early
  type: SyntaxError
---*/
"#;

    assert!(matches!(
        TestMetadata::parse(source),
        Err(MetadataError::Malformed(_))
    ));
}

#[test]
fn test_unknown_flag_is_rejected() {
    let source = "/*---\ndescription: x\nflags: [sometimes]\n---*/\n";
    assert!(matches!(
        TestMetadata::parse(source),
        Err(MetadataError::Malformed(_))
    ));
}

#[test]
fn test_flags_parse_into_enum() {
    let source = r#"/*---
description: flags
flags: [onlyStrict, async, CanBlockIsFalse, non-deterministic]
---*/
"#;

    let metadata = TestMetadata::parse(source).unwrap();
    assert!(metadata.is_strict_only());
    assert!(metadata.is_async());
    assert!(metadata.has_flag(Flag::CanBlockIsFalse));
    assert!(metadata.has_flag(Flag::NonDeterministic));
    assert!(!metadata.is_raw());
}

#[test]
fn test_features_and_includes_keep_order() {
    let source = r#"/*---
description: lists
includes: [propertyHelper.js, compareArray.js]
features:
  - Symbol
  - class
---*/
"#;

    let metadata = TestMetadata::parse(source).unwrap();
    assert_eq!(metadata.includes, vec!["propertyHelper.js", "compareArray.js"]);
    assert_eq!(metadata.features, vec!["Symbol", "class"]);
}

#[test]
fn test_missing_frontmatter() {
    assert_eq!(
        TestMetadata::parse("var x = 1;"),
        Err(MetadataError::Missing)
    );
}

#[test]
fn test_missing_frontmatter_allowed_when_not_required() {
    let file = TestFile::from_source("plain.js", "var x = 1;", false).unwrap();
    assert_eq!(file.metadata, TestMetadata::default());
    assert!(TestFile::from_source("plain.js", "var x = 1;", true).is_err());
}

#[test]
fn test_empty_frontmatter_gives_defaults() {
    let metadata = TestMetadata::parse("/*---\n---*/\n").unwrap();
    assert_eq!(metadata, TestMetadata::default());
}

#[test]
fn test_code_strips_frontmatter() {
    let file = TestFile::from_source(
        "a.js",
        "// Copyright\n/*---\ndescription: x\n---*/\n\nassert(true);\n",
        true,
    )
    .unwrap();
    assert_eq!(file.code(), "// Copyright\nassert(true);\n");
}

#[test]
fn test_reftest_directive() {
    let source = r#"// |reftest| skip-if(!this.hasOwnProperty('Intl')) error:SyntaxError module
/*---
description: imported from a mirror
negative:
  phase: parse
  type: SyntaxError
flags: [module]
---*/
"#;

    let file = TestFile::from_source("r.js", source, true).unwrap();
    let reftest = file.reftest.unwrap();
    assert!(!reftest.skip);
    assert!(reftest.module);
    assert_eq!(reftest.error.as_deref(), Some("SyntaxError"));
    assert_eq!(
        reftest.conditions,
        vec!["skip-if(!this.hasOwnProperty('Intl'))"]
    );
    assert!(reftest.conflicts_with(&file.metadata).is_empty());
}

#[test]
fn test_reftest_conflict_is_reported() {
    let source = "// |reftest| error:TypeError\n/*---\ndescription: x\n---*/\n";
    let file = TestFile::from_source("r.js", source, true).unwrap();
    let conflicts = file.reftest.unwrap().conflicts_with(&file.metadata);
    assert_eq!(conflicts.len(), 1);
    assert!(conflicts[0].contains("without negative metadata"));
}

#[test]
fn test_load_computes_relative_id() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("language").join("expressions");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("add.js");
    fs::write(&path, "/*---\ndescription: add\n---*/\n1 + 1;\n").unwrap();

    let file = TestFile::load_under(&path, Some(temp_dir.path()), true).unwrap();
    assert_eq!(file.id, "language/expressions/add.js");
    assert_eq!(file.name(), "add");
}

#[test]
fn test_load_missing_file() {
    let err = TestFile::load("/nonexistent/test.js").unwrap_err();
    assert!(matches!(err, HarnessError::Io { .. }));
}

#[test]
fn test_fixture_detection() {
    assert!(TestFile::is_fixture(std::path::Path::new(
        "language/module-code/instn-once_FIXTURE.js"
    )));
    assert!(!TestFile::is_fixture(std::path::Path::new(
        "language/module-code/instn-once.js"
    )));
}
