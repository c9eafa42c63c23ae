use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::*;
use crate::config::StagehandConfig;
use crate::core::RepresentationKind;
use crate::errors::{StagehandError, StepFailure};
use crate::observability::NoProgress;
use crate::stages::StepStage;
use crate::testing::{
    assert_resolution_error, assert_step_failure, chain_registry_with_log, CallLog, MockStage,
    RecordingProgress, TestWorkspace, MOCK_OUTPUT_FILE,
};

fn run_to_string(
    options: RunOptions,
    registry: Registry,
) -> (crate::errors::Result<RunOutcome>, String) {
    let mut out = Vec::new();
    let result = run(
        options,
        &StagehandConfig::default(),
        registry,
        &mut NoProgress,
        &mut out,
    );
    (result, String::from_utf8(out).unwrap())
}

#[test]
fn test_stages_run_in_order_and_hand_off_output() {
    let ws = TestWorkspace::new();
    let input = ws.write("in.txt", "seed");
    let log = CallLog::default();
    let registry = chain_registry_with_log(&["a", "b", "c", "d"], &log);

    let options = RunOptions::new()
        .with_input(&input)
        .with_output(ws.path("out.txt"))
        .with_from("a")
        .with_to("d");
    let (result, printed) = run_to_string(options, registry);

    match result.unwrap() {
        RunOutcome::Completed { stage_durations } => {
            let names: Vec<&str> = stage_durations.iter().map(|(n, _)| n.as_str()).collect();
            assert_eq!(names, vec!["a", "b", "c"]);
        }
        RunOutcome::DryRun => panic!("expected a real run"),
    }
    assert_eq!(
        *log.borrow(),
        vec!["a:string:seed", "b:string:seed|a", "c:string:seed|a|b"]
    );
    assert_eq!(ws.read("out.txt"), "seed|a|b|c");
    assert_eq!(printed, "");
}

#[test]
fn test_result_printed_without_output_file() {
    let ws = TestWorkspace::new();
    let input = ws.write("in.txt", "seed");
    let registry = chain_registry_with_log(&["a", "b"], &CallLog::default());

    let options = RunOptions::new().with_input(&input).with_from("a").with_to("b");
    let (result, printed) = run_to_string(options, registry);

    result.unwrap();
    assert_eq!(printed, "seed|a\n");
}

#[test]
fn test_untyped_start_without_input_file() {
    let log = CallLog::default();
    let registry = chain_registry_with_log(&["a", "b", "c"], &log);

    let options = RunOptions::new().with_from("a").with_to("c");
    let (result, printed) = run_to_string(options, registry);

    result.unwrap();
    assert_eq!(*log.borrow(), vec!["a:untyped:", "b:string:a"]);
    assert_eq!(printed, "a|b\n");
}

#[test]
fn test_artifact_converted_only_before_consuming_stage() {
    let log = CallLog::default();
    let registry = Registry::new()
        .with_stage(
            MockStage::new("a", "a", "b")
                .with_kinds(RepresentationKind::String, RepresentationKind::Stream)
                .with_log(&log),
        )
        .unwrap()
        .with_stage(
            MockStage::new("b", "b", "c")
                .with_kinds(RepresentationKind::Bytes, RepresentationKind::String)
                .with_log(&log),
        )
        .unwrap();

    let options = RunOptions::new().with_from("a").with_to("c");
    let (result, printed) = run_to_string(options, registry);

    result.unwrap();
    assert_eq!(*log.borrow(), vec!["a:untyped:", "b:bytes:a"]);
    assert_eq!(printed, "a|b\n");
}

#[test]
fn test_failure_aborts_remaining_stages() {
    let ws = TestWorkspace::new();
    let input = ws.write("in.txt", "seed");
    let log = CallLog::default();
    let registry = Registry::new()
        .with_stage(MockStage::new("a", "a", "b").with_log(&log))
        .unwrap()
        .with_stage(MockStage::new("b", "b", "c").with_log(&log).failing())
        .unwrap()
        .with_stage(MockStage::new("c", "c", "d").with_log(&log))
        .unwrap();

    let options = RunOptions::new()
        .with_input(&input)
        .with_output(ws.path("out.txt"))
        .with_from("a")
        .with_to("d");
    let mut progress = RecordingProgress::default();
    let mut out = Vec::new();
    let err = run(
        options,
        &StagehandConfig::default(),
        registry,
        &mut progress,
        &mut out,
    )
    .unwrap_err();

    assert_step_failure(&err, "mock b");
    assert!(!err.is_resolution_error());
    assert_eq!(*log.borrow(), vec!["a:string:seed", "b:string:seed|a"]);
    assert!(!ws.path("out.txt").exists());
    assert!(out.is_empty());
    assert_eq!(progress.events().last().map(String::as_str), Some("fail"));
}

#[test]
fn test_failure_releases_converted_temporary_file() {
    let seen: Rc<RefCell<Option<PathBuf>>> = Rc::default();
    let recorder = Rc::clone(&seen);
    let registry = Registry::new()
        .with_stage(
            MockStage::new("a", "a", "b")
                .with_kinds(RepresentationKind::String, RepresentationKind::Stream),
        )
        .unwrap()
        .with_stage(
            StepStage::new("b", "c", RepresentationKind::Path, RepresentationKind::String).step(
                "link",
                "record the input path, then fail",
                move |input, _| {
                    *recorder.borrow_mut() = input.location().map(Path::to_path_buf);
                    Err(StepFailure::new("link", "", "boom").into())
                },
            ),
        )
        .unwrap();

    let options = RunOptions::new().with_from("a").with_to("c");
    let (result, printed) = run_to_string(options, registry);

    assert_step_failure(&result.unwrap_err(), "link");
    assert_eq!(printed, "");
    let temp = seen.borrow().clone().expect("failing step saw a path");
    assert!(!temp.exists(), "{} left behind", temp.display());
}

#[test]
fn test_failure_leaves_existing_output_untouched() {
    let ws = TestWorkspace::new();
    let output = ws.write("out.txt", "previous");
    let registry = Registry::new()
        .with_stage(MockStage::new("a", "a", "b").failing())
        .unwrap();

    let options = RunOptions::new().with_output(&output).with_from("a").with_to("b");
    let (result, _) = run_to_string(options, registry);

    assert!(matches!(result, Err(StagehandError::StepFailure(_))));
    assert_eq!(ws.read("out.txt"), "previous");
}

#[test]
fn test_dry_run_lists_stages_without_running() {
    let log = CallLog::default();
    let registry = chain_registry_with_log(&["a", "b", "c", "d"], &log);

    let options = RunOptions::new()
        .with_from("a")
        .with_to("d")
        .with_dry_run(true);
    let (result, printed) = run_to_string(options, registry);

    assert_eq!(result.unwrap(), RunOutcome::DryRun);
    assert!(log.borrow().is_empty());

    let stage_lines: Vec<&str> = printed.lines().filter(|l| l.starts_with("Stage: ")).collect();
    assert_eq!(stage_lines, vec!["Stage: a", "Stage: b", "Stage: c"]);
    assert!(printed.starts_with(DRY_RUN_HEADER));
    assert!(printed.contains("  mock: a to b\n"));
}

#[test]
fn test_directory_result_requires_destination() {
    let log = CallLog::default();
    let registry = Registry::new()
        .with_stage(MockStage::new("a", "a", "b").with_log(&log))
        .unwrap()
        .with_stage(
            MockStage::new("site", "b", "site")
                .with_kinds(RepresentationKind::String, RepresentationKind::Directory)
                .with_log(&log),
        )
        .unwrap();

    let options = RunOptions::new().with_from("a").with_to("site");
    let (result, printed) = run_to_string(options, registry);

    let err = result.unwrap_err();
    assert!(matches!(&err, StagehandError::NeedOutputSpecified { stage } if stage == "site"));
    assert_resolution_error(&err);
    assert!(log.borrow().is_empty());
    assert_eq!(printed, "");
}

#[test]
fn test_directory_result_moved_to_destination() {
    let ws = TestWorkspace::new();
    let dest = ws.path("site");
    let registry = Registry::new()
        .with_stage(
            MockStage::new("site", "text", "site")
                .with_kinds(RepresentationKind::String, RepresentationKind::Directory),
        )
        .unwrap();

    let options = RunOptions::new()
        .with_output(&dest)
        .with_from("text")
        .with_to("site");
    let (result, _) = run_to_string(options, registry);

    result.unwrap();
    assert!(dest.is_dir());
    assert_eq!(ws.read(&format!("site/{MOCK_OUTPUT_FILE}")), "site");
}

#[test]
fn test_missing_input_file_fails_before_running() {
    let ws = TestWorkspace::new();
    let log = CallLog::default();
    let registry = chain_registry_with_log(&["a", "b"], &log);

    let options = RunOptions::new()
        .with_input(ws.path("absent.txt"))
        .with_from("a")
        .with_to("b");
    let (result, _) = run_to_string(options, registry);

    let err = result.unwrap_err();
    assert!(matches!(err, StagehandError::FileNotFound(_)));
    assert!(log.borrow().is_empty());
}

#[test]
fn test_overall_profile_replaces_output() {
    let registry = chain_registry_with_log(&["a", "b", "c"], &CallLog::default());

    let options = RunOptions::new()
        .with_from("a")
        .with_to("c")
        .with_profile(Vec::<String>::new())
        .with_csv(true);
    let (result, printed) = run_to_string(options, registry);

    result.unwrap();
    let lines: Vec<&str> = printed.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("stage,a,"));
    assert!(lines[1].starts_with("stage,b,"));
    assert!(!printed.contains("a|b"));
}

#[test]
fn test_overall_profile_human_header() {
    let registry = chain_registry_with_log(&["a", "b"], &CallLog::default());

    let options = RunOptions::new()
        .with_from("a")
        .with_to("b")
        .with_profile(Vec::<String>::new());
    let (result, printed) = run_to_string(options, registry);

    result.unwrap();
    let header = format!("stage{}elapsed time (s)", " ".repeat(28));
    assert_eq!(printed.lines().next(), Some(header.as_str()));
}

#[test]
fn test_step_profile_csv() {
    let registry = Registry::new()
        .with_stage(
            MockStage::new("compile", "src", "obj")
                .with_step("parse", 0.1234)
                .with_step("codegen", 2.0),
        )
        .unwrap();

    let options = RunOptions::new()
        .with_from("src")
        .with_to("obj")
        .with_profile(["compile"])
        .with_csv(true);
    let (result, printed) = run_to_string(options, registry);

    result.unwrap();
    assert_eq!(printed, "compile,parse,0.123\ncompile,codegen,2.0\n");
}

#[test]
fn test_profile_of_unexecuted_stage_fails() {
    let ws = TestWorkspace::new();
    let registry = Registry::new()
        .with_stage(MockStage::new("compile", "src", "obj").with_step("parse", 0.1))
        .unwrap();

    let options = RunOptions::new()
        .with_output(ws.path("out.txt"))
        .with_from("src")
        .with_to("obj")
        .with_profile(["badstage.x"]);
    let (result, printed) = run_to_string(options, registry);

    let err = result.unwrap_err();
    assert!(matches!(&err, StagehandError::UndefinedStage { stage } if stage == "badstage"));
    assert_eq!(printed, "");
    assert!(!ws.path("out.txt").exists());
}

#[test]
fn test_progress_notifications() {
    let registry = Registry::new()
        .with_stage(MockStage::new("a", "a", "b").without_progress())
        .unwrap()
        .with_stage(MockStage::new("gcc", "b", "c"))
        .unwrap();

    let options = RunOptions::new().with_from("a").with_to("c");
    let mut progress = RecordingProgress::default();
    let mut out = Vec::new();
    run(
        options,
        &StagehandConfig::default(),
        registry,
        &mut progress,
        &mut out,
    )
    .unwrap();

    assert_eq!(
        progress.events(),
        vec![
            "start_stage:a → b",
            "stop",
            "start_step:a",
            "end_step",
            "end_stage",
            "start_stage:b → c (gcc)",
            "end_stage",
            "stop",
        ]
    );
}

#[test]
fn test_configured_commands_end_to_end() {
    let ws = TestWorkspace::new();
    let input = ws.write("note.txt", "hello\n");
    let config = StagehandConfig::from_toml_str(
        r#"
[stages.text]
file_extensions = [".txt"]

[stages.shout]
file_extensions = [".shout"]

[[commands]]
name = "upper"
src = "text"
target = "shout"

[[commands.steps]]
name = "tr"
cmd = "tr a-z A-Z < {input}"
"#,
    )
    .unwrap();
    let registry = Registry::from_config(&config, crate::utils::ShellRunner::default()).unwrap();

    let options = RunOptions::new()
        .with_input(&input)
        .with_output(ws.path("note.shout"));
    let mut out = Vec::new();
    run(options, &config, registry, &mut NoProgress, &mut out).unwrap();

    assert_eq!(ws.read("note.shout"), "HELLO\n");
}
