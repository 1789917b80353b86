use anyhow::Result;
use nestflow::{App, Args};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn basic_args(graph: String, output: String) -> Args {
    Args {
        graph,
        output,
        penalty: 1.0,
        group_depth: 2,
        separator: String::from("/"),
        strip_prefix: Some(String::from("/home/me/repos/")),
        exclude: vec![String::from("example")],
        retries: 2,
        retry_delay_ms: 1,
        backoff: String::from("fixed"),
        no_annotate: false,
        no_impact: false,
        verbose: 1,
        dry_run: false,
    }
}

fn stringify(path: &Path) -> String {
    path.to_str().unwrap().to_owned()
}

fn param(component: &str, id: &str, direction: &str) -> Value {
    json!({ "component": format!("/home/me/repos/{component}"), "id": id, "direction": direction })
}

fn node(kind: &str, component: &str, id: &str) -> Value {
    json!({ "kind": kind, "component": format!("/home/me/repos/{component}"), "id": id })
}

fn flow(source: Value, target: Value, scope: &str, step: Option<&str>, data: &str) -> Value {
    json!({
        "source": source,
        "target": target,
        "component": format!("/home/me/repos/{scope}"),
        "step": step,
        "data": data,
    })
}

/// Workflow g/p/wf.cwl running tools s1 then s2, plus an excluded tool
/// and a tool in another group.
fn two_step_graph() -> Value {
    let (wf, s1, s2) = ("g/p/wf.cwl", "g/p/s1.cwl", "g/p/s2.cwl");
    let components = [
        (wf, "Workflow"),
        (s1, "CommandLineTool"),
        (s2, "CommandLineTool"),
        ("g/p/example_tool.cwl", "CommandLineTool"),
        ("h/q/other.cwl", "CommandLineTool"),
    ];
    json!({
        "components": components
            .iter()
            .map(|(id, kind)| json!({ "id": format!("/home/me/repos/{id}"), "kind": kind }))
            .collect::<Vec<_>>(),
        "parameters": [
            param(wf, "x", "in"),
            param(wf, "y", "out"),
            param(s1, "a", "in"),
            param(s1, "b", "out"),
            param(s2, "a", "in"),
            param(s2, "b", "out"),
        ],
        "data_flow": [
            flow(node("in", wf, "x"), node("in", s1, "a"), wf, Some("s1"), "x"),
            flow(node("in", s1, "a"), node("out", s1, "b"), s1, None, "a"),
            flow(node("out", s1, "b"), node("in", s2, "a"), wf, Some("s2"), "s1/b"),
            flow(node("in", s2, "a"), node("out", s2, "b"), s2, None, "a"),
            flow(node("out", s2, "b"), node("out", wf, "y"), wf, None, "s2/b"),
        ],
    })
}

/// Workflows a and b each feeding the other's input.
fn cyclic_graph() -> Value {
    let (a, b) = ("g/p/a.cwl", "g/p/b.cwl");
    json!({
        "components": [
            { "id": format!("/home/me/repos/{a}"), "kind": "Workflow" },
            { "id": format!("/home/me/repos/{b}"), "kind": "Workflow" },
        ],
        "parameters": [param(a, "x", "in"), param(b, "x", "in")],
        "data_flow": [
            flow(node("in", a, "x"), node("in", b, "x"), a, Some("b"), "x"),
            flow(node("in", b, "x"), node("in", a, "x"), b, Some("a"), "x"),
        ],
    })
}

struct Run {
    // held so the directory outlives the test body:
    _dir: tempfile::TempDir,
    output: PathBuf,
    args: Args,
}

fn setup(graph: &Value) -> Result<Run> {
    simple_logging::log_to_stderr(log::LevelFilter::Trace);
    let dir = tempdir()?;
    let graph_path = dir.path().join("graph.json");
    std::fs::write(&graph_path, serde_json::to_string_pretty(graph)?)?;
    let output = dir.path().join("out");
    let args = basic_args(stringify(&graph_path), stringify(&output));
    Ok(Run {
        _dir: dir,
        output,
        args,
    })
}

fn read_json(path: PathBuf) -> Result<Value> {
    Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
}

fn matrix_score(csv: &str, row: &str, col: &str) -> Option<String> {
    let mut lines = csv.lines();
    let header: Vec<_> = lines.next()?.split(',').collect();
    let j = header.iter().position(|h| *h == col)?;
    lines
        .map(|line| line.split(',').collect::<Vec<_>>())
        .find(|cells| cells[0] == row)
        .map(|cells| cells[j].to_owned())
}

#[test]
fn test_two_steps() -> Result<()> {
    let run = setup(&two_step_graph())?;
    App::new(run.args.try_into()?).run()?;

    let paths = read_json(run.output.join("flow_paths.json"))?;
    assert_eq!(
        json!([["g/p/wf.cwl", "Sequential", 1]]),
        paths["g/p/s1.cwl"]["g/p/s2.cwl"]
    );
    assert_eq!(
        json!([["g/p/wf.cwl", "Direct", 1]]),
        paths["g/p/wf.cwl"]["g/p/s1.cwl"]
    );
    assert_eq!(
        json!([["g/p/wf.cwl", "Indirect", 1]]),
        paths["g/p/s2.cwl"]["g/p/wf.cwl"]
    );
    assert!(paths["g/p/s2.cwl"].get("g/p/s1.cwl").is_none());

    let csv = std::fs::read_to_string(run.output.join("change_impact_analysis.csv"))?;
    assert_eq!(
        Some(",g/p/s1.cwl,g/p/s2.cwl,g/p/wf.cwl,h/q/other.cwl"),
        csv.lines().next()
    );
    let score = |a, b| matrix_score(&csv, a, b);
    assert_eq!(Some("1.0".to_owned()), score("g/p/s1.cwl", "g/p/s2.cwl"));
    assert_eq!(Some("1.0".to_owned()), score("g/p/s2.cwl", "g/p/s1.cwl"));
    assert_eq!(Some("2.0".to_owned()), score("g/p/wf.cwl", "g/p/s1.cwl"));
    assert_eq!(Some("-1.0".to_owned()), score("g/p/s1.cwl", "g/p/s1.cwl"));
    assert_eq!(Some("-1.0".to_owned()), score("h/q/other.cwl", "g/p/wf.cwl"));

    let cumulative = read_json(run.output.join("change_impact_cumulative_scores.json"))?;
    assert_eq!(Some(4.0), cumulative["g/p"]["g/p/wf.cwl"].as_f64());
    assert_eq!(Some(3.0), cumulative["g/p"]["g/p/s1.cwl"].as_f64());
    assert_eq!(Some(0.0), cumulative["h/q"]["h/q/other.cwl"].as_f64());

    let fan = std::fs::read_to_string(run.output.join("fan_data.csv"))?;
    assert!(fan.lines().any(|l| l == "g/p/s1.cwl,1,2,\"[g/p/s2.cwl, g/p/wf.cwl]\",2"));

    let memberships = read_json(run.output.join("memberships.json"))?;
    assert_eq!(json!(["g/p/wf.cwl"]), memberships["nodes"]["g/p/s1.cwl:in:a"]);
    Ok(())
}

#[test]
fn test_repeat_runs_agree() -> Result<()> {
    let run = setup(&two_step_graph())?;
    let settings_a = basic_args(run.args.graph.clone(), run.args.output.clone());
    let settings_b = basic_args(run.args.graph.clone(), run.args.output.clone());

    App::new(settings_a.try_into()?).run()?;
    let first = std::fs::read_to_string(run.output.join("change_impact_analysis.csv"))?;
    let first_members = std::fs::read_to_string(run.output.join("memberships.json"))?;

    App::new(settings_b.try_into()?).run()?;
    let second = std::fs::read_to_string(run.output.join("change_impact_analysis.csv"))?;
    let second_members = std::fs::read_to_string(run.output.join("memberships.json"))?;

    assert_eq!(first, second);
    assert_eq!(first_members, second_members);
    Ok(())
}

#[test]
fn test_skip_stages() -> Result<()> {
    let mut run = setup(&two_step_graph())?;
    run.args.no_impact = true;
    run.args.no_annotate = true;
    App::new(run.args.try_into()?).run()?;

    assert!(run.output.join("flow_paths.json").exists());
    assert!(!run.output.join("change_impact_analysis.csv").exists());
    assert!(!run.output.join("memberships.json").exists());
    Ok(())
}

#[test]
fn test_cycle_is_fatal() -> Result<()> {
    let run = setup(&cyclic_graph())?;
    let result = App::new(run.args.try_into()?).run();

    let err = result.expect_err("cyclic workflows should not be traversed");
    assert!(err.to_string().contains("not acyclic"));
    assert!(!run.output.join("flow_paths.json").exists());
    Ok(())
}

#[test]
fn test_dry_run() -> Result<()> {
    let mut run = setup(&two_step_graph())?;
    run.args.dry_run = true;
    App::new(run.args.try_into()?).run()?;
    assert!(!run.output.exists());
    Ok(())
}

#[test]
fn test_cancelled_before_start() -> Result<()> {
    let run = setup(&two_step_graph())?;
    let app = App::new(run.args.try_into()?);
    app.cancel_token().cancel();
    let err = app.run().expect_err("cancelled run should fail");
    assert!(matches!(
        err.downcast_ref::<traverse::Error>(),
        Some(traverse::Error::Cancelled)
    ));
    Ok(())
}

#[test]
fn test_missing_graph() {
    let dir = tempdir().unwrap();
    let args = basic_args(
        stringify(&dir.path().join("nope.json")),
        stringify(&dir.path().join("out")),
    );
    let settings: Result<nestflow::Settings> = args.try_into();
    assert!(settings.is_err());
}
