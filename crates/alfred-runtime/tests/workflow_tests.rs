//! End-to-end driver tests over a real on-disk workspace.

use alfred_runtime::{Config, Runtime};
use alfred_types::{ResponseStatus, TaskStatus, ToolResponse};
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const PLAN_STATES: [&str; 5] = [
    "discovery",
    "clarification",
    "contracts",
    "implementation_plan",
    "validation",
];

fn write_task(tasks_root: &Path, id: &str) {
    fs::create_dir_all(tasks_root).unwrap();
    let content = format!(
        "# TASK: {id}\n\n## Title\nAdd cache invalidation\n\n## Context\nThe cache never evicts.\n\n\
         ## Implementation Details\nAdd TTL-based eviction.\n\n## Acceptance Criteria\n- stale entries are evicted\n"
    );
    fs::write(tasks_root.join(format!("{id}.md")), content).unwrap();
}

fn world() -> (TempDir, Runtime) {
    world_with_config(Config::default())
}

fn world_with_config(config: Config) -> (TempDir, Runtime) {
    let dir = TempDir::new().unwrap();
    let workspace = dir.path().join(".alfred");
    fs::create_dir_all(&workspace).unwrap();
    config.save_to(&Config::path_in(&workspace)).unwrap();

    let runtime = Runtime::open(&workspace).unwrap();
    write_task(&runtime.tasks_root(), "AL-01");
    (dir, runtime)
}

fn autonomous_world() -> (TempDir, Runtime) {
    world_with_config(Config {
        autonomous_mode: true,
        ..Config::default()
    })
}

fn artifact_for(state: &str) -> Value {
    match state {
        "discovery" => json!({
            "findings": "cache lacks invalidation",
            "questions": ["should eviction be LRU?"],
            "files_to_modify": ["src/cache.rs"],
            "complexity": "LOW",
            "implementation_context": {}
        }),
        "clarification" => json!({
            "resolutions": [{"question": "should eviction be LRU?", "resolution": "yes"}]
        }),
        "contracts" => json!({
            "interfaces": [{"name": "Cache::evict", "description": "drop stale entries"}]
        }),
        "implementation_plan" => json!({
            "subtasks": [
                {"subtask_id": "ST-1", "title": "add TTL field"},
                {"subtask_id": "ST-2", "title": "evict on read"},
                {"subtask_id": "ST-3", "title": "tests"}
            ]
        }),
        "validation" => json!({"summary": "plan covers every criterion"}),
        "implementing" => json!({
            "completed_subtasks": ["ST-1", "ST-2", "ST-3"],
            "summary": "implemented eviction"
        }),
        other => panic!("no fixture artifact for state {other}"),
    }
}

fn state_of(response: &ToolResponse) -> String {
    response.data.as_ref().unwrap()["current_state"]
        .as_str()
        .unwrap()
        .to_string()
}

fn assert_success(response: &ToolResponse) {
    assert_eq!(
        response.status,
        ResponseStatus::Success,
        "unexpected error: {}",
        response.message
    );
}

/// Run a full planning phase with autonomous approvals.
fn run_planning(runtime: &Runtime, task_id: &str) {
    let entered = runtime.invoke_tool("plan_task", &json!({"task_id": task_id}));
    assert_success(&entered);
    for state in PLAN_STATES {
        assert_success(&runtime.submit_work(task_id, artifact_for(state)));
        assert_success(&runtime.approve_review(task_id));
    }
}

#[test]
fn happy_path_through_planning() {
    let (_dir, runtime) = world();

    let entered = runtime.invoke_tool("plan_task", &json!({"task_id": "AL-01"}));
    assert_success(&entered);
    assert_eq!(state_of(&entered), "discovery");
    assert!(entered.next_prompt.is_some());

    let mut expected_turn = 0;
    for (index, state) in PLAN_STATES.iter().enumerate() {
        let submitted = runtime.submit_work("AL-01", artifact_for(state));
        assert_success(&submitted);
        expected_turn += 1;
        assert_eq!(submitted.data.as_ref().unwrap()["turn_number"], expected_turn);
        assert_eq!(state_of(&submitted), format!("{state}_awaiting_ai_review"));

        let ai_approved = runtime.approve_review("AL-01");
        assert_success(&ai_approved);
        assert_eq!(state_of(&ai_approved), format!("{state}_awaiting_human_review"));

        let human_approved = runtime.approve_review("AL-01");
        assert_success(&human_approved);
        if let Some(next) = PLAN_STATES.get(index + 1) {
            assert_eq!(state_of(&human_approved), next.to_string());
        } else {
            let data = human_approved.data.as_ref().unwrap();
            assert_eq!(data["terminal_state"], "verified");
            assert_eq!(data["task_status"], "ready_for_development");
        }
    }

    let state = runtime.store().load_state("AL-01").unwrap().unwrap();
    assert!(state.active_tool_state.is_none());
    assert_eq!(state.task_status, TaskStatus::ReadyForDevelopment);
    assert_eq!(
        state.completed_tool_outputs["plan_task"],
        artifact_for("validation")
    );
}

#[test]
fn revision_loop_links_the_next_submission() {
    let (_dir, runtime) = world();
    runtime.invoke_tool("plan_task", &json!({"task_id": "AL-01"}));
    assert_success(&runtime.submit_work("AL-01", artifact_for("discovery")));

    let rejected = runtime.request_revision("AL-01", "Need more depth");
    assert_success(&rejected);
    assert_eq!(state_of(&rejected), "discovery");

    let turns = runtime.store().load_turns("AL-01").unwrap();
    assert_eq!(turns.len(), 2);
    let meta = &turns[1];
    assert_eq!(meta.state_name, "revision_request");
    assert_eq!(meta.artifact_data["state_to_revise"], "discovery");
    assert_eq!(meta.artifact_data["feedback"], "Need more depth");
    assert_eq!(meta.artifact_data["requested_by"], "ai");

    let state = runtime.store().load_state("AL-01").unwrap().unwrap();
    let workflow = state.active_tool_state.as_ref().unwrap();
    assert_eq!(workflow.context_u64("revision_turn_number"), Some(2));

    let resubmitted = runtime.submit_work("AL-01", artifact_for("discovery"));
    assert_success(&resubmitted);
    let turns = runtime.store().load_turns("AL-01").unwrap();
    assert_eq!(turns[2].revision_of, Some(2));
    assert_eq!(turns[2].revision_feedback.as_deref(), Some("Need more depth"));

    let state = runtime.store().load_state("AL-01").unwrap().unwrap();
    let workflow = state.active_tool_state.as_ref().unwrap();
    assert!(workflow.context("revision_turn_number").is_none());
    assert!(workflow.context("feedback_notes").is_none());
}

#[test]
fn autonomous_mode_bypasses_the_human_gate() {
    let (_dir, runtime) = autonomous_world();
    runtime.invoke_tool("plan_task", &json!({"task_id": "AL-01"}));
    assert_success(&runtime.submit_work("AL-01", artifact_for("discovery")));

    let approved = runtime.approve_review("AL-01");
    assert_success(&approved);
    assert_eq!(state_of(&approved), "clarification");
}

#[test]
fn submitting_from_a_review_state_is_rejected() {
    let (_dir, runtime) = world();
    runtime.invoke_tool("plan_task", &json!({"task_id": "AL-01"}));
    assert_success(&runtime.submit_work("AL-01", artifact_for("discovery")));

    let second = runtime.submit_work("AL-01", artifact_for("discovery"));
    assert_eq!(second.status, ResponseStatus::Error);
    assert!(second.message.contains("discovery_awaiting_ai_review"), "{}", second.message);

    // the failed call wrote nothing
    assert_eq!(runtime.store().load_turns("AL-01").unwrap().len(), 1);
}

#[test]
fn invalid_artifact_is_rejected_without_advancing() {
    let (_dir, runtime) = world();
    runtime.invoke_tool("plan_task", &json!({"task_id": "AL-01"}));

    let rejected = runtime.submit_work("AL-01", json!({"findings": "x"}));
    assert_eq!(rejected.status, ResponseStatus::Error);
    assert!(rejected.message.contains("validation failed"), "{}", rejected.message);

    let state = runtime.store().load_state("AL-01").unwrap().unwrap();
    assert_eq!(state.active_tool_state.unwrap().current_state, "discovery");
    assert!(runtime.store().load_turns("AL-01").unwrap().is_empty());
}

#[test]
fn implementation_manifest_must_cover_the_plan() {
    let (_dir, runtime) = autonomous_world();
    run_planning(&runtime, "AL-01");

    let entered = runtime.invoke_tool("implement_task", &json!({"task_id": "AL-01"}));
    assert_success(&entered);
    // dispatch_on_init moved straight through the dispatch state
    assert_eq!(state_of(&entered), "implementing");

    let state = runtime.store().load_state("AL-01").unwrap().unwrap();
    assert_eq!(state.task_status, TaskStatus::InDevelopment);
    let workflow = state.active_tool_state.as_ref().unwrap();
    assert_eq!(
        workflow.context("artifact_content").unwrap()["subtasks"][0]["subtask_id"],
        "ST-1"
    );

    let turns_before = runtime.store().load_turns("AL-01").unwrap().len();
    let partial = runtime.submit_work(
        "AL-01",
        json!({"completed_subtasks": ["ST-1", "ST-2"], "summary": "partial"}),
    );
    assert_eq!(partial.status, ResponseStatus::Error);
    assert!(partial.message.contains("67%"), "{}", partial.message);
    assert!(partial.message.contains("ST-3"), "{}", partial.message);
    assert_eq!(runtime.store().load_turns("AL-01").unwrap().len(), turns_before);

    let complete = runtime.submit_work("AL-01", artifact_for("implementing"));
    assert_success(&complete);
}

#[test]
fn lock_contention_returns_an_error_without_writes() {
    let (_dir, runtime) = world();
    runtime.invoke_tool("plan_task", &json!({"task_id": "AL-01"}));

    let _held = runtime.store().lock_task("AL-01").unwrap();
    let blocked = runtime.submit_work("AL-01", artifact_for("discovery"));
    assert_eq!(blocked.status, ResponseStatus::Error);
    assert!(blocked.message.contains("locked"), "{}", blocked.message);
    assert!(runtime.store().load_turns("AL-01").unwrap().is_empty());
}

#[test]
fn approve_and_advance_refuses_mid_workflow() {
    let (_dir, runtime) = world();
    runtime.invoke_tool("plan_task", &json!({"task_id": "AL-01"}));
    assert_success(&runtime.submit_work("AL-01", artifact_for("discovery")));

    let refused = runtime.approve_and_advance("AL-01");
    assert_eq!(refused.status, ResponseStatus::Error);
    assert!(refused.message.contains("discovery"), "{}", refused.message);
    assert!(refused.message.contains("validation"), "{}", refused.message);
}

#[test]
fn approve_and_advance_points_at_the_next_phase() {
    let (_dir, runtime) = autonomous_world();
    run_planning(&runtime, "AL-01");

    let advanced = runtime.approve_and_advance("AL-01");
    assert_success(&advanced);
    assert_eq!(advanced.data.as_ref().unwrap()["tool_name"], "implement_task");
}

#[test]
fn mark_subtask_complete_tracks_progress() {
    let (_dir, runtime) = autonomous_world();
    run_planning(&runtime, "AL-01");
    runtime.invoke_tool("implement_task", &json!({"task_id": "AL-01"}));

    let first = runtime.mark_subtask_complete("AL-01", "ST-2");
    assert_success(&first);
    let data = first.data.as_ref().unwrap();
    assert_eq!(data["completed_subtasks"], json!(["ST-2"]));
    assert_eq!(data["percent"], 33);

    // marking twice is idempotent
    let again = runtime.mark_subtask_complete("AL-01", "ST-2");
    assert_eq!(again.data.as_ref().unwrap()["percent"], 33);

    let unknown = runtime.mark_subtask_complete("AL-01", "ST-99");
    assert_eq!(unknown.status, ResponseStatus::Error);
    assert!(unknown.message.contains("ST-99"), "{}", unknown.message);
    let state = runtime.store().load_state("AL-01").unwrap().unwrap();
    assert_eq!(
        state.active_tool_state.unwrap().context_str_list("completed_subtasks"),
        vec!["ST-2"]
    );

    // no turns were written by progress tracking
    let meta_free: Vec<_> = runtime
        .store()
        .load_turns("AL-01")
        .unwrap()
        .into_iter()
        .filter(|t| t.tool_name == "implement_task")
        .collect();
    assert!(meta_free.is_empty());
}

#[test]
fn work_on_task_routes_by_status() {
    let (_dir, runtime) = world();

    let fresh = runtime.invoke_tool("work_on_task", &json!({"task_id": "AL-01"}));
    assert_success(&fresh);
    assert_eq!(fresh.data.as_ref().unwrap()["tool_name"], "plan_task");

    runtime.invoke_tool("plan_task", &json!({"task_id": "AL-01"}));
    let planning = runtime.invoke_tool("work_on_task", &json!({"task_id": "AL-01"}));
    assert_eq!(planning.data.as_ref().unwrap()["tool_name"], "plan_task");
    assert_eq!(planning.data.as_ref().unwrap()["task_status"], "planning");
}

#[test]
fn unknown_task_gets_remediation_guidance() {
    let (_dir, runtime) = world();
    let missing = runtime.invoke_tool("plan_task", &json!({"task_id": "AL-99"}));
    assert_eq!(missing.status, ResponseStatus::Error);
    assert!(missing.message.contains("AL-99.md"), "{}", missing.message);
    assert!(missing.message.contains("create_task"), "{}", missing.message);
}

#[test]
fn implement_task_requires_the_plan_artifact() {
    let (_dir, runtime) = world();
    // force the status forward without running planning
    let mut state = runtime.store().load_or_init_state("AL-01").unwrap();
    state.task_status = TaskStatus::ReadyForDevelopment;
    runtime.store().save_state(&state).unwrap();

    let blocked = runtime.invoke_tool("implement_task", &json!({"task_id": "AL-01"}));
    assert_eq!(blocked.status, ResponseStatus::Error);
    assert!(blocked.message.contains("plan_task"), "{}", blocked.message);
}

#[test]
fn wrong_entry_status_is_rejected() {
    let (_dir, runtime) = world();
    let rejected = runtime.invoke_tool("review_task", &json!({"task_id": "AL-01"}));
    assert_eq!(rejected.status, ResponseStatus::Error);
    assert!(rejected.message.contains("ready_for_review"), "{}", rejected.message);
}

#[test]
fn full_pipeline_reaches_done() {
    let (_dir, runtime) = autonomous_world();
    run_planning(&runtime, "AL-01");

    let phases: [(&str, &str, Value); 4] = [
        ("implement_task", "implementing", artifact_for("implementing")),
        ("review_task", "reviewing", json!({"summary": "looks correct"})),
        ("test_task", "testing", json!({"summary": "all criteria verified"})),
        ("finalize_task", "finalizing", json!({"summary": "cleaned up"})),
    ];
    for (tool, _state, artifact) in phases {
        assert_success(&runtime.invoke_tool(tool, &json!({"task_id": "AL-01"})));
        assert_success(&runtime.submit_work("AL-01", artifact));
        assert_success(&runtime.approve_review("AL-01"));
    }

    let state = runtime.store().load_state("AL-01").unwrap().unwrap();
    assert_eq!(state.task_status, TaskStatus::Done);
    assert!(state.active_tool_state.is_none());
    for tool in ["plan_task", "implement_task", "review_task", "test_task", "finalize_task"] {
        assert!(
            state.completed_tool_outputs.contains_key(tool),
            "missing output for {tool}"
        );
    }

    let done = runtime.invoke_tool("work_on_task", &json!({"task_id": "AL-01"}));
    assert_success(&done);
    assert!(done.message.contains("done"), "{}", done.message);
}

#[test]
fn scratchpad_reflects_the_latest_submissions() {
    let (_dir, runtime) = world();
    runtime.invoke_tool("plan_task", &json!({"task_id": "AL-01"}));
    assert_success(&runtime.submit_work("AL-01", artifact_for("discovery")));

    let scratchpad = runtime
        .workspace_root()
        .join("AL-01")
        .join("scratchpad.md");
    let content = fs::read_to_string(scratchpad).unwrap();
    assert!(content.contains("AL-01"));
    assert!(content.contains("cache lacks invalidation"));
}
