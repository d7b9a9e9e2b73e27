//! SDK integration tests over an isolated workspace.

use alfred_sdk::Client;
use alfred_testing::{
    TestWorld,
    assertions::{assert_error_containing, assert_success, current_state},
    fixtures,
};

fn client(world: &TestWorld) -> Client {
    Client::connect(world.workspace_root()).unwrap()
}

#[test]
fn connect_fails_gracefully_on_a_corrupt_config() {
    let world = TestWorld::new();
    std::fs::write(world.workspace_root().join("config.toml"), "provider = 7").unwrap();
    assert!(Client::connect(world.workspace_root()).is_err());
}

#[test]
fn work_on_task_routes_a_fresh_task_to_planning() {
    let world = TestWorld::new();
    world.write_task("AL-01", "Add cache invalidation");

    let response = client(&world).work_on_task("AL-01");
    assert_success(&response);
    assert_eq!(response.data.as_ref().unwrap()["tool_name"], "plan_task");
}

#[test]
fn a_full_review_cycle_runs_through_the_client() {
    let world = TestWorld::new();
    world.write_task("AL-01", "Add cache invalidation");
    let client = client(&world);

    let entered = client.invoke_tool("plan_task", &serde_json::json!({"task_id": "AL-01"}));
    assert_success(&entered);
    assert_eq!(current_state(&entered), "discovery");

    let submitted = client.submit_work("AL-01", fixtures::artifact_for("discovery"));
    assert_success(&submitted);
    assert_eq!(current_state(&submitted), "discovery_awaiting_ai_review");

    let rejected = client.request_revision("AL-01", "dig into the eviction path");
    assert_success(&rejected);
    assert_eq!(current_state(&rejected), "discovery");

    let resubmitted = client.submit_work("AL-01", fixtures::artifact_for("discovery"));
    assert_success(&resubmitted);

    let ai = client.approve_review("AL-01");
    assert_success(&ai);
    assert_eq!(current_state(&ai), "discovery_awaiting_human_review");

    let human = client.approve_review("AL-01");
    assert_success(&human);
    assert_eq!(current_state(&human), "clarification");
}

#[test]
fn autonomous_worlds_skip_the_human_gate() {
    let world = TestWorld::builder().autonomous().build();
    world.write_task("AL-01", "Add cache invalidation");
    let client = client(&world);

    client.invoke_tool("plan_task", &serde_json::json!({"task_id": "AL-01"}));
    assert_success(&client.submit_work("AL-01", fixtures::artifact_for("discovery")));

    let approved = client.approve_review("AL-01");
    assert_success(&approved);
    assert_eq!(current_state(&approved), "clarification");
}

#[test]
fn approvals_outside_review_states_are_rejected() {
    let world = TestWorld::new();
    world.write_task("AL-01", "Add cache invalidation");
    let client = client(&world);

    client.invoke_tool("plan_task", &serde_json::json!({"task_id": "AL-01"}));
    assert_error_containing(&client.approve_review("AL-01"), "discovery");
}

#[test]
fn revision_from_a_work_state_self_loops() {
    let world = TestWorld::new();
    world.write_task("AL-01", "Add cache invalidation");
    let client = client(&world);

    client.invoke_tool("plan_task", &serde_json::json!({"task_id": "AL-01"}));
    let looped = client.request_revision("AL-01", "rethink the approach first");
    assert_success(&looped);
    assert_eq!(current_state(&looped), "discovery");
}

#[test]
fn next_prompt_always_accompanies_workflow_progress() {
    let world = TestWorld::new();
    world.write_task("AL-01", "Add cache invalidation");
    let client = client(&world);

    let entered = client.invoke_tool("plan_task", &serde_json::json!({"task_id": "AL-01"}));
    assert!(entered.next_prompt.as_deref().unwrap().contains("discovery"));

    let submitted = client.submit_work("AL-01", fixtures::artifact_for("discovery"));
    let prompt = submitted.next_prompt.unwrap();
    assert!(prompt.contains("approve_review"), "prompt: {prompt}");
    assert!(prompt.contains("cache lacks invalidation"), "prompt: {prompt}");
}
