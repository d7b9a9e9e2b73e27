//! Sample tasks and artifacts.
//!
//! One fixture per builtin work state, shaped to pass that state's
//! schema, so integration tests can drive whole phases without
//! hand-writing artifacts.

use serde_json::{Value, json};

/// A minimal well-formed task file.
pub fn task_markdown(task_id: &str, title: &str) -> String {
    format!(
        "# TASK: {task_id}\n\n\
         ## Title\n{title}\n\n\
         ## Context\nThe cache never evicts entries.\n\n\
         ## Implementation Details\nAdd TTL-based eviction to the cache layer.\n\n\
         ## Acceptance Criteria\n- stale entries are evicted\n- hit rate is unchanged\n"
    )
}

/// Valid artifact for any builtin work state.
pub fn artifact_for(state: &str) -> Value {
    match state {
        "discovery" => json!({
            "findings": "cache lacks invalidation",
            "questions": ["should eviction be LRU?"],
            "files_to_modify": ["src/cache.rs"],
            "complexity": "LOW",
            "implementation_context": {}
        }),
        "clarification" => json!({
            "resolutions": [
                {"question": "should eviction be LRU?", "resolution": "yes, plain LRU"}
            ]
        }),
        "contracts" => json!({
            "interfaces": [
                {"name": "Cache::evict", "description": "drop entries older than the TTL"}
            ]
        }),
        "implementation_plan" => plan_artifact(&["ST-1", "ST-2", "ST-3"]),
        "validation" => json!({"summary": "the plan covers every acceptance criterion"}),
        "implementing" => manifest_artifact(&["ST-1", "ST-2", "ST-3"]),
        "reviewing" => json!({"summary": "implementation matches the plan", "findings": []}),
        "testing" => json!({"summary": "all acceptance criteria verified"}),
        "finalizing" => json!({"summary": "docs updated, branch cleaned"}),
        "drafting" => json!({
            "overview": "cache invalidation support",
            "requirements": ["entries expire after a TTL"]
        }),
        "task_breakdown" => json!({
            "tasks": [{"task_id": "AL-10", "title": "add eviction"}]
        }),
        other => panic!("no fixture artifact for state {other}"),
    }
}

/// An implementation plan over the given subtask ids.
pub fn plan_artifact(subtask_ids: &[&str]) -> Value {
    let subtasks: Vec<Value> = subtask_ids
        .iter()
        .map(|id| {
            json!({
                "subtask_id": id,
                "title": format!("subtask {id}"),
                "file_breakdown": [
                    {"file_path": "src/cache.rs", "operation": "MODIFY"}
                ]
            })
        })
        .collect();
    json!({"subtasks": subtasks})
}

/// An implementation manifest claiming the given subtasks done.
pub fn manifest_artifact(completed: &[&str]) -> Value {
    json!({
        "completed_subtasks": completed,
        "summary": "implemented per plan"
    })
}
