//! Built-in artifact schemas, keyed by work state.
//!
//! Each workflow tool maps its work states to one of these JSON Schema
//! documents; a state with no mapping accepts any JSON object. The
//! documents are deliberately structural: semantic review of artifact
//! content is the reviewers' job, not the engine's.

use serde_json::{Value, json};

/// Findings of the planning discovery pass.
pub fn discovery() -> Value {
    json!({
        "type": "object",
        "required": ["findings", "questions", "files_to_modify", "complexity"],
        "properties": {
            "findings": {"type": "string", "minLength": 1},
            "questions": {"type": "array", "items": {"type": "string"}},
            "files_to_modify": {"type": "array", "items": {"type": "string"}},
            "complexity": {"type": "string", "enum": ["LOW", "MEDIUM", "HIGH"]},
            "implementation_context": {"type": "object"}
        }
    })
}

/// Answers to the open questions raised during discovery.
pub fn clarification() -> Value {
    json!({
        "type": "object",
        "required": ["resolutions"],
        "properties": {
            "resolutions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["question", "resolution"],
                    "properties": {
                        "question": {"type": "string"},
                        "resolution": {"type": "string"}
                    }
                }
            },
            "updated_requirements": {"type": "string"}
        }
    })
}

/// Interface and data-model contracts agreed before implementation.
pub fn contracts() -> Value {
    json!({
        "type": "object",
        "required": ["interfaces"],
        "properties": {
            "interfaces": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["name", "description"],
                    "properties": {
                        "name": {"type": "string"},
                        "description": {"type": "string"},
                        "signature": {"type": "string"}
                    }
                }
            },
            "data_models": {"type": "array", "items": {"type": "object"}}
        }
    })
}

/// The ordered subtask breakdown produced by planning.
pub fn implementation_plan() -> Value {
    json!({
        "type": "object",
        "required": ["subtasks"],
        "properties": {
            "subtasks": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "required": ["subtask_id", "title"],
                    "properties": {
                        "subtask_id": {"type": "string", "minLength": 1},
                        "title": {"type": "string"},
                        "description": {"type": "string"},
                        "file_breakdown": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "required": ["file_path", "operation"],
                                "properties": {
                                    "file_path": {"type": "string"},
                                    "operation": {
                                        "type": "string",
                                        "enum": ["CREATE", "MODIFY", "DELETE"]
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "risks": {"type": "array", "items": {"type": "string"}}
        }
    })
}

/// Final planning self-check against the acceptance criteria.
pub fn validation() -> Value {
    json!({
        "type": "object",
        "required": ["summary"],
        "properties": {
            "summary": {"type": "string", "minLength": 1},
            "acceptance_criteria_results": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["criterion", "covered"],
                    "properties": {
                        "criterion": {"type": "string"},
                        "covered": {"type": "boolean"},
                        "notes": {"type": "string"}
                    }
                }
            }
        }
    })
}

/// Draft specification produced by the spec-authoring workflow.
pub fn drafting() -> Value {
    json!({
        "type": "object",
        "required": ["overview", "requirements"],
        "properties": {
            "overview": {"type": "string", "minLength": 1},
            "requirements": {"type": "array", "minItems": 1, "items": {"type": "string"}},
            "out_of_scope": {"type": "array", "items": {"type": "string"}}
        }
    })
}

/// Task list carved out of a completed specification.
pub fn task_breakdown() -> Value {
    json!({
        "type": "object",
        "required": ["tasks"],
        "properties": {
            "tasks": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "required": ["task_id", "title"],
                    "properties": {
                        "task_id": {"type": "string", "minLength": 1},
                        "title": {"type": "string"},
                        "context": {"type": "string"}
                    }
                }
            }
        }
    })
}

/// Implementation manifest: what was actually built.
///
/// Cross-checked against the planning subtasks on submit; see
/// [`crate::check_subtask_completion`].
pub fn implementing() -> Value {
    json!({
        "type": "object",
        "required": ["completed_subtasks", "summary"],
        "properties": {
            "completed_subtasks": {"type": "array", "items": {"type": "string"}},
            "summary": {"type": "string", "minLength": 1},
            "file_breakdown": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["file_path", "operation"],
                    "properties": {
                        "file_path": {"type": "string"},
                        "operation": {"type": "string", "enum": ["CREATE", "MODIFY", "DELETE"]}
                    }
                }
            },
            "deviations": {"type": "array", "items": {"type": "string"}}
        }
    })
}

/// Code-review findings.
pub fn reviewing() -> Value {
    json!({
        "type": "object",
        "required": ["summary"],
        "properties": {
            "summary": {"type": "string", "minLength": 1},
            "findings": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["severity", "description"],
                    "properties": {
                        "severity": {"type": "string", "enum": ["blocker", "major", "minor", "nit"]},
                        "description": {"type": "string"},
                        "file_path": {"type": "string"}
                    }
                }
            }
        }
    })
}

/// Acceptance-criteria verification results.
pub fn testing() -> Value {
    json!({
        "type": "object",
        "required": ["summary"],
        "properties": {
            "summary": {"type": "string", "minLength": 1},
            "ac_results": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["criterion", "passed"],
                    "properties": {
                        "criterion": {"type": "string"},
                        "passed": {"type": "boolean"},
                        "evidence": {"type": "string"}
                    }
                }
            }
        }
    })
}

/// Finalization record: cleanup, docs, commit message.
pub fn finalizing() -> Value {
    json!({
        "type": "object",
        "required": ["summary"],
        "properties": {
            "summary": {"type": "string", "minLength": 1},
            "commit_message": {"type": "string"},
            "follow_ups": {"type": "array", "items": {"type": "string"}}
        }
    })
}
