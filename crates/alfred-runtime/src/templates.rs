use crate::registry::Registry;
use crate::{Error, Result};
use handlebars::{Context, Handlebars, Helper, HelperResult, Output, RenderContext};
use serde_json::Value;
use std::path::Path;

/// Sentinel template keys shared by every review state.
pub const AI_REVIEW_KEY: &str = "review.ai_review";
pub const HUMAN_REVIEW_KEY: &str = "review.human_review";

/// Template key for a `(tool, state)` pair.
///
/// Review states collapse onto the two sentinels so one template pair
/// serves every review cycle in the system.
pub fn prompt_key(tool_name: &str, state: &str) -> String {
    match alfred_engine::parse_review_state(state) {
        Some((_, alfred_engine::ReviewKind::Ai)) => AI_REVIEW_KEY.to_string(),
        Some((_, alfred_engine::ReviewKind::Human)) => HUMAN_REVIEW_KEY.to_string(),
        None => format!("{tool_name}.{state}"),
    }
}

/// Producer of the prompt strings returned to the calling agent.
///
/// A missing template is a hard error: the engine never guesses what
/// an agent should do next.
pub trait PromptRenderer: Send + Sync {
    fn render(&self, prompt_key: &str, context: &Value) -> Result<String>;
}

/// Handlebars-backed renderer.
///
/// Starts from an embedded default set covering every builtin
/// `(tool, state)` key, optionally overridden by `*.md` files in the
/// workspace's template directory (file stem = template key).
pub struct HandlebarsRenderer {
    registry: Handlebars<'static>,
}

impl HandlebarsRenderer {
    pub fn with_defaults(tools: &Registry) -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.register_helper("json", Box::new(json_helper));
        for (key, template) in default_templates(tools) {
            registry
                .register_template_string(&key, &template)
                .map_err(|e| Error::Template(format!("invalid builtin template '{key}': {e}")))?;
        }
        Ok(Self { registry })
    }

    /// Register overrides from `dir/*.md`. Returns how many loaded.
    pub fn load_overrides(&mut self, dir: &Path) -> Result<usize> {
        if !dir.exists() {
            return Ok(0);
        }
        let mut loaded = 0;
        let mut entries: Vec<_> = std::fs::read_dir(dir)
            .map_err(|e| Error::Template(format!("cannot read template dir {}: {e}", dir.display())))?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .collect();
        entries.sort();

        for path in entries {
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let content = std::fs::read_to_string(&path)
                .map_err(|e| Error::Template(format!("cannot read {}: {e}", path.display())))?;
            self.registry
                .register_template_string(key, &content)
                .map_err(|e| Error::Template(format!("invalid template {}: {e}", path.display())))?;
            loaded += 1;
        }
        Ok(loaded)
    }
}

impl PromptRenderer for HandlebarsRenderer {
    fn render(&self, prompt_key: &str, context: &Value) -> Result<String> {
        if !self.registry.has_template(prompt_key) {
            return Err(Error::Template(format!(
                "no prompt template registered for '{prompt_key}'; \
                 add a '{prompt_key}.md' file to the workspace template directory"
            )));
        }
        self.registry
            .render(prompt_key, context)
            .map_err(|e| Error::Template(format!("rendering '{prompt_key}' failed: {e}")))
    }
}

/// `{{json value}}` pretty-prints any context value as JSON.
fn json_helper(
    h: &Helper<'_>,
    _r: &Handlebars<'_>,
    _ctx: &Context,
    _rc: &mut RenderContext<'_, '_>,
    out: &mut dyn Output,
) -> HelperResult {
    let value = h.param(0).map(|p| p.value().clone()).unwrap_or(Value::Null);
    let rendered = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
    out.write(&rendered)?;
    Ok(())
}

/// The embedded default prompt set: one template per builtin
/// `(tool, state)` key plus the two review sentinels.
fn default_templates(tools: &Registry) -> Vec<(String, String)> {
    let mut templates = vec![
        (AI_REVIEW_KEY.to_string(), AI_REVIEW_TEMPLATE.to_string()),
        (HUMAN_REVIEW_KEY.to_string(), HUMAN_REVIEW_TEMPLATE.to_string()),
    ];

    for tool in tools.all_tools() {
        let Some(def) = tool.as_workflow() else { continue };

        if let Some(dispatch) = &def.dispatch_state {
            templates.push((
                format!("{}.{dispatch}", def.name),
                DISPATCH_TEMPLATE.to_string(),
            ));
        }
        for state in &def.work_states {
            templates.push((format!("{}.{state}", def.name), work_state_template(state)));
        }
        templates.push((
            format!("{}.{}", def.name, def.terminal_state),
            TERMINAL_TEMPLATE.to_string(),
        ));
    }
    templates
}

fn work_state_template(state: &str) -> String {
    format!(
        "# {{{{tool_name}}}}: {state}\n\
         \n\
         Task {{{{task_id}}}} — {{{{title}}}}\n\
         \n\
         ## Task Context\n\
         {{{{context}}}}\n\
         \n\
         ## Implementation Details\n\
         {{{{implementation_details}}}}\n\
         \n\
         ## Acceptance Criteria\n\
         {{{{#each acceptance_criteria}}}}- {{{{this}}}}\n{{{{/each}}}}\
         {{{{#if artifact_content}}}}\n## Handoff Artifact\n```json\n{{{{json artifact_content}}}}\n```\n{{{{/if}}}}\
         {{{{#if feedback_notes}}}}\n## Reviewer Feedback\n{{{{feedback_notes}}}}\n{{{{/if}}}}\
         \n\
         Produce the {state} artifact for this task and submit it with \
         `submit_work`. The submission is validated against the {state} \
         schema before any state changes.\n"
    )
}

const DISPATCH_TEMPLATE: &str = "\
# {{tool_name}}: preparing

Task {{task_id}} — {{title}}

Loading the phase context. Invoke the tool again if this state persists.
";

const AI_REVIEW_TEMPLATE: &str = "\
# AI review: {{current_state}}

Task {{task_id}} — {{title}}

An artifact was submitted and awaits review.

## Artifact Summary
{{artifact_summary}}

## Artifact
```json
{{json artifact_content}}
```

Check the artifact against the task's acceptance criteria:
{{#each acceptance_criteria}}- {{this}}
{{/each}}

Approve with `approve_review`, or reject with `request_revision` and
concrete feedback describing what must change.
";

const HUMAN_REVIEW_TEMPLATE: &str = "\
# Human review: {{current_state}}

Task {{task_id}} — {{title}}

The AI reviewer approved this artifact; a human decision is needed.

## Artifact Summary
{{artifact_summary}}

Ask the human to approve (`approve_review`) or to request changes
(`request_revision` with feedback). Do not decide on their behalf.
";

const TERMINAL_TEMPLATE: &str = "\
# {{tool_name}}: phase complete

Task {{task_id}} — {{title}} has finished this phase.

Status is now `{{task_status}}`. Call `work_on_task` to continue with
the next phase, or `get_next_task` to pick up other work.
";
