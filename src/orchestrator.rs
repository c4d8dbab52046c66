//! Brief to page: topic gate, copywriter call, orchestrator call, then
//! extraction, adaptation and validation of the plan.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::{InputError, PipelineError, DECLINE_MESSAGE};
use crate::filter::filter_question;
use crate::llm::{prompts, Completion, UpstreamError};
use crate::plan::{parse_json_response, sentinel, to_page_spec, AdapterError, Sentinel};
use crate::rules::RulesCache;
use crate::spec::PageSpec;

const PREVIEW_CHARS: usize = 500;

#[derive(Debug, Clone, Copy)]
enum Stage {
    Copywriter,
    Orchestrator,
}

impl Stage {
    fn name(self) -> &'static str {
        match self {
            Stage::Copywriter => "copywriter",
            Stage::Orchestrator => "orchestrator",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub text: String,
    /// True when the topic filter answered without consulting the model.
    pub filtered: bool,
}

pub struct Pipeline<'a, C: Completion> {
    model: &'a C,
    rules: &'a RulesCache,
    max_input_chars: usize,
}

impl<'a, C: Completion> Pipeline<'a, C> {
    pub fn new(model: &'a C, rules: &'a RulesCache, max_input_chars: usize) -> Self {
        Self {
            model,
            rules,
            max_input_chars,
        }
    }

    pub fn generate(&self, brief: &str, style: Option<&str>) -> Result<PageSpec, PipelineError> {
        let brief = check_input(brief, self.max_input_chars)?;

        let verdict = filter_question(brief);
        if !verdict.relevant {
            let reason = verdict.reason.unwrap_or_default();
            info!(%reason, "brief rejected by topic filter");
            return Err(PipelineError::FilteredOut { reason });
        }

        // one snapshot for both calls; a reload mid-request is not observed
        let rules = self.rules.get()?;

        info!("requesting copy");
        let copy = self.run_stage(
            Stage::Copywriter,
            &prompts::copywriter_system_prompt(&rules),
            &prompts::copywriter_message(brief, style),
        )?;
        if !copy.is_object() {
            return Err(UpstreamError::UnexpectedShape {
                stage: Stage::Copywriter.name(),
                detail: "copy payload is not a JSON object".to_string(),
            }
            .into());
        }

        info!("requesting layout plan");
        let plan = self.run_stage(
            Stage::Orchestrator,
            &prompts::orchestrator_system_prompt(&rules),
            &prompts::orchestrator_message(brief, &copy),
        )?;

        let spec = adapt(&plan)?;
        info!(blocks = spec.blocks().len(), "page spec validated");
        Ok(spec)
    }

    /// Single-call question answering behind the same input check and topic gate.
    pub fn answer(&self, question: &str) -> Result<Answer, PipelineError> {
        let question = check_input(question, self.max_input_chars)?;

        let verdict = filter_question(question);
        if !verdict.relevant {
            info!(reason = ?verdict.reason, "question rejected by topic filter");
            return Ok(Answer {
                text: DECLINE_MESSAGE.to_string(),
                filtered: true,
            });
        }

        let rules = self.rules.get()?;
        let system = prompts::qa_system_prompt(&rules);
        debug!(system_chars = system.len(), "asking question");
        let text = self.model.complete(&system, question)?;
        Ok(Answer {
            text: text.trim().to_string(),
            filtered: false,
        })
    }

    fn run_stage(&self, stage: Stage, system: &str, user: &str) -> Result<Value, PipelineError> {
        debug!(
            stage = stage.name(),
            system_chars = system.len(),
            user_chars = user.len(),
            "calling model"
        );
        let raw = self.model.complete(system, user)?;
        debug!(stage = stage.name(), response_chars = raw.len(), "model responded");
        decode(stage, &raw)
    }
}

/// Runs a saved orchestrator response through the offline half of the pipeline.
pub fn page_from_model_output(text: &str) -> Result<PageSpec, PipelineError> {
    let plan = decode(Stage::Orchestrator, text)?;
    adapt(&plan)
}

fn check_input(text: &str, max: usize) -> Result<&str, InputError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty);
    }
    let actual = text.chars().count();
    if actual > max {
        return Err(InputError::TooLong { max, actual });
    }
    Ok(trimmed)
}

fn decode(stage: Stage, raw: &str) -> Result<Value, PipelineError> {
    let value = parse_json_response(raw).map_err(|err| {
        let preview: String = raw.chars().take(PREVIEW_CHARS).collect();
        error!(stage = stage.name(), %err, %preview, "could not parse model output");
        err
    })?;

    match sentinel::detect(&value) {
        None => Ok(value),
        Some(Sentinel::OutOfScope { message }) => {
            info!(stage = stage.name(), "model declined the request as out of scope");
            Err(PipelineError::OutOfScope { message })
        }
        Some(Sentinel::Reported { error }) => {
            warn!(stage = stage.name(), %error, "model returned an error object");
            Err(UpstreamError::UnexpectedShape {
                stage: stage.name(),
                detail: error,
            }
            .into())
        }
    }
}

fn adapt(plan: &Value) -> Result<PageSpec, PipelineError> {
    to_page_spec(plan).map_err(|err| {
        match &err {
            AdapterError::Invalid(invalid) => {
                error!(plan = %plan, violations = %invalid, "plan failed validation");
            }
            AdapterError::UnsupportedPlan(_) => {
                error!(plan = %plan, %err, "plan has no usable block list");
            }
        }
        PipelineError::from(err)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use crate::error::GENERIC_FAILURE_MESSAGE;
    use crate::spec::model::ComponentKind;

    const BRIEF: &str = "A portfolio page about Charles Pfaff's FridgePal project";
    const COPY: &str = "```json\n{\"meta\": {\"title\": \"FridgePal\"}, \"sections\": {\"hero\": {\"headline\": \"FridgePal\"}},}\n```";

    /// Replays canned responses in order and records every call.
    struct ScriptedModel {
        responses: RefCell<VecDeque<Result<String, UpstreamError>>>,
        calls: RefCell<Vec<(String, String)>>,
    }

    impl ScriptedModel {
        fn new(responses: Vec<Result<String, UpstreamError>>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn replying(texts: &[&str]) -> Self {
            Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
        }

        fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl Completion for ScriptedModel {
        fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String, UpstreamError> {
            self.calls
                .borrow_mut()
                .push((system_prompt.to_string(), user_message.to_string()));
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(UpstreamError::UnexpectedContent("script exhausted".to_string())))
        }
    }

    fn with_pipeline<T>(model: &ScriptedModel, run: impl FnOnce(&Pipeline<'_, ScriptedModel>) -> T) -> T {
        let dir = tempfile::tempdir().unwrap();
        let rules = RulesCache::new(dir.path(), None);
        let pipeline = Pipeline::new(model, &rules, 1000);
        run(&pipeline)
    }

    #[test]
    fn generates_a_validated_page() {
        let plan = r#"Here is the layout:
{"route": "/fridgepal", "components": [
  {"type": "hero", "props": {"content": {"heading": "FridgePal", "subheading": "Smart groceries"}}, "from": "sections.hero"},
  {"type": "separator", "props": {}},
  {"type": "testimonial", "props": {"text": "Ships fast.", "name": "PM"}}
]}"#;
        let model = ScriptedModel::replying(&[COPY, plan]);
        let spec = with_pipeline(&model, |p| p.generate(BRIEF, Some("playful"))).unwrap();

        let kinds: Vec<_> = spec.blocks().iter().map(|b| b.kind()).collect();
        assert_eq!(
            kinds,
            vec![ComponentKind::Hero, ComponentKind::Separator, ComponentKind::Testimonial]
        );

        let calls = model.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].1, format!("Brief: {BRIEF}\n\nStyle: playful"));
        assert!(calls[1].0.contains("## Component Catalog"));
        assert!(calls[1].1.contains("\"headline\": \"FridgePal\""));
    }

    #[test]
    fn empty_and_oversized_input_never_reach_the_model() {
        let model = ScriptedModel::replying(&[]);
        let err = with_pipeline(&model, |p| p.generate("   ", None)).unwrap_err();
        assert!(matches!(err, PipelineError::Input(InputError::Empty)));

        let long = format!("Charles {}", "x".repeat(1000));
        let err = with_pipeline(&model, |p| p.generate(&long, None)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Input(InputError::TooLong { max: 1000, actual: 1008 })
        ));
        assert_eq!(model.call_count(), 0);
    }

    #[test]
    fn off_topic_briefs_are_filtered_before_any_call() {
        let model = ScriptedModel::replying(&[]);
        let err = with_pipeline(&model, |p| p.generate("What is the weather today?", None)).unwrap_err();
        assert!(matches!(err, PipelineError::FilteredOut { .. }));
        assert_eq!(err.user_message(), DECLINE_MESSAGE);
        assert_eq!(model.call_count(), 0);
    }

    #[test]
    fn copywriter_sentinel_stops_the_pipeline() {
        let model = ScriptedModel::replying(&[r#"{"error": "OUT_OF_SCOPE", "message": "Portfolio topics only."}"#]);
        let err = with_pipeline(&model, |p| p.generate(BRIEF, None)).unwrap_err();
        assert_eq!(err.user_message(), "Portfolio topics only.");
        assert_eq!(model.call_count(), 1);
    }

    #[test]
    fn orchestrator_sentinel_is_a_decline_not_a_bad_plan() {
        let model = ScriptedModel::replying(&[COPY, r#"{"error": "OUT_OF_SCOPE"}"#]);
        let err = with_pipeline(&model, |p| p.generate(BRIEF, None)).unwrap_err();
        assert!(matches!(err, PipelineError::OutOfScope { message: None }));
        assert_eq!(err.user_message(), DECLINE_MESSAGE);
    }

    #[test]
    fn non_object_copy_is_an_upstream_failure() {
        let model = ScriptedModel::replying(&[r#"["just", "a", "list"]"#]);
        let err = with_pipeline(&model, |p| p.generate(BRIEF, None)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Upstream(UpstreamError::UnexpectedShape { stage: "copywriter", .. })
        ));
        assert_eq!(model.call_count(), 1);
    }

    #[test]
    fn unparseable_plan_is_a_parse_error() {
        let model = ScriptedModel::replying(&[COPY, "I could not come up with a layout."]);
        let err = with_pipeline(&model, |p| p.generate(BRIEF, None)).unwrap_err();
        assert!(matches!(err, PipelineError::Parse(_)));
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn short_feature_grid_fails_validation() {
        let plan = r#"{"blocks": [{"type": "feature-grid", "props": {"title": "Work", "items": [
            {"label": "A", "description": "a"},
            {"label": "B", "description": "b"},
            {"label": "C"}
        ]}}]}"#;
        let model = ScriptedModel::replying(&[COPY, plan]);
        let err = with_pipeline(&model, |p| p.generate(BRIEF, None)).unwrap_err();
        match err {
            PipelineError::Validation(invalid) => {
                assert!(invalid.paths().any(|path| path == "blocks[0].props.items"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn upstream_failures_propagate() {
        let model = ScriptedModel::new(vec![Err(UpstreamError::Status {
            status: 500,
            body: "boom".to_string(),
        })]);
        let err = with_pipeline(&model, |p| p.generate(BRIEF, None)).unwrap_err();
        assert!(matches!(err, PipelineError::Upstream(UpstreamError::Status { status: 500, .. })));
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn answers_relevant_questions_with_one_call() {
        let model = ScriptedModel::replying(&["  He is based in Richmond, VA.\n"]);
        let answer = with_pipeline(&model, |p| p.answer("Where is Charles based?")).unwrap();
        assert_eq!(
            answer,
            Answer {
                text: "He is based in Richmond, VA.".to_string(),
                filtered: false,
            }
        );
        assert_eq!(model.calls.borrow()[0].1, "Where is Charles based?");
    }

    #[test]
    fn filtered_questions_get_the_canned_decline() {
        let model = ScriptedModel::replying(&[]);
        let answer = with_pipeline(&model, |p| p.answer("Who won the game last night?")).unwrap();
        assert!(answer.filtered);
        assert_eq!(answer.text, DECLINE_MESSAGE);
        assert_eq!(model.call_count(), 0);
    }

    #[test]
    fn offline_validation_of_saved_output() {
        let spec = page_from_model_output(
            "```json\n{\"blocks\": [{\"type\": \"button\", \"props\": {\"label\": \"Contact\"}},]}\n```",
        ).unwrap();
        assert_eq!(spec.blocks().len(), 1);
        assert_eq!(spec.blocks()[0].kind(), ComponentKind::Button);

        let err = page_from_model_output(r#"{"components": [{"type": "CustomWidget", "props": {}}]}"#).unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }
}
