//! Pipeline execution engine
//!
//! Runs a pipeline definition against the provider gateway one step at a time.
//! A run goes through these phases:
//!
//! 1. Definition checks (step numbering, output variables, shadowing)
//! 2. Template preload: every referenced template is resolved up front so a
//!    missing one aborts the run before any provider is called
//! 3. Sequential steps: render against the binding environment, invoke the
//!    gateway, bind the output for later steps
//! 4. Status derivation and persistence
//!
//! The first failing step ends the run. Steps after it are left `pending` in
//! the persisted record.

use promptlab_core::domain::execution::{
    ExecutionStatus, PipelineExecution, StepExecution, TemplateExecution,
};
use promptlab_core::domain::pipeline::{DefinitionError, Pipeline};
use promptlab_core::domain::provider::ProviderInfo;
use promptlab_core::placeholder;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::observer::{ExecutionObserver, NoopObserver};
use crate::provider::{ProviderError, ProviderGateway};
use crate::store::{ExecutionStore, StoreError, TemplateSnapshot, TemplateStore};

/// Stateless orchestrator over the template store, gateway and execution store
///
/// Cheap to share: wrap it in an `Arc` and call it from any number of tasks.
pub struct PipelineEngine {
    templates: Arc<dyn TemplateStore>,
    gateway: Arc<dyn ProviderGateway>,
    executions: Arc<dyn ExecutionStore>,
    observer: Arc<dyn ExecutionObserver>,
    config: EngineConfig,
}

/// What a single step needs besides its record
struct StepCall<'a> {
    content: &'a str,
    provider: &'a str,
    model: &'a str,
}

impl PipelineEngine {
    pub fn new(
        templates: Arc<dyn TemplateStore>,
        gateway: Arc<dyn ProviderGateway>,
        executions: Arc<dyn ExecutionStore>,
    ) -> Self {
        Self {
            templates,
            gateway,
            executions,
            observer: Arc::new(NoopObserver),
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Providers the gateway can route to
    pub fn providers(&self) -> Vec<ProviderInfo> {
        self.gateway.list_providers()
    }

    /// Run a pipeline to completion and persist the record
    ///
    /// Returns `Ok` for every run that got past the definition checks, whether
    /// it completed or failed; inspect `status` on the record.
    pub async fn execute(
        &self,
        pipeline: &Pipeline,
        inputs: HashMap<String, String>,
    ) -> Result<PipelineExecution, EngineError> {
        self.execute_with_cancel(pipeline, inputs, &CancellationToken::new())
            .await
    }

    /// Like [`PipelineEngine::execute`], failing the in-flight step when
    /// `cancel` fires
    pub async fn execute_with_cancel(
        &self,
        pipeline: &Pipeline,
        inputs: HashMap<String, String>,
        cancel: &CancellationToken,
    ) -> Result<PipelineExecution, EngineError> {
        pipeline.validate_for_inputs(&inputs)?;
        let templates = self.load_templates(pipeline).await?;

        let mut execution = PipelineExecution::new(pipeline, inputs);
        let execution_id = execution.id;
        let mut bindings = execution.variables.clone();

        tracing::info!(
            "Starting execution {} of pipeline {} ({} steps)",
            execution_id,
            pipeline.id,
            pipeline.steps.len()
        );

        for (step, record) in pipeline.steps.iter().zip(execution.step_executions.iter_mut()) {
            let template = templates
                .get(&step.template_id)
                .ok_or(DefinitionError::TemplateNotFound(step.template_id))?;

            let call = StepCall {
                content: &template.content,
                provider: &step.provider,
                model: &step.model,
            };
            self.run_step(execution_id, record, &call, &bindings, cancel)
                .await?;

            match (&record.status, &record.output) {
                (ExecutionStatus::Completed, Some(output)) => {
                    bindings.insert(step.output_variable.clone(), output.clone());
                }
                _ => break,
            }
        }

        execution.finish();

        tracing::info!(
            "Execution {} of pipeline {} finished: {}",
            execution_id,
            pipeline.id,
            execution.status
        );

        self.executions.save(&execution).await.map_err(|e| {
            tracing::error!("Failed to persist execution {}: {}", execution_id, e);
            EngineError::Persistence(e)
        })?;

        Ok(execution)
    }

    /// Run one template as a single-step execution and persist the record
    pub async fn execute_template(
        &self,
        template_id: Uuid,
        provider: &str,
        model: &str,
        variables: HashMap<String, String>,
    ) -> Result<TemplateExecution, EngineError> {
        self.execute_template_with_cancel(
            template_id,
            provider,
            model,
            variables,
            &CancellationToken::new(),
        )
        .await
    }

    pub async fn execute_template_with_cancel(
        &self,
        template_id: Uuid,
        provider: &str,
        model: &str,
        variables: HashMap<String, String>,
        cancel: &CancellationToken,
    ) -> Result<TemplateExecution, EngineError> {
        let template = self.load_template(template_id).await?;

        let mut execution = TemplateExecution {
            id: Uuid::new_v4(),
            template_id,
            template_name: template.name.clone(),
            template_version: template.version_number,
            provider: provider.to_string(),
            model: model.to_string(),
            variables,
            input_prompt: None,
            output: None,
            error: None,
            status: ExecutionStatus::Pending,
            created_at: chrono::Utc::now(),
            completed_at: None,
        };

        tracing::info!(
            "Starting execution {} of template {} (v{}) on {}/{}",
            execution.id,
            template_id,
            template.version_number,
            provider,
            model
        );

        let mut record = StepExecution::new(1, template_id);
        let call = StepCall {
            content: &template.content,
            provider,
            model,
        };
        self.run_step(execution.id, &mut record, &call, &execution.variables, cancel)
            .await?;
        execution.settle(record);

        tracing::info!(
            "Execution {} of template {} finished: {}",
            execution.id,
            template_id,
            execution.status
        );

        self.executions
            .save_template_execution(&execution)
            .await
            .map_err(|e| {
                tracing::error!("Failed to persist execution {}: {}", execution.id, e);
                EngineError::Persistence(e)
            })?;

        Ok(execution)
    }

    // =========================================================================
    // Steps
    // =========================================================================

    /// Drive one step record from `pending` to a terminal state
    ///
    /// Render and provider failures are recorded on the step; only an illegal
    /// status transition is returned as an error.
    async fn run_step(
        &self,
        execution_id: Uuid,
        record: &mut StepExecution,
        call: &StepCall<'_>,
        bindings: &HashMap<String, String>,
        cancel: &CancellationToken,
    ) -> Result<(), EngineError> {
        record.start()?;
        self.observer.on_step(execution_id, record);
        tracing::debug!("Execution {}: step {} running", execution_id, record.step_order);

        let prompt = match placeholder::render(call.content, bindings) {
            Ok(prompt) => prompt,
            Err(e) => return self.fail_step(execution_id, record, e.to_string()),
        };

        tracing::debug!(
            "Execution {}: step {} prompt: {}",
            execution_id,
            record.step_order,
            prompt
        );
        record.input_prompt = Some(prompt.clone());

        match self
            .call_provider(call.provider, call.model, &prompt, cancel)
            .await
        {
            Ok(output) => {
                record.complete(output)?;
                self.observer.on_step(execution_id, record);
                tracing::debug!(
                    "Execution {}: step {} completed",
                    execution_id,
                    record.step_order
                );
                Ok(())
            }
            Err(e) => self.fail_step(execution_id, record, e.to_string()),
        }
    }

    fn fail_step(
        &self,
        execution_id: Uuid,
        record: &mut StepExecution,
        error: String,
    ) -> Result<(), EngineError> {
        tracing::warn!(
            "Execution {}: step {} failed: {}",
            execution_id,
            record.step_order,
            error
        );
        record.fail(error)?;
        self.observer.on_step(execution_id, record);
        Ok(())
    }

    /// One gateway call bounded by the step timeout and the cancel token
    async fn call_provider(
        &self,
        provider: &str,
        model: &str,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ProviderError> {
        let timeout = self.config.step_timeout;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProviderError::Cancelled),
            result = tokio::time::timeout(timeout, self.gateway.invoke(provider, model, prompt)) => {
                result.unwrap_or(Err(ProviderError::Timeout(timeout)))
            }
        }
    }

    // =========================================================================
    // Templates
    // =========================================================================

    async fn load_templates(
        &self,
        pipeline: &Pipeline,
    ) -> Result<HashMap<Uuid, TemplateSnapshot>, EngineError> {
        let mut templates = HashMap::new();
        for template_id in pipeline.template_ids() {
            let snapshot = self.load_template(template_id).await?;
            templates.insert(template_id, snapshot);
        }
        Ok(templates)
    }

    async fn load_template(&self, template_id: Uuid) -> Result<TemplateSnapshot, EngineError> {
        self.templates
            .latest_content(template_id)
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => {
                    DefinitionError::TemplateNotFound(template_id).into()
                }
                other => EngineError::TemplateStore(other),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{MockProvider, ProviderRegistry};
    use crate::store::{InMemoryExecutionStore, InMemoryTemplateStore};
    use async_trait::async_trait;
    use chrono::Utc;
    use promptlab_core::domain::pipeline::PipelineStep;
    use promptlab_core::dto::Pagination;
    use std::sync::Mutex;
    use std::time::Duration;

    type Reply = Box<dyn Fn(&str) -> Result<String, ProviderError> + Send + Sync>;

    /// Gateway that answers from a closure and records every prompt
    struct ScriptedGateway {
        reply: Reply,
        delay: Option<Duration>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedGateway {
        fn new(reply: impl Fn(&str) -> Result<String, ProviderError> + Send + Sync + 'static) -> Self {
            Self {
                reply: Box::new(reply),
                delay: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProviderGateway for ScriptedGateway {
        async fn invoke(
            &self,
            _provider: &str,
            _model: &str,
            prompt: &str,
        ) -> Result<String, ProviderError> {
            self.calls.lock().unwrap().push(prompt.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            (self.reply)(prompt)
        }

        fn list_providers(&self) -> Vec<ProviderInfo> {
            vec![ProviderInfo {
                name: "scripted".to_string(),
                models: vec!["m".to_string()],
            }]
        }
    }

    /// Observer that keeps every event
    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<(u32, ExecutionStatus)>>,
    }

    impl ExecutionObserver for Recorder {
        fn on_step(&self, _execution_id: Uuid, step: &StepExecution) {
            self.events
                .lock()
                .unwrap()
                .push((step.step_order, step.status));
        }
    }

    /// Observer that fires a token once a given step completes
    struct CancelAfter {
        step_order: u32,
        token: CancellationToken,
    }

    impl ExecutionObserver for CancelAfter {
        fn on_step(&self, _execution_id: Uuid, step: &StepExecution) {
            if step.step_order == self.step_order && step.status == ExecutionStatus::Completed {
                self.token.cancel();
            }
        }
    }

    /// Execution store whose backend is down
    struct UnavailableStore;

    #[derive(Debug, thiserror::Error)]
    #[error("connection refused")]
    struct Refused;

    #[async_trait]
    impl ExecutionStore for UnavailableStore {
        async fn save(&self, _execution: &PipelineExecution) -> Result<Uuid, StoreError> {
            Err(StoreError::backend(Refused))
        }

        async fn get(&self, _id: Uuid) -> Result<PipelineExecution, StoreError> {
            Err(StoreError::backend(Refused))
        }

        async fn list(
            &self,
            _pipeline_id: Option<Uuid>,
            _page: Pagination,
        ) -> Result<Vec<PipelineExecution>, StoreError> {
            Err(StoreError::backend(Refused))
        }

        async fn save_template_execution(
            &self,
            _execution: &TemplateExecution,
        ) -> Result<Uuid, StoreError> {
            Err(StoreError::backend(Refused))
        }

        async fn get_template_execution(&self, _id: Uuid) -> Result<TemplateExecution, StoreError> {
            Err(StoreError::backend(Refused))
        }

        async fn list_template_executions(
            &self,
            _page: Pagination,
        ) -> Result<Vec<TemplateExecution>, StoreError> {
            Err(StoreError::backend(Refused))
        }
    }

    struct Fixture {
        templates: Arc<InMemoryTemplateStore>,
        executions: Arc<InMemoryExecutionStore>,
        gateway: Arc<ScriptedGateway>,
    }

    impl Fixture {
        fn new(gateway: ScriptedGateway) -> Self {
            Self {
                templates: Arc::new(InMemoryTemplateStore::new()),
                executions: Arc::new(InMemoryExecutionStore::new()),
                gateway: Arc::new(gateway),
            }
        }

        fn engine(&self) -> PipelineEngine {
            PipelineEngine::new(
                self.templates.clone(),
                self.gateway.clone(),
                self.executions.clone(),
            )
        }

        fn template(&self, content: &str) -> Uuid {
            self.templates.insert("t", content).unwrap()
        }
    }

    fn pipeline(steps: &[(Uuid, &str)]) -> Pipeline {
        Pipeline {
            id: Uuid::new_v4(),
            name: "pipeline".to_string(),
            description: None,
            steps: steps
                .iter()
                .enumerate()
                .map(|(i, (template_id, output))| PipelineStep {
                    order: i as u32 + 1,
                    template_id: *template_id,
                    provider: "scripted".to_string(),
                    model: "m".to_string(),
                    output_variable: output.to_string(),
                })
                .collect(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn translate_then_summarize(fixture: &Fixture) -> Pipeline {
        let translate = fixture.template("Translate to English: {{text}}");
        let summarize = fixture.template("Summarize in one sentence: {{english_text}}");
        pipeline(&[(translate, "english_text"), (summarize, "summary")])
    }

    #[tokio::test]
    async fn test_translate_then_summarize() {
        let fixture = Fixture::new(ScriptedGateway::new(|prompt| {
            if prompt.starts_with("Translate") {
                Ok("Hello world".to_string())
            } else {
                Ok("A greeting to the world.".to_string())
            }
        }));
        let p = translate_then_summarize(&fixture);

        let execution = fixture
            .engine()
            .execute(&p, vars(&[("text", "Bonjour le monde")]))
            .await
            .unwrap();

        assert_eq!(execution.status, ExecutionStatus::Completed);
        assert!(execution.completed_at.is_some());
        assert_eq!(execution.step_executions.len(), 2);
        assert!(
            execution
                .step_executions
                .iter()
                .all(|s| s.status == ExecutionStatus::Completed)
        );

        let first = &execution.step_executions[0];
        let second = &execution.step_executions[1];
        assert_eq!((first.step_order, second.step_order), (1, 2));
        assert!(first.input_prompt.as_deref().unwrap().contains("Bonjour le monde"));
        assert_eq!(first.output.as_deref(), Some("Hello world"));
        assert_eq!(
            second.input_prompt.as_deref(),
            Some("Summarize in one sentence: Hello world")
        );
        assert_eq!(second.output.as_deref(), Some("A greeting to the world."));

        // Inputs are snapshotted without the step outputs
        assert_eq!(execution.variables, vars(&[("text", "Bonjour le monde")]));

        let saved = fixture.executions.get(execution.id).await.unwrap();
        assert_eq!(saved.status, ExecutionStatus::Completed);
    }

    #[tokio::test]
    async fn test_provider_failure_leaves_later_steps_pending() {
        let fixture = Fixture::new(ScriptedGateway::new(|_| {
            Err(ProviderError::Api {
                provider: "scripted".to_string(),
                status: 500,
                message: "upstream exploded".to_string(),
            })
        }));
        let p = translate_then_summarize(&fixture);

        let execution = fixture
            .engine()
            .execute(&p, vars(&[("text", "Bonjour le monde")]))
            .await
            .unwrap();

        assert_eq!(execution.status, ExecutionStatus::Failed);

        let first = &execution.step_executions[0];
        assert_eq!(first.status, ExecutionStatus::Failed);
        assert!(first.error.as_deref().unwrap().contains("upstream exploded"));
        assert!(first.input_prompt.is_some());

        let second = &execution.step_executions[1];
        assert_eq!(second.status, ExecutionStatus::Pending);
        assert!(second.input_prompt.is_none());
        assert!(second.started_at.is_none());

        assert_eq!(fixture.gateway.calls().len(), 1);
        assert_eq!(fixture.executions.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_in_middle_keeps_earlier_outputs() {
        let fixture = Fixture::new(ScriptedGateway::new(|prompt| {
            if prompt.starts_with("two") {
                Err(ProviderError::InvalidResponse("empty".to_string()))
            } else {
                Ok(format!("out({})", prompt))
            }
        }));
        let a = fixture.template("one {{x}}");
        let b = fixture.template("two {{a}}");
        let c = fixture.template("three {{b}}");
        let p = pipeline(&[(a, "a"), (b, "b"), (c, "c")]);

        let execution = fixture
            .engine()
            .execute(&p, vars(&[("x", "1")]))
            .await
            .unwrap();

        let statuses: Vec<_> = execution.step_executions.iter().map(|s| s.status).collect();
        assert_eq!(
            statuses,
            vec![
                ExecutionStatus::Completed,
                ExecutionStatus::Failed,
                ExecutionStatus::Pending
            ]
        );
        assert_eq!(
            execution.step_executions[0].output.as_deref(),
            Some("out(one 1)")
        );
        assert_eq!(
            execution.step_executions[1].input_prompt.as_deref(),
            Some("two out(one 1)")
        );
        assert_eq!(execution.failed_step().map(|s| s.step_order), Some(2));
    }

    #[tokio::test]
    async fn test_unbound_variable_fails_step_without_provider_call() {
        let fixture = Fixture::new(ScriptedGateway::new(|_| Ok("never".to_string())));
        let a = fixture.template("Needs {{missing}}");
        let b = fixture.template("Then {{a}}");
        let p = pipeline(&[(a, "a"), (b, "b")]);

        let execution = fixture.engine().execute(&p, HashMap::new()).await.unwrap();

        assert_eq!(execution.status, ExecutionStatus::Failed);
        let first = &execution.step_executions[0];
        assert_eq!(first.error.as_deref(), Some("Missing variable: missing"));
        assert!(first.input_prompt.is_none());
        assert_eq!(execution.step_executions[1].status, ExecutionStatus::Pending);
        assert!(fixture.gateway.calls().is_empty());
        assert_eq!(fixture.executions.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_output_variable_makes_no_calls() {
        let fixture = Fixture::new(ScriptedGateway::new(|_| Ok("x".to_string())));
        let a = fixture.template("{{text}}");
        let b = fixture.template("{{text}} again");
        let p = pipeline(&[(a, "out"), (b, "out")]);

        let err = fixture
            .engine()
            .execute(&p, vars(&[("text", "hi")]))
            .await
            .unwrap_err();

        assert!(err.is_definition_error());
        assert!(matches!(
            err,
            EngineError::Definition(DefinitionError::DuplicateOutputVariable(ref name)) if name == "out"
        ));
        assert!(fixture.gateway.calls().is_empty());
        assert!(fixture.executions.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_template_aborts_before_any_call() {
        let fixture = Fixture::new(ScriptedGateway::new(|_| Ok("x".to_string())));
        let known = fixture.template("{{text}}");
        let unknown = Uuid::new_v4();
        let p = pipeline(&[(known, "a"), (unknown, "b")]);

        let err = fixture
            .engine()
            .execute(&p, vars(&[("text", "hi")]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::Definition(DefinitionError::TemplateNotFound(id)) if id == unknown
        ));
        assert!(fixture.gateway.calls().is_empty());
        assert!(fixture.executions.is_empty());
    }

    #[tokio::test]
    async fn test_output_shadowing_input_is_rejected() {
        let fixture = Fixture::new(ScriptedGateway::new(|_| Ok("x".to_string())));
        let a = fixture.template("{{text}}");
        let p = pipeline(&[(a, "text")]);

        let err = fixture
            .engine()
            .execute(&p, vars(&[("text", "hi")]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::Definition(DefinitionError::ShadowedVariable(_))
        ));
        assert!(fixture.gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_timeout_fails_step() {
        let fixture = Fixture::new(
            ScriptedGateway::new(|_| Ok("late".to_string())).with_delay(Duration::from_secs(5)),
        );
        let a = fixture.template("slow {{x}}");
        let b = fixture.template("after {{a}}");
        let p = pipeline(&[(a, "a"), (b, "b")]);

        let engine = fixture
            .engine()
            .with_config(EngineConfig::new().with_step_timeout(Duration::from_millis(20)));
        let execution = engine.execute(&p, vars(&[("x", "1")])).await.unwrap();

        assert_eq!(execution.status, ExecutionStatus::Failed);
        let first = &execution.step_executions[0];
        assert_eq!(first.error.as_deref(), Some("provider call timed out after 20ms"));
        assert_eq!(first.input_prompt.as_deref(), Some("slow 1"));
        assert_eq!(execution.step_executions[1].status, ExecutionStatus::Pending);
        assert_eq!(fixture.executions.len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_persists_partial_progress() {
        let fixture = Fixture::new(
            ScriptedGateway::new(|prompt| Ok(format!("done: {}", prompt)))
                .with_delay(Duration::from_millis(50)),
        );
        let a = fixture.template("first {{x}}");
        let b = fixture.template("second {{a}}");
        let p = pipeline(&[(a, "a"), (b, "b")]);

        let token = CancellationToken::new();
        let engine = fixture.engine().with_observer(Arc::new(CancelAfter {
            step_order: 1,
            token: token.clone(),
        }));

        let execution = engine
            .execute_with_cancel(&p, vars(&[("x", "1")]), &token)
            .await
            .unwrap();

        assert_eq!(execution.status, ExecutionStatus::Failed);
        assert_eq!(execution.step_executions[0].status, ExecutionStatus::Completed);
        assert_eq!(
            execution.step_executions[0].output.as_deref(),
            Some("done: first 1")
        );
        assert_eq!(
            execution.step_executions[1].error.as_deref(),
            Some("execution cancelled")
        );

        let saved = fixture.executions.get(execution.id).await.unwrap();
        assert_eq!(saved.step_executions[0].status, ExecutionStatus::Completed);
    }

    #[tokio::test]
    async fn test_observer_sees_every_transition() {
        let fixture = Fixture::new(ScriptedGateway::new(|prompt| {
            if prompt.starts_with("b") {
                Err(ProviderError::InvalidResponse("nope".to_string()))
            } else {
                Ok("ok".to_string())
            }
        }));
        let a = fixture.template("a");
        let b = fixture.template("b {{first}}");
        let c = fixture.template("c");
        let p = pipeline(&[(a, "first"), (b, "second"), (c, "third")]);

        let recorder = Arc::new(Recorder::default());
        fixture
            .engine()
            .with_observer(recorder.clone())
            .execute(&p, HashMap::new())
            .await
            .unwrap();

        let events = recorder.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                (1, ExecutionStatus::Running),
                (1, ExecutionStatus::Completed),
                (2, ExecutionStatus::Running),
                (2, ExecutionStatus::Failed),
            ]
        );
    }

    #[tokio::test]
    async fn test_persistence_failure_is_distinct() {
        let templates = Arc::new(InMemoryTemplateStore::new());
        let a = templates.insert("t", "hello").unwrap();
        let gateway = Arc::new(ScriptedGateway::new(|_| Ok("ok".to_string())));
        let engine = PipelineEngine::new(templates, gateway.clone(), Arc::new(UnavailableStore));

        let err = engine
            .execute(&pipeline(&[(a, "a")]), HashMap::new())
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Persistence(_)));
        assert!(!err.is_definition_error());
        // The run itself happened
        assert_eq!(gateway.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_runs_are_independent() {
        let fixture = Fixture::new(ScriptedGateway::new(|prompt| Ok(prompt.to_uppercase())));
        let a = fixture.template("{{who}}");
        let b = fixture.template("hi {{name}}");
        let p = pipeline(&[(a, "name"), (b, "greeting")]);
        let engine = fixture.engine();

        let (left, right) = tokio::join!(
            engine.execute(&p, vars(&[("who", "ann")])),
            engine.execute(&p, vars(&[("who", "bob")])),
        );

        assert_eq!(
            left.unwrap().step_executions[1].output.as_deref(),
            Some("HI ANN")
        );
        assert_eq!(
            right.unwrap().step_executions[1].output.as_deref(),
            Some("HI BOB")
        );
        assert_eq!(fixture.executions.len(), 2);
    }

    #[tokio::test]
    async fn test_execute_template_completes() {
        let fixture = Fixture::new(ScriptedGateway::new(|_| Ok("unused".to_string())));
        let template_id = fixture.template("Say hi to {{name}}");
        let engine = PipelineEngine::new(
            fixture.templates.clone(),
            Arc::new(ProviderRegistry::default().register(MockProvider::new())),
            fixture.executions.clone(),
        );

        let execution = engine
            .execute_template(template_id, "mock", "mock-model", vars(&[("name", "Ada")]))
            .await
            .unwrap();

        assert_eq!(execution.status, ExecutionStatus::Completed);
        assert_eq!(execution.template_version, 1);
        assert_eq!(execution.input_prompt.as_deref(), Some("Say hi to Ada"));
        assert_eq!(
            execution.output.as_deref(),
            Some("Mock response for: Say hi to Ada")
        );
        assert!(execution.completed_at.is_some());

        let saved = fixture
            .executions
            .get_template_execution(execution.id)
            .await
            .unwrap();
        assert_eq!(saved.template_name, "t");
    }

    #[tokio::test]
    async fn test_execute_template_failures_are_recorded() {
        let fixture = Fixture::new(ScriptedGateway::new(|_| Ok("unused".to_string())));
        let template_id = fixture.template("Say hi to {{name}}");
        let engine = PipelineEngine::new(
            fixture.templates.clone(),
            Arc::new(ProviderRegistry::default().register(MockProvider::new())),
            fixture.executions.clone(),
        );

        let unbound = engine
            .execute_template(template_id, "mock", "mock-model", HashMap::new())
            .await
            .unwrap();
        assert_eq!(unbound.status, ExecutionStatus::Failed);
        assert_eq!(unbound.error.as_deref(), Some("Missing variable: name"));

        let unknown_provider = engine
            .execute_template(template_id, "nope", "m", vars(&[("name", "Ada")]))
            .await
            .unwrap();
        assert_eq!(unknown_provider.status, ExecutionStatus::Failed);
        assert_eq!(unknown_provider.error.as_deref(), Some("Unknown provider: nope"));
        assert_eq!(unknown_provider.input_prompt.as_deref(), Some("Say hi to Ada"));

        let listed = fixture
            .executions
            .list_template_executions(Pagination::default())
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);
    }

    #[tokio::test]
    async fn test_execute_template_unknown_id() {
        let fixture = Fixture::new(ScriptedGateway::new(|_| Ok("x".to_string())));
        let err = fixture
            .engine()
            .execute_template(Uuid::new_v4(), "scripted", "m", HashMap::new())
            .await
            .unwrap_err();

        assert!(err.is_definition_error());
        assert!(fixture.gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_latest_template_version_is_used() {
        let fixture = Fixture::new(ScriptedGateway::new(|prompt| Ok(prompt.to_string())));
        let a = fixture.template("v1 {{x}}");
        fixture.templates.update(a, "v2 {{x}}").unwrap();

        let execution = fixture
            .engine()
            .execute(&pipeline(&[(a, "out")]), vars(&[("x", "1")]))
            .await
            .unwrap();

        assert_eq!(
            execution.step_executions[0].input_prompt.as_deref(),
            Some("v2 1")
        );
    }
}
