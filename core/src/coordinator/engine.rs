use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::error::RunError;
use crate::events::{EventBroadcaster, ExecutionEvent};
use crate::execution::{HostExecutor, MergeOutcome};
use crate::pipeline::{AgentPipeline, PlannerPlugin};
use crate::policy::{PolicyConfig, PolicyGate, PolicyInput};
use crate::scheduler::{Task, TaskGraph};
use crate::util::repo_slug;

use super::types::{DirectOutcome, ExecutionOpts, PrSummary, RunOutcome, TaskResult};

/// Top-level control flow: plan, schedule, then pipeline → policy →
/// execution per task in dependency order.
///
/// Runs share no mutable state beyond the broadcaster; distinct objectives
/// may run concurrently. Within a run, tasks execute sequentially unless
/// `max_parallel` raises the per-stage concurrency; a task never starts
/// before its whole dependency stage has finished.
#[derive(Clone)]
pub struct RunCoordinator {
    planner: Arc<dyn PlannerPlugin>,
    pipeline: AgentPipeline,
    executor: HostExecutor,
    policy: PolicyConfig,
    broadcaster: EventBroadcaster,
    default_max_parallel: usize,
}

impl RunCoordinator {
    pub fn new(
        planner: Arc<dyn PlannerPlugin>,
        pipeline: AgentPipeline,
        executor: HostExecutor,
        policy: PolicyConfig,
        broadcaster: EventBroadcaster,
        default_max_parallel: usize,
    ) -> Self {
        Self {
            planner,
            pipeline,
            executor,
            policy,
            broadcaster,
            default_max_parallel: default_max_parallel.max(1),
        }
    }

    /// Full run: plan the objective and drive every task to a terminal
    /// state. Only graph-level or host-connectivity failures abort; blocked
    /// tasks are reported in the outcome and the run continues.
    pub async fn run(
        &self,
        objective: &str,
        constraints: Option<&Value>,
        opts: &ExecutionOpts,
    ) -> Result<RunOutcome, RunError> {
        let run_id = Uuid::new_v4();
        tracing::info!(run_id = %run_id, objective, "starting multi-agent run");

        let plan = self
            .planner
            .plan(objective, constraints)
            .await
            .map_err(|e| RunError::capability("planner", e))?;

        // Scheduling happens before any host call: a cycle aborts the run
        // with zero host mutations.
        let graph = TaskGraph::from_tasks(&plan)?;
        let stages = graph.stages()?;
        tracing::info!(
            run_id = %run_id,
            tasks = plan.len(),
            stages = stages.len(),
            "plan scheduled"
        );

        let repo = self
            .executor
            .ensure_repo(&repo_slug(objective), objective, opts.enable_pages)
            .await?;
        self.executor.protect_main_branch(&repo.name).await?;

        let max_parallel = opts.max_parallel.unwrap_or(self.default_max_parallel).max(1);
        let mut tasks: Vec<TaskResult> = Vec::with_capacity(plan.len());

        for stage in &stages {
            if max_parallel <= 1 || stage.len() <= 1 {
                for id in stage {
                    let task = &graph.nodes[id];
                    tasks.push(self.process_task(objective, task, &repo.name, opts).await?);
                }
            } else {
                tasks.extend(
                    self.process_stage(objective, stage, &graph, &repo.name, opts, max_parallel)
                        .await?,
                );
            }
        }

        tracing::info!(run_id = %run_id, tasks = tasks.len(), "run complete");
        Ok(RunOutcome {
            repo: repo.name,
            live_url: repo.live_url,
            plan,
            tasks,
        })
    }

    /// Direct path: caller supplies the task list; planning, verification
    /// and the policy gate are bypassed and one PR is opened per task.
    pub async fn run_direct(
        &self,
        objective: &str,
        supplied: &[Task],
        opts: &ExecutionOpts,
    ) -> Result<DirectOutcome, RunError> {
        let graph = TaskGraph::from_tasks(supplied)?;
        let order = graph.schedule()?;

        let repo = self
            .executor
            .ensure_repo(&repo_slug(objective), objective, opts.enable_pages)
            .await?;
        self.executor.protect_main_branch(&repo.name).await?;

        let base = self.executor.default_branch().to_string();
        let mut prs = Vec::with_capacity(order.len());

        for id in &order {
            let task = &graph.nodes[id];
            let patch = self.pipeline.code(objective, task).await?;

            self.executor
                .ensure_branch_from(&repo.name, &base, &patch.branch)
                .await?;
            self.executor
                .push_patch(&repo.name, &patch.branch, &patch, &[])
                .await?;
            let pr = self
                .executor
                .open_pull_request(
                    &repo.name,
                    &patch.branch,
                    &base,
                    &patch.pr.title,
                    &patch.pr.body,
                )
                .await?;

            self.emit_pr_update(&repo.name, pr.number, &pr.head_sha, "open", false)
                .await;

            prs.push(PrSummary {
                task_id: task.id.clone(),
                branch: patch.branch,
                pr_number: pr.number,
                pr_url: pr.html_url,
            });
        }

        Ok(DirectOutcome {
            repo: repo.name,
            live_url: repo.live_url,
            prs,
        })
    }

    async fn process_stage(
        &self,
        objective: &str,
        stage: &[String],
        graph: &TaskGraph<Task>,
        repo: &str,
        opts: &ExecutionOpts,
        max_parallel: usize,
    ) -> Result<Vec<TaskResult>, RunError> {
        let sem = Arc::new(Semaphore::new(max_parallel));
        let mut futs: FuturesUnordered<_> = FuturesUnordered::new();

        for id in stage {
            let task = &graph.nodes[id];
            let sem = sem.clone();
            futs.push(async move {
                let _permit = sem
                    .acquire_owned()
                    .await
                    .map_err(|_| RunError::Config("semaphore closed unexpectedly".into()))?;
                self.process_task(objective, task, repo, opts).await
            });
        }

        let mut by_id: HashMap<String, TaskResult> = HashMap::new();
        while let Some(res) = futs.next().await {
            let result = res?;
            by_id.insert(result.task_id().to_string(), result);
        }

        // Report results in stage emission order regardless of completion
        // order.
        Ok(stage
            .iter()
            .map(|id| by_id.remove(id).expect("stage task produced a result"))
            .collect())
    }

    /// One task through the per-task state machine:
    /// pipeline → verified | blocked → policy → approved | blocked_by_policy
    /// → execution → pr_opened (merged | merge skipped).
    async fn process_task(
        &self,
        objective: &str,
        task: &Task,
        repo: &str,
        opts: &ExecutionOpts,
    ) -> Result<TaskResult, RunError> {
        let (patch, verdict) = self.pipeline.run(objective, task).await?;

        if !verdict.is_pass() {
            tracing::warn!(task_id = task.id.as_str(), "verification failed; task blocked");
            return Ok(TaskResult::Blocked {
                task_id: task.id.clone(),
                verdict,
            });
        }

        let mut touched: BTreeSet<&str> = patch.touched_paths();
        for test in &verdict.test_files {
            touched.insert(test.path.as_str());
        }

        let decision = PolicyGate::evaluate(
            &self.policy,
            &PolicyInput {
                verdict: &verdict,
                ci_conclusion: opts.ci_conclusion(),
                changed_files: touched.len(),
                budget: opts.budget(),
            },
        );

        if !decision.allow_merge {
            tracing::warn!(
                task_id = task.id.as_str(),
                risk = ?decision.risk_level,
                "policy gate denied integration"
            );
            return Ok(TaskResult::BlockedByPolicy {
                task_id: task.id.clone(),
                decision,
            });
        }

        let base = self.executor.default_branch().to_string();
        self.executor
            .ensure_branch_from(repo, &base, &patch.branch)
            .await?;
        self.executor
            .push_patch(repo, &patch.branch, &patch, &verdict.test_files)
            .await?;
        let pr = self
            .executor
            .open_pull_request(repo, &patch.branch, &base, &patch.pr.title, &patch.pr.body)
            .await?;

        self.emit_pr_update(repo, pr.number, &pr.head_sha, "open", false)
            .await;

        let merge = if opts.auto_merge {
            let outcome = self.executor.merge_if_green(repo, pr.number).await?;
            if outcome.merged {
                self.emit_pr_update(repo, pr.number, &pr.head_sha, "closed", true)
                    .await;
            }
            outcome
        } else {
            MergeOutcome::skipped("auto-merge disabled")
        };

        Ok(TaskResult::PrOpened {
            task_id: task.id.clone(),
            branch: patch.branch,
            pr_number: pr.number,
            pr_url: pr.html_url,
            decision,
            merge,
        })
    }

    async fn emit_pr_update(
        &self,
        repo: &str,
        pr_number: u64,
        sha: &str,
        state: &str,
        merged: bool,
    ) {
        self.broadcaster
            .emit(ExecutionEvent::PrUpdate {
                repo: repo.to_string(),
                pr_number,
                sha: sha.to_string(),
                state: state.to_string(),
                merged,
            })
            .await;
    }
}
