use anyhow::Result;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::info;
use wsx_domain::{coerce_parameters, default_run_name, RunParameters, WorkspacePath};

use super::WorkspaceClient;
use crate::core::error::{ensure_success, WorkspaceError};
use crate::core::transport::Transport;

const SUBMIT_ACTION: &str = "jobs/runs/submit";
const GET_ACTION: &str = "jobs/runs/get";
const LIST_ACTION: &str = "jobs/runs/list";

#[derive(Debug, Clone, Serialize)]
pub struct RunStatus {
    pub run_id: u64,
    pub job_id: u64,
    /// The `jobs/runs/list` body for the owning job, unmodified.
    pub runs: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub run_id: Option<u64>,
    pub run_name: Option<String>,
    pub life_cycle_state: Option<String>,
    pub result_state: Option<String>,
}

impl RunStatus {
    pub fn summaries(&self) -> Vec<RunSummary> {
        let Some(runs) = self.runs.get("runs").and_then(Value::as_array) else {
            return Vec::new();
        };
        runs.iter()
            .map(|run| {
                let state = run.get("state");
                let state_field = |key: &str| {
                    state
                        .and_then(|state| state.get(key))
                        .and_then(Value::as_str)
                        .map(ToOwned::to_owned)
                };
                RunSummary {
                    run_id: run.get("run_id").and_then(Value::as_u64),
                    run_name: run
                        .get("run_name")
                        .and_then(Value::as_str)
                        .map(ToOwned::to_owned),
                    life_cycle_state: state_field("life_cycle_state"),
                    result_state: state_field("result_state"),
                }
            })
            .collect()
    }
}

impl<T: Transport> WorkspaceClient<T> {
    /// Submits the notebook at `path` as a one-off run on the environment's
    /// execution cluster and returns the remote run id.
    ///
    /// Non-string parameter values are sent as their JSON text.
    ///
    /// # Errors
    /// Returns an error for an empty path, a missing cluster id, a transport
    /// failure, a rejected submission, or a response without `run_id`.
    pub fn submit(
        &self,
        path: &str,
        parameters: Option<RunParameters>,
        run_name: Option<&str>,
    ) -> Result<u64> {
        let path = WorkspacePath::parse(path).map_err(WorkspaceError::from)?;
        let cluster_id = self.environment.cluster_id();
        if cluster_id.is_empty() {
            return Err(WorkspaceError::MissingClusterId {
                environment: self.environment.kind(),
            }
            .into());
        }
        let run_name = match run_name {
            Some(name) => name.to_string(),
            None => default_run_name(&self.run_prefix, &path),
        };
        let base_parameters = parameters.map(coerce_parameters).unwrap_or_else(Map::new);
        let body = json!({
            "existing_cluster_id": cluster_id,
            "notebook_task": {
                "notebook_path": path.as_str(),
                "base_parameters": base_parameters,
            },
            "run_name": run_name,
        });
        let response = self.transport.post(SUBMIT_ACTION, &body)?;
        ensure_success(SUBMIT_ACTION, &response)?;
        let run_id = response
            .get("run_id")
            .and_then(Value::as_u64)
            .ok_or(WorkspaceError::MissingField {
                action: SUBMIT_ACTION,
                field: "run_id",
            })?;
        info!("running {} run_id: {run_id}", path.name());
        Ok(run_id)
    }

    /// Looks up the job owning `run_id`, then returns that job's run list.
    ///
    /// # Errors
    /// Returns an error for a transport failure, an error code in either
    /// response, or a run without `job_id`.
    pub fn status(&self, run_id: u64) -> Result<RunStatus> {
        let run = self.transport.get(GET_ACTION, &json!({ "run_id": run_id }))?;
        ensure_success(GET_ACTION, &run)?;
        let job_id = run
            .get("job_id")
            .and_then(Value::as_u64)
            .ok_or(WorkspaceError::MissingField {
                action: GET_ACTION,
                field: "job_id",
            })?;
        let runs = self.transport.get(LIST_ACTION, &json!({ "job_id": job_id }))?;
        ensure_success(LIST_ACTION, &runs)?;
        Ok(RunStatus {
            run_id,
            job_id,
            runs,
        })
    }
}
