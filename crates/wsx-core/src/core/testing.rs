//! In-memory transports for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};

use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use wsx_domain::{Environment, EnvironmentKind};

use crate::core::transport::Transport;
use crate::core::workspace::WorkspaceClient;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Call {
    pub method: &'static str,
    pub action: String,
    pub body: Value,
}

#[derive(Debug, Clone)]
enum FakeObject {
    Directory,
    File { content: String, file_type: String },
}

/// A tiny model of the remote workspace and jobs API.
pub(crate) struct FakeWorkspace {
    objects: RefCell<BTreeMap<String, FakeObject>>,
    runs: RefCell<BTreeMap<u64, Value>>,
    next_run_id: Cell<u64>,
    calls: RefCell<Vec<Call>>,
}

impl FakeWorkspace {
    pub fn new() -> Self {
        let mut objects = BTreeMap::new();
        objects.insert("/".to_string(), FakeObject::Directory);
        Self {
            objects: RefCell::new(objects),
            runs: RefCell::new(BTreeMap::new()),
            next_run_id: Cell::new(1),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_directory(self, path: &str) -> Self {
        self.insert_ancestors(path);
        self.objects
            .borrow_mut()
            .insert(path.to_string(), FakeObject::Directory);
        self
    }

    pub fn with_file(self, path: &str, content: &str, file_type: &str) -> Self {
        self.insert_ancestors(path);
        self.objects.borrow_mut().insert(
            path.to_string(),
            FakeObject::File {
                content: content.to_string(),
                file_type: file_type.to_string(),
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn calls_to(&self, action: &str) -> Vec<Call> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.action == action)
            .cloned()
            .collect()
    }

    pub fn content_of(&self, path: &str) -> Option<String> {
        match self.objects.borrow().get(path) {
            Some(FakeObject::File { content, .. }) => Some(content.clone()),
            _ => None,
        }
    }

    fn insert_ancestors(&self, path: &str) {
        let mut objects = self.objects.borrow_mut();
        let mut current = parent_of(path);
        while let Some(dir) = current {
            objects.entry(dir.to_string()).or_insert(FakeObject::Directory);
            current = parent_of(dir);
        }
    }

    fn record(&self, method: &'static str, action: &str, body: &Value) {
        self.calls.borrow_mut().push(Call {
            method,
            action: action.to_string(),
            body: body.clone(),
        });
    }

    fn list(&self, body: &Value) -> Value {
        let path = str_field(body, "path");
        let objects = self.objects.borrow();
        if !matches!(objects.get(path), Some(FakeObject::Directory)) {
            return not_found(path);
        }
        let children: Vec<Value> = objects
            .iter()
            .filter(|(child, _)| child.as_str() != "/" && parent_of(child) == Some(path))
            .map(|(child, object)| {
                let object_type = match object {
                    FakeObject::Directory => "DIRECTORY",
                    FakeObject::File { .. } => "NOTEBOOK",
                };
                json!({"path": child, "object_type": object_type})
            })
            .collect();
        if children.is_empty() {
            json!({})
        } else {
            json!({ "objects": children })
        }
    }

    fn export(&self, body: &Value) -> Value {
        let path = str_field(body, "path");
        match self.objects.borrow().get(path) {
            Some(FakeObject::File { content, file_type }) => {
                json!({"content": content, "file_type": file_type})
            }
            Some(FakeObject::Directory) => json!({"content": "", "file_type": "dbc"}),
            None => not_found(path),
        }
    }

    fn import(&self, body: &Value) -> Value {
        let path = str_field(body, "path");
        let overwrite = body["overwrite"].as_bool().unwrap_or(false);
        if self.objects.borrow().contains_key(path) && !overwrite {
            return json!({
                "error_code": "RESOURCE_ALREADY_EXISTS",
                "message": format!("Path ({path}) already exists."),
            });
        }
        let file_type = match str_field(body, "format") {
            "SOURCE" => "py",
            "HTML" => "html",
            "JUPYTER" => "ipynb",
            _ => "dbc",
        };
        let content = str_field(body, "content").to_string();
        self.insert_ancestors(path);
        self.objects.borrow_mut().insert(
            path.to_string(),
            FakeObject::File {
                content,
                file_type: file_type.to_string(),
            },
        );
        json!({})
    }

    fn mkdirs(&self, body: &Value) -> Value {
        let path = str_field(body, "path");
        self.insert_ancestors(path);
        self.objects
            .borrow_mut()
            .entry(path.to_string())
            .or_insert(FakeObject::Directory);
        json!({})
    }

    fn submit(&self, body: &Value) -> Value {
        let run_id = self.next_run_id.get();
        self.next_run_id.set(run_id + 1);
        self.runs.borrow_mut().insert(
            run_id,
            json!({
                "run_id": run_id,
                "job_id": 1000 + run_id,
                "run_name": body["run_name"],
                "state": {"life_cycle_state": "PENDING", "state_message": ""},
            }),
        );
        json!({ "run_id": run_id })
    }

    fn run_get(&self, body: &Value) -> Value {
        let run_id = body["run_id"].as_u64().unwrap_or_default();
        match self.runs.borrow().get(&run_id) {
            Some(run) => run.clone(),
            None => json!({
                "error_code": "INVALID_PARAMETER_VALUE",
                "message": format!("Run {run_id} does not exist."),
            }),
        }
    }

    fn run_list(&self, body: &Value) -> Value {
        let job_id = body["job_id"].as_u64().unwrap_or_default();
        let runs: Vec<Value> = self
            .runs
            .borrow()
            .values()
            .filter(|run| run["job_id"].as_u64() == Some(job_id))
            .cloned()
            .collect();
        json!({ "runs": runs, "has_more": false })
    }
}

impl Transport for FakeWorkspace {
    fn get(&self, action: &str, body: &Value) -> Result<Value> {
        self.record("GET", action, body);
        match action {
            "workspace/list" => Ok(self.list(body)),
            "workspace/export" => Ok(self.export(body)),
            "jobs/runs/get" => Ok(self.run_get(body)),
            "jobs/runs/list" => Ok(self.run_list(body)),
            other => Err(anyhow!("unexpected GET {other}")),
        }
    }

    fn post(&self, action: &str, body: &Value) -> Result<Value> {
        self.record("POST", action, body);
        match action {
            "workspace/import" => Ok(self.import(body)),
            "workspace/mkdirs" => Ok(self.mkdirs(body)),
            "jobs/runs/submit" => Ok(self.submit(body)),
            other => Err(anyhow!("unexpected POST {other}")),
        }
    }
}

/// Replays canned responses in order, whatever the action.
pub(crate) struct ScriptedTransport {
    responses: RefCell<VecDeque<Result<Value>>>,
    calls: RefCell<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<Result<Value>>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn next(&self, method: &'static str, action: &str, body: &Value) -> Result<Value> {
        self.calls.borrow_mut().push(Call {
            method,
            action: action.to_string(),
            body: body.clone(),
        });
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("no scripted response for {method} {action}")))
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, action: &str, body: &Value) -> Result<Value> {
        self.next("GET", action, body)
    }

    fn post(&self, action: &str, body: &Value) -> Result<Value> {
        self.next("POST", action, body)
    }
}

pub(crate) fn environment(kind: EnvironmentKind) -> Environment {
    let (token, cluster) = match kind {
        EnvironmentKind::Production => ("prod-token", "prod-cluster"),
        EnvironmentKind::NonProduction => ("dev-token", "dev-cluster"),
    };
    Environment::new(kind, token, cluster, "example.azuredatabricks.net")
}

pub(crate) fn client<T: Transport>(kind: EnvironmentKind, transport: T) -> WorkspaceClient<T> {
    WorkspaceClient::new(environment(kind), transport)
}

fn parent_of(path: &str) -> Option<&str> {
    if path == "/" {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some("/"),
        Some(index) => Some(&path[..index]),
        None => None,
    }
}

fn str_field<'a>(body: &'a Value, key: &str) -> &'a str {
    body.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn not_found(path: &str) -> Value {
    json!({
        "error_code": "RESOURCE_DOES_NOT_EXIST",
        "message": format!("Path ({path}) doesn't exist."),
    })
}
