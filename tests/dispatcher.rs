//! Dispatcher behavior against a scripted registry backend

use async_trait::async_trait;
use container_registry_manager::dispatcher::{
    ActionKind, Dispatcher, NamespaceOpKind, OperationStatus, RawInputs,
};
use container_registry_manager::logging::Logger;
use container_registry_manager::registry::{BackendError, BackendResult, RegistryBackend};
use container_registry_manager::scan::{ScanReport, ScanStatus};
use serde_json::json;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Registry backend that records every invocation and answers from
/// pre-configured fixtures.
#[derive(Default)]
struct MockBackend {
    calls: Mutex<Vec<String>>,
    push_digest: Option<String>,
    pull_digest: Option<String>,
    scan_script: Mutex<Vec<ScanStatus>>,
    delete_error: Option<BackendError>,
    retag_error: Option<BackendError>,
    create_namespace_error: Option<BackendError>,
    namespaces: Vec<String>,
}

impl MockBackend {
    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RegistryBackend for MockBackend {
    async fn push(&self, _image: &str) -> BackendResult<Option<String>> {
        self.record("push");
        Ok(self.push_digest.clone())
    }

    async fn pull(&self, _image: &str) -> BackendResult<Option<String>> {
        self.record("pull");
        Ok(self.pull_digest.clone())
    }

    async fn tag_local(&self, _local: &str, _image: &str) -> BackendResult<()> {
        self.record("tag_local");
        Ok(())
    }

    async fn tag(&self, _image: &str, _new_tag: &str) -> BackendResult<()> {
        self.record("tag");
        Ok(())
    }

    async fn retag(&self, _image: &str, _source: &str, _target: &str) -> BackendResult<()> {
        self.record("retag");
        match &self.retag_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn delete_image(&self, _image: &str) -> BackendResult<()> {
        self.record("delete_image");
        match &self.delete_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn create_namespace(&self, _name: &str) -> BackendResult<()> {
        self.record("create_namespace");
        match &self.create_namespace_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn delete_namespace(&self, _name: &str) -> BackendResult<()> {
        self.record("delete_namespace");
        Ok(())
    }

    async fn list_namespaces(&self) -> BackendResult<Vec<String>> {
        self.record("list_namespaces");
        Ok(self.namespaces.clone())
    }

    async fn initiate_scan(&self, _image: &str) -> BackendResult<()> {
        self.record("initiate_scan");
        Ok(())
    }

    async fn query_scan(&self, _image: &str) -> BackendResult<ScanReport> {
        self.record("query_scan");
        let mut script = self.scan_script.lock().unwrap();
        let status = if script.is_empty() {
            ScanStatus::Incomplete
        } else {
            script.remove(0)
        };
        Ok(ScanReport {
            status,
            detail: json!({ "status": status.to_string(), "vulnerabilities": [] }),
        })
    }
}

fn inputs(action: ActionKind) -> RawInputs {
    RawInputs {
        action,
        image: None,
        local_image: None,
        source_tag: None,
        target_tag: None,
        namespace: None,
        namespace_action: None,
        region: None,
        scan: true,
        scan_fail_on_vulnerability: true,
    }
}

#[tokio::test]
async fn validation_failure_makes_no_backend_call() {
    let backend = MockBackend::default();
    let dispatcher = Dispatcher::new(&backend, Logger::new_quiet());

    let mut raw = inputs(ActionKind::Tag);
    raw.image = Some("us.icr.io/ns/app:1".to_string());
    // target-tag deliberately missing
    let result = dispatcher.execute_inputs(raw, &CancellationToken::new()).await;

    assert_eq!(result.status, OperationStatus::Failure);
    assert!(result.error_message.unwrap().contains("target-tag"));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn namespace_create_on_existing_namespace_succeeds() {
    let backend = MockBackend {
        create_namespace_error: Some(BackendError::AlreadyExists("taken".to_string())),
        ..Default::default()
    };
    let dispatcher = Dispatcher::new(&backend, Logger::new_quiet());

    let mut raw = inputs(ActionKind::Namespace);
    raw.namespace_action = Some(NamespaceOpKind::Create);
    raw.namespace = Some("mine".to_string());
    let result = dispatcher.execute_inputs(raw, &CancellationToken::new()).await;

    assert_eq!(result.status, OperationStatus::Success);
    assert!(result.note.unwrap().contains("already exists"));
}

#[tokio::test]
async fn namespace_list_mirrors_remote_order() {
    let backend = MockBackend {
        namespaces: vec!["zeta".to_string(), "alpha".to_string(), "mid".to_string()],
        ..Default::default()
    };
    let dispatcher = Dispatcher::new(&backend, Logger::new_quiet());

    let mut raw = inputs(ActionKind::Namespace);
    raw.namespace_action = Some(NamespaceOpKind::List);
    let result = dispatcher.execute_inputs(raw, &CancellationToken::new()).await;

    assert_eq!(result.status, OperationStatus::Success);
    assert_eq!(
        result.namespaces.unwrap(),
        vec!["zeta".to_string(), "alpha".to_string(), "mid".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn failing_scan_flips_push_to_failure_but_keeps_digest() {
    let backend = MockBackend {
        push_digest: Some("sha256:feedface".to_string()),
        scan_script: Mutex::new(vec![ScanStatus::Incomplete, ScanStatus::Fail]),
        ..Default::default()
    };
    let dispatcher = Dispatcher::new(&backend, Logger::new_quiet());

    let mut raw = inputs(ActionKind::Push);
    raw.image = Some("us.icr.io/ns/app:1".to_string());
    let result = dispatcher.execute_inputs(raw, &CancellationToken::new()).await;

    assert_eq!(result.status, OperationStatus::Failure);
    assert_eq!(result.image_digest.as_deref(), Some("sha256:feedface"));
    let scan = result.scan.unwrap();
    assert_eq!(scan.status, ScanStatus::Fail);
    assert_eq!(scan.attempts, 2);
}

#[tokio::test(start_paused = true)]
async fn failing_scan_passes_when_policy_allows_it() {
    let backend = MockBackend {
        push_digest: Some("sha256:feedface".to_string()),
        scan_script: Mutex::new(vec![ScanStatus::Fail]),
        ..Default::default()
    };
    let dispatcher = Dispatcher::new(&backend, Logger::new_quiet());

    let mut raw = inputs(ActionKind::Push);
    raw.image = Some("us.icr.io/ns/app:1".to_string());
    raw.scan_fail_on_vulnerability = false;
    let result = dispatcher.execute_inputs(raw, &CancellationToken::new()).await;

    assert_eq!(result.status, OperationStatus::Success);
    // the FAIL verdict stays attached for visibility
    assert_eq!(result.scan.unwrap().status, ScanStatus::Fail);
}

#[tokio::test(start_paused = true)]
async fn scan_timeout_is_reported_as_failure() {
    let backend = MockBackend {
        pull_digest: Some("sha256:cafe".to_string()),
        scan_script: Mutex::new(vec![ScanStatus::Unscanned; 30]),
        ..Default::default()
    };
    let dispatcher = Dispatcher::new(&backend, Logger::new_quiet());

    let mut raw = inputs(ActionKind::Pull);
    raw.image = Some("de.icr.io/ns/app:2".to_string());
    let result = dispatcher.execute_inputs(raw, &CancellationToken::new()).await;

    assert_eq!(result.status, OperationStatus::Failure);
    assert!(result.error_message.unwrap().contains("did not complete"));
    let scan = result.scan.unwrap();
    assert_eq!(scan.attempts, 30);
    assert_eq!(scan.status, ScanStatus::Unscanned);
}

#[tokio::test]
async fn push_with_local_image_tags_before_pushing() {
    let backend = MockBackend {
        push_digest: Some("sha256:0011".to_string()),
        ..Default::default()
    };
    let dispatcher = Dispatcher::new(&backend, Logger::new_quiet());

    let mut raw = inputs(ActionKind::Push);
    raw.image = Some("uk.icr.io/ns/app:1".to_string());
    raw.local_image = Some("app:dev".to_string());
    raw.scan = false;
    let result = dispatcher.execute_inputs(raw, &CancellationToken::new()).await;

    assert_eq!(result.status, OperationStatus::Success);
    assert_eq!(backend.calls(), vec!["tag_local", "push"]);
    assert!(result.scan.is_none());
}

#[tokio::test]
async fn unresolvable_region_fails_before_any_backend_call() {
    let backend = MockBackend::default();
    let dispatcher = Dispatcher::new(&backend, Logger::new_quiet());

    let mut raw = inputs(ActionKind::Push);
    raw.image = Some("registry.example.com/ns/app:1".to_string());
    let result = dispatcher.execute_inputs(raw, &CancellationToken::new()).await;

    assert_eq!(result.status, OperationStatus::Failure);
    assert!(result.error_message.unwrap().contains("region"));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn explicit_region_overrides_unknown_host() {
    let backend = MockBackend {
        push_digest: Some("sha256:9999".to_string()),
        ..Default::default()
    };
    let dispatcher = Dispatcher::new(&backend, Logger::new_quiet());

    let mut raw = inputs(ActionKind::Push);
    raw.image = Some("registry.example.com/ns/app:1".to_string());
    raw.region = Some("eu-gb".to_string());
    raw.scan = false;
    let result = dispatcher.execute_inputs(raw, &CancellationToken::new()).await;

    assert_eq!(result.status, OperationStatus::Success);
    assert_eq!(backend.calls(), vec!["push"]);
}

#[tokio::test]
async fn deleting_a_missing_image_is_a_terminal_error() {
    let backend = MockBackend {
        delete_error: Some(BackendError::NotFound("no such image".to_string())),
        ..Default::default()
    };
    let dispatcher = Dispatcher::new(&backend, Logger::new_quiet());

    let mut raw = inputs(ActionKind::Delete);
    raw.image = Some("us.icr.io/ns/gone:1".to_string());
    let result = dispatcher.execute_inputs(raw, &CancellationToken::new()).await;

    assert_eq!(result.status, OperationStatus::Failure);
    assert!(result.error_message.unwrap().contains("Image not found"));
}

#[tokio::test]
async fn retagging_a_missing_source_tag_is_tag_not_found() {
    let backend = MockBackend {
        retag_error: Some(BackendError::NotFound("unknown tag".to_string())),
        ..Default::default()
    };
    let dispatcher = Dispatcher::new(&backend, Logger::new_quiet());

    let mut raw = inputs(ActionKind::Retag);
    raw.image = Some("us.icr.io/ns/app".to_string());
    raw.source_tag = Some("v1".to_string());
    raw.target_tag = Some("v2".to_string());
    let result = dispatcher.execute_inputs(raw, &CancellationToken::new()).await;

    assert_eq!(result.status, OperationStatus::Failure);
    assert!(result.error_message.unwrap().contains("Source tag not found"));
}

#[tokio::test(start_paused = true)]
async fn pull_attaches_clean_scan_outcome() {
    let backend = MockBackend {
        pull_digest: Some("sha256:abcd".to_string()),
        scan_script: Mutex::new(vec![ScanStatus::Incomplete, ScanStatus::Ok]),
        ..Default::default()
    };
    let dispatcher = Dispatcher::new(&backend, Logger::new_quiet());

    let mut raw = inputs(ActionKind::Pull);
    raw.image = Some("jp.icr.io/ns/app:3".to_string());
    let result = dispatcher.execute_inputs(raw, &CancellationToken::new()).await;

    assert_eq!(result.status, OperationStatus::Success);
    assert_eq!(result.image_digest.as_deref(), Some("sha256:abcd"));
    let scan = result.scan.unwrap();
    assert_eq!(scan.status, ScanStatus::Ok);
    assert_eq!(scan.attempts, 2);
    assert_eq!(scan.elapsed_seconds, 10);
}
