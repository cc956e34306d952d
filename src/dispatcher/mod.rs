//! Operation dispatcher
//!
//! Validates inputs against the per-action field matrix, resolves the
//! registry region where the action needs one, invokes the registry backend,
//! optionally runs the scan poller, and always produces a single well-formed
//! [`OperationResult`].

pub mod request;
pub mod result;

use crate::error::Error;
use crate::logging::Logger;
use crate::region;
use crate::registry::{BackendError, RegistryBackend};
use crate::scan::{ScanError, ScanOutcome, ScanPoller, ScanStatus};
use tokio_util::sync::CancellationToken;

pub use request::{ActionKind, NamespaceOpKind, NamespaceRequest, OperationRequest, RawInputs, ScanPolicy};
pub use result::{OperationResult, OperationStatus};

pub struct Dispatcher<'a> {
    backend: &'a dyn RegistryBackend,
    logger: Logger,
}

impl<'a> Dispatcher<'a> {
    pub fn new(backend: &'a dyn RegistryBackend, logger: Logger) -> Self {
        Self { backend, logger }
    }

    /// Validate flat inputs and execute the resulting request. Validation
    /// failures produce a failure result without any backend call.
    pub async fn execute_inputs(
        &self,
        inputs: RawInputs,
        cancel: &CancellationToken,
    ) -> OperationResult {
        match OperationRequest::from_inputs(inputs) {
            Ok(request) => self.execute(request, cancel).await,
            Err(err) => OperationResult::failure(err.to_string()),
        }
    }

    pub async fn execute(
        &self,
        request: OperationRequest,
        cancel: &CancellationToken,
    ) -> OperationResult {
        match request {
            OperationRequest::Push {
                image,
                local_image,
                region,
                scan,
            } => self.push(&image, local_image.as_deref(), region.as_deref(), scan, cancel).await,
            OperationRequest::Pull { image, region, scan } => {
                self.pull(&image, region.as_deref(), scan, cancel).await
            }
            OperationRequest::Tag { image, target_tag } => self.tag(&image, &target_tag).await,
            OperationRequest::Retag {
                image,
                source_tag,
                target_tag,
            } => self.retag(&image, &source_tag, &target_tag).await,
            OperationRequest::Delete { image } => self.delete(&image).await,
            OperationRequest::Namespace(ns) => self.namespace(ns).await,
        }
    }

    async fn push(
        &self,
        image: &str,
        local_image: Option<&str>,
        explicit_region: Option<&str>,
        scan: ScanPolicy,
        cancel: &CancellationToken,
    ) -> OperationResult {
        let resolved = match region::resolve(image, explicit_region) {
            Ok(resolved) => resolved,
            Err(err) => return OperationResult::failure(err.to_string()),
        };
        self.logger.info(&format!(
            "Pushing {} (region {}, {})",
            image, resolved.code, resolved.source
        ));

        if let Some(local) = local_image {
            if let Err(err) = self.backend.tag_local(local, image).await {
                return OperationResult::failure(remote_failure(err).to_string());
            }
        }

        let digest = match self.backend.push(image).await {
            Ok(digest) => digest,
            Err(err) => return OperationResult::failure(remote_failure(err).to_string()),
        };
        self.logger.success(&format!("Pushed {}", image));

        self.finish_with_scan(image, digest, scan, cancel).await
    }

    async fn pull(
        &self,
        image: &str,
        explicit_region: Option<&str>,
        scan: ScanPolicy,
        cancel: &CancellationToken,
    ) -> OperationResult {
        let resolved = match region::resolve(image, explicit_region) {
            Ok(resolved) => resolved,
            Err(err) => return OperationResult::failure(err.to_string()),
        };
        self.logger.info(&format!(
            "Pulling {} (region {}, {})",
            image, resolved.code, resolved.source
        ));

        let digest = match self.backend.pull(image).await {
            Ok(digest) => digest,
            Err(err) => return OperationResult::failure(remote_failure(err).to_string()),
        };
        self.logger.success(&format!("Pulled {}", image));

        self.finish_with_scan(image, digest, scan, cancel).await
    }

    /// Common tail of push/pull: run the optional scan and fold its verdict
    /// into the result. A failing scan flips the overall status while the
    /// digest from the transfer stays populated.
    async fn finish_with_scan(
        &self,
        image: &str,
        digest: Option<String>,
        scan: ScanPolicy,
        cancel: &CancellationToken,
    ) -> OperationResult {
        if !scan.enabled {
            return OperationResult::success().with_digest(digest);
        }

        let (outcome, failure) = self.run_scan(image, scan, cancel).await;
        match failure {
            Some(message) => OperationResult::failure(message)
                .with_digest(digest)
                .with_scan(outcome),
            None => OperationResult::success()
                .with_digest(digest)
                .with_scan(outcome),
        }
    }

    /// Poll the scan and interpret the terminal status per policy. Returns
    /// the outcome (when one exists) and the failure message, if any.
    async fn run_scan(
        &self,
        image: &str,
        policy: ScanPolicy,
        cancel: &CancellationToken,
    ) -> (Option<ScanOutcome>, Option<String>) {
        self.logger.info(&format!("Waiting for vulnerability scan of {}", image));
        let poller = ScanPoller::new(self.backend, &self.logger);

        match poller.poll(image, cancel).await {
            Ok(outcome) => {
                self.logger.info(&format!(
                    "Scan finished with status {} after {} attempt(s)",
                    outcome.status, outcome.attempts
                ));
                match outcome.status {
                    ScanStatus::Fail if policy.fail_on_vulnerability => {
                        let message =
                            format!("vulnerability scan reported FAIL for {}", image);
                        (Some(outcome), Some(message))
                    }
                    ScanStatus::Fail => {
                        self.logger.warning(
                            "Scan reported FAIL; continuing because scan-fail-on-vulnerability is disabled",
                        );
                        (Some(outcome), None)
                    }
                    _ => (Some(outcome), None),
                }
            }
            Err(ScanError::TimedOut(outcome)) => {
                let message = Error::ScanTimedOut {
                    attempts: outcome.attempts,
                    last_status: outcome.status.to_string(),
                }
                .to_string();
                (Some(outcome), Some(message))
            }
            Err(ScanError::Initiation(message)) => {
                (None, Some(Error::ScanInitiationFailed(message).to_string()))
            }
            Err(err) => (None, Some(err.to_string())),
        }
    }

    async fn tag(&self, image: &str, target_tag: &str) -> OperationResult {
        match self.backend.tag(image, target_tag).await {
            Ok(()) => {
                self.logger.success(&format!("Tagged {} with {}", image, target_tag));
                OperationResult::success()
            }
            Err(err) => OperationResult::failure(remote_failure(err).to_string()),
        }
    }

    async fn retag(&self, image: &str, source_tag: &str, target_tag: &str) -> OperationResult {
        match self.backend.retag(image, source_tag, target_tag).await {
            Ok(()) => {
                self.logger.success(&format!(
                    "Retagged {}: {} -> {}",
                    image, source_tag, target_tag
                ));
                OperationResult::success()
            }
            Err(BackendError::NotFound(_)) => OperationResult::failure(
                Error::TagNotFound(format!("{}:{}", image, source_tag)).to_string(),
            ),
            Err(err) => OperationResult::failure(remote_failure(err).to_string()),
        }
    }

    async fn delete(&self, image: &str) -> OperationResult {
        match self.backend.delete_image(image).await {
            Ok(()) => {
                self.logger.success(&format!("Deleted {}", image));
                OperationResult::success()
            }
            Err(BackendError::NotFound(_)) => {
                OperationResult::failure(Error::ImageNotFound(image.to_string()).to_string())
            }
            Err(err) => OperationResult::failure(remote_failure(err).to_string()),
        }
    }

    async fn namespace(&self, request: NamespaceRequest) -> OperationResult {
        match request {
            NamespaceRequest::Create { name } => match self.backend.create_namespace(&name).await {
                Ok(()) => {
                    self.logger.success(&format!("Created namespace {}", name));
                    OperationResult::success()
                }
                // Idempotent create: an existing namespace is not an error
                Err(BackendError::AlreadyExists(_)) => {
                    self.logger.info(&format!("Namespace {} already exists", name));
                    OperationResult::success()
                        .with_note(format!("namespace '{}' already exists", name))
                }
                Err(err) => OperationResult::failure(remote_failure(err).to_string()),
            },
            NamespaceRequest::Delete { name } => {
                match self.backend.delete_namespace(&name).await {
                    Ok(()) => {
                        self.logger.success(&format!("Deleted namespace {}", name));
                        OperationResult::success()
                    }
                    Err(err) => OperationResult::failure(remote_failure(err).to_string()),
                }
            }
            NamespaceRequest::List => match self.backend.list_namespaces().await {
                // Remote ordering is preserved as-is
                Ok(namespaces) => {
                    self.logger.info(&format!("Found {} namespace(s)", namespaces.len()));
                    OperationResult::success().with_namespaces(namespaces)
                }
                Err(err) => OperationResult::failure(remote_failure(err).to_string()),
            },
        }
    }
}

fn remote_failure(err: BackendError) -> Error {
    Error::RemoteOperationFailed(err.to_string())
}
