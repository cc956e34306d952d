//! Operation request model
//!
//! Requests are a tagged enum with one variant per action, each carrying
//! only the fields that action uses. The flat invocation surface
//! ([`RawInputs`]) is checked against the per-action required-field matrix
//! on conversion, before any remote call can happen.

use crate::error::{Error, Result};
use std::fmt;

/// Requested lifecycle action, as named on the invocation surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Push,
    Pull,
    Tag,
    Retag,
    Delete,
    Namespace,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionKind::Push => "push",
            ActionKind::Pull => "pull",
            ActionKind::Tag => "tag",
            ActionKind::Retag => "retag",
            ActionKind::Delete => "delete",
            ActionKind::Namespace => "namespace",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceOpKind {
    Create,
    Delete,
    List,
}

/// Flat inputs as supplied by the caller, before validation.
#[derive(Debug, Clone)]
pub struct RawInputs {
    pub action: ActionKind,
    pub image: Option<String>,
    pub local_image: Option<String>,
    pub source_tag: Option<String>,
    pub target_tag: Option<String>,
    pub namespace: Option<String>,
    pub namespace_action: Option<NamespaceOpKind>,
    pub region: Option<String>,
    pub scan: bool,
    pub scan_fail_on_vulnerability: bool,
}

/// Scan behavior attached to push/pull requests.
#[derive(Debug, Clone, Copy)]
pub struct ScanPolicy {
    pub enabled: bool,
    pub fail_on_vulnerability: bool,
}

#[derive(Debug, Clone)]
pub enum NamespaceRequest {
    Create { name: String },
    Delete { name: String },
    List,
}

/// A validated operation request.
#[derive(Debug, Clone)]
pub enum OperationRequest {
    Push {
        image: String,
        local_image: Option<String>,
        region: Option<String>,
        scan: ScanPolicy,
    },
    Pull {
        image: String,
        region: Option<String>,
        scan: ScanPolicy,
    },
    Tag {
        image: String,
        target_tag: String,
    },
    Retag {
        image: String,
        source_tag: String,
        target_tag: String,
    },
    Delete {
        image: String,
    },
    Namespace(NamespaceRequest),
}

impl OperationRequest {
    /// Apply the per-action required-field matrix. Fails with a
    /// [`Error::Validation`] naming every missing field.
    pub fn from_inputs(inputs: RawInputs) -> Result<Self> {
        fn require(
            value: &Option<String>,
            name: &'static str,
            missing: &mut Vec<&'static str>,
        ) -> Option<String> {
            match value {
                Some(v) if !v.is_empty() => Some(v.clone()),
                _ => {
                    missing.push(name);
                    None
                }
            }
        }

        let mut missing: Vec<&'static str> = Vec::new();

        let scan = ScanPolicy {
            enabled: inputs.scan,
            fail_on_vulnerability: inputs.scan_fail_on_vulnerability,
        };

        let request = match inputs.action {
            ActionKind::Push => {
                let image = require(&inputs.image, "image", &mut missing);
                image.map(|image| OperationRequest::Push {
                    image,
                    local_image: inputs.local_image.filter(|v| !v.is_empty()),
                    region: inputs.region.filter(|v| !v.is_empty()),
                    scan,
                })
            }
            ActionKind::Pull => {
                let image = require(&inputs.image, "image", &mut missing);
                image.map(|image| OperationRequest::Pull {
                    image,
                    region: inputs.region.filter(|v| !v.is_empty()),
                    scan,
                })
            }
            ActionKind::Tag => {
                let image = require(&inputs.image, "image", &mut missing);
                let target_tag = require(&inputs.target_tag, "target-tag", &mut missing);
                match (image, target_tag) {
                    (Some(image), Some(target_tag)) => {
                        Some(OperationRequest::Tag { image, target_tag })
                    }
                    _ => None,
                }
            }
            ActionKind::Retag => {
                let image = require(&inputs.image, "image", &mut missing);
                let source_tag = require(&inputs.source_tag, "source-tag", &mut missing);
                let target_tag = require(&inputs.target_tag, "target-tag", &mut missing);
                match (image, source_tag, target_tag) {
                    (Some(image), Some(source_tag), Some(target_tag)) => {
                        Some(OperationRequest::Retag {
                            image,
                            source_tag,
                            target_tag,
                        })
                    }
                    _ => None,
                }
            }
            ActionKind::Delete => {
                let image = require(&inputs.image, "image", &mut missing);
                image.map(|image| OperationRequest::Delete { image })
            }
            ActionKind::Namespace => match inputs.namespace_action {
                None => {
                    missing.push("namespace-action");
                    None
                }
                Some(NamespaceOpKind::List) => {
                    Some(OperationRequest::Namespace(NamespaceRequest::List))
                }
                Some(op) => {
                    let name = require(&inputs.namespace, "namespace", &mut missing);
                    name.map(|name| match op {
                        NamespaceOpKind::Create => {
                            OperationRequest::Namespace(NamespaceRequest::Create { name })
                        }
                        NamespaceOpKind::Delete => {
                            OperationRequest::Namespace(NamespaceRequest::Delete { name })
                        }
                        NamespaceOpKind::List => unreachable!(),
                    })
                }
            },
        };

        match request {
            Some(request) if missing.is_empty() => Ok(request),
            _ => Err(Error::Validation(format!(
                "action '{}' is missing required field(s): {}",
                inputs.action,
                missing.join(", ")
            ))),
        }
    }
}
