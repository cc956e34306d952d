//! Command-line argument parsing

use crate::dispatcher::{ActionKind, NamespaceOpKind, RawInputs};
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ActionArg {
    Push,
    Pull,
    Tag,
    Retag,
    Delete,
    Namespace,
}

impl From<ActionArg> for ActionKind {
    fn from(value: ActionArg) -> Self {
        match value {
            ActionArg::Push => ActionKind::Push,
            ActionArg::Pull => ActionKind::Pull,
            ActionArg::Tag => ActionKind::Tag,
            ActionArg::Retag => ActionKind::Retag,
            ActionArg::Delete => ActionKind::Delete,
            ActionArg::Namespace => ActionKind::Namespace,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NamespaceOpArg {
    Create,
    Delete,
    List,
}

impl From<NamespaceOpArg> for NamespaceOpKind {
    fn from(value: NamespaceOpArg) -> Self {
        match value {
            NamespaceOpArg::Create => NamespaceOpKind::Create,
            NamespaceOpArg::Delete => NamespaceOpKind::Delete,
            NamespaceOpArg::List => NamespaceOpKind::List,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "cr-manager")]
#[command(about = "Container image lifecycle operations against IBM Cloud Container Registry")]
#[command(version)]
pub struct Args {
    /// Lifecycle action to perform
    #[arg(long = "action", short = 'a', value_enum)]
    pub action: ActionArg,

    /// API key used to authenticate against the registry
    #[arg(
        long = "apikey",
        env = "CR_MANAGER_APIKEY",
        hide_env_values = true,
        help = "IBM Cloud API key for registry authentication"
    )]
    pub apikey: String,

    /// Remote image reference (host/namespace/repository:tag)
    #[arg(long = "image", short = 'i')]
    pub image: Option<String>,

    /// Local image to tag with the remote reference before pushing
    #[arg(long = "local-image")]
    pub local_image: Option<String>,

    /// Registry region; inferred from the image host when omitted. Codes
    /// outside the public table are used as-is (`<region>.icr.io`)
    #[arg(long = "region", short = 'r')]
    pub region: Option<String>,

    /// Existing tag, for retag
    #[arg(long = "source-tag")]
    pub source_tag: Option<String>,

    /// Tag to apply, for tag/retag
    #[arg(long = "target-tag")]
    pub target_tag: Option<String>,

    /// Namespace name, for namespace create/delete
    #[arg(long = "namespace", short = 'n')]
    pub namespace: Option<String>,

    /// Namespace sub-action
    #[arg(long = "namespace-action", value_enum)]
    pub namespace_action: Option<NamespaceOpArg>,

    /// Run a vulnerability scan after push/pull
    #[arg(
        long = "scan",
        default_value_t = true,
        action = clap::ArgAction::Set,
        help = "Wait for a vulnerability scan after push/pull (true/false)"
    )]
    pub scan: bool,

    /// Treat a FAIL scan verdict as an operation failure
    #[arg(
        long = "scan-fail-on-vulnerability",
        default_value_t = true,
        action = clap::ArgAction::Set,
        help = "Fail the operation when the scan verdict is FAIL (true/false)"
    )]
    pub scan_fail_on_vulnerability: bool,

    /// Timeout in seconds for registry API calls
    #[arg(long = "timeout", short = 't', default_value = "300")]
    pub timeout: u64,

    /// Skip TLS certificate verification
    #[arg(long = "skip-tls", short = 'k', default_value = "false")]
    pub skip_tls: bool,

    /// Verbose output
    #[arg(long = "verbose", short = 'v')]
    pub verbose: bool,

    /// Suppress all non-error output
    #[arg(long = "quiet", short = 'q')]
    pub quiet: bool,

    /// Result output format
    #[arg(long = "output", short = 'o', value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

impl Args {
    pub fn parse_args() -> Self {
        Args::parse()
    }

    pub fn to_inputs(&self) -> RawInputs {
        RawInputs {
            action: self.action.into(),
            image: self.image.clone(),
            local_image: self.local_image.clone(),
            source_tag: self.source_tag.clone(),
            target_tag: self.target_tag.clone(),
            namespace: self.namespace.clone(),
            namespace_action: self.namespace_action.map(Into::into),
            region: self.region.clone(),
            scan: self.scan,
            scan_fail_on_vulnerability: self.scan_fail_on_vulnerability,
        }
    }
}
