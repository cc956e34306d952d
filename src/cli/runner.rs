//! Invocation runner
//!
//! Glues the argument surface to the dispatcher: builds the logger and the
//! concrete registry client, wires cancellation to Ctrl-C, executes the
//! request, and emits the structured outputs.

use crate::cli::args::Args;
use crate::cli::outputs;
use crate::dispatcher::{Dispatcher, OperationResult, OperationStatus};
use crate::error::{Error, Result};
use crate::logging::Logger;
use crate::region;
use crate::registry::IcrClientBuilder;
use tokio_util::sync::CancellationToken;

pub struct Runner {
    args: Args,
    logger: Logger,
}

impl Runner {
    pub fn new(args: Args) -> Self {
        let logger = if args.quiet {
            Logger::new_quiet()
        } else {
            Logger::new(args.verbose)
        };
        Self { args, logger }
    }

    pub async fn run(&self) -> Result<OperationStatus> {
        self.logger.section("Container Registry Manager");

        // Setup problems still yield a well-formed result and outputs
        let result = match self.execute().await {
            Ok(result) => result,
            Err(err) => OperationResult::failure(err.to_string()),
        };

        if let Some(message) = &result.error_message {
            self.logger.error(message);
        }
        if let Some(note) = &result.note {
            self.logger.info(note);
        }
        outputs::emit(&result, self.args.output)?;

        self.logger.info(&format!(
            "Finished in {}",
            self.logger.format_duration(self.logger.elapsed())
        ));
        Ok(result.status)
    }

    async fn execute(&self) -> Result<OperationResult> {
        let registry_host = self.registry_host()?;
        self.logger.debug(&format!("Registry endpoint: {}", registry_host));

        let client = IcrClientBuilder::new(
            registry_host,
            self.args.apikey.clone(),
            self.logger.clone(),
        )
        .with_timeout(self.args.timeout)
        .with_skip_tls(self.args.skip_tls)
        .build()?;

        let cancel = CancellationToken::new();
        let signal_guard = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                signal_guard.cancel();
            }
        });

        let dispatcher = Dispatcher::new(&client, self.logger.clone());
        Ok(dispatcher.execute_inputs(self.args.to_inputs(), &cancel).await)
    }

    /// Endpoint host for the concrete client. The dispatcher re-resolves the
    /// region for push/pull per its own contract; here the same table picks
    /// the API endpoint, defaulting to the global host for namespace
    /// operations given without any image or region. An explicit region is
    /// taken as given: codes outside the table (dedicated registries) map
    /// to `<region>.icr.io` rather than being rejected.
    fn registry_host(&self) -> Result<String> {
        if let Some(region) = &self.args.region {
            if !region.is_empty() {
                return Ok(match region::registry_host(region) {
                    Some(host) => host.to_string(),
                    None => format!("{}.icr.io", region),
                });
            }
        }
        let code = match &self.args.image {
            Some(image) => region::resolve(image, None)?.code,
            None => "global".to_string(),
        };
        region::registry_host(&code)
            .map(str::to_string)
            .ok_or_else(|| Error::Config(format!("unknown registry region '{}'", code)))
    }
}
