// # route53-sidecar
//
// Thin integration layer: all lifecycle logic lives in sidecar-core.
//
// The binary is responsible for:
// 1. Reading options from flags and environment variables
// 2. Initializing logging and the runtime
// 3. Resolving the address to publish
// 4. Arming termination signals (full mode only)
// 5. Running the lifecycle and mapping the result to an exit code
//
// ## Configuration
//
// - `DNS` / `--dns`: record name
// - `HOSTEDZONE` / `--hostedzone`: hosted zone ID
// - `DNSTTL` / `--dnsttl`: record TTL in seconds
// - `IPADDRESS` / `--ipaddress`: literal address or metadata selector
// - `REGISTER` / `--register`: publish and exit
// - `UNREGISTER` / `--unregister`: retract and exit
// - `SETUPDELAY` / `--setupdelay`: seconds to wait before publishing
// - `LOG_LEVEL` / `--log-level`: log verbosity
//
// AWS credentials and region come from the standard AWS provider chain.
//
// ## Example
//
// ```bash
// export DNS=api.internal.example.com
// export HOSTEDZONE=Z2AAAABCDEFGT4
// export IPADDRESS=container-task-metadata
//
// route53-sidecar
// ```

mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sidecar_core::traits::DirectoryService;
use sidecar_core::{LifecycleManager, RunMode, ShutdownTrigger, SidecarConfig};
use sidecar_provider_route53::Route53Directory;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

use crate::cli::Cli;

/// Exit codes for different termination scenarios
///
/// - 0: Lifecycle completed
/// - 1: Configuration or address error, nothing was changed in DNS
/// - 2: Runtime failure after DNS work started
#[derive(Debug, Clone, Copy)]
enum SidecarExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<SidecarExitCode> for ExitCode {
    fn from(code: SidecarExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl SidecarExitCode {
    fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<sidecar_core::Error>() {
            Some(e) if e.is_startup() => SidecarExitCode::ConfigError,
            _ => SidecarExitCode::RuntimeError,
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version land here too
            return if e.use_stderr() {
                SidecarExitCode::ConfigError.into()
            } else {
                SidecarExitCode::CleanShutdown.into()
            };
        }
    };

    let config = match cli.to_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return SidecarExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return SidecarExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return SidecarExitCode::RuntimeError.into();
        }
    };

    let code = rt.block_on(async {
        match run_sidecar(config).await {
            Ok(()) => SidecarExitCode::CleanShutdown,
            Err(e) => {
                error!("Sidecar error: {:#}", e);
                SidecarExitCode::for_error(&e)
            }
        }
    });

    info!("Exiting ({:?})", code);
    code.into()
}

/// Log the effective configuration
fn log_config(config: &SidecarConfig, address: &str) {
    info!("route53-sidecar v{}", env!("CARGO_PKG_VERSION"));
    info!("DNS name: {}", config.record_name);
    info!("DNS TTL: {:?}", config.ttl());
    info!("Hosted zone: {}", config.hosted_zone);
    info!("IP address: {} ({})", address, config.address_source.type_name());
    info!("Setup delay: {}s", config.setup_delay_secs);
    info!("Mode: {}", config.mode);
}

/// Run the sidecar
async fn run_sidecar(config: SidecarConfig) -> Result<()> {
    let address = sidecar_ip_metadata::resolve_address(&config.address_source)
        .await
        .context("Failed to determine the address to publish")?;

    log_config(&config, &address);

    let directory: Arc<dyn DirectoryService> = Arc::new(Route53Directory::from_env().await);
    let mut lifecycle = LifecycleManager::from_config(directory, &config, address)?;

    // Signals are only meaningful while the record is held
    let shutdown = ShutdownTrigger::new();
    let listener = match config.mode {
        RunMode::Full => Some(shutdown.arm()?),
        RunMode::PublishOnly | RunMode::RetractOnly => None,
    };

    let result = lifecycle.run(config.mode, &shutdown).await;

    if let Some(listener) = listener {
        listener.abort();
    }

    result?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_errors_exit_with_config_code() {
        let err = anyhow::Error::new(sidecar_core::Error::address("metadata unreachable"))
            .context("Failed to determine the address to publish");
        assert!(matches!(
            SidecarExitCode::for_error(&err),
            SidecarExitCode::ConfigError
        ));
    }

    #[test]
    fn runtime_errors_exit_with_runtime_code() {
        let err = anyhow::Error::new(sidecar_core::Error::RetractFailed(Box::new(
            sidecar_core::Error::submission("throttled"),
        )));
        assert!(matches!(
            SidecarExitCode::for_error(&err),
            SidecarExitCode::RuntimeError
        ));

        let err = anyhow::anyhow!("something else");
        assert!(matches!(
            SidecarExitCode::for_error(&err),
            SidecarExitCode::RuntimeError
        ));
    }
}
