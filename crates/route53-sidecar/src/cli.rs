//! Command-line options
//!
//! Every option can also be given as an upper-case environment variable,
//! which is how the sidecar is usually configured inside a task definition.

use clap::Parser;
use clap::builder::BoolishValueParser;
use sidecar_core::{AddressSourceConfig, PropagationConfig, RunMode, SidecarConfig};
use tracing::Level;

/// Route 53 sidecar
///
/// Publishes this host's address as a weighted A record while the service
/// runs and removes it again on shutdown.
#[derive(Debug, Parser)]
#[command(name = "route53-sidecar")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// DNS name to publish
    #[arg(long, env = "DNS", default_value = "my.example.com")]
    pub dns: String,

    /// Route 53 hosted zone ID
    #[arg(long, env = "HOSTEDZONE", default_value = "Z2AAAABCDEFGT4")]
    pub hostedzone: String,

    /// Record TTL in seconds
    #[arg(long, env = "DNSTTL", default_value_t = 10)]
    pub dnsttl: u32,

    /// Address to publish: a literal IPv4 address, or one of
    /// `primary-interface-metadata`, `public-ipv4`, `local-ipv4`,
    /// `container-task-metadata`, `ecs`
    #[arg(long, env = "IPADDRESS", default_value = "primary-interface-metadata")]
    pub ipaddress: String,

    /// Publish the record and exit
    #[arg(long, env = "REGISTER", value_parser = BoolishValueParser::new())]
    pub register: bool,

    /// Remove the record and exit
    #[arg(long, env = "UNREGISTER", value_parser = BoolishValueParser::new())]
    pub unregister: bool,

    /// Seconds to wait before publishing
    #[arg(long, env = "SETUPDELAY", default_value_t = 10)]
    pub setupdelay: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long = "log-level", env = "LOG_LEVEL", default_value = "info")]
    pub log_level: Level,
}

impl Cli {
    /// Build and validate the sidecar configuration
    pub fn to_config(&self) -> sidecar_core::Result<SidecarConfig> {
        let config = SidecarConfig {
            record_name: self.dns.clone(),
            hosted_zone: self.hostedzone.clone(),
            ttl_secs: self.dnsttl,
            address_source: self.ipaddress.parse::<AddressSourceConfig>()?,
            setup_delay_secs: self.setupdelay,
            mode: RunMode::from_flags(self.register, self.unregister),
            propagation: PropagationConfig::default(),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sidecar_core::Error;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["route53-sidecar"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn flags_build_config() {
        let cli = parse(&[
            "--dns",
            "cname.nextjs.internal.",
            "--hostedzone",
            "Z123",
            "--dnsttl",
            "60",
            "--ipaddress",
            "10.1.2.3",
            "--setupdelay",
            "0",
        ]);

        let config = cli.to_config().unwrap();
        assert_eq!(config.record_name, "cname.nextjs.internal.");
        assert_eq!(config.hosted_zone, "Z123");
        assert_eq!(config.ttl_secs, 60);
        assert_eq!(config.setup_delay_secs, 0);
        assert_eq!(config.mode, RunMode::Full);
        assert_eq!(
            config.address_source,
            AddressSourceConfig::Explicit {
                address: "10.1.2.3".to_string()
            }
        );
    }

    #[test]
    fn selectors_pick_metadata_sources() {
        let cli = parse(&["--ipaddress", "ecs"]);
        assert_eq!(
            cli.to_config().unwrap().address_source,
            AddressSourceConfig::TaskMetadata
        );

        let cli = parse(&["--ipaddress", "local-ipv4"]);
        assert_eq!(
            cli.to_config().unwrap().address_source.type_name(),
            "instance-metadata"
        );
    }

    #[test]
    fn register_and_unregister_select_modes() {
        assert_eq!(
            parse(&["--register"]).to_config().unwrap().mode,
            RunMode::PublishOnly
        );
        assert_eq!(
            parse(&["--unregister"]).to_config().unwrap().mode,
            RunMode::RetractOnly
        );
    }

    #[test]
    fn register_wins_over_unregister() {
        let config = parse(&["--register", "--unregister"]).to_config().unwrap();
        assert_eq!(config.mode, RunMode::PublishOnly);
    }

    #[test]
    fn log_level_parses() {
        assert_eq!(parse(&["--log-level", "debug"]).log_level, Level::DEBUG);
        assert!(Cli::try_parse_from(["route53-sidecar", "--log-level", "loud"]).is_err());
    }

    #[test]
    fn invalid_record_name_is_rejected() {
        let result = parse(&["--dns", "bad..name"]).to_config();
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
