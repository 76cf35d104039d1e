//! # Command Line
//!
//! Flags for running the suite from CI: which service to hit, which cases to
//! run, where to write the report and when to exit non-zero.
//!
//! ```text
//! api-conformance --base-url http://localhost:3000 --tag smoke --report out/run.json
//! ```

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::{ConfigError, HarnessConfig};
use crate::runner::RunSummary;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Conformance suite for HTTP/JSON resource APIs", long_about = None)]
pub struct CliArgs {
    /// JSON configuration file. Flags override its values.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Base URL of the service under test.
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Per-request timeout in milliseconds.
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Only run cases carrying one of these tags.
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Skip cases carrying any of these tags.
    #[arg(long = "exclude-tag", value_name = "TAG")]
    pub exclude_tags: Vec<String>,

    /// Add a concurrency burst case per resource (default size 5, at most 100).
    #[arg(
        long,
        value_name = "N",
        num_args = 0..=1,
        default_missing_value = "5"
    )]
    pub burst: Option<usize>,

    /// Skip TLS certificate verification.
    #[arg(long)]
    pub insecure: bool,

    /// Write the JSON run report to this path.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Summary format printed to stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Which verdicts make the process exit with status 1.
    #[arg(long, value_enum, default_value_t = FailOn::Fail)]
    pub fail_on: FailOn,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub json_logs: bool,
}

/// Output format for the summary printed at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum FailOn {
    #[default]
    Fail,
    FailOrInconclusive,
    Never,
}

impl FailOn {
    pub fn should_fail(self, summary: &RunSummary) -> bool {
        match self {
            FailOn::Fail => summary.failed > 0,
            FailOn::FailOrInconclusive => summary.failed > 0 || summary.inconclusive > 0,
            FailOn::Never => false,
        }
    }
}

impl CliArgs {
    /// Defaults, then the config file, then flags.
    pub fn load_config(&self) -> Result<HarnessConfig, ConfigError> {
        let config = match &self.config {
            Some(path) => HarnessConfig::from_path(path)?,
            None => HarnessConfig::default(),
        };
        let config = self.apply(config);
        config.validate()?;
        Ok(config)
    }

    pub fn apply(&self, mut config: HarnessConfig) -> HarnessConfig {
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.trim().to_string();
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        if self.insecure {
            config.verify_ssl = false;
        }
        if let Some(size) = self.burst {
            config.burst_size = Some(size);
        }
        config
            .selection
            .include_tags
            .extend(self.tags.iter().cloned());
        config
            .selection
            .exclude_tags
            .extend(self.exclude_tags.iter().cloned());
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_BURST_SIZE;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("api-conformance").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn flags_override_defaults() {
        let args = parse(&[
            "--base-url",
            "http://localhost:3000",
            "--timeout-ms",
            "500",
            "--tag",
            "smoke",
            "--tag",
            "auth",
            "--exclude-tag",
            "security",
            "--insecure",
        ]);
        let config = args.load_config().unwrap();

        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.timeout_ms, 500);
        assert!(!config.verify_ssl);
        assert_eq!(config.selection.include_tags.len(), 2);
        assert!(config.selection.exclude_tags.contains("security"));
        assert_eq!(config.burst_size, None);
    }

    #[test]
    fn bare_burst_flag_uses_the_default_size() {
        assert_eq!(parse(&["--burst"]).burst, Some(DEFAULT_BURST_SIZE));
        assert_eq!(parse(&["--burst", "12"]).burst, Some(12));
        assert_eq!(parse(&[]).burst, None);
    }

    #[test]
    fn invalid_overrides_are_rejected() {
        let err = parse(&["--timeout-ms", "0"]).load_config().unwrap_err();
        assert!(matches!(err, ConfigError::ZeroTimeout));

        let err = parse(&["--base-url", "ftp://example.com"]).load_config().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }));

        let err = parse(&["--burst", "1000000"]).load_config().unwrap_err();
        assert!(matches!(err, ConfigError::BurstTooLarge(1_000_000)));
    }

    #[test]
    fn fail_on_policies() {
        let summary = RunSummary {
            total: 3,
            passed: 2,
            inconclusive: 1,
            ..RunSummary::default()
        };
        assert!(!FailOn::Fail.should_fail(&summary));
        assert!(FailOn::FailOrInconclusive.should_fail(&summary));
        assert!(!FailOn::Never.should_fail(&summary));
        assert_eq!(
            parse(&["--fail-on", "fail-or-inconclusive"]).fail_on,
            FailOn::FailOrInconclusive
        );
        assert_eq!(parse(&["--format", "json"]).format, OutputFormat::Json);
    }
}
