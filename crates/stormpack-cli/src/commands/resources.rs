use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::{error, info};

use stormpack_core::layers::{self, ConfigLayers};
use stormpack_core::{Config, JobDescriptor};
use stormpack_packing::{PackingError, PackingHost, PackingRegistry, report};

#[derive(Debug, Args)]
pub struct ResourcesArgs {
    /// Job definition file (TOML, or JSON with a .json extension)
    #[arg(short = 'n', long)]
    pub job_defn: PathBuf,
    /// Directory holding the cluster config files
    #[arg(short = 'p', long)]
    pub config_path: PathBuf,
    /// Installation home directory
    #[arg(long)]
    pub home: PathBuf,
    /// TOML file whose entries override the cluster config
    #[arg(short = 'c', long)]
    pub override_config_file: Option<PathBuf>,
    /// Release info file (TOML with a semver `version`)
    #[arg(short = 'r', long)]
    pub release_file: Option<PathBuf>,
    /// Cluster to size the job for
    #[arg(long)]
    pub cluster: String,
    /// Role submitting the job (default: $USER)
    #[arg(long)]
    pub role: Option<String>,
    /// Environment tag
    #[arg(long, default_value = "default")]
    pub environment: String,
    /// Enable debug logs
    #[arg(short, long)]
    pub verbose: bool,
    /// Indent the JSON report
    #[arg(long)]
    pub pretty: bool,
}

/// Estimate and write the report to `out`. On failure the error is logged
/// and nothing is written.
pub fn run(args: &ResourcesArgs, out: &mut impl Write) -> anyhow::Result<()> {
    match estimate(args, &PackingRegistry::with_builtins()) {
        Ok(report) => writeln!(out, "{report}").map_err(|err| {
            error!(error = %err, "failed to write resource report");
            anyhow::Error::new(err).context("writing resource report")
        }),
        Err(err) => {
            let identifier = err.downcast_ref::<PackingError>().and_then(PackingError::identifier);
            error!(identifier, "resource estimation failed, no report produced: {err:#}");
            Err(err)
        }
    }
}

/// Resolve configuration, run the packing algorithm, and render the report.
pub fn estimate(args: &ResourcesArgs, registry: &PackingRegistry) -> anyhow::Result<String> {
    let job = JobDescriptor::from_file(&args.job_defn)
        .with_context(|| format!("loading job definition {}", args.job_defn.display()))?;
    let config = resolve_config(args, &job)?;

    info!(
        job = %job.name,
        cluster = %args.cluster,
        components = job.components.len(),
        "estimating resources"
    );

    let mut host = PackingHost::new(registry);
    let plan = host.run(&config, &job)?;

    let rendered = if args.pretty {
        report::format_pretty(&job.name, &plan)?
    } else {
        report::format(&job.name, &plan)?
    };
    Ok(rendered)
}

/// Defaults → overrides → command line → job.
pub fn resolve_config(args: &ResourcesArgs, job: &JobDescriptor) -> anyhow::Result<Config> {
    let role = args.role.clone().unwrap_or_else(default_role);

    let layers = ConfigLayers {
        defaults: layers::build_defaults(&args.home, &args.config_path, args.release_file.as_deref())
            .context("loading default configuration")?,
        overrides: layers::build_overrides(args.override_config_file.as_deref())
            .context("loading override configuration")?,
        command_line: layers::build_from_command_line(
            &args.cluster,
            &role,
            &args.environment,
            args.verbose,
        ),
        job: layers::build_from_job(&args.job_defn, job),
    };
    Ok(layers.resolve())
}

fn default_role() -> String {
    std::env::var("USER").unwrap_or_else(|_| "unknown".to_string())
}
