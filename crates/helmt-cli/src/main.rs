//! helmt - a simple wrapper around helm template
//!
//! Reads a chart descriptor (default `helm-chart.yaml`), fetches the chart
//! with helm, renders it and moves the result to `<outputDirectory>/<chart>`.

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use helmt_core::{Credentials, Pipeline, SystemRunner};

mod display;
mod error;
mod exit_codes;
mod settings;

use error::Result;
use settings::Settings;

const DESCRIPTOR_HELP: &str = "\
The descriptor contains all necessary information:

  chart: jenkins
  version: 2.0.0
  repository: https://kubernetes-charts.storage.googleapis.com
  releaseName: jenkins
  namespace: jenkins
  valuesFiles:
    - values1.yaml
    - values2.yaml
  skipCRDs: false
  outputDirectory: manifests
  postProcess:
    generateKustomization: false
  apiVersions:
    - app/v1

namespace, valuesFiles, skipCRDs, outputDirectory, apiVersions and
postProcess are optional. Repositories starting with oci:// are fetched
from an OCI registry.";

#[derive(Parser)]
#[command(name = "helmt")]
#[command(version)]
#[command(about = "A simple wrapper around helm template", long_about = None)]
#[command(after_long_help = DESCRIPTOR_HELP)]
struct Cli {
    /// Chart descriptor file
    #[arg(default_value = "helm-chart.yaml")]
    descriptor: PathBuf,

    /// Config file (default is $HOME/.helmt.yaml)
    #[arg(long, env = "HELMT_CONFIG")]
    config: Option<PathBuf>,

    /// Optional username for chart repository
    #[arg(short, long, env = "HELMT_USERNAME")]
    username: Option<String>,

    /// Optional password for chart repository
    #[arg(short, long, env = "HELMT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// helm executable to invoke
    #[arg(long = "helm", env = "HELMT_HELM")]
    helm: Option<String>,

    /// Deprecated - cleaning is done by default
    #[arg(long, hide = true)]
    clean: bool,

    /// Enable debug output
    #[arg(long)]
    debug: bool,
}

fn main() {
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(err) = run(cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_logging(debug: bool) {
    let default = if debug { "helmt=debug,helmt_core=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    if cli.clean {
        display::warning("--clean is deprecated, output is always cleaned");
    }

    let settings = Settings::load(cli.config.as_deref())?;
    if let Some(source) = &settings.source {
        display::config_used(source);
    }

    display::templating(&cli.descriptor);

    let credentials = Credentials::new(
        Settings::resolve(cli.username, settings.username.as_ref()),
        Settings::resolve(cli.password, settings.password.as_ref()),
    );
    let helm = Settings::resolve(cli.helm, settings.helm.as_ref())
        .unwrap_or_else(|| "helm".to_string());
    tracing::debug!(helm = %helm, descriptor = %cli.descriptor.display(), "starting");

    let runner = SystemRunner::new().with_secret(credentials.password.clone());
    let report = Pipeline::new(&runner)
        .with_credentials(credentials)
        .with_helm_binary(helm)
        .run(&cli.descriptor)?;

    display::report(&report);
    Ok(())
}
