use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::path::{Path, PathBuf};

/// shield-rs: declarative policy enforcement for container workloads
///
/// shield-rs evaluates running workloads against declared policies
/// (privileged-container blocking, registry allowlisting), reports
/// violations to an audit service and, in enforcing mode, terminates
/// non-compliant workloads.
#[derive(Debug, Parser, Clone)]
#[command(about, long_about, version)]
pub struct Cli {
    /// Path to configuration file.
    ///
    /// If not provided, the default locations are checked. They are
    /// `/etc/shield-rs/config.toml` and `/etc/shield-rs/config.d/*.toml`,
    /// where the latter being a glob pattern. If they don't exist, the
    /// default configuration is used.
    #[arg(short, long, value_parser = validate_file)]
    pub conffile: Option<PathBuf>,

    /// Cluster state file.
    ///
    /// A TOML document declaring the policies and workloads this
    /// standalone build evaluates; it stands in for the cluster watch.
    #[arg(short = 'f', long, value_parser = validate_file)]
    pub cluster_file: PathBuf,

    /// Sweep the cluster state once, log every policy status, and exit
    /// instead of running as a daemon.
    #[arg(long)]
    pub once: bool,

    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,
}

/// Check if the file exists.
#[inline(always)]
fn validate_file(file: &str) -> Result<PathBuf, String> {
    let path = Path::new(file);
    if path.exists() {
        Ok(path.to_owned())
    } else {
        Err(format!("File not found: {:?}", path))
    }
}
