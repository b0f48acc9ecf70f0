mod cli;
mod fixture;

use crate::cli::Cli;
use clap::Parser;
use config::Config;
use reconciler::{
    ControlEvent, DefaultDetector, EventSink, HttpEventSink, InMemoryCluster,
    InMemoryPolicyStore, NoopSink, PolicyStore, ReloadBundle, Services, ShieldEngine,
    SystemClock,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // NOTE: The verbosity flag takes precedence over the environment
    // variable for log control. For example, `SHIELD_LOG=warn shield-rs
    // -vvv` will still log at the trace level. The environment variable
    // (`SHIELD_LOG`) can only set the log level per crate, not override the
    // verbosity flag.
    let env_filter = EnvFilter::builder()
        .with_env_var("SHIELD_LOG")
        .from_env()?
        .add_directive(cli.verbosity.log_level_filter().as_str().parse()?);

    let layer = tracing_subscriber::fmt::layer()
        .with_level(true)
        .with_file(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(layer)
        .with(env_filter)
        .init();

    let config = load_config(&cli.conffile)?;
    debug!(?config, ?cli);

    // cluster state: the standalone stand-in for a live watch
    let cluster = InMemoryCluster::new();
    let store = Arc::new(InMemoryPolicyStore::new());
    let keys = fixture::populate(fixture::load(&cli.cluster_file)?, &cluster, &store)?;
    info!(
        workloads = keys.len(),
        policies = store.len(),
        "cluster state loaded"
    );

    let services = Services {
        source: Box::new(cluster.clone()),
        detector: Box::new(DefaultDetector),
        enforcer: Box::new(cluster.clone()),
        sink: build_sink(&config)?,
        clock: Box::new(SystemClock),
    };
    let mut engine = ShieldEngine::new(config, services, store.clone());

    if cli.once {
        engine.resync_policies().await?;
        for key in &keys {
            let report = engine.reconcile(key).await?;
            info!(
                workload = %key,
                outcome = ?report.outcome,
                violations = report.violations,
                terminated = report.terminated,
                "pass finished"
            );
        }
        for policy in store.list().await? {
            info!(
                policy = %policy.name,
                mode = ?policy.spec.enforcement_mode,
                violations = policy.status.violations_count,
                terminations = policy.status.terminations_count,
                "policy status"
            );
        }
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let (control_tx, control_rx) = mpsc::unbounded_channel();
    let (work_tx, work_rx) = mpsc::unbounded_channel();
    for key in keys {
        let _ = work_tx.send(key);
    }

    // install signal handlers: SIGHUP reloads config, SIGUSR1 dumps
    // status, SIGUSR2 forces a policy status refresh
    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigusr1 = signal(SignalKind::user_defined1())?;
    let mut sigusr2 = signal(SignalKind::user_defined2())?;
    let signal_cancel = cancel.clone();
    let conffile = cli.conffile.clone();
    let reload_cluster = cluster.clone();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if let Err(err) = result {
                        warn!(%err, "ctrl-c handler failed");
                    }
                    signal_cancel.cancel();
                    break;
                }
                _ = sighup.recv() => {
                    debug!("reload requested");
                    match reload_bundle(&conffile, &reload_cluster) {
                        Ok(bundle) => {
                            let _ = control_tx.send(ControlEvent::Reload(Box::new(bundle)));
                        }
                        Err(err) => warn!(%err, "config reload failed"),
                    }
                }
                _ = sigusr1.recv() => {
                    debug!("status dump requested");
                    let _ = control_tx.send(ControlEvent::DumpStatus);
                }
                _ = sigusr2.recv() => {
                    debug!("policy resync requested");
                    let _ = control_tx.send(ControlEvent::ResyncNow);
                }
            }
        }
    });

    engine.run_until(cancel, control_rx, work_rx).await?;
    Ok(())
}

fn load_config(conffile: &Option<PathBuf>) -> anyhow::Result<Config> {
    match conffile {
        Some(path) => Ok(Config::load(path)?),
        None => {
            let mut candidates = glob::glob("/etc/shield-rs/config.d/*.toml")?
                .filter_map(Result::ok)
                .collect::<Vec<_>>();
            candidates.insert(0, "/etc/shield-rs/config.toml".into());
            trace!(?candidates, "config file candidates");
            Ok(Config::load_multiple(candidates)?)
        }
    }
}

fn build_sink(config: &Config) -> anyhow::Result<Box<dyn EventSink + Send + Sync>> {
    if config.audit.emission_enabled() {
        let sink = HttpEventSink::new(config.audit.sink_url.clone(), config.audit.timeout)?;
        Ok(Box::new(sink))
    } else {
        debug!("audit sink not configured, event emission disabled");
        Ok(Box::new(NoopSink))
    }
}

fn reload_bundle(
    conffile: &Option<PathBuf>,
    cluster: &InMemoryCluster,
) -> anyhow::Result<ReloadBundle> {
    let config = load_config(conffile)?;
    let sink = build_sink(&config)?;
    Ok(ReloadBundle {
        config,
        detector: Box::new(DefaultDetector),
        enforcer: Box::new(cluster.clone()),
        sink,
    })
}
