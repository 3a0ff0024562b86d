use crate::config::ManifestConfig;
use crate::driver::{self, Driver};
use crate::error::Result;
use crate::profiler::Profiler;
use crate::types::BundlerConfig;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

#[derive(Parser)]
#[command(name = "bundlr")]
#[command(about = "Dependency-graph-driven asset bundler for front-end source trees", long_about = None)]
#[command(version)]
struct Cli {
  #[command(subcommand)]
  command: Commands,

  /// Enable debug logging
  #[arg(short, long, global = true)]
  debug: bool,

  /// CI mode: suppress all logs, only output results
  #[arg(long, global = true)]
  ci: bool,
}

#[derive(Subcommand)]
enum Commands {
  /// Build all configured entry points and asset files
  Build {
    /// Path to the bundler manifest (bundlr.json)
    #[arg(long, default_value = "bundlr.json")]
    config: PathBuf,

    /// Root directory the manifest paths are relative to
    #[arg(long)]
    project_root: Option<PathBuf>,

    /// Force development mode (per-item caching, incremental output)
    #[arg(long)]
    dev: bool,

    /// Force release mode even if the manifest says dev
    #[arg(long, conflicts_with = "dev")]
    release: bool,

    /// Output the build summary as JSON
    #[arg(long)]
    json: bool,

    /// Enable performance profiling (also: BUNDLER_PROFILE=1)
    #[arg(long)]
    profile: bool,
  },
  /// Remove the output directory and the on-disk cache
  Clean {
    /// Path to the bundler manifest (bundlr.json)
    #[arg(long, default_value = "bundlr.json")]
    config: PathBuf,

    /// Root directory the manifest paths are relative to
    #[arg(long)]
    project_root: Option<PathBuf>,
  },
}

pub fn run() -> Result<()> {
  let cli = Cli::parse();

  let log_level = if cli.ci {
    "error"
  } else if cli.debug {
    "debug"
  } else {
    "warn"
  };
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("bundlr={}", log_level).into()),
    )
    .without_time()
    .with_target(false)
    .init();

  match cli.command {
    Commands::Build {
      config,
      project_root,
      dev,
      release,
      json,
      profile,
    } => {
      let bundler_config = load_config(&config, project_root, dev, release)?;

      let enable_profiling = profile || std::env::var("BUNDLER_PROFILE").is_ok();
      if enable_profiling && !cli.ci {
        eprintln!("{}", "profiling enabled".dimmed());
      }
      let profiler = Arc::new(Profiler::new(enable_profiling));

      debug!("building with config: {:?}", bundler_config);
      let build_driver = Driver::with_profiler(bundler_config, profiler.clone());
      let summary = build_driver.build()?;

      profiler.print_report();

      if json {
        println!("{}", serde_json::to_string(&summary)?);
      } else if summary.rebuilt.is_empty() {
        println!("{}", "Nothing to rebuild".yellow());
      } else {
        println!("{}", "Rebuilt:".bold().green());
        for target in &summary.rebuilt {
          println!("  {} {}", "•".green(), target);
        }
        println!(
          "\n{} {} rebuilt, {} fresh",
          "Total:".bold(),
          summary.rebuilt.len(),
          summary.fresh.len()
        );
      }

      Ok(())
    }
    Commands::Clean {
      config,
      project_root,
    } => {
      let bundler_config = load_config(&config, project_root, false, false)?;
      driver::clean(&bundler_config)?;
      println!("{}", "Cleaned build output and cache".green());
      Ok(())
    }
  }
}

fn load_config(
  config_path: &PathBuf,
  project_root_override: Option<PathBuf>,
  force_dev: bool,
  force_release: bool,
) -> Result<BundlerConfig> {
  let mut manifest = ManifestConfig::load(config_path)?;

  if let Some(root) = project_root_override {
    manifest.project_root = Some(root);
  } else if manifest.project_root.is_none() {
    let parent = config_path
      .parent()
      .filter(|p| !p.as_os_str().is_empty())
      .map(PathBuf::from)
      .unwrap_or_else(|| PathBuf::from("."));
    manifest.project_root = Some(parent);
  }

  if force_dev {
    manifest.is_dev = Some(true);
  } else if force_release {
    manifest.is_dev = Some(false);
  }

  manifest.into_bundler_config()
}
