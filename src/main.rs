//! blockstress CLI entry point

use anyhow::{Context, Result};
use blockstress::config::cli::Cli;
use blockstress::config::toml::{merge_cli_with_config, parse_toml_file, FileConfig};
use blockstress::config::validator::{validate_config, validate_target_capacity};
use blockstress::config::Config;
use blockstress::coordinator::Coordinator;
use blockstress::output::json::{write_json_output, JsonReport};
use blockstress::output::text::{print_configuration, print_results, ConsoleReporter};
use blockstress::target::file::{probe_size, FileTarget};
use blockstress::target::{OpenFlags, Target};
use blockstress::util::logging;
use tracing::{debug, error, info};

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    logging::init(cli.debug);

    println!("blockstress v{}", env!("CARGO_PKG_VERSION"));
    println!();

    let config = build_config(&cli)?;
    validate_config(&config).context("Configuration validation failed")?;

    print_configuration(&config);
    println!();

    if cli.dry_run {
        println!("Dry run: configuration is valid, target left untouched.");
        return Ok(());
    }

    run(&config)
}

fn build_config(cli: &Cli) -> Result<Config> {
    let file = match &cli.config {
        Some(path) => parse_toml_file(path)?,
        None => FileConfig::default(),
    };
    let config = merge_cli_with_config(cli, file, probe_size)?;
    debug!(?config, "configuration built");
    Ok(config)
}

fn run(config: &Config) -> Result<()> {
    let flags = OpenFlags {
        direct: config.target.direct,
        sync: config.target.sync,
    };
    let mut target = FileTarget::open(&config.target.path, flags)?;
    info!(
        path = %target.path().display(),
        block_device = target.is_block_device(),
        size = target.size(),
        "target opened"
    );
    validate_target_capacity(&config.run, target.size(), target.is_fixed_size())
        .context("Configuration validation failed")?;

    let mut reporter = ConsoleReporter::new(config);
    let summary = Coordinator::new(&config.run)
        .flush_writes(config.target.flush)
        .run(&mut target, &mut reporter)
        .map_err(|e| {
            error!(block = ?e.block(), "run aborted: {}", e);
            e
        })
        .with_context(|| format!("Run against {} failed", config.target.path.display()))?;

    println!();
    print_results(&summary);

    if let Some(path) = &config.output.json_output {
        write_json_output(path, &JsonReport::new(config, &summary))?;
        println!("JSON summary written to {}", path.display());
    }

    Ok(())
}
