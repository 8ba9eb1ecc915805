//! TOML configuration file parsing
//!
//! A config file may set any run, target, or output field. Every field is
//! optional; command-line values take precedence and built-in defaults fill
//! whatever neither source provides.
//!
//! ```toml
//! [run]
//! seed = "abcdefghijk"
//! block_size = "4k"
//! blocks = 262144
//! mode = "rw"
//! iterations = 2
//! digest = "sha512"
//!
//! [target]
//! path = "/dev/sdx"
//! direct = true
//! flush = true
//!
//! [output]
//! json_output = "summary.json"
//! ```

use super::cli::Cli;
use super::cli_convert::{convert_digest, convert_mode, parse_block_size};
use super::validator::validate_block_size;
use super::*;
use crate::Result;
use anyhow::Context;
use std::fs;
use std::path::Path;

/// Contents of a config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub run: FileRunConfig,
    #[serde(default)]
    pub target: FileTargetConfig,
    #[serde(default)]
    pub output: FileOutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileRunConfig {
    pub seed: Option<String>,
    pub block_size: Option<SizeValue>,
    pub blocks: Option<u64>,
    pub start_block: Option<u64>,
    pub mode: Option<Mode>,
    pub iterations: Option<u64>,
    pub digest: Option<DigestAlgorithm>,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileTargetConfig {
    pub path: Option<PathBuf>,
    pub direct: Option<bool>,
    pub sync: Option<bool>,
    pub flush: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileOutputConfig {
    pub json_output: Option<PathBuf>,
    pub quiet: Option<bool>,
}

/// Size given either as a byte count or as a suffixed string ("4k")
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SizeValue {
    Bytes(u64),
    Text(String),
}

impl SizeValue {
    fn to_block_size(&self) -> Result<usize> {
        match self {
            SizeValue::Bytes(n) => usize::try_from(*n).context("Block size too large"),
            SizeValue::Text(s) => parse_block_size(s),
        }
    }
}

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<FileConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<FileConfig> {
    let config: FileConfig =
        ::toml::from_str(contents).context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Merge CLI arguments with file configuration (CLI takes precedence)
///
/// When neither source gives a block count, `target_size` is asked for the
/// size of the target and the count becomes `size / block_size`.
pub fn merge_cli_with_config<F>(cli: &Cli, file: FileConfig, target_size: F) -> Result<Config>
where
    F: FnOnce(&Path) -> Result<u64>,
{
    let FileConfig { run, target, output } = file;

    let path = cli
        .target
        .clone()
        .or(target.path)
        .context("No target given: pass PATH or set target.path in the config file")?;

    let block_size = match (&cli.block_size, &run.block_size) {
        (Some(s), _) => parse_block_size(s)?,
        (None, Some(value)) => value.to_block_size()?,
        (None, None) => DEFAULT_BLOCK_SIZE,
    };

    let digest = cli
        .digest
        .map(convert_digest)
        .or(run.digest)
        .unwrap_or_default();

    let block_count = match cli.blocks.or(run.blocks) {
        Some(count) => count,
        None => {
            // The target is not touched for a block size that can never run
            validate_block_size(block_size, digest)?;
            target_size(&path)? / block_size as u64
        }
    };

    let run = RunConfig {
        seed: cli
            .seed
            .clone()
            .or(run.seed)
            .unwrap_or_else(|| DEFAULT_SEED.to_string()),
        block_size,
        block_count,
        start_block: cli.start_block.or(run.start_block).unwrap_or(0),
        mode: cli.mode.map(convert_mode).or(run.mode).unwrap_or_default(),
        iterations: cli.iterations.or(run.iterations).unwrap_or(1),
        digest,
        workers: cli.workers.or(run.workers),
    };

    let target = TargetConfig {
        path,
        direct: cli.direct || target.direct.unwrap_or(false),
        sync: cli.sync || target.sync.unwrap_or(false),
        flush: cli.flush || target.flush.unwrap_or(false),
    };

    let output = OutputConfig {
        json_output: cli.json_output.clone().or(output.json_output),
        quiet: cli.quiet || output.quiet.unwrap_or(false),
    };

    Ok(Config { run, target, output })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use clap::Parser;

    fn no_probe(_: &Path) -> Result<u64> {
        panic!("target size should not be probed")
    }

    #[test]
    fn test_parse_toml_basic() {
        let file = parse_toml_string(
            r#"
            [run]
            seed = "xyz"
            block_size = "4k"
            blocks = 100
            mode = "w"
            digest = "sha512"

            [target]
            path = "/dev/sdx"
            direct = true
            "#,
        )
        .unwrap();

        assert_eq!(file.run.seed.as_deref(), Some("xyz"));
        assert_eq!(file.run.block_size, Some(SizeValue::Text("4k".to_string())));
        assert_eq!(file.run.blocks, Some(100));
        assert_eq!(file.run.mode, Some(Mode::Write));
        assert_eq!(file.run.digest, Some(DigestAlgorithm::Sha512));
        assert_eq!(file.target.path, Some(PathBuf::from("/dev/sdx")));
        assert_eq!(file.target.direct, Some(true));
    }

    #[test]
    fn test_parse_toml_numeric_block_size() {
        let file = parse_toml_string("[run]\nblock_size = 8192\n").unwrap();
        assert_eq!(file.run.block_size, Some(SizeValue::Bytes(8192)));
    }

    #[test]
    fn test_parse_toml_rejects_unknown_fields() {
        assert!(parse_toml_string("[run]\nblocksize = 512\n").is_err());
        assert!(parse_toml_string("[run]\nmode = \"sideways\"\n").is_err());
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["blockstress", "disk.img", "--blocks", "10"]).unwrap();
        let config = merge_cli_with_config(&cli, FileConfig::default(), no_probe).unwrap();

        assert_eq!(config.run.seed, DEFAULT_SEED);
        assert_eq!(config.run.block_size, DEFAULT_BLOCK_SIZE);
        assert_eq!(config.run.block_count, 10);
        assert_eq!(config.run.start_block, 0);
        assert_eq!(config.run.mode, Mode::Both);
        assert_eq!(config.run.iterations, 1);
        assert_eq!(config.run.digest, DigestAlgorithm::Sha256);
        assert_eq!(config.run.workers, None);
        assert_eq!(config.target.path, PathBuf::from("disk.img"));
        assert!(!config.target.direct);
        assert!(config.output.json_output.is_none());
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = parse_toml_string(
            r#"
            [run]
            seed = "from-file"
            block_size = 1024
            blocks = 50
            iterations = 4

            [target]
            path = "file.img"
            flush = true
            "#,
        )
        .unwrap();
        let cli = Cli::try_parse_from([
            "blockstress",
            "cli.img",
            "--seed",
            "from-cli",
            "-b",
            "2k",
        ])
        .unwrap();

        let config = merge_cli_with_config(&cli, file, no_probe).unwrap();
        assert_eq!(config.run.seed, "from-cli");
        assert_eq!(config.run.block_size, 2048);
        assert_eq!(config.run.block_count, 50);
        assert_eq!(config.run.iterations, 4);
        assert_eq!(config.target.path, PathBuf::from("cli.img"));
        assert!(config.target.flush);
    }

    #[test]
    fn test_block_count_derived_from_target_size() {
        let cli = Cli::try_parse_from(["blockstress", "disk.img", "-b", "4k"]).unwrap();
        let config = merge_cli_with_config(&cli, FileConfig::default(), |path| {
            assert_eq!(path, Path::new("disk.img"));
            Ok(10 * 4096 + 100)
        })
        .unwrap();
        assert_eq!(config.run.block_count, 10);
    }

    #[test]
    fn test_bad_block_size_rejected_before_probe() {
        let cli = Cli::try_parse_from(["blockstress", "disk.img", "-b", "0"]).unwrap();
        let err = merge_cli_with_config(&cli, FileConfig::default(), no_probe).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::ZeroBlockSize)
        );

        let cli = Cli::try_parse_from(["blockstress", "disk.img", "-b", "48"]).unwrap();
        let err = merge_cli_with_config(&cli, FileConfig::default(), no_probe).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::MisalignedBlockSize { block_size: 48, .. })
        ));
    }

    #[test]
    fn test_missing_target() {
        let cli = Cli::try_parse_from(["blockstress", "--blocks", "1"]).unwrap();
        assert!(merge_cli_with_config(&cli, FileConfig::default(), no_probe).is_err());
    }
}
