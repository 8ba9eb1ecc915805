//! Configuration validation
//!
//! Runs once, before the target is touched. A configuration that passes is
//! never re-checked by the core.

use super::*;
use crate::error::ConfigError;

/// Required block size multiple for O_DIRECT
pub const DIRECT_IO_ALIGNMENT: usize = 512;

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    validate_run(&config.run)?;
    validate_target(&config.target, &config.run)?;
    Ok(())
}

/// Validate run parameters
pub fn validate_run(run: &RunConfig) -> Result<(), ConfigError> {
    if run.block_count == 0 {
        return Err(ConfigError::ZeroBlockCount);
    }

    validate_block_size(run.block_size, run.digest)?;

    if run.required_size().is_none() {
        return Err(ConfigError::RangeTooLarge {
            block_count: run.block_count,
            block_size: run.block_size,
        });
    }

    if run.start_block >= run.block_count {
        return Err(ConfigError::StartBeyondEnd {
            start_block: run.start_block,
            block_count: run.block_count,
        });
    }

    if run.iterations == 0 {
        return Err(ConfigError::ZeroIterations);
    }

    if run.workers == Some(0) {
        return Err(ConfigError::ZeroWorkers);
    }

    Ok(())
}

/// Validate a block size against the content digest
pub fn validate_block_size(block_size: usize, digest: DigestAlgorithm) -> Result<(), ConfigError> {
    if block_size == 0 {
        return Err(ConfigError::ZeroBlockSize);
    }

    let digest_size = digest.digest_size();
    if block_size % digest_size != 0 {
        return Err(ConfigError::MisalignedBlockSize {
            block_size,
            digest: digest.name(),
            digest_size,
        });
    }
    Ok(())
}

fn validate_target(target: &TargetConfig, run: &RunConfig) -> Result<(), ConfigError> {
    if target.direct && run.block_size % DIRECT_IO_ALIGNMENT != 0 {
        return Err(ConfigError::DirectIoAlignment {
            block_size: run.block_size,
        });
    }
    Ok(())
}

/// Check that an opened target can hold the whole block range
///
/// Only fixed-size targets are checked; regular files grow on write.
pub fn validate_target_capacity(
    run: &RunConfig,
    target_size: u64,
    fixed_size: bool,
) -> Result<(), ConfigError> {
    let required = run.required_size().ok_or(ConfigError::RangeTooLarge {
        block_count: run.block_count,
        block_size: run.block_size,
    })?;
    if fixed_size && target_size < required {
        return Err(ConfigError::TargetTooSmall {
            target_size,
            required,
        });
    }
    Ok(())
}
