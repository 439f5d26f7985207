//! Configuration loaded from the environment

use std::time::Duration;

use ess_client::EssConfig;
use ps2_census::CensusConfig;

use crate::error::{LookupError, Result};

pub struct LookupConfig {
    pub census: CensusConfig,
    pub ess: EssConfig,
    /// Character cache override as (capacity, time to use)
    pub character_cache: Option<(usize, Duration)>,
}

pub fn load_config() -> Result<LookupConfig> {
    let character_cache = cache_policy(
        std::env::var("CHARACTER_CACHE_SIZE").ok(),
        std::env::var("CHARACTER_CACHE_TTU_SECS").ok(),
    )?;

    Ok(LookupConfig {
        census: CensusConfig::from_env(),
        ess: EssConfig::from_env(),
        character_cache,
    })
}

fn cache_policy(size: Option<String>, ttu: Option<String>) -> Result<Option<(usize, Duration)>> {
    let Some(size) = size else {
        return Ok(None);
    };
    let size = size
        .trim()
        .parse::<usize>()
        .map_err(|_| LookupError::Config(format!("invalid CHARACTER_CACHE_SIZE: {}", size)))?;
    let ttu = match ttu {
        Some(secs) => secs
            .trim()
            .parse::<u64>()
            .map_err(|_| LookupError::Config(format!("invalid CHARACTER_CACHE_TTU_SECS: {}", secs)))?,
        None => 30,
    };
    Ok(Some((size, Duration::from_secs(ttu))))
}
