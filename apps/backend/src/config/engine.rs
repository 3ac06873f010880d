//! Explicit engine configuration. The engine never inspects the environment;
//! `from_env` is only called by the binary.

use std::env;
use std::str::FromStr;

use serde::Deserialize;

use crate::collaborators::ImageBackend;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Hand jobs to the worker; when false, jobs are dropped.
    pub run_scheduled_jobs: bool,
    pub compress_images: bool,
    pub image_max_dimension: u32,
    pub image_jpeg_quality: u8,
    pub default_image_backend: ImageBackend,
    /// Append a narrated CONCLUSION round once a duel completes.
    pub narrate_conclusion: bool,
    pub shortcode_max_attempts: u32,
    pub max_lock_retries: u32,
    pub job_max_attempts: u32,
    pub job_retry_backoff_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            run_scheduled_jobs: true,
            compress_images: true,
            image_max_dimension: 1024,
            image_jpeg_quality: 80,
            default_image_backend: ImageBackend::ContextAware,
            narrate_conclusion: true,
            shortcode_max_attempts: 64,
            max_lock_retries: 5,
            job_max_attempts: 3,
            job_retry_backoff_ms: 250,
        }
    }
}

fn parse_var<T>(name: &str, current: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| AppError::config(format!("{name} has invalid value '{raw}': {e}"))),
        Err(_) => Ok(current),
    }
}

impl EngineConfig {
    /// Overlay `DUEL_*` variables on the defaults.
    pub fn from_env() -> Result<Self, AppError> {
        let d = Self::default();
        Ok(Self {
            run_scheduled_jobs: parse_var("DUEL_RUN_SCHEDULED_JOBS", d.run_scheduled_jobs)?,
            compress_images: parse_var("DUEL_COMPRESS_IMAGES", d.compress_images)?,
            image_max_dimension: parse_var("DUEL_IMAGE_MAX_DIMENSION", d.image_max_dimension)?,
            image_jpeg_quality: parse_var("DUEL_IMAGE_JPEG_QUALITY", d.image_jpeg_quality)?,
            default_image_backend: parse_var("DUEL_IMAGE_BACKEND", d.default_image_backend)?,
            narrate_conclusion: parse_var("DUEL_NARRATE_CONCLUSION", d.narrate_conclusion)?,
            shortcode_max_attempts: parse_var(
                "DUEL_SHORTCODE_MAX_ATTEMPTS",
                d.shortcode_max_attempts,
            )?,
            max_lock_retries: parse_var("DUEL_MAX_LOCK_RETRIES", d.max_lock_retries)?,
            job_max_attempts: parse_var("DUEL_JOB_MAX_ATTEMPTS", d.job_max_attempts)?,
            job_retry_backoff_ms: parse_var("DUEL_JOB_RETRY_BACKOFF_MS", d.job_retry_backoff_ms)?,
        })
    }

    /// Defaults without retry backoff.
    pub fn for_tests() -> Self {
        Self {
            job_retry_backoff_ms: 0,
            ..Self::default()
        }
    }
}
