use std::{env, fmt, str::FromStr};

use log::{info, warn};

use crate::constants::{
    DEFAULT_PORT, FIELD_MAX_LENGTH, MAX_COOKING_TIME, MAX_INGREDIENT_AMOUNT, MIN_COOKING_TIME,
    MIN_INGREDIENT_AMOUNT, RECIPE_COUNT_PER_PAGE, SESSION_LIFETIME_HOURS,
};

/// Bounds applied by request validation.
///
/// Passed explicitly into the recipe writer and the other validating actions
/// so tests can run them against narrower limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub min_cooking_time: i32,
    pub max_cooking_time: i32,
    pub min_amount: i32,
    pub max_amount: i32,
    pub max_field_length: usize,
    pub page_size: i64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            min_cooking_time: MIN_COOKING_TIME,
            max_cooking_time: MAX_COOKING_TIME,
            min_amount: MIN_INGREDIENT_AMOUNT,
            max_amount: MAX_INGREDIENT_AMOUNT,
            max_field_length: FIELD_MAX_LENGTH,
            page_size: RECIPE_COUNT_PER_PAGE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub secret: String,
    pub session_hours: i64,
    pub limits: Limits,
}

#[derive(Debug)]
pub struct ConfigError {
    key: &'static str,
    info: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid configuration for {}: {}", self.key, self.info)
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Limits::default();

        let limits = Limits {
            max_cooking_time: try_load("FOODGRAM_MAX_COOKING_TIME", defaults.max_cooking_time)?,
            max_amount: try_load("FOODGRAM_MAX_AMOUNT", defaults.max_amount)?,
            page_size: try_load("FOODGRAM_PAGE_SIZE", defaults.page_size)?,
            ..defaults
        };

        if limits.max_cooking_time < limits.min_cooking_time || limits.max_amount < limits.min_amount
        {
            return Err(ConfigError {
                key: "FOODGRAM_MAX_*",
                info: String::from("upper bound is below the lower bound"),
            });
        }

        if limits.page_size < 1 {
            return Err(ConfigError {
                key: "FOODGRAM_PAGE_SIZE",
                info: String::from("must be positive"),
            });
        }

        Ok(Self {
            port: try_load("FOODGRAM_PORT", DEFAULT_PORT)?,
            database_url: require("DATABASE_URL")?,
            secret: require("FOODGRAM_SECRET")?,
            session_hours: try_load("FOODGRAM_SESSION_HOURS", SESSION_LIFETIME_HOURS)?,
            limits,
        })
    }
}

fn require(key: &'static str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError {
            key,
            info: String::from("environment variable is not set"),
        }),
    }
}

fn try_load<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + fmt::Display,
    T::Err: fmt::Display,
{
    match env::var(key) {
        Ok(value) => value.trim().parse().map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError {
                key,
                info: e.to_string(),
            }
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
