use crate::domain::generation::CostSchedule;
use crate::domain::points::{LedgerPolicy, PointsSettings};
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub ledger_backend: LedgerBackend,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub environment: Environment,
    pub log_format: LogFormat,
    // Points
    pub signup_bonus_points: i64,
    pub daily_checkin_points: i64,
    // Pricing
    pub generation_base_cost: i64,
    pub long_form_multiplier: i64,
    pub long_form_threshold_minutes: u32,
    pub max_content_chars: usize,
    // Ledger store policy
    pub ledger_op_timeout_ms: u64,
    pub ledger_max_conflict_retries: u32,
    // Generation pipeline
    pub pipeline_base_url: String,
    pub pipeline_callback_token: String,
    pub pipeline_timeout_secs: u64,
    pub public_base_url: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    Postgres,
    Memory,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup; `from_env` passes the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Box<dyn std::error::Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| format!("{} must be set", key))
        };

        let host = var("HOST", "0.0.0.0");
        let port: u16 = var("PORT", "8080").parse()?;

        let ledger_backend = match var("LEDGER_BACKEND", "postgres").to_lowercase().as_str() {
            "postgres" => LedgerBackend::Postgres,
            "memory" => LedgerBackend::Memory,
            other => return Err(format!("Unknown LEDGER_BACKEND: {}", other).into()),
        };

        let database_url = match ledger_backend {
            LedgerBackend::Postgres => Some(required("DATABASE_URL")?),
            LedgerBackend::Memory => lookup("DATABASE_URL"),
        };

        let config = Config {
            public_base_url: lookup("PUBLIC_BASE_URL")
                .unwrap_or_else(|| format!("http://{}:{}", host, port)),
            host,
            port,
            ledger_backend,
            database_url,
            jwt_secret: required("JWT_SECRET")?,
            environment: match var("ENVIRONMENT", "development").as_str() {
                "production" => Environment::Production,
                _ => Environment::Development,
            },
            log_format: match var("LOG_FORMAT", "pretty").as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            signup_bonus_points: var("SIGNUP_BONUS_POINTS", "100").parse()?,
            daily_checkin_points: var("DAILY_CHECKIN_POINTS", "10").parse()?,
            generation_base_cost: var("GENERATION_BASE_COST", "20").parse()?,
            long_form_multiplier: var("LONG_FORM_MULTIPLIER", "2").parse()?,
            long_form_threshold_minutes: var("LONG_FORM_THRESHOLD_MINUTES", "5").parse()?,
            max_content_chars: var("MAX_CONTENT_CHARS", "20000").parse()?,
            ledger_op_timeout_ms: var("LEDGER_OP_TIMEOUT_MS", "3000").parse()?,
            ledger_max_conflict_retries: var("LEDGER_MAX_CONFLICT_RETRIES", "3").parse()?,
            pipeline_base_url: required("PIPELINE_BASE_URL")?,
            pipeline_callback_token: required("PIPELINE_CALLBACK_TOKEN")?,
            pipeline_timeout_secs: var("PIPELINE_TIMEOUT_SECS", "10").parse()?,
            cors_allowed_origins: var("CORS_ALLOWED_ORIGINS", "")
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect(),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.signup_bonus_points < 0 {
            return Err("SIGNUP_BONUS_POINTS cannot be negative".into());
        }
        if self.daily_checkin_points < 0 {
            return Err("DAILY_CHECKIN_POINTS cannot be negative".into());
        }
        if self.generation_base_cost <= 0 {
            return Err("GENERATION_BASE_COST must be positive".into());
        }
        if self.long_form_multiplier <= 0 {
            return Err("LONG_FORM_MULTIPLIER must be positive".into());
        }
        if self.max_content_chars == 0 {
            return Err("MAX_CONTENT_CHARS must be positive".into());
        }
        if self.ledger_op_timeout_ms == 0 {
            return Err("LEDGER_OP_TIMEOUT_MS must be positive".into());
        }
        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn ledger_policy(&self) -> LedgerPolicy {
        LedgerPolicy::new(
            Duration::from_millis(self.ledger_op_timeout_ms),
            self.ledger_max_conflict_retries,
        )
    }

    pub fn points_settings(&self) -> PointsSettings {
        PointsSettings {
            signup_bonus: self.signup_bonus_points,
            daily_checkin_points: self.daily_checkin_points,
        }
    }

    pub fn cost_schedule(&self) -> CostSchedule {
        CostSchedule {
            base_cost: self.generation_base_cost,
            long_form_multiplier: self.long_form_multiplier,
            long_form_threshold_minutes: self.long_form_threshold_minutes,
        }
    }
}
