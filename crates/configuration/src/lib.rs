use rust_decimal::Decimal;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use settings::{Config, MarketData, Reporting, Simulation};

/// Loads the application configuration from the `config.toml` file.
///
/// The file is optional: every field has a default, so a bare deployment runs
/// without any configuration on disk.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from("config.toml")
}

/// Loads configuration from an explicit path, validating ranges on load.
pub fn load_config_from(path: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    let simulation = &config.simulation;
    if simulation.commission_per_trade < Decimal::ZERO {
        return Err(ConfigError::ValidationError(format!(
            "simulation.commission_per_trade must be non-negative, got {}",
            simulation.commission_per_trade
        )));
    }
    if simulation.slippage_pct < Decimal::ZERO || simulation.slippage_pct >= Decimal::ONE {
        return Err(ConfigError::ValidationError(format!(
            "simulation.slippage_pct must be in [0, 1), got {}",
            simulation.slippage_pct
        )));
    }
    if simulation.spread_pct < Decimal::ZERO || simulation.spread_pct >= Decimal::ONE {
        return Err(ConfigError::ValidationError(format!(
            "simulation.spread_pct must be in [0, 1), got {}",
            simulation.spread_pct
        )));
    }
    if config.market_data.quote_timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "market_data.quote_timeout_ms must be positive".to_string(),
        ));
    }
    if config.reporting.recent_executions == 0 {
        return Err(ConfigError::ValidationError(
            "reporting.recent_executions must be positive".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn defaults_cover_every_field() {
        let config = Config::default();
        assert_eq!(config.simulation.commission_per_trade, Decimal::ZERO);
        assert_eq!(config.simulation.slippage_pct, dec!(0.001));
        assert_eq!(config.simulation.spread_pct, dec!(0.001));
        assert_eq!(config.market_data.quote_timeout_ms, 2000);
        assert_eq!(config.reporting.recent_executions, 10);
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn validation_rejects_out_of_range_values() {
        let mut config = Config::default();
        config.simulation.slippage_pct = dec!(1.5);
        assert!(matches!(
            validate(&config),
            Err(ConfigError::ValidationError(_))
        ));

        let mut config = Config::default();
        config.simulation.commission_per_trade = dec!(-1);
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.reporting.recent_executions = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_config_from("does-not-exist.toml").unwrap();
        assert_eq!(config.simulation.slippage_pct, dec!(0.001));
    }
}
