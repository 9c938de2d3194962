use std::{env, str::FromStr};

use anyhow::Context;
use rust_decimal::Decimal;

use crate::pricing::PricingPolicy;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub cors_allow_origin: Option<String>,
    pub pricing: PricingPolicy,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests don't have to touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET is not set")?;
        let host = lookup("APP_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = lookup("APP_PORT")
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let db_max_connections = lookup("DB_MAX_CONNECTIONS")
            .and_then(|n| n.parse::<u32>().ok())
            .unwrap_or(10);
        let cors_allow_origin = lookup("CORS_ALLOW_ORIGIN").filter(|o| !o.is_empty());

        let defaults = PricingPolicy::default();
        let pricing = PricingPolicy {
            tax_rate: decimal_var(&lookup, "TAX_RATE")?.unwrap_or(defaults.tax_rate),
            free_shipping_threshold: decimal_var(&lookup, "FREE_SHIPPING_THRESHOLD")?
                .unwrap_or(defaults.free_shipping_threshold),
            shipping_fee: decimal_var(&lookup, "SHIPPING_FEE")?.unwrap_or(defaults.shipping_fee),
        };

        Ok(Self {
            database_url,
            host,
            port,
            db_max_connections,
            jwt_secret,
            cors_allow_origin,
            pricing,
        })
    }
}

fn decimal_var<F>(lookup: &F, key: &str) -> anyhow::Result<Option<Decimal>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => {
            let value = Decimal::from_str(raw.trim())
                .with_context(|| format!("{key} must be a decimal number, got {raw:?}"))?;
            if value.is_sign_negative() {
                anyhow::bail!("{key} must not be negative");
            }
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rust_decimal::Decimal;

    use super::AppConfig;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_vars_missing() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.pricing.tax_rate, Decimal::new(8, 2));
        assert_eq!(config.pricing.free_shipping_threshold, Decimal::new(5000, 2));
        assert_eq!(config.pricing.shipping_fee, Decimal::new(599, 2));
        assert!(config.cors_allow_origin.is_none());
    }

    #[test]
    fn pricing_overrides_are_parsed() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("JWT_SECRET", "secret"),
            ("TAX_RATE", "0.10"),
            ("FREE_SHIPPING_THRESHOLD", "100"),
            ("SHIPPING_FEE", "7.50"),
            ("APP_PORT", "8080"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.pricing.tax_rate, Decimal::new(10, 2));
        assert_eq!(config.pricing.free_shipping_threshold, Decimal::new(100, 0));
        assert_eq!(config.pricing.shipping_fee, Decimal::new(750, 2));
    }

    #[test]
    fn missing_required_vars_fail() {
        assert!(AppConfig::from_lookup(lookup_from(&[("JWT_SECRET", "s")])).is_err());
        assert!(
            AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://x")])).is_err()
        );
    }

    #[test]
    fn malformed_or_negative_pricing_is_rejected() {
        let base = [("DATABASE_URL", "postgres://x"), ("JWT_SECRET", "s")];
        let mut bad = base.to_vec();
        bad.push(("TAX_RATE", "eight percent"));
        assert!(AppConfig::from_lookup(lookup_from(&bad)).is_err());

        let mut negative = base.to_vec();
        negative.push(("SHIPPING_FEE", "-1"));
        assert!(AppConfig::from_lookup(lookup_from(&negative)).is_err());
    }
}
