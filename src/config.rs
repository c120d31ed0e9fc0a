use std::{env, error::Error, fmt, num::NonZeroUsize, str::FromStr};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8081;
const DEFAULT_EPOCHS: usize = 10_000;
const DEFAULT_RATE: f64 = 0.5;
const DEFAULT_CHUNK: NonZeroUsize = NonZeroUsize::new(100).unwrap();

/// An environment variable held a value that could not be parsed or is out of range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid value for {}: {:?}", self.var, self.value)
    }
}

impl Error for ConfigError {}

/// Runtime settings of the dashboard binary.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub host: String,
    pub port: u16,
    pub epochs: usize,
    pub rate: f64,
    pub chunk: NonZeroUsize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            epochs: DEFAULT_EPOCHS,
            rate: DEFAULT_RATE,
            chunk: DEFAULT_CHUNK,
        }
    }
}

impl DashboardConfig {
    /// Reads the configuration from `HOST`, `PORT`, `TRAIN_EPOCHS`,
    /// `TRAIN_RATE` and `TRAIN_CHUNK`, falling back to defaults for unset ones.
    ///
    /// # Errors
    /// Returns a `ConfigError` naming the first variable that fails to parse,
    /// or `TRAIN_RATE` if the rate is not a finite positive number.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Same as `from_env` but resolves variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let rate: f64 = parse(&lookup, "TRAIN_RATE", defaults.rate)?;
        if !rate.is_finite() || rate <= 0. {
            return Err(ConfigError {
                var: "TRAIN_RATE",
                value: lookup("TRAIN_RATE").unwrap_or_else(|| rate.to_string()),
            });
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse(&lookup, "PORT", defaults.port)?,
            epochs: parse(&lookup, "TRAIN_EPOCHS", defaults.epochs)?,
            rate,
            chunk: parse(&lookup, "TRAIN_CHUNK", defaults.chunk)?,
        })
    }

    /// The `host:port` address to bind.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn defaults_serve_on_8081() {
        let config = DashboardConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.addr(), "127.0.0.1:8081");
    }

    #[test]
    fn reads_every_variable() {
        let config = DashboardConfig::from_lookup(lookup(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "9000"),
            ("TRAIN_EPOCHS", "42"),
            ("TRAIN_RATE", "0.1"),
            ("TRAIN_CHUNK", "7"),
        ]))
        .unwrap();

        assert_eq!(config.addr(), "0.0.0.0:9000");
        assert_eq!(config.epochs, 42);
        assert_eq!(config.rate, 0.1);
        assert_eq!(config.chunk.get(), 7);
    }

    #[test]
    fn rejects_invalid_values() {
        let err = DashboardConfig::from_lookup(lookup(&[("PORT", "http")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError {
                var: "PORT",
                value: "http".to_string()
            }
        );

        let err = DashboardConfig::from_lookup(lookup(&[("TRAIN_CHUNK", "0")])).unwrap_err();
        assert_eq!(err.var, "TRAIN_CHUNK");
    }

    #[test]
    fn rejects_rates_that_cannot_train() {
        for value in ["NaN", "inf", "-inf", "-0.5", "0"] {
            let err = DashboardConfig::from_lookup(lookup(&[("TRAIN_RATE", value)])).unwrap_err();
            assert_eq!(
                err,
                ConfigError {
                    var: "TRAIN_RATE",
                    value: value.to_string()
                },
                "TRAIN_RATE={value} was accepted"
            );
        }
    }

    #[test]
    fn default_chunk_is_one_hundred_epochs() {
        assert_eq!(DashboardConfig::default().chunk.get(), 100);
    }
}
