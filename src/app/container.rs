//! Dependency injection container for the application.
//!
//! The container owns infrastructure dependencies (the table cache) and
//! provides factory methods for agents.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use super::config::AgentConfig;
use crate::{
    Error, Result, adapters::MsgPackRepository, afterstates::AfterstateTable,
    ports::TableRepository, q_learning::AfterstateAgent, tictactoe::Variant,
};

/// Application with dependency injection.
///
/// Afterstate tables are built at most once per variant and shared by every
/// agent the app creates. With a cache directory configured, built tables
/// are also persisted through the table repository.
///
/// # Examples
///
/// ```no_run
/// use afterstate::app::{App, AgentConfig};
/// use afterstate::tictactoe::Variant;
///
/// let app = App::new().with_table_cache("cache");
/// let config = AgentConfig::new(Variant::Standard).with_seed(42);
/// let agent = app.create_agent(&config)?;
/// # Ok::<(), afterstate::Error>(())
/// ```
pub struct App {
    /// Repository for afterstate table persistence
    table_repository: Arc<dyn TableRepository + Send + Sync>,
    /// Directory holding cached tables (None = never cache)
    table_cache_dir: Option<PathBuf>,
    /// Default random seed (None = non-deterministic)
    default_seed: Option<u64>,
    tables: Mutex<HashMap<Variant, Arc<AfterstateTable>>>,
}

impl App {
    /// Create a new app with production defaults.
    ///
    /// Uses `MsgPackRepository`, no table cache directory and no default seed.
    pub fn new() -> Self {
        AppBuilder::new().build()
    }

    /// Create a builder for constructing app with custom dependencies.
    pub fn for_testing() -> AppBuilder {
        AppBuilder::new()
    }

    /// Cache built tables under `dir`.
    pub fn with_table_cache(mut self, dir: impl Into<PathBuf>) -> Self {
        self.table_cache_dir = Some(dir.into());
        self
    }

    /// Get the table repository.
    pub fn table_repository(&self) -> Arc<dyn TableRepository + Send + Sync> {
        Arc::clone(&self.table_repository)
    }

    fn cache_path(&self, variant: Variant) -> Option<PathBuf> {
        self.table_cache_dir
            .as_ref()
            .map(|dir| dir.join(format!("{variant}.table")))
    }

    /// Shared afterstate table for `variant`.
    ///
    /// Looks in memory first, then in the cache directory, and builds the
    /// table when neither has a usable copy. Cache problems are logged and
    /// never fatal.
    pub fn table(&self, variant: Variant) -> Result<Arc<AfterstateTable>> {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(table) = tables.get(&variant) {
            return Ok(Arc::clone(table));
        }

        let table = Arc::new(self.load_or_build(variant)?);
        tables.insert(variant, Arc::clone(&table));
        Ok(table)
    }

    fn load_or_build(&self, variant: Variant) -> Result<AfterstateTable> {
        let Some(path) = self.cache_path(variant) else {
            return AfterstateTable::build(variant);
        };

        match self.table_repository.load(&path) {
            Ok(table) if table.variant() == variant => {
                log::info!("Loaded cached {variant} afterstate table from {}", path.display());
                return Ok(table);
            }
            Ok(table) => {
                let err = Error::VariantMismatch {
                    expected: variant,
                    found: table.variant(),
                };
                log::warn!("Ignoring table cache {}: {err}", path.display());
            }
            Err(err) => log::debug!("No usable table cache at {}: {err}", path.display()),
        }

        let table = AfterstateTable::build(variant)?;
        if let Err(err) = self.table_repository.save(&table, &path) {
            log::warn!("Could not cache table at {}: {err}", path.display());
        }
        Ok(table)
    }

    /// Create a new agent with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn create_agent(&self, config: &AgentConfig) -> Result<AfterstateAgent> {
        config.validate()?;
        let table = self.table(config.variant)?;

        let mut agent = AfterstateAgent::new(
            table,
            config.learning_rate,
            config.discount_factor,
            config.epsilon,
            config.explore,
        );

        // Apply seed from config or use container default
        if let Some(seed) = config.seed.or(self.default_seed) {
            agent = agent.with_seed(seed);
        }

        Ok(agent)
    }

    /// Create an agent and load its values from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value file is missing, corrupted, or belongs
    /// to another table.
    pub fn load_agent(&self, config: &AgentConfig, path: &Path) -> Result<AfterstateAgent> {
        let mut agent = self.create_agent(config)?;
        agent.load_values(path)?;
        Ok(agent)
    }

    /// Save an agent's values to `path`.
    pub fn save_agent(&self, agent: &AfterstateAgent, path: &Path) -> Result<()> {
        agent.save_values(path)
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing app with custom dependencies.
///
/// # Examples
///
/// ```
/// use afterstate::app::AppBuilder;
/// use afterstate::adapters::InMemoryRepository;
///
/// let app = AppBuilder::new()
///     .with_repository(InMemoryRepository::new())
///     .with_table_cache("tables")
///     .with_default_seed(42)
///     .build();
/// ```
pub struct AppBuilder {
    table_repository: Option<Arc<dyn TableRepository + Send + Sync>>,
    table_cache_dir: Option<PathBuf>,
    default_seed: Option<u64>,
}

impl AppBuilder {
    /// Create a new app builder.
    pub fn new() -> Self {
        Self {
            table_repository: None,
            table_cache_dir: None,
            default_seed: None,
        }
    }

    /// Set a custom table repository.
    pub fn with_repository<R: TableRepository + Send + Sync + 'static>(mut self, repo: R) -> Self {
        self.table_repository = Some(Arc::new(repo));
        self
    }

    pub fn with_table_cache(mut self, dir: impl Into<PathBuf>) -> Self {
        self.table_cache_dir = Some(dir.into());
        self
    }

    /// Set a default random seed for all agents created by this container.
    pub fn with_default_seed(mut self, seed: u64) -> Self {
        self.default_seed = Some(seed);
        self
    }

    /// Build the app with the configured dependencies.
    ///
    /// If no repository was specified, uses `MsgPackRepository` by default.
    pub fn build(self) -> App {
        App {
            table_repository: self
                .table_repository
                .unwrap_or_else(|| Arc::new(MsgPackRepository::new())),
            table_cache_dir: self.table_cache_dir,
            default_seed: self.default_seed,
            tables: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{adapters::InMemoryRepository, ports::Agent};

    #[test]
    fn test_app_creates_agent() {
        let app = App::new();
        let agent = app.create_agent(&AgentConfig::new(Variant::Standard)).unwrap();
        assert_eq!(agent.values().len(), 5477);
    }

    #[test]
    fn test_tables_are_shared() {
        let app = App::new();
        let a = app.table(Variant::Standard).unwrap();
        let b = app.table(Variant::Standard).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_cache_is_written_and_reused() {
        let repo = InMemoryRepository::new();
        let app = App::for_testing()
            .with_repository(repo.clone())
            .with_table_cache("tables")
            .build();

        app.table(Variant::Standard).unwrap();
        assert!(repo.contains(Path::new("tables/standard.table")));

        let second = App::for_testing()
            .with_repository(repo.clone())
            .with_table_cache("tables")
            .build();
        let table = second.table(Variant::Standard).unwrap();
        assert_eq!(table.variant(), Variant::Standard);
        assert_eq!(repo.count(), 1);
    }

    #[test]
    fn test_mismatched_cache_is_rebuilt() {
        let repo = InMemoryRepository::new();
        let capture = AfterstateTable::build(Variant::Capture).unwrap();
        repo.save(&capture, Path::new("tables/standard.table")).unwrap();

        let app = App::for_testing()
            .with_repository(repo)
            .with_table_cache("tables")
            .build();
        let table = app.table(Variant::Standard).unwrap();
        assert_eq!(table.variant(), Variant::Standard);
    }

    #[test]
    fn test_config_seed_overrides_app_default() {
        let app = App::for_testing().with_default_seed(42).build();
        let legal: Vec<usize> = (0..9).collect();
        let config = AgentConfig::new(Variant::Standard)
            .with_epsilon(1.0)
            .with_explore(true);

        let mut a = app.create_agent(&config.clone().with_seed(123)).unwrap();
        let mut b = app.create_agent(&config.with_seed(123)).unwrap();
        assert_eq!(a.seed(), Some(123));

        for _ in 0..10 {
            assert_eq!(
                a.select_action(0, &legal).unwrap(),
                b.select_action(0, &legal).unwrap()
            );
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let app = App::new();
        let config = AgentConfig::new(Variant::Standard).with_discount_factor(2.0);
        assert!(app.create_agent(&config).is_err());
    }
}
