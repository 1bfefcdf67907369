//! Recipe: one cacheable unit of work plus the recipes it depends on.
//!
//! ```text
//! Unevaluated -> Evaluating -> FreshCached | Recomputed | Failed
//! ```
//!
//! `evaluate(force)`:
//! 1. evaluate every dependency depth-first, in list order; a dependency
//!    that reports `false` is recorded, one that errors aborts this recipe;
//! 2. fingerprint the configuration, giving `<root>/<kind>_<fingerprint>/`;
//! 3. unless forced, reuse a stored result that passes the freshness check
//!    (the dependency manifest is still rewritten);
//! 4. otherwise run the evaluator; on `Ok(true)` stamp, persist, record
//!    dependencies. `Ok(false)` and errors persist nothing.

use std::fmt;
use std::path::{Path, PathBuf};

use simcache_core::config::CacheConfig;
use simcache_core::configuration::Configuration;
use simcache_core::hash::fingerprint;
use simcache_core::id::{validate_kind, RecipeId};
use simcache_store::{ResultStore, Results, StoreError};

use crate::error::{BoxError, RecipeError, Result};
use crate::freshness::Freshness;
use crate::recorder::DependencyRecorder;

/// Result prefix of recipe artifacts: `recipe_results.json`.
pub const RECIPE_PREFIX: &str = "recipe";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeState {
    Unevaluated,
    Evaluating,
    FreshCached,
    Recomputed,
    Failed,
}

impl RecipeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipeState::Unevaluated => "unevaluated",
            RecipeState::Evaluating => "evaluating",
            RecipeState::FreshCached => "fresh_cached",
            RecipeState::Recomputed => "recomputed",
            RecipeState::Failed => "failed",
        }
    }
}

impl fmt::Display for RecipeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a dependency reported during the parent's last evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyOutcome {
    pub id: RecipeId,
    pub success: bool,
}

/// Everything an evaluator may look at while producing results.
pub struct EvalContext<'a> {
    pub id: &'a RecipeId,
    pub dirpath: &'a Path,
    pub configuration: &'a Configuration,
    pub dependencies: &'a [Recipe],
    pub results: &'a mut Results,
}

impl EvalContext<'_> {
    /// First dependency of the given kind.
    pub fn dependency(&self, kind: &str) -> Option<&Recipe> {
        self.dependencies.iter().find(|d| d.kind() == kind)
    }
}

/// The domain-specific part of a recipe.
///
/// Populate `ctx.results` and return `Ok(true)` when a usable result was
/// produced. `Ok(false)` means nothing usable; an error is passed to the
/// caller unchanged inside [`RecipeError::Evaluation`].
pub trait Evaluator: Send {
    fn evaluate(&mut self, ctx: &mut EvalContext<'_>) -> std::result::Result<bool, BoxError>;
}

impl<F> Evaluator for F
where
    F: FnMut(&mut EvalContext<'_>) -> std::result::Result<bool, BoxError> + Send,
{
    fn evaluate(&mut self, ctx: &mut EvalContext<'_>) -> std::result::Result<bool, BoxError> {
        self(ctx)
    }
}

pub struct Recipe {
    kind: String,
    configuration: Configuration,
    dependencies: Vec<Recipe>,
    root: PathBuf,
    store: ResultStore,
    evaluator: Box<dyn Evaluator>,
    default_force: bool,

    results: Results,
    state: RecipeState,
    last_id: Option<RecipeId>,
    outcomes: Vec<DependencyOutcome>,
}

impl fmt::Debug for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recipe")
            .field("kind", &self.kind)
            .field("root", &self.root)
            .field("state", &self.state)
            .field("last_id", &self.last_id)
            .field("dependencies", &self.dependencies.len())
            .finish_non_exhaustive()
    }
}

pub struct RecipeBuilder {
    kind: String,
    evaluator: Box<dyn Evaluator>,
    configuration: Configuration,
    dependencies: Vec<Recipe>,
    root: PathBuf,
    store: ResultStore,
    default_force: bool,
}

impl RecipeBuilder {
    pub fn configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = configuration;
        self
    }

    pub fn dependency(mut self, recipe: Recipe) -> Self {
        self.dependencies.push(recipe);
        self
    }

    pub fn dependencies(mut self, recipes: Vec<Recipe>) -> Self {
        self.dependencies = recipes;
        self
    }

    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn store(mut self, store: ResultStore) -> Self {
        self.store = store;
        self
    }

    /// Root directory, artifact formatting, and default `force` from `cfg`.
    pub fn cache_config(mut self, cfg: &CacheConfig) -> Self {
        self.root = cfg.root_dir.clone();
        self.store = ResultStore::from_config(cfg);
        self.default_force = cfg.force;
        self
    }

    pub fn build(self) -> Result<Recipe> {
        if let Err(e) = validate_kind(&self.kind) {
            return Err(RecipeError::Config {
                kind: self.kind,
                reason: e.to_string(),
            });
        }
        Ok(Recipe {
            results: Results::new(RECIPE_PREFIX, &self.root),
            kind: self.kind,
            configuration: self.configuration,
            dependencies: self.dependencies,
            root: self.root,
            store: self.store,
            evaluator: self.evaluator,
            default_force: self.default_force,
            state: RecipeState::Unevaluated,
            last_id: None,
            outcomes: Vec::new(),
        })
    }
}

impl Recipe {
    pub fn builder(kind: impl Into<String>, evaluator: impl Evaluator + 'static) -> RecipeBuilder {
        let defaults = CacheConfig::default();
        RecipeBuilder {
            kind: kind.into(),
            evaluator: Box::new(evaluator),
            configuration: Configuration::new(),
            dependencies: Vec::new(),
            root: defaults.root_dir.clone(),
            store: ResultStore::from_config(&defaults),
            default_force: defaults.force,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Mutating the configuration moves the recipe to another directory on
    /// the next evaluation.
    pub fn configuration_mut(&mut self) -> &mut Configuration {
        &mut self.configuration
    }

    pub fn dependencies(&self) -> &[Recipe] {
        &self.dependencies
    }

    pub fn dependencies_mut(&mut self) -> &mut Vec<Recipe> {
        &mut self.dependencies
    }

    pub fn set_dependencies(&mut self, dependencies: Vec<Recipe>) {
        self.dependencies = dependencies;
    }

    pub fn results(&self) -> &Results {
        &self.results
    }

    pub fn state(&self) -> RecipeState {
        self.state
    }

    /// Identity used by the last evaluation, if any.
    pub fn last_id(&self) -> Option<&RecipeId> {
        self.last_id.as_ref()
    }

    pub fn dependency_outcomes(&self) -> &[DependencyOutcome] {
        &self.outcomes
    }

    /// Identity of the current configuration.
    pub fn id(&self) -> Result<RecipeId> {
        let fp = fingerprint(&self.configuration).map_err(|source| RecipeError::Fingerprint {
            kind: self.kind.clone(),
            root: self.root.clone(),
            source,
        })?;
        RecipeId::new(&self.kind, fp).map_err(|e| RecipeError::Config {
            kind: self.kind.clone(),
            reason: e.to_string(),
        })
    }

    /// Content-addressed directory of the current configuration.
    pub fn dirpath(&self) -> Result<PathBuf> {
        Ok(self.root.join(self.id()?.dir_name()))
    }

    /// Evaluate with the `force` default taken from the cache config.
    pub fn run(&mut self) -> Result<bool> {
        self.evaluate(self.default_force)
    }

    /// Evaluate dependencies, then reuse or recompute this recipe's result.
    /// `force` applies to the whole subtree.
    pub fn evaluate(&mut self, force: bool) -> Result<bool> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("recipe.evaluate", kind = %self.kind, force).entered();
        self.state = RecipeState::Evaluating;
        let outcome = self.evaluate_inner(force);
        if outcome.is_err() {
            self.state = RecipeState::Failed;
        }
        #[cfg(feature = "tracing")]
        {
            if let Err(e) = &outcome {
                tracing::warn!(error = %e, "recipe failed");
            }
        }
        outcome.map(|(_, ok)| ok)
    }

    fn evaluate_inner(&mut self, force: bool) -> Result<(RecipeId, bool)> {
        self.outcomes.clear();
        for dep in &mut self.dependencies {
            // Id the dependency was stored under.
            let (id, success) = dep
                .evaluate(force)
                .and_then(|ok| match dep.last_id() {
                    Some(id) => Ok((id.clone(), ok)),
                    None => dep.id().map(|id| (id, ok)),
                })
                .map_err(|e| RecipeError::Dependency {
                    kind: self.kind.clone(),
                    source: Box::new(e),
                })?;
            #[cfg(feature = "tracing")]
            tracing::debug!(dependency = %id, success, "dependency evaluated");
            self.outcomes.push(DependencyOutcome { id, success });
        }

        let id = self.id()?;
        let dir = self.root.join(id.dir_name());
        self.last_id = Some(id.clone());
        self.results.set_dirpath(&dir);

        if !force && self.store.available(RECIPE_PREFIX, &dir) {
            match self.store.load(RECIPE_PREFIX, &dir) {
                Ok(stored) => match Freshness::check(&self.configuration, &stored) {
                    Freshness::Fresh => {
                        self.results = stored;
                        self.record_dependencies(&id, &dir)?;
                        self.state = RecipeState::FreshCached;
                        #[cfg(feature = "tracing")]
                        tracing::info!(recipe = %id, "using cached results");
                        return Ok((id, true));
                    }
                    Freshness::Stale(_reason) => {
                        #[cfg(feature = "tracing")]
                        tracing::info!(recipe = %id, reason = %_reason, "cached results are stale");
                    }
                },
                Err(StoreError::Corrupt { reason: _reason, .. }) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(recipe = %id, reason = %_reason, "ignoring unreadable cached results");
                }
                Err(StoreError::NotFound(_)) => {}
                Err(source) => return Err(RecipeError::Store { id, dir, source }),
            }
        }

        self.results.clear();
        let produced = {
            let mut ctx = EvalContext {
                id: &id,
                dirpath: &dir,
                configuration: &self.configuration,
                dependencies: &self.dependencies,
                results: &mut self.results,
            };
            self.evaluator.evaluate(&mut ctx)
        };

        match produced {
            Err(source) => {
                self.results.clear();
                Err(RecipeError::Evaluation { id, dir, source })
            }
            Ok(false) => {
                self.state = RecipeState::Failed;
                #[cfg(feature = "tracing")]
                tracing::warn!(recipe = %id, "evaluator produced no usable result");
                Ok((id, false))
            }
            Ok(true) => {
                let fp = id.fingerprint();
                let snapshot = self.configuration.snapshot().map_err(|source| {
                    RecipeError::Fingerprint {
                        kind: self.kind.clone(),
                        root: self.root.clone(),
                        source,
                    }
                })?;
                self.results.stamp(snapshot, fp);
                self.store
                    .save(&self.results, &dir)
                    .map_err(|source| RecipeError::Store {
                        id: id.clone(),
                        dir: dir.clone(),
                        source,
                    })?;
                self.record_dependencies(&id, &dir)?;
                self.state = RecipeState::Recomputed;
                #[cfg(feature = "tracing")]
                tracing::info!(recipe = %id, keys = self.results.len(), "recomputed results");
                Ok((id, true))
            }
        }
    }

    fn record_dependencies(&self, id: &RecipeId, dir: &Path) -> Result<()> {
        let ids: Vec<RecipeId> = self.outcomes.iter().map(|o| o.id.clone()).collect();
        DependencyRecorder::new(self.store.storage())
            .record_ids(dir, &ids)
            .map(|_| ())
            .map_err(|source| RecipeError::Store {
                id: id.clone(),
                dir: dir.to_path_buf(),
                source,
            })
    }
}
