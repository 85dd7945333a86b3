//! Named resource lookup
//!
//! Five label-keyed maps (caches, rate limits, processors, inputs,
//! outputs), a generic typed store, and named transaction pipes. Labels
//! are unique per map; the same label across two kinds is legal.
//!
//! # Access discipline
//!
//! Caches and rate limits are handed to callers through `access_*`
//! closures that hold the resource's async mutex for the closure's
//! duration, so concurrent callers serialize and no lock escapes the
//! manager. The label maps and the generic/pipe stores are guarded by
//! `parking_lot` locks that are never held across an await. Processors
//! are concurrency-safe by contract and are shared as `Arc` directly.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::sync::Mutex as AsyncMutex;

use sluice_config::{validate_label, ComponentConfig, ConfigError, ResourcesConfig};
use sluice_message::Transaction;
use sluice_runtime::{BatchProcessor, Cache, InputHandle, OutputHandle, RateLimit};

use crate::environment::Environment;
use crate::error::ManagerError;

#[cfg(test)]
#[path = "resources_test.rs"]
mod tests;

/// Boxed future returned by `access_*` closures.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The shared resource manager.
pub struct Resources {
    env: Arc<Environment>,
    caches: RwLock<HashMap<String, Arc<AsyncMutex<Box<dyn Cache>>>>>,
    rate_limits: RwLock<HashMap<String, Arc<AsyncMutex<Box<dyn RateLimit>>>>>,
    processors: RwLock<HashMap<String, Arc<dyn BatchProcessor>>>,
    inputs: RwLock<HashMap<String, Arc<AsyncMutex<InputHandle>>>>,
    outputs: RwLock<HashMap<String, Arc<AsyncMutex<OutputHandle>>>>,
    generic: Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
    pipes: Mutex<HashMap<String, mpsc::Sender<Transaction>>>,
}

impl Resources {
    /// Create an empty manager over the given environment.
    pub fn new(env: Arc<Environment>) -> Arc<Self> {
        Arc::new(Self {
            env,
            caches: RwLock::new(HashMap::new()),
            rate_limits: RwLock::new(HashMap::new()),
            processors: RwLock::new(HashMap::new()),
            inputs: RwLock::new(HashMap::new()),
            outputs: RwLock::new(HashMap::new()),
            generic: Mutex::new(HashMap::new()),
            pipes: Mutex::new(HashMap::new()),
        })
    }

    /// Create a manager and populate it from the config's resource lists.
    pub fn build(
        env: Arc<Environment>,
        config: &ResourcesConfig,
    ) -> Result<Arc<Self>, ManagerError> {
        let resources = Self::new(env);
        resources.init(config)?;
        Ok(resources)
    }

    /// The environment resources were built against.
    pub fn env(&self) -> &Arc<Environment> {
        &self.env
    }

    /// Construct every configured resource, in dependency order: caches
    /// and rate limits first, then processors, inputs and outputs.
    ///
    /// Fails on an empty, malformed or colliding label.
    pub fn init(self: &Arc<Self>, config: &ResourcesConfig) -> Result<(), ManagerError> {
        for element in &config.caches {
            let label = checked_label(element)?;
            let cache = self.env.build_cache(element)?;
            insert_unique(&self.caches, label, Arc::new(AsyncMutex::new(cache)))?;
        }
        for element in &config.rate_limits {
            let label = checked_label(element)?;
            let rate_limit = self.env.build_rate_limit(element)?;
            insert_unique(&self.rate_limits, label, Arc::new(AsyncMutex::new(rate_limit)))?;
        }
        for element in &config.processors {
            let label = checked_label(element)?;
            let processor = self.env.build_processor(element, self)?;
            insert_unique(&self.processors, label, processor)?;
        }
        for element in &config.inputs {
            let label = checked_label(element)?;
            let input = self.env.build_input(element, self)?;
            insert_unique(&self.inputs, label, Arc::new(AsyncMutex::new(input)))?;
        }
        for element in &config.outputs {
            let label = checked_label(element)?;
            let output = self.env.build_output(element, self)?;
            insert_unique(&self.outputs, label, Arc::new(AsyncMutex::new(output)))?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Probe
    // ------------------------------------------------------------------

    pub fn probe_cache(&self, name: &str) -> bool {
        self.caches.read().contains_key(name)
    }

    pub fn probe_rate_limit(&self, name: &str) -> bool {
        self.rate_limits.read().contains_key(name)
    }

    pub fn probe_processor(&self, name: &str) -> bool {
        self.processors.read().contains_key(name)
    }

    pub fn probe_input(&self, name: &str) -> bool {
        self.inputs.read().contains_key(name)
    }

    pub fn probe_output(&self, name: &str) -> bool {
        self.outputs.read().contains_key(name)
    }

    // ------------------------------------------------------------------
    // Store / remove
    // ------------------------------------------------------------------

    /// Build and store a cache under `name`, replacing and closing any
    /// previous holder.
    pub async fn store_cache(
        self: &Arc<Self>,
        name: &str,
        config: &ComponentConfig,
    ) -> Result<(), ManagerError> {
        let cache = self.env.build_cache(config)?;
        let old = self
            .caches
            .write()
            .insert(name.to_string(), Arc::new(AsyncMutex::new(cache)));
        if let Some(old) = old {
            close_cache(name, old).await;
        }
        Ok(())
    }

    pub async fn remove_cache(&self, name: &str) -> Result<(), ManagerError> {
        let old = self
            .caches
            .write()
            .remove(name)
            .ok_or_else(|| ManagerError::ResourceNotFound(name.to_string()))?;
        close_cache(name, old).await;
        Ok(())
    }

    pub async fn store_rate_limit(
        self: &Arc<Self>,
        name: &str,
        config: &ComponentConfig,
    ) -> Result<(), ManagerError> {
        let rate_limit = self.env.build_rate_limit(config)?;
        let old = self
            .rate_limits
            .write()
            .insert(name.to_string(), Arc::new(AsyncMutex::new(rate_limit)));
        if let Some(old) = old {
            close_rate_limit(name, old).await;
        }
        Ok(())
    }

    pub async fn remove_rate_limit(&self, name: &str) -> Result<(), ManagerError> {
        let old = self
            .rate_limits
            .write()
            .remove(name)
            .ok_or_else(|| ManagerError::ResourceNotFound(name.to_string()))?;
        close_rate_limit(name, old).await;
        Ok(())
    }

    pub async fn store_processor(
        self: &Arc<Self>,
        name: &str,
        config: &ComponentConfig,
    ) -> Result<(), ManagerError> {
        let processor = self.env.build_processor(config, self)?;
        let old = self
            .processors
            .write()
            .insert(name.to_string(), processor);
        if let Some(old) = old {
            if let Err(err) = old.close().await {
                tracing::warn!(resource = name, error = %err, "failed to close replaced processor");
            }
        }
        Ok(())
    }

    pub async fn remove_processor(&self, name: &str) -> Result<(), ManagerError> {
        let old = self
            .processors
            .write()
            .remove(name)
            .ok_or_else(|| ManagerError::ResourceNotFound(name.to_string()))?;
        if let Err(err) = old.close().await {
            tracing::warn!(resource = name, error = %err, "failed to close removed processor");
        }
        Ok(())
    }

    pub async fn store_input(
        self: &Arc<Self>,
        name: &str,
        config: &ComponentConfig,
    ) -> Result<(), ManagerError> {
        let input = self.env.build_input(config, self)?;
        let old = self
            .inputs
            .write()
            .insert(name.to_string(), Arc::new(AsyncMutex::new(input)));
        if let Some(old) = old {
            old.lock().await.trigger_close_now();
        }
        Ok(())
    }

    pub async fn remove_input(&self, name: &str) -> Result<(), ManagerError> {
        let old = self
            .inputs
            .write()
            .remove(name)
            .ok_or_else(|| ManagerError::ResourceNotFound(name.to_string()))?;
        old.lock().await.trigger_close_now();
        Ok(())
    }

    pub async fn store_output(
        self: &Arc<Self>,
        name: &str,
        config: &ComponentConfig,
    ) -> Result<(), ManagerError> {
        let output = self.env.build_output(config, self)?;
        let old = self
            .outputs
            .write()
            .insert(name.to_string(), Arc::new(AsyncMutex::new(output)));
        if let Some(old) = old {
            old.lock().await.trigger_close_now();
        }
        Ok(())
    }

    pub async fn remove_output(&self, name: &str) -> Result<(), ManagerError> {
        let old = self
            .outputs
            .write()
            .remove(name)
            .ok_or_else(|| ManagerError::ResourceNotFound(name.to_string()))?;
        old.lock().await.trigger_close_now();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Access
    // ------------------------------------------------------------------

    /// Run `f` with exclusive access to the named cache.
    pub async fn access_cache<F, T>(&self, name: &str, f: F) -> Result<T, ManagerError>
    where
        F: for<'a> FnOnce(&'a mut (dyn Cache + 'static)) -> BoxFuture<'a, T>,
    {
        let cache = self
            .caches
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ManagerError::ResourceNotFound(name.to_string()))?;
        let mut guard = cache.lock().await;
        Ok(f(&mut **guard).await)
    }

    /// Run `f` with exclusive access to the named rate limit.
    pub async fn access_rate_limit<F, T>(&self, name: &str, f: F) -> Result<T, ManagerError>
    where
        F: for<'a> FnOnce(&'a mut (dyn RateLimit + 'static)) -> BoxFuture<'a, T>,
    {
        let rate_limit = self
            .rate_limits
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ManagerError::ResourceNotFound(name.to_string()))?;
        let mut guard = rate_limit.lock().await;
        Ok(f(&mut **guard).await)
    }

    /// Share the named processor. Processors are concurrency-safe by
    /// contract, so access is unserialized.
    pub fn access_processor(&self, name: &str) -> Result<Arc<dyn BatchProcessor>, ManagerError> {
        self.processors
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ManagerError::ResourceNotFound(name.to_string()))
    }

    /// Run `f` with exclusive access to the named input.
    pub async fn access_input<F, T>(&self, name: &str, f: F) -> Result<T, ManagerError>
    where
        F: for<'a> FnOnce(&'a mut InputHandle) -> BoxFuture<'a, T>,
    {
        let input = self
            .inputs
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ManagerError::ResourceNotFound(name.to_string()))?;
        let mut guard = input.lock().await;
        Ok(f(&mut *guard).await)
    }

    /// Run `f` with exclusive access to the named output.
    pub async fn access_output<F, T>(&self, name: &str, f: F) -> Result<T, ManagerError>
    where
        F: for<'a> FnOnce(&'a mut OutputHandle) -> BoxFuture<'a, T>,
    {
        let output = self
            .outputs
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ManagerError::ResourceNotFound(name.to_string()))?;
        let mut guard = output.lock().await;
        Ok(f(&mut *guard).await)
    }

    // ------------------------------------------------------------------
    // Generic typed store
    // ------------------------------------------------------------------

    /// Store a value keyed by its own type.
    ///
    /// The type is the sentinel: two unrelated components using distinct
    /// types cannot collide.
    pub fn set_generic<T: Any + Send + Sync>(&self, value: T) {
        self.generic.lock().insert(TypeId::of::<T>(), Arc::new(value));
    }

    /// Fetch the value stored under type `T`.
    pub fn get_generic<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.generic
            .lock()
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|any| any.downcast::<T>().ok())
    }

    /// Fetch the value stored under type `T`, initializing it first if
    /// absent.
    pub fn get_or_set_generic<T, F>(&self, init: F) -> Arc<T>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        let mut generic = self.generic.lock();
        let entry = generic
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Arc::new(init()));
        Arc::clone(entry)
            .downcast::<T>()
            .expect("generic entry keyed by mismatched type")
    }

    // ------------------------------------------------------------------
    // Named pipes
    // ------------------------------------------------------------------

    /// Register a transaction pipe, replacing any previous holder.
    pub fn set_pipe(&self, name: &str, tx: mpsc::Sender<Transaction>) {
        self.pipes.lock().insert(name.to_string(), tx);
    }

    /// Fetch the named pipe.
    pub fn get_pipe(&self, name: &str) -> Result<mpsc::Sender<Transaction>, ManagerError> {
        self.pipes
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| ManagerError::PipeNotFound(name.to_string()))
    }

    /// Remove the named pipe, but only if `tx` is the registered channel.
    /// A mismatch means another registration has superseded this one and
    /// the unset is a no-op.
    pub fn unset_pipe(&self, name: &str, tx: &mpsc::Sender<Transaction>) {
        let mut pipes = self.pipes.lock();
        if pipes.get(name).is_some_and(|held| held.same_channel(tx)) {
            pipes.remove(name);
        }
    }

    // ------------------------------------------------------------------
    // Shutdown
    // ------------------------------------------------------------------

    /// Close every held resource and clear the maps.
    pub async fn close_all(&self) {
        let caches: Vec<_> = self.caches.write().drain().collect();
        for (name, cache) in caches {
            close_cache(&name, cache).await;
        }
        let rate_limits: Vec<_> = self.rate_limits.write().drain().collect();
        for (name, rate_limit) in rate_limits {
            close_rate_limit(&name, rate_limit).await;
        }
        let processors: Vec<_> = self.processors.write().drain().collect();
        for (name, processor) in processors {
            if let Err(err) = processor.close().await {
                tracing::warn!(resource = %name, error = %err, "failed to close processor resource");
            }
        }
        let inputs: Vec<_> = self.inputs.write().drain().collect();
        for (_, input) in inputs {
            input.lock().await.trigger_close_now();
        }
        let outputs: Vec<_> = self.outputs.write().drain().collect();
        for (_, output) in outputs {
            output.lock().await.trigger_close_now();
        }
    }
}

impl std::fmt::Debug for Resources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resources")
            .field("caches", &self.caches.read().len())
            .field("rate_limits", &self.rate_limits.read().len())
            .field("processors", &self.processors.read().len())
            .field("inputs", &self.inputs.read().len())
            .field("outputs", &self.outputs.read().len())
            .finish()
    }
}

fn checked_label(element: &ComponentConfig) -> Result<String, ManagerError> {
    let label = element.label.clone().unwrap_or_default();
    validate_label(&label).map_err(|_| ManagerError::Config(ConfigError::BadLabel(label.clone())))?;
    Ok(label)
}

fn insert_unique<V>(
    map: &RwLock<HashMap<String, V>>,
    label: String,
    value: V,
) -> Result<(), ManagerError> {
    let mut map = map.write();
    if map.contains_key(&label) {
        return Err(ManagerError::LabelCollision(label));
    }
    map.insert(label, value);
    Ok(())
}

async fn close_cache(name: &str, cache: Arc<AsyncMutex<Box<dyn Cache>>>) {
    if let Err(err) = cache.lock().await.close().await {
        tracing::warn!(resource = %name, error = %err, "failed to close cache resource");
    }
}

async fn close_rate_limit(name: &str, rate_limit: Arc<AsyncMutex<Box<dyn RateLimit>>>) {
    if let Err(err) = rate_limit.lock().await.close().await {
        tracing::warn!(resource = %name, error = %err, "failed to close rate limit resource");
    }
}
