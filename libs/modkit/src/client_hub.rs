//! Type-safe hub of inter-module clients.
//!
//! Providers register an implementation once under its interface type
//! (`register::<dyn accounts::AccountsApi>(..)`); consumers fetch by the same
//! type. The key is `type_name::<T>()`, which also works for `T = dyn Trait`.

use parking_lot::RwLock;
use std::{any::Any, collections::HashMap, fmt, sync::Arc};

#[derive(Clone, Eq, PartialEq, Hash)]
pub struct TypeKey(&'static str);

impl TypeKey {
    #[inline]
    fn of<T: ?Sized + 'static>() -> Self {
        TypeKey(std::any::type_name::<T>())
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientHubError {
    #[error("client not found: type={0:?}")]
    NotFound(TypeKey),

    #[error("type mismatch in hub for type={0:?}")]
    TypeMismatch(TypeKey),
}

type Boxed = Box<dyn Any + Send + Sync>;

/// Registry of clients keyed by interface type.
#[derive(Default)]
pub struct ClientHub {
    map: RwLock<HashMap<TypeKey, Boxed>>,
}

impl ClientHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the client for interface `T`.
    /// Arcs already handed out stay valid.
    pub fn register<T>(&self, client: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.map.write().insert(TypeKey::of::<T>(), Box::new(client));
    }

    pub fn get<T>(&self) -> Result<Arc<T>, ClientHubError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = TypeKey::of::<T>();
        let r = self.map.read();
        let boxed = r.get(&key).ok_or_else(|| ClientHubError::NotFound(key.clone()))?;
        boxed
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or(ClientHubError::TypeMismatch(key))
    }

    pub fn remove<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let boxed = self.map.write().remove(&TypeKey::of::<T>())?;
        boxed.downcast::<Arc<T>>().ok().map(|b| *b)
    }

    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }
}
