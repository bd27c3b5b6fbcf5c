//! Seams between the bootstrap sequence and a concrete store.
//!
//! A [`Connector`] turns a credential into a [`ConnectionSource`] (a pool),
//! which hands out [`SchemaExecutor`] connections. Connections are released
//! when dropped; a source is closed explicitly once a run is over.

use std::future::Future;

use nalamini_core::MigrationSettings;

use crate::error::{BootstrapError, StoreError};
use crate::plan::Statement;

/// Builds a connection source from a credential. Must not perform I/O.
pub trait Connector: Clone + Send + Sync + 'static {
    type Source: ConnectionSource + 'static;

    fn connect(
        &self,
        database_url: &str,
        settings: &MigrationSettings,
    ) -> Result<Self::Source, BootstrapError>;
}

/// A pool of connections.
pub trait ConnectionSource: Send + Sync {
    type Connection: SchemaExecutor;

    fn acquire(&self) -> impl Future<Output = Result<Self::Connection, StoreError>> + Send;

    /// Close the source, waiting for checked-out connections to come back.
    fn close(&self) -> impl Future<Output = ()> + Send;
}

/// A single connection able to run plan statements.
pub trait SchemaExecutor: Send {
    /// Execute one statement and return the number of rows it affected.
    fn execute(
        &mut self,
        statement: &Statement,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;
}
