//! Store configuration

use crate::error::SessionError;

/// Configuration for the session record store
///
/// Host and port describe where the backend lives; they are consumed by
/// whatever code constructs the backend handle, not by the store itself.
/// The three field names control the document shape and default to the
/// conventional `sess_id` / `sess_data` / `sess_time`.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Backend host (default: "127.0.0.1")
    pub host: String,

    /// Backend port (default: 27017)
    pub port: u16,

    /// Database name. Required; there is no usable default.
    pub database: String,

    /// Collection name. Required; there is no usable default.
    pub collection: String,

    /// Document field holding the session identifier (default: "sess_id")
    pub id_field: String,

    /// Document field holding the opaque payload (default: "sess_data")
    pub data_field: String,

    /// Document field holding the last-write time in epoch seconds
    /// (default: "sess_time")
    pub time_field: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 27017,
            database: String::new(),
            collection: String::new(),
            id_field: "sess_id".to_string(),
            data_field: "sess_data".to_string(),
            time_field: "sess_time".to_string(),
        }
    }
}

impl StoreConfig {
    /// Create a configuration targeting the given database and collection
    pub fn new<D: Into<String>, C: Into<String>>(database: D, collection: C) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
            ..Default::default()
        }
    }

    /// Set the backend host (default: "127.0.0.1")
    pub fn with_host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = host.into();
        self
    }

    /// Set the backend port (default: 27017)
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the session identifier field name (default: "sess_id")
    pub fn with_id_field<S: Into<String>>(mut self, field: S) -> Self {
        self.id_field = field.into();
        self
    }

    /// Set the payload field name (default: "sess_data")
    pub fn with_data_field<S: Into<String>>(mut self, field: S) -> Self {
        self.data_field = field.into();
        self
    }

    /// Set the last-write time field name (default: "sess_time")
    pub fn with_time_field<S: Into<String>>(mut self, field: S) -> Self {
        self.time_field = field.into();
        self
    }

    /// Check that the required settings are present.
    ///
    /// Missing database or collection names are fatal and reported before
    /// the backend is ever contacted.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.database.is_empty() {
            return Err(SessionError::Configuration(
                "database name is required".to_string(),
            ));
        }
        if self.collection.is_empty() {
            return Err(SessionError::Configuration(
                "collection name is required".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 27017);
        assert_eq!(config.id_field, "sess_id");
        assert_eq!(config.data_field, "sess_data");
        assert_eq!(config.time_field, "sess_time");
    }

    #[test]
    fn test_validate_requires_database_and_collection() {
        assert!(StoreConfig::default().validate().is_err());
        assert!(StoreConfig::new("app", "").validate().is_err());
        assert!(StoreConfig::new("", "sessions").validate().is_err());
        assert!(StoreConfig::new("app", "sessions").validate().is_ok());
    }

    #[test]
    fn test_builder_overrides() {
        let config = StoreConfig::new("app", "sessions")
            .with_host("db.internal")
            .with_port(27018)
            .with_id_field("sid")
            .with_data_field("payload")
            .with_time_field("touched_at");
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 27018);
        assert_eq!(config.id_field, "sid");
        assert_eq!(config.data_field, "payload");
        assert_eq!(config.time_field, "touched_at");
        assert!(config.validate().is_ok());
    }
}
