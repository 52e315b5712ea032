// [libs/core/models/src/descriptor.rs]
use std::collections::HashMap;
use thiserror::Error;

/// Attributes a pod publishes about itself under `pod:<id>` in the
/// coordination store. Written on register and refreshed on every
/// heartbeat tick.
#[derive(Debug, Clone, PartialEq)]
pub struct PodDescriptor {
    pub host: String,
    pub port: u16,
    pub cache_dir: String,
    pub origin: String,
    pub max_conns: u32,
    /// Unix timestamp (seconds, fractional) of the last heartbeat write.
    pub last_seen: f64,
}

impl PodDescriptor {
    /// The stable identity this pod registers and is looked up under:
    /// `host:port`.
    pub fn pod_id(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Field/value pairs suitable for a Redis `HSET`.
    pub fn to_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("host", self.host.clone()),
            ("port", self.port.to_string()),
            ("cache_dir", self.cache_dir.clone()),
            ("origin", self.origin.clone()),
            ("max_conns", self.max_conns.to_string()),
            ("last_seen", self.last_seen.to_string()),
        ]
    }

    /// Reconstructs a descriptor from the fields of a `pod:<id>` hash.
    /// Returns `None` if the hash is empty (the pod has no descriptor —
    /// the caller should treat this as a ghost entry and prune it).
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Option<Self>, DescriptorError> {
        if fields.is_empty() {
            return Ok(None);
        }
        let get = |key: &str| -> Result<&String, DescriptorError> {
            fields.get(key).ok_or_else(|| DescriptorError::MissingField(key.to_string()))
        };
        Ok(Some(PodDescriptor {
            host: get("host")?.clone(),
            port: get("port")?.parse().map_err(|_| DescriptorError::InvalidField("port"))?,
            cache_dir: get("cache_dir")?.clone(),
            origin: get("origin")?.clone(),
            max_conns: get("max_conns")?.parse().map_err(|_| DescriptorError::InvalidField("max_conns"))?,
            last_seen: get("last_seen")?.parse().map_err(|_| DescriptorError::InvalidField("last_seen"))?,
        }))
    }
}

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("pod descriptor missing field {0:?}")]
    MissingField(String),
    #[error("pod descriptor field {0:?} could not be parsed")]
    InvalidField(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_fields() {
        let descriptor = PodDescriptor {
            host: "10.0.0.1".into(),
            port: 9001,
            cache_dir: "/var/cache/pod".into(),
            origin: "http://origin:8000".into(),
            max_conns: 4,
            last_seen: 1_700_000_000.5,
        };
        let fields: HashMap<String, String> = descriptor
            .to_fields()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let parsed = PodDescriptor::from_fields(&fields).unwrap().unwrap();
        assert_eq!(parsed, descriptor);
        assert_eq!(parsed.pod_id(), "10.0.0.1:9001");
    }

    #[test]
    fn empty_fields_means_no_descriptor() {
        let fields = HashMap::new();
        assert!(PodDescriptor::from_fields(&fields).unwrap().is_none());
    }

    #[test]
    fn missing_field_is_reported() {
        let mut fields = HashMap::new();
        fields.insert("host".to_string(), "127.0.0.1".to_string());
        let err = PodDescriptor::from_fields(&fields).unwrap_err();
        assert!(matches!(err, DescriptorError::MissingField(_)));
    }
}
