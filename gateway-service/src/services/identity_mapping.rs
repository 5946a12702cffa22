use std::collections::HashMap;

use crate::models::{ClientCertificate, IdentityMappingEntry};

pub const MAX_MAINFRAME_ID_LENGTH: usize = 8;
pub const MAX_DISTRIBUTED_ID_LENGTH: usize = 246;
pub const MAX_LABEL_LENGTH: usize = 32;

/// Registry name under which certificate distinguished names are mapped.
pub const X509_REGISTRY: &str = "x509";

/// Maps distributed identities (OIDC subjects, certificate DNs) to mainframe
/// user ids.
#[derive(Debug, Clone, Default)]
pub struct IdentityMappingService {
    mappings: HashMap<(String, String), String>,
}

impl IdentityMappingService {
    /// Build the table, skipping rows that RACF would refuse.
    pub fn new(entries: &[IdentityMappingEntry]) -> Self {
        let mut mappings = HashMap::new();

        for entry in entries {
            if let Err(reason) = validate(entry) {
                tracing::warn!(
                    registry = %entry.registry,
                    reason = reason,
                    "Skipping identity mapping"
                );
                continue;
            }

            mappings.insert(
                (entry.registry.clone(), entry.distributed_id.clone()),
                entry.mainframe_id.to_uppercase(),
            );
        }

        tracing::info!(count = mappings.len(), "Identity mappings loaded");
        Self { mappings }
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn map(&self, registry: &str, distributed_id: &str) -> Option<&str> {
        self.mappings
            .get(&(registry.to_string(), distributed_id.to_string()))
            .map(String::as_str)
    }

    /// Explicit mapping of the distinguished name wins; otherwise a common
    /// name that is itself a valid mainframe id is used as is.
    pub fn map_certificate(&self, certificate: &ClientCertificate) -> Option<String> {
        if let Some(user) = self.map(X509_REGISTRY, &certificate.distinguished_name) {
            return Some(user.to_string());
        }

        let common_name = certificate.common_name.trim();
        if is_valid_mainframe_id(common_name) {
            Some(common_name.to_uppercase())
        } else {
            None
        }
    }
}

fn is_valid_mainframe_id(id: &str) -> bool {
    !id.is_empty()
        && id.chars().count() <= MAX_MAINFRAME_ID_LENGTH
        && id.chars().all(|c| c.is_ascii_alphanumeric() || "#$@".contains(c))
}

fn validate(entry: &IdentityMappingEntry) -> Result<(), &'static str> {
    if entry.registry.trim().is_empty() {
        return Err("registry is empty");
    }
    if !is_valid_mainframe_id(&entry.mainframe_id) {
        return Err("mainframe id must be 1-8 alphanumeric characters");
    }
    let distributed_length = entry.distributed_id.chars().count();
    if distributed_length == 0 || distributed_length > MAX_DISTRIBUTED_ID_LENGTH {
        return Err("distributed id must be 1-246 characters");
    }
    if entry.user_name.chars().count() > MAX_LABEL_LENGTH {
        return Err("label exceeds 32 characters");
    }
    Ok(())
}
