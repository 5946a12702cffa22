use chrono::Utc;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{Authentication, AuthenticationCommand, AuthenticationScheme, RouteConfig};
use crate::services::auth_source::{AuthSourceService, RequestCredentials};
use crate::services::error::{AuthSchemeError, ServiceError};
use crate::services::metrics;
use crate::services::scheme::AuthenticationSchemeFactory;
use crate::utils::fingerprint;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CommandKey {
    service_id: String,
    scheme: AuthenticationScheme,
    applid: Option<String>,
    fingerprint: String,
}

/// Resolves the outbound credential for a request to a routed service.
///
/// Commands are cached per (service, scheme, applid, credential) until they
/// expire. The caller's credential is validated on every request, cached or
/// not, so revocation takes effect immediately.
pub struct ServiceAuthenticationService {
    routes: HashMap<String, Authentication>,
    sources: Arc<dyn AuthSourceService>,
    schemes: AuthenticationSchemeFactory,
    cache: DashMap<CommandKey, AuthenticationCommand>,
}

impl ServiceAuthenticationService {
    pub fn new(
        routes: &[RouteConfig],
        sources: Arc<dyn AuthSourceService>,
        schemes: AuthenticationSchemeFactory,
    ) -> Self {
        Self {
            routes: routes
                .iter()
                .map(|route| (route.service_id.to_lowercase(), route.authentication.clone()))
                .collect(),
            sources,
            schemes,
            cache: DashMap::new(),
        }
    }

    pub fn authentication(&self, service_id: &str) -> Option<&Authentication> {
        self.routes.get(&service_id.to_lowercase())
    }

    pub async fn get_authentication_command(
        &self,
        service_id: &str,
        request: &RequestCredentials<'_>,
    ) -> Result<AuthenticationCommand, ServiceError> {
        let authentication = self
            .authentication(service_id)
            .ok_or_else(|| ServiceError::UnknownService(service_id.to_string()))?;
        let handler = self.schemes.get(authentication.scheme).ok_or_else(|| {
            ServiceError::Internal(anyhow::anyhow!(
                "No handler for scheme {}",
                authentication.scheme
            ))
        })?;

        let source = self.sources.get_auth_source_from_request(request);

        if !handler.is_required_valid_source() {
            return Ok(handler
                .create_command(authentication, source.as_ref())
                .await?);
        }

        let source = source.ok_or(AuthSchemeError::MissingAuthentication)?;
        if !self.sources.is_valid(&source, service_id).await {
            return Err(AuthSchemeError::InvalidToken.into());
        }

        let key = CommandKey {
            service_id: service_id.to_lowercase(),
            scheme: authentication.scheme,
            applid: authentication.applid.clone(),
            fingerprint: fingerprint(&source.raw_source()),
        };

        let now = Utc::now();
        if let Some(command) = self.cache.get(&key) {
            if !command.is_expired(now) {
                metrics::record_command_created(authentication.scheme, true);
                return Ok(command.clone());
            }
        }
        self.cache.remove_if(&key, |_, command| command.is_expired(now));

        let command = handler
            .create_command(authentication, Some(&source))
            .await
            .map_err(|e| {
                tracing::debug!(
                    service_id = %service_id,
                    scheme = %authentication.scheme,
                    error = %e,
                    "Authentication command refused"
                );
                e
            })?;

        metrics::record_command_created(authentication.scheme, false);
        self.cache.retain(|_, cached| !cached.is_expired(now));
        self.cache.insert(key, command.clone());
        Ok(command)
    }

    /// Drop every cached command derived from `raw_credential`.
    pub fn evict_token(&self, raw_credential: &str) {
        let fingerprint = fingerprint(raw_credential);
        self.cache.retain(|key, _| key.fingerprint != fingerprint);
    }

    pub fn cached_commands(&self) -> usize {
        self.cache.len()
    }
}
