//! Client for the source-of-truth network catalog.
//!
//! The catalog is walked with three sequential list calls per level: groups,
//! namespaces within each group, networks within each namespace. There is no
//! pagination handling; a malformed page fails the whole poll loudly rather
//! than silently truncating the desired set. There is no retry inside a
//! poll — the agent's cycle interval is the retry mechanism.

use crate::error::{SyncError, SyncResult};
use crate::types::NetworkDefinition;
use async_trait::async_trait;
use gwsync_types::{Ipv4Net, VlanId};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Annotation a network must carry (set to "true") to receive a gateway.
const REQUIRE_GATEWAY_ANNOTATION: &str = "require-gateway";

/// Per-request timeout against the catalog API.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Anything the agent can poll for the desired network set.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetches and normalizes the full desired set of gateway networks.
    async fn poll(&self) -> SyncResult<Vec<NetworkDefinition>>;
}

/// HTTP client for the catalog API.
pub struct NetworkCatalogClient {
    http: reqwest::Client,
    base_url: String,
}

impl NetworkCatalogClient {
    /// Creates a client for the given base address.
    pub fn new(base_url: impl Into<String>) -> SyncResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SyncError::config("catalog.address", e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> SyncResult<T> {
        debug!(%url, "fetching catalog page");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|source| SyncError::CatalogFetch {
                url: url.to_string(),
                source,
            })?;
        response
            .json::<T>()
            .await
            .map_err(|e| SyncError::catalog_format(url, e.to_string()))
    }

    async fn groups(&self) -> SyncResult<Vec<String>> {
        let url = self.url("/v0/groups");
        let page: GroupsPage = self.get_json(&url).await?;
        Ok(page.data.groups.into_iter().map(|g| g.meta.id).collect())
    }

    async fn namespaces(&self, group: &str) -> SyncResult<Vec<String>> {
        let url = self.url(&format!("/v0/groups/{}/namespaces", group));
        let page: NamespacesPage = self.get_json(&url).await?;
        Ok(page.data.namespaces.into_iter().map(|n| n.meta.id).collect())
    }

    async fn networks(&self, group: &str, namespace: &str) -> SyncResult<Vec<NetworkDefinition>> {
        let url = self.url(&format!(
            "/v0/groups/{}/namespaces/{}/networks",
            group, namespace
        ));
        let page: NetworksPage = self.get_json(&url).await?;
        normalize_networks(&url, page)
    }
}

#[async_trait]
impl CatalogSource for NetworkCatalogClient {
    async fn poll(&self) -> SyncResult<Vec<NetworkDefinition>> {
        let mut networks = Vec::new();

        for group in self.groups().await? {
            for namespace in self.namespaces(&group).await? {
                networks.extend(self.networks(&group, &namespace).await?);
            }
        }

        ensure_unique_vlan_ids(&networks)?;
        Ok(networks)
    }
}

/// VLAN IDs must be unique across one poll cycle; a duplicate means the
/// catalog contents are inconsistent and no diff should be computed from
/// them.
fn ensure_unique_vlan_ids(networks: &[NetworkDefinition]) -> SyncResult<()> {
    let mut seen: HashMap<VlanId, &str> = HashMap::new();
    for network in networks {
        if let Some(other) = seen.insert(network.vlan_id, &network.id) {
            return Err(SyncError::catalog_format(
                "<catalog>",
                format!(
                    "vlan {} assigned to both '{}' and '{}'",
                    network.vlan_id, other, network.id
                ),
            ));
        }
    }
    Ok(())
}

/// Normalizes one networks page: keeps only networks annotated as requiring
/// a gateway, parses their spec, and derives the gateway address.
fn normalize_networks(url: &str, page: NetworksPage) -> SyncResult<Vec<NetworkDefinition>> {
    let mut networks = Vec::new();

    for entry in page.data.networks {
        let requires_gateway = entry
            .meta
            .annotations
            .get(REQUIRE_GATEWAY_ANNOTATION)
            .is_some_and(|value| value.as_str() == "true");
        if !requires_gateway {
            continue;
        }

        let spec = entry.spec.template.spec;
        let vlan_id = spec.id.to_vlan_id().map_err(|e| {
            SyncError::catalog_format(url, format!("network '{}': {}", entry.meta.id, e))
        })?;
        let ipv4_cidr: Ipv4Net = spec.ipv4_cidr.parse().map_err(|e| {
            SyncError::catalog_format(url, format!("network '{}': {}", entry.meta.id, e))
        })?;

        networks.push(NetworkDefinition::new(
            entry.meta.id,
            vlan_id,
            ipv4_cidr,
            spec.ipv6_cidr,
        ));
    }

    Ok(networks)
}

// Wire shapes of the three catalog list endpoints. Any missing or
// mis-shaped field fails deserialization of the whole page.

#[derive(Debug, Deserialize)]
struct GroupsPage {
    data: GroupsData,
}

#[derive(Debug, Deserialize)]
struct GroupsData {
    groups: Vec<ObjectRef>,
}

#[derive(Debug, Deserialize)]
struct NamespacesPage {
    data: NamespacesData,
}

#[derive(Debug, Deserialize)]
struct NamespacesData {
    namespaces: Vec<ObjectRef>,
}

#[derive(Debug, Deserialize)]
struct ObjectRef {
    meta: ObjectMeta,
}

#[derive(Debug, Deserialize)]
struct ObjectMeta {
    id: String,
}

#[derive(Debug, Deserialize)]
struct NetworksPage {
    data: NetworksData,
}

#[derive(Debug, Deserialize)]
struct NetworksData {
    networks: Vec<NetworkEntry>,
}

#[derive(Debug, Deserialize)]
struct NetworkEntry {
    meta: NetworkMeta,
    spec: NetworkSpec,
}

#[derive(Debug, Deserialize)]
struct NetworkMeta {
    id: String,
    #[serde(default)]
    annotations: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct NetworkSpec {
    template: NetworkTemplate,
}

#[derive(Debug, Deserialize)]
struct NetworkTemplate {
    spec: TemplateSpec,
}

#[derive(Debug, Deserialize)]
struct TemplateSpec {
    id: VlanIdField,
    #[serde(rename = "ipv4CIDR")]
    ipv4_cidr: String,
    #[serde(rename = "ipv6CIDR")]
    ipv6_cidr: String,
}

/// The catalog serializes VLAN IDs as either a JSON number or a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VlanIdField {
    Number(u16),
    Text(String),
}

impl VlanIdField {
    fn to_vlan_id(&self) -> Result<VlanId, gwsync_types::ParseError> {
        match self {
            VlanIdField::Number(id) => VlanId::new(*id),
            VlanIdField::Text(text) => text.parse(),
        }
    }
}
