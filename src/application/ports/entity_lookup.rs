use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

/// Entity kinds addressable from a `{{kind:uuid}}` shortcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    System,
    Incident,
    Checklist,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [
        EntityKind::System,
        EntityKind::Incident,
        EntityKind::Checklist,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::System => "system",
            EntityKind::Incident => "incident",
            EntityKind::Checklist => "checklist",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::System => "System",
            EntityKind::Incident => "Incident",
            EntityKind::Checklist => "Checklist",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySummary {
    pub id: Uuid,
    pub name: String,
    pub status: Option<String>,
    pub detail: Option<String>,
}

/// Read-only batch access to entities owned by other subsystems.
/// Missing ids are simply absent from the returned map.
#[async_trait]
pub trait EntityLookup: Send + Sync {
    async fn batch_load(
        &self,
        tenant_id: Uuid,
        kind: EntityKind,
        ids: &[Uuid],
    ) -> anyhow::Result<HashMap<Uuid, EntitySummary>>;
}
