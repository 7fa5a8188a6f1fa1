//! Pricing Policy Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::store::{Filter, FindOptions, SharedStore, SortOrder, from_document, to_document};
use shared::models::{PolicyStatus, PricingPolicy, PricingPolicyCreate, PricingPolicyUpdate};
use shared::util::{new_id, now_millis};

const COLLECTION: &str = "pricing_policies";

#[derive(Clone)]
pub struct PricingPolicyRepository {
    base: BaseRepository,
}

impl PricingPolicyRepository {
    pub fn new(store: SharedStore) -> Self {
        Self {
            base: BaseRepository::new(store),
        }
    }

    /// All policies, newest first, optionally filtered by status
    pub async fn find_all(&self, status: Option<PolicyStatus>) -> RepoResult<Vec<PricingPolicy>> {
        let filter = match status {
            Some(PolicyStatus::Active) => Filter::new().eq("status", "active"),
            Some(PolicyStatus::Inactive) => Filter::new().eq("status", "inactive"),
            None => Filter::new(),
        };
        let options = FindOptions::default().sort_by("created_at", SortOrder::Desc);
        let docs = self.base.store().find(COLLECTION, &filter, &options).await?;
        Ok(docs
            .into_iter()
            .map(from_document)
            .collect::<Result<Vec<_>, _>>()?)
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<PricingPolicy>> {
        match self.base.store().find_by_id(COLLECTION, id).await? {
            Some(doc) => Ok(Some(from_document(doc)?)),
            None => Ok(None),
        }
    }

    /// Policies for the given ids, in id order; unknown ids are skipped.
    pub async fn find_by_ids(&self, ids: &[String]) -> RepoResult<Vec<PricingPolicy>> {
        let mut policies = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(policy) = self.find_by_id(id).await? {
                policies.push(policy);
            }
        }
        Ok(policies)
    }

    pub async fn find_by_name(&self, name: &str) -> RepoResult<Option<PricingPolicy>> {
        let filter = Filter::new().eq("name", name);
        match self.base.store().find_one(COLLECTION, &filter).await? {
            Some(doc) => Ok(Some(from_document(doc)?)),
            None => Ok(None),
        }
    }

    pub async fn create(&self, data: PricingPolicyCreate) -> RepoResult<PricingPolicy> {
        if self.find_by_name(&data.name).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Pricing policy '{}' already exists",
                data.name
            )));
        }

        let now = now_millis();
        let policy = PricingPolicy {
            id: new_id(),
            name: data.name,
            description: data.description,
            kind: data.kind,
            status: data.status.unwrap_or_default(),
            service_id: data.service_id,
            selected_services: data.selected_services,
            created_at: now,
            updated_at: now,
        };

        let stored = self
            .base
            .store()
            .insert(COLLECTION, to_document(&policy)?)
            .await?;
        Ok(from_document(stored)?)
    }

    pub async fn update(&self, id: &str, data: PricingPolicyUpdate) -> RepoResult<PricingPolicy> {
        let mut policy = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Pricing policy {} not found", id)))?;

        if let Some(ref new_name) = data.name
            && new_name != &policy.name
            && self.find_by_name(new_name).await?.is_some()
        {
            return Err(RepoError::Duplicate(format!(
                "Pricing policy '{}' already exists",
                new_name
            )));
        }

        if let Some(name) = data.name {
            policy.name = name;
        }
        if let Some(description) = data.description {
            policy.description = Some(description);
        }
        if let Some(kind) = data.kind {
            policy.kind = kind;
        }
        if let Some(status) = data.status {
            policy.status = status;
        }
        if let Some(service_id) = data.service_id {
            policy.service_id = Some(service_id);
        }
        if let Some(selected) = data.selected_services {
            policy.selected_services = selected;
        }
        policy.updated_at = now_millis();

        let updated = self
            .base
            .store()
            .update_by_id(COLLECTION, id, to_document(&policy)?)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Pricing policy {} not found", id)))?;
        Ok(from_document(updated)?)
    }

    /// Hard delete a pricing policy
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        Ok(self.base.store().delete_by_id(COLLECTION, id).await?)
    }
}
