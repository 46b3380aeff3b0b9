//! In-memory `ProfileStore` for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::access::plans::{Plan, PlanGrant};
use crate::errors::AppError;
use crate::models::user::{ProfilePatch, UserProfile};
use crate::profile::ProfileStore;

#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: Mutex<HashMap<Uuid, UserProfile>>,
}

/// Same rule as the Postgres store: extend from any remaining premium time.
fn extended_expiry(
    current: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    days: i64,
) -> DateTime<Utc> {
    let base = current.filter(|expiry| *expiry > now).unwrap_or(now);
    base + Duration::days(days)
}

impl MemoryProfileStore {
    pub fn with(profiles: impl IntoIterator<Item = UserProfile>) -> Self {
        Self {
            profiles: Mutex::new(profiles.into_iter().map(|p| (p.id, p)).collect()),
        }
    }

    pub fn snapshot(&self, user_id: Uuid) -> Option<UserProfile> {
        self.profiles.lock().unwrap().get(&user_id).cloned()
    }

    fn modify(
        &self,
        user_id: Uuid,
        f: impl FnOnce(&mut UserProfile),
    ) -> Result<UserProfile, AppError> {
        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound(format!("Profile {user_id} not found")))?;
        f(profile);
        Ok(profile.clone())
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, AppError> {
        Ok(self.snapshot(user_id))
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        patch: &ProfilePatch,
    ) -> Result<UserProfile, AppError> {
        self.modify(user_id, |p| {
            if let Some(name) = &patch.full_name {
                p.full_name = Some(name.clone());
            }
            if let Some(phone) = &patch.phone {
                p.phone = Some(phone.clone());
            }
        })
    }

    async fn consume_credit(&self, user_id: Uuid) -> Result<Option<i32>, AppError> {
        let mut profiles = self.profiles.lock().unwrap();
        Ok(profiles.get_mut(&user_id).and_then(|p| {
            (p.cv_credits > 0).then(|| {
                p.cv_credits -= 1;
                p.cv_credits
            })
        }))
    }

    async fn apply_plan(
        &self,
        user_id: Uuid,
        plan: Plan,
        now: DateTime<Utc>,
    ) -> Result<UserProfile, AppError> {
        self.modify(user_id, |p| match plan.grant() {
            PlanGrant::Credits(credits) => p.cv_credits = p.cv_credits.max(0) + credits,
            PlanGrant::PremiumDays(days) => {
                p.is_premium = true;
                p.premium_expiry = Some(extended_expiry(p.premium_expiry, now, days));
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::gate::tests::profile;

    #[test]
    fn test_expiry_extends_from_remaining_time() {
        let now = Utc::now();
        let later = now + Duration::days(10);
        assert_eq!(extended_expiry(Some(later), now, 30), later + Duration::days(30));
        assert_eq!(extended_expiry(None, now, 30), now + Duration::days(30));

        let lapsed = now - Duration::days(5);
        assert_eq!(extended_expiry(Some(lapsed), now, 30), now + Duration::days(30));
    }

    #[tokio::test]
    async fn test_back_to_back_approvals_stack_premium_time() {
        let buyer = profile(0);
        let store = MemoryProfileStore::with([buyer.clone()]);
        let now = Utc::now();

        store.apply_plan(buyer.id, Plan::Monthly, now).await.unwrap();
        let updated = store.apply_plan(buyer.id, Plan::Yearly, now).await.unwrap();
        assert_eq!(updated.premium_expiry, Some(now + Duration::days(395)));
    }
}
