//! Process-local backend.
//!
//! All collections sit behind one `RwLock`. Every operation that reads and
//! then writes (request uniqueness, approve/decline) holds the write lock for
//! its whole duration, so it is atomic with respect to other callers.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use localbite_core::{Email, ReviewId, Role, Uid, VerificationRequestId, VerificationStatus};

use super::verification_requests::{DUPLICATE_REQUEST, already_verified, ensure_transition};
use super::{
    RepositoryError, ReviewRepository, Store, UserRepository, VerificationRepository, entity,
    newest_first,
};
use crate::models::{
    NewReview, NewUser, NewVerificationRequest, ProfileUpdate, Review, ReviewUpdate, User,
    UserFilter, VerificationRequest,
};

#[derive(Debug, Default)]
struct Collections {
    users: Vec<User>,
    requests: Vec<VerificationRequest>,
    reviews: Vec<Review>,
}

impl Collections {
    fn user_mut(&mut self, uid: &Uid) -> Option<&mut User> {
        self.users.iter_mut().find(|u| &u.uid == uid)
    }

    fn request_mut(&mut self, id: VerificationRequestId) -> Option<&mut VerificationRequest> {
        self.requests.iter_mut().find(|r| r.id == id)
    }

    fn review_mut(&mut self, id: ReviewId) -> Option<&mut Review> {
        self.reviews.iter_mut().find(|r| r.id == id)
    }
}

/// In-memory store. Data is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<Collections>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn upsert_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut data = self.data.write().await;
        let now = Utc::now();

        if let Some(existing) = data.user_mut(&user.uid) {
            existing.full_name.clone_from(&user.full_name);
            existing.email = user.email.clone();
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let created = User {
            uid: user.uid.clone(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            role: user.role,
            is_verified: false,
            avatar: None,
            location_label: None,
            created_at: now,
            updated_at: now,
        };
        data.users.push(created.clone());
        Ok(created)
    }

    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>, RepositoryError> {
        let data = self.data.read().await;
        let matching = data.users.iter().filter(|u| filter.matches(u)).cloned();
        Ok(newest_first(matching.collect::<Vec<_>>().into_iter(), |u| {
            u.created_at
        }))
    }

    async fn get_user(&self, uid: &Uid) -> Result<Option<User>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.users.iter().find(|u| &u.uid == uid).cloned())
    }

    async fn get_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.users.iter().find(|u| &u.email == email).cloned())
    }

    async fn update_profile(
        &self,
        uid: &Uid,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, RepositoryError> {
        let mut data = self.data.write().await;
        Ok(data.user_mut(uid).map(|user| {
            update.apply_to(user);
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn set_role(&self, uid: &Uid, role: Role) -> Result<Option<User>, RepositoryError> {
        let mut data = self.data.write().await;
        Ok(data.user_mut(uid).map(|user| {
            user.role = role;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn delete_user(&self, uid: &Uid) -> Result<bool, RepositoryError> {
        let mut data = self.data.write().await;
        let before = data.users.len();
        data.users.retain(|u| &u.uid != uid);
        Ok(data.users.len() < before)
    }
}

#[async_trait]
impl VerificationRepository for MemoryStore {
    async fn create_request(
        &self,
        request: &NewVerificationRequest,
    ) -> Result<VerificationRequest, RepositoryError> {
        let mut data = self.data.write().await;

        if data.requests.iter().any(|r| r.uid == request.uid) {
            return Err(RepositoryError::Conflict(DUPLICATE_REQUEST.to_owned()));
        }

        let now = Utc::now();
        let created = VerificationRequest {
            id: VerificationRequestId::generate(),
            uid: request.uid.clone(),
            full_name: request.full_name.clone(),
            email: request.email.clone(),
            role: request.role,
            status: VerificationStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        data.requests.push(created.clone());
        Ok(created)
    }

    async fn list_requests(
        &self,
        status: Option<VerificationStatus>,
    ) -> Result<Vec<VerificationRequest>, RepositoryError> {
        let data = self.data.read().await;
        let matching: Vec<_> = data
            .requests
            .iter()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        Ok(newest_first(matching.into_iter(), |r| r.created_at))
    }

    async fn get_request(
        &self,
        id: VerificationRequestId,
    ) -> Result<Option<VerificationRequest>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.requests.iter().find(|r| r.id == id).cloned())
    }

    async fn get_request_by_uid(
        &self,
        uid: &Uid,
    ) -> Result<Option<VerificationRequest>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.requests.iter().find(|r| &r.uid == uid).cloned())
    }

    async fn approve_request(
        &self,
        id: VerificationRequestId,
    ) -> Result<VerificationRequest, RepositoryError> {
        let mut data = self.data.write().await;

        let request = data
            .request_mut(id)
            .ok_or(RepositoryError::NotFound(entity::REQUEST))?;
        ensure_transition(request, VerificationStatus::Approved)?;
        let uid = request.uid.clone();

        let now = Utc::now();
        let user = data
            .user_mut(&uid)
            .ok_or(RepositoryError::NotFound(entity::USER))?;
        user.is_verified = true;
        user.updated_at = now;

        let request = data
            .request_mut(id)
            .ok_or(RepositoryError::NotFound(entity::REQUEST))?;
        request.status = VerificationStatus::Approved;
        request.updated_at = now;
        Ok(request.clone())
    }

    async fn decline_request(
        &self,
        id: VerificationRequestId,
    ) -> Result<VerificationRequest, RepositoryError> {
        let mut data = self.data.write().await;

        let request = data
            .request_mut(id)
            .ok_or(RepositoryError::NotFound(entity::REQUEST))?;
        ensure_transition(request, VerificationStatus::Declined)?;
        let uid = request.uid.clone();

        if data.user_mut(&uid).is_some_and(|u| u.is_verified) {
            return Err(already_verified());
        }

        let request = data
            .request_mut(id)
            .ok_or(RepositoryError::NotFound(entity::REQUEST))?;
        request.status = VerificationStatus::Declined;
        request.updated_at = Utc::now();
        Ok(request.clone())
    }

    async fn verify_user(&self, uid: &Uid) -> Result<User, RepositoryError> {
        let mut data = self.data.write().await;

        if data.user_mut(uid).is_none() {
            return Err(RepositoryError::NotFound(entity::USER));
        }

        let now = Utc::now();
        if let Some(request) = data
            .requests
            .iter_mut()
            .find(|r| &r.uid == uid && r.status != VerificationStatus::Approved)
        {
            ensure_transition(request, VerificationStatus::Approved)?;
            request.status = VerificationStatus::Approved;
            request.updated_at = now;
        }

        let user = data
            .user_mut(uid)
            .ok_or(RepositoryError::NotFound(entity::USER))?;
        user.is_verified = true;
        user.updated_at = now;
        Ok(user.clone())
    }
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn create_review(&self, review: &NewReview) -> Result<Review, RepositoryError> {
        let mut data = self.data.write().await;
        let now = Utc::now();
        let created = Review {
            id: ReviewId::generate(),
            cook_name: review.cook_name.clone(),
            user: review.user.clone(),
            email: review.email.clone(),
            rating: review.rating,
            comment: review.comment.clone(),
            created_at: now,
            updated_at: now,
        };
        data.reviews.push(created.clone());
        Ok(created)
    }

    async fn list_reviews_for_cook(&self, cook_name: &str) -> Result<Vec<Review>, RepositoryError> {
        let wanted = cook_name.to_lowercase();
        let data = self.data.read().await;
        let matching: Vec<_> = data
            .reviews
            .iter()
            .filter(|r| r.cook_name.to_lowercase() == wanted)
            .cloned()
            .collect();
        Ok(newest_first(matching.into_iter(), |r| r.created_at))
    }

    async fn update_review(
        &self,
        id: ReviewId,
        update: &ReviewUpdate,
    ) -> Result<Option<Review>, RepositoryError> {
        let mut data = self.data.write().await;
        Ok(data.review_mut(id).map(|review| {
            update.apply_to(review);
            review.updated_at = Utc::now();
            review.clone()
        }))
    }

    async fn delete_review(&self, id: ReviewId) -> Result<bool, RepositoryError> {
        let mut data = self.data.write().await;
        let before = data.reviews.len();
        data.reviews.retain(|r| r.id != id);
        Ok(data.reviews.len() < before)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn new_user(uid: &str, name: &str) -> NewUser {
        NewUser {
            uid: Uid::parse(uid).unwrap(),
            full_name: name.to_string(),
            email: Email::parse(&format!("{uid}@example.com")).unwrap(),
            role: Role::Cook,
        }
    }

    async fn seeded_request(store: &MemoryStore, uid: &str) -> VerificationRequest {
        let user = store.upsert_user(&new_user(uid, "Amina")).await.unwrap();
        store
            .create_request(&NewVerificationRequest::snapshot(&user))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_upsert_keeps_role_and_verification() {
        let store = MemoryStore::new();
        let uid = Uid::parse("u1").unwrap();
        store.upsert_user(&new_user("u1", "Amina")).await.unwrap();
        store.verify_user(&uid).await.unwrap();

        let mut again = new_user("u1", "Amina K");
        again.role = Role::Foodie;
        let user = store.upsert_user(&again).await.unwrap();

        assert_eq!(user.full_name, "Amina K");
        assert_eq!(user.role, Role::Cook);
        assert!(user.is_verified);
        assert_eq!(store.list_users(&UserFilter::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_second_request_for_uid_conflicts() {
        let store = MemoryStore::new();
        let first = seeded_request(&store, "u1").await;
        store.decline_request(first.id).await.unwrap();

        let user = store.get_user(&first.uid).await.unwrap().unwrap();
        let err = store
            .create_request(&NewVerificationRequest::snapshot(&user))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(ref m) if m == DUPLICATE_REQUEST));
    }

    #[tokio::test]
    async fn test_concurrent_requests_for_same_uid() {
        let store = Arc::new(MemoryStore::new());
        let user = store.upsert_user(&new_user("u1", "Amina")).await.unwrap();
        let snapshot = NewVerificationRequest::snapshot(&user);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let snapshot = snapshot.clone();
                tokio::spawn(async move { store.create_request(&snapshot).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.list_requests(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_approve_verifies_user() {
        let store = MemoryStore::new();
        let request = seeded_request(&store, "u1").await;

        let approved = store.approve_request(request.id).await.unwrap();
        assert_eq!(approved.status, VerificationStatus::Approved);

        let user = store.get_user(&request.uid).await.unwrap().unwrap();
        assert!(user.is_verified);
    }

    #[tokio::test]
    async fn test_resolved_request_cannot_change() {
        let store = MemoryStore::new();
        let request = seeded_request(&store, "u1").await;
        store.decline_request(request.id).await.unwrap();

        let err = store.approve_request(request.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidState(ref m) if m == "Request already declined"));

        let user = store.get_user(&request.uid).await.unwrap().unwrap();
        assert!(!user.is_verified);
        let stored = store.get_request(request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, VerificationStatus::Declined);
    }

    #[tokio::test]
    async fn test_approve_orphaned_request_changes_nothing() {
        let store = MemoryStore::new();
        let request = seeded_request(&store, "u1").await;
        store.delete_user(&request.uid).await.unwrap();

        let err = store.approve_request(request.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(entity::USER)));

        let stored = store.get_request(request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, VerificationStatus::Pending);
    }

    #[tokio::test]
    async fn test_direct_verify_approves_pending_request() {
        let store = MemoryStore::new();
        let request = seeded_request(&store, "u1").await;

        let user = store.verify_user(&request.uid).await.unwrap();
        assert!(user.is_verified);
        let stored = store.get_request(request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, VerificationStatus::Approved);

        let err = store.decline_request(request.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidState(_)));
        let stored = store.get_request(request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, VerificationStatus::Approved);
    }

    #[tokio::test]
    async fn test_direct_verify_refused_after_decline() {
        let store = MemoryStore::new();
        let request = seeded_request(&store, "u1").await;
        store.decline_request(request.id).await.unwrap();

        let err = store.verify_user(&request.uid).await.unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidState(ref m) if m == "Request already declined"));
        assert!(!store.get_user(&request.uid).await.unwrap().unwrap().is_verified);
    }

    #[tokio::test]
    async fn test_decline_refused_for_verified_user() {
        let store = MemoryStore::new();
        let user = store.upsert_user(&new_user("u1", "Amina")).await.unwrap();
        let user = store.verify_user(&user.uid).await.unwrap();
        // A request that slipped in after the user was verified
        let request = store
            .create_request(&NewVerificationRequest::snapshot(&user))
            .await
            .unwrap();

        let err = store.decline_request(request.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidState(ref m) if m == "User already verified"));
        let stored = store.get_request(request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, VerificationStatus::Pending);

        assert!(matches!(
            store.verify_user(&Uid::parse("ghost").unwrap()).await.unwrap_err(),
            RepositoryError::NotFound(entity::USER)
        ));
    }

    #[tokio::test]
    async fn test_resolve_unknown_request() {
        let store = MemoryStore::new();
        let id = VerificationRequestId::generate();
        assert!(matches!(
            store.approve_request(id).await.unwrap_err(),
            RepositoryError::NotFound(entity::REQUEST)
        ));
        assert!(matches!(
            store.decline_request(id).await.unwrap_err(),
            RepositoryError::NotFound(entity::REQUEST)
        ));
    }

    #[tokio::test]
    async fn test_list_requests_by_status() {
        let store = MemoryStore::new();
        let a = seeded_request(&store, "u1").await;
        seeded_request(&store, "u2").await;
        store.approve_request(a.id).await.unwrap();

        let pending = store
            .list_requests(Some(VerificationStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].uid.as_str(), "u2");

        let all = store.list_requests(None).await.unwrap();
        assert_eq!(all[0].uid.as_str(), "u2");
    }

    #[tokio::test]
    async fn test_cook_name_match_is_case_insensitive_and_literal() {
        let store = MemoryStore::new();
        for cook in ["Amina", "AMINA", "Am.na", "Amina Khan"] {
            store
                .create_review(&NewReview {
                    cook_name: cook.to_string(),
                    user: "Guest".to_string(),
                    email: None,
                    rating: 4.0,
                    comment: "Good".to_string(),
                })
                .await
                .unwrap();
        }

        let found = store.list_reviews_for_cook("amina").await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].cook_name, "AMINA");

        let dotted = store.list_reviews_for_cook("Am.na").await.unwrap();
        assert_eq!(dotted.len(), 1);
    }

    #[tokio::test]
    async fn test_review_update_and_delete() {
        let store = MemoryStore::new();
        let review = store
            .create_review(&NewReview {
                cook_name: "Amina".to_string(),
                user: "Karim".to_string(),
                email: Some("karim@example.com".to_string()),
                rating: 3.0,
                comment: "Fine".to_string(),
            })
            .await
            .unwrap();

        let update = ReviewUpdate {
            rating: Some(5.0),
            comment: None,
        };
        let updated = store.update_review(review.id, &update).await.unwrap().unwrap();
        assert!((updated.rating - 5.0).abs() < f64::EPSILON);
        assert_eq!(updated.comment, "Fine");

        assert!(store.delete_review(review.id).await.unwrap());
        assert!(!store.delete_review(review.id).await.unwrap());
        assert!(store.update_review(review.id, &update).await.unwrap().is_none());
    }
}
