use anyhow::{Context, Result};
use data_encoding::BASE32_NOPAD;
use futures::stream::TryStreamExt;
use mongodb::bson::{DateTime, doc, oid::ObjectId};
use rand::RngCore;
use std::time::{Duration, SystemTime};

use crate::models::{Session, User, UserOrganization, UserRole};

use super::{AppState, SESSION_TTL_SECONDS};

/// One resolved membership of a user.
#[derive(Debug, Clone)]
pub struct Membership {
    pub org_id: ObjectId,
    pub org_name: String,
    pub org_slug: String,
    pub role: UserRole,
}

/// A user together with its memberships, in stable (insertion) order.
#[derive(Clone)]
pub struct UserWithOrgs {
    pub id: ObjectId,
    pub email: String,
    pub secret: String,
    pub memberships: Vec<Membership>,
}

impl UserWithOrgs {
    pub fn membership_for(&self, org_id: &ObjectId) -> Option<&Membership> {
        self.memberships.iter().find(|m| &m.org_id == org_id)
    }

    pub fn first_membership(&self) -> Option<&Membership> {
        self.memberships.first()
    }
}

pub async fn find_user(state: &AppState, email: &str) -> Result<Option<UserWithOrgs>> {
    if let Some(user) = state.users.find_one(doc! { "email": email }).await? {
        build_user_with_orgs(state, user).await.map(Some)
    } else {
        Ok(None)
    }
}

pub async fn get_user_by_id(state: &AppState, id: &ObjectId) -> Result<Option<UserWithOrgs>> {
    if let Some(user) = state.users.find_one(doc! { "_id": id }).await? {
        build_user_with_orgs(state, user).await.map(Some)
    } else {
        Ok(None)
    }
}

pub async fn create_user(state: &AppState, email: &str, secret: &str) -> Result<ObjectId> {
    let res = state
        .users
        .insert_one(User {
            id: None,
            email: email.to_string(),
            secret: secret.to_string(),
        })
        .await?;
    res.inserted_id
        .as_object_id()
        .context("user insert missing _id")
}

pub async fn add_user_to_org(
    state: &AppState,
    user_id: &ObjectId,
    org_id: &ObjectId,
    role: UserRole,
) -> Result<()> {
    let res = state
        .user_orgs
        .update_one(
            doc! { "user_id": user_id, "org_id": org_id },
            doc! { "$set": { "role": role.as_str() } },
        )
        .await?;
    if res.matched_count == 0 {
        state
            .user_orgs
            .insert_one(UserOrganization {
                id: None,
                user_id: *user_id,
                org_id: *org_id,
                role,
            })
            .await?;
    }
    Ok(())
}

pub async fn delete_user(state: &AppState, id: &ObjectId) -> Result<()> {
    state.users.delete_one(doc! { "_id": id }).await?;
    let _ = state.user_orgs.delete_many(doc! { "user_id": id }).await;
    Ok(())
}

pub async fn create_session(state: &AppState, email: &str) -> Result<String> {
    let _ = state
        .sessions
        .delete_many(doc! { "user_email": email })
        .await;

    let mut token_bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut token_bytes);
    let token = BASE32_NOPAD.encode(&token_bytes);

    let expires_at =
        DateTime::from_system_time(SystemTime::now() + Duration::from_secs(SESSION_TTL_SECONDS));

    state
        .sessions
        .insert_one(Session {
            id: None,
            token: token.clone(),
            user_email: email.to_string(),
            expires_at,
        })
        .await?;

    Ok(token)
}

pub async fn find_user_by_session(state: &AppState, token: &str) -> Result<Option<UserWithOrgs>> {
    if let Some(session) = state.sessions.find_one(doc! { "token": token }).await? {
        if session.expires_at.to_system_time() <= SystemTime::now() {
            // Remove expired session, ignore result
            let _ = state.sessions.delete_one(doc! { "token": token }).await;
            return Ok(None);
        }
        find_user(state, &session.user_email).await
    } else {
        Ok(None)
    }
}

pub async fn delete_session(state: &AppState, token: &str) -> Result<()> {
    let _ = state.sessions.delete_one(doc! { "token": token }).await?;
    Ok(())
}

async fn build_user_with_orgs(state: &AppState, user: User) -> Result<UserWithOrgs> {
    let id = user.id.context("user missing _id")?;

    // Memberships in _id order: arbitrary but stable, so the fallback tenant
    // never flaps between requests.
    let mut memberships = Vec::new();
    let mut cursor = state
        .user_orgs
        .find(doc! { "user_id": &id })
        .sort(doc! { "_id": 1 })
        .await?;
    while let Some(m) = cursor.try_next().await? {
        memberships.push(m);
    }

    let mut resolved = Vec::new();
    for m in memberships {
        if let Some(org) = state.orgs.find_one(doc! { "_id": &m.org_id }).await? {
            resolved.push(Membership {
                org_id: m.org_id,
                org_name: org.name,
                org_slug: org.slug,
                role: m.role,
            });
        }
    }

    Ok(UserWithOrgs {
        id,
        email: user.email,
        secret: user.secret,
        memberships: resolved,
    })
}
