use crate::backend::traits::{AuthService, Datastore, ObjectStorage};
use crate::backend::types::{AuthSession, ListingQuery, ListingScope};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{Booking, Favorite, Listing, NewListing, Profile, Role, User, VerificationStatus};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

const LISTINGS: &str = "land_listings";
const PROFILES: &str = "profiles";
const FAVORITES: &str = "favorites";
const BOOKINGS: &str = "bookings";

/// Client for the hosted backend: auth, tables and storage behind one key
pub struct SupabaseClient {
    client: Client,
    config: Config,
    access_token: RwLock<Option<String>>,
}

impl SupabaseClient {
    pub fn new(config: Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("nectaris/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            config,
            access_token: RwLock::new(None),
        })
    }

    fn bearer(&self) -> String {
        self.access_token
            .read()
            .ok()
            .and_then(|token| token.clone())
            .unwrap_or_else(|| self.config.anon_key.clone())
    }

    fn set_token(&self, token: Option<String>) {
        if let Ok(mut slot) = self.access_token.write() {
            *slot = token;
        }
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        debug!("{} {}", method, url);
        self.client
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(self.bearer())
    }

    fn table(&self, method: Method, table: &str) -> RequestBuilder {
        self.request(method, &self.config.rest_url(table))
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = send(builder).await?;
        Ok(response.json::<T>().await?)
    }
}

async fn send(builder: RequestBuilder) -> Result<Response> {
    let response = builder.send().await?;
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = remote_message(&body)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| "unknown error".to_string());

    warn!("Backend returned {}: {}", status, message);
    Err(Error::Remote {
        status: status.as_u16(),
        message,
    })
}

/// The table API answers `{message, code, details, hint}`; the auth API uses
/// `msg` or `error_description` instead.
#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

fn remote_message(body: &str) -> Option<String> {
    let parsed: RemoteErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .message
        .or(parsed.msg)
        .or(parsed.error_description)
        .or(parsed.error)
        .filter(|m| !m.is_empty())
}

fn eq(value: impl ToString) -> String {
    format!("eq.{}", value.to_string())
}

fn listing_params(query: &ListingQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![("select", "*".to_string())];
    match query.scope {
        ListingScope::All => {}
        ListingScope::Verified => {
            params.push(("verification_status", eq(VerificationStatus::Verified)))
        }
        ListingScope::OwnedBy(owner) => params.push(("owner_id", eq(owner))),
    }
    if query.newest_first {
        params.push(("order", "created_at.desc".to_string()));
    }
    params
}

/// Sign-up answers with a bare user when e-mail confirmation is on, or with a
/// full session when it is off
fn user_from_signup(body: Value) -> Result<(User, Option<String>)> {
    if body.get("user").is_some() {
        let session: AuthSession = serde_json::from_value(body)?;
        Ok((session.user, Some(session.access_token)))
    } else {
        Ok((serde_json::from_value(body)?, None))
    }
}

#[async_trait]
impl AuthService for SupabaseClient {
    async fn sign_up(&self, email: &str, password: &str, role: Role) -> Result<User> {
        info!("Signing up {} as {}", email, role);
        let builder = self
            .request(Method::POST, &self.config.auth_url("signup"))
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "role": role },
            }));

        let body: Value = self.fetch(builder).await?;
        let (user, token) = user_from_signup(body)?;
        if token.is_some() {
            self.set_token(token);
        }
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        info!("Signing in {}", email);
        let builder = self
            .request(Method::POST, &self.config.auth_url("token"))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));

        let session: AuthSession = self.fetch(builder).await?;
        self.set_token(Some(session.access_token.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        let signed_in = self
            .access_token
            .read()
            .map(|token| token.is_some())
            .unwrap_or(false);
        if signed_in {
            send(self.request(Method::POST, &self.config.auth_url("logout"))).await?;
        }
        self.set_token(None);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "Supabase"
    }
}

#[derive(Deserialize)]
struct FavoriteRow {
    land_id: Uuid,
}

#[async_trait]
impl Datastore for SupabaseClient {
    async fn listings(&self, query: &ListingQuery) -> Result<Vec<Listing>> {
        let builder = self
            .table(Method::GET, LISTINGS)
            .query(&listing_params(query));
        let listings: Vec<Listing> = self.fetch(builder).await?;
        debug!("Fetched {} listings for {:?}", listings.len(), query.scope);
        Ok(listings)
    }

    async fn listing(&self, id: Uuid) -> Result<Option<Listing>> {
        let builder = self
            .table(Method::GET, LISTINGS)
            .query(&[("select", "*".to_string()), ("id", eq(id))]);
        let rows: Vec<Listing> = self.fetch(builder).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_listing(&self, listing: &NewListing) -> Result<Listing> {
        let builder = self
            .table(Method::POST, LISTINGS)
            .header("Prefer", "return=representation")
            .json(listing);
        let rows: Vec<Listing> = self.fetch(builder).await?;
        let created = rows.into_iter().next().ok_or_else(|| Error::Remote {
            status: 200,
            message: "insert returned no row".to_string(),
        })?;
        info!("Created listing {} ({})", created.id, created.title);
        Ok(created)
    }

    async fn set_verification_status(&self, id: Uuid, status: VerificationStatus) -> Result<()> {
        let builder = self
            .table(Method::PATCH, LISTINGS)
            .query(&[("id", eq(id))])
            .json(&json!({ "verification_status": status }));
        send(builder).await?;
        info!("Listing {} marked {}", id, status);
        Ok(())
    }

    async fn delete_listing(&self, id: Uuid) -> Result<()> {
        let builder = self
            .table(Method::DELETE, LISTINGS)
            .query(&[("id", eq(id))]);
        send(builder).await?;
        info!("Deleted listing {}", id);
        Ok(())
    }

    async fn profile(&self, id: Uuid) -> Result<Option<Profile>> {
        let builder = self
            .table(Method::GET, PROFILES)
            .query(&[("select", "*".to_string()), ("id", eq(id))]);
        let rows: Vec<Profile> = self.fetch(builder).await?;
        Ok(rows.into_iter().next())
    }

    async fn profiles(&self) -> Result<Vec<Profile>> {
        let builder = self
            .table(Method::GET, PROFILES)
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        self.fetch(builder).await
    }

    async fn update_full_name(&self, id: Uuid, full_name: &str) -> Result<()> {
        let builder = self
            .table(Method::PATCH, PROFILES)
            .query(&[("id", eq(id))])
            .json(&json!({ "full_name": full_name }));
        send(builder).await?;
        Ok(())
    }

    async fn favorite_ids(&self, beekeeper_id: Uuid) -> Result<HashSet<Uuid>> {
        let builder = self
            .table(Method::GET, FAVORITES)
            .query(&[("select", "land_id".to_string()), ("beekeeper_id", eq(beekeeper_id))]);
        let rows: Vec<FavoriteRow> = self.fetch(builder).await?;
        Ok(rows.into_iter().map(|row| row.land_id).collect())
    }

    async fn insert_favorite(&self, favorite: &Favorite) -> Result<()> {
        let builder = self
            .table(Method::POST, FAVORITES)
            .query(&[("on_conflict", "beekeeper_id,land_id")])
            .header("Prefer", "resolution=ignore-duplicates,return=minimal")
            .json(favorite);
        send(builder).await?;
        Ok(())
    }

    async fn delete_favorite(&self, favorite: &Favorite) -> Result<()> {
        let builder = self.table(Method::DELETE, FAVORITES).query(&[
            ("beekeeper_id", eq(favorite.beekeeper_id)),
            ("land_id", eq(favorite.land_id)),
        ]);
        send(builder).await?;
        Ok(())
    }

    async fn bookings(&self) -> Result<Vec<Booking>> {
        let builder = self.table(Method::GET, BOOKINGS).query(&[
            ("select", "*,land_listings(title),profiles(email,full_name)"),
            ("order", "created_at.desc"),
        ]);
        self.fetch(builder).await
    }
}

#[async_trait]
impl ObjectStorage for SupabaseClient {
    async fn upload(&self, bucket: &str, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        let size = bytes.len();
        let builder = self
            .request(Method::POST, &self.config.storage_object_url(bucket, key))
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(bytes);
        send(builder).await?;
        debug!("Uploaded {} bytes to {}/{}", size, bucket, key);
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        self.config.public_object_url(bucket, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_error_shape_yields_message() {
        let body = r#"{"code":"23505","details":null,"hint":null,"message":"duplicate key value"}"#;
        assert_eq!(remote_message(body).as_deref(), Some("duplicate key value"));
    }

    #[test]
    fn auth_error_shapes_yield_message() {
        assert_eq!(
            remote_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#)
                .as_deref(),
            Some("Invalid login credentials")
        );
        assert_eq!(
            remote_message(r#"{"code":422,"msg":"Password should be at least 6 characters"}"#)
                .as_deref(),
            Some("Password should be at least 6 characters")
        );
        assert_eq!(remote_message("<html>bad gateway</html>"), None);
    }

    #[test]
    fn listing_params_follow_scope() {
        let owner = Uuid::new_v4();
        let params = listing_params(&ListingQuery::owned_by(owner));
        assert!(params.contains(&("owner_id", format!("eq.{}", owner))));
        assert!(params.contains(&("order", "created_at.desc".to_string())));

        let params = listing_params(&ListingQuery::verified());
        assert!(params.contains(&("verification_status", "eq.verified".to_string())));

        let params = listing_params(&ListingQuery::all());
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn signup_body_may_be_user_or_session() {
        let id = Uuid::new_v4();
        let (user, token) =
            user_from_signup(json!({ "id": id, "email": "a@b.ro", "aud": "authenticated" })).unwrap();
        assert_eq!(user.id, id);
        assert!(token.is_none());

        let (user, token) = user_from_signup(json!({
            "access_token": "jwt",
            "token_type": "bearer",
            "user": { "id": id, "email": "a@b.ro" }
        }))
        .unwrap();
        assert_eq!(user.email, "a@b.ro");
        assert_eq!(token.as_deref(), Some("jwt"));
    }
}
