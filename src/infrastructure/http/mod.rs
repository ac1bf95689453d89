use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;

use crate::application::errors::VaultError;
use crate::application::ports::api_keys_port::ApiKeysPort;
use crate::application::ports::auth_port::{AuthPort, UserProfile};
use crate::application::ports::items_port::{ItemPatch, ItemsPort, NewItem, Upload};
use crate::application::ports::session_store::{SessionEvent, SessionStore};
use crate::domain::api_keys::api_key::ApiKey;
use crate::domain::items::item::{Item, ItemId, ItemParent, ItemType};

const TOKEN_EXPIRED: &str = "Error: Token expired";

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorBody {
    fn text(&self) -> &str {
        self.message
            .as_deref()
            .or(self.error.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct TokenBody {
    token: String,
}

#[derive(Deserialize)]
struct LoginBody {
    access_token: String,
}

/// REST adapter for the vault API. Attaches the stored bearer credential and
/// turns server errors into the `VaultError` taxonomy.
pub struct HttpVaultClient {
    client: reqwest::Client,
    api_url: String,
    sessions: Arc<dyn SessionStore>,
    events: broadcast::Sender<SessionEvent>,
}

impl HttpVaultClient {
    pub fn new(
        api_url: &str,
        timeout: Duration,
        sessions: Arc<dyn SessionStore>,
        events: broadcast::Sender<SessionEvent>,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            sessions,
            events,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    async fn with_session(&self, req: RequestBuilder) -> RequestBuilder {
        match self.sessions.load().await {
            Ok(Some(session)) => req.bearer_auth(session.access_token),
            Ok(None) => req,
            Err(e) => {
                tracing::warn!(error = ?e, "session_load_failed");
                req
            }
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, VaultError> {
        self.dispatch(req, false).await
    }

    /// Read request scoped by a share token (`?token=`).
    async fn send_scoped(
        &self,
        req: RequestBuilder,
        token: Option<&str>,
    ) -> Result<Response, VaultError> {
        match token {
            Some(t) => self.dispatch(req.query(&[("token", t)]), true).await,
            None => self.dispatch(req, false).await,
        }
    }

    async fn dispatch(&self, req: RequestBuilder, shared: bool) -> Result<Response, VaultError> {
        let req = self.with_session(req).await;
        let resp = req
            .send()
            .await
            .map_err(|e| VaultError::Network(anyhow::anyhow!("request failed: {e}")))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let raw = resp.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&raw).unwrap_or_default();
        if is_expired(status, &body, shared) {
            self.expire().await;
            return Err(VaultError::Unauthorized);
        }
        let err = classify(status, &body);
        tracing::debug!(status = status.as_u16(), shared, error = %err, "api_error");
        Err(err)
    }

    async fn json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, VaultError> {
        read_json(self.send(req).await?).await
    }

    async fn json_scoped<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        token: Option<&str>,
    ) -> Result<T, VaultError> {
        read_json(self.send_scoped(req, token).await?).await
    }

    async fn expire(&self) {
        if let Err(e) = self.sessions.clear().await {
            tracing::warn!(error = ?e, "session_clear_failed");
        }
        tracing::info!("session_expired");
        // Nobody listening is fine.
        let _ = self.events.send(SessionEvent::Expired);
    }
}

async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, VaultError> {
    resp.json::<T>()
        .await
        .map_err(|e| VaultError::Network(anyhow::anyhow!("failed to read body: {e}")))
}

/// A 401 on a share-token request rejects the token, not the owner's session.
fn is_expired(status: StatusCode, body: &ErrorBody, shared: bool) -> bool {
    body.error.as_deref() == Some(TOKEN_EXPIRED) || (status == StatusCode::UNAUTHORIZED && !shared)
}

fn classify(status: StatusCode, body: &ErrorBody) -> VaultError {
    match status {
        StatusCode::UNAUTHORIZED => VaultError::Unauthorized,
        StatusCode::FORBIDDEN => VaultError::Forbidden,
        StatusCode::NOT_FOUND => VaultError::NotFound,
        StatusCode::TOO_MANY_REQUESTS => VaultError::RateLimited,
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            let msg = body.text();
            let lower = msg.to_ascii_lowercase();
            if ["descendant", "itself", "cycl"].iter().any(|k| lower.contains(k)) {
                VaultError::CyclicMove
            } else if lower.contains("not a group") {
                VaultError::NotAGroup
            } else if lower.contains("not empty") {
                VaultError::GroupNotEmpty
            } else if msg.is_empty() {
                VaultError::validation(format!("request rejected ({status})"))
            } else {
                VaultError::validation(msg)
            }
        }
        other => VaultError::Network(anyhow::anyhow!(
            "upstream returned status {other}: {}",
            body.text()
        )),
    }
}

fn upload_part(upload: Upload) -> Result<Part, VaultError> {
    Part::bytes(upload.bytes)
        .file_name(upload.filename)
        .mime_str(&upload.mimetype)
        .map_err(|e| VaultError::validation(format!("invalid mime type: {e}")))
}

struct FormFields {
    name: Option<String>,
    item_type: Option<ItemType>,
    parent: Option<ItemId>,
    text: Option<String>,
    logo: Option<Upload>,
    file: Option<Upload>,
}

fn item_form(fields: FormFields) -> Result<Form, VaultError> {
    let mut form = Form::new();
    if let Some(name) = fields.name {
        form = form.text("name", name);
    }
    if let Some(ty) = fields.item_type {
        form = form.text("type", ty.as_str());
    }
    if let Some(parent) = fields.parent {
        form = form.text("parent", parent_field(parent));
    }
    if let Some(text) = fields.text {
        form = form.text("text", text);
    }
    if let Some(logo) = fields.logo.filter(|u| !u.is_empty()) {
        form = form.part("logo", upload_part(logo)?);
    }
    if let Some(file) = fields.file.filter(|u| !u.is_empty()) {
        form = form.part("file", upload_part(file)?);
    }
    Ok(form)
}

fn parent_field(parent: ItemId) -> String {
    serde_json::json!({ "id": parent }).to_string()
}

#[async_trait]
impl ItemsPort for HttpVaultClient {
    async fn list_children(
        &self,
        parent: Option<ItemId>,
        token: Option<&str>,
    ) -> Result<Vec<Item>, VaultError> {
        let path = match parent {
            Some(id) => format!("items/{id}"),
            None => "items".to_string(),
        };
        self.json_scoped(self.client.get(self.url(&path)), token)
            .await
    }

    async fn get_ancestry(
        &self,
        id: ItemId,
        token: Option<&str>,
    ) -> Result<ItemParent, VaultError> {
        let req = self.client.get(self.url(&format!("items/parent/{id}")));
        self.json_scoped(req, token).await
    }

    async fn get_one(&self, id: ItemId, token: Option<&str>) -> Result<Item, VaultError> {
        let req = self.client.get(self.url(&format!("items/one/{id}")));
        self.json_scoped(req, token).await
    }

    async fn create(&self, item: NewItem) -> Result<Item, VaultError> {
        let form = item_form(FormFields {
            name: Some(item.name),
            item_type: Some(item.item_type),
            parent: item.parent,
            text: item.text,
            logo: item.logo,
            file: item.file,
        })?;
        let req = self.client.post(self.url("items")).multipart(form);
        self.json(req).await
    }

    async fn update(&self, id: ItemId, patch: ItemPatch) -> Result<Item, VaultError> {
        let form = item_form(FormFields {
            name: patch.name,
            item_type: patch.item_type,
            parent: patch.parent,
            text: patch.text,
            logo: patch.logo,
            file: patch.file,
        })?;
        let req = self
            .client
            .put(self.url(&format!("items/{id}")))
            .multipart(form);
        self.json(req).await
    }

    async fn delete(&self, id: ItemId) -> Result<(), VaultError> {
        let req = self.client.delete(self.url(&format!("items/{id}")));
        self.send(req).await.map(|_| ())
    }

    async fn delete_group(&self, id: ItemId) -> Result<(), VaultError> {
        let req = self.client.delete(self.url(&format!("items/group/{id}")));
        self.send(req).await.map(|_| ())
    }

    async fn move_item(&self, id: ItemId, new_parent: ItemId) -> Result<(), VaultError> {
        let req = self
            .client
            .put(self.url(&format!("items/move/{id}/{new_parent}")));
        self.send(req).await.map(|_| ())
    }

    async fn generate_token(&self, id: ItemId) -> Result<String, VaultError> {
        let req = self
            .client
            .post(self.url(&format!("items/generate-token/{id}")));
        let body: TokenBody = self.json(req).await?;
        Ok(body.token)
    }

    async fn load_file(&self, path: &str, token: Option<&str>) -> Result<String, VaultError> {
        self.send_scoped(self.client.get(self.url(path)), token)
            .await?
            .text()
            .await
            .map_err(|e| VaultError::Network(anyhow::anyhow!("failed to read body: {e}")))
    }
}

#[async_trait]
impl AuthPort for HttpVaultClient {
    async fn login(&self, email: &str, password: &str) -> Result<String, VaultError> {
        let req = self
            .client
            .post(self.url("auth/login"))
            .json(&serde_json::json!({ "email": email, "password": password }));
        let body: LoginBody = self.json(req).await?;
        Ok(body.access_token)
    }

    async fn me(&self) -> Result<UserProfile, VaultError> {
        self.json(self.client.get(self.url("auth/me"))).await
    }
}

#[async_trait]
impl ApiKeysPort for HttpVaultClient {
    async fn list_keys(&self) -> Result<Vec<ApiKey>, VaultError> {
        self.json(self.client.get(self.url("apis"))).await
    }

    async fn create_key(&self, name: &str, description: &str) -> Result<ApiKey, VaultError> {
        let req = self
            .client
            .post(self.url("apis"))
            .json(&serde_json::json!({ "name": name, "description": description }));
        self.json(req).await
    }

    async fn delete_key(&self, id: i64) -> Result<(), VaultError> {
        let req = self.client.delete(self.url(&format!("apis/{id}")));
        self.send(req).await.map(|_| ())
    }
}
