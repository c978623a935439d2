use crate::error::Error;
use crate::ApiClient;
use getset::Getters;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, RwLock};
use surf::middleware::{Middleware, Next};
use surf::{Client, Request, Response};

/// Staff login payload.
#[derive(Clone, Debug, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// An authenticated staff member, as returned by the backend.
#[derive(Clone, Debug, Deserialize, Serialize, Getters)]
#[get = "pub"]
pub struct StaffUser {
    id: u64,
    email: String,
    name: String,
    role: String,
}

/// Successful login response.
#[derive(Clone, Debug, Deserialize, Getters)]
#[get = "pub"]
pub struct Session {
    token: String,
    user: StaffUser,
}

/// Session token shared between the client and the transport middleware.
#[derive(Clone, Debug, Default)]
pub struct AuthState {
    token: Arc<RwLock<Option<String>>>,
}

impl AuthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Option<String> {
        match self.token.read() {
            Ok(token) => token.clone(),
            Err(_) => None,
        }
    }

    pub fn set_token(&self, token: Option<String>) {
        if let Ok(mut slot) = self.token.write() {
            *slot = token;
        }
    }
}

/// Attaches the current session token to every outgoing request.
pub(crate) struct AuthMiddleware {
    state: AuthState,
}

impl AuthMiddleware {
    pub(crate) fn new(state: AuthState) -> Self {
        Self { state }
    }
}

#[surf::utils::async_trait]
impl Middleware for AuthMiddleware {
    async fn handle(
        &self,
        mut req: Request,
        client: Client,
        next: Next<'_>,
    ) -> surf::Result<Response> {
        if let Some(token) = self.state.token() {
            req.set_header("Authorization", format!("Bearer {token}").as_str());
        }
        next.run(req, client).await
    }
}

impl ApiClient {
    /// Sign in and keep the returned token for subsequent requests.
    pub async fn login(&self, credentials: &Credentials) -> Result<Option<Session>, Error> {
        let body =
            serde_json::to_value(credentials).map_err(|err| Error::Decode(err.to_string()))?;
        let session: Option<Session> = self.post("auth/login", body).await?;

        if let Some(session) = &session {
            self.auth().set_token(Some(session.token().clone()));
            log::info!("signed in as {}", session.user().email());
        }
        Ok(session)
    }

    /// Tell the backend the session is over and forget the token either way.
    pub async fn logout(&self) -> Result<(), Error> {
        let result = self.post::<Value>("auth/logout", Value::Null).await;
        self.auth().set_token(None);
        log::info!("signed out");
        result.map(|_| ())
    }

    /// Fetch the profile of the currently authenticated staff member.
    pub async fn current_user(&self) -> Result<Option<StaffUser>, Error> {
        self.get("auth/me").await
    }
}
