//! Caller identity.
//!
//! Authentication is done by an upstream proxy, which passes the authenticated user to the server in two headers:
//! * `X-User-Id`: the user's id. Required on every protected route.
//! * `X-User-Roles`: a comma-separated list of roles (`user`, `admin`). Optional; a caller without it is a plain user.
//!
//! Handlers take an [`Identity`] argument to require a caller. Routes that need a particular role are additionally
//! wrapped in the [`crate::middleware::AclMiddlewareFactory`].
use std::{fmt::Display, str::FromStr};

use actix_web::{dev::Payload, http::header::HeaderMap, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use log::*;
use serde::{Deserialize, Serialize};
use shop_payment_engine::order_objects::Caller;

use crate::errors::ServerError;

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_ROLES_HEADER: &str = "X-User-Roles";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub roles: Vec<Role>,
}

impl Identity {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ServerError> {
        let user_id = headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ServerError::Unauthenticated)?
            .to_string();
        let mut roles = headers
            .get(USER_ROLES_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| {
                s.split(',')
                    .filter(|r| !r.trim().is_empty())
                    .filter_map(|r| r.parse::<Role>().map_err(|e| debug!("💻️ Ignoring role for {user_id}. {e}")).ok())
                    .collect::<Vec<Role>>()
            })
            .unwrap_or_default();
        if !roles.contains(&Role::User) {
            roles.push(Role::User);
        }
        Ok(Self { user_id, roles })
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// The identity in the form the order ledger understands.
    pub fn caller(&self) -> Caller {
        if self.is_admin() {
            Caller::admin(self.user_id.as_str())
        } else {
            Caller::user(self.user_id.as_str())
        }
    }
}

impl FromRequest for Identity {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = Identity::from_headers(req.headers());
        if let Err(e) = &result {
            debug!("💻️ Rejecting request to {}. {e}", req.path());
        }
        ready(result)
    }
}
