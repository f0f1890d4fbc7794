use std::future::{ready, Ready};

use actix_web::{
    dev::Payload, error::ErrorUnauthorized, Error, FromRequest, HttpMessage, HttpRequest,
};
use bson::oid::ObjectId;

use crate::middleware::auth::Claims;
use crate::models::user::UserRole;

/// The authenticated caller, extracted from the claims the auth middleware
/// stashed on the request. Handlers take this as a parameter instead of
/// touching the token themselves.
#[derive(Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: String,
    pub role: UserRole,
}

impl AuthenticatedUser {
    /// The caller's id as stored on bookings and payments.
    pub fn object_id(&self) -> Result<ObjectId, Error> {
        ObjectId::parse_str(&self.user_id)
            .map_err(|_| ErrorUnauthorized("Invalid user id in token"))
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(claims) = req.extensions().get::<Claims>() {
            ready(Ok(AuthenticatedUser {
                user_id: claims.user_id.clone(),
                email: claims.sub.clone(),
                role: UserRole::from_claim(claims.role.as_deref()),
            }))
        } else {
            ready(Err(ErrorUnauthorized("User not authenticated")))
        }
    }
}
