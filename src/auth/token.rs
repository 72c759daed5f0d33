//! Defines the token struct used in the auth cookie and how to
//! serialize/deserialize a token.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::user::UserId;

/// A token for authorization and authentication.
///
/// The expiry is stored as a unix timestamp so the serialized form is
/// compact and unambiguous.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Token {
    /// The ID of the authenticated user.
    pub user_id: UserId,

    /// When the token stops being valid.
    #[serde(with = "time::serde::timestamp")]
    pub expires_at: OffsetDateTime,
}

impl Token {
    /// Whether the token has expired as of `now`.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}
