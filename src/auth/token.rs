//! The contents of the auth cookie.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::user::UserID;

mod expiry_format {
    //! Serializes [time::OffsetDateTime] with two digit hours.
    //!
    //! The default format writes midnight as "0:00:00.0", which the default
    //! parser then rejects.
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{
        OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
    };

    /// e.g. "2024-03-01 00:00:00.0 +00:00:00".
    const EXPIRY_FORMAT: &[BorrowedFormatItem] = format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond] [offset_hour \
             sign:mandatory]:[offset_minute]:[offset_second]"
    );

    pub fn serialize<S>(expiry: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = expiry
            .format(EXPIRY_FORMAT)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        OffsetDateTime::parse(&text, EXPIRY_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Identifies the logged in user until `expires_at`.
///
/// The token is stored as JSON in a private (encrypted) cookie, so the client
/// can neither read nor forge it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Token {
    pub user_id: UserID,

    #[serde(with = "expiry_format")]
    pub expires_at: OffsetDateTime,
}

impl Token {
    /// Whether the token is no longer valid at `now`.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod token_tests {
    use time::{Duration, UtcOffset, macros::datetime};

    use crate::{auth::token::Token, user::UserID};

    #[test]
    fn token_survives_json_at_midnight() {
        let token = Token {
            user_id: UserID::new(7),
            expires_at: datetime!(2024-03-01 00:00:00).assume_offset(UtcOffset::UTC),
        };

        let json = serde_json::to_string(&token).unwrap();
        let parsed: Token = serde_json::from_str(&json).unwrap();

        assert_eq!(
            json,
            r#"{"user_id":7,"expires_at":"2024-03-01 00:00:00.0 +00:00:00"}"#
        );
        assert_eq!(parsed, token);
    }

    #[test]
    fn token_expires_at_its_expiry_time() {
        let expires_at = datetime!(2024-03-01 12:00:00).assume_offset(UtcOffset::UTC);
        let token = Token {
            user_id: UserID::new(1),
            expires_at,
        };

        assert!(!token.is_expired(expires_at - Duration::seconds(1)));
        assert!(token.is_expired(expires_at));
    }
}
