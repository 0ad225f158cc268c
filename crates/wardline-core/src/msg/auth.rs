//! User authentication data and identity.

use std::fmt;

/// How a user proves their identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserAuthenticationScheme {
    /// Email address and password
    EmailPassword,
    /// Previously issued user ID token
    UserIdToken,
    /// Token issued by an external identity provider
    ExternalToken,
}

impl UserAuthenticationScheme {
    /// Canonical scheme name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::EmailPassword => "EMAIL_PASSWORD",
            Self::UserIdToken => "USER_ID_TOKEN",
            Self::ExternalToken => "EXTERNAL_TOKEN",
        }
    }
}

impl fmt::Display for UserAuthenticationScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Concrete authentication data attached to a message.
#[derive(Clone, PartialEq, Eq)]
pub enum UserAuthenticationData {
    /// Email/password credentials
    EmailPassword {
        /// Email address
        email: String,
        /// Password
        password: String,
    },
}

impl UserAuthenticationData {
    /// Scheme this data belongs to.
    pub fn scheme(&self) -> UserAuthenticationScheme {
        match self {
            Self::EmailPassword { .. } => UserAuthenticationScheme::EmailPassword,
        }
    }
}

impl fmt::Debug for UserAuthenticationData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmailPassword { email, .. } => f
                .debug_struct("EmailPassword")
                .field("email", email)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// Why the peer asked for fresh authentication data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReauthCode {
    /// Previous user authentication data was rejected
    UserDataReauth,
    /// A single sign-on token was rejected
    SsoTokenRejected,
}

/// Authenticated remote user.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct User {
    id: String,
}

impl User {
    /// User with identity `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// User identity.
    pub fn id(&self) -> &str {
        &self.id
    }
}
