use payvault_core::UserId;

/// Acting user for a request (authenticated identity from the token).
///
/// This is immutable and must be present for all wallet routes. Handlers
/// never take a user id from the request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    user_id: UserId,
    name: String,
    email: String,
}

impl ActorContext {
    pub fn new(user_id: UserId, name: String, email: String) -> Self {
        Self {
            user_id,
            name,
            email,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}
