use coursegate_core::UserId;

/// Who is making the request.
///
/// Anonymous requests carry no user; the access rules decide what that means.
/// A `trusted` caller presented the configured service token.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Viewer {
    user_id: Option<UserId>,
    trusted: bool,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            trusted: false,
        }
    }

    pub fn trusted(mut self) -> Self {
        self.trusted = true;
        self
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    pub fn is_trusted(&self) -> bool {
        self.trusted
    }

    /// The viewer is `user_id` themself, or a trusted caller acting for them.
    pub fn may_act_for(&self, user_id: UserId) -> bool {
        self.trusted || self.user_id == Some(user_id)
    }
}
