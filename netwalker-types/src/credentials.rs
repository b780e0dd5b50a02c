/// Plain data carried from whichever loader (CLI args, environment, TTY
/// prompt, or encoded file) a caller chooses to use. Loading itself is out
/// of scope for the core (spec §1); this is the shape every crate that
/// needs to authenticate a session agrees on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub enable_password: Option<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            enable_password: None,
        }
    }

    pub fn with_enable_password(mut self, enable_password: impl Into<String>) -> Self {
        self.enable_password = Some(enable_password.into());
        self
    }
}
