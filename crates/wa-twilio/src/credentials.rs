use wa_core::GatewayError;

pub const ACCOUNT_SID_VAR: &str = "TWILIO_ACCOUNT_SID";
pub const AUTH_TOKEN_VAR: &str = "TWILIO_AUTH_TOKEN";
pub const FROM_ADDRESS_VAR: &str = "TWILIO_WHATSAPP_FROM";

/// Twilio's shared WhatsApp sandbox sender.
pub const SANDBOX_FROM_ADDRESS: &str = "whatsapp:+14155238886";

/// Account credentials and sender address, immutable once loaded.
#[derive(Clone)]
pub struct TwilioCredentials {
    account_sid: String,
    auth_token: String,
    from_address: String,
}

impl std::fmt::Debug for TwilioCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioCredentials")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<redacted>")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl TwilioCredentials {
    pub fn new<S: Into<String>>(
        account_sid: S,
        auth_token: S,
        from_address: S,
    ) -> Result<Self, GatewayError> {
        let creds = Self {
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from_address: from_address.into(),
        };
        if creds.account_sid.is_empty() || creds.auth_token.is_empty() {
            return Err(GatewayError::Configuration(
                "Twilio account sid and auth token are required".into(),
            ));
        }
        Ok(creds)
    }

    /// Load from `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN` and `TWILIO_WHATSAPP_FROM`.
    pub fn from_env() -> Result<Self, GatewayError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads through `lookup`, so callers
    /// can supply their own variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GatewayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let account_sid = lookup(ACCOUNT_SID_VAR).unwrap_or_default();
        let auth_token = lookup(AUTH_TOKEN_VAR).unwrap_or_default();
        let from_address =
            lookup(FROM_ADDRESS_VAR).unwrap_or_else(|| SANDBOX_FROM_ADDRESS.to_string());
        Self::new(account_sid, auth_token, from_address)
    }

    pub fn account_sid(&self) -> &str {
        &self.account_sid
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    pub fn from_address(&self) -> &str {
        &self.from_address
    }

    /// Replace the sender address, e.g. with a configured production number.
    pub fn with_from_address(mut self, from_address: impl Into<String>) -> Self {
        self.from_address = from_address.into();
        self
    }
}
