/// Supplies the active wallet address, if any.
pub trait IdentityProvider: Send + Sync {
    fn current_identity(&self) -> Option<String>;

    fn is_connected(&self) -> bool {
        self.current_identity().is_some()
    }
}

/// A wallet connection held for the lifetime of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletSession {
    address: Option<String>,
}

impl WalletSession {
    pub fn connected(address: impl Into<String>) -> Self {
        let mut session = Self::default();
        session.connect(address);
        session
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    /// A blank address leaves the session disconnected.
    pub fn connect(&mut self, address: impl Into<String>) {
        let address = address.into().trim().to_string();
        self.address = (!address.is_empty()).then_some(address);
    }

    pub fn disconnect(&mut self) {
        self.address = None;
    }
}

impl From<Option<String>> for WalletSession {
    fn from(address: Option<String>) -> Self {
        address.map_or_else(Self::disconnected, |address| Self::connected(address))
    }
}

impl IdentityProvider for WalletSession {
    fn current_identity(&self) -> Option<String> {
        self.address.clone()
    }
}
