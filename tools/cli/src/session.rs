use std::sync::{Arc, RwLock};

use log::info;
use tokio::sync::broadcast;

use crate::config::{self, Config};
use crate::error::ClientError;
use crate::gateway::{HttpGateway, Signer};

#[derive(Debug, Clone)]
pub enum SessionEvent {
    AccountChanged(Option<String>),
    NetworkChanged(String),
}

/// Process-wide wallet session, created once and injected wherever a gateway
/// handle is needed. On account or network change the handle is re-created
/// wholesale, never patched in place, and subscribers are notified.
#[derive(Debug)]
pub struct Session {
    inner: RwLock<Inner>,
    events: broadcast::Sender<SessionEvent>,
}

#[derive(Debug)]
struct Inner {
    account: Option<String>,
    secret_key: Option<String>,
    network: String,
    rpc_url: String,
    contract: String,
    gateway: Arc<HttpGateway>,
}

impl Inner {
    fn rebuild_gateway(&mut self) {
        let signer = match (&self.account, &self.secret_key) {
            (Some(address), Some(secret_key)) => Some(Signer {
                address: address.clone(),
                secret_key: secret_key.clone(),
            }),
            _ => None,
        };
        self.gateway = Arc::new(HttpGateway::new(&self.rpc_url, &self.contract, signer));
    }
}

impl Session {
    pub fn connect(config: &Config) -> Result<Self, ClientError> {
        let contract = config.contract.address.clone().ok_or_else(|| {
            ClientError::Connectivity(
                "No contract address configured. Set contract.address in the config file"
                    .to_string(),
            )
        })?;

        let account = config::account(config);
        let secret_key = config::secret_key(config);
        let signer = match (&account, &secret_key) {
            (Some(address), Some(key)) => Some(Signer {
                address: address.clone(),
                secret_key: key.clone(),
            }),
            _ => None,
        };
        let inner = Inner {
            gateway: Arc::new(HttpGateway::new(&config.network.rpc_url, &contract, signer)),
            account,
            secret_key,
            network: config.network.name.clone(),
            rpc_url: config.network.rpc_url.clone(),
            contract,
        };
        info!(
            "session connected to {} ({})",
            inner.network, inner.rpc_url
        );

        let (events, _) = broadcast::channel(16);
        Ok(Self {
            inner: RwLock::new(inner),
            events,
        })
    }

    pub fn gateway(&self) -> Arc<HttpGateway> {
        self.inner.read().unwrap().gateway.clone()
    }

    pub fn account(&self) -> Option<String> {
        self.inner.read().unwrap().account.clone()
    }

    pub fn network(&self) -> String {
        self.inner.read().unwrap().network.clone()
    }

    pub fn require_account(&self) -> Result<String, ClientError> {
        self.account().ok_or_else(|| {
            ClientError::Connectivity(
                "No account connected. Set MEDISURE_ACCOUNT or auth.address in the config file"
                    .to_string(),
            )
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn set_account(&self, account: Option<String>) {
        {
            let mut inner = self.inner.write().unwrap();
            if inner.account == account {
                return;
            }
            inner.account = account.clone();
            inner.rebuild_gateway();
        }
        let _ = self.events.send(SessionEvent::AccountChanged(account));
    }

    pub fn switch_network(&self, name: &str, rpc_url: &str) {
        {
            let mut inner = self.inner.write().unwrap();
            inner.network = name.to_string();
            inner.rpc_url = rpc_url.to_string();
            inner.rebuild_gateway();
        }
        info!("switched network to {}", name);
        let _ = self.events.send(SessionEvent::NetworkChanged(name.to_string()));
    }
}
