//! Auth backend: session restore, login and logout.
//! The gateway calls run off the UI thread; results sent via mpsc.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use tokio::runtime::Handle;
use wxdash_auth::{AuthGateway, GatewayError};

/// Messages sent from async operations back to the UI thread
#[derive(Debug)]
pub enum AuthServiceMessage {
    /// Persisted session restored; carries the signed-in flag
    InitializeDone(Result<bool, GatewayError>),
    LoginDone(Result<bool, GatewayError>),
    LogoutDone(Result<(), GatewayError>),
}

pub fn request_initialize<G: AuthGateway>(
    tx: &Sender<AuthServiceMessage>,
    runtime: &Handle,
    gateway: Arc<G>,
) {
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = gateway.initialize().await;
        let _ = tx.send(AuthServiceMessage::InitializeDone(result));
    });
}

/// Start the interactive login. Sends `LoginDone` when the flow ends.
pub fn request_login<G: AuthGateway>(
    tx: &Sender<AuthServiceMessage>,
    runtime: &Handle,
    gateway: Arc<G>,
) {
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = gateway.login().await;
        let _ = tx.send(AuthServiceMessage::LoginDone(result));
    });
}

pub fn request_logout<G: AuthGateway>(
    tx: &Sender<AuthServiceMessage>,
    runtime: &Handle,
    gateway: Arc<G>,
) {
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = gateway.logout().await;
        let _ = tx.send(AuthServiceMessage::LogoutDone(result));
    });
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use std::sync::mpsc;
    use std::time::Duration;

    use super::*;
    use wxdash_auth::StaticTokenGateway;

    #[test]
    fn login_and_logout_report_back() {
        let runtime = crate::bridge::init_runtime().unwrap();
        let gateway = Arc::new(StaticTokenGateway::signed_out("abc"));
        let (tx, rx) = mpsc::channel();

        request_initialize(&tx, &runtime, gateway.clone());
        let msg = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(msg, AuthServiceMessage::InitializeDone(Ok(false))));

        request_login(&tx, &runtime, gateway.clone());
        let msg = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(msg, AuthServiceMessage::LoginDone(Ok(true))));
        assert!(gateway.is_authenticated());

        request_logout(&tx, &runtime, gateway.clone());
        let msg = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(msg, AuthServiceMessage::LogoutDone(Ok(()))));
        assert!(!gateway.is_authenticated());
    }
}
