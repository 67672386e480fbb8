use std::fmt::{self, Debug, Formatter};
use std::ops::Deref;
use std::sync::Arc;

use tokio::sync::watch;

/// A one-way cancellation flag shared between tasks.
///
/// Cloning produces another handle to the same flag. Once cancelled, a token
/// stays cancelled forever; it can be polled synchronously or awaited.
pub struct Token {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Token {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx: Arc::new(tx), rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    /// Resolves when the token is cancelled. Resolves immediately if it
    /// already was.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    pub fn guard(&self) -> Guard {
        Guard::new(self.clone())
    }
}

impl Clone for Token {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
            rx: self.rx.clone(),
        }
    }
}

impl Default for Token {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Token {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Token")
            .field("is_cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Cancels its token when dropped.
///
/// Holding a `Guard` ties the lifetime of a spawned task to the lifetime of
/// the value that owns the guard.
pub struct Guard {
    token: Token,
}

impl Guard {
    pub fn new(token: Token) -> Self {
        Self { token }
    }
}

impl Deref for Guard {
    type Target = Token;

    fn deref(&self) -> &Token {
        &self.token
    }
}

impl Drop for Guard {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
