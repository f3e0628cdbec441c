use tokio::sync::watch;

/// Out-of-band cancellation for a running scrape. The one unbounded wait in
/// the crate (the login suspension) listens on this; everything else is
/// already deadline-bounded.
#[derive(Clone)]
pub struct Supervisor {
    sender: watch::Sender<bool>,
}

#[derive(Clone)]
pub struct Interrupt {
    receiver: watch::Receiver<bool>,
}

impl Supervisor {
    pub fn new() -> (Self, Interrupt) {
        let (sender, receiver) = watch::channel(false);
        (Self { sender }, Interrupt { receiver })
    }

    pub fn subscribe(&self) -> Interrupt {
        Interrupt {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn cancel(&self) {
        let _ = self.sender.send(true);
    }
}

impl Interrupt {
    pub async fn cancelled(&mut self) {
        if *self.receiver.borrow() {
            return;
        }
        let _ = self.receiver.changed().await;
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }
}

pub fn install_signal_handlers(supervisor: Supervisor) {
    let ctrlc = supervisor.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrlc.cancel();
        }
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let term = supervisor;
        tokio::spawn(async move {
            if let Ok(mut sig) = signal(SignalKind::terminate()) {
                sig.recv().await;
                term.cancel();
            }
        });
    }
}
