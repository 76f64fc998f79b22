use log::info;
use std::future::Future;
use std::io;

/// Registers the stop-signal handlers and returns a future that completes on
/// the first delivered signal.
///
/// Handlers are installed before this returns, so a signal that arrives before
/// the future is first polled is not lost: it completes the future instead of
/// killing the process.
#[cfg(unix)]
pub fn install() -> io::Result<impl Future<Output = ()> + Send + 'static> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => info!("Received SIGINT"),
            _ = terminate.recv() => info!("Received SIGTERM"),
        }
    })
}

#[cfg(windows)]
pub fn install() -> io::Result<impl Future<Output = ()> + Send + 'static> {
    let mut ctrl_c = tokio::signal::windows::ctrl_c()?;
    Ok(async move {
        ctrl_c.recv().await;
        info!("Received Ctrl+C");
    })
}
