use std::env;
use std::os::unix::net::UnixDatagram;

use eyre::{Result, eyre};

pub fn notify_ready() -> Result<()> {
    sd_notify("READY=1")
}

pub fn notify_stopping() -> Result<()> {
    sd_notify("STOPPING=1")
}

fn sd_notify(state: &str) -> Result<()> {
    let socket_path = env::var_os("NOTIFY_SOCKET")
        .filter(|path| !path.is_empty())
        .ok_or_else(|| eyre!("no sd_notify socket"))?;

    let socket = UnixDatagram::unbound()?;
    socket.send_to(state.as_bytes(), socket_path)?;
    Ok(())
}
