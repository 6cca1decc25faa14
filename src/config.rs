//! Command-line configuration of the binary.

use crate::errors::StartupError;
use std::{
    ffi::OsString,
    net::{Ipv4Addr, SocketAddr},
    path::PathBuf,
};

pub const DEFAULT_PORT: u16 = 80;

/// `vocab_web <vocab-path> [<port-num>] [<log-dir>]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub vocab_path: PathBuf,
    pub port: u16,
    /// Logs go to stderr when unset.
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Parses the full argument list, program name first.
    /// Arguments after the log directory are ignored.
    pub fn from_args<I>(args: I) -> Result<Self, StartupError>
    where
        I: IntoIterator<Item = OsString>,
    {
        let mut args = args.into_iter();
        let program = args
            .next()
            .map_or_else(|| "vocab_web".to_string(), |arg| arg.to_string_lossy().into_owned());

        let vocab_path = args
            .next()
            .map(PathBuf::from)
            .ok_or(StartupError::Usage { program })?;

        let port = match args.next() {
            Some(arg) => {
                let arg = arg.to_string_lossy();
                arg.parse::<u16>()
                    .map_err(|_| StartupError::InvalidPort(arg.into_owned()))?
            }
            None => DEFAULT_PORT,
        };

        Ok(Self {
            vocab_path,
            port,
            log_dir: args.next().map(PathBuf::from),
        })
    }

    /// All IPv4 interfaces on the configured port.
    #[inline]
    pub fn addr(&self) -> SocketAddr {
        (Ipv4Addr::UNSPECIFIED, self.port).into()
    }
}
