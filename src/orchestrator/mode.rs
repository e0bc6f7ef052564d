use std::fmt;

use crate::{Error, Result};

/// What the container runs once the daemon answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// REST wrapper in front of the daemon.
    Api,
    /// Nothing but the daemon.
    DaemonOnly,
    /// Interactive shell.
    Shell,
    /// `script <cmd> [args...]`: run the command after `script`.
    Script(Vec<String>),
    /// Any other argv, run as given.
    Custom(Vec<String>),
}

impl Mode {
    /// Pick the mode from the entrypoint's positional arguments.
    pub fn from_args(args: &[String]) -> Result<Self> {
        let Some((selector, rest)) = args.split_first() else {
            return Ok(Mode::Api);
        };

        match selector.as_str() {
            "api" => Ok(Mode::Api),
            "daemon-only" | "daemon" | "ollama" | "serve" => Ok(Mode::DaemonOnly),
            "shell" | "bash" => Ok(Mode::Shell),
            "script" if rest.is_empty() => Err(Error::InvalidMode(
                "`script` needs a command to run".into(),
            )),
            "script" => Ok(Mode::Script(rest.to_vec())),
            "" => Err(Error::InvalidMode("empty mode selector".into())),
            _ => Ok(Mode::Custom(args.to_vec())),
        }
    }

    /// Every mode but daemon-only provisions the default model first.
    pub fn provisions_model(&self) -> bool {
        !matches!(self, Mode::DaemonOnly)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Api => f.write_str("api"),
            Mode::DaemonOnly => f.write_str("daemon-only"),
            Mode::Shell => f.write_str("shell"),
            Mode::Script(argv) => write!(f, "script {}", argv.join(" ")),
            Mode::Custom(argv) => write!(f, "custom {}", argv.join(" ")),
        }
    }
}
