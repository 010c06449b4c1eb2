use derive_more::{AsRef, Deref, Display, From, Into};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{Display as StrumDisplay, EnumString};
use thiserror::Error;

pub const SOCKET_PATH: &str = "/tmp/luckysphere.sock";

/// Code handed to the draw service in exchange for a result.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Deref, From, Into, AsRef,
)]
#[serde(transparent)]
pub struct DrawCode(String);

crate::impl_string_newtype!(DrawCode);

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, StrumDisplay)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
enum Keyword {
    Spin,
    Verify,
    Reload,
    Close,
}

/// One line on the control socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    Spin(DrawCode),
    Verify(DrawCode),
    Reload,
    Close,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Empty command line")]
    Empty,
    #[error("Unknown command '{0}'")]
    Unknown(String),
    #[error("'{0}' requires a code")]
    MissingCode(String),
    #[error("'{0}' takes no arguments")]
    UnexpectedArgument(String),
}

impl FromStr for ControlCommand {
    type Err = ProtocolError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (head, rest) = line
            .split_once(char::is_whitespace)
            .map(|(h, r)| (h, r.trim()))
            .unwrap_or((line, ""));

        if head.is_empty() {
            return Err(ProtocolError::Empty);
        }

        let keyword =
            Keyword::from_str(head).map_err(|_| ProtocolError::Unknown(head.to_string()))?;

        match keyword {
            Keyword::Spin | Keyword::Verify => {
                let code = DrawCode::new(rest);
                if code.is_blank() {
                    return Err(ProtocolError::MissingCode(keyword.to_string()));
                }
                Ok(match keyword {
                    Keyword::Verify => ControlCommand::Verify(code),
                    _ => ControlCommand::Spin(code),
                })
            }
            Keyword::Reload | Keyword::Close if !rest.is_empty() => {
                Err(ProtocolError::UnexpectedArgument(keyword.to_string()))
            }
            Keyword::Reload => Ok(ControlCommand::Reload),
            Keyword::Close => Ok(ControlCommand::Close),
        }
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlCommand::Spin(code) => write!(f, "{} {}", Keyword::Spin, code),
            ControlCommand::Verify(code) => write!(f, "{} {}", Keyword::Verify, code),
            ControlCommand::Reload => write!(f, "{}", Keyword::Reload),
            ControlCommand::Close => write!(f, "{}", Keyword::Close),
        }
    }
}
