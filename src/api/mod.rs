pub mod calc;
pub mod cipher;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod packet;
pub mod repl;

use std::fmt;
use std::str::FromStr;

use error::ExchangeError;

/// Two-character command tags understood by the secure-header program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandCode {
    /// `$d`: peer decrypts the (scrambled) data we send.
    Decrypt,
    /// `$e`: peer encrypts the plain data we send.
    Encrypt,
    /// `$r`: peer reflects the data unchanged.
    Reflect,
}

impl CommandCode {
    pub fn as_bytes(self) -> [u8; 2] {
        match self {
            CommandCode::Decrypt => *b"$d",
            CommandCode::Encrypt => *b"$e",
            CommandCode::Reflect => *b"$r",
        }
    }

    pub fn from_bytes(bytes: [u8; 2]) -> Option<CommandCode> {
        match &bytes {
            b"$d" => Some(CommandCode::Decrypt),
            b"$e" => Some(CommandCode::Encrypt),
            b"$r" => Some(CommandCode::Reflect),
            _ => None,
        }
    }
}

impl FromStr for CommandCode {
    type Err = ExchangeError;

    fn from_str(word: &str) -> Result<CommandCode, ExchangeError> {
        match word {
            "$d" => Ok(CommandCode::Decrypt),
            "$e" => Ok(CommandCode::Encrypt),
            "$r" => Ok(CommandCode::Reflect),
            _ => Err(ExchangeError::UnsupportedCommand { command: word.to_string() }),
        }
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.as_bytes();
        write!(f, "{}{}", bytes[0] as char, bytes[1] as char)
    }
}

/// One line of operator input, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Help,
    Quit,
    /// Anything else; handed to the tool.
    Line(String),
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_code_parse() {
        assert_eq!("$d".parse::<CommandCode>().unwrap(), CommandCode::Decrypt);
        assert_eq!("$e".parse::<CommandCode>().unwrap(), CommandCode::Encrypt);
        assert_eq!("$r".parse::<CommandCode>().unwrap(), CommandCode::Reflect);
        assert!(matches!(
            "$z".parse::<CommandCode>(),
            Err(ExchangeError::UnsupportedCommand { .. })
        ));
    }

    #[test]
    fn test_command_code_bytes() {
        for code in [CommandCode::Decrypt, CommandCode::Encrypt, CommandCode::Reflect] {
            assert_eq!(CommandCode::from_bytes(code.as_bytes()), Some(code));
        }
        assert_eq!(CommandCode::from_bytes(*b"$$"), None);
        assert_eq!(CommandCode::Encrypt.to_string(), "$e");
    }
}
