use std::fmt;

use tracing::{debug, warn};

use super::cipher::{descramble, scramble};
use super::config::{ExchangeConfig, ProtocolConfig};
use super::error::ExchangeError;
use super::packet::{Frame, HeaderRecord, SecureCodec};
use super::CommandCode;
use crate::link::exchange::ExchangeDriver;
use crate::link::FrameLink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Idle,
    AwaitingResponse,
}

/// A request that passed validation and is ready to go on the wire.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub command: CommandCode,
    /// The message as laid into the data field, before any scrambling.
    pub message: Vec<u8>,
    pub record: HeaderRecord,
    pub frame: Frame,
}

/// What the peer's reply meant, keyed on the command code it echoed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Encrypted { sent: Vec<u8>, cipher: Vec<u8>, plain: Vec<u8> },
    Decrypted { cipher: Vec<u8>, data: Vec<u8> },
    Reflected { data: Vec<u8> },
    Unexpected { cmd: [u8; 2], data: Vec<u8> },
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim_end().to_string()
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Encrypted { sent, cipher, plain } => {
                writeln!(f, "We sent {:?} which encrypts to 0x{}", text(sent), hex::encode(cipher))?;
                writeln!(f)?;
                write!(f, "0x{} decrypts to {:?}...", hex::encode(cipher), text(plain))
            }
            Outcome::Decrypted { cipher, data } => {
                write!(f, "0x{} decrypts to {:?}", hex::encode(cipher), text(data))
            }
            Outcome::Reflected { data } => write!(f, "Reflected back is {:?}", text(data)),
            Outcome::Unexpected { cmd, data } => write!(
                f,
                "Unexpected reply command {:?}: {:?}",
                String::from_utf8_lossy(cmd),
                text(data)
            ),
        }
    }
}

/// Turns operator commands into one exchange each and interprets the reply.
pub struct Dispatcher<L> {
    codec: SecureCodec,
    driver: ExchangeDriver<L>,
    exchange: ExchangeConfig,
    state: DispatcherState,
}

impl<L: FrameLink> Dispatcher<L> {
    pub fn new(config: ProtocolConfig, exchange: ExchangeConfig, driver: ExchangeDriver<L>) -> Self {
        Dispatcher {
            codec: SecureCodec::new(config),
            driver,
            exchange,
            state: DispatcherState::Idle,
        }
    }

    pub fn state(&self) -> DispatcherState {
        self.state
    }

    pub fn codec(&self) -> &SecureCodec {
        &self.codec
    }

    pub fn driver(&self) -> &ExchangeDriver<L> {
        &self.driver
    }

    /// Splits `<cmd> <message>` and validates it. Nothing is sent.
    pub fn prepare_line(&self, line: &str) -> Result<Prepared, ExchangeError> {
        let (word, message) = match line.split_once(' ') {
            Some((word, message)) => (word, Some(message)),
            None => (line, None),
        };
        let command: CommandCode = word.parse()?;
        let message = message.ok_or_else(|| ExchangeError::MissingMessage {
            command: command.to_string(),
        })?;
        Ok(self.prepare(command, message.as_bytes()))
    }

    /// `$d` data is scrambled with the decrypt-direction key; `$e` and `$r` go out as-is.
    pub fn prepare(&self, command: CommandCode, message: &[u8]) -> Prepared {
        let message = self.codec.fit_data(message);
        let data = match command {
            CommandCode::Decrypt => scramble(&message, &self.codec.config().keys.decrypt),
            CommandCode::Encrypt | CommandCode::Reflect => message.clone(),
        };
        Prepared {
            command,
            record: self.codec.record(command, &data),
            frame: self.codec.encode(command, &data),
            message,
        }
    }

    /// Sends a prepared request and waits for the reply. Always ends back in `Idle`.
    pub fn exchange(&mut self, prepared: &Prepared) -> Result<Outcome, ExchangeError> {
        self.state = DispatcherState::AwaitingResponse;
        debug!(command = %prepared.command, "awaiting response");
        let result = self.driver.send_and_await(&prepared.frame, self.exchange.timeout);
        self.state = DispatcherState::Idle;

        let reply = result?;
        let record = self.codec.decode_frame(&reply).map_err(|err| {
            warn!(%err, "reply without a valid secure header");
            err
        })?;
        Ok(self.interpret(&prepared.message, record))
    }

    pub fn dispatch(&mut self, line: &str) -> Result<Outcome, ExchangeError> {
        let prepared = self.prepare_line(line)?;
        self.exchange(&prepared)
    }

    fn interpret(&self, sent: &[u8], reply: HeaderRecord) -> Outcome {
        match reply.command() {
            Some(CommandCode::Encrypt) => Outcome::Encrypted {
                sent: sent.to_vec(),
                plain: descramble(&reply.data, &self.codec.config().keys.encrypt),
                cipher: reply.data,
            },
            Some(CommandCode::Decrypt) => Outcome::Decrypted {
                cipher: scramble(sent, &self.codec.config().keys.decrypt),
                data: reply.data,
            },
            Some(CommandCode::Reflect) => Outcome::Reflected { data: reply.data },
            None => Outcome::Unexpected {
                cmd: reply.cmd,
                data: reply.data,
            },
        }
    }
}
