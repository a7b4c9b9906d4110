//! Byte-at-a-time tokenizer for settings message bodies.
//!
//! Every field closes on `|`.  The lexer only knows token shapes; which
//! token is legal where is the engine's concern.
//!
//! ```text
//!  Settings body:  L|0|23|M|18|31|...;   →  Letter Int Int Letter Int Int ... Terminator
//!  Pin body:       D10~|4|A0|0|;         →  Pin Int Pin Int Terminator
//! ```
//!
//! Tokens spanning several `push` calls are held in the lexer state, so a
//! field may be split across polls.

use crate::error::ProtocolError;
use crate::pins::{PinBank, PinName};

/// Longest accepted numeric field.
pub const MAX_FIELD_DIGITS: u8 = 10;

/// Which body grammar the lexer is reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// `S` messages: letters and integers.
    Settings,
    /// `P` messages: pin names and integers.
    Pins,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// A field letter (`L`, `M`, `H`, `P`).
    Letter(u8),
    /// A decimal field.  `digits` keeps leading zeros visible.
    Int { value: u32, digits: u8 },
    Pin(PinName),
    /// `;`
    Terminator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Letter(u8),
    Int { value: u32, digits: u8 },
    PinBank(PinBank),
    PinNumber { bank: PinBank, value: u32, digits: u8 },
    PinMarked { bank: PinBank, number: u32 },
}

#[derive(Debug, Clone)]
pub struct Lexer {
    mode: Mode,
    state: State,
}

impl Lexer {
    pub const fn new(mode: Mode) -> Self {
        Self {
            mode,
            state: State::Idle,
        }
    }

    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// No partial token held.
    pub fn is_idle(&self) -> bool {
        self.state == State::Idle
    }

    pub fn reset(&mut self) {
        self.state = State::Idle;
    }

    /// Feed one byte.  Returns a token when `byte` completes one.  On error
    /// the lexer is back in its idle state.
    pub fn push(&mut self, byte: u8) -> Result<Option<Token>, ProtocolError> {
        let result = self.step(byte);
        if result.is_err() {
            self.state = State::Idle;
        }
        result
    }

    fn step(&mut self, byte: u8) -> Result<Option<Token>, ProtocolError> {
        match self.state {
            State::Idle => self.start(byte),

            State::Letter(letter) => {
                self.expect_separator(byte)?;
                Ok(Some(Token::Letter(letter)))
            }

            State::Int { value, digits } => {
                if byte == b'|' {
                    self.state = State::Idle;
                    return Ok(Some(Token::Int { value, digits }));
                }
                let (value, digits) = accumulate(value, digits, byte)?;
                self.state = State::Int { value, digits };
                Ok(None)
            }

            State::PinBank(bank) => {
                let (value, digits) = accumulate(0, 0, byte)?;
                self.state = State::PinNumber { bank, value, digits };
                Ok(None)
            }

            State::PinNumber { bank, value, digits } => match byte {
                b'|' => {
                    self.state = State::Idle;
                    Ok(Some(Token::Pin(PinName {
                        bank,
                        number: value,
                        pwm_marker: false,
                    })))
                }
                b'~' if bank == PinBank::Digital => {
                    self.state = State::PinMarked { bank, number: value };
                    Ok(None)
                }
                _ => {
                    let (value, digits) = accumulate(value, digits, byte)?;
                    self.state = State::PinNumber { bank, value, digits };
                    Ok(None)
                }
            },

            State::PinMarked { bank, number } => {
                self.expect_separator(byte)?;
                Ok(Some(Token::Pin(PinName {
                    bank,
                    number,
                    pwm_marker: true,
                })))
            }
        }
    }

    fn start(&mut self, byte: u8) -> Result<Option<Token>, ProtocolError> {
        match (self.mode, byte) {
            (_, b';') => return Ok(Some(Token::Terminator)),
            (_, b' ' | b'\t' | b'\r' | b'\n') => {}
            (_, b'0'..=b'9') => {
                self.state = State::Int {
                    value: u32::from(byte - b'0'),
                    digits: 1,
                };
            }
            (Mode::Settings, b'A'..=b'Z') => self.state = State::Letter(byte),
            (Mode::Pins, b'A') => self.state = State::PinBank(PinBank::Analog),
            (Mode::Pins, b'D') => self.state = State::PinBank(PinBank::Digital),
            _ => return Err(ProtocolError::UnexpectedByte(byte)),
        }
        Ok(None)
    }

    fn expect_separator(&mut self, byte: u8) -> Result<(), ProtocolError> {
        if byte != b'|' {
            return Err(ProtocolError::UnexpectedByte(byte));
        }
        self.state = State::Idle;
        Ok(())
    }
}

/// Append a decimal digit, bounded to [`MAX_FIELD_DIGITS`] and `u32`.
fn accumulate(value: u32, digits: u8, byte: u8) -> Result<(u32, u8), ProtocolError> {
    if !byte.is_ascii_digit() {
        return Err(ProtocolError::UnexpectedByte(byte));
    }
    if digits >= MAX_FIELD_DIGITS {
        return Err(ProtocolError::FieldTooLong);
    }
    let value = value
        .checked_mul(10)
        .and_then(|v| v.checked_add(u32::from(byte - b'0')))
        .ok_or(ProtocolError::Overflow)?;
    Ok((value, digits + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(mode: Mode, input: &[u8]) -> Result<Vec<Token>, ProtocolError> {
        let mut lexer = Lexer::new(mode);
        let mut out = Vec::new();
        for &b in input {
            if let Some(tok) = lexer.push(b)? {
                out.push(tok);
            }
        }
        Ok(out)
    }

    #[test]
    fn settings_field_tokens() {
        let toks = lex(Mode::Settings, b"L|0|23|;").unwrap();
        assert_eq!(
            toks,
            vec![
                Token::Letter(b'L'),
                Token::Int { value: 0, digits: 1 },
                Token::Int { value: 23, digits: 2 },
                Token::Terminator,
            ]
        );
    }

    #[test]
    fn leading_zeros_are_counted() {
        let toks = lex(Mode::Settings, b"01|").unwrap();
        assert_eq!(toks, vec![Token::Int { value: 1, digits: 2 }]);
    }

    #[test]
    fn whitespace_between_fields_is_skipped() {
        let toks = lex(Mode::Settings, b" L|\r\n1|").unwrap();
        assert_eq!(toks.len(), 2);
    }

    #[test]
    fn pin_names_with_and_without_marker() {
        let toks = lex(Mode::Pins, b"D10~|4|A0|").unwrap();
        assert_eq!(
            toks[0],
            Token::Pin(PinName {
                bank: PinBank::Digital,
                number: 10,
                pwm_marker: true
            })
        );
        assert_eq!(toks[1], Token::Int { value: 4, digits: 1 });
        assert_eq!(
            toks[2],
            Token::Pin(PinName {
                bank: PinBank::Analog,
                number: 0,
                pwm_marker: false
            })
        );
    }

    #[test]
    fn marker_only_allowed_on_digital_pins() {
        assert_eq!(
            lex(Mode::Pins, b"A1~|"),
            Err(ProtocolError::UnexpectedByte(b'~'))
        );
    }

    #[test]
    fn field_letters_are_rejected_in_pin_mode() {
        assert_eq!(lex(Mode::Pins, b"L|"), Err(ProtocolError::UnexpectedByte(b'L')));
    }

    #[test]
    fn field_width_is_bounded() {
        assert!(lex(Mode::Settings, b"4294967295|").is_ok());
        assert_eq!(
            lex(Mode::Settings, b"4294967296|"),
            Err(ProtocolError::Overflow)
        );
        assert_eq!(
            lex(Mode::Settings, b"00000000001|"),
            Err(ProtocolError::FieldTooLong)
        );
    }

    #[test]
    fn letter_must_be_followed_by_separator() {
        assert_eq!(lex(Mode::Settings, b"LM"), Err(ProtocolError::UnexpectedByte(b'M')));
    }

    #[test]
    fn error_returns_lexer_to_idle() {
        let mut lexer = Lexer::new(Mode::Settings);
        lexer.push(b'1').unwrap();
        assert!(lexer.push(b'x').is_err());
        assert!(lexer.is_idle());
        assert_eq!(lexer.push(b';'), Ok(Some(Token::Terminator)));
    }

    #[test]
    fn tokens_survive_split_delivery() {
        let mut lexer = Lexer::new(Mode::Settings);
        assert_eq!(lexer.push(b'2'), Ok(None));
        assert_eq!(lexer.push(b'5'), Ok(None));
        assert_eq!(lexer.push(b'|'), Ok(Some(Token::Int { value: 25, digits: 2 })));
    }
}
