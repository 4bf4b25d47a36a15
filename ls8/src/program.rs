// Copyright (C) 2024 Ethan Uppal and Utku Melemetci. All rights reserved.

use std::{fmt, fs, path::Path};

use crate::{
    arch::{Address, Word, MEMORY_SIZE},
    error::LoadError,
    op::Op,
};

/// Width of one byte in the text image format.
const BINARY_DIGITS: usize = 8;

/// A memory image, ready to be copied to address zero.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    image: Vec<Word>,
}

impl Program {
    pub fn from_image(image: Vec<Word>) -> Result<Self, LoadError> {
        if image.len() > MEMORY_SIZE {
            return Err(LoadError::TooLarge { size: image.len() });
        }
        Ok(Self { image })
    }

    /// Parses the text image format: every line starting with `0` or `1`
    /// holds one byte as eight binary digits, most significant first.
    /// Anything after the eighth digit is ignored, as is every other line.
    pub fn parse(source: &str) -> Result<Self, LoadError> {
        let image = source
            .lines()
            .enumerate()
            .filter(|(_, line)| line.starts_with(['0', '1']))
            .map(|(index, line)| {
                parse_byte(line).ok_or_else(|| LoadError::MalformedLine {
                    line: index + 1,
                    text: line.to_owned(),
                })
            })
            .collect::<Result<Vec<Word>, LoadError>>()?;

        Self::from_image(image)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let source =
            fs::read_to_string(path).map_err(|source| LoadError::Io {
                path: path.to_owned(),
                source,
            })?;
        let program = Self::parse(&source)?;
        tracing::debug!(
            path = %path.display(),
            bytes = program.image.len(),
            "parsed program image"
        );
        Ok(program)
    }

    /// Encodes `ops` back to back.
    pub fn assemble(ops: &[Op]) -> Result<Self, LoadError> {
        let mut image = vec![];
        for op in ops {
            op.encode_into(&mut image);
        }
        Self::from_image(image)
    }

    /// Walks the image from address zero, decoding instructions. Bytes that
    /// do not start a valid instruction are listed one at a time as data.
    pub fn disassemble(&self) -> Vec<Listing> {
        let mut listing = vec![];
        let mut address = 0;
        while address < self.image.len() {
            match Op::decode_from(&self.image[address..]) {
                Some((op, length)) => {
                    listing.push(Listing::Instruction { address, op });
                    address += length;
                }
                None => {
                    listing.push(Listing::Data {
                        address,
                        value: self.image[address],
                    });
                    address += 1;
                }
            }
        }
        listing
    }

    pub fn image(&self) -> &[Word] {
        &self.image
    }
}

fn parse_byte(line: &str) -> Option<Word> {
    let digits = line.get(..BINARY_DIGITS)?;
    if !digits.bytes().all(|digit| matches!(digit, b'0' | b'1')) {
        return None;
    }
    Word::from_str_radix(digits, 2).ok()
}

/// One line of a disassembly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Listing {
    Instruction { address: Address, op: Op },
    Data { address: Address, value: Word },
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instruction { address, op } => {
                write!(f, "{address:02X}: {op}")
            }
            Self::Data { address, value } => {
                write!(f, "{address:02X}: .byte {value:#010b}")
            }
        }
    }
}
