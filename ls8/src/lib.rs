// Copyright (C) 2024 Ethan Uppal and Utku Melemetci. All rights reserved.

#![forbid(unsafe_code)]

pub mod alu;
pub mod arch;
pub mod config;
pub mod error;
pub mod memory;
pub mod op;
pub mod program;
pub mod registers;
pub mod vm;
