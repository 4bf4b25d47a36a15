// Copyright (C) 2024 Ethan Uppal and Utku Melemetci. All rights reserved.

/// Knobs that change how a [`crate::vm::VM`] is observed or bounded, never
/// what a program computes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    /// Print a [`crate::vm::Snapshot`] to stderr before every step.
    pub trace: bool,
    /// Fail instead of executing more than this many instructions.
    pub step_limit: Option<u64>,
}

impl Config {
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_step_limit(mut self, step_limit: Option<u64>) -> Self {
        self.step_limit = step_limit;
        self
    }
}
