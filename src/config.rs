//! Compiler settings
//!
//! [`CompilerConfig`] is built once per compile, by the CLI from its flags or by
//! library callers directly, and is read-only afterwards.

use std::fmt;
use std::str::FromStr;

/// Default size of one SSM word in bytes
pub const DEFAULT_WORD_SIZE: i32 = 4;

/// Largest accepted word size in bytes
pub const MAX_WORD_SIZE: i32 = 64;

/// What to do when a method parameter or local has the same name as a global.
///
/// Inside the method the parameter or local always wins; the policy only
/// decides how loudly that is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadowPolicy {
    /// Shadow silently
    Allow,
    /// Shadow, and emit a warning diagnostic
    #[default]
    Warn,
    /// Reject the program with a duplicate declaration error
    Reject,
}

impl FromStr for ShadowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allow" => Ok(ShadowPolicy::Allow),
            "warn" => Ok(ShadowPolicy::Warn),
            "reject" => Ok(ShadowPolicy::Reject),
            other => Err(format!(
                "unknown shadowing policy '{}' (expected allow, warn or reject)",
                other
            )),
        }
    }
}

impl fmt::Display for ShadowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShadowPolicy::Allow => write!(f, "allow"),
            ShadowPolicy::Warn => write!(f, "warn"),
            ShadowPolicy::Reject => write!(f, "reject"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Bytes per word; scales every global, parameter and local offset
    pub word_size: i32,
    pub shadowing: ShadowPolicy,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            word_size: DEFAULT_WORD_SIZE,
            shadowing: ShadowPolicy::default(),
        }
    }
}

impl CompilerConfig {
    pub fn with_word_size(mut self, word_size: i32) -> Self {
        self.word_size = word_size;
        self
    }

    pub fn with_shadowing(mut self, shadowing: ShadowPolicy) -> Self {
        self.shadowing = shadowing;
        self
    }
}
