// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;

/// A themed icon name with optional emblems drawn over it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Icon {
    pub name: String,
    pub emblems: Vec<String>,
}

impl Icon {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            emblems: Vec::new(),
        }
    }

    pub fn with_emblem(mut self, emblem: impl Into<String>) -> Self {
        self.emblems.push(emblem.into());
        self
    }
}

impl fmt::Display for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for emblem in &self.emblems {
            write!(f, "+{emblem}")?;
        }
        Ok(())
    }
}
