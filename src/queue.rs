use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// PBS queue jobs are submitted to
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Queue {
    #[default]
    Normal,
    Express,
    Hugemem,
    Copyq,
}

impl fmt::Display for Queue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Queue::Normal => write!(f, "normal"),
            Queue::Express => write!(f, "express"),
            Queue::Hugemem => write!(f, "hugemem"),
            Queue::Copyq => write!(f, "copyq"),
        }
    }
}
