use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Regional voice variant, selected through the translate host's TLD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Accent {
    AU,
    CA,
    IE,
    IN,
    UK,
    #[default]
    US,
    ZA,
}

impl Accent {
    /// All accents, in display order.
    pub const ALL: [Accent; 7] = [
        Accent::AU,
        Accent::CA,
        Accent::IE,
        Accent::IN,
        Accent::UK,
        Accent::US,
        Accent::ZA,
    ];

    /// Returns the top-level domain that serves this accent.
    pub fn tld(&self) -> &'static str {
        match self {
            Accent::AU => "com.au",
            Accent::CA => "ca",
            Accent::IE => "ie",
            Accent::IN => "co.in",
            Accent::UK => "co.uk",
            Accent::US => "com",
            Accent::ZA => "co.za",
        }
    }

    /// Returns the two-letter accent code.
    pub fn code(&self) -> &'static str {
        match self {
            Accent::AU => "AU",
            Accent::CA => "CA",
            Accent::IE => "IE",
            Accent::IN => "IN",
            Accent::UK => "UK",
            Accent::US => "US",
            Accent::ZA => "ZA",
        }
    }
}

impl fmt::Display for Accent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Accent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Accent::ALL
            .into_iter()
            .find(|a| a.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                Error::Config(format!(
                    "unknown accent {:?}, expected one of AU, CA, IE, IN, UK, US, ZA",
                    s
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tld() {
        assert_eq!(Accent::US.tld(), "com");
        assert_eq!(Accent::UK.tld(), "co.uk");
        assert_eq!(Accent::ZA.tld(), "co.za");
        assert_eq!(Accent::default(), Accent::US);
    }

    #[test]
    fn test_parse() {
        assert_eq!("uk".parse::<Accent>().unwrap(), Accent::UK);
        assert_eq!(" IN ".parse::<Accent>().unwrap(), Accent::IN);
        assert!("FR".parse::<Accent>().is_err());
        for accent in Accent::ALL {
            assert_eq!(accent.to_string().parse::<Accent>().unwrap(), accent);
        }
    }

    #[test]
    fn test_serde() {
        let yaml = serde_json::to_string(&Accent::AU).unwrap();
        assert_eq!(yaml, "\"AU\"");
        let back: Accent = serde_json::from_str("\"IE\"").unwrap();
        assert_eq!(back, Accent::IE);
    }
}
