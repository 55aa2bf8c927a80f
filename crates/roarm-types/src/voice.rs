//! Voice tuple used by the speech collaborator.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Polish,
    #[default]
    English,
    German,
}

impl Language {
    /// Two-letter code understood by espeak-style synthesizers.
    pub fn code(self) -> &'static str {
        match self {
            Language::Polish => "pl",
            Language::English => "en",
            Language::German => "de",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::Polish => write!(f, "polish"),
            Language::English => write!(f, "english"),
            Language::German => write!(f, "german"),
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "polish" | "pl" => Ok(Language::Polish),
            "english" | "en" => Ok(Language::English),
            "german" | "de" => Ok(Language::German),
            other => Err(format!("unknown language '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    #[default]
    Female,
}

impl Gender {
    pub fn toggled(self) -> Gender {
        match self {
            Gender::Male => Gender::Female,
            Gender::Female => Gender::Male,
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
        }
    }
}

/// The `(language, gender)` pair a voice service speaks with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Voice {
    pub language: Language,
    pub gender: Gender,
}

impl Voice {
    pub fn new(language: Language, gender: Gender) -> Self {
        Self { language, gender }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_parses_names_and_codes() {
        assert_eq!("German".parse::<Language>().unwrap(), Language::German);
        assert_eq!("pl".parse::<Language>().unwrap(), Language::Polish);
        assert!("klingon".parse::<Language>().is_err());
    }

    #[test]
    fn gender_toggle_flips() {
        assert_eq!(Gender::Male.toggled(), Gender::Female);
        assert_eq!(Gender::Female.toggled().toggled(), Gender::Female);
    }

    #[test]
    fn voice_serializes_lowercase() {
        let voice = Voice::new(Language::Polish, Gender::Female);
        let json = serde_json::to_string(&voice).unwrap();
        assert_eq!(json, r#"{"language":"polish","gender":"female"}"#);
    }
}
