//! Deriving type names, selectors, and file names from a hyphenated identifier.

use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::model::{ComponentNames, Identifier};

/// Where the configured suffix is glued onto the PascalCase name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum SuffixPolicy {
    /// Append the suffix unconditionally (`foo-component` becomes `FooComponentComponent`).
    #[default]
    Always,
    /// Append the suffix only when the PascalCase name does not already end with it.
    IfMissing,
}

impl SuffixPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuffixPolicy::Always => "always",
            SuffixPolicy::IfMissing => "if-missing",
        }
    }

    fn apply(&self, pascal: String, suffix: &str) -> String {
        match self {
            SuffixPolicy::Always => pascal + suffix,
            SuffixPolicy::IfMissing if pascal.ends_with(suffix) => pascal,
            SuffixPolicy::IfMissing => pascal + suffix,
        }
    }
}

impl FromStr for SuffixPolicy {
    type Err = NamingParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(SuffixPolicy::Always),
            "if-missing" | "if_missing" | "ifmissing" => Ok(SuffixPolicy::IfMissing),
            other => Err(NamingParseError::UnknownSuffixPolicy(other.to_string())),
        }
    }
}

/// Shape of the markup substituted for the extracted selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum TagStyle {
    /// `<app-foo></app-foo>`
    #[default]
    Paired,
    /// `<app-foo />`
    SelfClosing,
}

impl TagStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagStyle::Paired => "paired",
            TagStyle::SelfClosing => "self-closing",
        }
    }

    pub fn render(&self, selector: &str) -> String {
        match self {
            TagStyle::Paired => format!("<{selector}></{selector}>"),
            TagStyle::SelfClosing => format!("<{selector} />"),
        }
    }
}

impl FromStr for TagStyle {
    type Err = NamingParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "paired" | "pair" => Ok(TagStyle::Paired),
            "self-closing" | "self_closing" | "selfclosing" => Ok(TagStyle::SelfClosing),
            other => Err(NamingParseError::UnknownTagStyle(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum NamingParseError {
    #[error("unknown suffix policy '{0}'")]
    UnknownSuffixPolicy(String),
    #[error("unknown tag style '{0}'")]
    UnknownTagStyle(String),
}

/// Naming conventions applied when deriving [`ComponentNames`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingOptions {
    pub suffix: String,
    pub policy: SuffixPolicy,
    pub selector_prefix: String,
    pub file_suffix: String,
    pub tag_style: TagStyle,
}

impl Default for NamingOptions {
    fn default() -> Self {
        Self {
            suffix: "Component".into(),
            policy: SuffixPolicy::default(),
            selector_prefix: "app".into(),
            file_suffix: ".component".into(),
            tag_style: TagStyle::default(),
        }
    }
}

/// Convert `kebab-case` to `PascalCase`.
///
/// Only the first character of each segment is uppercased; the rest is kept verbatim, and
/// empty segments (from leading, trailing, or doubled hyphens) contribute nothing.
pub fn pascal_case(identifier: &str) -> String {
    identifier
        .split('-')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Derive every generated name for `identifier`.
pub fn derive(identifier: &Identifier, options: &NamingOptions) -> ComponentNames {
    let id = identifier.as_str();
    let symbolic_name = options.policy.apply(pascal_case(id), &options.suffix);
    let selector = if options.selector_prefix.is_empty() {
        id.to_owned()
    } else {
        format!("{}-{id}", options.selector_prefix)
    };
    let reference_tag = options.tag_style.render(&selector);

    ComponentNames {
        identifier: identifier.clone(),
        symbolic_name,
        file_base_name: format!("{id}{}", options.file_suffix),
        selector,
        reference_tag,
    }
}

/// Relative module specifier used when importing the generated file from its sibling.
pub fn module_path(names: &ComponentNames) -> String {
    format!("./{}", names.file_base_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(raw: &str, options: &NamingOptions) -> ComponentNames {
        derive(&Identifier::parse(raw).unwrap(), options)
    }

    #[test]
    fn derives_all_names_from_identifier() {
        let derived = names("foo-bar", &NamingOptions::default());
        assert_eq!(derived.symbolic_name, "FooBarComponent");
        assert_eq!(derived.file_base_name, "foo-bar.component");
        assert_eq!(derived.selector, "app-foo-bar");
        assert_eq!(derived.reference_tag, "<app-foo-bar></app-foo-bar>");
        assert_eq!(module_path(&derived), "./foo-bar.component");
    }

    #[test]
    fn policies_agree_on_plain_names() {
        let always = NamingOptions::default();
        let if_missing = NamingOptions {
            policy: SuffixPolicy::IfMissing,
            ..NamingOptions::default()
        };
        assert_eq!(
            names("user-card", &always).symbolic_name,
            names("user-card", &if_missing).symbolic_name
        );
    }

    #[test]
    fn policies_differ_when_suffix_already_present() {
        let always = NamingOptions::default();
        let if_missing = NamingOptions {
            policy: SuffixPolicy::IfMissing,
            ..NamingOptions::default()
        };
        assert_eq!(
            names("card-component", &always).symbolic_name,
            "CardComponentComponent"
        );
        assert_eq!(
            names("card-component", &if_missing).symbolic_name,
            "CardComponent"
        );
    }

    #[test]
    fn empty_segments_contribute_nothing() {
        assert_eq!(pascal_case("--a--b-"), "AB");
        assert_eq!(pascal_case("-"), "");
        assert_eq!(names("-", &NamingOptions::default()).symbolic_name, "Component");
    }

    #[test]
    fn numeric_and_single_segments_are_accepted() {
        assert_eq!(pascal_case("123"), "123");
        assert_eq!(pascal_case("widget"), "Widget");
        assert_eq!(pascal_case("2fa-prompt"), "2faPrompt");
    }

    #[test]
    fn rest_of_segment_is_kept_verbatim() {
        assert_eq!(pascal_case("myHTML-view"), "MyHTMLView");
    }

    #[test]
    fn self_closing_tag_style() {
        let options = NamingOptions {
            tag_style: TagStyle::SelfClosing,
            ..NamingOptions::default()
        };
        assert_eq!(names("x", &options).reference_tag, "<app-x />");
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!("Always".parse::<SuffixPolicy>(), Ok(SuffixPolicy::Always));
        assert_eq!(
            "if_missing".parse::<SuffixPolicy>(),
            Ok(SuffixPolicy::IfMissing)
        );
        assert!("never".parse::<SuffixPolicy>().is_err());
        assert_eq!(
            "self-closing".parse::<TagStyle>(),
            Ok(TagStyle::SelfClosing)
        );
    }
}
