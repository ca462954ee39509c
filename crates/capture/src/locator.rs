//! Element targets: raw CSS selectors and accessible role/name queries
//!
//! Role/name targets address controls by the semantics they expose (a
//! `button` named "Launch App") rather than by markup details, so flows keep
//! working across styling and layout changes. WebDriver has no accessibility
//! query primitive, so each role is compiled to an XPath union over the HTML
//! elements that carry that role implicitly, plus anything tagged with an
//! explicit `role` attribute.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Accessible roles the compiler understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Button,
    Heading,
    Link,
    Textbox,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Button => "button",
            Role::Heading => "heading",
            Role::Link => "link",
            Role::Textbox => "textbox",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a step addresses an element on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Target {
    /// Raw CSS selector, passed through to WebDriver untouched.
    Css { selector: String },

    /// Accessible role plus accessible name.
    Role { role: Role, name: String },
}

/// A compiled WebDriver query. Owns its string so callers can hold it across
/// await points and borrow a [`fantoccini::Locator`] from it.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Css(String),
    XPath(String),
}

impl Query {
    pub fn as_locator(&self) -> fantoccini::Locator<'_> {
        match self {
            Query::Css(s) => fantoccini::Locator::Css(s),
            Query::XPath(s) => fantoccini::Locator::XPath(s),
        }
    }
}

impl Target {
    /// Compile this target into a WebDriver query.
    pub fn compile(&self) -> Query {
        match self {
            Target::Css { selector } => Query::Css(selector.clone()),
            Target::Role { role, name } => Query::XPath(role_xpath(*role, name)),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Css { selector } => write!(f, "css `{selector}`"),
            Target::Role { role, name } => write!(f, "{role} \"{name}\""),
        }
    }
}

/// Build the XPath union for a role/name pair.
///
/// Accessible names match case-insensitively by substring, the way
/// `get_by_role(name=...)` queries behave in browser tooling: a heading
/// rendered as "AI Cover Letter Generator" is found by the name
/// "AI Cover Letter".
fn role_xpath(role: Role, name: &str) -> String {
    let lit = xpath_literal(&name.to_lowercase());
    let by_text = name_contains("normalize-space(.)", &lit);
    let by_label = name_contains("@aria-label", &lit);
    let named = format!("[{by_text} or {by_label}]");

    let parts: Vec<String> = match role {
        Role::Button => vec![
            format!("//button{named}"),
            format!("//summary{named}"),
            format!(
                "//input[(@type='button' or @type='submit' or @type='reset') and {}]",
                name_contains("@value", &lit)
            ),
            format!("//*[@role='button']{named}"),
        ],
        Role::Heading => {
            let mut v: Vec<String> = (1..=6).map(|n| format!("//h{n}{named}")).collect();
            v.push(format!("//*[@role='heading']{named}"));
            v
        }
        Role::Link => vec![
            format!("//a[@href]{named}"),
            format!("//*[@role='link']{named}"),
        ],
        Role::Textbox => vec![
            format!(
                "//input[{} or {}]",
                name_contains("@aria-label", &lit),
                name_contains("@placeholder", &lit)
            ),
            format!(
                "//textarea[{} or {}]",
                name_contains("@aria-label", &lit),
                name_contains("@placeholder", &lit)
            ),
            format!("//*[@role='textbox']{named}"),
        ],
    };

    parts.join(" | ")
}

const ASCII_UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const ASCII_LOWER: &str = "abcdefghijklmnopqrstuvwxyz";

/// Case-insensitive substring predicate over an XPath string expression.
///
/// XPath 1.0 has no lowercase function, so folding goes through `translate`
/// and covers ASCII only. `lit` must already be lowercased.
fn name_contains(expr: &str, lit: &str) -> String {
    format!("contains(translate({expr}, '{ASCII_UPPER}', '{ASCII_LOWER}'), {lit})")
}

/// Quote a string as an XPath literal.
///
/// XPath 1.0 has no escape sequences inside string literals, so a name that
/// contains both quote kinds has to be assembled with `concat()`.
fn xpath_literal(s: &str) -> String {
    if !s.contains('\'') {
        format!("'{s}'")
    } else if !s.contains('"') {
        format!("\"{s}\"")
    } else {
        let pieces: Vec<String> = s
            .split('\'')
            .map(|piece| format!("'{piece}'"))
            .collect();
        format!("concat({})", pieces.join(", \"'\", "))
    }
}
