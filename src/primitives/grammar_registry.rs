//! Grammar and theme registry backed by syntect's bundled assets
//!
//! Syntaxes and themes are loaded once per process. A [`Grammar`] is a cheap
//! handle (shared syntax set + index) and a [`LoadedTheme`] carries a unique
//! identity so style caches can key on it.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};

use crate::error::{RenderError, Result};

static SYNTAX_SET: Lazy<Arc<SyntaxSet>> = Lazy::new(|| Arc::new(SyntaxSet::load_defaults_newlines()));
static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);
static NEXT_THEME_ID: AtomicU64 = AtomicU64::new(1);

/// Language ids accepted on top of syntect's syntax names
///
/// Maps a canonical id to the syntect syntax name it resolves to.
const LANGUAGE_ALIASES: &[(&str, &str)] = &[
    ("bash", "Bourne Again Shell (bash)"),
    ("shell", "Bourne Again Shell (bash)"),
    ("batch", "Batch File"),
    ("c", "C"),
    ("clojure", "Clojure"),
    ("cpp", "C++"),
    ("csharp", "C#"),
    ("css", "CSS"),
    ("d", "D"),
    ("diff", "Diff"),
    ("erlang", "Erlang"),
    ("go", "Go"),
    ("groovy", "Groovy"),
    ("haskell", "Haskell"),
    ("html", "HTML"),
    ("java", "Java"),
    ("javascript", "JavaScript"),
    ("json", "JSON"),
    ("latex", "LaTeX"),
    ("lisp", "Lisp"),
    ("lua", "Lua"),
    ("makefile", "Makefile"),
    ("markdown", "Markdown"),
    ("matlab", "MATLAB"),
    ("objc", "Objective-C"),
    ("ocaml", "OCaml"),
    ("perl", "Perl"),
    ("php", "PHP"),
    ("python", "Python"),
    ("r", "R"),
    ("ruby", "Ruby"),
    ("rust", "Rust"),
    ("scala", "Scala"),
    ("sql", "SQL"),
    ("tcl", "Tcl"),
    ("xml", "XML"),
    ("yaml", "YAML"),
];

/// Built-in themes bundled with syntect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ThemeName {
    #[default]
    Base16OceanDark,
    Base16EightiesDark,
    Base16MochaDark,
    Base16OceanLight,
    InspiredGitHub,
    SolarizedDark,
    SolarizedLight,
}

impl ThemeName {
    pub const ALL: [ThemeName; 7] = [
        Self::Base16OceanDark,
        Self::Base16EightiesDark,
        Self::Base16MochaDark,
        Self::Base16OceanLight,
        Self::InspiredGitHub,
        Self::SolarizedDark,
        Self::SolarizedLight,
    ];

    /// Key of this theme in syntect's default theme set
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base16OceanDark => "base16-ocean.dark",
            Self::Base16EightiesDark => "base16-eighties.dark",
            Self::Base16MochaDark => "base16-mocha.dark",
            Self::Base16OceanLight => "base16-ocean.light",
            Self::InspiredGitHub => "InspiredGitHub",
            Self::SolarizedDark => "Solarized (dark)",
            Self::SolarizedLight => "Solarized (light)",
        }
    }

    /// Lenient lookup: case-insensitive, `_`/space/parens folded to `-`
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = normalize_theme_name(name);
        match normalized.as_str() {
            "dark" => return Some(Self::Base16OceanDark),
            "light" => return Some(Self::Base16OceanLight),
            "github" => return Some(Self::InspiredGitHub),
            _ => {}
        }
        Self::ALL
            .into_iter()
            .find(|theme| normalize_theme_name(theme.as_str()) == normalized)
    }
}

fn normalize_theme_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace(['_', ' ', '.'], "-")
        .replace(['(', ')'], "")
}

impl fmt::Display for ThemeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeName {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unknown theme: {}", s))
    }
}

/// Key used to cache a theme
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ThemeId {
    Builtin(ThemeName),
    /// A `.tmTheme` file on disk
    File(PathBuf),
}

impl ThemeId {
    /// Resolve a configured theme name, falling back to the default theme
    pub fn from_config_name(name: &str) -> Self {
        match ThemeName::from_name(name) {
            Some(theme) => Self::Builtin(theme),
            None => {
                tracing::warn!("Unknown theme '{}', using {}", name, ThemeName::default());
                Self::Builtin(ThemeName::default())
            }
        }
    }
}

impl Default for ThemeId {
    fn default() -> Self {
        Self::Builtin(ThemeName::default())
    }
}

impl fmt::Display for ThemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(name) => write!(f, "{}", name),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A theme plus the identity used in style cache keys
#[derive(Debug)]
pub struct LoadedTheme {
    id: u64,
    name: String,
    theme: Theme,
}

impl LoadedTheme {
    pub fn load(id: &ThemeId) -> Result<Self> {
        let theme = match id {
            ThemeId::Builtin(name) => THEME_SET
                .themes
                .get(name.as_str())
                .cloned()
                .unwrap_or_default(),
            ThemeId::File(path) => {
                ThemeSet::get_theme(path).map_err(|source| RenderError::ThemeLoad {
                    path: path.clone(),
                    source,
                })?
            }
        };
        Ok(Self::from_theme(id.to_string(), theme))
    }

    pub fn from_theme(name: impl Into<String>, theme: Theme) -> Self {
        Self {
            id: NEXT_THEME_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            theme,
        }
    }

    /// Process-unique identity; a reloaded theme gets a new one
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }
}

/// Handle to the syntax definitions grammars are built from
#[derive(Debug, Clone)]
pub struct Registry {
    syntaxes: Arc<SyntaxSet>,
}

impl Registry {
    /// The registry over syntect's bundled syntaxes
    pub fn shared() -> Self {
        Self {
            syntaxes: Arc::clone(&SYNTAX_SET),
        }
    }

    /// Find a grammar for a file extension (with or without the leading dot)
    pub fn grammar_for_extension(&self, extension: &str) -> Option<Grammar> {
        let ext = extension.trim().trim_start_matches('.');
        if ext.is_empty() {
            return None;
        }
        let syntax = self
            .syntaxes
            .find_syntax_by_extension(ext)
            .or_else(|| self.syntaxes.find_syntax_by_extension(&ext.to_lowercase()))?;
        self.grammar_from(syntax)
    }

    /// Find a grammar for a language id (`rust`, `csharp`) or syntax name (`C#`)
    pub fn grammar_for_language(&self, language: &str) -> Option<Grammar> {
        let language = language.trim();
        if language.is_empty() {
            return None;
        }
        let lower = language.to_lowercase();

        let syntax = LANGUAGE_ALIASES
            .iter()
            .find(|(alias, _)| *alias == lower)
            .and_then(|(_, name)| self.syntaxes.find_syntax_by_name(name))
            .or_else(|| self.syntaxes.find_syntax_by_name(language))
            .or_else(|| {
                self.syntaxes
                    .syntaxes()
                    .iter()
                    .find(|s| s.name.to_lowercase() == lower)
            })?;
        self.grammar_from(syntax)
    }

    /// Whether `id` names a language this registry can resolve
    pub fn is_known_language(&self, id: &str) -> bool {
        self.grammar_for_language(id).is_some()
    }

    /// Whether a grammar id (extension or language) resolves
    pub fn supports(&self, id: &str, is_extension: bool) -> bool {
        if is_extension {
            self.grammar_for_extension(id).is_some()
        } else {
            self.is_known_language(id)
        }
    }

    /// Every visible syntax, sorted by name
    pub fn languages(&self) -> Vec<LanguageInfo> {
        let mut languages: Vec<LanguageInfo> = self
            .syntaxes
            .syntaxes()
            .iter()
            .filter(|s| !s.hidden)
            .map(|s| LanguageInfo {
                name: s.name.clone(),
                id: LANGUAGE_ALIASES
                    .iter()
                    .find(|(_, name)| *name == s.name)
                    .map(|(alias, _)| *alias),
                extensions: s.file_extensions.clone(),
            })
            .collect();
        languages.sort_by_key(|l| l.name.to_lowercase());
        languages
    }

    fn grammar_from(&self, syntax: &SyntaxReference) -> Option<Grammar> {
        let index = self
            .syntaxes
            .syntaxes()
            .iter()
            .position(|s| s.name == syntax.name)?;
        Some(Grammar {
            syntaxes: Arc::clone(&self.syntaxes),
            index,
        })
    }
}

/// A syntax as listed to users
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageInfo {
    pub name: String,
    /// Short id accepted as a language, when one is defined
    pub id: Option<&'static str>,
    pub extensions: Vec<String>,
}

/// An immutable tokenizer definition
#[derive(Clone)]
pub struct Grammar {
    syntaxes: Arc<SyntaxSet>,
    index: usize,
}

impl Grammar {
    pub(crate) fn syntax_set(&self) -> &SyntaxSet {
        &self.syntaxes
    }

    pub(crate) fn syntax(&self) -> &SyntaxReference {
        &self.syntaxes.syntaxes()[self.index]
    }

    /// Display name of the syntax (e.g. "Rust")
    pub fn name(&self) -> &str {
        &self.syntax().name
    }

    /// Root scope of the syntax (e.g. "source.rust")
    pub fn scope_name(&self) -> String {
        self.syntax().scope.build_string()
    }

    /// Markdown grammars are rendered as structured documents
    pub fn is_markdown(&self) -> bool {
        self.name() == "Markdown" || self.scope_name() == "text.html.markdown"
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("name", &self.name())
            .field("index", &self.index)
            .finish()
    }
}

/// Resolve a user-supplied language token into `(id, is_extension)`
///
/// A leading `.` marks an extension, a known language id is a language, and
/// anything else is tried as an extension.
pub fn resolve_language_token(registry: &Registry, token: &str) -> Option<(String, bool)> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    if token.starts_with('.') {
        return Some((token.to_string(), true));
    }
    if registry.is_known_language(token) {
        return Some((token.to_lowercase(), false));
    }
    Some((format!(".{}", token), true))
}
