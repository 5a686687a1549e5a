//! BibTeX-to-HTML substitution rules.
//!
//! The `.bbl` produced by BibTeX is turned into HTML by a fixed, ordered
//! table of regular-expression substitutions. Each rule is a global,
//! non-overlapping replacement over the whole text, and each rule sees the
//! output of the one before it.
//!
//! The order matters:
//! - `\href` and `\url` must be rewritten before the generic command
//!   stripper, which would otherwise reduce them to bare text.
//! - `$\sim$` becomes a literal tilde before the tilde rule runs, so it is
//!   handled (and exempted inside URLs) like any other tilde.
//! - The em-dash rule must run before the en-dash rule, whose pattern is a
//!   substring of it.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// A single pattern/replacement pair.
///
/// `replacement` uses the `regex` crate's template syntax (`${1}` for the
/// first capture group).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubstitutionRule {
    /// Short identifier, stable across releases
    pub name: &'static str,
    /// Regular expression matched against the whole text
    pub pattern: &'static str,
    /// Replacement template
    pub replacement: &'static str,
    /// What the rule is for
    pub rationale: &'static str,
}

/// The substitution table, in application order.
pub const RULES: &[SubstitutionRule] = &[
    SubstitutionRule {
        name: "line-wrap",
        pattern: r"%\n",
        replacement: "",
        rationale: "lines wrapped by BibTeX",
    },
    SubstitutionRule {
        name: "href",
        pattern: r"\\href\{([^}]*)\}\{([^}]*)\}",
        replacement: r#"<a href="${1}">${2}</a>"#,
        rationale: "hyperref \\href command",
    },
    SubstitutionRule {
        name: "url",
        pattern: r"\\url\{([^}]*)\}",
        replacement: r#"<a href="${1}">${1}</a>"#,
        rationale: "hyperref \\url command",
    },
    SubstitutionRule {
        name: "strip-command",
        pattern: r"\\\w*\{([^}]*)\}",
        replacement: " ${1} ",
        rationale: "other LaTeX commands keep only their argument",
    },
    SubstitutionRule {
        name: "braces",
        pattern: r"[{}]",
        replacement: "",
        rationale: "curly braces",
    },
    SubstitutionRule {
        name: "sim",
        pattern: r"\$\\sim\$",
        replacement: "~",
        rationale: "LaTeX $\\sim$ used to represent ~",
    },
    SubstitutionRule {
        name: "em-dash",
        pattern: "---",
        replacement: "&mdash;",
        rationale: "em-dash",
    },
    SubstitutionRule {
        name: "en-dash",
        pattern: "--",
        replacement: "&ndash;",
        rationale: "en-dash",
    },
    SubstitutionRule {
        name: "nbsp",
        pattern: r"([^/])~",
        replacement: "${1}&nbsp;",
        rationale: "tildes that are not in URLs",
    },
    SubstitutionRule {
        name: "umlaut",
        pattern: r#"\\"([a-zA-Z])"#,
        replacement: "&${1}uml;",
        rationale: "umlaut",
    },
    SubstitutionRule {
        name: "grave",
        pattern: r"\\'([a-zA-Z])",
        replacement: "&${1}grave;",
        rationale: "grave",
    },
    SubstitutionRule {
        name: "acute",
        pattern: r"\\`([a-zA-Z])",
        replacement: "&${1}acute;",
        rationale: "acute",
    },
    SubstitutionRule {
        name: "circumflex",
        pattern: r"\\\^([a-zA-Z])",
        replacement: "&${1}circ;",
        rationale: "circumflex",
    },
];

/// A rule with its pattern compiled.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    rule: &'static SubstitutionRule,
    regex: Regex,
}

impl CompiledRule {
    /// Compiles a single rule.
    pub fn new(rule: &'static SubstitutionRule) -> Result<Self, regex::Error> {
        Ok(Self {
            rule,
            regex: Regex::new(rule.pattern)?,
        })
    }

    /// The rule this was compiled from.
    pub fn rule(&self) -> &'static SubstitutionRule {
        self.rule
    }

    /// Replaces every non-overlapping match in `text`.
    ///
    /// A rule whose pattern does not occur leaves the text unchanged.
    pub fn apply(&self, text: &str) -> String {
        self.regex
            .replace_all(text, self.rule.replacement)
            .into_owned()
    }
}

/// An ordered sequence of compiled rules.
#[derive(Debug, Clone)]
pub struct Pipeline {
    rules: Vec<CompiledRule>,
}

impl Pipeline {
    /// Compiles the built-in [`RULES`] table.
    pub fn new() -> Result<Self, regex::Error> {
        Self::from_rules(RULES)
    }

    /// Compiles an arbitrary rule table, keeping its order.
    pub fn from_rules(rules: &'static [SubstitutionRule]) -> Result<Self, regex::Error> {
        let rules = rules
            .iter()
            .map(CompiledRule::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    /// Runs every rule over the text, in order.
    pub fn apply(&self, text: &str) -> String {
        self.rules
            .iter()
            .fold(text.to_string(), |current, rule| rule.apply(&current))
    }
}

static DEFAULT_PIPELINE: Lazy<Pipeline> =
    Lazy::new(|| Pipeline::new().expect("built-in substitution rules must compile"));

/// Converts BibTeX output to HTML with the built-in rule table.
///
/// # Examples
///
/// ```
/// use doxybib::convert;
///
/// assert_eq!(
///     convert(r"\href{http://x.org}{X}"),
///     r#"<a href="http://x.org">X</a>"#
/// );
/// assert_eq!(convert(r#"M\"uller"#), "M&uuml;ller");
/// ```
pub fn convert(text: &str) -> String {
    DEFAULT_PIPELINE.apply(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Applies one named rule from the built-in table, in isolation.
    fn apply_rule(name: &str, text: &str) -> String {
        let rule = RULES
            .iter()
            .find(|r| r.name == name)
            .unwrap_or_else(|| panic!("no rule named '{}'", name));
        CompiledRule::new(rule).unwrap().apply(text)
    }

    fn position(name: &str) -> usize {
        RULES.iter().position(|r| r.name == name).unwrap()
    }

    // ============================================
    // Table shape
    // ============================================

    #[test]
    fn test_all_rules_compile() {
        let pipeline = Pipeline::new().unwrap();
        assert_eq!(pipeline.rules().len(), RULES.len());
    }

    #[test]
    fn test_rule_names_are_unique() {
        for (i, rule) in RULES.iter().enumerate() {
            assert!(
                RULES[i + 1..].iter().all(|other| other.name != rule.name),
                "duplicate rule name '{}'",
                rule.name
            );
        }
    }

    #[test]
    fn test_links_are_rewritten_before_generic_stripping() {
        assert!(position("href") < position("strip-command"));
        assert!(position("url") < position("strip-command"));
    }

    #[test]
    fn test_em_dash_runs_before_en_dash() {
        assert!(position("em-dash") < position("en-dash"));
    }

    #[test]
    fn test_sim_runs_before_tilde_rule() {
        assert!(position("sim") < position("nbsp"));
    }

    // ============================================
    // Individual rules
    // ============================================

    #[test]
    fn test_line_wrap_is_joined() {
        assert_eq!(apply_rule("line-wrap", "Jour%\nnal"), "Journal");
    }

    #[test]
    fn test_line_wrap_keeps_plain_percent() {
        assert_eq!(apply_rule("line-wrap", "50% of\nice"), "50% of\nice");
    }

    #[test]
    fn test_href_becomes_anchor() {
        assert_eq!(
            apply_rule("href", r"see \href{http://x.org}{X} now"),
            r#"see <a href="http://x.org">X</a> now"#
        );
    }

    #[test]
    fn test_url_becomes_self_labelled_anchor() {
        assert_eq!(
            apply_rule("url", r"\url{http://pism.io}"),
            r#"<a href="http://pism.io">http://pism.io</a>"#
        );
    }

    #[test]
    fn test_strip_command_pads_argument_with_spaces() {
        assert_eq!(apply_rule("strip-command", r"a\emph{Ice}b"), "a Ice b");
    }

    #[test]
    fn test_strip_command_leaves_commands_without_arguments() {
        assert_eq!(apply_rule("strip-command", r"\newblock Title"), r"\newblock Title");
    }

    #[test]
    fn test_braces_are_removed() {
        assert_eq!(apply_rule("braces", "{The} {ICE} Model"), "The ICE Model");
    }

    #[test]
    fn test_sim_becomes_tilde() {
        assert_eq!(apply_rule("sim", r"/$\sim$user"), "/~user");
    }

    #[test]
    fn test_tilde_after_letter_becomes_nbsp() {
        assert_eq!(apply_rule("nbsp", "J.~Smith"), "J.&nbsp;Smith");
    }

    #[test]
    fn test_tilde_after_slash_is_kept() {
        assert_eq!(apply_rule("nbsp", "http://a.org/~x"), "http://a.org/~x");
    }

    #[test]
    fn test_tilde_at_start_of_text_is_kept() {
        // There is no preceding character to capture
        assert_eq!(apply_rule("nbsp", "~x"), "~x");
    }

    #[test]
    fn test_accent_rules() {
        assert_eq!(apply_rule("umlaut", r#"M\"uller"#), "M&uuml;ller");
        assert_eq!(apply_rule("grave", r"n\'e"), "n&egrave;");
        assert_eq!(apply_rule("acute", r"caf\`e"), "caf&eacute;");
        assert_eq!(apply_rule("circumflex", r"h\^otel"), "h&ocirc;tel");
    }

    #[test]
    fn test_accent_rules_ignore_non_letters() {
        assert_eq!(apply_rule("umlaut", r#"\"1"#), r#"\"1"#);
        assert_eq!(apply_rule("circumflex", r"\^{}"), r"\^{}");
    }

    // ============================================
    // Full pipeline
    // ============================================

    #[test]
    fn test_convert_href() {
        assert_eq!(
            convert(r"\href{http://x.org}{X}"),
            r#"<a href="http://x.org">X</a>"#
        );
    }

    #[test]
    fn test_convert_dashes() {
        assert_eq!(convert("a---b"), "a&mdash;b");
        assert_eq!(convert("a--b"), "a&ndash;b");
        assert_eq!(convert("pp. 1--10, 2003---2004"), "pp. 1&ndash;10, 2003&mdash;2004");
    }

    #[test]
    fn test_convert_umlaut_and_grave() {
        assert_eq!(convert(r#"M\"uller"#), "M&uuml;ller");
        assert_eq!(convert(r"n\'e"), "n&egrave;");
    }

    #[test]
    fn test_convert_braced_accent() {
        // BibTeX usually protects accents with braces: {\"u}
        assert_eq!(convert(r#"Gr{\"o}nland"#), "Gr&ouml;nland");
    }

    #[test]
    fn test_convert_url_keeps_tilde() {
        assert_eq!(convert("http://a.org/~x"), "http://a.org/~x");
        assert_eq!(
            convert(r"\url{http://a.org/$\sim$x}"),
            r#"<a href="http://a.org/~x">http://a.org/~x</a>"#
        );
    }

    #[test]
    fn test_convert_sim_outside_url_becomes_nbsp() {
        assert_eq!(convert(r"a$\sim$b"), "a&nbsp;b");
    }

    #[test]
    fn test_convert_link_survives_next_to_other_command() {
        // Given: A hyperlink next to an unrelated single-argument command
        let input = r"\href{http://a.org}{Site} and \emph{Title}";

        // When: The full pipeline runs
        let result = convert(input);

        // Then: Each is handled by its own rule
        assert_eq!(result, r#"<a href="http://a.org">Site</a> and  Title "#);
    }

    #[test]
    fn test_convert_without_markup_is_unchanged() {
        let text = "Plain text, 2009. No markup here.\n";
        assert_eq!(convert(text), text);
    }

    #[test]
    fn test_convert_is_deterministic() {
        let input = r"\emph{A}~B --- \url{http://c.org/~d}%
 e";
        assert_eq!(convert(input), convert(input));
    }

    #[test]
    fn test_convert_second_pass_is_a_no_op() {
        let input = "Bueler, E. and Brown, J.%\n (2009). \\emph{Shallow shelf} approximation\n\
                     as a ``sliding law''. \\href{http://dx.doi.org/10.1029}{doi}, pp.~1--20,\n\
                     \\url{http://www.pism.io/$\\sim$docs} {M\\\"uller} and {Ca\\'e}\n";

        let once = convert(input);
        let twice = convert(&once);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_pipeline_from_subset_applies_only_those_rules() {
        static DASHES: &[SubstitutionRule] = &[
            SubstitutionRule {
                name: "em-dash",
                pattern: "---",
                replacement: "&mdash;",
                rationale: "em-dash",
            },
            SubstitutionRule {
                name: "en-dash",
                pattern: "--",
                replacement: "&ndash;",
                rationale: "en-dash",
            },
        ];
        let pipeline = Pipeline::from_rules(DASHES).unwrap();

        assert_eq!(pipeline.apply(r"a---b \emph{c}"), r"a&mdash;b \emph{c}");
    }

    #[test]
    fn test_pipeline_reports_invalid_pattern() {
        static BROKEN: &[SubstitutionRule] = &[SubstitutionRule {
            name: "broken",
            pattern: "(unclosed",
            replacement: "",
            rationale: "",
        }];

        assert!(Pipeline::from_rules(BROKEN).is_err());
    }
}
