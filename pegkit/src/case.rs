use smartstring::alias::String as SmartString;

/// Reserved words of the emitted module's language, plus the builtin
/// identifiers `max`, `min` and `len` that emitted accessors would
/// otherwise shadow.
const RESERVED_NAMES: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "false",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "int",
    "interface",
    "map",
    "nil",
    "package",
    "range",
    "return",
    "select",
    "string",
    "struct",
    "switch",
    "true",
    "type",
    "var",
    "max",
    "min",
    "len",
];

fn pascal_or_camel(s: &str, pascal: bool) -> String {
    let mut out = String::with_capacity(s.len());
    let mut should_upper = pascal;
    for (i, c) in s.chars().enumerate() {
        if i != 0 && c == '_' {
            should_upper = true;
        } else if should_upper && c.is_alphabetic() {
            out.extend(c.to_uppercase());
            should_upper = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

/// `alpha_beta_gamma` → `AlphaBetaGamma`. A leading underscore is kept:
/// `_any_but_eof` → `_AnyButEof` becomes `_anyButEof` only in camel form.
pub fn to_pascal_case(s: &str) -> String {
    pascal_or_camel(s, true)
}

/// `alpha_beta_gamma` → `alphaBetaGamma`; `_any_but_eof` → `_anyButEof`.
pub fn to_camel_case(s: &str) -> String {
    pascal_or_camel(s, false)
}

/// Appends `_` when `name` collides with a reserved word of the emit
/// target.
pub fn safe_name(name: &str) -> String {
    if RESERVED_NAMES.contains(&name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

/// The three derived spellings of a declared field or rule name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    normal: SmartString,
    camel: SmartString,
    pascal: SmartString,
}

impl Name {
    pub fn new(raw: &str) -> Self {
        Self {
            normal: safe_name(raw).into(),
            camel: safe_name(&to_camel_case(raw)).into(),
            pascal: to_pascal_case(raw).into(),
        }
    }

    /// Identifier-safe spelling of the raw name.
    pub fn normal(&self) -> &str {
        &self.normal
    }

    /// Identifier-safe lower-camel spelling.
    pub fn camel(&self) -> &str {
        &self.camel
    }

    /// Upper-pascal spelling.
    pub fn pascal(&self) -> &str {
        &self.pascal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pascal_case_basics() {
        assert_eq!(to_pascal_case("alpha_beta_gamma"), "AlphaBetaGamma");
        assert_eq!(to_pascal_case("ident"), "Ident");
        assert_eq!(to_pascal_case("op_less_less_equal"), "OpLessLessEqual");
        assert_eq!(to_pascal_case("kw_if"), "KwIf");
    }

    #[test]
    fn camel_case_basics() {
        assert_eq!(to_camel_case("alpha_beta_gamma"), "alphaBetaGamma");
        assert_eq!(to_camel_case("ident"), "ident");
    }

    #[test]
    fn leading_underscore_rules_become_private_helpers() {
        assert_eq!(to_camel_case("_any_but_eof"), "_anyButEof");
        assert_eq!(to_camel_case("_group_1"), "_group1");
        assert_eq!(to_pascal_case("_group_1"), "_Group1");
    }

    #[test]
    fn digits_pass_through_without_consuming_the_upper_trigger() {
        assert_eq!(to_pascal_case("repeat_0_item"), "Repeat0Item");
        assert_eq!(to_camel_case("repeat_0_item"), "repeat0Item");
    }

    #[test]
    fn safe_name_rewrites_reserved_words() {
        assert_eq!(safe_name("map"), "map_");
        assert_eq!(safe_name("type"), "type_");
        assert_eq!(safe_name("len"), "len_");
        assert_eq!(safe_name("foo"), "foo");
    }

    #[test]
    fn name_carries_all_three_spellings() {
        let n = Name::new("left_value");
        assert_eq!(n.normal(), "left_value");
        assert_eq!(n.camel(), "leftValue");
        assert_eq!(n.pascal(), "LeftValue");

        let m = Name::new("map");
        assert_eq!(m.normal(), "map_");
        assert_eq!(m.camel(), "map_");
        assert_eq!(m.pascal(), "Map");
    }
}
