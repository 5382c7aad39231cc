//! Code block language table: Markdown fence tag to vendor language code.

use std::collections::HashMap;

/// Vendor code for plain text, used for empty and unrecognized tags.
pub const PLAIN_TEXT: u32 = 1;

/// Canonical Markdown tag for each vendor language code.
const CANONICAL: &[(&str, u32)] = &[
    ("plaintext", 1),
    ("abap", 2),
    ("ada", 3),
    ("apache", 4),
    ("apex", 5),
    ("assembly", 6),
    ("bash", 7),
    ("csharp", 8),
    ("cpp", 9),
    ("c", 10),
    ("cobol", 11),
    ("css", 12),
    ("coffeescript", 13),
    ("d", 14),
    ("dart", 15),
    ("delphi", 16),
    ("django", 17),
    ("dockerfile", 18),
    ("erlang", 19),
    ("fortran", 20),
    ("foxpro", 21),
    ("go", 22),
    ("groovy", 23),
    ("html", 24),
    ("htmlbars", 25),
    ("http", 26),
    ("haskell", 27),
    ("json", 28),
    ("java", 29),
    ("javascript", 30),
    ("julia", 31),
    ("kotlin", 32),
    ("latex", 33),
    ("lisp", 34),
    ("logo", 35),
    ("lua", 36),
    ("matlab", 37),
    ("makefile", 38),
    ("markdown", 39),
    ("nginx", 40),
    ("objectivec", 41),
    ("openedgeabl", 42),
    ("php", 43),
    ("perl", 44),
    ("postscript", 45),
    ("powershell", 46),
    ("prolog", 47),
    ("protobuf", 48),
    ("python", 49),
    ("r", 50),
    ("rpg", 51),
    ("ruby", 52),
    ("rust", 53),
    ("sas", 54),
    ("scss", 55),
    ("sql", 56),
    ("scala", 57),
    ("scheme", 58),
    ("scratch", 59),
    ("shell", 60),
    ("swift", 61),
    ("thrift", 62),
    ("typescript", 63),
    ("vbscript", 64),
    ("vb", 65),
    ("xml", 66),
    ("yaml", 67),
    ("cmake", 68),
    ("diff", 69),
    ("gherkin", 70),
    ("graphql", 71),
    ("glsl", 72),
    ("properties", 73),
    ("solidity", 74),
    ("toml", 75),
];

/// Extra fence tags people commonly write.
const ALIASES: &[(&str, u32)] = &[
    ("text", 1),
    ("txt", 1),
    ("plain", 1),
    ("asm", 6),
    ("sh", 7),
    ("zsh", 7),
    ("cs", 8),
    ("c#", 8),
    ("c++", 9),
    ("cc", 9),
    ("cxx", 9),
    ("hpp", 9),
    ("h", 10),
    ("docker", 18),
    ("erl", 19),
    ("golang", 22),
    ("htm", 24),
    ("hs", 27),
    ("jsonc", 28),
    ("js", 30),
    ("jsx", 30),
    ("node", 30),
    ("jl", 31),
    ("kt", 32),
    ("kts", 32),
    ("tex", 33),
    ("elisp", 34),
    ("make", 38),
    ("md", 39),
    ("objc", 41),
    ("objective-c", 41),
    ("ps1", 46),
    ("pwsh", 46),
    ("proto", 48),
    ("py", 49),
    ("python3", 49),
    ("rb", 52),
    ("rs", 53),
    ("console", 60),
    ("ts", 63),
    ("tsx", 63),
    ("vbnet", 65),
    ("svg", 66),
    ("yml", 67),
    ("patch", 69),
    ("feature", 70),
    ("gql", 71),
    ("sol", 74),
];

/// Extensible mapping between fence tags and vendor language codes.
///
/// Lookups are case-insensitive. Unknown tags fall back to [`PLAIN_TEXT`].
#[derive(Debug, Clone)]
pub struct LanguageMap {
    by_tag: HashMap<String, u32>,
    by_code: HashMap<u32, String>,
}

impl LanguageMap {
    /// Builds the vendor's built-in table plus common aliases.
    pub fn vendor_default() -> Self {
        let mut by_tag = HashMap::new();
        let mut by_code = HashMap::new();
        for &(tag, code) in CANONICAL {
            by_tag.insert(tag.to_string(), code);
            by_code.insert(code, tag.to_string());
        }
        for &(tag, code) in ALIASES {
            by_tag.insert(tag.to_string(), code);
        }
        Self { by_tag, by_code }
    }

    /// Adds or replaces entries. Codes without a canonical tag gain this one.
    pub fn with_overrides<'a, I>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a u32)>,
    {
        for (tag, &code) in overrides {
            let tag = tag.trim().to_lowercase();
            if tag.is_empty() {
                continue;
            }
            self.by_code.entry(code).or_insert_with(|| tag.clone());
            self.by_tag.insert(tag, code);
        }
        self
    }

    /// Vendor code for a fence tag; the info string's first word is used.
    pub fn code_for(&self, tag: &str) -> u32 {
        let tag = tag.split_whitespace().next().unwrap_or("").to_lowercase();
        if tag.is_empty() {
            return PLAIN_TEXT;
        }
        match self.by_tag.get(&tag) {
            Some(&code) => code,
            None => {
                log::debug!("unknown code language '{}', using plain text", tag);
                PLAIN_TEXT
            }
        }
    }

    /// Fence tag for a vendor code. Plain text and unknown codes have none.
    pub fn tag_for(&self, code: u32) -> Option<&str> {
        if code == PLAIN_TEXT {
            return None;
        }
        self.by_code.get(&code).map(String::as_str)
    }
}

impl Default for LanguageMap {
    fn default() -> Self {
        Self::vendor_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn known_tags_map_to_codes() {
        let map = LanguageMap::vendor_default();
        assert_eq!(map.code_for("rust"), 53);
        assert_eq!(map.code_for("Rust"), 53);
        assert_eq!(map.code_for("rs"), 53);
        assert_eq!(map.code_for("python"), 49);
        assert_eq!(map.code_for("c++"), 9);
        assert_eq!(map.code_for("yml"), 67);
    }

    #[test]
    fn unknown_and_empty_tags_default_to_plain_text() {
        let map = LanguageMap::vendor_default();
        assert_eq!(map.code_for(""), PLAIN_TEXT);
        assert_eq!(map.code_for("brainfudge"), PLAIN_TEXT);
    }

    #[test]
    fn info_string_uses_first_word() {
        let map = LanguageMap::vendor_default();
        assert_eq!(map.code_for("rust ignore"), 53);
    }

    #[test]
    fn reverse_lookup_uses_canonical_tag() {
        let map = LanguageMap::vendor_default();
        assert_eq!(map.tag_for(53), Some("rust"));
        assert_eq!(map.tag_for(7), Some("bash"));
        assert_eq!(map.tag_for(PLAIN_TEXT), None);
        assert_eq!(map.tag_for(4242), None);
    }

    #[test]
    fn overrides_extend_the_table() {
        let overrides: HashMap<String, u32> =
            [("zig".to_string(), 76), ("rs".to_string(), 1)].into_iter().collect();
        let map = LanguageMap::vendor_default().with_overrides(&overrides);

        assert_eq!(map.code_for("zig"), 76);
        assert_eq!(map.tag_for(76), Some("zig"));
        assert_eq!(map.code_for("rs"), 1);
        assert_eq!(map.tag_for(53), Some("rust"));
    }
}
