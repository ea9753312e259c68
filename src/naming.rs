//! Derivation of command names and abbreviations from handler identifiers.

/// Generated name of a command together with the abbreviations it may be offered under.
///
/// The registry tries the candidates in order and keeps the first one that does not collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingResult {
    pub command_name: String,
    pub abbreviation_candidates: Vec<String>,
}

/// Strategy turning an identifier such as `cmdListFiles` into a command name.
pub trait CommandNamer {
    fn name_command(&self, identifier: &str) -> NamingResult;
}

/// Default namer: `cliTestMethod1` becomes `test-method-1` with abbreviations `tm1` and `teme1`.
#[derive(Debug, Clone, Copy)]
pub struct DashJoinedNamer {
    remove_common_prefix: bool,
}

const COMMON_PREFIXES: [&str; 2] = ["cmd", "cli"];

impl DashJoinedNamer {
    pub fn new(remove_common_prefix: bool) -> Self {
        Self {
            remove_common_prefix,
        }
    }
}

impl Default for DashJoinedNamer {
    fn default() -> Self {
        Self::new(true)
    }
}

impl CommandNamer for DashJoinedNamer {
    fn name_command(&self, identifier: &str) -> NamingResult {
        let mut words = split_identifier(identifier);

        if self.remove_common_prefix
            && words.len() > 1
            && COMMON_PREFIXES
                .iter()
                .any(|prefix| words[0].eq_ignore_ascii_case(prefix))
        {
            words.remove(0);
        }

        NamingResult {
            command_name: join_words(&words, true, '-'),
            abbreviation_candidates: propose_abbreviations(&words),
        }
    }
}

fn propose_abbreviations(words: &[String]) -> Vec<String> {
    // `exit` is reserved by the command loop.
    if words.len() == 1 && words[0] == "exit" {
        return Vec::new();
    }

    let initials: String = words
        .iter()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_lowercase)
        .collect();

    let two_letter: String = words
        .iter()
        .flat_map(|word| word.chars().take(2))
        .flat_map(char::to_lowercase)
        .collect();

    if two_letter.is_empty() {
        vec![initials]
    } else {
        vec![initials, two_letter]
    }
}

/// Lowercases a capitalized word (`Str` -> `str`) but leaves acronyms alone (`URL` stays `URL`).
pub fn fix_case(word: &str) -> String {
    let mut chars = word.chars();
    match (chars.next(), chars.next()) {
        (Some(first), second)
            if first.is_uppercase() && second.is_none_or(char::is_lowercase) =>
        {
            word.to_lowercase()
        }
        _ => word.to_string(),
    }
}

/// Joins words with `separator`, optionally fixing the case of each word first.
pub fn join_words(words: &[String], fix: bool, separator: char) -> String {
    let mut joined = String::new();
    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            joined.push(separator);
        }
        if fix {
            joined.push_str(&fix_case(word));
        } else {
            joined.push_str(word);
        }
    }
    joined
}

/// Splits a camel-case identifier into words: `getURLPath2` -> `get`, `URL`, `Path`, `2`.
///
/// Lowercase runs form a word, an uppercase letter followed by lowercase letters forms a
/// capitalized word, consecutive uppercase letters form an acronym, and every other character is
/// a word of its own.
pub fn split_identifier(identifier: &str) -> Vec<String> {
    let chars: Vec<char> = identifier.chars().collect();
    let len = chars.len();
    let lowercase_run_end = |mut i: usize| {
        while i < len && chars[i].is_lowercase() {
            i += 1;
        }
        i
    };

    let mut words: Vec<String> = Vec::new();
    let mut start = 0;
    while start < len {
        let end = if chars[start].is_lowercase() {
            lowercase_run_end(start)
        } else if chars[start].is_uppercase() {
            if len - start == 1 {
                start + 1
            } else if chars[start + 1].is_lowercase() {
                lowercase_run_end(start + 1)
            } else {
                // Acronym: stop before an uppercase letter that begins a capitalized word.
                let mut i = start + 1;
                while i < len
                    && chars[i].is_uppercase()
                    && (len - i == 1 || chars[i + 1].is_uppercase())
                {
                    i += 1;
                }
                i
            }
        } else {
            start + 1
        };
        words.push(chars[start..end].iter().collect());
        start = end;
    }
    words
}
