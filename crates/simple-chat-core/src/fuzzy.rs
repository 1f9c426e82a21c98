//! "Did you mean ...?" suggestions for mistyped commands.

/// Suggestions are only made below this edit distance.
pub const LEV_DIST_CUTOFF: usize = 6;

/// Levenshtein distance over chars; insert, delete and substitute all cost 1.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // prev[j] holds the distance between a[..i] and b[..j]
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(substitution);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn longest_len<'a>(names: impl IntoIterator<Item = &'a str>) -> usize {
    names
        .into_iter()
        .map(|n| n.chars().count())
        .max()
        .unwrap_or(0)
}

/// Input at or past this length is never treated as a mistyped command.
pub fn length_cutoff<'a, 'b, C, P>(command_names: C, prompt_names: P) -> usize
where
    C: IntoIterator<Item = &'a str>,
    P: IntoIterator<Item = &'b str>,
{
    longest_len(command_names) + longest_len(prompt_names)
}

/// The command `input` was most likely meant to be, if it is close to one
/// without being one.
///
/// Ties keep the command that comes first in `command_names`.
pub fn find_similar_command<'a, 'b, C, P>(
    input: &str,
    command_names: C,
    prompt_names: P,
) -> Option<&'a str>
where
    C: IntoIterator<Item = &'a str> + Clone,
    P: IntoIterator<Item = &'b str>,
{
    if input.chars().count() >= length_cutoff(command_names.clone(), prompt_names) {
        return None;
    }

    let mut best: Option<(&'a str, usize)> = None;
    for name in command_names {
        let distance = levenshtein(input, name);
        if distance >= LEV_DIST_CUTOFF {
            continue;
        }
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((name, distance));
        }
    }

    match best {
        Some((_, 0)) | None => None,
        Some((name, _)) => Some(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;

    fn names() -> Vec<&'static str> {
        Command::ALL.iter().map(|c| c.name()).collect()
    }

    fn suggest(input: &str, prompts: &[&str]) -> Option<&'static str> {
        find_similar_command(input, names(), prompts.iter().copied())
    }

    #[test]
    fn test_levenshtein_basics() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("flaw", "lawn"), 2);
        assert_eq!(levenshtein("ecit", "exit"), 1);
        assert_eq!(levenshtein("", ""), 0);
    }

    #[test]
    fn test_levenshtein_identity_empty_symmetry() {
        let samples = ["", "a", "exit", "prompt load", "héllo wörld", "chat new"];
        for s in samples {
            assert_eq!(levenshtein(s, s), 0);
            assert_eq!(levenshtein(s, ""), s.chars().count());
            assert_eq!(levenshtein("", s), s.chars().count());
            for t in samples {
                assert_eq!(levenshtein(s, t), levenshtein(t, s));
            }
        }
    }

    #[test]
    fn test_suggests_exit_for_typo() {
        assert_eq!(suggest("ecit", &[]), Some("exit"));
    }

    #[test]
    fn test_exact_command_gives_no_suggestion() {
        for name in names() {
            assert_eq!(suggest(name, &[]), None);
        }
    }

    #[test]
    fn test_cutoff_blocks_long_input() {
        // cutoff is "prompt list".len() == 11 with no saved prompts
        assert_eq!(length_cutoff(names(), Vec::<&str>::new()), 11);
        assert_eq!(suggest("prompt lis", &[]), Some("prompt list"));
        assert_eq!(suggest("prompt lisst", &[]), None);
        assert_eq!(suggest("a message that is long", &[]), None);
    }

    #[test]
    fn test_prompt_names_extend_cutoff() {
        assert_eq!(length_cutoff(names(), ["pirate"]), 17);
        assert_eq!(suggest("prompt lisst", &["pirate"]), Some("prompt list"));
    }

    #[test]
    fn test_far_input_gives_no_suggestion() {
        assert_eq!(suggest("zzzzzzzzzz", &[]), None);
    }

    #[test]
    fn test_tie_goes_to_first_in_table() {
        // "prompt" is 4 edits from "prompt new" and 5 from the other prompt commands
        assert_eq!(suggest("prompt", &[]), Some("prompt new"));
        // "ave" is one edit from "save" only; "clip"/"help"/"exit" are further
        assert_eq!(suggest("ave", &[]), Some("save"));
        // "hel" is one deletion away from "help"
        assert_eq!(suggest("hel", &[]), Some("help"));
        // "qqqq" is 4 from exit, help, clip and save: exit comes first
        assert_eq!(suggest("qqqq", &[]), Some("exit"));
    }
}
