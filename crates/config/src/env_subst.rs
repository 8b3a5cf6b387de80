/// Replace `${ENV_VAR}` placeholders in raw config text.
///
/// Unresolvable variables are left as-is so the loader error (or the
/// platform login failure) names the missing variable.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

/// Same as [`substitute_env`] with an injectable lookup.
pub(crate) fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) if end > 0 => {
                let name = &after[..end];
                match lookup(name) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push_str("${");
                        out.push_str(name);
                        out.push('}');
                    },
                }
                rest = &after[end + 1..];
            },
            // `${}` or an unterminated placeholder: copy the marker literally.
            _ => {
                out.push_str("${");
                rest = after;
            },
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    fn lookup(name: &str) -> Option<String> {
        match name {
            "DISCORD_TOKEN" => Some("abc.def".to_string()),
            "SCRATCH" => Some("/var/tmp/trp".to_string()),
            _ => None,
        }
    }

    #[rstest]
    #[case("token = \"${DISCORD_TOKEN}\"", "token = \"abc.def\"")]
    #[case("${SCRATCH}/jobs", "/var/tmp/trp/jobs")]
    #[case("${MISSING_VAR}", "${MISSING_VAR}")]
    #[case("a ${} b", "a ${} b")]
    #[case("open ${DISCORD_TOKEN", "open ${DISCORD_TOKEN")]
    #[case("plain text", "plain text")]
    fn substitutes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(substitute_env_with(input, lookup), expected);
    }

    #[test]
    fn multiple_placeholders_on_one_line() {
        assert_eq!(
            substitute_env_with("${SCRATCH}:${DISCORD_TOKEN}", lookup),
            "/var/tmp/trp:abc.def"
        );
    }
}
