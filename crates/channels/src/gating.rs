//! Management-role gating for configuration commands.

/// Outcome of a management check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Invoker holds at least one management role.
    Granted,
    /// The command was not invoked inside a guild.
    NotInGuild,
    /// The guild has no management roles configured yet.
    NeedsSetup,
    /// Invoker holds none of the configured roles.
    Denied,
}

/// Check whether a guild member may run a management command.
///
/// `required` is the guild's configured role list; an empty list means the
/// guild has not been set up, which denies everyone.
pub fn check_management(guild_id: Option<&str>, required: &[String], member_roles: &[String]) -> Gate {
    if guild_id.is_none() {
        return Gate::NotInGuild;
    }
    if required.is_empty() {
        return Gate::NeedsSetup;
    }
    if member_roles.iter().any(|role| required.contains(role)) {
        Gate::Granted
    } else {
        Gate::Denied
    }
}

/// Extract role ids from whitespace-separated `<@&id>` mentions.
///
/// Tokens that are not role mentions or whose id is not numeric are
/// skipped. Duplicates are dropped, first occurrence wins.
pub fn parse_role_mentions(input: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for token in input.split_whitespace() {
        let Some(id) = token
            .strip_prefix("<@&")
            .and_then(|rest| rest.strip_suffix('>'))
        else {
            continue;
        };
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        if !ids.iter().any(|existing| existing == id) {
            ids.push(id.to_string());
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    fn roles(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case(None, &["1"], &["1"], Gate::NotInGuild)]
    #[case(Some("g"), &[], &["1"], Gate::NeedsSetup)]
    #[case(Some("g"), &["1", "2"], &["3"], Gate::Denied)]
    #[case(Some("g"), &["1", "2"], &[], Gate::Denied)]
    #[case(Some("g"), &["1", "2"], &["3", "2"], Gate::Granted)]
    fn management_gate(
        #[case] guild: Option<&str>,
        #[case] required: &[&str],
        #[case] member: &[&str],
        #[case] expected: Gate,
    ) {
        assert_eq!(
            check_management(guild, &roles(required), &roles(member)),
            expected
        );
    }

    #[test]
    fn parses_role_mentions() {
        assert_eq!(parse_role_mentions("<@&1> <@&22>"), vec!["1", "22"]);
    }

    #[test]
    fn skips_non_role_tokens() {
        let input = "<@1> @everyone <#5> <@&abc> <@&> <@&7";
        assert!(parse_role_mentions(input).is_empty());
    }

    #[test]
    fn drops_duplicates() {
        assert_eq!(parse_role_mentions("<@&9>  <@&9>\n<@&8>"), vec!["9", "8"]);
    }
}
