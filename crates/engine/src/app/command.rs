/// The fixed set of action words the parser recognizes. Anything else in
/// verb position makes the whole command unparseable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Go,
    Walk,
    Move,
    Pick,
    Talk,
    Ask,
    Give,
    Take,
}

impl Verb {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "go" => Some(Self::Go),
            "walk" => Some(Self::Walk),
            "move" => Some(Self::Move),
            "pick" => Some(Self::Pick),
            "talk" => Some(Self::Talk),
            "ask" => Some(Self::Ask),
            "give" => Some(Self::Give),
            "take" => Some(Self::Take),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Go => "go",
            Self::Walk => "walk",
            Self::Move => "move",
            Self::Pick => "pick",
            Self::Talk => "talk",
            Self::Ask => "ask",
            Self::Give => "give",
            Self::Take => "take",
        }
    }

    /// Movement-only verbs succeed with feedback and nothing else.
    pub fn is_movement(self) -> bool {
        matches!(self, Self::Go | Self::Walk | Self::Move)
    }

    /// Verbs that open or advance a conversation on arrival.
    pub fn is_conversational(self) -> bool {
        matches!(self, Self::Talk | Self::Ask)
    }
}

/// One parsed player command. Produced fresh per input line, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub verb: Verb,
    pub target: String,
}

/// Maps a free-text line to a verb + target pair, or `None` when the line
/// is not a command. `None` is not an error: the dispatcher simply no-ops.
///
/// `"go ..."` is special-cased: an optional `"to "` is stripped and the
/// remainder is the target even when it is a single word (`"go tree"`),
/// while the general path requires at least two tokens. Both behaviors are
/// deliberate and pinned by tests. One quirk falls out of the prefix
/// rule: a bare `"go to"` parses with target `"to"`, since the trimmed
/// remainder has no `"to "` prefix left to strip.
pub fn parse_command(raw: &str) -> Option<ParsedCommand> {
    let normalized = raw.trim().to_lowercase();

    if let Some(rest) = normalized.strip_prefix("go ") {
        let target = rest.strip_prefix("to ").unwrap_or(rest).trim();
        if !target.is_empty() {
            return Some(ParsedCommand {
                verb: Verb::Go,
                target: collapse_whitespace(target),
            });
        }
    }

    let mut tokens = normalized.split_whitespace();
    let first = tokens.next()?;
    let verb = Verb::from_token(first)?;
    let target = tokens.collect::<Vec<_>>().join(" ");
    if target.is_empty() {
        return None;
    }

    Some(ParsedCommand { verb, target })
}

/// Synonym rewrite applied before registry lookup: a leading article is
/// stripped so "the tree" and "a tree" resolve the same entry as "tree".
/// Idempotent; only the first article is removed.
pub fn normalize_target(target: &str) -> &str {
    for article in ["the ", "a ", "an "] {
        if let Some(rest) = target.strip_prefix(article) {
            let rest = rest.trim_start();
            if !rest.is_empty() {
                return rest;
            }
        }
    }
    target
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
